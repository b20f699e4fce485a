/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use arrayvec::ArrayVec;

use crate::{tune, value_of, Board, Move, MoveList, PieceKind, MAX_NUM_MOVES};

/// Killer moves remembered for each ply of the search.
pub type Killers = [Option<Move>; 2];

/// Yields moves best-first, according to the scores assigned when it was created.
///
/// Moves with equal scores come out in the order they were generated,
/// so the ordering is fully determined by the input list.
pub struct MovePicker {
    moves: MoveList,
    scores: ArrayVec<i32, MAX_NUM_MOVES>,
    current: usize,
}

impl MovePicker {
    /// Creates a picker over `moves`, ranking each with `score_fn` (higher is searched first).
    pub fn new(moves: MoveList, score_fn: impl Fn(&Move) -> i32) -> Self {
        let scores = moves.iter().map(score_fn).collect();

        Self {
            moves,
            scores,
            current: 0,
        }
    }

    /// Creates a picker that ranks moves for a search node.
    ///
    /// The move that was best at this node in the previous iteration comes first,
    /// then captures by [MVV-LVA](https://www.chessprogramming.org/MVV-LVA),
    /// then promotions, then the `killers` of this ply, then everything else.
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// let board = Board::from_fen("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1").unwrap();
    /// let moves = generate_legal_moves(&board);
    /// let mut picker = MovePicker::for_node(&board, moves, None, &[None, None]);
    ///
    /// let (first, _) = picker.next().unwrap();
    /// assert_eq!(first, "e4d5");
    /// ```
    pub fn for_node(
        board: &Board,
        moves: MoveList,
        pv_move: Option<Move>,
        killers: &Killers,
    ) -> Self {
        Self::new(moves, |&mv| score_move(board, mv, pv_move, killers))
    }
}

impl Iterator for MovePicker {
    type Item = (Move, i32);

    fn next(&mut self) -> Option<Self::Item> {
        // No more moves left
        if self.current >= self.moves.len() {
            return None;
        }

        // Find the index of the next highest score, keeping the first of any ties
        let mut best_index = self.current;
        for i in (self.current + 1)..self.moves.len() {
            if self.scores[i] > self.scores[best_index] {
                best_index = i;
            }
        }

        // Shift it into place without disturbing the order of what remains
        self.moves[self.current..=best_index].rotate_right(1);
        self.scores[self.current..=best_index].rotate_right(1);

        let mv = self.moves[self.current];
        let score = self.scores[self.current];

        self.current += 1;

        Some((mv, score))
    }
}

/// Ordering score of `mv` on `board`. Higher scores are searched first.
pub fn score_move(board: &Board, mv: Move, pv_move: Option<Move>, killers: &Killers) -> i32 {
    if pv_move == Some(mv) {
        return tune::pv_move_bonus!();
    }

    let promotion = mv.promotion().map(value_of).unwrap_or(0);

    if mv.is_capture() {
        // En passant always takes a Pawn
        let victim = board
            .piece_at(mv.to())
            .map(|p| p.kind())
            .unwrap_or(PieceKind::Pawn);
        let attacker = board
            .piece_at(mv.from())
            .map(|p| p.kind())
            .unwrap_or(PieceKind::Pawn);

        return tune::capture_base_bonus!() + MVV_LVA[attacker][victim] + promotion;
    }

    if mv.is_promotion() {
        return tune::promotion_bonus!() + promotion;
    }

    // The older killer loses ties
    if let Some(slot) = killers.iter().position(|&killer| killer == Some(mv)) {
        return tune::killer_bonus!() - slot as i32;
    }

    0
}

/// This table represents values for [MVV-LVA](https://www.chessprogramming.org/MVV-LVA) move ordering.
///
/// It is indexed by `[attacker][victim]`, and yields a "score" that is used when sorting captures.
///
/// The following table is produced:
/// ```text
///                     VICTIM
/// A       P     N     B     R     Q     K
/// T    +---------------------------------+
/// T   P| 900   3100  3200  4900  8900  0
/// A   N| 680   2880  2980  4680  8680  0
/// C   B| 670   2870  2970  4670  8670  0
/// K   R| 500   2700  2800  4500  8500  0
/// E   Q| 100   2300  2400  4100  8100  0
/// R   K| 1000  3200  3300  5000  9000  0
/// ```
pub const MVV_LVA: [[i32; PieceKind::COUNT]; PieceKind::COUNT] = {
    let kinds = PieceKind::all();
    let mut matrix = [[0; PieceKind::COUNT]; PieceKind::COUNT];

    let mut attacker = 0;
    while attacker < PieceKind::COUNT {
        let mut victim = 0;
        while victim < PieceKind::COUNT {
            // The King can never be captured
            if victim != PieceKind::King.index() {
                matrix[attacker][victim] = 10 * value_of(kinds[victim]) - value_of(kinds[attacker]);
            }
            victim += 1;
        }
        attacker += 1;
    }

    matrix
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generate_legal_moves, Square, FEN_KIWIPETE};

    fn ordered(board: &Board, pv_move: Option<Move>, killers: &Killers) -> Vec<Move> {
        MovePicker::for_node(board, generate_legal_moves(board), pv_move, killers)
            .map(|(mv, _)| mv)
            .collect()
    }

    #[test]
    fn test_picker_order() {
        let mut list = MoveList::new();
        list.push(Move::new(Square::A2, Square::A3, crate::MoveKind::Quiet));
        list.push(Move::new(Square::B2, Square::B3, crate::MoveKind::Quiet));
        list.push(Move::new(Square::C2, Square::C3, crate::MoveKind::Quiet));
        list.push(Move::new(Square::D2, Square::D3, crate::MoveKind::Quiet));
        let scores = [3, 2, 3, 4];

        let picked: Vec<i32> = MovePicker::new(list, |mv| scores[mv.from().file().index()])
            .map(|(_, score)| score)
            .collect();
        assert_eq!(picked, vec![4, 3, 3, 2]);
    }

    #[test]
    fn test_ties_keep_generation_order() {
        let board = Board::default();
        let generated: Vec<Move> = generate_legal_moves(&board).into_iter().collect();
        assert_eq!(ordered(&board, None, &[None, None]), generated);
    }

    #[test]
    fn test_capture_order() {
        let board = Board::from_fen(FEN_KIWIPETE).unwrap();
        let pv_move = Move::from_uci(&board, "b2b3").unwrap();
        let moves = ordered(&board, Some(pv_move), &[None, None]);

        // PV move comes first
        assert_eq!(moves[0], "b2b3");

        // Then captures, most valuable victim first
        assert_eq!(moves[1], "e2a6"); // BxB
        assert_eq!(moves[2], "f3f6"); // QxN
        assert_eq!(moves[3], "g2h3"); // PxP
        assert_eq!(moves[4], "d5e6"); // PxP
        assert!(moves[5..8].iter().all(|mv| mv.from() == Square::E5)); // NxP
        assert_eq!(moves[8], "f3h3"); // QxP

        // And no quiet move before the last capture
        assert!(moves[9..].iter().all(|mv| !mv.is_capture()));
    }

    #[test]
    fn test_promotions_and_killers() {
        let board = Board::from_fen("1n2k3/P7/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let killer = Move::from_uci(&board, "h1h5").unwrap();
        let moves = ordered(&board, None, &[Some(killer), None]);

        // Capturing promotions beat quiet promotions, Queen first
        assert_eq!(moves[0], "a7b8q");
        assert_eq!(&moves[4..8], &["a7a8q", "a7a8r", "a7a8b", "a7a8n"]);

        // Killers follow promotions
        assert_eq!(moves[8], killer);
    }

    #[test]
    fn test_mvv_lva_table() {
        let (pawn, queen, king) = (
            PieceKind::Pawn.index(),
            PieceKind::Queen.index(),
            PieceKind::King.index(),
        );
        assert_eq!(MVV_LVA[pawn][queen], 8900);
        assert_eq!(MVV_LVA[queen][pawn], 100);
        assert_eq!(MVV_LVA[king][queen], 9000);
        assert_eq!(MVV_LVA[pawn][king], 0);
    }
}
