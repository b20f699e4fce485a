/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{generate_legal_moves, Board};

/// Counts the leaf nodes of the legal move tree `depth` plies deep.
///
/// This performs bulk counting: at depth 1 it returns the number of legal moves instead of
/// making each one. If you do *not* want bulk counting, use [`perft_generic`].
///
/// # Example
/// ```
/// # use gambit::*;
/// assert_eq!(perft(&Board::default(), 3), 8_902);
/// ```
#[inline(always)]
pub fn perft(board: &Board, depth: usize) -> u64 {
    perft_generic::<true, false>(&mut board.clone(), depth)
}

/// Same as [`perft`], but prints the number of leaves below each root move.
#[inline(always)]
pub fn splitperft(board: &Board, depth: usize) -> u64 {
    perft_generic::<true, true>(&mut board.clone(), depth)
}

/// Generic perft, making and unmaking moves on `board` in place.
///
/// If `BULK` is set, leaves are counted from the move list at depth 1.
/// If `SPLIT` is set, a line `<move>\t<leaves>` is printed for every root move.
pub fn perft_generic<const BULK: bool, const SPLIT: bool>(board: &mut Board, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = generate_legal_moves(board);
    if BULK && !SPLIT && depth == 1 {
        return moves.len() as u64;
    }

    moves.into_iter().fold(0, |nodes, mv| {
        let new_nodes =
            board.with_move_made(mv, |board| perft_generic::<BULK, false>(board, depth - 1));

        if SPLIT {
            println!("{mv}\t{new_nodes}");
        }

        nodes + new_nodes
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FEN_STARTPOS;

    #[test]
    fn test_bulk_and_full_counts_agree() {
        let board = Board::from_fen(FEN_STARTPOS).unwrap();
        for depth in 0..=3 {
            let bulk = perft_generic::<true, false>(&mut board.clone(), depth);
            let full = perft_generic::<false, false>(&mut board.clone(), depth);
            assert_eq!(bulk, full, "bulk and full counting disagree at depth {depth}");
        }
    }

    #[test]
    fn test_perft_leaves_board_untouched() {
        let mut board = Board::from_fen(crate::FEN_KIWIPETE).unwrap();
        let before = board.clone();
        assert_eq!(perft_generic::<true, false>(&mut board, 2), 2_039);
        assert_eq!(board, before);
    }
}
