/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use arrayvec::ArrayVec;

use super::{Board, Color, File, Move, MoveKind, MoveList, Piece, PieceKind, Rank, Square};

/// `(file, rank)` offsets of a Knight's jumps.
pub const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// `(file, rank)` offsets of a King's steps.
pub const KING_DELTAS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Orthogonal ray directions (north, east, south, west).
pub const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Diagonal ray directions (north-east, south-east, south-west, north-west).
pub const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// The most squares a single piece can ever attack (a centralized Queen on an empty board).
pub const MAX_ATTACKED_SQUARES: usize = 27;

/// Squares attacked by one piece.
pub type AttackList = ArrayVec<Square, MAX_ATTACKED_SQUARES>;

/// Generates all legal moves for the side to move.
///
/// Moves are ordered by origin square (`a1` to `h8`), then by the fixed direction order of
/// each piece. Promotions come in Queen, Rook, Bishop, Knight order.
///
/// An empty list means the game is over: checkmate if the side to move is in check, otherwise stalemate.
///
/// # Example
/// ```
/// # use gambit::*;
/// assert_eq!(generate_legal_moves(&Board::default()).len(), 20);
///
/// let mate = Board::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
/// assert!(generate_legal_moves(&mate).is_empty());
/// ```
pub fn generate_legal_moves(board: &Board) -> MoveList {
    let mut moves = generate_pseudo_legal_moves(board);
    let mut scratch = board.clone();
    moves.retain(|mv| keeps_king_safe(&mut scratch, *mv));
    moves
}

/// Generates the legal captures, en passant captures and promotions for the side to move.
///
/// These are the moves a quiescence search looks at.
pub fn generate_legal_captures(board: &Board) -> MoveList {
    let mut moves = MoveList::new();
    generate_moves::<true>(board, &mut moves);
    let mut scratch = board.clone();
    moves.retain(|mv| keeps_king_safe(&mut scratch, *mv));
    moves
}

/// Generates moves that obey piece movement rules but may leave the mover's King attacked.
///
/// Castling is included only when the right is held, the squares between King and Rook are
/// empty, and the King is not currently in check.
pub fn generate_pseudo_legal_moves(board: &Board) -> MoveList {
    let mut moves = MoveList::new();
    generate_moves::<false>(board, &mut moves);
    moves
}

/// Returns `true` if `mv` is one of the legal moves of `board`.
///
/// # Example
/// ```
/// # use gambit::*;
/// let board = Board::from_fen("4k3/8/8/8/1b6/8/3P4/4K3 w - - 0 1").unwrap();
/// // The d2 Pawn is pinned to the King
/// assert!(!is_legal(&board, Move::new(Square::D2, Square::D3, MoveKind::Quiet)));
/// assert!(is_legal(&board, Move::new(Square::E1, Square::F2, MoveKind::Quiet)));
/// ```
pub fn is_legal(board: &Board, mv: Move) -> bool {
    generate_pseudo_legal_moves(board).contains(&mv) && keeps_king_safe(&mut board.clone(), mv)
}

/// Returns `true` if the side to move is in check and has no legal moves.
#[inline(always)]
pub fn is_checkmate(board: &Board) -> bool {
    board.in_check(board.side_to_move()) && generate_legal_moves(board).is_empty()
}

/// Returns `true` if the side to move is not in check but has no legal moves.
#[inline(always)]
pub fn is_stalemate(board: &Board) -> bool {
    !board.in_check(board.side_to_move()) && generate_legal_moves(board).is_empty()
}

/// Lists every square the `piece` on `from` attacks, whatever occupies it.
///
/// Sliders stop at (and include) the first occupied square on each ray.
pub fn attacked_squares(board: &Board, from: Square, piece: Piece) -> AttackList {
    let mut attacks = AttackList::new();

    match piece.kind() {
        PieceKind::Pawn => {
            let forward = piece.color().negation_multiplier();
            attacks.extend([-1, 1].into_iter().filter_map(|df| from.offset(df, forward)));
        }
        PieceKind::Knight => attacks.extend(leaper_targets(from, &KNIGHT_DELTAS)),
        PieceKind::King => attacks.extend(leaper_targets(from, &KING_DELTAS)),
        PieceKind::Bishop => ray_targets(board, from, &BISHOP_DIRECTIONS, &mut attacks),
        PieceKind::Rook => ray_targets(board, from, &ROOK_DIRECTIONS, &mut attacks),
        PieceKind::Queen => {
            ray_targets(board, from, &ROOK_DIRECTIONS, &mut attacks);
            ray_targets(board, from, &BISHOP_DIRECTIONS, &mut attacks);
        }
    }

    attacks
}

/// Makes `mv` on `scratch` and reports whether the mover's King survives it.
///
/// Castling additionally requires the square the King passes over to be safe.
fn keeps_king_safe(scratch: &mut Board, mv: Move) -> bool {
    let color = scratch.side_to_move();

    if mv.is_castle() {
        let step = if mv.is_short_castle() { 1 } else { -1 };
        let crosses_attack = mv
            .from()
            .offset(step, 0)
            .is_some_and(|crossed| scratch.is_square_attacked(crossed, color.opponent()));
        if crosses_attack {
            return false;
        }
    }

    scratch.with_move_made(mv, |board| !board.in_check(color))
}

/// Walks every piece of the side to move, appending its moves.
///
/// If `TACTICAL` is set, only captures and promotions are generated.
fn generate_moves<const TACTICAL: bool>(board: &Board, moves: &mut MoveList) {
    let color = board.side_to_move();

    for (from, piece) in board.pieces_of(color) {
        match piece.kind() {
            PieceKind::Pawn => pawn_moves::<TACTICAL>(board, from, color, moves),
            PieceKind::Knight => leaper_moves::<TACTICAL>(board, from, &KNIGHT_DELTAS, moves),
            PieceKind::Bishop => slider_moves::<TACTICAL>(board, from, &BISHOP_DIRECTIONS, moves),
            PieceKind::Rook => slider_moves::<TACTICAL>(board, from, &ROOK_DIRECTIONS, moves),
            PieceKind::Queen => {
                slider_moves::<TACTICAL>(board, from, &ROOK_DIRECTIONS, moves);
                slider_moves::<TACTICAL>(board, from, &BISHOP_DIRECTIONS, moves);
            }
            PieceKind::King => {
                leaper_moves::<TACTICAL>(board, from, &KING_DELTAS, moves);
                if !TACTICAL {
                    castling_moves(board, from, color, moves);
                }
            }
        }
    }
}

/// Pushes the four promotions of a Pawn moving `from` -> `to`, Queen first.
#[inline(always)]
fn push_promotions(from: Square, to: Square, is_capture: bool, moves: &mut MoveList) {
    for promotion in PieceKind::promotions() {
        let kind = if is_capture {
            MoveKind::promotion_capture(promotion)
        } else {
            MoveKind::promotion(promotion)
        };
        moves.push(Move::new(from, to, kind));
    }
}

fn pawn_moves<const TACTICAL: bool>(
    board: &Board,
    from: Square,
    color: Color,
    moves: &mut MoveList,
) {
    let last_rank = Rank::eighth(color);

    // Pushes
    if let Some(one) = from.forward_by(color, 1) {
        if board.piece_at(one).is_none() {
            if one.rank() == last_rank {
                push_promotions(from, one, false, moves);
            } else if !TACTICAL {
                moves.push(Move::new(from, one, MoveKind::Quiet));

                if from.rank() == Rank::second(color) {
                    if let Some(two) = from.forward_by(color, 2) {
                        if board.piece_at(two).is_none() {
                            moves.push(Move::new(from, two, MoveKind::PawnDoublePush));
                        }
                    }
                }
            }
        }
    }

    // Diagonal captures, towards the a-file first
    for df in [-1, 1] {
        let Some(to) = from.offset(df, color.negation_multiplier()) else {
            continue;
        };

        match board.piece_at(to) {
            Some(victim) if victim.color() != color => {
                if to.rank() == last_rank {
                    push_promotions(from, to, true, moves);
                } else {
                    moves.push(Move::new(from, to, MoveKind::Capture));
                }
            }
            None if board.ep_square() == Some(to) => {
                moves.push(Move::new(from, to, MoveKind::EnPassantCapture));
            }
            _ => {}
        }
    }
}

/// Targets of a Knight or King on `from`, in `deltas` order.
#[inline(always)]
fn leaper_targets(from: Square, deltas: &[(i8, i8)]) -> impl Iterator<Item = Square> + '_ {
    deltas
        .iter()
        .filter_map(move |&(df, dr)| from.offset(df, dr))
}

fn leaper_moves<const TACTICAL: bool>(
    board: &Board,
    from: Square,
    deltas: &[(i8, i8)],
    moves: &mut MoveList,
) {
    let color = board.side_to_move();

    for to in leaper_targets(from, deltas) {
        match board.piece_at(to) {
            None if !TACTICAL => moves.push(Move::new(from, to, MoveKind::Quiet)),
            Some(victim) if victim.color() != color => {
                moves.push(Move::new(from, to, MoveKind::Capture))
            }
            _ => {}
        }
    }
}

/// Appends every square along each ray from `from`, up to and including the first blocker.
fn ray_targets(board: &Board, from: Square, directions: &[(i8, i8)], out: &mut AttackList) {
    for &(df, dr) in directions {
        let mut current = from;
        while let Some(next) = current.offset(df, dr) {
            out.push(next);
            if board.piece_at(next).is_some() {
                break;
            }
            current = next;
        }
    }
}

fn slider_moves<const TACTICAL: bool>(
    board: &Board,
    from: Square,
    directions: &[(i8, i8)],
    moves: &mut MoveList,
) {
    let color = board.side_to_move();

    for &(df, dr) in directions {
        let mut current = from;
        while let Some(to) = current.offset(df, dr) {
            match board.piece_at(to) {
                None => {
                    if !TACTICAL {
                        moves.push(Move::new(from, to, MoveKind::Quiet));
                    }
                }
                Some(victim) => {
                    if victim.color() != color {
                        moves.push(Move::new(from, to, MoveKind::Capture));
                    }
                    break;
                }
            }
            current = to;
        }
    }
}

/// Castling for `color`, whose King stands on `king`.
fn castling_moves(board: &Board, king: Square, color: Color, moves: &mut MoveList) {
    let rights = board.castling_rights();
    if !rights.any(color) || board.in_check(color) {
        return;
    }

    let rank = Rank::first(color);
    let all_empty = |files: &[File]| {
        files
            .iter()
            .all(|&file| board.piece_at(Square::new(file, rank)).is_none())
    };

    if rights.short(color) && all_empty(&[File::F, File::G]) {
        moves.push(Move::new(
            king,
            Square::new(File::G, rank),
            MoveKind::ShortCastle,
        ));
    }

    if rights.long(color) && all_empty(&[File::B, File::C, File::D]) {
        moves.push(Move::new(
            king,
            Square::new(File::C, rank),
            MoveKind::LongCastle,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FEN_KIWIPETE, FEN_STARTPOS};

    fn legal_moves(fen: &str) -> Vec<String> {
        let board = Board::from_fen(fen).unwrap();
        generate_legal_moves(&board)
            .into_iter()
            .map(|mv| mv.to_string())
            .collect()
    }

    #[test]
    fn test_legal_moves_never_leave_king_in_check() {
        let fens = [
            FEN_STARTPOS,
            FEN_KIWIPETE,
            "4k3/8/8/8/1b2r3/8/3QP3/4K3 w - - 0 1",
            "4k3/8/K6q/3pP3/8/8/8/8 w - d6 0 1",
            "4k3/8/4q3/8/8/8/3b4/4K3 w - - 0 1",
            "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1",
        ];

        for fen in fens {
            let mut board = Board::from_fen(fen).unwrap();
            let color = board.side_to_move();
            let legal = generate_legal_moves(&board);

            for mv in generate_pseudo_legal_moves(&board) {
                let exposes_king = board.with_move_made(mv, |b| b.in_check(color));
                let crosses_attack = mv.is_castle()
                    && mv
                        .from()
                        .offset(if mv.is_short_castle() { 1 } else { -1 }, 0)
                        .is_some_and(|sq| board.is_square_attacked(sq, color.opponent()));

                if legal.contains(&mv) {
                    assert!(!exposes_king, "{mv:?} leaves the King in check in {fen}");
                } else {
                    assert!(
                        exposes_king || crosses_attack,
                        "{mv:?} was rejected for no reason in {fen}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_generation_order_is_deterministic() {
        let a = legal_moves(FEN_KIWIPETE);
        let b = legal_moves(FEN_KIWIPETE);
        assert_eq!(a, b);
        assert_eq!(a.len(), 48);

        // Origin squares never go backwards
        let board = Board::from_fen(FEN_KIWIPETE).unwrap();
        let moves = generate_legal_moves(&board);
        assert!(moves.windows(2).all(|w| w[0].from() <= w[1].from()));
    }

    #[test]
    fn test_promotion_order() {
        let moves = legal_moves("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let promos = moves
            .iter()
            .filter(|mv| mv.starts_with("a7"))
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(promos, ["a7a8q", "a7a8r", "a7a8b", "a7a8n"]);
    }

    #[test]
    fn test_castling_rules() {
        // Both sides free
        let moves = legal_moves("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert!(moves.contains(&"e1g1".into()));
        assert!(moves.contains(&"e1c1".into()));

        // Cannot castle out of check
        let moves = legal_moves("r3k2r/8/8/8/8/8/4r3/R3K2R w KQkq - 0 1");
        assert!(!moves.iter().any(|mv| mv == "e1g1" || mv == "e1c1"));

        // Cannot castle through an attacked square (f1), but long castling is fine
        let moves = legal_moves("r3k2r/8/8/8/8/8/5r2/R3K2R w KQkq - 0 1");
        assert!(!moves.contains(&"e1g1".into()));

        let moves = legal_moves("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert!(moves.contains(&"e1c1".into()));

        // Cannot castle into check
        let moves = legal_moves("r3k1r1/8/8/8/8/8/8/R3K2R w KQq - 0 1");
        assert!(!moves.contains(&"e1g1".into()));

        // b1 may be attacked for long castling; only the King's path matters
        let moves = legal_moves("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
        assert!(moves.contains(&"e1c1".into()));

        // A piece in between blocks castling
        let moves = legal_moves("r3k2r/8/8/8/8/8/8/RN2K1NR w KQkq - 0 1");
        assert!(!moves.contains(&"e1g1".into()));
        assert!(!moves.contains(&"e1c1".into()));

        // No right, no castling
        let moves = legal_moves("r3k2r/8/8/8/8/8/8/R3K2R w kq - 0 1");
        assert!(!moves.iter().any(|mv| mv == "e1g1" || mv == "e1c1"));
    }

    #[test]
    fn test_en_passant_only_on_target_square() {
        let moves = legal_moves("4k3/8/8/3pP3/8/8/8/4K3 w - - 0 1");
        assert!(!moves.contains(&"e5d6".into()));

        let moves = legal_moves("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        assert!(moves.contains(&"e5d6".into()));

        // En passant that would expose the King along the rank is illegal
        let moves = legal_moves("8/8/8/K2pP2r/8/8/8/4k3 w - d6 0 1");
        assert!(!moves.contains(&"e5d6".into()));
    }

    #[test]
    fn test_checkmate_and_stalemate() {
        let back_rank = Board::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
        assert!(is_checkmate(&back_rank));
        assert!(!is_stalemate(&back_rank));

        let stalemate = Board::from_fen("k7/8/KQ6/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(is_stalemate(&stalemate));
        assert!(!is_checkmate(&stalemate));
        assert!(!stalemate.in_check(Color::Black));
    }

    #[test]
    fn test_captures_are_a_subset() {
        let board = Board::from_fen(FEN_KIWIPETE).unwrap();
        let legal = generate_legal_moves(&board);
        let captures = generate_legal_captures(&board);

        assert_eq!(captures.len(), 8);
        for mv in &captures {
            assert!(mv.is_capture() || mv.is_promotion());
            assert!(legal.contains(mv));
        }
    }

    #[test]
    fn test_attacked_squares() {
        let board = Board::default();
        let knight = attacked_squares(&board, Square::B1, Piece::WHITE_KNIGHT);
        assert_eq!(knight.as_slice(), [Square::C3, Square::D2, Square::A3]);

        // Blocked in by its own pieces, but still "attacks" them
        let rook = attacked_squares(&board, Square::A1, Piece::WHITE_ROOK);
        assert_eq!(rook.as_slice(), [Square::A2, Square::B1]);

        let empty = Board::from_fen("4k3/8/8/8/3Q4/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(
            attacked_squares(&empty, Square::D4, Piece::WHITE_QUEEN).len(),
            MAX_ATTACKED_SQUARES
        );
    }
}
