/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{attacked_squares, tune, Board, Color, File, PieceKind, Psqt, Rank, Score, Square};

/// Initial material value of all pieces in a standard setup.
const INITIAL_MATERIAL_VALUE: i32 = value_of(PieceKind::Pawn) * 16
    + value_of(PieceKind::Knight) * 4
    + value_of(PieceKind::Bishop) * 4
    + value_of(PieceKind::Rook) * 4
    + value_of(PieceKind::Queen) * 2;

/// Evaluates `board` from White's perspective.
///
/// A positive score is good for White, a negative one is good for Black.
///
/// # Example
/// ```
/// # use gambit::*;
/// assert_eq!(evaluate(&Board::default()), Score::DRAW);
///
/// // White is a Queen up
/// let board = Board::from_fen("4k3/8/8/8/8/8/8/3QK3 b - - 0 1").unwrap();
/// assert!(evaluate(&board) > 800);
/// ```
#[inline(always)]
pub fn evaluate(board: &Board) -> Score {
    Evaluator::new(board).eval_for(Color::White)
}

/// Evaluates `board` from the side-to-move's perspective, as a negamax search expects.
///
/// # Example
/// ```
/// # use gambit::*;
/// let board = Board::from_fen("4k3/8/8/8/8/8/8/3QK3 b - - 0 1").unwrap();
/// assert_eq!(evaluate_relative(&board), -evaluate(&board));
/// ```
#[inline(always)]
pub fn evaluate_relative(board: &Board) -> Score {
    Evaluator::new(board).eval()
}

/// Encapsulates the logic of scoring a chess position.
///
/// Generally, a high score is good for White, and a low score is good for Black.
/// However, during a negamax search, positions must be evaluated from the side-to-move's perspective.
/// That is, if it is Black's turn, a "good" evaluation for Black will be a positive number.
#[derive(Debug, Clone)]
pub struct Evaluator<'a> {
    /// The position to evaluate.
    board: &'a Board,

    /// Percentage of game completion, in the range `[0, 100]`.
    ///
    /// Higher number means fewer pieces are on the board
    pub(crate) endgame_weight: i32,
}

impl<'a> Evaluator<'a> {
    /// Construct a new [`Evaluator`], computing any important metadata.
    #[inline(always)]
    pub fn new(board: &'a Board) -> Self {
        Self {
            board,
            endgame_weight: endgame_weight(board),
        }
    }

    /// Evaluate this position from the side-to-move's perspective.
    ///
    /// A positive/high number is good for the side-to-move, while a negative number is better for the opponent.
    /// A score of 0 is considered equal.
    #[inline(always)]
    pub fn eval(&self) -> Score {
        self.eval_for(self.board.side_to_move())
    }

    /// Evaluate this position from `color`'s perspective.
    #[inline(always)]
    pub fn eval_for(&self, color: Color) -> Score {
        self.material_for(color) + self.mobility_for(color) + self.king_safety_for(color)
    }

    /// Material plus placement of every piece, relative to `color`.
    fn material_for(&self, color: Color) -> Score {
        self.board
            .iter()
            .fold(Score::DRAW, |score, (square, piece)| {
                let value = Psqt::eval(piece, square, self.endgame_weight);
                if piece.color() == color {
                    score + value
                } else {
                    score - value
                }
            })
    }

    /// Difference in weighted mobility between `color` and its opponent.
    fn mobility_for(&self, color: Color) -> Score {
        Score(self.mobility_of(color) - self.mobility_of(color.opponent()))
    }

    /// Counts the squares each minor/major piece of `color` attacks and does not occupy itself.
    fn mobility_of(&self, color: Color) -> i32 {
        self.board
            .pieces_of(color)
            .map(|(square, piece)| {
                let weight = match piece.kind() {
                    PieceKind::Knight => tune::knight_mobility!(),
                    PieceKind::Bishop => tune::bishop_mobility!(),
                    PieceKind::Rook => tune::rook_mobility!(),
                    PieceKind::Queen => tune::queen_mobility!(),
                    PieceKind::Pawn | PieceKind::King => return 0,
                };

                let reachable = attacked_squares(self.board, square, piece)
                    .into_iter()
                    .filter(|&to| self.board.piece_at(to).map_or(true, |p| p.color() != color))
                    .count();

                reachable as i32 * weight
            })
            .sum()
    }

    /// Difference in pawn shelter between `color` and its opponent.
    ///
    /// Shelter matters less as material comes off the board.
    fn king_safety_for(&self, color: Color) -> Score {
        let shield = self.pawn_shield_of(color) - self.pawn_shield_of(color.opponent());
        Score(shield * tune::king_shield_bonus!() * (100 - self.endgame_weight) / 100)
    }

    /// Number of friendly Pawns on the two ranks in front of `color`'s King, on its file and the adjacent ones.
    fn pawn_shield_of(&self, color: Color) -> i32 {
        let king = self.board.king_square(color);

        (1..=2)
            .flat_map(|ranks_ahead| {
                (-1..=1).filter_map(move |df| {
                    king.forward_by(color, ranks_ahead)
                        .and_then(|sq| sq.offset(df, 0))
                })
            })
            .filter(|&sq| {
                self.board
                    .piece_at(sq)
                    .is_some_and(|p| p.is_pawn() && p.color() == color)
            })
            .count() as i32
    }

    /// Fetches the value for the piece on the specified square, if one exists.
    ///
    /// Only used when printing the evaluator
    #[inline(always)]
    fn value_at(&self, square: Square) -> Option<Score> {
        self.board.piece_at(square).map(|piece| {
            Score(Psqt::eval(piece, square, self.endgame_weight))
                * piece.color().negation_multiplier() as i32
        })
    }
}

impl fmt::Display for Evaluator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  +")?;
        for _ in File::iter() {
            write!(f, "-----+")?;
        }
        writeln!(f)?;
        for rank in Rank::iter().rev() {
            write!(f, "{rank} |")?;

            // Step 1: Write the piece char
            for file in File::iter() {
                let piece = self.board.piece_at(Square::new(file, rank));
                let piece_char = piece.map(|p| p.to_uci()).unwrap_or(' ');
                write!(f, "  {piece_char}  |")?;
            }
            writeln!(f)?;
            write!(f, "  |")?;

            // Step 2: Write the contribution of that piece
            for file in File::iter() {
                let score = match self.value_at(Square::new(file, rank)) {
                    Some(val) if val > Score::DRAW => format!("+{}", val.normalize()),
                    Some(val) => format!("{}", val.normalize()),
                    None => String::new(),
                };
                write!(f, "{score:^5}|")?;
            }
            writeln!(f)?;

            write!(f, "  +")?;
            for _ in File::iter() {
                write!(f, "-----+")?;
            }
            writeln!(f)?;
        }
        for file in File::iter() {
            write!(f, "     {file}")?;
        }

        let white = Color::White;
        let score = self.eval_for(white);
        let winning_side = if score > Score::DRAW {
            Some(white)
        } else if score < Score::DRAW {
            Some(white.opponent())
        } else {
            None
        };

        writeln!(f, "\n\nMaterial: {}", self.material_for(white))?;
        writeln!(f, "Mobility: {}", self.mobility_for(white))?;
        writeln!(f, "King safety: {}", self.king_safety_for(white))?;
        writeln!(f, "Endgame: {}%", self.endgame_weight)?;
        writeln!(
            f,
            "Winning side: {}",
            winning_side.map(|c| c.name()).unwrap_or("N/A")
        )?;
        write!(f, "Score (White): {score}")
    }
}

/// Returns a value of the provided `PieceKind`.
///
/// Values are obtained from here: <https://www.chessprogramming.org/Simplified_Evaluation_Function>
#[inline(always)]
pub const fn value_of(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 320,
        PieceKind::Bishop => 330,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        PieceKind::King => 0, // King is invaluable, but 0 is easier to work with in computations
    }
}

/// Counts the material value of all pieces on the board
///
/// Does NOT count the material of the King, as it cannot be removed from the board.
#[inline(always)]
fn material_remaining(board: &Board) -> i32 {
    board
        .iter()
        .map(|(_, piece)| value_of(piece.kind()))
        .sum()
}

/// Compares the original material value of the board to the current one, yielding an `i32` in the range `[0, 100]`
///
/// Lower numbers are closer to the beginning of the game. Higher numbers are closer to the end of the game.
#[inline(always)]
fn endgame_weight(board: &Board) -> i32 {
    // Promotions can push the material above its starting value
    let missing =
        (INITIAL_MATERIAL_VALUE - material_remaining(board)).clamp(0, INITIAL_MATERIAL_VALUE);
    missing * 100 / INITIAL_MATERIAL_VALUE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FEN_KIWIPETE, FEN_STARTPOS};

    /// Flips a FEN vertically and swaps the colors of every piece and the side to move.
    fn mirror_fen(fen: &str) -> String {
        let swap_case = |s: &str| -> String {
            s.chars()
                .map(|c| {
                    if c.is_ascii_uppercase() {
                        c.to_ascii_lowercase()
                    } else {
                        c.to_ascii_uppercase()
                    }
                })
                .collect()
        };

        let fields: Vec<&str> = fen.split_whitespace().collect();
        let placement = fields[0].split('/').rev().collect::<Vec<_>>().join("/");
        let stm = if fields[1] == "w" { "b" } else { "w" };
        let castling = if fields[2] == "-" {
            String::from("-")
        } else {
            swap_case(fields[2])
        };
        let ep = match fields[3] {
            "-" => String::from("-"),
            sq => {
                let flipped_rank = if sq.ends_with('3') { '6' } else { '3' };
                format!("{}{flipped_rank}", &sq[..1])
            }
        };

        format!(
            "{} {stm} {castling} {ep} {} {}",
            swap_case(&placement),
            fields[4],
            fields[5]
        )
    }

    #[test]
    fn test_startpos_is_equal() {
        let board = Board::from_fen(FEN_STARTPOS).unwrap();
        let evaluator = Evaluator::new(&board);
        assert_eq!(evaluator.endgame_weight, 0);
        assert_eq!(evaluator.eval(), Score::DRAW);
        assert_eq!(evaluate(&board), Score::DRAW);
    }

    #[test]
    fn test_eval_is_color_symmetric() {
        let fens = [
            FEN_KIWIPETE,
            "rnbqkb1r/pp1p1ppp/2p2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 0 4",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        ];

        for fen in fens {
            let board = Board::from_fen(fen).unwrap();
            let mirrored = Board::from_fen(&mirror_fen(fen)).unwrap();

            assert_eq!(
                evaluate(&board),
                -evaluate(&mirrored),
                "{fen} and its mirror do not evaluate symmetrically"
            );
            assert_eq!(evaluate_relative(&board), evaluate_relative(&mirrored));
        }
    }

    #[test]
    fn test_eval_is_deterministic() {
        let mut board = Board::from_fen(FEN_KIWIPETE).unwrap();
        let first = evaluate(&board);

        // Reaching the same position through make/unmake changes nothing
        for mv in crate::generate_legal_moves(&board.clone()) {
            board.with_move_made(mv, |board| evaluate(board));
        }
        assert_eq!(evaluate(&board), first);
        assert_eq!(evaluate(&board.clone()), first);
    }

    #[test]
    fn test_relative_eval_flips_with_side_to_move() {
        let white = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let black = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 0 1").unwrap();

        assert_eq!(evaluate(&white), evaluate(&black));
        assert!(evaluate_relative(&white) > Score::DRAW);
        assert!(evaluate_relative(&black) < Score::DRAW);
    }

    #[test]
    fn test_endgame_weight() {
        let kings_only = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(Evaluator::new(&kings_only).endgame_weight, 100);

        // Extra Queens cannot push the weight below zero
        let promoted = Board::from_fen("qqqqkqqq/8/8/8/8/8/8/QQQQKQQQ w - - 0 1").unwrap();
        assert_eq!(Evaluator::new(&promoted).endgame_weight, 0);
    }

    #[test]
    fn test_mobility_rewards_active_pieces() {
        // Same material, but one Knight is trapped in the corner
        let active = Board::from_fen("4k3/8/8/8/3N4/8/8/4K3 w - - 0 1").unwrap();
        let passive = Board::from_fen("4k3/8/8/8/8/8/8/N3K3 w - - 0 1").unwrap();

        let active = Evaluator::new(&active);
        let passive = Evaluator::new(&passive);
        assert_eq!(active.mobility_of(Color::White), 8 * tune::knight_mobility!());
        assert_eq!(passive.mobility_of(Color::White), 2 * tune::knight_mobility!());
    }

    #[test]
    fn test_pawn_shield() {
        let sheltered = Board::from_fen("4k3/8/8/8/8/8/5PPP/6K1 w - - 0 1").unwrap();
        let exposed = Board::from_fen("4k3/8/8/8/8/5PPP/8/6K1 w - - 0 1").unwrap();
        let stripped = Board::from_fen("4k3/8/8/8/5PPP/8/8/6K1 w - - 0 1").unwrap();

        assert_eq!(Evaluator::new(&sheltered).pawn_shield_of(Color::White), 3);
        assert_eq!(Evaluator::new(&exposed).pawn_shield_of(Color::White), 3);
        assert_eq!(Evaluator::new(&stripped).pawn_shield_of(Color::White), 0);

        // Black's shield looks down the board
        let black = Board::from_fen("6k1/5ppp/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(Evaluator::new(&black).pawn_shield_of(Color::Black), 3);
    }
}
