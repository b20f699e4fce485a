/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{value_of, Color, File, Piece, PieceKind, Rank, Square};

// Tables from the [Simplified Evaluation Function](https://www.chessprogramming.org/Simplified_Evaluation_Function),
// written from White's perspective with the 8th rank on top.
// Only Pawns and the King change their preferences in the endgame.

#[rustfmt::skip]
const PAWN_MG: Psqt = Psqt::new(PieceKind::Pawn, [
      0,   0,   0,   0,   0,   0,   0,   0,
     50,  50,  50,  50,  50,  50,  50,  50,
     10,  10,  20,  30,  30,  20,  10,  10,
      5,   5,  10,  25,  25,  10,   5,   5,
      0,   0,   0,  20,  20,   0,   0,   0,
      5,  -5, -10,   0,   0, -10,  -5,   5,
      5,  10,  10, -20, -20,  10,  10,   5,
      0,   0,   0,   0,   0,   0,   0,   0,
]);

// Passed-pawn races decide endgames, so only advancement matters
#[rustfmt::skip]
const PAWN_EG: Psqt = Psqt::new(PieceKind::Pawn, [
      0,   0,   0,   0,   0,   0,   0,   0,
     80,  80,  80,  80,  80,  80,  80,  80,
     50,  50,  50,  50,  50,  50,  50,  50,
     30,  30,  30,  30,  30,  30,  30,  30,
     15,  15,  15,  15,  15,  15,  15,  15,
      5,   5,   5,   5,   5,   5,   5,   5,
      0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,
]);

#[rustfmt::skip]
const KNIGHT: Psqt = Psqt::new(PieceKind::Knight, [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
]);

#[rustfmt::skip]
const BISHOP: Psqt = Psqt::new(PieceKind::Bishop, [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
]);

#[rustfmt::skip]
const ROOK: Psqt = Psqt::new(PieceKind::Rook, [
      0,   0,   0,   0,   0,   0,   0,   0,
      5,  10,  10,  10,  10,  10,  10,   5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
      0,   0,   0,   5,   5,   0,   0,   0,
]);

#[rustfmt::skip]
const QUEEN: Psqt = Psqt::new(PieceKind::Queen, [
    -20, -10, -10,  -5,  -5, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,   5,   5,   5,   0, -10,
     -5,   0,   5,   5,   5,   5,   0,  -5,
      0,   0,   5,   5,   5,   5,   0,  -5,
    -10,   5,   5,   5,   5,   5,   0, -10,
    -10,   0,   5,   0,   0,   0,   0, -10,
    -20, -10, -10,  -5,  -5, -10, -10, -20,
]);

#[rustfmt::skip]
const KING_MG: Psqt = Psqt::new(PieceKind::King, [
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -10, -20, -20, -20, -20, -20, -20, -10,
     20,  20,   0,   0,   0,   0,  20,  20,
     20,  30,  10,   0,   0,  10,  30,  20,
]);

#[rustfmt::skip]
const KING_EG: Psqt = Psqt::new(PieceKind::King, [
    -50, -40, -30, -20, -20, -30, -40, -50,
    -30, -20, -10,   0,   0, -10, -20, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -30,   0,   0,   0,   0, -30, -30,
    -50, -30, -30, -30, -30, -30, -30, -50,
]);

/// A [Piece-Square Table](https://www.chessprogramming.org/Piece-Square_Tables) for use in evaluation.
///
/// Every entry already includes the material value of the piece it belongs to.
#[derive(Debug)]
pub struct Psqt([i32; Square::COUNT]);

impl Psqt {
    /// Fetch the Piece-Square Table value for `piece` at `square`, interpolated by `endgame_weight` (`[0, 100]`).
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// // A Knight in the corner is worth less than its material value
    /// assert_eq!(Psqt::eval(Piece::WHITE_KNIGHT, Square::A1, 0), 320 - 50);
    /// // Black's Pawns look up the table from their own side of the board
    /// assert_eq!(
    ///     Psqt::eval(Piece::BLACK_PAWN, Square::E2, 100),
    ///     Psqt::eval(Piece::WHITE_PAWN, Square::E7, 100)
    /// );
    /// ```
    #[inline(always)]
    pub fn eval(piece: Piece, square: Square, endgame_weight: i32) -> i32 {
        let (mg, eg) = Self::get_tables_for(piece.kind());

        // Get the rank-relative square for this piece
        let square = square.rank_relative_to(piece.color());

        // Interpolate between the mid-game and end-game tables
        lerp_i32(mg.get(square), eg.get(square), endgame_weight)
    }

    /// Fetch the Piece-Square Tables (middle-game and end-game) for the provided [`PieceKind`].
    #[inline(always)]
    pub fn get_tables_for(kind: PieceKind) -> (&'static Self, &'static Self) {
        match kind {
            PieceKind::Pawn => (&PAWN_MG, &PAWN_EG),
            PieceKind::Knight => (&KNIGHT, &KNIGHT),
            PieceKind::Bishop => (&BISHOP, &BISHOP),
            PieceKind::Rook => (&ROOK, &ROOK),
            PieceKind::Queen => (&QUEEN, &QUEEN),
            PieceKind::King => (&KING_MG, &KING_EG),
        }
    }

    /// Creates a new [`Psqt`] for the provided [`PieceKind`] and array of values.
    const fn new(kind: PieceKind, psqt: [i32; Square::COUNT]) -> Self {
        let mut flipped = psqt;

        let mut i = 0;
        while i < psqt.len() {
            // Flip the rank, not the file, so it can be indexed by a1 = 0
            flipped[i] = psqt[i ^ 56] + value_of(kind);
            i += 1;
        }

        Self(flipped)
    }

    /// Get the value of this PSQT at the provided square.
    #[inline(always)]
    pub const fn get(&self, square: Square) -> i32 {
        self.0[square.index()]
    }

    /// Get the value of this PSQT at the provided square, relative to `color`.
    #[inline(always)]
    pub const fn get_relative(&self, square: Square, color: Color) -> i32 {
        self.get(square.rank_relative_to(color))
    }
}

impl fmt::Display for Psqt {
    /// Prints the table the way it is written in the source (White's perspective).
    ///
    /// If the alternate formatter is used (`#`), it prints from Black's perspective.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let color = Color::from_bool(f.alternate());

        for rank in Rank::iter().rev() {
            write!(f, "{rank}| ")?;
            for file in File::iter() {
                let value = self.get_relative(Square::new(file, rank), color);
                write!(f, "{value:4} ")?;
            }
            writeln!(f)?;
        }

        write!(f, " +")?;
        for _ in File::iter() {
            write!(f, "-----")?;
        }
        write!(f, "\n     ")?;
        for file in File::iter() {
            write!(f, "{file}    ")?;
        }

        Ok(())
    }
}

/// Performs linear interpolation between `x` and `y` by `t`, as integer values.
#[inline(always)]
const fn lerp_i32(x: i32, y: i32, t: i32) -> i32 {
    x + (y - x) * t / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_is_correct_for_colors() {
        for endgame_weight in 0..=100 {
            for square in Square::iter() {
                for kind in PieceKind::all() {
                    // White's value must equal Black's on the mirrored square
                    let white = Psqt::eval(Piece::new(Color::White, kind), square, endgame_weight);
                    let black = Psqt::eval(
                        Piece::new(Color::Black, kind),
                        square.rank_relative_to(Color::Black),
                        endgame_weight,
                    );

                    assert_eq!(
                        white,
                        black,
                        "{} on {square} (weight := {endgame_weight}%): {white} (white) != {black} (black)",
                        kind.name()
                    );
                }
            }
        }
    }

    #[test]
    fn test_endgame_prefers_central_king() {
        let corner = Psqt::eval(Piece::WHITE_KING, Square::G1, 100);
        let center = Psqt::eval(Piece::WHITE_KING, Square::E4, 100);
        assert!(center > corner);

        let corner = Psqt::eval(Piece::WHITE_KING, Square::G1, 0);
        let center = Psqt::eval(Piece::WHITE_KING, Square::E4, 0);
        assert!(corner > center);
    }

    #[test]
    fn test_tables_include_material() {
        assert_eq!(Psqt::eval(Piece::WHITE_ROOK, Square::D1, 0), 505);
        assert_eq!(Psqt::eval(Piece::BLACK_ROOK, Square::D8, 0), 505);
        assert_eq!(Psqt::eval(Piece::WHITE_PAWN, Square::A7, 100), 180);
        assert_eq!(Psqt::eval(Piece::WHITE_KING, Square::G1, 0), 30);
    }
}
