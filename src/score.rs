/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use uci_parser::UciScore;

use crate::MAX_DEPTH;

/// A numerical representation of the evaluation of a position / move, in units of ["centipawns"](https://www.chessprogramming.org/Score).
///
/// Mate scores are encoded as `MATE - ply` (or its negation), so a shorter mate always
/// compares better than a longer one.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Score(pub i32);

impl Score {
    /// Largest possible score ever achievable.
    pub const INF: Self = Self(i16::MAX as i32);

    /// Score of being mated in the current position.
    pub const MATE: Self = Self(Self::INF.0 - 1);

    /// Score of a draw.
    pub const DRAW: Self = Self(0);

    /// Lowest possible score for mate.
    ///
    /// This is only obtainable if mate is possible in [`MAX_DEPTH`] plies.
    pub const LOWEST_MATE: Self = Self(Self::MATE.0 - MAX_DEPTH as i32);

    /// Score for the side to move when it is checkmated `ply` plies from the root.
    ///
    /// # Example
    /// ```
    /// # use gambit::Score;
    /// assert!(Score::mated_in(1) < Score::mated_in(3));
    /// assert_eq!(Score::mated_in(2).plies_to_mate(), 2);
    /// ```
    #[inline(always)]
    pub const fn mated_in(ply: usize) -> Self {
        Self(-Self::MATE.0 + ply as i32)
    }

    /// Returns `true` if the score is a mate score.
    #[inline(always)]
    pub const fn is_mate(&self) -> bool {
        self.0.abs() >= Self::LOWEST_MATE.0
    }

    /// Converts this [`Score`] into a [`UciScore`], either centipawns or moves to mate.
    #[inline(always)]
    pub fn into_uci(self) -> UciScore {
        if self.is_mate() {
            UciScore::mate(self.moves_to_mate())
        } else {
            UciScore::cp(self.0)
        }
    }

    /// Returns the number of plies (half moves) this score is from mate.
    #[inline(always)]
    pub const fn plies_to_mate(&self) -> i32 {
        Self::MATE.0 - self.0.abs()
    }

    /// Returns the number of moves (full moves) this score is from mate.
    ///
    /// Positive if the side to move delivers mate, negative if it gets mated.
    #[inline(always)]
    pub const fn moves_to_mate(&self) -> i32 {
        let plies = self.plies_to_mate();

        // Our own mate needs our move played first, so round up
        let relative_to_side = if self.0 > 0 { plies + 1 } else { -plies };

        relative_to_side / 2
    }

    #[inline(always)]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Converts centipawns to pawns, for printing.
    #[inline(always)]
    pub fn normalize(&self) -> f32 {
        self.0 as f32 / 100.0
    }

    /// Performs linear interpolation between `self` and `other` by `t` where `t` is `[0, 100]`.
    #[inline(always)]
    pub const fn lerp(self, other: Self, t: i32) -> Self {
        Self(self.0 + (other.0 - self.0) * t / 100)
    }
}

impl From<Score> for UciScore {
    #[inline(always)]
    fn from(value: Score) -> Self {
        value.into_uci()
    }
}

macro_rules! impl_binary_op {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$fn(rhs.0))
            }
        }

        impl std::ops::$trait<i32> for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: i32) -> Self::Output {
                Self(self.0.$fn(rhs))
            }
        }
    };
}

macro_rules! impl_binary_op_assign {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: Self) {
                self.0.$fn(rhs.0);
            }
        }

        impl std::ops::$trait<i32> for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: i32) {
                self.0.$fn(rhs);
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);

impl_binary_op_assign!(AddAssign, add_assign);
impl_binary_op_assign!(SubAssign, sub_assign);

impl std::ops::Neg for Score {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self(self.0.neg())
    }
}

impl PartialEq<i32> for Score {
    fn eq(&self, other: &i32) -> bool {
        self.0.eq(other)
    }
}

impl PartialOrd<i32> for Score {
    fn partial_cmp(&self, other: &i32) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}

impl fmt::Display for Score {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_mate() {
            write!(
                f,
                "{} (mate in {} plies / {} moves)",
                self.0,
                self.plies_to_mate(),
                self.moves_to_mate()
            )
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mate_distances() {
        // We mate on our next move: one ply away
        let our_mate = -Score::mated_in(1);
        assert!(our_mate.is_mate());
        assert_eq!(our_mate.plies_to_mate(), 1);
        assert_eq!(our_mate.moves_to_mate(), 1);

        // We get mated after our move and theirs
        let their_mate = Score::mated_in(2);
        assert_eq!(their_mate.plies_to_mate(), 2);
        assert_eq!(their_mate.moves_to_mate(), -1);

        // Mate in 2 moves is 3 plies
        assert_eq!((-Score::mated_in(3)).moves_to_mate(), 2);

        assert!(!Score(900).is_mate());
        assert!(!Score::DRAW.is_mate());
    }

    #[test]
    fn test_shorter_mates_are_better() {
        assert!(-Score::mated_in(1) > -Score::mated_in(3));
        assert!(Score::mated_in(0) < Score::mated_in(2));
        assert!(Score::mated_in(MAX_DEPTH) < Score(-20_000));
        assert!(-Score::mated_in(0) < Score::INF);
    }

    #[test]
    fn test_lerp() {
        let mg = Score(100);
        let eg = Score(300);
        assert_eq!(mg.lerp(eg, 0), 100);
        assert_eq!(mg.lerp(eg, 50), 200);
        assert_eq!(mg.lerp(eg, 100), 300);
    }
}
