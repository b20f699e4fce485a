/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{CastlingRights, Color, Piece, Square};

/// Hash keys for every component of a [`Board`](super::Board).
///
/// Generated at compile time, so keys are identical between runs.
const KEYS: ZobristKeys = ZobristKeys::new();

/// A [Zobrist hash](https://www.chessprogramming.org/Zobrist_Hashing) of a position.
///
/// Two positions with the same placement, side to move, castling rights and en passant square
/// have the same key. The board keeps its key up to date as moves are made and unmade.
#[derive(Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct ZobristKey(u64);

impl ZobristKey {
    /// Computes a key from scratch out of the components of a position.
    pub fn from_parts(
        pieces: impl IntoIterator<Item = (Square, Piece)>,
        ep_square: Option<Square>,
        castling_rights: CastlingRights,
        side_to_move: Color,
    ) -> Self {
        let mut key = Self::default();

        for (square, piece) in pieces {
            key.hash_piece(square, piece);
        }
        key.hash_optional_ep_square(ep_square);
        key.hash_castling_rights(castling_rights);
        key.hash_side_to_move(side_to_move);

        key
    }

    /// Toggles `hash_key` in this key. Hashing the same value twice removes it.
    #[inline(always)]
    fn toggle(&mut self, hash_key: u64) {
        self.0 ^= hash_key;
    }

    /// Adds/removes `piece` standing on `square`.
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// let mut a = ZobristKey::default();
    /// a.hash_piece(Square::D7, Piece::BLACK_PAWN);
    ///
    /// let mut b = ZobristKey::default();
    /// b.hash_piece(Square::D7, Piece::WHITE_PAWN);
    /// assert_ne!(a, b);
    ///
    /// a.hash_piece(Square::D7, Piece::BLACK_PAWN);
    /// assert_eq!(a, ZobristKey::default());
    /// ```
    #[inline(always)]
    pub fn hash_piece(&mut self, square: Square, piece: Piece) {
        self.toggle(KEYS.pieces[square.index()][piece.index()]);
    }

    /// Adds/removes the en passant target `square`.
    ///
    /// Only squares on the third and sixth ranks have non-zero keys.
    #[inline(always)]
    pub fn hash_ep_square(&mut self, square: Square) {
        self.toggle(KEYS.ep_squares[square.index()]);
    }

    /// Same as [`ZobristKey::hash_ep_square`], doing nothing for `None`.
    #[inline(always)]
    pub fn hash_optional_ep_square(&mut self, square: Option<Square>) {
        if let Some(square) = square {
            self.hash_ep_square(square);
        }
    }

    /// Adds/removes the full set of `castling_rights`.
    #[inline(always)]
    pub fn hash_castling_rights(&mut self, castling_rights: CastlingRights) {
        self.toggle(KEYS.castling[castling_rights.index()]);
    }

    /// Adds/removes the side to move. White's key is zero.
    #[inline(always)]
    pub fn hash_side_to_move(&mut self, color: Color) {
        self.toggle(KEYS.side_to_move[color.index()]);
    }
}

impl fmt::Display for ZobristKey {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

struct ZobristKeys {
    pieces: [[u64; Piece::COUNT]; Square::COUNT],
    ep_squares: [u64; Square::COUNT],
    castling: [u64; CastlingRights::COUNT],
    side_to_move: [u64; Color::COUNT],
}

impl ZobristKeys {
    const fn new() -> Self {
        let mut pieces = [[0; Piece::COUNT]; Square::COUNT];
        let mut ep_squares = [0; Square::COUNT];
        let mut castling = [0; CastlingRights::COUNT];
        let mut side_to_move = [0; Color::COUNT];

        let mut rng = SplitMix64(0x6A09_E667_F3BC_C908);

        let mut sq = 0;
        while sq < Square::COUNT {
            let mut pc = 0;
            while pc < Piece::COUNT {
                (pieces[sq][pc], rng) = rng.next();
                pc += 1;
            }

            // En passant targets only ever sit on ranks 3 and 6
            let rank = sq / 8;
            if rank == 2 || rank == 5 {
                (ep_squares[sq], rng) = rng.next();
            }
            sq += 1;
        }

        let mut i = 0;
        while i < CastlingRights::COUNT {
            (castling[i], rng) = rng.next();
            i += 1;
        }

        (side_to_move[Color::Black.index()], _) = rng.next();

        Self {
            pieces,
            ep_squares,
            castling,
            side_to_move,
        }
    }
}

/// The [SplitMix64](https://prng.di.unimi.it/splitmix64.c) generator, usable in `const` contexts.
struct SplitMix64(u64);

impl SplitMix64 {
    /// Returns the next value along with the advanced generator.
    const fn next(self) -> (u64, Self) {
        let state = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        (z ^ (z >> 31), Self(state))
    }
}
