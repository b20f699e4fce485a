/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Legal and pseudo-legal move generation, plus raw attack patterns.
mod movegen;

/// Move encoding and parsing.
mod moves;

/// Perft, for verifying move generation.
mod perft;

/// Colors, piece kinds, and pieces.
mod piece;

/// The board itself: placement, game state, make/unmake.
mod position;

/// Squares, ranks, and files.
mod square;

/// Zobrist hashing of positions.
mod zobrist;

pub use movegen::*;
pub use moves::*;
pub use perft::*;
pub use piece::*;
pub use position::*;
pub use square::*;
pub use zobrist::*;

/// FEN string for the starting position of chess.
pub const FEN_STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A popular FEN string for debugging move generation.
pub const FEN_KIWIPETE: &str =
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
