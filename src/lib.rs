/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Board representation, move encoding, and move generation.
mod board;

/// Command-line interface of the engine.
mod cli;

/// Code related to the engine's functionality, such as user input handling.
mod engine;

/// Errors reported by the library.
mod error;

/// Evaluation of chess positions.
mod eval;

/// Ordering of moves during search.
mod movepicker;

/// Piece-Square tables.
mod psqt;

/// Search scores, including mate distances.
mod score;

/// Main engine logic; all search related code.
mod search;

/// Tunable parameters of evaluation, ordering, and time management.
mod tune;

/// Misc utility functions, constants, and types.
mod utils;

pub use board::*;
pub use cli::*;
pub use engine::*;
pub use error::*;
pub use eval::*;
pub use movepicker::*;
pub use psqt::*;
pub use score::*;
pub use search::*;
pub use utils::*;
