/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

/// Errors surfaced by the chess core to its callers.
///
/// Anything not listed here (a missing King, an undo without a matching make)
/// is a bug in the caller and panics instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    /// A move was not in the legal set, or could not be parsed.
    InvalidMove(String),

    /// A position description (FEN) could not be parsed.
    MalformedPosition(String),

    /// A search was requested with parameters it cannot honor.
    InvalidSearchConfig(String),
}

impl fmt::Display for ChessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMove(msg) => write!(f, "invalid move: {msg}"),
            Self::MalformedPosition(msg) => write!(f, "malformed position: {msg}"),
            Self::InvalidSearchConfig(msg) => write!(f, "invalid search config: {msg}"),
        }
    }
}

impl std::error::Error for ChessError {}
