/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::str::FromStr;

use clap::Parser;
use uci_parser::UciCommand;

use crate::{Piece, Square};

/// A command to be sent to the engine.
#[derive(Debug, Clone, Parser)]
#[command(
    multicall = true,
    about,
    rename_all = "lower",
    override_usage("<ENGINE COMMAND> | <UCI COMMAND>")
)]
pub enum EngineCommand {
    /// Run a benchmark with the provided parameters.
    Bench {
        /// If set, the benchmarking results will be printed in a well-formatted table.
        #[arg(short, long, default_value = "false")]
        pretty: bool,

        /// Override the default benchmark depth.
        #[arg(short, long, required = false)]
        depth: Option<u8>,
    },

    /// Print a visual representation of the current board state.
    #[command(alias = "d")]
    Display,

    /// Print an evaluation of the current position.
    Eval {
        /// If set, the evaluation will be broken down by term and by square.
        #[arg(short, long, default_value = "false")]
        pretty: bool,
    },

    /// Quit the engine.
    Exit {
        /// If set, the engine will await the completion of any search threads before exiting.
        #[arg(short, long, default_value = "false")]
        cleanup: bool,
    },

    /// Generate and print a FEN string for the current position.
    Fen,

    /// Print the moves played in the current game.
    #[command(alias = "moves-played")]
    History,

    /// Play the provided move in the current game, if it is legal.
    #[command(name = "move", alias = "play")]
    MakeMove { mv_string: String },

    /// Shows all legal moves in the current position, or for a specific piece.
    Moves {
        square: Option<Square>,

        /// If set, moves will be printed using their debug formatter, which displays what kind of move it is (quiet, en passant, etc.).
        #[arg(short, long, default_value = "false")]
        debug: bool,

        /// If set, moves will be sorted in alphabetical order.
        ///
        /// By default, moves are listed in the order they are generated.
        #[arg(short, long, default_value = "false")]
        sort: bool,
    },

    /// Display the current value of the specified option.
    Option {
        name: Vec<String>, // This is a vector in order to support multi-word options
    },

    /// Performs a perft on the current position at the supplied depth, printing total node count.
    Perft { depth: usize },

    /// Outputs the Piece-Square table value for the provided piece at the provided square, scaled with the endgame weight.
    ///
    /// If no square was provided, the entire table(s) will be printed.
    /// If no endgame weight was provided, it will be computed from the current game state.
    #[command(aliases = ["psq", "pst"])]
    Psqt {
        /// The piece whose Piece-Square table value(s) to fetch.
        piece: Piece,

        /// Evaluate `piece` at `square`.
        square: Option<Square>,

        /// Evaluate `piece` at `square` with the provided endgame weight [0-100].
        endgame_weight: Option<u8>,
    },

    /// Let the engine choose a move for the side to move, and play it in the current game.
    Reply {
        /// Search this many plies deep.
        #[arg(short, long, required = false)]
        depth: Option<u8>,

        /// Search for at most this many milliseconds.
        #[arg(short = 't', long = "time", required = false)]
        movetime: Option<u64>,
    },

    /// Performs a split perft on the current position at the supplied depth.
    #[command(alias = "sperft")]
    Splitperft { depth: usize },

    /// Take back the last move played in the current game.
    #[command(alias = "takeback")]
    Undo,

    /// Wrapper over UCI commands sent to the engine.
    #[command(skip)]
    Uci { cmd: UciCommand },

    /// Await the current search, blocking until it completes.
    ///
    /// This is primarily used when executing searches on startup,
    /// to await their results before doing something else.
    Wait,
}

impl FromStr for EngineCommand {
    type Err = clap::Error;
    /// Attempt to parse an [`EngineCommand`] from a string.
    ///
    /// If this fails, it will attempt to parse the string as a [`UciCommand`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::try_parse_from(s.split_ascii_whitespace()) {
            Ok(cmd) => Ok(cmd),
            Err(e) => {
                // If parsing failed, attempt to parse as a UciCommand
                if let Ok(cmd) = UciCommand::new(s) {
                    Ok(Self::Uci { cmd })
                } else {
                    Err(e)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_commands_parse() {
        assert!(matches!("d".parse(), Ok(EngineCommand::Display)));
        assert!(matches!(
            "bench -d 3 -p".parse(),
            Ok(EngineCommand::Bench {
                pretty: true,
                depth: Some(3)
            })
        ));
        assert!(matches!(
            "move e2e4".parse(),
            Ok(EngineCommand::MakeMove { mv_string }) if mv_string == "e2e4"
        ));
        assert!(matches!(
            "reply -t 250".parse(),
            Ok(EngineCommand::Reply {
                depth: None,
                movetime: Some(250)
            })
        ));
        assert!(matches!(
            "moves e2 --sort".parse(),
            Ok(EngineCommand::Moves {
                square: Some(Square::E2),
                debug: false,
                sort: true
            })
        ));
        assert!(matches!("undo".parse(), Ok(EngineCommand::Undo)));
        assert!(matches!("history".parse(), Ok(EngineCommand::History)));
    }

    #[test]
    fn test_falls_back_to_uci() {
        assert!(matches!(
            "isready".parse(),
            Ok(EngineCommand::Uci {
                cmd: UciCommand::IsReady
            })
        ));
        assert!(matches!(
            "go depth 4".parse(),
            Ok(EngineCommand::Uci {
                cmd: UciCommand::Go(_)
            })
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("frobnicate now".parse::<EngineCommand>().is_err());
        assert!("perft many".parse::<EngineCommand>().is_err());
    }
}
