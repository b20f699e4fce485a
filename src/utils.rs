/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// How much a [`Search`](crate::Search) reports while it runs.
///
/// Chosen at compile time, so a silent search pays nothing for logging.
pub trait LogLevel {
    /// Send `info` lines after every iteration, and `bestmove` at the end.
    const INFO: bool;

    /// Send extra `info string` lines about limits and cancellation.
    const DEBUG: bool;
}

/// Prints nothing. Used by tests, benchmarks, and the `reply` command.
pub struct LogNone;
impl LogLevel for LogNone {
    const INFO: bool = false;
    const DEBUG: bool = false;
}

/// Standard UCI output.
pub struct LogInfo;
impl LogLevel for LogInfo {
    const INFO: bool = true;
    const DEBUG: bool = false;
}

/// UCI output plus debugging strings, enabled by `debug on`.
pub struct LogDebug;
impl LogLevel for LogDebug {
    const INFO: bool = true;
    const DEBUG: bool = true;
}

/// Positions searched by the `bench` command.
///
/// A mix of openings, middlegames with tactics, and endgames.
pub const BENCHMARK_FENS: [&str; 12] = [
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
    "2kr3r/pp1q1ppp/2n1pn2/3p4/3P4/2PBPN2/P4PPP/R2Q1RK1 b - - 3 14",
    "6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1",
    "8/8/4k3/8/2p5/8/B2P2K1/8 w - - 0 1",
    "8/8/8/3k4/8/8/3KP3/8 w - - 0 1",
    "4r1k1/p4ppp/1p6/2p5/2P5/1P3N2/P4PPP/4R1K1 b - - 0 22",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Board;

    #[test]
    fn test_benchmark_fens_are_valid() {
        for fen in BENCHMARK_FENS {
            assert!(Board::from_fen(fen).is_ok(), "{fen} failed to parse");
        }
    }
}
