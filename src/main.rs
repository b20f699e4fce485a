/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use clap::error::ErrorKind;
use gambit::{Engine, EngineCommand};

fn main() {
    let mut engine = Engine::new();

    // Each argument is one full command, such as "perft 5" or "position startpos"
    for arg in std::env::args().skip(1) {
        match arg.parse::<EngineCommand>() {
            Ok(cmd) => {
                if let Err(e) = engine.send_command(cmd) {
                    eprintln!("{e:#}");
                }
            }

            // Edge case: `--help` and `--version` are both "error" cases according to Clap
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                println!("{e}")
            }

            Err(e) => eprintln!("Error on argument {arg:?}:\n{e}"),
        }
    }

    engine.run();
}
