/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use uci_parser::{UciCommand, UciOption, UciParseError, UciResponse};

use crate::{
    generate_legal_moves, perft, splitperft, Board, Color, EngineCommand, Evaluator, LogDebug,
    LogInfo, LogLevel, LogNone, Move, Piece, Psqt, Search, SearchConfig, SearchResult, Square,
    UndoRecord, ZobristKey, BENCHMARK_FENS,
};

/// Default depth at which to run the benchmark searches.
const BENCH_DEPTH: u8 = 5;

/// Default depth of the `reply` command, if neither a depth nor a time was given.
const REPLY_DEPTH: u8 = 5;

/// How a game came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    /// The side to move has been checkmated by the given color.
    Checkmate(Color),
    Stalemate,
    FiftyMoves,
    InsufficientMaterial,
    /// The same position occurred for the third time.
    Repetition,
}

impl GameOutcome {
    /// The result of the game in PGN notation.
    pub const fn result(&self) -> &'static str {
        match self {
            Self::Checkmate(Color::White) => "1-0",
            Self::Checkmate(Color::Black) => "0-1",
            _ => "1/2-1/2",
        }
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Checkmate(Color::White) => "White mates",
            Self::Checkmate(Color::Black) => "Black mates",
            Self::Stalemate => "Stalemate",
            Self::FiftyMoves => "Draw by the fifty-move rule",
            Self::InsufficientMaterial => "Draw by insufficient material",
            Self::Repetition => "Draw by threefold repetition",
        };
        write!(f, "{} {{{reason}}}", self.result())
    }
}

/// The Gambit chess engine.
#[derive(Debug)]
pub struct Engine {
    /// The current state of the chess board, as known to the engine.
    ///
    /// This is modified whenever moves are played or new positions are given,
    /// and is reset whenever the engine is told to start a new game.
    board: Board,

    /// Every move played to reach `board`, oldest first, so they can be taken back.
    ///
    /// Updated when a move is played or `position ... moves [move list]` is received.
    history: Vec<UndoRecord>,

    /// One half of a channel, responsible for sending commands to the engine to execute.
    sender: Sender<EngineCommand>,

    /// One half of a channel, responsible for receiving commands for the engine to execute.
    receiver: Receiver<EngineCommand>,

    /// Atomic flag to determine whether a search is currently running
    is_searching: Arc<AtomicBool>,

    /// Handle to the currently-running search thread, if one exists.
    search_thread: Option<JoinHandle<SearchResult>>,

    /// Whether searches resolve captures at their leaves. Set by the `Quiescence` option.
    use_quiescence: bool,

    /// Whether to display extra information during execution.
    debug: bool,
}

impl Engine {
    /// Constructs a new [`Engine`] instance to be executed with [`Engine::run`].
    #[inline(always)]
    pub fn new() -> Self {
        // Construct a channel for communication
        let (sender, receiver) = channel();

        Self {
            board: Board::default(),
            history: Vec::with_capacity(512),
            sender,
            receiver,
            is_searching: Arc::default(),
            search_thread: None,
            use_quiescence: true,
            debug: false,
        }
    }

    /// Returns a string of the engine's name and current version.
    #[inline(always)]
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// Returns a string of all authors of this engine.
    #[inline(always)]
    pub fn authors(&self) -> String {
        // Split multiple authors by comma-space
        env!("CARGO_PKG_AUTHORS").replace(':', ", ").to_string()
    }

    /// Sends an [`EngineCommand`] to the engine to be executed.
    ///
    /// Fails only if the engine is no longer receiving commands.
    #[inline(always)]
    pub fn send_command(&self, command: EngineCommand) -> Result<()> {
        self.sender
            .send(command)
            .context("Failed to send a command to the engine via channels.")
    }

    /// Entrypoint of the engine.
    ///
    /// This function first spawns a new thread that handles user input from `stdin`.
    /// It then loops on commands received by the engine, executing them in the order received.
    pub fn run(&mut self) {
        // Spawn a separate thread for handling user input
        let sender = self.sender.clone();
        thread::spawn(|| {
            if let Err(err) = input_handler(sender) {
                eprintln!("Input handler thread stopping after fatal error: {err:#}");
            }
        });

        // Execute commands as they are received
        while let Ok(cmd) = self.receiver.recv() {
            if self.debug {
                Self::send_string(format!("Received command {cmd:?}"));
            }

            match cmd {
                EngineCommand::Bench { depth, pretty } => {
                    if let Err(e) = self.bench(depth, pretty) {
                        eprintln!("Error: {e:#}");
                    }
                }

                EngineCommand::Display => println!("{}", self.board),

                EngineCommand::Eval { pretty } => self.eval(pretty),

                EngineCommand::Exit { cleanup } => {
                    // If requested, await the completion of any ongoing search threads
                    if cleanup {
                        self.stop_search();
                    }

                    // Exit the loop so the engine can quit
                    break;
                }

                EngineCommand::Fen => println!("{}", self.board.to_fen()),

                EngineCommand::History => println!("{}", self.move_history()),

                EngineCommand::MakeMove { mv_string } => {
                    match Move::from_uci(&self.board, &mv_string) {
                        Ok(mv) => {
                            if let Some(outcome) = self.make_move(mv) {
                                println!("{outcome}");
                            }
                        }
                        Err(e) => eprintln!("{e:#}"),
                    }
                }

                EngineCommand::Moves {
                    square,
                    debug,
                    sort,
                } => self.moves(square, debug, sort),

                EngineCommand::Option { name } => {
                    let name = name.join(" ");
                    if let Some(value) = self.get_option(&name) {
                        println!("Option {name:?} := {value}");
                    } else {
                        println!("{} has no option {name:?}", self.name());
                    }
                }

                EngineCommand::Perft { depth } => println!("{}", perft(&self.board, depth)),

                EngineCommand::Psqt {
                    piece,
                    square,
                    endgame_weight: weight,
                } => self.psqt(piece, square, weight),

                EngineCommand::Reply { depth, movetime } => {
                    if let Err(e) = self.reply(depth, movetime) {
                        eprintln!("Error: {e:#}");
                    }
                }

                EngineCommand::Splitperft { depth } => {
                    println!("{}", splitperft(&self.board, depth))
                }

                EngineCommand::Undo => self.undo(),

                EngineCommand::Uci { cmd } => {
                    // UCI spec states to continue execution if an error occurs
                    if let Err(e) = self.handle_uci_command(cmd) {
                        eprintln!("Error: {e:#}");
                    }
                }

                EngineCommand::Wait => _ = self.stop_search(),
            };
        }
    }

    /// Handle the execution of a single [`UciCommand`].
    fn handle_uci_command(&mut self, uci: UciCommand) -> Result<()> {
        use UciCommand::*;
        match uci {
            Uci => self.uci(),

            Debug(status) => self.debug = status,

            IsReady => println!("{}", UciResponse::<&str>::ReadyOk),

            SetOption { name, value } => self.set_option(&name, value)?,

            Register { name: _, code: _ } => println!("{} requires no registration", self.name()),

            UciNewGame => self.new_game(),

            Go(options) => {
                if let Some(depth) = options.perft {
                    println!("{}", splitperft(&self.board, depth as usize));
                    return Ok(());
                }

                let mut config = SearchConfig::new(options, &self.board);
                config.use_quiescence = self.use_quiescence;

                self.search_thread = if self.debug {
                    self.start_search::<LogDebug>(config)
                } else {
                    self.start_search::<LogInfo>(config)
                };
            }

            Position { fen, moves } => self.position(fen, moves)?,

            Stop => self.set_is_searching(false),

            Quit => self.send_command(EngineCommand::Exit { cleanup: false })?,

            _ => bail!("{} does not support UCI command {uci:?}", self.name()),
        }

        Ok(())
    }

    /// Execute the `bench` command, running a benchmark of a fixed search on a series of positions and displaying the results.
    fn bench(&mut self, depth: Option<u8>, pretty: bool) -> Result<()> {
        // Set up the benchmarking config
        let config = SearchConfig {
            max_depth: depth.unwrap_or(BENCH_DEPTH) as usize,
            use_quiescence: self.use_quiescence,
            ..Default::default()
        };
        config.validate()?;

        let benches = BENCHMARK_FENS;
        let mut nodes = 0;

        // Padding for printing FENs
        let width = benches.iter().map(|fen| fen.len()).max().unwrap_or_default();

        println!(
            "Running fixed-depth search (d={}) on {} positions",
            config.max_depth,
            benches.len()
        );

        let starttime = Instant::now();

        // Run a fixed search on each position
        for (i, fen) in benches.into_iter().enumerate() {
            print!("{:>2}/{:>2}: {fen:<width$} := ", i + 1, benches.len());
            // flush stdout so the node count will appear on the same line after search concludes
            io::stdout().lock().flush()?;

            // Each bench is essentially a new game
            self.new_game();
            self.position(Some(fen), [])?;
            self.search_thread = self.start_search::<LogNone>(config);

            // Await the search, appending the node count once concluded.
            let Some(res) = self.stop_search() else {
                bail!("Search thread panicked while running benchmarks on fen {fen}");
            };
            nodes += res.nodes;
            println!("{}", res.nodes);
        }

        // Compute results
        let elapsed = starttime.elapsed();
        let nps = (nodes as f32 / elapsed.as_secs_f32()) as u64;
        let m_nps = nodes as f32 / elapsed.as_secs_f32() / 1_000_000.0;
        let ms = elapsed.as_millis();

        if pretty {
            // Display the results in a nice table
            println!();
            println!("+-- Benchmark Complete --+");
            println!("| time (ms)  {ms:<12}|");
            println!("|     nodes  {nodes:<12}|");
            println!("|       nps  {nps:<12}|");
            println!("|      Mnps  {m_nps:<12.2}|");
            println!("+------------------------+");
        } else {
            println!("{nodes} nodes / {elapsed:?} := {nps} nps");
        }

        // Re-set the internal game state.
        self.new_game();

        Ok(())
    }

    /// Executes the `eval` command, printing an evaluation of the current position.
    fn eval(&self, pretty: bool) {
        let evaluator = Evaluator::new(&self.board);
        if pretty {
            println!("{evaluator}");
        } else {
            println!("{}", evaluator.eval());
        }
    }

    /// Plays `mv` on the current position, remembering how to take it back.
    ///
    /// Returns the outcome of the game, if `mv` ended it.
    fn make_move(&mut self, mv: Move) -> Option<GameOutcome> {
        let undo = self.board.make_move(mv);
        self.history.push(undo);
        self.outcome()
    }

    /// Returns how the current game ended, or `None` if it is still going.
    fn outcome(&self) -> Option<GameOutcome> {
        let board = &self.board;
        let stm = board.side_to_move();

        if generate_legal_moves(board).is_empty() {
            return Some(if board.in_check(stm) {
                GameOutcome::Checkmate(stm.opponent())
            } else {
                GameOutcome::Stalemate
            });
        }

        if board.can_draw_by_fifty() {
            Some(GameOutcome::FiftyMoves)
        } else if board.can_draw_by_insufficient_material() {
            Some(GameOutcome::InsufficientMaterial)
        } else if self.repetitions() >= 2 {
            Some(GameOutcome::Repetition)
        } else {
            None
        }
    }

    /// Counts how often the current position occurred earlier in the game.
    fn repetitions(&self) -> usize {
        let key = self.board.key();

        // Only positions with the same side to move, since the last irreversible move
        self.history
            .iter()
            .rev()
            .take(self.board.halfmove())
            .skip(1)
            .step_by(2)
            .filter(|undo| undo.key() == key)
            .count()
    }

    /// Formats the moves played in the current game, one full move per line.
    fn move_history(&self) -> String {
        if self.history.is_empty() {
            return String::from("(none)");
        }

        // Walk back to the side and move number the game started from
        let plies = self.history.len();
        let mut color = if plies % 2 == 0 {
            self.board.side_to_move()
        } else {
            self.board.side_to_move().opponent()
        };
        let black_moves = if color.is_white() { plies / 2 } else { plies.div_ceil(2) };
        let mut fullmove = self.board.fullmove().saturating_sub(black_moves).max(1);

        let mut history = String::new();
        if color.is_black() {
            history.push_str(&format!("{fullmove}..."));
        }

        for undo in &self.history {
            if color.is_white() {
                if !history.is_empty() {
                    history.push('\n');
                }
                history.push_str(&format!("{fullmove}."));
            } else {
                fullmove += 1;
            }
            history.push_str(&format!(" {}", undo.mv()));
            color = color.opponent();
        }

        history
    }

    /// Executes the `undo` command, taking back the last move played.
    fn undo(&mut self) {
        if let Some(undo) = self.history.pop() {
            self.board.undo(undo);
            if self.debug {
                Self::send_string(format!("Took back {}", undo.mv()));
            }
        } else {
            eprintln!("No moves to take back");
        }
    }

    /// Executes the `moves` command, displaying all available moves on the board, or for the given square.
    fn moves(&self, square: Option<Square>, debug: bool, sort: bool) {
        // Get the legal moves, optionally from only a single square
        let moves = generate_legal_moves(&self.board)
            .into_iter()
            .filter(|mv| square.map_or(true, |sq| mv.from() == sq));

        let mut strings = moves
            .map(|mv| {
                if debug {
                    format!("{mv:?}")
                } else {
                    mv.to_string()
                }
            })
            .collect::<Vec<_>>();

        // If there are none, print "(none)"
        if strings.is_empty() {
            println!("(none)");
            return;
        }

        // Sort alphabetically, if necessary
        if sort {
            strings.sort();
        }

        println!("{}", strings.join(", "));
    }

    /// Resets the engine's internal game state.
    ///
    /// This also cancels any ongoing searches, ignoring their results.
    #[inline(always)]
    fn new_game(&mut self) {
        self.set_is_searching(false);
        self.history.clear();
        self.board = Board::default();
    }

    /// Set the position to the supplied FEN string (defaults to the standard startpos if not supplied),
    /// and then apply `moves` one-by-one to the position.
    ///
    /// On error, the current position is left untouched.
    fn position<T: AsRef<str>>(
        &mut self,
        fen: Option<T>,
        moves: impl IntoIterator<Item = T>,
    ) -> Result<()> {
        // Set the new position
        let mut board = if let Some(fen) = fen {
            Board::from_fen(fen.as_ref())?
        } else {
            Board::default()
        };

        // Since this is a new position, it has a new history
        let mut history = Vec::with_capacity(self.history.capacity());

        // Apply the provided moves
        for mv_str in moves {
            let mv = Move::from_uci(&board, mv_str.as_ref())
                .with_context(|| format!("Failed to apply moves to {:?}", board.to_fen()))?;
            history.push(board.make_move(mv));
        }

        self.board = board;
        self.history = history;

        Ok(())
    }

    /// Executes the `psqt` command, printing the piece-square table info for the provided piece.
    fn psqt(&self, piece: Piece, square: Option<Square>, endgame_weight: Option<u8>) {
        // Compute the current endgame weight, if it wasn't provided
        let weight = endgame_weight
            .map(|weight| weight.min(100) as i32)
            .unwrap_or(Evaluator::new(&self.board).endgame_weight);

        // If there was a square provided, print the eval for that square
        if let Some(square) = square {
            let value = Psqt::eval(piece, square, weight);
            println!("{piece} at {square} ({weight}% endgame) := {value}");
            return;
        }

        // Fetch the middle-game and end-game tables
        let (mg, eg) = Psqt::get_tables_for(piece.kind());
        let name = piece.name();

        // If the piece is Black, flip the tables when printing
        let f = |psqt: &Psqt| {
            if piece.is_white() {
                format!("{psqt}")
            } else {
                format!("{psqt:#}")
            }
        };

        println!("Mid-game table for {name}:\n{}", f(mg));
        println!();
        println!("End-game table for {name}:\n{}", f(eg));
    }

    /// Executes the `reply` command: searches the current position and plays the best move found.
    fn reply(&mut self, depth: Option<u8>, movetime: Option<u64>) -> Result<()> {
        if self.is_searching() {
            bail!("Cannot reply while a search is running");
        }
        if let Some(outcome) = self.outcome() {
            println!("The game is over: {outcome}");
            return Ok(());
        }

        let mut config = SearchConfig {
            use_quiescence: self.use_quiescence,
            ..Default::default()
        };

        if let Some(ms) = movetime {
            config.time_limit = Some(Duration::from_millis(ms));
            config.soft_time_limit = Some(Duration::from_millis(ms));
        }

        // Without any limit, stop at a depth that answers quickly
        match (depth, movetime) {
            (Some(depth), _) => config.max_depth = depth as usize,
            (None, None) => config.max_depth = REPLY_DEPTH as usize,
            (None, Some(_)) => {}
        }
        config.validate()?;

        self.search_thread = self.start_search::<LogNone>(config);
        let Some(res) = self.stop_search() else {
            bail!("Search thread panicked while replying on {:?}", self.board.to_fen());
        };

        let Some(mv) = res.bestmove else {
            bail!("Search found no move on {:?}", self.board.to_fen());
        };

        let outcome = self.make_move(mv);
        println!("{mv} (score {}, depth {}, {} nodes)", res.score, res.depth, res.nodes);
        if let Some(outcome) = outcome {
            println!("{outcome}");
        }

        if self.debug {
            Self::send_string(format!("pv {}", res.pv));
        }

        Ok(())
    }

    /// Sets the search flag to signal that the engine is starting/stopping a search.
    #[inline(always)]
    fn set_is_searching(&mut self, status: bool) {
        self.is_searching.store(status, Ordering::Relaxed);
    }

    /// Returns `true` if the engine is currently executing a searching.
    #[inline(always)]
    fn is_searching(&self) -> bool {
        self.is_searching.load(Ordering::Relaxed)
    }

    /// Keys of every position played before the current one, oldest first.
    #[inline(always)]
    fn prev_keys(&self) -> Vec<ZobristKey> {
        self.history.iter().map(|undo| undo.key()).collect()
    }

    /// Starts a search on the current position, given the parameters in `config`.
    fn start_search<Log: LogLevel>(
        &mut self,
        config: SearchConfig,
    ) -> Option<JoinHandle<SearchResult>> {
        // Cannot start a search if one is already running
        if self.is_searching() {
            Self::send_string("A search is already running");
            return None;
        }
        self.set_is_searching(true);

        // Clone the parameters that will be sent into the thread
        let is_searching = Arc::clone(&self.is_searching);
        let board = self.board.clone();
        let prev_keys = self.prev_keys();

        // Spawn a thread to conduct the search
        let handle = thread::spawn(move || {
            // Start the search, returning the result when completed.
            Search::<Log>::new(is_searching, config, prev_keys).start(&board)
        });

        Some(handle)
    }

    /// Awaits the current search thread, blocking until it finishes and returning its result.
    fn stop_search(&mut self) -> Option<SearchResult> {
        // Can't stop a search if there aren't any threads searching!
        let handle = self.search_thread.take()?;

        // Attempt to join the thread handle to retrieve the result
        let id = handle.thread().id();
        let Ok(res) = handle.join() else {
            Self::send_string(format!("Failed to join on thread {id:?}"));
            return None;
        };

        // Flip the search flag so that any active threads will (hopefully) begin to clean themselves up.
        self.set_is_searching(false);

        Some(res)
    }

    /// Called when the engine receives the `uci` command.
    ///
    /// Prints engine's ID, version, and authors, and lists all UCI options.
    fn uci(&self) {
        println!("id name {}\nid author {}\n", self.name(), self.authors());

        // Print all UCI options
        for opt in self.options() {
            println!("{}", UciResponse::Option(opt));
        }

        // We're ready to go!
        println!("{}", UciResponse::<&str>::UciOk)
    }

    /// Convenience function to return an iterator over all UCI options this engine supports.
    fn options(&self) -> impl Iterator<Item = UciOption> {
        [
            UciOption::check("Quiescence", true),
            UciOption::spin("Threads", 1, 1, 1),
        ]
        .into_iter()
    }

    /// Handles the `setoption` command, setting option `name` to `value`, or toggling it if `value` is None.
    ///
    /// Will return an error if `name` isn't a valid option or `value` is not a valid value for that option.
    fn set_option(&mut self, name: &str, value: Option<String>) -> Result<()> {
        match name {
            // Resolve captures at the leaves of the search
            "Quiescence" => {
                let Some(value) = value.as_ref() else {
                    bail!("usage: setoption name {name} value <true / false>");
                };

                let Ok(enabled) = value.parse() else {
                    bail!("expected bool. got {value:?}");
                };

                self.use_quiescence = enabled;
            }

            // Set the number of search threads
            "Threads" => {
                if value.as_deref() != Some("1") {
                    bail!("{} currently supports only 1 thread", self.name());
                }
            }

            _ => {
                if let Some(value) = value.as_ref() {
                    bail!("Unrecognized option {name:?} with value {value:?}")
                } else {
                    bail!("Unrecognized option {name:?}")
                }
            }
        }

        if self.debug {
            let info = if let Some(value) = value.as_ref() {
                format!("Option {name} set to {value}")
            } else {
                format!("Option {name} toggled")
            };
            Self::send_string(info);
        }

        Ok(())
    }

    /// Returns the current value of the option `name`, if it exists on this engine.
    fn get_option(&self, name: &str) -> Option<String> {
        let value = match name {
            "Quiescence" => format!("{}", self.use_quiescence),

            "Threads" => String::from("1"),

            _ => return None,
        };

        Some(value)
    }

    /// Helper to send a [`UciInfo`](uci_parser::UciInfo) containing only a `string` message to `stdout`.
    #[inline(always)]
    fn send_string<T: fmt::Display>(info: T) {
        println!("{}", UciResponse::info_string(info));
    }
}

impl Default for Engine {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

/// Loops endlessly to await input via `stdin`, sending all successfully-parsed commands through the supplied `sender`.
fn input_handler(sender: Sender<EngineCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(2048);

    loop {
        // Clear the buffer, read input, and trim the trailing newline
        buffer.clear();
        let bytes = io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read line when parsing UCI commands")?;

        // For ctrl + d
        if 0 == bytes {
            // Send the Quit command and exit this function
            sender
                .send(EngineCommand::Exit { cleanup: false })
                .context("Failed to send 'quit' command after receiving empty input")?;

            bail!("Engine received input of 0 bytes and is quitting");
        }

        // Trim any leading/trailing whitespace
        let buf = buffer.trim();

        // Ignore empty lines
        if buf.is_empty() {
            continue;
        }

        // Attempt to parse the input as a UCI command first, since that's the primary use case of the engine
        match UciCommand::new(buf) {
            Ok(cmd) => sender
                .send(EngineCommand::Uci { cmd })
                .context("Failed to send UCI command to engine")?,

            // If it's not a UCI command, check if it's an engine-specific command
            Err(UciParseError::UnrecognizedCommand { cmd: _ }) => match buf.parse() {
                Ok(cmd) => sender
                    .send(cmd)
                    .context("Failed to send command to engine")?,

                // If it wasn't a custom command, either, print an error.
                Err(err) => err.print()?,
            },

            // If it was a UCI command, print a usage message.
            Err(uci_err) => eprintln!("{uci_err:#}"),
        }
    }
}
