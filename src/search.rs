/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    marker::PhantomData,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use anyhow::{bail, Result};
use arrayvec::ArrayVec;
use uci_parser::{UciInfo, UciResponse, UciSearchOptions};

use crate::{
    evaluate_relative, generate_legal_captures, generate_legal_moves, tune, Board, ChessError,
    Killers, LogLevel, LogNone, Move, MovePicker, Score, ZobristKey,
};

/// Maximum depth that can be searched
pub const MAX_DEPTH: usize = 64;

/// Maximum number of plies the quiescence search may add below a leaf.
pub const MAX_QSEARCH_DEPTH: usize = 32;

/// Killers for nodes where none have been recorded.
const NO_KILLERS: Killers = [None; 2];

/// Represents the best sequence of moves found during a search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrincipalVariation(ArrayVec<Move, MAX_DEPTH>);

impl PrincipalVariation {
    /// An empty PV.
    const EMPTY: Self = Self(ArrayVec::new_const());

    /// The moves of this PV, starting from the root.
    #[inline(always)]
    pub fn moves(&self) -> &[Move] {
        &self.0
    }

    /// The move at `ply`, if the PV is that long.
    #[inline(always)]
    pub fn get(&self, ply: usize) -> Option<Move> {
        self.0.get(ply).copied()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Clears the moves of `self`.
    #[inline(always)]
    fn clear(&mut self) {
        self.0.clear();
    }

    /// Replace the contents of `self` with `mv` followed by the contents of `other`.
    #[inline(always)]
    fn extend(&mut self, mv: Move, other: &Self) {
        self.clear();
        self.0.push(mv);
        self.0
            .try_extend_from_slice(&other.0)
            .unwrap_or_else(|err| {
                panic!(
                    "{err}: Attempted to exceed PV capacity of {MAX_DEPTH} pushing {mv:?} and {:?}",
                    &other.0
                );
            });
    }
}

impl Default for PrincipalVariation {
    #[inline(always)]
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for PrincipalVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let moves = self.0.iter().map(Move::to_string).collect::<Vec<_>>();
        write!(f, "{}", moves.join(" "))
    }
}

/// The result of a search, containing the best move found, score, and total nodes searched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchResult {
    /// Number of nodes searched.
    pub nodes: u64,

    /// Best move found during the search.
    ///
    /// `None` only if the side to move has no legal moves.
    pub bestmove: Option<Move>,

    /// Evaluation of the position from the side-to-move's perspective.
    pub score: Score,

    /// The depth of the last iteration that completed.
    ///
    /// Zero if not even the first iteration could finish within the limits.
    pub depth: usize,

    /// Principal variation of the last completed iteration.
    pub pv: PrincipalVariation,
}

impl Default for SearchResult {
    /// A default search result should initialize to a *very bad* value,
    /// since there isn't a move to play.
    #[inline(always)]
    fn default() -> Self {
        Self {
            nodes: 0,
            bestmove: None,
            score: -Score::INF,
            depth: 0,
            pv: PrincipalVariation::EMPTY,
        }
    }
}

/// Configuration variables for executing a [`Search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Maximum depth to execute the search.
    pub max_depth: usize,

    /// Node allowance.
    ///
    /// If the search exceeds this many nodes, it will exit as quickly as possible.
    pub max_nodes: u64,

    /// Hard limit on search time.
    ///
    /// During *any* point in the search, if this limit is exceeded, the search will cancel
    /// and fall back to the last completed iteration.
    pub time_limit: Option<Duration>,

    /// Soft limit on search time.
    ///
    /// During iterative deepening, if an iteration concludes and this timeout is exceeded,
    /// no deeper iteration is started, since there probably isn't enough time to finish one.
    pub soft_time_limit: Option<Duration>,

    /// Whether leaves are resolved with a capture-only search instead of a static evaluation.
    pub use_quiescence: bool,
}

impl SearchConfig {
    /// Constructs a new [`SearchConfig`] from the provided UCI options and board.
    ///
    /// The [`Board`] is used to determine side to move when computing the soft/hard timeouts.
    /// Depths outside of `[1, MAX_DEPTH]` are clamped into it.
    pub fn new(options: UciSearchOptions, board: &Board) -> Self {
        let mut config = Self::default();

        // If supplied, set the max depth / node allowance
        if let Some(depth) = options.depth {
            config.max_depth = (depth as usize).clamp(1, MAX_DEPTH);
        }

        if let Some(nodes) = options.nodes {
            config.max_nodes = (nodes as u64).max(1);
        }

        // Never hand the search a budget it cannot even start with
        let at_least_1ms = |time: Duration| time.max(Duration::from_millis(1));

        // If `movetime` was supplied, search that long.
        if let Some(movetime) = options.movetime {
            config.time_limit = Some(at_least_1ms(movetime));
            config.soft_time_limit = Some(at_least_1ms(movetime));
        } else {
            // Otherwise, search based on time remaining and increment
            let (time, inc) = if board.side_to_move().is_white() {
                (options.wtime, options.winc)
            } else {
                (options.btime, options.binc)
            };

            // Only calculate timeouts if a time was provided
            if let Some(time) = time {
                let inc = inc.unwrap_or(Duration::ZERO) / tune::time_inc_divisor!();

                config.soft_time_limit =
                    Some(at_least_1ms(time / tune::soft_timeout_divisor!() + inc));
                config.time_limit = Some(at_least_1ms(time / tune::hard_timeout_divisor!() + inc));
            }
        }

        config
    }

    /// Fixed-depth configuration with no time or node limits.
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// let config = SearchConfig::with_depth(4);
    /// assert_eq!(config.max_depth, 4);
    /// assert!(config.time_limit.is_none());
    /// ```
    #[inline(always)]
    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Default::default()
        }
    }

    /// Rejects configurations a search cannot honor.
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// assert!(SearchConfig::with_depth(0).validate().is_err());
    /// assert!(SearchConfig::with_depth(MAX_DEPTH + 1).validate().is_err());
    /// assert!(SearchConfig::with_depth(3).validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), ChessError> {
        if self.max_depth == 0 {
            return Err(ChessError::InvalidSearchConfig(String::from(
                "depth must be at least 1",
            )));
        }

        if self.max_depth > MAX_DEPTH {
            return Err(ChessError::InvalidSearchConfig(format!(
                "depth {} exceeds the maximum of {MAX_DEPTH}",
                self.max_depth
            )));
        }

        if self.max_nodes == 0 {
            return Err(ChessError::InvalidSearchConfig(String::from(
                "node allowance must be at least 1",
            )));
        }

        let zero = Some(Duration::ZERO);
        if self.time_limit == zero || self.soft_time_limit == zero {
            return Err(ChessError::InvalidSearchConfig(String::from(
                "time budget must be positive",
            )));
        }

        Ok(())
    }
}

impl Default for SearchConfig {
    /// A default [`SearchConfig`] will permit an "infinite" search.
    ///
    /// The word "infinite" is quoted here because the depth is still bounded by [`MAX_DEPTH`].
    #[inline(always)]
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_nodes: u64::MAX,
            time_limit: None,
            soft_time_limit: None,
            use_quiescence: true,
        }
    }
}

/// Searches `board` with alpha-beta pruning, returning the best move found.
///
/// Invalid configurations (such as a depth of 0) are rejected before any searching happens.
///
/// # Example
/// ```
/// # use gambit::*;
/// let board = Board::from_fen("k7/8/KQ6/8/8/8/8/8 w - - 0 1").unwrap();
/// let res = search(&board, SearchConfig::with_depth(2)).unwrap();
/// assert_eq!(res.score.moves_to_mate(), 1);
///
/// assert!(search(&board, SearchConfig::with_depth(0)).is_err());
/// ```
pub fn search(board: &Board, config: SearchConfig) -> Result<SearchResult, ChessError> {
    config.validate()?;

    let is_searching = Arc::new(AtomicBool::new(true));
    Ok(Search::<LogNone>::new(is_searching, config, Vec::new()).start(board))
}

/// Searches `board` like [`search`], but without pruning: every node of the tree is visited.
///
/// Moves are tried in the same order, and leaves and terminal positions are scored the same way,
/// so this always agrees with [`search`] on both the move and the score. It exists to verify that.
pub fn minimax(board: &Board, config: SearchConfig) -> Result<SearchResult, ChessError> {
    config.validate()?;

    let is_searching = Arc::new(AtomicBool::new(true));
    let mut search = Search::<LogNone>::new(is_searching, config, Vec::new());
    Ok(search.iterative_deepening::<false>(&mut board.clone()))
}

/// Executes a search on a chess position.
pub struct Search<Log> {
    /// Number of nodes searched.
    nodes: u64,

    /// An atomic flag to determine if the search should be cancelled at any time.
    ///
    /// If this is ever `false`, the search must exit as soon as possible.
    is_searching: Arc<AtomicBool>,

    /// Configuration variables for this instance of the search.
    config: SearchConfig,

    /// When this search was created.
    starttime: Instant,

    /// Keys of every position before the current one: game history, then the search path.
    prev_keys: Vec<ZobristKey>,

    /// Quiet moves that caused a beta cutoff, per ply.
    killers: [Killers; MAX_DEPTH + 1],

    /// Principal variation of the last completed iteration, tried first by the next.
    prev_pv: PrincipalVariation,

    /// Marker for the level of logging to print.
    log: PhantomData<Log>,
}

impl<Log: LogLevel> Search<Log> {
    /// Construct a new [`Search`] instance to execute.
    ///
    /// `prev_keys` are the keys of the positions played before the one being searched, oldest first.
    #[inline(always)]
    pub fn new(
        is_searching: Arc<AtomicBool>,
        config: SearchConfig,
        prev_keys: Vec<ZobristKey>,
    ) -> Self {
        Self {
            nodes: 0,
            is_searching,
            config,
            starttime: Instant::now(),
            prev_keys,
            killers: [NO_KILLERS; MAX_DEPTH + 1],
            prev_pv: PrincipalVariation::EMPTY,
            log: PhantomData,
        }
    }

    /// Start the search on the supplied [`Board`], returning a [`SearchResult`].
    ///
    /// This is the entrypoint of the search. It prints UCI info during iterative deepening
    /// and concludes by sending the `bestmove` message.
    pub fn start(mut self, board: &Board) -> SearchResult {
        if Log::DEBUG {
            self.send_string(format!("Starting search on {:?}", board.to_fen()));

            if let Some(hard) = self.config.time_limit {
                self.send_string(format!("Hard timeout := {}ms", hard.as_millis()));
            }
            if let Some(soft) = self.config.soft_time_limit {
                self.send_string(format!("Soft timeout := {}ms", soft.as_millis()));
            }
            if self.config.max_nodes < u64::MAX {
                self.send_string(format!("Max nodes := {} nodes", self.config.max_nodes));
            }
            if self.config.max_depth < MAX_DEPTH {
                self.send_string(format!("Max depth := {}", self.config.max_depth));
            }
        }

        // The search owns its own copy, so the caller's board is never aliased
        let mut board = board.clone();
        let res = self.iterative_deepening::<true>(&mut board);

        // Search has ended; send bestmove
        if Log::INFO {
            self.send_response(UciResponse::BestMove {
                bestmove: res.bestmove,
                ponder: None,
            });
        }

        // Search has concluded, alert other thread(s) that we are no longer searching
        self.is_searching.store(false, Ordering::Relaxed);

        res
    }

    /// Sends a [`UciResponse`] to `stdout`.
    #[inline(always)]
    fn send_response<T: fmt::Display>(&self, response: UciResponse<T>) {
        println!("{response}");
    }

    /// Helper to send a [`UciInfo`] containing only a `string` message to `stdout`.
    #[inline(always)]
    fn send_string<T: fmt::Display>(&self, string: T) {
        self.send_response(UciResponse::info_string(string));
    }

    /// Sends UCI info about the iteration that just completed.
    fn send_iteration_info(&self, result: &SearchResult) {
        let elapsed = self.starttime.elapsed();

        let info = UciInfo::new()
            .depth(result.depth)
            .nodes(self.nodes)
            .score(result.score.into_uci())
            .nps((self.nodes as f32 / elapsed.as_secs_f32()).trunc())
            .time(elapsed.as_millis())
            .pv(result.pv.moves().iter().map(Move::to_string));

        self.send_response(UciResponse::info(info));
    }

    /// Performs [iterative deepening](https://www.chessprogramming.org/Iterative_Deepening) (ID) on `board`.
    ///
    /// Each iteration searches one ply deeper than the last, trying the previous iteration's
    /// principal variation first. If an iteration is cancelled partway through, its results are
    /// discarded and the last completed iteration is returned.
    ///
    /// If `PRUNE` is unset, the unpruned [`Search::minimax`] is used instead of [`Search::negamax`].
    fn iterative_deepening<const PRUNE: bool>(&mut self, board: &mut Board) -> SearchResult {
        // Until an iteration completes, fall back to the most promising-looking move
        let moves = generate_legal_moves(board);
        let mut result = SearchResult {
            bestmove: MovePicker::for_node(board, moves, None, &NO_KILLERS)
                .next()
                .map(|(mv, _)| mv),
            ..Default::default()
        };

        let mut depth = 1;
        while depth <= self.config.max_depth
            && !self.soft_limit_reached()
            && self.is_searching.load(Ordering::Relaxed)
        {
            let mut pv = PrincipalVariation::default();

            let outcome = if PRUNE {
                self.negamax(board, depth, 0, -Score::INF, Score::INF, &mut pv)
            } else {
                self.minimax(board, depth, 0, &mut pv)
            };

            // If the search returned an error, it was cancelled, so exit the iterative deepening loop.
            let score = match outcome {
                Ok(score) => score,
                Err(err) => {
                    if Log::DEBUG {
                        self.send_string(format!("Search cancelled during depth {depth}: {err}"));
                        self.send_string(format!(
                            "Falling back to result from depth {}: {} with score {}",
                            result.depth,
                            result.bestmove.unwrap_or_default(),
                            result.score,
                        ));
                    }
                    break;
                }
            };

            result.score = score;
            result.depth = depth;
            result.bestmove = pv.get(0).or(result.bestmove);
            result.nodes = self.nodes;
            result.pv = pv.clone();
            self.prev_pv = pv;

            if Log::INFO {
                self.send_iteration_info(&result);
            }

            // The game is already over; deeper searches cannot change that
            if result.pv.is_empty() {
                break;
            }

            depth += 1;
        }

        result.nodes = self.nodes;
        result
    }

    /// Primary location of search logic.
    ///
    /// Uses the [negamax](https://www.chessprogramming.org/Negamax) algorithm with fail-soft
    /// [alpha-beta pruning](https://www.chessprogramming.org/Alpha-Beta).
    /// Returns an error if the search was cancelled; the board is restored either way.
    fn negamax(
        &mut self,
        board: &mut Board,
        depth: usize,
        ply: usize,
        mut alpha: Score,
        beta: Score,
        pv: &mut PrincipalVariation,
    ) -> Result<Score> {
        self.check_limits()?;
        self.nodes += 1;

        // Clear any nodes in this PV, since we're searching from a new position
        pv.clear();

        if ply > 0 && self.is_draw(board) {
            return Ok(Score::DRAW);
        }

        // If there are no legal moves, it's either mate or a draw.
        let moves = generate_legal_moves(board);
        if moves.is_empty() {
            return Ok(terminal_score(board, ply));
        }

        if depth == 0 {
            return self.leaf(board, alpha, beta);
        }

        let killers = self.killers[ply];
        let picker = MovePicker::for_node(board, moves, self.prev_pv.get(ply), &killers);

        // Start with a *really bad* initial score
        let mut best = -Score::INF;
        let mut local_pv = PrincipalVariation::default();

        for (mv, _) in picker {
            let score = -self.with_move_made(board, mv, |search, board| {
                search.negamax(board, depth - 1, ply + 1, -beta, -alpha, &mut local_pv)
            })?;

            // If we've found a better move than our current best, update the results
            if score > best {
                best = score;

                // PV found
                if score > alpha {
                    alpha = score;
                    pv.extend(mv, &local_pv);
                }

                // Fail high
                if score >= beta {
                    if !mv.is_capture() && !mv.is_promotion() {
                        self.store_killer(ply, mv);
                    }
                    break;
                }
            }
        }

        Ok(best)
    }

    /// Plain [minimax](https://www.chessprogramming.org/Minimax) in negamax form: no window, no cutoffs.
    ///
    /// Shares move ordering, draw detection, and leaf scoring with [`Search::negamax`].
    fn minimax(
        &mut self,
        board: &mut Board,
        depth: usize,
        ply: usize,
        pv: &mut PrincipalVariation,
    ) -> Result<Score> {
        self.check_limits()?;
        self.nodes += 1;
        pv.clear();

        if ply > 0 && self.is_draw(board) {
            return Ok(Score::DRAW);
        }

        let moves = generate_legal_moves(board);
        if moves.is_empty() {
            return Ok(terminal_score(board, ply));
        }

        if depth == 0 {
            return self.leaf(board, -Score::INF, Score::INF);
        }

        let picker = MovePicker::for_node(board, moves, self.prev_pv.get(ply), &NO_KILLERS);

        let mut best = -Score::INF;
        let mut local_pv = PrincipalVariation::default();

        for (mv, _) in picker {
            let score = -self.with_move_made(board, mv, |search, board| {
                search.minimax(board, depth - 1, ply + 1, &mut local_pv)
            })?;

            if score > best {
                best = score;
                pv.extend(mv, &local_pv);
            }
        }

        Ok(best)
    }

    /// Scores a node at depth 0, from the side-to-move's perspective.
    #[inline(always)]
    fn leaf(&mut self, board: &mut Board, alpha: Score, beta: Score) -> Result<Score> {
        if self.config.use_quiescence {
            self.quiescence(board, 0, alpha, beta)
        } else {
            Ok(evaluate_relative(board))
        }
    }

    /// [Quiescence search](https://www.chessprogramming.org/Quiescence_Search).
    ///
    /// Looks only at captures and promotions until the position is quiet, to avoid the horizon effect.
    /// The side to move may always "stand pat" and keep the static evaluation instead.
    fn quiescence(
        &mut self,
        board: &mut Board,
        qdepth: usize,
        mut alpha: Score,
        beta: Score,
    ) -> Result<Score> {
        self.check_limits()?;

        // The node at qdepth 0 was already counted by the main search
        if qdepth > 0 {
            self.nodes += 1;
        }

        // Evaluate the current position, to serve as our baseline
        let stand_pat = evaluate_relative(board);

        // Beta cutoff; this position is "too good" and our opponent would never let us get here
        if stand_pat >= beta || qdepth >= MAX_QSEARCH_DEPTH {
            return Ok(stand_pat);
        }
        alpha = alpha.max(stand_pat);

        let captures = generate_legal_captures(board);
        let mut best = stand_pat;

        for (mv, _) in MovePicker::for_node(board, captures, None, &NO_KILLERS) {
            let score = -self.with_move_made(board, mv, |search, board| {
                search.quiescence(board, qdepth + 1, -beta, -alpha)
            })?;

            if score > best {
                best = score;

                if score > alpha {
                    alpha = score;
                }

                if score >= beta {
                    break;
                }
            }
        }

        Ok(best)
    }

    /// Makes `mv` on `board`, runs `f` on the resulting position, and restores `board`.
    ///
    /// The key of the position `mv` was made from is on the history for the duration of `f`.
    #[inline(always)]
    fn with_move_made<T>(
        &mut self,
        board: &mut Board,
        mv: Move,
        f: impl FnOnce(&mut Self, &mut Board) -> T,
    ) -> T {
        self.prev_keys.push(board.key());
        let result = board.with_move_made(mv, |board| f(self, board));
        self.prev_keys.pop();
        result
    }

    /// Remembers `mv` as the newest killer at `ply`.
    #[inline(always)]
    fn store_killer(&mut self, ply: usize, mv: Move) {
        let killers = &mut self.killers[ply];
        if killers[0] != Some(mv) {
            killers[1] = killers[0];
            killers[0] = Some(mv);
        }
    }

    /// Returns `true` if the soft time limit has passed, so no new iteration should start.
    #[inline(always)]
    fn soft_limit_reached(&self) -> bool {
        self.config
            .soft_time_limit
            .is_some_and(|soft| self.starttime.elapsed() >= soft)
    }

    /// Checks if we've exceeded any conditions that would warrant the search to end.
    #[inline(always)]
    fn check_limits(&self) -> Result<()> {
        // Condition 1: We've exceeded the hard limit of our allotted search time
        if let Some(hard) = self.config.time_limit {
            if self.starttime.elapsed() >= hard {
                bail!("exceeded hard timeout of {}ms", hard.as_millis());
            }
        }

        // Condition 2: The search was stopped by an external factor, like the `stop` command
        if !self.is_searching.load(Ordering::Relaxed) {
            bail!("cancelled by external command");
        }

        // Condition 3: We've exceeded the maximum amount of nodes we're allowed to search
        if self.nodes >= self.config.max_nodes {
            bail!("exceeded node allowance of {} nodes", self.config.max_nodes);
        }

        Ok(())
    }

    /// Checks if `board` is a repetition of an earlier position with the same side to move.
    #[inline(always)]
    fn is_repetition(&self, board: &Board) -> bool {
        // Only positions since the last irreversible move can repeat, and the previous one never can.
        self.prev_keys
            .iter()
            .rev()
            .take(board.halfmove())
            .skip(1)
            .step_by(2)
            .any(|&key| key == board.key())
    }

    /// Returns `true` if `board` can be claimed as a draw
    #[inline(always)]
    fn is_draw(&self, board: &Board) -> bool {
        board.can_draw_by_fifty()
            || board.can_draw_by_insufficient_material()
            || self.is_repetition(board)
    }
}

/// Score of a position where the side to move has no legal moves, `ply` plies from the root.
#[inline(always)]
fn terminal_score(board: &Board, ply: usize) -> Score {
    if board.in_check(board.side_to_move()) {
        // Offset by ply to prefer earlier mates
        Score::mated_in(ply)
    } else {
        // Drawing is better than losing
        Score::DRAW
    }
}
