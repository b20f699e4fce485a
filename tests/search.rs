/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::{Duration, Instant};

use gambit::{
    is_checkmate, is_legal, minimax, search, Board, ChessError, SearchConfig, FEN_KIWIPETE,
    FEN_STARTPOS, MAX_DEPTH,
};

fn config(depth: usize, use_quiescence: bool) -> SearchConfig {
    SearchConfig {
        max_depth: depth,
        use_quiescence,
        ..Default::default()
    }
}

/// Pruning must never change what the search concludes.
fn assert_matches_minimax(fen: &str, depth: usize, use_quiescence: bool) {
    let board = Board::from_fen(fen).unwrap();
    let config = config(depth, use_quiescence);

    let pruned = search(&board, config).unwrap();
    let full = minimax(&board, config).unwrap();

    assert_eq!(
        (pruned.bestmove, pruned.score),
        (full.bestmove, full.score),
        "alpha-beta disagrees with minimax on {fen:?} at depth {depth} (quiescence: {use_quiescence})"
    );
    assert_eq!(pruned.depth, full.depth);
    assert!(
        pruned.nodes <= full.nodes,
        "alpha-beta searched more nodes ({}) than minimax ({}) on {fen:?}",
        pruned.nodes,
        full.nodes
    );
}

#[test]
fn test_alpha_beta_matches_minimax() {
    let positions = [
        (FEN_STARTPOS, 3),
        (FEN_KIWIPETE, 2),
        ("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4", 3),
        ("3r2k1/5ppp/8/8/8/8/4RPPP/4R1K1 w - - 0 1", 3),
        ("8/8/8/3k4/8/8/3KP3/8 w - - 0 1", 4),
        ("4r1k1/p4ppp/1p6/2p5/2P5/1P3N2/P4PPP/4R1K1 b - - 0 22", 2),
    ];

    for (fen, depth) in positions {
        assert_matches_minimax(fen, depth, false);
        assert_matches_minimax(fen, depth, true);
    }
}

#[test]
fn test_finds_mate_in_2() {
    // 1. Re8+ Rxe8 2. Rxe8#
    let fen = "3r2k1/5ppp/8/8/8/8/4RPPP/4R1K1 w - - 0 1";
    let board = Board::from_fen(fen).unwrap();

    let res = search(&board, config(4, true)).unwrap();
    assert!(res.score.is_mate());
    assert_eq!(res.score.moves_to_mate(), 2);
    assert_eq!(res.bestmove.unwrap(), "e2e8");

    // The PV plays out the whole mate
    let mut board = board;
    for &mv in res.pv.moves() {
        assert!(is_legal(&board, mv));
        board.make_move(mv);
    }
    assert!(is_checkmate(&board));
}

#[test]
fn test_finds_mate_in_1() {
    let fen = "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4";
    let board = Board::from_fen(fen).unwrap();

    let res = search(&board, config(3, true)).unwrap();
    assert_eq!(res.bestmove.unwrap(), "h5f7");
    assert_eq!(res.score.moves_to_mate(), 1);
}

#[test]
fn test_rejects_invalid_configs() {
    let board = Board::default();

    let depth_zero = search(&board, config(0, true));
    assert!(matches!(depth_zero, Err(ChessError::InvalidSearchConfig(_))));

    let too_deep = search(&board, config(MAX_DEPTH + 1, true));
    assert!(matches!(too_deep, Err(ChessError::InvalidSearchConfig(_))));

    let no_time = SearchConfig {
        time_limit: Some(Duration::ZERO),
        ..Default::default()
    };
    assert!(search(&board, no_time).is_err());
    assert!(minimax(&board, no_time).is_err());
}

#[test]
fn test_search_is_deterministic() {
    for fen in [FEN_STARTPOS, FEN_KIWIPETE] {
        let board = Board::from_fen(fen).unwrap();
        let first = search(&board, config(3, true)).unwrap();
        let second = search(&board, config(3, true)).unwrap();
        assert_eq!(first, second, "search on {fen:?} is not deterministic");
    }
}

#[test]
fn test_honours_time_budget() {
    let board = Board::from_fen(FEN_KIWIPETE).unwrap();
    let budget = Duration::from_millis(100);
    let config = SearchConfig {
        time_limit: Some(budget),
        soft_time_limit: Some(budget),
        ..Default::default()
    };

    let start = Instant::now();
    let res = search(&board, config).unwrap();
    let elapsed = start.elapsed();

    // Cancellation is checked at every node, so the search stops shortly after the budget
    assert!(
        elapsed < budget + Duration::from_secs(1),
        "search took {elapsed:?} with a budget of {budget:?}"
    );
    assert!(is_legal(&board, res.bestmove.unwrap()));
    assert!(res.depth < MAX_DEPTH);
}

#[test]
fn test_quiescence_sees_recapture() {
    // The e5 Pawn is defended, so taking it with the Queen loses the Queen
    let fen = "4k3/8/3p4/4p3/8/8/4Q3/4K3 w - - 0 1";
    let board = Board::from_fen(fen).unwrap();

    let res = search(&board, config(1, true)).unwrap();
    assert_ne!(res.bestmove.unwrap(), "e2e5");
}

#[test]
fn test_checkmated_root_has_no_move() {
    // Fool's mate
    let fen = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
    let board = Board::from_fen(fen).unwrap();

    let res = search(&board, config(3, true)).unwrap();
    assert!(res.bestmove.is_none());
    assert!(res.score.is_mate());
    assert!(res.score < 0);
}
