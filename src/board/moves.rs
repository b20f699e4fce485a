/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::ChessError;

use super::{generate_legal_moves, Board, PieceKind, Square};

/// Upper bound on the number of pseudo-legal moves in any reachable position.
///
/// The largest known legal move count is 218; pseudo-legal generation can exceed it slightly.
pub const MAX_NUM_MOVES: usize = 256;

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_NUM_MOVES>;

/// The classification of a [`Move`].
///
/// Values are the flag bits of the [`Move`] encoding, taken from the
/// [chess programming wiki](https://www.chessprogramming.org/Encoding_Moves#From-To_Based).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum MoveKind {
    /// A piece moves to an empty square.
    Quiet = 0 << Move::FLG_BITS,

    /// A Pawn advances two squares from its starting rank.
    PawnDoublePush = 1 << Move::FLG_BITS,

    /// The King castles towards the h-file.
    ShortCastle = 2 << Move::FLG_BITS,

    /// The King castles towards the a-file.
    LongCastle = 3 << Move::FLG_BITS,

    /// A piece moves onto an enemy piece, removing it.
    Capture = 4 << Move::FLG_BITS,

    /// A Pawn captures an enemy Pawn that just double-pushed past it.
    EnPassantCapture = 5 << Move::FLG_BITS,

    PromoteKnight = 8 << Move::FLG_BITS,
    PromoteBishop = 9 << Move::FLG_BITS,
    PromoteRook = 10 << Move::FLG_BITS,
    PromoteQueen = 11 << Move::FLG_BITS,

    CaptureAndPromoteKnight = 12 << Move::FLG_BITS,
    CaptureAndPromoteBishop = 13 << Move::FLG_BITS,
    CaptureAndPromoteRook = 14 << Move::FLG_BITS,
    CaptureAndPromoteQueen = 15 << Move::FLG_BITS,
}

impl MoveKind {
    /// Creates a non-capturing promotion to `promotion`.
    ///
    /// # Panics
    /// If `promotion` is a Pawn or a King.
    #[inline(always)]
    pub fn promotion(promotion: PieceKind) -> Self {
        match promotion {
            PieceKind::Knight => Self::PromoteKnight,
            PieceKind::Bishop => Self::PromoteBishop,
            PieceKind::Rook => Self::PromoteRook,
            PieceKind::Queen => Self::PromoteQueen,
            _ => unreachable!("cannot promote to {promotion:?}"),
        }
    }

    /// Creates a capturing promotion to `promotion`.
    ///
    /// # Panics
    /// If `promotion` is a Pawn or a King.
    #[inline(always)]
    pub fn promotion_capture(promotion: PieceKind) -> Self {
        match promotion {
            PieceKind::Knight => Self::CaptureAndPromoteKnight,
            PieceKind::Bishop => Self::CaptureAndPromoteBishop,
            PieceKind::Rook => Self::CaptureAndPromoteRook,
            PieceKind::Queen => Self::CaptureAndPromoteQueen,
            _ => unreachable!("cannot promote to {promotion:?}"),
        }
    }

    /// Decodes the flag bits of a [`Move`].
    #[inline(always)]
    const fn from_flags(flags: u16) -> Self {
        match flags >> Move::FLG_BITS {
            0 => Self::Quiet,
            1 => Self::PawnDoublePush,
            2 => Self::ShortCastle,
            3 => Self::LongCastle,
            4 => Self::Capture,
            5 => Self::EnPassantCapture,
            8 => Self::PromoteKnight,
            9 => Self::PromoteBishop,
            10 => Self::PromoteRook,
            11 => Self::PromoteQueen,
            12 => Self::CaptureAndPromoteKnight,
            13 => Self::CaptureAndPromoteBishop,
            14 => Self::CaptureAndPromoteRook,
            _ => Self::CaptureAndPromoteQueen,
        }
    }
}

impl fmt::Display for MoveKind {
    /// Displays a human-readable description for this [`MoveKind`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Quiet => "Quiet",
            Self::PawnDoublePush => "Pawn Double Push",
            Self::EnPassantCapture => "En Passant Capture",
            Self::ShortCastle => "Short Castle",
            Self::LongCastle => "Long Castle",
            Self::Capture => "Capture",
            Self::PromoteQueen => "Promotion (Queen)",
            Self::PromoteKnight => "Promotion (Knight)",
            Self::PromoteRook => "Promotion (Rook)",
            Self::PromoteBishop => "Promotion (Bishop)",
            Self::CaptureAndPromoteQueen => "Capture and Promotion (Queen)",
            Self::CaptureAndPromoteKnight => "Capture and Promotion (Knight)",
            Self::CaptureAndPromoteRook => "Capture and Promotion (Rook)",
            Self::CaptureAndPromoteBishop => "Capture and Promotion (Bishop)",
        };

        write!(f, "{s}")
    }
}

/// A move on the board, packed into 16 bits:
/// ```text
///     0000 000000 000000
///      |     |      |
///      |     |      +- Source square of the move.
///      |     +- Target square of the move.
///      +- MoveKind flags.
/// ```
///
/// Castling is stored as the King's own move (`e1g1`, `e8c8`), so the `to` square is
/// always where the moving piece lands.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Move(u16);

impl Move {
    const SRC_MASK: u16 = 0b0000_0000_0011_1111;
    const DST_MASK: u16 = 0b0000_1111_1100_0000;
    const FLG_MASK: u16 = 0b1111_0000_0000_0000;
    const DST_BITS: u16 = 6;
    const FLG_BITS: u16 = 12;

    const FLAG_CAPTURE: u16 = 4 << Self::FLG_BITS;
    const FLAG_PROMOTION: u16 = 8 << Self::FLG_BITS;

    /// Creates a new [`Move`] from the given [`Square`]s and a [`MoveKind`].
    ///
    /// # Example
    /// ```
    /// # use gambit::{Move, Square, MoveKind, PieceKind};
    /// let e2e4 = Move::new(Square::E2, Square::E4, MoveKind::PawnDoublePush);
    /// assert_eq!(e2e4.to_string(), "e2e4");
    ///
    /// let e7e8n = Move::new(Square::E7, Square::E8, MoveKind::promotion(PieceKind::Knight));
    /// assert_eq!(e7e8n.to_string(), "e7e8n");
    /// ```
    #[inline(always)]
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Self {
        Self(kind as u16 | (to.index() as u16) << Self::DST_BITS | from.index() as u16)
    }

    /// A placeholder [`Move`] from `a1` to `a1`. Never produced by move generation.
    #[inline(always)]
    pub const fn illegal() -> Self {
        Self(0)
    }

    /// The square this [`Move`] starts on.
    #[inline(always)]
    pub const fn from(&self) -> Square {
        Square::from_index_unchecked((self.0 & Self::SRC_MASK) as usize)
    }

    /// The square this [`Move`] ends on.
    #[inline(always)]
    pub const fn to(&self) -> Square {
        Square::from_index_unchecked(((self.0 & Self::DST_MASK) >> Self::DST_BITS) as usize)
    }

    /// Fetches the [`MoveKind`] part of this [`Move`].
    ///
    /// # Example
    /// ```
    /// # use gambit::{Move, MoveKind, PieceKind, Square};
    /// let e7e8q = Move::new(Square::E7, Square::E8, MoveKind::promotion(PieceKind::Queen));
    /// assert_eq!(e7e8q.kind(), MoveKind::PromoteQueen);
    /// ```
    #[inline(always)]
    pub const fn kind(&self) -> MoveKind {
        MoveKind::from_flags(self.0 & Self::FLG_MASK)
    }

    /// Returns `true` if this [`Move`] removes an enemy piece, including en passant and capture-promotions.
    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        self.0 & Self::FLAG_CAPTURE != 0
    }

    /// Returns `true` if this [`Move`] is not a capture of any kind.
    ///
    /// Castling, double pushes and non-capturing promotions are all quiet.
    #[inline(always)]
    pub const fn is_quiet(&self) -> bool {
        !self.is_capture()
    }

    #[inline(always)]
    pub const fn is_en_passant(&self) -> bool {
        matches!(self.kind(), MoveKind::EnPassantCapture)
    }

    #[inline(always)]
    pub const fn is_short_castle(&self) -> bool {
        matches!(self.kind(), MoveKind::ShortCastle)
    }

    #[inline(always)]
    pub const fn is_long_castle(&self) -> bool {
        matches!(self.kind(), MoveKind::LongCastle)
    }

    #[inline(always)]
    pub const fn is_castle(&self) -> bool {
        self.is_short_castle() || self.is_long_castle()
    }

    #[inline(always)]
    pub const fn is_pawn_double_push(&self) -> bool {
        matches!(self.kind(), MoveKind::PawnDoublePush)
    }

    /// Returns `true` if this [`Move`] promotes a Pawn, with or without a capture.
    ///
    /// # Example
    /// ```
    /// # use gambit::{Move, MoveKind, PieceKind, Square};
    /// let e7e8q = Move::new(Square::E7, Square::E8, MoveKind::promotion(PieceKind::Queen));
    /// assert!(e7e8q.is_promotion());
    ///
    /// let e7d8q = Move::new(Square::E7, Square::D8, MoveKind::promotion_capture(PieceKind::Queen));
    /// assert!(e7d8q.is_promotion());
    /// ```
    #[inline(always)]
    pub const fn is_promotion(&self) -> bool {
        self.0 & Self::FLAG_PROMOTION != 0
    }

    /// The [`PieceKind`] a Pawn promotes to, if this is a promotion.
    #[inline(always)]
    pub const fn promotion(&self) -> Option<PieceKind> {
        match self.kind() {
            MoveKind::PromoteQueen | MoveKind::CaptureAndPromoteQueen => Some(PieceKind::Queen),
            MoveKind::PromoteRook | MoveKind::CaptureAndPromoteRook => Some(PieceKind::Rook),
            MoveKind::PromoteBishop | MoveKind::CaptureAndPromoteBishop => Some(PieceKind::Bishop),
            MoveKind::PromoteKnight | MoveKind::CaptureAndPromoteKnight => Some(PieceKind::Knight),
            _ => None,
        }
    }

    /// Parses a move in coordinate notation (`e2e4`, `e7e8q`) and resolves it against the
    /// legal moves of `board`.
    ///
    /// The promotion letter is case-insensitive. Anything that does not name one of the legal
    /// moves is rejected with [`ChessError::InvalidMove`].
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// let board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    /// let castle = Move::from_uci(&board, "e1g1").unwrap();
    /// assert_eq!(castle.kind(), MoveKind::ShortCastle);
    ///
    /// assert!(Move::from_uci(&board, "e1e3").is_err());
    /// assert!(Move::from_uci(&board, "castle").is_err());
    /// ```
    pub fn from_uci(board: &Board, uci: &str) -> Result<Self, ChessError> {
        let uci = uci.trim().to_ascii_lowercase();

        let (Some(from), Some(to)) = (uci.get(0..2), uci.get(2..4)) else {
            return Err(ChessError::InvalidMove(format!(
                "{uci:?} is not in coordinate notation"
            )));
        };
        if uci.len() > 5 || Square::from_uci(from).is_err() || Square::from_uci(to).is_err() {
            return Err(ChessError::InvalidMove(format!(
                "{uci:?} is not in coordinate notation"
            )));
        }

        generate_legal_moves(board)
            .into_iter()
            .find(|mv| mv.to_uci() == uci)
            .ok_or_else(|| {
                ChessError::InvalidMove(format!("{uci} is not legal in {}", board.to_fen()))
            })
    }

    /// Converts this [`Move`] to coordinate notation, with a lowercase promotion letter.
    ///
    /// # Example
    /// ```
    /// # use gambit::{Move, Square, MoveKind, PieceKind};
    /// let e7e8q = Move::new(Square::E7, Square::E8, MoveKind::promotion(PieceKind::Queen));
    /// assert_eq!(e7e8q.to_uci(), "e7e8q");
    /// let e1g1 = Move::new(Square::E1, Square::G1, MoveKind::ShortCastle);
    /// assert_eq!(e1g1.to_uci(), "e1g1")
    /// ```
    #[inline(always)]
    pub fn to_uci(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(promote) = self.promotion() {
            write!(f, "{}{}{}", self.from(), self.to(), promote)
        } else {
            write!(f, "{}{}", self.from(), self.to())
        }
    }
}

impl fmt::Debug for Move {
    /// Prints the coordinate notation followed by the human-readable [`MoveKind`].
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({})", self.kind())
    }
}

impl Default for Move {
    /// See [`Move::illegal`].
    #[inline(always)]
    fn default() -> Self {
        Self::illegal()
    }
}

impl<T: AsRef<str>> PartialEq<T> for Move {
    #[inline(always)]
    fn eq(&self, other: &T) -> bool {
        self.to_uci().eq_ignore_ascii_case(other.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [MoveKind; 14] = [
        MoveKind::Quiet,
        MoveKind::PawnDoublePush,
        MoveKind::ShortCastle,
        MoveKind::LongCastle,
        MoveKind::Capture,
        MoveKind::EnPassantCapture,
        MoveKind::PromoteKnight,
        MoveKind::PromoteBishop,
        MoveKind::PromoteRook,
        MoveKind::PromoteQueen,
        MoveKind::CaptureAndPromoteKnight,
        MoveKind::CaptureAndPromoteBishop,
        MoveKind::CaptureAndPromoteRook,
        MoveKind::CaptureAndPromoteQueen,
    ];

    #[test]
    fn test_move_parts_survive_packing() {
        for kind in ALL_KINDS {
            for (from, to) in [
                (Square::A1, Square::H8),
                (Square::H8, Square::A1),
                (Square::E7, Square::D8),
            ] {
                let mv = Move::new(from, to, kind);
                assert_eq!(mv.from(), from);
                assert_eq!(mv.to(), to);
                assert_eq!(mv.kind(), kind);
            }
        }
    }

    #[test]
    fn test_move_flag_queries() {
        let (from, to) = (Square::A1, Square::H8);
        let captures = [
            MoveKind::Capture,
            MoveKind::EnPassantCapture,
            MoveKind::CaptureAndPromoteKnight,
            MoveKind::CaptureAndPromoteBishop,
            MoveKind::CaptureAndPromoteRook,
            MoveKind::CaptureAndPromoteQueen,
        ];

        for kind in ALL_KINDS {
            let mv = Move::new(from, to, kind);
            assert_eq!(mv.is_capture(), captures.contains(&kind), "{mv:?}");
            assert_eq!(mv.is_quiet(), !captures.contains(&kind), "{mv:?}");
            assert_eq!(mv.is_en_passant(), kind == MoveKind::EnPassantCapture);
            assert_eq!(mv.is_short_castle(), kind == MoveKind::ShortCastle);
            assert_eq!(mv.is_long_castle(), kind == MoveKind::LongCastle);
            assert_eq!(mv.is_pawn_double_push(), kind == MoveKind::PawnDoublePush);
            assert_eq!(mv.is_promotion(), mv.promotion().is_some());
        }
    }

    fn assert_parses(fen: &str, uci: &str, expected: Move) {
        let board = Board::from_fen(fen).unwrap();
        let mv = Move::from_uci(&board, uci);
        assert!(mv.is_ok(), "{}", mv.unwrap_err());
        assert_eq!(mv.unwrap(), expected, "{uci} is parsed incorrectly on {fen}");
    }

    #[test]
    fn test_move_parsing() {
        let pawn_fen = "2n1k3/1P6/8/5pP1/5n2/2P1P3/P7/4K3 w - f6 0 1";

        let mv = Move::new(Square::A2, Square::A3, MoveKind::Quiet);
        assert_parses(pawn_fen, "a2a3", mv);

        let mv = Move::new(Square::A2, Square::A4, MoveKind::PawnDoublePush);
        assert_parses(pawn_fen, "a2a4", mv);

        let mv = Move::new(Square::E3, Square::F4, MoveKind::Capture);
        assert_parses(pawn_fen, "e3f4", mv);

        let mv = Move::new(Square::G5, Square::F6, MoveKind::EnPassantCapture);
        assert_parses(pawn_fen, "g5f6", mv);

        let mv = Move::new(Square::B7, Square::B8, MoveKind::PromoteQueen);
        assert_parses(pawn_fen, "b7b8Q", mv);

        let mv = Move::new(Square::B7, Square::C8, MoveKind::CaptureAndPromoteKnight);
        assert_parses(pawn_fen, "b7c8n", mv);

        let king_fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let mv = Move::new(Square::E1, Square::G1, MoveKind::ShortCastle);
        assert_parses(king_fen, "e1g1", mv);
        let mv = Move::new(Square::E1, Square::C1, MoveKind::LongCastle);
        assert_parses(king_fen, "e1c1", mv);

        let king_fen = "r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1";
        let mv = Move::new(Square::E8, Square::G8, MoveKind::ShortCastle);
        assert_parses(king_fen, "e8g8", mv);
        let mv = Move::new(Square::E8, Square::C8, MoveKind::LongCastle);
        assert_parses(king_fen, "e8c8", mv);
    }

    #[test]
    fn test_move_parsing_rejects_illegal() {
        let board = Board::default();

        // Wrong side
        assert!(Move::from_uci(&board, "e7e5").is_err());
        // Not a legal destination
        assert!(Move::from_uci(&board, "e2e5").is_err());
        // Promotion letter on a non-promotion
        assert!(Move::from_uci(&board, "e2e4q").is_err());
        // Garbage
        assert!(Move::from_uci(&board, "").is_err());
        assert!(Move::from_uci(&board, "z9a1").is_err());
        assert!(Move::from_uci(&board, "e2e4e5").is_err());

        let promo = Board::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        // A promotion requires the promotion letter
        assert!(Move::from_uci(&promo, "a7a8").is_err());
        assert!(Move::from_uci(&promo, "a7a8k").is_err());
        assert!(Move::from_uci(&promo, "a7a8r").is_ok());
    }

    #[test]
    fn test_move_eq_str() {
        let mv = Move::new(Square::E7, Square::E8, MoveKind::PromoteQueen);
        assert_eq!(mv, "e7e8q");
        assert_eq!(mv, "e7e8Q");
        assert_ne!(mv, "e7e8");
    }
}
