/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, ensure, Context, Result};

use crate::ChessError;

use super::{
    is_legal, Color, File, Move, Piece, PieceKind, Rank, Square, ZobristKey, BISHOP_DIRECTIONS,
    KING_DELTAS, KNIGHT_DELTAS, ROOK_DIRECTIONS,
};

/// The four castling rights, packed as bit flags.
///
/// A right only records that neither the King nor the relevant Rook has moved or been captured.
/// Whether castling is playable right now is decided by move generation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    /// Number of distinct combinations of rights.
    pub const COUNT: usize = 16;

    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0b1111);

    const WHITE_SHORT: u8 = 0b0001;
    const WHITE_LONG: u8 = 0b0010;
    const BLACK_SHORT: u8 = 0b0100;
    const BLACK_LONG: u8 = 0b1000;

    #[inline(always)]
    const fn short_flag(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_SHORT,
            Color::Black => Self::BLACK_SHORT,
        }
    }

    #[inline(always)]
    const fn long_flag(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_LONG,
            Color::Black => Self::BLACK_LONG,
        }
    }

    /// Returns `true` if `color` may still castle on the King's side.
    #[inline(always)]
    pub const fn short(&self, color: Color) -> bool {
        self.0 & Self::short_flag(color) != 0
    }

    /// Returns `true` if `color` may still castle on the Queen's side.
    #[inline(always)]
    pub const fn long(&self, color: Color) -> bool {
        self.0 & Self::long_flag(color) != 0
    }

    /// Returns `true` if `color` has any castling right left.
    #[inline(always)]
    pub const fn any(&self, color: Color) -> bool {
        self.short(color) || self.long(color)
    }

    /// Removes every right belonging to `color`.
    #[inline(always)]
    pub fn clear(&mut self, color: Color) {
        self.0 &= !(Self::short_flag(color) | Self::long_flag(color));
    }

    /// Removes the rights that depend on a piece standing on `square`.
    ///
    /// Called with both ends of every move: a King or Rook leaving its home square,
    /// or anything landing on a Rook's home square, loses the matching right.
    #[inline(always)]
    fn touch(&mut self, square: Square) {
        self.0 &= !match square {
            Square::E1 => Self::WHITE_SHORT | Self::WHITE_LONG,
            Square::H1 => Self::WHITE_SHORT,
            Square::A1 => Self::WHITE_LONG,
            Square::E8 => Self::BLACK_SHORT | Self::BLACK_LONG,
            Square::H8 => Self::BLACK_SHORT,
            Square::A8 => Self::BLACK_LONG,
            _ => 0,
        };
    }

    /// Index in `[0, 16)`, used for Zobrist hashing.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Parses the castling field of a FEN string (`KQkq`, `Kq`, `-`, ...).
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// let rights = CastlingRights::from_uci("Kq").unwrap();
    /// assert!(rights.short(Color::White));
    /// assert!(!rights.long(Color::White));
    /// assert!(rights.long(Color::Black));
    /// assert!(CastlingRights::from_uci("KK").is_err());
    /// ```
    pub fn from_uci(castling: &str) -> Result<Self> {
        if castling == "-" {
            return Ok(Self::NONE);
        }
        ensure!(!castling.is_empty(), "Castling rights cannot be empty");

        let mut rights = Self::NONE;
        for c in castling.chars() {
            let flag = match c {
                'K' => Self::WHITE_SHORT,
                'Q' => Self::WHITE_LONG,
                'k' => Self::BLACK_SHORT,
                'q' => Self::BLACK_LONG,
                _ => bail!("Invalid castling character {c:?} in {castling:?}"),
            };
            ensure!(
                rights.0 & flag == 0,
                "Duplicate castling character {c:?} in {castling:?}"
            );
            rights.0 |= flag;
        }

        Ok(rights)
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::NONE {
            return write!(f, "-");
        }

        for (flag, c) in [
            (Self::WHITE_SHORT, 'K'),
            (Self::WHITE_LONG, 'Q'),
            (Self::BLACK_SHORT, 'k'),
            (Self::BLACK_LONG, 'q'),
        ] {
            if self.0 & flag != 0 {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Everything [`Board::undo`] needs to restore the position a [`Move`] was made from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct UndoRecord {
    mv: Move,
    captured: Option<Piece>,
    castling_rights: CastlingRights,
    ep_square: Option<Square>,
    halfmove: usize,
    key: ZobristKey,
}

impl UndoRecord {
    /// The [`Move`] that produced this record.
    #[inline(always)]
    pub const fn mv(&self) -> Move {
        self.mv
    }

    /// The piece removed from the board by the move, if any.
    #[inline(always)]
    pub const fn captured(&self) -> Option<Piece> {
        self.captured
    }

    /// Key of the position before the move was made.
    #[inline(always)]
    pub const fn key(&self) -> ZobristKey {
        self.key
    }
}

/// A chess position: piece placement plus all state needed to continue the game.
///
/// Pieces live in a 64-entry mailbox indexed by [`Square`]. Moves are made in place with
/// [`Board::make_move`] and reversed exactly with [`Board::undo`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    mailbox: [Option<Piece>; Square::COUNT],

    /// Cached King locations. There is always exactly one King per side.
    kings: [Square; Color::COUNT],

    side_to_move: Color,
    castling_rights: CastlingRights,
    ep_square: Option<Square>,
    halfmove: usize,
    fullmove: usize,
    key: ZobristKey,
}

impl Board {
    /// Creates a [`Board`] in the standard starting position.
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// assert_eq!(Board::new().to_fen(), FEN_STARTPOS);
    /// ```
    pub fn new() -> Self {
        use PieceKind::*;
        let back_rank = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];

        let mut mailbox = [None; Square::COUNT];
        for (file, kind) in File::iter().zip(back_rank) {
            for color in Color::all() {
                mailbox[Square::new(file, Rank::first(color))] = Some(Piece::new(color, kind));
                mailbox[Square::new(file, Rank::second(color))] =
                    Some(Piece::new(color, PieceKind::Pawn));
            }
        }

        let mut board = Self {
            mailbox,
            kings: [Square::E1, Square::E8],
            side_to_move: Color::White,
            castling_rights: CastlingRights::ALL,
            ep_square: None,
            halfmove: 0,
            fullmove: 1,
            key: ZobristKey::default(),
        };
        board.key = board.compute_key();
        board
    }

    /// Creates a new [`Board`] from the provided FEN string.
    ///
    /// Only the piece placement is required; missing trailing fields default to `w - - 0 1`.
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3").unwrap();
    /// assert_eq!(board.to_fen(), "4k3/8/8/8/8/8/8/4K3 w - - 0 1");
    ///
    /// // Each rank must span exactly 8 files
    /// assert!(Board::from_fen("4k3/8/8/8/8/8/8/4K4 w - - 0 1").is_err());
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        Self::parse_fen(fen).map_err(|err| ChessError::MalformedPosition(format!("{err:#}")))
    }

    fn parse_fen(fen: &str) -> Result<Self> {
        let mut fields = fen.split_ascii_whitespace();

        let placements = fields
            .next()
            .ok_or(anyhow!("FEN string must have piece placements"))?;
        let mailbox = Self::parse_placements(placements)?;

        let side_to_move = match fields.next().unwrap_or("w") {
            "w" => Color::White,
            "b" => Color::Black,
            other => bail!("Side to move must be \"w\" or \"b\". Got {other:?}"),
        };

        let castling_rights = CastlingRights::from_uci(fields.next().unwrap_or("-"))?;

        let ep_square = match fields.next().unwrap_or("-") {
            "-" => None,
            square => {
                let square = Square::from_uci(square).context("Invalid en passant square")?;
                // The target sits behind a Pawn that just double-pushed
                ensure!(
                    (square.rank() == Rank::SIX && side_to_move.is_white())
                        || (square.rank() == Rank::THREE && side_to_move.is_black()),
                    "En passant square {square} is impossible with {} to move",
                    side_to_move.name()
                );

                let pawn = Piece::new(side_to_move.opponent(), PieceKind::Pawn);
                let pushed_to = square.backward_by(side_to_move, 1);
                let pushed_from = square.forward_by(side_to_move, 1);
                ensure!(
                    mailbox[square].is_none()
                        && pushed_to.is_some_and(|sq| mailbox[sq] == Some(pawn))
                        && pushed_from.is_some_and(|sq| mailbox[sq].is_none()),
                    "En passant square {square} does not follow a {} Pawn's double push",
                    side_to_move.opponent().name()
                );
                Some(square)
            }
        };

        let halfmove = fields.next().unwrap_or("0");
        let halfmove: usize = halfmove
            .parse()
            .with_context(|| format!("Invalid halfmove clock {halfmove:?}"))?;

        let fullmove = fields.next().unwrap_or("1");
        let fullmove: usize = fullmove
            .parse()
            .with_context(|| format!("Invalid fullmove number {fullmove:?}"))?;
        ensure!(fullmove >= 1, "Fullmove number must be at least 1");

        if let Some(extra) = fields.next() {
            bail!("Unexpected trailing field {extra:?} in FEN");
        }

        let mut kings = [None; Color::COUNT];
        for (square, piece) in mailbox.iter().enumerate() {
            let Some(piece) = piece else { continue };
            let square = Square::from_index_unchecked(square);

            if piece.is_king() {
                ensure!(
                    kings[piece.color()].replace(square).is_none(),
                    "{} has more than one King",
                    piece.color().name()
                );
            } else if piece.is_pawn() {
                ensure!(
                    square.rank() != Rank::ONE && square.rank() != Rank::EIGHT,
                    "Pawn on back rank square {square}"
                );
            }
        }
        let [Some(white_king), Some(black_king)] = kings else {
            bail!("Both sides must have a King");
        };

        for color in Color::all() {
            let rank = Rank::first(color);
            let king = Piece::new(color, PieceKind::King);
            let rook = Piece::new(color, PieceKind::Rook);
            let home = |file| mailbox[Square::new(file, rank)];

            if castling_rights.short(color) {
                ensure!(
                    home(File::E) == Some(king) && home(File::H) == Some(rook),
                    "{} cannot castle short without King and Rook on their home squares",
                    color.name()
                );
            }
            if castling_rights.long(color) {
                ensure!(
                    home(File::E) == Some(king) && home(File::A) == Some(rook),
                    "{} cannot castle long without King and Rook on their home squares",
                    color.name()
                );
            }
        }

        let mut board = Self {
            mailbox,
            kings: [white_king, black_king],
            side_to_move,
            castling_rights,
            ep_square,
            halfmove,
            fullmove,
            key: ZobristKey::default(),
        };
        board.key = board.compute_key();

        let waiting = side_to_move.opponent();
        ensure!(
            !board.in_check(waiting),
            "{} is in check but it is {}'s turn",
            waiting.name(),
            side_to_move.name()
        );

        Ok(board)
    }

    /// Parses the placement field of a FEN string, from rank 8 down to rank 1.
    fn parse_placements(placements: &str) -> Result<[Option<Piece>; Square::COUNT]> {
        let mut mailbox = [None; Square::COUNT];

        let ranks = placements.split('/').collect::<Vec<_>>();
        ensure!(
            ranks.len() == Rank::COUNT,
            "FEN must have piece placements for all 8 ranks. Got {}",
            ranks.len()
        );

        for (rank, pieces) in Rank::iter().rev().zip(ranks) {
            let mut file = 0;
            for c in pieces.chars() {
                if let Some(empty) = c.to_digit(10) {
                    ensure!(
                        (1..=8).contains(&empty),
                        "Invalid empty square count {c:?} on rank {rank}"
                    );
                    file += empty as usize;
                } else {
                    ensure!(file < File::COUNT, "Rank {rank} has more than 8 files");
                    let piece = Piece::from_uci(c)?;
                    mailbox[rank.index() * 8 + file] = Some(piece);
                    file += 1;
                }
            }

            ensure!(
                file == File::COUNT,
                "Rank {rank} must span 8 files. Got {file} in {pieces:?}"
            );
        }

        Ok(mailbox)
    }

    /// Generates the FEN string of this [`Board`].
    pub fn to_fen(&self) -> String {
        let mut placements = Vec::with_capacity(Rank::COUNT);

        for rank in Rank::iter().rev() {
            let mut row = String::with_capacity(File::COUNT);
            let mut empty = 0;
            for file in File::iter() {
                if let Some(piece) = self.piece_at(Square::new(file, rank)) {
                    if empty != 0 {
                        row += &empty.to_string();
                        empty = 0;
                    }
                    row.push(piece.to_uci());
                } else {
                    empty += 1;
                }
            }
            if empty != 0 {
                row += &empty.to_string();
            }
            placements.push(row);
        }

        let ep = self
            .ep_square
            .map(|sq| sq.to_string())
            .unwrap_or(String::from("-"));

        format!(
            "{} {} {} {ep} {} {}",
            placements.join("/"),
            self.side_to_move,
            self.castling_rights,
            self.halfmove,
            self.fullmove
        )
    }

    /// Computes the [`ZobristKey`] of this position from scratch.
    fn compute_key(&self) -> ZobristKey {
        ZobristKey::from_parts(
            self.iter(),
            self.ep_square,
            self.castling_rights,
            self.side_to_move,
        )
    }

    #[inline(always)]
    pub const fn piece_at(&self, square: Square) -> Option<Piece> {
        self.mailbox[square.index()]
    }

    /// Location of `color`'s King.
    #[inline(always)]
    pub const fn king_square(&self, color: Color) -> Square {
        self.kings[color.index()]
    }

    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub const fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    /// The square a Pawn may capture onto en passant, if the last move was a double push.
    #[inline(always)]
    pub const fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    /// Plies since the last capture or Pawn move.
    #[inline(always)]
    pub const fn halfmove(&self) -> usize {
        self.halfmove
    }

    /// Starts at 1 and increments after every Black move.
    #[inline(always)]
    pub const fn fullmove(&self) -> usize {
        self.fullmove
    }

    #[inline(always)]
    pub const fn key(&self) -> ZobristKey {
        self.key
    }

    /// Iterates over all occupied squares, from `a1` to `h8`.
    #[inline(always)]
    pub fn iter(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.mailbox
            .iter()
            .enumerate()
            .filter_map(|(i, piece)| piece.map(|p| (Square::from_index_unchecked(i), p)))
    }

    /// Iterates over the squares occupied by `color`'s pieces, from `a1` to `h8`.
    #[inline(always)]
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.iter().filter(move |(_, piece)| piece.color() == color)
    }

    /// Returns `true` if the half-move counter is 100 or greater.
    ///
    /// Since "half-move" increases with ply, the 50-move rule takes effect at 100 ply.
    #[inline(always)]
    pub const fn can_draw_by_fifty(&self) -> bool {
        self.halfmove >= 100
    }

    /// Returns `true` if neither side has enough material left to ever deliver checkmate.
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// // Lone Kings
    /// let kk: Board = "8/4k3/8/8/3K4/8/8/8 w - - 0 1".parse().unwrap();
    /// assert!(kk.can_draw_by_insufficient_material());
    ///
    /// // A single Knight
    /// let knk: Board = "8/4k3/2n5/8/3K4/8/8/8 w - - 0 1".parse().unwrap();
    /// assert!(knk.can_draw_by_insufficient_material());
    ///
    /// // Opposing Bishops on the same color square
    /// let same: Board = "8/2b1k3/8/8/3K4/8/5B2/8 w - - 0 1".parse().unwrap();
    /// assert!(same.can_draw_by_insufficient_material());
    ///
    /// // Opposing Bishops on different color squares
    /// let diff: Board = "8/3bk3/8/8/3K4/8/5B2/8 w - - 0 1".parse().unwrap();
    /// assert!(!diff.can_draw_by_insufficient_material());
    /// ```
    pub fn can_draw_by_insufficient_material(&self) -> bool {
        let mut knights = [0; Color::COUNT];
        let mut bishops = [0; Color::COUNT];
        let mut bishop_square_colors = [None; Color::COUNT];

        for (square, piece) in self.iter() {
            match piece.kind() {
                PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
                PieceKind::Knight => knights[piece.color()] += 1,
                PieceKind::Bishop => {
                    bishops[piece.color()] += 1;
                    bishop_square_colors[piece.color()] =
                        Some((square.file().index() + square.rank().index()) % 2);
                }
                PieceKind::King => {}
            }
        }

        match (bishops, knights) {
            // Lone Kings, or a single minor piece
            ([0, 0], [0, 0]) | ([1, 0], [0, 0]) | ([0, 1], [0, 0]) => true,
            ([0, 0], [1, 0]) | ([0, 0], [0, 1]) => true,

            // One Bishop each, both on the same square color
            ([1, 1], [0, 0]) => bishop_square_colors[0] == bishop_square_colors[1],

            _ => false,
        }
    }

    /// Returns `true` if any piece of color `by` attacks `square`.
    ///
    /// Only raw attack patterns are considered: pins and whose turn it is are irrelevant.
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// let board = Board::default();
    /// assert!(board.is_square_attacked(Square::F3, Color::White));
    /// assert!(!board.is_square_attacked(Square::E4, Color::White));
    /// assert!(board.is_square_attacked(Square::D6, Color::Black));
    /// ```
    pub fn is_square_attacked(&self, square: Square, by: Color) -> bool {
        let is = |sq: Option<Square>, kinds: &[PieceKind]| {
            sq.and_then(|sq| self.piece_at(sq))
                .is_some_and(|p| p.color() == by && kinds.contains(&p.kind()))
        };

        // A Pawn of `by` attacks diagonally forward, so look diagonally backward from `square`
        let pawn_rank = -by.negation_multiplier();
        if is(square.offset(-1, pawn_rank), &[PieceKind::Pawn])
            || is(square.offset(1, pawn_rank), &[PieceKind::Pawn])
        {
            return true;
        }

        if KNIGHT_DELTAS
            .iter()
            .any(|&(df, dr)| is(square.offset(df, dr), &[PieceKind::Knight]))
        {
            return true;
        }

        if KING_DELTAS
            .iter()
            .any(|&(df, dr)| is(square.offset(df, dr), &[PieceKind::King]))
        {
            return true;
        }

        let slider_hits = |directions: &[(i8, i8)], kind: PieceKind| {
            directions.iter().any(|&(df, dr)| {
                let mut current = square;
                while let Some(next) = current.offset(df, dr) {
                    if let Some(piece) = self.piece_at(next) {
                        return piece.color() == by
                            && (piece.kind() == kind || piece.kind() == PieceKind::Queen);
                    }
                    current = next;
                }
                false
            })
        };

        slider_hits(&ROOK_DIRECTIONS, PieceKind::Rook)
            || slider_hits(&BISHOP_DIRECTIONS, PieceKind::Bishop)
    }

    /// Returns `true` if `color`'s King is attacked.
    #[inline(always)]
    pub fn in_check(&self, color: Color) -> bool {
        self.is_square_attacked(self.king_square(color), color.opponent())
    }

    /// Places `piece` on an empty `square`, updating the key.
    #[inline(always)]
    fn place(&mut self, piece: Piece, square: Square) {
        debug_assert!(self.mailbox[square].is_none(), "{square} is occupied");
        self.mailbox[square] = Some(piece);
        self.key.hash_piece(square, piece);
    }

    /// Removes and returns whatever stands on `square`, updating the key.
    #[inline(always)]
    fn take(&mut self, square: Square) -> Option<Piece> {
        let piece = self.mailbox[square].take();
        if let Some(piece) = piece {
            self.key.hash_piece(square, piece);
        }
        piece
    }

    /// Where the Rook starts and lands for a castling move by `color`.
    #[inline(always)]
    fn castling_rook_squares(mv: Move, color: Color) -> (Square, Square) {
        let rank = Rank::first(color);
        if mv.is_short_castle() {
            (Square::new(File::H, rank), Square::new(File::F, rank))
        } else {
            (Square::new(File::A, rank), Square::new(File::D, rank))
        }
    }

    /// Makes `mv` after checking it is legal in this position.
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// let mut board = Board::default();
    /// let e2e4 = Move::new(Square::E2, Square::E4, MoveKind::PawnDoublePush);
    /// let undo = board.apply(e2e4).unwrap();
    /// assert_eq!(board.ep_square(), Some(Square::E3));
    ///
    /// // Black cannot move a White piece
    /// let d2d4 = Move::new(Square::D2, Square::D4, MoveKind::PawnDoublePush);
    /// assert!(board.apply(d2d4).is_err());
    ///
    /// board.undo(undo);
    /// assert_eq!(board, Board::default());
    /// ```
    pub fn apply(&mut self, mv: Move) -> Result<UndoRecord, ChessError> {
        match self.piece_at(mv.from()) {
            Some(piece) if piece.color() == self.side_to_move => {}
            Some(piece) => {
                return Err(ChessError::InvalidMove(format!(
                    "{mv}: the {} on {} does not belong to {}",
                    piece.name(),
                    mv.from(),
                    self.side_to_move.name()
                )))
            }
            None => {
                return Err(ChessError::InvalidMove(format!(
                    "{mv}: there is no piece on {}",
                    mv.from()
                )))
            }
        }

        if !is_legal(self, mv) {
            return Err(ChessError::InvalidMove(format!(
                "{mv:?} is not legal in {}",
                self.to_fen()
            )));
        }

        Ok(self.make_move(mv))
    }

    /// Makes `mv` without any legality checks, returning what is needed to undo it.
    ///
    /// `mv` must come from move generation on this exact position.
    ///
    /// # Panics
    /// If there is no piece on `mv.from()`.
    pub fn make_move(&mut self, mv: Move) -> UndoRecord {
        let (from, to) = (mv.from(), mv.to());
        let Some(piece) = self.take(from) else {
            panic!("No piece on {from} to make {mv:?} in {}", self.to_fen());
        };
        let color = piece.color();

        let mut undo = UndoRecord {
            mv,
            captured: None,
            castling_rights: self.castling_rights,
            ep_square: self.ep_square,
            halfmove: self.halfmove,
            key: self.key,
        };

        self.key.hash_optional_ep_square(self.ep_square.take());
        self.key.hash_castling_rights(self.castling_rights);
        self.key.hash_side_to_move(self.side_to_move);

        self.halfmove += 1;
        if color.is_black() {
            self.fullmove += 1;
        }

        if mv.is_capture() {
            let victim_square = if mv.is_en_passant() {
                to.backward_by(color, 1).unwrap_or(to)
            } else {
                to
            };
            undo.captured = self.take(victim_square);
            debug_assert!(undo.captured.is_some(), "{mv:?} captures nothing");
            self.halfmove = 0;
        }

        match piece.kind() {
            PieceKind::Pawn => {
                self.halfmove = 0;
                if mv.is_pawn_double_push() {
                    self.ep_square = from.forward_by(color, 1);
                }
            }

            PieceKind::King => {
                self.kings[color] = to;
                if mv.is_castle() {
                    let (rook_from, rook_to) = Self::castling_rook_squares(mv, color);
                    if let Some(rook) = self.take(rook_from) {
                        self.place(rook, rook_to);
                    }
                }
            }

            _ => {}
        }

        let landed = match mv.promotion() {
            Some(promotion) => piece.promoted(promotion),
            None => piece,
        };
        self.place(landed, to);

        self.castling_rights.touch(from);
        self.castling_rights.touch(to);

        self.side_to_move = color.opponent();

        self.key.hash_optional_ep_square(self.ep_square);
        self.key.hash_castling_rights(self.castling_rights);
        self.key.hash_side_to_move(self.side_to_move);

        undo
    }

    /// Reverses the move recorded in `undo`, restoring every field of the position.
    ///
    /// `undo` must be the record of the most recent move made on this board.
    pub fn undo(&mut self, undo: UndoRecord) {
        let mv = undo.mv;
        let (from, to) = (mv.from(), mv.to());
        let color = self.side_to_move.opponent();

        // The key is restored wholesale, so raw mailbox writes are fine here
        let Some(landed) = self.mailbox[to].take() else {
            panic!("No piece on {to} to undo {mv:?} in {}", self.to_fen());
        };
        let piece = if mv.is_promotion() {
            Piece::new(color, PieceKind::Pawn)
        } else {
            landed
        };
        self.mailbox[from] = Some(piece);

        if piece.is_king() {
            self.kings[color] = from;
            if mv.is_castle() {
                let (rook_from, rook_to) = Self::castling_rook_squares(mv, color);
                self.mailbox[rook_from] = self.mailbox[rook_to].take();
            }
        }

        if let Some(captured) = undo.captured {
            let victim_square = if mv.is_en_passant() {
                to.backward_by(color, 1).unwrap_or(to)
            } else {
                to
            };
            self.mailbox[victim_square] = Some(captured);
        }

        if color.is_black() {
            self.fullmove -= 1;
        }
        self.side_to_move = color;
        self.castling_rights = undo.castling_rights;
        self.ep_square = undo.ep_square;
        self.halfmove = undo.halfmove;
        self.key = undo.key;
    }

    /// Makes `mv`, runs `f` on the resulting position, then undoes `mv`.
    ///
    /// The undo happens on every path out of `f`, so callers never observe a half-made move.
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// let mut board = Board::default();
    /// let e2e4 = Move::from_uci(&board, "e2e4").unwrap();
    /// let side = board.with_move_made(e2e4, |b| b.side_to_move());
    /// assert_eq!(side, Color::Black);
    /// assert_eq!(board, Board::default());
    /// ```
    #[inline(always)]
    pub fn with_move_made<T>(&mut self, mv: Move, f: impl FnOnce(&mut Self) -> T) -> T {
        let undo = self.make_move(mv);
        let result = f(self);
        self.undo(undo);
        result
    }
}

impl Default for Board {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for Board {
    type Err = ChessError;
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl fmt::Display for Board {
    /// Prints an ASCII diagram from White's perspective, with the game state alongside.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank}|")?;
            for file in File::iter() {
                let c = self
                    .piece_at(Square::new(file, rank))
                    .map(|p| p.to_uci())
                    .unwrap_or('.');
                write!(f, " {c}")?;
            }

            match rank {
                Rank::SEVEN => write!(f, "           FEN: {}", self.to_fen())?,
                Rank::SIX => write!(f, "          Side: {}", self.side_to_move.name())?,
                Rank::FIVE => write!(f, "      Castling: {}", self.castling_rights)?,
                Rank::FOUR => match self.ep_square {
                    Some(ep) => write!(f, "            EP: {ep}")?,
                    None => write!(f, "            EP: -")?,
                },
                Rank::THREE => write!(f, "     Half-move: {}", self.halfmove)?,
                Rank::TWO => write!(f, "     Full-move: {}", self.fullmove)?,
                Rank::ONE => write!(f, "           Key: {}", self.key)?,
                _ => {}
            }
            writeln!(f)?;
        }

        write!(f, " +")?;
        for _ in File::iter() {
            write!(f, "--")?;
        }
        write!(f, "\n   ")?;
        for file in File::iter() {
            write!(f, "{file} ")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}
