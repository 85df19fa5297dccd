//! Mailbox chess position representation.
//!
//! `Position` stores piece placement as a 64-entry array of `Option<Piece>`,
//! plus side to move, castling rights, en-passant square, and move counters.
//! Positions are immutable per ply: `apply_move` returns a fresh snapshot and
//! never mutates the receiver, so history and undo are exact by construction.

use crate::engine::types::{CastlingRights, Color, EngineError, Move, Piece, PieceKind, Square};

/// Knight move offsets as (file, rank) deltas.
pub(crate) const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// King move offsets (also the union of rook and bishop directions).
pub(crate) const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Rook ray directions.
pub(crate) const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Bishop ray directions.
pub(crate) const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A complete chess position.
///
/// Board layout follows LERF (Little-Endian Rank-File) indexing:
/// a1 = 0, b1 = 1, … h1 = 7, a2 = 8, … h8 = 63.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    /// Piece placement, indexed by `Square::index()`.
    board: [Option<Piece>; 64],

    /// Whose turn it is.
    pub side_to_move: Color,

    /// Castling availability (K/Q/k/q).
    pub castling_rights: CastlingRights,

    /// En-passant target square (the square *behind* the double-pushed pawn).
    pub en_passant: Option<Square>,

    /// Half-move clock for the 50-move rule (reset on pawn move or capture).
    pub halfmove_clock: u16,

    /// Full-move number (starts at 1, incremented after Black moves).
    pub fullmove_number: u16,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl Position {
    /// Create an empty board with no pieces.
    pub fn empty() -> Self {
        Position {
            board: [None; 64],
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Standard starting position.
    pub fn starting() -> Self {
        Self::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .expect("starting FEN is always valid")
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// What piece (if any) is on a given square?
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board[sq.index()]
    }

    /// Find the king square for the given colour.
    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        Square::all()
            .find(|&sq| {
                self.board[sq.index()]
                    == Some(Piece {
                        color,
                        kind: PieceKind::King,
                    })
            })
            .expect("exactly one king per colour by construction")
    }

    /// Total number of pieces on the board (both colours, kings included).
    pub fn piece_count(&self) -> usize {
        self.board.iter().filter(|p| p.is_some()).count()
    }

    /// All occupied squares with their pieces, a1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.board[sq.index()].map(|p| (sq, p)))
    }

    // -----------------------------------------------------------------------
    // Attack detection
    // -----------------------------------------------------------------------

    /// Is `sq` attacked by any piece of colour `by`?
    ///
    /// Attack detection deliberately ignores castling and en passant: neither
    /// can capture on the square being tested.
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        // Pawns: a pawn of `by` attacks sq if it sits one rank *behind* sq
        // (from `by`'s perspective) on an adjacent file.
        let pawn_dr: i8 = match by {
            Color::White => -1,
            Color::Black => 1,
        };
        for df in [-1i8, 1] {
            if let Some(from) = sq.offset(df, pawn_dr) {
                if self.piece_at(from) == Some(Piece::new(by, PieceKind::Pawn)) {
                    return true;
                }
            }
        }

        // Knights.
        for (df, dr) in KNIGHT_OFFSETS {
            if let Some(from) = sq.offset(df, dr) {
                if self.piece_at(from) == Some(Piece::new(by, PieceKind::Knight)) {
                    return true;
                }
            }
        }

        // King (adjacency).
        for (df, dr) in KING_OFFSETS {
            if let Some(from) = sq.offset(df, dr) {
                if self.piece_at(from) == Some(Piece::new(by, PieceKind::King)) {
                    return true;
                }
            }
        }

        // Rook / Queen along straight lines.
        if self.ray_attacked(sq, by, &ROOK_DIRS, PieceKind::Rook) {
            return true;
        }

        // Bishop / Queen along diagonals.
        if self.ray_attacked(sq, by, &BISHOP_DIRS, PieceKind::Bishop) {
            return true;
        }

        false
    }

    /// Walk each ray in `dirs` from `sq`; the first piece met attacks if it is
    /// a `by`-coloured queen or `slider`.
    fn ray_attacked(&self, sq: Square, by: Color, dirs: &[(i8, i8)], slider: PieceKind) -> bool {
        for &(df, dr) in dirs {
            let mut cursor = sq;
            while let Some(next) = cursor.offset(df, dr) {
                match self.piece_at(next) {
                    None => cursor = next,
                    Some(piece) => {
                        if piece.color == by
                            && (piece.kind == slider || piece.kind == PieceKind::Queen)
                        {
                            return true;
                        }
                        break;
                    }
                }
            }
        }
        false
    }

    /// Is the given colour's king currently attacked?
    #[inline]
    pub fn in_check(&self, color: Color) -> bool {
        self.is_square_attacked(self.king_square(color), !color)
    }

    /// Is the side-to-move's king currently in check?
    #[inline]
    pub fn is_in_check(&self) -> bool {
        self.in_check(self.side_to_move)
    }

    // -----------------------------------------------------------------------
    // Move application (immutable)
    // -----------------------------------------------------------------------

    /// Apply a move, returning the resulting position as a new snapshot.
    ///
    /// The caller is responsible for ensuring the move is legal; this method
    /// only performs the mechanical update (piece transport, en-passant and
    /// castling side effects, rights/clock/counter bookkeeping, side switch).
    #[must_use]
    pub fn apply_move(&self, mv: Move) -> Position {
        let mut next = self.clone();
        let us = self.side_to_move;

        let moving = match self.board[mv.from.index()] {
            Some(piece) => piece,
            // Unreachable for moves produced by the generator; applying a
            // stray move to the wrong position degrades to a no-op transport.
            None => return next,
        };

        // Capture. En passant removes a pawn on a square other than mv.to.
        if mv.is_en_passant {
            let cap_dr: i8 = match us {
                Color::White => -1,
                Color::Black => 1,
            };
            if let Some(cap_sq) = mv.to.offset(0, cap_dr) {
                next.board[cap_sq.index()] = None;
            }
        }

        // Transport (the destination square is overwritten, which also
        // handles ordinary captures).
        next.board[mv.from.index()] = None;
        next.board[mv.to.index()] = Some(match mv.promotion {
            Some(kind) => Piece::new(us, kind),
            None => moving,
        });

        // Castling moves the rook as well.
        if mv.is_castle {
            if let Some((rook_from, rook_to)) = castling_rook_squares(mv.to) {
                next.board[rook_to.index()] = next.board[rook_from.index()].take();
            }
        }

        // Rights decay when a move touches a king or rook home square.
        next.castling_rights.0 &= CASTLING_MASK[mv.from.index()];
        next.castling_rights.0 &= CASTLING_MASK[mv.to.index()];

        // En-passant target exists only immediately after a double push.
        next.en_passant = if mv.is_double_push {
            let dr: i8 = match us {
                Color::White => 1,
                Color::Black => -1,
            };
            mv.from.offset(0, dr)
        } else {
            None
        };

        // Clocks.
        if moving.kind == PieceKind::Pawn || mv.is_capture {
            next.halfmove_clock = 0;
        } else {
            next.halfmove_clock = self.halfmove_clock + 1;
        }
        if us == Color::Black {
            next.fullmove_number = self.fullmove_number + 1;
        }

        next.side_to_move = !us;
        next
    }

    /// Key for repetition counting: the first four FEN fields (placement,
    /// side, castling, en passant). Clocks are excluded per the repetition
    /// rule.
    pub fn repetition_key(&self) -> String {
        let fen = self.to_fen();
        fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
    }

    // -----------------------------------------------------------------------
    // Board display (8×8 text grid)
    // -----------------------------------------------------------------------

    /// Render the board as an 8-line string (rank 8 at top), for debugging.
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for rank in (0..8).rev() {
            s.push((b'1' + rank) as char);
            s.push(' ');
            for file in 0..8 {
                let sq = Square::new(file, rank);
                let ch = match self.piece_at(sq) {
                    Some(piece) => piece.to_char(),
                    None => '.',
                };
                s.push(ch);
                if file < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

// ---------------------------------------------------------------------------
// Castling helpers
// ---------------------------------------------------------------------------

/// For a king-destination square (after castling), return (rook_from, rook_to).
pub(crate) fn castling_rook_squares(king_to: Square) -> Option<(Square, Square)> {
    match king_to.index() {
        // White kingside: king e1→g1, rook h1→f1.
        6 => Some((Square::from_index(7), Square::from_index(5))),
        // White queenside: king e1→c1, rook a1→d1.
        2 => Some((Square::from_index(0), Square::from_index(3))),
        // Black kingside: king e8→g8, rook h8→f8.
        62 => Some((Square::from_index(63), Square::from_index(61))),
        // Black queenside: king e8→c8, rook a8→d8.
        58 => Some((Square::from_index(56), Square::from_index(59))),
        _ => None,
    }
}

/// Mask table indexed by square index. When a move touches a square, AND the
/// castling rights with this mask. E.g. if a rook on a1 moves (or is captured),
/// remove White-queenside. The king's home square removes both that side's rights.
#[rustfmt::skip]
const CASTLING_MASK: [u8; 64] = {
    let mut mask = [0b1111u8; 64];
    // a1 (0): remove white-queenside
    mask[0]  = 0b1111 & !CastlingRights::WHITE_QUEENSIDE;
    // e1 (4): remove both white rights
    mask[4]  = 0b1111 & !(CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE);
    // h1 (7): remove white-kingside
    mask[7]  = 0b1111 & !CastlingRights::WHITE_KINGSIDE;
    // a8 (56): remove black-queenside
    mask[56] = 0b1111 & !CastlingRights::BLACK_QUEENSIDE;
    // e8 (60): remove both black rights
    mask[60] = 0b1111 & !(CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE);
    // h8 (63): remove black-kingside
    mask[63] = 0b1111 & !CastlingRights::BLACK_KINGSIDE;
    mask
};

// ---------------------------------------------------------------------------
// FEN parsing & generation
// ---------------------------------------------------------------------------

impl Position {
    /// Parse a FEN string into a `Position`.
    ///
    /// Validates all 6 fields (piece placement, side to move, castling,
    /// en passant, halfmove clock, fullmove number) and ensures exactly one
    /// king per side.
    pub fn from_fen(fen: &str) -> Result<Self, EngineError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(EngineError::MalformedFen(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        let mut pos = Position::empty();

        // ----- Field 1: Piece placement -----
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(EngineError::MalformedFen(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as u8; // FEN starts from rank 8
            let mut file: u8 = 0;
            for ch in rank_str.chars() {
                if file > 7 {
                    return Err(EngineError::MalformedFen(format!(
                        "too many squares in rank {}",
                        rank + 1
                    )));
                }
                if let Some(digit) = ch.to_digit(10) {
                    if !(1..=8).contains(&digit) {
                        return Err(EngineError::MalformedFen(format!(
                            "invalid empty count '{ch}' in rank {}",
                            rank + 1
                        )));
                    }
                    file += digit as u8;
                } else if let Some(piece) = Piece::from_char(ch) {
                    pos.board[Square::new(file, rank).index()] = Some(piece);
                    file += 1;
                } else {
                    return Err(EngineError::MalformedFen(format!(
                        "invalid character '{ch}' in piece placement"
                    )));
                }
            }
            if file != 8 {
                return Err(EngineError::MalformedFen(format!(
                    "rank {} has {} squares instead of 8",
                    rank + 1,
                    file
                )));
            }
        }

        // Validate exactly one king per side.
        for color in [Color::White, Color::Black] {
            let king_count = pos
                .board
                .iter()
                .filter(|&&p| p == Some(Piece::new(color, PieceKind::King)))
                .count();
            if king_count != 1 {
                return Err(EngineError::MalformedFen(format!(
                    "{color} has {king_count} kings (expected 1)"
                )));
            }
        }

        // ----- Field 2: Side to move -----
        pos.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(EngineError::MalformedFen(format!(
                    "invalid side to move: '{other}'"
                )));
            }
        };

        // ----- Field 3: Castling availability -----
        pos.castling_rights = CastlingRights::from_fen(fields[2]).ok_or_else(|| {
            EngineError::MalformedFen(format!("invalid castling string: '{}'", fields[2]))
        })?;

        // ----- Field 4: En passant target square -----
        if fields[3] != "-" {
            let ep_sq = Square::from_algebraic(fields[3]).ok_or_else(|| {
                EngineError::MalformedFen(format!("invalid en passant square: '{}'", fields[3]))
            })?;
            // Target must be on rank 3 (after a white push) or rank 6 (black).
            if ep_sq.rank != 2 && ep_sq.rank != 5 {
                return Err(EngineError::MalformedFen(format!(
                    "en passant square {} is not on rank 3 or 6",
                    fields[3]
                )));
            }
            pos.en_passant = Some(ep_sq);
        }

        // ----- Field 5: Halfmove clock -----
        pos.halfmove_clock = fields[4]
            .parse::<u16>()
            .map_err(|_| EngineError::MalformedFen(format!("invalid halfmove clock: '{}'", fields[4])))?;

        // ----- Field 6: Fullmove number -----
        pos.fullmove_number = fields[5]
            .parse::<u16>()
            .map_err(|_| EngineError::MalformedFen(format!("invalid fullmove number: '{}'", fields[5])))?;
        if pos.fullmove_number == 0 {
            return Err(EngineError::MalformedFen(
                "fullmove number must be >= 1".to_string(),
            ));
        }

        Ok(pos)
    }

    /// Export the position as a FEN string.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(80);

        // ----- Field 1: Piece placement -----
        for rank in (0..8).rev() {
            let mut empty_count = 0u8;
            for file in 0..8 {
                let sq = Square::new(file, rank);
                match self.piece_at(sq) {
                    Some(piece) => {
                        if empty_count > 0 {
                            fen.push((b'0' + empty_count) as char);
                            empty_count = 0;
                        }
                        fen.push(piece.to_char());
                    }
                    None => {
                        empty_count += 1;
                    }
                }
            }
            if empty_count > 0 {
                fen.push((b'0' + empty_count) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        // ----- Field 2: Side to move -----
        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        // ----- Field 3: Castling -----
        fen.push(' ');
        fen.push_str(&self.castling_rights.to_fen());

        // ----- Field 4: En passant -----
        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_algebraic()),
            None => fen.push('-'),
        }

        // ----- Field 5: Halfmove clock -----
        fen.push(' ');
        fen.push_str(&self.halfmove_clock.to_string());

        // ----- Field 6: Fullmove number -----
        fen.push(' ');
        fen.push_str(&self.fullmove_number.to_string());

        fen
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
