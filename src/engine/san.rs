//! Move-notation codecs: Standard Algebraic Notation and coordinate text.
//!
//! SAN examples: `e4`, `Nf3`, `Bxe5`, `O-O`, `e8=Q`, `Nd4e6`.
//! Coordinate examples: `e2e4`, `e7e8q`.
//!
//! Decoding always resolves against the full legal-move set of the position,
//! so a successfully decoded move is legal by construction.

use crate::engine::movegen;
use crate::engine::position::Position;
use crate::engine::types::{EngineError, Move, PieceKind, Square};

// =========================================================================
// SAN generation
// =========================================================================

/// Convert a move to SAN notation.
///
/// `legal_moves` should be the full list of legal moves in the position
/// (passed in to avoid redundant generation).
///
/// Does NOT append `+` or `#` — the session adds those after the move is
/// applied and the resulting status is known.
pub fn move_to_san(pos: &Position, mv: Move, legal_moves: &[Move]) -> String {
    // Castling.
    if mv.is_castle {
        return if mv.to.file > mv.from.file {
            "O-O".into()
        } else {
            "O-O-O".into()
        };
    }

    let Some(piece) = pos.piece_at(mv.from) else {
        // Encoding a stray move; render its coordinates rather than panic.
        return mv.to_coordinate();
    };

    let mut san = String::with_capacity(8);

    if piece.kind == PieceKind::Pawn {
        // Pawn moves.
        if mv.is_capture {
            // Prefix with departure file on captures: "exd5".
            san.push((b'a' + mv.from.file) as char);
            san.push('x');
        }
        san.push_str(&mv.to.to_algebraic());

        // Promotion suffix.
        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(promo.letter());
        }
    } else {
        // Piece moves: N, B, R, Q, K.
        san.push(piece.kind.letter());
        san.push_str(&disambiguation(pos, mv, piece.kind, legal_moves));

        if mv.is_capture {
            san.push('x');
        }

        san.push_str(&mv.to.to_algebraic());
    }

    san
}

/// Determine the disambiguation string for a piece move.
///
/// When another piece of the same kind can reach the same destination, the
/// origin is narrowed by file when files differ; by rank when only ranks
/// differ; and by the full origin square once any rival shares the rank,
/// so sibling pieces standing side by side are written out in full
/// (`Nd4e6`, never `Nde6`).
fn disambiguation(pos: &Position, mv: Move, kind: PieceKind, legal_moves: &[Move]) -> String {
    let rivals: Vec<&Move> = legal_moves
        .iter()
        .filter(|m| {
            m.to == mv.to
                && m.from != mv.from
                && !m.is_castle
                && pos
                    .piece_at(m.from)
                    .map(|p| p.color == pos.side_to_move && p.kind == kind)
                    .unwrap_or(false)
        })
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let same_file = rivals.iter().any(|m| m.from.file == mv.from.file);
    let same_rank = rivals.iter().any(|m| m.from.rank == mv.from.rank);

    match (same_file, same_rank) {
        (false, false) => format!("{}", (b'a' + mv.from.file) as char),
        (true, false) => format!("{}", (b'1' + mv.from.rank) as char),
        (_, true) => mv.from.to_algebraic(),
    }
}

// =========================================================================
// Decoding (SAN + coordinate)
// =========================================================================

/// Decode move text against a position, accepting both SAN and coordinate
/// notation.
///
/// Coordinate shape (`e2e4`, `e7e8q`) is tried first since it is
/// unambiguous to recognise; everything else is treated as SAN.
pub fn decode_move(pos: &Position, text: &str) -> Result<Move, EngineError> {
    if let Some((from, to, promotion)) = parse_coordinate(text) {
        return resolve_coordinate(pos, text, from, to, promotion);
    }
    parse_san(pos, text)
}

/// Recognise coordinate text: two squares plus an optional promotion letter.
fn parse_coordinate(text: &str) -> Option<(Square, Square, Option<PieceKind>)> {
    if !text.is_ascii() || (text.len() != 4 && text.len() != 5) {
        return None;
    }
    let from = Square::from_algebraic(&text[..2])?;
    let to = Square::from_algebraic(&text[2..4])?;
    let promotion = if text.len() == 5 {
        Some(PieceKind::from_promotion_char(text.as_bytes()[4] as char)?)
    } else {
        None
    };
    Some((from, to, promotion))
}

fn resolve_coordinate(
    pos: &Position,
    text: &str,
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
) -> Result<Move, EngineError> {
    let legal = movegen::legal_moves(pos);
    let candidates: Vec<&Move> = legal
        .iter()
        .filter(|m| {
            m.from == from
                && m.to == to
                && match promotion {
                    Some(kind) => m.promotion == Some(kind),
                    // Without a promotion letter, a promoting destination
                    // leaves four candidates and is reported as ambiguous.
                    None => true,
                }
        })
        .collect();

    match candidates.len() {
        0 => Err(EngineError::InvalidMoveText {
            input: text.to_string(),
            reason: "no legal move matches".into(),
        }),
        1 => Ok(*candidates[0]),
        n => Err(EngineError::AmbiguousMoveText {
            input: text.to_string(),
            candidates: n,
        }),
    }
}

/// Parse a SAN string and return the corresponding legal move.
///
/// Accepts standard SAN: `e4`, `Nf3`, `Bxe5`, `O-O`, `O-O-O`, `e8=Q`, etc.
/// Check/checkmate/annotation suffixes (`+`, `#`, `!`, `?`) are ignored.
pub fn parse_san(pos: &Position, input: &str) -> Result<Move, EngineError> {
    let legal = movegen::legal_moves(pos);
    let san = input.trim_end_matches(['+', '#', '!', '?']);

    let invalid = |reason: String| EngineError::InvalidMoveText {
        input: input.to_string(),
        reason,
    };

    // Castling.
    if san == "O-O" || san == "0-0" {
        return find_castling(pos, input, &legal, true);
    }
    if san == "O-O-O" || san == "0-0-0" {
        return find_castling(pos, input, &legal, false);
    }

    let chars: Vec<char> = san.chars().collect();
    if chars.is_empty() {
        return Err(invalid("empty move text".into()));
    }

    // Detect promotion.
    let (chars, promotion) = if chars.len() >= 2 && chars[chars.len() - 2] == '=' {
        let promo_char = chars[chars.len() - 1];
        let promo = PieceKind::from_promotion_char(promo_char)
            .ok_or_else(|| invalid(format!("invalid promotion piece '{promo_char}'")))?;
        (&chars[..chars.len() - 2], Some(promo))
    } else {
        (&chars[..], None)
    };

    // Determine piece kind.
    let (kind, rest) = if chars[0].is_uppercase() && "NBRQK".contains(chars[0]) {
        let kind = match chars[0] {
            'N' => PieceKind::Knight,
            'B' => PieceKind::Bishop,
            'R' => PieceKind::Rook,
            'Q' => PieceKind::Queen,
            'K' => PieceKind::King,
            _ => unreachable!(),
        };
        (kind, &chars[1..])
    } else {
        (PieceKind::Pawn, chars)
    };

    // Strip the capture marker.
    let rest: Vec<char> = rest.iter().copied().filter(|&c| c != 'x').collect();

    // The last two characters are the destination square.
    if rest.len() < 2 {
        return Err(invalid("move text too short".into()));
    }

    let dest_str: String = rest[rest.len() - 2..].iter().collect();
    let dest = Square::from_algebraic(&dest_str)
        .ok_or_else(|| invalid(format!("invalid destination square '{dest_str}'")))?;

    // Disambiguation characters (0, 1, or 2 chars before the destination).
    let disambig = &rest[..rest.len() - 2];
    let disambig_file: Option<u8> = disambig
        .iter()
        .find(|c| c.is_ascii_lowercase())
        .map(|&c| c as u8 - b'a');
    let disambig_rank: Option<u8> = disambig
        .iter()
        .find(|c| c.is_ascii_digit())
        .map(|&c| c as u8 - b'1');

    // Find matching legal moves.
    let us = pos.side_to_move;
    let candidates: Vec<&Move> = legal
        .iter()
        .filter(|m| {
            if m.to != dest || m.is_castle {
                return false;
            }
            match pos.piece_at(m.from) {
                Some(p) if p.color == us && p.kind == kind => {}
                _ => return false,
            }
            if let Some(f) = disambig_file {
                if m.from.file != f {
                    return false;
                }
            }
            if let Some(r) = disambig_rank {
                if m.from.rank != r {
                    return false;
                }
            }
            m.promotion == promotion
        })
        .collect();

    match candidates.len() {
        0 => Err(invalid("no legal move matches".into())),
        1 => Ok(*candidates[0]),
        n => Err(EngineError::AmbiguousMoveText {
            input: input.to_string(),
            candidates: n,
        }),
    }
}

fn find_castling(
    pos: &Position,
    input: &str,
    legal: &[Move],
    kingside: bool,
) -> Result<Move, EngineError> {
    let target_file = if kingside { 6 } else { 2 };

    legal
        .iter()
        .find(|m| m.is_castle && m.to.file == target_file)
        .copied()
        .ok_or_else(|| EngineError::InvalidMoveText {
            input: input.to_string(),
            reason: format!(
                "castling {} not legal",
                if kingside { "kingside" } else { "queenside" }
            ),
        })
}

// =========================================================================
// Tests
// =========================================================================
