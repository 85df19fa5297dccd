//! Move generation: pseudo-legal generation plus a legality filter.
//!
//! Generation is two-phase. `pseudo_legal_moves` produces every move that
//! obeys piece movement rules without considering king safety; `legal_moves`
//! applies each candidate to a scratch snapshot and rejects those that leave
//! the mover's own king attacked. Castling legality (not castling out of,
//! through, or into check) is enforced during generation.

use crate::engine::position::{Position, BISHOP_DIRS, KING_OFFSETS, KNIGHT_OFFSETS, ROOK_DIRS};
use crate::engine::types::{CastlingRights, Color, Move, Piece, PieceKind, Square};

// =========================================================================
// Public API
// =========================================================================

/// All legal moves for the side to move.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let us = pos.side_to_move;
    pseudo_legal_moves(pos)
        .into_iter()
        .filter(|&mv| !pos.apply_move(mv).in_check(us))
        .collect()
}

/// Legal moves whose origin is `from`. Empty when the square is empty or
/// holds an opposing piece.
pub fn legal_moves_from(pos: &Position, from: Square) -> Vec<Move> {
    legal_moves(pos)
        .into_iter()
        .filter(|mv| mv.from == from)
        .collect()
}

/// Side to move has no legal moves and is in check.
pub fn is_checkmate(pos: &Position) -> bool {
    pos.is_in_check() && legal_moves(pos).is_empty()
}

/// Side to move has no legal moves and is not in check.
pub fn is_stalemate(pos: &Position) -> bool {
    !pos.is_in_check() && legal_moves(pos).is_empty()
}

/// All pseudo-legal moves for the side to move (king safety not considered;
/// castling preconditions, including check constraints, are).
pub fn pseudo_legal_moves(pos: &Position) -> Vec<Move> {
    let us = pos.side_to_move;
    let mut moves = Vec::with_capacity(64);

    for (from, piece) in pos.pieces().filter(|(_, p)| p.color == us) {
        match piece.kind {
            PieceKind::Pawn => gen_pawn(pos, from, us, &mut moves),
            PieceKind::Knight => gen_offsets(pos, from, us, &KNIGHT_OFFSETS, &mut moves),
            PieceKind::Bishop => gen_rays(pos, from, us, &BISHOP_DIRS, &mut moves),
            PieceKind::Rook => gen_rays(pos, from, us, &ROOK_DIRS, &mut moves),
            PieceKind::Queen => {
                gen_rays(pos, from, us, &ROOK_DIRS, &mut moves);
                gen_rays(pos, from, us, &BISHOP_DIRS, &mut moves);
            }
            PieceKind::King => {
                gen_offsets(pos, from, us, &KING_OFFSETS, &mut moves);
                gen_castling(pos, from, us, &mut moves);
            }
        }
    }

    moves
}

// =========================================================================
// Per-kind generators
// =========================================================================

/// Single-step generators for knights and kings.
fn gen_offsets(pos: &Position, from: Square, us: Color, offsets: &[(i8, i8)], out: &mut Vec<Move>) {
    for &(df, dr) in offsets {
        let Some(to) = from.offset(df, dr) else {
            continue;
        };
        match pos.piece_at(to) {
            None => out.push(Move::quiet(from, to)),
            Some(piece) if piece.color != us => out.push(Move::capture(from, to)),
            Some(_) => {}
        }
    }
}

/// Sliding generators for bishops, rooks, and queens.
fn gen_rays(pos: &Position, from: Square, us: Color, dirs: &[(i8, i8)], out: &mut Vec<Move>) {
    for &(df, dr) in dirs {
        let mut cursor = from;
        while let Some(to) = cursor.offset(df, dr) {
            match pos.piece_at(to) {
                None => {
                    out.push(Move::quiet(from, to));
                    cursor = to;
                }
                Some(piece) => {
                    if piece.color != us {
                        out.push(Move::capture(from, to));
                    }
                    break;
                }
            }
        }
    }
}

fn gen_pawn(pos: &Position, from: Square, us: Color, out: &mut Vec<Move>) {
    let (dr, start_rank, promo_rank): (i8, u8, u8) = match us {
        Color::White => (1, 1, 7),
        Color::Black => (-1, 6, 0),
    };

    // Single push, with promotion fan-out on the back rank.
    if let Some(to) = from.offset(0, dr) {
        if pos.piece_at(to).is_none() {
            if to.rank == promo_rank {
                push_promotions(from, to, false, out);
            } else {
                out.push(Move::quiet(from, to));
            }

            // Double push only from the home rank, through an empty square.
            if from.rank == start_rank {
                if let Some(two) = to.offset(0, dr) {
                    if pos.piece_at(two).is_none() {
                        out.push(Move::double_push(from, two));
                    }
                }
            }
        }
    }

    // Diagonal captures and en passant.
    for df in [-1i8, 1] {
        let Some(to) = from.offset(df, dr) else {
            continue;
        };
        match pos.piece_at(to) {
            Some(piece) if piece.color != us => {
                if to.rank == promo_rank {
                    push_promotions(from, to, true, out);
                } else {
                    out.push(Move::capture(from, to));
                }
            }
            None if pos.en_passant == Some(to) => {
                out.push(Move::en_passant(from, to));
            }
            _ => {}
        }
    }
}

fn push_promotions(from: Square, to: Square, is_capture: bool, out: &mut Vec<Move>) {
    for kind in [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ] {
        out.push(Move::promoting(from, to, kind, is_capture));
    }
}

/// Castling preconditions: right retained, king and rook on their home
/// squares, path clear, and the king neither in check nor crossing an
/// attacked square.
fn gen_castling(pos: &Position, from: Square, us: Color, out: &mut Vec<Move>) {
    let home_rank = match us {
        Color::White => 0,
        Color::Black => 7,
    };
    if from != Square::new(4, home_rank) || pos.in_check(us) {
        return;
    }
    let them = !us;
    let rook = Piece::new(us, PieceKind::Rook);

    // Kingside: f and g empty and unattacked, rook on h.
    if pos.castling_rights.has(CastlingRights::kingside_flag(us))
        && pos.piece_at(Square::new(7, home_rank)) == Some(rook)
        && [5, 6].iter().all(|&f| {
            let sq = Square::new(f, home_rank);
            pos.piece_at(sq).is_none() && !pos.is_square_attacked(sq, them)
        })
    {
        out.push(Move::castle(from, Square::new(6, home_rank)));
    }

    // Queenside: b, c, d empty; c and d unattacked; rook on a.
    if pos.castling_rights.has(CastlingRights::queenside_flag(us))
        && pos.piece_at(Square::new(0, home_rank)) == Some(rook)
        && [1, 2, 3]
            .iter()
            .all(|&f| pos.piece_at(Square::new(f, home_rank)).is_none())
        && [2, 3]
            .iter()
            .all(|&f| !pos.is_square_attacked(Square::new(f, home_rank), them))
    {
        out.push(Move::castle(from, Square::new(2, home_rank)));
    }
}

// =========================================================================
// Tests
// =========================================================================
