//! PGN (Portable Game Notation) export.
//!
//! Produces PGN with the Seven Tag Roster and move text with move numbers,
//! wrapped at 80 columns.

use crate::engine::movegen;
use crate::engine::session::GameSession;
use crate::engine::types::Color;

// =========================================================================
// PGN generation
// =========================================================================

/// Export a session's game as a PGN string.
pub fn export_pgn(session: &GameSession) -> String {
    let mut pgn = String::with_capacity(512);

    let date = session.created_at.format("%Y.%m.%d").to_string();
    let result = result_token(session);

    pgn.push_str("[Event \"Chess Coach Training\"]\n");
    pgn.push_str("[Site \"chess-coach\"]\n");
    pgn.push_str(&format!("[Date \"{date}\"]\n"));
    pgn.push_str("[Round \"-\"]\n");
    pgn.push_str("[White \"Player\"]\n");
    pgn.push_str("[Black \"Player\"]\n");
    pgn.push_str(&format!("[Result \"{result}\"]\n"));

    // Custom anchors carry SetUp and FEN tags.
    if let Some(fen) = session.custom_anchor_fen() {
        pgn.push_str("[SetUp \"1\"]\n");
        pgn.push_str(&format!("[FEN \"{fen}\"]\n"));
    }

    pgn.push('\n');

    if session.ply_count() == 0 {
        pgn.push_str(&format!("{result}\n"));
        return pgn;
    }

    // Numbering starts from the anchor's fullmove counter; a black-to-move
    // anchor opens with "N..." notation.
    let anchor = session.anchor_position();
    let mut move_num = anchor.fullmove_number;
    let mut white_turn = anchor.side_to_move == Color::White;

    let mut line = String::new();
    let mut line_len = 0;

    for (i, record) in session.history().iter().enumerate() {
        let token = if white_turn {
            format!("{}. {}", move_num, record.san)
        } else if i == 0 {
            format!("{}... {}", move_num, record.san)
        } else {
            record.san.clone()
        };

        if line_len + token.len() + 1 > 80 && line_len > 0 {
            pgn.push_str(&line);
            pgn.push('\n');
            line.clear();
            line_len = 0;
        }

        if line_len > 0 {
            line.push(' ');
            line_len += 1;
        }
        line_len += token.len();
        line.push_str(&token);

        if !white_turn {
            move_num += 1;
        }
        white_turn = !white_turn;
    }

    // Append the result token.
    if line_len + result.len() + 1 > 80 && line_len > 0 {
        pgn.push_str(&line);
        pgn.push('\n');
        line.clear();
    } else if line_len > 0 {
        line.push(' ');
    }
    line.push_str(result);
    pgn.push_str(&line);
    pgn.push('\n');

    pgn
}

/// PGN result token for the session's current terminal state.
///
/// On checkmate the side to move is the loser; stalemate and enabled draw
/// rules score ½–½; anything else is still in progress.
fn result_token(session: &GameSession) -> &'static str {
    let pos = session.current_position();
    if movegen::is_checkmate(pos) {
        match pos.side_to_move {
            Color::White => "0-1",
            Color::Black => "1-0",
        }
    } else if movegen::is_stalemate(pos) || session.snapshot().is_draw {
        "1/2-1/2"
    } else {
        "*"
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::session::{DrawRules, GameSession};

    fn play(session: &mut GameSession, moves: &[&str]) {
        for text in moves {
            session
                .apply_move(text)
                .unwrap_or_else(|e| panic!("failed to apply '{text}': {e}"));
        }
    }

    #[test]
    fn pgn_empty_game() {
        let pgn = export_pgn(&GameSession::new());
        assert!(pgn.contains("[Event \"Chess Coach Training\"]"));
        assert!(pgn.contains("[Result \"*\"]"));
        assert!(pgn.ends_with("*\n"));
        assert!(!pgn.contains("[SetUp"));
    }

    #[test]
    fn pgn_with_moves() {
        let mut session = GameSession::new();
        play(&mut session, &["e4", "e5", "Nf3"]);
        let pgn = export_pgn(&session);
        assert!(pgn.contains("1. e4 e5 2. Nf3 *"));
    }

    #[test]
    fn pgn_checkmate_result() {
        let mut session = GameSession::new();
        play(&mut session, &["f3", "e5", "g4", "Qh4#"]);
        let pgn = export_pgn(&session);
        // White is mated: black wins.
        assert!(pgn.contains("[Result \"0-1\"]"));
        assert!(pgn.contains("1. f3 e5 2. g4 Qh4# 0-1"));
    }

    #[test]
    fn pgn_white_win_result() {
        let mut session = GameSession::new();
        play(
            &mut session,
            &["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7#"],
        );
        let pgn = export_pgn(&session);
        assert!(pgn.contains("[Result \"1-0\"]"));
        assert!(pgn.ends_with("1-0\n"));
    }

    #[test]
    fn pgn_from_fen_has_setup_tag() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let mut session = GameSession::from_fen(fen).unwrap();
        play(&mut session, &["e5", "Nf3"]);
        let pgn = export_pgn(&session);
        assert!(pgn.contains("[SetUp \"1\"]"));
        assert!(pgn.contains(&format!("[FEN \"{fen}\"]")));
        // Black moved first from this anchor.
        assert!(pgn.contains("1... e5 2. Nf3"));
    }

    #[test]
    fn pgn_stalemate_result() {
        let session = GameSession::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let pgn = export_pgn(&session);
        assert!(pgn.contains("[Result \"1/2-1/2\"]"));
    }

    #[test]
    fn pgn_draw_result_with_rules_enabled() {
        let session = GameSession::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 100 80")
            .unwrap()
            .with_draw_rules(DrawRules::all());
        let pgn = export_pgn(&session);
        assert!(pgn.contains("[Result \"1/2-1/2\"]"));
    }

    #[test]
    fn pgn_wraps_long_movetext() {
        let mut session = GameSession::new();
        // Knight shuffle long enough to overflow one line.
        for _ in 0..12 {
            play(&mut session, &["Nf3", "Nf6", "Ng1", "Ng8"]);
        }
        let pgn = export_pgn(&session);
        let movetext: Vec<&str> = pgn
            .split("\n\n")
            .nth(1)
            .expect("movetext section")
            .lines()
            .collect();
        assert!(movetext.len() > 1, "expected wrapped movetext");
        for line in movetext {
            assert!(line.len() <= 81, "line too long: {line}");
        }
    }
}
