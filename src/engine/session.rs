//! Game sessions: a position anchor plus a full-snapshot move history.
//!
//! Every applied ply stores the complete resulting `Position`, so undo is a
//! pop and restores the prior state bit for bit. A session owns exactly one
//! game; callers multiplexing games hold one session per game.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::movegen;
use crate::engine::position::Position;
use crate::engine::san;
use crate::engine::types::{Color, EngineError, GamePhase, Move, Piece, PieceKind, Square};

// ---------------------------------------------------------------------------
// Records & results
// ---------------------------------------------------------------------------

/// One applied ply: the move, its SAN text (with `+`/`#` suffix), and the
/// complete position after the move.
#[derive(Clone, Debug)]
pub struct PlyRecord {
    pub mv: Move,
    pub san: String,
    pub position: Position,
}

/// Result of a successful `apply_move`.
#[derive(Clone, Debug, Serialize)]
pub struct MoveOutcome {
    pub san: String,
    pub fen: String,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
    pub is_draw: bool,
    pub is_game_over: bool,
}

/// Result of a successful `undo_last_move`: what was removed and where the
/// session now stands.
#[derive(Clone, Debug)]
pub struct UndoneMove {
    pub mv: Move,
    pub san: String,
    /// FEN of the position the session returned to.
    pub fen: String,
}

/// Serializable view of the whole session for outer layers.
#[derive(Clone, Debug, Serialize)]
pub struct SessionState {
    pub id: Uuid,
    pub fen: String,
    pub turn: Color,
    pub ply_count: usize,
    pub moves: Vec<String>,
    pub phase: GamePhase,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
    pub is_draw: bool,
    pub is_game_over: bool,
}

/// Optional draw-rule detection. All rules default to off; enabling one makes
/// the session report the corresponding draws in `MoveOutcome`/`SessionState`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DrawRules {
    pub fifty_move: bool,
    pub threefold_repetition: bool,
    pub insufficient_material: bool,
}

impl DrawRules {
    /// Every supported rule enabled.
    pub fn all() -> Self {
        DrawRules {
            fifty_move: true,
            threefold_repetition: true,
            insufficient_material: true,
        }
    }
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

/// A single chess game: anchor position, applied plies, and draw-rule config.
#[derive(Clone, Debug)]
pub struct GameSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    anchor: Position,
    /// Set when the session was anchored to a non-standard FEN (drives the
    /// PGN SetUp/FEN tags).
    custom_anchor_fen: Option<String>,
    history: Vec<PlyRecord>,
    pub draw_rules: DrawRules,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    /// New session from the standard starting position.
    pub fn new() -> Self {
        GameSession {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            anchor: Position::starting(),
            custom_anchor_fen: None,
            history: Vec::new(),
            draw_rules: DrawRules::default(),
        }
    }

    /// New session anchored to an arbitrary FEN.
    pub fn from_fen(fen: &str) -> Result<Self, EngineError> {
        let anchor = Position::from_fen(fen)?;
        let mut session = Self::new();
        session.custom_anchor_fen = Some(anchor.to_fen());
        session.anchor = anchor;
        Ok(session)
    }

    pub fn with_draw_rules(mut self, rules: DrawRules) -> Self {
        self.draw_rules = rules;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The current position (after the last applied ply).
    pub fn current_position(&self) -> &Position {
        self.history
            .last()
            .map(|ply| &ply.position)
            .unwrap_or(&self.anchor)
    }

    /// The position the session was anchored to.
    pub fn anchor_position(&self) -> &Position {
        &self.anchor
    }

    /// FEN the session was anchored to, when it is not the standard start.
    pub fn custom_anchor_fen(&self) -> Option<&str> {
        self.custom_anchor_fen.as_deref()
    }

    /// Number of plies applied so far.
    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    /// Applied plies, oldest first.
    pub fn history(&self) -> &[PlyRecord] {
        &self.history
    }

    /// SAN texts of the applied plies, oldest first.
    pub fn move_history(&self) -> Vec<String> {
        self.history.iter().map(|ply| ply.san.clone()).collect()
    }

    /// Phase heuristic over ply count and remaining material.
    pub fn current_phase(&self) -> GamePhase {
        GamePhase::classify(self.history.len(), self.current_position().piece_count())
    }

    /// All legal moves in the current position.
    pub fn legal_moves(&self) -> Vec<Move> {
        movegen::legal_moves(self.current_position())
    }

    /// Legal moves from one square (for UI highlighting).
    pub fn legal_moves_from(&self, from: Square) -> Vec<Move> {
        movegen::legal_moves_from(self.current_position(), from)
    }

    pub fn is_game_over(&self) -> bool {
        let pos = self.current_position();
        movegen::legal_moves(pos).is_empty() || self.is_draw(pos)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Decode and apply a move given as SAN or coordinate text.
    ///
    /// On failure the session is untouched: decode errors surface before any
    /// state changes, and the move is recorded only after it was applied.
    pub fn apply_move(&mut self, text: &str) -> Result<MoveOutcome, EngineError> {
        let pos = self.current_position().clone();
        let mv = san::decode_move(&pos, text)?;

        let legal = movegen::legal_moves(&pos);
        let mut san_text = san::move_to_san(&pos, mv, &legal);

        let next = pos.apply_move(mv);
        let is_checkmate = movegen::is_checkmate(&next);
        let is_stalemate = movegen::is_stalemate(&next);
        let is_check = next.is_in_check();

        if is_checkmate {
            san_text.push('#');
        } else if is_check {
            san_text.push('+');
        }

        let fen = next.to_fen();
        tracing::debug!(session = %self.id, mv = %san_text, %fen, "move applied");

        self.history.push(PlyRecord {
            mv,
            san: san_text.clone(),
            position: next,
        });

        let is_draw = self.is_draw(self.current_position());
        Ok(MoveOutcome {
            san: san_text,
            fen,
            is_check,
            is_checkmate,
            is_stalemate,
            is_draw,
            is_game_over: is_checkmate || is_stalemate || is_draw,
        })
    }

    /// Remove the most recent ply, restoring the previous position exactly.
    pub fn undo_last_move(&mut self) -> Result<UndoneMove, EngineError> {
        let ply = self.history.pop().ok_or(EngineError::EmptyHistory)?;
        let fen = self.current_position().to_fen();
        tracing::debug!(session = %self.id, undone = %ply.san, %fen, "move undone");
        Ok(UndoneMove {
            mv: ply.mv,
            san: ply.san,
            fen,
        })
    }

    /// Discard the history and re-anchor: to the given FEN, or back to the
    /// standard starting position.
    pub fn reset(&mut self, fen: Option<&str>) -> Result<(), EngineError> {
        match fen {
            Some(fen) => {
                let anchor = Position::from_fen(fen)?;
                self.custom_anchor_fen = Some(anchor.to_fen());
                self.anchor = anchor;
            }
            None => {
                self.anchor = Position::starting();
                self.custom_anchor_fen = None;
            }
        }
        self.history.clear();
        tracing::debug!(session = %self.id, "session reset");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // State views
    // -----------------------------------------------------------------------

    /// Serializable snapshot of the whole session.
    pub fn snapshot(&self) -> SessionState {
        let pos = self.current_position();
        let is_checkmate = movegen::is_checkmate(pos);
        let is_stalemate = movegen::is_stalemate(pos);
        let is_draw = self.is_draw(pos);
        SessionState {
            id: self.id,
            fen: pos.to_fen(),
            turn: pos.side_to_move,
            ply_count: self.history.len(),
            moves: self.move_history(),
            phase: self.current_phase(),
            is_check: pos.is_in_check(),
            is_checkmate,
            is_stalemate,
            is_draw,
            is_game_over: is_checkmate || is_stalemate || is_draw,
        }
    }

    // -----------------------------------------------------------------------
    // Draw rules
    // -----------------------------------------------------------------------

    fn is_draw(&self, pos: &Position) -> bool {
        (self.draw_rules.fifty_move && pos.halfmove_clock >= 100)
            || (self.draw_rules.threefold_repetition && self.repetition_count(pos) >= 3)
            || (self.draw_rules.insufficient_material && insufficient_material(pos))
    }

    /// How many times `pos` has occurred over the session (anchor and every
    /// ply included).
    fn repetition_count(&self, pos: &Position) -> usize {
        let key = pos.repetition_key();
        let mut count = usize::from(self.anchor.repetition_key() == key);
        count += self
            .history
            .iter()
            .filter(|ply| ply.position.repetition_key() == key)
            .count();
        count
    }
}

/// Neither side can possibly deliver mate: bare kings, a lone minor piece,
/// or one bishop each with both bishops on the same square colour.
fn insufficient_material(pos: &Position) -> bool {
    let mut minors: Vec<(Color, PieceKind, Square)> = Vec::new();
    for (sq, Piece { color, kind }) in pos.pieces() {
        match kind {
            PieceKind::King => {}
            PieceKind::Knight | PieceKind::Bishop => minors.push((color, kind, sq)),
            // Any pawn, rook, or queen is mating material.
            _ => return false,
        }
    }
    match minors.as_slice() {
        [] | [_] => true,
        [(c1, PieceKind::Bishop, s1), (c2, PieceKind::Bishop, s2)] if c1 != c2 => {
            // Opposite-coloured armies, same-coloured squares.
            (s1.file + s1.rank) % 2 == (s2.file + s2.rank) % 2
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn play(session: &mut GameSession, moves: &[&str]) -> MoveOutcome {
        let mut last = None;
        for text in moves {
            last = Some(session.apply_move(text).unwrap_or_else(|e| {
                panic!("failed to apply '{text}': {e}");
            }));
        }
        last.expect("at least one move")
    }

    // -------------------------------------------------------------------
    // Basic lifecycle
    // -------------------------------------------------------------------

    #[test]
    fn new_session_is_standard_start() {
        let session = GameSession::new();
        assert_eq!(
            session.current_position().to_fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
        assert_eq!(session.ply_count(), 0);
        assert_eq!(session.custom_anchor_fen(), None);
        assert!(!session.is_game_over());
    }

    #[test]
    fn apply_move_san_and_coordinate() {
        let mut session = GameSession::new();
        let outcome = session.apply_move("e4").unwrap();
        assert_eq!(outcome.san, "e4");
        let outcome = session.apply_move("e7e5").unwrap();
        assert_eq!(outcome.san, "e5");
        assert_eq!(session.ply_count(), 2);
    }

    #[test]
    fn failed_apply_leaves_history_untouched() {
        let mut session = GameSession::new();
        session.apply_move("e4").unwrap();
        let fen_before = session.current_position().to_fen();

        assert!(session.apply_move("Ke4").is_err());
        assert!(session.apply_move("e2e5").is_err());
        assert!(session.apply_move("garbage").is_err());

        assert_eq!(session.ply_count(), 1);
        assert_eq!(session.current_position().to_fen(), fen_before);
    }

    // -------------------------------------------------------------------
    // Undo
    // -------------------------------------------------------------------

    #[test]
    fn undo_is_exact_inverse() {
        let mut session = GameSession::new();
        let mut fens = vec![session.current_position().to_fen()];
        for text in ["e4", "c5", "Nf3", "d6", "d4", "cxd4", "Nxd4"] {
            session.apply_move(text).unwrap();
            fens.push(session.current_position().to_fen());
        }
        // Unwind completely; each undo must restore the recorded FEN.
        while session.ply_count() > 0 {
            fens.pop();
            let undone = session.undo_last_move().unwrap();
            assert_eq!(undone.fen, *fens.last().unwrap());
            assert_eq!(session.current_position().to_fen(), *fens.last().unwrap());
        }
    }

    #[test]
    fn undo_empty_history() {
        let mut session = GameSession::new();
        assert!(matches!(
            session.undo_last_move(),
            Err(EngineError::EmptyHistory)
        ));
    }

    #[test]
    fn undo_reports_removed_san() {
        let mut session = GameSession::new();
        session.apply_move("e4").unwrap();
        session.apply_move("e5").unwrap();
        let undone = session.undo_last_move().unwrap();
        assert_eq!(undone.san, "e5");
    }

    // -------------------------------------------------------------------
    // Reset
    // -------------------------------------------------------------------

    #[test]
    fn reset_to_start() {
        let mut session = GameSession::new();
        play(&mut session, &["e4", "e5", "Nf3"]);
        session.reset(None).unwrap();
        assert_eq!(session.ply_count(), 0);
        assert_eq!(
            session.current_position().to_fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn reset_to_fen() {
        let mut session = GameSession::new();
        session.reset(Some("4k3/8/8/8/8/8/8/4K3 w - - 0 1")).unwrap();
        assert_eq!(
            session.custom_anchor_fen(),
            Some("4k3/8/8/8/8/8/8/4K3 w - - 0 1")
        );
        assert_eq!(session.current_phase(), GamePhase::Endgame);
    }

    #[test]
    fn reset_rejects_malformed_fen() {
        let mut session = GameSession::new();
        session.apply_move("e4").unwrap();
        assert!(matches!(
            session.reset(Some("not a fen")),
            Err(EngineError::MalformedFen(_))
        ));
        // Failed reset leaves the session alone.
        assert_eq!(session.ply_count(), 1);
    }

    // -------------------------------------------------------------------
    // Scenarios
    // -------------------------------------------------------------------

    #[test]
    fn fools_mate() {
        let mut session = GameSession::new();
        let outcome = play(&mut session, &["f3", "e5", "g4", "Qh4"]);
        assert_eq!(outcome.san, "Qh4#");
        assert!(outcome.is_checkmate);
        assert!(outcome.is_check);
        assert!(outcome.is_game_over);
        assert!(!outcome.is_stalemate);
        assert!(session.is_game_over());
        assert!(session.legal_moves().is_empty());
    }

    #[test]
    fn check_suffix_on_san() {
        let mut session = GameSession::new();
        // Unprotected queen on f7: check, but the king can take it back.
        let outcome = play(&mut session, &["e4", "e5", "Qh5", "Nc6", "Qxf7"]);
        assert_eq!(outcome.san, "Qxf7+");
        assert!(outcome.is_check);
        assert!(!outcome.is_checkmate);
    }

    #[test]
    fn scholars_mate() {
        let mut session = GameSession::new();
        let outcome = play(
            &mut session,
            &["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7"],
        );
        assert_eq!(outcome.san, "Qxf7#");
        assert!(outcome.is_checkmate);
    }

    #[test]
    fn stalemate_fixture() {
        let session = GameSession::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let state = session.snapshot();
        assert!(state.is_stalemate);
        assert!(!state.is_checkmate);
        assert!(state.is_game_over);
        assert!(session.legal_moves().is_empty());
    }

    #[test]
    fn moves_after_game_over_are_invalid() {
        let mut session = GameSession::new();
        play(&mut session, &["f3", "e5", "g4", "Qh4#"]);
        let err = session.apply_move("a3").unwrap_err();
        assert!(matches!(err, EngineError::InvalidMoveText { .. }));
    }

    // -------------------------------------------------------------------
    // Phase classification
    // -------------------------------------------------------------------

    #[test]
    fn phase_opening_then_middlegame() {
        let mut session = GameSession::new();
        play(&mut session, &["e4", "e5", "Nf3", "Nc6", "Bb5"]);
        assert_eq!(session.current_phase(), GamePhase::Opening);
        play(&mut session, &["a6", "Ba4", "Nf6", "O-O", "Be7"]);
        assert_eq!(session.ply_count(), 10);
        assert_eq!(session.current_phase(), GamePhase::Middlegame);
    }

    #[test]
    fn phase_sparse_board_is_endgame_at_ply_zero() {
        let session = GameSession::from_fen("4k3/8/8/8/8/8/PP6/R3K3 w - - 0 1").unwrap();
        assert_eq!(session.current_phase(), GamePhase::Endgame);
    }

    // -------------------------------------------------------------------
    // Draw rules
    // -------------------------------------------------------------------

    #[test]
    fn draws_ignored_by_default() {
        let session =
            GameSession::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 100 80").unwrap();
        assert!(!session.snapshot().is_draw);
    }

    #[test]
    fn fifty_move_rule() {
        let mut session = GameSession::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 99 80")
            .unwrap()
            .with_draw_rules(DrawRules {
                fifty_move: true,
                ..DrawRules::default()
            });
        let outcome = session.apply_move("Ra2").unwrap();
        assert!(outcome.is_draw);
        assert!(outcome.is_game_over);
    }

    #[test]
    fn threefold_repetition() {
        let mut session = GameSession::new().with_draw_rules(DrawRules {
            threefold_repetition: true,
            ..DrawRules::default()
        });
        // Shuffle the knights out and back twice: the starting placement
        // occurs a third time on the final move.
        let outcome = play(
            &mut session,
            &["Nf3", "Nf6", "Ng1", "Ng8", "Nf3", "Nf6", "Ng1", "Ng8"],
        );
        assert!(outcome.is_draw);
    }

    #[test]
    fn insufficient_material_after_last_capture() {
        let mut session = GameSession::from_fen("4k3/8/8/8/8/8/4q3/4K3 w - - 0 1")
            .unwrap()
            .with_draw_rules(DrawRules {
                insufficient_material: true,
                ..DrawRules::default()
            });
        let outcome = session.apply_move("Kxe2").unwrap();
        assert!(outcome.is_draw);
    }

    #[test]
    fn insufficient_material_cases() {
        // K vs K.
        assert!(insufficient_material(
            &Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap()
        ));
        // K+N vs K.
        assert!(insufficient_material(
            &Position::from_fen("4k3/8/8/8/8/8/8/1N2K3 w - - 0 1").unwrap()
        ));
        // K+B vs K+B, bishops on same colour squares (c1 and f4 are dark).
        assert!(insufficient_material(
            &Position::from_fen("4k3/8/8/8/5b2/8/8/2B1K3 w - - 0 1").unwrap()
        ));
        // K+B vs K+B, opposite colours (c1 dark, e4 light).
        assert!(!insufficient_material(
            &Position::from_fen("4k3/8/8/8/4b3/8/8/2B1K3 w - - 0 1").unwrap()
        ));
        // Any pawn is mating material.
        assert!(!insufficient_material(
            &Position::from_fen("4k3/8/8/8/8/8/P7/4K3 w - - 0 1").unwrap()
        ));
        // Two knights on one side is not covered by the rule.
        assert!(!insufficient_material(
            &Position::from_fen("4k3/8/8/8/8/8/8/NN2K3 w - - 0 1").unwrap()
        ));
    }

    // -------------------------------------------------------------------
    // Snapshot
    // -------------------------------------------------------------------

    #[test]
    fn snapshot_reflects_session() {
        let mut session = GameSession::new();
        play(&mut session, &["e4", "e5", "Nf3"]);
        let state = session.snapshot();
        assert_eq!(state.ply_count, 3);
        assert_eq!(state.moves, vec!["e4", "e5", "Nf3"]);
        assert_eq!(state.turn, Color::Black);
        assert_eq!(state.phase, GamePhase::Opening);
        assert!(!state.is_game_over);
        assert_eq!(state.fen, session.current_position().to_fen());
    }

    #[test]
    fn snapshot_serializes() {
        let session = GameSession::new();
        let json = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(json["turn"], "white");
        assert_eq!(json["phase"], "opening");
        assert_eq!(json["ply_count"], 0);
    }
}
