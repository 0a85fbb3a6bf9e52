//! The logical data model: users, games, positions, puzzles, and the
//! transient analysis-job record. Field/type choices follow the "dynamic
//! types become tagged variants" approach: `Eval` is a tagged `Cp(i32) |
//! Mate(i32)` in memory even though the wire/storage form is a clamped
//! `i32` centipawn value.

use analysis::{Category, TacticalTagKind};
use serde::{Deserialize, Serialize};

/// Mate scores are clamped to this magnitude when stored as a plain cp
/// integer, per the data model's Position invariant `|eval| ≤ 9000`.
pub const MATE_CLAMP_CP: i32 = 9000;

/// An engine evaluation, internally tagged so callers can tell a forced
/// mate from a merely large centipawn score, even though persistence only
/// ever sees the clamped `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Eval {
    Cp(i32),
    /// Mate in N plies; sign follows the side to move (negative = being
    /// mated).
    Mate(i32),
}

impl Eval {
    /// The clamped centipawn value persisted to storage and used by every
    /// downstream formula (the accuracy model's WP transform, mistake detection's delta thresholds).
    pub fn as_cp(self) -> i32 {
        match self {
            Eval::Cp(cp) => cp.clamp(-MATE_CLAMP_CP, MATE_CLAMP_CP),
            Eval::Mate(n) if n >= 0 => MATE_CLAMP_CP,
            Eval::Mate(_) => -MATE_CLAMP_CP,
        }
    }
}

/// A player's online time-control bucket, derived from the base seconds of
/// `timeControl` (`<180` bullet, `<600` blitz, `>=600` rapid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeCategory {
    Bullet,
    Blitz,
    Rapid,
}

impl TimeCategory {
    /// Parses a PGN-style `TimeControl` tag (`"180"`, `"179+2"`, `"600+0"`)
    /// into a bucket by its base-seconds component.
    pub fn from_time_control(time_control: &str) -> Option<Self> {
        let base = time_control.split('+').next()?;
        let base_seconds: u32 = base.parse().ok()?;
        Some(if base_seconds < 180 {
            TimeCategory::Bullet
        } else if base_seconds < 600 {
            TimeCategory::Blitz
        } else {
            TimeCategory::Rapid
        })
    }
}

/// Result of a game from the owning user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

/// Side to move / mover color. `chess::PieceColor` rather than
/// `cozy_chess::Color` directly, since every persisted/transported model
/// type here derives `Serialize`/`Deserialize` and the project-owned color
/// type is the one with serde support (the design notes: "dynamic types... become
/// tagged variants" applies to this boundary too).
pub type Side = chess::PieceColor;

/// A user, identified case-insensitively by username. Username comparisons
/// and storage keys should always go through [`normalize_username`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
}

/// Lowercases a username for use as a storage/dedup key, per the data model's
/// "case-insensitive username" invariant.
pub fn normalize_username(username: &str) -> String {
    username.to_lowercase()
}

/// A single imported game. `externalId` (the game URL) is the natural key
/// used for (user, externalId) deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub username: String,
    pub external_id: String,
    pub pgn: String,
    pub end_date: chrono::DateTime<chrono::Utc>,
    pub result: GameResult,
    pub time_control: String,
    pub rated: bool,
    pub time_category: TimeCategory,
    pub positions_parsed: bool,
    pub accuracy_white: Option<f64>,
    pub accuracy_black: Option<f64>,
    pub white_name: String,
    pub black_name: String,
    pub white_elo: Option<i32>,
    pub black_elo: Option<i32>,
}

/// Which side the owning user played in a game — needed throughout the
/// pipeline to pick "the mover's perspective" out of a White-relative eval.
impl Game {
    pub fn user_side(&self) -> Side {
        if self.username.eq_ignore_ascii_case(&self.white_name) {
            Side::White
        } else {
            Side::Black
        }
    }
}

/// One ply (half-move) of a parsed game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub game_id: i64,
    /// 1-based, dense, ordinal along the main line.
    pub ply: u32,
    /// The position *before* the move is played.
    pub fen: String,
    pub move_uci: String,
    pub san: String,
    pub side_to_move: Side,
    pub eval: Option<i32>,
    pub eval_depth: Option<u32>,
    pub pv: Option<Vec<String>>,
    /// Set after three consecutive engine failures (the evaluator); the position is
    /// then skipped by every downstream stage but the game remains
    /// otherwise processable.
    pub eval_failed: bool,
}

impl Position {
    /// the accuracy model's phase classification, derived from `ply` and the position's
    /// material.
    pub fn phase(&self, board: &cozy_chess::Board) -> Phase {
        if self.ply <= 24 {
            return Phase::Opening;
        }
        if analysis::major_minor_piece_count(board) < 7 {
            return Phase::Endgame;
        }
        Phase::Middlegame
    }

    /// [`Position::phase`], parsing `self.fen` internally so callers outside
    /// this crate don't need a direct `cozy_chess` dependency just to ask
    /// what phase a stored position falls in. `None` only if `fen` is
    /// malformed, which shouldn't happen for anything that passed parsing.
    pub fn phase_from_fen(&self) -> Option<Phase> {
        let board: cozy_chess::Board = self.fen.parse().ok()?;
        Some(self.phase(&board))
    }
}

/// the accuracy model's three game phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Opening,
    Middlegame,
    Endgame,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Opening, Phase::Middlegame, Phase::Endgame];
}

/// How bad a mistake was, per mistake detection step 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mistake,
    Blunder,
    MissedWin,
    MissedSave,
}

/// A puzzle generated from one of the user's actual mistakes. `category`
/// and `labels` come from `analysis::classify_puzzle`; everything else is
/// assembled in [`crate::scan`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Puzzle {
    pub game_id: i64,
    pub ply: u32,
    pub fen: String,
    pub side_to_move: Side,
    pub played_move_uci: String,
    pub best_move_uci: String,
    pub pv_moves: Vec<String>,
    pub eval_before_cp: i32,
    pub eval_after_cp: i32,
    pub delta_cp: i32,
    pub required_moves: u32,
    pub setup_fen: Option<String>,
    pub setup_move_uci: Option<String>,
    pub category: Category,
    pub severity: Severity,
    pub labels: Vec<TacticalTagKind>,
}

/// Progress/status record driving the polling interface of the HTTP interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Idle,
    Running,
    Done,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub username: String,
    pub status: AnalysisStatus,
    pub total_games: u32,
    pub analyzed_games: u32,
    pub puzzles_created: u32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl AnalysisJob {
    pub fn analyzing(&self) -> bool {
        self.status == AnalysisStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_category_boundaries() {
        assert_eq!(TimeCategory::from_time_control("60"), Some(TimeCategory::Bullet));
        assert_eq!(TimeCategory::from_time_control("180"), Some(TimeCategory::Blitz));
        assert_eq!(TimeCategory::from_time_control("179+2"), Some(TimeCategory::Bullet));
        assert_eq!(TimeCategory::from_time_control("600+0"), Some(TimeCategory::Rapid));
        assert_eq!(TimeCategory::from_time_control("599"), Some(TimeCategory::Blitz));
    }

    #[test]
    fn mate_eval_clamps_with_sign() {
        assert_eq!(Eval::Mate(4).as_cp(), MATE_CLAMP_CP);
        assert_eq!(Eval::Mate(-1).as_cp(), -MATE_CLAMP_CP);
        assert_eq!(Eval::Cp(15000).as_cp(), MATE_CLAMP_CP);
        assert_eq!(Eval::Cp(-15000).as_cp(), -MATE_CLAMP_CP);
    }

    #[test]
    fn username_normalization_is_case_insensitive() {
        assert_eq!(normalize_username("MagnusC"), normalize_username("magnusc"));
    }

    #[test]
    fn eval_roundtrips_through_json_as_a_tagged_variant() {
        let mate = Eval::Mate(-3);
        let serialized = serde_json::to_string(&mate).expect("serialize eval");
        let deserialized: Eval = serde_json::from_str(&serialized).expect("deserialize eval");
        assert_eq!(mate, deserialized);
    }
}
