//! Configuration for the analytics backend.
//!
//! Handles data directory configuration with the following precedence:
//! 1. `CHESS_ANALYTICS_DATA_DIR` environment variable
//! 2. `~/.config/chess-analytics/data` (production default)
//! 3. `./data` (fallback for development)
//!
//! Engine/depth/concurrency knobs follow the same pattern: an explicit env
//! var wins, otherwise a documented default.

use std::path::PathBuf;

use directories::ProjectDirs;

const DEV_DATA_DIR: &str = "./data";

/// Screening-depth default (the evaluator): fast enough to run on every ply of
/// every imported game.
pub const DEFAULT_SCREENING_DEPTH: u8 = 12;
/// Review-depth default (the evaluator): only run on mistake candidates, so it can
/// afford to be much deeper.
pub const DEFAULT_REVIEW_DEPTH: u8 = 18;
/// Default worker concurrency cap (typically 2-4 in practice).
pub const DEFAULT_CONCURRENCY: usize = 3;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub engine_path: PathBuf,
    pub screening_depth: u8,
    pub review_depth: u8,
    pub concurrency: usize,
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self {
            data_dir: get_data_dir(),
            engine_path: get_engine_path(),
            screening_depth: env_u8("CHESS_ANALYTICS_SCREENING_DEPTH", DEFAULT_SCREENING_DEPTH),
            review_depth: env_u8("CHESS_ANALYTICS_REVIEW_DEPTH", DEFAULT_REVIEW_DEPTH),
            concurrency: env_usize("CHESS_ANALYTICS_CONCURRENCY", DEFAULT_CONCURRENCY),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("analytics.db")
    }
}

/// Priority:
/// 1. `CHESS_ANALYTICS_DATA_DIR` env variable if set
/// 2. the platform's project data dir (`ProjectDirs::from("", "", "chess-analytics")`)
/// 3. `./data` as fallback
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHESS_ANALYTICS_DATA_DIR") {
        return PathBuf::from(dir);
    }

    ProjectDirs::from("", "", "chess-analytics")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(DEV_DATA_DIR))
}

/// Path to the engine binary. Defaults to relying on `$PATH`.
pub fn get_engine_path() -> PathBuf {
    std::env::var("CHESS_ANALYTICS_ENGINE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("stockfish"))
}

fn env_u8(name: &str, default: u8) -> u8 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
