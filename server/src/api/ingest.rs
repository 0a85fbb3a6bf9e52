//! `POST /import/{source}`, `POST /users/{username}/puzzles/generate`, and
//! `GET /users/{username}/puzzles/status`.

use serde::{Deserialize, Serialize};

use chess_analytics_core::{AnalysisJob, AnalysisStatus, TimeCategory};

use crate::config::PipelineConfig;
use crate::import::{ImportFilter, ImportSource, NullImportSource};
use crate::persistence::{GameRepository, JobRepository, PositionRepository, PuzzleRepository};
use crate::pipeline::{self, run_parse_stage, RunOptions};

use super::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    pub username: String,
    pub rated: Option<bool>,
    pub time_category: Option<TimeCategory>,
    pub max_games: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResponse {
    /// Count of newly-imported games (the HTTP interface: "Synchronously imports and
    /// parses games; returns count").
    pub imported: u32,
    pub parsed: u32,
}

/// The shape shared by `/puzzles/generate` (kicks off a run and returns
/// the job as it stands right after that call) and `/puzzles/status`
/// (pure read, for polling).
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusResponse {
    pub analyzing: bool,
    pub analyzed_games: u32,
    pub total_games: u32,
    pub puzzles_created: u32,
}

impl From<AnalysisJob> for JobStatusResponse {
    fn from(job: AnalysisJob) -> Self {
        Self {
            analyzing: job.analyzing(),
            analyzed_games: job.analyzed_games,
            total_games: job.total_games,
            puzzles_created: job.puzzles_created,
        }
    }
}

/// Needs all four repositories plus an [`ImportSource`]: `/import` drives
/// stages 1-2 directly (no engine involved), while `/puzzles/generate`
/// drives the full pipeline with a [`NullImportSource`] so it never
/// re-fetches games a prior `/import` call already placed on disk.
pub struct IngestEndpoints<G, P, Z, J, I> {
    pub games: G,
    pub positions: P,
    pub puzzles: Z,
    pub jobs: J,
    pub import_source: I,
    pub config: PipelineConfig,
}

impl<G, P, Z, J, I> IngestEndpoints<G, P, Z, J, I>
where
    G: GameRepository + Clone + Send + Sync + 'static,
    P: PositionRepository + Clone + Send + Sync + 'static,
    Z: PuzzleRepository + Clone + Send + Sync + 'static,
    J: JobRepository + Clone + Send + Sync + 'static,
    I: ImportSource,
{
    pub fn new(games: G, positions: P, puzzles: Z, jobs: J, import_source: I, config: PipelineConfig) -> Self {
        Self { games, positions, puzzles, jobs, import_source, config }
    }

    /// `POST /import/{source}`: fetches and parses, but does not evaluate
    /// or generate puzzles — those only happen via `/puzzles/generate`.
    pub async fn import(&self, request: &ImportRequest) -> Result<ImportResponse, ApiError> {
        let filter = ImportFilter {
            rated: request.rated,
            time_category: request.time_category,
            max_games: request.max_games,
        };
        let fetched = self.import_source.fetch_games(&request.username, &filter).await?;
        for record in &fetched {
            let game = crate::import::record_to_game(record, &request.username);
            self.games.upsert_game(&game).await?;
        }
        let parsed = run_parse_stage(&self.games, &self.positions, &request.username).await?;

        Ok(ImportResponse {
            imported: fetched.len() as u32,
            parsed: parsed as u32,
        })
    }

    /// `POST /users/{username}/puzzles/generate`: runs the full pipeline
    /// (parse/evaluate/accuracy/puzzle-generate stages only — import is a
    /// no-op here via [`NullImportSource`]) and returns the job status as
    /// it stands once the run completes.
    pub async fn generate_puzzles(&self, username: &str) -> Result<JobStatusResponse, ApiError> {
        let null_source = NullImportSource;
        let opts = RunOptions {
            username: username.to_string(),
            import_filter: ImportFilter::default(),
        };
        let job = pipeline::run_pipeline(
            &self.games,
            &self.positions,
            &self.puzzles,
            &self.jobs,
            &null_source,
            &self.config,
            opts,
        )
        .await?;
        Ok(job.into())
    }

    /// `GET /users/{username}/puzzles/status`.
    pub async fn puzzle_status(&self, username: &str) -> Result<JobStatusResponse, ApiError> {
        let job = self.jobs.get_job(username).await?.unwrap_or(AnalysisJob {
            username: username.to_string(),
            status: AnalysisStatus::Idle,
            total_games: 0,
            analyzed_games: 0,
            puzzles_created: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        });
        Ok(job.into())
    }
}
