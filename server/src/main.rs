//! CLI entry point for the analytics backend.
//!
//! The HTTP shell is an external collaborator; this binary drives the
//! pipeline directly against a username, as a single-user blunder-scan CLI
//! rather than a network service.

use clap::Parser;

use chess_analytics_server::config;
use chess_analytics_server::import::{FixtureImportSource, ImportFilter};
use chess_analytics_server::persistence::{
    Database, SqliteGameRepository, SqliteJobRepository, SqlitePositionRepository, SqlitePuzzleRepository,
};
use chess_analytics_server::pipeline::{self, RunOptions};

/// Runs the full five-stage pipeline for one user and prints the
/// resulting job record.
#[derive(Parser, Debug)]
#[command(name = "chess-analytics-server")]
struct Cli {
    /// Chess-site username to analyze.
    username: String,

    /// Only import rated games.
    #[arg(long)]
    rated: bool,

    /// Cap on the number of games fetched from the import adapter.
    #[arg(long)]
    max_games: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::PipelineConfig::from_env();

    tracing::info!(
        username = %cli.username,
        db = %config.db_path().display(),
        engine = %config.engine_path.display(),
        "starting analysis pipeline"
    );

    let database = Database::open(&config.db_path()).await?;
    let games = SqliteGameRepository::new(database.pool().clone());
    let positions = SqlitePositionRepository::new(database.pool().clone());
    let puzzles = SqlitePuzzleRepository::new(database.pool().clone());
    let jobs = SqliteJobRepository::new(database.pool().clone());

    // No real games-source adapter is wired up here (out of scope);
    // a fixture source keeps the pipeline runnable end-to-end locally.
    let import_source = FixtureImportSource::new();

    let opts = RunOptions {
        username: cli.username.clone(),
        import_filter: ImportFilter {
            rated: cli.rated.then_some(true),
            time_category: None,
            max_games: cli.max_games,
        },
    };

    let job = pipeline::run_pipeline(&games, &positions, &puzzles, &jobs, &import_source, &config, opts).await?;

    tracing::info!(
        status = ?job.status,
        total_games = job.total_games,
        analyzed_games = job.analyzed_games,
        puzzles_created = job.puzzles_created,
        "pipeline run complete"
    );

    println!(
        "{}",
        serde_json::to_string_pretty(&job).unwrap_or_else(|_| "{}".to_string())
    );

    Ok(())
}
