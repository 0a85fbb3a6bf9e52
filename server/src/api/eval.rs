//! `GET /eval?fen=...`: a direct single-position evaluation lookup for
//! analysis UIs, independent of the stored pipeline data.

use std::path::Path;

use serde::Serialize;

use engine::{EngineConfig, Evaluator, EvaluatorError};

#[derive(Debug, Clone, Serialize)]
pub struct EvalResponse {
    pub fen: String,
    pub eval_cp: i32,
    pub depth: u8,
    pub pv: Vec<String>,
}

/// Spawns a fresh engine, evaluates `fen` to `depth`, and lets it drop --
/// this endpoint is a one-shot lookup, not wired into the worker pool that
/// owns a long-lived [`Evaluator`] per pipeline run.
pub async fn evaluate_fen(fen: &str, depth: u8, engine_path: &Path) -> Result<EvalResponse, EvaluatorError> {
    let mut evaluator = Evaluator::spawn(EngineConfig {
        engine_path: Some(engine_path.to_path_buf()),
        ..Default::default()
    })
    .await?;
    let evaluation = evaluator.analyze_to_depth(fen, depth).await?;
    let pv: Vec<String> = evaluation.pv.iter().map(|m| chess::format_uci_move(*m)).collect();
    Ok(EvalResponse {
        fen: fen.to_string(),
        eval_cp: evaluation.score.as_cp(),
        depth: evaluation.depth,
        pv,
    })
}
