//! Drives a chess engine to a fixed depth and turns its `info`/`bestmove`
//! stream into a single [`Evaluation`] per position.
//!
//! One [`Evaluator`] owns one engine process. Callers serialize queries
//! through it; the engine is sent `ucinewgame` between positions so the
//! transposition table from one query can't bleed depth semantics into an
//! unrelated one. Each pipeline worker owns one `Evaluator` for its
//! lifetime (see `server::pipeline::orchestrator`).

use std::time::Duration;

use cozy_chess::Move;

use crate::{EngineCommand, EngineConfig as StockfishEngineConfig, EngineEvent, GoParams, Score};
use crate::stockfish::{StockfishEngine, StockfishError};

/// Mate scores are reported to callers as a saturated centipawn value
/// rather than a separate variant, matching the persisted-score contract:
/// "cp score (from White's perspective, mate -> ±9000)".
pub const MATE_SCORE_CP: i32 = 9000;

/// Principal variation is truncated to this many plies before being handed
/// back to callers / persisted.
pub const PV_CAP: usize = 8;

/// How long to wait for the engine to reach the requested depth before
/// treating the query as a crash.
const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// A completed analysis of a single position.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub score: EvaluationScore,
    pub depth: u8,
    pub pv: Vec<Move>,
}

/// Score from White's perspective. `Mate` carries the original mate-in-N
/// count (signed: negative means the side to move is being mated) for
/// callers that want it, alongside the saturated centipawn form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationScore {
    Centipawns(i32),
    Mate(i8),
}

impl EvaluationScore {
    /// The centipawn value persisted to storage: mate scores saturate to
    /// ±9000 depending on who delivers it.
    pub fn as_cp(&self) -> i32 {
        match self {
            EvaluationScore::Centipawns(cp) => *cp,
            EvaluationScore::Mate(n) if *n >= 0 => MATE_SCORE_CP,
            EvaluationScore::Mate(_) => -MATE_SCORE_CP,
        }
    }
}

pub use crate::stockfish::EngineConfig;

/// Evaluates positions to a configured depth, restarting the underlying
/// engine process on crash.
pub struct Evaluator {
    engine: StockfishEngine,
    config: StockfishEngineConfig,
    consecutive_failures: u32,
}

impl Evaluator {
    pub async fn spawn(config: EngineConfig) -> Result<Self, EvaluatorError> {
        let engine = StockfishEngine::spawn_with_config(config.clone())
            .await
            .map_err(EvaluatorError::Spawn)?;
        Ok(Self {
            engine,
            config,
            consecutive_failures: 0,
        })
    }

    /// Analyze `fen` to `depth`. On engine crash the process is restarted
    /// and the position is reported as a failure; after three consecutive
    /// failures the caller should flag the position `eval_failed` and move
    /// on (per the contract, this never aborts the whole job).
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn analyze_to_depth(
        &mut self,
        fen: &str,
        depth: u8,
    ) -> Result<Evaluation, EvaluatorError> {
        match self.try_analyze(fen, depth).await {
            Ok(eval) => {
                self.consecutive_failures = 0;
                Ok(eval)
            }
            Err(e) => {
                self.consecutive_failures += 1;
                tracing::warn!(
                    error = %e,
                    consecutive_failures = self.consecutive_failures,
                    "engine query failed, restarting engine"
                );
                self.restart().await?;
                Err(e)
            }
        }
    }

    /// Whether the caller should flag this position `eval_failed` and skip
    /// it for the rest of the pipeline.
    pub fn has_failed_three_times(&self) -> bool {
        self.consecutive_failures >= 3
    }

    pub fn reset_failure_count(&mut self) {
        self.consecutive_failures = 0;
    }

    async fn restart(&mut self) -> Result<(), EvaluatorError> {
        let new_engine = StockfishEngine::spawn_with_config(self.config.clone())
            .await
            .map_err(EvaluatorError::Spawn)?;
        let old = std::mem::replace(&mut self.engine, new_engine);
        old.shutdown().await;
        Ok(())
    }

    async fn try_analyze(&mut self, fen: &str, depth: u8) -> Result<Evaluation, EvaluatorError> {
        self.engine
            .send_command(EngineCommand::NewGame)
            .await
            .map_err(EvaluatorError::EngineIo)?;
        self.engine
            .send_command(EngineCommand::SetPosition {
                fen: fen.to_string(),
                moves: Vec::new(),
            })
            .await
            .map_err(EvaluatorError::EngineIo)?;
        self.engine
            .send_command(EngineCommand::Go(GoParams {
                movetime: None,
                depth: Some(depth),
                infinite: false,
            }))
            .await
            .map_err(EvaluatorError::EngineIo)?;

        let mut best_info: Option<(u8, Score, Vec<Move>)> = None;

        let result = tokio::time::timeout(QUERY_TIMEOUT, async {
            loop {
                match self.engine.recv_event().await {
                    Some(EngineEvent::Info(info)) => {
                        if let (Some(d), Some(score)) = (info.depth, info.score) {
                            if d <= depth
                                && best_info.as_ref().map(|(bd, ..)| d >= *bd).unwrap_or(true)
                            {
                                best_info = Some((d, score, info.pv));
                            }
                        }
                    }
                    Some(EngineEvent::BestMove(_)) => break,
                    Some(EngineEvent::Error(e)) => return Err(EvaluatorError::EngineReported(e)),
                    Some(_) => continue,
                    None => return Err(EvaluatorError::EngineClosed),
                }
            }
            Ok(())
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(EvaluatorError::Timeout),
        }

        let (depth_achieved, score, pv) =
            best_info.ok_or(EvaluatorError::NoEvaluationProduced)?;

        let score = match score {
            Score::Centipawns(cp) => EvaluationScore::Centipawns(cp),
            Score::Mate(n) => EvaluationScore::Mate(n),
        };

        Ok(Evaluation {
            score,
            depth: depth_achieved,
            pv: pv.into_iter().take(PV_CAP).collect(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluatorError {
    #[error("failed to spawn engine: {0}")]
    Spawn(#[from] StockfishError),
    #[error("engine IO error: {0}")]
    EngineIo(StockfishError),
    #[error("engine reported an error: {0}")]
    EngineReported(String),
    #[error("engine closed its event channel")]
    EngineClosed,
    #[error("engine did not finish within the query timeout")]
    Timeout,
    #[error("engine produced no usable evaluation before bestmove")]
    NoEvaluationProduced,
}
