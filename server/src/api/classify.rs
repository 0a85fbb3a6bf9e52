//! `POST /classify-test` (the HTTP interface): the category cascade plus
//! mistake detection's severity assignment, as a pure function of the
//! fields the request body carries. No persistence, independent of any
//! [`super::ApiError`] variant that touches a repository.

use serde::{Deserialize, Serialize};

use analysis::{classify_puzzle, ClassifyInput, TacticalTagKind};
use chess::PieceColor;
use chess_analytics_core::{classify_severity, Category, Severity};

use super::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyTestRequest {
    pub fen: String,
    pub best_move_uci: String,
    pub pv_moves: Vec<String>,
    pub eval_before_cp: i32,
    pub eval_after_cp: i32,
    pub side_to_move: PieceColor,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyTestResponse {
    pub category: Category,
    pub severity: Severity,
    pub labels: Vec<TacticalTagKind>,
}

/// Pure function of `request`'s fields: two calls with the same input
/// always return the same output.
pub fn classify_test(request: &ClassifyTestRequest) -> Result<ClassifyTestResponse, ApiError> {
    let input = ClassifyInput {
        fen: &request.fen,
        best_move_uci: &request.best_move_uci,
        pv_moves: &request.pv_moves,
        eval_before_cp: request.eval_before_cp,
        eval_after_cp: request.eval_after_cp,
        side_to_move: request.side_to_move.into(),
    };
    let (category, tags) = classify_puzzle(&input)?;

    let mut labels = Vec::new();
    for tag in &tags {
        if !labels.contains(&tag.kind) {
            labels.push(tag.kind.clone());
        }
    }
    let severity = classify_severity(request.eval_before_cp, request.eval_after_cp);

    Ok(ClassifyTestResponse { category, severity, labels })
}
