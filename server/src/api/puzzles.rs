//! `GET /users/{username}/puzzles` and `GET /puzzles/{id}`.

use serde::{Deserialize, Serialize};

use analysis::{Category, TacticalTagKind};
use chess_analytics_core::{Puzzle, TimeCategory};

use crate::persistence::{GameRepository, JobRepository, PuzzleFilter, PuzzleRepository};

use super::{ensure_user_known, ApiError};

#[derive(Debug, Clone, Deserialize)]
pub struct PuzzleListQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    pub rated: Option<bool>,
    pub time_category: Option<TimeCategory>,
    pub category: Option<Category>,
    pub label: Option<TacticalTagKind>,
}

fn default_limit() -> u32 {
    20
}

impl Default for PuzzleListQuery {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
            rated: None,
            time_category: None,
            category: None,
            label: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PuzzleListResponse {
    pub puzzles: Vec<Puzzle>,
    pub total: u64,
}

/// `GET /puzzles/{id}`'s full payload: the puzzle plus the two player names
/// from the owning game, since the puzzle row itself only carries `fen`/
/// `side_to_move` (the HTTP interface: "Full puzzle with setup move and player names").
#[derive(Debug, Clone, Serialize)]
pub struct PuzzleResponse {
    #[serde(flatten)]
    pub puzzle: Puzzle,
    pub id: String,
    pub white_name: String,
    pub black_name: String,
}

/// Encodes a puzzle's natural `(game_id, ply)` key as the single opaque id
/// the `/puzzles/{id}` path shape implies. The data model has no
/// surrogate puzzle id, so this exposes the natural key as a colon-joined
/// string rather than adding one.
pub fn puzzle_id(game_id: i64, ply: u32) -> String {
    format!("{game_id}:{ply}")
}

pub fn parse_puzzle_id(id: &str) -> Result<(i64, u32), ApiError> {
    let (game_part, ply_part) = id
        .split_once(':')
        .ok_or_else(|| ApiError::MalformedPuzzleId(id.to_string()))?;
    let game_id: i64 = game_part
        .parse()
        .map_err(|_| ApiError::MalformedPuzzleId(id.to_string()))?;
    let ply: u32 = ply_part
        .parse()
        .map_err(|_| ApiError::MalformedPuzzleId(id.to_string()))?;
    Ok((game_id, ply))
}

pub struct PuzzleEndpoints<G, Z, J> {
    pub games: G,
    pub puzzles: Z,
    pub jobs: J,
}

impl<G, Z, J> PuzzleEndpoints<G, Z, J>
where
    G: GameRepository,
    Z: PuzzleRepository,
    J: JobRepository,
{
    pub fn new(games: G, puzzles: Z, jobs: J) -> Self {
        Self { games, puzzles, jobs }
    }

    pub async fn list_puzzles(
        &self,
        username: &str,
        query: &PuzzleListQuery,
    ) -> Result<PuzzleListResponse, ApiError> {
        ensure_user_known(&self.games, &self.jobs, username).await?;

        let filter = PuzzleFilter {
            rated: query.rated,
            time_category: query.time_category,
            category: query.category,
            label: query.label.clone(),
            limit: query.limit,
            offset: query.offset,
        };
        let (puzzles, total) = self.puzzles.list_puzzles(username, &filter).await?;
        Ok(PuzzleListResponse { puzzles, total })
    }

    pub async fn get_puzzle(&self, id: &str) -> Result<PuzzleResponse, ApiError> {
        let (game_id, ply) = parse_puzzle_id(id)?;
        let puzzle = self
            .puzzles
            .get_puzzle(game_id, ply)
            .await?
            .ok_or(ApiError::PuzzleNotFound)?;
        let game = self
            .games
            .get_game(game_id)
            .await?
            .ok_or(ApiError::PuzzleNotFound)?;

        Ok(PuzzleResponse {
            id: puzzle_id(puzzle.game_id, puzzle.ply),
            white_name: game.white_name,
            black_name: game.black_name,
            puzzle,
        })
    }
}
