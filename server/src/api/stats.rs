//! `GET /users/{username}/stats` and `GET /users/{username}/games`.

use serde::{Deserialize, Serialize};

use chess_analytics_core::{Game, GameResult, TimeCategory};

use crate::persistence::{GameFilter, GameRepository, JobRepository};

use super::{ensure_user_known, ApiError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsQuery {
    pub time_category: Option<TimeCategory>,
    pub rated: Option<bool>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub games_counted: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub win_rate: f64,
    pub loss_rate: f64,
    pub draw_rate: f64,
    /// Mean `accuracyWhite` across games where the user played White and it
    /// has been computed; `None` if no such game has an accuracy yet.
    pub accuracy_white: Option<f64>,
    /// Mean `accuracyBlack`, symmetric with `accuracy_white`.
    pub accuracy_black: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameListQuery {
    pub time_category: Option<TimeCategory>,
    pub rated: Option<bool>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameListResponse {
    pub games: Vec<Game>,
}

/// Answers `/stats` and `/games`. Needs both the game and job repositories
/// since "unknown username" (error handling) is decided from whichever of the two has
/// ever recorded the user.
pub struct StatsEndpoints<G, J> {
    pub games: G,
    pub jobs: J,
}

impl<G, J> StatsEndpoints<G, J>
where
    G: GameRepository,
    J: JobRepository,
{
    pub fn new(games: G, jobs: J) -> Self {
        Self { games, jobs }
    }

    pub async fn stats(&self, username: &str, query: &StatsQuery) -> Result<StatsResponse, ApiError> {
        ensure_user_known(&self.games, &self.jobs, username).await?;

        let filter = GameFilter {
            rated: query.rated,
            time_category: query.time_category,
            limit: query.limit,
        };
        let games = self.games.list_games(username, &filter).await?;

        let wins = games.iter().filter(|g| g.result == GameResult::Win).count() as u32;
        let losses = games.iter().filter(|g| g.result == GameResult::Loss).count() as u32;
        let draws = games.iter().filter(|g| g.result == GameResult::Draw).count() as u32;
        let total = games.len() as f64;

        let rate = |count: u32| if total > 0.0 { count as f64 / total } else { 0.0 };

        let white_games: Vec<f64> = games
            .iter()
            .filter(|g| g.username.eq_ignore_ascii_case(&g.white_name))
            .filter_map(|g| g.accuracy_white)
            .collect();
        let black_games: Vec<f64> = games
            .iter()
            .filter(|g| g.username.eq_ignore_ascii_case(&g.black_name))
            .filter_map(|g| g.accuracy_black)
            .collect();

        Ok(StatsResponse {
            games_counted: games.len() as u32,
            wins,
            losses,
            draws,
            win_rate: rate(wins),
            loss_rate: rate(losses),
            draw_rate: rate(draws),
            accuracy_white: mean(&white_games),
            accuracy_black: mean(&black_games),
        })
    }

    pub async fn games(&self, username: &str, query: &GameListQuery) -> Result<GameListResponse, ApiError> {
        ensure_user_known(&self.games, &self.jobs, username).await?;

        let filter = GameFilter {
            rated: query.rated,
            time_category: query.time_category,
            limit: query.limit,
        };
        let games = self.games.list_games(username, &filter).await?;
        Ok(GameListResponse { games })
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
