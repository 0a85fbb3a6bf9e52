//! `GET /users/{username}/arena-stats` and `GET /target-stats`: the
//! six-category arena rating card, and the same curves evaluated at a
//! hypothetical rating with no game data behind them.

use serde::{Deserialize, Serialize};

use chess_analytics_core::{
    build_card, compute_form, defending_observed_pct, endgame_observed_pct, lookup_expected,
    observe_move, strategic_observed_pct, ArenaCard, CategoryKind, CategoryTally, Phase, Severity,
    TimeCategory,
};

use crate::persistence::{GameFilter, GameRepository, JobRepository, PositionRepository, PuzzleFilter, PuzzleRepository};
use crate::pipeline::compute_move_accuracies;

use super::{ensure_user_known, ApiError};

#[derive(Debug, Clone, Deserialize)]
pub struct ArenaStatsRequest {
    pub time_category: Option<TimeCategory>,
    pub chess_rating: i32,
    pub rated: Option<bool>,
    /// Accepted per the HTTP interface's query shape; the rating curves aren't split by
    /// title today, so this has no effect on the computed card yet.
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArenaStatsResponse {
    pub card: ArenaCard,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetStatsRequest {
    pub target_rating: i32,
    /// Accepted per the HTTP interface's query shape; the curves aren't split by time
    /// category today, so this has no effect on the computed response yet.
    pub time_category: Option<TimeCategory>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryExpectation {
    pub category: CategoryKind,
    pub expected_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseExpectation {
    pub opening: f64,
    pub middlegame: f64,
    pub endgame: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetStatsResponse {
    pub target_rating: i32,
    pub categories: Vec<CategoryExpectation>,
    pub phase_accuracies: PhaseExpectation,
}

pub struct ArenaEndpoints<G, P, Z, J> {
    pub games: G,
    pub positions: P,
    pub puzzles: Z,
    pub jobs: J,
}

impl<G, P, Z, J> ArenaEndpoints<G, P, Z, J>
where
    G: GameRepository,
    P: PositionRepository,
    Z: PuzzleRepository,
    J: JobRepository,
{
    pub fn new(games: G, positions: P, puzzles: Z, jobs: J) -> Self {
        Self { games, positions, puzzles, jobs }
    }

    /// `GET /users/{username}/arena-stats`: walks every one of the user's
    /// fully-parsed games, runs the category cascade over every mover ply (not
    /// just the ones that became puzzles, per the rating model), and folds the result
    /// into a six-category [`ArenaCard`].
    pub async fn arena_stats(
        &self,
        username: &str,
        request: &ArenaStatsRequest,
    ) -> Result<ArenaStatsResponse, ApiError> {
        ensure_user_known(&self.games, &self.jobs, username).await?;

        let filter = GameFilter {
            rated: request.rated,
            time_category: request.time_category,
            limit: None,
        };
        let games = self.games.list_games(username, &filter).await?;

        let mut tally = CategoryTally::default();
        let mut samples = Vec::new();
        let mut overall_accuracies = Vec::new();
        let mut move_count: u32 = 0;

        for (game_index, game) in games.iter().enumerate().filter(|(_, g)| g.positions_parsed) {
            let rows = self.positions.list_positions(game.id).await?;
            let mover_side = game.user_side();

            for move_acc in compute_move_accuracies(&rows).iter().filter(|m| m.side == mover_side) {
                move_count += 1;
                if let Some(position) = rows.iter().find(|p| p.ply == move_acc.ply) {
                    if let Some(phase) = position.phase_from_fen() {
                        samples.push(chess_analytics_core::MoveSample {
                            phase,
                            accuracy: move_acc.accuracy,
                            wp_before: move_acc.wp_before,
                            wp_after: move_acc.wp_after,
                            is_best_move: move_acc.is_best_move,
                            per_game_index: game_index,
                        });
                    }
                }
            }

            for window in rows.windows(2) {
                let (before, after) = (&window[0], &window[1]);
                if before.side_to_move != mover_side {
                    continue;
                }
                if let Some(obs) = observe_move(before, after, mover_side)? {
                    tally.add(obs);
                }
            }

            let side_accuracy = if mover_side == chess::PieceColor::White {
                game.accuracy_white
            } else {
                game.accuracy_black
            };
            if let Some(acc) = side_accuracy {
                overall_accuracies.push(acc);
            }
        }

        let puzzle_filter = PuzzleFilter {
            rated: request.rated,
            time_category: request.time_category,
            category: None,
            label: None,
            limit: u32::MAX,
            offset: 0,
        };
        let (puzzles, _) = self.puzzles.list_puzzles(username, &puzzle_filter).await?;
        let missed_save_count = puzzles.iter().filter(|p| p.severity == Severity::MissedSave).count() as u32;

        let opening_samples: Vec<_> = samples.iter().copied().filter(|s| s.phase == Phase::Opening).collect();
        let endgame_samples: Vec<_> = samples.iter().copied().filter(|s| s.phase == Phase::Endgame).collect();
        let opening_metrics = chess_analytics_core::phase_metrics(&opening_samples);
        let endgame_metrics = chess_analytics_core::phase_metrics(&endgame_samples);

        let overall_accuracy = mean(&overall_accuracies).unwrap_or(50.0);
        let opening_and_endgame_accuracy =
            mean(&[opening_metrics.accuracy, endgame_metrics.accuracy].into_iter().flatten().collect::<Vec<_>>())
                .unwrap_or(50.0);

        let observed = vec![
            (CategoryKind::Attacking, tally.attacking_observed_pct()),
            (CategoryKind::Defending, defending_observed_pct(missed_save_count, move_count.max(1))),
            (CategoryKind::Tactics, tally.tactics_observed_pct()),
            (CategoryKind::Strategic, strategic_observed_pct(overall_accuracy, opening_and_endgame_accuracy)),
            (CategoryKind::Opening, tally.opening_observed_pct()),
            (CategoryKind::Endgame, endgame_observed_pct(endgame_metrics.accuracy)),
        ];

        // `compute_form` reads its slice oldest-to-newest and takes the
        // tail; `list_games` returns newest-first, so reverse before
        // building the form input.
        let mut chronological = games.clone();
        chronological.reverse();
        let recent_results: Vec<_> = chronological.iter().map(|g| g.result).collect();
        let form = compute_form(&recent_results);

        let card = build_card(&observed, request.chess_rating, form);
        Ok(ArenaStatsResponse { card })
    }
}

impl<G, P, Z, J> ArenaEndpoints<G, P, Z, J> {
    /// `GET /target-stats`: the calibration curves evaluated at
    /// `target_rating`, with no game data involved. No repository bounds
    /// needed, unlike [`Self::arena_stats`] above.
    ///
    /// Phase accuracies are wanted at a target rating but only the six
    /// [`CategoryKind`] curves exist, two of which
    /// (`opening`/`endgame`) line up with [`Phase`] names directly. There
    /// is no `middlegame` curve, so middlegame's expectation is taken as
    /// the mean of the four categories that apply mid-game play
    /// (attacking/defending/tactics/strategic) rather than invented from
    /// nothing.
    pub fn target_stats(&self, request: &TargetStatsRequest) -> TargetStatsResponse {
        let categories: Vec<CategoryExpectation> = CategoryKind::ALL
            .iter()
            .map(|&category| CategoryExpectation {
                category,
                expected_pct: lookup_expected(category.curve(), request.target_rating),
            })
            .collect();

        let opening = lookup_expected(CategoryKind::Opening.curve(), request.target_rating);
        let endgame = lookup_expected(CategoryKind::Endgame.curve(), request.target_rating);
        let middlegame_categories =
            [CategoryKind::Attacking, CategoryKind::Defending, CategoryKind::Tactics, CategoryKind::Strategic];
        let middlegame = middlegame_categories
            .iter()
            .map(|c| lookup_expected(c.curve(), request.target_rating))
            .sum::<f64>()
            / middlegame_categories.len() as f64;

        TargetStatsResponse {
            target_rating: request.target_rating,
            categories,
            phase_accuracies: PhaseExpectation { opening, middlegame, endgame },
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_stats_is_a_pure_function_of_rating() {
        let endpoints: ArenaEndpoints<(), (), (), ()> = ArenaEndpoints {
            games: (),
            positions: (),
            puzzles: (),
            jobs: (),
        };
        let response = endpoints.target_stats(&TargetStatsRequest { target_rating: 1200, time_category: None });
        assert_eq!(response.categories.len(), 6);
        assert!(response.phase_accuracies.opening > 0.0);
        assert!(response.phase_accuracies.middlegame > 0.0);
        assert!(response.phase_accuracies.endgame > 0.0);
    }
}
