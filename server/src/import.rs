//! Import adapter interface: the third-party games-source integration
//! (fetching raw PGN by username from a chess site) is an external
//! collaborator, so this module only defines the interface the
//! orchestrator drives and a fixture implementation for tests — never a
//! real HTTP client against a games site.

use chrono::{DateTime, Utc};

use chess_analytics_core::{Game, GameResult, TimeCategory};

/// One raw game as handed back by a games source, before parsing.
#[derive(Debug, Clone)]
pub struct RawGameRecord {
    pub external_id: String,
    pub pgn: String,
    pub end_date: DateTime<Utc>,
    pub rated: bool,
    pub time_control: String,
    pub white_name: String,
    pub black_name: String,
    pub white_elo: Option<i32>,
    pub black_elo: Option<i32>,
    pub result: String,
}

#[derive(Debug, Clone, Default)]
pub struct ImportFilter {
    pub rated: Option<bool>,
    pub time_category: Option<TimeCategory>,
    pub max_games: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("games source unavailable: {0}")]
    Unavailable(String),
    #[error("unknown username: {0}")]
    UnknownUsername(String),
}

/// The external games-source adapter, kept abstract so the pipeline never
/// depends on which site (or fixture) is behind it.
pub trait ImportSource: Send + Sync {
    fn fetch_games(
        &self,
        username: &str,
        filter: &ImportFilter,
    ) -> impl std::future::Future<Output = Result<Vec<RawGameRecord>, ImportError>> + Send;
}

/// An in-memory games source seeded with fixture PGNs, for tests and local
/// development without a network dependency.
#[derive(Debug, Clone, Default)]
pub struct FixtureImportSource {
    games_by_user: std::collections::HashMap<String, Vec<RawGameRecord>>,
}

impl FixtureImportSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_games(mut self, username: &str, games: Vec<RawGameRecord>) -> Self {
        self.games_by_user.insert(username.to_lowercase(), games);
        self
    }
}

impl ImportSource for FixtureImportSource {
    async fn fetch_games(
        &self,
        username: &str,
        filter: &ImportFilter,
    ) -> Result<Vec<RawGameRecord>, ImportError> {
        let games = self
            .games_by_user
            .get(&username.to_lowercase())
            .cloned()
            .unwrap_or_default();

        let mut filtered: Vec<RawGameRecord> = games
            .into_iter()
            .filter(|g| filter.rated.map_or(true, |rated| rated == g.rated))
            .filter(|g| {
                filter
                    .time_category
                    .map_or(true, |tc| TimeCategory::from_time_control(&g.time_control) == Some(tc))
            })
            .collect();

        if let Some(max) = filter.max_games {
            filtered.truncate(max as usize);
        }
        Ok(filtered)
    }
}

/// An [`ImportSource`] that never fetches anything, for pipeline runs that
/// should only re-evaluate/re-score games already on disk (the
/// `/puzzles/generate` handler, which is not itself an import endpoint
/// and must not re-fetch or re-upsert games a caller already imported
/// via `/import/{source}`).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullImportSource;

impl ImportSource for NullImportSource {
    async fn fetch_games(
        &self,
        _username: &str,
        _filter: &ImportFilter,
    ) -> Result<Vec<RawGameRecord>, ImportError> {
        Ok(Vec::new())
    }
}

/// Converts one fetched record into an unparsed [`Game`] row, resolving
/// `result` to the owning user's perspective and `timeCategory` from the
/// raw `timeControl` string.
pub fn record_to_game(record: &RawGameRecord, username: &str) -> Game {
    let user_is_white = username.eq_ignore_ascii_case(&record.white_name);
    let result = match record.result.as_str() {
        "1-0" if user_is_white => GameResult::Win,
        "1-0" => GameResult::Loss,
        "0-1" if user_is_white => GameResult::Loss,
        "0-1" => GameResult::Win,
        _ => GameResult::Draw,
    };

    Game {
        id: 0,
        username: username.to_string(),
        external_id: record.external_id.clone(),
        pgn: record.pgn.clone(),
        end_date: record.end_date,
        result,
        time_control: record.time_control.clone(),
        rated: record.rated,
        time_category: TimeCategory::from_time_control(&record.time_control)
            .unwrap_or(chess_analytics_core::TimeCategory::Rapid),
        positions_parsed: false,
        accuracy_white: None,
        accuracy_black: None,
        white_name: record.white_name.clone(),
        black_name: record.black_name.clone(),
        white_elo: record.white_elo,
        black_elo: record.black_elo,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(id: &str, rated: bool, time_control: &str) -> RawGameRecord {
        RawGameRecord {
            external_id: id.to_string(),
            pgn: "[Date \"2026.01.01\"]\n\n1. e4 e5 *".to_string(),
            end_date: Utc::now(),
            rated,
            time_control: time_control.to_string(),
            white_name: "alice".to_string(),
            black_name: "bob".to_string(),
            white_elo: Some(1500),
            black_elo: Some(1490),
            result: "*".to_string(),
        }
    }

    #[tokio::test]
    async fn fetch_filters_by_rated_and_time_category() {
        let source = FixtureImportSource::new().with_games(
            "alice",
            vec![
                sample_record("g1", true, "600"),
                sample_record("g2", false, "60"),
            ],
        );

        let filter = ImportFilter {
            rated: Some(true),
            ..Default::default()
        };
        let games = source.fetch_games("alice", &filter).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].external_id, "g1");

        let filter = ImportFilter {
            time_category: Some(TimeCategory::Bullet),
            ..Default::default()
        };
        let games = source.fetch_games("alice", &filter).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].external_id, "g2");
    }

    #[test]
    fn record_to_game_resolves_result_to_user_perspective() {
        let mut record = sample_record("g1", true, "600");
        record.result = "1-0".to_string();
        assert_eq!(record_to_game(&record, "alice").result, GameResult::Win);
        assert_eq!(record_to_game(&record, "bob").result, GameResult::Loss);
        assert_eq!(record_to_game(&record, "ALICE").result, GameResult::Win);
    }

    #[tokio::test]
    async fn fetch_respects_max_games_and_unknown_user() {
        let source = FixtureImportSource::new().with_games(
            "alice",
            vec![sample_record("g1", true, "600"), sample_record("g2", true, "600")],
        );

        let filter = ImportFilter {
            max_games: Some(1),
            ..Default::default()
        };
        assert_eq!(source.fetch_games("alice", &filter).await.unwrap().len(), 1);
        assert!(source
            .fetch_games("nobody", &ImportFilter::default())
            .await
            .unwrap()
            .is_empty());
    }
}
