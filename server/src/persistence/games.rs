//! SQLite-backed [`GameRepository`].

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use chess_analytics_core::{Game, GameResult, TimeCategory};

use super::traits::{GameFilter, GameRepository};
use super::PersistenceError;

#[derive(Clone)]
pub struct SqliteGameRepository {
    pool: SqlitePool,
}

impl SqliteGameRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn result_to_str(r: GameResult) -> &'static str {
    match r {
        GameResult::Win => "win",
        GameResult::Loss => "loss",
        GameResult::Draw => "draw",
    }
}

fn result_from_str(s: &str) -> GameResult {
    match s {
        "win" => GameResult::Win,
        "loss" => GameResult::Loss,
        _ => GameResult::Draw,
    }
}

fn time_category_to_str(t: TimeCategory) -> &'static str {
    match t {
        TimeCategory::Bullet => "bullet",
        TimeCategory::Blitz => "blitz",
        TimeCategory::Rapid => "rapid",
    }
}

fn time_category_from_str(s: &str) -> TimeCategory {
    match s {
        "bullet" => TimeCategory::Bullet,
        "rapid" => TimeCategory::Rapid,
        _ => TimeCategory::Blitz,
    }
}

type GameRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    Option<i64>,
    Option<i64>,
    String,
    i64,
    String,
    i64,
    Option<f64>,
    Option<f64>,
);

fn row_to_game(row: GameRow) -> Game {
    let (
        id,
        username,
        external_id,
        pgn,
        end_date,
        result,
        white_name,
        black_name,
        white_elo,
        black_elo,
        time_control,
        rated,
        time_category,
        positions_parsed,
        accuracy_white,
        accuracy_black,
    ) = row;
    Game {
        id,
        username,
        external_id,
        pgn,
        end_date: DateTime::parse_from_rfc3339(&end_date)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        result: result_from_str(&result),
        time_control,
        rated: rated != 0,
        time_category: time_category_from_str(&time_category),
        positions_parsed: positions_parsed != 0,
        accuracy_white,
        accuracy_black,
        white_name,
        black_name,
        white_elo: white_elo.map(|v| v as i32),
        black_elo: black_elo.map(|v| v as i32),
    }
}

const SELECT_COLUMNS: &str = "id, username, external_id, pgn, end_date, result, white_name, \
     black_name, white_elo, black_elo, time_control, rated, time_category, positions_parsed, \
     accuracy_white, accuracy_black";

impl GameRepository for SqliteGameRepository {
    async fn upsert_game(&self, game: &Game) -> Result<i64, PersistenceError> {
        sqlx::query("INSERT OR IGNORE INTO users (username) VALUES (?)")
            .bind(&game.username)
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "INSERT INTO games \
             (username, external_id, pgn, end_date, result, white_name, black_name, white_elo, \
              black_elo, time_control, rated, time_category, positions_parsed, accuracy_white, \
              accuracy_black) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(username, external_id) DO UPDATE SET pgn = excluded.pgn",
        )
        .bind(&game.username)
        .bind(&game.external_id)
        .bind(&game.pgn)
        .bind(game.end_date.to_rfc3339())
        .bind(result_to_str(game.result))
        .bind(&game.white_name)
        .bind(&game.black_name)
        .bind(game.white_elo.map(|v| v as i64))
        .bind(game.black_elo.map(|v| v as i64))
        .bind(&game.time_control)
        .bind(game.rated as i64)
        .bind(time_category_to_str(game.time_category))
        .bind(game.positions_parsed as i64)
        .bind(game.accuracy_white)
        .bind(game.accuracy_black)
        .execute(&self.pool)
        .await?;

        let row: (i64,) = sqlx::query_as(
            "SELECT id FROM games WHERE username = ? AND external_id = ?",
        )
        .bind(&game.username)
        .bind(&game.external_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn get_game(&self, id: i64) -> Result<Option<Game>, PersistenceError> {
        let row: Option<GameRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM games WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_game))
    }

    async fn list_games(
        &self,
        username: &str,
        filter: &GameFilter,
    ) -> Result<Vec<Game>, PersistenceError> {
        let mut sql = format!(
            "SELECT {SELECT_COLUMNS} FROM games WHERE username = ?"
        );
        if filter.rated.is_some() {
            sql.push_str(" AND rated = ?");
        }
        if filter.time_category.is_some() {
            sql.push_str(" AND time_category = ?");
        }
        sql.push_str(" ORDER BY end_date DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut query = sqlx::query_as::<_, GameRow>(&sql).bind(username);
        if let Some(rated) = filter.rated {
            query = query.bind(rated as i64);
        }
        if let Some(tc) = filter.time_category {
            query = query.bind(time_category_to_str(tc));
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(row_to_game).collect())
    }

    async fn list_unparsed_games(&self, username: &str) -> Result<Vec<Game>, PersistenceError> {
        let rows: Vec<GameRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM games WHERE username = ? AND positions_parsed = 0 ORDER BY id ASC"
        ))
        .bind(username)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_game).collect())
    }

    async fn mark_positions_parsed(&self, game_id: i64) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE games SET positions_parsed = 1 WHERE id = ?")
            .bind(game_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_accuracy(
        &self,
        game_id: i64,
        accuracy_white: Option<f64>,
        accuracy_black: Option<f64>,
    ) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE games SET accuracy_white = ?, accuracy_black = ? WHERE id = ?")
            .bind(accuracy_white)
            .bind(accuracy_black)
            .bind(game_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::Database;

    fn sample_game(external_id: &str) -> Game {
        Game {
            id: 0,
            username: "alice".to_string(),
            external_id: external_id.to_string(),
            pgn: "1. e4 e5 *".to_string(),
            end_date: Utc::now(),
            result: GameResult::Win,
            time_control: "600".to_string(),
            rated: true,
            time_category: TimeCategory::Rapid,
            positions_parsed: false,
            accuracy_white: None,
            accuracy_black: None,
            white_name: "alice".to_string(),
            black_name: "bob".to_string(),
            white_elo: Some(1500),
            black_elo: Some(1490),
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_on_external_id() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqliteGameRepository::new(db.pool().clone());

        let id1 = repo.upsert_game(&sample_game("game-1")).await.unwrap();
        let id2 = repo.upsert_game(&sample_game("game-1")).await.unwrap();
        assert_eq!(id1, id2);

        let games = repo.list_games("alice", &GameFilter::default()).await.unwrap();
        assert_eq!(games.len(), 1);
    }

    #[tokio::test]
    async fn unparsed_games_listed_until_flagged() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqliteGameRepository::new(db.pool().clone());

        let id = repo.upsert_game(&sample_game("game-1")).await.unwrap();
        assert_eq!(repo.list_unparsed_games("alice").await.unwrap().len(), 1);

        repo.mark_positions_parsed(id).await.unwrap();
        assert_eq!(repo.list_unparsed_games("alice").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn accuracy_round_trips() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqliteGameRepository::new(db.pool().clone());

        let id = repo.upsert_game(&sample_game("game-1")).await.unwrap();
        repo.update_accuracy(id, Some(91.2), Some(84.5)).await.unwrap();

        let game = repo.get_game(id).await.unwrap().unwrap();
        assert_eq!(game.accuracy_white, Some(91.2));
        assert_eq!(game.accuracy_black, Some(84.5));
    }
}
