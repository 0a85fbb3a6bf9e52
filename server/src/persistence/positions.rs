//! SQLite-backed [`PositionRepository`].

use sqlx::SqlitePool;

use chess::PieceColor;
use chess_analytics_core::Position;

use super::traits::PositionRepository;
use super::PersistenceError;

#[derive(Clone)]
pub struct SqlitePositionRepository {
    pool: SqlitePool,
}

impl SqlitePositionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn side_from_str(s: &str) -> PieceColor {
    if s == "white" {
        PieceColor::White
    } else {
        PieceColor::Black
    }
}

fn pv_to_json(pv: &Option<Vec<String>>) -> Option<String> {
    pv.as_ref().map(|v| serde_json::to_string(v).unwrap_or_default())
}

fn pv_from_json(s: Option<String>) -> Result<Option<Vec<String>>, PersistenceError> {
    match s {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

type PositionRow = (
    i64,
    i64,
    String,
    String,
    String,
    String,
    Option<i64>,
    Option<i64>,
    Option<String>,
    i64,
);

fn row_to_position(row: PositionRow) -> Result<Position, PersistenceError> {
    let (game_id, ply, fen, move_uci, san, side_to_move, eval, eval_depth, pv, eval_failed) = row;
    Ok(Position {
        game_id,
        ply: ply as u32,
        fen,
        move_uci,
        san,
        side_to_move: side_from_str(&side_to_move),
        eval: eval.map(|v| v as i32),
        eval_depth: eval_depth.map(|v| v as u32),
        pv: pv_from_json(pv)?,
        eval_failed: eval_failed != 0,
    })
}

const SELECT_COLUMNS: &str =
    "game_id, ply, fen, move_uci, san, side_to_move, eval, eval_depth, pv, eval_failed";

const SELECT_COLUMNS_P: &str = "p.game_id, p.ply, p.fen, p.move_uci, p.san, p.side_to_move, \
     p.eval, p.eval_depth, p.pv, p.eval_failed";

impl PositionRepository for SqlitePositionRepository {
    async fn insert_positions(&self, positions: &[Position]) -> Result<(), PersistenceError> {
        let mut tx = self.pool.begin().await?;
        for pos in positions {
            sqlx::query(
                "INSERT INTO positions \
                 (game_id, ply, fen, move_uci, san, side_to_move, eval, eval_depth, pv, eval_failed) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
                 ON CONFLICT(game_id, ply) DO NOTHING",
            )
            .bind(pos.game_id)
            .bind(pos.ply as i64)
            .bind(&pos.fen)
            .bind(&pos.move_uci)
            .bind(&pos.san)
            .bind(pos.side_to_move.as_str())
            .bind(pos.eval.map(|v| v as i64))
            .bind(pos.eval_depth.map(|v| v as i64))
            .bind(pv_to_json(&pos.pv))
            .bind(pos.eval_failed as i64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_positions(&self, game_id: i64) -> Result<Vec<Position>, PersistenceError> {
        let rows: Vec<PositionRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM positions WHERE game_id = ? ORDER BY ply ASC"
        ))
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_position).collect()
    }

    async fn list_unevaluated(
        &self,
        username: &str,
        limit: u32,
    ) -> Result<Vec<Position>, PersistenceError> {
        let rows: Vec<PositionRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS_P} FROM positions p \
             JOIN games g ON g.id = p.game_id \
             WHERE g.username = ? AND p.eval IS NULL AND p.eval_failed = 0 \
             ORDER BY p.game_id ASC, p.ply ASC \
             LIMIT ?"
        ))
        .bind(username)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_position).collect()
    }

    async fn update_eval(
        &self,
        game_id: i64,
        ply: u32,
        eval_cp: i32,
        depth: u32,
        pv: &[String],
    ) -> Result<(), PersistenceError> {
        let pv_json = serde_json::to_string(pv)?;
        sqlx::query(
            "UPDATE positions SET eval = ?, eval_depth = ?, pv = ?, eval_failed = 0 \
             WHERE game_id = ? AND ply = ? AND (eval_depth IS NULL OR eval_depth < ?)",
        )
        .bind(eval_cp as i64)
        .bind(depth as i64)
        .bind(pv_json)
        .bind(game_id)
        .bind(ply as i64)
        .bind(depth as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_eval_failed(&self, game_id: i64, ply: u32) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE positions SET eval_failed = 1 WHERE game_id = ? AND ply = ?")
            .bind(game_id)
            .bind(ply as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn is_game_fully_evaluated(&self, game_id: i64) -> Result<bool, PersistenceError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM positions \
             WHERE game_id = ? AND eval IS NULL AND eval_failed = 0",
        )
        .bind(game_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0 == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::Database;

    fn sample_position(game_id: i64, ply: u32) -> Position {
        Position {
            game_id,
            ply,
            fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1".to_string(),
            move_uci: "e2e4".to_string(),
            san: "e4".to_string(),
            side_to_move: PieceColor::Black,
            eval: None,
            eval_depth: None,
            pv: None,
            eval_failed: false,
        }
    }

    async fn seed_game(pool: &SqlitePool) -> i64 {
        sqlx::query("INSERT INTO users (username) VALUES ('alice')")
            .execute(pool)
            .await
            .unwrap();
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO games \
             (username, external_id, pgn, end_date, result, white_name, black_name, \
              time_control, rated, time_category) \
             VALUES ('alice', 'g1', '1. e4 *', '2026-01-01T00:00:00Z', 'win', 'alice', 'bob', \
              '600', 1, 'rapid') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        row.0
    }

    #[tokio::test]
    async fn insert_is_idempotent_per_ply() {
        let db = Database::new_in_memory().await.unwrap();
        let game_id = seed_game(db.pool()).await;
        let repo = SqlitePositionRepository::new(db.pool().clone());

        let pos = sample_position(game_id, 1);
        repo.insert_positions(&[pos.clone()]).await.unwrap();
        repo.insert_positions(&[pos]).await.unwrap();

        assert_eq!(repo.list_positions(game_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_eval_rejects_lower_depth() {
        let db = Database::new_in_memory().await.unwrap();
        let game_id = seed_game(db.pool()).await;
        let repo = SqlitePositionRepository::new(db.pool().clone());
        repo.insert_positions(&[sample_position(game_id, 1)]).await.unwrap();

        repo.update_eval(game_id, 1, 50, 16, &["e7e5".to_string()]).await.unwrap();
        repo.update_eval(game_id, 1, -999, 8, &["a7a6".to_string()]).await.unwrap();

        let positions = repo.list_positions(game_id).await.unwrap();
        assert_eq!(positions[0].eval, Some(50));
        assert_eq!(positions[0].eval_depth, Some(16));
    }

    #[tokio::test]
    async fn fully_evaluated_accounts_for_eval_failed() {
        let db = Database::new_in_memory().await.unwrap();
        let game_id = seed_game(db.pool()).await;
        let repo = SqlitePositionRepository::new(db.pool().clone());
        repo.insert_positions(&[sample_position(game_id, 1), sample_position(game_id, 2)])
            .await
            .unwrap();

        assert!(!repo.is_game_fully_evaluated(game_id).await.unwrap());

        repo.update_eval(game_id, 1, 10, 16, &[]).await.unwrap();
        repo.mark_eval_failed(game_id, 2).await.unwrap();

        assert!(repo.is_game_fully_evaluated(game_id).await.unwrap());
    }
}
