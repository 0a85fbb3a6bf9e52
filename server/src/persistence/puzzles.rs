//! SQLite-backed [`PuzzleRepository`].

use sqlx::SqlitePool;

use analysis::{Category, TacticalTagKind};
use chess::PieceColor;
use chess_analytics_core::{Puzzle, Severity};

use super::traits::{PuzzleFilter, PuzzleRepository};
use super::PersistenceError;

#[derive(Clone)]
pub struct SqlitePuzzleRepository {
    pool: SqlitePool,
}

impl SqlitePuzzleRepository {
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

fn severity_to_str(s: Severity) -> &'static str {
    match s {
        Severity::Mistake => "mistake",
        Severity::Blunder => "blunder",
        Severity::MissedWin => "missed_win",
        Severity::MissedSave => "missed_save",
    }
}

fn severity_from_str(s: &str) -> Severity {
    match s {
        "blunder" => Severity::Blunder,
        "missed_win" => Severity::MissedWin,
        "missed_save" => Severity::MissedSave,
        _ => Severity::Mistake,
    }
}

fn category_to_str(c: Category) -> &'static str {
    match c {
        Category::Opening => "opening",
        Category::Defending => "defending",
        Category::Attacking => "attacking",
        Category::Tactics => "tactics",
        Category::Endgame => "endgame",
        Category::Strategic => "strategic",
    }
}

fn category_from_str(s: &str) -> Category {
    match s {
        "defending" => Category::Defending,
        "attacking" => Category::Attacking,
        "tactics" => Category::Tactics,
        "endgame" => Category::Endgame,
        "strategic" => Category::Strategic,
        _ => Category::Opening,
    }
}

type PuzzleRow = (
    i64,
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    i64,
    i64,
    i64,
    Option<String>,
    Option<String>,
    String,
    String,
    String,
);

fn row_to_puzzle(row: PuzzleRow) -> Result<Puzzle, PersistenceError> {
    let (
        game_id,
        ply,
        fen,
        side_to_move,
        played_move_uci,
        best_move_uci,
        pv_moves,
        eval_before_cp,
        eval_after_cp,
        delta_cp,
        required_moves,
        setup_fen,
        setup_move_uci,
        category,
        severity,
        labels,
    ) = row;
    Ok(Puzzle {
        game_id,
        ply: ply as u32,
        fen,
        side_to_move: side_from_str(&side_to_move),
        played_move_uci,
        best_move_uci,
        pv_moves: serde_json::from_str(&pv_moves)?,
        eval_before_cp: eval_before_cp as i32,
        eval_after_cp: eval_after_cp as i32,
        delta_cp: delta_cp as i32,
        required_moves: required_moves as u32,
        setup_fen,
        setup_move_uci,
        category: category_from_str(&category),
        severity: severity_from_str(&severity),
        labels: serde_json::from_str(&labels)?,
    })
}

fn labels_to_json(labels: &[TacticalTagKind]) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(labels)?)
}

const SELECT_COLUMNS: &str = "game_id, ply, fen, side_to_move, played_move_uci, best_move_uci, \
     pv_moves, eval_before_cp, eval_after_cp, delta_cp, required_moves, setup_fen, \
     setup_move_uci, category, severity, labels";

impl PuzzleRepository for SqlitePuzzleRepository {
    async fn insert_puzzle(&self, puzzle: &Puzzle) -> Result<bool, PersistenceError> {
        let pv_json = serde_json::to_string(&puzzle.pv_moves)?;
        let labels_json = labels_to_json(&puzzle.labels)?;

        let result = sqlx::query(
            "INSERT INTO puzzles \
             (game_id, ply, fen, side_to_move, played_move_uci, best_move_uci, pv_moves, \
              eval_before_cp, eval_after_cp, delta_cp, required_moves, setup_fen, \
              setup_move_uci, category, severity, labels) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(game_id, ply) DO NOTHING",
        )
        .bind(puzzle.game_id)
        .bind(puzzle.ply as i64)
        .bind(&puzzle.fen)
        .bind(puzzle.side_to_move.as_str())
        .bind(&puzzle.played_move_uci)
        .bind(&puzzle.best_move_uci)
        .bind(pv_json)
        .bind(puzzle.eval_before_cp as i64)
        .bind(puzzle.eval_after_cp as i64)
        .bind(puzzle.delta_cp as i64)
        .bind(puzzle.required_moves as i64)
        .bind(&puzzle.setup_fen)
        .bind(&puzzle.setup_move_uci)
        .bind(category_to_str(puzzle.category))
        .bind(severity_to_str(puzzle.severity))
        .bind(labels_json)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn puzzle_exists(&self, game_id: i64, ply: u32) -> Result<bool, PersistenceError> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM puzzles WHERE game_id = ? AND ply = ?")
                .bind(game_id)
                .bind(ply as i64)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0 > 0)
    }

    async fn list_puzzles(
        &self,
        username: &str,
        filter: &PuzzleFilter,
    ) -> Result<(Vec<Puzzle>, u64), PersistenceError> {
        let mut where_clause = " WHERE g.username = ?".to_string();
        if filter.rated.is_some() {
            where_clause.push_str(" AND g.rated = ?");
        }
        if filter.time_category.is_some() {
            where_clause.push_str(" AND g.time_category = ?");
        }
        if filter.category.is_some() {
            where_clause.push_str(" AND p.category = ?");
        }
        if filter.label.is_some() {
            where_clause.push_str(" AND p.labels LIKE ?");
        }

        macro_rules! bind_common {
            ($query:expr) => {{
                let mut q = $query.bind(username);
                if let Some(rated) = filter.rated {
                    q = q.bind(rated as i64);
                }
                if let Some(tc) = filter.time_category {
                    q = q.bind(match tc {
                        chess_analytics_core::TimeCategory::Bullet => "bullet",
                        chess_analytics_core::TimeCategory::Blitz => "blitz",
                        chess_analytics_core::TimeCategory::Rapid => "rapid",
                    });
                }
                if let Some(cat) = filter.category {
                    q = q.bind(category_to_str(cat));
                }
                if let Some(label) = &filter.label {
                    let needle = serde_json::to_string(label).unwrap_or_default();
                    q = q.bind(format!("%{needle}%"));
                }
                q
            }};
        }

        let count_sql = format!("SELECT COUNT(*) FROM puzzles p JOIN games g ON g.id = p.game_id{where_clause}");
        let count_query = bind_common!(sqlx::query_as::<_, (i64,)>(&count_sql));
        let (total,): (i64,) = count_query.fetch_one(&self.pool).await?;

        let select_cols_p = SELECT_COLUMNS
            .split(", ")
            .map(|c| format!("p.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let list_sql = format!(
            "SELECT {select_cols_p} FROM puzzles p JOIN games g ON g.id = p.game_id{where_clause} \
             ORDER BY p.game_id DESC, p.ply ASC LIMIT {} OFFSET {}",
            filter.limit, filter.offset
        );
        let list_query = bind_common!(sqlx::query_as::<_, PuzzleRow>(&list_sql));
        let rows = list_query.fetch_all(&self.pool).await?;

        let puzzles = rows
            .into_iter()
            .map(row_to_puzzle)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((puzzles, total as u64))
    }

    async fn get_puzzle(&self, game_id: i64, ply: u32) -> Result<Option<Puzzle>, PersistenceError> {
        let row: Option<PuzzleRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM puzzles WHERE game_id = ? AND ply = ?"
        ))
        .bind(game_id)
        .bind(ply as i64)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_puzzle).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::Database;

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

    fn sample_puzzle(game_id: i64, ply: u32) -> Puzzle {
        Puzzle {
            game_id,
            ply,
            fen: "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3".to_string(),
            side_to_move: PieceColor::White,
            played_move_uci: "f1c4".to_string(),
            best_move_uci: "f3g5".to_string(),
            pv_moves: vec!["f3g5".to_string(), "d7d5".to_string()],
            eval_before_cp: 20,
            eval_after_cp: -300,
            delta_cp: -320,
            required_moves: 1,
            setup_fen: None,
            setup_move_uci: None,
            category: Category::Tactics,
            severity: Severity::Blunder,
            labels: vec![TacticalTagKind::Fork],
        }
    }

    #[tokio::test]
    async fn insert_is_idempotent_per_ply() {
        let db = Database::new_in_memory().await.unwrap();
        let game_id = seed_game(db.pool()).await;
        let repo = SqlitePuzzleRepository::new(db.pool().clone());

        assert!(repo.insert_puzzle(&sample_puzzle(game_id, 5)).await.unwrap());
        assert!(!repo.insert_puzzle(&sample_puzzle(game_id, 5)).await.unwrap());
        assert!(repo.puzzle_exists(game_id, 5).await.unwrap());
    }

    #[tokio::test]
    async fn list_puzzles_filters_by_category() {
        let db = Database::new_in_memory().await.unwrap();
        let game_id = seed_game(db.pool()).await;
        let repo = SqlitePuzzleRepository::new(db.pool().clone());
        repo.insert_puzzle(&sample_puzzle(game_id, 5)).await.unwrap();

        let filter = PuzzleFilter {
            category: Some(Category::Tactics),
            limit: 10,
            ..Default::default()
        };
        let (puzzles, total) = repo.list_puzzles("alice", &filter).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(puzzles.len(), 1);
        assert_eq!(puzzles[0].category, Category::Tactics);

        let filter = PuzzleFilter {
            category: Some(Category::Endgame),
            limit: 10,
            ..Default::default()
        };
        let (puzzles, total) = repo.list_puzzles("alice", &filter).await.unwrap();
        assert_eq!(total, 0);
        assert!(puzzles.is_empty());
    }

    #[tokio::test]
    async fn get_puzzle_round_trips_labels_and_pv() {
        let db = Database::new_in_memory().await.unwrap();
        let game_id = seed_game(db.pool()).await;
        let repo = SqlitePuzzleRepository::new(db.pool().clone());
        repo.insert_puzzle(&sample_puzzle(game_id, 5)).await.unwrap();

        let puzzle = repo.get_puzzle(game_id, 5).await.unwrap().unwrap();
        assert_eq!(puzzle.pv_moves, vec!["f3g5".to_string(), "d7d5".to_string()]);
        assert_eq!(puzzle.labels, vec![TacticalTagKind::Fork]);
    }
}
