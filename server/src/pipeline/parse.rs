//! Position parser: walks a game's PGN into dense, 1-based Position
//! rows. A game whose move record fails to parse is logged and left with
//! `positions_parsed = false`; it does not block any other game.

use chess::pgn::parse_pgn;
use chess_analytics_core::{Game, Position};

use crate::persistence::{GameRepository, PersistenceError, PositionRepository};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("PGN parse error: {0}")]
    Pgn(#[from] chess::pgn::PgnError),
}

/// Resolves one game's PGN into its ordinal Position records. Pure: does
/// not touch the database.
pub fn parse_game_positions(game: &Game) -> Result<Vec<Position>, ParseError> {
    let parsed = parse_pgn(&game.pgn)?;
    Ok(parsed
        .plies
        .into_iter()
        .map(|ply| Position {
            game_id: game.id,
            ply: ply.ply_number,
            fen: ply.fen_before,
            move_uci: ply.uci,
            san: ply.san,
            side_to_move: if ply.white_to_move {
                chess::PieceColor::White
            } else {
                chess::PieceColor::Black
            },
            eval: None,
            eval_depth: None,
            pv: None,
            eval_failed: false,
        })
        .collect())
}

/// Parses every unparsed game of `username`, inserting positions and
/// flipping `positions_parsed` on success. Failures are logged and skipped;
/// the stage always processes the whole batch.
pub async fn run_parse_stage(
    games: &impl GameRepository,
    positions: &impl PositionRepository,
    username: &str,
) -> Result<usize, PersistenceError> {
    let unparsed = games.list_unparsed_games(username).await?;
    let mut parsed_count = 0;

    for game in &unparsed {
        match parse_game_positions(game) {
            Ok(rows) => {
                positions.insert_positions(&rows).await?;
                games.mark_positions_parsed(game.id).await?;
                parsed_count += 1;
            }
            Err(e) => {
                tracing::warn!(
                    game_id = game.id,
                    external_id = %game.external_id,
                    error = %e,
                    "failed to parse game, leaving positions_parsed=false"
                );
            }
        }
    }

    Ok(parsed_count)
}
