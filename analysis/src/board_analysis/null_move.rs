use cozy_chess::{Board, Color, GameStatus, Piece};

use super::helpers::piece_value;

/// Returns a board identical to `board` but with the side to move flipped
/// and the en-passant square cleared — the "null move" used to probe
/// whether the side that just moved left a threat standing.
pub fn flip_side_to_move(board: &Board) -> Option<Board> {
    let fen = board.to_string();
    let mut fields: Vec<&str> = fen.split(' ').collect();
    if fields.len() < 4 {
        return None;
    }
    fields[1] = if fields[1] == "w" { "b" } else { "w" };
    fields[3] = "-";
    fields.join(" ").parse().ok()
}

fn material_balance(board: &Board, side: Color) -> i32 {
    let value = |color: Color| -> i32 {
        [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
            .iter()
            .map(|p| (board.pieces(*p) & board.colors(color)).len() as i32 * piece_value(*p) as i32)
            .sum()
    };
    value(side) - value(!side)
}

/// Bounded forcing-move search (checks, captures, and check-evasions only)
/// used to approximate "does `side` have a winning continuation from this
/// position" without a real engine call. Returns the best material swing in
/// favor of `side` achievable within `max_plies`, with forced mate scored as
/// +/-30000.
fn forcing_search(board: &Board, side: Color, max_plies: u8) -> i32 {
    if max_plies == 0 {
        return material_balance(board, side);
    }

    let mover = board.side_to_move();
    let mover_in_check = !board.checkers().is_empty();
    let maximizing = mover == side;

    let mut best = if maximizing { i32::MIN } else { i32::MAX };
    let mut any_considered = false;

    board.generate_moves(|moves| {
        for mv in moves {
            let is_capture = board.colors(!mover).has(mv.to);
            let mut next = board.clone();
            next.play_unchecked(mv);
            let gives_check = !next.checkers().is_empty();

            // Only branch on forced replies (the mover is in check so every
            // legal move is an evasion) or moves that keep the tactics going
            // (captures, checks). Quiet moves outside of check are pruned.
            if !mover_in_check && !is_capture && !gives_check {
                continue;
            }
            any_considered = true;

            let score = if next.status() == GameStatus::Won {
                if mover == side {
                    30000
                } else {
                    -30000
                }
            } else {
                forcing_search(&next, side, max_plies - 1)
            };

            if maximizing {
                best = best.max(score);
            } else {
                best = best.min(score);
            }
        }
        false
    });

    if !any_considered {
        return material_balance(board, side);
    }
    best
}

/// Approximates null-move probing: does `side` have a forced
/// winning continuation (mate or a clearly won material swing) from
/// `board`, searching only forcing lines (checks/captures/evasions) up to
/// three plies deep?
pub fn side_has_winning_reply(board: &Board, side: Color) -> bool {
    let probe = if board.side_to_move() == side {
        board.clone()
    } else {
        match flip_side_to_move(board) {
            Some(b) => b,
            None => return false,
        }
    };

    let baseline = material_balance(&probe, side);
    let best = forcing_search(&probe, side, 3);
    best >= baseline + 300 || best >= 20000
}
