//! The category cascade: given a puzzle's position, best move, and
//! principal variation, assigns exactly one of six categories by walking a
//! fixed priority order, stopping at the first match.

use cozy_chess::{Board, Color};
use serde::{Deserialize, Serialize};

use crate::board_analysis::null_move::side_has_winning_reply;
use crate::board_analysis::{detect_tactics, major_minor_piece_count, TacticalContext, TacticalTag, TacticalTagKind};
use chess::{convert_uci_castling_to_cozy, parse_uci_move};

/// One of the six canonical puzzle categories. No legacy aliases are ever
/// produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Opening,
    Defending,
    Attacking,
    Tactics,
    Endgame,
    Strategic,
}

/// Input to the classifier — exactly the fields a `/classify-test`
/// endpoint would accept: a puzzle's position, best move, PV, evals (from the
/// mover's perspective), and whose turn it is.
pub struct ClassifyInput<'a> {
    pub fen: &'a str,
    pub best_move_uci: &'a str,
    pub pv_moves: &'a [String],
    pub eval_before_cp: i32,
    pub eval_after_cp: i32,
    pub side_to_move: Color,
}

/// Errors that can arise parsing a classifier input; these are data errors
/// (unparseable FEN/UCI), not programmer errors.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
    #[error("invalid UCI move: {0}")]
    InvalidUci(String),
}

/// Returns the 1-based ply count (half-move index) implied by a FEN's side
/// to move and fullmove number, derived from the FEN's fullmove number and
/// side-to-move fields.
fn ply_from_fen(fen: &str) -> Option<u32> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    let side = *fields.get(1)?;
    let fullmove: u32 = fields.get(5)?.parse().ok()?;
    Some(match side {
        "w" => 2 * fullmove.saturating_sub(1) + 1,
        _ => 2 * fullmove.saturating_sub(1) + 2,
    })
}

const TACTICAL_MATE_MOTIFS: [TacticalTagKind; 4] = [
    TacticalTagKind::Checkmate,
    TacticalTagKind::SmotheredMate,
    TacticalTagKind::MateThreat,
    TacticalTagKind::BackRank,
];

const GENERAL_TACTICAL_MOTIFS: [TacticalTagKind; 15] = [
    TacticalTagKind::Fork,
    TacticalTagKind::Pin,
    TacticalTagKind::Skewer,
    TacticalTagKind::DoubleAttack,
    TacticalTagKind::DiscoveredAttack,
    TacticalTagKind::RemovalOfDefender,
    TacticalTagKind::Deflection,
    TacticalTagKind::Intermezzo,
    TacticalTagKind::Sacrifice,
    TacticalTagKind::Clearance,
    TacticalTagKind::TrappedPiece,
    TacticalTagKind::XRayBattery,
    TacticalTagKind::Interference,
    TacticalTagKind::Desperado,
    TacticalTagKind::Attraction,
];

/// Runs the category priority cascade and returns the category plus
/// the motif label set the position carries. `HangingPiece` is an internal
/// signal other detectors consume and is never surfaced here.
pub fn classify(input: &ClassifyInput) -> Result<(Category, Vec<TacticalTag>), ClassifyError> {
    let before: Board = input
        .fen
        .parse()
        .map_err(|_| ClassifyError::InvalidFen(input.fen.to_string()))?;

    let mv = parse_uci_move(input.best_move_uci)
        .map_err(|_| ClassifyError::InvalidUci(input.best_move_uci.to_string()))?;
    let mut legal_moves = Vec::new();
    before.generate_moves(|mvs| {
        legal_moves.extend(mvs);
        false
    });
    let mv = convert_uci_castling_to_cozy(mv, &legal_moves);

    let mut after = before.clone();
    after.play_unchecked(mv);

    let before_attacks = crate::board_analysis::AttackMap::compute(&before);
    let after_attacks = crate::board_analysis::AttackMap::compute(&after);

    let ctx = TacticalContext {
        before: &before,
        after: &after,
        mv: Some(mv),
        side_to_move_before: input.side_to_move,
        before_attacks: &before_attacks,
        after_attacks: &after_attacks,
        eval_before: Some(cp_to_white_perspective(input.eval_before_cp, input.side_to_move)),
        eval_after: Some(cp_to_white_perspective(input.eval_after_cp, input.side_to_move)),
        best_line: Some(input.pv_moves),
    };

    let tags = detect_tactics(&ctx, None);
    let kinds: Vec<TacticalTagKind> = tags.iter().map(|t| t.kind.clone()).collect();

    // 1. Mate-adjacent motifs always win outright.
    if kinds.iter().any(|k| TACTICAL_MATE_MOTIFS.contains(k)) {
        return Ok((Category::Tactics, tags));
    }

    // 2. Any other tactical motif also wins outright: tactical motifs
    // always win over phase-based categories when both apply, so this
    // check must come before the opening and endgame windows below.
    if kinds.iter().any(|k| GENERAL_TACTICAL_MOTIFS.contains(k)) {
        return Ok((Category::Tactics, tags));
    }

    // 3. Opening window.
    if let Some(ply) = ply_from_fen(input.fen) {
        if ply <= 24 {
            return Ok((Category::Opening, tags));
        }
    }

    // 4. Endgame material threshold.
    if major_minor_piece_count(&before) < 7 {
        return Ok((Category::Endgame, tags));
    }

    let mover = input.side_to_move;
    let opponent = !mover;

    // 5. Defending: the opponent had a forcing reply if the mover had
    // passed, and the mover's actual move addresses it.
    if side_has_winning_reply(&before, opponent) {
        return Ok((Category::Defending, tags));
    }

    // 6. Attacking: the move presses a threat the mover can follow up on,
    // and the mover was already doing reasonably well (evaluated as the
    // better of the before/after eval, since engines often show a
    // momentary dip right after a forcing sacrifice before the
    // follow-through is visible).
    let eval_gate = input.eval_before_cp.max(input.eval_after_cp) >= 50;
    if eval_gate && side_has_winning_reply(&after, mover) {
        return Ok((Category::Attacking, tags));
    }

    // 7. Default.
    Ok((Category::Strategic, tags))
}

fn cp_to_white_perspective(cp: i32, mover: Color) -> i32 {
    if mover == Color::White {
        cp
    } else {
        -cp
    }
}
