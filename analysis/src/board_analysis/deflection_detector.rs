use super::detector::{TacticalContext, TacticalDetector};
use super::tactical_types::{TacticalEvidence, TacticalTag, TacticalTagKind};

/// Detects deflection: the played move is a check or capture that forces
/// the enemy to respond immediately, abandoning whatever it was doing —
/// only meaningful when the PV runs deep enough to show the follow-up
/// (at least a reply and our exploiting move).
pub struct DeflectionDetector;

impl TacticalDetector for DeflectionDetector {
    fn detect(&self, ctx: &TacticalContext) -> Vec<TacticalTag> {
        let Some(mv) = ctx.mv else {
            return vec![];
        };
        let Some(best_line) = ctx.best_line else {
            return vec![];
        };
        if best_line.len() < 3 {
            return vec![];
        }

        let gives_check = !ctx.after.checkers().is_empty();
        let is_capture = ctx.before.piece_on(mv.to).is_some();
        if !gives_check && !is_capture {
            return vec![];
        }

        let moved_piece = ctx.before.piece_on(mv.from).unwrap_or(cozy_chess::Piece::Pawn);

        vec![TacticalTag {
            kind: TacticalTagKind::Deflection,
            attacker: Some(mv.from.to_string()),
            victims: vec![mv.to.to_string()],
            target_square: Some(mv.to.to_string()),
            confidence: if gives_check { 0.7 } else { 0.6 },
            note: Some(format!(
                "deflection: {} to {} forces an immediate reply, a {}-ply line follows",
                moved_piece,
                mv.to,
                best_line.len()
            )),
            evidence: TacticalEvidence::default(),
        }]
    }
}
