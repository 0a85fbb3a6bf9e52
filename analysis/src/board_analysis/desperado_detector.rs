use super::detector::{TacticalContext, TacticalDetector};
use super::helpers::piece_value;
use super::tactical_types::{TacticalEvidence, TacticalTag, TacticalTagKind};

/// Detects desperado moves: the mover's piece was already attacked and
/// about to be lost for nothing, so instead of sitting still it trades
/// itself for material before it disappears.
pub struct DesperadoDetector;

impl TacticalDetector for DesperadoDetector {
    fn detect(&self, ctx: &TacticalContext) -> Vec<TacticalTag> {
        let Some(mv) = ctx.mv else {
            return vec![];
        };

        let perspective = ctx.side_to_move_before;
        let enemy = !perspective;

        let Some(moved_piece) = ctx.before.piece_on(mv.from) else {
            return vec![];
        };

        // Piece must have been under attack, with no defender covering it,
        // before the move was played.
        let attackers = ctx.before_attacks.attackers_of(mv.from, enemy);
        if attackers.is_empty() {
            return vec![];
        }
        let defenders = ctx.before_attacks.attackers_of(mv.from, perspective);
        if !defenders.is_empty() {
            return vec![];
        }

        // Must be a capture that recoups at least as much value as the
        // piece itself was worth.
        let Some(captured) = ctx.before.piece_on(mv.to) else {
            return vec![];
        };
        if ctx.before.color_on(mv.to) != Some(enemy) {
            return vec![];
        }

        let mover_value = piece_value(moved_piece);
        let captured_value = piece_value(captured);
        if captured_value < mover_value {
            return vec![];
        }

        vec![TacticalTag {
            kind: TacticalTagKind::Desperado,
            attacker: Some(mv.from.to_string()),
            victims: vec![mv.to.to_string()],
            target_square: Some(mv.to.to_string()),
            confidence: 0.65,
            note: Some(format!(
                "desperado: doomed {} on {} trades itself for {} on {}",
                moved_piece, mv.from, captured, mv.to
            )),
            evidence: TacticalEvidence::default(),
        }]
    }
}
