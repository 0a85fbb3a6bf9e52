use super::detector::{TacticalContext, TacticalDetector};
use super::tactical_types::{TacticalEvidence, TacticalTag, TacticalTagKind};

/// Detects removal-of-defender: the played move captures a piece that was
/// the sole defender of another enemy piece we already attacked.
pub struct RemovalOfDefenderDetector;

impl TacticalDetector for RemovalOfDefenderDetector {
    fn detect(&self, ctx: &TacticalContext) -> Vec<TacticalTag> {
        let Some(mv) = ctx.mv else {
            return vec![];
        };

        let perspective = ctx.side_to_move_before;
        let enemy = !perspective;

        // The move must be a capture.
        let Some(captured) = ctx.before.piece_on(mv.to) else {
            return vec![];
        };
        if ctx.before.color_on(mv.to) != Some(enemy) {
            return vec![];
        }

        let mut tags = Vec::new();

        // Find other enemy pieces that, before the move, were defended solely
        // by the piece we just captured, and that we already attacked.
        for piece in cozy_chess::Piece::ALL {
            for sq in ctx.before.pieces(piece) & ctx.before.colors(enemy) {
                if sq == mv.to {
                    continue;
                }
                let our_attackers = ctx.before_attacks.attackers_of(sq, perspective);
                if our_attackers.is_empty() {
                    continue;
                }
                let their_defenders = ctx.before_attacks.attackers_of(sq, enemy);
                let sole_defender = their_defenders.len() == 1 && their_defenders[0].from == mv.to;
                if !sole_defender {
                    continue;
                }

                tags.push(TacticalTag {
                    kind: TacticalTagKind::RemovalOfDefender,
                    attacker: Some(mv.to.to_string()),
                    victims: vec![sq.to_string()],
                    target_square: Some(sq.to_string()),
                    confidence: 0.8,
                    note: Some(format!(
                        "removal of defender: capturing {} on {} removes the sole defender of {}",
                        captured, mv.to, sq
                    )),
                    evidence: TacticalEvidence {
                        lines: vec![],
                        threatened_pieces: vec![sq.to_string()],
                        defended_by: vec![mv.to.to_string()],
                    },
                });
            }
        }

        tags
    }
}
