use super::detector::{TacticalContext, TacticalDetector};
use super::tactical_types::{TacticalEvidence, TacticalTag, TacticalTagKind};

/// Detects overloaded pieces: an enemy piece that is the sole defender of
/// two or more squares we attack, so it cannot cover all of its duties.
pub struct OverloadDetector;

impl TacticalDetector for OverloadDetector {
    fn detect(&self, ctx: &TacticalContext) -> Vec<TacticalTag> {
        let perspective = ctx.side_to_move_before;
        let enemy = !perspective;

        // For every enemy piece, count how many of our attacked targets it
        // is the sole defender of.
        let mut duties: std::collections::HashMap<cozy_chess::Square, Vec<cozy_chess::Square>> =
            std::collections::HashMap::new();

        for piece in cozy_chess::Piece::ALL {
            for target_sq in ctx.after.pieces(piece) & ctx.after.colors(enemy) {
                if ctx.after_attacks.attackers_of(target_sq, perspective).is_empty() {
                    continue;
                }
                let defenders = ctx.after_attacks.attackers_of(target_sq, enemy);
                if defenders.len() == 1 {
                    duties.entry(defenders[0].from).or_default().push(target_sq);
                }
            }
        }

        duties
            .into_iter()
            .filter(|(_, targets)| targets.len() >= 2)
            .map(|(defender, mut targets)| {
                targets.sort();
                let victims: Vec<String> = targets.iter().map(|s| s.to_string()).collect();
                TacticalTag {
                    kind: TacticalTagKind::Overload,
                    attacker: Some(defender.to_string()),
                    victims: victims.clone(),
                    target_square: None,
                    confidence: 0.75,
                    note: Some(format!(
                        "overload: piece on {} is the sole defender of {} attacked squares",
                        defender,
                        targets.len()
                    )),
                    evidence: TacticalEvidence {
                        lines: vec![],
                        threatened_pieces: victims,
                        defended_by: vec![defender.to_string()],
                    },
                }
            })
            .collect()
    }
}
