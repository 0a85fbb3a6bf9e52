use cozy_chess::Piece;

use super::attack_map::PinInfo;
use super::detector::{TacticalContext, TacticalDetector};
use super::tactical_types::{TacticalEvidence, TacticalLine, TacticalTag, TacticalTagKind};

/// Detects pins: a sliding piece restricting an enemy piece's movement
/// because moving it would expose a higher-value piece behind it.
pub struct PinDetector;

impl TacticalDetector for PinDetector {
    fn detect(&self, ctx: &TacticalContext) -> Vec<TacticalTag> {
        let perspective = ctx.side_to_move_before;

        ctx.after_attacks
            .pins()
            .iter()
            .filter(|pin| {
                // Keep pins where the pinner belongs to the side that just moved.
                ctx.after.colors(perspective).has(pin.pinner.from)
            })
            .map(|pin| pin_to_tag(ctx, pin))
            .collect()
    }
}

fn pin_to_tag(ctx: &TacticalContext, pin: &PinInfo) -> TacticalTag {
    let pinned_to_piece = ctx.after.piece_on(pin.pinned_to);
    let is_absolute = pinned_to_piece == Some(Piece::King);

    // Build the through-squares on the ray between pinner and pinned_to,
    // excluding endpoints.
    let through: Vec<String> = {
        let mut squares = Vec::new();
        for sq in pin.ray {
            if sq != pin.pinner.from && sq != pin.pinned_to && sq != pin.pinned {
                squares.push(sq.to_string());
            }
        }
        squares
    };

    TacticalTag {
        kind: TacticalTagKind::Pin,
        attacker: Some(pin.pinner.from.to_string()),
        victims: vec![pin.pinned.to_string()],
        target_square: Some(pin.pinned_to.to_string()),
        confidence: if is_absolute { 1.0 } else { 0.8 },
        note: Some(if is_absolute {
            format!(
                "absolute pin: {} pins {} to king",
                pin.pinner.piece, pin.pinned
            )
        } else {
            format!(
                "relative pin: {} pins {} to {}",
                pin.pinner.piece, pin.pinned, pin.pinned_to
            )
        }),
        evidence: TacticalEvidence {
            lines: vec![TacticalLine {
                from: pin.pinner.from.to_string(),
                through,
                to: pin.pinned_to.to_string(),
            }],
            threatened_pieces: vec![pin.pinned.to_string()],
            defended_by: vec![],
        },
    }
}
