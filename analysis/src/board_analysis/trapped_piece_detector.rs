use cozy_chess::Piece;

use super::detector::{TacticalContext, TacticalDetector};
use super::tactical_types::{TacticalEvidence, TacticalTag, TacticalTagKind};

/// Detects trapped pieces: an enemy piece (other than pawn or king) that, in
/// the after position, is attacked and has no square to move to that isn't
/// itself attacked by us — it is lost next move.
pub struct TrappedPieceDetector;

impl TacticalDetector for TrappedPieceDetector {
    fn detect(&self, ctx: &TacticalContext) -> Vec<TacticalTag> {
        let perspective = ctx.side_to_move_before;
        let enemy = !perspective;

        let mut tags = Vec::new();

        for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
            for sq in ctx.after.pieces(piece) & ctx.after.colors(enemy) {
                if ctx.after_attacks.attackers_of(sq, perspective).is_empty() {
                    continue;
                }

                let candidate_squares = super::helpers::piece_attacks(ctx.after, sq, piece, enemy)
                    & !ctx.after.colors(enemy);

                let has_safe_square = candidate_squares.into_iter().any(|dest| {
                    // Moving there must not land on a square still attacked
                    // at least as many times as it is defended there, and
                    // must not itself be an even trade that rescues it —
                    // approximate with: destination isn't attacked by us.
                    ctx.after_attacks.attackers_of(dest, perspective).is_empty()
                });

                if has_safe_square {
                    continue;
                }

                tags.push(TacticalTag {
                    kind: TacticalTagKind::TrappedPiece,
                    attacker: None,
                    victims: vec![sq.to_string()],
                    target_square: Some(sq.to_string()),
                    confidence: 0.7,
                    note: Some(format!(
                        "trapped piece: {} on {} has no safe square to flee to",
                        piece, sq
                    )),
                    evidence: TacticalEvidence::default(),
                });
            }
        }

        tags
    }
}
