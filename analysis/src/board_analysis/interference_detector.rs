use super::detector::{TacticalContext, TacticalDetector};
use super::tactical_types::{TacticalEvidence, TacticalTag, TacticalTagKind};

/// Detects interference: the played move lands a piece on a square that
/// cuts the line between two enemy pieces that were mutually defending or
/// covering each other, leaving at least one of them now undefended.
pub struct InterferenceDetector;

impl TacticalDetector for InterferenceDetector {
    fn detect(&self, ctx: &TacticalContext) -> Vec<TacticalTag> {
        let Some(mv) = ctx.mv else {
            return vec![];
        };

        let perspective = ctx.side_to_move_before;
        let enemy = !perspective;

        // Was the destination square, before the move, part of a line
        // between two enemy pieces (i.e. an enemy piece defended another
        // enemy piece through that square)?
        let mut tags = Vec::new();

        for piece in cozy_chess::Piece::ALL {
            for defender_sq in ctx.before.pieces(piece) & ctx.before.colors(enemy) {
                let before_defends =
                    super::helpers::piece_attacks(ctx.before, defender_sq, piece, enemy)
                        & ctx.before.colors(enemy);

                if !before_defends.has(mv.to) {
                    continue;
                }

                // After our move sits on that square, does the defender
                // still defend the piece it used to? If the piece it
                // defended is now undefended and we attack it, it's
                // interference.
                for defended_sq in before_defends {
                    if defended_sq == mv.to {
                        continue;
                    }
                    let still_defended = (super::helpers::piece_attacks(
                        ctx.after,
                        defender_sq,
                        piece,
                        enemy,
                    ) & ctx.after.colors(enemy))
                    .has(defended_sq);

                    if still_defended {
                        continue;
                    }
                    if ctx.after_attacks.attackers_of(defended_sq, perspective).is_empty() {
                        continue;
                    }

                    tags.push(TacticalTag {
                        kind: TacticalTagKind::Interference,
                        attacker: Some(mv.to.to_string()),
                        victims: vec![defended_sq.to_string()],
                        target_square: Some(defended_sq.to_string()),
                        confidence: 0.65,
                        note: Some(format!(
                            "interference: {} on {} blocks {} on {} from covering {}",
                            ctx.after.piece_on(mv.to).map(|p| p.to_string()).unwrap_or_default(),
                            mv.to,
                            piece,
                            defender_sq,
                            defended_sq
                        )),
                        evidence: TacticalEvidence::default(),
                    });
                }
            }
        }

        tags
    }
}

#[cfg(test)]
mod tests {
    use cozy_chess::{Board, Color, Move, Square};

    use super::*;
    use crate::board_analysis::attack_map::AttackMap;

    #[test]
    fn detects_interference_on_defended_rook() {
        // Black rook on a7 defends black rook on a1 down the open a-file.
        // White bishop jumps onto a4, cutting that defense, while white
        // rook on h1 already bears on a1 along the first rank.
        let before: Board = "4k3/r7/8/8/8/8/8/r2BK2R w K - 0 1".parse().unwrap();
        let after: Board = "4k3/r7/8/8/B7/8/8/r3K2R b K - 1 1".parse().unwrap();
        let before_attacks = AttackMap::compute(&before);
        let after_attacks = AttackMap::compute(&after);

        let mv = Move {
            from: Square::D1,
            to: Square::A4,
            promotion: None,
        };

        let ctx = TacticalContext {
            before: &before,
            after: &after,
            mv: Some(mv),
            side_to_move_before: Color::White,
            before_attacks: &before_attacks,
            after_attacks: &after_attacks,
            eval_before: None,
            eval_after: None,
            best_line: None,
        };

        let tags = InterferenceDetector.detect(&ctx);
        assert!(!tags.is_empty(), "expected an interference tag");
        assert_eq!(tags[0].kind, TacticalTagKind::Interference);
        assert_eq!(tags[0].victims, vec!["a1"]);
    }

    #[test]
    fn no_interference_starting_position() {
        let board = Board::default();
        let attacks = AttackMap::compute(&board);
        let ctx = TacticalContext {
            before: &board,
            after: &board,
            mv: None,
            side_to_move_before: Color::White,
            before_attacks: &attacks,
            after_attacks: &attacks,
            eval_before: None,
            eval_after: None,
            best_line: None,
        };

        assert!(InterferenceDetector.detect(&ctx).is_empty());
    }
}
