use super::detector::{TacticalContext, TacticalDetector};
use super::tactical_types::{TacticalEvidence, TacticalTag, TacticalTagKind};

/// Detects clearance: the moved piece vacates a square/line that another
/// friendly piece now exploits, gated on the PV running deep enough to
/// show the follow-up exploiting move.
pub struct ClearanceDetector;

impl TacticalDetector for ClearanceDetector {
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

        let perspective = ctx.side_to_move_before;
        let enemy = !perspective;

        // Did any friendly slider gain a new attack on an enemy piece by
        // virtue of `mv.from` now being empty?
        let mut tags = Vec::new();
        for piece in [cozy_chess::Piece::Bishop, cozy_chess::Piece::Rook, cozy_chess::Piece::Queen] {
            for sq in ctx.after.pieces(piece) & ctx.after.colors(perspective) {
                if sq == mv.to {
                    continue;
                }
                let attacks_now = super::helpers::piece_attacks(ctx.after, sq, piece, perspective)
                    & ctx.after.colors(enemy);
                let attacked_through_vacated_square = attacks_now.into_iter().any(|target| {
                    ray_passes_through(sq, target, mv.from)
                });

                if attacked_through_vacated_square {
                    tags.push(TacticalTag {
                        kind: TacticalTagKind::Clearance,
                        attacker: Some(sq.to_string()),
                        victims: vec![mv.from.to_string()],
                        target_square: Some(mv.from.to_string()),
                        confidence: 0.6,
                        note: Some(format!(
                            "clearance: vacating {} opens a line for the piece on {}",
                            mv.from, sq
                        )),
                        evidence: TacticalEvidence::default(),
                    });
                }
            }
        }

        tags
    }
}

fn ray_passes_through(from: cozy_chess::Square, to: cozy_chess::Square, through: cozy_chess::Square) -> bool {
    let fr = from.rank() as i8;
    let ff = from.file() as i8;
    let tr = to.rank() as i8;
    let tf = to.file() as i8;
    let hr = through.rank() as i8;
    let hf = through.file() as i8;

    let dr = (tr - fr).signum();
    let df = (tf - ff).signum();
    if dr == 0 && df == 0 {
        return false;
    }

    let mut r = fr + dr;
    let mut f = ff + df;
    while r != tr || f != tf {
        if r == hr && f == hf {
            return true;
        }
        r += dr;
        f += df;
        if !(0..8).contains(&r) || !(0..8).contains(&f) {
            return false;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use cozy_chess::{Board, Color, Move, Square};

    use super::*;
    use crate::board_analysis::attack_map::AttackMap;

    #[test]
    fn detects_clearance_opening_rook_file() {
        // Before: white rook a1, white knight a4 blocking the a-file,
        // black rook a8. Knight jumps away (a4 -> b6), clearing the file
        // so the rook now attacks a8.
        let before: Board = "r3k3/8/8/8/N7/8/8/R3K3 w Q - 0 1".parse().unwrap();
        let after: Board = "r3k3/8/1N6/8/8/8/8/R3K3 b - - 1 1".parse().unwrap();
        let before_attacks = AttackMap::compute(&before);
        let after_attacks = AttackMap::compute(&after);

        let mv = Move {
            from: Square::A4,
            to: Square::B6,
            promotion: None,
        };
        let best_line = vec!["a4b6".to_string(), "e8d7".to_string(), "a1a8".to_string()];

        let ctx = TacticalContext {
            before: &before,
            after: &after,
            mv: Some(mv),
            side_to_move_before: Color::White,
            before_attacks: &before_attacks,
            after_attacks: &after_attacks,
            eval_before: None,
            eval_after: None,
            best_line: Some(&best_line),
        };

        let tags = ClearanceDetector.detect(&ctx);
        assert!(!tags.is_empty(), "expected a clearance tag");
        assert_eq!(tags[0].kind, TacticalTagKind::Clearance);
        assert_eq!(tags[0].attacker.as_deref(), Some("a1"));
    }

    #[test]
    fn no_clearance_without_pv() {
        let before: Board = "r3k3/8/8/8/N7/8/8/R3K3 w Q - 0 1".parse().unwrap();
        let after: Board = "r3k3/8/1N6/8/8/8/8/R3K3 b - - 1 1".parse().unwrap();
        let before_attacks = AttackMap::compute(&before);
        let after_attacks = AttackMap::compute(&after);

        let mv = Move {
            from: Square::A4,
            to: Square::B6,
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

        assert!(ClearanceDetector.detect(&ctx).is_empty());
    }
}
