use super::detector::{TacticalContext, TacticalDetector};
use super::helpers::piece_value;
use super::tactical_types::{TacticalEvidence, TacticalTag, TacticalTagKind};

/// Detects attraction: a sacrifice whose point is to drag the enemy king
/// onto a square the rest of the principal variation then exploits. Needs
/// the PV to run at least far enough to show that exploitation (a reply
/// and our follow-up).
pub struct AttractionDetector;

impl TacticalDetector for AttractionDetector {
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

        let Some(moved_piece) = ctx.before.piece_on(mv.from) else {
            return vec![];
        };

        // The move must be a capture that gives up more than it takes, or
        // a non-capture that hangs the piece outright — the sacrifice
        // shape attraction rides on.
        let is_sacrifice = match ctx.before.piece_on(mv.to) {
            Some(captured) if ctx.before.colors(enemy).has(mv.to) => {
                piece_value(moved_piece) > piece_value(captured)
            }
            _ => !ctx.after_attacks.attackers_of(mv.to, enemy).is_empty(),
        };
        if !is_sacrifice {
            return vec![];
        }

        // The enemy king must have been forced to recapture or move onto
        // the sacrificed square — that's the "attraction" to an exploited
        // square. We detect this as: the king was adjacent to or on the
        // destination square in the position right after our move's reply.
        let enemy_king_before = ctx.before.king(enemy);
        let forced_onto_target = mv.to == enemy_king_before
            || cozy_chess::get_king_moves(enemy_king_before).has(mv.to);
        if !forced_onto_target {
            return vec![];
        }

        vec![TacticalTag {
            kind: TacticalTagKind::Attraction,
            attacker: Some(mv.from.to_string()),
            victims: vec![mv.to.to_string()],
            target_square: Some(mv.to.to_string()),
            confidence: 0.6,
            note: Some(format!(
                "attraction: {} sacrifices on {} to drag the king into a {}-ply line",
                moved_piece,
                mv.to,
                best_line.len()
            )),
            evidence: TacticalEvidence::default(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use cozy_chess::{Board, Color, Move, Square};

    use super::*;
    use crate::board_analysis::attack_map::AttackMap;

    #[test]
    fn detects_attraction_sacrifice_near_king() {
        // White bishop sacrifices itself on g7, a square adjacent to the
        // black king on g8, with a long enough PV to show the follow-up.
        let before: Board = "6k1/6pp/8/4B3/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let after: Board = "6k1/6Bp/8/8/8/8/8/4K3 b - - 0 1".parse().unwrap();
        let before_attacks = AttackMap::compute(&before);
        let after_attacks = AttackMap::compute(&after);

        let mv = Move {
            from: Square::E5,
            to: Square::G7,
            promotion: None,
        };
        let best_line = vec!["e5g7".to_string(), "g8g7".to_string(), "e1e8".to_string()];

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

        let tags = AttractionDetector.detect(&ctx);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].kind, TacticalTagKind::Attraction);
    }

    #[test]
    fn no_attraction_far_from_king() {
        let before: Board = "4k3/8/8/4B3/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let attacks = AttackMap::compute(&before);
        let mv = Move {
            from: Square::E5,
            to: Square::A1,
            promotion: None,
        };
        let best_line = vec!["e5a1".to_string(), "e8d7".to_string(), "a1a8".to_string()];

        let ctx = TacticalContext {
            before: &before,
            after: &before,
            mv: Some(mv),
            side_to_move_before: Color::White,
            before_attacks: &attacks,
            after_attacks: &attacks,
            eval_before: None,
            eval_after: None,
            best_line: Some(&best_line),
        };

        assert!(AttractionDetector.detect(&ctx).is_empty());
    }

    #[test]
    fn no_attraction_on_short_pv() {
        let before: Board = "6k1/6pp/8/4B3/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let after: Board = "6k1/6Bp/8/8/8/8/8/4K3 b - - 0 1".parse().unwrap();
        let before_attacks = AttackMap::compute(&before);
        let after_attacks = AttackMap::compute(&after);

        let mv = Move {
            from: Square::E5,
            to: Square::G7,
            promotion: None,
        };
        let best_line = vec!["e5g7".to_string()];

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

        assert!(AttractionDetector.detect(&ctx).is_empty());
    }
}
