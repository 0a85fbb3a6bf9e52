use cozy_chess::GameStatus;

use super::detector::{TacticalContext, TacticalDetector};
use super::tactical_types::{TacticalEvidence, TacticalTag, TacticalTagKind};

/// Detects checkmate: the played move ends the game with the opponent to
/// move and no legal reply.
pub struct CheckmateDetector;

impl TacticalDetector for CheckmateDetector {
    fn detect(&self, ctx: &TacticalContext) -> Vec<TacticalTag> {
        if ctx.after.status() != GameStatus::Won {
            return vec![];
        }

        let opponent = !ctx.side_to_move_before;
        let king_sq = (ctx.after.pieces(cozy_chess::Piece::King) & ctx.after.colors(opponent))
            .into_iter()
            .next();

        vec![TacticalTag {
            kind: TacticalTagKind::Checkmate,
            attacker: ctx.mv.map(|mv| mv.from.to_string()),
            victims: king_sq.map(|sq| vec![sq.to_string()]).unwrap_or_default(),
            target_square: king_sq.map(|sq| sq.to_string()),
            confidence: 1.0,
            note: Some("checkmate delivered".to_string()),
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
    fn detects_delivered_checkmate() {
        let before: Board = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1".parse().unwrap();
        let after: Board = "R5k1/5ppp/8/8/8/8/8/6K1 b - - 1 1".parse().unwrap();
        let before_attacks = AttackMap::compute(&before);
        let after_attacks = AttackMap::compute(&after);

        let mv = Move {
            from: Square::A1,
            to: Square::A8,
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

        let tags = CheckmateDetector.detect(&ctx);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].kind, TacticalTagKind::Checkmate);
        assert_eq!(tags[0].victims, vec!["g8"]);
    }

    #[test]
    fn no_tag_without_checkmate() {
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

        assert!(CheckmateDetector.detect(&ctx).is_empty());
    }
}
