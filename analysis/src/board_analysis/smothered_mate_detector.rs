use cozy_chess::{GameStatus, Piece};

use super::detector::{TacticalContext, TacticalDetector};
use super::tactical_types::{TacticalEvidence, TacticalTag, TacticalTagKind};

/// Detects smothered mate: checkmate delivered by a knight where the mated
/// king has no flight square because every adjacent square is occupied by
/// its own pieces.
pub struct SmotheredMateDetector;

impl TacticalDetector for SmotheredMateDetector {
    fn detect(&self, ctx: &TacticalContext) -> Vec<TacticalTag> {
        if ctx.after.status() != GameStatus::Won {
            return vec![];
        }

        let Some(mv) = ctx.mv else {
            return vec![];
        };
        let Some(mover) = ctx.before.piece_on(mv.from) else {
            return vec![];
        };
        if mover != Piece::Knight {
            return vec![];
        }

        let opponent = !ctx.side_to_move_before;
        let Some(king_sq) = (ctx.after.pieces(Piece::King) & ctx.after.colors(opponent))
            .into_iter()
            .next()
        else {
            return vec![];
        };

        // Smothered mate requires every neighboring square to be occupied by
        // the mated side's own pieces, leaving no flight square at all.
        let king_neighbors = cozy_chess::get_king_moves(king_sq);
        let friendly_occupied = ctx.after.colors(opponent);
        let smothered = king_neighbors.into_iter().all(|sq| friendly_occupied.has(sq));

        if !smothered {
            return vec![];
        }

        vec![TacticalTag {
            kind: TacticalTagKind::SmotheredMate,
            attacker: Some(mv.from.to_string()),
            victims: vec![king_sq.to_string()],
            target_square: Some(king_sq.to_string()),
            confidence: 1.0,
            note: Some(format!(
                "smothered mate: knight on {} mates a king with no flight squares",
                mv.to
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
    fn detects_smothered_mate() {
        // Classic smothered mate: black king on h8 boxed in by its own
        // rook g8, pawns g7/h7, white knight delivers mate from f7.
        let before: Board = "6rk/6pp/7N/8/8/8/8/6K1 w - - 0 1".parse().unwrap();
        let after: Board = "6rk/5Npp/8/8/8/8/8/6K1 b - - 1 1".parse().unwrap();
        let before_attacks = AttackMap::compute(&before);
        let after_attacks = AttackMap::compute(&after);

        let mv = Move {
            from: Square::H6,
            to: Square::F7,
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

        let tags = SmotheredMateDetector.detect(&ctx);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].kind, TacticalTagKind::SmotheredMate);
    }

    #[test]
    fn no_tag_for_non_knight_mate() {
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

        assert!(SmotheredMateDetector.detect(&ctx).is_empty());
    }
}
