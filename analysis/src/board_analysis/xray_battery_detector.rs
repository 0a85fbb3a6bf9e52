use cozy_chess::Piece;

use super::detector::{TacticalContext, TacticalDetector};
use super::tactical_types::{TacticalEvidence, TacticalTag, TacticalTagKind};

/// Detects x-ray batteries: two friendly line pieces stacked on the same
/// file, rank, or diagonal, both bearing on an enemy target, so the front
/// piece can be traded or removed and the attack continues through it.
pub struct XrayBatteryDetector;

impl TacticalDetector for XrayBatteryDetector {
    fn detect(&self, ctx: &TacticalContext) -> Vec<TacticalTag> {
        let perspective = ctx.side_to_move_before;
        let enemy = !perspective;

        let sliders: Vec<(cozy_chess::Square, Piece)> = [Piece::Bishop, Piece::Rook, Piece::Queen]
            .into_iter()
            .flat_map(|piece| {
                (ctx.after.pieces(piece) & ctx.after.colors(perspective))
                    .into_iter()
                    .map(move |sq| (sq, piece))
            })
            .collect();

        let mut tags = Vec::new();

        for &(front_sq, front_piece) in &sliders {
            for &(back_sq, back_piece) in &sliders {
                if front_sq == back_sq {
                    continue;
                }
                if !aligned(front_sq, back_sq) {
                    continue;
                }
                if !compatible(front_piece, back_sq, front_sq) {
                    continue;
                }

                // The back piece's attack must run through (or to) front_sq,
                // and beyond front_sq there must be an enemy target that
                // front_sq itself also attacks.
                let front_attacks = super::helpers::piece_attacks(ctx.after, front_sq, front_piece, perspective);
                let targets = front_attacks & ctx.after.colors(enemy);

                for target in targets {
                    if !aligned(front_sq, target) {
                        continue;
                    }
                    if !on_same_line(back_sq, front_sq, target) {
                        continue;
                    }
                    if !compatible_for_target(back_piece, back_sq, target) {
                        continue;
                    }

                    tags.push(TacticalTag {
                        kind: TacticalTagKind::XRayBattery,
                        attacker: Some(back_sq.to_string()),
                        victims: vec![target.to_string()],
                        target_square: Some(target.to_string()),
                        confidence: 0.6,
                        note: Some(format!(
                            "x-ray battery: {} on {} backs up {} on {} against {}",
                            back_piece, back_sq, front_piece, front_sq, target
                        )),
                        evidence: TacticalEvidence::default(),
                    });
                }
            }
        }

        tags
    }
}

fn aligned(a: cozy_chess::Square, b: cozy_chess::Square) -> bool {
    let (af, ar) = (a.file() as i8, a.rank() as i8);
    let (bf, br) = (b.file() as i8, b.rank() as i8);
    af == bf || ar == br || (af - bf).abs() == (ar - br).abs()
}

fn on_same_line(back: cozy_chess::Square, front: cozy_chess::Square, target: cozy_chess::Square) -> bool {
    aligned(back, front) && aligned(front, target) && aligned(back, target)
}

fn compatible(piece: Piece, a: cozy_chess::Square, b: cozy_chess::Square) -> bool {
    let (af, ar) = (a.file() as i8, a.rank() as i8);
    let (bf, br) = (b.file() as i8, b.rank() as i8);
    let diagonal = (af - bf).abs() == (ar - br).abs();
    let straight = af == bf || ar == br;
    match piece {
        Piece::Bishop => diagonal,
        Piece::Rook => straight,
        Piece::Queen => diagonal || straight,
        _ => false,
    }
}

fn compatible_for_target(piece: Piece, a: cozy_chess::Square, b: cozy_chess::Square) -> bool {
    compatible(piece, a, b)
}

#[cfg(test)]
mod tests {
    use cozy_chess::{Board, Color};

    use super::*;
    use crate::board_analysis::attack_map::AttackMap;

    #[test]
    fn detects_doubled_rooks_battery() {
        // White rooks doubled on the d-file, d5 rook bears on black rook d8
        // with the d1 rook backing it up through the same file.
        let board: Board = "3rk3/8/8/3R4/8/8/8/3RK3 w - - 0 1".parse().unwrap();
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

        let tags = XrayBatteryDetector.detect(&ctx);
        assert!(!tags.is_empty(), "expected an x-ray battery tag");
        assert_eq!(tags[0].kind, TacticalTagKind::XRayBattery);
    }

    #[test]
    fn no_battery_starting_position() {
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

        assert!(XrayBatteryDetector.detect(&ctx).is_empty());
    }
}
