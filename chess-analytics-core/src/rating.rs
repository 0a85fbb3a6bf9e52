//! The arena rating card: six category scores calibrated against an
//! empirical rating→performance curve, the headline arena rating, tier,
//! the `shiny` flag, and the ±N form bias.
//!
//! The numeric rating-to-performance curves are deliberately left
//! unfixed (an implementation may ship its own, as long as the
//! accuracy-calibration bound in `accuracy.rs` still holds — that bound
//! is on the accuracy formulas, not on these curves). The tables below
//! are this
//! implementation's own choice: monotonically increasing in rating,
//! plausible relative to how strong play looks at each level, documented
//! here rather than derived from any ground truth.

use serde::{Deserialize, Serialize};

/// One (rating, expected-success-rate-percent) anchor of a category's
/// calibration curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatePoint {
    pub rating: i32,
    pub expected_pct: f64,
}

/// The flat calibration constant from the rating model — not a per-point standard
/// deviation, just the denominator in the score formula.
const SD_EXPECTED: f64 = 8.0;

/// Piecewise-linear lookup with clamping at the endpoints.
pub fn lookup_expected(curve: &[RatePoint], rating: i32) -> f64 {
    assert!(!curve.is_empty(), "calibration curve must not be empty");
    if rating <= curve[0].rating {
        return curve[0].expected_pct;
    }
    if rating >= curve[curve.len() - 1].rating {
        return curve[curve.len() - 1].expected_pct;
    }
    for window in curve.windows(2) {
        let (lo, hi) = (window[0], window[1]);
        if rating >= lo.rating && rating <= hi.rating {
            let span = (hi.rating - lo.rating) as f64;
            let t = (rating - lo.rating) as f64 / span;
            return lo.expected_pct + t * (hi.expected_pct - lo.expected_pct);
        }
    }
    unreachable!("rating within curve bounds must land in some window")
}

/// The six categories a card is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Attacking,
    Defending,
    Tactics,
    Strategic,
    Opening,
    Endgame,
}

impl CategoryKind {
    pub const ALL: [CategoryKind; 6] = [
        CategoryKind::Attacking,
        CategoryKind::Defending,
        CategoryKind::Tactics,
        CategoryKind::Strategic,
        CategoryKind::Opening,
        CategoryKind::Endgame,
    ];

    /// Each category's own calibration curve. Ratings climb from casual
    /// online play (~400) to titled-player territory (~2400); expected
    /// success rates climb alongside them but at different slopes per
    /// category — e.g. `endgame` technique separates players more sharply
    /// at the top than `opening` book knowledge does.
    pub fn curve(self) -> &'static [RatePoint] {
        match self {
            CategoryKind::Attacking => ATTACKING_CURVE,
            CategoryKind::Defending => DEFENDING_CURVE,
            CategoryKind::Tactics => TACTICS_CURVE,
            CategoryKind::Strategic => STRATEGIC_CURVE,
            CategoryKind::Opening => OPENING_CURVE,
            CategoryKind::Endgame => ENDGAME_CURVE,
        }
    }
}

macro_rules! curve {
    ($name:ident, [$(($r:expr, $e:expr)),+ $(,)?]) => {
        static $name: &[RatePoint] = &[
            $(RatePoint { rating: $r, expected_pct: $e }),+
        ];
    };
}

curve!(ATTACKING_CURVE, [
    (400, 28.0), (800, 36.0), (1200, 45.0), (1600, 55.0),
    (2000, 65.0), (2400, 74.0),
]);
curve!(DEFENDING_CURVE, [
    (400, 35.0), (800, 44.0), (1200, 53.0), (1600, 62.0),
    (2000, 72.0), (2400, 82.0),
]);
curve!(TACTICS_CURVE, [
    (400, 25.0), (800, 34.0), (1200, 44.0), (1600, 56.0),
    (2000, 68.0), (2400, 80.0),
]);
curve!(STRATEGIC_CURVE, [
    (400, 30.0), (800, 38.0), (1200, 47.0), (1600, 57.0),
    (2000, 67.0), (2400, 77.0),
]);
curve!(OPENING_CURVE, [
    (400, 40.0), (800, 50.0), (1200, 58.0), (1600, 66.0),
    (2000, 74.0), (2400, 82.0),
]);
curve!(ENDGAME_CURVE, [
    (400, 20.0), (800, 28.0), (1200, 38.0), (1600, 52.0),
    (2000, 68.0), (2400, 83.0),
]);

/// A single category's score plus the inputs that produced it, so the
/// card can show "why" without recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: CategoryKind,
    pub observed_pct: f64,
    pub expected_pct: f64,
    pub score: i32,
}

/// Scores one category: `score = round(50 + 30*(observed-expected)/sd)`,
/// clamped to `[1, 99]`.
pub fn score_category(category: CategoryKind, observed_pct: f64, rating: i32) -> CategoryScore {
    let expected_pct = lookup_expected(category.curve(), rating);
    let raw = 50.0 + 30.0 * (observed_pct - expected_pct) / SD_EXPECTED;
    let score = raw.round().clamp(1.0, 99.0) as i32;
    CategoryScore {
        category,
        observed_pct,
        expected_pct,
        score,
    }
}

/// Discretized band derived purely from the headline arena rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

fn tier_for(arena_rating: f64) -> Tier {
    if arena_rating < 60.0 {
        Tier::Bronze
    } else if arena_rating < 75.0 {
        Tier::Silver
    } else if arena_rating < 90.0 {
        Tier::Gold
    } else {
        Tier::Platinum
    }
}

/// The fully assembled six-category card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaCard {
    pub categories: Vec<CategoryScore>,
    /// Unweighted average of the six category scores.
    pub arena_rating: f64,
    pub tier: Tier,
    /// Set when any category score reaches 95 or above.
    pub shiny: bool,
    /// ±N bias from the last 10 games' results; applied at render time,
    /// never folded back into the stored category scores.
    pub form: i32,
}

/// Builds the card from each category's observed rate plus the user's
/// chess-site rating for the relevant time category.
pub fn build_card(observed: &[(CategoryKind, f64)], rating: i32, form: i32) -> ArenaCard {
    let categories: Vec<CategoryScore> = observed
        .iter()
        .map(|&(cat, obs)| score_category(cat, obs, rating))
        .collect();
    let arena_rating = if categories.is_empty() {
        0.0
    } else {
        categories.iter().map(|c| c.score as f64).sum::<f64>() / categories.len() as f64
    };
    let shiny = categories.iter().any(|c| c.score >= 95);
    ArenaCard {
        tier: tier_for(arena_rating),
        arena_rating,
        shiny,
        form: form.clamp(-10, 10),
        categories,
    }
}

/// the rating model's form: +1 per win, -1 per loss, 0 per draw, over the last 10
/// games, clipped to ±10.
pub fn compute_form(recent_results: &[crate::model::GameResult]) -> i32 {
    use crate::model::GameResult;
    let last_ten = recent_results.iter().rev().take(10);
    let sum: i32 = last_ten
        .map(|r| match r {
            GameResult::Win => 1,
            GameResult::Loss => -1,
            GameResult::Draw => 0,
        })
        .sum();
    sum.clamp(-10, 10)
}
