use super::tactical_types::{TacticalTag, TacticalTagKind};

/// Returns a priority value for a TacticalTagKind (lower = higher priority).
fn kind_priority(kind: &TacticalTagKind) -> u8 {
    match kind {
        TacticalTagKind::Checkmate => 0,
        TacticalTagKind::SmotheredMate => 1,
        TacticalTagKind::MateThreat => 2,
        TacticalTagKind::BackRank => 3,
        TacticalTagKind::Fork => 4,
        TacticalTagKind::Skewer => 5,
        TacticalTagKind::Pin => 6,
        TacticalTagKind::DoubleAttack => 7,
        TacticalTagKind::DiscoveredAttack => 8,
        TacticalTagKind::RemovalOfDefender => 9,
        TacticalTagKind::Overload => 10,
        TacticalTagKind::Deflection => 11,
        TacticalTagKind::Intermezzo => 12,
        TacticalTagKind::Attraction => 13,
        TacticalTagKind::Sacrifice => 14,
        TacticalTagKind::Desperado => 15,
        TacticalTagKind::Clearance => 16,
        TacticalTagKind::Interference => 17,
        TacticalTagKind::XRayBattery => 18,
        TacticalTagKind::TrappedPiece => 19,
        TacticalTagKind::HangingPiece => 20,
    }
}

/// Deduplication key for a tactical tag.
///
/// Two tags are duplicates if they have the same kind, same attacker, and
/// the same victims (as a sorted set).
#[derive(PartialEq, Eq, Hash)]
struct DedupeKey {
    kind: String,
    attacker: Option<String>,
    victims: Vec<String>, // sorted
}

impl DedupeKey {
    fn from_tag(tag: &TacticalTag) -> Self {
        let mut victims = tag.victims.clone();
        victims.sort();
        Self {
            kind: format!("{:?}", tag.kind),
            attacker: tag.attacker.clone(),
            victims,
        }
    }
}

/// Reduces a collection of tactical tags by deduplicating and ranking.
///
/// 1. Deduplicates tags that share the same kind, attacker, and victims
///    (as a sorted set), keeping the one with the highest confidence.
/// 2. Sorts by confidence descending, then by kind priority ascending.
/// 3. Truncates to `max_results` if provided.
pub fn reduce_tags(tags: Vec<TacticalTag>, max_results: Option<usize>) -> Vec<TacticalTag> {
    // Deduplicate: use an index map to track the best tag per key.
    let mut seen: std::collections::HashMap<DedupeKey, TacticalTag> =
        std::collections::HashMap::new();

    for tag in tags {
        let key = DedupeKey::from_tag(&tag);
        seen.entry(key)
            .and_modify(|existing| {
                if tag.confidence > existing.confidence {
                    *existing = tag.clone();
                }
            })
            .or_insert(tag);
    }

    let mut result: Vec<TacticalTag> = seen.into_values().collect();

    // Sort: primary = confidence descending, secondary = kind priority ascending.
    result.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| kind_priority(&a.kind).cmp(&kind_priority(&b.kind)))
    });

    if let Some(n) = max_results {
        result.truncate(n);
    }

    result
}
