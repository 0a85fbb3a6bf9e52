use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TacticalTagKind {
    Fork,
    Pin,
    Skewer,
    DiscoveredAttack,
    DoubleAttack,
    RemovalOfDefender,
    Overload,
    Deflection,
    Intermezzo,
    Sacrifice,
    Clearance,
    BackRank,
    MateThreat,
    Checkmate,
    SmotheredMate,
    TrappedPiece,
    XRayBattery,
    Interference,
    Desperado,
    Attraction,
    /// Internal signal consumed by other detectors (e.g. desperado,
    /// sacrifice) and by accuracy scoring; never surfaced in a puzzle's
    /// label set.
    HangingPiece,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TacticalLine {
    pub from: String,
    pub through: Vec<String>,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TacticalEvidence {
    pub lines: Vec<TacticalLine>,
    pub threatened_pieces: Vec<String>,
    pub defended_by: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticalTag {
    pub kind: TacticalTagKind,
    pub attacker: Option<String>,
    pub victims: Vec<String>,
    pub target_square: Option<String>,
    pub confidence: f32,
    pub note: Option<String>,
    pub evidence: TacticalEvidence,
}
