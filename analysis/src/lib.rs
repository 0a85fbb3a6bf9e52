pub mod board_analysis;
pub mod classify;

pub use board_analysis::{detect_tactics, AttackMap, TacticalContext, TacticalTag, TacticalTagKind};
pub use classify::{classify as classify_puzzle, Category, ClassifyError, ClassifyInput};
