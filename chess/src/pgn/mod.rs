pub mod parser;
pub mod san;

pub use parser::{parse_pgn, ParsedGame, ParsedPly, PgnError};
pub use san::{format_san, parse_san, SanError};
