pub mod converters;
pub mod pgn;
pub mod types;
pub mod uci;

pub use converters::*;
pub use pgn::{parse_pgn, ParsedGame, ParsedPly, PgnError};
pub use pgn::san::{format_san, parse_san, SanError};
pub use types::{PieceColor, PieceKind};
pub use uci::{convert_uci_castling_to_cozy, format_uci_move, parse_uci_move};
