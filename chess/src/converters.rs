//! Square/piece notation conversions shared by the UCI and SAN layers.

use cozy_chess::{Piece, Square};

/// Format a square in algebraic notation, e.g. `Square::E4` -> `"e4"`.
pub fn format_square(sq: Square) -> String {
    sq.to_string()
}

/// Parse a square from algebraic notation.
pub fn parse_square(s: &str) -> Result<Square, ConvertError> {
    s.parse().map_err(|_| ConvertError::InvalidSquare(s.to_string()))
}

/// Format a promotion piece as its lowercase UCI/SAN letter (`q`, `r`, `b`, `n`).
pub fn format_piece(piece: Piece) -> char {
    match piece {
        Piece::Queen => 'q',
        Piece::Rook => 'r',
        Piece::Bishop => 'b',
        Piece::Knight => 'n',
        Piece::Pawn => 'p',
        Piece::King => 'k',
    }
}

/// Parse a promotion piece letter (case-insensitive).
pub fn parse_piece(c: char) -> Option<Piece> {
    match c.to_ascii_lowercase() {
        'q' => Some(Piece::Queen),
        'r' => Some(Piece::Rook),
        'b' => Some(Piece::Bishop),
        'n' => Some(Piece::Knight),
        'p' => Some(Piece::Pawn),
        'k' => Some(Piece::King),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("invalid square: {0}")]
    InvalidSquare(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use cozy_chess::File;

    #[test]
    fn round_trips_square() {
        let sq = parse_square("e4").unwrap();
        assert_eq!(sq.file(), File::E);
        assert_eq!(format_square(sq), "e4");
    }

    #[test]
    fn parses_promotion_letters() {
        assert_eq!(parse_piece('Q'), Some(Piece::Queen));
        assert_eq!(format_piece(Piece::Queen), 'q');
    }

    #[test]
    fn rejects_invalid_square() {
        assert!(parse_square("z9").is_err());
    }
}
