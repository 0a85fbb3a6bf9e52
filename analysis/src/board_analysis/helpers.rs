use cozy_chess::{BitBoard, Board, Color, File, Piece, Square};

/// Returns the union of all attack squares for a given color.
pub fn attacked_squares(board: &Board, color: Color) -> BitBoard {
    let mut attacks = BitBoard::EMPTY;
    let occupied = board.occupied();

    for piece in Piece::ALL {
        let pieces = board.pieces(piece) & board.colors(color);
        for sq in pieces {
            attacks |= piece_attacks(board, sq, piece, color);
        }
    }

    // We don't want to include the occupied squares of our own pieces
    // in the "attacks" set — attacks means squares the pieces control.
    let _ = occupied; // occupied is used implicitly via piece_attacks
    attacks
}

/// Returns all pieces of `color` that attack the given square.
pub fn attackers_of(board: &Board, sq: Square, color: Color) -> BitBoard {
    let occupied = board.occupied();
    let color_pieces = board.colors(color);

    let mut attackers = BitBoard::EMPTY;

    // Pawn attacks: a pawn of `color` attacks `sq` if `sq` is in the pawn's attack set.
    // Equivalently, we look from `sq` as if it were the opposite color's pawn.
    let pawn_attacks = cozy_chess::get_pawn_attacks(sq, !color);
    attackers |= pawn_attacks & board.pieces(Piece::Pawn) & color_pieces;

    // Knight attacks
    let knight_attacks = cozy_chess::get_knight_moves(sq);
    attackers |= knight_attacks & board.pieces(Piece::Knight) & color_pieces;

    // Bishop/Queen (diagonal)
    let bishop_attacks = cozy_chess::get_bishop_moves(sq, occupied);
    attackers |= bishop_attacks & (board.pieces(Piece::Bishop) | board.pieces(Piece::Queen)) & color_pieces;

    // Rook/Queen (orthogonal)
    let rook_attacks = cozy_chess::get_rook_moves(sq, occupied);
    attackers |= rook_attacks & (board.pieces(Piece::Rook) | board.pieces(Piece::Queen)) & color_pieces;

    // King attacks
    let king_attacks = cozy_chess::get_king_moves(sq);
    attackers |= king_attacks & board.pieces(Piece::King) & color_pieces;

    attackers
}

/// Standard piece values in centipawns.
pub fn piece_value(piece: Piece) -> u16 {
    match piece {
        Piece::Pawn => 100,
        Piece::Knight => 320,
        Piece::Bishop => 330,
        Piece::Rook => 500,
        Piece::Queen => 900,
        Piece::King => 20000,
    }
}

/// Returns the attack bitboard for a specific piece on a square.
pub fn piece_attacks(board: &Board, sq: Square, piece: Piece, color: Color) -> BitBoard {
    let occupied = board.occupied();
    match piece {
        Piece::Pawn => cozy_chess::get_pawn_attacks(sq, color),
        Piece::Knight => cozy_chess::get_knight_moves(sq),
        Piece::Bishop => cozy_chess::get_bishop_moves(sq, occupied),
        Piece::Rook => cozy_chess::get_rook_moves(sq, occupied),
        Piece::Queen => {
            cozy_chess::get_bishop_moves(sq, occupied) | cozy_chess::get_rook_moves(sq, occupied)
        }
        Piece::King => cozy_chess::get_king_moves(sq),
    }
}

/// Counts major and minor pieces (queens, rooks, bishops, knights) on the
/// board for both colors combined. Used by phase classification: a position
/// with fewer than 7 qualifies as an endgame.
pub fn major_minor_piece_count(board: &Board) -> u32 {
    [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight]
        .iter()
        .map(|p| board.pieces(*p).len() as u32)
        .sum()
}

/// Returns the files adjacent to the king (including the king's own file), clamped to the board.
pub fn king_zone_files(king_sq: Square) -> impl Iterator<Item = File> {
    let king_file = king_sq.file() as i8;
    let min_file = (king_file - 1).max(0) as u8;
    let max_file = (king_file + 1).min(7) as u8;
    (min_file..=max_file).filter_map(|f| File::try_index(f as usize))
}
