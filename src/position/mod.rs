//! Minimal position representation backing the caching subsystem.
//!
//! The full board (move generation, legality, repetition bookkeeping) lives
//! elsewhere; the tables only need piece placement, per-side piece counts,
//! the side to move, and an incrementally maintained material signature.
//! That slice is what this module provides, together with the two
//! constructors the subsystem relies on: a FEN parser for arbitrary
//! positions and a canonical material-code constructor used when the
//! endgame registry derives its lookup signatures.

mod fen;

pub use fen::FenError;

use crate::types::{piece_value_mg, Color, Piece, Square, Value};
use crate::zobrist::{material_signature, MATERIAL_KEYS, MAX_PIECE_COUNT};

#[derive(Clone)]
pub struct Position {
    board: [Option<(Color, Piece)>; 64],
    counts: [[u8; 6]; 2],
    side: Color,
    material_key: u64,
}

impl Position {
    /// Empty board, white to move.
    #[must_use]
    pub fn empty() -> Position {
        Position {
            board: [None; 64],
            counts: [[0; 6]; 2],
            side: Color::White,
            material_key: 0,
        }
    }

    /// Construct a canonical position for a material code such as "KPK" or
    /// "KRPPKRP": pieces before the second 'K' belong to `strong`, the rest
    /// to the other side. Placement is arbitrary but deterministic; only the
    /// material signature and piece lists matter to the callers.
    #[must_use]
    pub fn from_code(code: &str, strong: Color) -> Position {
        let mut pos = Position::empty();
        let mut kings_seen = 0;
        let mut white_next = 8u8; // a2 upward for the first group
        let mut black_next = 55u8; // h7 downward for the second group

        for c in code.chars() {
            let piece = match c {
                'K' => Piece::King,
                'Q' => Piece::Queen,
                'R' => Piece::Rook,
                'B' => Piece::Bishop,
                'N' => Piece::Knight,
                'P' => Piece::Pawn,
                _ => continue,
            };
            if piece == Piece::King {
                kings_seen += 1;
            }
            let strong_group = if piece == Piece::King {
                kings_seen == 1
            } else {
                kings_seen < 2
            };
            let color = if strong_group { strong } else { strong.opponent() };
            let sq = if color == Color::White {
                let sq = Square(white_next);
                white_next += 1;
                sq
            } else {
                let sq = Square(black_next);
                black_next -= 1;
                sq
            };
            pos.put_piece(sq, color, piece);
        }
        pos
    }

    /// Place a piece, keeping counts and the material signature in sync.
    /// Like pieces beyond the keyed count leave the signature unchanged,
    /// the same cap `material_signature` applies.
    pub fn put_piece(&mut self, sq: Square, color: Color, piece: Piece) {
        debug_assert!(self.board[sq.0 as usize].is_none());
        self.board[sq.0 as usize] = Some((color, piece));
        let count = &mut self.counts[color.index()][piece.index()];
        if (*count as usize) < MAX_PIECE_COUNT {
            self.material_key ^= MATERIAL_KEYS.key(color, piece, *count as usize);
        }
        *count += 1;
    }

    pub fn set_side_to_move(&mut self, side: Color) {
        self.side = side;
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.side
    }

    /// Material signature: a Zobrist-style hash of piece counts only,
    /// independent of placement.
    #[inline]
    #[must_use]
    pub fn material_key(&self) -> u64 {
        self.material_key
    }

    #[inline]
    #[must_use]
    pub fn piece_on(&self, sq: Square) -> Option<(Color, Piece)> {
        self.board[sq.0 as usize]
    }

    #[inline]
    #[must_use]
    pub fn count(&self, color: Color, piece: Piece) -> u8 {
        self.counts[color.index()][piece.index()]
    }

    /// Squares holding `color`'s pieces of the given type, ascending.
    pub fn squares(&self, color: Color, piece: Piece) -> impl Iterator<Item = Square> + '_ {
        self.board
            .iter()
            .enumerate()
            .filter(move |(_, occ)| **occ == Some((color, piece)))
            .map(|(i, _)| Square(i as u8))
    }

    /// First square holding `color`'s `piece`. Strategies call this only for
    /// piece types their material code guarantees to exist; on violated
    /// preconditions the result is unspecified.
    #[must_use]
    pub fn square_of(&self, color: Color, piece: Piece) -> Square {
        debug_assert!(self.count(color, piece) > 0);
        self.squares(color, piece).next().unwrap_or(Square(0))
    }

    #[inline]
    #[must_use]
    pub fn king(&self, color: Color) -> Square {
        self.square_of(color, Piece::King)
    }

    /// Non-pawn material for one side, in middlegame piece values.
    #[must_use]
    pub fn non_pawn_material(&self, color: Color) -> Value {
        Piece::ALL
            .iter()
            .filter(|&&p| p != Piece::Pawn && p != Piece::King)
            .map(|&p| Value::from(self.count(color, p)) * piece_value_mg(p))
            .sum()
    }

    /// True if `color`'s pawn on `sq` has no enemy pawn ahead of it on its
    /// own or an adjacent file.
    #[must_use]
    pub fn pawn_passed(&self, color: Color, sq: Square) -> bool {
        let them = color.opponent();
        self.squares(them, Piece::Pawn).all(|p| {
            p.file().abs_diff(sq.file()) > 1
                || p.relative_rank(color) <= sq.relative_rank(color)
        })
    }

    /// Recompute the material signature from scratch (consistency checks).
    #[must_use]
    pub fn material_key_slow(&self) -> u64 {
        material_signature(&self.counts)
    }
}

impl std::fmt::Debug for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = String::new();
        for rank in (0..8).rev() {
            for file in 0..8 {
                let c = match self.piece_on(Square::make(file, rank)) {
                    None => '.',
                    Some((color, piece)) => {
                        let ch = match piece {
                            Piece::Pawn => 'p',
                            Piece::Knight => 'n',
                            Piece::Bishop => 'b',
                            Piece::Rook => 'r',
                            Piece::Queen => 'q',
                            Piece::King => 'k',
                        };
                        if color == Color::White {
                            ch.to_ascii_uppercase()
                        } else {
                            ch
                        }
                    }
                };
                s.push(c);
            }
            s.push('\n');
        }
        write!(f, "{s}{:?} to move", self.side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_code_splits_sides_at_second_king() {
        let pos = Position::from_code("KRPPKRP", Color::White);
        assert_eq!(pos.count(Color::White, Piece::King), 1);
        assert_eq!(pos.count(Color::White, Piece::Rook), 1);
        assert_eq!(pos.count(Color::White, Piece::Pawn), 2);
        assert_eq!(pos.count(Color::Black, Piece::King), 1);
        assert_eq!(pos.count(Color::Black, Piece::Rook), 1);
        assert_eq!(pos.count(Color::Black, Piece::Pawn), 1);
    }

    #[test]
    fn from_code_strong_side_color() {
        let white_strong = Position::from_code("KPK", Color::White);
        let black_strong = Position::from_code("KPK", Color::Black);
        assert_eq!(white_strong.count(Color::White, Piece::Pawn), 1);
        assert_eq!(black_strong.count(Color::Black, Piece::Pawn), 1);
        assert_ne!(white_strong.material_key(), black_strong.material_key());
    }

    #[test]
    fn incremental_key_matches_slow_recompute() {
        let pos = Position::from_code("KQRBNPKQRBNP", Color::White);
        assert_eq!(pos.material_key(), pos.material_key_slow());
    }

    #[test]
    fn code_and_fen_agree_on_material_key() {
        let from_code = Position::from_code("KPK", Color::White);
        let from_fen = Position::from_fen("8/8/8/8/4P3/8/8/K2k4 w - - 0 1")
            .expect("valid fen");
        assert_eq!(from_code.material_key(), from_fen.material_key());
    }

    #[test]
    fn like_pieces_beyond_key_table_parse_and_stay_consistent() {
        // Eleven white pawns: more like pieces than the key table covers.
        // The placement must parse, and the capped incremental signature
        // must agree with the from-scratch recompute.
        let pos = Position::from_fen("4k3/8/8/8/PPP5/8/PPPPPPPP/4K3 w - - 0 1")
            .expect("valid fen");
        assert_eq!(pos.count(Color::White, Piece::Pawn), 11);
        assert_eq!(pos.material_key(), pos.material_key_slow());
    }

    #[test]
    fn non_pawn_material_sums_mg_values() {
        let pos = Position::from_code("KRKN", Color::White);
        assert_eq!(
            pos.non_pawn_material(Color::White),
            crate::types::ROOK_VALUE_MG
        );
        assert_eq!(
            pos.non_pawn_material(Color::Black),
            crate::types::KNIGHT_VALUE_MG
        );
    }

    #[test]
    fn pawn_passed_checks_front_span() {
        let pos = Position::from_fen("8/8/8/3p4/8/4P3/8/K2k4 w - - 0 1").expect("valid fen");
        // e3 pawn faces a d5 pawn on an adjacent file: not passed.
        assert!(!pos.pawn_passed(Color::White, Square::make(4, 2)));
        // The d5 pawn has nothing in front of it on c/d/e files.
        assert!(pos.pawn_passed(Color::Black, Square::make(3, 4)));
    }
}
