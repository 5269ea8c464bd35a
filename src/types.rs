//! Shared scalar types for the caching and endgame-dispatch subsystem.
//!
//! Values, scores, scale factors, and bound classifications follow the usual
//! alpha-beta conventions: a `Value` is a centipawn-scale score from the
//! side-to-move's point of view, a `Score` carries separate middlegame and
//! endgame components, and a `ScaleFactor` dampens an endgame score toward a
//! draw on a 0-64 scale.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Centipawn-scale evaluation value.
pub type Value = i32;

pub const VALUE_DRAW: Value = 0;
pub const VALUE_KNOWN_WIN: Value = 10_000;
pub const VALUE_MATE: Value = 32_000;
pub const VALUE_INFINITE: Value = 32_001;

// Piece values (middlegame, endgame). Used by the imbalance model, the
// game-phase interpolation, and the specialized endgame evaluations.
pub const PAWN_VALUE_MG: Value = 126;
pub const PAWN_VALUE_EG: Value = 208;
pub const KNIGHT_VALUE_MG: Value = 781;
pub const KNIGHT_VALUE_EG: Value = 854;
pub const BISHOP_VALUE_MG: Value = 825;
pub const BISHOP_VALUE_EG: Value = 915;
pub const ROOK_VALUE_MG: Value = 1276;
pub const ROOK_VALUE_EG: Value = 1380;
pub const QUEEN_VALUE_MG: Value = 2538;
pub const QUEEN_VALUE_EG: Value = 2682;

/// Middlegame value of a piece type (kings carry none).
#[must_use]
pub fn piece_value_mg(piece: Piece) -> Value {
    match piece {
        Piece::Pawn => PAWN_VALUE_MG,
        Piece::Knight => KNIGHT_VALUE_MG,
        Piece::Bishop => BISHOP_VALUE_MG,
        Piece::Rook => ROOK_VALUE_MG,
        Piece::Queen => QUEEN_VALUE_MG,
        Piece::King => 0,
    }
}

/// Endgame value of a piece type.
#[must_use]
pub fn piece_value_eg(piece: Piece) -> Value {
    match piece {
        Piece::Pawn => PAWN_VALUE_EG,
        Piece::Knight => KNIGHT_VALUE_EG,
        Piece::Bishop => BISHOP_VALUE_EG,
        Piece::Rook => ROOK_VALUE_EG,
        Piece::Queen => QUEEN_VALUE_EG,
        Piece::King => 0,
    }
}

/// Game phase on a 0 (pure endgame) to 128 (full middlegame) scale.
pub type Phase = i32;

pub const PHASE_MIDGAME: Phase = 128;

/// Search depth in plies. Negative depths identify pre-search (quiescence)
/// stages; `DEPTH_OFFSET` is the most negative depth the transposition table
/// can represent once biased into its 8-bit field.
pub type Depth = i32;

pub const DEPTH_NONE: Depth = -6;
pub const DEPTH_OFFSET: Depth = -7;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Piece {
    pub const ALL: [Piece; 6] = [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ];

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    #[must_use]
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

/// Board square, 0 = a1 .. 63 = h8, file-major within each rank.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Square(pub u8);

impl Square {
    #[must_use]
    pub fn make(file: u8, rank: u8) -> Square {
        debug_assert!(file < 8 && rank < 8);
        Square(rank * 8 + file)
    }

    #[inline]
    #[must_use]
    pub fn file(self) -> u8 {
        self.0 & 7
    }

    #[inline]
    #[must_use]
    pub fn rank(self) -> u8 {
        self.0 >> 3
    }

    /// Mirror across the vertical axis (file a <-> file h).
    #[inline]
    #[must_use]
    pub fn flip_file(self) -> Square {
        Square(self.0 ^ 7)
    }

    /// Mirror across the horizontal axis (rank 1 <-> rank 8).
    #[inline]
    #[must_use]
    pub fn flip_rank(self) -> Square {
        Square(self.0 ^ 56)
    }

    /// Rank as seen from `color`'s side of the board (0-based).
    #[inline]
    #[must_use]
    pub fn relative_rank(self, color: Color) -> u8 {
        match color {
            Color::White => self.rank(),
            Color::Black => 7 - self.rank(),
        }
    }

    /// Chebyshev (king-move) distance.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Square) -> u8 {
        let df = self.file().abs_diff(other.file());
        let dr = self.rank().abs_diff(other.rank());
        df.max(dr)
    }

    /// True if this square is dark.
    #[inline]
    #[must_use]
    pub fn is_dark(self) -> bool {
        (self.file() + self.rank()) % 2 == 0
    }
}

/// True if the two squares have different shades.
#[inline]
#[must_use]
pub fn opposite_colors(a: Square, b: Square) -> bool {
    a.is_dark() != b.is_dark()
}

/// Middlegame/endgame score pair, from white's perspective.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Score {
    pub mg: Value,
    pub eg: Value,
}

impl Score {
    pub const ZERO: Score = Score { mg: 0, eg: 0 };

    #[must_use]
    pub fn new(mg: Value, eg: Value) -> Score {
        Score { mg, eg }
    }
}

impl Add for Score {
    type Output = Score;
    fn add(self, rhs: Score) -> Score {
        Score::new(self.mg + rhs.mg, self.eg + rhs.eg)
    }
}

impl AddAssign for Score {
    fn add_assign(&mut self, rhs: Score) {
        *self = *self + rhs;
    }
}

impl Sub for Score {
    type Output = Score;
    fn sub(self, rhs: Score) -> Score {
        Score::new(self.mg - rhs.mg, self.eg - rhs.eg)
    }
}

impl SubAssign for Score {
    fn sub_assign(&mut self, rhs: Score) {
        *self = *self - rhs;
    }
}

impl Neg for Score {
    type Output = Score;
    fn neg(self) -> Score {
        Score::new(-self.mg, -self.eg)
    }
}

/// Endgame scale factor: 0 = dead draw, 64 = score stands as-is.
/// `NONE` is the sentinel for "this strategy has no opinion".
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ScaleFactor(pub u32);

impl ScaleFactor {
    pub const DRAW: ScaleFactor = ScaleFactor(0);
    pub const ONE_PAWN: ScaleFactor = ScaleFactor(48);
    pub const NORMAL: ScaleFactor = ScaleFactor(64);
    pub const MAX: ScaleFactor = ScaleFactor(128);
    pub const NONE: ScaleFactor = ScaleFactor(255);
}

/// Classification of a cached search value, per alpha-beta semantics.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Bound {
    Exact,
    /// Score is at least this value (fail high).
    Lower,
    /// Score is at most this value (fail low).
    Upper,
}

impl Bound {
    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        match self {
            Bound::Exact => 0,
            Bound::Lower => 1,
            Bound::Upper => 2,
        }
    }

    #[inline]
    #[must_use]
    pub fn from_u8(v: u8) -> Bound {
        match v & 0x3 {
            0 => Bound::Exact,
            1 => Bound::Lower,
            _ => Bound::Upper,
        }
    }
}

/// Opaque 16-bit move payload carried through the transposition table.
/// The packed encoding belongs to the move generator; this subsystem only
/// stores and returns it. Zero is reserved for "no move".
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Move(pub u16);

impl Move {
    pub const NONE: Move = Move(0);

    #[inline]
    #[must_use]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_geometry() {
        let e4 = Square::make(4, 3);
        assert_eq!(e4.file(), 4);
        assert_eq!(e4.rank(), 3);
        assert_eq!(e4.flip_file(), Square::make(3, 3));
        assert_eq!(e4.flip_rank(), Square::make(4, 4));
        assert_eq!(e4.relative_rank(Color::Black), 4);
        assert_eq!(e4.distance(Square::make(0, 0)), 4);
    }

    #[test]
    fn square_shades() {
        // a1 is dark, h1 is light, a8 is light.
        assert!(Square::make(0, 0).is_dark());
        assert!(!Square::make(7, 0).is_dark());
        assert!(opposite_colors(Square::make(0, 0), Square::make(0, 7)));
        assert!(!opposite_colors(Square::make(0, 0), Square::make(2, 0)));
    }

    #[test]
    fn bound_roundtrip() {
        for b in [Bound::Exact, Bound::Lower, Bound::Upper] {
            assert_eq!(Bound::from_u8(b.to_u8()), b);
        }
    }
}
