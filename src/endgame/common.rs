//! Square-geometry helpers shared by the endgame strategies.

use crate::position::Position;
use crate::types::{Color, Piece, Square};

/// Bonus for driving a king toward any board edge, largest in the corners.
#[must_use]
pub(super) fn push_to_edge(s: Square) -> i32 {
    let fd = i32::from(s.file().min(7 - s.file()));
    let rd = i32::from(s.rank().min(7 - s.rank()));
    90 - (7 * fd * fd / 2 + 7 * rd * rd / 2)
}

/// Bonus for driving a king toward the a1/h8 corners (used after adjusting
/// for bishop color in KBNK).
#[must_use]
pub(super) fn push_to_corner(s: Square) -> i32 {
    (7 - i32::from(s.rank()) - i32::from(s.file())).abs()
}

/// Bonus for bringing two squares (typically the kings) close together.
#[must_use]
pub(super) fn push_close(a: Square, b: Square) -> i32 {
    140 - 20 * i32::from(a.distance(b))
}

/// Bonus for keeping two squares apart.
#[must_use]
pub(super) fn push_away(a: Square, b: Square) -> i32 {
    120 - 20 * i32::from(a.distance(b))
}

/// One-square pawn advance for `color`, as a square-index delta.
#[must_use]
pub(super) fn pawn_push(color: Color) -> i8 {
    match color {
        Color::White => 8,
        Color::Black => -8,
    }
}

/// Offset `sq` by `delta` pawn-push steps. The caller guarantees the result
/// stays on the board.
#[must_use]
pub(super) fn shift(sq: Square, delta: i8) -> Square {
    Square((i16::from(sq.0) + i16::from(delta)) as u8)
}

/// Map `sq` into the canonical frame used by single-pawn endgames: the
/// strong side becomes white and its pawn lands on files a-d. Requires the
/// strong side to have exactly one pawn.
#[must_use]
pub(super) fn normalize(pos: &Position, strong: Color, sq: Square) -> Square {
    debug_assert_eq!(pos.count(strong, Piece::Pawn), 1);
    let mut sq = sq;
    if pos.square_of(strong, Piece::Pawn).file() >= 4 {
        sq = sq.flip_file();
    }
    if strong == Color::Black {
        sq = sq.flip_rank();
    }
    sq
}

/// True if a bishop on `from` attacks `to` given the current occupancy
/// (same diagonal, no piece in between).
#[must_use]
pub(super) fn bishop_attacks(pos: &Position, from: Square, to: Square) -> bool {
    let df = i32::from(to.file()) - i32::from(from.file());
    let dr = i32::from(to.rank()) - i32::from(from.rank());
    if df.abs() != dr.abs() || df == 0 {
        return false;
    }
    let step_f = df.signum();
    let step_r = dr.signum();
    let mut f = i32::from(from.file()) + step_f;
    let mut r = i32::from(from.rank()) + step_r;
    while (f, r) != (i32::from(to.file()), i32::from(to.rank())) {
        if pos.piece_on(Square::make(f as u8, r as u8)).is_some() {
            return false;
        }
        f += step_f;
        r += step_r;
    }
    true
}

/// Rule-based winnability test for king and pawn versus king, in the
/// canonical frame (white strong, pawn on files a-d). Conservative: claims
/// a win only for positions provably winning by elementary theory (rule of
/// the square, key squares), treating everything else as a draw.
#[must_use]
pub(super) fn kpk_is_winning(
    pawn: Square,
    strong_king: Square,
    weak_king: Square,
    strong_to_move: bool,
) -> bool {
    let queening = Square::make(pawn.file(), 7);

    // Rook pawn: the defender draws by reaching the corner.
    if pawn.file() == 0 {
        let corner = Square::make(0, 7);
        if weak_king.distance(corner) <= 1 {
            return false;
        }
        // Defender in front of the pawn on the a- or b-file holds as well.
        if weak_king.file() <= 1 && weak_king.rank() > pawn.rank() {
            return false;
        }
    }

    // Rule of the square: the pawn outruns the defending king.
    let steps_to_queen = (7 - pawn.rank()) - u8::from(pawn.rank() == 1);
    let defender_steps = weak_king
        .distance(queening)
        .saturating_sub(u8::from(!strong_to_move));
    let own_king_clear = strong_king.file() != pawn.file() || strong_king.rank() <= pawn.rank();
    if defender_steps > steps_to_queen && own_king_clear && weak_king.distance(pawn) > 1 {
        return true;
    }

    // Key squares: a strong king established on one wins regardless of the
    // move, except for the rook-pawn cases excluded above.
    if pawn.file() != 0 {
        let key_ranks: &[u8] = if pawn.rank() <= 3 {
            &[pawn.rank() + 2]
        } else {
            &[pawn.rank() + 1, (pawn.rank() + 2).min(7)]
        };
        for &kr in key_ranks {
            for kf in pawn.file().saturating_sub(1)..=(pawn.file() + 1).min(7) {
                let key = Square::make(kf, kr);
                if strong_king == key && weak_king.distance(pawn) > 1 {
                    return true;
                }
            }
        }
    }

    false
}
