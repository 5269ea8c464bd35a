//! Exact-value endgame evaluations.
//!
//! Each function fully replaces generic evaluation for its material
//! configuration and returns a value from the side-to-move's perspective.
//! Callers must already have verified the material match through the
//! registry or the material cache; the functions assume it.

use super::common::{
    kpk_is_winning, normalize, push_away, push_close, push_to_corner, push_to_edge, shift,
};
use super::ValueCode;
use crate::position::Position;
use crate::types::{
    opposite_colors, Color, Piece, Square, Value, PAWN_VALUE_EG, QUEEN_VALUE_EG, ROOK_VALUE_EG,
    VALUE_DRAW, VALUE_KNOWN_WIN, VALUE_MATE,
};

/// Dispatch a value strategy. `strong` is the side the strategy was
/// registered for.
#[must_use]
pub(super) fn evaluate(code: ValueCode, strong: Color, pos: &Position) -> Value {
    let result = match code {
        ValueCode::KXK => kxk(pos, strong),
        ValueCode::KPK => kpk(pos, strong),
        ValueCode::KBNK => kbnk(pos, strong),
        ValueCode::KNNK => return VALUE_DRAW,
        ValueCode::KNNKP => knnkp(pos, strong),
        ValueCode::KRKP => krkp(pos, strong),
        ValueCode::KRKB => krkb(pos, strong),
        ValueCode::KRKN => krkn(pos, strong),
        ValueCode::KQKP => kqkp(pos, strong),
        ValueCode::KQKR => kqkr(pos, strong),
    };
    if pos.side_to_move() == strong {
        result
    } else {
        -result
    }
}

/// Mate with king and any sufficient material against a lone king: drive
/// the defender to the edge and bring the kings together.
fn kxk(pos: &Position, strong: Color) -> Value {
    let weak = strong.opponent();
    let strong_king = pos.king(strong);
    let weak_king = pos.king(weak);

    let mut result = pos.non_pawn_material(strong)
        + Value::from(pos.count(strong, Piece::Pawn)) * PAWN_VALUE_EG
        + push_to_edge(weak_king)
        + push_close(strong_king, weak_king);

    let bishops_on_both_shades = || {
        let mut dark = false;
        let mut light = false;
        for sq in pos.squares(strong, Piece::Bishop) {
            if sq.is_dark() {
                dark = true;
            } else {
                light = true;
            }
        }
        dark && light
    };

    if pos.count(strong, Piece::Queen) > 0
        || pos.count(strong, Piece::Rook) > 0
        || (pos.count(strong, Piece::Bishop) > 0 && pos.count(strong, Piece::Knight) > 0)
        || bishops_on_both_shades()
    {
        result = (result + VALUE_KNOWN_WIN).min(VALUE_MATE - 1);
    }
    result
}

/// King and pawn versus king, decided by elementary pawn-ending theory.
fn kpk(pos: &Position, strong: Color) -> Value {
    let weak = strong.opponent();
    let pawn = normalize(pos, strong, pos.square_of(strong, Piece::Pawn));
    let strong_king = normalize(pos, strong, pos.king(strong));
    let weak_king = normalize(pos, strong, pos.king(weak));
    let strong_to_move = pos.side_to_move() == strong;

    if !kpk_is_winning(pawn, strong_king, weak_king, strong_to_move) {
        return VALUE_DRAW;
    }
    VALUE_KNOWN_WIN + PAWN_VALUE_EG + Value::from(pawn.rank())
}

/// Mate with king, bishop, and knight: the defender must be driven to a
/// corner of the bishop's color.
fn kbnk(pos: &Position, strong: Color) -> Value {
    let weak = strong.opponent();
    let strong_king = pos.king(strong);
    let weak_king = pos.king(weak);
    let bishop = pos.square_of(strong, Piece::Bishop);

    // push_to_corner measures against the dark corners a1/h8; mirror the
    // defending king when the bishop is light-squared.
    let corner_king = if opposite_colors(bishop, Square::make(0, 0)) {
        weak_king.flip_file()
    } else {
        weak_king
    };

    VALUE_KNOWN_WIN + push_close(strong_king, weak_king) + 420 * push_to_corner(corner_king)
}

/// Two knights cannot force mate, but against a pawn the defender may lose
/// a tempo to it; keep a small pull toward the edge.
fn knnkp(pos: &Position, strong: Color) -> Value {
    let weak = strong.opponent();
    PAWN_VALUE_EG + 2 * push_to_edge(pos.king(weak))
        - 10 * Value::from(pos.square_of(weak, Piece::Pawn).relative_rank(weak))
}

/// Rook versus pawn: won when the strong king is in front of the pawn or
/// the defender is cut off, drawish when the pawn is far advanced with
/// king support.
fn krkp(pos: &Position, strong: Color) -> Value {
    let weak = strong.opponent();
    // Work in a frame where the strong side plays "up": the defending pawn
    // then runs toward rank 1.
    let rel = |sq: Square| {
        if strong == Color::White {
            sq
        } else {
            sq.flip_rank()
        }
    };
    let wk = rel(pos.king(strong));
    let bk = rel(pos.king(weak));
    let rook = rel(pos.square_of(strong, Piece::Rook));
    let pawn = rel(pos.square_of(weak, Piece::Pawn));
    let queening = Square::make(pawn.file(), 0);

    if wk.file() == pawn.file() && wk.rank() < pawn.rank() {
        // Strong king stands between the pawn and its queening square.
        ROOK_VALUE_EG - Value::from(wk.distance(pawn))
    } else if bk.distance(pawn) >= 3 + u8::from(pos.side_to_move() == weak)
        && bk.distance(rook) >= 3
    {
        // Defending king too far from both pawn and rook.
        ROOK_VALUE_EG - Value::from(wk.distance(pawn))
    } else if bk.rank() <= 2
        && bk.distance(pawn) == 1
        && wk.rank() >= 3
        && wk.distance(pawn) > 2 + u8::from(pos.side_to_move() == strong)
    {
        // Far-advanced pawn escorted by its king: drawish.
        80 - 8 * Value::from(wk.distance(pawn))
    } else {
        200 - 8
            * (Value::from(wk.distance(shift(pawn, -8)))
                - Value::from(bk.distance(shift(pawn, -8)))
                - Value::from(pawn.distance(queening)))
    }
}

/// Rook versus bishop: drawish, but the defender must avoid the edge.
fn krkb(pos: &Position, strong: Color) -> Value {
    push_to_edge(pos.king(strong.opponent()))
}

/// Rook versus knight: the knight must stay close to its king.
fn krkn(pos: &Position, strong: Color) -> Value {
    let weak = strong.opponent();
    let weak_king = pos.king(weak);
    let knight = pos.square_of(weak, Piece::Knight);
    push_to_edge(weak_king) + push_away(weak_king, knight)
}

/// Queen versus pawn: won unless the pawn is on the seventh rank on a
/// bishop or rook file with its king beside it.
fn kqkp(pos: &Position, strong: Color) -> Value {
    let weak = strong.opponent();
    let strong_king = pos.king(strong);
    let weak_king = pos.king(weak);
    let pawn = pos.square_of(weak, Piece::Pawn);

    let mut result = push_close(strong_king, weak_king);

    let drawish_file = matches!(pawn.file(), 0 | 2 | 5 | 7);
    if pawn.relative_rank(weak) != 6 || weak_king.distance(pawn) != 1 || !drawish_file {
        result += QUEEN_VALUE_EG - PAWN_VALUE_EG;
    }
    result
}

/// Queen versus rook: a win, faster when the defender is cornered.
fn kqkr(pos: &Position, strong: Color) -> Value {
    let weak = strong.opponent();
    let strong_king = pos.king(strong);
    let weak_king = pos.king(weak);
    QUEEN_VALUE_EG - ROOK_VALUE_EG + push_to_edge(weak_king) + push_close(strong_king, weak_king)
}
