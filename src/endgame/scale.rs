//! Scale-factor endgame strategies.
//!
//! These do not replace evaluation; they return a 0-64 multiplier that
//! dampens the score of drawish material imbalances, or `ScaleFactor::NONE`
//! when the strategy has no opinion and the cached fallback factor applies.

use super::common::{bishop_attacks, kpk_is_winning, normalize, pawn_push, shift};
use super::ScaleCode;
use crate::position::Position;
use crate::types::{opposite_colors, Color, Piece, ScaleFactor, Square};

/// Dispatch a scale strategy registered for `strong`.
#[must_use]
pub(super) fn scale(code: ScaleCode, strong: Color, pos: &Position) -> ScaleFactor {
    match code {
        ScaleCode::KBPsK => kbpsk(pos, strong),
        ScaleCode::KQKRPs => kqkrps(pos, strong),
        ScaleCode::KRPKR => krpkr(pos, strong),
        ScaleCode::KRPKB => krpkb(pos, strong),
        ScaleCode::KRPPKRP => krppkrp(pos, strong),
        ScaleCode::KPsK => kpsk(pos, strong),
        ScaleCode::KBPKB => kbpkb(pos, strong),
        ScaleCode::KBPPKB => kbppkb(pos, strong),
        ScaleCode::KBPKN => kbpkn(pos, strong),
        ScaleCode::KPKP => kpkp(pos, strong),
    }
}

/// True if every pawn of `color` stands on the given file.
fn all_pawns_on_file(pos: &Position, color: Color, file: u8) -> bool {
    pos.squares(color, Piece::Pawn).all(|p| p.file() == file)
}

/// King, bishop, and pawns versus king: wrong-colored bishop with rook
/// pawns is a fortress draw when the defender reaches the corner.
fn kbpsk(pos: &Position, strong: Color) -> ScaleFactor {
    let weak = strong.opponent();
    for file in [0u8, 7u8] {
        if all_pawns_on_file(pos, strong, file) {
            let queening = {
                let q = Square::make(file, 7);
                if strong == Color::White {
                    q
                } else {
                    q.flip_rank()
                }
            };
            let bishop = pos.square_of(strong, Piece::Bishop);
            if opposite_colors(queening, bishop) && pos.king(weak).distance(queening) <= 1 {
                return ScaleFactor::DRAW;
            }
        }
    }
    ScaleFactor::NONE
}

/// Queen versus rook and pawns: a third-rank rook shielded by a pawn next
/// to its king is a fortress.
fn kqkrps(pos: &Position, strong: Color) -> ScaleFactor {
    let weak = strong.opponent();
    let weak_king = pos.king(weak);
    let rook = pos.square_of(weak, Piece::Rook);

    // A pawn that touches its king and defends the rook from one rank
    // behind completes the fortress.
    let pawn_shield = pos.squares(weak, Piece::Pawn).any(|p| {
        p.distance(weak_king) == 1
            && p.file().abs_diff(rook.file()) == 1
            && p.relative_rank(weak) + 1 == rook.relative_rank(weak)
    });

    if weak_king.relative_rank(weak) <= 1
        && pos.king(strong).relative_rank(weak) >= 3
        && rook.relative_rank(weak) == 2
        && pawn_shield
    {
        return ScaleFactor::DRAW;
    }
    ScaleFactor::NONE
}

/// Rook and pawn versus rook: third-rank defense, back-rank checks, the
/// a7/a8 fortress, and blockaded pawns with a distant attacking king.
fn krpkr(pos: &Position, strong: Color) -> ScaleFactor {
    let weak = strong.opponent();
    let wk = normalize(pos, strong, pos.king(strong));
    let bk = normalize(pos, strong, pos.king(weak));
    let wr = normalize(pos, strong, pos.square_of(strong, Piece::Rook));
    let br = normalize(pos, strong, pos.square_of(weak, Piece::Rook));
    let pawn = normalize(pos, strong, pos.square_of(strong, Piece::Pawn));

    let f = pawn.file();
    let r = pawn.rank();
    let queening = Square::make(f, 7);
    let tempo = u8::from(pos.side_to_move() == strong);

    // Third-rank defense: defending king in front of a not-too-advanced
    // pawn, rook on the sixth rank fencing the attacking king out.
    if r <= 4
        && bk.distance(queening) <= 1
        && wk.rank() <= 4
        && (br.rank() == 5 || (r <= 2 && wr.rank() != 5))
    {
        return ScaleFactor::DRAW;
    }

    // Checks from behind once the pawn reaches the sixth rank.
    if r == 5
        && bk.distance(queening) <= 1
        && wk.rank() + tempo <= 5
        && (br.rank() == 0 || (tempo == 0 && br.file().abs_diff(f) >= 3))
    {
        return ScaleFactor::DRAW;
    }

    if r >= 5 && bk == queening && br.rank() == 0 && (tempo == 0 || wk.distance(pawn) >= 2) {
        return ScaleFactor::DRAW;
    }

    // Pawn on a7, rook on a8: the defender holds from g7/h7 with the rook
    // behind the pawn.
    if pawn == Square::make(0, 6)
        && wr == Square::make(0, 7)
        && (bk == Square::make(7, 6) || bk == Square::make(6, 6))
        && br.file() == 0
        && (br.rank() <= 2 || wk.file() >= 3 || wk.rank() <= 4)
    {
        return ScaleFactor::DRAW;
    }

    // Defending king blockades the pawn and the attacking king is cut off.
    if r <= 4
        && bk == shift(pawn, 8)
        && wk.distance(pawn).saturating_sub(tempo) >= 2
        && wk.distance(br).saturating_sub(tempo) >= 2
    {
        return ScaleFactor::DRAW;
    }

    let tempo = i32::from(tempo);
    let wk_q = i32::from(wk.distance(queening));
    let bk_q = i32::from(bk.distance(queening));
    let bk_wr = i32::from(bk.distance(wr));

    // Pawn on the seventh, rook behind it, attacking king closest to the
    // queening square: usually winning.
    if r == 6 && f != 0 && wr.file() == f && wr != queening && wk_q < bk_q - 2 + tempo
        && wk_q < bk_wr + tempo
    {
        return ScaleFactor((ScaleFactor::MAX.0 as i32 - 2 * wk_q) as u32);
    }

    // The same idea with the pawn further back.
    let block = shift(pawn, 8);
    let wk_b = i32::from(wk.distance(block));
    let bk_b = i32::from(bk.distance(block));
    if f != 0
        && wr.file() == f
        && wr.0 < pawn.0
        && wk_q < bk_q - 2 + tempo
        && wk_b < bk_b - 2 + tempo
        && (bk_wr + tempo >= 3 || (wk_q < bk_wr + tempo && wk_b < bk_wr + tempo))
    {
        return ScaleFactor(
            (ScaleFactor::MAX.0 as i32
                - 8 * i32::from(pawn.distance(queening))
                - 2 * wk_q) as u32,
        );
    }

    // Defending king somewhere in the pawn's path.
    if r <= 3 && bk.0 > pawn.0 {
        if bk.file() == f {
            return ScaleFactor(10);
        }
        if bk.file().abs_diff(f) == 1 && wk.distance(bk) > 2 {
            return ScaleFactor(24 - 2 * u32::from(wk.distance(bk)));
        }
    }

    ScaleFactor::NONE
}

/// Rook and pawn versus bishop: rook-pawn fortresses.
fn krpkb(pos: &Position, strong: Color) -> ScaleFactor {
    let weak = strong.opponent();
    let pawn = pos.square_of(strong, Piece::Pawn);

    if pawn.file() != 0 && pawn.file() != 7 {
        return ScaleFactor::NONE;
    }

    let king = pos.king(weak);
    let bishop = pos.square_of(weak, Piece::Bishop);
    let r = pawn.relative_rank(strong);
    let push = pawn_push(strong);

    // Pawn on the fifth rank, bishop on the pawn's square color: fortress
    // chances, strong when the defending king covers the corner.
    if r == 4 && !opposite_colors(bishop, pawn) {
        let d = shift(pawn, 3 * push).distance(king);
        return if d <= 2 && !(d == 0 && king == shift(pos.king(strong), 2 * push)) {
            ScaleFactor(24)
        } else {
            ScaleFactor(48)
        };
    }

    // Pawn on the sixth rank, defender's bishop eyeing the square in front
    // of it from a distance with the king near the queening corner.
    if r == 5
        && shift(pawn, 2 * push).distance(king) <= 1
        && bishop_attacks(pos, bishop, shift(pawn, push))
        && bishop.file().abs_diff(pawn.file()) >= 2
    {
        return ScaleFactor(8);
    }

    ScaleFactor::NONE
}

/// Rook and two pawns versus rook and pawn: without a passed pawn, the
/// defending king in front of the pawns holds.
fn krppkrp(pos: &Position, strong: Color) -> ScaleFactor {
    let mut pawns = pos.squares(strong, Piece::Pawn);
    let (p1, p2) = match (pawns.next(), pawns.next()) {
        (Some(a), Some(b)) => (a, b),
        _ => return ScaleFactor::NONE,
    };

    if pos.pawn_passed(strong, p1) || pos.pawn_passed(strong, p2) {
        return ScaleFactor::NONE;
    }

    let bk = pos.king(strong.opponent());
    let r = p1.relative_rank(strong).max(p2.relative_rank(strong));

    if bk.file().abs_diff(p1.file()) <= 1
        && bk.file().abs_diff(p2.file()) <= 1
        && bk.relative_rank(strong) > r
    {
        debug_assert!(r > 0 && r < 6);
        return ScaleFactor(7 * u32::from(r));
    }
    ScaleFactor::NONE
}

/// King and pawns versus bare king: rook-file pawns with the defender in
/// the corner are dead drawn.
fn kpsk(pos: &Position, strong: Color) -> ScaleFactor {
    let weak = strong.opponent();
    for file in [0u8, 7u8] {
        if all_pawns_on_file(pos, strong, file) {
            let queening = {
                let q = Square::make(file, 7);
                if strong == Color::White {
                    q
                } else {
                    q.flip_rank()
                }
            };
            if pos.king(weak).distance(queening) <= 1 {
                return ScaleFactor::DRAW;
            }
        }
    }
    ScaleFactor::NONE
}

/// Bishop and pawn versus bishop: opposite-colored bishops are drawn, and
/// so is a defending king blockading the pawn out of the bishop's reach.
fn kbpkb(pos: &Position, strong: Color) -> ScaleFactor {
    let weak = strong.opponent();
    let pawn = pos.square_of(strong, Piece::Pawn);
    let strong_bishop = pos.square_of(strong, Piece::Bishop);
    let weak_bishop = pos.square_of(weak, Piece::Bishop);
    let weak_king = pos.king(weak);

    // Defending king blocks the pawn and cannot be driven away.
    if weak_king.file() == pawn.file()
        && pawn.relative_rank(strong) < weak_king.relative_rank(strong)
        && (opposite_colors(weak_king, strong_bishop)
            || weak_king.relative_rank(strong) <= 5)
    {
        return ScaleFactor::DRAW;
    }

    // Opposite-colored bishops.
    if opposite_colors(strong_bishop, weak_bishop) {
        return ScaleFactor::DRAW;
    }

    ScaleFactor::NONE
}

/// Bishop and two pawns versus bishop with opposite-colored bishops:
/// blockades in front of the pawns hold.
fn kbppkb(pos: &Position, strong: Color) -> ScaleFactor {
    let weak = strong.opponent();
    let strong_bishop = pos.square_of(strong, Piece::Bishop);
    let weak_bishop = pos.square_of(weak, Piece::Bishop);

    if !opposite_colors(strong_bishop, weak_bishop) {
        return ScaleFactor::NONE;
    }

    let weak_king = pos.king(weak);
    let mut pawns = pos.squares(strong, Piece::Pawn);
    let (psq1, psq2) = match (pawns.next(), pawns.next()) {
        (Some(a), Some(b)) => (a, b),
        _ => return ScaleFactor::NONE,
    };
    let push = pawn_push(strong);

    // block1 sits in front of the more advanced pawn, block2 alongside it
    // on the other pawn's file.
    let (block1, block2) = if psq1.relative_rank(strong) > psq2.relative_rank(strong) {
        (shift(psq1, push), Square::make(psq2.file(), psq1.rank()))
    } else {
        (shift(psq2, push), Square::make(psq1.file(), psq2.rank()))
    };

    match psq1.file().abs_diff(psq2.file()) {
        0 => {
            // Doubled pawns: king in front on the bishop's missing color.
            if weak_king.file() == block1.file()
                && weak_king.relative_rank(strong) >= block1.relative_rank(strong)
                && opposite_colors(weak_king, strong_bishop)
            {
                ScaleFactor::DRAW
            } else {
                ScaleFactor::NONE
            }
        }
        1 => {
            // Pawns on adjacent files.
            if weak_king == block1
                && opposite_colors(weak_king, strong_bishop)
                && (weak_bishop == block2
                    || bishop_attacks(pos, weak_bishop, block2)
                    || psq1.rank().abs_diff(psq2.rank()) >= 2)
            {
                ScaleFactor::DRAW
            } else if weak_king == block2
                && opposite_colors(weak_king, strong_bishop)
                && (weak_bishop == block1 || bishop_attacks(pos, weak_bishop, block1))
            {
                ScaleFactor::DRAW
            } else {
                ScaleFactor::NONE
            }
        }
        _ => ScaleFactor::NONE,
    }
}

/// Bishop and pawn versus knight: a defending king in front of the pawn on
/// the wrong-colored square is a draw.
fn kbpkn(pos: &Position, strong: Color) -> ScaleFactor {
    let weak = strong.opponent();
    let pawn = pos.square_of(strong, Piece::Pawn);
    let strong_bishop = pos.square_of(strong, Piece::Bishop);
    let weak_king = pos.king(weak);

    if weak_king.file() == pawn.file()
        && pawn.relative_rank(strong) < weak_king.relative_rank(strong)
        && (opposite_colors(weak_king, strong_bishop)
            || weak_king.relative_rank(strong) <= 5)
    {
        return ScaleFactor::DRAW;
    }
    ScaleFactor::NONE
}

/// Pawn versus pawn: if the strong side could not even win the position
/// with the defending pawn removed, it is a draw.
fn kpkp(pos: &Position, strong: Color) -> ScaleFactor {
    let weak = strong.opponent();
    let pawn = normalize(pos, strong, pos.square_of(strong, Piece::Pawn));
    let wk = normalize(pos, strong, pos.king(strong));
    let bk = normalize(pos, strong, pos.king(weak));

    // A pawn beyond the fourth rank off the rook file is too dangerous to
    // write off as a draw.
    if pawn.rank() >= 4 && pawn.file() != 0 {
        return ScaleFactor::NONE;
    }

    if kpk_is_winning(pawn, wk, bk, pos.side_to_move() == strong) {
        ScaleFactor::NONE
    } else {
        ScaleFactor::DRAW
    }
}
