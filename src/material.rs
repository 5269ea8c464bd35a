//! Material cache: imbalance, game phase, and endgame dispatch.
//!
//! The evaluation hot path probes this cache first. A hit hands back
//! everything material-dependent in one step: the piece-pair imbalance
//! score, the game phase, a specialized endgame evaluation when one exists
//! (in which case generic scoring is skipped entirely), and per-color scale
//! strategies or fallback factors. Entries are keyed by the position's
//! material signature, so all positions sharing a material configuration
//! share one cache line of work.

use crate::endgame::{EndgameRegistry, EndgameScale, EndgameValue, ScaleCode, ValueCode};
use crate::position::Position;
use crate::sigtable::{SignatureEntry, SignatureTable};
use crate::types::{
    Color, Phase, Piece, ScaleFactor, Score, Value, BISHOP_VALUE_MG, PHASE_MIDGAME,
    QUEEN_VALUE_MG, ROOK_VALUE_MG,
};

/// Number of buckets in a per-worker material cache.
pub const MATERIAL_CACHE_SIZE: usize = 8192;

/// Non-pawn material above this counts as a full middlegame.
const MIDGAME_LIMIT: Value = 15258;
/// Non-pawn material below this counts as a pure endgame.
const ENDGAME_LIMIT: Value = 3915;

// Polynomial material imbalance: quadratic interaction weights between our
// piece counts (and bishop pair) and both sides' piece counts. Row/column
// order: bishop pair, pawn, knight, bishop, rook, queen.
#[rustfmt::skip]
const QUADRATIC_OURS: [[i32; 6]; 6] = [
    [1438,    0,    0,    0,    0,    0], // Bishop pair
    [  40,   38,    0,    0,    0,    0], // Pawn
    [  32,  255,  -62,    0,    0,    0], // Knight
    [   0,  104,    4,    0,    0,    0], // Bishop
    [ -26,   -2,   47,  105, -208,    0], // Rook
    [-189,   24,  117,  133, -134,   -6], // Queen
];

#[rustfmt::skip]
const QUADRATIC_THEIRS: [[i32; 6]; 6] = [
    [   0,    0,    0,    0,    0,    0], // Bishop pair
    [  36,    0,    0,    0,    0,    0], // Pawn
    [   9,   63,    0,    0,    0,    0], // Knight
    [  59,   65,   42,    0,    0,    0], // Bishop
    [  46,   39,   24,  -24,    0,    0], // Rook
    [  97,  100,  -42,  137,  268,    0], // Queen
];

/// Everything the evaluation needs to know about one material
/// configuration. Recomputed wholesale on a cache miss, never patched
/// field by field.
#[derive(Clone, Default)]
pub struct MaterialEntry {
    signature: u64,
    score: Score,
    game_phase: i16,
    eval_fn: Option<EndgameValue>,
    scale_fn: [Option<EndgameScale>; 2],
    factor: [u8; 2],
}

impl SignatureEntry for MaterialEntry {
    fn signature(&self) -> u64 {
        self.signature
    }
    fn set_signature(&mut self, sig: u64) {
        self.signature = sig;
    }
}

impl MaterialEntry {
    /// Imbalance score from white's perspective.
    #[must_use]
    pub fn imbalance(&self) -> Score {
        self.score
    }

    #[must_use]
    pub fn game_phase(&self) -> Phase {
        Phase::from(self.game_phase)
    }

    /// True when a specialized evaluation replaces generic scoring for
    /// this material configuration.
    #[must_use]
    pub fn specialized_eval_exists(&self) -> bool {
        self.eval_fn.is_some()
    }

    /// Invoke the specialized evaluation. Valid only when
    /// [`specialized_eval_exists`](Self::specialized_eval_exists) is true
    /// and the position carries this entry's material.
    #[must_use]
    pub fn evaluate(&self, pos: &Position) -> Value {
        debug_assert!(self.eval_fn.is_some());
        self.eval_fn.map_or(0, |f| f.apply(pos))
    }

    /// Scale factor for `color`: a matching scale strategy wins unless it
    /// abstains with `ScaleFactor::NONE`, in which case the cached
    /// fallback factor applies.
    #[must_use]
    pub fn scale_factor(&self, pos: &Position, color: Color) -> ScaleFactor {
        if let Some(f) = self.scale_fn[color.index()] {
            let sf = f.apply(pos);
            if sf != ScaleFactor::NONE {
                return sf;
            }
        }
        ScaleFactor(u32::from(self.factor[color.index()]))
    }
}

/// Per-worker material cache on top of the generic signature table.
pub struct MaterialCache {
    table: SignatureTable<MaterialEntry>,
}

impl MaterialCache {
    #[must_use]
    pub fn new() -> Self {
        MaterialCache {
            table: SignatureTable::new(MATERIAL_CACHE_SIZE),
        }
    }

    /// Look up (or compute and cache) the material entry for `pos`.
    ///
    /// Nothing guarantees the entry survives a later probe: a colliding
    /// signature silently rebuilds the bucket. Callers keep no references
    /// across probes and rely on no residency.
    pub fn probe(&mut self, pos: &Position, endgames: &EndgameRegistry) -> &MaterialEntry {
        let key = pos.material_key();
        let (entry, hit) = self.table.probe(key);
        if !hit {
            compute(entry, pos, endgames);
        }
        entry
    }
}

impl Default for MaterialCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill a freshly reset entry for the position's material configuration.
fn compute(entry: &mut MaterialEntry, pos: &Position, endgames: &EndgameRegistry) {
    entry.factor = [ScaleFactor::NORMAL.0 as u8; 2];

    let npm_w = pos.non_pawn_material(Color::White);
    let npm_b = pos.non_pawn_material(Color::Black);
    let npm = (npm_w + npm_b).clamp(ENDGAME_LIMIT, MIDGAME_LIMIT);
    entry.game_phase =
        (((npm - ENDGAME_LIMIT) * PHASE_MIDGAME) / (MIDGAME_LIMIT - ENDGAME_LIMIT)) as i16;

    // A signature-keyed specialized evaluation replaces everything else.
    if let Some(f) = endgames.probe_value(entry.signature) {
        entry.eval_fn = Some(f);
        return;
    }

    // Any winning material against a bare king evaluates as KXK.
    for color in [Color::White, Color::Black] {
        if is_kxk(pos, color) {
            entry.eval_fn = Some(EndgameValue::new(ValueCode::KXK, color));
            return;
        }
    }

    // Signature-keyed scale strategy, bound to its registered strong side.
    if let Some(f) = endgames.probe_scale(entry.signature) {
        entry.scale_fn[f.strong_side().index()] = Some(f);
        return;
    }

    // Structurally matched scale strategies for configurations whose pawn
    // counts vary.
    for color in [Color::White, Color::Black] {
        if is_kbpsk(pos, color) {
            entry.scale_fn[color.index()] =
                Some(EndgameScale::new(ScaleCode::KBPsK, color));
        } else if is_kqkrps(pos, color) {
            entry.scale_fn[color.index()] =
                Some(EndgameScale::new(ScaleCode::KQKRPs, color));
        }
    }

    let pawns_w = pos.count(Color::White, Piece::Pawn);
    let pawns_b = pos.count(Color::Black, Piece::Pawn);

    if npm_w + npm_b == 0 && pawns_w + pawns_b > 0 {
        if pawns_b == 0 {
            entry.scale_fn[Color::White.index()] =
                Some(EndgameScale::new(ScaleCode::KPsK, Color::White));
        } else if pawns_w == 0 {
            entry.scale_fn[Color::Black.index()] =
                Some(EndgameScale::new(ScaleCode::KPsK, Color::Black));
        } else if pawns_w == 1 && pawns_b == 1 {
            entry.scale_fn[Color::White.index()] =
                Some(EndgameScale::new(ScaleCode::KPKP, Color::White));
            entry.scale_fn[Color::Black.index()] =
                Some(EndgameScale::new(ScaleCode::KPKP, Color::Black));
        }
    }

    // Fallback factors: no pawns or a single pawn with no meaningful
    // material edge makes winning hard.
    for (color, my_pawns, my_npm, their_npm) in [
        (Color::White, pawns_w, npm_w, npm_b),
        (Color::Black, pawns_b, npm_b, npm_w),
    ] {
        if my_pawns == 0 && my_npm - their_npm <= BISHOP_VALUE_MG {
            entry.factor[color.index()] = if my_npm < ROOK_VALUE_MG {
                ScaleFactor::DRAW.0 as u8
            } else if their_npm <= BISHOP_VALUE_MG {
                4
            } else {
                14
            };
        } else if my_pawns == 1 && my_npm - their_npm <= BISHOP_VALUE_MG {
            entry.factor[color.index()] = ScaleFactor::ONE_PAWN.0 as u8;
        }
    }

    let counts = piece_counts(pos);
    let v = (imbalance(&counts, Color::White) - imbalance(&counts, Color::Black)) / 16;
    entry.score = Score::new(v, v);
}

/// Piece counts in imbalance-table order, with the bishop pair folded in
/// as a pseudo piece at index 0.
fn piece_counts(pos: &Position) -> [[i32; 6]; 2] {
    let mut counts = [[0; 6]; 2];
    for color in [Color::White, Color::Black] {
        let c = color.index();
        counts[c][0] = i32::from(pos.count(color, Piece::Bishop) > 1);
        counts[c][1] = i32::from(pos.count(color, Piece::Pawn));
        counts[c][2] = i32::from(pos.count(color, Piece::Knight));
        counts[c][3] = i32::from(pos.count(color, Piece::Bishop));
        counts[c][4] = i32::from(pos.count(color, Piece::Rook));
        counts[c][5] = i32::from(pos.count(color, Piece::Queen));
    }
    counts
}

/// Quadratic imbalance bonus for one side.
fn imbalance(counts: &[[i32; 6]; 2], us: Color) -> i32 {
    let them = us.opponent();
    let mut bonus = 0;
    for pt1 in 0..6 {
        if counts[us.index()][pt1] == 0 {
            continue;
        }
        let mut v = 0;
        for pt2 in 0..=pt1 {
            v += QUADRATIC_OURS[pt1][pt2] * counts[us.index()][pt2]
                + QUADRATIC_THEIRS[pt1][pt2] * counts[them.index()][pt2];
        }
        bonus += counts[us.index()][pt1] * v;
    }
    bonus
}

/// Winning material against a bare king.
fn is_kxk(pos: &Position, strong: Color) -> bool {
    let weak = strong.opponent();
    let weak_pieces: u8 = Piece::ALL
        .iter()
        .map(|&p| pos.count(weak, p))
        .sum();
    weak_pieces == 1 && pos.non_pawn_material(strong) >= ROOK_VALUE_MG
}

/// Lone bishop with pawns versus anything pawnless.
fn is_kbpsk(pos: &Position, strong: Color) -> bool {
    pos.non_pawn_material(strong) == BISHOP_VALUE_MG
        && pos.count(strong, Piece::Bishop) == 1
        && pos.count(strong, Piece::Pawn) >= 1
}

/// Lone queen versus rook and pawns.
fn is_kqkrps(pos: &Position, strong: Color) -> bool {
    let weak = strong.opponent();
    pos.count(strong, Piece::Pawn) == 0
        && pos.non_pawn_material(strong) == QUEEN_VALUE_MG
        && pos.count(strong, Piece::Queen) == 1
        && pos.count(weak, Piece::Rook) == 1
        && pos.count(weak, Piece::Pawn) >= 1
}
