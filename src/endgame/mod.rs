//! Specialized endgame evaluation and scaling strategies.
//!
//! A closed set of material configurations gets exact, theory-based
//! treatment instead of generic scoring: value strategies replace the whole
//! evaluation (KPK needs to know the theoretical result, not a heuristic
//! guess), scale strategies return a 0-64 multiplier dampening drawish
//! imbalances. The registry maps material signatures to strategies, is
//! populated once at startup, and is read-only afterwards, so concurrent
//! probes from search workers need no synchronization.
//!
//! Some configurations cannot be keyed by a single signature because their
//! pawn counts vary (KBPsK, KQKRPs, KPsK, KPKP) or because any winning
//! material qualifies (KXK); the material cache matches those structurally
//! and builds the strategy values directly.

mod common;
mod scale;
mod value;

use std::collections::HashMap;

use crate::position::Position;
use crate::types::{Color, ScaleFactor, Value};

/// Configurations with an exact-value evaluation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ValueCode {
    /// Any mating material versus a lone king.
    KXK,
    KPK,
    KBNK,
    KNNK,
    KNNKP,
    KRKP,
    KRKB,
    KRKN,
    KQKP,
    KQKR,
}

/// Configurations with a scale-factor strategy.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScaleCode {
    KBPsK,
    KQKRPs,
    KRPKR,
    KRPKB,
    KRPPKRP,
    KPsK,
    KBPKB,
    KBPPKB,
    KBPKN,
    KPKP,
}

/// An exact-value strategy bound to its strong side. Stateless and `Copy`;
/// safe to invoke concurrently.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EndgameValue {
    code: ValueCode,
    strong_side: Color,
}

impl EndgameValue {
    #[must_use]
    pub fn new(code: ValueCode, strong_side: Color) -> Self {
        EndgameValue { code, strong_side }
    }

    #[must_use]
    pub fn code(&self) -> ValueCode {
        self.code
    }

    #[must_use]
    pub fn strong_side(&self) -> Color {
        self.strong_side
    }

    /// Evaluate the position, from the side-to-move's perspective. The
    /// caller must have verified the material configuration matches
    /// `code()`; the result is unspecified otherwise.
    #[must_use]
    pub fn apply(&self, pos: &Position) -> Value {
        value::evaluate(self.code, self.strong_side, pos)
    }
}

/// A scale-factor strategy bound to its strong side.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EndgameScale {
    code: ScaleCode,
    strong_side: Color,
}

impl EndgameScale {
    #[must_use]
    pub fn new(code: ScaleCode, strong_side: Color) -> Self {
        EndgameScale { code, strong_side }
    }

    #[must_use]
    pub fn code(&self) -> ScaleCode {
        self.code
    }

    #[must_use]
    pub fn strong_side(&self) -> Color {
        self.strong_side
    }

    /// Compute the scale factor, or `ScaleFactor::NONE` when the strategy
    /// has no opinion on this particular position.
    #[must_use]
    pub fn apply(&self, pos: &Position) -> ScaleFactor {
        scale::scale(self.code, self.strong_side, pos)
    }
}

/// Signature-keyed maps from material configuration to strategy, one per
/// strategy family. Built once, immutable afterwards.
pub struct EndgameRegistry {
    value_map: HashMap<u64, EndgameValue>,
    scale_map: HashMap<u64, EndgameScale>,
}

/// Value-family codes registered by signature.
const KEYED_VALUE_CODES: &[(&str, ValueCode)] = &[
    ("KPK", ValueCode::KPK),
    ("KNNK", ValueCode::KNNK),
    ("KBNK", ValueCode::KBNK),
    ("KRKP", ValueCode::KRKP),
    ("KRKB", ValueCode::KRKB),
    ("KRKN", ValueCode::KRKN),
    ("KQKP", ValueCode::KQKP),
    ("KQKR", ValueCode::KQKR),
    ("KNNKP", ValueCode::KNNKP),
];

/// Scale-family codes registered by signature.
const KEYED_SCALE_CODES: &[(&str, ScaleCode)] = &[
    ("KRPKR", ScaleCode::KRPKR),
    ("KRPKB", ScaleCode::KRPKB),
    ("KRPPKRP", ScaleCode::KRPPKRP),
    ("KBPKB", ScaleCode::KBPKB),
    ("KBPPKB", ScaleCode::KBPPKB),
    ("KBPKN", ScaleCode::KBPKN),
];

impl EndgameRegistry {
    /// Register every keyed configuration for both colors as the strong
    /// side. The lookup signature is derived by constructing a canonical
    /// position for the code and reading its material signature, the same
    /// computation a real position goes through at probe time.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = EndgameRegistry {
            value_map: HashMap::new(),
            scale_map: HashMap::new(),
        };

        for &(code_str, code) in KEYED_VALUE_CODES {
            for strong in [Color::White, Color::Black] {
                let key = Position::from_code(code_str, strong).material_key();
                let prev = registry
                    .value_map
                    .insert(key, EndgameValue::new(code, strong));
                debug_assert!(prev.is_none(), "duplicate endgame signature for {code_str}");
            }
        }

        for &(code_str, code) in KEYED_SCALE_CODES {
            for strong in [Color::White, Color::Black] {
                let key = Position::from_code(code_str, strong).material_key();
                let prev = registry
                    .scale_map
                    .insert(key, EndgameScale::new(code, strong));
                debug_assert!(prev.is_none(), "duplicate endgame signature for {code_str}");
            }
        }

        #[cfg(feature = "logging")]
        log::debug!(
            "endgame registry: {} value and {} scale strategies",
            registry.value_map.len(),
            registry.scale_map.len()
        );

        registry
    }

    /// Look up a value strategy by material signature.
    #[must_use]
    pub fn probe_value(&self, material_key: u64) -> Option<EndgameValue> {
        self.value_map.get(&material_key).copied()
    }

    /// Look up a scale strategy by material signature.
    #[must_use]
    pub fn probe_scale(&self, material_key: u64) -> Option<EndgameScale> {
        self.scale_map.get(&material_key).copied()
    }
}

impl Default for EndgameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{VALUE_DRAW, VALUE_KNOWN_WIN};

    #[test]
    fn registry_resolves_keyed_codes_for_both_colors() {
        let registry = EndgameRegistry::new();
        for &(code_str, code) in KEYED_VALUE_CODES {
            for strong in [Color::White, Color::Black] {
                let key = Position::from_code(code_str, strong).material_key();
                let strategy = registry
                    .probe_value(key)
                    .unwrap_or_else(|| panic!("missing value strategy for {code_str}"));
                assert_eq!(strategy.code(), code);
                assert_eq!(strategy.strong_side(), strong);
            }
        }
    }

    #[test]
    fn registry_misses_unrelated_signatures() {
        let registry = EndgameRegistry::new();
        // Normal middlegame material is in neither map.
        let key = Position::from_code("KQRRBBNNPPPPPPPPKQRRBBNNPPPPPPPP", Color::White)
            .material_key();
        assert!(registry.probe_value(key).is_none());
        assert!(registry.probe_scale(key).is_none());
    }

    #[test]
    fn value_and_scale_families_are_disjoint() {
        let registry = EndgameRegistry::new();
        let krpkr = Position::from_code("KRPKR", Color::White).material_key();
        assert!(registry.probe_value(krpkr).is_none());
        assert!(registry.probe_scale(krpkr).is_some());

        let kpk = Position::from_code("KPK", Color::White).material_key();
        assert!(registry.probe_value(kpk).is_some());
        assert!(registry.probe_scale(kpk).is_none());
    }

    #[test]
    fn kbnk_drives_king_to_bishop_corner() {
        let registry = EndgameRegistry::new();
        // Dark-squared bishop: a1/h8 are the mating corners.
        let near = Position::from_fen("7k/8/5K2/8/3B4/2N5/8/8 w - - 0 1").expect("valid fen");
        let far = Position::from_fen("k7/8/2K5/8/3B4/2N5/8/8 w - - 0 1").expect("valid fen");
        let strategy = registry
            .probe_value(near.material_key())
            .expect("KBNK registered");

        let near_val = strategy.apply(&near);
        let far_val = strategy.apply(&far);
        assert!(near_val > VALUE_KNOWN_WIN);
        assert!(near_val > far_val, "h8 corner should score above a8");
    }

    #[test]
    fn kqkr_is_winning_for_the_strong_side() {
        let registry = EndgameRegistry::new();
        let pos = Position::from_fen("8/8/8/8/8/1k6/1r6/4K2Q w - - 0 1").expect("valid fen");
        let strategy = registry
            .probe_value(pos.material_key())
            .expect("KQKR registered");
        assert_eq!(strategy.strong_side(), Color::White);
        assert!(strategy.apply(&pos) > 0);

        // Same material, black to move: value flips sign.
        let mut flipped = pos.clone();
        flipped.set_side_to_move(Color::Black);
        assert_eq!(strategy.apply(&flipped), -strategy.apply(&pos));
    }

    #[test]
    fn knnk_is_a_dead_draw() {
        let registry = EndgameRegistry::new();
        let pos = Position::from_fen("8/8/8/8/8/8/1k6/1NN1K3 w - - 0 1").expect("valid fen");
        let strategy = registry
            .probe_value(pos.material_key())
            .expect("KNNK registered");
        assert_eq!(strategy.apply(&pos), VALUE_DRAW);
    }

    #[test]
    fn kpk_clear_win_and_clear_draw() {
        let registry = EndgameRegistry::new();
        // King on a key square two ranks ahead of its pawn: winning.
        let win = Position::from_fen("k7/8/4K3/8/4P3/8/8/8 w - - 0 1").expect("valid fen");
        let strategy = registry
            .probe_value(win.material_key())
            .expect("KPK registered");
        assert!(strategy.apply(&win) > VALUE_KNOWN_WIN);

        // Defender in the corner against a rook pawn: drawn.
        let draw = Position::from_fen("k7/8/K7/P7/8/8/8/8 w - - 0 1").expect("valid fen");
        assert_eq!(strategy.apply(&draw), VALUE_DRAW);
    }

    #[test]
    fn kbpkb_opposite_bishops_scale_to_draw() {
        let registry = EndgameRegistry::new();
        // White: king e3, dark bishop d4, pawn e5. Black: king d7, light
        // bishop b7.
        let pos = Position::from_fen("8/1b1k4/8/4P3/3B4/4K3/8/8 w - - 0 1").expect("valid fen");
        let strategy = registry
            .probe_scale(pos.material_key())
            .expect("KBPKB registered");
        assert_eq!(strategy.code(), ScaleCode::KBPKB);
        assert_eq!(strategy.apply(&pos), ScaleFactor::DRAW);
    }

    #[test]
    fn krpkr_philidor_position_is_drawn() {
        let registry = EndgameRegistry::new();
        // Third-rank defense: black king on e8 in front of the e-pawn,
        // black rook on the (relative) sixth rank, white king behind.
        let pos =
            Position::from_fen("4k3/8/r7/4PK2/8/8/8/4R3 w - - 0 1").expect("valid fen");
        let strategy = registry
            .probe_scale(pos.material_key())
            .expect("KRPKR registered");
        assert_eq!(strategy.apply(&pos), ScaleFactor::DRAW);
    }

    #[test]
    fn strategies_are_small_and_copyable() {
        // MaterialEntry embeds these; keep them register-sized.
        assert!(std::mem::size_of::<Option<EndgameValue>>() <= 4);
        assert!(std::mem::size_of::<Option<EndgameScale>>() <= 4);
    }
}
