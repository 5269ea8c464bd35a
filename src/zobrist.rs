//! Zobrist keys for material signatures.
//!
//! A material signature hashes only piece counts, not placement: for each
//! color and piece type, the keys for count indices `0..count` are XORed
//! together. Adding or removing one piece of a type toggles exactly one key,
//! so the board representation can maintain the signature incrementally.

use once_cell::sync::Lazy;
use rand::prelude::*;

use crate::types::{Color, Piece};

/// Maximum number of any single piece type per side we key for
/// (8 pawns plus promotion headroom).
pub const MAX_PIECE_COUNT: usize = 10;

pub(crate) struct MaterialKeys {
    // keys[color][piece_type][count_index]
    keys: [[[u64; MAX_PIECE_COUNT]; 6]; 2],
}

impl MaterialKeys {
    fn new() -> Self {
        // Fixed seed for reproducible signatures across runs.
        let mut rng = StdRng::seed_from_u64(0x9E37_79B9_7F4A_7C15);
        let mut keys = [[[0u64; MAX_PIECE_COUNT]; 6]; 2];

        for color in &mut keys {
            for piece in color.iter_mut() {
                for key in piece.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        MaterialKeys { keys }
    }

    /// Key toggled when the count of `piece` for `color` crosses
    /// `count_index` -> `count_index + 1`.
    #[inline]
    pub(crate) fn key(&self, color: Color, piece: Piece, count_index: usize) -> u64 {
        self.keys[color.index()][piece.index()][count_index]
    }
}

pub(crate) static MATERIAL_KEYS: Lazy<MaterialKeys> = Lazy::new(MaterialKeys::new);

/// Compute a material signature from per-color, per-type piece counts.
/// `counts[color][piece]` uses the `Color`/`Piece` index order.
#[must_use]
pub fn material_signature(counts: &[[u8; 6]; 2]) -> u64 {
    let mut sig = 0u64;
    for color in [Color::White, Color::Black] {
        for piece in Piece::ALL {
            let n = counts[color.index()][piece.index()] as usize;
            for i in 0..n.min(MAX_PIECE_COUNT) {
                sig ^= MATERIAL_KEYS.key(color, piece, i);
            }
        }
    }
    sig
}
