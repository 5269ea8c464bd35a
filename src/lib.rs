//! Evaluation caching and endgame dispatch for a chess engine.
//!
//! The crate provides the table side of an engine: a signature-keyed
//! generic cache ([`sigtable::SignatureTable`]), a material cache with
//! imbalance evaluation and endgame dispatch ([`material::MaterialCache`]),
//! a registry of specialized endgame evaluators ([`endgame::EndgameRegistry`]),
//! and a lock-free shared transposition table ([`tt::TranspositionTable`]).
//! [`context::EngineContext`] bundles the shared pieces for a search session.

pub mod context;
pub mod endgame;
pub mod material;
pub mod position;
pub mod sigtable;
pub mod tt;
pub mod types;
pub mod zobrist;

pub use context::{ConfigError, EngineContext};
pub use endgame::EndgameRegistry;
pub use material::MaterialCache;
pub use position::Position;
pub use tt::TranspositionTable;
pub use types::{Bound, Color, Depth, Move, Piece, ScaleFactor, Square, Value};
