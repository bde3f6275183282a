//! Error types surfaced by engine construction.
//!
//! Search itself never fails (see `SearchError` docs on why): state-space
//! exhaustion, a reached generation budget, or the horizon being hit without
//! a goal are all *normal* non-success outcomes, reported through the
//! engines' `bool` return value rather than this type.

use thiserror::Error;

/// Fatal errors that can only occur at engine construction time.
///
/// Once an engine is constructed without error, `search` cannot fail: the
/// only outcomes are success, or a normal non-success (exhaustion, budget,
/// horizon), which is reported through the engine's return value rather than
/// `Result`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    /// `novelty_levels` must be exactly 2 or 3 when explicitly configured;
    /// `-1` (auto) is handled separately and never reaches this error.
    #[error("unsupported novelty levels: {0} (must be 2 or 3)")]
    UnsupportedNoveltyLevels(i32),

    /// IW's queue-swapping implementation only generalizes to width 1 or 2.
    #[error("unsupported max width: {0} (must be 1 or 2)")]
    UnsupportedMaxWidth(u32),
}
