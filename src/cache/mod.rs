//! Process-local cache for Graph API reads
//!
//! Provides an in-memory, cache-aside [`TtlCache`] with per-operation expiry
//! and tag-based invalidation through a shared [`TagLedger`]. Time comes from
//! an injected [`Clock`] so tests can move it by hand.

mod clock;
mod memory;
mod tags;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::{CachePolicy, CacheStats, TtlCache};
pub use tags::{CacheTag, TagLedger};
