//! Fixed-capacity block pool
//!
//! A [`FixedPool`] pre-allocates a fixed number of equally-sized blocks and
//! hands them out one per call. Occupancy lives in a per-slot bitmap, and
//! the most recently freed slot is cached so the common
//! release-then-reserve pattern stays O(1).

mod config;
mod fixed;
mod stats;

pub use config::PoolConfig;
pub use fixed::{FixedPool, MAX_CAPACITY};
pub use stats::PoolStats;
