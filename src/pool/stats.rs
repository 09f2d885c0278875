//! Statistics snapshot for the fixed pool

/// Point-in-time statistics for a [`FixedPool`](super::FixedPool)
///
/// Counters are plain integers; the pool is single-threaded by contract,
/// so no atomic bookkeeping is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Total number of slots in the pool
    pub capacity: usize,
    /// Slots currently free
    pub available_blocks: usize,
    /// Slots currently reserved
    pub reserved_blocks: usize,
    /// Total successful allocations since construction
    pub total_allocs: u64,
    /// Total successful deallocations since construction
    pub total_deallocs: u64,
    /// Highest number of simultaneously reserved slots observed
    pub peak_reserved: usize,
}
