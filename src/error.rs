//! Error types for pool operations
//!
//! Every failure is reported synchronously to the immediate caller; the
//! pool never logs, retries, or swallows an error internally, and no error
//! leaves the pool's bookkeeping half-applied.

use thiserror::Error;

/// Result type for pool operations
pub type PoolResult<T> = core::result::Result<T, PoolError>;

/// Pool operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The backing buffer could not be obtained at construction. Fatal to
    /// the pool instance; no partial pool exists.
    #[error("backing storage of {requested} bytes could not be allocated")]
    OutOfMemory {
        /// Total buffer size that was requested, in bytes
        requested: usize,
    },

    /// The requested capacity exceeds the tracking-structure ceiling.
    /// Fatal to construction.
    #[error("requested capacity {requested} exceeds the supported maximum of {max}")]
    CapacityExceeded {
        /// Capacity passed to the constructor
        requested: usize,
        /// The enforced ceiling
        max: usize,
    },

    /// `allocate` was called with no free slot remaining. Recoverable:
    /// retry after releasing a block.
    #[error("pool exhausted: all {capacity} blocks are reserved")]
    Exhausted {
        /// Total slot count of the pool
        capacity: usize,
    },

    /// A multi-block allocation was requested. Recoverable: request blocks
    /// one at a time.
    #[error("allocation of {count} blocks in one call is not supported")]
    Unsupported {
        /// Number of blocks that was requested
        count: usize,
    },

    /// `deallocate` was called with an address not currently tracked as a
    /// reserved block: out of bounds, not on a slot boundary, or already
    /// free. Signals caller misuse; pool state is unchanged.
    #[error("address is not a reserved block of this pool")]
    InvalidAddress,

    /// The free-slot scan found nothing despite the available counter being
    /// positive. Indicates a bookkeeping bug; treat as non-recoverable.
    #[error("free-block scan found no slot while {available} blocks were recorded available")]
    InternalInconsistency {
        /// Value of the available counter at the time of the failed scan
        available: usize,
    },
}

impl PoolError {
    /// Checks if this is an exhaustion error
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Checks if this is an invalid-address error
    pub fn is_invalid_address(&self) -> bool {
        matches!(self, Self::InvalidAddress)
    }

    /// Checks whether the caller can sensibly retry after this error.
    ///
    /// Exhaustion and unsupported block counts are usage outcomes the
    /// caller can react to; the remaining kinds are fatal to the operation
    /// or to the pool.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::Unsupported { .. })
    }
}
