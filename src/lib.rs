//! Fixed-capacity single-slot pool allocation
//!
//! This crate provides [`FixedPool`], a pool of N equally-sized memory
//! blocks handed out one at a time. Occupancy is tracked by a bitmap sized
//! to the requested capacity, the most recently freed slot is cached for
//! O(1) reuse, and a block can be released by address alone. It is meant as
//! a drop-in allocator for a single value type inside a larger program,
//! avoiding general-purpose heap traffic for short-lived, uniformly-sized
//! objects.
//!
//! The pool is deliberately narrow: it is not a general-purpose heap, it is
//! not thread-safe (wrap it in your own lock if you need that), it cannot be
//! resized, and it never services more than one block per call.
//!
//! # Features
//!
//! - `logging` (default): emits `tracing` events for pool lifecycle and
//!   per-block reserve/release operations
//!
//! # Example
//!
//! ```
//! use slotpool::FixedPool;
//!
//! let mut pool = FixedPool::<f64>::new(16)?;
//! assert_eq!(pool.available_count(), 16);
//!
//! let block = pool.allocate()?;
//! unsafe { pool.construct_value(block, 777.7) };
//! assert_eq!(unsafe { block.as_ptr().read() }, 777.7);
//! assert_eq!(pool.available_count(), 15);
//!
//! unsafe { pool.deallocate(block) }?;
//! assert_eq!(pool.available_count(), 16);
//! # Ok::<(), slotpool::PoolError>(())
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod pool;
pub mod utils;

pub use error::{PoolError, PoolResult};
pub use pool::{FixedPool, MAX_CAPACITY, PoolConfig, PoolStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
