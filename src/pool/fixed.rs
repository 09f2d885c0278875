//! The fixed-capacity single-slot pool allocator
//!
//! # Memory layout
//! ```text
//! [Slot0][Slot1][Slot2][Slot3]...[SlotN]
//!    |      |      |      |         |
//!  bit 0  bit 1  bit 2  bit 3 ... bit N   (occupancy bitmap)
//! ```
//!
//! Every slot is `stride` bytes, where `stride` is the element's padded
//! size. A slot's address is `base + index * stride`, and the inverse
//! `(addr - base) / stride` recovers the slot index on release, so no
//! address map is kept.

use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};
use std::alloc::{Layout, alloc, dealloc};

use crate::error::{PoolError, PoolResult};
use crate::pool::{PoolConfig, PoolStats};
use crate::utils::{align_up, is_aligned};

/// Hard ceiling on pool capacity, enforced at construction.
///
/// The occupancy bitmap itself is sized to the requested capacity; this
/// constant only bounds how large that request may be.
pub const MAX_CAPACITY: usize = 65_536;

const BITS_PER_WORD: usize = u64::BITS as usize;

/// Fixed-capacity pool of equally-sized blocks, handed out one at a time.
///
/// The pool owns a single contiguous buffer of `capacity * element_size`
/// bytes, allocated once at construction and never moved or resized.
/// Reserved/free status lives in a per-slot bitmap, and the most recently
/// freed slot index is cached so a release immediately followed by a
/// reserve takes the O(1) fast path instead of the bitmap scan.
///
/// `allocate` returns raw, uninitialized slot memory; pair it with
/// [`construct_value`](Self::construct_value) to place a value, or write
/// through the pointer yourself. [`deallocate`](Self::deallocate) runs the
/// stored value's destructor before releasing the slot.
///
/// Not thread-safe: all mutation goes through `&mut self`, and callers
/// needing concurrent access must provide their own exclusion.
pub struct FixedPool<T> {
    /// Base of the owned buffer; dangling when the pool holds no storage
    base: NonNull<u8>,

    /// Layout of the whole buffer, `None` when nothing was allocated
    buffer_layout: Option<Layout>,

    /// Total slot count, fixed at construction
    capacity: usize,

    /// Bytes per slot (element size padded to its alignment, min 1)
    stride: usize,

    /// Per-slot occupancy bits, `ceil(capacity / 64)` words
    occupancy: Box<[u64]>,

    /// Slots currently free
    available: usize,

    /// Most recently freed slot, consumed by the next allocation
    last_freed: Option<usize>,

    config: PoolConfig,

    total_allocs: u64,
    total_deallocs: u64,
    peak_reserved: usize,

    _marker: PhantomData<T>,
}

impl<T> FixedPool<T> {
    /// Creates a pool of `capacity` slots with the default configuration.
    ///
    /// # Errors
    /// - [`PoolError::CapacityExceeded`] if `capacity` is above
    ///   [`MAX_CAPACITY`]
    /// - [`PoolError::OutOfMemory`] if the backing buffer cannot be
    ///   obtained; no partial pool exists in that case
    pub fn new(capacity: usize) -> PoolResult<Self> {
        Self::with_config(capacity, PoolConfig::default())
    }

    /// Creates a pool of `capacity` slots with a custom configuration.
    ///
    /// The buffer is allocated exactly once here and freed when the pool is
    /// dropped. A capacity of zero is accepted and yields a pool that is
    /// permanently exhausted.
    ///
    /// # Errors
    /// Same as [`new`](Self::new).
    pub fn with_config(capacity: usize, config: PoolConfig) -> PoolResult<Self> {
        if capacity > MAX_CAPACITY {
            return Err(PoolError::CapacityExceeded {
                requested: capacity,
                max: MAX_CAPACITY,
            });
        }

        let element_layout = Layout::new::<T>();
        // Zero-sized elements still get distinct slot addresses.
        let stride = align_up(element_layout.size(), element_layout.align()).max(1);
        let total_size = stride
            .checked_mul(capacity)
            .ok_or(PoolError::OutOfMemory {
                requested: usize::MAX,
            })?;

        let (base, buffer_layout) = if total_size == 0 {
            (NonNull::<u8>::dangling(), None)
        } else {
            let layout = Layout::from_size_align(total_size, element_layout.align())
                .map_err(|_| PoolError::OutOfMemory {
                    requested: total_size,
                })?;
            // SAFETY: layout has non-zero size, validated just above.
            let raw = unsafe { alloc(layout) };
            let base = NonNull::new(raw).ok_or(PoolError::OutOfMemory {
                requested: total_size,
            })?;
            debug_assert!(is_aligned(base.as_ptr() as usize, element_layout.align()));
            (base, Some(layout))
        };

        #[cfg(feature = "logging")]
        tracing::debug!(
            capacity,
            element_size = stride,
            total_bytes = total_size,
            "created fixed pool"
        );

        Ok(Self {
            base,
            buffer_layout,
            capacity,
            stride,
            occupancy: vec![0u64; capacity.div_ceil(BITS_PER_WORD)].into_boxed_slice(),
            available: capacity,
            last_freed: None,
            config,
            total_allocs: 0,
            total_deallocs: 0,
            peak_reserved: 0,
            _marker: PhantomData,
        })
    }

    /// Returns the total number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the size of one slot in bytes (the element's padded size).
    pub fn element_size(&self) -> usize {
        self.stride
    }

    /// Returns the number of free slots.
    pub fn available_count(&self) -> usize {
        self.available
    }

    /// Returns the number of reserved slots.
    pub fn reserved_count(&self) -> usize {
        self.capacity - self.available
    }

    /// Returns the platform-derived ceiling on how many elements could
    /// theoretically be addressed, independent of this pool's capacity.
    ///
    /// Provided for interface symmetry with generic allocators.
    pub fn max_addressable_count(&self) -> usize {
        usize::MAX / self.stride
    }

    /// Checks if the pool has no free slot left.
    pub fn is_full(&self) -> bool {
        self.available == 0
    }

    /// Checks if every slot is free.
    pub fn is_empty(&self) -> bool {
        self.available == self.capacity
    }

    /// Checks if an address lies within this pool's buffer.
    pub fn contains(&self, ptr: NonNull<T>) -> bool {
        let addr = ptr.as_ptr() as usize;
        let base = self.base.as_ptr() as usize;
        addr >= base && addr < base + self.capacity * self.stride
    }

    /// Reserves exactly one slot and returns its address.
    ///
    /// The slot memory is uninitialized (or holds the configured fill
    /// pattern); initialize it through
    /// [`construct_value`](Self::construct_value) or a raw write before
    /// reading from it.
    ///
    /// Takes the O(1) fast path when the most recently freed slot is still
    /// free; otherwise scans the bitmap from slot 0 for the first clear
    /// bit.
    ///
    /// # Errors
    /// - [`PoolError::Exhausted`] when no slot is free; state is unchanged
    /// - [`PoolError::InternalInconsistency`] when the scan finds nothing
    ///   despite a positive available count (a bookkeeping bug)
    pub fn allocate(&mut self) -> PoolResult<NonNull<T>> {
        if self.available == 0 {
            return Err(PoolError::Exhausted {
                capacity: self.capacity,
            });
        }

        // The cache is consumed even when its slot turned out to be
        // reserved in the meantime.
        let index = match self.take_cached_free_slot() {
            Some(index) => index,
            None => self.scan_free_slot()?,
        };

        self.set_occupied(index);
        self.available -= 1;

        if self.config.track_stats {
            self.total_allocs += 1;
            let reserved = self.capacity - self.available;
            if reserved > self.peak_reserved {
                self.peak_reserved = reserved;
            }
        }

        let slot = self.slot_ptr(index);
        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: slot points at `stride` bytes inside the owned buffer.
            unsafe { ptr::write_bytes(slot.as_ptr(), pattern, self.stride) };
        }

        #[cfg(feature = "logging")]
        tracing::trace!(slot = index, "reserved block");

        Ok(slot.cast())
    }

    /// Reserves `count` blocks, where only zero or one are supported.
    ///
    /// Zero blocks is a no-op returning `Ok(None)`; one block behaves like
    /// [`allocate`](Self::allocate). This allocator never services
    /// multi-block requests.
    ///
    /// # Errors
    /// - [`PoolError::Unsupported`] for `count > 1`, with no state change
    /// - otherwise as [`allocate`](Self::allocate)
    pub fn allocate_blocks(&mut self, count: usize) -> PoolResult<Option<NonNull<T>>> {
        match count {
            0 => Ok(None),
            1 => self.allocate().map(Some),
            _ => Err(PoolError::Unsupported { count }),
        }
    }

    /// Releases a previously allocated block, running the stored value's
    /// destructor first.
    ///
    /// The address is validated (bounds, slot boundary, occupancy) before
    /// anything is mutated, so a bad address leaves the pool untouched.
    /// The released slot index is cached for the next allocation's fast
    /// path.
    ///
    /// # Errors
    /// [`PoolError::InvalidAddress`] when `ptr` was not returned by a prior
    /// [`allocate`](Self::allocate) on this pool, or was already released.
    ///
    /// # Safety
    /// The slot at `ptr` must hold an initialized `T` (placed there via
    /// [`construct_value`](Self::construct_value) or a raw write), and no
    /// other reference to that value may be live. After this call the
    /// value and the address are invalid.
    pub unsafe fn deallocate(&mut self, ptr: NonNull<T>) -> PoolResult<()> {
        let index = self.slot_index_of(ptr.cast())?;

        // Destroy before releasing storage.
        // SAFETY: the occupancy check above confirmed this is a reserved
        // slot of ours; the caller guarantees it holds an initialized T.
        unsafe { ptr::drop_in_place(ptr.as_ptr()) };

        self.clear_occupied(index);
        self.last_freed = Some(index);
        self.available += 1;

        if self.config.track_stats {
            self.total_deallocs += 1;
        }

        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: ptr points at `stride` bytes inside the owned buffer.
            unsafe { ptr::write_bytes(ptr.as_ptr().cast::<u8>(), pattern, self.stride) };
        }

        #[cfg(feature = "logging")]
        tracing::trace!(slot = index, "released block");

        Ok(())
    }

    /// Places a value into raw storage at `ptr` without touching slot
    /// bookkeeping.
    ///
    /// Distinct from allocation: a caller managing construction and
    /// destruction itself may call this directly.
    ///
    /// # Safety
    /// `ptr` must be valid for writes of `T` and properly aligned —
    /// normally an address returned by [`allocate`](Self::allocate). Any
    /// value previously constructed at `ptr` is overwritten without being
    /// dropped.
    pub unsafe fn construct_value(&mut self, ptr: NonNull<T>, value: T) {
        // SAFETY: forwarded to the caller.
        unsafe { ptr.as_ptr().write(value) };
    }

    /// Runs the value's destructor at `ptr` without releasing the slot.
    ///
    /// # Safety
    /// `ptr` must point at an initialized `T`, and the value must not be
    /// used or destroyed again afterwards.
    pub unsafe fn destroy_value(&mut self, ptr: NonNull<T>) {
        // SAFETY: forwarded to the caller.
        unsafe { ptr::drop_in_place(ptr.as_ptr()) };
    }

    /// Returns a statistics snapshot, or `None` when tracking is disabled
    /// in the pool's [`PoolConfig`].
    pub fn stats(&self) -> Option<PoolStats> {
        if !self.config.track_stats {
            return None;
        }

        Some(PoolStats {
            capacity: self.capacity,
            available_blocks: self.available,
            reserved_blocks: self.reserved_count(),
            total_allocs: self.total_allocs,
            total_deallocs: self.total_deallocs,
            peak_reserved: self.peak_reserved,
        })
    }

    /// Consumes the last-freed cache, returning the slot only if it is
    /// still free.
    fn take_cached_free_slot(&mut self) -> Option<usize> {
        let index = self.last_freed.take()?;
        if self.is_occupied(index) {
            return None;
        }
        Some(index)
    }

    /// Linear bitmap scan from slot 0 for the first clear bit.
    ///
    /// The returned index is the one the caller must reserve: scan index
    /// and returned slot always agree.
    fn scan_free_slot(&self) -> PoolResult<usize> {
        for (word_index, word) in self.occupancy.iter().enumerate() {
            if *word == u64::MAX {
                continue;
            }
            let index = word_index * BITS_PER_WORD + word.trailing_ones() as usize;
            // Clear bits past `capacity` in the last word are padding.
            if index < self.capacity {
                return Ok(index);
            }
        }

        Err(PoolError::InternalInconsistency {
            available: self.available,
        })
    }

    /// Maps a block address back to its slot index.
    ///
    /// Bounds, slot alignment, and occupancy are all checked; any miss is
    /// the caller passing an address the pool does not currently track.
    fn slot_index_of(&self, ptr: NonNull<u8>) -> PoolResult<usize> {
        let addr = ptr.as_ptr() as usize;
        let base = self.base.as_ptr() as usize;

        if addr < base || addr >= base + self.capacity * self.stride {
            return Err(PoolError::InvalidAddress);
        }

        let offset = addr - base;
        if offset % self.stride != 0 {
            return Err(PoolError::InvalidAddress);
        }

        let index = offset / self.stride;
        if !self.is_occupied(index) {
            return Err(PoolError::InvalidAddress);
        }

        Ok(index)
    }

    fn slot_ptr(&self, index: usize) -> NonNull<u8> {
        debug_assert!(index < self.capacity);
        // SAFETY: index is in bounds, so the offset stays within the owned
        // buffer and the result is non-null.
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(index * self.stride)) }
    }

    fn is_occupied(&self, index: usize) -> bool {
        self.occupancy[index / BITS_PER_WORD] & (1 << (index % BITS_PER_WORD)) != 0
    }

    fn set_occupied(&mut self, index: usize) {
        self.occupancy[index / BITS_PER_WORD] |= 1 << (index % BITS_PER_WORD);
    }

    fn clear_occupied(&mut self, index: usize) {
        self.occupancy[index / BITS_PER_WORD] &= !(1 << (index % BITS_PER_WORD));
    }
}

impl<T> Drop for FixedPool<T> {
    fn drop(&mut self) {
        // Values still reserved are leaked, not dropped: the pool cannot
        // know whether a reserved slot was ever initialized.
        if let Some(layout) = self.buffer_layout {
            // SAFETY: base was returned by `alloc(layout)` in
            // `with_config` and is deallocated exactly once, here.
            unsafe { dealloc(self.base.as_ptr(), layout) };
        }
    }
}

/// Two pools compare equal only when they share the same backing storage.
///
/// Blocks are only safely released through the pool that issued them, so
/// distinct pool instances are never equal. Zero-capacity pools own no
/// storage and compare equal to nothing, including themselves.
impl<T> PartialEq for FixedPool<T> {
    fn eq(&self, other: &Self) -> bool {
        self.buffer_layout.is_some() && ptr::eq(self.base.as_ptr(), other.base.as_ptr())
    }
}

impl<T> fmt::Debug for FixedPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedPool")
            .field("capacity", &self.capacity)
            .field("element_size", &self.stride)
            .field("available", &self.available)
            .field("last_freed", &self.last_freed)
            .finish_non_exhaustive()
    }
}

// SAFETY: the pool exclusively owns its buffer and bookkeeping; pointers
// handed out borrow from it only under the documented caller contract.
unsafe impl<T: Send> Send for FixedPool<T> {}

// SAFETY: shared references only reach side-effect-free queries.
unsafe impl<T: Sync> Sync for FixedPool<T> {}
