//! Property-based tests for `FixedPool`

use proptest::prelude::*;

use slotpool::{FixedPool, PoolConfig};

#[derive(Debug, Clone)]
enum Op {
    Reserve,
    /// Release the live block at `index % live.len()`
    Release(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Reserve),
        1 => (0usize..1024).prop_map(Op::Release),
    ]
}

proptest! {
    /// Any reserve/release interleaving keeps the counters consistent and
    /// every live block's value intact.
    #[test]
    fn counters_and_values_survive_any_interleaving(
        capacity in 0usize..128,
        ops in prop::collection::vec(op_strategy(), 0..256),
    ) {
        let mut pool = FixedPool::<u64>::with_config(capacity, PoolConfig::production()).unwrap();
        let mut live: Vec<(u64, std::ptr::NonNull<u64>)> = Vec::new();
        let mut next_value = 0u64;

        for op in ops {
            match op {
                Op::Reserve => match pool.allocate() {
                    Ok(ptr) => {
                        unsafe { pool.construct_value(ptr, next_value) };
                        live.push((next_value, ptr));
                        next_value += 1;
                    }
                    Err(err) => {
                        prop_assert!(err.is_exhausted());
                        prop_assert_eq!(live.len(), capacity);
                    }
                },
                Op::Release(raw) => {
                    if live.is_empty() {
                        continue;
                    }
                    let (value, ptr) = live.swap_remove(raw % live.len());
                    prop_assert_eq!(unsafe { ptr.as_ptr().read() }, value);
                    unsafe { pool.deallocate(ptr) }.unwrap();
                }
            }

            prop_assert_eq!(pool.reserved_count(), live.len());
            prop_assert_eq!(pool.available_count(), capacity - live.len());

            // Live blocks never alias.
            let mut addrs: Vec<usize> =
                live.iter().map(|(_, p)| p.as_ptr() as usize).collect();
            addrs.sort_unstable();
            addrs.dedup();
            prop_assert_eq!(addrs.len(), live.len());
        }

        for (value, ptr) in live {
            prop_assert_eq!(unsafe { ptr.as_ptr().read() }, value);
            unsafe { pool.deallocate(ptr) }.unwrap();
        }
        prop_assert!(pool.is_empty());
    }

    /// Releasing a block and reserving again always hands back the same
    /// address, regardless of pool shape or fill level.
    #[test]
    fn release_then_reserve_reuses_the_slot(
        capacity in 1usize..64,
        prefill in 0usize..64,
        victim in 0usize..64,
    ) {
        let prefill = prefill % capacity + 1;
        let victim = victim % prefill;

        let mut pool = FixedPool::<u32>::with_config(capacity, PoolConfig::production()).unwrap();
        let blocks: Vec<_> = (0..prefill).map(|_| pool.allocate().unwrap()).collect();

        unsafe { pool.construct_value(blocks[victim], 0) };
        unsafe { pool.deallocate(blocks[victim]) }.unwrap();
        let reused = pool.allocate().unwrap();
        prop_assert_eq!(reused, blocks[victim]);

        for ptr in blocks {
            unsafe { pool.construct_value(ptr, 0) };
            unsafe { pool.deallocate(ptr) }.unwrap();
        }
    }

    /// Addresses from an empty-to-full fill are exactly base + i * stride.
    #[test]
    fn full_fill_is_dense_and_ordered(capacity in 1usize..200) {
        let mut pool = FixedPool::<u16>::with_config(capacity, PoolConfig::production()).unwrap();
        let stride = pool.element_size();

        let blocks: Vec<_> = (0..capacity).map(|_| pool.allocate().unwrap()).collect();
        let base = blocks[0].as_ptr() as usize;
        for (i, ptr) in blocks.iter().enumerate() {
            prop_assert_eq!(ptr.as_ptr() as usize, base + i * stride);
        }

        prop_assert!(pool.allocate().unwrap_err().is_exhausted());

        for ptr in blocks {
            unsafe { pool.construct_value(ptr, 0) };
            unsafe { pool.deallocate(ptr) }.unwrap();
        }
    }
}
