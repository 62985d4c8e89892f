//! Work-group sizing for the per-strand kernels.

/// Must match `@workgroup_size` in `integrate.wgsl` and `constrain.wgsl`.
pub const STRAND_WORKGROUP_SIZE: u32 = 128;

/// Groups needed to give each of `items` one invocation.
///
/// Rounds up only when there is a remainder, and never returns zero so a
/// dispatch always runs. The kernels bounds-check the tail.
pub fn workgroup_count(items: u32, group_size: u32) -> u32 {
    debug_assert!(group_size > 0, "work-group size must be non-zero");
    items.div_ceil(group_size.max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_multiple_adds_no_group() {
        assert_eq!(workgroup_count(5120, STRAND_WORKGROUP_SIZE), 40);
    }

    #[test]
    fn test_remainder_adds_one_group() {
        assert_eq!(workgroup_count(5121, STRAND_WORKGROUP_SIZE), 41);
        assert_eq!(workgroup_count(1, STRAND_WORKGROUP_SIZE), 1);
    }

    #[test]
    fn test_never_zero() {
        assert_eq!(workgroup_count(0, STRAND_WORKGROUP_SIZE), 1);
    }

    proptest! {
        #[test]
        fn prop_groups_cover_items_without_spare_group(items in 1u32..1_000_000, size in 1u32..1024) {
            let groups = workgroup_count(items, size);
            prop_assert!(groups as u64 * size as u64 >= items as u64);
            prop_assert!((groups as u64 - 1) * (size as u64) < items as u64);
        }
    }
}
