//! Share redistribution over one flow's allocation sequence
//!
//! Pinned allocations keep whatever share they already carry; the remainder
//! of the 100% budget is split evenly over the unpinned active allocations,
//! with earlier entries absorbing the leftover units. When every active
//! allocation is pinned, the full budget is resplit evenly among the pinned
//! ones instead. The recomputation is idempotent.

use crate::domain::Allocation;

/// Recompute every share in place.
///
/// After this call the active shares total exactly 100 (or 0 when no
/// allocation is active), and every inactive allocation carries share 0.
pub fn recompute_shares(allocations: &mut [Allocation]) {
    for a in allocations.iter_mut() {
        if !a.is_active() {
            a.share = 0;
        }
    }

    let active: Vec<usize> = allocations
        .iter()
        .enumerate()
        .filter(|(_, a)| a.is_active())
        .map(|(i, _)| i)
        .collect();
    let pinned: Vec<usize> = active
        .iter()
        .copied()
        .filter(|&i| allocations[i].is_pinned)
        .collect();
    let unpinned: Vec<usize> = active
        .iter()
        .copied()
        .filter(|&i| !allocations[i].is_pinned)
        .collect();

    if unpinned.is_empty() {
        // All-pinned: the prior shares are discarded and the full budget is
        // split evenly, earlier entries taking the remainder units.
        if !pinned.is_empty() {
            let base = (100 / pinned.len()) as u8;
            let rem = 100 % pinned.len();
            for (pos, &i) in pinned.iter().enumerate() {
                allocations[i].share = base + if pos < rem { 1 } else { 0 };
            }
        }
        return;
    }

    let pinned_sum: u32 = pinned.iter().map(|&i| allocations[i].share as u32).sum();
    let remaining = 100u32.saturating_sub(pinned_sum) as usize;

    let base = (remaining / unpinned.len()) as u8;
    let rem = remaining % unpinned.len();
    for (pos, &i) in unpinned.iter().enumerate() {
        allocations[i].share = base + if pos < rem { 1 } else { 0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AllocationState;

    fn alloc(offer_id: i64, share: u8, state: AllocationState, pinned: bool) -> Allocation {
        Allocation {
            offer_id,
            flow_id: 1,
            share,
            state,
            is_pinned: pinned,
        }
    }

    fn shares(allocations: &[Allocation]) -> Vec<u8> {
        allocations.iter().map(|a| a.share).collect()
    }

    fn active_total(allocations: &[Allocation]) -> u32 {
        allocations
            .iter()
            .filter(|a| a.is_active())
            .map(|a| a.share as u32)
            .sum()
    }

    #[test]
    fn test_pinned_share_is_kept_and_remainder_split() {
        // A pinned at 30, B and C unpinned: remaining 70 splits 35/35
        let mut allocations = vec![
            alloc(1, 30, AllocationState::Published, true),
            alloc(2, 50, AllocationState::Published, false),
            alloc(3, 20, AllocationState::Published, false),
        ];
        recompute_shares(&mut allocations);
        assert_eq!(shares(&allocations), vec![30, 35, 35]);
        assert_eq!(active_total(&allocations), 100);
    }

    #[test]
    fn test_remainder_units_go_to_earlier_entries() {
        let mut allocations = vec![
            alloc(1, 0, AllocationState::PendingAdd, false),
            alloc(2, 0, AllocationState::PendingAdd, false),
            alloc(3, 0, AllocationState::PendingAdd, false),
        ];
        recompute_shares(&mut allocations);
        assert_eq!(shares(&allocations), vec![34, 33, 33]);
    }

    #[test]
    fn test_all_pinned_resplits_evenly() {
        let mut allocations = vec![
            alloc(1, 90, AllocationState::Published, true),
            alloc(2, 5, AllocationState::Published, true),
            alloc(3, 5, AllocationState::Published, true),
        ];
        recompute_shares(&mut allocations);
        assert_eq!(shares(&allocations), vec![34, 33, 33]);
    }

    #[test]
    fn test_inactive_allocations_are_zeroed() {
        let mut allocations = vec![
            alloc(1, 40, AllocationState::PendingDelete, false),
            alloc(2, 30, AllocationState::Deleted, true),
            alloc(3, 30, AllocationState::Published, false),
        ];
        recompute_shares(&mut allocations);
        assert_eq!(shares(&allocations), vec![0, 0, 100]);
    }

    #[test]
    fn test_pinned_overflow_leaves_nothing_for_unpinned() {
        // Pinned shares already exceed the budget; remaining clamps to 0.
        let mut allocations = vec![
            alloc(1, 70, AllocationState::Published, true),
            alloc(2, 60, AllocationState::Published, true),
            alloc(3, 0, AllocationState::Published, false),
        ];
        recompute_shares(&mut allocations);
        assert_eq!(shares(&allocations), vec![70, 60, 0]);
    }

    #[test]
    fn test_empty_and_all_inactive_sum_to_zero() {
        let mut none: Vec<Allocation> = Vec::new();
        recompute_shares(&mut none);

        let mut allocations = vec![
            alloc(1, 50, AllocationState::Deleted, false),
            alloc(2, 50, AllocationState::PendingDelete, false),
        ];
        recompute_shares(&mut allocations);
        assert_eq!(active_total(&allocations), 0);
        assert_eq!(shares(&allocations), vec![0, 0]);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut allocations = vec![
            alloc(1, 25, AllocationState::Published, true),
            alloc(2, 0, AllocationState::PendingAdd, false),
            alloc(3, 0, AllocationState::Published, false),
            alloc(4, 0, AllocationState::PendingDelete, false),
        ];
        recompute_shares(&mut allocations);
        let first = shares(&allocations);
        recompute_shares(&mut allocations);
        assert_eq!(shares(&allocations), first);
        assert_eq!(active_total(&allocations), 100);
    }
}
