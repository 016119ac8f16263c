//! # Pack Optimizer
//!
//! Turns an order quantity into the canonical best set of packs for a
//! [`PackSizeSet`]. The objective is lexicographic:
//!
//! 1. ship as few items as possible, but at least the order;
//! 2. among those, ship as few packs as possible;
//! 3. among those, use as few distinct sizes as possible, then as many of the
//!    largest size as possible, then of the next largest, and so on.
//!
//! ## Algorithm
//!
//! 1. **Target.** A multiple of the smallest size `m` always lies in
//!    `[order, order + m - 1]`, so the minimal shippable total `T` is the first
//!    reachable total in that window. Reachability is O(1) per candidate via
//!    [`ResidueTable`].
//! 2. **Peel.** Non-largest packs carry at most [`search_bound`] items in any
//!    pack-count-optimal answer. When `T >= bound + L` the first
//!    `q0 = (T - bound) / L` largest packs are forced, leaving a reduced target
//!    `T' < bound + L` that depends on the sizes, never on the order.
//! 3. **Exact table.** A layered table over `0..=T'` (one layer per size,
//!    ascending) keeps the best `(packs, distinct sizes)` key for every
//!    subtotal in a single rolling row, plus two bit rows per layer recording
//!    how each key was reached. When `q0 > 0` the largest size is already in
//!    use, so its first pack adds no distinct-size cost.
//! 4. **Reconstruct.** Walk the bit rows from the largest size down, always
//!    taking the largest quantity that still attains the optimal key. That
//!    yields the "larger sizes first" tie-break without enumerating
//!    alternatives.
//!
//! The table costs about `T' * (4 + k / 4)` bytes for `k` sizes, under
//! 20 MiB for any accepted configuration.
//!
//! The optimizer never shortcuts through greedy-by-largest: for `{1, 5, 12}`
//! and an order of 15, greedy gives `{12:1, 1:3}` (4 packs) where `{5:3}`
//! needs 3.
//!
//! [`search_bound`]: crate::semigroup::search_bound

use std::time::Instant;

use fixedbitset::FixedBitSet;

use crate::decomposition::{Decomposition, PackAllocation};
use crate::error::PackError;
use crate::order::OrderQuantity;
use crate::semigroup::{self, ResidueTable};
use crate::size::PackSizeSet;

/// Weight of one pack in a packed table key. Distinct-size counts (at most
/// `MAX_PACK_SIZES`) live in the low bits and never carry into the pack count.
const PACK_UNIT: u32 = 64;

/// Table entry for subtotals no combination of the layer's sizes reaches.
const UNREACHED: u32 = u32::MAX;

/// Optimizer bound to one pack-size configuration.
///
/// Construction precomputes everything that depends only on the sizes, so a
/// single instance can answer any number of orders.
#[derive(Debug, Clone)]
pub struct PackOptimizer {
    sizes: PackSizeSet,
    residues: ResidueTable,
    bound: u64,
}

impl PackOptimizer {
    pub fn new(sizes: PackSizeSet) -> Self {
        let residues = ResidueTable::build(&sizes);
        // Normalization caps the bound at MAX_SEARCH_SPAN.
        let bound = u64::try_from(semigroup::search_bound(&sizes.to_vec())).unwrap_or(u64::MAX);
        Self {
            sizes,
            residues,
            bound,
        }
    }

    /// The configuration this optimizer answers for.
    pub fn sizes(&self) -> &PackSizeSet {
        &self.sizes
    }

    pub fn residues(&self) -> &ResidueTable {
        &self.residues
    }

    /// Items non-largest packs may carry in an optimal answer.
    pub fn search_bound(&self) -> u64 {
        self.bound
    }

    /// Best decomposition of `order`.
    pub fn solve(&self, order: OrderQuantity) -> Result<Decomposition, PackError> {
        if order.is_zero() {
            return Ok(Decomposition::empty(order));
        }
        let started = Instant::now();
        let largest = self.sizes.largest().get();

        let (peeled, reduced) = self.reduce(order)?;
        let ascending = self.ascending();
        let table = LayeredTable::build(&ascending, reduced, peeled > 0);
        let quantities = table
            .reconstruct(&ascending)
            .ok_or(PackError::Unreachable { order: order.get() })?;

        let allocations = ascending
            .iter()
            .zip(quantities)
            .map(|(&size, quantity)| {
                let size = size as u64;
                let quantity = if size == largest {
                    quantity + peeled
                } else {
                    quantity
                };
                PackAllocation::new(size, quantity)
            })
            .collect();
        let decomposition = Decomposition::new(order, allocations);

        tracing::debug!(
            order = order.get(),
            total_items = decomposition.total_items(),
            total_packs = decomposition.total_packs(),
            peeled,
            table_len = reduced + 1,
            table_bytes = table.heap_bytes(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "solved order"
        );

        Ok(decomposition)
    }

    /// Largest packs forced by the bound, and the subtotal left for the table.
    fn reduce(&self, order: OrderQuantity) -> Result<(u64, usize), PackError> {
        let largest = self.sizes.largest().get();
        let target = self
            .residues
            .min_reachable_at_least(order.get(), self.sizes.smallest().get())
            .ok_or(PackError::Unreachable { order: order.get() })?;

        let peeled = match self.bound.checked_add(largest) {
            Some(threshold) if target >= threshold => (target - self.bound) / largest,
            _ => 0,
        };
        let reduced = usize::try_from(target - peeled * largest)
            .map_err(|_| PackError::Unreachable { order: order.get() })?;
        Ok((peeled, reduced))
    }

    fn ascending(&self) -> Vec<usize> {
        self.sizes.iter().rev().map(|s| s.get() as usize).collect()
    }
}

/// One-shot convenience: build an optimizer for `sizes` and solve `order`.
pub fn solve(sizes: &PackSizeSet, order: OrderQuantity) -> Result<Decomposition, PackError> {
    PackOptimizer::new(sizes.clone()).solve(order)
}

fn first_use_cost(is_largest: bool, largest_in_use: bool) -> u32 {
    if is_largest && largest_in_use {
        PACK_UNIT
    } else {
        PACK_UNIT + 1
    }
}

/// Exact table over subtotals `0..=target`, one layer per size (ascending).
///
/// Only the key row of the newest layer is kept. Each layer leaves two bit
/// rows behind for reconstruction:
///
/// - `take[i][x]`: the best key for `x` over the first `i + 1` sizes uses
///   size `i` at least once (ties go to using it);
/// - `extend[i][x]`: the best key for `x` among answers using size `i` is
///   reached by adding one more pack to such an answer for `x - size`
///   (ties go to extending).
///
/// Following both bits greedily takes the largest quantity of each size that
/// still attains the optimal key.
struct LayeredTable {
    target: usize,
    best: Vec<u32>,
    take: Vec<FixedBitSet>,
    extend: Vec<FixedBitSet>,
    /// Peak bytes of the per-size ring used while building.
    ring_bytes: usize,
}

impl LayeredTable {
    fn build(ascending: &[usize], target: usize, largest_in_use: bool) -> Self {
        let mut best = vec![UNREACHED; target + 1];
        best[0] = 0;
        let mut take = Vec::with_capacity(ascending.len());
        let mut extend = Vec::with_capacity(ascending.len());
        let mut ring_bytes = 0;

        for (i, &size) in ascending.iter().enumerate() {
            let first = first_use_cost(i + 1 == ascending.len(), largest_in_use);
            let mut took = FixedBitSet::with_capacity(target + 1);
            let mut extended = FixedBitSet::with_capacity(target + 1);

            // `using[x % size]` holds the best key for `x - size` among answers
            // that use this size, until it is overwritten with the one for `x`.
            let ring_len = size.min(target + 1).max(1);
            let mut using = vec![UNREACHED; ring_len];
            ring_bytes = ring_bytes.max(ring_len * std::mem::size_of::<u32>());

            // Ascending x overwrites `best[x - size]` with this layer's value
            // first; opening from it is never cheaper than extending, so the
            // minimum is unchanged.
            for x in size..=target {
                let slot = x % size;
                let open = match best[x - size] {
                    UNREACHED => UNREACHED,
                    key => key + first,
                };
                let more = match using[slot] {
                    UNREACHED => UNREACHED,
                    key => key + PACK_UNIT,
                };
                let with_size = open.min(more);
                using[slot] = with_size;
                if with_size == UNREACHED {
                    continue;
                }
                if more <= open {
                    extended.insert(x);
                }
                if with_size <= best[x] {
                    took.insert(x);
                    best[x] = with_size;
                }
            }
            take.push(took);
            extend.push(extended);
        }

        Self {
            target,
            best,
            take,
            extend,
            ring_bytes,
        }
    }

    /// Quantities per size (ascending) attaining the optimal key for the
    /// target, preferring larger quantities of larger sizes.
    fn reconstruct(&self, ascending: &[usize]) -> Option<Vec<u64>> {
        if *self.best.get(self.target)? == UNREACHED {
            return None;
        }

        let mut quantities = vec![0u64; ascending.len()];
        let mut remaining = self.target;

        for i in (0..ascending.len()).rev() {
            let size = ascending[i];
            if !self.take[i].contains(remaining) {
                continue;
            }
            let mut quantity = 0u64;
            loop {
                quantity += 1;
                let more = self.extend[i].contains(remaining);
                remaining = remaining.checked_sub(size)?;
                if !more {
                    break;
                }
            }
            quantities[i] = quantity;
        }

        (remaining == 0).then_some(quantities)
    }

    /// Heap bytes held by the table, counting the transient ring at its peak.
    fn heap_bytes(&self) -> usize {
        let bits: usize = self
            .take
            .iter()
            .chain(&self.extend)
            .map(|row| std::mem::size_of_val(row.as_slice()))
            .sum();
        self.best.len() * std::mem::size_of::<u32>() + bits + self.ring_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(raw: &[i64]) -> PackSizeSet {
        PackSizeSet::normalize(raw.iter().copied()).unwrap()
    }

    fn run(raw: &[i64], order: u64) -> Decomposition {
        solve(&sizes(raw), OrderQuantity::new(order)).unwrap()
    }

    fn pairs(d: &Decomposition) -> Vec<(u64, u64)> {
        d.allocations().iter().map(|a| (a.size, a.quantity)).collect()
    }

    const DEFAULT: [i64; 5] = [250, 500, 1000, 2000, 5000];

    #[test]
    fn zero_order_is_empty() {
        let d = run(&DEFAULT, 0);
        assert!(d.is_empty());
        assert_eq!(d.total_items(), 0);
        assert_eq!(d.total_packs(), 0);
    }

    #[test]
    fn default_sizes_small_orders() {
        assert_eq!(pairs(&run(&DEFAULT, 1)), vec![(250, 1)]);
        assert_eq!(pairs(&run(&DEFAULT, 250)), vec![(250, 1)]);
        assert_eq!(pairs(&run(&DEFAULT, 251)), vec![(500, 1)]);

        let d = run(&DEFAULT, 501);
        assert_eq!(pairs(&d), vec![(500, 1), (250, 1)]);
        assert_eq!(d.total_items(), 750);
        assert_eq!(d.total_packs(), 2);
    }

    #[test]
    fn default_sizes_large_order() {
        let d = run(&DEFAULT, 12_001);
        assert_eq!(pairs(&d), vec![(5000, 2), (2000, 1), (250, 1)]);
        assert_eq!(d.total_items(), 12_250);
        assert_eq!(d.total_packs(), 4);
    }

    #[test]
    fn greedy_is_not_used() {
        let d = run(&[1, 5, 12], 15);
        assert_eq!(pairs(&d), vec![(5, 3)]);
        assert_eq!(d.excess(), 0);
    }

    #[test]
    fn prime_sizes_half_million() {
        let d = run(&[23, 31, 53], 500_000);
        assert_eq!(d.total_items(), 500_000);
        assert_eq!(d.total_packs(), 9438);
        assert_eq!(pairs(&d), vec![(53, 9429), (31, 7), (23, 2)]);
    }

    #[test]
    fn peeling_matches_search_bound() {
        let opt = PackOptimizer::new(sizes(&[23, 31, 53]));
        assert_eq!(opt.search_bound(), 1612);
        assert_eq!(opt.residues().modulus(), 53);
    }

    #[test]
    fn single_size_rounds_up() {
        let d = run(&[7], 15);
        assert_eq!(pairs(&d), vec![(7, 3)]);
        assert_eq!(d.excess(), 6);

        let d = run(&[7], 7_000_000_000);
        assert_eq!(pairs(&d), vec![(7, 1_000_000_000)]);
    }

    #[test]
    fn common_factor_sizes_round_up_to_reachable_total() {
        // Only even totals are reachable.
        let d = run(&[4, 6], 7);
        assert_eq!(d.total_items(), 8);
        assert_eq!(pairs(&d), vec![(4, 2)]);

        let d = run(&[4, 6], 9);
        assert_eq!(d.total_items(), 10);
        assert_eq!(pairs(&d), vec![(6, 1), (4, 1)]);
    }

    #[test]
    fn ties_prefer_fewer_distinct_sizes() {
        // 8 = 4+4 = 5+3, both two packs.
        assert_eq!(pairs(&run(&[3, 4, 5], 8)), vec![(4, 2)]);
        // 20 = 10+10 beats 8+8+2+2 outright and 10+8+2 on pack count.
        assert_eq!(pairs(&run(&[2, 8, 10], 20)), vec![(10, 2)]);
        assert_eq!(pairs(&run(&[4, 6], 12)), vec![(6, 2)]);
    }

    #[test]
    fn ties_prefer_larger_sizes() {
        // 11 = 5+3+3 = 4+4+3, three packs and two sizes each.
        assert_eq!(pairs(&run(&[3, 4, 5], 11)), vec![(5, 1), (3, 2)]);
    }

    #[test]
    fn unit_size_never_overships() {
        for order in 1..200 {
            let d = run(&[1, 5, 12], order);
            assert_eq!(d.total_items(), order);
        }
    }

    #[test]
    fn near_u64_max_order() {
        let d = run(&[1], u64::MAX);
        assert_eq!(d.total_items(), u64::MAX);

        let err = solve(&sizes(&[2]), OrderQuantity::new(u64::MAX)).unwrap_err();
        assert_eq!(err, PackError::Unreachable { order: u64::MAX });
    }

    #[test]
    fn table_footprint_stays_small_for_widest_configuration() {
        // Sixteen sizes with a search bound close to the accepted maximum.
        let raw: Vec<i64> = (1385..=1400).collect();
        let opt = PackOptimizer::new(sizes(&raw));
        let order = OrderQuantity::new(1_000_000_007);

        let (peeled, reduced) = opt.reduce(order).unwrap();
        assert!(peeled > 0);
        assert!(reduced as u64 <= crate::size::MAX_SEARCH_SPAN);

        let ascending = opt.ascending();
        let table = LayeredTable::build(&ascending, reduced, true);
        let bytes = table.heap_bytes();
        assert!(bytes <= 24 << 20, "table holds {bytes} bytes");
        assert!(table.reconstruct(&ascending).is_some());

        let d = opt.solve(order).unwrap();
        assert!(d.total_items() >= order.get());
        assert!(d.excess() < 1385);
    }

    #[test]
    fn optimizer_is_reusable() {
        let opt = PackOptimizer::new(sizes(&DEFAULT));
        let first = opt.solve(OrderQuantity::new(12_001)).unwrap();
        let _ = opt.solve(OrderQuantity::new(1)).unwrap();
        assert_eq!(opt.solve(OrderQuantity::new(12_001)).unwrap(), first);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    /// Exhaustive reference: minimal exact pack count for every total up to
    /// `order + m`, then every multiset with that count, then the tie-break.
    fn brute_force(sizes: &[u64], order: u64) -> Vec<(u64, u64)> {
        if order == 0 {
            return Vec::new();
        }
        let smallest = *sizes.iter().min().unwrap();
        let top = (order + smallest) as usize;
        let mut count = vec![u64::MAX; top + 1];
        count[0] = 0;
        for x in 1..=top {
            for &c in sizes {
                let c = c as usize;
                if c <= x && count[x - c] != u64::MAX {
                    count[x] = count[x].min(count[x - c] + 1);
                }
            }
        }
        let total = (order as usize..=top).find(|&t| count[t] != u64::MAX).unwrap();
        let packs = count[total];

        let mut desc: Vec<u64> = sizes.to_vec();
        desc.sort_unstable_by(|a, b| b.cmp(a));
        let mut best: Option<((usize, Vec<i64>), BTreeMap<u64, u64>)> = None;
        let mut current = BTreeMap::new();
        enumerate(&desc, 0, total as u64, packs, &mut current, &mut |sol: &BTreeMap<u64, u64>| {
            let key = (
                sol.len(),
                desc.iter()
                    .map(|c| -(sol.get(c).copied().unwrap_or(0) as i64))
                    .collect::<Vec<_>>(),
            );
            if best.as_ref().map_or(true, |(k, _)| key < *k) {
                best = Some((key, sol.clone()));
            }
        });
        let (_, sol) = best.unwrap();
        sol.into_iter().rev().collect()
    }

    fn enumerate(
        desc: &[u64],
        i: usize,
        remaining: u64,
        packs: u64,
        current: &mut BTreeMap<u64, u64>,
        visit: &mut dyn FnMut(&BTreeMap<u64, u64>),
    ) {
        if i == desc.len() {
            if remaining == 0 && packs == 0 {
                visit(current);
            }
            return;
        }
        let c = desc[i];
        for q in (0..=packs.min(remaining / c)).rev() {
            if q > 0 {
                current.insert(c, q);
            }
            enumerate(desc, i + 1, remaining - q * c, packs - q, current, visit);
            current.remove(&c);
        }
    }

    fn small_sizes() -> impl Strategy<Value = Vec<i64>> {
        prop::collection::btree_set(1i64..40, 1..5).prop_map(|s| s.into_iter().collect())
    }

    proptest! {
        /// The optimizer agrees with exhaustive search, tie-break included.
        #[test]
        fn matches_brute_force(raw in small_sizes(), order in 0u64..300) {
            let set = PackSizeSet::normalize(raw.iter().copied()).unwrap();
            let got = solve(&set, OrderQuantity::new(order)).unwrap();
            let got: Vec<(u64, u64)> =
                got.allocations().iter().map(|a| (a.size, a.quantity)).collect();
            prop_assert_eq!(got, brute_force(&set.to_vec(), order));
        }

        /// Peeled orders keep the exact tie-break.
        #[test]
        fn matches_brute_force_past_bound(
            raw in prop::collection::btree_set(2i64..9, 2..4),
            order in 40u64..160,
        ) {
            let set = PackSizeSet::normalize(raw.iter().copied()).unwrap();
            let got = solve(&set, OrderQuantity::new(order)).unwrap();
            let got: Vec<(u64, u64)> =
                got.allocations().iter().map(|a| (a.size, a.quantity)).collect();
            prop_assert_eq!(got, brute_force(&set.to_vec(), order));
        }

        /// Covering one more item never ships fewer items, and never more than
        /// one extra largest pack.
        #[test]
        fn total_items_monotone(raw in small_sizes(), order in 0u64..5_000) {
            let opt = PackOptimizer::new(PackSizeSet::normalize(raw).unwrap());
            let a = opt.solve(OrderQuantity::new(order)).unwrap();
            let b = opt.solve(OrderQuantity::new(order + 1)).unwrap();
            prop_assert!(b.total_items() >= a.total_items());
            prop_assert!(b.total_items() - a.total_items() <= opt.sizes().largest().get());
        }

        /// Every answer covers the order and lists only configured sizes.
        #[test]
        fn answers_are_well_formed(raw in small_sizes(), order in 0u64..1_000_000) {
            let opt = PackOptimizer::new(PackSizeSet::normalize(raw).unwrap());
            let d = opt.solve(OrderQuantity::new(order)).unwrap();
            prop_assert!(d.total_items() >= order);
            prop_assert!(d.excess() < opt.sizes().smallest().get());
            for a in d.allocations() {
                prop_assert!(opt.sizes().contains(a.size));
                prop_assert!(a.quantity > 0);
            }
            prop_assert_eq!(opt.solve(OrderQuantity::new(order)).unwrap(), d);
        }
    }
}
