//! # Numeric Semigroup Reachability
//!
//! The totals that can be assembled from a pack-size set form a numeric
//! semigroup. This module answers "can exactly `t` items be packed?" in O(1)
//! for any `t`, after an O(k · L log L) precomputation that depends only on the
//! sizes (`L` = largest size, `k` = number of sizes).
//!
//! ## Residue Table
//!
//! For every residue `r` modulo `L`, [`ResidueTable`] stores the smallest
//! reachable total congruent to `r` (the Apéry set of the semigroup with
//! respect to `L`). Since adding one largest pack preserves the residue, a
//! total `t` is reachable iff `t >= floor[t mod L]`. The floors are shortest
//! paths on the residue graph whose edges are the non-largest sizes, computed
//! with Dijkstra.
//!
//! ## Search Bound
//!
//! [`search_bound`] limits the items carried by non-largest packs in any
//! pack-count-optimal decomposition. The optimizer uses it to peel largest
//! packs off huge orders before running its exact table.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::size::PackSizeSet;

// ---------------------------------------------------------------------------
// Search bound
// ---------------------------------------------------------------------------

/// Items that non-largest packs can carry in a pack-count-optimal
/// decomposition, given sizes in descending order.
///
/// Two independent bounds, the smaller wins:
///
/// - `L / gcd(c, L)` packs of size `c` can be exchanged for
///   `c / gcd(c, L)` largest packs with fewer packs in total, so at most
///   `L / gcd(c, L) - 1` of them appear.
/// - Among any `L` non-largest packs some non-empty subset sums to a multiple
///   of `L` and can be replaced by fewer largest packs, so at most `L - 1`
///   non-largest packs appear, each no larger than the second-largest size.
///
/// Zero for a single size.
pub fn search_bound(sizes_desc: &[u64]) -> u128 {
    let (largest, rest) = match sizes_desc.split_first() {
        Some((l, rest)) if !rest.is_empty() => (u128::from(*l), rest),
        _ => return 0,
    };

    let per_size: u128 = rest
        .iter()
        .map(|&c| {
            let c = u128::from(c);
            c * (largest / gcd(c, largest) - 1)
        })
        .sum();
    let by_count = (largest - 1) * u128::from(rest[0]);

    per_size.min(by_count)
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

// ---------------------------------------------------------------------------
// Residue table
// ---------------------------------------------------------------------------

/// Marker for residues no combination of sizes reaches.
const UNREACHABLE_RESIDUE: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct ResidueEntry {
    total: u64,
    residue: usize,
}

impl Ord for ResidueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap.
        other
            .total
            .cmp(&self.total)
            .then_with(|| other.residue.cmp(&self.residue))
    }
}

impl PartialOrd for ResidueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Smallest reachable total in each residue class modulo the largest size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidueTable {
    modulus: u64,
    floors: Vec<u64>,
}

impl ResidueTable {
    /// Run Dijkstra over the residues modulo the largest size.
    pub fn build(sizes: &PackSizeSet) -> Self {
        let modulus = sizes.largest().get();
        let steps: Vec<u64> = sizes.iter().skip(1).map(|s| s.get()).collect();
        // Bounded by MAX_PACK_SIZE, so this always fits in usize.
        let width = modulus as usize;

        let mut floors = vec![UNREACHABLE_RESIDUE; width];
        let mut settled = vec![false; width];
        floors[0] = 0;

        let mut heap = BinaryHeap::new();
        heap.push(ResidueEntry {
            total: 0,
            residue: 0,
        });

        while let Some(ResidueEntry { total, residue }) = heap.pop() {
            if settled[residue] {
                continue;
            }
            settled[residue] = true;

            for &step in &steps {
                let next_total = total + step;
                let next = ((residue as u64 + step) % modulus) as usize;
                if !settled[next] && next_total < floors[next] {
                    floors[next] = next_total;
                    heap.push(ResidueEntry {
                        total: next_total,
                        residue: next,
                    });
                }
            }
        }

        Self { modulus, floors }
    }

    /// The largest pack size; every floor is taken modulo this.
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Smallest reachable total congruent to `residue`, if any.
    pub fn floor(&self, residue: u64) -> Option<u64> {
        let floor = *self.floors.get(usize::try_from(residue).ok()?)?;
        (floor != UNREACHABLE_RESIDUE).then_some(floor)
    }

    /// Whether exactly `total` items can be packed.
    pub fn is_reachable(&self, total: u64) -> bool {
        let floor = self.floors[(total % self.modulus) as usize];
        floor != UNREACHABLE_RESIDUE && total >= floor
    }

    /// Smallest reachable total in `[order, order + window - 1]`.
    ///
    /// `None` when nothing in the window is reachable or the window end
    /// overflows `u64`.
    pub fn min_reachable_at_least(&self, order: u64, window: u64) -> Option<u64> {
        let last = order.checked_add(window.checked_sub(1)?)?;
        (order..=last).find(|&total| self.is_reachable(total))
    }

    /// Whether every sufficiently large total is reachable, i.e. the sizes
    /// share no common factor.
    pub fn is_cofinite(&self) -> bool {
        !self.floors.contains(&UNREACHABLE_RESIDUE)
    }

    /// Largest total that cannot be packed (the Frobenius number).
    ///
    /// `None` when every total is reachable, or when infinitely many are not
    /// (see [`is_cofinite`](Self::is_cofinite)).
    pub fn largest_unreachable(&self) -> Option<u64> {
        if !self.is_cofinite() {
            return None;
        }
        self.floors.iter().max()?.checked_sub(self.modulus)
    }
}
