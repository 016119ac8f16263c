//! # Decompositions
//!
//! The optimizer's output: how many packs of each size to ship. Allocations are
//! kept sorted by descending size with zero quantities dropped, so two equal
//! decompositions compare and serialize identically.

use serde::{Deserialize, Serialize};

use crate::order::OrderQuantity;

/// `quantity` packs of `size` items each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackAllocation {
    pub size: u64,
    pub quantity: u64,
}

impl PackAllocation {
    pub fn new(size: u64, quantity: u64) -> Self {
        Self { size, quantity }
    }

    /// Items carried by this allocation.
    pub fn items(&self) -> u64 {
        self.size.saturating_mul(self.quantity)
    }
}

/// A set of packs chosen for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decomposition {
    order_quantity: OrderQuantity,
    allocations: Vec<PackAllocation>,
}

impl Decomposition {
    /// Build a decomposition, dropping empty allocations, merging repeated
    /// sizes and sorting by descending size.
    pub fn new(order_quantity: OrderQuantity, allocations: Vec<PackAllocation>) -> Self {
        let mut merged: Vec<PackAllocation> = Vec::with_capacity(allocations.len());
        let mut sorted = allocations;
        sorted.sort_unstable_by(|a, b| b.size.cmp(&a.size));
        for alloc in sorted.into_iter().filter(|a| a.quantity > 0) {
            match merged.last_mut() {
                Some(last) if last.size == alloc.size => {
                    last.quantity = last.quantity.saturating_add(alloc.quantity);
                }
                _ => merged.push(alloc),
            }
        }
        Self {
            order_quantity,
            allocations: merged,
        }
    }

    /// No packs at all; the answer for an order of zero.
    pub fn empty(order_quantity: OrderQuantity) -> Self {
        Self {
            order_quantity,
            allocations: Vec::new(),
        }
    }

    pub fn order_quantity(&self) -> OrderQuantity {
        self.order_quantity
    }

    /// Allocations by descending size.
    pub fn allocations(&self) -> &[PackAllocation] {
        &self.allocations
    }

    pub fn total_items(&self) -> u64 {
        self.allocations
            .iter()
            .fold(0u64, |acc, a| acc.saturating_add(a.items()))
    }

    pub fn total_packs(&self) -> u64 {
        self.allocations
            .iter()
            .fold(0u64, |acc, a| acc.saturating_add(a.quantity))
    }

    /// Items shipped beyond what was ordered.
    pub fn excess(&self) -> u64 {
        self.total_items().saturating_sub(self.order_quantity.get())
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// Quantity allocated to `size`, zero if unused.
    pub fn quantity_of(&self, size: u64) -> u64 {
        self.allocations
            .iter()
            .find(|a| a.size == size)
            .map_or(0, |a| a.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sorts_merges_and_drops_zeros() {
        let d = Decomposition::new(
            OrderQuantity::new(501),
            vec![
                PackAllocation::new(250, 1),
                PackAllocation::new(1000, 0),
                PackAllocation::new(500, 1),
                PackAllocation::new(250, 1),
            ],
        );
        assert_eq!(
            d.allocations(),
            &[PackAllocation::new(500, 1), PackAllocation::new(250, 2)]
        );
        assert_eq!(d.total_items(), 1000);
        assert_eq!(d.total_packs(), 3);
        assert_eq!(d.excess(), 499);
        assert_eq!(d.quantity_of(1000), 0);
    }

    #[test]
    fn empty_has_zero_totals() {
        let d = Decomposition::empty(OrderQuantity::new(0));
        assert!(d.is_empty());
        assert_eq!(d.total_items(), 0);
        assert_eq!(d.total_packs(), 0);
        assert_eq!(d.excess(), 0);
    }

    #[test]
    fn serializes_camel_case() {
        let d = Decomposition::new(OrderQuantity::new(1), vec![PackAllocation::new(250, 1)]);
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["orderQuantity"], 1);
        assert_eq!(v["allocations"][0]["size"], 250);
        assert_eq!(v["allocations"][0]["quantity"], 1);
    }
}
