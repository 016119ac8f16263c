//! # packcalc-core — Pack Decomposition Engine
//!
//! The leaf crate of the pack calculator. It owns the domain types and the
//! optimizer that turns an order quantity into whole packs. Every other crate
//! in the workspace depends on `packcalc-core`; it depends on nothing internal
//! and performs no I/O.
//!
//! ## Key Design Principles
//!
//! 1. **Validated newtypes.** `PackSize`, `PackSizeSet` and `OrderQuantity`
//!    can only be built through checked constructors. Once a `PackSizeSet`
//!    exists it is non-empty, deduplicated, sorted descending and small enough
//!    for the optimizer's bounded search.
//!
//! 2. **Search cost independent of the order.** The optimizer reasons over the
//!    residues modulo the largest pack size and over a table whose length is a
//!    function of the pack sizes alone. An order of 5 or 5 000 000 items costs
//!    the same.
//!
//! 3. **Canonical answers.** Minimal excess first, then fewest packs, then
//!    fewest distinct sizes, then larger sizes first. Two calls with the same
//!    inputs always return the same `Decomposition`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `packcalc-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod decomposition;
pub mod error;
pub mod optimizer;
pub mod order;
pub mod semigroup;
pub mod size;

pub use decomposition::{Decomposition, PackAllocation};
pub use error::PackError;
pub use optimizer::PackOptimizer;
pub use order::OrderQuantity;
pub use size::{PackSize, PackSizeSet, MAX_PACK_SIZE, MAX_PACK_SIZES, MAX_SEARCH_SPAN};
