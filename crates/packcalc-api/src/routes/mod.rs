//! # API Route Modules
//!
//! - `packs`: read and replace the active pack-size configuration.
//! - `calculate`: decompose an order into packs.

pub mod calculate;
pub mod packs;
