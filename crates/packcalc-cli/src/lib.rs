//! # packcalc-cli — Command-Line Tool for the Pack Calculator
//!
//! Runs the optimizer offline, without the HTTP service or a database.
//!
//! ## Subcommands
//!
//! - `packcalc solve`: decompose one order against a pack-size list.
//! - `packcalc validate`: normalize a pack-size list and report its
//!   signature and reachability.
//!
//! ```bash
//! packcalc solve --sizes 250,500,1000,2000,5000 --order 12001
//! packcalc solve --sizes 23,31,53 --order 500000 --json
//! packcalc validate --sizes 500,250,500
//! ```
//!
//! Exit codes: 0 on success, 1 when the input is rejected, 2 on an
//! operational error.

pub mod solve;
pub mod validate;

use packcalc_core::{PackError, PackSizeSet};

/// Normalize raw `--sizes` values, logging the rejection.
pub fn load_sizes(raw: &[i64]) -> Result<PackSizeSet, PackError> {
    PackSizeSet::normalize(raw.iter().copied()).map_err(|err| {
        tracing::debug!(sizes = ?raw, kind = err.kind(), "pack sizes rejected");
        err
    })
}
