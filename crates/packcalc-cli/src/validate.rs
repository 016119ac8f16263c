//! # Validate Subcommand
//!
//! Normalizes a pack-size list the way `POST /api/packs` would and reports
//! what the optimizer derives from it.

use anyhow::Result;
use clap::Args;

use packcalc_core::{PackOptimizer, PackSizeSet};

/// Arguments for the `packcalc validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Comma-separated pack sizes, e.g. `500,250,500`.
    #[arg(long, value_delimiter = ',', num_args = 1.., required = true, allow_negative_numbers = true)]
    pub sizes: Vec<i64>,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when the list is accepted, 1 when it is rejected.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    match crate::load_sizes(&args.sizes) {
        Ok(sizes) => {
            print!("{}", describe(&sizes));
            Ok(0)
        }
        Err(err) => {
            println!("FAIL: {err}");
            Ok(1)
        }
    }
}

/// Report for an accepted set.
pub fn describe(sizes: &PackSizeSet) -> String {
    let optimizer = PackOptimizer::new(sizes.clone());
    let residues = optimizer.residues();

    let reachability = if !residues.is_cofinite() {
        "infinitely many totals unreachable (sizes share a common factor)".to_string()
    } else {
        match residues.largest_unreachable() {
            Some(n) => format!("every total above {n} reachable"),
            None => "every total reachable".to_string(),
        }
    };

    format!(
        "OK: {sizes}\nSignature: {}\nSearch bound: {}\nReachability: {reachability}\n",
        sizes.signature(),
        optimizer.search_bound(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_normalizes() {
        let args = ValidateArgs {
            sizes: vec![500, 250, 500],
        };
        assert_eq!(run_validate(&args).unwrap(), 0);
    }

    #[test]
    fn rejects_non_positive() {
        let args = ValidateArgs {
            sizes: vec![250, -1],
        };
        assert_eq!(run_validate(&args).unwrap(), 1);
    }

    #[test]
    fn describes_normalized_set() {
        let sizes = PackSizeSet::normalize([500, 250, 500]).unwrap();
        let report = describe(&sizes);
        assert!(report.starts_with("OK: {500, 250}\n"), "got: {report}");
        assert!(report.contains(&sizes.signature()));
        assert!(report.contains("common factor"));
    }

    #[test]
    fn reports_largest_unreachable_total() {
        let sizes = PackSizeSet::normalize([6, 9, 20]).unwrap();
        assert!(describe(&sizes).contains("every total above 43 reachable"));

        let sizes = PackSizeSet::normalize([1, 5]).unwrap();
        assert!(describe(&sizes).contains("Reachability: every total reachable"));
    }
}
