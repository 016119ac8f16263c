//! # Solve Subcommand
//!
//! Decomposes a single order and prints the packs, either as a table or as
//! the same JSON document `POST /api/calculate` returns.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use packcalc_core::{Decomposition, OrderQuantity, PackOptimizer};

/// Arguments for the `packcalc solve` subcommand.
#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Comma-separated pack sizes, e.g. `250,500,1000`.
    #[arg(long, value_delimiter = ',', num_args = 1.., required = true, allow_negative_numbers = true)]
    pub sizes: Vec<i64>,

    /// Number of items ordered.
    #[arg(long)]
    pub order: u64,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the solve subcommand.
///
/// Returns exit code: 0 when the order was decomposed, 1 when the pack sizes
/// or the order were rejected.
pub fn run_solve(args: &SolveArgs) -> Result<u8> {
    let order = OrderQuantity::new(args.order);

    let outcome = crate::load_sizes(&args.sizes)
        .and_then(|sizes| PackOptimizer::new(sizes).solve(order));

    match outcome {
        Ok(decomposition) => {
            tracing::info!(
                order = order.get(),
                total_items = decomposition.total_items(),
                total_packs = decomposition.total_packs(),
                "order solved"
            );
            if args.json {
                let doc = success_document(&decomposition);
                println!(
                    "{}",
                    serde_json::to_string_pretty(&doc).context("failed to encode result")?
                );
            } else {
                print!("{}", render_table(&decomposition));
            }
            Ok(0)
        }
        Err(err) => {
            if args.json {
                let doc = json!({
                    "orderQuantity": order.get(),
                    "totalItems": 0,
                    "totalPacks": 0,
                    "pack_configurations": [],
                    "success": false,
                    "errorMessage": err.to_string(),
                    "error": { "code": err.kind(), "message": err.to_string() },
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&doc).context("failed to encode result")?
                );
            } else {
                println!("FAIL: {err}");
            }
            Ok(1)
        }
    }
}

fn success_document(decomposition: &Decomposition) -> serde_json::Value {
    let packs: Vec<serde_json::Value> = decomposition
        .allocations()
        .iter()
        .map(|a| json!({ "size": a.size, "quantity": a.quantity }))
        .collect();
    json!({
        "orderQuantity": decomposition.order_quantity().get(),
        "totalItems": decomposition.total_items(),
        "totalPacks": decomposition.total_packs(),
        "pack_configurations": packs,
        "success": true,
    })
}

/// Human-readable rendering, one line per pack size.
pub fn render_table(decomposition: &Decomposition) -> String {
    let mut out = format!("Order: {}\n", decomposition.order_quantity());
    for allocation in decomposition.allocations() {
        out.push_str(&format!(
            "  {:>4} x {}\n",
            allocation.quantity, allocation.size
        ));
    }
    out.push_str(&format!(
        "Items: {} (excess {})\nPacks: {}\n",
        decomposition.total_items(),
        decomposition.excess(),
        decomposition.total_packs()
    ));
    out
}
