//! # Error Types
//!
//! A single `thiserror` enum covers every way a pack configuration or a
//! calculation can be rejected. Callers surface these as structured failures;
//! nothing here is retried, since the engine is deterministic.

use thiserror::Error;

/// Errors produced while validating pack sizes or solving an order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    /// A pack size was zero, negative, fractional, non-numeric, or above the
    /// configured maximum.
    #[error("invalid pack size {value}: {reason}")]
    InvalidPackSize {
        /// The offending input, rendered as it was received.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No pack sizes are configured, or the submitted list was empty.
    #[error("no pack sizes configured")]
    EmptySet,

    /// More distinct pack sizes than the optimizer accepts.
    #[error("too many pack sizes: {count} distinct sizes, at most {limit} allowed")]
    TooManyPackSizes { count: usize, limit: usize },

    /// The pack sizes would require a search table beyond the configured span.
    #[error("pack sizes require a search span of {required} items, at most {limit} allowed")]
    SearchSpaceTooLarge { required: u128, limit: u64 },

    /// The order quantity was negative or not an integer.
    #[error("invalid order quantity {value}: {reason}")]
    InvalidOrder { value: String, reason: String },

    /// No combination of packs can cover the order.
    #[error("order quantity {order} cannot be fulfilled with the configured pack sizes")]
    Unreachable { order: u64 },
}

impl PackError {
    pub(crate) fn invalid_size(value: impl ToString, reason: &str) -> Self {
        Self::InvalidPackSize {
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_order(value: impl ToString, reason: &str) -> Self {
        Self::InvalidOrder {
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Machine-readable error kind, stable across message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPackSize { .. } => "INVALID_PACK_SIZE",
            Self::EmptySet => "EMPTY_SET",
            Self::TooManyPackSizes { .. } => "TOO_MANY_PACK_SIZES",
            Self::SearchSpaceTooLarge { .. } => "SEARCH_SPACE_TOO_LARGE",
            Self::InvalidOrder { .. } => "INVALID_ORDER",
            Self::Unreachable { .. } => "UNREACHABLE",
        }
    }
}
