//! Order quantities.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PackError;

/// Number of items a customer asked for. Zero is a valid (empty) order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OrderQuantity(u64);

impl OrderQuantity {
    pub fn new(items: u64) -> Self {
        Self(items)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Parse a quantity received as untyped JSON.
    ///
    /// Negative numbers, fractions and non-numbers are all [`PackError::InvalidOrder`].
    pub fn from_json_value(value: &Value) -> Result<Self, PackError> {
        match value {
            Value::Number(n) => {
                if let Some(v) = n.as_u64() {
                    Ok(Self(v))
                } else if n.is_i64() {
                    Err(PackError::invalid_order(n, "order quantity must not be negative"))
                } else {
                    Err(PackError::invalid_order(n, "order quantity must be an integer"))
                }
            }
            other => Err(PackError::invalid_order(
                other,
                "order quantity must be an integer",
            )),
        }
    }
}

impl TryFrom<i64> for OrderQuantity {
    type Error = PackError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(Self)
            .map_err(|_| PackError::invalid_order(value, "order quantity must not be negative"))
    }
}

impl From<u64> for OrderQuantity {
    fn from(items: u64) -> Self {
        Self(items)
    }
}

impl fmt::Display for OrderQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
