//! # Pack Sizes
//!
//! [`PackSize`] is a single positive pack variant; [`PackSizeSet`] is the
//! validated, deduplicated, descending collection the optimizer consumes.
//!
//! A `PackSizeSet` is only ever produced by [`PackSizeSet::normalize`] (or its
//! JSON front door [`PackSizeSet::from_json_values`]), so holding one is proof
//! that:
//!
//! - it is non-empty,
//! - every size is in `1..=MAX_PACK_SIZE`,
//! - there are at most `MAX_PACK_SIZES` distinct sizes,
//! - the optimizer's bounded search table fits in `MAX_SEARCH_SPAN` entries.
//!
//! Replacing a configuration means building a new set; there is no incremental
//! add/remove.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::PackError;
use crate::semigroup;

/// Largest pack size accepted, in items.
pub const MAX_PACK_SIZE: u64 = 1_000_000;

/// Maximum number of distinct pack sizes in one configuration.
pub const MAX_PACK_SIZES: usize = 16;

/// Upper bound on the optimizer's exact-search table, in items.
///
/// Checked against [`semigroup::search_bound`] plus the largest size when a
/// set is normalized, so a pathological configuration is rejected when it is
/// submitted rather than when an order arrives.
pub const MAX_SEARCH_SPAN: u64 = 1 << 21;

/// A single pack variant: the number of items shipped in one pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PackSize(u64);

impl PackSize {
    /// Validate a pack size. Zero and values above [`MAX_PACK_SIZE`] are rejected.
    pub fn new(items: u64) -> Result<Self, PackError> {
        if items == 0 {
            return Err(PackError::invalid_size(items, "pack sizes must be positive"));
        }
        if items > MAX_PACK_SIZE {
            return Err(PackError::invalid_size(
                items,
                &format!("pack sizes must not exceed {MAX_PACK_SIZE}"),
            ));
        }
        Ok(Self(items))
    }

    /// Number of items in this pack.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<i64> for PackSize {
    type Error = PackError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(PackError::invalid_size(value, "pack sizes must be positive"));
        }
        Self::new(value.unsigned_abs())
    }
}

impl fmt::Display for PackSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated set of pack sizes, sorted descending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<u64>")]
pub struct PackSizeSet {
    sizes: Vec<PackSize>,
}

impl PackSizeSet {
    /// Validate, deduplicate and sort raw sizes.
    ///
    /// The first invalid entry aborts normalization; duplicates are merged
    /// silently.
    pub fn normalize<I>(raw: I) -> Result<Self, PackError>
    where
        I: IntoIterator<Item = i64>,
    {
        let sizes = raw
            .into_iter()
            .map(PackSize::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_sizes(sizes)
    }

    /// Normalize sizes received as untyped JSON.
    ///
    /// Floats, strings, booleans and nulls are reported as
    /// [`PackError::InvalidPackSize`] rather than as a deserialization failure,
    /// so callers get the same error kind for `2.5` as for `-2`.
    pub fn from_json_values(values: &[Value]) -> Result<Self, PackError> {
        let sizes = values
            .iter()
            .map(pack_size_from_json)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_sizes(sizes)
    }

    fn from_sizes(mut sizes: Vec<PackSize>) -> Result<Self, PackError> {
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes.dedup();

        if sizes.is_empty() {
            return Err(PackError::EmptySet);
        }
        if sizes.len() > MAX_PACK_SIZES {
            return Err(PackError::TooManyPackSizes {
                count: sizes.len(),
                limit: MAX_PACK_SIZES,
            });
        }

        let raw: Vec<u64> = sizes.iter().map(|s| s.get()).collect();
        let required = semigroup::search_bound(&raw) + u128::from(raw[0]);
        if required > u128::from(MAX_SEARCH_SPAN) {
            return Err(PackError::SearchSpaceTooLarge {
                required,
                limit: MAX_SEARCH_SPAN,
            });
        }

        Ok(Self { sizes })
    }

    /// Sizes in descending order.
    pub fn sizes(&self) -> &[PackSize] {
        &self.sizes
    }

    /// Sizes in descending order as plain integers.
    pub fn to_vec(&self) -> Vec<u64> {
        self.sizes.iter().map(|s| s.get()).collect()
    }

    /// Iterate sizes in descending order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = PackSize> + ExactSizeIterator + '_ {
        self.sizes.iter().copied()
    }

    /// Whether `items` is one of the configured sizes.
    pub fn contains(&self, items: u64) -> bool {
        // Descending order, so reverse the comparison for binary search.
        self.sizes
            .binary_search_by(|candidate| items.cmp(&candidate.get()))
            .is_ok()
    }

    /// Number of distinct sizes. Never zero.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Always `false`; present for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// The largest configured size.
    pub fn largest(&self) -> PackSize {
        self.sizes[0]
    }

    /// The smallest configured size.
    pub fn smallest(&self) -> PackSize {
        self.sizes[self.sizes.len() - 1]
    }

    /// Content signature: lowercase hex SHA-256 of the descending sizes joined
    /// by commas. Equal sets always have equal signatures.
    pub fn signature(&self) -> String {
        let canonical = self
            .sizes
            .iter()
            .map(|s| s.get().to_string())
            .collect::<Vec<_>>()
            .join(",");
        Sha256::digest(canonical.as_bytes())
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

impl TryFrom<Vec<i64>> for PackSizeSet {
    type Error = PackError;

    fn try_from(value: Vec<i64>) -> Result<Self, Self::Error> {
        Self::normalize(value)
    }
}

impl From<PackSizeSet> for Vec<u64> {
    fn from(set: PackSizeSet) -> Self {
        set.to_vec()
    }
}

impl fmt::Display for PackSizeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.sizes.iter().map(|s| s.to_string()).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

fn pack_size_from_json(value: &Value) -> Result<PackSize, PackError> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                PackSize::try_from(v)
            } else if n.is_u64() {
                Err(PackError::invalid_size(
                    n,
                    &format!("pack sizes must not exceed {MAX_PACK_SIZE}"),
                ))
            } else {
                Err(PackError::invalid_size(n, "pack sizes must be integers"))
            }
        }
        other => Err(PackError::invalid_size(other, "pack sizes must be integers")),
    }
}
