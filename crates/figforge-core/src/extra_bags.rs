//! # Extra-Bag Allocator
//!
//! Per-option extra bag quantities bounded by the selected bundle.
//!
//! ## Invariants
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  0 ≤ quantity(option)                  (absent = 0, never negative)    │
//! │  Σ quantities ≤ ExtraBagCeiling        (refused, never clamped)        │
//! │                                                                         │
//! │  increase(legs) ──► total ≥ ceiling? ──yes──► ExtraBagCeilingReached   │
//! │                          │                                              │
//! │                          no ──► legs += 1                               │
//! │                                                                         │
//! │  decrease(legs) ──► legs absent? ──yes──► no-op                         │
//! │                          │                                              │
//! │                          no ──► legs -= 1, entry removed at 0           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ceiling is always passed in by the caller, so the allocator never
//! reads session or catalog state on its own.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::ExtraBagCeiling;
use crate::error::{ConstraintResult, ConstraintViolation};

/// Extra bag quantities keyed by extra-bag option id.
///
/// Entries are kept in id order so summaries and totals are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraBagAllocator {
    quantities: BTreeMap<String, u32>,
}

impl ExtraBagAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current quantity of one option (0 when absent).
    pub fn quantity(&self, option_id: &str) -> u32 {
        self.quantities.get(option_id).copied().unwrap_or(0)
    }

    /// Sum over all quantities, recomputed on every read.
    pub fn total(&self) -> u32 {
        self.quantities.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Adds one bag of `option_id` if the ceiling allows it.
    ///
    /// Returns the option's new quantity.
    ///
    /// ## Example
    /// ```rust
    /// use figforge_core::catalog::ExtraBagCeiling;
    /// use figforge_core::extra_bags::ExtraBagAllocator;
    /// use figforge_core::types::BundleTier;
    ///
    /// let bundle = BundleTier::new("b", "100", 100, 1, 100);
    /// let ceiling = ExtraBagCeiling::for_bundle(Some(&bundle));
    ///
    /// let mut bags = ExtraBagAllocator::new();
    /// assert_eq!(bags.increase("legs", ceiling), Ok(1));
    /// assert!(bags.increase("hair", ceiling).is_err());
    /// assert_eq!(bags.total(), 1);
    /// ```
    pub fn increase(&mut self, option_id: &str, ceiling: ExtraBagCeiling) -> ConstraintResult<u32> {
        if self.total() >= ceiling.limit() {
            debug!(option_id, max = ceiling.limit(), "Extra bag increase refused");
            return Err(ConstraintViolation::ExtraBagCeilingReached {
                max: ceiling.limit(),
            });
        }

        let quantity = self.quantities.entry(option_id.to_string()).or_insert(0);
        *quantity += 1;
        Ok(*quantity)
    }

    /// Removes one bag of `option_id`; a no-op when the option is absent.
    ///
    /// Returns the option's new quantity.
    pub fn decrease(&mut self, option_id: &str) -> u32 {
        let Some(quantity) = self.quantities.get_mut(option_id) else {
            return 0;
        };
        if *quantity > 1 {
            *quantity -= 1;
            return *quantity;
        }
        self.quantities.remove(option_id);
        0
    }

    /// True when the current total fits under `ceiling`.
    pub fn fits_within(&self, ceiling: ExtraBagCeiling) -> bool {
        ceiling.admits(self.total())
    }

    /// Drops every quantity.
    pub fn clear(&mut self) {
        self.quantities.clear();
    }

    /// Keeps only options accepted by `keep` (used on catalog refresh).
    ///
    /// Returns how many entries were dropped.
    pub fn retain_options(&mut self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let before = self.quantities.len();
        self.quantities.retain(|id, _| keep(id));
        before - self.quantities.len()
    }

    /// Non-zero `(option_id, quantity)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.quantities.iter().map(|(id, q)| (id.as_str(), *q))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
