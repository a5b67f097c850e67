//! # Torso-Design Allocator
//!
//! Quantity editing for the design items of a torso bag, under two caps.
//!
//! ## The Two Caps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Torso Design Caps                                    │
//! │                                                                         │
//! │  Per design:   1 ≤ quantity ≤ 4                                         │
//! │                (blank allowed while typing, committed as 1)             │
//! │                                                                         │
//! │  Aggregate:    Σ quantity ≤ AllocationCeiling                           │
//! │                (smallest active bundle, 100 when none is active)        │
//! │                                                                         │
//! │  Input "3x" ──► strip non-digits ──► "3" ──► ≤ 4? ──► others+3 ≤ cap?   │
//! │                                               │              │          │
//! │                                          no: refuse     no: refuse      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A blank entry counts as 1 toward the aggregate, the value it receives on
//! commit, so committing can never push a bag over its ceiling.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use crate::catalog::AllocationCeiling;
use crate::error::{ConstraintResult, ConstraintViolation};
use crate::types::DesignItem;
use crate::{MAX_DESIGN_QUANTITY, MIN_DESIGN_QUANTITY};

// =============================================================================
// Quantity Input
// =============================================================================

/// The value of one quantity field while it is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum QuantityInput {
    /// Empty (or zero) intermediate state; renders blank, commits as 1.
    Blank,
    /// A quantity within 1-4.
    Value(u8),
}

impl QuantityInput {
    /// The quantity this input will hold once committed.
    #[inline]
    pub const fn committed(&self) -> u8 {
        match self {
            QuantityInput::Blank => MIN_DESIGN_QUANTITY,
            QuantityInput::Value(v) => *v,
        }
    }

    #[inline]
    pub const fn is_blank(&self) -> bool {
        matches!(self, QuantityInput::Blank)
    }
}

/// Renders the way the input field shows it: blank stays blank.
impl fmt::Display for QuantityInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantityInput::Blank => Ok(()),
            QuantityInput::Value(v) => write!(f, "{}", v),
        }
    }
}

/// Parses raw text from a quantity field.
///
/// ## Rules
/// - Non-digit characters are stripped
/// - Empty or `0` yields [`QuantityInput::Blank`]
/// - Anything above 4 (including numbers too long to parse) is refused
///
/// ## Example
/// ```rust
/// use figforge_core::torso::{parse_quantity_input, QuantityInput};
///
/// assert_eq!(parse_quantity_input(" 3 "), Ok(QuantityInput::Value(3)));
/// assert_eq!(parse_quantity_input("x2"), Ok(QuantityInput::Value(2)));
/// assert_eq!(parse_quantity_input(""), Ok(QuantityInput::Blank));
/// assert!(parse_quantity_input("5").is_err());
/// ```
pub fn parse_quantity_input(raw: &str) -> ConstraintResult<QuantityInput> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Ok(QuantityInput::Blank);
    }

    let too_large = |requested: u32| ConstraintViolation::DesignQuantityTooLarge {
        requested,
        max: MAX_DESIGN_QUANTITY,
    };

    let value: u32 = digits.parse().map_err(|_| too_large(u32::MAX))?;
    match value {
        0 => Ok(QuantityInput::Blank),
        v if v > MAX_DESIGN_QUANTITY as u32 => Err(too_large(v)),
        v => Ok(QuantityInput::Value(v as u8)),
    }
}

// =============================================================================
// Design Entry
// =============================================================================

/// A design item as it exists inside the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DesignEntry {
    pub image: String,
    pub quantity: QuantityInput,
}

impl DesignEntry {
    fn committed(&self) -> DesignItem {
        DesignItem::new(self.image.clone(), self.quantity.committed())
    }
}

/// Outcome of adding several images at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BatchAddReport {
    pub added: usize,
    /// Images rejected because the allocation ceiling was reached.
    pub skipped: usize,
}

// =============================================================================
// Torso-Design Allocator
// =============================================================================

/// Editable list of design items bounded by both caps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorsoDesignAllocator {
    entries: Vec<DesignEntry>,
}

impl TorsoDesignAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts editing from a persisted item list.
    pub fn from_items(items: &[DesignItem]) -> Self {
        TorsoDesignAllocator {
            entries: items
                .iter()
                .map(|item| DesignEntry {
                    image: item.image.clone(),
                    quantity: QuantityInput::Value(item.quantity),
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[DesignEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of committed quantities (blank counts as 1).
    pub fn total(&self) -> u32 {
        self.entries
            .iter()
            .map(|e| e.quantity.committed() as u32)
            .sum()
    }

    /// True when the list no longer fits `ceiling` (the catalog shrank).
    pub fn exceeds(&self, ceiling: AllocationCeiling) -> bool {
        self.total() > ceiling.limit()
    }

    /// Appends one design with quantity 1 if the ceiling has room.
    pub fn add_design(
        &mut self,
        image: impl Into<String>,
        ceiling: AllocationCeiling,
    ) -> ConstraintResult<usize> {
        ceiling.admits(self.total() + MIN_DESIGN_QUANTITY as u32)?;

        self.entries.push(DesignEntry {
            image: image.into(),
            quantity: QuantityInput::Value(MIN_DESIGN_QUANTITY),
        });
        Ok(self.entries.len() - 1)
    }

    /// Adds as many images as fit; the rest are reported as one skip count.
    ///
    /// ## Example
    /// ```rust
    /// use figforge_core::catalog::AllocationCeiling;
    /// use figforge_core::torso::TorsoDesignAllocator;
    ///
    /// let mut designs = TorsoDesignAllocator::new();
    /// let report = designs.add_designs(
    ///     ["a.png", "b.png", "c.png"],
    ///     AllocationCeiling::from_value(2),
    /// );
    /// assert_eq!((report.added, report.skipped), (2, 1));
    /// ```
    pub fn add_designs<I, S>(&mut self, images: I, ceiling: AllocationCeiling) -> BatchAddReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // Each new design enters at quantity 1
        let mut room = ceiling.headroom(self.total()) as usize;
        let mut report = BatchAddReport::default();
        for image in images {
            if room == 0 {
                report.skipped += 1;
                continue;
            }
            self.entries.push(DesignEntry {
                image: image.into(),
                quantity: QuantityInput::Value(MIN_DESIGN_QUANTITY),
            });
            room -= 1;
            report.added += 1;
        }

        if report.skipped > 0 {
            info!(
                added = report.added,
                skipped = report.skipped,
                ceiling = ceiling.limit(),
                "Design batch partially added"
            );
        }
        report
    }

    /// Sets the quantity of one design from raw input text.
    ///
    /// ## Checks (in order)
    /// 1. index exists
    /// 2. parsed value ≤ 4
    /// 3. Σ(other designs) + value ≤ ceiling, unless the edit lowers the
    ///    design's quantity (a reduction can only move the bag toward the cap)
    pub fn set_quantity(
        &mut self,
        index: usize,
        raw: &str,
        ceiling: AllocationCeiling,
    ) -> ConstraintResult<QuantityInput> {
        let len = self.entries.len();
        let current = self
            .entries
            .get(index)
            .map(|e| e.quantity)
            .ok_or(ConstraintViolation::IndexOutOfRange { index, len })?;

        let next = parse_quantity_input(raw)?;

        if next.committed() > current.committed() {
            let others = self.total() - current.committed() as u32;
            if let Err(e) = ceiling.admits(others + next.committed() as u32) {
                debug!(index, raw, ceiling = ceiling.limit(), "Design quantity refused");
                return Err(e);
            }
        }

        self.entries[index].quantity = next;
        Ok(next)
    }

    /// Removes one design. Always satisfies both caps.
    pub fn remove_design(&mut self, index: usize) -> ConstraintResult<DesignEntry> {
        if index >= self.entries.len() {
            return Err(ConstraintViolation::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(index))
    }

    /// Coerces blanks to 1 and returns the committed item list.
    pub fn commit(&self) -> Vec<DesignItem> {
        self.entries.iter().map(DesignEntry::committed).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BundleTier;

    fn filled(n: usize, quantity: u8) -> TorsoDesignAllocator {
        let items: Vec<DesignItem> = (0..n)
            .map(|i| DesignItem::new(format!("img/{}.png", i), quantity))
            .collect();
        TorsoDesignAllocator::from_items(&items)
    }

    #[test]
    fn test_parse_quantity_input() {
        assert_eq!(parse_quantity_input("4"), Ok(QuantityInput::Value(4)));
        assert_eq!(parse_quantity_input("0"), Ok(QuantityInput::Blank));
        assert_eq!(parse_quantity_input("abc"), Ok(QuantityInput::Blank));
        assert_eq!(
            parse_quantity_input("12"),
            Err(ConstraintViolation::DesignQuantityTooLarge {
                requested: 12,
                max: 4
            })
        );
        assert!(parse_quantity_input("99999999999999999999").is_err());
    }

    #[test]
    fn test_blank_renders_empty_and_commits_as_one() {
        assert_eq!(QuantityInput::Blank.to_string(), "");
        assert_eq!(QuantityInput::Value(3).to_string(), "3");

        let mut designs = filled(2, 2);
        let ceiling = AllocationCeiling::from_value(100);
        designs.set_quantity(0, "", ceiling).unwrap();

        assert!(designs.entries()[0].quantity.is_blank());
        assert_eq!(designs.commit()[0].quantity, 1);
        assert_eq!(designs.total(), 3);
    }

    #[test]
    fn test_set_quantity_rejects_above_four() {
        let mut designs = filled(1, 1);
        let result = designs.set_quantity(0, "5", AllocationCeiling::from_value(100));
        assert!(matches!(
            result,
            Err(ConstraintViolation::DesignQuantityTooLarge { requested: 5, .. })
        ));
        assert_eq!(designs.entries()[0].quantity, QuantityInput::Value(1));
    }

    #[test]
    fn test_set_quantity_rejects_aggregate_overflow() {
        // 3 designs at 4 = 12, ceiling 13
        let mut designs = filled(3, 4);
        designs.set_quantity(0, "1", AllocationCeiling::from_value(13)).unwrap();
        assert_eq!(designs.total(), 9);

        // others = 8, 8 + 4 = 12 ≤ 13 ok
        designs.set_quantity(0, "4", AllocationCeiling::from_value(13)).unwrap();

        // Now add a fourth design: 12 + 1 = 13
        designs.add_design("img/x.png", AllocationCeiling::from_value(13)).unwrap();

        // others = 12, 12 + 2 = 14 > 13
        assert_eq!(
            designs.set_quantity(3, "2", AllocationCeiling::from_value(13)),
            Err(ConstraintViolation::AllocationCeilingExceeded {
                requested_total: 14,
                ceiling: 13
            })
        );
        assert_eq!(designs.total(), 13);
    }

    #[test]
    fn test_reduction_allowed_when_ceiling_shrank() {
        let mut designs = filled(30, 4); // 120
        let ceiling = AllocationCeiling::from_value(100);
        assert!(designs.exceeds(ceiling));

        assert!(designs.set_quantity(0, "2", ceiling).is_ok());
        assert!(designs.set_quantity(0, "3", ceiling).is_err());
    }

    #[test]
    fn test_set_quantity_bad_index() {
        let mut designs = filled(1, 1);
        assert_eq!(
            designs.set_quantity(3, "1", AllocationCeiling::from_value(100)),
            Err(ConstraintViolation::IndexOutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn test_design_rejected_at_smallest_bundle() {
        let bundles = vec![
            BundleTier::new("b-100", "100", 100, 1, 100),
            BundleTier::new("b-300", "300", 300, 1, 300),
        ];
        let ceiling = AllocationCeiling::from_bundles(&bundles);
        assert_eq!(ceiling.limit(), 100);

        // 25 designs at 4 already reach the ceiling
        let mut designs = filled(25, 4);
        assert_eq!(designs.total(), 100);

        let report = designs.add_designs(["late.png"], ceiling);
        assert_eq!(report, BatchAddReport { added: 0, skipped: 1 });
        assert_eq!(designs.len(), 25);
    }

    #[test]
    fn test_batch_add_fills_remaining_room() {
        let mut designs = filled(24, 4); // 96
        let report = designs.add_designs(
            (0..6).map(|i| format!("new/{}.png", i)),
            AllocationCeiling::from_value(100),
        );
        assert_eq!(report, BatchAddReport { added: 4, skipped: 2 });
        assert_eq!(designs.total(), 100);
    }

    #[test]
    fn test_remove_design() {
        let mut designs = filled(2, 3);
        let removed = designs.remove_design(0).unwrap();
        assert_eq!(removed.image, "img/0.png");
        assert_eq!(designs.total(), 3);
        assert!(designs.remove_design(5).is_err());
    }
}
