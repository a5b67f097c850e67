//! # Catalog Types
//!
//! Catalog entities consumed by the configurator. These arrive from the
//! catalog collaborators and are never mutated by the configurator itself.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Catalog Entities                                │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   BundleTier    │   │  AddonOption    │   │ ExtraBagOption  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  minifig_qty    │   │  price_cents    │   │  part_category  │       │
//! │  │  total_price    │   │  items[]  ──────┼─► │  price_cents    │       │
//! │  │  is_active      │   │   (AddonItem)   │   │  is_active      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │   TorsoBag                              │                           │
//! │  │  ─────────────                          │                           │
//! │  │  id, name, is_active                    │                           │
//! │  │  items: [DesignItem { image, qty 1-4 }] │ ← order is persisted      │
//! │  └─────────────────────────────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Bundle Tier
// =============================================================================

/// A purchasable base quantity of minifigs at a fixed unit price.
///
/// Bundles drive both derived ceilings: the selected bundle sets the
/// extra-bag ceiling, the smallest active bundle sets the allocation ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BundleTier {
    pub id: String,

    pub name: String,

    /// Number of minifigs in the bundle (> 0).
    pub minifig_quantity: u32,

    /// Price per minifig in cents.
    pub unit_price_cents: i64,

    /// Price of the whole bundle in cents. This is what the order pays.
    pub total_price_cents: i64,

    pub is_active: bool,
}

impl BundleTier {
    /// Creates an active bundle.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        minifig_quantity: u32,
        unit_price_cents: i64,
        total_price_cents: i64,
    ) -> Self {
        BundleTier {
            id: id.into(),
            name: name.into(),
            minifig_quantity,
            unit_price_cents,
            total_price_cents,
            is_active: true,
        }
    }

    /// Marks the bundle inactive (builder style, used by fixtures and seeds).
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

// =============================================================================
// Add-on
// =============================================================================

/// One constituent item of an add-on (shown in the preview step).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AddonItem {
    pub name: String,
    pub price_cents: i64,
    /// Reference to a catalog color.
    pub color: String,
}

impl AddonItem {
    pub fn new(name: impl Into<String>, price_cents: i64, color: impl Into<String>) -> Self {
        AddonItem {
            name: name.into(),
            price_cents,
            color: color.into(),
        }
    }
}

/// An optional add-on to the bundle.
///
/// An add-on with constituent items must go through a preview step before
/// it is committed to the session (see [`crate::addon`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AddonOption {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    #[serde(default)]
    pub items: Vec<AddonItem>,
}

impl AddonOption {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price_cents: i64) -> Self {
        AddonOption {
            id: id.into(),
            name: name.into(),
            price_cents,
            items: Vec::new(),
        }
    }

    /// Attaches constituent items.
    pub fn with_items(mut self, items: Vec<AddonItem>) -> Self {
        self.items = items;
        self
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// True when selecting this add-on needs a preview confirmation.
    #[inline]
    pub fn requires_preview(&self) -> bool {
        !self.items.is_empty()
    }
}

// =============================================================================
// Extra Bag Option
// =============================================================================

/// A separately priced lot of parts from one part category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExtraBagOption {
    pub id: String,

    /// Reference to the part category this bag contains.
    pub part_category: String,

    /// Price per bag in cents.
    pub price_cents: i64,

    pub is_active: bool,
}

impl ExtraBagOption {
    /// Creates an active extra-bag option.
    pub fn new(id: impl Into<String>, part_category: impl Into<String>, price_cents: i64) -> Self {
        ExtraBagOption {
            id: id.into(),
            part_category: part_category.into(),
            price_cents,
            is_active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Torso Bag
// =============================================================================

/// One torso design inside a torso bag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DesignItem {
    /// Reference to the uploaded design image.
    pub image: String,

    /// Allocated quantity, 1-4.
    pub quantity: u8,
}

impl DesignItem {
    pub fn new(image: impl Into<String>, quantity: u8) -> Self {
        DesignItem {
            image: image.into(),
            quantity,
        }
    }
}

/// A named collection of torso designs offered alongside a bundle.
///
/// The order of `items` is significant: it is the display and allocation
/// order, and it is persisted independently of the items themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TorsoBag {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub items: Vec<DesignItem>,
}

impl TorsoBag {
    /// Creates an active bag with the given items.
    pub fn new(id: impl Into<String>, name: impl Into<String>, items: Vec<DesignItem>) -> Self {
        TorsoBag {
            id: id.into(),
            name: name.into(),
            is_active: true,
            items,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Sum of all design quantities.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity as u32).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addon_requires_preview_only_with_items() {
        let plain = AddonOption::new("a-1", "Display stand", 4_500);
        assert!(!plain.requires_preview());

        let kit = plain
            .clone()
            .with_items(vec![AddonItem::new("Cape", 150, "red")]);
        assert!(kit.requires_preview());
    }

    #[test]
    fn test_torso_bag_total_quantity() {
        let bag = TorsoBag::new(
            "t-1",
            "Knights",
            vec![DesignItem::new("img/a.png", 4), DesignItem::new("img/b.png", 2)],
        );
        assert_eq!(bag.total_quantity(), 6);
    }

    #[test]
    fn test_camel_case_serialization() {
        let bundle = BundleTier::new("b-1", "100 Minifigs", 100, 150, 15_000);
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["minifigQuantity"], 100);
        assert_eq!(json["totalPriceCents"], 15_000);
        assert_eq!(json["isActive"], true);
    }
}
