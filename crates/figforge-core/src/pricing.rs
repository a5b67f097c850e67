//! # Price Aggregator
//!
//! Pure computation of the order total from a selection and the catalog.
//!
//! ```text
//! total = bundle.total_price            (0 if none)
//!       + addon.price                   (0 if none committed)
//!       + Σ option.price × quantity     (extra bags)
//!       + shipping                      (only when anything is selected)
//! ```
//!
//! Lines are looked up by id in the snapshot on every call, so the result
//! depends only on its inputs and never on call history.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::CatalogSnapshot;
use crate::extra_bags::ExtraBagAllocator;
use crate::money::Money;

/// Borrowed view of the priced parts of a session.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub bundle_id: Option<&'a str>,
    pub addon_id: Option<&'a str>,
    pub extra_bags: &'a ExtraBagAllocator,
    pub torso_bag_id: Option<&'a str>,
}

impl Selection<'_> {
    /// True when at least one priced or shipped item is selected.
    pub fn has_any(&self) -> bool {
        self.bundle_id.is_some()
            || self.addon_id.is_some()
            || !self.extra_bags.is_empty()
            || self.torso_bag_id.is_some()
    }
}

/// Order total split by line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub bundle: Money,
    pub addon: Money,
    pub extra_bags: Money,
    pub shipping: Money,
    pub total: Money,
}

/// Computes the price breakdown for `selection`.
///
/// Ids that do not resolve in `catalog` contribute nothing.
pub fn compute_breakdown(
    selection: &Selection<'_>,
    catalog: &CatalogSnapshot,
    shipping: Money,
) -> PriceBreakdown {
    let bundle = selection
        .bundle_id
        .and_then(|id| catalog.bundle(id))
        .map(|b| b.total_price())
        .unwrap_or_default();

    let addon = selection
        .addon_id
        .and_then(|id| catalog.addon(id))
        .map(|a| a.price())
        .unwrap_or_default();

    let extra_bags: Money = selection
        .extra_bags
        .iter()
        .filter_map(|(id, quantity)| {
            catalog
                .extra_bag_option(id)
                .map(|option| option.price() * quantity)
        })
        .sum();

    let shipping = if selection.has_any() {
        shipping
    } else {
        Money::zero()
    };

    PriceBreakdown {
        bundle,
        addon,
        extra_bags,
        shipping,
        total: bundle + addon + extra_bags + shipping,
    }
}

/// Convenience wrapper returning only the total.
pub fn compute_total(selection: &Selection<'_>, catalog: &CatalogSnapshot, shipping: Money) -> Money {
    compute_breakdown(selection, catalog, shipping).total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ExtraBagCeiling;
    use crate::types::{AddonOption, BundleTier, ExtraBagOption};
    use crate::FLAT_SHIPPING_CENTS;

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot {
            bundles: vec![BundleTier::new("b-300", "300", 300, 83, 25_000)],
            addons: vec![AddonOption::new("a-1", "Weapons", 4_500)],
            extra_bag_options: vec![
                ExtraBagOption::new("x-legs", "legs", 1_500),
                ExtraBagOption::new("x-hair", "hair", 2_000),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_reference_total() {
        let catalog = catalog();
        let ceiling = ExtraBagCeiling::for_bundle(catalog.bundle("b-300"));
        let mut bags = ExtraBagAllocator::new();
        bags.increase("x-legs", ceiling).unwrap();
        bags.increase("x-legs", ceiling).unwrap();
        bags.increase("x-hair", ceiling).unwrap();

        let selection = Selection {
            bundle_id: Some("b-300"),
            addon_id: Some("a-1"),
            extra_bags: &bags,
            torso_bag_id: None,
        };
        let breakdown =
            compute_breakdown(&selection, &catalog, Money::from_cents(FLAT_SHIPPING_CENTS));

        assert_eq!(breakdown.extra_bags, Money::from_cents(5_000));
        assert_eq!(breakdown.total, Money::from_cents(35_500));
        assert_eq!(breakdown.total.to_string(), "355.00");
    }

    #[test]
    fn test_empty_selection_has_no_shipping() {
        let bags = ExtraBagAllocator::new();
        let selection = Selection {
            bundle_id: None,
            addon_id: None,
            extra_bags: &bags,
            torso_bag_id: None,
        };
        let total = compute_total(&selection, &catalog(), Money::from_cents(1_000));
        assert!(total.is_zero());
    }

    #[test]
    fn test_idempotent() {
        let catalog = catalog();
        let bags = ExtraBagAllocator::new();
        let selection = Selection {
            bundle_id: Some("b-300"),
            addon_id: None,
            extra_bags: &bags,
            torso_bag_id: Some("t-1"),
        };
        let shipping = Money::from_cents(1_000);
        let first = compute_breakdown(&selection, &catalog, shipping);
        let second = compute_breakdown(&selection, &catalog, shipping);
        assert_eq!(first, second);
        assert_eq!(first.total, Money::from_cents(26_000));
    }

    #[test]
    fn test_unknown_ids_contribute_nothing() {
        let bags = ExtraBagAllocator::new();
        let selection = Selection {
            bundle_id: None,
            addon_id: Some("missing"),
            extra_bags: &bags,
            torso_bag_id: None,
        };
        let breakdown = compute_breakdown(&selection, &catalog(), Money::from_cents(1_000));
        assert!(breakdown.addon.is_zero());
        assert_eq!(breakdown.total, Money::from_cents(1_000));
    }
}
