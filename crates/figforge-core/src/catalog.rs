//! # Catalog Snapshot
//!
//! Read-only catalog data plus the two ceilings derived from it.
//!
//! ## Derived Ceilings
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Where the Ceilings Come From                         │
//! │                                                                         │
//! │  Selected bundle ─────► ExtraBagCeiling = floor(minifigs / 100)        │
//! │    (session state)       bounds Σ extra bag quantities                  │
//! │                                                                         │
//! │  ALL active bundles ──► AllocationCeiling = min(minifigs), else 100    │
//! │    (catalog state)       bounds Σ torso design quantities               │
//! │                                                                         │
//! │  Both are recomputed from the data passed in; nothing is cached.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{ConstraintResult, ConstraintViolation};
use crate::types::{AddonOption, BundleTier, ExtraBagOption, TorsoBag};
use crate::validation::{self, ValidationResult};
use crate::{DEFAULT_ALLOCATION_CEILING, MINIFIGS_PER_EXTRA_BAG};

// =============================================================================
// Extra-Bag Ceiling
// =============================================================================

/// Maximum number of extra bags the selected bundle allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExtraBagCeiling(u32);

impl ExtraBagCeiling {
    /// `floor(minifig_quantity / 100)`; zero when no bundle is selected.
    ///
    /// ## Example
    /// ```rust
    /// use figforge_core::catalog::ExtraBagCeiling;
    /// use figforge_core::types::BundleTier;
    ///
    /// let bundle = BundleTier::new("b", "250 Minifigs", 250, 100, 25_000);
    /// assert_eq!(ExtraBagCeiling::for_bundle(Some(&bundle)).limit(), 2);
    /// assert_eq!(ExtraBagCeiling::for_bundle(None).limit(), 0);
    /// ```
    pub fn for_bundle(bundle: Option<&BundleTier>) -> Self {
        ExtraBagCeiling(bundle.map_or(0, |b| b.minifig_quantity / MINIFIGS_PER_EXTRA_BAG))
    }

    #[inline]
    pub const fn limit(&self) -> u32 {
        self.0
    }

    /// True when `total` extra bags fit under this ceiling.
    #[inline]
    pub const fn admits(&self, total: u32) -> bool {
        total <= self.0
    }
}

// =============================================================================
// Allocation Ceiling
// =============================================================================

/// Maximum total design quantity a torso bag may contain.
///
/// Tied to the *smallest* active bundle so that any bag stays fully
/// allocatable even if every larger bundle is later deactivated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AllocationCeiling(u32);

impl AllocationCeiling {
    /// `min(minifig_quantity)` over active bundles, 100 when none is active.
    ///
    /// ## Example
    /// ```rust
    /// use figforge_core::catalog::AllocationCeiling;
    /// use figforge_core::types::BundleTier;
    ///
    /// let bundles = vec![
    ///     BundleTier::new("small", "50", 50, 1, 50).inactive(),
    ///     BundleTier::new("mid", "100", 100, 1, 100),
    ///     BundleTier::new("big", "300", 300, 1, 300),
    /// ];
    /// assert_eq!(AllocationCeiling::from_bundles(&bundles).limit(), 100);
    /// assert_eq!(AllocationCeiling::from_bundles(&[]).limit(), 100);
    /// ```
    pub fn from_bundles(bundles: &[BundleTier]) -> Self {
        AllocationCeiling(
            bundles
                .iter()
                .filter(|b| b.is_active)
                .map(|b| b.minifig_quantity)
                .min()
                .unwrap_or(DEFAULT_ALLOCATION_CEILING),
        )
    }

    /// Builds a ceiling from an explicit value (tests and fixtures).
    #[inline]
    pub const fn from_value(max: u32) -> Self {
        AllocationCeiling(max)
    }

    #[inline]
    pub const fn limit(&self) -> u32 {
        self.0
    }

    /// Checks a proposed total, naming the ceiling on refusal.
    pub fn admits(&self, requested_total: u32) -> ConstraintResult<()> {
        if requested_total > self.0 {
            return Err(ConstraintViolation::AllocationCeilingExceeded {
                requested_total,
                ceiling: self.0,
            });
        }
        Ok(())
    }

    /// How many more unit-quantity designs fit on top of `current_total`.
    #[inline]
    pub const fn headroom(&self, current_total: u32) -> u32 {
        self.0.saturating_sub(current_total)
    }
}

// =============================================================================
// Catalog Snapshot
// =============================================================================

/// Everything the configurator reads from the catalog collaborators.
///
/// Collections keep the order the collaborators returned them in; "first
/// bundle" always means first in this order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub bundles: Vec<BundleTier>,
    pub addons: Vec<AddonOption>,
    pub extra_bag_options: Vec<ExtraBagOption>,
    pub torso_bags: Vec<TorsoBag>,
}

impl CatalogSnapshot {
    /// A catalog without bundles cannot host a session.
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn bundle(&self, id: &str) -> Option<&BundleTier> {
        self.bundles.iter().find(|b| b.id == id)
    }

    pub fn addon(&self, id: &str) -> Option<&AddonOption> {
        self.addons.iter().find(|a| a.id == id)
    }

    pub fn extra_bag_option(&self, id: &str) -> Option<&ExtraBagOption> {
        self.extra_bag_options.iter().find(|o| o.id == id)
    }

    pub fn torso_bag(&self, id: &str) -> Option<&TorsoBag> {
        self.torso_bags.iter().find(|t| t.id == id)
    }

    /// First active bundle in catalog order (the session default).
    pub fn default_bundle(&self) -> Option<&BundleTier> {
        self.active_bundles().next()
    }

    pub fn active_bundles(&self) -> impl Iterator<Item = &BundleTier> {
        self.bundles.iter().filter(|b| b.is_active)
    }

    pub fn active_extra_bag_options(&self) -> impl Iterator<Item = &ExtraBagOption> {
        self.extra_bag_options.iter().filter(|o| o.is_active)
    }

    pub fn active_torso_bags(&self) -> impl Iterator<Item = &TorsoBag> {
        self.torso_bags.iter().filter(|t| t.is_active)
    }

    /// Allocation ceiling of this catalog.
    pub fn allocation_ceiling(&self) -> AllocationCeiling {
        AllocationCeiling::from_bundles(&self.bundles)
    }

    /// Looks up an active bundle, naming the reason on refusal.
    pub fn require_active_bundle(&self, id: &str) -> ConstraintResult<&BundleTier> {
        let bundle = self.bundle(id).ok_or_else(|| not_in_catalog("Bundle", id))?;
        if !bundle.is_active {
            return Err(inactive("Bundle", id));
        }
        Ok(bundle)
    }

    pub fn require_addon(&self, id: &str) -> ConstraintResult<&AddonOption> {
        self.addon(id).ok_or_else(|| not_in_catalog("Add-on", id))
    }

    pub fn require_active_extra_bag_option(&self, id: &str) -> ConstraintResult<&ExtraBagOption> {
        let option = self
            .extra_bag_option(id)
            .ok_or_else(|| not_in_catalog("Extra bag option", id))?;
        if !option.is_active {
            return Err(inactive("Extra bag option", id));
        }
        Ok(option)
    }

    pub fn require_active_torso_bag(&self, id: &str) -> ConstraintResult<&TorsoBag> {
        let bag = self
            .torso_bag(id)
            .ok_or_else(|| not_in_catalog("Torso bag", id))?;
        if !bag.is_active {
            return Err(inactive("Torso bag", id));
        }
        Ok(bag)
    }

    /// Validates every entity and id uniqueness per collection.
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_unique_ids("bundle id", self.bundles.iter().map(|b| b.id.as_str()))?;
        validation::validate_unique_ids("addon id", self.addons.iter().map(|a| a.id.as_str()))?;
        validation::validate_unique_ids(
            "extra bag id",
            self.extra_bag_options.iter().map(|o| o.id.as_str()),
        )?;
        validation::validate_unique_ids(
            "torso bag id",
            self.torso_bags.iter().map(|t| t.id.as_str()),
        )?;

        self.bundles.iter().try_for_each(validation::validate_bundle)?;
        self.addons.iter().try_for_each(validation::validate_addon)?;
        self.extra_bag_options
            .iter()
            .try_for_each(validation::validate_extra_bag_option)?;
        self.torso_bags
            .iter()
            .try_for_each(validation::validate_torso_bag)
    }
}

fn not_in_catalog(kind: &'static str, id: &str) -> ConstraintViolation {
    ConstraintViolation::NotInCatalog {
        kind,
        id: id.to_string(),
    }
}

fn inactive(kind: &'static str, id: &str) -> ConstraintViolation {
    ConstraintViolation::Inactive {
        kind,
        id: id.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DesignItem;

    fn bundles() -> Vec<BundleTier> {
        vec![
            BundleTier::new("b-100", "100 Minifigs", 100, 150, 15_000),
            BundleTier::new("b-300", "300 Minifigs", 300, 120, 36_000),
        ]
    }

    #[test]
    fn test_extra_bag_ceiling_floor_division() {
        let cases = [(99, 0), (100, 1), (199, 1), (200, 2), (1_050, 10)];
        for (minifigs, expected) in cases {
            let bundle = BundleTier::new("b", "b", minifigs, 1, 1);
            assert_eq!(ExtraBagCeiling::for_bundle(Some(&bundle)).limit(), expected);
        }
    }

    #[test]
    fn test_allocation_ceiling_is_min_of_active() {
        assert_eq!(AllocationCeiling::from_bundles(&bundles()).limit(), 100);

        let mut all = bundles();
        all[0].is_active = false;
        assert_eq!(AllocationCeiling::from_bundles(&all).limit(), 300);
    }

    #[test]
    fn test_allocation_ceiling_defaults_to_100() {
        let mut all = bundles();
        for b in &mut all {
            b.is_active = false;
        }
        assert_eq!(AllocationCeiling::from_bundles(&all).limit(), 100);
        assert_eq!(AllocationCeiling::from_bundles(&[]).limit(), 100);
    }

    #[test]
    fn test_allocation_ceiling_admits() {
        let ceiling = AllocationCeiling::from_value(100);
        assert!(ceiling.admits(100).is_ok());
        assert_eq!(
            ceiling.admits(101),
            Err(ConstraintViolation::AllocationCeilingExceeded {
                requested_total: 101,
                ceiling: 100
            })
        );
        assert_eq!(ceiling.headroom(97), 3);
        assert_eq!(ceiling.headroom(120), 0);
    }

    #[test]
    fn test_default_bundle_skips_inactive() {
        let mut catalog = CatalogSnapshot {
            bundles: bundles(),
            ..Default::default()
        };
        assert_eq!(catalog.default_bundle().map(|b| b.id.as_str()), Some("b-100"));

        catalog.bundles[0].is_active = false;
        assert_eq!(catalog.default_bundle().map(|b| b.id.as_str()), Some("b-300"));
    }

    #[test]
    fn test_require_active_lookups() {
        let mut catalog = CatalogSnapshot {
            bundles: bundles(),
            torso_bags: vec![TorsoBag::new("t-1", "Pirates", vec![DesignItem::new("p.png", 1)])
                .inactive()],
            ..Default::default()
        };
        catalog.bundles[1].is_active = false;

        assert!(catalog.require_active_bundle("b-100").is_ok());
        assert!(matches!(
            catalog.require_active_bundle("b-300"),
            Err(ConstraintViolation::Inactive { .. })
        ));
        assert!(matches!(
            catalog.require_active_bundle("nope"),
            Err(ConstraintViolation::NotInCatalog { .. })
        ));
        assert!(matches!(
            catalog.require_active_torso_bag("t-1"),
            Err(ConstraintViolation::Inactive { kind: "Torso bag", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let mut catalog = CatalogSnapshot {
            bundles: bundles(),
            ..Default::default()
        };
        assert!(catalog.validate().is_ok());

        catalog.bundles.push(BundleTier::new("b-100", "again", 100, 1, 1));
        assert!(catalog.validate().is_err());
    }
}
