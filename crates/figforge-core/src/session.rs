//! # Configuration Session
//!
//! Single source of truth for one in-progress dealer order.
//!
//! ## Responsibilities
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    ConfigurationSession                                 │
//! │                                                                         │
//! │   Arc<CatalogSnapshot> (read-only)                                      │
//! │        │                                                                │
//! │        ├──► selected bundle ───► ExtraBagCeiling ──► ExtraBagAllocator  │
//! │        │         │                                                      │
//! │        │         └── downgrade below current total ──► clear all bags   │
//! │        │                                                                │
//! │        ├──► AddonState (preview → commit)                               │
//! │        │                                                                │
//! │        ├──► selected torso bag (toggle) ──► ReorderEngine (re-seeded)   │
//! │        │                                                                │
//! │        └──► compute_total / order_summary (pure)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation either succeeds or returns a [`ConstraintViolation`] with
//! the session left exactly as it was.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::addon::{AddonOutcome, AddonState};
use crate::catalog::{AllocationCeiling, CatalogSnapshot, ExtraBagCeiling};
use crate::error::{ConstraintResult, ConstraintViolation, CoreError, CoreResult};
use crate::extra_bags::ExtraBagAllocator;
use crate::money::Money;
use crate::pricing::{self, PriceBreakdown, Selection};
use crate::reorder::{ReorderEngine, SavePlan};
use crate::types::{AddonOption, BundleTier, DesignItem};
use crate::FLAT_SHIPPING_CENTS;

// =============================================================================
// Summary Types
// =============================================================================

/// One priced extra-bag line of the order summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExtraBagLine {
    pub option_id: String,
    pub part_category: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

/// The order as handed to checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub bundle: Option<BundleTier>,
    pub addon: Option<AddonOption>,
    pub extra_bag_lines: Vec<ExtraBagLine>,
    pub torso_bag_id: Option<String>,
    pub breakdown: PriceBreakdown,
    pub total: Money,
}

/// What a catalog refresh changed in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub bundle_changed: bool,
    pub extra_bags_cleared: bool,
    pub dropped_extra_bag_options: usize,
    pub addon_cleared: bool,
    pub torso_bag_cleared: bool,
    pub reorder_reseeded: bool,
    /// The kept torso bag holds more designs than the new ceiling allows.
    pub torso_bag_over_ceiling: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogRefresh {
    /// The new catalog has no bundles; every selection was dropped.
    Reset,
    Applied(RefreshReport),
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Clone)]
pub struct ConfigurationSession {
    catalog: Arc<CatalogSnapshot>,
    selected_bundle_id: Option<String>,
    addon: AddonState,
    extra_bags: ExtraBagAllocator,
    selected_torso_bag_id: Option<String>,
    reorder: Option<ReorderEngine>,
    shipping: Money,
}

impl ConfigurationSession {
    /// Creates a session over `catalog`, defaulting to its first active bundle.
    ///
    /// Fails with [`CoreError::CatalogUnavailable`] when the catalog has no
    /// bundles.
    pub fn new(catalog: Arc<CatalogSnapshot>) -> CoreResult<Self> {
        if catalog.is_empty() {
            return Err(CoreError::CatalogUnavailable {
                reason: "bundle catalog is empty".to_string(),
            });
        }

        let selected_bundle_id = catalog.default_bundle().map(|b| b.id.clone());
        Ok(ConfigurationSession {
            catalog,
            selected_bundle_id,
            addon: AddonState::default(),
            extra_bags: ExtraBagAllocator::new(),
            selected_torso_bag_id: None,
            reorder: None,
            shipping: Money::from_cents(FLAT_SHIPPING_CENTS),
        })
    }

    /// Overrides the flat shipping fee.
    pub fn with_shipping(mut self, shipping: Money) -> Self {
        self.shipping = shipping;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn catalog(&self) -> &CatalogSnapshot {
        &self.catalog
    }

    pub fn shipping(&self) -> Money {
        self.shipping
    }

    pub fn selected_bundle_id(&self) -> Option<&str> {
        self.selected_bundle_id.as_deref()
    }

    pub fn selected_bundle(&self) -> Option<&BundleTier> {
        self.selected_bundle_id
            .as_deref()
            .and_then(|id| self.catalog.bundle(id))
    }

    pub fn addon_state(&self) -> &AddonState {
        &self.addon
    }

    pub fn selected_addon_id(&self) -> Option<&str> {
        self.addon.committed_id()
    }

    pub fn extra_bags(&self) -> &ExtraBagAllocator {
        &self.extra_bags
    }

    pub fn selected_torso_bag_id(&self) -> Option<&str> {
        self.selected_torso_bag_id.as_deref()
    }

    /// Zero or one selected torso bag ids.
    pub fn selected_torso_bag_ids(&self) -> Vec<&str> {
        self.selected_torso_bag_id.as_deref().into_iter().collect()
    }

    pub fn extra_bag_ceiling(&self) -> ExtraBagCeiling {
        ExtraBagCeiling::for_bundle(self.selected_bundle())
    }

    pub fn allocation_ceiling(&self) -> AllocationCeiling {
        self.catalog.allocation_ceiling()
    }

    // -------------------------------------------------------------------------
    // Bundle
    // -------------------------------------------------------------------------

    /// Selects a bundle tier.
    ///
    /// When the new extra-bag ceiling is below the current extra-bag total the
    /// whole extra-bag selection is cleared. Returns `true` in that case.
    pub fn select_bundle(&mut self, bundle_id: &str) -> ConstraintResult<bool> {
        let bundle = self.catalog.require_active_bundle(bundle_id)?;
        let ceiling = ExtraBagCeiling::for_bundle(Some(bundle));

        self.selected_bundle_id = Some(bundle_id.to_string());
        Ok(self.enforce_extra_bag_ceiling(ceiling))
    }

    fn enforce_extra_bag_ceiling(&mut self, ceiling: ExtraBagCeiling) -> bool {
        if self.extra_bags.fits_within(ceiling) {
            return false;
        }
        info!(
            total = self.extra_bags.total(),
            max = ceiling.limit(),
            "Extra bags cleared after bundle change"
        );
        self.extra_bags.clear();
        true
    }

    // -------------------------------------------------------------------------
    // Add-on
    // -------------------------------------------------------------------------

    /// Selects (or with `None`, clears) the add-on.
    ///
    /// Re-selecting the committed add-on clears it. Add-ons with constituent
    /// items open a preview that must be confirmed.
    pub fn select_addon(&mut self, addon_id: Option<&str>) -> ConstraintResult<AddonOutcome> {
        let addon = addon_id
            .map(|id| self.catalog.require_addon(id))
            .transpose()?;
        Ok(self.addon.select(addon))
    }

    pub fn confirm_addon_preview(&mut self) -> ConstraintResult<String> {
        self.addon.confirm_preview()
    }

    pub fn cancel_addon_preview(&mut self) -> ConstraintResult<()> {
        self.addon.cancel_preview()
    }

    // -------------------------------------------------------------------------
    // Extra Bags
    // -------------------------------------------------------------------------

    pub fn increase_extra_bag(&mut self, option_id: &str) -> ConstraintResult<u32> {
        self.catalog.require_active_extra_bag_option(option_id)?;
        let ceiling = self.extra_bag_ceiling();
        self.extra_bags.increase(option_id, ceiling)
    }

    pub fn decrease_extra_bag(&mut self, option_id: &str) -> u32 {
        self.extra_bags.decrease(option_id)
    }

    // -------------------------------------------------------------------------
    // Torso Bag & Reorder Draft
    // -------------------------------------------------------------------------

    /// Toggles the torso bag selection.
    ///
    /// Selecting the selected bag clears it; any other bag replaces it and
    /// re-seeds the reorder draft, discarding unsaved moves. Returns the
    /// selection after the call.
    pub fn select_torso_bag(&mut self, bag_id: &str) -> ConstraintResult<Option<&str>> {
        if self.reorder.as_ref().is_some_and(ReorderEngine::is_saving) {
            return Err(ConstraintViolation::ReorderInFlight);
        }

        if self.selected_torso_bag_id.as_deref() == Some(bag_id) {
            self.selected_torso_bag_id = None;
            self.reorder = None;
            return Ok(None);
        }

        let bag = self.catalog.require_active_torso_bag(bag_id)?;
        self.reorder = Some(ReorderEngine::seed(bag));
        self.selected_torso_bag_id = Some(bag_id.to_string());
        if let Err(violation) = self.check_torso_bag_allocation() {
            warn!(bag_id, %violation, "Selected torso bag is above the allocation ceiling");
        }
        Ok(self.selected_torso_bag_id.as_deref())
    }

    /// Checks the selected bag's total against the current allocation
    /// ceiling.
    ///
    /// A bag authored under a larger ceiling stays selectable after a
    /// smaller bundle is activated; this reports it so the caller can flag
    /// the bag for re-authoring.
    pub fn check_torso_bag_allocation(&self) -> ConstraintResult<()> {
        let Some(bag) = self
            .selected_torso_bag_id
            .as_deref()
            .and_then(|id| self.catalog.torso_bag(id))
        else {
            return Ok(());
        };
        self.allocation_ceiling().admits(bag.total_quantity())
    }

    pub fn reorder_draft(&self) -> Option<&ReorderEngine> {
        self.reorder.as_ref()
    }

    pub fn reorder_draft_mut(&mut self) -> ConstraintResult<&mut ReorderEngine> {
        self.reorder.as_mut().ok_or(ConstraintViolation::NoReorderDraft)
    }

    pub fn move_design(&mut self, from: usize, to: usize) -> ConstraintResult<bool> {
        self.reorder_draft_mut()?.move_item(from, to)
    }

    pub fn reset_reorder(&mut self) -> ConstraintResult<()> {
        self.reorder_draft_mut()?.reset()
    }

    pub fn begin_reorder_save(&mut self) -> ConstraintResult<SavePlan> {
        self.reorder_draft_mut()?.begin_save()
    }

    /// Records the outcome of the outstanding reorder save.
    ///
    /// On acceptance the snapshot's copy of the bag takes the new order too,
    /// so later refreshes compare against what was persisted.
    pub fn finish_reorder_save(&mut self, accepted: bool) -> ConstraintResult<()> {
        let draft = self.reorder_draft_mut()?;
        draft.finish_save(accepted)?;
        if !accepted {
            return Ok(());
        }

        let bag_id = draft.bag_id().to_string();
        let items = draft.draft_items();
        let catalog = Arc::make_mut(&mut self.catalog);
        if let Some(bag) = catalog.torso_bags.iter_mut().find(|b| b.id == bag_id) {
            bag.items = items;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Pricing
    // -------------------------------------------------------------------------

    fn selection(&self) -> Selection<'_> {
        Selection {
            bundle_id: self.selected_bundle_id.as_deref(),
            addon_id: self.addon.committed_id(),
            extra_bags: &self.extra_bags,
            torso_bag_id: self.selected_torso_bag_id.as_deref(),
        }
    }

    pub fn price_breakdown(&self) -> PriceBreakdown {
        pricing::compute_breakdown(&self.selection(), &self.catalog, self.shipping)
    }

    pub fn compute_total(&self) -> Money {
        pricing::compute_total(&self.selection(), &self.catalog, self.shipping)
    }

    pub fn order_summary(&self) -> OrderSummary {
        let breakdown = self.price_breakdown();
        let extra_bag_lines = self
            .extra_bags
            .iter()
            .filter_map(|(id, quantity)| {
                let option = self.catalog.extra_bag_option(id)?;
                Some(ExtraBagLine {
                    option_id: option.id.clone(),
                    part_category: option.part_category.clone(),
                    unit_price: option.price(),
                    quantity,
                    line_total: option.price() * quantity,
                })
            })
            .collect();

        OrderSummary {
            bundle: self.selected_bundle().cloned(),
            addon: self
                .addon
                .committed_id()
                .and_then(|id| self.catalog.addon(id))
                .cloned(),
            extra_bag_lines,
            torso_bag_id: self.selected_torso_bag_id.clone(),
            breakdown,
            total: breakdown.total,
        }
    }

    // -------------------------------------------------------------------------
    // Catalog Refresh
    // -------------------------------------------------------------------------

    /// Clears every selection and re-defaults the bundle.
    pub fn reset_to_defaults(&mut self) {
        self.selected_bundle_id = self.catalog.default_bundle().map(|b| b.id.clone());
        self.addon = AddonState::default();
        self.extra_bags.clear();
        self.selected_torso_bag_id = None;
        self.reorder = None;
    }

    /// Swaps in a refetched catalog and repairs every selection against it.
    pub fn replace_catalog(&mut self, catalog: Arc<CatalogSnapshot>) -> CatalogRefresh {
        self.catalog = catalog;

        if self.catalog.is_empty() {
            self.reset_to_defaults();
            info!("Catalog has no bundles, session reset");
            return CatalogRefresh::Reset;
        }

        let mut report = RefreshReport::default();
        let catalog = Arc::clone(&self.catalog);

        report.dropped_extra_bag_options = self
            .extra_bags
            .retain_options(|id| catalog.active_extra_bag_options().any(|o| o.id == id));

        report.addon_cleared = self.addon.retain(|id| catalog.addon(id).is_some());

        let bundle_still_active = self
            .selected_bundle_id
            .as_deref()
            .is_some_and(|id| catalog.bundle(id).is_some_and(|b| b.is_active));
        if !bundle_still_active {
            let next = catalog.default_bundle().map(|b| b.id.clone());
            report.bundle_changed = next != self.selected_bundle_id;
            self.selected_bundle_id = next;
        }
        report.extra_bags_cleared = self.enforce_extra_bag_ceiling(self.extra_bag_ceiling());

        self.refresh_torso_bag(&catalog, &mut report);
        if let Err(violation) = self.check_torso_bag_allocation() {
            warn!(%violation, "Kept torso bag is above the new allocation ceiling");
            report.torso_bag_over_ceiling = true;
        }

        debug!(?report, "Catalog replaced");
        CatalogRefresh::Applied(report)
    }

    fn refresh_torso_bag(&mut self, catalog: &CatalogSnapshot, report: &mut RefreshReport) {
        let Some(bag_id) = self.selected_torso_bag_id.clone() else {
            return;
        };

        let Some(bag) = catalog.active_torso_bags().find(|b| b.id == bag_id) else {
            self.selected_torso_bag_id = None;
            self.reorder = None;
            report.torso_bag_cleared = true;
            return;
        };

        // An outstanding save must be able to finish against its own seed.
        let reseed = match &self.reorder {
            Some(engine) if engine.is_saving() => false,
            Some(engine) => engine.seed_items() != bag.items,
            None => true,
        };
        if reseed {
            self.reorder = Some(ReorderEngine::seed(bag));
            report.reorder_reseeded = true;
        }
    }

    /// Items of the selected torso bag as the draft currently orders them.
    pub fn draft_items(&self) -> Option<Vec<DesignItem>> {
        self.reorder.as_ref().map(ReorderEngine::draft_items)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AddonItem, ExtraBagOption, TorsoBag};

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot {
            bundles: vec![
                BundleTier::new("b-300", "300 Minifigs", 300, 83, 25_000),
                BundleTier::new("b-100", "100 Minifigs", 100, 150, 15_000),
                BundleTier::new("b-500", "500 Minifigs", 500, 70, 35_000).inactive(),
            ],
            addons: vec![
                AddonOption::new("a-weapons", "Weapons", 4_500),
                AddonOption::new("a-capes", "Capes", 900)
                    .with_items(vec![AddonItem::new("Cape", 150, "red")]),
            ],
            extra_bag_options: vec![
                ExtraBagOption::new("x-legs", "legs", 1_500),
                ExtraBagOption::new("x-hair", "hair", 2_000),
                ExtraBagOption::new("x-old", "old", 100).inactive(),
            ],
            torso_bags: vec![
                TorsoBag::new(
                    "A",
                    "Space",
                    vec![
                        DesignItem::new("a.png", 1),
                        DesignItem::new("b.png", 2),
                        DesignItem::new("c.png", 3),
                    ],
                ),
                TorsoBag::new("B", "Castle", vec![DesignItem::new("d.png", 4)]),
            ],
        }
    }

    fn session() -> ConfigurationSession {
        ConfigurationSession::new(Arc::new(catalog())).unwrap()
    }

    #[test]
    fn test_new_defaults_to_first_active_bundle() {
        let session = session();
        assert_eq!(session.selected_bundle_id(), Some("b-300"));
        assert_eq!(session.extra_bag_ceiling().limit(), 3);
        assert_eq!(session.allocation_ceiling().limit(), 100);
    }

    #[test]
    fn test_new_rejects_empty_catalog() {
        let result = ConfigurationSession::new(Arc::new(CatalogSnapshot::default()));
        assert!(matches!(result, Err(CoreError::CatalogUnavailable { .. })));
    }

    #[test]
    fn test_bundle_downgrade_clears_extra_bags() {
        let mut session = session();
        session.increase_extra_bag("x-legs").unwrap();
        session.increase_extra_bag("x-hair").unwrap();

        // 100 minifigs allow one bag, two are selected
        assert_eq!(session.select_bundle("b-100"), Ok(true));
        assert!(session.extra_bags().is_empty());
    }

    #[test]
    fn test_bundle_change_within_ceiling_keeps_bags() {
        let mut session = session();
        session.increase_extra_bag("x-legs").unwrap();
        assert_eq!(session.select_bundle("b-100"), Ok(false));
        assert_eq!(session.extra_bags().quantity("x-legs"), 1);
    }

    #[test]
    fn test_select_inactive_bundle_refused() {
        let mut session = session();
        assert!(matches!(
            session.select_bundle("b-500"),
            Err(ConstraintViolation::Inactive { .. })
        ));
        assert_eq!(session.selected_bundle_id(), Some("b-300"));
    }

    #[test]
    fn test_inactive_extra_bag_refused() {
        let mut session = session();
        assert!(session.increase_extra_bag("x-old").is_err());
        assert!(session.increase_extra_bag("x-missing").is_err());
        assert!(session.extra_bags().is_empty());
    }

    #[test]
    fn test_addon_preview_flow() {
        let mut session = session();
        session.select_addon(Some("a-weapons")).unwrap();
        assert_eq!(
            session.select_addon(Some("a-capes")),
            Ok(AddonOutcome::PreviewOpened)
        );
        assert_eq!(session.selected_addon_id(), Some("a-weapons"));

        session.cancel_addon_preview().unwrap();
        assert_eq!(session.selected_addon_id(), Some("a-weapons"));

        session.select_addon(Some("a-capes")).unwrap();
        session.confirm_addon_preview().unwrap();
        assert_eq!(session.selected_addon_id(), Some("a-capes"));

        session.select_addon(None).unwrap();
        assert_eq!(session.selected_addon_id(), None);
    }

    #[test]
    fn test_select_torso_bag_twice_clears() {
        let mut session = session();
        session.select_torso_bag("A").unwrap();
        assert_eq!(session.selected_torso_bag_ids(), vec!["A"]);

        session.select_torso_bag("A").unwrap();
        assert!(session.selected_torso_bag_ids().is_empty());
        assert!(session.reorder_draft().is_none());
    }

    #[test]
    fn test_switching_torso_bag_discards_draft() {
        let mut session = session();
        session.select_torso_bag("A").unwrap();
        session.move_design(0, 2).unwrap();
        assert!(session.reorder_draft().unwrap().is_dirty());

        session.select_torso_bag("B").unwrap();
        session.select_torso_bag("A").unwrap();
        let draft = session.reorder_draft().unwrap();
        assert!(!draft.is_dirty());
        assert_eq!(draft.draft_items()[0].image, "a.png");
    }

    #[test]
    fn test_torso_selection_locked_while_saving() {
        let mut session = session();
        session.select_torso_bag("A").unwrap();
        session.move_design(0, 1).unwrap();
        session.begin_reorder_save().unwrap();

        assert_eq!(
            session.select_torso_bag("B"),
            Err(ConstraintViolation::ReorderInFlight)
        );
        assert_eq!(
            session.move_design(0, 1),
            Err(ConstraintViolation::ReorderInFlight)
        );
    }

    #[test]
    fn test_accepted_save_updates_snapshot() {
        let mut session = session();
        session.select_torso_bag("A").unwrap();
        session.move_design(2, 0).unwrap();

        let plan = session.begin_reorder_save().unwrap();
        assert_eq!(plan.permutation, vec![2, 0, 1]);
        session.finish_reorder_save(true).unwrap();

        let bag = session.catalog().torso_bag("A").unwrap();
        assert_eq!(bag.items[0].image, "c.png");
    }

    #[test]
    fn test_compute_total_and_summary() {
        let mut session = session();
        session.select_addon(Some("a-weapons")).unwrap();
        session.increase_extra_bag("x-legs").unwrap();
        session.increase_extra_bag("x-legs").unwrap();
        session.increase_extra_bag("x-hair").unwrap();

        assert_eq!(session.compute_total().to_string(), "355.00");

        let summary = session.order_summary();
        assert_eq!(summary.bundle.as_ref().map(|b| b.id.as_str()), Some("b-300"));
        assert_eq!(summary.addon.as_ref().map(|a| a.id.as_str()), Some("a-weapons"));
        assert_eq!(summary.extra_bag_lines.len(), 2);
        assert_eq!(summary.total, session.compute_total());

        let legs = summary
            .extra_bag_lines
            .iter()
            .find(|l| l.option_id == "x-legs")
            .unwrap();
        assert_eq!(legs.line_total, Money::from_cents(3_000));
    }

    #[test]
    fn test_replace_catalog_repairs_selection() {
        let mut session = session();
        session.select_addon(Some("a-weapons")).unwrap();
        session.increase_extra_bag("x-legs").unwrap();
        session.increase_extra_bag("x-hair").unwrap();
        session.select_torso_bag("A").unwrap();

        let mut next = catalog();
        next.bundles[0].is_active = false; // b-300 gone, b-100 allows one bag
        next.addons.retain(|a| a.id != "a-weapons");
        next.extra_bag_options.retain(|o| o.id != "x-hair");
        next.torso_bags[0].items.reverse();

        let CatalogRefresh::Applied(report) = session.replace_catalog(Arc::new(next)) else {
            panic!("expected applied refresh");
        };
        assert!(report.bundle_changed);
        assert_eq!(report.dropped_extra_bag_options, 1);
        assert!(!report.extra_bags_cleared);
        assert!(report.addon_cleared);
        assert!(report.reorder_reseeded);

        assert_eq!(session.selected_bundle_id(), Some("b-100"));
        assert_eq!(session.extra_bags().quantity("x-legs"), 1);
        assert_eq!(session.draft_items().unwrap()[0].image, "c.png");
    }

    #[test]
    fn test_draft_moves_refused_during_save() {
        let mut session = session();
        session.select_torso_bag("A").unwrap();
        session.move_design(0, 1).unwrap();
        session.begin_reorder_save().unwrap();

        assert_eq!(session.move_design(2, 0), Err(ConstraintViolation::ReorderInFlight));
        assert_eq!(
            session.reorder_draft_mut().unwrap().move_item(2, 0),
            Err(ConstraintViolation::ReorderInFlight)
        );

        session.finish_reorder_save(true).unwrap();
        let persisted = &session.catalog().torso_bag("A").unwrap().items;
        assert_eq!(persisted, &session.draft_items().unwrap());
    }

    #[test]
    fn test_bag_above_new_ceiling_is_flagged() {
        let mut session = session();
        session.select_torso_bag("A").unwrap();
        assert!(session.check_torso_bag_allocation().is_ok());

        // A 5-minifig bundle is activated; bag A holds 6 designs
        let mut next = catalog();
        next.bundles.push(BundleTier::new("b-5", "5 Minifigs", 5, 100, 500));
        let CatalogRefresh::Applied(report) = session.replace_catalog(Arc::new(next)) else {
            panic!("expected applied refresh");
        };

        assert!(report.torso_bag_over_ceiling);
        assert_eq!(session.selected_torso_bag_id(), Some("A"));
        assert_eq!(
            session.check_torso_bag_allocation(),
            Err(ConstraintViolation::AllocationCeilingExceeded {
                requested_total: 6,
                ceiling: 5
            })
        );

        // Reselecting is still allowed; the flag stays visible
        session.select_torso_bag("A").unwrap();
        assert!(session.select_torso_bag("A").unwrap().is_some());
        assert!(session.check_torso_bag_allocation().is_err());
    }

    #[test]
    fn test_replace_catalog_empty_resets() {
        let mut session = session();
        session.select_torso_bag("A").unwrap();

        let refresh = session.replace_catalog(Arc::new(CatalogSnapshot::default()));
        assert_eq!(refresh, CatalogRefresh::Reset);
        assert_eq!(session.selected_bundle_id(), None);
        assert!(session.selected_torso_bag_ids().is_empty());
    }
}
