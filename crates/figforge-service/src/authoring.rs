//! # Torso Bag Authoring
//!
//! Back-office editor for creating a torso bag or changing an existing one.
//!
//! ## Editing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  TorsoBagEditor::create("Space", &bundles)   ceiling = min active       │
//! │       │                                      minifig quantity           │
//! │       ▼                                                                 │
//! │  add_designs([..30 images..]) ──► { added: 25, skipped: 5 }            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  set_quantity(3, "4")   refused if Σ would pass the ceiling            │
//! │  set_quantity(7, "")    blank, counts as 1 until saved                  │
//! │  remove_design(0)                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  save(store) ──► blanks become 1 ──► validate ──► save_torso_bag        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info};
use uuid::Uuid;

use figforge_core::error::ConstraintResult;
use figforge_core::torso::{BatchAddReport, DesignEntry, QuantityInput, TorsoDesignAllocator};
use figforge_core::validation;
use figforge_core::{AllocationCeiling, BundleTier, ConstraintViolation, TorsoBag};

use crate::collaborators::TorsoBagStore;
use crate::error::ServiceResult;

/// Editor state for one torso bag.
#[derive(Debug, Clone)]
pub struct TorsoBagEditor {
    id: String,
    name: String,
    is_active: bool,
    is_new: bool,
    designs: TorsoDesignAllocator,
    ceiling: AllocationCeiling,
}

impl TorsoBagEditor {
    /// Starts a new, active bag with a generated id.
    pub fn create(name: impl Into<String>, bundles: &[BundleTier]) -> Self {
        TorsoBagEditor {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            is_active: true,
            is_new: true,
            designs: TorsoDesignAllocator::new(),
            ceiling: AllocationCeiling::from_bundles(bundles),
        }
    }

    /// Starts editing a persisted bag.
    pub fn edit(bag: &TorsoBag, bundles: &[BundleTier]) -> Self {
        let editor = TorsoBagEditor {
            id: bag.id.clone(),
            name: bag.name.clone(),
            is_active: bag.is_active,
            is_new: false,
            designs: TorsoDesignAllocator::from_items(&bag.items),
            ceiling: AllocationCeiling::from_bundles(bundles),
        };
        if editor.designs.exceeds(editor.ceiling) {
            debug!(
                bag_id = %bag.id,
                total = editor.designs.total(),
                ceiling = editor.ceiling.limit(),
                "Editing a bag above the current allocation ceiling"
            );
        }
        editor
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }

    /// True until the first successful save.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn ceiling(&self) -> AllocationCeiling {
        self.ceiling
    }

    /// Recomputes the ceiling after the bundle catalog changed.
    pub fn update_ceiling(&mut self, bundles: &[BundleTier]) {
        self.ceiling = AllocationCeiling::from_bundles(bundles);
    }

    pub fn designs(&self) -> &[DesignEntry] {
        self.designs.entries()
    }

    /// Sum of quantities, blanks counted as 1.
    pub fn total(&self) -> u32 {
        self.designs.total()
    }

    // -------------------------------------------------------------------------
    // Design edits
    // -------------------------------------------------------------------------

    pub fn add_design(&mut self, image: impl Into<String>) -> ConstraintResult<usize> {
        self.designs.add_design(image, self.ceiling)
    }

    /// Adds uploaded images in order until the ceiling is reached.
    pub fn add_designs<I, S>(&mut self, images: I) -> BatchAddReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.designs.add_designs(images, self.ceiling)
    }

    pub fn set_quantity(&mut self, index: usize, raw: &str) -> ConstraintResult<QuantityInput> {
        self.designs.set_quantity(index, raw, self.ceiling)
    }

    pub fn remove_design(&mut self, index: usize) -> ConstraintResult<DesignEntry> {
        self.designs.remove_design(index)
    }

    // -------------------------------------------------------------------------
    // Commit
    // -------------------------------------------------------------------------

    /// Builds the bag that would be saved: blanks become 1.
    ///
    /// Refused while the total is above the ceiling, which only happens
    /// when the bundle catalog shrank after editing started.
    pub fn to_bag(&self) -> ServiceResult<TorsoBag> {
        let total = self.designs.total();
        if self.designs.exceeds(self.ceiling) {
            return Err(ConstraintViolation::AllocationCeilingExceeded {
                requested_total: total,
                ceiling: self.ceiling.limit(),
            }
            .into());
        }

        let mut bag = TorsoBag::new(self.id.clone(), self.name.trim(), self.designs.commit());
        bag.is_active = self.is_active;
        validation::validate_torso_bag(&bag)?;
        Ok(bag)
    }

    /// Validates and writes the bag through the store.
    pub async fn save(&mut self, store: &dyn TorsoBagStore) -> ServiceResult<TorsoBag> {
        let bag = self.to_bag()?;
        store.save_torso_bag(&bag).await?;

        info!(
            bag_id = %bag.id,
            items = bag.items.len(),
            total = bag.total_quantity(),
            created = self.is_new,
            "Torso bag saved"
        );

        // Blanks are now committed values in the editor too
        self.designs = TorsoDesignAllocator::from_items(&bag.items);
        self.is_new = false;
        Ok(bag)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use figforge_core::{CatalogSnapshot, DesignItem};

    use crate::collaborators::{CatalogSource, InMemoryCatalog};
    use crate::error::ServiceError;

    fn bundles() -> Vec<BundleTier> {
        vec![
            BundleTier::new("b-300", "300", 300, 83, 25_000),
            BundleTier::new("b-10", "10", 10, 150, 1_500),
        ]
    }

    #[test]
    fn test_batch_add_reports_skips() {
        let mut editor = TorsoBagEditor::create("Space", &bundles());
        assert_eq!(editor.ceiling().limit(), 10);

        let images: Vec<String> = (0..12).map(|i| format!("d{}.png", i)).collect();
        let report = editor.add_designs(images);
        assert_eq!((report.added, report.skipped), (10, 2));
        assert_eq!(editor.total(), 10);
    }

    #[test]
    fn test_quantity_edits_respect_both_caps() {
        let mut editor = TorsoBagEditor::create("Space", &bundles());
        editor.add_designs(["a.png", "b.png", "c.png"]);

        assert_eq!(editor.set_quantity(0, "4").unwrap(), QuantityInput::Value(4));
        assert_eq!(editor.set_quantity(1, "4").unwrap(), QuantityInput::Value(4));
        // 4 + 4 + 4 = 12 > 10
        assert!(matches!(
            editor.set_quantity(2, "4"),
            Err(ConstraintViolation::AllocationCeilingExceeded { ceiling: 10, .. })
        ));
        assert!(matches!(
            editor.set_quantity(2, "7"),
            Err(ConstraintViolation::DesignQuantityTooLarge { requested: 7, max: 4 })
        ));
        assert_eq!(editor.total(), 9);
    }

    #[tokio::test]
    async fn test_save_commits_blanks() {
        let store = InMemoryCatalog::new(CatalogSnapshot {
            bundles: bundles(),
            ..Default::default()
        });
        let mut editor = TorsoBagEditor::create("  Space  ", &bundles());
        editor.add_designs(["a.png", "b.png"]);
        assert!(editor.set_quantity(1, "").unwrap().is_blank());

        let bag = editor.save(&store).await.unwrap();
        assert_eq!(bag.name, "Space");
        assert_eq!(bag.items[1], DesignItem::new("b.png", 1));
        assert!(!editor.is_new());
        assert_eq!(editor.designs()[1].quantity, QuantityInput::Value(1));

        let stored = store.list_torso_bags().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, editor.id());
    }

    #[tokio::test]
    async fn test_edit_existing_and_deactivate() {
        let existing = TorsoBag::new("bag-1", "Castle", vec![DesignItem::new("k.png", 2)]);
        let store = InMemoryCatalog::new(CatalogSnapshot {
            bundles: bundles(),
            torso_bags: vec![existing.clone()],
            ..Default::default()
        });

        let mut editor = TorsoBagEditor::edit(&existing, &bundles());
        editor.set_active(false);
        editor.remove_design(0).unwrap();
        editor.add_design("q.png").unwrap();
        editor.save(&store).await.unwrap();

        let stored = store.list_torso_bags().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].is_active);
        assert_eq!(stored[0].items, vec![DesignItem::new("q.png", 1)]);
    }

    #[test]
    fn test_shrunk_catalog_blocks_save() {
        let existing = TorsoBag::new(
            "bag-1",
            "Castle",
            vec![DesignItem::new("a.png", 4), DesignItem::new("b.png", 4)],
        );
        let mut editor = TorsoBagEditor::edit(&existing, &bundles());
        editor.update_ceiling(&[BundleTier::new("b-5", "5", 5, 100, 500)]);

        assert!(matches!(
            editor.to_bag(),
            Err(ServiceError::Constraint(
                ConstraintViolation::AllocationCeilingExceeded {
                    requested_total: 8,
                    ceiling: 5
                }
            ))
        ));

        // Lowering quantities is always allowed and brings it back under
        editor.set_quantity(0, "1").unwrap();
        assert!(editor.to_bag().is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let editor = TorsoBagEditor::create("   ", &bundles());
        assert!(matches!(editor.to_bag(), Err(ServiceError::Validation(_))));
    }
}
