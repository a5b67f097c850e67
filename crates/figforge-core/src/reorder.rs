//! # Reorder Sub-engine
//!
//! Draft ordering of a torso bag's design items, diffed against the
//! persisted order and committed as an original-index permutation.
//!
//! ## Identity Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Stable Item Keys                                    │
//! │                                                                         │
//! │  persisted:  [ (k0, a.png) , (k1, b.png) , (k2, a.png) ]                │
//! │                                                                         │
//! │  seed:       [ k0, k1, k2 ]      last order known to be persisted       │
//! │  draft:      [ k2, k0, k1 ]      admin's in-progress order              │
//! │                                                                         │
//! │  save ──► key → persisted index ──► permutation [2, 0, 1]              │
//! │                                                                         │
//! │  Items with identical images keep distinct keys, so duplicates never   │
//! │  collapse onto the same original index.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Save Lifecycle
//! ```text
//!   clean ──move──► dirty ──begin_save──► in flight ──finish_save(true)──► clean
//!                     ▲                        │
//!                     └──finish_save(false)────┘
//! ```
//!
//! The request itself is issued by the service layer; this module only
//! holds the state on either side of it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{ConstraintResult, ConstraintViolation};
use crate::types::{DesignItem, TorsoBag};

/// Stable identity of one persisted design item within a seeded draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey(u32);

/// What a save must send to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SavePlan {
    pub bag_id: String,
    /// `permutation[k]` is the persisted index of the item that moves to `k`.
    pub permutation: Vec<usize>,
}

/// Draft/seed state for one torso bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderEngine {
    bag_id: String,
    /// Items in the order currently held by the persistence collaborator.
    persisted: Vec<(ItemKey, DesignItem)>,
    seed: Vec<ItemKey>,
    draft: Vec<ItemKey>,
    dirty: bool,
    in_flight: bool,
}

impl ReorderEngine {
    /// Seeds a fresh draft from the persisted bag, discarding any prior diff.
    pub fn seed(bag: &TorsoBag) -> Self {
        let persisted: Vec<(ItemKey, DesignItem)> = bag
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| (ItemKey(i as u32), item.clone()))
            .collect();
        let seed: Vec<ItemKey> = persisted.iter().map(|(k, _)| *k).collect();

        ReorderEngine {
            bag_id: bag.id.clone(),
            persisted,
            draft: seed.clone(),
            seed,
            dirty: false,
            in_flight: false,
        }
    }

    pub fn bag_id(&self) -> &str {
        &self.bag_id
    }

    pub fn len(&self) -> usize {
        self.draft.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draft.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight
    }

    fn item(&self, key: ItemKey) -> &DesignItem {
        // Keys are dense indices into `persisted` assigned at seeding.
        &self.persisted[key.0 as usize].1
    }

    /// Draft items in their current order.
    pub fn draft_items(&self) -> Vec<DesignItem> {
        self.draft.iter().map(|k| self.item(*k).clone()).collect()
    }

    /// Items in the last order known to be persisted.
    pub fn seed_items(&self) -> Vec<DesignItem> {
        self.seed.iter().map(|k| self.item(*k).clone()).collect()
    }

    /// Moves the item at `from` to `to`, shifting the items in between.
    ///
    /// Returns `true` when the order changed. A no-op move leaves the dirty
    /// flag as it was; otherwise the flag tracks whether the draft differs
    /// from the seed. Refused while a save is outstanding.
    ///
    /// ## Example
    /// ```rust
    /// use figforge_core::reorder::ReorderEngine;
    /// use figforge_core::types::{DesignItem, TorsoBag};
    ///
    /// let bag = TorsoBag::new("t-1", "Space", vec![
    ///     DesignItem::new("a.png", 1),
    ///     DesignItem::new("b.png", 2),
    /// ]);
    /// let mut draft = ReorderEngine::seed(&bag);
    ///
    /// assert_eq!(draft.move_item(0, 1), Ok(true));
    /// assert!(draft.is_dirty());
    /// assert_eq!(draft.draft_items()[0].image, "b.png");
    /// ```
    pub fn move_item(&mut self, from: usize, to: usize) -> ConstraintResult<bool> {
        if self.in_flight {
            return Err(ConstraintViolation::ReorderInFlight);
        }
        let len = self.draft.len();
        for index in [from, to] {
            if index >= len {
                return Err(ConstraintViolation::IndexOutOfRange { index, len });
            }
        }
        if from == to {
            return Ok(false);
        }

        let key = self.draft.remove(from);
        self.draft.insert(to, key);
        self.dirty = self.draft != self.seed;
        Ok(true)
    }

    /// Starts a save of the current draft.
    ///
    /// Refused while clean or while another save is outstanding.
    pub fn begin_save(&mut self) -> ConstraintResult<SavePlan> {
        if self.in_flight {
            return Err(ConstraintViolation::ReorderInFlight);
        }
        if !self.dirty {
            return Err(ConstraintViolation::NothingToSave);
        }

        let original_index: HashMap<ItemKey, usize> = self
            .persisted
            .iter()
            .enumerate()
            .map(|(i, (key, _))| (*key, i))
            .collect();
        let permutation = self
            .draft
            .iter()
            .filter_map(|key| original_index.get(key).copied())
            .collect();

        self.in_flight = true;
        debug!(bag_id = %self.bag_id, "Reorder save started");
        Ok(SavePlan {
            bag_id: self.bag_id.clone(),
            permutation,
        })
    }

    /// Records the collaborator's answer for the outstanding save.
    ///
    /// Accepted: the draft becomes the persisted order and the seed.
    /// Rejected: the draft is kept and stays dirty for a retry or reset.
    pub fn finish_save(&mut self, accepted: bool) -> ConstraintResult<()> {
        if !self.in_flight {
            return Err(ConstraintViolation::NoSaveInFlight);
        }
        self.in_flight = false;

        if accepted {
            let mut reordered: Vec<(ItemKey, DesignItem)> = self
                .draft
                .iter()
                .map(|k| (*k, self.item(*k).clone()))
                .collect();
            // Re-key densely so keys keep indexing `persisted`.
            for (i, (key, _)) in reordered.iter_mut().enumerate() {
                *key = ItemKey(i as u32);
            }
            self.persisted = reordered;
            self.seed = self.persisted.iter().map(|(k, _)| *k).collect();
            self.draft = self.seed.clone();
            self.dirty = false;
            debug!(bag_id = %self.bag_id, "Reorder save accepted");
        } else {
            debug!(bag_id = %self.bag_id, "Reorder save rejected, draft kept");
        }
        Ok(())
    }

    /// Discards the draft and restores the seed order.
    pub fn reset(&mut self) -> ConstraintResult<()> {
        if self.in_flight {
            return Err(ConstraintViolation::ReorderInFlight);
        }
        self.draft = self.seed.clone();
        self.dirty = false;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(images: &[&str]) -> TorsoBag {
        TorsoBag::new(
            "t-1",
            "Space",
            images
                .iter()
                .enumerate()
                .map(|(i, img)| DesignItem::new(*img, (i % 4) as u8 + 1))
                .collect(),
        )
    }

    fn images(engine: &ReorderEngine) -> Vec<String> {
        engine.draft_items().into_iter().map(|i| i.image).collect()
    }

    #[test]
    fn test_move_shifts_intervening_items() {
        let mut engine = ReorderEngine::seed(&bag(&["a", "b", "c", "d"]));
        engine.move_item(3, 1).unwrap();
        assert_eq!(images(&engine), vec!["a", "d", "b", "c"]);
        assert!(engine.is_dirty());
    }

    #[test]
    fn test_noop_move_keeps_dirty_flag() {
        let mut engine = ReorderEngine::seed(&bag(&["a", "b"]));
        assert_eq!(engine.move_item(1, 1), Ok(false));
        assert!(!engine.is_dirty());

        engine.move_item(0, 1).unwrap();
        assert_eq!(engine.move_item(0, 0), Ok(false));
        assert!(engine.is_dirty());
    }

    #[test]
    fn test_moving_back_to_seed_clears_dirty() {
        let mut engine = ReorderEngine::seed(&bag(&["a", "b", "c"]));
        engine.move_item(0, 2).unwrap();
        engine.move_item(2, 0).unwrap();
        assert!(!engine.is_dirty());
    }

    #[test]
    fn test_move_out_of_range() {
        let mut engine = ReorderEngine::seed(&bag(&["a", "b"]));
        assert_eq!(
            engine.move_item(0, 2),
            Err(ConstraintViolation::IndexOutOfRange { index: 2, len: 2 })
        );
        assert!(!engine.is_dirty());
    }

    #[test]
    fn test_move_then_reset_restores_seed() {
        let source = bag(&["a", "b", "c"]);
        let mut engine = ReorderEngine::seed(&source);
        engine.move_item(0, 2).unwrap();
        engine.move_item(1, 0).unwrap();

        engine.reset().unwrap();
        assert_eq!(engine.draft_items(), source.items);
        assert!(!engine.is_dirty());
    }

    #[test]
    fn test_save_permutation_with_duplicate_images() {
        // Two identical images must map to distinct original indices
        let mut engine = ReorderEngine::seed(&bag(&["same", "other", "same"]));
        engine.move_item(2, 0).unwrap();

        let plan = engine.begin_save().unwrap();
        assert_eq!(plan.bag_id, "t-1");
        assert_eq!(plan.permutation, vec![2, 0, 1]);
    }

    #[test]
    fn test_save_refused_when_clean() {
        let mut engine = ReorderEngine::seed(&bag(&["a", "b"]));
        assert_eq!(engine.begin_save(), Err(ConstraintViolation::NothingToSave));
    }

    #[test]
    fn test_overlapping_saves_refused() {
        let mut engine = ReorderEngine::seed(&bag(&["a", "b"]));
        engine.move_item(0, 1).unwrap();
        engine.begin_save().unwrap();

        assert!(engine.is_saving());
        assert_eq!(engine.begin_save(), Err(ConstraintViolation::ReorderInFlight));
        assert_eq!(engine.reset(), Err(ConstraintViolation::ReorderInFlight));
    }

    #[test]
    fn test_move_refused_while_saving() {
        let original = bag(&["a.png", "b.png", "c.png"]);
        let mut engine = ReorderEngine::seed(&original);
        engine.move_item(0, 1).unwrap();
        let plan = engine.begin_save().unwrap();

        assert_eq!(engine.move_item(2, 0), Err(ConstraintViolation::ReorderInFlight));
        assert_eq!(images(&engine), vec!["b.png", "a.png", "c.png"]);

        // The seed after acceptance is exactly what the store applied
        engine.finish_save(true).unwrap();
        let stored = crate::validation::apply_permutation(&original.items, &plan.permutation).unwrap();
        assert_eq!(engine.seed_items(), stored);
        assert_eq!(engine.move_item(2, 0), Ok(true));
    }

    #[test]
    fn test_accepted_save_updates_seed() {
        let mut engine = ReorderEngine::seed(&bag(&["a", "b", "c"]));
        engine.move_item(0, 2).unwrap();
        engine.begin_save().unwrap();
        engine.finish_save(true).unwrap();

        assert!(!engine.is_dirty());
        assert!(!engine.is_saving());
        assert_eq!(engine.seed_items(), engine.draft_items());

        // The next save diffs against the new persisted order
        engine.move_item(0, 1).unwrap();
        let plan = engine.begin_save().unwrap();
        assert_eq!(plan.permutation, vec![1, 0, 2]);
    }

    #[test]
    fn test_rejected_save_keeps_draft_dirty() {
        let mut engine = ReorderEngine::seed(&bag(&["a", "b", "c"]));
        engine.move_item(0, 2).unwrap();
        let before = engine.draft_items();

        engine.begin_save().unwrap();
        engine.finish_save(false).unwrap();

        assert!(engine.is_dirty());
        assert_eq!(engine.draft_items(), before);

        // Retry sends the same permutation
        assert_eq!(engine.begin_save().unwrap().permutation, vec![1, 2, 0]);
    }

    #[test]
    fn test_finish_without_save() {
        let mut engine = ReorderEngine::seed(&bag(&["a"]));
        assert_eq!(engine.finish_save(true), Err(ConstraintViolation::NoSaveInFlight));
    }
}
