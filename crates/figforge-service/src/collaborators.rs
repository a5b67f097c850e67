//! # Collaborators
//!
//! The two async seams between the configurator and the outside world.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Configurator ──► CatalogSource        (read-only, whole collections)  │
//! │                   ├── list_bundles                                     │
//! │                   ├── list_addons                                      │
//! │                   ├── list_extra_bag_options                           │
//! │                   └── list_torso_bags                                  │
//! │                                                                         │
//! │  save_reorder ──► TorsoBagStore        (one request in flight per bag) │
//! │  TorsoBagEditor   ├── save_torso_bag_order(bag_id, permutation)        │
//! │                   └── save_torso_bag(bag)                              │
//! │                                                                         │
//! │  Implementations:                                                      │
//! │  • figforge_db::Database  - SQLite                                     │
//! │  • InMemoryCatalog        - process-local, with failure injection      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use figforge_core::validation;
use figforge_core::{AddonOption, BundleTier, CatalogSnapshot, ExtraBagOption, TorsoBag};
use figforge_db::{Database, DbError};

use crate::error::{ServiceError, ServiceResult};

// =============================================================================
// Traits
// =============================================================================

/// Read access to the four catalog collections, each in catalog order.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_bundles(&self) -> ServiceResult<Vec<BundleTier>>;
    async fn list_addons(&self) -> ServiceResult<Vec<AddonOption>>;
    async fn list_extra_bag_options(&self) -> ServiceResult<Vec<ExtraBagOption>>;
    async fn list_torso_bags(&self) -> ServiceResult<Vec<TorsoBag>>;
}

/// Write access to torso bags.
#[async_trait]
pub trait TorsoBagStore: Send + Sync {
    /// Rewrites the persisted item order of a bag.
    ///
    /// `permutation[k]` is the index, in the currently persisted list, of
    /// the item that occupies position `k` after the save. The permutation
    /// has exactly one entry per persisted item.
    async fn save_torso_bag_order(&self, bag_id: &str, permutation: &[usize])
        -> ServiceResult<()>;

    /// Creates or replaces a bag with its whole item list.
    async fn save_torso_bag(&self, bag: &TorsoBag) -> ServiceResult<()>;
}

// =============================================================================
// SQLite
// =============================================================================

#[async_trait]
impl CatalogSource for Database {
    async fn list_bundles(&self) -> ServiceResult<Vec<BundleTier>> {
        Ok(self.catalog().list_bundles().await?)
    }

    async fn list_addons(&self) -> ServiceResult<Vec<AddonOption>> {
        Ok(self.catalog().list_addons().await?)
    }

    async fn list_extra_bag_options(&self) -> ServiceResult<Vec<ExtraBagOption>> {
        Ok(self.catalog().list_extra_bag_options().await?)
    }

    async fn list_torso_bags(&self) -> ServiceResult<Vec<TorsoBag>> {
        Ok(self.catalog().list_torso_bags().await?)
    }
}

#[async_trait]
impl TorsoBagStore for Database {
    async fn save_torso_bag_order(
        &self,
        bag_id: &str,
        permutation: &[usize],
    ) -> ServiceResult<()> {
        self.torso_bags().save_order(bag_id, permutation).await?;
        Ok(())
    }

    async fn save_torso_bag(&self, bag: &TorsoBag) -> ServiceResult<()> {
        self.torso_bags().upsert(bag).await?;
        Ok(())
    }
}

// =============================================================================
// In-Memory
// =============================================================================

/// Process-local catalog and store.
///
/// Saves mutate the held snapshot, so a later fetch sees them. Fetch and
/// order-save failures can be injected to drive the unavailable and
/// persistence-rejected paths.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    snapshot: Mutex<CatalogSnapshot>,
    fail_fetches: AtomicBool,
    pending_save_failures: AtomicU32,
    save_attempts: AtomicU32,
}

impl InMemoryCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        InMemoryCatalog {
            snapshot: Mutex::new(snapshot),
            ..Default::default()
        }
    }

    /// Current contents.
    pub fn snapshot(&self) -> ServiceResult<CatalogSnapshot> {
        self.with_snapshot(|s| s.clone())
    }

    /// Replaces the contents, as if the back office had edited the catalog.
    pub fn replace(&self, snapshot: CatalogSnapshot) -> ServiceResult<()> {
        self.with_snapshot(|s| *s = snapshot)
    }

    /// Makes every fetch fail until cleared.
    pub fn set_fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Makes the next `count` order saves fail with a retryable error.
    pub fn fail_next_saves(&self, count: u32) {
        self.pending_save_failures.store(count, Ordering::SeqCst);
    }

    /// Number of order saves attempted so far, failed ones included.
    pub fn save_attempts(&self) -> u32 {
        self.save_attempts.load(Ordering::SeqCst)
    }

    fn with_snapshot<R>(&self, f: impl FnOnce(&mut CatalogSnapshot) -> R) -> ServiceResult<R> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| ServiceError::Internal("catalog mutex poisoned".into()))?;
        Ok(f(&mut guard))
    }

    fn fetch<T>(&self, f: impl FnOnce(&CatalogSnapshot) -> T) -> ServiceResult<T> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(ServiceError::CollaboratorFailed(
                "catalog source unreachable".into(),
            ));
        }
        self.with_snapshot(|s| f(s))
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn list_bundles(&self) -> ServiceResult<Vec<BundleTier>> {
        self.fetch(|s| s.bundles.clone())
    }

    async fn list_addons(&self) -> ServiceResult<Vec<AddonOption>> {
        self.fetch(|s| s.addons.clone())
    }

    async fn list_extra_bag_options(&self) -> ServiceResult<Vec<ExtraBagOption>> {
        self.fetch(|s| s.extra_bag_options.clone())
    }

    async fn list_torso_bags(&self) -> ServiceResult<Vec<TorsoBag>> {
        self.fetch(|s| s.torso_bags.clone())
    }
}

#[async_trait]
impl TorsoBagStore for InMemoryCatalog {
    async fn save_torso_bag_order(
        &self,
        bag_id: &str,
        permutation: &[usize],
    ) -> ServiceResult<()> {
        let attempt = self.save_attempts.fetch_add(1, Ordering::SeqCst) + 1;

        let injected = self
            .pending_save_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            debug!(bag_id, attempt, "Injected order save failure");
            return Err(ServiceError::CollaboratorFailed("store unreachable".into()));
        }

        self.with_snapshot(|s| -> ServiceResult<()> {
            let bag = s
                .torso_bags
                .iter_mut()
                .find(|b| b.id == bag_id)
                .ok_or_else(|| DbError::not_found("Torso bag", bag_id))?;
            bag.items = validation::apply_permutation(&bag.items, permutation)?;
            Ok(())
        })?
    }

    async fn save_torso_bag(&self, bag: &TorsoBag) -> ServiceResult<()> {
        validation::validate_torso_bag(bag)?;
        self.with_snapshot(|s| {
            match s.torso_bags.iter_mut().find(|b| b.id == bag.id) {
                Some(existing) => *existing = bag.clone(),
                None => s.torso_bags.push(bag.clone()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figforge_core::DesignItem;

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot {
            bundles: vec![BundleTier::new("b-100", "100", 100, 150, 15_000)],
            torso_bags: vec![TorsoBag::new(
                "bag-1",
                "Space",
                vec![
                    DesignItem::new("a.png", 1),
                    DesignItem::new("b.png", 2),
                    DesignItem::new("c.png", 3),
                ],
            )],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_in_memory_save_order_applies_permutation() {
        let store = InMemoryCatalog::new(catalog());
        store.save_torso_bag_order("bag-1", &[2, 0, 1]).await.unwrap();

        let bags = store.list_torso_bags().await.unwrap();
        let images: Vec<&str> = bags[0].items.iter().map(|i| i.image.as_str()).collect();
        assert_eq!(images, vec!["c.png", "a.png", "b.png"]);
        assert_eq!(store.save_attempts(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let store = InMemoryCatalog::new(catalog());
        store.fail_next_saves(2);

        let err = store.save_torso_bag_order("bag-1", &[0, 1, 2]).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(store.save_torso_bag_order("bag-1", &[0, 1, 2]).await.is_err());
        assert!(store.save_torso_bag_order("bag-1", &[0, 1, 2]).await.is_ok());
        assert_eq!(store.save_attempts(), 3);
    }

    #[tokio::test]
    async fn test_bad_permutation_is_not_retryable() {
        let store = InMemoryCatalog::new(catalog());
        let err = store.save_torso_bag_order("bag-1", &[0, 0, 1]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(!err.is_retryable());

        let err = store.save_torso_bag_order("missing", &[]).await.unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_failure() {
        let store = InMemoryCatalog::new(catalog());
        store.set_fail_fetches(true);
        assert!(store.list_bundles().await.is_err());

        store.set_fail_fetches(false);
        assert_eq!(store.list_bundles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_torso_bag_upserts() {
        let store = InMemoryCatalog::new(catalog());
        store
            .save_torso_bag(&TorsoBag::new("bag-2", "Castle", vec![DesignItem::new("k.png", 4)]))
            .await
            .unwrap();
        assert_eq!(store.list_torso_bags().await.unwrap().len(), 2);

        let bad = TorsoBag::new("bag-3", "Bad", vec![DesignItem::new("x.png", 5)]);
        assert!(store.save_torso_bag(&bad).await.is_err());
    }

    #[tokio::test]
    async fn test_database_collaborators() {
        let db = Database::new(figforge_db::DbConfig::in_memory()).await.unwrap();
        db.catalog()
            .insert_bundle(&BundleTier::new("b-100", "100", 100, 150, 15_000))
            .await
            .unwrap();
        let bag = catalog().torso_bags[0].clone();
        TorsoBagStore::save_torso_bag(&db, &bag).await.unwrap();

        db.save_torso_bag_order("bag-1", &[1, 2, 0]).await.unwrap();
        let bags = CatalogSource::list_torso_bags(&db).await.unwrap();
        assert_eq!(bags[0].items[0].image, "b.png");
        assert_eq!(CatalogSource::list_bundles(&db).await.unwrap().len(), 1);
    }
}
