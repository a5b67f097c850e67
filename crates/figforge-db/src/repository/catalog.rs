//! # Catalog Repository
//!
//! Read access to the four catalog collections, in catalog order, plus the
//! insert helpers used by the seed binary and tests.

use std::collections::HashMap;

use sqlx::SqlitePool;
use tracing::debug;

use figforge_core::validation;
use figforge_core::{AddonItem, AddonOption, BundleTier, ExtraBagOption, TorsoBag};

use super::narrow;
use super::torso_bag::TorsoBagRepository;
use crate::error::{DbError, DbResult};

// =============================================================================
// Record Types
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
struct BundleRecord {
    id: String,
    name: String,
    minifig_quantity: i64,
    unit_price_cents: i64,
    total_price_cents: i64,
    is_active: bool,
}

impl BundleRecord {
    fn into_bundle(self) -> DbResult<BundleTier> {
        Ok(BundleTier {
            minifig_quantity: narrow("minifig_quantity", self.minifig_quantity)?,
            id: self.id,
            name: self.name,
            unit_price_cents: self.unit_price_cents,
            total_price_cents: self.total_price_cents,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct AddonRecord {
    id: String,
    name: String,
    price_cents: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct AddonItemRecord {
    addon_id: String,
    name: String,
    price_cents: i64,
    color: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ExtraBagOptionRecord {
    id: String,
    part_category: String,
    price_cents: i64,
    is_active: bool,
}

impl From<ExtraBagOptionRecord> for ExtraBagOption {
    fn from(r: ExtraBagOptionRecord) -> Self {
        ExtraBagOption {
            id: r.id,
            part_category: r.part_category,
            price_cents: r.price_cents,
            is_active: r.is_active,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the configurator catalog.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Lists every bundle (active or not) in catalog order.
    pub async fn list_bundles(&self) -> DbResult<Vec<BundleTier>> {
        let records = sqlx::query_as::<_, BundleRecord>(
            r#"
            SELECT id, name, minifig_quantity, unit_price_cents, total_price_cents, is_active
            FROM bundles
            ORDER BY sort_order, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = records.len(), "Loaded bundles");
        records.into_iter().map(BundleRecord::into_bundle).collect()
    }

    /// Lists add-ons with their constituent items attached.
    pub async fn list_addons(&self) -> DbResult<Vec<AddonOption>> {
        let addons = sqlx::query_as::<_, AddonRecord>(
            r#"
            SELECT id, name, price_cents
            FROM addons
            ORDER BY sort_order, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, AddonItemRecord>(
            r#"
            SELECT addon_id, name, price_cents, color
            FROM addon_items
            ORDER BY addon_id, position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_addon: HashMap<String, Vec<AddonItem>> = HashMap::new();
        for item in items {
            by_addon
                .entry(item.addon_id)
                .or_default()
                .push(AddonItem::new(item.name, item.price_cents, item.color));
        }

        Ok(addons
            .into_iter()
            .map(|a| {
                let items = by_addon.remove(&a.id).unwrap_or_default();
                AddonOption::new(a.id, a.name, a.price_cents).with_items(items)
            })
            .collect())
    }

    pub async fn list_extra_bag_options(&self) -> DbResult<Vec<ExtraBagOption>> {
        let records = sqlx::query_as::<_, ExtraBagOptionRecord>(
            r#"
            SELECT id, part_category, price_cents, is_active
            FROM extra_bag_options
            ORDER BY sort_order, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(ExtraBagOption::from).collect())
    }

    /// Lists torso bags with their items in persisted order.
    pub async fn list_torso_bags(&self) -> DbResult<Vec<TorsoBag>> {
        TorsoBagRepository::new(self.pool.clone()).list().await
    }

    // -------------------------------------------------------------------------
    // Inserts
    // -------------------------------------------------------------------------

    /// Appends a bundle at the end of the catalog order.
    pub async fn insert_bundle(&self, bundle: &BundleTier) -> DbResult<()> {
        validation::validate_bundle(bundle)?;
        debug!(id = %bundle.id, "Inserting bundle");

        sqlx::query(
            r#"
            INSERT INTO bundles (
                id, name, minifig_quantity, unit_price_cents, total_price_cents,
                is_active, sort_order
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                (SELECT COALESCE(MAX(sort_order), -1) + 1 FROM bundles)
            )
            "#,
        )
        .bind(&bundle.id)
        .bind(&bundle.name)
        .bind(bundle.minifig_quantity as i64)
        .bind(bundle.unit_price_cents)
        .bind(bundle.total_price_cents)
        .bind(bundle.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Appends an add-on and its items in one transaction.
    pub async fn insert_addon(&self, addon: &AddonOption) -> DbResult<()> {
        validation::validate_addon(addon)?;
        debug!(id = %addon.id, items = addon.items.len(), "Inserting add-on");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO addons (id, name, price_cents, sort_order)
            VALUES (?1, ?2, ?3, (SELECT COALESCE(MAX(sort_order), -1) + 1 FROM addons))
            "#,
        )
        .bind(&addon.id)
        .bind(&addon.name)
        .bind(addon.price_cents)
        .execute(&mut *tx)
        .await?;

        for (position, item) in addon.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO addon_items (addon_id, position, name, price_cents, color)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&addon.id)
            .bind(position as i64)
            .bind(&item.name)
            .bind(item.price_cents)
            .bind(&item.color)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn insert_extra_bag_option(&self, option: &ExtraBagOption) -> DbResult<()> {
        validation::validate_extra_bag_option(option)?;

        sqlx::query(
            r#"
            INSERT INTO extra_bag_options (id, part_category, price_cents, is_active, sort_order)
            VALUES (
                ?1, ?2, ?3, ?4,
                (SELECT COALESCE(MAX(sort_order), -1) + 1 FROM extra_bag_options)
            )
            "#,
        )
        .bind(&option.id)
        .bind(&option.part_category)
        .bind(option.price_cents)
        .bind(option.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Flips a bundle's active flag. Used by back-office tooling and tests.
    pub async fn set_bundle_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE bundles SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(is_active)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bundle", id));
        }
        Ok(())
    }

    /// Number of bundles; the seed binary skips a populated database.
    pub async fn count_bundles(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bundles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> CatalogRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().catalog()
    }

    #[tokio::test]
    async fn test_bundles_keep_insert_order() {
        let repo = setup().await;
        repo.insert_bundle(&BundleTier::new("b-300", "300", 300, 83, 25_000))
            .await
            .unwrap();
        repo.insert_bundle(&BundleTier::new("b-100", "100", 100, 150, 15_000).inactive())
            .await
            .unwrap();

        let bundles = repo.list_bundles().await.unwrap();
        let ids: Vec<&str> = bundles.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b-300", "b-100"]);
        assert!(!bundles[1].is_active);
        assert_eq!(bundles[0].minifig_quantity, 300);
        assert_eq!(repo.count_bundles().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_bundle_rejected() {
        let repo = setup().await;
        let bundle = BundleTier::new("b-1", "100", 100, 1, 100);
        repo.insert_bundle(&bundle).await.unwrap();

        let err = repo.insert_bundle(&bundle).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_invalid_bundle_never_reaches_sql() {
        let repo = setup().await;
        let err = repo
            .insert_bundle(&BundleTier::new("b-0", "Zero", 0, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_addons_with_items() {
        let repo = setup().await;
        repo.insert_addon(&AddonOption::new("a-plain", "Stands", 500))
            .await
            .unwrap();
        repo.insert_addon(&AddonOption::new("a-capes", "Capes", 900).with_items(vec![
            AddonItem::new("Red cape", 150, "red"),
            AddonItem::new("Black cape", 150, "black"),
        ]))
        .await
        .unwrap();

        let addons = repo.list_addons().await.unwrap();
        assert_eq!(addons.len(), 2);
        assert!(addons[0].items.is_empty());
        assert_eq!(addons[1].items.len(), 2);
        assert_eq!(addons[1].items[1].color, "black");
        assert!(addons[1].requires_preview());
    }

    #[tokio::test]
    async fn test_extra_bag_options() {
        let repo = setup().await;
        repo.insert_extra_bag_option(&ExtraBagOption::new("x-legs", "legs", 1_500))
            .await
            .unwrap();
        repo.insert_extra_bag_option(&ExtraBagOption::new("x-hair", "hair", 2_000).inactive())
            .await
            .unwrap();

        let options = repo.list_extra_bag_options().await.unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].price_cents, 1_500);
        assert!(!options[1].is_active);
    }

    #[tokio::test]
    async fn test_set_bundle_active() {
        let repo = setup().await;
        repo.insert_bundle(&BundleTier::new("b-1", "100", 100, 1, 100))
            .await
            .unwrap();

        repo.set_bundle_active("b-1", false).await.unwrap();
        assert!(!repo.list_bundles().await.unwrap()[0].is_active);

        assert!(matches!(
            repo.set_bundle_active("missing", false).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
