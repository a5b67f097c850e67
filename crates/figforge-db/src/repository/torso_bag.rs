//! # Torso Bag Repository
//!
//! Torso bags and the persisted order of their design items.
//!
//! ## Order Rewrite
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save_order("bag-1", [2, 0, 1])                                         │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    SELECT items ORDER BY position   → [a, b, c]                         │
//! │    validate permutation (len 3, each index once)                        │
//! │    DELETE items of bag-1                                                │
//! │    INSERT c@0, a@1, b@2                                                 │
//! │    UPDATE torso_bags.updated_at                                         │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure rolls back: the persisted order is untouched.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The permutation is interpreted against the items as they are at the
//! moment of the transaction, so `permutation[k]` names the item that
//! currently sits at position `permutation[k]`.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use figforge_core::validation;
use figforge_core::{DesignItem, TorsoBag};

use super::narrow;
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone, sqlx::FromRow)]
struct TorsoBagRecord {
    id: String,
    name: String,
    is_active: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct DesignItemRecord {
    bag_id: String,
    image_ref: String,
    quantity: i64,
}

impl DesignItemRecord {
    fn into_item(self) -> DbResult<DesignItem> {
        Ok(DesignItem::new(self.image_ref, narrow("quantity", self.quantity)?))
    }
}

/// Repository for torso bags and their item order.
#[derive(Debug, Clone)]
pub struct TorsoBagRepository {
    pool: SqlitePool,
}

impl TorsoBagRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TorsoBagRepository { pool }
    }

    /// Lists every torso bag in catalog order with items by position.
    pub async fn list(&self) -> DbResult<Vec<TorsoBag>> {
        let bags = sqlx::query_as::<_, TorsoBagRecord>(
            r#"
            SELECT id, name, is_active
            FROM torso_bags
            ORDER BY sort_order, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, DesignItemRecord>(
            r#"
            SELECT bag_id, image_ref, quantity
            FROM torso_bag_items
            ORDER BY bag_id, position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_bag: HashMap<String, Vec<DesignItem>> = HashMap::new();
        for record in items {
            let bag_id = record.bag_id.clone();
            by_bag.entry(bag_id).or_default().push(record.into_item()?);
        }

        debug!(count = bags.len(), "Loaded torso bags");
        Ok(bags
            .into_iter()
            .map(|b| TorsoBag {
                items: by_bag.remove(&b.id).unwrap_or_default(),
                id: b.id,
                name: b.name,
                is_active: b.is_active,
            })
            .collect())
    }

    /// Gets one bag with its items.
    pub async fn get(&self, id: &str) -> DbResult<Option<TorsoBag>> {
        let Some(bag) = sqlx::query_as::<_, TorsoBagRecord>(
            "SELECT id, name, is_active FROM torso_bags WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, DesignItemRecord>(
            r#"
            SELECT bag_id, image_ref, quantity
            FROM torso_bag_items
            WHERE bag_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(DesignItemRecord::into_item)
        .collect::<DbResult<Vec<_>>>()?;

        Ok(Some(TorsoBag {
            id: bag.id,
            name: bag.name,
            is_active: bag.is_active,
            items,
        }))
    }

    /// Rewrites the item order of a bag from an original-index permutation.
    ///
    /// ## Returns
    /// * `Ok(items)` - The items in their new persisted order
    /// * `Err(DbError::NotFound)` - No such bag
    /// * `Err(DbError::Invalid)` - Permutation doesn't match the item count
    pub async fn save_order(&self, bag_id: &str, permutation: &[usize]) -> DbResult<Vec<DesignItem>> {
        debug!(bag_id, len = permutation.len(), "Saving torso bag order");

        let mut tx = self.pool.begin().await?;

        let exists: Option<String> =
            sqlx::query_scalar("SELECT id FROM torso_bags WHERE id = ?1")
                .bind(bag_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(DbError::not_found("Torso bag", bag_id));
        }

        let current = sqlx::query_as::<_, DesignItemRecord>(
            r#"
            SELECT bag_id, image_ref, quantity
            FROM torso_bag_items
            WHERE bag_id = ?1
            ORDER BY position
            "#,
        )
        .bind(bag_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(DesignItemRecord::into_item)
        .collect::<DbResult<Vec<_>>>()?;

        let reordered = validation::apply_permutation(&current, permutation)?;

        replace_items(&mut tx, bag_id, &reordered).await?;
        touch(&mut tx, bag_id).await?;
        tx.commit().await?;

        info!(bag_id, items = reordered.len(), "Torso bag order saved");
        Ok(reordered)
    }

    /// Creates or replaces a bag and its whole item list.
    ///
    /// New bags are appended at the end of the catalog order.
    pub async fn upsert(&self, bag: &TorsoBag) -> DbResult<()> {
        validation::validate_torso_bag(bag)?;
        debug!(id = %bag.id, items = bag.items.len(), "Upserting torso bag");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO torso_bags (id, name, is_active, sort_order, updated_at)
            VALUES (
                ?1, ?2, ?3,
                (SELECT COALESCE(MAX(sort_order), -1) + 1 FROM torso_bags),
                ?4
            )
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&bag.id)
        .bind(&bag.name)
        .bind(bag.is_active)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        replace_items(&mut tx, &bag.id, &bag.items).await?;
        tx.commit().await?;
        Ok(())
    }
}

async fn replace_items(
    tx: &mut Transaction<'_, Sqlite>,
    bag_id: &str,
    items: &[DesignItem],
) -> DbResult<()> {
    sqlx::query("DELETE FROM torso_bag_items WHERE bag_id = ?1")
        .bind(bag_id)
        .execute(&mut **tx)
        .await?;

    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO torso_bag_items (bag_id, position, image_ref, quantity)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(bag_id)
        .bind(position as i64)
        .bind(&item.image)
        .bind(item.quantity as i64)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn touch(tx: &mut Transaction<'_, Sqlite>, bag_id: &str) -> DbResult<()> {
    sqlx::query("UPDATE torso_bags SET updated_at = ?2 WHERE id = ?1")
        .bind(bag_id)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn space_bag() -> TorsoBag {
        TorsoBag::new(
            "bag-1",
            "Space",
            vec![
                DesignItem::new("a.png", 1),
                DesignItem::new("b.png", 2),
                DesignItem::new("a.png", 3),
            ],
        )
    }

    async fn setup() -> TorsoBagRepository {
        let repo = Database::new(DbConfig::in_memory()).await.unwrap().torso_bags();
        repo.upsert(&space_bag()).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_get_returns_items_in_order() {
        let repo = setup().await;
        let bag = repo.get("bag-1").await.unwrap().unwrap();
        assert_eq!(bag, space_bag());
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_order_applies_permutation() {
        let repo = setup().await;
        let saved = repo.save_order("bag-1", &[2, 0, 1]).await.unwrap();

        let bag = repo.get("bag-1").await.unwrap().unwrap();
        assert_eq!(bag.items, saved);
        // Duplicate images stay distinct by their quantity
        assert_eq!(bag.items[0], DesignItem::new("a.png", 3));
        assert_eq!(bag.items[1], DesignItem::new("a.png", 1));
        assert_eq!(bag.items[2], DesignItem::new("b.png", 2));
    }

    #[tokio::test]
    async fn test_save_order_rejects_bad_permutation() {
        let repo = setup().await;
        let err = repo.save_order("bag-1", &[0, 1]).await.unwrap_err();
        assert!(matches!(err, DbError::Invalid(_)));

        // Rolled back: order unchanged
        assert_eq!(repo.get("bag-1").await.unwrap().unwrap(), space_bag());
    }

    #[tokio::test]
    async fn test_save_order_unknown_bag() {
        let repo = setup().await;
        assert!(matches!(
            repo.save_order("nope", &[]).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_upsert_replaces_items_and_keeps_position() {
        let repo = setup().await;
        repo.upsert(&TorsoBag::new("bag-2", "Castle", vec![DesignItem::new("c.png", 4)]))
            .await
            .unwrap();

        let mut edited = space_bag();
        edited.name = "Deep Space".to_string();
        edited.items.truncate(1);
        repo.upsert(&edited).await.unwrap();

        let bags = repo.list().await.unwrap();
        assert_eq!(bags.len(), 2);
        assert_eq!(bags[0].name, "Deep Space");
        assert_eq!(bags[0].items.len(), 1);
        assert_eq!(bags[1].id, "bag-2");
    }

    #[tokio::test]
    async fn test_upsert_rejects_quantity_above_four() {
        let repo = setup().await;
        let bad = TorsoBag::new("bag-3", "Bad", vec![DesignItem::new("x.png", 5)]);
        assert!(matches!(repo.upsert(&bad).await, Err(DbError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_upsert_leaves_no_stale_items() {
        let repo = setup().await;
        repo.upsert(&TorsoBag::new("bag-1", "Space", vec![DesignItem::new("z.png", 2)]))
            .await
            .unwrap();

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM torso_bag_items WHERE bag_id = 'bag-1'")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}
