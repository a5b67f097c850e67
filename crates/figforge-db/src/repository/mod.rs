//! # Repository Module
//!
//! Database repository implementations for the configurator.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  figforge-service collaborator impls                                   │
//! │       │                                                                 │
//! │       │  db.catalog().list_bundles()                                   │
//! │       │  db.torso_bags().save_order("bag-1", &[2, 0, 1])               │
//! │       ▼                                                                 │
//! │  CatalogRepository                 TorsoBagRepository                  │
//! │  ├── list_bundles                  ├── list / get                      │
//! │  ├── list_addons (+ items)         ├── save_order (transaction)        │
//! │  ├── list_extra_bag_options        └── upsert (transaction)            │
//! │  ├── list_torso_bags                                                   │
//! │  └── insert_* (seed, tests)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are read through private `FromRow` record structs and converted into
//! `figforge-core` types, so the core crate carries no sqlx dependency.

pub mod catalog;
pub mod torso_bag;

use crate::error::{DbError, DbResult};

/// Converts an SQLite INTEGER into a narrower unsigned column type.
pub(crate) fn narrow<T: TryFrom<i64>>(column: &str, value: i64) -> DbResult<T> {
    T::try_from(value)
        .map_err(|_| DbError::Internal(format!("{} out of range: {}", column, value)))
}
