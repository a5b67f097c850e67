//! # figforge-db: Database Layer for the Figforge Configurator
//!
//! SQLite storage for the catalog the configurator reads and for the torso
//! bag item order that the admin reorder tool writes back.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Figforge Data Flow                                 │
//! │                                                                         │
//! │  figforge-service (CatalogSource / TorsoBagStore)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   figforge-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │   │   │
//! │  │   │               │    │ CatalogRepo    │   │ 001_initial  │   │   │
//! │  │   │ SqlitePool    │◄───│ TorsoBagRepo   │   │              │   │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <platform data dir>/figforge.db                              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Database handle over file or in-memory storage
//! - `migrations` - Embedded schema, applied by `Database::new`
//! - [`error`] - Database error types
//! - [`repository`] - Catalog and torso bag repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use figforge_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("figforge.db")).await?;
//!
//! let bundles = db.catalog().list_bundles().await?;
//! db.torso_bags().save_order("bag-1", &[2, 0, 1]).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, Storage};

pub use repository::catalog::CatalogRepository;
pub use repository::torso_bag::TorsoBagRepository;
