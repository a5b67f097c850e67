//! # figforge-core: Pure Logic for the Dealer Bulk-Order Configurator
//!
//! This crate turns a read-only catalog snapshot into a valid, priced dealer
//! order. Every operation is a synchronous, in-memory state transition.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Figforge Configurator Stack                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Presentation layer (external)                      │   │
//! │  │   Bundle picker ──► Extra bags ──► Torso bag ──► Summary        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               figforge-service (async orchestration)            │   │
//! │  │   catalog load, reorder save workflow, bag authoring            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ figforge-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌────────────┐ ┌────────────┐ ┌──────────────┐  │   │
//! │  │   │ catalog  │ │ extra_bags │ │   torso    │ │   reorder    │  │   │
//! │  │   │ ceilings │ │ allocator  │ │ allocator  │ │  sub-engine  │  │   │
//! │  │   └──────────┘ └────────────┘ └────────────┘ └──────────────┘  │   │
//! │  │   ┌──────────┐ ┌────────────┐ ┌────────────┐                   │   │
//! │  │   │  addon   │ │  pricing   │ │  session   │                   │   │
//! │  │   │ preview  │ │ aggregator │ │ controller │                   │   │
//! │  │   └──────────┘ └────────────┘ └────────────┘                   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE STATE TRANSITIONS    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog entities (BundleTier, AddonOption, TorsoBag, ...)
//! - [`money`] - Integer-cent money type
//! - [`error`] - Constraint, validation and core errors
//! - [`validation`] - Catalog and input validation
//! - [`catalog`] - Catalog snapshot and the two derived ceilings
//! - [`extra_bags`] - Extra-Bag Allocator
//! - [`torso`] - Torso-Design Allocator
//! - [`reorder`] - Reorder Sub-engine
//! - [`addon`] - Preview-then-commit add-on selection
//! - [`pricing`] - Price Aggregator
//! - [`session`] - Configuration Session
//!
//! ## Example Usage
//!
//! ```rust
//! use figforge_core::catalog::CatalogSnapshot;
//! use figforge_core::session::ConfigurationSession;
//! use figforge_core::types::{BundleTier, ExtraBagOption};
//!
//! let catalog = CatalogSnapshot {
//!     bundles: vec![BundleTier::new("b-200", "200 Minifigs", 200, 125, 25_000)],
//!     extra_bag_options: vec![ExtraBagOption::new("x-legs", "legs", 1_500)],
//!     ..Default::default()
//! };
//!
//! let mut session = ConfigurationSession::new(catalog.into()).unwrap();
//! session.increase_extra_bag("x-legs").unwrap();
//! session.increase_extra_bag("x-legs").unwrap();
//!
//! // 200 minifigs allow two extra bags; the third is refused.
//! assert!(session.increase_extra_bag("x-legs").is_err());
//!
//! // 250.00 bundle + 2 × 15.00 bags + 10.00 shipping
//! assert_eq!(session.compute_total().cents(), 29_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod addon;
pub mod catalog;
pub mod error;
pub mod extra_bags;
pub mod money;
pub mod pricing;
pub mod reorder;
pub mod session;
pub mod torso;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{AllocationCeiling, CatalogSnapshot, ExtraBagCeiling};
pub use error::{ConstraintViolation, CoreError, ValidationError};
pub use money::Money;
pub use session::ConfigurationSession;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Minifigs in the base order that unlock one extra part bag.
///
/// Extra bags are sold in unit lots tied to every 100 minifigs; partial lots
/// are not orderable, so the ceiling uses floor division.
pub const MINIFIGS_PER_EXTRA_BAG: u32 = 100;

/// Allocation ceiling used when the catalog has no active bundle.
pub const DEFAULT_ALLOCATION_CEILING: u32 = 100;

/// Smallest committed quantity of a single torso design.
pub const MIN_DESIGN_QUANTITY: u8 = 1;

/// Largest quantity of a single torso design.
pub const MAX_DESIGN_QUANTITY: u8 = 4;

/// Flat shipping fee in cents (10.00 in the order currency).
pub const FLAT_SHIPPING_CENTS: i64 = 1_000;
