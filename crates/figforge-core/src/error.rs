//! # Error Types
//!
//! Domain-specific error types for figforge-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  figforge-core errors (this file)                                      │
//! │  ├── ConstraintViolation - refused mutation, state left untouched      │
//! │  ├── ValidationError     - malformed catalog data or persisted input   │
//! │  └── CoreError           - wraps both + catalog unavailable            │
//! │                                                                         │
//! │  figforge-db errors                                                    │
//! │  └── DbError             - database operation failures                 │
//! │                                                                         │
//! │  figforge-service errors                                               │
//! │  └── ServiceError        - what the presentation layer sees            │
//! │                                                                         │
//! │  Flow: ConstraintViolation → CoreError → ServiceError → ApiError       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Refuse, Never Repair
//! A `ConstraintViolation` is returned *instead of* performing a mutation.
//! Every variant names the limit involved so the UI can explain which
//! ceiling was hit and what its value is.

use thiserror::Error;

// =============================================================================
// Constraint Violation
// =============================================================================

/// A mutation that was refused because it would break an invariant.
///
/// The state that produced this error is exactly the state before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintViolation {
    /// The selected bundle allows no more extra bags.
    ///
    /// ## User Workflow
    /// ```text
    /// Bundle: 200 minifigs ──► ceiling = 200 / 100 = 2
    ///      │
    ///      ▼
    /// Extra bags: legs ×1, hair ×1   (total 2)
    ///      │
    ///      ▼
    /// "+" on legs ──► ExtraBagCeilingReached { max: 2 }
    ///      │
    ///      ▼
    /// UI shows: "Your bundle allows at most 2 extra bags"
    /// ```
    #[error("Extra bag limit reached: the selected bundle allows at most {max}")]
    ExtraBagCeilingReached { max: u32 },

    /// A single torso design was given more than the per-design cap.
    #[error("Design quantity {requested} exceeds the per-design maximum of {max}")]
    DesignQuantityTooLarge { requested: u32, max: u8 },

    /// The torso bag total would exceed the allocation ceiling.
    #[error("Torso bag total {requested_total} exceeds the allocation ceiling of {ceiling}")]
    AllocationCeilingExceeded { requested_total: u32, ceiling: u32 },

    /// An item index does not exist in the list being edited.
    #[error("Index {index} is out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    /// The id does not exist in the current catalog snapshot.
    #[error("{kind} not found in catalog: {id}")]
    NotInCatalog { kind: &'static str, id: String },

    /// The id exists but the entity is deactivated.
    #[error("{kind} {id} is not active")]
    Inactive { kind: &'static str, id: String },

    /// Confirm or cancel was called with no add-on preview open.
    #[error("No add-on preview is open")]
    NoAddonPreview,

    /// A reorder operation was called with no torso bag selected.
    #[error("No torso bag is selected for reordering")]
    NoReorderDraft,

    /// Save was requested but the draft matches the persisted order.
    #[error("Draft order has no unsaved changes")]
    NothingToSave,

    /// A save is already in flight; move, reset and save are disabled.
    #[error("A reorder save is already in progress")]
    ReorderInFlight,

    /// A save completion arrived with no save in flight.
    #[error("No reorder save is in progress")]
    NoSaveInFlight,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Catalog or persisted-input validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Duplicate identifier inside one catalog collection.
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },

    /// A reorder permutation does not match the persisted item list.
    #[error("Invalid order permutation: {reason}")]
    InvalidPermutation { reason: String },
}

// =============================================================================
// Core Error
// =============================================================================

/// General configurator errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The catalog has no bundles (or could not be fetched); the configurator
    /// renders no selections until it becomes available.
    #[error("Catalog unavailable: {reason}")]
    CatalogUnavailable { reason: String },

    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result of a guarded mutation.
pub type ConstraintResult<T> = Result<T, ConstraintViolation>;

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
