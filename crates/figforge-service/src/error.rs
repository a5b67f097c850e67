//! # Service Error Types
//!
//! Error types for the orchestration layer and the payload the presentation
//! layer receives when an operation fails.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Service Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Catalog      │  │     Persistence         │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Unavailable    │  │  PersistenceRejected    │ │
//! │  │  ConfigLoad     │  │  Constraint     │  │  CollaboratorFailed     │ │
//! │  │  ConfigSave     │  │  Validation     │  │  Database               │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Propagation:                                                          │
//! │  ConstraintViolation ──► ApiError { code: CONSTRAINT_VIOLATION }       │
//! │      handled locally by the UI, state already unchanged                │
//! │  CatalogUnavailable  ──► ApiError { code: CATALOG_UNAVAILABLE }        │
//! │  PersistenceRejected ──► ApiError { code: PERSISTENCE_FAILED }         │
//! │      draft stays dirty, user retries or resets                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use figforge_core::{ConstraintViolation, CoreError, ValidationError};
use figforge_db::DbError;

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error type covering every failure the orchestration layer reports.
#[derive(Debug, Error)]
pub enum ServiceError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid service configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Catalog Errors
    // =========================================================================
    /// The catalog could not be fetched, failed validation, or has no
    /// bundles. Every configurator operation is blocked until a reload.
    #[error("Catalog unavailable: {reason}")]
    CatalogUnavailable { reason: String },

    /// A mutation was refused; the session is unchanged.
    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),

    /// Malformed catalog data or authored input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    /// The reorder save was rejected after every allowed attempt.
    ///
    /// ## User Workflow
    /// ```text
    /// Save ──► store rejects ──► PersistenceRejected { attempts: 1 }
    ///   │
    ///   ▼
    /// Draft kept, still dirty ──► user presses Save again, or Reset
    /// ```
    #[error("Save rejected after {attempts} attempt(s): {reason}")]
    PersistenceRejected { attempts: u32, reason: String },

    /// A collaborator request failed before reaching storage.
    #[error("Collaborator request failed: {0}")]
    CollaboratorFailed(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Creates a CatalogUnavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        ServiceError::CatalogUnavailable {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::CatalogUnavailable { reason } => ServiceError::CatalogUnavailable { reason },
            CoreError::Constraint(v) => ServiceError::Constraint(v),
            CoreError::Validation(v) => ServiceError::Validation(v),
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ServiceError {
    fn from(err: toml::de::Error) -> Self {
        ServiceError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ServiceError {
    fn from(err: toml::ser::Error) -> Self {
        ServiceError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl ServiceError {
    /// Returns true if a save that failed with this error may be attempted
    /// again unchanged.
    ///
    /// ## Retryable Errors
    /// - Collaborator transport failures
    /// - Database connection, pool and query failures
    ///
    /// ## Non-Retryable Errors
    /// - Unknown bag, invalid permutation (same request fails again)
    /// - Constraint and configuration errors
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::CollaboratorFailed(_) => true,
            ServiceError::Database(db) => matches!(
                db,
                DbError::ConnectionFailed(_) | DbError::PoolExhausted | DbError::QueryFailed(_)
            ),
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidConfig(_)
                | ServiceError::ConfigLoadFailed(_)
                | ServiceError::ConfigSaveFailed(_)
        )
    }
}

// =============================================================================
// API Error
// =============================================================================

/// Error payload handed to the presentation layer.
///
/// ## Serialization
/// ```json
/// {
///   "code": "CONSTRAINT_VIOLATION",
///   "message": "Extra bag limit reached: the selected bundle allows at most 2"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorCode {
    /// Mutation refused; explain the limit, nothing to recover
    ConstraintViolation,

    /// Input validation failed
    ValidationError,

    /// Resource not found
    NotFound,

    /// Catalog fetch failed or no bundles exist; render no selections
    CatalogUnavailable,

    /// Reorder save rejected; draft kept dirty
    PersistenceFailed,

    /// Database operation failed
    DatabaseError,

    /// Configuration file or environment problem
    ConfigError,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Invalid(e) => ApiError::validation(e.to_string()),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts service errors to API errors.
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Constraint(v) => {
                ApiError::new(ErrorCode::ConstraintViolation, v.to_string())
            }
            ServiceError::Validation(e) => ApiError::validation(e.to_string()),
            ServiceError::CatalogUnavailable { reason } => ApiError::new(
                ErrorCode::CatalogUnavailable,
                format!("Catalog unavailable: {}", reason),
            ),
            err @ ServiceError::PersistenceRejected { .. } => {
                ApiError::new(ErrorCode::PersistenceFailed, err.to_string())
            }
            ServiceError::CollaboratorFailed(e) => {
                ApiError::new(ErrorCode::PersistenceFailed, e)
            }
            ServiceError::Database(db) => ApiError::from(db),
            err @ (ServiceError::InvalidConfig(_)
            | ServiceError::ConfigLoadFailed(_)
            | ServiceError::ConfigSaveFailed(_)) => {
                ApiError::new(ErrorCode::ConfigError, err.to_string())
            }
            ServiceError::Internal(e) => {
                tracing::error!("Internal service error: {}", e);
                ApiError::internal("An internal error occurred")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ServiceError::CollaboratorFailed("timeout".into()).is_retryable());
        assert!(ServiceError::Database(DbError::PoolExhausted).is_retryable());

        assert!(!ServiceError::Database(DbError::not_found("Torso bag", "b-1")).is_retryable());
        assert!(!ServiceError::Constraint(ConstraintViolation::NothingToSave).is_retryable());
        assert!(!ServiceError::InvalidConfig("bad".into()).is_retryable());
    }

    #[test]
    fn test_core_error_flattens() {
        let err: ServiceError = CoreError::CatalogUnavailable {
            reason: "no bundles".into(),
        }
        .into();
        assert!(matches!(err, ServiceError::CatalogUnavailable { .. }));

        let err: ServiceError = CoreError::Constraint(ConstraintViolation::ReorderInFlight).into();
        assert!(matches!(
            err,
            ServiceError::Constraint(ConstraintViolation::ReorderInFlight)
        ));
    }

    #[test]
    fn test_api_error_codes() {
        let api = ApiError::from(ServiceError::Constraint(
            ConstraintViolation::ExtraBagCeilingReached { max: 2 },
        ));
        assert_eq!(api.code, ErrorCode::ConstraintViolation);
        assert!(api.message.contains("at most 2"));

        let api = ApiError::from(ServiceError::PersistenceRejected {
            attempts: 3,
            reason: "offline".into(),
        });
        assert_eq!(api.code, ErrorCode::PersistenceFailed);
        assert_eq!(api.message, "Save rejected after 3 attempt(s): offline");

        let api = ApiError::from(ServiceError::Database(DbError::not_found("Torso bag", "b-9")));
        assert_eq!(api.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_api_error_serialization() {
        let api = ApiError::from(ServiceError::unavailable("no bundles"));
        let json = serde_json::to_string(&api).unwrap();
        assert_eq!(
            json,
            r#"{"code":"CATALOG_UNAVAILABLE","message":"Catalog unavailable: no bundles"}"#
        );
    }
}
