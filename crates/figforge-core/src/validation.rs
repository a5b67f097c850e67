//! # Validation Module
//!
//! Validation of catalog data arriving from collaborators and of order
//! permutations arriving at the persistence side.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Catalog fetch (figforge-service)                             │
//! │  └── CatalogSnapshot::validate() → THIS MODULE, per entity             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Session / allocators (figforge-core)                         │
//! │  └── Mutations refused with ConstraintViolation                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity BETWEEN 1 AND 4)                                  │
//! │  └── validate_permutation() before rewriting positions                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::{AddonOption, BundleTier, ExtraBagOption, TorsoBag};
use crate::{MAX_DESIGN_QUANTITY, MIN_DESIGN_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in cents. Zero is allowed (free add-ons).
///
/// ## Example
/// ```rust
/// use figforge_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("price", 1_500).is_ok());
/// assert!(validate_price_cents("price", 0).is_ok());
/// assert!(validate_price_cents("price", -1).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a committed torso design quantity (1-4).
pub fn validate_design_quantity(quantity: u8) -> ValidationResult<()> {
    if !(MIN_DESIGN_QUANTITY..=MAX_DESIGN_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "design quantity".to_string(),
            min: MIN_DESIGN_QUANTITY as i64,
            max: MAX_DESIGN_QUANTITY as i64,
        });
    }
    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates a bundle tier.
///
/// ## Rules
/// - id and name must not be empty
/// - minifig quantity must be > 0 (both ceilings divide or minimise over it)
/// - prices must be non-negative
pub fn validate_bundle(bundle: &BundleTier) -> ValidationResult<()> {
    required("bundle id", &bundle.id)?;
    required("bundle name", &bundle.name)?;

    if bundle.minifig_quantity == 0 {
        return Err(ValidationError::MustBePositive {
            field: "minifig quantity".to_string(),
        });
    }

    validate_price_cents("bundle unit price", bundle.unit_price_cents)?;
    validate_price_cents("bundle total price", bundle.total_price_cents)
}

/// Validates an add-on and its constituent items.
pub fn validate_addon(addon: &AddonOption) -> ValidationResult<()> {
    required("addon id", &addon.id)?;
    required("addon name", &addon.name)?;
    validate_price_cents("addon price", addon.price_cents)?;

    for item in &addon.items {
        required("addon item name", &item.name)?;
        validate_price_cents("addon item price", item.price_cents)?;
    }
    Ok(())
}

pub fn validate_extra_bag_option(option: &ExtraBagOption) -> ValidationResult<()> {
    required("extra bag id", &option.id)?;
    required("part category", &option.part_category)?;
    validate_price_cents("extra bag price", option.price_cents)
}

/// Validates a persisted torso bag.
///
/// The aggregate ceiling is a catalog property and is checked separately by
/// [`crate::catalog::AllocationCeiling::admits`].
pub fn validate_torso_bag(bag: &TorsoBag) -> ValidationResult<()> {
    required("torso bag id", &bag.id)?;
    required("torso bag name", &bag.name)?;

    for item in &bag.items {
        required("design image", &item.image)?;
        validate_design_quantity(item.quantity)?;
    }
    Ok(())
}

/// Rejects a collection containing the same id twice.
pub fn validate_unique_ids<'a>(
    field: &str,
    ids: impl IntoIterator<Item = &'a str>,
) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::Duplicate {
                field: field.to_string(),
                value: id.to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Permutation Validator
// =============================================================================

/// Validates an original-index permutation against the persisted list length.
///
/// `permutation[k]` is the current index of the item that moves to slot `k`,
/// so it must contain every index in `0..len` exactly once.
///
/// ## Example
/// ```rust
/// use figforge_core::validation::validate_permutation;
///
/// assert!(validate_permutation(&[2, 0, 1], 3).is_ok());
/// assert!(validate_permutation(&[0, 0, 1], 3).is_err());
/// assert!(validate_permutation(&[0, 1], 3).is_err());
/// ```
pub fn validate_permutation(permutation: &[usize], len: usize) -> ValidationResult<()> {
    if permutation.len() != len {
        return Err(ValidationError::InvalidPermutation {
            reason: format!("expected {} indices, got {}", len, permutation.len()),
        });
    }

    let mut seen = vec![false; len];
    for &index in permutation {
        match seen.get_mut(index) {
            None => {
                return Err(ValidationError::InvalidPermutation {
                    reason: format!("index {} is out of range for {} items", index, len),
                })
            }
            Some(true) => {
                return Err(ValidationError::InvalidPermutation {
                    reason: format!("index {} appears more than once", index),
                })
            }
            Some(slot) => *slot = true,
        }
    }
    Ok(())
}

/// Applies a validated permutation: slot `k` receives `items[permutation[k]]`.
pub fn apply_permutation<T: Clone>(items: &[T], permutation: &[usize]) -> ValidationResult<Vec<T>> {
    validate_permutation(permutation, items.len())?;
    Ok(permutation.iter().map(|&i| items[i].clone()).collect())
}

// =============================================================================
// Unit Tests
// =============================================================================
