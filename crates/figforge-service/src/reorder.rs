//! # Reorder Save Workflow
//!
//! Sends a torso bag's draft order to the store, with at most one request
//! outstanding, and folds the answer back into the session.
//!
//! ## Save Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  lock ─► begin_reorder_save() ─► SavePlan { bag_id, permutation }      │
//! │  unlock       │  in-flight flag set: move / reset / save refused        │
//! │               ▼                                                         │
//! │  store.save_torso_bag_order(bag_id, permutation)                        │
//! │               │                                                         │
//! │        ┌──────┴──────┐                                                  │
//! │        ▼             ▼                                                  │
//! │     accepted      rejected ──► retryable and attempts left?             │
//! │        │             │            yes: sleep(next_backoff), resend      │
//! │        │             │            no:  give up                          │
//! │        ▼             ▼                                                  │
//! │  lock ─► finish_reorder_save(accepted) ─► unlock                        │
//! │        │             │                                                  │
//! │        ▼             ▼                                                  │
//! │   seed := draft   draft kept, still dirty                               │
//! │   Saved           Failed { reason, attempts }                           │
//! │                   + PersistenceRejected returned                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is rolled back on failure. The admin either presses Save again
//! (a fresh plan is built from the same draft) or resets to the seed.

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use ts_rs::TS;

use figforge_core::reorder::SavePlan;

use crate::collaborators::TorsoBagStore;
use crate::config::{RetryMode, ServiceConfig};
use crate::configurator::ConfiguratorHandle;
use crate::error::{ServiceError, ServiceResult};

// =============================================================================
// Save Status
// =============================================================================

/// Reorder save status shown next to the Save button.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, TS)]
#[serde(tag = "state", rename_all = "camelCase")]
#[ts(export)]
pub enum SaveStatus {
    #[default]
    Idle,

    /// A request is outstanding for `bag`.
    Saving { bag: String, attempt: u32 },

    /// The last save of `bag` was accepted at `at` (ISO8601).
    Saved { bag: String, at: String },

    /// The last save of `bag` was rejected; the draft is still dirty.
    Failed {
        bag: String,
        reason: String,
        attempts: u32,
    },
}

impl SaveStatus {
    pub fn is_saving(&self) -> bool {
        matches!(self, SaveStatus::Saving { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SaveStatus::Failed { .. })
    }
}

/// What the store finally answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Accepted { attempts: u32 },
    Rejected { attempts: u32, reason: String },
}

impl SaveOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SaveOutcome::Accepted { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            SaveOutcome::Accepted { attempts } | SaveOutcome::Rejected { attempts, .. } => *attempts,
        }
    }

    pub(crate) fn status(&self, bag_id: &str) -> SaveStatus {
        match self {
            SaveOutcome::Accepted { .. } => SaveStatus::Saved {
                bag: bag_id.to_string(),
                at: Utc::now().to_rfc3339(),
            },
            SaveOutcome::Rejected { attempts, reason } => SaveStatus::Failed {
                bag: bag_id.to_string(),
                reason: reason.clone(),
                attempts: *attempts,
            },
        }
    }
}

// =============================================================================
// Retry Policy
// =============================================================================

/// How many times a rejected save is sent, and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub mode: RetryMode,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::manual()
    }
}

impl RetryPolicy {
    /// One attempt per save; the admin retries by pressing Save again.
    pub fn manual() -> Self {
        RetryPolicy {
            mode: RetryMode::Manual,
            max_attempts: 1,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
        }
    }

    /// Exponential backoff between retryable failures.
    pub fn backoff(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        RetryPolicy {
            mode: RetryMode::Backoff,
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        match config.reorder.retry_mode {
            RetryMode::Manual => Self::manual(),
            RetryMode::Backoff => Self::backoff(
                config.reorder.max_attempts,
                config.initial_backoff(),
                config.max_backoff(),
            ),
        }
    }

    /// Attempts allowed for one save, the first one included.
    pub fn attempts_allowed(&self) -> u32 {
        match self.mode {
            RetryMode::Manual => 1,
            RetryMode::Backoff => self.max_attempts,
        }
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None, // bounded by max_attempts
            ..Default::default()
        }
    }
}

// =============================================================================
// Save
// =============================================================================

/// Saves the selected torso bag's draft order.
///
/// ## Returns
/// * `Ok(plan)` - The order that is now persisted and seeded
/// * `Err(Constraint(NothingToSave | ReorderInFlight | NoReorderDraft))` -
///   Refused before anything was sent
/// * `Err(PersistenceRejected)` - Every allowed attempt failed; draft kept
pub async fn save_reorder(
    handle: &ConfiguratorHandle,
    store: &dyn TorsoBagStore,
    policy: &RetryPolicy,
) -> ServiceResult<SavePlan> {
    let (plan, status) = handle.with_configurator_mut(|c| {
        c.begin_reorder_save()
            .map(|plan| (plan, c.save_status().clone()))
    })??;
    handle.events().emit_save_status(&status);

    info!(
        bag_id = %plan.bag_id,
        items = plan.permutation.len(),
        mode = %policy.mode,
        "Saving torso bag order"
    );

    let outcome = send_with_retry(handle, store, &plan, policy).await;

    let status = handle.with_configurator_mut(|c| {
        c.finish_reorder_save(&plan, &outcome)
            .map(|()| c.save_status().clone())
    })??;
    handle.events().emit_save_status(&status);

    match outcome {
        SaveOutcome::Accepted { attempts } => {
            info!(bag_id = %plan.bag_id, attempts, "Torso bag order saved");
            Ok(plan)
        }
        SaveOutcome::Rejected { attempts, reason } => {
            error!(bag_id = %plan.bag_id, attempts, %reason, "Torso bag order save failed");
            Err(ServiceError::PersistenceRejected { attempts, reason })
        }
    }
}

async fn send_with_retry(
    handle: &ConfiguratorHandle,
    store: &dyn TorsoBagStore,
    plan: &SavePlan,
    policy: &RetryPolicy,
) -> SaveOutcome {
    let mut backoff = policy.create_backoff();
    let allowed = policy.attempts_allowed();
    let mut attempt = 1u32;

    loop {
        debug!(bag_id = %plan.bag_id, attempt, "Sending torso bag order");

        let err = match store.save_torso_bag_order(&plan.bag_id, &plan.permutation).await {
            Ok(()) => return SaveOutcome::Accepted { attempts: attempt },
            Err(e) => e,
        };

        if !err.is_retryable() || attempt >= allowed {
            return SaveOutcome::Rejected {
                attempts: attempt,
                reason: err.to_string(),
            };
        }

        let delay = backoff.next_backoff().unwrap_or(policy.max_backoff);
        warn!(
            bag_id = %plan.bag_id,
            attempt,
            ?delay,
            error = %err,
            "Torso bag order save failed, retrying"
        );
        tokio::time::sleep(delay).await;

        attempt += 1;
        if let Ok(status) = handle.with_configurator_mut(|c| {
            c.record_attempt(plan, attempt);
            c.save_status().clone()
        }) {
            handle.events().emit_save_status(&status);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
