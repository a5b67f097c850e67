//! Add-on selection with a preview step.
//!
//! An add-on that lists constituent items must be previewed before it is
//! committed. Cancelling the preview restores whatever was committed before.
//!
//! ```text
//!   None ──select(plain)──────────────► Committed(a)
//!   None ──select(with items)─────────► Previewing { a, committed: None }
//!   Committed(a) ──select(a)──────────► None            (toggle off)
//!   Committed(a) ──select(b w/ items)─► Previewing { b, committed: Some(a) }
//!   Previewing ──confirm──────────────► Committed(candidate)
//!   Previewing ──cancel───────────────► committed (restored)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ConstraintResult, ConstraintViolation};
use crate::types::AddonOption;

/// Add-on selection state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "addonId")]
pub enum AddonState {
    #[default]
    None,
    Previewing {
        candidate: String,
        committed: Option<String>,
    },
    Committed(String),
}

/// What a call to [`AddonState::select`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddonOutcome {
    Committed,
    Cleared,
    PreviewOpened,
}

impl AddonState {
    /// The add-on that counts toward the price, if any.
    ///
    /// While previewing, this is the selection that was committed before the
    /// preview opened.
    pub fn committed_id(&self) -> Option<&str> {
        match self {
            AddonState::None => None,
            AddonState::Previewing { committed, .. } => committed.as_deref(),
            AddonState::Committed(id) => Some(id),
        }
    }

    pub fn preview_id(&self) -> Option<&str> {
        match self {
            AddonState::Previewing { candidate, .. } => Some(candidate),
            _ => None,
        }
    }

    pub fn is_previewing(&self) -> bool {
        matches!(self, AddonState::Previewing { .. })
    }

    /// Applies a selection. `None` clears the add-on.
    pub fn select(&mut self, addon: Option<&AddonOption>) -> AddonOutcome {
        let committed = self.committed_id().map(str::to_string);

        let Some(addon) = addon else {
            *self = AddonState::None;
            return AddonOutcome::Cleared;
        };

        if committed.as_deref() == Some(addon.id.as_str()) {
            *self = AddonState::None;
            return AddonOutcome::Cleared;
        }

        if addon.requires_preview() {
            *self = AddonState::Previewing {
                candidate: addon.id.clone(),
                committed,
            };
            AddonOutcome::PreviewOpened
        } else {
            *self = AddonState::Committed(addon.id.clone());
            AddonOutcome::Committed
        }
    }

    /// Commits the previewed add-on and returns its id.
    pub fn confirm_preview(&mut self) -> ConstraintResult<String> {
        match std::mem::take(self) {
            AddonState::Previewing { candidate, .. } => {
                *self = AddonState::Committed(candidate.clone());
                Ok(candidate)
            }
            other => {
                *self = other;
                Err(ConstraintViolation::NoAddonPreview)
            }
        }
    }

    /// Closes the preview and restores the prior committed selection.
    pub fn cancel_preview(&mut self) -> ConstraintResult<()> {
        let AddonState::Previewing { committed, .. } = self else {
            return Err(ConstraintViolation::NoAddonPreview);
        };
        *self = match committed.take() {
            Some(id) => AddonState::Committed(id),
            None => AddonState::None,
        };
        Ok(())
    }

    /// Drops whichever ids `keep` rejects (catalog refresh).
    ///
    /// A vanished preview candidate falls back to the committed selection,
    /// as if the preview had been cancelled. Returns `true` if anything was
    /// dropped.
    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) -> bool {
        let before = self.clone();
        *self = match std::mem::take(self) {
            AddonState::None => AddonState::None,
            AddonState::Committed(id) if keep(&id) => AddonState::Committed(id),
            AddonState::Committed(_) => AddonState::None,
            AddonState::Previewing { candidate, committed } => {
                let committed = committed.filter(|c| keep(c));
                match (keep(&candidate), committed) {
                    (true, committed) => AddonState::Previewing { candidate, committed },
                    (false, Some(id)) => AddonState::Committed(id),
                    (false, None) => AddonState::None,
                }
            }
        };
        *self != before
    }
}
