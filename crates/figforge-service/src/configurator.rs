//! # Configurator Lifecycle
//!
//! Owns the configuration session from mount to unmount and gates every
//! operation on catalog availability.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Unmounted ──load()──► fetch 4 collections concurrently               │
//! │                               │                                         │
//! │               ┌───────────────┼────────────────────┐                    │
//! │               ▼               ▼                    ▼                    │
//! │        fetch/validate     no bundles          snapshot ok               │
//! │           failure             │                    │                    │
//! │               └───────┬───────┘                    ▼                    │
//! │                       ▼                         Ready                   │
//! │          Unavailable { reason }              (session)                  │
//! │          session dropped, every                    │                    │
//! │          operation refused                  refresh() ──► replace_catalog
//! │                       ▲                            │                    │
//! │                       └──── refresh() fails ───────┘                    │
//! │                                                                         │
//! │   unmount() from any state ──► Unmounted, session dropped              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Sharing
//! [`ConfiguratorHandle`] wraps the configurator in `Arc<Mutex<_>>`. The lock
//! is only taken inside synchronous closures, never across an await, so a
//! reorder save can be outstanding while the UI keeps reading the session.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, info, warn};
use ts_rs::TS;

use figforge_core::pricing::PriceBreakdown;
use figforge_core::reorder::SavePlan;
use figforge_core::session::{CatalogRefresh, OrderSummary};
use figforge_core::{CatalogSnapshot, ConfigurationSession, Money, FLAT_SHIPPING_CENTS};

use crate::collaborators::CatalogSource;
use crate::error::{ServiceError, ServiceResult};
use crate::reorder::{SaveOutcome, SaveStatus};

// =============================================================================
// Status
// =============================================================================

/// Availability of the configurator, as shown to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, TS)]
#[serde(tag = "status", rename_all = "camelCase")]
#[ts(export)]
pub enum ConfiguratorStatus {
    /// Not mounted yet, or unmounted.
    #[default]
    Unmounted,

    /// Catalog loaded; the session accepts operations.
    Ready,

    /// The catalog could not be loaded; render no selections.
    Unavailable { reason: String },
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Trait for emitting configurator events (implemented by the UI bridge).
pub trait ConfiguratorEvents: Send + Sync {
    /// Emits an availability change.
    fn emit_status(&self, status: &ConfiguratorStatus);

    /// Emits a reorder save status change.
    fn emit_save_status(&self, status: &SaveStatus);
}

/// No-op event emitter for testing.
pub struct NoOpEvents;

impl ConfiguratorEvents for NoOpEvents {
    fn emit_status(&self, _status: &ConfiguratorStatus) {}
    fn emit_save_status(&self, _status: &SaveStatus) {}
}

// =============================================================================
// Catalog Fetch
// =============================================================================

/// Fetches the four collections concurrently and validates them.
pub async fn fetch_snapshot(source: &dyn CatalogSource) -> ServiceResult<CatalogSnapshot> {
    let (bundles, addons, extra_bag_options, torso_bags) = tokio::try_join!(
        source.list_bundles(),
        source.list_addons(),
        source.list_extra_bag_options(),
        source.list_torso_bags(),
    )?;

    let snapshot = CatalogSnapshot {
        bundles,
        addons,
        extra_bag_options,
        torso_bags,
    };
    snapshot.validate()?;

    debug!(
        bundles = snapshot.bundles.len(),
        addons = snapshot.addons.len(),
        extra_bag_options = snapshot.extra_bag_options.len(),
        torso_bags = snapshot.torso_bags.len(),
        "Catalog fetched"
    );
    Ok(snapshot)
}

// =============================================================================
// Configurator
// =============================================================================

/// The mounted configurator: status, session and reorder save status.
#[derive(Debug)]
pub struct Configurator {
    status: ConfiguratorStatus,
    session: Option<ConfigurationSession>,
    shipping: Money,
    save_status: SaveStatus,
}

impl Default for Configurator {
    fn default() -> Self {
        Self::new(Money::from_cents(FLAT_SHIPPING_CENTS))
    }
}

impl Configurator {
    /// Creates an unmounted configurator.
    pub fn new(shipping: Money) -> Self {
        Configurator {
            status: ConfiguratorStatus::Unmounted,
            session: None,
            shipping,
            save_status: SaveStatus::Idle,
        }
    }

    /// Mounts: fetches the catalog and creates the session.
    ///
    /// Never fails; a failed fetch leaves the configurator `Unavailable`.
    pub async fn load(source: &dyn CatalogSource, shipping: Money) -> Self {
        let mut configurator = Self::new(shipping);
        let fetched = fetch_snapshot(source).await;
        // Failure is recorded in the status
        let _ = configurator.apply_fetch(fetched);
        configurator
    }

    /// Refetches the catalog and repairs the session against it.
    pub async fn refresh(&mut self, source: &dyn CatalogSource) -> ServiceResult<CatalogRefresh> {
        let fetched = fetch_snapshot(source).await;
        self.apply_fetch(fetched)
    }

    /// Applies the result of a catalog fetch.
    ///
    /// ## Outcomes
    /// * `Ok(Reset)` - New session at defaults (first mount or recovery)
    /// * `Ok(Applied(report))` - Existing session repaired
    /// * `Err(CatalogUnavailable)` - Fetch failed or no bundles; session dropped
    pub fn apply_fetch(
        &mut self,
        fetched: ServiceResult<CatalogSnapshot>,
    ) -> ServiceResult<CatalogRefresh> {
        let snapshot = match fetched {
            Ok(snapshot) if snapshot.is_empty() => {
                return Err(self.mark_unavailable("bundle catalog is empty"));
            }
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => return Err(self.mark_unavailable(e.to_string())),
        };

        let refresh = match self.session.as_mut() {
            Some(session) => session.replace_catalog(snapshot),
            None => {
                let session = ConfigurationSession::new(snapshot)?.with_shipping(self.shipping);
                info!(bundle = ?session.selected_bundle_id(), "Configurator session created");
                self.session = Some(session);
                CatalogRefresh::Reset
            }
        };

        self.status = ConfiguratorStatus::Ready;
        Ok(refresh)
    }

    fn mark_unavailable(&mut self, reason: impl Into<String>) -> ServiceError {
        let reason = reason.into();
        warn!(%reason, "Configurator unavailable");
        self.session = None;
        self.save_status = SaveStatus::Idle;
        self.status = ConfiguratorStatus::Unavailable {
            reason: reason.clone(),
        };
        ServiceError::CatalogUnavailable { reason }
    }

    /// Discards the session.
    pub fn unmount(&mut self) {
        if self.session.take().is_some() {
            info!("Configurator unmounted");
        }
        self.status = ConfiguratorStatus::Unmounted;
        self.save_status = SaveStatus::Idle;
    }

    pub fn status(&self) -> &ConfiguratorStatus {
        &self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == ConfiguratorStatus::Ready
    }

    pub fn save_status(&self) -> &SaveStatus {
        &self.save_status
    }

    /// The session, or `CatalogUnavailable` while there is none.
    pub fn session(&self) -> ServiceResult<&ConfigurationSession> {
        self.session.as_ref().ok_or_else(|| self.unavailable_error())
    }

    pub fn session_mut(&mut self) -> ServiceResult<&mut ConfigurationSession> {
        match self.session.as_mut() {
            Some(session) => Ok(session),
            None => Err(unavailable_for(&self.status)),
        }
    }

    fn unavailable_error(&self) -> ServiceError {
        unavailable_for(&self.status)
    }

    pub fn order_summary(&self) -> ServiceResult<OrderSummary> {
        Ok(self.session()?.order_summary())
    }

    pub fn price_breakdown(&self) -> ServiceResult<PriceBreakdown> {
        Ok(self.session()?.price_breakdown())
    }

    // -------------------------------------------------------------------------
    // Reorder save bookkeeping
    // -------------------------------------------------------------------------

    /// Marks the draft in flight and returns what to send to the store.
    pub(crate) fn begin_reorder_save(&mut self) -> ServiceResult<SavePlan> {
        let plan = self.session_mut()?.begin_reorder_save()?;
        self.save_status = SaveStatus::Saving {
            bag: plan.bag_id.clone(),
            attempt: 1,
        };
        Ok(plan)
    }

    pub(crate) fn record_attempt(&mut self, plan: &SavePlan, attempt: u32) {
        if self.awaiting_save(plan) {
            self.save_status = SaveStatus::Saving {
                bag: plan.bag_id.clone(),
                attempt,
            };
        }
    }

    /// True while the session's draft is the one `plan` was built from.
    fn awaiting_save(&self, plan: &SavePlan) -> bool {
        self.session.as_ref().is_some_and(|s| {
            s.reorder_draft()
                .is_some_and(|d| d.bag_id() == plan.bag_id && d.is_saving())
        })
    }

    /// Records the store's answer for `plan`.
    ///
    /// If the draft was discarded while the request was outstanding
    /// (unmount, failed refresh) the answer is only logged; the save status
    /// stays `Idle` as the discard left it.
    pub(crate) fn finish_reorder_save(
        &mut self,
        plan: &SavePlan,
        outcome: &SaveOutcome,
    ) -> ServiceResult<()> {
        let accepted = outcome.is_accepted();
        if !self.awaiting_save(plan) {
            warn!(bag_id = %plan.bag_id, accepted, "Reorder draft discarded before save finished");
            return Ok(());
        }

        self.session_mut()?.finish_reorder_save(accepted)?;
        self.save_status = outcome.status(&plan.bag_id);
        Ok(())
    }
}

fn unavailable_for(status: &ConfiguratorStatus) -> ServiceError {
    match status {
        ConfiguratorStatus::Unavailable { reason } => ServiceError::unavailable(reason.clone()),
        _ => ServiceError::unavailable("configurator is not loaded"),
    }
}

// =============================================================================
// Shared Handle
// =============================================================================

/// Thread-safe configurator handle shared by the UI bridge and save tasks.
///
/// Cheap to clone; every clone shares the same configurator.
#[derive(Clone)]
pub struct ConfiguratorHandle {
    inner: Arc<Mutex<Configurator>>,
    events: Arc<dyn ConfiguratorEvents>,
}

impl ConfiguratorHandle {
    pub fn new(configurator: Configurator) -> Self {
        Self::with_events(configurator, Arc::new(NoOpEvents))
    }

    pub fn with_events(configurator: Configurator, events: Arc<dyn ConfiguratorEvents>) -> Self {
        ConfiguratorHandle {
            inner: Arc::new(Mutex::new(configurator)),
            events,
        }
    }

    /// Mounts a configurator over `source`.
    pub async fn load(
        source: &dyn CatalogSource,
        shipping: Money,
        events: Arc<dyn ConfiguratorEvents>,
    ) -> Self {
        let configurator = Configurator::load(source, shipping).await;
        events.emit_status(configurator.status());
        Self::with_events(configurator, events)
    }

    /// Executes a function with read access to the configurator.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let summary = handle.with_configurator(|c| c.order_summary())??;
    /// ```
    pub fn with_configurator<F, R>(&self, f: F) -> ServiceResult<R>
    where
        F: FnOnce(&Configurator) -> R,
    {
        let guard = self
            .inner
            .lock()
            .map_err(|_| ServiceError::Internal("configurator mutex poisoned".into()))?;
        Ok(f(&guard))
    }

    /// Executes a function with write access to the configurator.
    pub fn with_configurator_mut<F, R>(&self, f: F) -> ServiceResult<R>
    where
        F: FnOnce(&mut Configurator) -> R,
    {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| ServiceError::Internal("configurator mutex poisoned".into()))?;
        Ok(f(&mut guard))
    }

    /// Executes a function against the session, refusing while unavailable.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// handle.with_session_mut(|s| s.increase_extra_bag("x-legs"))??;
    /// ```
    pub fn with_session<F, R>(&self, f: F) -> ServiceResult<R>
    where
        F: FnOnce(&ConfigurationSession) -> R,
    {
        self.with_configurator(|c| c.session().map(f))?
    }

    pub fn with_session_mut<F, R>(&self, f: F) -> ServiceResult<R>
    where
        F: FnOnce(&mut ConfigurationSession) -> R,
    {
        self.with_configurator_mut(|c| c.session_mut().map(f))?
    }

    /// Refetches the catalog without holding the lock, then applies it.
    pub async fn refresh(&self, source: &dyn CatalogSource) -> ServiceResult<CatalogRefresh> {
        let fetched = fetch_snapshot(source).await;
        let (result, status) = self.with_configurator_mut(|c| {
            let result = c.apply_fetch(fetched);
            (result, c.status().clone())
        })?;
        self.events.emit_status(&status);
        result
    }

    pub fn unmount(&self) -> ServiceResult<()> {
        self.with_configurator_mut(Configurator::unmount)?;
        self.events.emit_status(&ConfiguratorStatus::Unmounted);
        Ok(())
    }

    pub fn status(&self) -> ServiceResult<ConfiguratorStatus> {
        self.with_configurator(|c| c.status().clone())
    }

    pub fn save_status(&self) -> ServiceResult<SaveStatus> {
        self.with_configurator(|c| c.save_status().clone())
    }

    pub fn order_summary(&self) -> ServiceResult<OrderSummary> {
        self.with_configurator(Configurator::order_summary)?
    }

    pub(crate) fn events(&self) -> &dyn ConfiguratorEvents {
        self.events.as_ref()
    }
}

impl std::fmt::Debug for ConfiguratorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfiguratorHandle").finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
