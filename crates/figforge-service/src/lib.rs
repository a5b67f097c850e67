//! # figforge-service: Async Orchestration for the Figforge Configurator
//!
//! This crate connects the pure configurator in `figforge-core` to the
//! catalog it reads and the store it writes, and carries the ambient
//! configuration and logging setup.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Configurator Service                               │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │              ConfiguratorHandle (Arc<Mutex<Configurator>>)       │  │
//! │  │                                                                  │  │
//! │  │  status: Unmounted | Ready | Unavailable { reason }             │  │
//! │  │  session: ConfigurationSession (figforge-core)                  │  │
//! │  │  save_status: Idle | Saving | Saved | Failed                    │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ fetch_snapshot │  │ save_reorder   │  │ TorsoBagEditor         │    │
//! │  │                │  │                │  │                        │    │
//! │  │ 4 lists via    │  │ in-flight      │  │ admin create / edit    │    │
//! │  │ try_join!,     │  │ guard, manual  │  │ with skip counts and   │    │
//! │  │ validated      │  │ or backoff     │  │ blank quantities       │    │
//! │  └───────┬────────┘  └───────┬────────┘  └──────────┬─────────────┘    │
//! │          │                   │                      │                   │
//! │          ▼                   ▼                      ▼                   │
//! │     CatalogSource       TorsoBagStore          TorsoBagStore            │
//! │          └──────── figforge_db::Database / InMemoryCatalog ────┘        │
//! │                                                                         │
//! │  STATUS EVENTS (to the UI bridge via ConfiguratorEvents):              │
//! │  • emit_status      - availability changes                             │
//! │  • emit_save_status - reorder save progress                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`collaborators`] - `CatalogSource` / `TorsoBagStore` traits and impls
//! - [`configurator`] - Lifecycle, availability status, shared handle
//! - [`reorder`] - Reorder save workflow and retry policy
//! - [`authoring`] - Torso bag editor for the back office
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Service errors and the UI error payload
//! - [`telemetry`] - Tracing subscriber setup
//!
//! ## Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use figforge_service::*;
//!
//! telemetry::init_tracing();
//! let config = ServiceConfig::load_or_default(None);
//! let db = figforge_db::Database::new(config.db_config()).await?;
//!
//! let handle = ConfiguratorHandle::load(&db, config.shipping(), Arc::new(NoOpEvents)).await;
//! handle.with_session_mut(|s| s.increase_extra_bag("extra-legs"))??;
//!
//! handle.with_session_mut(|s| s.select_torso_bag("bag-1").map(|_| ()))??;
//! handle.with_session_mut(|s| s.move_design(3, 0))??;
//! save_reorder(&handle, &db, &RetryPolicy::from_config(&config)).await?;
//! ```

pub mod authoring;
pub mod collaborators;
pub mod config;
pub mod configurator;
pub mod error;
pub mod reorder;
pub mod telemetry;

pub use authoring::TorsoBagEditor;
pub use collaborators::{CatalogSource, InMemoryCatalog, TorsoBagStore};
pub use config::{RetryMode, ServiceConfig};
pub use configurator::{
    fetch_snapshot, Configurator, ConfiguratorEvents, ConfiguratorHandle, ConfiguratorStatus,
    NoOpEvents,
};
pub use error::{ApiError, ErrorCode, ServiceError, ServiceResult};
pub use reorder::{save_reorder, RetryPolicy, SaveOutcome, SaveStatus};
