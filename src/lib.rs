//! Gluster Exporter
//!
//! Prometheus exporter for GlusterFS clusters. Polls the management plane,
//! either the legacy `gluster` CLI (glusterd) or the glusterd2 REST API, and
//! publishes volume, brick, quota, peer, snapshot, heal and profile metrics.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │  Scheduler   │───▶│  Collectors  │───▶│   Metric     │───▶│    HTTP      │
//! │ (per task)   │    │              │    │   Registry   │    │   /metrics   │
//! └──────────────┘    └──────┬───────┘    └──────────────┘    └──────────────┘
//!                            │
//!                            ▼
//!                   ┌──────────────────┐
//!                   │  GlusterBackend  │  glusterd CLI  |  glusterd2 REST
//!                   └──────────────────┘
//! ```
//!
//! Series that stop being reported are evicted once their TTL expires, so
//! deleted volumes and restarted bricks disappear from the exposition.
//!
//! # Modules
//!
//! - [`adapters`] - Backend implementations of the domain port
//! - [`collectors`] - Metric collectors
//! - [`config`] - Exporter configuration
//! - [`domain`] - Entities and the backend port
//! - [`error`] - Error types
//! - [`metrics`] - Metric registry and TTL-evicting gauges
//! - [`scheduler`] - Per-collector polling loops
//! - [`server`] - Exposition and health endpoints

pub mod adapters;
pub mod collectors;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod scheduler;
pub mod server;

// Re-export commonly used types
pub use adapters::{make_backend, GlusterCliBackend, Glusterd2Backend};
pub use collectors::{default_collectors, Collector, CollectorSet};
pub use config::{ExporterConfig, GlusterMgmt};
pub use domain::{BackendVariant, GlusterBackend};
pub use error::{Error, Result};
pub use metrics::{ExportedGaugeVec, MetricDefinition, MetricRegistry};
pub use scheduler::Scheduler;
