//! Backend Adapters
//!
//! Implementations of the [`GlusterBackend`] port, one per management-plane
//! variant.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 GlusterBackend (domain port)                     │
//! └─────────────────────────────────────────────────────────────────┘
//!                 │                                  │
//!                 ▼                                  ▼
//! ┌───────────────────────────────┐  ┌───────────────────────────────┐
//! │ GlusterCliBackend             │  │ Glusterd2Backend              │
//! │  gluster ... --xml            │  │  GET /v1/...                  │
//! │  xml.rs → normalize.rs        │  │  types.rs                     │
//! └───────────────────────────────┘  └───────────────────────────────┘
//! ```

pub mod glusterd;
pub mod glusterd2;

use std::sync::Arc;

use crate::config::{ExporterConfig, GlusterMgmt};
use crate::domain::GlusterBackend;
use crate::error::Result;

pub use glusterd::GlusterCliBackend;
pub use glusterd2::Glusterd2Backend;

/// Build the backend selected by `gluster_mgmt`.
pub fn make_backend(config: &ExporterConfig) -> Result<Arc<dyn GlusterBackend>> {
    Ok(match config.gluster_mgmt {
        GlusterMgmt::Glusterd => Arc::new(GlusterCliBackend::from_config(config)),
        GlusterMgmt::Glusterd2 => Arc::new(Glusterd2Backend::from_config(config)?),
    })
}
