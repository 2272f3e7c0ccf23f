//! Domain Ports (Port/Adapter Pattern)
//!
//! The capability contract every management-plane variant implements.
//! Collectors depend only on [`GlusterBackend`]; the concrete adapters live in
//! [`crate::adapters`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Collectors                              │
//! │        volume status │ quota │ peers │ heal │ ...           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │  Arc<dyn GlusterBackend>
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Adapters (Impls)                            │
//! │       GlusterCliBackend     │     Glusterd2Backend           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use async_trait::async_trait;

use crate::domain::entities::{
    HealEntry, Peer, Quota, Snapshot, Volume, VolumeProfile, VolumeStatus,
};
use crate::error::Result;

/// Management-plane flavour behind a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendVariant {
    /// Legacy glusterd driven through the `gluster` CLI.
    Glusterd,
    /// glusterd2 driven through its REST API.
    Glusterd2,
}

impl fmt::Display for BackendVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendVariant::Glusterd => write!(f, "glusterd"),
            BackendVariant::Glusterd2 => write!(f, "glusterd2"),
        }
    }
}

/// Port for querying the cluster management plane.
///
/// Every operation returns either the complete normalized list or an error;
/// implementations never hand back partial results. Operations a variant
/// cannot serve fail with [`crate::Error::Unsupported`].
#[async_trait]
pub trait GlusterBackend: Send + Sync {
    /// Which management plane this backend talks to.
    fn variant(&self) -> BackendVariant;

    /// UUID of the peer this exporter runs on.
    async fn local_peer_id(&self) -> Result<String>;

    /// Members of the trusted storage pool, including the local peer.
    async fn peers(&self) -> Result<Vec<Peer>>;

    /// Configuration of every volume.
    async fn volume_info(&self) -> Result<Vec<Volume>>;

    /// Runtime state of every brick process, grouped by volume.
    async fn volume_status(&self) -> Result<Vec<VolumeStatus>>;

    /// Directory quotas of every volume.
    async fn quotas(&self) -> Result<Vec<Quota>>;

    /// All snapshots in the cluster.
    async fn snapshots(&self) -> Result<Vec<Snapshot>>;

    /// Pending self-heal entries per brick of `volume`.
    async fn heal_info(&self, volume: &str) -> Result<Vec<HealEntry>>;

    /// Cumulative I/O profile of `volume`.
    async fn volume_profile(&self, volume: &str) -> Result<VolumeProfile>;
}
