//! Domain Layer
//!
//! Canonical entities and the backend port.
//!
//! - **Entities** (`entities.rs`) - Backend-agnostic volume, brick, quota,
//!   peer, snapshot, heal and profile snapshots plus the pure field decoders
//! - **Ports** (`ports.rs`) - The [`GlusterBackend`] capability contract
//!
//! # Usage
//!
//! ```ignore
//! use gluster_exporter::domain::GlusterBackend;
//!
//! async fn count_started(backend: &dyn GlusterBackend) -> Result<usize> {
//!     let volumes = backend.volume_info().await?;
//!     Ok(volumes.iter().filter(|v| v.is_started()).count())
//! }
//! ```

pub mod entities;
pub mod ports;

pub use entities::{
    percent_str_to_int, split_brick_name, subvol_bricks_count, Brick, BrickPort, BrickProfile,
    BrickStatus, FopStat, HealEntry, Peer, Quota, Snapshot, Subvolume, Transport, Volume,
    VolumeProfile, VolumeStatus, VolumeType,
};
pub use ports::{BackendVariant, GlusterBackend};
