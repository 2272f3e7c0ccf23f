//! Canonical Entities
//!
//! Backend-agnostic snapshots of cluster state. Adapters produce these on
//! every poll; nothing here is persisted between cycles.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};

// =============================================================================
// Volume Topology
// =============================================================================

/// Transport used by a volume's bricks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Rdma,
    TcpRdma,
}

impl Transport {
    /// Decode the numeric transport code reported by glusterd.
    ///
    /// `0` is tcp, `1` is rdma, everything else is both.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "0" => Transport::Tcp,
            "1" => Transport::Rdma,
            _ => Transport::TcpRdma,
        }
    }

    /// Decode the transport name reported by glusterd2.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "tcp" => Transport::Tcp,
            "rdma" => Transport::Rdma,
            _ => Transport::TcpRdma,
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Tcp => write!(f, "tcp"),
            Transport::Rdma => write!(f, "rdma"),
            Transport::TcpRdma => write!(f, "tcp,rdma"),
        }
    }
}

/// Volume layout as reported by the management plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeType {
    Distribute,
    Replicate,
    DistributedReplicate,
    Disperse,
    DistributedDisperse,
    Other(String),
}

impl VolumeType {
    /// Parse a type string such as `Distributed-Replicate`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "distribute" => VolumeType::Distribute,
            "replicate" => VolumeType::Replicate,
            "distributed-replicate" | "distreplicate" => VolumeType::DistributedReplicate,
            "disperse" => VolumeType::Disperse,
            "distributed-disperse" | "distdisperse" => VolumeType::DistributedDisperse,
            _ => VolumeType::Other(s.trim().to_string()),
        }
    }

    /// Type of each subvolume of a volume with this layout.
    ///
    /// Distributed variants collapse to their per-subvolume kind.
    pub fn subvol_type(&self) -> VolumeType {
        match self {
            VolumeType::DistributedReplicate => VolumeType::Replicate,
            VolumeType::DistributedDisperse => VolumeType::Disperse,
            other => other.clone(),
        }
    }

    /// True for layouts that maintain redundant copies and therefore heal.
    pub fn is_healable(&self) -> bool {
        matches!(
            self,
            VolumeType::Replicate
                | VolumeType::DistributedReplicate
                | VolumeType::Disperse
                | VolumeType::DistributedDisperse
        )
    }
}

impl fmt::Display for VolumeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeType::Distribute => write!(f, "distribute"),
            VolumeType::Replicate => write!(f, "replicate"),
            VolumeType::DistributedReplicate => write!(f, "distributed-replicate"),
            VolumeType::Disperse => write!(f, "disperse"),
            VolumeType::DistributedDisperse => write!(f, "distributed-disperse"),
            VolumeType::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Number of bricks making up one subvolume.
///
/// Replica count wins, then disperse count, otherwise every brick is its own
/// subvolume.
pub fn subvol_bricks_count(replica_count: u32, disperse_count: u32) -> u32 {
    if replica_count > 0 {
        return replica_count;
    }
    if disperse_count > 0 {
        return disperse_count;
    }
    1
}

// =============================================================================
// Volumes
// =============================================================================

/// A brick as listed in volume info.
#[derive(Debug, Clone, PartialEq)]
pub struct Brick {
    pub hostname: String,
    pub path: String,
    pub peer_id: String,
    pub is_arbiter: bool,
}

/// A group of bricks that replicate or disperse data together.
#[derive(Debug, Clone, PartialEq)]
pub struct Subvolume {
    pub name: String,
    pub subvol_type: VolumeType,
    pub replica_count: u32,
    pub disperse_count: u32,
    pub bricks: Vec<Brick>,
}

/// A volume as reported by volume info.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub name: String,
    pub id: String,
    pub status: String,
    pub volume_type: VolumeType,
    pub transport: Transport,
    pub bricks: Vec<Brick>,
    pub subvols: Vec<Subvolume>,
    pub dist_count: u32,
    pub replica_count: u32,
    pub arbiter_count: u32,
    pub disperse_count: u32,
    pub redundancy_count: u32,
    pub stripe_count: u32,
    pub options: HashMap<String, String>,
}

impl Volume {
    /// True when the volume is started.
    pub fn is_started(&self) -> bool {
        self.status.eq_ignore_ascii_case("started")
    }

    /// True when the named option is set to an enabled value.
    pub fn option_enabled(&self, key: &str) -> bool {
        self.options
            .get(key)
            .map(|v| matches!(v.to_lowercase().as_str(), "on" | "yes" | "true" | "enable" | "1"))
            .unwrap_or(false)
    }
}

// =============================================================================
// Volume Status
// =============================================================================

/// Listening port of a brick process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrickPort {
    Port(u16),
    /// The backend reported no port, e.g. an offline brick or the unused half
    /// of a tcp/rdma pair.
    NotApplicable,
}

impl BrickPort {
    /// Sentinel used by glusterd for a port that does not apply.
    pub const SENTINEL: &'static str = "N/A";

    /// Parse a port field, recognising the `N/A` sentinel.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(Self::SENTINEL) || s.is_empty() {
            return Ok(BrickPort::NotApplicable);
        }
        s.parse::<u16>()
            .map(BrickPort::Port)
            .map_err(|e| Error::Parse(format!("invalid brick port '{}': {}", s, e)))
    }

    /// Numeric port, if one applies.
    pub fn number(&self) -> Option<u16> {
        match self {
            BrickPort::Port(p) => Some(*p),
            BrickPort::NotApplicable => None,
        }
    }
}

impl fmt::Display for BrickPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrickPort::Port(p) => write!(f, "{}", p),
            BrickPort::NotApplicable => write!(f, "{}", Self::SENTINEL),
        }
    }
}

/// Runtime state of one brick process.
#[derive(Debug, Clone, PartialEq)]
pub struct BrickStatus {
    pub hostname: String,
    pub path: String,
    pub peer_id: String,
    /// 1 when online, 0 otherwise.
    pub status: i32,
    pub port: BrickPort,
    pub pid: i32,
    /// Not every backend reports inode usage.
    pub inodes_total: Option<u64>,
    pub inodes_free: Option<u64>,
    pub capacity: u64,
    pub free: u64,
}

/// Status of every brick process of a volume.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeStatus {
    pub name: String,
    pub nodes: Vec<BrickStatus>,
}

// =============================================================================
// Quotas
// =============================================================================

/// Usage and limits of a directory quota.
#[derive(Debug, Clone, PartialEq)]
pub struct Quota {
    pub volume: String,
    pub path: String,
    pub used: u64,
    pub available: u64,
    pub soft_limit: u64,
    pub soft_limit_percent: i64,
    pub hard_limit: u64,
    pub soft_limit_exceeded: bool,
    pub hard_limit_exceeded: bool,
}

/// Parse a percentage such as `80%`.
pub fn percent_str_to_int(s: &str) -> Result<i64> {
    let trimmed = s.trim();
    let digits = trimmed.strip_suffix('%').unwrap_or(trimmed);
    digits
        .trim()
        .parse::<i64>()
        .map_err(|e| Error::Parse(format!("invalid percentage '{}': {}", s, e)))
}

// =============================================================================
// Peers
// =============================================================================

/// A member of the trusted storage pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Peer {
    pub id: String,
    pub hostname: String,
    pub addresses: Vec<String>,
    pub connected: bool,
}

// =============================================================================
// Snapshots
// =============================================================================

/// A volume snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub name: String,
    pub id: String,
    pub origin_volume: String,
    pub status: String,
    pub description: String,
    pub created_at: String,
    /// Snapshots taken of the origin volume.
    pub origin_snap_count: u32,
    /// Snapshots the origin volume may still take.
    pub origin_snap_remaining: u32,
}

impl Snapshot {
    /// True when the snapshot is activated.
    pub fn is_started(&self) -> bool {
        self.status.eq_ignore_ascii_case("started")
    }
}

// =============================================================================
// Self-Heal
// =============================================================================

/// Pending heal work on one brick.
#[derive(Debug, Clone, PartialEq)]
pub struct HealEntry {
    pub volume: String,
    pub hostname: String,
    pub brick_path: String,
    pub host_id: String,
    pub connected: bool,
    /// Unknown while the brick is disconnected.
    pub entries: Option<u64>,
}

/// Split a `host:/path` brick name.
pub fn split_brick_name(name: &str) -> (String, String) {
    match name.split_once(':') {
        Some((host, path)) => (host.to_string(), path.to_string()),
        None => (String::new(), name.to_string()),
    }
}

// =============================================================================
// Profiling
// =============================================================================

/// Statistics for one file operation type.
#[derive(Debug, Clone, PartialEq)]
pub struct FopStat {
    pub name: String,
    pub hits: u64,
    pub avg_latency: f64,
    pub min_latency: f64,
    pub max_latency: f64,
}

/// Cumulative profile of one brick.
#[derive(Debug, Clone, PartialEq)]
pub struct BrickProfile {
    pub brick: String,
    pub duration_secs: u64,
    pub total_reads: u64,
    pub total_writes: u64,
    pub fops: Vec<FopStat>,
}

/// Profile info for a volume.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeProfile {
    pub volume: String,
    pub bricks: Vec<BrickProfile>,
}
