//! glusterd2 REST resources
//!
//! JSON shapes returned by the glusterd2 API and their conversion into
//! canonical entities.

use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::{
    split_brick_name, Brick, BrickPort, BrickProfile, BrickStatus, FopStat, HealEntry, Peer,
    Snapshot, Subvolume, Transport, Volume, VolumeProfile, VolumeStatus, VolumeType,
};
use crate::error::{Error, Result};

// =============================================================================
// Volumes
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Gd2Brick {
    #[serde(default)]
    pub peer_id: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, rename = "type")]
    pub brick_type: String,
}

impl Gd2Brick {
    fn into_brick(self) -> Brick {
        Brick {
            is_arbiter: self.brick_type.eq_ignore_ascii_case("arbiter"),
            hostname: self.hostname,
            path: self.path,
            peer_id: self.peer_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Gd2Subvol {
    pub name: String,
    #[serde(rename = "type")]
    pub subvol_type: String,
    #[serde(default)]
    pub replica_count: u32,
    #[serde(default)]
    pub disperse_count: u32,
    #[serde(default)]
    pub bricks: Vec<Gd2Brick>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Gd2Volume {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub volume_type: String,
    #[serde(default)]
    pub transport: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub distribute_count: u32,
    #[serde(default)]
    pub replica_count: u32,
    #[serde(default)]
    pub arbiter_count: u32,
    #[serde(default)]
    pub disperse_count: u32,
    #[serde(default)]
    pub disperse_redundancy_count: u32,
    #[serde(default)]
    pub options: HashMap<String, String>,
    #[serde(default)]
    pub subvols: Vec<Gd2Subvol>,
}

impl Gd2Volume {
    pub(crate) fn into_volume(self) -> Volume {
        let volume_type = VolumeType::parse(&self.volume_type);
        let subvols: Vec<Subvolume> = self
            .subvols
            .into_iter()
            .map(|s| Subvolume {
                name: s.name,
                subvol_type: VolumeType::parse(&s.subvol_type),
                replica_count: s.replica_count,
                disperse_count: s.disperse_count,
                bricks: s.bricks.into_iter().map(Gd2Brick::into_brick).collect(),
            })
            .collect();
        let bricks: Vec<Brick> = subvols.iter().flat_map(|s| s.bricks.clone()).collect();

        // glusterd2 reports replica/disperse counts per subvolume.
        let replica_count = if self.replica_count > 0 {
            self.replica_count
        } else {
            subvols.first().map(|s| s.replica_count).unwrap_or(0)
        };
        let disperse_count = if self.disperse_count > 0 {
            self.disperse_count
        } else {
            subvols.first().map(|s| s.disperse_count).unwrap_or(0)
        };
        let dist_count = if self.distribute_count > 0 {
            self.distribute_count
        } else {
            subvols.len() as u32
        };

        Volume {
            name: self.name,
            id: self.id,
            status: self.state,
            volume_type,
            transport: Transport::from_name(&self.transport),
            bricks,
            subvols,
            dist_count,
            replica_count,
            arbiter_count: self.arbiter_count,
            disperse_count,
            redundancy_count: self.disperse_redundancy_count,
            stripe_count: 1,
            options: self.options,
        }
    }
}

// =============================================================================
// Brick Status
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub(crate) struct Gd2Size {
    pub capacity: u64,
    pub used: u64,
    pub free: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Gd2BrickStatus {
    pub info: Gd2Brick,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub pid: i32,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub size: Gd2Size,
}

impl Gd2BrickStatus {
    fn into_brick_status(self) -> BrickStatus {
        BrickStatus {
            hostname: self.info.hostname,
            path: self.info.path,
            peer_id: self.info.peer_id,
            status: i32::from(self.online),
            // glusterd2 reports port 0 for bricks that are not listening.
            port: match self.port {
                0 => BrickPort::NotApplicable,
                p => BrickPort::Port(p),
            },
            pid: self.pid,
            inodes_total: None,
            inodes_free: None,
            capacity: self.size.capacity,
            free: self.size.free,
        }
    }
}

pub(crate) fn volume_status(volume: &str, bricks: Vec<Gd2BrickStatus>) -> VolumeStatus {
    VolumeStatus {
        name: volume.to_string(),
        nodes: bricks
            .into_iter()
            .map(Gd2BrickStatus::into_brick_status)
            .collect(),
    }
}

// =============================================================================
// Peers
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Gd2Peer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub peer_addresses: Vec<String>,
    #[serde(default)]
    pub online: bool,
}

impl Gd2Peer {
    pub(crate) fn into_peer(self) -> Peer {
        Peer {
            id: self.id,
            hostname: self.name,
            addresses: self.peer_addresses,
            connected: self.online,
        }
    }
}

// =============================================================================
// Snapshots
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Gd2SnapVolInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Gd2Snap {
    pub vol_info: Gd2SnapVolInfo,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Gd2SnapList {
    pub parent_name: String,
    #[serde(default)]
    pub snap_list: Vec<Gd2Snap>,
    #[serde(default)]
    pub snap_remaining: u32,
}

pub(crate) fn snapshots(lists: Vec<Gd2SnapList>) -> Vec<Snapshot> {
    let mut out = Vec::new();
    for list in lists {
        let count = list.snap_list.len() as u32;
        for snap in list.snap_list {
            out.push(Snapshot {
                name: snap.vol_info.name,
                id: snap.vol_info.id,
                origin_volume: list.parent_name.clone(),
                status: snap.vol_info.state,
                description: snap.description,
                created_at: snap.created_at,
                origin_snap_count: count,
                origin_snap_remaining: list.snap_remaining,
            });
        }
    }
    out
}

// =============================================================================
// Heal Info
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Gd2HealCount {
    Count(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Gd2HealBrick {
    pub name: String,
    #[serde(default)]
    pub host_id: String,
    #[serde(default)]
    pub status: String,
    pub entries: Option<Gd2HealCount>,
}

impl Gd2HealBrick {
    pub(crate) fn into_heal_entry(self, volume: &str) -> Result<HealEntry> {
        let (hostname, brick_path) = split_brick_name(&self.name);
        let entries = match self.entries {
            None => None,
            Some(Gd2HealCount::Count(n)) => Some(n),
            Some(Gd2HealCount::Text(t)) if t.trim() == "-" || t.trim().is_empty() => None,
            Some(Gd2HealCount::Text(t)) => Some(t.trim().parse::<u64>().map_err(|e| {
                Error::Parse(format!(
                    "volume {} brick {}: heal entries '{}': {}",
                    volume, self.name, t, e
                ))
            })?),
        };
        Ok(HealEntry {
            volume: volume.to_string(),
            hostname,
            brick_path,
            host_id: self.host_id,
            connected: self.status.eq_ignore_ascii_case("connected"),
            entries,
        })
    }
}

// =============================================================================
// Profile
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub(crate) struct Gd2Fop {
    pub name: String,
    pub hits: u64,
    pub avg_latency: f64,
    pub min_latency: f64,
    pub max_latency: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Gd2BrickProfile {
    pub brick_name: String,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub total_read: u64,
    #[serde(default)]
    pub total_write: u64,
    #[serde(default)]
    pub fops: Vec<Gd2Fop>,
}

pub(crate) fn volume_profile(volume: &str, bricks: Vec<Gd2BrickProfile>) -> VolumeProfile {
    VolumeProfile {
        volume: volume.to_string(),
        bricks: bricks
            .into_iter()
            .map(|b| BrickProfile {
                brick: b.brick_name,
                duration_secs: b.duration,
                total_reads: b.total_read,
                total_writes: b.total_write,
                fops: b
                    .fops
                    .into_iter()
                    .map(|f| FopStat {
                        name: f.name,
                        hits: f.hits,
                        avg_latency: f.avg_latency,
                        min_latency: f.min_latency,
                        max_latency: f.max_latency,
                    })
                    .collect(),
            })
            .collect(),
    }
}

// =============================================================================
// Local Peer
// =============================================================================

#[derive(Debug, Deserialize)]
struct UuidFile {
    #[serde(rename = "peer-id")]
    peer_id: String,
}

/// Extract `peer-id` from glusterd2's `uuid.toml`.
pub fn parse_uuid_toml(content: &str) -> Result<String> {
    let file: UuidFile = toml::from_str(content)
        .map_err(|e| Error::Parse(format!("uuid.toml: {}", e.message())))?;
    if file.peer_id.is_empty() {
        return Err(Error::Parse("uuid.toml has an empty peer-id".into()));
    }
    Ok(file.peer_id)
}
