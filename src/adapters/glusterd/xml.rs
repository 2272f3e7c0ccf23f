//! `gluster --xml` output schema
//!
//! Raw shapes of the `<cliOutput>` documents produced by the legacy CLI.
//! Only the fields the exporter consumes are declared; everything else is
//! ignored by the deserializer.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Error, Result};

// =============================================================================
// Envelope
// =============================================================================

/// Status fields present in every `<cliOutput>`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpStatus {
    #[serde(default)]
    op_ret: i32,
    #[serde(default)]
    op_errno: i32,
    #[serde(default)]
    op_errstr: Option<String>,
}

/// Decode a `<cliOutput>` document, failing on a non-zero `opRet`.
pub(crate) fn decode<T: DeserializeOwned>(command: &str, xml: &str) -> Result<T> {
    let status: OpStatus = quick_xml::de::from_str(xml)?;
    if status.op_ret != 0 {
        let reason = status
            .op_errstr
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format!("opRet={} opErrno={}", status.op_ret, status.op_errno));
        return Err(Error::execution(command, reason));
    }
    Ok(quick_xml::de::from_str(xml)?)
}

// =============================================================================
// volume list
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VolumeListOutput {
    #[serde(default)]
    pub vol_list: VolList,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VolList {
    #[serde(default)]
    pub volume: Vec<String>,
}

// =============================================================================
// volume info
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VolumeInfoOutput {
    #[serde(default)]
    pub vol_info: VolInfo,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VolInfo {
    #[serde(default)]
    pub volumes: VolInfoVolumes,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VolInfoVolumes {
    #[serde(default)]
    pub volume: Vec<XmlVolume>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct XmlVolume {
    pub name: String,
    pub id: String,
    pub status_str: String,
    pub type_str: String,
    pub brick_count: u32,
    pub dist_count: u32,
    pub replica_count: u32,
    pub arbiter_count: u32,
    pub disperse_count: u32,
    pub redundancy_count: u32,
    pub stripe_count: u32,
    /// 0 tcp, 1 rdma, 2 both.
    pub transport: String,
    pub bricks: XmlBricks,
    pub options: XmlOptions,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlBricks {
    #[serde(default)]
    pub brick: Vec<XmlBrick>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct XmlBrick {
    /// `host:/path`
    pub name: String,
    pub host_uuid: String,
    pub is_arbiter: u8,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlOptions {
    #[serde(default)]
    pub option: Vec<XmlOption>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct XmlOption {
    pub name: String,
    pub value: String,
}

// =============================================================================
// volume status all detail
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VolumeStatusOutput {
    #[serde(default)]
    pub vol_status: XmlVolStatus,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlVolStatus {
    #[serde(default)]
    pub volumes: XmlStatusVolumes,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlStatusVolumes {
    #[serde(default)]
    pub volume: Vec<XmlStatusVolume>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct XmlStatusVolume {
    pub vol_name: String,
    pub node_count: u32,
    pub node: Vec<XmlNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct XmlNode {
    pub hostname: String,
    pub path: String,
    pub peerid: String,
    pub status: i32,
    /// Numeric, or `N/A`.
    pub port: String,
    pub ports: XmlPorts,
    pub pid: i32,
    pub size_total: u64,
    pub size_free: u64,
    pub inodes_total: Option<u64>,
    pub inodes_free: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct XmlPorts {
    pub tcp: String,
    pub rdma: String,
}

// =============================================================================
// volume quota <vol> list
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuotaListOutput {
    #[serde(default)]
    pub vol_quota: XmlVolQuota,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlVolQuota {
    #[serde(default)]
    pub limit: Vec<XmlQuotaLimit>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlQuotaLimit {
    pub path: String,
    pub hard_limit: u64,
    /// `80%`
    pub soft_limit_percent: String,
    pub soft_limit_value: u64,
    pub used_space: u64,
    pub avail_space: u64,
    /// `Yes` / `No`
    pub sl_exceeded: String,
    pub hl_exceeded: String,
}

// =============================================================================
// pool list
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PoolListOutput {
    #[serde(default)]
    pub peer_status: XmlPeerStatus,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlPeerStatus {
    #[serde(default)]
    pub peer: Vec<XmlPeer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct XmlPeer {
    pub uuid: String,
    pub hostname: String,
    pub hostnames: XmlHostnames,
    pub connected: u8,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlHostnames {
    #[serde(default)]
    pub hostname: Vec<String>,
}

// =============================================================================
// snapshot info
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SnapshotInfoOutput {
    #[serde(default)]
    pub snap_info: XmlSnapInfo,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlSnapInfo {
    #[serde(default)]
    pub snapshots: XmlSnapshots,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlSnapshots {
    #[serde(default)]
    pub snapshot: Vec<XmlSnapshot>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct XmlSnapshot {
    pub name: String,
    pub uuid: String,
    pub description: String,
    pub create_time: String,
    pub snap_volume: XmlSnapVolume,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct XmlSnapVolume {
    pub name: String,
    pub status: String,
    pub origin_volume: XmlOriginVolume,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct XmlOriginVolume {
    pub name: String,
    pub snap_count: u32,
    pub snap_remaining: u32,
}

// =============================================================================
// volume heal <vol> info
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HealInfoOutput {
    #[serde(default)]
    pub heal_info: XmlHealInfo,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlHealInfo {
    #[serde(default)]
    pub bricks: XmlHealBricks,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlHealBricks {
    #[serde(default)]
    pub brick: Vec<XmlHealBrick>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct XmlHealBrick {
    #[serde(rename = "@hostUuid")]
    pub host_uuid: String,
    /// `host:/path`
    pub name: String,
    /// `Connected` or a failure description.
    pub status: String,
    /// Count, or `-` while disconnected.
    pub number_of_entries: String,
}

// =============================================================================
// volume profile <vol> info cumulative
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileInfoOutput {
    #[serde(default)]
    pub vol_profile: XmlVolProfile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct XmlVolProfile {
    pub volname: String,
    pub brick: Vec<XmlProfileBrick>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct XmlProfileBrick {
    pub brick_name: String,
    pub cumulative_stats: XmlCumulativeStats,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct XmlCumulativeStats {
    pub duration: u64,
    pub total_read: u64,
    pub total_write: u64,
    pub fop_stats: XmlFopStats,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlFopStats {
    #[serde(default)]
    pub fop: Vec<XmlFop>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct XmlFop {
    pub name: String,
    pub hits: u64,
    pub avg_latency: f64,
    pub min_latency: f64,
    pub max_latency: f64,
}
