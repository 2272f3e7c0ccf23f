//! glusterd Backend Adapter
//!
//! Implements the `GlusterBackend` port by running the `gluster` CLI with
//! `--xml` and normalizing its output.

pub mod normalize;
pub(crate) mod xml;

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::config::ExporterConfig;
use crate::domain::{
    BackendVariant, GlusterBackend, HealEntry, Peer, Quota, Snapshot, Volume, VolumeProfile,
    VolumeStatus,
};
use crate::error::{Error, Result};

use self::xml::{
    decode, HealInfoOutput, PoolListOutput, ProfileInfoOutput, QuotaListOutput,
    SnapshotInfoOutput, VolumeInfoOutput, VolumeListOutput, VolumeStatusOutput,
};

/// File in the glusterd working directory holding the local peer UUID.
const GLUSTERD_INFO_FILE: &str = "glusterd.info";

/// Backend driving the legacy `gluster` CLI.
#[derive(Clone)]
pub struct GlusterCliBackend {
    gluster_cmd: String,
    workdir: PathBuf,
    remote_host: Option<String>,
    glusterd_sock: Option<String>,
}

impl GlusterCliBackend {
    /// Create a backend running `gluster_cmd` against the local glusterd.
    pub fn new(gluster_cmd: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            gluster_cmd: gluster_cmd.into(),
            workdir: workdir.into(),
            remote_host: None,
            glusterd_sock: None,
        }
    }

    /// Create a backend from exporter configuration.
    pub fn from_config(config: &ExporterConfig) -> Self {
        let mut backend = Self::new(config.gluster_cmd.clone(), config.glusterd_workdir.clone());
        backend.remote_host = config.gluster_remote_host.clone();
        backend.glusterd_sock = config.glusterd_sock.clone();
        backend
    }

    /// Query a remote glusterd.
    pub fn with_remote_host(mut self, host: impl Into<String>) -> Self {
        self.remote_host = Some(host.into());
        self
    }

    /// Talk to glusterd over a specific control socket.
    pub fn with_glusterd_sock(mut self, sock: impl Into<String>) -> Self {
        self.glusterd_sock = Some(sock.into());
        self
    }

    /// Full argument list for a subcommand.
    ///
    /// XML output is always forced; a control socket wins over a remote host.
    pub fn command_args(&self, args: &[&str]) -> Vec<String> {
        let mut out: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        out.push("--xml".to_string());
        if let Some(sock) = self.glusterd_sock.as_deref().filter(|s| !s.is_empty()) {
            out.push(format!("--glusterd-sock={}", sock));
        } else if let Some(host) = self.remote_host.as_deref().filter(|h| !h.is_empty()) {
            out.push(format!("--remote-host={}", host));
        }
        out
    }

    /// Run a subcommand and return its stdout.
    async fn exec_gluster(&self, args: &[&str]) -> Result<String> {
        let full_args = self.command_args(args);
        let command_line = format!("{} {}", self.gluster_cmd, full_args.join(" "));
        debug!(command = %command_line, "Running gluster");

        let output = Command::new(&self.gluster_cmd)
            .args(&full_args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::execution(&command_line, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = if stderr.trim().is_empty() {
                output.status.to_string()
            } else {
                format!("{}: {}", output.status, stderr.trim())
            };
            return Err(Error::execution(command_line, reason));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| Error::Parse(format!("{}: output is not UTF-8: {}", command_line, e)))
    }

    async fn query<T: serde::de::DeserializeOwned>(&self, args: &[&str]) -> Result<T> {
        let out = self.exec_gluster(args).await?;
        decode(&args.join(" "), &out)
    }

    async fn volume_names(&self) -> Result<Vec<String>> {
        let list: VolumeListOutput = self.query(&["volume", "list"]).await?;
        Ok(list.vol_list.volume)
    }
}

impl std::fmt::Debug for GlusterCliBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlusterCliBackend")
            .field("gluster_cmd", &self.gluster_cmd)
            .field("workdir", &self.workdir)
            .field("remote_host", &self.remote_host)
            .field("glusterd_sock", &self.glusterd_sock)
            .finish()
    }
}

/// Extract the `UUID=` value from a `glusterd.info` file.
pub fn parse_glusterd_info(content: &str) -> Result<String> {
    content
        .lines()
        .filter_map(|line| line.trim().strip_prefix("UUID="))
        .map(|uuid| uuid.trim().to_string())
        .find(|uuid| !uuid.is_empty())
        .ok_or_else(|| Error::Parse("glusterd.info has no UUID entry".into()))
}

#[async_trait]
impl GlusterBackend for GlusterCliBackend {
    fn variant(&self) -> BackendVariant {
        BackendVariant::Glusterd
    }

    #[instrument(skip(self))]
    async fn local_peer_id(&self) -> Result<String> {
        let path = self.workdir.join(GLUSTERD_INFO_FILE);
        let content = tokio::fs::read_to_string(&path).await?;
        parse_glusterd_info(&content)
    }

    #[instrument(skip(self))]
    async fn peers(&self) -> Result<Vec<Peer>> {
        let out: PoolListOutput = self.query(&["pool", "list"]).await?;
        Ok(out.peer_status.peer.into_iter().map(normalize::peer).collect())
    }

    #[instrument(skip(self))]
    async fn volume_info(&self) -> Result<Vec<Volume>> {
        let out: VolumeInfoOutput = self.query(&["volume", "info"]).await?;
        Ok(out
            .vol_info
            .volumes
            .volume
            .into_iter()
            .map(normalize::volume)
            .collect())
    }

    #[instrument(skip(self))]
    async fn volume_status(&self) -> Result<Vec<VolumeStatus>> {
        let out: VolumeStatusOutput = self.query(&["volume", "status", "all", "detail"]).await?;
        out.vol_status
            .volumes
            .volume
            .into_iter()
            .map(normalize::volume_status)
            .collect()
    }

    #[instrument(skip(self))]
    async fn quotas(&self) -> Result<Vec<Quota>> {
        let mut quotas = Vec::new();
        for volume in self.volume_names().await? {
            let out: QuotaListOutput = self
                .query(&["volume", "quota", volume.as_str(), "list"])
                .await?;
            for limit in out.vol_quota.limit {
                quotas.push(normalize::quota(&volume, limit)?);
            }
        }
        Ok(quotas)
    }

    #[instrument(skip(self))]
    async fn snapshots(&self) -> Result<Vec<Snapshot>> {
        let out: SnapshotInfoOutput = self.query(&["snapshot", "info"]).await?;
        Ok(out
            .snap_info
            .snapshots
            .snapshot
            .into_iter()
            .map(normalize::snapshot)
            .collect())
    }

    #[instrument(skip(self))]
    async fn heal_info(&self, volume: &str) -> Result<Vec<HealEntry>> {
        let out: HealInfoOutput = self.query(&["volume", "heal", volume, "info"]).await?;
        out.heal_info
            .bricks
            .brick
            .into_iter()
            .map(|b| normalize::heal_entry(volume, b))
            .collect()
    }

    #[instrument(skip(self))]
    async fn volume_profile(&self, volume: &str) -> Result<VolumeProfile> {
        let out: ProfileInfoOutput = self
            .query(&["volume", "profile", volume, "info", "cumulative"])
            .await?;
        Ok(normalize::volume_profile(volume, out.vol_profile))
    }
}
