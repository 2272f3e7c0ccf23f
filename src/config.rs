//! Exporter Configuration
//!
//! Settings are read from an optional YAML file; every field has a default so
//! an empty or missing file yields a working glusterd setup.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::BackendVariant;
use crate::error::{Error, Result};

/// Polling interval used when a collector has no `sync_interval`.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(60);

// =============================================================================
// Management Plane
// =============================================================================

/// Which management daemon the cluster runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GlusterMgmt {
    #[default]
    Glusterd,
    Glusterd2,
}

impl From<GlusterMgmt> for BackendVariant {
    fn from(mgmt: GlusterMgmt) -> Self {
        match mgmt {
            GlusterMgmt::Glusterd => BackendVariant::Glusterd,
            GlusterMgmt::Glusterd2 => BackendVariant::Glusterd2,
        }
    }
}

impl fmt::Display for GlusterMgmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        BackendVariant::from(*self).fmt(f)
    }
}

// =============================================================================
// Collector Settings
// =============================================================================

/// Per-collector scheduling settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Never start this collector.
    pub disabled: bool,

    /// Seconds between collections; unset falls back to the default interval.
    pub sync_interval: Option<u64>,
}

impl CollectorConfig {
    /// Effective polling interval.
    pub fn interval(&self) -> Duration {
        match self.sync_interval {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => DEFAULT_SYNC_INTERVAL,
        }
    }
}

// =============================================================================
// Exporter Settings
// =============================================================================

/// Top-level exporter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Management daemon flavour.
    pub gluster_mgmt: GlusterMgmt,

    /// Path of the `gluster` executable.
    pub gluster_cmd: String,

    /// glusterd working directory, holds the local peer UUID.
    pub glusterd_workdir: String,

    /// Query a remote glusterd instead of the local one.
    pub gluster_remote_host: Option<String>,

    /// Local glusterd control socket; wins over `gluster_remote_host`.
    pub glusterd_sock: Option<String>,

    /// glusterd2 REST endpoint.
    pub gd2_rest_endpoint: String,

    /// Timeout for each glusterd2 request, in seconds.
    pub gd2_request_timeout_secs: u64,

    /// Cluster identifier attached to every metric when set.
    pub cluster_id: Option<String>,

    /// Port the exposition server listens on.
    pub port: u16,

    /// Path serving the metrics.
    pub metrics_path: String,

    /// Per-collector settings keyed by collector name.
    pub collectors: HashMap<String, CollectorConfig>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            gluster_mgmt: GlusterMgmt::Glusterd,
            gluster_cmd: "gluster".to_string(),
            glusterd_workdir: "/var/lib/glusterd".to_string(),
            gluster_remote_host: None,
            glusterd_sock: None,
            gd2_rest_endpoint: "http://127.0.0.1:24007".to_string(),
            gd2_request_timeout_secs: 30,
            cluster_id: None,
            port: 9713,
            metrics_path: "/metrics".to_string(),
            collectors: HashMap::new(),
        }
    }
}

impl ExporterConfig {
    /// Load and validate a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse and validate YAML configuration text.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        // An empty document decodes as unit, not as a mapping.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".into()));
        }
        if self.metrics_path.is_empty() || !self.metrics_path.starts_with('/') {
            return Err(Error::Config(format!(
                "metrics_path must start with '/': {:?}",
                self.metrics_path
            )));
        }
        if self.metrics_path == crate::server::HEALTH_PATH {
            return Err(Error::Config(format!(
                "metrics_path collides with {}",
                crate::server::HEALTH_PATH
            )));
        }
        match self.gluster_mgmt {
            GlusterMgmt::Glusterd => {
                if self.gluster_cmd.trim().is_empty() {
                    return Err(Error::Config("gluster_cmd must not be empty".into()));
                }
            }
            GlusterMgmt::Glusterd2 => {
                if !(self.gd2_rest_endpoint.starts_with("http://")
                    || self.gd2_rest_endpoint.starts_with("https://"))
                {
                    return Err(Error::Config(format!(
                        "gd2_rest_endpoint must be an http(s) URL: {}",
                        self.gd2_rest_endpoint
                    )));
                }
                if self.gd2_request_timeout_secs == 0 {
                    return Err(Error::Config(
                        "gd2_request_timeout_secs must be non-zero".into(),
                    ));
                }
            }
        }
        for (name, collector) in &self.collectors {
            if collector.sync_interval == Some(0) {
                return Err(Error::Config(format!(
                    "collector {}: sync_interval must be non-zero",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Settings for a collector, defaulting when not configured.
    pub fn collector(&self, name: &str) -> CollectorConfig {
        self.collectors.get(name).cloned().unwrap_or_default()
    }

    /// Request timeout for the glusterd2 client.
    pub fn gd2_request_timeout(&self) -> Duration {
        Duration::from_secs(self.gd2_request_timeout_secs)
    }
}
