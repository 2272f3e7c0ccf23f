//! glusterd2 Backend Adapter
//!
//! Implements the `GlusterBackend` port against the glusterd2 REST API.

pub mod types;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::ExporterConfig;
use crate::domain::{
    BackendVariant, GlusterBackend, HealEntry, Peer, Quota, Snapshot, Volume, VolumeProfile,
    VolumeStatus,
};
use crate::error::{Error, Result};

use self::types::{
    Gd2BrickProfile, Gd2BrickStatus, Gd2HealBrick, Gd2Peer, Gd2SnapList, Gd2Volume,
};

/// File in the glusterd2 working directory holding the local peer UUID.
const UUID_FILE: &str = "uuid.toml";

/// Backend querying the glusterd2 REST API.
#[derive(Clone)]
pub struct Glusterd2Backend {
    client: Client,
    endpoint: String,
    workdir: PathBuf,
}

impl Glusterd2Backend {
    /// Create a backend for `endpoint`, e.g. `http://127.0.0.1:24007`.
    pub fn new(
        endpoint: impl Into<String>,
        workdir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            workdir: workdir.into(),
        })
    }

    /// Create a backend from exporter configuration.
    pub fn from_config(config: &ExporterConfig) -> Result<Self> {
        Self::new(
            config.gd2_rest_endpoint.clone(),
            config.glusterd_workdir.clone(),
            config.gd2_request_timeout(),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.endpoint, path)
    }

    fn volume_url(&self, volume: &str, suffix: &str) -> String {
        self.url(&format!(
            "/volumes/{}{}",
            urlencoding::encode(volume),
            suffix
        ))
    }

    /// GET `url` and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = %url, "Querying glusterd2");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::execution(
                format!("GET {}", url),
                format!("{}: {}", status, body.trim()),
            ));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn volumes(&self) -> Result<Vec<Gd2Volume>> {
        self.get_json(&self.url("/volumes")).await
    }
}

impl std::fmt::Debug for Glusterd2Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Glusterd2Backend")
            .field("endpoint", &self.endpoint)
            .field("workdir", &self.workdir)
            .finish()
    }
}

#[async_trait]
impl GlusterBackend for Glusterd2Backend {
    fn variant(&self) -> BackendVariant {
        BackendVariant::Glusterd2
    }

    #[instrument(skip(self))]
    async fn local_peer_id(&self) -> Result<String> {
        let content = tokio::fs::read_to_string(self.workdir.join(UUID_FILE)).await?;
        types::parse_uuid_toml(&content)
    }

    #[instrument(skip(self))]
    async fn peers(&self) -> Result<Vec<Peer>> {
        let peers: Vec<Gd2Peer> = self.get_json(&self.url("/peers")).await?;
        Ok(peers.into_iter().map(Gd2Peer::into_peer).collect())
    }

    #[instrument(skip(self))]
    async fn volume_info(&self) -> Result<Vec<Volume>> {
        Ok(self
            .volumes()
            .await?
            .into_iter()
            .map(Gd2Volume::into_volume)
            .collect())
    }

    #[instrument(skip(self))]
    async fn volume_status(&self) -> Result<Vec<VolumeStatus>> {
        let mut statuses = Vec::new();
        for volume in self.volumes().await? {
            let bricks: Vec<Gd2BrickStatus> = self
                .get_json(&self.volume_url(&volume.name, "/bricks"))
                .await?;
            statuses.push(types::volume_status(&volume.name, bricks));
        }
        Ok(statuses)
    }

    async fn quotas(&self) -> Result<Vec<Quota>> {
        Err(Error::Unsupported("quotas are not exposed by glusterd2".into()))
    }

    #[instrument(skip(self))]
    async fn snapshots(&self) -> Result<Vec<Snapshot>> {
        let lists: Vec<Gd2SnapList> = self.get_json(&self.url("/snapshots")).await?;
        Ok(types::snapshots(lists))
    }

    #[instrument(skip(self))]
    async fn heal_info(&self, volume: &str) -> Result<Vec<HealEntry>> {
        let bricks: Vec<Gd2HealBrick> = self
            .get_json(&self.volume_url(volume, "/heal-info"))
            .await?;
        bricks
            .into_iter()
            .map(|b| b.into_heal_entry(volume))
            .collect()
    }

    #[instrument(skip(self))]
    async fn volume_profile(&self, volume: &str) -> Result<VolumeProfile> {
        let bricks: Vec<Gd2BrickProfile> = self
            .get_json(&self.volume_url(volume, "/profile/info"))
            .await?;
        Ok(types::volume_profile(volume, bricks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn backend() -> Glusterd2Backend {
        Glusterd2Backend::new(
            "http://127.0.0.1:24007/",
            "/var/lib/glusterd2",
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let gd2 = backend();
        assert_eq!(gd2.url("/volumes"), "http://127.0.0.1:24007/v1/volumes");
        assert_eq!(
            gd2.volume_url("gv 0", "/bricks"),
            "http://127.0.0.1:24007/v1/volumes/gv%200/bricks"
        );
    }

    #[tokio::test]
    async fn test_quotas_unsupported() {
        assert_matches!(backend().quotas().await, Err(Error::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        let gd2 = Glusterd2Backend::new(
            "http://127.0.0.1:19999",
            "/nonexistent",
            Duration::from_millis(500),
        )
        .unwrap();
        assert_matches!(gd2.volume_info().await, Err(Error::Http(_)));
    }

    #[test]
    fn test_from_config() {
        let config = ExporterConfig::default();
        let gd2 = Glusterd2Backend::from_config(&config).unwrap();
        assert_eq!(gd2.variant(), BackendVariant::Glusterd2);
    }
}
