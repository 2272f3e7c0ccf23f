//! End-to-end collector tests against an in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use gluster_exporter::collectors::{Collector, QuotaCollector, VolumeStatusCollector};
use gluster_exporter::config::{CollectorConfig, ExporterConfig};
use gluster_exporter::domain::{
    BackendVariant, BrickPort, BrickStatus, GlusterBackend, HealEntry, Peer, Quota, Snapshot,
    Volume, VolumeProfile, VolumeStatus,
};
use gluster_exporter::error::{Error, Result};
use gluster_exporter::metrics::MetricRegistry;
use gluster_exporter::{server, CollectorSet, Scheduler};

#[derive(Default)]
struct MemoryBackend {
    quotas: Mutex<Vec<Quota>>,
    status: Mutex<Vec<VolumeStatus>>,
}

impl MemoryBackend {
    fn set(&self, quotas: Vec<Quota>) {
        *self.quotas.lock() = quotas;
    }

    fn set_status(&self, status: Vec<VolumeStatus>) {
        *self.status.lock() = status;
    }
}

#[async_trait]
impl GlusterBackend for MemoryBackend {
    fn variant(&self) -> BackendVariant {
        BackendVariant::Glusterd
    }
    async fn local_peer_id(&self) -> Result<String> {
        Ok("p1".into())
    }
    async fn peers(&self) -> Result<Vec<Peer>> {
        Ok(Vec::new())
    }
    async fn volume_info(&self) -> Result<Vec<Volume>> {
        Ok(Vec::new())
    }
    async fn volume_status(&self) -> Result<Vec<VolumeStatus>> {
        Ok(self.status.lock().clone())
    }
    async fn quotas(&self) -> Result<Vec<Quota>> {
        Ok(self.quotas.lock().clone())
    }
    async fn snapshots(&self) -> Result<Vec<Snapshot>> {
        Ok(Vec::new())
    }
    async fn heal_info(&self, _volume: &str) -> Result<Vec<HealEntry>> {
        Ok(Vec::new())
    }
    async fn volume_profile(&self, volume: &str) -> Result<VolumeProfile> {
        Err(Error::execution(format!("volume profile {}", volume), "not started"))
    }
}

fn quota(volume: &str, path: &str, used: u64) -> Quota {
    Quota {
        volume: volume.into(),
        path: path.into(),
        used,
        available: 1000 - used,
        soft_limit: 800,
        soft_limit_percent: 80,
        hard_limit: 1000,
        soft_limit_exceeded: false,
        hard_limit_exceeded: false,
    }
}

fn brick(hostname: &str, pid: i32) -> BrickStatus {
    BrickStatus {
        hostname: hostname.into(),
        path: "/bricks/gv0".into(),
        peer_id: format!("{}-id", hostname),
        status: 1,
        port: BrickPort::Port(49152),
        pid,
        inodes_total: Some(100),
        inodes_free: Some(60),
        capacity: 1000,
        free: 400,
    }
}

fn series<'a>(text: &'a str, metric: &str) -> Vec<&'a str> {
    let prefix = format!("{}{{", metric);
    text.lines().filter(|l| l.starts_with(&prefix)).collect()
}

#[tokio::test]
async fn test_quota_exposition() {
    let registry = MetricRegistry::new();
    let collector = QuotaCollector::new(&registry).unwrap();
    let backend = MemoryBackend::default();
    backend.set(vec![quota("v1", "/a", 100)]);

    collector.run_once(&backend).await.unwrap();

    let text = registry.render().unwrap();
    assert!(text.contains("gluster_quota_used{path=\"/a\",volume=\"v1\"} 100"));
    assert!(text.contains("gluster_quota_available{path=\"/a\",volume=\"v1\"} 900"));
    assert!(text.contains("gluster_quota_hard_limit{path=\"/a\",volume=\"v1\"} 1000"));
}

#[tokio::test]
async fn test_vanished_series_evicted_after_ttl() {
    let registry = MetricRegistry::with_options(None, Duration::from_millis(100));
    let collector = QuotaCollector::new(&registry).unwrap();
    let backend = MemoryBackend::default();

    backend.set(vec![quota("v1", "/a", 100), quota("v2", "/b", 200)]);
    collector.run_once(&backend).await.unwrap();

    // v2 disappears; it stays exported until its TTL runs out.
    backend.set(vec![quota("v1", "/a", 150)]);
    collector.run_once(&backend).await.unwrap();
    let text = registry.render().unwrap();
    assert!(text.contains("gluster_quota_used{path=\"/b\",volume=\"v2\"} 200"));
    assert!(text.contains("gluster_quota_used{path=\"/a\",volume=\"v1\"} 150"));

    tokio::time::sleep(Duration::from_millis(250)).await;
    collector.run_once(&backend).await.unwrap();

    let text = registry.render().unwrap();
    assert!(!text.contains("volume=\"v2\""));
    assert!(text.contains("gluster_quota_used{path=\"/a\",volume=\"v1\"} 150"));
}

#[tokio::test]
async fn test_vanished_volume_keeps_brick_series_until_ttl() {
    let registry = MetricRegistry::with_options(None, Duration::from_millis(200));
    let collector = VolumeStatusCollector::new(&registry, "node1").unwrap();
    let backend = MemoryBackend::default();

    backend.set_status(vec![VolumeStatus {
        name: "gv0".into(),
        nodes: vec![brick("n1", 1234), brick("n2", 5678)],
    }]);
    collector.run_once(&backend).await.unwrap();

    let text = registry.render().unwrap();
    let bricks = series(&text, "gluster_volume_brick_status");
    assert_eq!(bricks.len(), 2);
    assert!(bricks.iter().all(|l| l.contains("volume_name=\"gv0\"")));
    assert!(text.contains("gluster_volume_status_brick_count{instance=\"node1\",volume_name=\"gv0\"} 2"));

    // gv0 is gone from the next cycle on, still inside the TTL.
    backend.set_status(Vec::new());
    collector.run_once(&backend).await.unwrap();
    let text = registry.render().unwrap();
    assert_eq!(series(&text, "gluster_volume_brick_status").len(), 2);
    assert_eq!(series(&text, "gluster_volume_brick_free_bytes").len(), 2);
    assert_eq!(series(&text, "gluster_volume_status_brick_count").len(), 1);

    tokio::time::sleep(Duration::from_millis(400)).await;
    collector.run_once(&backend).await.unwrap();

    let text = registry.render().unwrap();
    assert!(!text.contains("volume_name=\"gv0\""));
    assert!(series(&text, "gluster_volume_brick_status").is_empty());
    assert!(series(&text, "gluster_volume_brick_port").is_empty());
    assert!(series(&text, "gluster_volume_status_brick_count").is_empty());
}

#[tokio::test]
async fn test_scheduler_feeds_metrics_endpoint() {
    let registry = Arc::new(MetricRegistry::new());
    let backend = Arc::new(MemoryBackend::default());
    backend.set(vec![quota("v1", "/a", 100)]);

    let mut collectors = CollectorSet::new();
    collectors
        .register(Arc::new(QuotaCollector::new(&registry).unwrap()))
        .unwrap();

    let mut config = ExporterConfig::default();
    config.collectors.insert(
        "gluster_quotas".into(),
        CollectorConfig {
            disabled: false,
            sync_interval: Some(1),
        },
    );

    let shutdown = CancellationToken::new();
    let scheduler = Scheduler::new(backend, &collectors, &config, shutdown.clone());
    let handles = scheduler.start().unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(server::serve(
        listener,
        registry.clone(),
        "/metrics".into(),
        shutdown.clone(),
    ));

    let client = reqwest::Client::new();
    let mut body = String::new();
    for _ in 0..20 {
        body = client
            .get(format!("http://{}/metrics", addr))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        if body.contains("gluster_quota_used{") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(body.contains("gluster_quota_used{path=\"/a\",volume=\"v1\"} 100"));

    let health = client
        .get(format!("http://{}/healthz", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), reqwest::StatusCode::OK);
    assert_eq!(health.text().await.unwrap(), "OK\n");

    let missing = client
        .get(format!("http://{}/nope", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    shutdown.cancel();
    for handle in handles {
        handle.await.unwrap();
    }
    server.await.unwrap().unwrap();
}
