//! Brick process status, capacity and inode usage.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::collectors::{Collector, INSTANCE_LABEL, VOLUME_NAME_LABEL};
use crate::domain::{BrickStatus, GlusterBackend};
use crate::error::Result;
use crate::metrics::{ExportedGaugeVec, Labels, MetricDefinition, MetricLabel, MetricRegistry};

const BRICK_LABELS: &[MetricLabel] = &[
    INSTANCE_LABEL,
    VOLUME_NAME_LABEL,
    MetricLabel::new("hostname", "Hostname of the brick"),
    MetricLabel::new("peerid", "Peer ID of the brick host"),
    MetricLabel::new("pid", "PID of the brick process"),
    MetricLabel::new("brick_path", "Brick path"),
];

pub struct VolumeStatusCollector {
    instance: String,
    brick_count: Arc<ExportedGaugeVec>,
    brick_status: Arc<ExportedGaugeVec>,
    brick_port: Arc<ExportedGaugeVec>,
    brick_pid: Arc<ExportedGaugeVec>,
    total_inodes: Arc<ExportedGaugeVec>,
    free_inodes: Arc<ExportedGaugeVec>,
    total_bytes: Arc<ExportedGaugeVec>,
    free_bytes: Arc<ExportedGaugeVec>,
}

impl VolumeStatusCollector {
    pub fn new(registry: &MetricRegistry, instance: &str) -> Result<Self> {
        let brick = |name: &str, help: &str| {
            registry.register_gauge_vec(MetricDefinition::new(name, help, BRICK_LABELS))
        };

        Ok(Self {
            instance: instance.to_string(),
            brick_count: registry.register_gauge_vec(MetricDefinition::new(
                "volume_status_brick_count",
                "Number of bricks reported in volume status",
                &[INSTANCE_LABEL, VOLUME_NAME_LABEL],
            ))?,
            brick_status: brick("volume_brick_status", "Brick process status, 1 when online")?,
            brick_port: brick("volume_brick_port", "Port the brick process listens on")?,
            brick_pid: brick("volume_brick_pid", "PID of the brick process")?,
            total_inodes: brick("volume_brick_total_inodes", "Total inodes of the brick")?,
            free_inodes: brick("volume_brick_free_inodes", "Free inodes of the brick")?,
            total_bytes: brick("volume_brick_total_bytes", "Total capacity of the brick in bytes")?,
            free_bytes: brick("volume_brick_free_bytes", "Free capacity of the brick in bytes")?,
        })
    }

    fn record_brick(&self, volume: &str, node: &BrickStatus) -> Result<()> {
        let pid = node.pid.to_string();
        let labels: Labels = HashMap::from([
            ("instance", self.instance.as_str()),
            ("volume_name", volume),
            ("hostname", node.hostname.as_str()),
            ("peerid", node.peer_id.as_str()),
            ("pid", pid.as_str()),
            ("brick_path", node.path.as_str()),
        ]);

        self.brick_status.set(&labels, f64::from(node.status))?;
        self.brick_pid.set(&labels, f64::from(node.pid))?;
        if let Some(port) = node.port.number() {
            self.brick_port.set(&labels, f64::from(port))?;
        }
        if let Some(total) = node.inodes_total {
            self.total_inodes.set(&labels, total as f64)?;
        }
        if let Some(free) = node.inodes_free {
            self.free_inodes.set(&labels, free as f64)?;
        }
        self.total_bytes.set(&labels, node.capacity as f64)?;
        self.free_bytes.set(&labels, node.free as f64)?;
        Ok(())
    }
}

#[async_trait]
impl Collector for VolumeStatusCollector {
    fn name(&self) -> &'static str {
        "gluster_volume_status"
    }

    fn gauges(&self) -> Vec<Arc<ExportedGaugeVec>> {
        vec![
            self.brick_count.clone(),
            self.brick_status.clone(),
            self.brick_port.clone(),
            self.brick_pid.clone(),
            self.total_inodes.clone(),
            self.free_inodes.clone(),
            self.total_bytes.clone(),
            self.free_bytes.clone(),
        ]
    }

    async fn collect(&self, backend: &dyn GlusterBackend) -> Result<()> {
        let peer_id = backend.local_peer_id().await?;
        let volumes = backend.volume_status().await?;
        debug!(peer_id = %peer_id, volumes = volumes.len(), "Collected volume status");

        for volume in &volumes {
            let labels: Labels = HashMap::from([
                ("instance", self.instance.as_str()),
                ("volume_name", volume.name.as_str()),
            ]);
            self.brick_count.set(&labels, volume.nodes.len() as f64)?;

            for node in &volume.nodes {
                self.record_brick(&volume.name, node)?;
            }
        }
        Ok(())
    }
}
