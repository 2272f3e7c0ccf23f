//! Cumulative volume profile statistics.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::collectors::{Collector, INSTANCE_LABEL};
use crate::domain::{BrickProfile, GlusterBackend, Volume};
use crate::error::Result;
use crate::metrics::{ExportedGaugeVec, Labels, MetricDefinition, MetricLabel, MetricRegistry};

/// Volume options that turn on profiling counters.
const PROFILE_OPTIONS: &[&str] = &[
    "diagnostics.count-fop-hits",
    "diagnostics.latency-measurement",
];

const VOLUME_LABEL: MetricLabel = MetricLabel::new("volume", "Name of the volume");
const BRICK_LABEL: MetricLabel = MetricLabel::new("brick", "Brick name, host:path");
const FOP_LABEL: MetricLabel = MetricLabel::new("fop", "File operation name");

fn is_profiled(volume: &Volume) -> bool {
    volume.is_started() && PROFILE_OPTIONS.iter().any(|k| volume.option_enabled(k))
}

pub struct VolumeProfileCollector {
    instance: String,
    total_reads: Arc<ExportedGaugeVec>,
    total_writes: Arc<ExportedGaugeVec>,
    duration: Arc<ExportedGaugeVec>,
    fop_hits: Arc<ExportedGaugeVec>,
    fop_latency: Arc<ExportedGaugeVec>,
}

impl VolumeProfileCollector {
    pub fn new(registry: &MetricRegistry, instance: &str) -> Result<Self> {
        let brick_labels = [INSTANCE_LABEL, VOLUME_LABEL, BRICK_LABEL];
        let fop_labels = [INSTANCE_LABEL, VOLUME_LABEL, BRICK_LABEL, FOP_LABEL];
        let brick = |name: &str, help: &str| {
            registry.register_gauge_vec(MetricDefinition::new(name, help, &brick_labels))
        };
        let fop = |name: &str, help: &str| {
            registry.register_gauge_vec(MetricDefinition::new(name, help, &fop_labels))
        };

        Ok(Self {
            instance: instance.to_string(),
            total_reads: brick("volume_profile_total_reads", "Bytes read from the brick")?,
            total_writes: brick("volume_profile_total_writes", "Bytes written to the brick")?,
            duration: brick(
                "volume_profile_duration_secs",
                "Seconds the brick has been profiled",
            )?,
            fop_hits: fop("volume_profile_fop_hits", "Calls of the file operation")?,
            fop_latency: fop(
                "volume_profile_fop_avg_latency",
                "Average latency of the file operation",
            )?,
        })
    }

    fn record(&self, volume: &str, brick: &BrickProfile) -> Result<()> {
        let labels: Labels = HashMap::from([
            ("instance", self.instance.as_str()),
            ("volume", volume),
            ("brick", brick.brick.as_str()),
        ]);
        self.total_reads.set(&labels, brick.total_reads as f64)?;
        self.total_writes.set(&labels, brick.total_writes as f64)?;
        self.duration.set(&labels, brick.duration_secs as f64)?;

        for fop in &brick.fops {
            let mut labels = labels.clone();
            labels.insert("fop", fop.name.as_str());
            self.fop_hits.set(&labels, fop.hits as f64)?;
            self.fop_latency.set(&labels, fop.avg_latency)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Collector for VolumeProfileCollector {
    fn name(&self) -> &'static str {
        "gluster_volume_profile"
    }

    fn gauges(&self) -> Vec<Arc<ExportedGaugeVec>> {
        vec![
            self.total_reads.clone(),
            self.total_writes.clone(),
            self.duration.clone(),
            self.fop_hits.clone(),
            self.fop_latency.clone(),
        ]
    }

    async fn collect(&self, backend: &dyn GlusterBackend) -> Result<()> {
        let volumes = backend.volume_info().await?;

        for volume in volumes.iter().filter(|v| is_profiled(v)) {
            let profile = backend.volume_profile(&volume.name).await?;
            debug!(volume = %volume.name, bricks = profile.bricks.len(), "Collected volume profile");
            for brick in &profile.bricks {
                self.record(&volume.name, brick)?;
            }
        }
        Ok(())
    }
}
