//! Volume, brick and subvolume counts from volume info.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::collectors::{Collector, INSTANCE_LABEL, VOLUME_NAME_LABEL};
use crate::domain::GlusterBackend;
use crate::error::Result;
use crate::metrics::{ExportedGaugeVec, Labels, MetricDefinition, MetricRegistry};

pub struct VolumeCountCollector {
    instance: String,
    total: Arc<ExportedGaugeVec>,
    started: Arc<ExportedGaugeVec>,
    bricks: Arc<ExportedGaugeVec>,
    subvols: Arc<ExportedGaugeVec>,
}

impl VolumeCountCollector {
    pub fn new(registry: &MetricRegistry, instance: &str) -> Result<Self> {
        let per_volume = [INSTANCE_LABEL, VOLUME_NAME_LABEL];
        Ok(Self {
            instance: instance.to_string(),
            total: registry.register_gauge_vec(MetricDefinition::new(
                "volume_total_count",
                "Total number of volumes",
                &[INSTANCE_LABEL],
            ))?,
            started: registry.register_gauge_vec(MetricDefinition::new(
                "volume_started_count",
                "Number of started volumes",
                &[INSTANCE_LABEL],
            ))?,
            bricks: registry.register_gauge_vec(MetricDefinition::new(
                "volume_brick_count",
                "Number of bricks in the volume",
                &per_volume,
            ))?,
            subvols: registry.register_gauge_vec(MetricDefinition::new(
                "volume_subvolume_count",
                "Number of subvolumes in the volume",
                &per_volume,
            ))?,
        })
    }
}

#[async_trait]
impl Collector for VolumeCountCollector {
    fn name(&self) -> &'static str {
        "gluster_volume_counts"
    }

    fn gauges(&self) -> Vec<Arc<ExportedGaugeVec>> {
        vec![
            self.total.clone(),
            self.started.clone(),
            self.bricks.clone(),
            self.subvols.clone(),
        ]
    }

    async fn collect(&self, backend: &dyn GlusterBackend) -> Result<()> {
        let volumes = backend.volume_info().await?;

        let instance: Labels = HashMap::from([("instance", self.instance.as_str())]);
        self.total.set(&instance, volumes.len() as f64)?;
        let started = volumes.iter().filter(|v| v.is_started()).count();
        self.started.set(&instance, started as f64)?;

        for volume in &volumes {
            let labels: Labels = HashMap::from([
                ("instance", self.instance.as_str()),
                ("volume_name", volume.name.as_str()),
            ]);
            self.bricks.set(&labels, volume.bricks.len() as f64)?;
            self.subvols.set(&labels, volume.subvols.len() as f64)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testing::{volume, FakeBackend};
    use crate::domain::VolumeType;

    #[tokio::test]
    async fn test_collect_counts() {
        let registry = MetricRegistry::new();
        let collector = VolumeCountCollector::new(&registry, "exporter1").unwrap();
        let backend = FakeBackend::default();
        let mut stopped = volume("dist", VolumeType::Distribute, 4);
        stopped.status = "Stopped".into();
        *backend.volumes.lock() = vec![volume("rep", VolumeType::Replicate, 3), stopped];

        collector.run_once(&backend).await.unwrap();

        let instance = HashMap::from([("instance", "exporter1")]);
        assert_eq!(collector.total.get(&instance), Some(2.0));
        assert_eq!(collector.started.get(&instance), Some(1.0));

        let rep = HashMap::from([("instance", "exporter1"), ("volume_name", "rep")]);
        let dist = HashMap::from([("instance", "exporter1"), ("volume_name", "dist")]);
        assert_eq!(collector.bricks.get(&rep), Some(3.0));
        assert_eq!(collector.subvols.get(&rep), Some(1.0));
        assert_eq!(collector.bricks.get(&dist), Some(4.0));
        assert_eq!(collector.subvols.get(&dist), Some(4.0));
    }

    #[tokio::test]
    async fn test_empty_cluster_reports_zero() {
        let registry = MetricRegistry::new();
        let collector = VolumeCountCollector::new(&registry, "exporter1").unwrap();
        collector.run_once(&FakeBackend::default()).await.unwrap();
        let instance = HashMap::from([("instance", "exporter1")]);
        assert_eq!(collector.total.get(&instance), Some(0.0));
        assert!(collector.bricks.is_empty());
    }
}
