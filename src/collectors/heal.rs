//! Pending self-heal entries per brick.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::collectors::{Collector, INSTANCE_LABEL};
use crate::domain::GlusterBackend;
use crate::error::Result;
use crate::metrics::{ExportedGaugeVec, Labels, MetricDefinition, MetricLabel, MetricRegistry};

pub struct HealInfoCollector {
    instance: String,
    files: Arc<ExportedGaugeVec>,
}

impl HealInfoCollector {
    pub fn new(registry: &MetricRegistry, instance: &str) -> Result<Self> {
        Ok(Self {
            instance: instance.to_string(),
            files: registry.register_gauge_vec(MetricDefinition::new(
                "heal_info_files_count",
                "Number of entries pending heal on the brick",
                &[
                    INSTANCE_LABEL,
                    MetricLabel::new("volume", "Name of the volume"),
                    MetricLabel::new("brick_path", "Brick path"),
                    MetricLabel::new("host", "Hostname of the brick"),
                ],
            ))?,
        })
    }
}

#[async_trait]
impl Collector for HealInfoCollector {
    fn name(&self) -> &'static str {
        "gluster_heal_info"
    }

    fn gauges(&self) -> Vec<Arc<ExportedGaugeVec>> {
        vec![self.files.clone()]
    }

    async fn collect(&self, backend: &dyn GlusterBackend) -> Result<()> {
        let volumes = backend.volume_info().await?;

        for volume in volumes
            .iter()
            .filter(|v| v.is_started() && v.volume_type.is_healable())
        {
            for entry in backend.heal_info(&volume.name).await? {
                let Some(count) = entry.entries else {
                    debug!(volume = %volume.name, brick = %entry.brick_path, "Heal count unknown");
                    continue;
                };
                let labels: Labels = HashMap::from([
                    ("instance", self.instance.as_str()),
                    ("volume", volume.name.as_str()),
                    ("brick_path", entry.brick_path.as_str()),
                    ("host", entry.hostname.as_str()),
                ]);
                self.files.set(&labels, count as f64)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testing::{volume, FakeBackend};
    use crate::domain::{HealEntry, VolumeType};

    fn entry(host: &str, entries: Option<u64>) -> HealEntry {
        HealEntry {
            volume: "rep".into(),
            hostname: host.into(),
            brick_path: "/bricks/rep".into(),
            host_id: format!("{}-uuid", host),
            connected: entries.is_some(),
            entries,
        }
    }

    #[tokio::test]
    async fn test_only_healable_volumes_queried() {
        let registry = MetricRegistry::new();
        let collector = HealInfoCollector::new(&registry, "exporter1").unwrap();
        let backend = FakeBackend::default();
        *backend.volumes.lock() = vec![
            volume("rep", VolumeType::Replicate, 2),
            volume("dist", VolumeType::Distribute, 2),
        ];
        backend.heal.lock().insert(
            "rep".into(),
            vec![entry("node0", Some(7)), entry("node1", None)],
        );
        backend
            .heal
            .lock()
            .insert("dist".into(), vec![entry("node9", Some(1))]);

        collector.run_once(&backend).await.unwrap();

        let node0 = HashMap::from([
            ("instance", "exporter1"),
            ("volume", "rep"),
            ("brick_path", "/bricks/rep"),
            ("host", "node0"),
        ]);
        assert_eq!(collector.files.get(&node0), Some(7.0));
        // Disconnected brick and non-healable volume produce no series.
        assert_eq!(collector.files.len(), 1);
    }
}
