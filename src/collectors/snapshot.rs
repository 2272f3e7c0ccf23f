//! Snapshot counts, overall and per origin volume.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::collectors::{Collector, INSTANCE_LABEL, VOLUME_NAME_LABEL};
use crate::domain::{GlusterBackend, Snapshot};
use crate::error::Result;
use crate::metrics::{ExportedGaugeVec, Labels, MetricDefinition, MetricRegistry};

pub struct SnapshotCollector {
    instance: String,
    total: Arc<ExportedGaugeVec>,
    per_volume: Arc<ExportedGaugeVec>,
    remaining: Arc<ExportedGaugeVec>,
}

#[derive(Default)]
struct OriginTally {
    count: usize,
    remaining: u32,
}

fn tally_by_origin(snapshots: &[Snapshot]) -> BTreeMap<&str, OriginTally> {
    let mut origins: BTreeMap<&str, OriginTally> = BTreeMap::new();
    for snap in snapshots {
        let tally = origins.entry(snap.origin_volume.as_str()).or_default();
        tally.count += 1;
        tally.remaining = snap.origin_snap_remaining;
    }
    origins
}

impl SnapshotCollector {
    pub fn new(registry: &MetricRegistry, instance: &str) -> Result<Self> {
        let per_volume = [INSTANCE_LABEL, VOLUME_NAME_LABEL];
        Ok(Self {
            instance: instance.to_string(),
            total: registry.register_gauge_vec(MetricDefinition::new(
                "snapshot_count",
                "Total number of snapshots in the cluster",
                &[INSTANCE_LABEL],
            ))?,
            per_volume: registry.register_gauge_vec(MetricDefinition::new(
                "volume_snapshot_count",
                "Number of snapshots taken of the volume",
                &per_volume,
            ))?,
            remaining: registry.register_gauge_vec(MetricDefinition::new(
                "volume_snapshot_remaining",
                "Number of snapshots the volume may still take",
                &per_volume,
            ))?,
        })
    }
}

#[async_trait]
impl Collector for SnapshotCollector {
    fn name(&self) -> &'static str {
        "gluster_snapshot"
    }

    fn gauges(&self) -> Vec<Arc<ExportedGaugeVec>> {
        vec![
            self.total.clone(),
            self.per_volume.clone(),
            self.remaining.clone(),
        ]
    }

    async fn collect(&self, backend: &dyn GlusterBackend) -> Result<()> {
        let snapshots = backend.snapshots().await?;

        let instance: Labels = HashMap::from([("instance", self.instance.as_str())]);
        self.total.set(&instance, snapshots.len() as f64)?;

        for (volume, tally) in tally_by_origin(&snapshots) {
            let labels: Labels =
                HashMap::from([("instance", self.instance.as_str()), ("volume_name", volume)]);
            self.per_volume.set(&labels, tally.count as f64)?;
            self.remaining.set(&labels, f64::from(tally.remaining))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testing::FakeBackend;

    fn snap(name: &str, origin: &str, remaining: u32) -> Snapshot {
        Snapshot {
            name: name.into(),
            id: format!("{}-id", name),
            origin_volume: origin.into(),
            status: "Stopped".into(),
            description: String::new(),
            created_at: "2024-01-01 00:00:00".into(),
            origin_snap_count: 0,
            origin_snap_remaining: remaining,
        }
    }

    #[test]
    fn test_tally_by_origin() {
        let snaps = vec![snap("s1", "v1", 255), snap("s2", "v1", 254), snap("s3", "v2", 10)];
        let tally = tally_by_origin(&snaps);
        assert_eq!(tally["v1"].count, 2);
        assert_eq!(tally["v1"].remaining, 254);
        assert_eq!(tally["v2"].count, 1);
    }

    #[tokio::test]
    async fn test_collect_snapshots() {
        let registry = MetricRegistry::new();
        let collector = SnapshotCollector::new(&registry, "exporter1").unwrap();
        let backend = FakeBackend::default();
        *backend.snapshots.lock() = vec![snap("s1", "v1", 255), snap("s2", "v1", 254)];

        collector.run_once(&backend).await.unwrap();

        assert_eq!(
            collector.total.get(&HashMap::from([("instance", "exporter1")])),
            Some(2.0)
        );
        let v1 = HashMap::from([("instance", "exporter1"), ("volume_name", "v1")]);
        assert_eq!(collector.per_volume.get(&v1), Some(2.0));
        assert_eq!(collector.remaining.get(&v1), Some(254.0));
    }
}
