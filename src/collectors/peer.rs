//! Trusted storage pool membership.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::collectors::{flag, Collector, INSTANCE_LABEL};
use crate::domain::GlusterBackend;
use crate::error::Result;
use crate::metrics::{ExportedGaugeVec, Labels, MetricDefinition, MetricLabel, MetricRegistry};

pub struct PeerCollector {
    instance: String,
    count: Arc<ExportedGaugeVec>,
    connected: Arc<ExportedGaugeVec>,
}

impl PeerCollector {
    pub fn new(registry: &MetricRegistry, instance: &str) -> Result<Self> {
        Ok(Self {
            instance: instance.to_string(),
            count: registry.register_gauge_vec(MetricDefinition::new(
                "peer_count",
                "Number of peers in the trusted storage pool",
                &[INSTANCE_LABEL],
            ))?,
            connected: registry.register_gauge_vec(MetricDefinition::new(
                "peer_connected",
                "1 when the peer is connected",
                &[
                    INSTANCE_LABEL,
                    MetricLabel::new("peerid", "UUID of the peer"),
                    MetricLabel::new("hostname", "Hostname of the peer"),
                ],
            ))?,
        })
    }
}

#[async_trait]
impl Collector for PeerCollector {
    fn name(&self) -> &'static str {
        "gluster_peer_counts"
    }

    fn gauges(&self) -> Vec<Arc<ExportedGaugeVec>> {
        vec![self.count.clone(), self.connected.clone()]
    }

    async fn collect(&self, backend: &dyn GlusterBackend) -> Result<()> {
        let peers = backend.peers().await?;

        let instance: Labels = HashMap::from([("instance", self.instance.as_str())]);
        self.count.set(&instance, peers.len() as f64)?;

        for peer in &peers {
            let labels: Labels = HashMap::from([
                ("instance", self.instance.as_str()),
                ("peerid", peer.id.as_str()),
                ("hostname", peer.hostname.as_str()),
            ]);
            self.connected.set(&labels, flag(peer.connected))?;
        }
        Ok(())
    }
}
