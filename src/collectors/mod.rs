//! Metric Collectors
//!
//! A collector owns one family of gauge vectors and refreshes them from a
//! [`GlusterBackend`] on every cycle. Collectors are written once against the
//! port and run unchanged on either management-plane variant.
//!
//! # Cycle
//!
//! ```text
//! run_once ─▶ remove_stale_metrics (every owned gauge)
//!          └▶ collect ─▶ backend call ─▶ gauge.set(...)
//! ```

mod heal;
mod peer;
mod profile;
mod quota;
mod snapshot;
mod volume;
mod volume_status;

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::GlusterBackend;
use crate::error::{Error, Result};
use crate::metrics::{ExportedGaugeVec, MetricLabel, MetricRegistry};

pub use heal::HealInfoCollector;
pub use peer::PeerCollector;
pub use profile::VolumeProfileCollector;
pub use quota::QuotaCollector;
pub use snapshot::SnapshotCollector;
pub use volume::VolumeCountCollector;
pub use volume_status::VolumeStatusCollector;

// =============================================================================
// Shared Labels
// =============================================================================

pub(crate) const INSTANCE_LABEL: MetricLabel = MetricLabel::new(
    "instance",
    "Hostname of the gluster-exporter instance providing this metric",
);

pub(crate) const VOLUME_NAME_LABEL: MetricLabel =
    MetricLabel::new("volume_name", "Name of the volume");

/// Encode a flag as a gauge value.
pub(crate) fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

// =============================================================================
// Collector Trait
// =============================================================================

/// A unit of work refreshing one metric family.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Unique name, also the key of its configuration section.
    fn name(&self) -> &'static str;

    /// Gauge vectors written by this collector.
    fn gauges(&self) -> Vec<Arc<ExportedGaugeVec>>;

    /// Query the backend and update the gauges.
    async fn collect(&self, backend: &dyn GlusterBackend) -> Result<()>;

    /// One full cycle: evict stale series, then collect.
    async fn run_once(&self, backend: &dyn GlusterBackend) -> Result<()> {
        for gauge in self.gauges() {
            gauge.remove_stale_metrics();
        }
        self.collect(backend).await
    }
}

// =============================================================================
// Collector Set
// =============================================================================

/// Ordered, append-only list of registered collectors.
#[derive(Default, Clone)]
pub struct CollectorSet {
    collectors: Vec<Arc<dyn Collector>>,
}

impl CollectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a collector; names must be unique.
    pub fn register(&mut self, collector: Arc<dyn Collector>) -> Result<()> {
        let name = collector.name();
        if self.collectors.iter().any(|c| c.name() == name) {
            return Err(Error::DuplicateCollector(name.to_string()));
        }
        self.collectors.push(collector);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Collector>> {
        self.collectors.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }
}

impl std::fmt::Debug for CollectorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorSet")
            .field("collectors", &self.names())
            .finish()
    }
}

/// Register every built-in collector and its metrics.
pub fn default_collectors(registry: &MetricRegistry, instance: &str) -> Result<CollectorSet> {
    let mut set = CollectorSet::new();
    set.register(Arc::new(VolumeStatusCollector::new(registry, instance)?))?;
    set.register(Arc::new(QuotaCollector::new(registry)?))?;
    set.register(Arc::new(VolumeCountCollector::new(registry, instance)?))?;
    set.register(Arc::new(PeerCollector::new(registry, instance)?))?;
    set.register(Arc::new(SnapshotCollector::new(registry, instance)?))?;
    set.register(Arc::new(HealInfoCollector::new(registry, instance)?))?;
    set.register(Arc::new(VolumeProfileCollector::new(registry, instance)?))?;
    Ok(set)
}

// =============================================================================
// Test Support
// =============================================================================
