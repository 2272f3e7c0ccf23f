//! Metric Registry
//!
//! Catalog of every metric the exporter publishes, backed by a dedicated
//! prometheus `Registry`. Definitions are registered once at startup; the
//! exposition server gathers the registry on each scrape.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::debug;

use crate::error::{Error, Result};
use crate::metrics::gauge::ExportedGaugeVec;

/// Namespace prefixed to every metric name.
pub const NAMESPACE: &str = "gluster";

/// TTL applied when a definition does not set one.
pub const DEFAULT_METRIC_TTL: Duration = Duration::from_secs(120);

/// Name of the constant label carrying the configured cluster ID.
pub const CLUSTER_ID_LABEL: &str = "cluster_id";

// =============================================================================
// Definitions
// =============================================================================

/// A label of a metric, with documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricLabel {
    pub name: &'static str,
    pub help: &'static str,
}

impl MetricLabel {
    pub const fn new(name: &'static str, help: &'static str) -> Self {
        Self { name, help }
    }
}

/// Static description of a gauge metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDefinition {
    pub namespace: String,
    pub name: String,
    pub help: String,
    /// Ordered label schema; fixed once registered.
    pub labels: Vec<MetricLabel>,
    /// `None` takes the registry default, `Some(ZERO)` disables eviction.
    pub ttl: Option<Duration>,
}

impl MetricDefinition {
    /// Definition in the default namespace.
    pub fn new(name: impl Into<String>, help: impl Into<String>, labels: &[MetricLabel]) -> Self {
        Self {
            namespace: NAMESPACE.to_string(),
            name: name.into(),
            help: help.into(),
            labels: labels.to_vec(),
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Label names in schema order.
    pub fn label_names(&self) -> Vec<&'static str> {
        self.labels.iter().map(|l| l.name).collect()
    }

    /// Name as exposed, `<namespace>_<name>`.
    pub fn fq_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}_{}", self.namespace, self.name)
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Process-wide metric catalog.
///
/// Constructed once and shared by `Arc` with every collector and the
/// exposition server. Tests build isolated instances.
pub struct MetricRegistry {
    registry: Registry,
    definitions: RwLock<Vec<MetricDefinition>>,
    default_ttl: Duration,
    cluster_id: Option<String>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::with_options(None, DEFAULT_METRIC_TTL)
    }

    /// Registry attaching `cluster_id` to every metric and using
    /// `default_ttl` for definitions without a TTL.
    pub fn with_options(cluster_id: Option<String>, default_ttl: Duration) -> Self {
        Self {
            registry: Registry::new(),
            definitions: RwLock::new(Vec::new()),
            default_ttl,
            cluster_id: cluster_id.filter(|id| !id.is_empty()),
        }
    }

    /// Create the storage for a metric and return its handle.
    pub fn register_gauge_vec(&self, definition: MetricDefinition) -> Result<Arc<ExportedGaugeVec>> {
        let mut definitions = self.definitions.write();
        let fq_name = definition.fq_name();
        if definitions.iter().any(|d| d.fq_name() == fq_name) {
            return Err(Error::DuplicateMetric(fq_name));
        }

        let mut opts = Opts::new(definition.name.clone(), definition.help.clone())
            .namespace(definition.namespace.clone());
        if let Some(cluster_id) = &self.cluster_id {
            opts = opts.const_label(CLUSTER_ID_LABEL, cluster_id.clone());
        }
        let gauge_vec = GaugeVec::new(opts, &definition.label_names())?;
        self.registry.register(Box::new(gauge_vec.clone()))?;

        let ttl = definition.ttl.unwrap_or(self.default_ttl);
        debug!(metric = %fq_name, ttl_secs = ttl.as_secs(), "Registered gauge vector");

        definitions.push(definition.clone());
        Ok(Arc::new(ExportedGaugeVec::new(definition, gauge_vec, ttl)))
    }

    /// Every registered definition, in registration order.
    pub fn definitions(&self) -> Vec<MetricDefinition> {
        self.definitions.read().clone()
    }

    /// Snapshot of all exported series.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render all exported series in the Prometheus text format.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| Error::Internal(format!("non UTF-8 exposition: {}", e)))
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("metrics", &self.definitions.read().len())
            .field("default_ttl", &self.default_ttl)
            .field("cluster_id", &self.cluster_id)
            .finish()
    }
}
