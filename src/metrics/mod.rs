//! Metrics module
//!
//! Metric registry and TTL-evicting gauge vectors.

mod gauge;
mod registry;

pub use gauge::{label_hash, ExportedGaugeVec, Labels};
pub use registry::{
    MetricDefinition, MetricLabel, MetricRegistry, CLUSTER_ID_LABEL, DEFAULT_METRIC_TTL, NAMESPACE,
};
