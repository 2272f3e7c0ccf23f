//! Directory quota usage and limits.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::collectors::{flag, Collector};
use crate::domain::{GlusterBackend, Quota};
use crate::error::Result;
use crate::metrics::{ExportedGaugeVec, Labels, MetricDefinition, MetricLabel, MetricRegistry};

const QUOTA_LABELS: &[MetricLabel] = &[
    MetricLabel::new("volume", "Name of the volume"),
    MetricLabel::new("path", "Directory the quota applies to"),
];

pub struct QuotaCollector {
    used: Arc<ExportedGaugeVec>,
    available: Arc<ExportedGaugeVec>,
    hard_limit: Arc<ExportedGaugeVec>,
    soft_limit: Arc<ExportedGaugeVec>,
    soft_limit_percent: Arc<ExportedGaugeVec>,
    soft_limit_exceeded: Arc<ExportedGaugeVec>,
    hard_limit_exceeded: Arc<ExportedGaugeVec>,
}

impl QuotaCollector {
    pub fn new(registry: &MetricRegistry) -> Result<Self> {
        let quota = |name: &str, help: &str| {
            registry.register_gauge_vec(MetricDefinition::new(name, help, QUOTA_LABELS))
        };

        Ok(Self {
            used: quota("quota_used", "Bytes used under the quota path")?,
            available: quota("quota_available", "Bytes still available under the quota path")?,
            hard_limit: quota("quota_hard_limit", "Hard limit of the quota in bytes")?,
            soft_limit: quota("quota_soft_limit", "Soft limit of the quota in bytes")?,
            soft_limit_percent: quota(
                "quota_soft_limit_percent",
                "Soft limit as a percentage of the hard limit",
            )?,
            soft_limit_exceeded: quota(
                "quota_soft_limit_exceeded",
                "1 when usage is over the soft limit",
            )?,
            hard_limit_exceeded: quota(
                "quota_hard_limit_exceeded",
                "1 when usage is over the hard limit",
            )?,
        })
    }

    fn record(&self, quota: &Quota) -> Result<()> {
        let labels: Labels = HashMap::from([
            ("volume", quota.volume.as_str()),
            ("path", quota.path.as_str()),
        ]);
        self.used.set(&labels, quota.used as f64)?;
        self.available.set(&labels, quota.available as f64)?;
        self.hard_limit.set(&labels, quota.hard_limit as f64)?;
        self.soft_limit.set(&labels, quota.soft_limit as f64)?;
        self.soft_limit_percent
            .set(&labels, quota.soft_limit_percent as f64)?;
        self.soft_limit_exceeded
            .set(&labels, flag(quota.soft_limit_exceeded))?;
        self.hard_limit_exceeded
            .set(&labels, flag(quota.hard_limit_exceeded))?;
        Ok(())
    }
}

#[async_trait]
impl Collector for QuotaCollector {
    fn name(&self) -> &'static str {
        "gluster_quotas"
    }

    fn gauges(&self) -> Vec<Arc<ExportedGaugeVec>> {
        vec![
            self.used.clone(),
            self.available.clone(),
            self.hard_limit.clone(),
            self.soft_limit.clone(),
            self.soft_limit_percent.clone(),
            self.soft_limit_exceeded.clone(),
            self.hard_limit_exceeded.clone(),
        ]
    }

    async fn collect(&self, backend: &dyn GlusterBackend) -> Result<()> {
        for quota in backend.quotas().await? {
            self.record(&quota)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testing::FakeBackend;

    fn quota(volume: &str, path: &str, used: u64) -> Quota {
        Quota {
            volume: volume.into(),
            path: path.into(),
            used,
            available: 1000 - used,
            soft_limit: 800,
            soft_limit_percent: 80,
            hard_limit: 1000,
            soft_limit_exceeded: used > 800,
            hard_limit_exceeded: false,
        }
    }

    #[tokio::test]
    async fn test_collect_quota() {
        let registry = MetricRegistry::new();
        let collector = QuotaCollector::new(&registry).unwrap();
        let backend = FakeBackend::default();
        *backend.quotas.lock() = vec![quota("v1", "/a", 100), quota("v1", "/b", 900)];

        collector.run_once(&backend).await.unwrap();

        let a = HashMap::from([("volume", "v1"), ("path", "/a")]);
        let b = HashMap::from([("volume", "v1"), ("path", "/b")]);
        assert_eq!(collector.used.get(&a), Some(100.0));
        assert_eq!(collector.available.get(&a), Some(900.0));
        assert_eq!(collector.soft_limit_percent.get(&a), Some(80.0));
        assert_eq!(collector.soft_limit_exceeded.get(&a), Some(0.0));
        assert_eq!(collector.soft_limit_exceeded.get(&b), Some(1.0));

        let text = registry.render().unwrap();
        assert!(text.contains("gluster_quota_used{path=\"/a\",volume=\"v1\"} 100"));
    }

    #[tokio::test]
    async fn test_no_quotas_exports_nothing() {
        let registry = MetricRegistry::new();
        let collector = QuotaCollector::new(&registry).unwrap();
        collector.run_once(&FakeBackend::default()).await.unwrap();
        assert!(collector.gauges().iter().all(|g| g.is_empty()));
    }
}
