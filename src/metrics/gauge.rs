//! Exported Gauge Vectors
//!
//! A prometheus `GaugeVec` paired with a freshness map. Every `set` stamps the
//! series; `remove_stale_metrics` drops series that have not been stamped
//! within the metric's TTL so label combinations for vanished entities do not
//! accumulate.

use std::collections::{BTreeMap, HashMap};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use prometheus::GaugeVec;
use tracing::debug;

use crate::error::{Error, Result};
use crate::metrics::registry::MetricDefinition;

/// Label name to label value map identifying one series.
pub type Labels<'a> = HashMap<&'a str, &'a str>;

/// Canonical hash of a label map.
///
/// Pairs are hashed in sorted key order, so two maps holding the same pairs
/// hash identically whatever order they were built in.
pub fn label_hash(labels: &Labels<'_>) -> u64 {
    let sorted: BTreeMap<&str, &str> = labels.iter().map(|(k, v)| (*k, *v)).collect();
    let mut hasher = DefaultHasher::new();
    for (name, value) in sorted {
        name.hash(&mut hasher);
        value.hash(&mut hasher);
    }
    hasher.finish()
}

#[derive(Debug)]
struct SeriesEntry {
    labels: HashMap<String, String>,
    last_updated: Instant,
}

impl SeriesEntry {
    fn is_stale(&self, ttl: Duration, now: Instant) -> bool {
        self.last_updated
            .checked_add(ttl)
            .map(|expires| expires < now)
            .unwrap_or(false)
    }
}

/// A registered gauge vector with TTL-based series eviction.
///
/// Handles are created by
/// [`MetricRegistry::register_gauge_vec`](crate::metrics::MetricRegistry::register_gauge_vec)
/// and shared with the collector that owns the metric.
pub struct ExportedGaugeVec {
    definition: MetricDefinition,
    gauge_vec: GaugeVec,
    series: DashMap<u64, SeriesEntry>,
    ttl: Duration,
}

impl ExportedGaugeVec {
    pub(crate) fn new(definition: MetricDefinition, gauge_vec: GaugeVec, ttl: Duration) -> Self {
        Self {
            definition,
            gauge_vec,
            series: DashMap::new(),
            ttl,
        }
    }

    /// Metric name without namespace.
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Definition this vector was registered with.
    pub fn definition(&self) -> &MetricDefinition {
        &self.definition
    }

    /// Effective TTL; zero means series never expire.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of live series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Set the value of a series and mark it fresh.
    pub fn set(&self, labels: &Labels<'_>, value: f64) -> Result<()> {
        self.set_at(labels, value, Instant::now())
    }

    /// Like [`set`](Self::set) with an explicit update time.
    pub fn set_at(&self, labels: &Labels<'_>, value: f64, now: Instant) -> Result<()> {
        self.check_labels(labels)?;

        // The entry guard holds the shard lock, so eviction of this series
        // cannot interleave with the gauge update.
        let mut entry = self
            .series
            .entry(label_hash(labels))
            .or_insert_with(|| SeriesEntry {
                labels: labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                last_updated: now,
            });
        self.gauge_vec.get_metric_with(labels)?.set(value);
        entry.last_updated = now;
        Ok(())
    }

    /// Current value of a series, if it is exported.
    pub fn get(&self, labels: &Labels<'_>) -> Option<f64> {
        if !self.series.contains_key(&label_hash(labels)) {
            return None;
        }
        self.gauge_vec.get_metric_with(labels).ok().map(|g| g.get())
    }

    /// Drop every series not refreshed within the TTL.
    ///
    /// Returns the number of series removed.
    pub fn remove_stale_metrics(&self) -> usize {
        self.remove_stale_metrics_at(Instant::now())
    }

    /// Like [`remove_stale_metrics`](Self::remove_stale_metrics) evaluated at
    /// `now`.
    pub fn remove_stale_metrics_at(&self, now: Instant) -> usize {
        if self.ttl.is_zero() {
            return 0;
        }

        let mut removed = 0;
        self.series.retain(|_, entry| {
            if !entry.is_stale(self.ttl, now) {
                return true;
            }
            let labels: Labels<'_> = entry
                .labels
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            if let Err(e) = self.gauge_vec.remove(&labels) {
                debug!(metric = %self.definition.name, error = %e, "Stale series already gone");
            }
            removed += 1;
            false
        });

        if removed > 0 {
            debug!(metric = %self.definition.name, removed, "Removed stale series");
        }
        removed
    }

    fn check_labels(&self, labels: &Labels<'_>) -> Result<()> {
        let expected = &self.definition.labels;
        if labels.len() != expected.len() {
            return Err(Error::Metric(prometheus::Error::InconsistentCardinality {
                expect: expected.len(),
                got: labels.len(),
            }));
        }
        if let Some(missing) = expected.iter().find(|l| !labels.contains_key(l.name)) {
            return Err(Error::Metric(prometheus::Error::Msg(format!(
                "metric {}: missing label '{}'",
                self.definition.name, missing.name
            ))));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ExportedGaugeVec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportedGaugeVec")
            .field("name", &self.definition.name)
            .field("ttl", &self.ttl)
            .field("series", &self.series.len())
            .finish()
    }
}
