//! Prometheus export of pool status

use std::collections::HashMap;

use prometheus::{Encoder, Gauge, IntGauge, Opts, Registry, TextEncoder};

use crate::status::PoolStatus;

/// Metrics exporter for Prometheus format
pub struct StatusExporter;

impl StatusExporter {
    /// Export a status snapshot in Prometheus exposition format.
    ///
    /// Every series carries a `pool` label plus any extra `tags`. Fails if
    /// a tag name is not a valid Prometheus label name.
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_resourcepool::{PoolStatus, StatusExporter};
    /// use std::collections::HashMap;
    ///
    /// let status = PoolStatus { limit: 4, active: 2, idle: 1, ..Default::default() };
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = StatusExporter::export_prometheus(&status, "db", Some(&tags)).unwrap();
    /// assert!(output.contains("resourcepool_resources_using"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        status: &PoolStatus,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> prometheus::Result<String> {
        let labels = Self::labels(pool_name, tags);
        let registry = Registry::new();

        let int_gauges = [
            ("resourcepool_limit", "Maximum resources the pool may hold", status.limit),
            ("resourcepool_resources_active", "Live resources, idle or in use", status.active),
            ("resourcepool_resources_idle", "Resources resting in the free list", status.idle),
            ("resourcepool_resources_using", "Resources checked out by callers", status.using()),
            ("resourcepool_waiting", "Callers blocked waiting for a resource", status.waiting),
        ];
        for (name, help, value) in int_gauges {
            let gauge = IntGauge::with_opts(Opts::new(name, help).const_labels(labels.clone()))?;
            gauge.set(i64::try_from(value).unwrap_or(i64::MAX));
            registry.register(Box::new(gauge))?;
        }

        let float_gauges = [
            (
                "resourcepool_average_wait_seconds",
                "Mean wait of blocked callers",
                status.average_wait_duration.as_secs_f64(),
            ),
            ("resourcepool_utilization", "Checked-out share of the limit", status.utilization()),
        ];
        for (name, help, value) in float_gauges {
            let gauge = Gauge::with_opts(Opts::new(name, help).const_labels(labels.clone()))?;
            gauge.set(value);
            registry.register(Box::new(gauge))?;
        }

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }

    fn labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> HashMap<String, String> {
        let mut labels = HashMap::new();
        labels.insert("pool".to_string(), pool_name.to_string());

        if let Some(tags) = tags {
            for (key, value) in tags {
                labels.insert(key.clone(), value.clone());
            }
        }

        labels
    }
}
