//! Module implementing constant metric samples.
//!
//! See [`ConstMetric`] for details.

use std::sync::Arc;

use super::MetricType;
use crate::error::MetricError;
use crate::registry::Descriptor;

/// Value of a [`ConstMetric`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    /// Integral value, encoded without a fractional part.
    Int(i64),
    /// Floating point value.
    Float(f64),
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Float(v as f64),
        }
    }
}

/// A metric sample that cannot change once created.
///
/// Created ad-hoc by a [`Collector`](crate::collector::Collector) on each
/// scrape. Label values are positional: the `n`-th value belongs to the
/// `n`-th label name of the [`Descriptor`].
///
/// ```
/// # use digitalocean_exporter::metrics::constant::{ConstMetric, Value};
/// # use digitalocean_exporter::registry::Descriptor;
/// # use std::sync::Arc;
/// let desc = Arc::new(Descriptor::new("volumes_count", "Number of volumes.", vec!["region".into()]));
///
/// let metric = ConstMetric::gauge(desc.clone(), 4_u64, vec!["ams3".to_string()]).unwrap();
/// assert_eq!(&Value::Int(4), metric.value());
///
/// // One label value too many.
/// assert!(ConstMetric::gauge(desc, 4_u64, vec!["ams3".to_string(), "x".to_string()]).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ConstMetric {
    desc: Arc<Descriptor>,
    metric_type: MetricType,
    value: Value,
    label_values: Vec<String>,
}

impl ConstMetric {
    /// Creates a new [`ConstMetric`], checking the label values against the
    /// descriptor's label names.
    pub fn new(
        desc: Arc<Descriptor>,
        metric_type: MetricType,
        value: impl Into<Value>,
        label_values: Vec<String>,
    ) -> Result<Self, MetricError> {
        if desc.label_names().len() != label_values.len() {
            return Err(MetricError::InconsistentCardinality {
                name: desc.name().to_string(),
                expected: desc.label_names().len(),
                got: label_values.len(),
            });
        }

        Ok(Self {
            desc,
            metric_type,
            value: value.into(),
            label_values,
        })
    }

    /// Creates a new gauge [`ConstMetric`].
    pub fn gauge(
        desc: Arc<Descriptor>,
        value: impl Into<Value>,
        label_values: Vec<String>,
    ) -> Result<Self, MetricError> {
        Self::new(desc, MetricType::Gauge, value, label_values)
    }

    /// Returns the descriptor of the sample.
    pub fn desc(&self) -> &Arc<Descriptor> {
        &self.desc
    }

    /// Returns the metric type of the sample.
    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    /// Returns the value of the sample.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the label values, in the descriptor's label name order.
    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    pub(crate) fn into_parts(self) -> (Arc<Descriptor>, MetricType, Value, Vec<String>) {
        (self.desc, self.metric_type, self.value, self.label_values)
    }
}
