//! Metric type implementations.

pub mod constant;
pub mod family;
pub mod invalid;

use std::sync::Arc;

use crate::registry::Descriptor;

use self::constant::ConstMetric;
use self::invalid::InvalidMetric;

/// OpenMetrics metric type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum MetricType {
    Gauge,
}

impl MetricType {
    /// Returns the given metric type's str representation.
    pub fn as_str(&self) -> &str {
        match self {
            MetricType::Gauge => "gauge",
        }
    }
}

/// A single value sent by a [`Collector`](crate::collector::Collector) over its
/// metric channel.
#[derive(Debug, Clone)]
pub enum Metric {
    /// A sample for one label combination.
    Const(ConstMetric),
    /// Marker reporting that the collection of a metric failed.
    Invalid(InvalidMetric),
}

impl Metric {
    /// Returns the descriptor the value belongs to.
    pub fn desc(&self) -> &Arc<Descriptor> {
        match self {
            Metric::Const(m) => m.desc(),
            Metric::Invalid(m) => m.desc(),
        }
    }
}

impl From<ConstMetric> for Metric {
    fn from(m: ConstMetric) -> Self {
        Metric::Const(m)
    }
}

impl From<InvalidMetric> for Metric {
    fn from(m: InvalidMetric) -> Self {
        Metric::Invalid(m)
    }
}
