//! Module implementing the invalid metric signal.
//!
//! See [`InvalidMetric`] for details.

use std::error::Error;
use std::sync::Arc;

use crate::registry::Descriptor;

/// Sent by a [`Collector`](crate::collector::Collector) in place of samples
/// when the collection of a metric failed.
///
/// The registry turns it into a
/// [`GatherError::Collector`](crate::error::GatherError::Collector).
#[derive(Debug, Clone)]
pub struct InvalidMetric {
    desc: Arc<Descriptor>,
    error: Arc<dyn Error + Send + Sync>,
}

impl InvalidMetric {
    /// Creates a new [`InvalidMetric`] blaming `desc` for `error`.
    pub fn new(desc: Arc<Descriptor>, error: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self {
            desc,
            error: Arc::from(error.into()),
        }
    }

    /// Returns the descriptor of the metric that failed.
    pub fn desc(&self) -> &Arc<Descriptor> {
        &self.desc
    }

    /// Returns the error that caused the failure.
    pub fn error(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.error.as_ref()
    }
}
