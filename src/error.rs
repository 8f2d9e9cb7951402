//! Error types.

/// Failure of a [`DigitalOceanSource`](crate::digitalocean::DigitalOceanSource)
/// query.
///
/// The collector does not distinguish between variants: any of them aborts
/// the scrape it occurred in.
///
/// ```
/// use digitalocean_exporter::error::SourceError;
///
/// let err = SourceError::Api { status: 503, message: "unavailable".into() };
/// assert!(err.to_string().contains("503"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// Non-2xx response from the DigitalOcean API.
    #[error("DigitalOcean API error: status={status}, message={message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message returned by the API.
        message: String,
    },

    /// The API throttled the request.
    #[error("rate limited")]
    RateLimited,

    /// Credentials were rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Anything else, carried as plain text.
    #[error("{0}")]
    Other(String),
}

impl SourceError {
    /// Creates a [`SourceError::Other`] from a message.
    pub fn other(message: impl Into<String>) -> Self {
        SourceError::Other(message.into())
    }
}

/// A sample could not be built from its parts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricError {
    /// Label values do not line up with the descriptor's label names.
    #[error("inconsistent label cardinality for {name}: expected {expected} label values, got {got}")]
    InconsistentCardinality {
        /// Metric name.
        name: String,
        /// Number of label names declared by the descriptor.
        expected: usize,
        /// Number of label values supplied.
        got: usize,
    },
}

/// Reason a collector could not produce the samples of one metric.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectError {
    /// The underlying query failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A sample could not be built.
    #[error(transparent)]
    Metric(#[from] MetricError),
}

/// A [`Collector`](crate::collector::Collector) was rejected by
/// [`Registry::register`](crate::registry::Registry::register).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// The collector described no metrics at all.
    #[error("collector has no descriptors")]
    NoDescriptors,

    /// A descriptor with the same fully-qualified name is already registered.
    #[error("descriptor {0} already registered")]
    AlreadyRegistered(String),

    /// The metric name is not a valid OpenMetrics name.
    #[error("invalid metric name {0:?}")]
    InvalidMetricName(String),

    /// A label name is not a valid OpenMetrics label name.
    #[error("invalid label name {label:?} on {name}")]
    InvalidLabelName {
        /// Metric name.
        name: String,
        /// Offending label name.
        label: String,
    },

    /// A label name appears more than once on a descriptor.
    #[error("duplicate label name {label:?} on {name}")]
    DuplicateLabelName {
        /// Metric name.
        name: String,
        /// Repeated label name.
        label: String,
    },
}

/// Problem detected while gathering collectors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatherError {
    /// A collector signalled a failed collection via an invalid metric.
    #[error("error collecting metric {name}: {message}")]
    Collector {
        /// Name of the metric whose collection failed.
        name: String,
        /// Error reported by the collector.
        message: String,
    },

    /// The same metric and label values were collected twice.
    #[error("collected metric {name} {label_values:?} was collected before with the same name and label values")]
    DuplicateSample {
        /// Metric name.
        name: String,
        /// Repeated label values.
        label_values: Vec<String>,
    },

    /// A sample was collected for a name already used with a different type or help.
    #[error("collected metric {0} has a descriptor inconsistent with its family")]
    InconsistentFamily(String),
}
