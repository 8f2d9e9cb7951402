//! Metric registry implementation.
//!
//! See [`Registry`] for details.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::{mpsc, Arc};
use std::thread;

use parking_lot::RwLock;
use tracing::debug;

use crate::collector::Collector;
use crate::encoding::{is_valid_label_name, is_valid_metric_name};
use crate::error::{GatherError, RegistrationError};
use crate::metrics::family::{FamilyBuilder, MetricFamily};
use crate::metrics::Metric;

/// Capacity of the channels handed to collectors. A collector blocks once
/// this many values are waiting to be drained.
pub const CHANNEL_CAPACITY: usize = 1024;

/// A metric registry.
///
/// First off one registers [`Collector`]s with the registry via
/// [`Registry::register`], which asks each collector to describe the metrics
/// it may produce. Later on, on every scrape, [`Registry::gather`] asks all
/// collectors for their current samples and groups them into
/// [`MetricFamily`] values ready to be encoded.
///
/// Both operations take `&self`, a [`Registry`] can be shared behind an
/// [`Arc`] between the scrape endpoint and the rest of the application.
///
/// ```
/// # use digitalocean_exporter::collector::{Collector, DescSender, MetricSender};
/// # use digitalocean_exporter::metrics::constant::ConstMetric;
/// # use digitalocean_exporter::registry::{Descriptor, Registry};
/// # use std::sync::Arc;
/// #
/// #[derive(Debug)]
/// struct Answer {
///     desc: Arc<Descriptor>,
/// }
///
/// impl Collector for Answer {
///     fn describe(&self, descs: &DescSender) {
///         let _ = descs.send(self.desc.clone());
///     }
///
///     fn collect(&self, metrics: &MetricSender) {
///         let metric = ConstMetric::gauge(self.desc.clone(), 42_u64, vec![]).unwrap();
///         let _ = metrics.send(metric.into());
///     }
/// }
///
/// let registry = Registry::default();
/// registry
///     .register(Box::new(Answer {
///         desc: Arc::new(Descriptor::new("answer", "The answer.", vec![])),
///     }))
///     .unwrap();
///
/// let families = registry.gather().into_result().unwrap();
/// assert_eq!("answer", families[0].name());
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    prefix: Option<Prefix>,
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    collectors: Vec<Box<dyn Collector>>,
    names: HashSet<String>,
}

impl Registry {
    /// Creates a new default [`Registry`] with the given prefix.
    ///
    /// The prefix is prepended to the name of every gathered metric family.
    /// Collectors whose prefixed metric names are invalid fail to register.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(Prefix::from(prefix.into())),
            ..Default::default()
        }
    }

    /// Register a [`Collector`].
    ///
    /// Calls [`Collector::describe`] once and validates the descriptors. A
    /// collector is rejected if it describes nothing, uses invalid metric or
    /// label names, or describes a metric name already registered. Metric
    /// names are checked with the registry prefix applied.
    pub fn register(&self, collector: Box<dyn Collector>) -> Result<(), RegistrationError> {
        let descs = describe(collector.as_ref());
        if descs.is_empty() {
            return Err(RegistrationError::NoDescriptors);
        }

        let mut inner = self.inner.write();
        let mut names = HashSet::with_capacity(descs.len());
        for desc in descs.iter() {
            validate(desc)?;

            let name = self.full_name(desc.name());
            if !is_valid_metric_name(&name) {
                return Err(RegistrationError::InvalidMetricName(name));
            }
            if inner.names.contains(&name) || !names.insert(name.clone()) {
                return Err(RegistrationError::AlreadyRegistered(name));
            }
        }

        debug!(metrics = ?names, "registered collector");
        inner.names.extend(names);
        inner.collectors.push(collector);

        Ok(())
    }

    /// Gathers the current samples of all registered collectors.
    ///
    /// Collectors run concurrently, each on its own scoped thread, while the
    /// calling thread drains the shared metric channel. Valid samples are
    /// kept even when some collectors fail. See [`Gathered`].
    pub fn gather(&self) -> Gathered {
        let inner = self.inner.read();
        let (tx, rx) = mpsc::sync_channel::<Metric>(CHANNEL_CAPACITY);

        let mut builder = FamilyBuilder::default();
        let mut errors = Vec::new();

        thread::scope(|s| {
            for collector in inner.collectors.iter() {
                let tx = tx.clone();
                s.spawn(move || collector.collect(&tx));
            }
            drop(tx);

            for metric in rx {
                match metric {
                    Metric::Const(metric) => {
                        if let Err(e) = builder.push(self.prefix.as_ref(), metric) {
                            errors.push(e);
                        }
                    }
                    Metric::Invalid(metric) => errors.push(GatherError::Collector {
                        name: self.full_name(metric.desc().name()),
                        message: metric.error().to_string(),
                    }),
                }
            }
        });

        let families = builder.finish();
        debug!(
            families = families.len(),
            errors = errors.len(),
            "gathered collectors"
        );

        Gathered { families, errors }
    }

    fn full_name(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.as_str(), name),
            None => name.to_string(),
        }
    }
}

fn describe(collector: &dyn Collector) -> Vec<Arc<Descriptor>> {
    let (tx, rx) = mpsc::sync_channel(CHANNEL_CAPACITY);
    thread::scope(|s| {
        s.spawn(move || collector.describe(&tx));
        rx.iter().collect()
    })
}

fn validate(desc: &Descriptor) -> Result<(), RegistrationError> {
    if !is_valid_metric_name(desc.name()) {
        return Err(RegistrationError::InvalidMetricName(desc.name().to_string()));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for label in desc.label_names() {
        if !is_valid_label_name(label) {
            return Err(RegistrationError::InvalidLabelName {
                name: desc.name().to_string(),
                label: label.to_string(),
            });
        }
        if !seen.insert(label.as_ref()) {
            return Err(RegistrationError::DuplicateLabelName {
                name: desc.name().to_string(),
                label: label.to_string(),
            });
        }
    }

    Ok(())
}

/// Result of [`Registry::gather`].
///
/// Holds every valid family gathered in the scrape alongside the errors
/// reported in the same scrape. Callers decide whether partial output is
/// acceptable; [`Gathered::into_result`] gives all-or-nothing semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct Gathered {
    families: Vec<MetricFamily>,
    errors: Vec<GatherError>,
}

impl Gathered {
    /// Returns the gathered families, sorted by name.
    pub fn families(&self) -> &[MetricFamily] {
        &self.families
    }

    /// Returns the errors reported during the scrape.
    pub fn errors(&self) -> &[GatherError] {
        &self.errors
    }

    /// Whether the scrape completed without any error.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the families if no error occurred, the first error otherwise.
    pub fn into_result(self) -> Result<Vec<MetricFamily>, GatherError> {
        match self.errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(self.families),
        }
    }
}

/// Metric prefix
#[derive(Clone, Debug)]
pub struct Prefix(String);

impl Prefix {
    /// Returns the prefix.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for Prefix {
    fn from(s: String) -> Self {
        Prefix(s)
    }
}

/// Builds a fully-qualified metric name from its non-empty parts joined by `_`.
///
/// ```
/// # use digitalocean_exporter::registry::build_fq_name;
/// assert_eq!("digitalocean_droplets_count", build_fq_name("digitalocean", "droplets", "count"));
/// assert_eq!("droplets_count", build_fq_name("", "droplets", "count"));
/// assert_eq!("", build_fq_name("digitalocean", "droplets", ""));
/// ```
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// OpenMetrics metric descriptor.
///
/// Static metadata of one metric family: name, help text and the ordered
/// label names every sample supplies values for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    name: String,
    help: String,
    label_names: Vec<Cow<'static, str>>,
}

impl Descriptor {
    /// Create new [`Descriptor`].
    pub fn new<N: Into<String>, H: Into<String>>(
        name: N,
        help: H,
        label_names: Vec<Cow<'static, str>>,
    ) -> Self {
        Descriptor {
            name: name.into(),
            help: help.into(),
            label_names,
        }
    }

    /// Returns the name of the OpenMetrics metric [`Descriptor`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the help text of the OpenMetrics metric [`Descriptor`].
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Returns the ordered label names of the OpenMetrics metric [`Descriptor`].
    pub fn label_names(&self) -> &[Cow<'static, str>] {
        &self.label_names
    }
}
