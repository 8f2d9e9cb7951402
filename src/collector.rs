//! Metric collector implementation.
//!
//! See [`Collector`] for details.

use std::sync::mpsc::SyncSender;
use std::sync::Arc;

use crate::metrics::Metric;
use crate::registry::Descriptor;

/// Channel a [`Collector`] sends its descriptors to.
pub type DescSender = SyncSender<Arc<Descriptor>>;

/// Channel a [`Collector`] sends its samples and failure signals to.
pub type MetricSender = SyncSender<Metric>;

/// The [`Collector`] abstraction allows users to provide metrics and their
/// description on each scrape.
///
/// An example use-case is an exporter that retrieves the state of an external
/// system ad-hoc on each scrape, see
/// [`DigitalOceanCollector`](crate::digitalocean::DigitalOceanCollector).
///
/// Register a [`Collector`] with a [`Registry`](crate::registry::Registry) via
/// [`Registry::register`](crate::registry::Registry::register).
///
/// Both channels are bounded. Sending blocks until the registry drains the
/// channel, and fails once the registry stopped listening, in which case the
/// collector should stop sending.
pub trait Collector: std::fmt::Debug + Send + Sync + 'static {
    /// Sends the descriptor of every metric the collector may ever produce.
    ///
    /// Called once at registration. Must not depend on the state of the
    /// collected system.
    fn describe(&self, descs: &DescSender);

    /// Once the [`Collector`] is registered, this method is called on each scrape.
    fn collect(&self, metrics: &MetricSender);
}
