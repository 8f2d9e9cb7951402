//! Collector exposing DigitalOcean resource counts.
//!
//! See [`DigitalOceanCollector`] for details.

use std::borrow::Cow;
use std::fmt::Debug;
use std::sync::Arc;

use tracing::{debug, error};

use super::source::{
    CounterKey, Counts, DigitalOceanSource, DropletCounter, FlipCounter, LoadBalancerCounter,
    TagCounter, VolumeCounter,
};
use super::NAMESPACE;
use crate::collector::{Collector, DescSender, MetricSender};
use crate::error::{CollectError, SourceError};
use crate::metrics::constant::ConstMetric;
use crate::metrics::invalid::InvalidMetric;
use crate::registry::{build_fq_name, Descriptor};

/// A [`Collector`] for metrics regarding the resources of a DigitalOcean
/// account.
///
/// Each scrape queries the [`DigitalOceanSource`] for droplets, floating IPs,
/// load balancers, tags and volumes, in that order, and emits one gauge per
/// label combination. The first failing query ends the scrape: samples of
/// the kinds queried before it have already been sent, the remaining kinds
/// are not queried, and a single [`InvalidMetric`] blaming the failed kind
/// is sent instead.
#[derive(Debug)]
pub struct DigitalOceanCollector<S> {
    droplets: Arc<Descriptor>,
    floating_ips: Arc<Descriptor>,
    load_balancers: Arc<Descriptor>,
    tags: Arc<Descriptor>,
    volumes: Arc<Descriptor>,

    source: S,
}

impl<S> DigitalOceanCollector<S> {
    /// Creates a new [`DigitalOceanCollector`] reading from `source`.
    pub fn new(source: S) -> Self {
        Self {
            droplets: descriptor::<DropletCounter>(
                "droplets",
                "Number of Droplets by region, size, and status.",
            ),
            floating_ips: descriptor::<FlipCounter>(
                "floating_ips",
                "Number of Floating IPs by region and status.",
            ),
            load_balancers: descriptor::<LoadBalancerCounter>(
                "load_balancers",
                "Number of Load Balancers by region and status.",
            ),
            tags: descriptor::<TagCounter>(
                "tags",
                "Count of tagged resources by name and resource type.",
            ),
            volumes: descriptor::<VolumeCounter>(
                "volumes",
                "Number of Volumes by region, size in GiB, and status.",
            ),

            source,
        }
    }

    /// Returns the descriptors of all metrics, in collection order.
    pub fn descriptors(&self) -> [&Arc<Descriptor>; 5] {
        [
            &self.droplets,
            &self.floating_ips,
            &self.load_balancers,
            &self.tags,
            &self.volumes,
        ]
    }
}

impl<S: DigitalOceanSource> DigitalOceanCollector<S> {
    fn scrape(&self, metrics: &MetricSender) -> Result<(), Failure> {
        send_counts(&self.droplets, self.source.droplets(), metrics)?;
        send_counts(&self.floating_ips, self.source.floating_ips(), metrics)?;
        send_counts(&self.load_balancers, self.source.load_balancers(), metrics)?;
        send_counts(&self.tags, self.source.tags(), metrics)?;
        send_counts(&self.volumes, self.source.volumes(), metrics)?;

        Ok(())
    }
}

impl<S> Collector for DigitalOceanCollector<S>
where
    S: DigitalOceanSource + Debug + 'static,
{
    fn describe(&self, descs: &DescSender) {
        for desc in self.descriptors() {
            if descs.send(desc.clone()).is_err() {
                return;
            }
        }
    }

    fn collect(&self, metrics: &MetricSender) {
        match self.scrape(metrics) {
            Ok(()) => {}
            Err(Failure::Disconnected) => {
                debug!("metric channel closed, abandoning DigitalOcean collection");
            }
            Err(Failure::Collect { desc, error }) => {
                error!(
                    metric = desc.name(),
                    %error,
                    "failed collecting DigitalOcean metric"
                );
                if metrics.send(InvalidMetric::new(desc, error).into()).is_err() {
                    debug!("metric channel closed, dropping DigitalOcean collection failure");
                }
            }
        }
    }
}

enum Failure {
    Collect {
        desc: Arc<Descriptor>,
        error: CollectError,
    },
    Disconnected,
}

fn descriptor<K: CounterKey>(resource: &str, help: &str) -> Arc<Descriptor> {
    Arc::new(Descriptor::new(
        build_fq_name(NAMESPACE, resource, "count"),
        help,
        K::LABEL_NAMES.iter().copied().map(Cow::Borrowed).collect(),
    ))
}

fn send_counts<K: CounterKey>(
    desc: &Arc<Descriptor>,
    counts: Result<Counts<K>, SourceError>,
    metrics: &MetricSender,
) -> Result<(), Failure> {
    let fail = |error: CollectError| Failure::Collect {
        desc: desc.clone(),
        error,
    };

    for (key, count) in counts.map_err(|e| fail(e.into()))? {
        let metric =
            ConstMetric::gauge(desc.clone(), count, key.label_values()).map_err(|e| fail(e.into()))?;
        metrics
            .send(metric.into())
            .map_err(|_| Failure::Disconnected)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::constant::Value;
    use crate::metrics::Metric;
    use parking_lot::Mutex;
    use quickcheck::{QuickCheck, TestResult};
    use std::collections::HashMap;
    use std::sync::mpsc;
    use std::thread;

    #[derive(Debug)]
    struct StubSource {
        droplets: Result<Counts<DropletCounter>, SourceError>,
        floating_ips: Result<Counts<FlipCounter>, SourceError>,
        load_balancers: Result<Counts<LoadBalancerCounter>, SourceError>,
        tags: Result<Counts<TagCounter>, SourceError>,
        volumes: Result<Counts<VolumeCounter>, SourceError>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl StubSource {
        fn empty() -> Self {
            Self {
                droplets: Ok(HashMap::new()),
                floating_ips: Ok(HashMap::new()),
                load_balancers: Ok(HashMap::new()),
                tags: Ok(HashMap::new()),
                volumes: Ok(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// One group per kind, with counts 1 to 5 in collection order.
        fn populated() -> Self {
            Self {
                droplets: Ok(HashMap::from([(
                    DropletCounter::new("nyc1", "s-1vcpu-1gb", "active"),
                    1,
                )])),
                floating_ips: Ok(HashMap::from([(FlipCounter::new("fra1", "assigned"), 2)])),
                load_balancers: Ok(HashMap::from([(
                    LoadBalancerCounter::new("ams3", "new"),
                    3,
                )])),
                tags: Ok(HashMap::from([(TagCounter::new("web", "droplets"), 4)])),
                volumes: Ok(HashMap::from([(
                    VolumeCounter::new("sfo2", "100", "attached"),
                    5,
                )])),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().clone()
        }
    }

    impl DigitalOceanSource for StubSource {
        fn droplets(&self) -> Result<Counts<DropletCounter>, SourceError> {
            self.calls.lock().push("droplets");
            self.droplets.clone()
        }

        fn floating_ips(&self) -> Result<Counts<FlipCounter>, SourceError> {
            self.calls.lock().push("floating_ips");
            self.floating_ips.clone()
        }

        fn load_balancers(&self) -> Result<Counts<LoadBalancerCounter>, SourceError> {
            self.calls.lock().push("load_balancers");
            self.load_balancers.clone()
        }

        fn tags(&self) -> Result<Counts<TagCounter>, SourceError> {
            self.calls.lock().push("tags");
            self.tags.clone()
        }

        fn volumes(&self) -> Result<Counts<VolumeCounter>, SourceError> {
            self.calls.lock().push("volumes");
            self.volumes.clone()
        }
    }

    /// Runs one scrape, draining the channel while the collector sends.
    fn collect(collector: &dyn Collector) -> Vec<Metric> {
        let (tx, rx) = mpsc::sync_channel(1);
        thread::scope(|s| {
            s.spawn(move || collector.collect(&tx));
            rx.iter().collect()
        })
    }

    fn describe(collector: &dyn Collector) -> Vec<Arc<Descriptor>> {
        let (tx, rx) = mpsc::sync_channel(1);
        thread::scope(|s| {
            s.spawn(move || collector.describe(&tx));
            rx.iter().collect()
        })
    }

    fn sample(metric: &Metric) -> (&str, &Value, Vec<&str>) {
        match metric {
            Metric::Const(m) => (
                m.desc().name(),
                m.value(),
                m.label_values().iter().map(String::as_str).collect(),
            ),
            Metric::Invalid(m) => panic!("unexpected invalid metric for {}", m.desc().name()),
        }
    }

    #[test]
    fn describe_all_descriptors() {
        let collector = DigitalOceanCollector::new(StubSource::empty());

        let descs = describe(&collector);
        assert_eq!(
            vec![
                "digitalocean_droplets_count",
                "digitalocean_floating_ips_count",
                "digitalocean_load_balancers_count",
                "digitalocean_tags_count",
                "digitalocean_volumes_count",
            ],
            descs.iter().map(|d| d.name()).collect::<Vec<_>>()
        );
        assert_eq!(
            vec![
                vec!["region", "size", "status"],
                vec!["region", "status"],
                vec!["region", "status"],
                vec!["name", "resource_type"],
                vec!["region", "size", "status"],
            ],
            descs
                .iter()
                .map(|d| d.label_names().iter().map(|l| l.as_ref()).collect::<Vec<&str>>())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn describe_does_not_query_source() {
        let source = Arc::new(StubSource::empty());
        let collector = DigitalOceanCollector::new(source.clone());

        describe(&collector);
        assert!(source.calls().is_empty());
    }

    #[test]
    fn collect_droplet_counts() {
        let mut source = StubSource::empty();
        source.droplets = Ok(HashMap::from([
            (DropletCounter::new("nyc1", "s-1vcpu", "active"), 3),
            (DropletCounter::new("nyc1", "s-2vcpu", "active"), 1),
        ]));
        let collector = DigitalOceanCollector::new(source);

        let mut samples: Vec<_> = collect(&collector)
            .iter()
            .map(|m| {
                let (name, value, labels) = sample(m);
                (name.to_string(), *value, labels.join(","))
            })
            .collect();
        samples.sort_by(|a, b| a.2.cmp(&b.2));

        assert_eq!(
            vec![
                (
                    "digitalocean_droplets_count".to_string(),
                    Value::Int(3),
                    "nyc1,s-1vcpu,active".to_string()
                ),
                (
                    "digitalocean_droplets_count".to_string(),
                    Value::Int(1),
                    "nyc1,s-2vcpu,active".to_string()
                ),
            ],
            samples
        );
    }

    #[test]
    fn collect_every_kind_in_order() {
        let source = Arc::new(StubSource::populated());
        let collector = DigitalOceanCollector::new(source.clone());

        let metrics = collect(&collector);
        assert_eq!(
            vec![
                ("digitalocean_droplets_count", &Value::Int(1), vec!["nyc1", "s-1vcpu-1gb", "active"]),
                ("digitalocean_floating_ips_count", &Value::Int(2), vec!["fra1", "assigned"]),
                ("digitalocean_load_balancers_count", &Value::Int(3), vec!["ams3", "new"]),
                ("digitalocean_tags_count", &Value::Int(4), vec!["web", "droplets"]),
                ("digitalocean_volumes_count", &Value::Int(5), vec!["sfo2", "100", "attached"]),
            ],
            metrics.iter().map(sample).collect::<Vec<_>>()
        );
        assert_eq!(
            vec!["droplets", "floating_ips", "load_balancers", "tags", "volumes"],
            source.calls()
        );
    }

    #[test]
    fn first_failure_aborts_scrape() {
        let mut source = StubSource::empty();
        source.droplets = Ok(HashMap::from([(
            DropletCounter::new("nyc1", "s-1vcpu-1gb", "active"),
            1,
        )]));
        source.tags = Err(SourceError::other("rate limited"));
        source.volumes = Ok(HashMap::from([(
            VolumeCounter::new("sfo2", "100", "attached"),
            5,
        )]));
        let source = Arc::new(source);
        let collector = DigitalOceanCollector::new(source.clone());

        let metrics = collect(&collector);
        assert_eq!(2, metrics.len());
        assert_eq!("digitalocean_droplets_count", sample(&metrics[0]).0);
        match &metrics[1] {
            Metric::Invalid(invalid) => {
                assert_eq!("digitalocean_tags_count", invalid.desc().name());
                assert_eq!("rate limited", invalid.error().to_string());
            }
            Metric::Const(m) => panic!("expected invalid metric, got {}", m.desc().name()),
        }
        assert_eq!(
            vec!["droplets", "floating_ips", "load_balancers", "tags"],
            source.calls()
        );
    }

    #[test]
    fn failure_keeps_earlier_kinds_and_blames_its_own_descriptor() {
        let descs = DigitalOceanCollector::new(StubSource::empty())
            .descriptors()
            .map(|d| d.name().to_string());

        for (kind, expected) in descs.iter().enumerate() {
            let mut source = StubSource::populated();
            let error = SourceError::Unauthorized;
            match kind {
                0 => source.droplets = Err(error),
                1 => source.floating_ips = Err(error),
                2 => source.load_balancers = Err(error),
                3 => source.tags = Err(error),
                _ => source.volumes = Err(error),
            }
            let source = Arc::new(source);
            let collector = DigitalOceanCollector::new(source.clone());

            let metrics = collect(&collector);
            assert_eq!(kind + 1, metrics.len(), "failing kind {expected}");

            // One sample from each kind queried before the failure, in order.
            let (invalid, samples) = metrics.split_last().unwrap();
            assert_eq!(
                descs[..kind].iter().map(String::as_str).collect::<Vec<_>>(),
                samples.iter().map(|m| sample(m).0).collect::<Vec<_>>()
            );
            assert!(
                matches!(invalid, Metric::Invalid(m) if m.desc().name() == expected.as_str()),
                "failing kind {expected}"
            );
            assert_eq!(kind + 1, source.calls().len());
        }
    }

    #[test]
    fn failure_after_receiver_is_gone() {
        let mut source = StubSource::populated();
        source.droplets = Err(SourceError::Unauthorized);
        let source = Arc::new(source);
        let collector = DigitalOceanCollector::new(source.clone());

        let (tx, rx) = mpsc::sync_channel(1);
        drop(rx);
        collector.collect(&tx);

        assert_eq!(vec!["droplets"], source.calls());
    }

    #[test]
    fn stop_when_receiver_is_gone() {
        let mut source = StubSource::empty();
        source.droplets = Ok(HashMap::from([(
            DropletCounter::new("nyc1", "s-1vcpu-1gb", "active"),
            1,
        )]));
        let source = Arc::new(source);
        let collector = DigitalOceanCollector::new(source.clone());

        let (tx, rx) = mpsc::sync_channel(1);
        drop(rx);
        collector.collect(&tx);

        assert_eq!(vec!["droplets"], source.calls());
    }

    #[test]
    fn scrapes_are_independent() {
        let mut source = StubSource::empty();
        source.tags = Ok(HashMap::from([
            (TagCounter::new("web", "droplets"), 2),
            (TagCounter::new("web", "volumes"), 1),
        ]));
        let collector = DigitalOceanCollector::new(source);

        let scrape = || {
            let mut samples: Vec<_> = collect(&collector)
                .iter()
                .map(|m| {
                    let (_, value, labels) = sample(m);
                    (*value, labels.join(","))
                })
                .collect();
            samples.sort_by(|a, b| a.1.cmp(&b.1));
            samples
        };

        assert_eq!(scrape(), scrape());
    }

    #[test]
    fn one_sample_per_count() {
        fn prop(entries: Vec<(String, String, String, u32)>) -> TestResult {
            let counts: Counts<DropletCounter> = entries
                .into_iter()
                .map(|(region, size, status, count)| {
                    (DropletCounter::new(region, size, status), count as u64)
                })
                .collect();

            let mut source = StubSource::empty();
            source.droplets = Ok(counts.clone());
            let collector = DigitalOceanCollector::new(source);

            let metrics = collect(&collector);
            if metrics.len() != counts.len() {
                return TestResult::failed();
            }

            for metric in metrics.iter() {
                let (_, value, labels) = sample(metric);
                let key = DropletCounter::new(labels[0], labels[1], labels[2]);
                match counts.get(&key) {
                    Some(count) if Value::Int(*count as i64) == *value => {}
                    _ => return TestResult::failed(),
                }
            }

            TestResult::passed()
        }

        QuickCheck::new()
            .tests(50)
            .quickcheck(prop as fn(Vec<(String, String, String, u32)>) -> TestResult);
    }
}
