//! Grouped resource counts and the source they are read from.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::SourceError;

/// Number of resources per label combination.
///
/// Produced fresh by every [`DigitalOceanSource`] call. Iteration order is
/// unspecified.
pub type Counts<K> = HashMap<K, u64>;

/// Key of a [`Counts`] map: the label combination resources are grouped by.
pub trait CounterKey: Eq + Hash {
    /// Label names, in the order [`CounterKey::label_values`] returns values.
    const LABEL_NAMES: &'static [&'static str];

    /// Label values, positionally matching [`CounterKey::LABEL_NAMES`].
    fn label_values(&self) -> Vec<String>;
}

/// Droplets grouped by region, size and status.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct DropletCounter {
    /// Region slug, e.g. `nyc1`.
    pub region: String,
    /// Size slug, e.g. `s-1vcpu-1gb`.
    pub size: String,
    /// Droplet status, e.g. `active`.
    pub status: String,
}

impl DropletCounter {
    /// Creates a new [`DropletCounter`].
    pub fn new(region: impl Into<String>, size: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            size: size.into(),
            status: status.into(),
        }
    }
}

impl CounterKey for DropletCounter {
    const LABEL_NAMES: &'static [&'static str] = &["region", "size", "status"];

    fn label_values(&self) -> Vec<String> {
        vec![self.region.clone(), self.size.clone(), self.status.clone()]
    }
}

/// Floating IPs grouped by region and status.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FlipCounter {
    /// Region slug.
    pub region: String,
    /// `assigned` or `unassigned`.
    pub status: String,
}

impl FlipCounter {
    /// Creates a new [`FlipCounter`].
    pub fn new(region: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            status: status.into(),
        }
    }
}

impl CounterKey for FlipCounter {
    const LABEL_NAMES: &'static [&'static str] = &["region", "status"];

    fn label_values(&self) -> Vec<String> {
        vec![self.region.clone(), self.status.clone()]
    }
}

/// Load balancers grouped by region and status.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadBalancerCounter {
    /// Region slug.
    pub region: String,
    /// Load balancer status, e.g. `active`.
    pub status: String,
}

impl LoadBalancerCounter {
    /// Creates a new [`LoadBalancerCounter`].
    pub fn new(region: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            status: status.into(),
        }
    }
}

impl CounterKey for LoadBalancerCounter {
    const LABEL_NAMES: &'static [&'static str] = &["region", "status"];

    fn label_values(&self) -> Vec<String> {
        vec![self.region.clone(), self.status.clone()]
    }
}

/// Tagged resources grouped by tag name and resource type.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TagCounter {
    /// Tag name.
    pub name: String,
    /// Type of the tagged resources, e.g. `droplets`.
    pub resource_type: String,
}

impl TagCounter {
    /// Creates a new [`TagCounter`].
    pub fn new(name: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_type: resource_type.into(),
        }
    }
}

impl CounterKey for TagCounter {
    const LABEL_NAMES: &'static [&'static str] = &["name", "resource_type"];

    fn label_values(&self) -> Vec<String> {
        vec![self.name.clone(), self.resource_type.clone()]
    }
}

/// Volumes grouped by region, size in GiB and status.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct VolumeCounter {
    /// Region slug.
    pub region: String,
    /// Size in GiB, in decimal.
    pub size: String,
    /// `attached` or `unattached`.
    pub status: String,
}

impl VolumeCounter {
    /// Creates a new [`VolumeCounter`].
    pub fn new(region: impl Into<String>, size: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            size: size.into(),
            status: status.into(),
        }
    }
}

impl CounterKey for VolumeCounter {
    const LABEL_NAMES: &'static [&'static str] = &["region", "size", "status"];

    fn label_values(&self) -> Vec<String> {
        vec![self.region.clone(), self.size.clone(), self.status.clone()]
    }
}

/// Retrieves the resources of a DigitalOcean account, grouped by label
/// combination.
///
/// Implemented by [`DigitalOceanService`](super::DigitalOceanService). Every
/// call reflects the account at the time of the call and may fail
/// independently of the others.
pub trait DigitalOceanSource: Send + Sync {
    /// Droplet counts.
    fn droplets(&self) -> Result<Counts<DropletCounter>, SourceError>;

    /// Floating IP counts.
    fn floating_ips(&self) -> Result<Counts<FlipCounter>, SourceError>;

    /// Load balancer counts.
    fn load_balancers(&self) -> Result<Counts<LoadBalancerCounter>, SourceError>;

    /// Tagged resource counts.
    fn tags(&self) -> Result<Counts<TagCounter>, SourceError>;

    /// Volume counts.
    fn volumes(&self) -> Result<Counts<VolumeCounter>, SourceError>;
}

impl<S: DigitalOceanSource + ?Sized> DigitalOceanSource for Arc<S> {
    fn droplets(&self) -> Result<Counts<DropletCounter>, SourceError> {
        (**self).droplets()
    }

    fn floating_ips(&self) -> Result<Counts<FlipCounter>, SourceError> {
        (**self).floating_ips()
    }

    fn load_balancers(&self) -> Result<Counts<LoadBalancerCounter>, SourceError> {
        (**self).load_balancers()
    }

    fn tags(&self) -> Result<Counts<TagCounter>, SourceError> {
        (**self).tags()
    }

    fn volumes(&self) -> Result<Counts<VolumeCounter>, SourceError> {
        (**self).volumes()
    }
}
