//! Tallying of raw account resources into grouped counts.
//!
//! See [`DigitalOceanService`] for details.

use std::collections::HashMap;
use std::hash::Hash;

use super::source::{
    Counts, DigitalOceanSource, DropletCounter, FlipCounter, LoadBalancerCounter, TagCounter,
    VolumeCounter,
};
use crate::error::SourceError;

/// A droplet as listed by the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Droplet {
    /// Region slug.
    pub region: String,
    /// Size slug.
    pub size: String,
    /// Status, e.g. `new`, `active` or `off`.
    pub status: String,
}

impl Droplet {
    /// Creates a new [`Droplet`].
    pub fn new(region: impl Into<String>, size: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            size: size.into(),
            status: status.into(),
        }
    }
}

/// A floating IP as listed by the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FloatingIp {
    /// Region slug.
    pub region: String,
    /// Droplet the IP is assigned to, if any.
    pub droplet_id: Option<u64>,
}

impl FloatingIp {
    /// Creates a new [`FloatingIp`].
    pub fn new(region: impl Into<String>, droplet_id: Option<u64>) -> Self {
        Self {
            region: region.into(),
            droplet_id,
        }
    }

    /// `assigned` or `unassigned`.
    pub fn status(&self) -> &'static str {
        match self.droplet_id {
            Some(_) => "assigned",
            None => "unassigned",
        }
    }
}

/// A load balancer as listed by the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadBalancer {
    /// Region slug.
    pub region: String,
    /// Status, e.g. `new`, `active` or `errored`.
    pub status: String,
}

impl LoadBalancer {
    /// Creates a new [`LoadBalancer`].
    pub fn new(region: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            status: status.into(),
        }
    }
}

/// A tag as listed by the API, with the number of resources carrying it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    /// Tag name.
    pub name: String,
    /// Tagged resources per resource type.
    pub resources: Vec<TaggedResources>,
}

impl Tag {
    /// Creates a new [`Tag`].
    pub fn new(name: impl Into<String>, resources: Vec<TaggedResources>) -> Self {
        Self {
            name: name.into(),
            resources,
        }
    }
}

/// Number of resources of one type carrying a [`Tag`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedResources {
    /// Resource type, e.g. `droplets` or `volumes`.
    pub resource_type: String,
    /// Number of tagged resources of that type.
    pub count: u64,
}

impl TaggedResources {
    /// Creates a new [`TaggedResources`].
    pub fn new(resource_type: impl Into<String>, count: u64) -> Self {
        Self {
            resource_type: resource_type.into(),
            count,
        }
    }
}

/// A block storage volume as listed by the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Volume {
    /// Region slug.
    pub region: String,
    /// Size in GiB.
    pub size_gigabytes: u64,
    /// Droplets the volume is attached to.
    pub droplet_ids: Vec<u64>,
}

impl Volume {
    /// Creates a new [`Volume`].
    pub fn new(region: impl Into<String>, size_gigabytes: u64, droplet_ids: Vec<u64>) -> Self {
        Self {
            region: region.into(),
            size_gigabytes,
            droplet_ids,
        }
    }

    /// `attached` or `unattached`.
    pub fn status(&self) -> &'static str {
        if self.droplet_ids.is_empty() {
            "unattached"
        } else {
            "attached"
        }
    }
}

/// Lists the raw resources of a DigitalOcean account.
///
/// Implemented by an API client. Pagination, rate limiting and timeouts are
/// the implementation's business.
pub trait ResourceLister: Send + Sync {
    /// Lists all droplets.
    fn droplets(&self) -> Result<Vec<Droplet>, SourceError>;

    /// Lists all floating IPs.
    fn floating_ips(&self) -> Result<Vec<FloatingIp>, SourceError>;

    /// Lists all load balancers.
    fn load_balancers(&self) -> Result<Vec<LoadBalancer>, SourceError>;

    /// Lists all tags.
    fn tags(&self) -> Result<Vec<Tag>, SourceError>;

    /// Lists all volumes.
    fn volumes(&self) -> Result<Vec<Volume>, SourceError>;
}

/// In-memory [`ResourceLister`] returning a fixed set of resources.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    /// Droplets of the account.
    pub droplets: Vec<Droplet>,
    /// Floating IPs of the account.
    pub floating_ips: Vec<FloatingIp>,
    /// Load balancers of the account.
    pub load_balancers: Vec<LoadBalancer>,
    /// Tags of the account.
    pub tags: Vec<Tag>,
    /// Volumes of the account.
    pub volumes: Vec<Volume>,
}

impl ResourceLister for Inventory {
    fn droplets(&self) -> Result<Vec<Droplet>, SourceError> {
        Ok(self.droplets.clone())
    }

    fn floating_ips(&self) -> Result<Vec<FloatingIp>, SourceError> {
        Ok(self.floating_ips.clone())
    }

    fn load_balancers(&self) -> Result<Vec<LoadBalancer>, SourceError> {
        Ok(self.load_balancers.clone())
    }

    fn tags(&self) -> Result<Vec<Tag>, SourceError> {
        Ok(self.tags.clone())
    }

    fn volumes(&self) -> Result<Vec<Volume>, SourceError> {
        Ok(self.volumes.clone())
    }
}

/// [`DigitalOceanSource`] counting the resources listed by a [`ResourceLister`].
///
/// Every call lists the resources anew; nothing is cached between calls.
///
/// ```
/// # use digitalocean_exporter::digitalocean::{
/// #     DigitalOceanService, DigitalOceanSource, Droplet, DropletCounter, Inventory,
/// # };
/// let service = DigitalOceanService::new(Inventory {
///     droplets: vec![
///         Droplet::new("nyc1", "s-1vcpu-1gb", "active"),
///         Droplet::new("nyc1", "s-1vcpu-1gb", "active"),
///         Droplet::new("nyc1", "s-1vcpu-1gb", "off"),
///     ],
///     ..Default::default()
/// });
///
/// let counts = service.droplets().unwrap();
/// assert_eq!(Some(&2), counts.get(&DropletCounter::new("nyc1", "s-1vcpu-1gb", "active")));
/// assert_eq!(Some(&1), counts.get(&DropletCounter::new("nyc1", "s-1vcpu-1gb", "off")));
/// ```
#[derive(Debug)]
pub struct DigitalOceanService<L> {
    lister: L,
}

impl<L> DigitalOceanService<L> {
    /// Creates a new [`DigitalOceanService`] over `lister`.
    pub fn new(lister: L) -> Self {
        Self { lister }
    }
}

impl<L: ResourceLister> DigitalOceanSource for DigitalOceanService<L> {
    fn droplets(&self) -> Result<Counts<DropletCounter>, SourceError> {
        let droplets = self.lister.droplets()?;
        Ok(tally(droplets.into_iter().map(|d| {
            (DropletCounter::new(d.region, d.size, d.status), 1)
        })))
    }

    fn floating_ips(&self) -> Result<Counts<FlipCounter>, SourceError> {
        let fips = self.lister.floating_ips()?;
        Ok(tally(fips.into_iter().map(|fip| {
            let status = fip.status();
            (FlipCounter::new(fip.region, status), 1)
        })))
    }

    fn load_balancers(&self) -> Result<Counts<LoadBalancerCounter>, SourceError> {
        let lbs = self.lister.load_balancers()?;
        Ok(tally(
            lbs.into_iter()
                .map(|lb| (LoadBalancerCounter::new(lb.region, lb.status), 1)),
        ))
    }

    fn tags(&self) -> Result<Counts<TagCounter>, SourceError> {
        let tags = self.lister.tags()?;
        Ok(tally(tags.into_iter().flat_map(|tag| {
            let name = tag.name;
            tag.resources
                .into_iter()
                .filter(|r| r.count > 0)
                .map(move |r| (TagCounter::new(name.clone(), r.resource_type), r.count))
        })))
    }

    fn volumes(&self) -> Result<Counts<VolumeCounter>, SourceError> {
        let volumes = self.lister.volumes()?;
        Ok(tally(volumes.into_iter().map(|v| {
            let status = v.status();
            let size = itoa::Buffer::new().format(v.size_gigabytes).to_string();
            (VolumeCounter::new(v.region, size, status), 1)
        })))
    }
}

fn tally<K: Eq + Hash>(entries: impl IntoIterator<Item = (K, u64)>) -> Counts<K> {
    let mut counts = HashMap::new();
    for (key, n) in entries {
        *counts.entry(key).or_insert(0) += n;
    }
    counts
}
