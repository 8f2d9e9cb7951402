//! DigitalOcean account metrics.
//!
//! [`DigitalOceanCollector`] turns the grouped counts of a
//! [`DigitalOceanSource`] into the following gauge families:
//!
//! | Metric | Labels |
//! |---|---|
//! | `digitalocean_droplets_count` | `region`, `size`, `status` |
//! | `digitalocean_floating_ips_count` | `region`, `status` |
//! | `digitalocean_load_balancers_count` | `region`, `status` |
//! | `digitalocean_tags_count` | `name`, `resource_type` |
//! | `digitalocean_volumes_count` | `region`, `size`, `status` |
//!
//! [`DigitalOceanService`] provides the counts by tallying the raw resources
//! of a [`ResourceLister`].

mod collector;
mod service;
mod source;

pub use collector::DigitalOceanCollector;
pub use service::{
    DigitalOceanService, Droplet, FloatingIp, Inventory, LoadBalancer, ResourceLister, Tag,
    TaggedResources, Volume,
};
pub use source::{
    CounterKey, Counts, DigitalOceanSource, DropletCounter, FlipCounter, LoadBalancerCounter,
    TagCounter, VolumeCounter,
};

/// Namespace shared by all metric names.
pub const NAMESPACE: &str = "digitalocean";
