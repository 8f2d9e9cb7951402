#![deny(dead_code)]
#![deny(missing_docs)]
#![deny(unused)]
#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

//! Prometheus exporter core reporting the resources of a
//! [DigitalOcean](https://www.digitalocean.com/) account as labeled gauges.
//!
//! On every scrape the [`DigitalOceanCollector`](digitalocean::DigitalOceanCollector)
//! queries a [`DigitalOceanSource`](digitalocean::DigitalOceanSource) for
//! droplets, floating IPs, load balancers, tags and volumes, grouped by their
//! label combination, and emits one gauge sample per group.
//!
//! # Examples
//!
//! ```
//! use digitalocean_exporter::digitalocean::{
//!     DigitalOceanCollector, DigitalOceanService, Droplet, Inventory,
//! };
//! use digitalocean_exporter::encoding::text::encode;
//! use digitalocean_exporter::registry::Registry;
//!
//! // An in-memory account with a single active droplet.
//! let inventory = Inventory {
//!     droplets: vec![Droplet::new("nyc1", "s-1vcpu-1gb", "active")],
//!     ..Default::default()
//! };
//!
//! let registry = Registry::default();
//! registry
//!     .register(Box::new(DigitalOceanCollector::new(DigitalOceanService::new(
//!         inventory,
//!     ))))
//!     .unwrap();
//!
//! // When a monitoring system like Prometheus scrapes the exporter, gather
//! // all collectors and encode the result in the text format.
//! let families = registry.gather().into_result().unwrap();
//! let mut buffer = String::new();
//! encode(&mut buffer, &families).unwrap();
//!
//! assert!(buffer.contains(
//!     "digitalocean_droplets_count{region=\"nyc1\",size=\"s-1vcpu-1gb\",status=\"active\"} 1\n"
//! ));
//! ```

pub mod collector;
pub mod digitalocean;
pub mod encoding;
pub mod error;
pub mod metrics;
pub mod registry;
