//! Prometheus exporter for the Elastic beats HTTP monitoring endpoint.
//!
//! Each configured beat is validated through its identity document, then
//! scraped on demand: every request to the telemetry path fetches `/stats`
//! from all beats and translates the JSON into metric families.

pub mod beat;
pub mod bootstrap;
pub mod collector;
pub mod config;
pub mod export;
pub mod exporter;
pub mod version;

pub use config::Config;
pub use exporter::{run, Exporter};
