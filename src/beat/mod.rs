//! Upstream beat access: target grammar, JSON models and the HTTP client.

pub mod client;
pub mod stats;
pub mod target;

pub use client::{BeatClient, FetchError};
pub use stats::{BeatInfo, Stats};
pub use target::{parse_targets, Target, TargetError};
