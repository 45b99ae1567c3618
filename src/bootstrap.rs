//! Handshake with an upstream beat before it is registered.
//!
//! The beat kind selects metric names and subsystems, so a target is only
//! registered once its identity document has been read.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::beat::{BeatClient, BeatInfo};

/// Poll the identity document every `retry_interval` until it succeeds.
///
/// The first attempt is immediate. Returns `None` if `cancel` fires first,
/// including while a request is in flight.
pub async fn await_beat(
    client: &BeatClient,
    retry_interval: Duration,
    cancel: &CancellationToken,
) -> Option<BeatInfo> {
    let label = &client.target().label;
    let mut ticker = tokio::time::interval(retry_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut attempt: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(collector = %label, "handshake cancelled");
                return None;
            }
            _ = ticker.tick() => {}
        }

        attempt += 1;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(collector = %label, "handshake cancelled");
                return None;
            }
            result = client.fetch_info() => result,
        };

        match result {
            Ok(info) => return Some(info),
            Err(e) => {
                warn!(
                    target = %client.target(),
                    attempt,
                    error = %e,
                    "could not validate beat, retrying"
                );
            }
        }
    }
}
