//! Self-throttling against the read/write limits reported in `dbg_info`.
//!
//! The strategy is a fixed wait: once the last observed count reaches one
//! below the server's limit, the next call of that class sleeps for the whole
//! limit window. The snapshot is only as fresh as the last response, so the
//! wait can overshoot or undershoot the server's actual reset.

use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Which server-side counter a request is charged against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
#[non_exhaustive]
pub enum RateClass {
    Read,
    Write,
}

impl RateClass {
    /// `GET` is a read; every other method is charged as a write.
    #[must_use]
    pub fn of(method: &Method) -> Self {
        if *method == Method::GET {
            RateClass::Read
        } else {
            RateClass::Write
        }
    }
}

/// Most recent rate-limit usage reported by the server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct RateSnapshot {
    pub reads: u32,
    pub read_limit: u32,
    pub read_limit_seconds: u64,
    pub writes: u32,
    pub write_limit: u32,
    pub write_limit_seconds: u64,
}

impl RateSnapshot {
    /// Observed count, limit and window for `class`.
    #[must_use]
    pub const fn counters(&self, class: RateClass) -> (u32, u32, u64) {
        match class {
            RateClass::Read => (self.reads, self.read_limit, self.read_limit_seconds),
            RateClass::Write => (self.writes, self.write_limit, self.write_limit_seconds),
        }
    }

    /// How long a request with `method` must wait before it is dispatched.
    ///
    /// One request of headroom is kept below the stated limit.
    #[must_use]
    pub fn required_wait(&self, method: &Method) -> Duration {
        let (actions, limit, period) = self.counters(RateClass::of(method));

        if actions >= limit.saturating_sub(1) {
            Duration::from_secs(period)
        } else {
            Duration::ZERO
        }
    }
}

/// Sleeps for whatever `snapshot` demands and returns the time waited.
pub(crate) async fn throttle(snapshot: RateSnapshot, method: &Method) -> Duration {
    let wait = snapshot.required_wait(method);
    if wait.is_zero() {
        return wait;
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        class = %RateClass::of(method),
        wait_secs = wait.as_secs(),
        "rate limit reached, waiting before dispatch"
    );

    tokio::time::sleep(wait).await;
    wait
}
