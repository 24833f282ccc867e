//! Wire-stable millisecond duration, mirroring `layer0::duration::DurationMs`
//! so JSON payloads crossing between the turn/operator protocol and the
//! orchestration core agree on a representation instead of each picking a
//! different `serde`-derived shape for `std::time::Duration`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationMs(pub u64);

impl DurationMs {
    pub const ZERO: DurationMs = DurationMs(0);

    pub fn from_millis(ms: u64) -> Self {
        DurationMs(ms)
    }

    pub fn from_secs(secs: u64) -> Self {
        DurationMs(secs.saturating_mul(1000))
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn to_std(&self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl From<Duration> for DurationMs {
    fn from(d: Duration) -> Self {
        DurationMs(d.as_millis() as u64)
    }
}

impl From<DurationMs> for Duration {
    fn from(d: DurationMs) -> Self {
        d.to_std()
    }
}

impl std::fmt::Display for DurationMs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_secs_converts() {
        assert_eq!(DurationMs::from_secs(2).as_millis(), 2000);
    }

    #[test]
    fn round_trips_std_duration() {
        let d = Duration::from_millis(1500);
        let ms: DurationMs = d.into();
        assert_eq!(ms, DurationMs(1500));
        assert_eq!(Duration::from(ms), d);
    }

    #[test]
    fn serializes_transparently() {
        let ms = DurationMs(42);
        assert_eq!(serde_json::to_string(&ms).unwrap(), "42");
    }
}
