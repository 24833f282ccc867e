//! Memory isolation domain and storage tier tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Isolation scope for memory content.
///
/// `Bi` and `Code` do not cross-read each other by default; `Shared` is
/// readable by any domain (non-transitively — see the memory policy
/// documentation in `strata-memory` for the exact cross-read rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Bi,
    Code,
    Shared,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Bi => "bi",
            Domain::Code => "code",
            Domain::Shared => "shared",
        }
    }

    /// Whether `self` may read content written under `other`.
    pub fn can_read(&self, other: Domain) -> bool {
        *self == other || other == Domain::Shared
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bi" => Ok(Domain::Bi),
            "code" => Ok(Domain::Code),
            "shared" => Ok(Domain::Shared),
            other => Err(crate::CoreError::InvalidDomain(other.to_string())),
        }
    }
}

/// One of the four memory strata. Every item's primary residence is one
/// tier; items may be mirrored (e.g. a result cached in L1 while its chunk
/// lives in L2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    L1Ephemeral,
    L2Vector,
    L3Structured,
    L4Cold,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::L1Ephemeral => "L1_ephemeral",
            Tier::L2Vector => "L2_vector",
            Tier::L3Structured => "L3_structured",
            Tier::L4Cold => "L4_cold",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_is_universally_readable() {
        assert!(Domain::Bi.can_read(Domain::Shared));
        assert!(Domain::Code.can_read(Domain::Shared));
        assert!(Domain::Shared.can_read(Domain::Shared));
    }

    #[test]
    fn bi_and_code_do_not_cross_read() {
        assert!(!Domain::Bi.can_read(Domain::Code));
        assert!(!Domain::Code.can_read(Domain::Bi));
    }

    #[test]
    fn shared_does_not_read_back_into_bi_or_code() {
        assert!(!Domain::Shared.can_read(Domain::Bi));
        assert!(!Domain::Shared.can_read(Domain::Code));
    }

    #[test]
    fn round_trips_through_str() {
        for d in [Domain::Bi, Domain::Code, Domain::Shared] {
            let parsed: Domain = d.as_str().parse().unwrap();
            assert_eq!(parsed, d);
        }
    }
}
