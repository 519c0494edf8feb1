//! Version tokens handed out on every record mutation.

use serde::{Deserialize, Serialize};
use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
};
use uuid::Uuid;

/// Opaque, totally ordered version token.
///
/// The high 64 bits count how many times the owning index has been opened,
/// the low 64 bits count changes made during that run. Rendered as a
/// hyphenated UUID string on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Etag(Uuid);

impl Etag {
    pub fn from_parts(restarts: u64, changes: u64) -> Self {
        Self(Uuid::from_u128((u128::from(restarts) << 64) | u128::from(changes)))
    }

    pub fn restarts(&self) -> u64 {
        (self.0.as_u128() >> 64) as u64
    }

    pub fn changes(&self) -> u64 {
        self.0.as_u128() as u64
    }
}

impl fmt::Display for Etag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for Etag {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Hands out strictly increasing [`Etag`]s for one run of an index.
#[derive(Debug)]
pub struct EtagGenerator {
    restarts: u64,
    changes: AtomicU64,
}

impl EtagGenerator {
    pub fn new(restarts: u64) -> Self {
        Self {
            restarts,
            changes: AtomicU64::new(0),
        }
    }

    pub fn next(&self) -> Etag {
        let changes = self.changes.fetch_add(1, Ordering::SeqCst) + 1;
        Etag::from_parts(self.restarts, changes)
    }
}
