//! Lamport Clock for operation ordering
//!
//! Each replica keeps one clock. It ticks for every local operation and is
//! fast-forwarded past every clock observed in an ingested delta, so a local
//! write issued after a sync always sorts after everything already seen.

use serde::{Deserialize, Serialize};

/// Lamport timestamp for causality tracking
///
/// - Monotonically increasing: clock never decreases
/// - Starts at 0; the first issued timestamp is 1
/// - Update on merge: clock = max(local, remote)
///
/// Inbound payloads never carry [`OpId::MAX_CLOCK`](super::OpId::MAX_CLOCK),
/// so `tick` always has room after an `update`.
///
/// # Example
///
/// ```rust
/// use response_crdt::op::LamportClock;
///
/// let mut clock = LamportClock::new();
/// assert_eq!(clock.tick(), 1);
///
/// clock.update(41);  // Seen in a remote payload
/// assert_eq!(clock.tick(), 42);
///
/// clock.update(7);  // Older remote clocks never move it back
/// assert_eq!(clock.value(), 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LamportClock {
    value: u64,
}

impl LamportClock {
    /// Create a new Lamport clock starting at 0
    pub fn new() -> Self {
        Self { value: 0 }
    }

    /// Get the current clock value
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Increment clock and return new value (for local operations)
    pub fn tick(&mut self) -> u64 {
        self.value += 1;
        self.value
    }

    /// Update clock from remote timestamp (for merge operations)
    pub fn update(&mut self, remote: u64) {
        self.value = self.value.max(remote);
    }
}

impl Default for LamportClock {
    fn default() -> Self {
        Self::new()
    }
}
