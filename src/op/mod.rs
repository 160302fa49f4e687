//! Operation identity: op IDs, Lamport clocks and the local actor
//!
//! Every local mutation is stamped with a fresh [`OpId`] so that replaying
//! it anywhere, any number of times, is a no-op. The [`LocalActor`] bundles
//! the identity performing local writes with the generator that stamps them;
//! it is passed explicitly to every write instead of being looked up globally.

mod clock;
mod id;

pub use clock::LamportClock;
pub use id::OpId;

use crate::IdentityId;
use uuid::Uuid;

/// Source of fresh operation IDs
pub trait OpIdGenerator {
    /// Issue an ID that sorts after every ID this generator has issued or observed
    fn next_id(&mut self) -> OpId;

    /// Record an ID seen in an inbound delta
    fn observe(&mut self, _seen: &OpId) {}
}

/// Default generator: one random replica UUID plus a Lamport clock
#[derive(Debug, Clone)]
pub struct LamportIdGenerator {
    replica: Uuid,
    clock: LamportClock,
}

impl LamportIdGenerator {
    /// Create a generator with a random replica ID
    pub fn new() -> Self {
        Self::with_replica(Uuid::new_v4())
    }

    /// Create a generator for a fixed replica ID
    pub fn with_replica(replica: Uuid) -> Self {
        Self {
            replica,
            clock: LamportClock::new(),
        }
    }

    /// Replica this generator stamps IDs with
    pub fn replica(&self) -> Uuid {
        self.replica
    }

    /// Current clock value
    pub fn clock(&self) -> u64 {
        self.clock.value()
    }
}

impl Default for LamportIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl OpIdGenerator for LamportIdGenerator {
    fn next_id(&mut self) -> OpId {
        OpId::new(self.clock.tick(), self.replica)
    }

    fn observe(&mut self, seen: &OpId) {
        self.clock.update(seen.clock);
    }
}

/// The identity performing local writes, and how it stamps them
#[derive(Debug, Clone)]
pub struct LocalActor<G = LamportIdGenerator> {
    identity: IdentityId,
    ids: G,
}

impl LocalActor<LamportIdGenerator> {
    /// Create an actor with a fresh random replica
    pub fn new(identity: impl Into<IdentityId>) -> Self {
        Self::with_generator(identity, LamportIdGenerator::new())
    }
}

impl<G: OpIdGenerator> LocalActor<G> {
    /// Create an actor using a custom ID generator
    pub fn with_generator(identity: impl Into<IdentityId>, ids: G) -> Self {
        Self {
            identity: identity.into(),
            ids,
        }
    }

    /// Identity local writes are attributed to
    pub fn identity(&self) -> &IdentityId {
        &self.identity
    }

    /// Stamp a new local operation
    pub fn next_id(&mut self) -> OpId {
        self.ids.next_id()
    }

    /// Fast-forward past an ID seen in an inbound delta
    pub fn observe(&mut self, seen: &OpId) {
        self.ids.observe(seen);
    }

    /// Access the underlying generator
    pub fn generator(&self) -> &G {
        &self.ids
    }
}
