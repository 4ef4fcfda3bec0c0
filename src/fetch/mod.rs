//! Data-fetching wrappers.
//!
//! Each fetcher owns a `FetchState` and hands out clones of it. Writes go
//! through a `Generations` tracker: every fetch takes a `Ticket`, and only
//! the newest ticket of a still-mounted fetcher may commit. Late responses
//! (superseded or after unmount) are dropped as a handled no-op.
//!
//! Modules:
//! - teams: the viewer's teams for an organization
//! - team_projects: per-team project fan-out joined into one aggregate

pub mod team_projects;
pub mod teams;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

pub use team_projects::TeamProjectsFetcher;
pub use teams::TeamsFetcher;

/// Identifies one fetch generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Outcome of trying to write a completed fetch into state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Applied,
    /// A newer fetch started after this one.
    Stale,
    /// The owner was unmounted while the request was in flight.
    Unmounted,
}

impl Commit {
    pub fn applied(self) -> bool {
        self == Commit::Applied
    }
}

#[derive(Debug)]
pub struct Generations {
    current: AtomicU64,
    mounted: AtomicBool,
}

impl Default for Generations {
    fn default() -> Self {
        Self {
            current: AtomicU64::new(0),
            mounted: AtomicBool::new(true),
        }
    }
}

impl Generations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, invalidating every earlier ticket.
    pub fn begin(&self) -> Ticket {
        Ticket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    /// Run `write` if `ticket` may still update state.
    ///
    /// The caller holds the state lock across this call so the check and
    /// the write cannot interleave with another commit.
    pub fn commit(&self, owner: &str, ticket: Ticket, write: impl FnOnce()) -> Commit {
        if !self.is_mounted() {
            log::debug!(
                "{}: dropping response for generation {} after unmount",
                owner,
                ticket.0
            );
            return Commit::Unmounted;
        }
        if !self.is_current(ticket) {
            log::debug!(
                "{}: dropping stale response for generation {} (current {})",
                owner,
                ticket.0,
                self.current.load(Ordering::SeqCst)
            );
            return Commit::Stale;
        }
        write();
        Commit::Applied
    }
}
