//! Sync Scheduler
//!
//! Per-collection single-flight dispatcher. While a round is in flight,
//! further `schedule` calls only mark the collection pending; when the round
//! resolves exactly one trailing round runs with the latest state.
//!
//! Every round carries a generation. Reloading a collection invalidates the
//! generation in flight, and a round that comes back stale is handed to
//! [`SyncTarget::discard`] instead of [`SyncTarget::commit`].

use std::cell::RefCell;
use std::collections::HashMap;

use async_trait::async_trait;
use log::{debug, warn};

use crate::domain::CollectionId;

/// Something the scheduler can run reconciliation rounds for
#[async_trait(?Send)]
pub trait SyncTarget {
    /// Whatever a round produces
    type Round;

    fn collection_id(&self) -> CollectionId;

    /// Diff and execute against the latest state
    async fn run_round(&self, generation: u64) -> Self::Round;

    /// Apply a round whose generation is still current
    fn commit(&self, generation: u64, round: Self::Round);

    /// Drop a round that was superseded by a reload
    fn discard(&self, generation: u64, round: Self::Round);
}

#[derive(Debug, Default, Clone, Copy)]
struct Flight {
    generation: u64,
    in_flight: bool,
    pending: bool,
    rounds: u64,
}

/// How a `schedule` call was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduled {
    /// A round was already running; it will be followed by one more
    Coalesced,
    /// This call drove `rounds` rounds to completion
    Completed { rounds: u32 },
}

#[derive(Debug, Default)]
pub struct SyncScheduler {
    flights: RefCell<HashMap<CollectionId, Flight>>,
}

impl SyncScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn schedule<T: SyncTarget + ?Sized>(&self, target: &T) -> Scheduled {
        let id = target.collection_id();
        {
            let mut flights = self.flights.borrow_mut();
            let flight = flights.entry(id.clone()).or_default();
            if flight.in_flight {
                flight.pending = true;
                debug!("[{}] sync coalesced into trailing round", id);
                return Scheduled::Coalesced;
            }
            flight.in_flight = true;
        }

        let mut rounds = 0;
        loop {
            let generation = self.begin_round(&id);
            rounds += 1;
            debug!("[{}] sync round gen={}", id, generation);

            let round = target.run_round(generation).await;

            if self.is_current(&id, generation) {
                target.commit(generation, round);
            } else {
                warn!("[{}] discarding stale round gen={}", id, generation);
                target.discard(generation, round);
            }

            if !self.take_pending(&id) {
                break;
            }
        }
        Scheduled::Completed { rounds }
    }

    /// Make the generation in flight (if any) stale
    pub fn invalidate(&self, id: &CollectionId) {
        let mut flights = self.flights.borrow_mut();
        let flight = flights.entry(id.clone()).or_default();
        flight.generation += 1;
        debug!("[{}] generation invalidated -> {}", id, flight.generation);
    }

    pub fn is_current(&self, id: &CollectionId, generation: u64) -> bool {
        self.flights
            .borrow()
            .get(id)
            .is_some_and(|flight| flight.generation == generation)
    }

    pub fn in_flight(&self, id: &CollectionId) -> bool {
        self.flights.borrow().get(id).is_some_and(|flight| flight.in_flight)
    }

    pub fn is_pending(&self, id: &CollectionId) -> bool {
        self.flights.borrow().get(id).is_some_and(|flight| flight.pending)
    }

    pub fn generation(&self, id: &CollectionId) -> u64 {
        self.flights.borrow().get(id).map_or(0, |flight| flight.generation)
    }

    /// Rounds started so far for `id`
    pub fn rounds(&self, id: &CollectionId) -> u64 {
        self.flights.borrow().get(id).map_or(0, |flight| flight.rounds)
    }

    fn begin_round(&self, id: &CollectionId) -> u64 {
        let mut flights = self.flights.borrow_mut();
        let flight = flights.entry(id.clone()).or_default();
        flight.generation += 1;
        flight.rounds += 1;
        flight.generation
    }

    /// Clears `pending` and reports whether a trailing round is due; marks
    /// the collection idle otherwise
    fn take_pending(&self, id: &CollectionId) -> bool {
        let mut flights = self.flights.borrow_mut();
        let flight = flights.entry(id.clone()).or_default();
        if flight.pending {
            flight.pending = false;
            true
        } else {
            flight.in_flight = false;
            false
        }
    }
}
