//! Event reservoir.
//!
//! Holds a uniform sample of at most `capacity` events out of everything added
//! during one harvest cycle, plus the true count of events seen.
//!
//! Admission is A-Res with equal weights: each event draws a random
//! [`Priority`] and the reservoir keeps the `capacity` highest. The current
//! minimum sits at the top of a min-heap, so a full reservoir decides each
//! admission in O(log capacity) without scanning.
//!
//! ## Harvest lifecycle
//!
//! - Producers call [`EventReservoir::add`] as events occur.
//! - At harvest, [`EventReservoir::collect`] renders the payload.
//! - If the send fails, the old reservoir is folded into the next cycle's with
//!   [`EventReservoir::merge_failed`]. After `retry_limit` consecutive failures
//!   the content is dropped instead.
//!
//! The reservoir does no locking. Callers sharing one across threads wrap it in
//! a mutex or keep one per thread and [`merge`](EventReservoir::merge) at
//! harvest time.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use rand::prelude::*;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::event::Event;
use crate::priority::Priority;

/// Consecutive failed harvests after which buffered content is given up.
pub const DEFAULT_FAILED_HARVEST_LIMIT: u32 = 10;

/// Slots reserved up front; larger reservoirs grow as events arrive.
const PREALLOCATED_SLOTS: usize = 1024;

/// An event together with the priority it was admitted with.
#[derive(Debug, Clone)]
struct Sampled<E> {
    priority: Priority,
    event: E,
}

impl<E> PartialEq for Sampled<E> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl<E> Eq for Sampled<E> {}

impl<E> PartialOrd for Sampled<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Sampled<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}

/// Metadata object in the collector payload. Field order is part of the wire format.
#[derive(Serialize)]
struct ReservoirMetadata {
    reservoir_size: usize,
    events_seen: u64,
}

/// What [`EventReservoir::merge_failed`] did with the failed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The batch was merged and will be retried next harvest.
    Merged {
        /// Consecutive failures now carried by the destination.
        failed_harvests: u32,
    },
    /// The batch hit the retry limit and was discarded.
    Dropped {
        /// Events the batch had counted.
        events_seen: u64,
        /// Events the batch was still holding.
        events_saved: usize,
    },
}

impl MergeOutcome {
    /// `true` if the batch was given up.
    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped { .. })
    }
}

/// Bounded uniform sample of telemetry events awaiting harvest.
#[derive(Debug, Clone)]
pub struct EventReservoir<E> {
    capacity: usize,
    seen: u64,
    failed_harvests: u32,
    retry_limit: u32,
    heap: BinaryHeap<Reverse<Sampled<E>>>,
}

impl<E> EventReservoir<E> {
    /// Create an empty reservoir keeping at most `capacity` events.
    ///
    /// A capacity of zero counts every event and keeps none.
    pub fn new(capacity: usize) -> Self {
        Self::with_retry_limit(capacity, DEFAULT_FAILED_HARVEST_LIMIT)
    }

    /// Create an empty reservoir with an explicit failed-harvest limit.
    pub fn with_retry_limit(capacity: usize, retry_limit: u32) -> Self {
        Self {
            capacity,
            seen: 0,
            failed_harvests: 0,
            retry_limit,
            heap: BinaryHeap::with_capacity(capacity.min(PREALLOCATED_SLOTS)),
        }
    }

    /// Add an event, drawing its priority from the thread-local RNG.
    #[inline]
    pub fn add(&mut self, event: E) {
        let mut rng = rand::rng();
        self.add_with_rng(event, &mut rng);
    }

    /// Add an event, using a caller-supplied RNG.
    ///
    /// This exists primarily for deterministic testing/benchmarking.
    #[inline]
    pub fn add_with_rng<R: Rng + ?Sized>(&mut self, event: E, rng: &mut R) {
        self.add_with_priority(Priority::random(rng), event);
    }

    /// Add an event with a priority chosen by the caller.
    ///
    /// Priorities must come from the same distribution as [`Priority::random`]
    /// for the sample to stay uniform.
    pub fn add_with_priority(&mut self, priority: Priority, event: E) {
        self.seen += 1;
        self.admit(Sampled { priority, event });
    }

    /// Offer a candidate for retention without touching the seen count.
    fn admit(&mut self, candidate: Sampled<E>) {
        if self.capacity == 0 {
            return;
        }

        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(candidate));
            return;
        }

        // Full: the candidate only gets in by beating the current minimum.
        if let Some(mut min) = self.heap.peek_mut() {
            if candidate.priority > min.0.priority {
                *min = Reverse(candidate);
            }
        }
    }

    /// Fold `other` into this reservoir.
    ///
    /// Seen counts add exactly. The retained sample becomes the highest
    /// priorities across both reservoirs, up to this reservoir's capacity.
    /// `other`'s capacity and failure count are discarded.
    pub fn merge(&mut self, other: Self) {
        let before = self.heap.len();
        self.seen += other.seen;
        let incoming = other.heap.len();
        for Reverse(candidate) in other.heap.into_vec() {
            self.admit(candidate);
        }
        debug!(
            capacity = self.capacity,
            events_seen = self.seen,
            saved_before = before,
            incoming,
            saved_after = self.heap.len(),
            "merged event reservoir"
        );
    }

    /// Fold the content of a batch whose harvest failed into this reservoir.
    ///
    /// The batch's failure count is bumped. Once it reaches this reservoir's
    /// retry limit the batch is dropped and `self` is left untouched;
    /// otherwise it is merged and its failure count carried over.
    pub fn merge_failed(&mut self, mut other: Self) -> MergeOutcome {
        other.failed_harvests = other.failed_harvests.saturating_add(1);
        if other.failed_harvests >= self.retry_limit {
            warn!(
                failed_harvests = other.failed_harvests,
                retry_limit = self.retry_limit,
                events_seen = other.seen,
                events_saved = other.heap.len(),
                "dropping events after repeated failed harvests"
            );
            return MergeOutcome::Dropped {
                events_seen: other.seen,
                events_saved: other.heap.len(),
            };
        }

        let failed_harvests = other.failed_harvests;
        self.merge(other);
        self.failed_harvests = failed_harvests;
        MergeOutcome::Merged { failed_harvests }
    }

    /// Maximum number of events retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of events added, including ones sampled out.
    pub fn events_seen(&self) -> u64 {
        self.seen
    }

    /// Number of events currently retained.
    pub fn num_saved(&self) -> usize {
        self.heap.len()
    }

    /// `true` if nothing has been added since creation.
    pub fn is_empty(&self) -> bool {
        self.seen == 0
    }

    /// Consecutive failed harvests the current content has survived.
    pub fn failed_harvests(&self) -> u32 {
        self.failed_harvests
    }

    /// Failed-harvest count at which merged-in content is dropped.
    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    /// Retained events, in heap storage order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.heap.iter().map(|Reverse(s)| &s.event)
    }

    /// Priorities of retained events, in the same order as [`iter`](Self::iter).
    pub fn priorities(&self) -> impl Iterator<Item = Priority> + '_ {
        self.heap.iter().map(|Reverse(s)| s.priority)
    }
}

impl<E: Event> EventReservoir<E> {
    /// Render the collector payload for this harvest.
    ///
    /// Returns `Ok(None)` when no event was seen: there is nothing to send.
    /// Otherwise the payload is
    /// `[run_id, {"reservoir_size":N,"events_seen":M}, [event, ...]]`.
    /// The first event that fails to render aborts the whole payload.
    pub fn collect(&self, run_id: &str) -> Result<Option<Vec<u8>>> {
        if self.seen == 0 {
            return Ok(None);
        }

        let mut out = Vec::with_capacity(64 + self.heap.len() * 128);
        out.push(b'[');
        serde_json::to_writer(&mut out, run_id)?;
        out.push(b',');
        serde_json::to_writer(
            &mut out,
            &ReservoirMetadata {
                reservoir_size: self.capacity,
                events_seen: self.seen,
            },
        )?;
        out.extend_from_slice(b",[");
        for (i, Reverse(sampled)) in self.heap.iter().enumerate() {
            if i > 0 {
                out.push(b',');
            }
            sampled.event.write_json(&mut out)?;
        }
        out.extend_from_slice(b"]]");

        trace!(
            events_seen = self.seen,
            events_saved = self.heap.len(),
            bytes = out.len(),
            "collected event payload"
        );
        Ok(Some(out))
    }
}
