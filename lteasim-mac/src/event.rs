//! Deferred feedback events on the single-threaded simulation timeline.
//!
//! ACK/NACK feedback is not delivered through stored callbacks but as
//! plain event values carrying the minimal payload, posted with the
//! configured decoding delay and collected at the start of each TTI.
//! Once posted an event always fires; there is no cancellation.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use lteasim_common::sim_tick::SimulationTick;
use lteasim_common::types::UserId;

/// ACK or NACK outcome of a decode attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// Transport block decoded successfully
    Ack,
    /// Decode failed; a retransmission is requested
    Nack,
}

/// Feedback addressed to one sender-side HARQ process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackEvent {
    /// Peer whose HARQ entity receives the feedback
    pub user: UserId,
    /// Sender process the feedback belongs to
    pub process_id: usize,
    /// ACK or NACK
    pub feedback: Feedback,
}

#[derive(Debug)]
struct Scheduled {
    due: SimulationTick,
    seq: u64,
    event: FeedbackEvent,
}

// BinaryHeap is a max-heap; reverse the order to pop the earliest event
// first, with the submission sequence breaking ties.
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

/// Event timeline delivering deferred feedback in posting order per tick.
#[derive(Debug, Default)]
pub struct EventTimeline {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl EventTimeline {
    /// Creates an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts an event due at `due`.
    pub fn post(&mut self, event: FeedbackEvent, due: SimulationTick) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled { due, seq, event });
    }

    /// Pops every event due at or before `now`, in delivery order.
    pub fn due_events(&mut self, now: SimulationTick) -> Vec<FeedbackEvent> {
        let mut due = Vec::new();
        while let Some(scheduled) = self.heap.peek() {
            if scheduled.due > now {
                break;
            }
            due.push(self.heap.pop().map(|s| s.event).unwrap());
        }
        due
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if no events are pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
