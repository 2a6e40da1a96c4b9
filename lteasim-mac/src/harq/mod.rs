//! HARQ retransmission subsystem.
//!
//! [`Harq`] is the scheduler-facing registry: it creates one
//! [`HarqEntity`] per peer on first contact, runs the receiver-side
//! decode, and routes the resulting ACK/NACK feedback back to the sender
//! processes through the event timeline after the configured decoding
//! delay.

pub mod decoder;
pub mod entity;
pub mod receiver;
pub mod sender;

use std::collections::BTreeMap;

use lteasim_common::config::HarqConfig;
use lteasim_common::sim_tick::SimulationTick;
use lteasim_common::types::UserId;
use tracing::debug;

pub use decoder::{ChaseCombiningDecoder, Decoder};
pub use entity::HarqEntity;
pub use receiver::{HarqReceiverProcess, ReceivedAttempt};
pub use sender::{HarqSenderProcess, ProcessState};

use crate::event::{EventTimeline, Feedback, FeedbackEvent};
use crate::grant::TransportBlock;

/// Scheduler-facing HARQ collaborator.
pub struct Harq {
    config: HarqConfig,
    entities: BTreeMap<UserId, HarqEntity>,
    timeline: EventTimeline,
    decoder: Box<dyn Decoder>,
}

impl Harq {
    pub fn new(config: HarqConfig, decoder: Box<dyn Decoder>) -> Self {
        Self {
            config,
            entities: BTreeMap::new(),
            timeline: EventTimeline::new(),
            decoder,
        }
    }

    /// Whether an entity exists for `user`.
    pub fn knows_user(&self, user: UserId) -> bool {
        self.entities.contains_key(&user)
    }

    /// The entity for `user`, created lazily on first contact.
    pub fn entity(&mut self, user: UserId) -> &mut HarqEntity {
        let config = &self.config;
        self.entities.entry(user).or_insert_with(|| {
            debug!(%user, "creating HARQ entity");
            HarqEntity::new(user, config)
        })
    }

    /// Whether `user` has an idle sender process. Unknown users trivially
    /// have capacity: their entity will be created on first use.
    pub fn has_free_sender_process(&self, user: UserId) -> bool {
        self.entities
            .get(&user)
            .map_or(true, |e| e.has_capacity())
    }

    /// Stores a newly scheduled block under `process_id` of `user`.
    pub fn store_scheduled_transport_block(
        &mut self,
        user: UserId,
        block: TransportBlock,
        process_id: usize,
    ) {
        self.entity(user)
            .store_scheduled_transport_block(block, process_id);
    }

    /// Users with at least one prepared retransmission, ascending.
    pub fn users_with_retransmissions(&self) -> Vec<UserId> {
        self.entities
            .values()
            .filter(|e| e.has_retransmissions())
            .map(|e| e.user())
            .collect()
    }

    /// Process ids of `user` with prepared retransmissions; empty for an
    /// unknown user.
    pub fn processes_with_retransmissions(&self, user: UserId) -> Vec<usize> {
        self.entities
            .get(&user)
            .map(|e| e.processes_with_retransmissions())
            .unwrap_or_default()
    }

    /// Runs the receiver side for one received attempt, posting the
    /// resulting feedback with the configured decoding delay. Returns
    /// whether the block decoded.
    pub fn receive_and_decode(
        &mut self,
        user: UserId,
        attempt: ReceivedAttempt,
        now: SimulationTick,
    ) -> bool {
        let process_id = attempt.block.process_id;
        let decoder = self.decoder.as_mut();
        let entity = self.entities.entry(user).or_insert_with(|| {
            debug!(%user, "creating HARQ entity");
            HarqEntity::new(user, &self.config)
        });
        let feedback = entity.receive_and_decode(attempt, decoder);

        let delay = self.config.feedback_decoding_delay_ttis;
        if delay == 0 {
            entity.apply_feedback(process_id, feedback);
        } else {
            self.timeline.post(
                FeedbackEvent {
                    user,
                    process_id,
                    feedback,
                },
                now.advanced_by(delay),
            );
        }
        feedback == Feedback::Ack
    }

    /// Delivers all feedback events due at `now` to their sender
    /// processes, in timeline order.
    pub fn deliver_due_feedback(&mut self, now: SimulationTick) {
        for event in self.timeline.due_events(now) {
            let entity = self
                .entities
                .get_mut(&event.user)
                .expect("feedback for unknown user");
            entity.apply_feedback(event.process_id, event.feedback);
        }
    }

    /// Pending feedback events not yet delivered.
    pub fn pending_feedback(&self) -> usize {
        self.timeline.len()
    }

    /// Total first-attempt ACKs over all peers.
    pub fn total_acks(&self) -> u64 {
        self.entities.values().map(|e| e.ack_count()).sum()
    }

    /// Total first-attempt NACKs over all peers.
    pub fn total_nacks(&self) -> u64 {
        self.entities.values().map(|e| e.nack_count()).sum()
    }

    /// Total dropped blocks over all peers.
    pub fn total_drops(&self) -> u64 {
        self.entities.values().map(|e| e.drop_count()).sum()
    }
}
