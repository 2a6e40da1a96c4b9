//! Per-peer HARQ entity owning the sender and receiver process vectors.

use lteasim_common::config::HarqConfig;
use lteasim_common::types::UserId;
use tracing::trace;

use crate::event::Feedback;
use crate::grant::TransportBlock;
use crate::harq::decoder::Decoder;
use crate::harq::receiver::{HarqReceiverProcess, ReceivedAttempt};
use crate::harq::sender::HarqSenderProcess;

/// HARQ state of one peer: parallel sender and receiver processes plus
/// first-attempt ACK/NACK counters and the retransmission round-robin
/// cursor.
#[derive(Debug, Clone)]
pub struct HarqEntity {
    user: UserId,
    sender_processes: Vec<HarqSenderProcess>,
    receiver_processes: Vec<HarqReceiverProcess>,
    acks: u64,
    nacks: u64,
    drops: u64,
    next_process_to_retransmit: usize,
}

impl HarqEntity {
    pub fn new(user: UserId, config: &HarqConfig) -> Self {
        assert!(config.num_sender_processes > 0, "no sender processes");
        // Receiver processes are addressed by the sender's process id
        assert!(
            config.num_receiver_processes >= config.num_sender_processes,
            "fewer receiver than sender processes for {user}"
        );
        Self {
            user,
            sender_processes: (0..config.num_sender_processes)
                .map(|id| HarqSenderProcess::new(id, config.retransmission_limit))
                .collect(),
            receiver_processes: (0..config.num_receiver_processes)
                .map(HarqReceiverProcess::new)
                .collect(),
            acks: 0,
            nacks: 0,
            drops: 0,
            next_process_to_retransmit: 0,
        }
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    /// ACKs received for first transmission attempts.
    pub fn ack_count(&self) -> u64 {
        self.acks
    }

    /// NACKs received for first transmission attempts.
    pub fn nack_count(&self) -> u64 {
        self.nacks
    }

    /// Blocks dropped after exhausting the retransmission limit.
    pub fn drop_count(&self) -> u64 {
        self.drops
    }

    /// Whether any sender process is idle.
    pub fn has_capacity(&self) -> bool {
        self.sender_processes.iter().any(|p| p.has_capacity())
    }

    /// The lowest-numbered idle sender process, if any.
    pub fn free_process(&self) -> Option<usize> {
        self.sender_processes
            .iter()
            .position(|p| p.has_capacity())
    }

    /// Stores a newly scheduled block on the given sender process.
    ///
    /// Panics when the process is busy.
    pub fn store_scheduled_transport_block(&mut self, block: TransportBlock, process_id: usize) {
        assert!(
            process_id < self.sender_processes.len(),
            "invalid sender process id {process_id}"
        );
        self.sender_processes[process_id].new_transmission(block);
    }

    /// Whether any process has a prepared retransmission.
    pub fn has_retransmissions(&self) -> bool {
        self.sender_processes.iter().any(|p| p.has_retransmission())
    }

    /// Ids of all processes with a prepared retransmission, ascending.
    pub fn processes_with_retransmissions(&self) -> Vec<usize> {
        self.sender_processes
            .iter()
            .filter(|p| p.has_retransmission())
            .map(|p| p.process_id())
            .collect()
    }

    /// Picks the next process to retransmit, round robin over the process
    /// vector so that an infrequently scheduled peer does not starve its
    /// higher-numbered processes.
    ///
    /// Panics when no retransmission is pending.
    pub fn process_with_next_retransmission(&mut self) -> usize {
        assert!(
            self.has_retransmissions(),
            "no pending retransmission for {}",
            self.user
        );

        let n = self.sender_processes.len();
        let mut process_id = 0;
        for i in 0..n {
            process_id = (self.next_process_to_retransmit + i) % n;
            if self.sender_processes[process_id].has_retransmission() {
                break;
            }
        }
        self.next_process_to_retransmit = (process_id + 1) % n;
        process_id
    }

    /// The prepared retransmission of `process_id`.
    pub fn retransmission(&self, process_id: usize) -> &TransportBlock {
        self.sender_processes[process_id].retransmission()
    }

    /// Marks the retransmission of `process_id` as sent.
    pub fn retransmission_started(&mut self, process_id: usize) {
        self.sender_processes[process_id].retransmission_started();
    }

    /// Applies delivered feedback to the addressed sender process and
    /// updates the first-attempt counters.
    pub fn apply_feedback(&mut self, process_id: usize, feedback: Feedback) {
        assert!(
            process_id < self.sender_processes.len(),
            "invalid sender process id {process_id}"
        );
        match feedback {
            Feedback::Ack => {
                if self.sender_processes[process_id].ack() {
                    self.acks += 1;
                }
            }
            Feedback::Nack => {
                let outcome = self.sender_processes[process_id].nack();
                if outcome.count_nack {
                    self.nacks += 1;
                }
                if outcome.dropped {
                    self.drops += 1;
                }
            }
        }
        trace!(user = %self.user, process_id, ?feedback, "feedback applied");
    }

    /// Runs the receiver side for one received attempt and returns the
    /// resulting feedback.
    pub fn receive_and_decode(
        &mut self,
        attempt: ReceivedAttempt,
        decoder: &mut dyn Decoder,
    ) -> Feedback {
        let process_id = attempt.block.process_id;
        assert!(
            process_id < self.receiver_processes.len(),
            "invalid receiver process id {process_id}"
        );
        self.receiver_processes[process_id].receive_and_decode(attempt, decoder)
    }
}
