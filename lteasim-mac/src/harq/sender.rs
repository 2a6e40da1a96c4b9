//! Sender-side HARQ process state machine.

use tracing::{trace, warn};

use crate::grant::TransportBlock;

/// State of a sender process.
///
/// The only reachable transitions are
/// `Idle -> AwaitingFeedback` (new transmission),
/// `AwaitingFeedback -> Idle` (ACK, or NACK past the limit),
/// `AwaitingFeedback -> RetransmissionReady` (NACK within the limit) and
/// `RetransmissionReady -> AwaitingFeedback` (retransmission sent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// No block in flight; the process can accept a new transmission.
    Idle,
    /// A block is in flight and feedback is pending.
    AwaitingFeedback,
    /// The last attempt was NACKed; a retransmission is prepared and
    /// offered exactly once.
    RetransmissionReady,
}

/// What a NACK did to the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NackOutcome {
    /// The NACK answered the first transmission attempt and should be
    /// counted by the entity.
    pub count_nack: bool,
    /// The retransmission limit was exceeded and the block was dropped.
    pub dropped: bool,
}

/// One sender-side HARQ process holding at most one in-flight block.
#[derive(Debug, Clone)]
pub struct HarqSenderProcess {
    process_id: usize,
    retransmission_limit: u32,
    retransmission_counter: u32,
    state: ProcessState,
    block: Option<TransportBlock>,
}

impl HarqSenderProcess {
    pub fn new(process_id: usize, retransmission_limit: u32) -> Self {
        Self {
            process_id,
            retransmission_limit,
            retransmission_counter: 0,
            state: ProcessState::Idle,
            block: None,
        }
    }

    pub fn process_id(&self) -> usize {
        self.process_id
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// NACKs received for the current block.
    pub fn retransmission_counter(&self) -> u32 {
        self.retransmission_counter
    }

    /// Whether the process is idle and can take a new transmission.
    pub fn has_capacity(&self) -> bool {
        self.state == ProcessState::Idle
    }

    /// Whether a prepared retransmission is waiting to be scheduled.
    pub fn has_retransmission(&self) -> bool {
        self.state == ProcessState::RetransmissionReady
    }

    /// Accepts a new transport block. The process stamps its own id, sets
    /// the new-data indicator and starts the attempt counting.
    ///
    /// Panics when the process is not idle: callers must check
    /// `has_capacity` first.
    pub fn new_transmission(&mut self, mut block: TransportBlock) {
        assert!(
            self.has_capacity(),
            "new transmission on busy process {}",
            self.process_id
        );

        block.process_id = self.process_id;
        block.ndi = true;
        block.attempts = 1;
        block.last_attempt = self.retransmission_limit == 0;

        self.retransmission_counter = 0;
        self.block = Some(block);
        self.state = ProcessState::AwaitingFeedback;
        trace!(process_id = self.process_id, "new transmission stored");
    }

    /// Applies an ACK: the block is delivered, the process returns to
    /// idle. Returns true when this answered the first attempt.
    pub fn ack(&mut self) -> bool {
        assert_eq!(
            self.state,
            ProcessState::AwaitingFeedback,
            "ACK outside AwaitingFeedback on process {}",
            self.process_id
        );

        let first_attempt = self.retransmission_counter == 0;
        self.retransmission_counter = 0;
        self.block = None;
        self.state = ProcessState::Idle;
        trace!(process_id = self.process_id, "ACK received");
        first_attempt
    }

    /// Applies a NACK: either prepares a retransmission or, past the
    /// limit, drops the block and frees the process.
    pub fn nack(&mut self) -> NackOutcome {
        assert_eq!(
            self.state,
            ProcessState::AwaitingFeedback,
            "NACK outside AwaitingFeedback on process {}",
            self.process_id
        );

        self.retransmission_counter += 1;

        if self.retransmission_counter > self.retransmission_limit {
            warn!(
                process_id = self.process_id,
                limit = self.retransmission_limit,
                "retransmission limit exceeded, dropping transport block"
            );
            self.retransmission_counter = 0;
            self.block = None;
            self.state = ProcessState::Idle;
            return NackOutcome {
                count_nack: false,
                dropped: true,
            };
        }

        let block = self
            .block
            .as_mut()
            .expect("NACK on process without stored block");
        assert_eq!(
            block.process_id, self.process_id,
            "process id cannot change between retransmissions"
        );

        let count_nack = block.attempts == 1;
        block.ndi = false;
        block.attempts += 1;
        block.last_attempt = block.attempts == self.retransmission_limit + 1;

        self.state = ProcessState::RetransmissionReady;
        trace!(
            process_id = self.process_id,
            attempt = block.attempts,
            last = block.last_attempt,
            "retransmission prepared"
        );
        NackOutcome {
            count_nack,
            dropped: false,
        }
    }

    /// The prepared retransmission.
    ///
    /// Panics unless a retransmission is ready.
    pub fn retransmission(&self) -> &TransportBlock {
        assert!(
            self.has_retransmission(),
            "no retransmission prepared on process {}",
            self.process_id
        );
        self.block.as_ref().unwrap()
    }

    /// Marks the prepared retransmission as sent; the next one is only
    /// offered after the next NACK.
    pub fn retransmission_started(&mut self) {
        assert!(
            self.has_retransmission(),
            "retransmission_started without prepared retransmission on process {}",
            self.process_id
        );
        self.state = ProcessState::AwaitingFeedback;
    }
}
