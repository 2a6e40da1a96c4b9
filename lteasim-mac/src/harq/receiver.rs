//! Receiver-side HARQ process with soft-combining buffer.

use lteasim_common::types::Ratio;
use tracing::trace;

use crate::event::Feedback;
use crate::grant::TransportBlock;
use crate::harq::decoder::Decoder;

/// One received transmission attempt: the transport block as transmitted
/// plus the per-PRB SINRs it was actually received with.
#[derive(Debug, Clone)]
pub struct ReceivedAttempt {
    /// The block as transmitted, including attempt counter and NDI flag
    pub block: TransportBlock,
    /// Measured SINR on each of the block's PRBs, same order as
    /// `block.prbs`
    pub sinrs: Vec<Ratio>,
}

/// Receiver process accumulating attempts of the current block until a
/// decode succeeds.
#[derive(Debug, Clone, Default)]
pub struct HarqReceiverProcess {
    process_id: usize,
    buffer: Vec<ReceivedAttempt>,
}

impl HarqReceiverProcess {
    pub fn new(process_id: usize) -> Self {
        Self {
            process_id,
            buffer: Vec::new(),
        }
    }

    pub fn process_id(&self) -> usize {
        self.process_id
    }

    /// Attempts stored for the current block.
    pub fn buffered_attempts(&self) -> usize {
        self.buffer.len()
    }

    /// Receives one attempt and tries to decode the accumulated buffer.
    ///
    /// A set new-data indicator clears the buffer first: whatever was
    /// combined before belonged to a block the sender has given up on.
    pub fn receive_and_decode(
        &mut self,
        attempt: ReceivedAttempt,
        decoder: &mut dyn Decoder,
    ) -> Feedback {
        assert_eq!(
            attempt.block.prbs.len(),
            attempt.sinrs.len(),
            "SINR vector does not match the PRB allocation"
        );

        if attempt.block.ndi {
            self.buffer.clear();
        }
        self.buffer.push(attempt);

        if decoder.can_decode(&self.buffer) {
            trace!(
                process_id = self.process_id,
                attempts = self.buffer.len(),
                "decode succeeded"
            );
            self.buffer.clear();
            Feedback::Ack
        } else {
            trace!(
                process_id = self.process_id,
                attempts = self.buffer.len(),
                "decode failed"
            );
            Feedback::Nack
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use lteasim_common::types::{Power, UserId};

    use crate::mcs::McsIndex;

    struct FixedDecoder(bool);

    impl Decoder for FixedDecoder {
        fn can_decode(&mut self, buffer: &[ReceivedAttempt]) -> bool {
            assert!(!buffer.is_empty(), "decode on empty buffer");
            self.0
        }
    }

    fn attempt(ndi: bool, attempts: u32) -> ReceivedAttempt {
        let block = TransportBlock {
            user: UserId(1),
            payload: Bytes::new(),
            payload_bits: 0,
            block_size: 100,
            mcs: McsIndex(4),
            prbs: vec![3, 4],
            tx_power: Power::from_dbm(29.0),
            estimated_sinr: Ratio::from_db(0.0),
            process_id: 0,
            spatial_layer: 0,
            attempts,
            ndi,
            last_attempt: false,
        };
        ReceivedAttempt {
            sinrs: vec![Ratio::from_db(0.0); block.prbs.len()],
            block,
        }
    }

    #[test]
    fn test_success_clears_buffer() {
        let mut p = HarqReceiverProcess::new(0);
        let feedback = p.receive_and_decode(attempt(true, 1), &mut FixedDecoder(true));
        assert_eq!(feedback, Feedback::Ack);
        assert_eq!(p.buffered_attempts(), 0);
    }

    #[test]
    fn test_failure_keeps_buffer_for_combining() {
        let mut p = HarqReceiverProcess::new(0);
        let mut decoder = FixedDecoder(false);

        assert_eq!(p.receive_and_decode(attempt(true, 1), &mut decoder), Feedback::Nack);
        assert_eq!(p.buffered_attempts(), 1);

        assert_eq!(p.receive_and_decode(attempt(false, 2), &mut decoder), Feedback::Nack);
        assert_eq!(p.buffered_attempts(), 2);
    }

    #[test]
    fn test_new_data_clears_stale_buffer() {
        let mut p = HarqReceiverProcess::new(0);
        let mut failing = FixedDecoder(false);
        p.receive_and_decode(attempt(true, 1), &mut failing);
        p.receive_and_decode(attempt(false, 2), &mut failing);

        // A new block arrives before the old one was ever decoded
        p.receive_and_decode(attempt(true, 1), &mut failing);
        assert_eq!(p.buffered_attempts(), 1);
    }

    #[test]
    #[should_panic(expected = "SINR vector does not match")]
    fn test_mismatched_sinr_vector_panics() {
        let mut p = HarqReceiverProcess::new(0);
        let mut bad = attempt(true, 1);
        bad.sinrs.pop();
        p.receive_and_decode(bad, &mut FixedDecoder(true));
    }
}
