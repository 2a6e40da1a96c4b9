//! Decode models over the soft-combining buffer.

use rand::rngs::StdRng;
use rand::Rng;

use lteasim_common::types::Ratio;
use tracing::trace;

use crate::harq::receiver::ReceivedAttempt;
use crate::mcs;
use crate::models::{BlockErrorModel, EffectiveSinrModel};

/// Decides whether the accumulated attempts of a block decode.
pub trait Decoder {
    /// Returns true when the buffered attempts decode successfully.
    ///
    /// Panics on an empty buffer: a decode is only meaningful after at
    /// least one reception.
    fn can_decode(&mut self, buffer: &[ReceivedAttempt]) -> bool;
}

/// Chase combining: retransmissions carry the identical encoding, so the
/// receiver adds the per-PRB SINRs of all attempts in the linear domain,
/// maps the sum vector to an effective SINR and draws the block error.
pub struct ChaseCombiningDecoder {
    eff_model: Box<dyn EffectiveSinrModel>,
    bler_model: Box<dyn BlockErrorModel>,
    rng: StdRng,
}

impl ChaseCombiningDecoder {
    pub fn new(
        eff_model: Box<dyn EffectiveSinrModel>,
        bler_model: Box<dyn BlockErrorModel>,
        rng: StdRng,
    ) -> Self {
        Self {
            eff_model,
            bler_model,
            rng,
        }
    }
}

impl Decoder for ChaseCombiningDecoder {
    fn can_decode(&mut self, buffer: &[ReceivedAttempt]) -> bool {
        assert!(!buffer.is_empty(), "decode on empty soft-combining buffer");

        let initial = &buffer[0].block;
        let num_prbs = initial.prbs.len();
        let modulation = initial.modulation();
        let entry = mcs::entry(initial.mcs);

        let mut sum_factors = vec![0.0f64; num_prbs];
        for attempt in buffer {
            assert_eq!(
                attempt.block.prbs.len(),
                num_prbs,
                "PRB count cannot change between combined attempts"
            );
            assert_eq!(
                attempt.block.mcs, initial.mcs,
                "MCS cannot change between combined attempts"
            );
            assert_eq!(
                attempt.block.block_size, initial.block_size,
                "block size cannot change between combined attempts"
            );
            for (sum, sinr) in sum_factors.iter_mut().zip(&attempt.sinrs) {
                *sum += sinr.factor();
            }
        }

        let summed: Vec<Ratio> = sum_factors
            .into_iter()
            .map(Ratio::from_factor)
            .collect();
        let effective = self.eff_model.effective_sinr(&summed, modulation);
        let bler = self
            .bler_model
            .block_error_rate(effective, entry, initial.block_size);
        assert!((0.0..=1.0).contains(&bler), "invalid block error rate");

        let draw: f64 = self.rng.gen();
        trace!(
            attempts = buffer.len(),
            effective_sinr = %effective,
            bler,
            "chase combining decode"
        );
        draw >= bler
    }
}
