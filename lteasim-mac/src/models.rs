//! External collaborator interfaces.
//!
//! The scheduler consumes channel quality, decode probability and traffic
//! backlog through these narrow traits; the physical layer and the RLC
//! live behind them. Reference implementations are provided so the crate
//! is runnable and testable on its own.

use std::collections::HashMap;

use bytes::Bytes;
use lteasim_common::sim_tick::SimulationTick;
use lteasim_common::types::{Bits, Ratio, UserId};

use crate::mcs::{McsEntry, Modulation};

/// Aggregates per-PRB quality estimates into one effective SINR for
/// MCS selection.
pub trait EffectiveSinrModel {
    /// Returns the effective SINR over the given per-PRB estimates.
    fn effective_sinr(&self, per_prb: &[Ratio], modulation: Modulation) -> Ratio;
}

/// Maps an effective SINR and a coding choice to a block error probability.
pub trait BlockErrorModel {
    /// Returns the block error rate in `[0, 1]`.
    fn block_error_rate(&self, sinr: Ratio, mcs: &McsEntry, block_size: Bits) -> f64;
}

/// Per-user, per-TTI, per-PRB channel quality estimates.
pub trait ChannelStateSource {
    /// Returns the SINR estimate for `user` on `prb` in the given TTI.
    fn sinr_estimate(&self, user: UserId, prb: usize, tti: SimulationTick) -> Ratio;
}

/// Higher-layer queue feeding the scheduler.
pub trait TrafficQueue {
    /// Bits currently queued for `user`.
    fn bits_queued_for(&self, user: UserId) -> Bits;

    /// Takes up to `max_bits` from the head of `user`'s queue and returns
    /// the segment as (bits taken, payload).
    fn dequeue(&mut self, user: UserId, max_bits: Bits) -> (Bits, Bytes);
}

/// Exponential effective SINR mapping (EESM).
///
/// Stands in for the mutual-information based model of a full
/// link-to-system interface; `beta` tunes the sensitivity to SINR spread.
#[derive(Debug, Clone)]
pub struct ExponentialEffectiveSinr {
    beta: f64,
}

impl ExponentialEffectiveSinr {
    /// Creates the model with the given beta parameter.
    pub fn new(beta: f64) -> Self {
        assert!(beta > 0.0, "beta must be positive");
        Self { beta }
    }
}

impl Default for ExponentialEffectiveSinr {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl EffectiveSinrModel for ExponentialEffectiveSinr {
    fn effective_sinr(&self, per_prb: &[Ratio], _modulation: Modulation) -> Ratio {
        assert!(!per_prb.is_empty(), "effective SINR over empty input");

        let mean = per_prb
            .iter()
            .map(|sinr| (-sinr.factor() / self.beta).exp())
            .sum::<f64>()
            / per_prb.len() as f64;
        Ratio::from_factor(-self.beta * mean.ln())
    }
}

/// Logistic block error rate curve around the MCS SINR threshold.
///
/// Approximates the AWGN BLER lookup tables of a full simulator: 50%
/// error rate at the threshold, falling off with `slope_db`.
#[derive(Debug, Clone)]
pub struct LogisticBlerModel {
    slope_db: f64,
}

impl LogisticBlerModel {
    /// Creates the model with the given transition slope in dB.
    pub fn new(slope_db: f64) -> Self {
        assert!(slope_db > 0.0, "slope must be positive");
        Self { slope_db }
    }
}

impl Default for LogisticBlerModel {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl BlockErrorModel for LogisticBlerModel {
    fn block_error_rate(&self, sinr: Ratio, mcs: &McsEntry, _block_size: Bits) -> f64 {
        let margin_db = sinr.db() - mcs.sinr_threshold_db;
        1.0 / (1.0 + (margin_db / self.slope_db).exp())
    }
}

/// Static per-user channel state for tests and demos.
///
/// Each user has a fixed per-PRB SINR vector; unknown users and PRBs get
/// a configurable default.
#[derive(Debug, Clone, Default)]
pub struct StaticChannelState {
    sinrs: HashMap<UserId, Vec<Ratio>>,
    default: Ratio,
}

impl StaticChannelState {
    /// Creates an empty channel state with the given default SINR.
    pub fn new(default: Ratio) -> Self {
        Self {
            sinrs: HashMap::new(),
            default,
        }
    }

    /// Sets the same SINR on every PRB for `user`.
    pub fn set_flat(&mut self, user: UserId, sinr: Ratio, num_prbs: usize) {
        self.sinrs.insert(user, vec![sinr; num_prbs]);
    }

    /// Sets an explicit per-PRB SINR vector for `user`.
    pub fn set_per_prb(&mut self, user: UserId, sinrs: Vec<Ratio>) {
        self.sinrs.insert(user, sinrs);
    }
}

impl ChannelStateSource for StaticChannelState {
    fn sinr_estimate(&self, user: UserId, prb: usize, _tti: SimulationTick) -> Ratio {
        self.sinrs
            .get(&user)
            .and_then(|v| v.get(prb))
            .copied()
            .unwrap_or(self.default)
    }
}

/// Full-buffer traffic model: every user always has `backlog_bits` queued.
#[derive(Debug, Clone)]
pub struct FullBufferQueue {
    backlog_bits: Bits,
}

impl FullBufferQueue {
    /// Creates the queue with a fixed per-user backlog.
    pub fn new(backlog_bits: Bits) -> Self {
        Self { backlog_bits }
    }
}

impl TrafficQueue for FullBufferQueue {
    fn bits_queued_for(&self, _user: UserId) -> Bits {
        self.backlog_bits
    }

    fn dequeue(&mut self, _user: UserId, max_bits: Bits) -> (Bits, Bytes) {
        let bits = max_bits.min(self.backlog_bits);
        let payload = Bytes::from(vec![0u8; bits.div_ceil(8) as usize]);
        (bits, payload)
    }
}

/// Finite per-user queue for tests: backlog drains as segments are taken.
#[derive(Debug, Clone, Default)]
pub struct FiniteQueue {
    backlog: HashMap<UserId, Bits>,
}

impl FiniteQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `bits` to `user`'s backlog.
    pub fn push(&mut self, user: UserId, bits: Bits) {
        *self.backlog.entry(user).or_insert(0) += bits;
    }
}

impl TrafficQueue for FiniteQueue {
    fn bits_queued_for(&self, user: UserId) -> Bits {
        self.backlog.get(&user).copied().unwrap_or(0)
    }

    fn dequeue(&mut self, user: UserId, max_bits: Bits) -> (Bits, Bytes) {
        let queued = self.backlog.entry(user).or_insert(0);
        let bits = max_bits.min(*queued);
        *queued -= bits;
        let payload = Bytes::from(vec![0u8; bits.div_ceil(8) as usize]);
        (bits, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcs::{self, McsIndex};

    #[test]
    fn test_eesm_flat_input_is_identity() {
        let model = ExponentialEffectiveSinr::default();
        let sinrs = vec![Ratio::from_db(8.0); 5];
        let eff = model.effective_sinr(&sinrs, Modulation::Qpsk);
        assert!((eff.db() - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_eesm_penalizes_spread() {
        let model = ExponentialEffectiveSinr::default();
        let flat = model.effective_sinr(&[Ratio::from_db(8.0); 2], Modulation::Qpsk);
        let spread = model.effective_sinr(
            &[Ratio::from_db(2.0), Ratio::from_db(14.0)],
            Modulation::Qpsk,
        );
        // An uneven channel must not look better than its arithmetic mean
        assert!(spread.db() < flat.db());
    }

    #[test]
    fn test_bler_curve() {
        let model = LogisticBlerModel::default();
        let mcs = mcs::entry(McsIndex(10));

        let at_threshold = model.block_error_rate(mcs.sinr_threshold(), mcs, 1000);
        assert!((at_threshold - 0.5).abs() < 1e-9);

        let well_above = model.block_error_rate(Ratio::from_db(mcs.sinr_threshold_db + 5.0), mcs, 1000);
        assert!(well_above < 1e-3);

        let well_below = model.block_error_rate(Ratio::from_db(mcs.sinr_threshold_db - 5.0), mcs, 1000);
        assert!(well_below > 0.999);
    }

    #[test]
    fn test_static_channel_state() {
        let mut channel = StaticChannelState::new(Ratio::from_db(-10.0));
        channel.set_flat(UserId(1), Ratio::from_db(12.0), 4);

        let tti = SimulationTick::initial();
        assert_eq!(channel.sinr_estimate(UserId(1), 2, tti).db(), 12.0);
        // Unknown PRB and unknown user fall back to the default
        assert_eq!(channel.sinr_estimate(UserId(1), 9, tti).db(), -10.0);
        assert_eq!(channel.sinr_estimate(UserId(2), 0, tti).db(), -10.0);
    }

    #[test]
    fn test_finite_queue_drains() {
        let mut queue = FiniteQueue::new();
        queue.push(UserId(1), 1000);

        let (taken, payload) = queue.dequeue(UserId(1), 600);
        assert_eq!(taken, 600);
        assert_eq!(payload.len(), 75);
        assert_eq!(queue.bits_queued_for(UserId(1)), 400);

        let (taken, _) = queue.dequeue(UserId(1), 600);
        assert_eq!(taken, 400);
        assert_eq!(queue.bits_queued_for(UserId(1)), 0);
    }
}
