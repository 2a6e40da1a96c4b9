//! Link adaptation.
//!
//! Maps an effective SINR estimate and a candidate PRB interval to a
//! concrete MCS and achievable payload placement. Two search policies
//! exist: `AtStart` grows a payload at the interval's start until the
//! needed transport block fits, `All` repeats that growth search from
//! every offset inside the interval, producing one candidate per offset
//! for the placement strategy to rank.

use lteasim_common::config::{LinkAdaptationConfig, PlacementPolicy};
use lteasim_common::sim_tick::SimulationTick;
use lteasim_common::types::{Bits, Power, Prb, Ratio, UserId};
use tracing::trace;

use crate::mcs::{self, McsIndex, Modulation};
use crate::models::{ChannelStateSource, EffectiveSinrModel};

/// A single-PRB block must leave room for headers, so link adaptation
/// never assigns an MCS below this index to a one-PRB candidate.
const SINGLE_PRB_MCS_FLOOR: McsIndex = McsIndex(2);

/// A maximal run of contiguous free PRBs, as reported by the resource
/// tracker for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeInterval {
    /// First PRB of the run
    pub start: Prb,
    /// Number of contiguous PRBs
    pub length: usize,
}

impl FreeInterval {
    pub fn new(start: Prb, length: usize) -> Self {
        assert!(length > 0, "empty interval");
        Self { start, length }
    }

    /// Splits a sorted PRB list into maximal contiguous runs.
    pub fn from_prbs(prbs: &[Prb]) -> Vec<FreeInterval> {
        let mut intervals = Vec::new();
        let mut iter = prbs.iter().copied();
        let Some(mut start) = iter.next() else {
            return intervals;
        };
        let mut length = 1;
        for prb in iter {
            if prb == start + length {
                length += 1;
            } else {
                intervals.push(FreeInterval::new(start, length));
                start = prb;
                length = 1;
            }
        }
        intervals.push(FreeInterval::new(start, length));
        intervals
    }
}

/// One rankable outcome of the link-adaptation search: a transport block
/// of `tb_length` PRBs placed at `tb_start` inside a free interval, with
/// the MCS, quality estimate and power it was sized for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidatePlacement {
    /// Start of the free interval the candidate lives in
    pub start: Prb,
    /// Length of the free interval
    pub length: usize,
    /// First PRB of the transport block
    pub tb_start: Prb,
    /// Transport block length in PRBs
    pub tb_length: usize,
    /// Selected modulation and coding scheme
    pub mcs: McsIndex,
    /// Effective SINR the MCS choice was based on
    pub estimated_sinr: Ratio,
    /// Per-PRB transmit power
    pub tx_power: Power,
}

impl CandidatePlacement {
    /// The PRBs occupied by the transport block.
    pub fn tb_prbs(&self) -> Vec<Prb> {
        (self.tb_start..self.tb_start + self.tb_length).collect()
    }
}

/// Outcome of probing one (start, length) placement.
#[derive(Debug, Clone, Copy)]
struct CanFitResult {
    sinr: Ratio,
    mcs: McsIndex,
    needed_length: usize,
    fits: bool,
}

/// SINR-threshold link adaptation with interval candidate search.
#[derive(Debug, Clone)]
pub struct LinkAdaptation {
    threshold: Ratio,
    policy: PlacementPolicy,
    reduce_mcs: bool,
    res_per_prb: usize,
}

impl LinkAdaptation {
    /// Creates the link adaptation from its config section. `res_per_prb`
    /// is the usable resource elements per PRB after PDCCH overhead.
    pub fn new(config: &LinkAdaptationConfig, res_per_prb: usize) -> Self {
        Self {
            threshold: Ratio::from_db(config.threshold_db),
            policy: config.policy,
            reduce_mcs: config.reduce_mcs,
            res_per_prb,
        }
    }

    /// Usable resource elements per PRB after control overhead.
    pub fn res_per_prb(&self) -> usize {
        self.res_per_prb
    }

    /// Picks the highest-efficiency MCS for an effective SINR estimate,
    /// backed off by the configured threshold margin.
    pub fn select_mcs(&self, effective_sinr: Ratio) -> McsIndex {
        mcs::best_for_sinr(effective_sinr - self.threshold).index
    }

    /// Adapts one concrete PRB set: aggregates the per-PRB estimates to an
    /// effective SINR and picks the MCS it supports.
    pub fn adapt(
        &self,
        user: UserId,
        prbs: &[Prb],
        channel: &dyn ChannelStateSource,
        eff_model: &dyn EffectiveSinrModel,
        tti: SimulationTick,
    ) -> (McsIndex, Ratio) {
        assert!(!prbs.is_empty(), "link adaptation over empty PRB set");
        let per_prb: Vec<Ratio> = prbs
            .iter()
            .map(|&prb| channel.sinr_estimate(user, prb, tti))
            .collect();

        let coarse = eff_model.effective_sinr(&per_prb, Modulation::Qpsk);
        let coarse_mcs = self.select_mcs(coarse);
        let sinr = eff_model.effective_sinr(&per_prb, mcs::entry(coarse_mcs).modulation);
        (self.select_mcs(sinr), sinr)
    }

    /// Transport block size in bits for `num_prbs` PRBs at `index`.
    pub fn transport_block_size(&self, index: McsIndex, num_prbs: usize) -> Bits {
        mcs::entry(index).transport_block_size(num_prbs, self.res_per_prb)
    }

    /// Number of PRBs needed to carry `pdu_bits` at `index`.
    pub fn prbs_needed(&self, index: McsIndex, pdu_bits: Bits) -> usize {
        mcs::entry(index).prbs_needed(pdu_bits, self.res_per_prb)
    }

    /// Steps down from `current` to the most robust MCS that still packs
    /// `pdu_bits` into the same number of PRBs. Trades coding margin for
    /// nothing but reliability.
    pub fn more_robust_mcs(&self, pdu_bits: Bits, current: McsIndex) -> McsIndex {
        if current.0 == 0 {
            return current;
        }

        let current_prbs = self.prbs_needed(current, pdu_bits);
        let mut chosen = current.0;
        for lower in (1..current.0).rev() {
            if self.prbs_needed(McsIndex(lower), pdu_bits) > current_prbs {
                break;
            }
            chosen = lower;
        }
        McsIndex(chosen)
    }

    /// Probes whether `pdu_bits` fit into `length` PRBs starting at
    /// `start`, at the MCS the estimated effective SINR supports.
    fn can_fit(
        &self,
        user: UserId,
        start: Prb,
        length: usize,
        pdu_bits: Bits,
        channel: &dyn ChannelStateSource,
        eff_model: &dyn EffectiveSinrModel,
        tti: SimulationTick,
    ) -> CanFitResult {
        let prbs: Vec<Prb> = (start..start + length).collect();
        let (mut mcs, sinr) = self.adapt(user, &prbs, channel, eff_model, tti);
        if length == 1 && mcs < SINGLE_PRB_MCS_FLOOR {
            mcs = SINGLE_PRB_MCS_FLOOR;
        }

        let needed_length = self.prbs_needed(mcs, pdu_bits);
        CanFitResult {
            sinr,
            mcs,
            needed_length,
            fits: needed_length <= length,
        }
    }

    /// Grows a payload placement inside `interval` starting at `offset`.
    #[allow(clippy::too_many_arguments)]
    fn grow_from(
        &self,
        interval: &FreeInterval,
        offset: usize,
        user: UserId,
        pdu_bits: Bits,
        tx_power: Power,
        channel: &dyn ChannelStateSource,
        eff_model: &dyn EffectiveSinrModel,
        tti: SimulationTick,
    ) -> Option<CandidatePlacement> {
        let mut test_length = 0;
        let result = loop {
            test_length += 1;
            let result = self.can_fit(
                user,
                interval.start + offset,
                test_length,
                pdu_bits,
                channel,
                eff_model,
                tti,
            );
            if result.fits || test_length + offset >= interval.length {
                break result;
            }
        };

        if !result.fits {
            return None;
        }

        let mcs = if self.reduce_mcs {
            self.more_robust_mcs(pdu_bits, result.mcs)
        } else {
            result.mcs
        };

        let candidate = CandidatePlacement {
            start: interval.start,
            length: interval.length,
            tb_start: interval.start + offset,
            tb_length: result.needed_length,
            mcs,
            estimated_sinr: result.sinr,
            tx_power,
        };
        assert!(candidate.tb_length <= candidate.length, "TB does not fit");
        assert!(candidate.tb_start >= candidate.start, "wrong TB start");
        Some(candidate)
    }

    /// Runs the configured search over every free interval, returning all
    /// candidates the placement strategy may choose from.
    #[allow(clippy::too_many_arguments)]
    pub fn candidates(
        &self,
        intervals: &[FreeInterval],
        user: UserId,
        pdu_bits: Bits,
        tx_power: Power,
        channel: &dyn ChannelStateSource,
        eff_model: &dyn EffectiveSinrModel,
        tti: SimulationTick,
    ) -> Vec<CandidatePlacement> {
        let mut result = Vec::new();
        for interval in intervals {
            let offsets: Vec<usize> = match self.policy {
                PlacementPolicy::AtStart => vec![0],
                PlacementPolicy::All => (0..interval.length).collect(),
            };
            for offset in offsets {
                if let Some(candidate) = self.grow_from(
                    interval, offset, user, pdu_bits, tx_power, channel, eff_model, tti,
                ) {
                    trace!(
                        %user,
                        start = candidate.tb_start,
                        length = candidate.tb_length,
                        mcs = %candidate.mcs,
                        "link adaptation candidate"
                    );
                    result.push(candidate);
                }
            }
        }
        result
    }
}
