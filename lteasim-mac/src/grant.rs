//! Scheduling grants and transport blocks.
//!
//! A [`TransportBlock`] is the sender-side record stored inside a HARQ
//! process: everything needed to repeat the transmission non-adaptively
//! (same PRB count, same MCS, same size). A [`SchedulingGrant`] is the
//! per-TTI result record handed to the link layer and to telemetry.

use bytes::Bytes;
use lteasim_common::sim_tick::SimulationTick;
use lteasim_common::types::{Bits, Power, Prb, Ratio, UserId};

use crate::mcs::{self, McsIndex, Modulation};

/// Sender-side record of one scheduled transport block.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportBlock {
    /// Destination peer
    pub user: UserId,
    /// Payload carried by the block
    pub payload: Bytes,
    /// Payload size in bits (may be smaller than `block_size`)
    pub payload_bits: Bits,
    /// Physical transport block size in bits
    pub block_size: Bits,
    /// Modulation and coding choice; fixed across retransmissions
    pub mcs: McsIndex,
    /// PRBs the block was originally mapped to
    pub prbs: Vec<Prb>,
    /// Per-PRB transmit power
    pub tx_power: Power,
    /// Effective SINR assumed during link adaptation
    pub estimated_sinr: Ratio,
    /// HARQ process carrying the block; set by `new_transmission`
    pub process_id: usize,
    /// Spatial layer index the block is mapped to
    pub spatial_layer: usize,
    /// Transmission attempts so far (1 on the initial transmission)
    pub attempts: u32,
    /// New-data indicator; cleared once the block becomes a retransmission
    pub ndi: bool,
    /// Whether the next decode failure exhausts the retransmission limit
    pub last_attempt: bool,
}

impl TransportBlock {
    /// Modulation of the block's MCS.
    pub fn modulation(&self) -> Modulation {
        mcs::entry(self.mcs).modulation
    }

    /// Code rate of the block's MCS.
    pub fn code_rate(&self) -> f64 {
        mcs::entry(self.mcs).code_rate
    }
}

/// Per-TTI scheduling decision for one user, consumed by the link layer
/// to build the actual PDUs and by telemetry collectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingGrant {
    /// TTI the grant applies to
    pub tti: SimulationTick,
    /// Scheduled peer
    pub user: UserId,
    /// PRBs assigned this TTI
    pub prbs: Vec<Prb>,
    /// Modulation and coding choice
    pub mcs: McsIndex,
    /// Transport block size in bits
    pub block_size: Bits,
    /// Per-PRB transmit power
    pub tx_power: Power,
    /// HARQ process the block occupies
    pub process_id: usize,
    /// Transmission attempt number (1 = initial transmission)
    pub attempt: u32,
    /// True for an initial transmission, false for a retransmission
    pub new_data: bool,
}

impl SchedulingGrant {
    /// Builds the grant record for a transport block placed on `prbs`.
    pub fn for_block(tti: SimulationTick, block: &TransportBlock, prbs: Vec<Prb>) -> Self {
        Self {
            tti,
            user: block.user,
            prbs,
            mcs: block.mcs,
            block_size: block.block_size,
            tx_power: block.tx_power,
            process_id: block.process_id,
            attempt: block.attempts,
            new_data: block.ndi,
        }
    }
}
