//! Modulation and coding scheme tables.
//!
//! A 29-entry MCS table in the style of the LTE downlink tables: each index
//! carries a modulation order, an effective code rate, the resulting
//! spectral efficiency in bits per resource element, and the minimum
//! effective SINR at which the scheme is expected to decode at the target
//! block error rate. Link adaptation picks the highest-efficiency entry
//! whose SINR threshold is met.

use lteasim_common::types::{Bits, Ratio};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource elements per PRB and TTI before control overhead
/// (12 subcarriers x 14 OFDM symbols).
pub const RES_PER_PRB_GROSS: usize = 12 * 14;

/// Returns the usable resource elements per PRB for a given PDCCH length.
pub fn res_per_prb(pdcch_length: usize) -> usize {
    assert!(pdcch_length < 14, "PDCCH cannot occupy the whole subframe");
    12 * (14 - pdcch_length)
}

/// Modulation order of an MCS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modulation {
    /// QPSK, 2 bits per symbol
    Qpsk,
    /// 16-QAM, 4 bits per symbol
    Qam16,
    /// 64-QAM, 6 bits per symbol
    Qam64,
}

impl Modulation {
    /// Bits carried by one modulation symbol.
    pub fn bits_per_symbol(&self) -> u32 {
        match self {
            Modulation::Qpsk => 2,
            Modulation::Qam16 => 4,
            Modulation::Qam64 => 6,
        }
    }
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modulation::Qpsk => write!(f, "QPSK"),
            Modulation::Qam16 => write!(f, "16QAM"),
            Modulation::Qam64 => write!(f, "64QAM"),
        }
    }
}

/// Index into the MCS table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct McsIndex(pub u8);

impl fmt::Display for McsIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MCS{}", self.0)
    }
}

/// One entry of the MCS table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct McsEntry {
    /// Table index
    pub index: McsIndex,
    /// Modulation order
    pub modulation: Modulation,
    /// Effective code rate
    pub code_rate: f64,
    /// Minimum effective SINR in dB for the target block error rate
    pub sinr_threshold_db: f64,
}

impl McsEntry {
    const fn new(index: u8, modulation: Modulation, code_rate: f64, sinr_threshold_db: f64) -> Self {
        Self {
            index: McsIndex(index),
            modulation,
            code_rate,
            sinr_threshold_db,
        }
    }

    /// Spectral efficiency in information bits per resource element.
    pub fn efficiency(&self) -> f64 {
        self.modulation.bits_per_symbol() as f64 * self.code_rate
    }

    /// SINR threshold as a [`Ratio`].
    pub fn sinr_threshold(&self) -> Ratio {
        Ratio::from_db(self.sinr_threshold_db)
    }

    /// Transport block size in bits for an allocation of `num_prbs` PRBs
    /// with `res_per_prb` usable resource elements each.
    pub fn transport_block_size(&self, num_prbs: usize, res_per_prb: usize) -> Bits {
        (self.efficiency() * (num_prbs * res_per_prb) as f64).floor() as Bits
    }

    /// Number of PRBs needed to carry `pdu_bits` at this MCS.
    pub fn prbs_needed(&self, pdu_bits: Bits, res_per_prb: usize) -> usize {
        let bits_per_prb = self.efficiency() * res_per_prb as f64;
        (pdu_bits as f64 / bits_per_prb).ceil() as usize
    }
}

/// The static MCS table, ordered by increasing efficiency and SINR demand.
pub static MCS_TABLE: [McsEntry; 29] = [
    McsEntry::new(0, Modulation::Qpsk, 0.117, -6.5),
    McsEntry::new(1, Modulation::Qpsk, 0.153, -5.4),
    McsEntry::new(2, Modulation::Qpsk, 0.188, -4.3),
    McsEntry::new(3, Modulation::Qpsk, 0.245, -3.2),
    McsEntry::new(4, Modulation::Qpsk, 0.301, -2.1),
    McsEntry::new(5, Modulation::Qpsk, 0.370, -1.0),
    McsEntry::new(6, Modulation::Qpsk, 0.438, 0.1),
    McsEntry::new(7, Modulation::Qpsk, 0.514, 1.2),
    McsEntry::new(8, Modulation::Qpsk, 0.588, 2.3),
    McsEntry::new(9, Modulation::Qpsk, 0.663, 3.4),
    McsEntry::new(10, Modulation::Qam16, 0.332, 4.2),
    McsEntry::new(11, Modulation::Qam16, 0.369, 5.0),
    McsEntry::new(12, Modulation::Qam16, 0.424, 5.9),
    McsEntry::new(13, Modulation::Qam16, 0.479, 6.8),
    McsEntry::new(14, Modulation::Qam16, 0.540, 7.7),
    McsEntry::new(15, Modulation::Qam16, 0.602, 8.6),
    McsEntry::new(16, Modulation::Qam16, 0.643, 9.5),
    McsEntry::new(17, Modulation::Qam64, 0.438, 10.3),
    McsEntry::new(18, Modulation::Qam64, 0.455, 11.1),
    McsEntry::new(19, Modulation::Qam64, 0.505, 12.0),
    McsEntry::new(20, Modulation::Qam64, 0.554, 12.9),
    McsEntry::new(21, Modulation::Qam64, 0.602, 13.8),
    McsEntry::new(22, Modulation::Qam64, 0.650, 14.7),
    McsEntry::new(23, Modulation::Qam64, 0.702, 15.7),
    McsEntry::new(24, Modulation::Qam64, 0.754, 16.7),
    McsEntry::new(25, Modulation::Qam64, 0.803, 17.7),
    McsEntry::new(26, Modulation::Qam64, 0.853, 18.8),
    McsEntry::new(27, Modulation::Qam64, 0.889, 19.9),
    McsEntry::new(28, Modulation::Qam64, 0.926, 21.0),
];

/// Looks up an entry by index.
///
/// Panics on an out-of-range index: MCS indices originate from the table
/// itself, so a bad index is a programming error.
pub fn entry(index: McsIndex) -> &'static McsEntry {
    assert!(
        (index.0 as usize) < MCS_TABLE.len(),
        "invalid MCS index {index}"
    );
    &MCS_TABLE[index.0 as usize]
}

/// Returns the highest-efficiency MCS whose SINR threshold is met.
///
/// Below the lowest threshold the most robust entry is returned; the caller
/// decides whether the resulting transport block is still useful.
pub fn best_for_sinr(sinr: Ratio) -> &'static McsEntry {
    MCS_TABLE
        .iter()
        .rev()
        .find(|entry| sinr.db() >= entry.sinr_threshold_db)
        .unwrap_or(&MCS_TABLE[0])
}
