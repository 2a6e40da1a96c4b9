//! Core identifier and unit types shared across the lteasim crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// Number of bits, e.g. of a transport block or a queue backlog.
pub type Bits = u32;

/// Physical Resource Block index, the smallest schedulable frequency-domain
/// unit for one TTI. Valid indices lie in `[0, num_prbs)`.
pub type Prb = usize;

/// Opaque peer identity. The scheduler only relies on equality and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UE{}", self.0)
    }
}

/// A dimensionless ratio stored in dB.
///
/// Used for SINR values, link adaptation margins and power offsets.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Ratio(f64);

impl Ratio {
    /// Creates a ratio from a dB value.
    pub fn from_db(db: f64) -> Self {
        Self(db)
    }

    /// Creates a ratio from a linear factor.
    pub fn from_factor(factor: f64) -> Self {
        Self(10.0 * factor.log10())
    }

    /// Returns the ratio in dB.
    pub fn db(&self) -> f64 {
        self.0
    }

    /// Returns the ratio as a linear factor.
    pub fn factor(&self) -> f64 {
        10f64.powf(self.0 / 10.0)
    }
}

impl Add for Ratio {
    type Output = Ratio;

    fn add(self, rhs: Ratio) -> Ratio {
        Ratio(self.0 + rhs.0)
    }
}

impl AddAssign for Ratio {
    fn add_assign(&mut self, rhs: Ratio) {
        self.0 += rhs.0;
    }
}

impl Sub for Ratio {
    type Output = Ratio;

    fn sub(self, rhs: Ratio) -> Ratio {
        Ratio(self.0 - rhs.0)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} dB", self.0)
    }
}

/// Transmit power stored in dBm.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Power(f64);

impl Power {
    /// Creates a power value from dBm.
    pub fn from_dbm(dbm: f64) -> Self {
        Self(dbm)
    }

    /// Creates a power value from milliwatts.
    pub fn from_mw(mw: f64) -> Self {
        Self(10.0 * mw.log10())
    }

    /// Returns the power in dBm.
    pub fn dbm(&self) -> f64 {
        self.0
    }

    /// Returns the power in milliwatts.
    pub fn mw(&self) -> f64 {
        10f64.powf(self.0 / 10.0)
    }

    /// Scales the power by a ratio.
    pub fn scaled_by(&self, ratio: Ratio) -> Power {
        Power(self.0 + ratio.db())
    }

    /// Returns the ratio of this power to another.
    pub fn ratio_to(&self, other: Power) -> Ratio {
        Ratio::from_db(self.0 - other.0)
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} dBm", self.0)
    }
}
