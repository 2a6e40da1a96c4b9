//! Configuration structures for the MAC scheduler simulation.
//!
//! All strategy and policy selection is done through closed enums that
//! deserialize directly from the YAML configuration; there are no
//! string-keyed factories.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::sim_tick::SimulationTimeConfig;

/// HARQ subsystem configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarqConfig {
    /// Number of parallel sender processes per peer (8 for LTE FDD)
    pub num_sender_processes: usize,
    /// Number of parallel receiver processes per peer
    pub num_receiver_processes: usize,
    /// Maximum number of retransmissions before a block is dropped.
    /// The limit counts NACKs only; a retransmission skipped for lack of
    /// PRBs does not consume an attempt.
    pub retransmission_limit: u32,
    /// ACK/NACK decoding delay in TTIs (typically 3)
    pub feedback_decoding_delay_ttis: u64,
}

impl Default for HarqConfig {
    fn default() -> Self {
        Self {
            num_sender_processes: 8,
            num_receiver_processes: 8,
            retransmission_limit: 3,
            feedback_decoding_delay_ttis: 3,
        }
    }
}

/// Candidate search policy for link adaptation over a free interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlacementPolicy {
    /// Grow the candidate payload from the interval start only.
    #[default]
    AtStart,
    /// Repeat the growth search from every offset inside the interval,
    /// yielding one candidate per offset.
    All,
}

/// Link adaptation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkAdaptationConfig {
    /// Margin subtracted from the effective SINR before MCS selection
    pub threshold_db: f64,
    /// Candidate search policy
    #[serde(default)]
    pub policy: PlacementPolicy,
    /// Step down to a more robust MCS when it still fits in the same space
    #[serde(default)]
    pub reduce_mcs: bool,
}

impl Default for LinkAdaptationConfig {
    fn default() -> Self {
        Self {
            threshold_db: 0.0,
            policy: PlacementPolicy::AtStart,
            reduce_mcs: false,
        }
    }
}

/// Transport-block placement strategy selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PlacementKind {
    /// Lowest interval start wins
    First,
    /// Smallest interval wins, tie-break lowest start
    BestFit,
    /// Alias of `BestFit` kept as a distinct selectable strategy
    Smallest,
    /// Largest interval wins, tie-break lowest start
    WorstFit,
    /// Uniform sample over all candidates
    Random,
    /// Re-select the previous winner while it is still offered, otherwise
    /// fall back to the configured strategy
    Previous {
        /// Strategy used when the remembered candidate is gone
        fallback: Box<PlacementKind>,
    },
}

impl Default for PlacementKind {
    fn default() -> Self {
        PlacementKind::BestFit
    }
}

/// Scheduling strategy selection for the new-data phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StrategyKind {
    /// Rotating user queue; each user gets up to `prbs_per_user` PRBs
    /// (0 means all remaining PRBs go to one user per TTI).
    RoundRobin {
        /// PRB cap per scheduled user
        #[serde(default)]
        prbs_per_user: usize,
    },
    /// Per-PRB ranking by expected throughput over smoothed history.
    ProportionalFair {
        /// Exponential smoothing factor, 0 < alpha <= 1
        throughput_smoothing: f64,
        /// Exponent applied to the throughput history in the metric
        history_exponent: f64,
    },
    /// Interval-oriented placement with a transport-block choser.
    Persistent {
        /// Winner selection among candidate intervals
        #[serde(default)]
        placement: PlacementKind,
    },
}

impl Default for StrategyKind {
    fn default() -> Self {
        StrategyKind::RoundRobin { prbs_per_user: 0 }
    }
}

/// MAC layer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacConfig {
    /// Number of PRBs in the downlink spectrum
    pub num_prbs: usize,
    /// Default per-PRB transmit power ceiling in dBm
    pub tx_power_dbm_per_prb: f64,
    /// Number of OFDM symbols occupied by the PDCCH (control overhead)
    pub pdcch_length: usize,
    /// HARQ configuration
    #[serde(default)]
    pub harq: HarqConfig,
    /// Link adaptation configuration
    #[serde(default)]
    pub link_adaptation: LinkAdaptationConfig,
    /// Scheduling strategy
    #[serde(default)]
    pub strategy: StrategyKind,
}

impl Default for MacConfig {
    fn default() -> Self {
        Self {
            num_prbs: 50, // 10 MHz LTE bandwidth
            tx_power_dbm_per_prb: 29.0,
            pdcch_length: 3,
            harq: HarqConfig::default(),
            link_adaptation: LinkAdaptationConfig::default(),
            strategy: StrategyKind::default(),
        }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulation time settings
    #[serde(default)]
    pub time: SimulationTimeConfig,
    /// Number of simulated users attached to the cell
    pub num_users: u32,
    /// Seed for all injected PRNGs
    #[serde(default)]
    pub seed: u64,
    /// MAC configuration
    #[serde(default)]
    pub mac: MacConfig,
}

impl SimulationConfig {
    /// Loads a simulation configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parses a simulation configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        let config: SimulationConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field constraints.
    pub fn validate(&self) -> Result<(), Error> {
        if self.mac.num_prbs == 0 {
            return Err(Error::Config("num_prbs must be positive".into()));
        }
        if self.mac.harq.num_sender_processes == 0 {
            return Err(Error::Config(
                "num_sender_processes must be positive".into(),
            ));
        }
        // Receiver processes are addressed by the sender's process id, so
        // every sender process needs a receiver-side counterpart.
        if self.mac.harq.num_receiver_processes < self.mac.harq.num_sender_processes {
            return Err(Error::Config(
                "num_receiver_processes must be at least num_sender_processes".into(),
            ));
        }
        if let StrategyKind::ProportionalFair {
            throughput_smoothing,
            ..
        } = self.mac.strategy
        {
            if !(throughput_smoothing > 0.0 && throughput_smoothing <= 1.0) {
                return Err(Error::Config(
                    "throughput_smoothing must be in (0, 1]".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let harq = HarqConfig::default();
        assert_eq!(harq.num_sender_processes, 8);
        assert_eq!(harq.retransmission_limit, 3);

        let mac = MacConfig::default();
        assert_eq!(mac.num_prbs, 50);
        assert_eq!(mac.strategy, StrategyKind::RoundRobin { prbs_per_user: 0 });
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r"
num_users: 10
seed: 42
mac:
  num_prbs: 25
  tx_power_dbm_per_prb: 26.0
  pdcch_length: 2
  strategy:
    kind: ProportionalFair
    throughput_smoothing: 0.05
    history_exponent: 1.0
";
        let config = SimulationConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.num_users, 10);
        assert_eq!(config.mac.num_prbs, 25);
        assert_eq!(
            config.mac.strategy,
            StrategyKind::ProportionalFair {
                throughput_smoothing: 0.05,
                history_exponent: 1.0
            }
        );
    }

    #[test]
    fn test_parse_placement() {
        let yaml = r"
num_users: 2
mac:
  num_prbs: 25
  tx_power_dbm_per_prb: 26.0
  pdcch_length: 3
  strategy:
    kind: Persistent
    placement:
      kind: Previous
      fallback:
        kind: Smallest
";
        let config = SimulationConfig::from_yaml(yaml).unwrap();
        match config.mac.strategy {
            StrategyKind::Persistent { placement } => match placement {
                PlacementKind::Previous { fallback } => {
                    assert_eq!(*fallback, PlacementKind::Smallest);
                }
                other => panic!("unexpected placement {other:?}"),
            },
            other => panic!("unexpected strategy {other:?}"),
        }
    }

    #[test]
    fn test_validation_rejects_bad_smoothing() {
        let yaml = r"
num_users: 1
mac:
  num_prbs: 25
  tx_power_dbm_per_prb: 26.0
  pdcch_length: 3
  strategy:
    kind: ProportionalFair
    throughput_smoothing: 1.5
    history_exponent: 1.0
";
        assert!(SimulationConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_validation_rejects_fewer_receiver_processes() {
        let yaml = r"
num_users: 1
mac:
  num_prbs: 25
  tx_power_dbm_per_prb: 26.0
  pdcch_length: 3
  harq:
    num_sender_processes: 8
    num_receiver_processes: 4
    retransmission_limit: 3
    feedback_decoding_delay_ttis: 3
";
        assert!(SimulationConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_validation_rejects_zero_prbs() {
        let yaml = r"
num_users: 1
mac:
  num_prbs: 0
  tx_power_dbm_per_prb: 26.0
  pdcch_length: 3
";
        assert!(SimulationConfig::from_yaml(yaml).is_err());
    }
}
