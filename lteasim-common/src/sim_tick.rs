//! Simulation tick for the tick-driven MAC simulation.
//!
//! One tick corresponds to one TTI (Transmission Time Interval). All
//! scheduling, feedback and retransmission activity is driven from a
//! single-threaded loop advancing this tick.

use serde::{Deserialize, Serialize};

/// Simulation tick counter; one tick is one TTI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimulationTick(u64);

impl SimulationTick {
    /// Creates a new simulation tick
    pub fn new(tick: u64) -> Self {
        Self(tick)
    }

    /// Creates the initial tick (tick 0)
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the tick value
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Advances to the next tick
    pub fn next(&mut self) {
        self.0 += 1;
    }

    /// Returns a tick advanced by N ticks without mutating
    pub fn advanced_by(&self, n: u64) -> Self {
        Self(self.0 + n)
    }

    /// Returns true if this is the initial tick
    pub fn is_initial(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for SimulationTick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TTI({})", self.0)
    }
}

impl From<u64> for SimulationTick {
    fn from(tick: u64) -> Self {
        Self::new(tick)
    }
}

impl From<SimulationTick> for u64 {
    fn from(tick: SimulationTick) -> u64 {
        tick.0
    }
}

/// Simulation time configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationTimeConfig {
    /// Duration of each TTI in milliseconds
    pub tti_duration_ms: u64,
    /// Total simulation duration in ticks
    pub total_ticks: u64,
}

impl Default for SimulationTimeConfig {
    fn default() -> Self {
        Self {
            tti_duration_ms: 1, // LTE subframe length
            total_ticks: 1000,
        }
    }
}

/// Simulation clock driving the per-TTI loop.
#[derive(Debug)]
pub struct SimulationClock {
    current_tick: SimulationTick,
    config: SimulationTimeConfig,
}

impl SimulationClock {
    /// Creates a new simulation clock
    pub fn new(config: SimulationTimeConfig) -> Self {
        Self {
            current_tick: SimulationTick::initial(),
            config,
        }
    }

    /// Returns the current tick
    pub fn current_tick(&self) -> SimulationTick {
        self.current_tick
    }

    /// Returns the configuration
    pub fn config(&self) -> &SimulationTimeConfig {
        &self.config
    }

    /// Advances the clock by one tick
    pub fn tick(&mut self) {
        self.current_tick.next();
    }

    /// Returns true if the simulation is complete
    pub fn is_complete(&self) -> bool {
        self.current_tick.value() >= self.config.total_ticks
    }

    /// Resets the clock to initial state
    pub fn reset(&mut self) {
        self.current_tick = SimulationTick::initial();
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(SimulationTimeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_creation() {
        let tick = SimulationTick::new(42);
        assert_eq!(tick.value(), 42);
        assert_eq!(format!("{tick}"), "TTI(42)");
    }

    #[test]
    fn test_tick_advance() {
        let mut tick = SimulationTick::initial();
        assert!(tick.is_initial());
        tick.next();
        assert_eq!(tick.value(), 1);

        let later = tick.advanced_by(3);
        assert_eq!(later.value(), 4);
        assert_eq!(tick.value(), 1); // Original unchanged
    }

    #[test]
    fn test_tick_conversion() {
        let tick: SimulationTick = 100.into();
        assert_eq!(u64::from(tick), 100);
    }

    #[test]
    fn test_time_config_compares_by_value() {
        let config = SimulationTimeConfig {
            tti_duration_ms: 1,
            total_ticks: 5,
        };
        assert_eq!(config, config);
        assert_ne!(config, SimulationTimeConfig::default());
    }

    #[test]
    fn test_clock_completion() {
        let config = SimulationTimeConfig {
            tti_duration_ms: 1,
            total_ticks: 5,
        };
        let mut clock = SimulationClock::new(config);
        assert!(!clock.is_complete());

        for _ in 0..5 {
            clock.tick();
        }
        assert!(clock.is_complete());

        clock.reset();
        assert_eq!(clock.current_tick().value(), 0);
    }
}
