//! Integration test framework for lteasim
//!
//! This crate provides fixtures and utilities for end-to-end testing of
//! the MAC scheduler and the HARQ subsystem.
//!
//! # Test Categories
//!
//! 1. **Closed-loop tests** - schedule, transmit, decode, deliver
//!    deferred feedback, retransmit, drop at the limit
//! 2. **Strategy tests** - round robin, proportional fair and persistent
//!    placement behavior over multiple TTIs
//! 3. **Configuration tests** - YAML-driven simulation runs
#![allow(missing_docs)]

pub mod test_fixtures;
pub mod test_utils;

pub use test_fixtures::{
    assert_prbs_disjoint_per_tti, build_scheduler, run_closed_loop, test_mac_config, TEST_SEED,
};
pub use test_utils::init_test_logging;
