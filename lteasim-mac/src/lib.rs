//! MAC-layer resource scheduling and HARQ retransmission engine.
//!
//! The crate models the per-TTI downlink scheduling loop of an LTE-style
//! base station: a PRB resource tracker, link adaptation against a
//! static MCS table, pluggable new-data strategies (round robin,
//! proportional fair, persistent interval placement), and a HARQ
//! subsystem with chase combining and deferred ACK/NACK feedback.
//!
//! The physical layer, the higher-layer queues and the error models are
//! consumed through the narrow traits in [`models`]; reference
//! implementations make the crate runnable stand-alone.

pub mod error;
pub mod event;
pub mod grant;
pub mod harq;
pub mod la;
pub mod mcs;
pub mod models;
pub mod placement;
pub mod prb;
pub mod scheduler;

pub use error::MacError;
pub use event::{EventTimeline, Feedback, FeedbackEvent};
pub use grant::{SchedulingGrant, TransportBlock};
pub use harq::{Harq, HarqEntity, ReceivedAttempt};
pub use la::{CandidatePlacement, FreeInterval, LinkAdaptation};
pub use mcs::{McsIndex, Modulation};
pub use placement::TbChoser;
pub use prb::UsersPrbManager;
pub use scheduler::{Scheduler, SchedulingStrategy, TtiResult};
