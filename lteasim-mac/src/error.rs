//! Error types for the MAC subsystem.
//!
//! Only recoverable conditions surface here. Broken invariants (invalid PRB
//! indices, storing into a busy HARQ process, decoding an empty
//! soft-combining buffer) panic instead: they indicate a programming error
//! that must not be papered over.

use thiserror::Error;

/// Recoverable MAC-level errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MacError {
    /// A placement strategy was asked to choose from an empty candidate set.
    #[error("no candidate placements to choose from")]
    NoCandidates,
}
