//! Transport-block placement strategies.
//!
//! Given the candidate placements produced by link adaptation, each
//! strategy deterministically (or, for `Random`, uniformly) selects the
//! single winning candidate. The set of strategies is closed; selection
//! happens through [`PlacementKind`] in the configuration.

use rand::rngs::StdRng;
use rand::Rng;

use lteasim_common::config::PlacementKind;
use lteasim_common::types::{Prb, UserId};
use std::collections::HashMap;

use crate::error::MacError;
use crate::la::CandidatePlacement;

/// Interval identity remembered by the `Previous` strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RememberedInterval {
    start: Prb,
    length: usize,
}

/// Transport-block choser. Stateless except for the injected RNG and the
/// per-user memory of the `Previous` strategy.
#[derive(Debug)]
pub struct TbChoser {
    kind: PlacementKind,
    rng: StdRng,
    previous: HashMap<UserId, RememberedInterval>,
}

impl TbChoser {
    /// Creates a choser of the configured kind with an injected RNG.
    pub fn new(kind: PlacementKind, rng: StdRng) -> Self {
        Self {
            kind,
            rng,
            previous: HashMap::new(),
        }
    }

    /// Selects the winning candidate for `user`.
    ///
    /// An empty candidate set is an explicit error: callers must only ask
    /// for a choice when link adaptation produced at least one option.
    pub fn choose(
        &mut self,
        user: UserId,
        candidates: &[CandidatePlacement],
    ) -> Result<CandidatePlacement, MacError> {
        if candidates.is_empty() {
            return Err(MacError::NoCandidates);
        }

        let kind = self.kind.clone();
        let chosen = self.choose_by(&kind, user, candidates);
        if matches!(kind, PlacementKind::Previous { .. }) {
            self.previous.insert(
                user,
                RememberedInterval {
                    start: chosen.start,
                    length: chosen.length,
                },
            );
        }
        Ok(chosen)
    }

    fn choose_by(
        &mut self,
        kind: &PlacementKind,
        user: UserId,
        candidates: &[CandidatePlacement],
    ) -> CandidatePlacement {
        match kind {
            PlacementKind::First => *candidates
                .iter()
                .min_by_key(|c| c.start)
                .unwrap(),
            PlacementKind::BestFit | PlacementKind::Smallest => *candidates
                .iter()
                .min_by_key(|c| (c.length, c.start))
                .unwrap(),
            PlacementKind::WorstFit => *candidates
                .iter()
                .max_by_key(|c| (c.length, std::cmp::Reverse(c.start)))
                .unwrap(),
            PlacementKind::Random => candidates[self.rng.gen_range(0..candidates.len())],
            PlacementKind::Previous { fallback } => {
                let remembered = self.previous.get(&user).copied();
                let repeat = remembered.and_then(|prev| {
                    candidates
                        .iter()
                        .find(|c| c.start == prev.start && c.length == prev.length)
                        .copied()
                });
                match repeat {
                    Some(candidate) => candidate,
                    None => self.choose_by(fallback, user, candidates),
                }
            }
        }
    }
}
