//! Per-TTI PRB bookkeeping.
//!
//! The tracker records which PRBs remain allocatable this TTI and which
//! users may still be placed on them, independent of the scheduling
//! strategy in use. Marking a PRB as used deletes it from the map
//! entirely: the frequency slot is occupied for everybody until the next
//! `reset`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use lteasim_common::types::{Power, Prb, UserId};

/// PRB availability and per-user power bookkeeping for one TTI.
#[derive(Debug, Clone)]
pub struct UsersPrbManager {
    num_prbs: usize,
    prbs_and_users: BTreeMap<Prb, BTreeSet<UserId>>,
    active_users: BTreeSet<UserId>,
    default_max_power: Power,
    max_power_per_prb: Vec<Power>,
    per_user_power: HashMap<UserId, Vec<Power>>,
}

impl UsersPrbManager {
    /// Creates a tracker for `num_prbs` PRBs with a uniform power ceiling.
    pub fn new(num_prbs: usize, default_max_power: Power) -> Self {
        let prbs_and_users = (0..num_prbs).map(|prb| (prb, BTreeSet::new())).collect();
        Self {
            num_prbs,
            prbs_and_users,
            active_users: BTreeSet::new(),
            default_max_power,
            max_power_per_prb: vec![default_max_power; num_prbs],
            per_user_power: HashMap::new(),
        }
    }

    /// Number of PRBs managed (used and unused).
    pub fn num_prbs(&self) -> usize {
        self.num_prbs
    }

    /// Restores all bookkeeping for a fresh TTI: every PRB becomes
    /// available again to all currently active users, power vectors return
    /// to the configured default and per-user overrides are dropped.
    pub fn reset(&mut self) {
        self.prbs_and_users = (0..self.num_prbs)
            .map(|prb| (prb, self.active_users.clone()))
            .collect();
        self.max_power_per_prb = vec![self.default_max_power; self.num_prbs];
        self.per_user_power.clear();
    }

    /// Whether `user` is in the active set.
    pub fn is_active(&self, user: UserId) -> bool {
        self.active_users.contains(&user)
    }

    /// The set of active users.
    pub fn active_users(&self) -> BTreeSet<UserId> {
        self.active_users.clone()
    }

    /// The users still permitted on `prb`, or an empty set if the PRB has
    /// been marked used.
    pub fn active_users_on(&self, prb: Prb) -> BTreeSet<UserId> {
        self.prbs_and_users.get(&prb).cloned().unwrap_or_default()
    }

    /// Adds `user` to the active set and to every PRB's eligibility set.
    pub fn add_active_user(&mut self, user: UserId) {
        for users in self.prbs_and_users.values_mut() {
            users.insert(user);
        }
        self.active_users.insert(user);
    }

    /// Removes `user` from every eligibility set and from the active set.
    pub fn remove_active_user(&mut self, user: UserId) {
        for users in self.prbs_and_users.values_mut() {
            users.remove(&user);
        }
        self.active_users.remove(&user);
    }

    /// Intersects `user`'s eligibility with `prbs`. Eligibility only ever
    /// shrinks within a TTI.
    pub fn restrict_user_to_prbs(&mut self, user: UserId, prbs: &BTreeSet<Prb>) {
        for (prb, users) in self.prbs_and_users.iter_mut() {
            if !prbs.contains(prb) {
                users.remove(&user);
            }
        }
    }

    /// Marks `prb` as used: it disappears for all users until `reset`.
    pub fn mark_prb_used(&mut self, prb: Prb) {
        self.prbs_and_users.remove(&prb);
    }

    /// Whether `prb` is still available this TTI.
    pub fn prb_available(&self, prb: Prb) -> bool {
        self.prbs_and_users.contains_key(&prb)
    }

    /// All still-available PRBs, in ascending order.
    pub fn prbs_available(&self) -> Vec<Prb> {
        self.prbs_and_users.keys().copied().collect()
    }

    /// The still-available PRBs `user` is eligible for, in ascending order.
    pub fn prbs_available_for(&self, user: UserId) -> Vec<Prb> {
        self.prbs_and_users
            .iter()
            .filter(|(_, users)| users.contains(&user))
            .map(|(prb, _)| *prb)
            .collect()
    }

    /// Number of still-available PRBs.
    pub fn num_prbs_available(&self) -> usize {
        self.prbs_and_users.len()
    }

    /// Number of still-available PRBs `user` is eligible for.
    pub fn num_prbs_available_for(&self, user: UserId) -> usize {
        self.prbs_and_users
            .values()
            .filter(|users| users.contains(&user))
            .count()
    }

    /// Power ceiling for `user` on `prb`: the per-user override if one was
    /// materialized, else the per-PRB ceiling.
    pub fn available_power(&self, user: UserId, prb: Prb) -> Power {
        assert!(prb < self.num_prbs, "invalid PRB index {prb}");

        match self.per_user_power.get(&user) {
            Some(powers) => powers[prb],
            None => self.max_power_per_prb[prb],
        }
    }

    /// Global power ceiling on `prb`.
    pub fn available_power_on(&self, prb: Prb) -> Power {
        assert!(prb < self.num_prbs, "invalid PRB index {prb}");
        self.max_power_per_prb[prb]
    }

    /// Lowers the global ceiling on `prb`.
    pub fn restrict_power(&mut self, prb: Prb, power: Power) {
        assert!(prb < self.num_prbs, "invalid PRB index {prb}");
        self.max_power_per_prb[prb] = power;
    }

    /// Overrides the ceiling for `user` on `prb`. The first override copies
    /// the current global vector for the user; from then on the user's
    /// vector is independent of the global default.
    pub fn restrict_user_power(&mut self, user: UserId, prb: Prb, power: Power) {
        assert!(prb < self.num_prbs, "invalid PRB index {prb}");

        let powers = self
            .per_user_power
            .entry(user)
            .or_insert_with(|| self.max_power_per_prb.clone());
        powers[prb] = power;
    }
}
