use log::{debug, info};
use std::collections::{HashSet, VecDeque};

use crate::config::*;
use crate::preferences::MutualPreferences;
use crate::ratings::RatingStore;
use crate::ParticipantId;

/// The outcome of the matching loop, before the final partition.
#[derive(Debug, Clone)]
pub(crate) struct Formation {
    /// Anchor and members, in the order the teams got their first member.
    pub teams: Vec<(ParticipantId, Vec<ParticipantId>)>,
    pub unmatched: Vec<ParticipantId>,
    pub evictions: Vec<EvictionStats>,
    pub iterations: u64,
}

// What happened to a newcomer knocking at a team.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Admission {
    Accepted,
    // The newcomer took the place of this member.
    Evicted(ParticipantId),
    Rejected,
}

/// Runs the matching loop of one survey.
///
/// All the bookkeeping (free pool, teams, consumed pairs) belongs to the
/// engine and lives as long as one run.
pub(crate) struct TeamFormationEngine<'a> {
    store: &'a RatingStore,
    prefs: &'a MutualPreferences,
    // Members per team, anchor excluded.
    capacity: usize,
    max_iterations: u64,
    members: Vec<Vec<ParticipantId>>,
    member_of: Vec<Option<ParticipantId>>,
    formation_order: Vec<ParticipantId>,
    // (from, to) pairs that cannot be tried again.
    consumed: HashSet<(ParticipantId, ParticipantId)>,
    // Participants that ran out of preferences.
    retired: Vec<bool>,
    evictions: Vec<EvictionStats>,
    iterations: u64,
}

impl<'a> TeamFormationEngine<'a> {
    pub fn new(
        store: &'a RatingStore,
        prefs: &'a MutualPreferences,
        rules: &TeamRules,
    ) -> TeamFormationEngine<'a> {
        let n = store.len();
        TeamFormationEngine {
            store,
            prefs,
            capacity: rules.team_size.saturating_sub(1) as usize,
            max_iterations: rules.iteration_cap(n),
            members: vec![Vec::new(); n],
            member_of: vec![None; n],
            formation_order: Vec::new(),
            consumed: HashSet::new(),
            retired: vec![false; n],
            evictions: Vec::new(),
            iterations: 0,
        }
    }

    pub fn run(mut self, strategy: MatchingStrategy) -> Result<Formation, TeamingErrors> {
        info!(
            "Matching {} participants, {} members per anchor, strategy {:?}, at most {} iterations",
            self.store.len(),
            self.capacity,
            strategy,
            self.max_iterations
        );
        // Nobody can join anybody: everyone stays on their own.
        if self.capacity > 0 {
            match strategy {
                MatchingStrategy::ProposerLed => self.run_proposer_led()?,
                MatchingStrategy::AnchorLed => self.run_anchor_led()?,
            }
        }
        info!(
            "Matching done after {} iterations: {} teams, {} evictions",
            self.iterations,
            self.formation_order.len(),
            self.evictions.len()
        );

        let unmatched: Vec<ParticipantId> = self
            .store
            .ids()
            .filter(|p| {
                self.retired[p.idx()]
                    && self.members[p.idx()].is_empty()
                    && self.member_of[p.idx()].is_none()
            })
            .collect();
        Ok(Formation {
            teams: self.teams(),
            unmatched,
            evictions: self.evictions,
            iterations: self.iterations,
        })
    }

    // Free participants propose, in FIFO order, to their favourite anchors.
    fn run_proposer_led(&mut self) -> Result<(), TeamingErrors> {
        let mut queue: VecDeque<ParticipantId> = self.store.ids().collect();
        while queue.len() > 1 {
            self.check_budget(queue.make_contiguous())?;
            let proposer = match queue.pop_front() {
                Some(p) => p,
                None => break,
            };

            // Members are taken, anchors and free participants can still host the proposer.
            let target = self
                .prefs
                .order(proposer)
                .iter()
                .find(|t| {
                    !self.consumed.contains(&(proposer, **t)) && self.member_of[t.idx()].is_none()
                })
                .cloned();

            let target = match target {
                Some(t) => t,
                None => {
                    debug!(
                        "run_proposer_led: {} has nobody left to propose to",
                        self.store.name(proposer)
                    );
                    self.retired[proposer.idx()] = true;
                    continue;
                }
            };

            self.consumed.insert((proposer, target));
            // The target now hosts a team and stops proposing.
            queue.retain(|p| *p != target);

            match self.admit(target, proposer) {
                Admission::Accepted => {}
                Admission::Evicted(victim) => queue.push_back(victim),
                Admission::Rejected => queue.push_back(proposer),
            }
        }
        Ok(())
    }

    // The most reputed open participant hosts a team and pulls its favourites.
    fn run_anchor_led(&mut self) -> Result<(), TeamingErrors> {
        // Reputation first, declaration order on ties.
        let mut by_reputation: Vec<ParticipantId> = self.store.ids().collect();
        by_reputation.sort_by(|a, b| {
            self.prefs
                .reputation(*b)
                .total_cmp(&self.prefs.reputation(*a))
        });
        let mut pool_rank: Vec<usize> = vec![0; self.store.len()];
        for (pos, p) in by_reputation.iter().enumerate() {
            pool_rank[p.idx()] = pos;
        }
        let mut pool: Vec<ParticipantId> = by_reputation;

        loop {
            let open: Vec<ParticipantId> = pool
                .iter()
                .filter(|p| !self.retired[p.idx()] && self.members[p.idx()].len() < self.capacity)
                .cloned()
                .collect();
            if open.len() <= 1 {
                break;
            }
            self.check_budget(&open)?;
            let anchor = open[0];

            // Anchors with members of their own cannot be pulled.
            let candidate = self
                .prefs
                .order(anchor)
                .iter()
                .find(|c| {
                    !self.consumed.contains(&(anchor, **c))
                        && pool.contains(*c)
                        && self.members[c.idx()].is_empty()
                })
                .cloned();

            let candidate = match candidate {
                Some(c) => c,
                None => {
                    debug!(
                        "run_anchor_led: {} has nobody left to pull, closing with {} members",
                        self.store.name(anchor),
                        self.members[anchor.idx()].len()
                    );
                    self.retired[anchor.idx()] = true;
                    continue;
                }
            };

            self.consumed.insert((anchor, candidate));
            self.consumed.insert((candidate, anchor));
            pool.retain(|p| *p != candidate);

            let back = match self.admit(anchor, candidate) {
                Admission::Accepted => None,
                Admission::Evicted(victim) => Some(victim),
                Admission::Rejected => Some(candidate),
            };
            if let Some(p) = back {
                pool.push(p);
                pool.sort_by_key(|p| pool_rank[p.idx()]);
            }
        }
        Ok(())
    }

    /// Adds `newcomer` to the team of `anchor`, enforcing the capacity.
    ///
    /// A full team compares everyone with the desirability score. The least
    /// desirable member leaves only if the newcomer scores strictly higher and
    /// the team as a whole strictly gains. Otherwise the newcomer is rejected.
    ///
    /// The aggregate check is what makes every recorded eviction a strict gain
    /// of the aggregate desirability of the team: a newcomer wanted more than
    /// the victim is still turned away when it wants the others less.
    fn admit(&mut self, anchor: ParticipantId, newcomer: ParticipantId) -> Admission {
        let incumbents = self.members[anchor.idx()].clone();
        if incumbents.len() < self.capacity {
            if incumbents.is_empty() {
                self.formation_order.push(anchor);
            }
            self.members[anchor.idx()].push(newcomer);
            self.member_of[newcomer.idx()] = Some(anchor);
            debug!(
                "admit: {} joined {}",
                self.store.name(newcomer),
                self.store.name(anchor)
            );
            return Admission::Accepted;
        }

        let mut candidates: Vec<ParticipantId> = vec![anchor];
        candidates.extend(incumbents.iter().cloned());
        candidates.push(newcomer);

        let newcomer_score = self.desirability(&candidates, newcomer);
        // On ties, the latest member to join is the one to leave.
        let mut victim: Option<(ParticipantId, u64)> = None;
        for m in incumbents.iter() {
            let s = self.desirability(&candidates, *m);
            match victim {
                Some((_, best)) if s > best => {}
                _ => victim = Some((*m, s)),
            }
        }
        let (victim, victim_score) = match victim {
            Some(v) => v,
            None => return Admission::Rejected,
        };

        let mut before: Vec<ParticipantId> = vec![anchor];
        before.extend(incumbents.iter().cloned());
        let mut after: Vec<ParticipantId> = vec![anchor];
        after.extend(incumbents.iter().filter(|m| **m != victim).cloned());
        after.push(newcomer);
        let aggregate_before = self.aggregate(&before);
        let aggregate_after = self.aggregate(&after);

        debug!(
            "admit: {} knocks at the full team of {}: score {} against {} for {}, aggregate {} -> {}",
            self.store.name(newcomer),
            self.store.name(anchor),
            newcomer_score,
            victim_score,
            self.store.name(victim),
            aggregate_before,
            aggregate_after
        );

        if newcomer_score <= victim_score || aggregate_after <= aggregate_before {
            return Admission::Rejected;
        }

        self.members[anchor.idx()] = after[1..].to_vec();
        self.member_of[victim.idx()] = None;
        self.member_of[newcomer.idx()] = Some(anchor);
        self.evictions.push(EvictionStats {
            anchor: self.store.name(anchor).to_string(),
            evicted: self.store.name(victim).to_string(),
            admitted: self.store.name(newcomer).to_string(),
            aggregate_before,
            aggregate_after,
        });
        info!(
            "{} replaced {} in the team of {}",
            self.store.name(newcomer),
            self.store.name(victim),
            self.store.name(anchor)
        );
        Admission::Evicted(victim)
    }

    /// How much the rest of `team` wants `candidate`: the sum over the others
    /// of the list length minus the rank they give to the candidate.
    fn desirability(&self, team: &[ParticipantId], candidate: ParticipantId) -> u64 {
        let list_len = self.prefs.list_len();
        team.iter()
            .filter(|o| **o != candidate)
            .map(|o| (list_len - self.prefs.rank(*o, candidate)) as u64)
            .sum()
    }

    fn aggregate(&self, team: &[ParticipantId]) -> u64 {
        team.iter().map(|c| self.desirability(team, *c)).sum()
    }

    fn check_budget(&mut self, free: &[ParticipantId]) -> Result<(), TeamingErrors> {
        if self.iterations >= self.max_iterations {
            return Err(TeamingErrors::NonConvergence(PartialAssignment {
                teams: self
                    .teams()
                    .iter()
                    .map(|(anchor, members)| {
                        let mut team = vec![self.store.name(*anchor).to_string()];
                        team.extend(members.iter().map(|m| self.store.name(*m).to_string()));
                        team
                    })
                    .collect(),
                free: free
                    .iter()
                    .map(|p| self.store.name(*p).to_string())
                    .collect(),
                iterations: self.iterations,
            }));
        }
        self.iterations += 1;
        Ok(())
    }

    fn teams(&self) -> Vec<(ParticipantId, Vec<ParticipantId>)> {
        self.formation_order
            .iter()
            .map(|anchor| (*anchor, self.members[anchor.idx()].clone()))
            .collect()
    }
}
