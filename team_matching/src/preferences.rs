use log::debug;

use crate::config::{PreferenceStats, RankingRule, TieBreakMode};
use crate::ratings::RatingStore;
use crate::ParticipantId;

/// For every participant, a total order over all the other participants.
///
/// The lists are built once and then only read. Each list has
/// `len() - 1` entries.
#[derive(Debug, Clone)]
pub struct MutualPreferences {
    // order[p]: the others, most preferred first.
    order: Vec<Vec<ParticipantId>>,
    // rank[p][q]: position of q in order[p]. Unused on the diagonal.
    rank: Vec<Vec<usize>>,
    // key[p][q]: the value used to rank q in order[p].
    key: Vec<Vec<f64>>,
    reputation: Vec<f64>,
}

/// The symmetric desirability of a pair: the average of both directed ratings.
pub fn mutual_score(store: &RatingStore, a: &str, b: &str) -> Result<f64, crate::TeamingErrors> {
    Ok((store.get_score(a, b)? + store.get_score(b, a)?) / 2.0)
}

impl MutualPreferences {
    pub fn build(store: &RatingStore, rule: RankingRule, tiebreak: TieBreakMode) -> MutualPreferences {
        let n = store.len();
        let reputation: Vec<f64> = store.ids().map(|pid| store.reputation(pid)).collect();
        let base = base_order(store, tiebreak);
        debug!(
            "MutualPreferences::build: rule {:?}, base order {:?}",
            rule,
            base.iter().map(|pid| store.name(*pid)).collect::<Vec<&str>>()
        );

        let mut order: Vec<Vec<ParticipantId>> = Vec::with_capacity(n);
        let mut rank: Vec<Vec<usize>> = Vec::with_capacity(n);
        let mut key: Vec<Vec<f64>> = Vec::with_capacity(n);
        for p in store.ids() {
            let keys: Vec<f64> = store
                .ids()
                .map(|q| {
                    if p == q {
                        f64::NEG_INFINITY
                    } else {
                        match rule {
                            RankingRule::MutualAverage => {
                                (store.score(p, q) + store.score(q, p)) / 2.0
                            }
                            RankingRule::OpinionAndReputation => {
                                store.score(p, q) * 10.0 + reputation[q.idx()]
                            }
                        }
                    }
                })
                .collect();

            // The sort is stable: equal keys keep the base order.
            let mut others: Vec<ParticipantId> = base.iter().filter(|q| **q != p).cloned().collect();
            others.sort_by(|a, b| keys[b.idx()].total_cmp(&keys[a.idx()]));

            let mut ranks: Vec<usize> = vec![usize::MAX; n];
            for (pos, q) in others.iter().enumerate() {
                ranks[q.idx()] = pos;
            }
            order.push(others);
            rank.push(ranks);
            key.push(keys);
        }

        MutualPreferences {
            order,
            rank,
            key,
            reputation,
        }
    }

    /// Number of entries in every preference list.
    pub fn list_len(&self) -> usize {
        self.order.len().saturating_sub(1)
    }

    pub(crate) fn order(&self, p: ParticipantId) -> &[ParticipantId] {
        &self.order[p.idx()]
    }

    /// Position of `q` in the preferences of `p`, 0 being the favourite.
    pub(crate) fn rank(&self, p: ParticipantId, q: ParticipantId) -> usize {
        self.rank[p.idx()][q.idx()]
    }

    pub(crate) fn reputation(&self, p: ParticipantId) -> f64 {
        self.reputation[p.idx()]
    }

    /// The diagnostic view of the rankings, in declaration order.
    pub fn stats(&self, store: &RatingStore) -> Vec<PreferenceStats> {
        store
            .ids()
            .map(|p| PreferenceStats {
                name: store.name(p).to_string(),
                reputation: self.reputation[p.idx()],
                ranking: self
                    .order(p)
                    .iter()
                    .map(|q| (store.name(*q).to_string(), self.key[p.idx()][q.idx()]))
                    .collect(),
            })
            .collect()
    }
}

// The order that decides between equal keys. It carries no meaning.
fn base_order(store: &RatingStore, tiebreak: TieBreakMode) -> Vec<ParticipantId> {
    match tiebreak {
        TieBreakMode::UseDeclarationOrder => store.ids().collect(),
        TieBreakMode::Hashed(seed) => {
            let mut data: Vec<(String, ParticipantId)> = store
                .ids()
                .map(|pid| {
                    let key = format!("{:08}{}", seed, store.name(pid));
                    (sha256::digest(key.as_str()), pid)
                })
                .collect();
            data.sort();
            data.into_iter().map(|(_, pid)| pid).collect()
        }
    }
}
