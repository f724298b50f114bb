/*!
Team formation out of peer-evaluation surveys.

Every participant rates (some of) the people they worked with. The ratings are
turned into a preference ranking per participant, then a Gale-Shapley style
loop groups everyone into teams of a target size. People that cannot be placed
end up in their own leftover team.

```
use team_matching::{run_team_formation, Rating, TeamRules};

let names: Vec<String> = ["Anna", "Bob", "Clara", "Dan"].iter().map(|s| s.to_string()).collect();
let ratings = vec![
    Rating { rater: "Anna".to_string(), ratee: "Bob".to_string(), score: 5.0 },
    Rating { rater: "Clara".to_string(), ratee: "Dan".to_string(), score: 5.0 },
];

let result = run_team_formation(&ratings, &names, &TeamRules::DEFAULT_RULES)?;
for team in result.teams.iter() {
    println!("Team {}: {}", team.id, team.members.join(", "));
}
# Ok::<(), team_matching::TeamingErrors>(())
```
*/

pub mod builder;
mod config;
mod finalize;
pub mod manual;
mod matching;
mod preferences;
mod ratings;

use log::{debug, info};

pub use crate::config::*;
pub use crate::preferences::{mutual_score, MutualPreferences};
pub use crate::ratings::RatingStore;

use crate::finalize::finalize_teams;
use crate::matching::TeamFormationEngine;

// **** Private structures ****

/// Position of a participant in the declaration order.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub(crate) struct ParticipantId(u32);

impl ParticipantId {
    pub(crate) fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Forms the teams for the given survey.
///
/// Arguments:
/// * `ratings` the answers of the survey. Pairs without a rating use the default rating of the rules.
/// * `participants` everyone to place, in declaration order. Every name used in a rating must be declared here.
/// * `rules` the team size and the matching options
pub fn run_team_formation(
    ratings: &[Rating],
    participants: &[String],
    rules: &TeamRules,
) -> Result<TeamingResult, TeamingErrors> {
    info!(
        "Processing {:?} ratings, {:?} participants, rules: {:?}",
        ratings.len(),
        participants.len(),
        rules
    );

    if rules.team_size < 1 {
        return Err(TeamingErrors::InvalidTeamSize(rules.team_size));
    }

    let store = RatingStore::new(participants, ratings, rules.default_rating)?;
    let prefs = MutualPreferences::build(&store, rules.ranking_rule, rules.tiebreak_mode);
    for stats in prefs.stats(&store).iter() {
        debug!(
            "run_team_formation: {}: reputation {:?}, ranking {:?}",
            stats.name, stats.reputation, stats.ranking
        );
    }

    let formation = TeamFormationEngine::new(&store, &prefs, rules).run(rules.matching_strategy)?;
    let teams = finalize_teams(&store, &formation)?;

    for team in teams.iter() {
        if team.leftover {
            info!("Team {}: {} (leftover)", team.id, team.members.join(", "));
        } else {
            info!("Team {}: {}", team.id, team.members.join(", "));
        }
    }

    Ok(TeamingResult {
        teams,
        preferences: prefs.stats(&store),
        unmatched: formation
            .unmatched
            .iter()
            .map(|pid| store.name(*pid).to_string())
            .collect(),
        evictions: formation.evictions,
        iterations: formation.iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn names(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn rating(rater: &str, ratee: &str, score: f64) -> Rating {
        Rating {
            rater: rater.to_string(),
            ratee: ratee.to_string(),
            score,
        }
    }

    fn rules(strategy: MatchingStrategy, ranking: RankingRule, team_size: u32) -> TeamRules {
        TeamRules {
            team_size,
            default_rating: 3.0,
            matching_strategy: strategy,
            ranking_rule: ranking,
            tiebreak_mode: TieBreakMode::UseDeclarationOrder,
            max_iterations: None,
        }
    }

    fn groups(res: &TeamingResult) -> Vec<HashSet<String>> {
        res.teams
            .iter()
            .map(|t| t.members.iter().cloned().collect())
            .collect()
    }

    fn set(xs: &[&str]) -> HashSet<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    // A and B like each other, C and D like each other, everything else is neutral.
    fn two_pairs() -> (Vec<String>, Vec<Rating>) {
        let ratings = vec![
            rating("A", "B", 5.0),
            rating("A", "C", 1.0),
            rating("B", "A", 5.0),
            rating("B", "D", 1.0),
            rating("C", "A", 1.0),
            rating("C", "D", 5.0),
            rating("D", "B", 1.0),
            rating("D", "C", 5.0),
        ];
        (names(&["A", "B", "C", "D"]), ratings)
    }

    // Small deterministic generator, good enough to scramble the ratings.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            self.0 >> 33
        }
    }

    fn random_survey(n: usize, seed: u64) -> (Vec<String>, Vec<Rating>) {
        let mut rng = Lcg(seed);
        let ps: Vec<String> = (0..n).map(|i| format!("P{:02}", i)).collect();
        let mut ratings = Vec::new();
        for a in ps.iter() {
            for b in ps.iter() {
                // Leave about a third of the pairs unrated.
                if a != b && rng.next() % 3 != 0 {
                    ratings.push(rating(a, b, (1 + rng.next() % 5) as f64));
                }
            }
        }
        (ps, ratings)
    }

    #[test]
    fn two_pairs_match_anchor_led() {
        init();
        let (ps, ratings) = two_pairs();
        for ranking in [RankingRule::MutualAverage, RankingRule::OpinionAndReputation] {
            let res = run_team_formation(
                &ratings,
                &ps,
                &rules(MatchingStrategy::AnchorLed, ranking, 2),
            )
            .unwrap();
            assert_eq!(groups(&res), vec![set(&["A", "B"]), set(&["C", "D"])]);
            assert!(res.teams.iter().all(|t| !t.leftover));
        }
    }

    #[test]
    fn two_pairs_match_proposer_led() {
        init();
        let (ps, ratings) = two_pairs();
        let res = run_team_formation(
            &ratings,
            &ps,
            &rules(MatchingStrategy::ProposerLed, RankingRule::MutualAverage, 2),
        )
        .unwrap();
        assert_eq!(groups(&res), vec![set(&["A", "B"]), set(&["C", "D"])]);
        // B hosts the team of A, D hosts the team of C.
        assert_eq!(res.teams[0].members, names(&["B", "A"]));
        assert_eq!(res.teams[1].members, names(&["D", "C"]));
    }

    #[test]
    fn three_people_leave_the_least_liked_alone() {
        init();
        let ps = names(&["A", "B", "C"]);
        let ratings = vec![
            rating("A", "B", 5.0),
            rating("B", "A", 5.0),
            rating("A", "C", 2.0),
            rating("C", "A", 2.0),
            rating("B", "C", 2.0),
            rating("C", "B", 2.0),
        ];
        for strategy in [MatchingStrategy::AnchorLed, MatchingStrategy::ProposerLed] {
            let res = run_team_formation(
                &ratings,
                &ps,
                &rules(strategy, RankingRule::MutualAverage, 2),
            )
            .unwrap();
            assert_eq!(res.teams.len(), 2);
            assert_eq!(groups(&res)[0], set(&["A", "B"]));
            assert_eq!(res.teams[1].members, names(&["C"]));
            assert!(res.teams[1].leftover);
        }
    }

    #[test]
    fn proposer_led_evicts_less_desirable_member() {
        init();
        // Symmetric ratings: B-C 5, A-B 4, A-D 3, C-D 2.5, B-D 1, A-C 1.
        let ps = names(&["A", "B", "C", "D"]);
        let mut ratings = Vec::new();
        for (a, b, s) in [
            ("B", "C", 5.0),
            ("A", "B", 4.0),
            ("A", "D", 3.0),
            ("C", "D", 2.5),
            ("B", "D", 1.0),
            ("A", "C", 1.0),
        ] {
            ratings.push(rating(a, b, s));
            ratings.push(rating(b, a, s));
        }
        let res = run_team_formation(
            &ratings,
            &ps,
            &rules(MatchingStrategy::ProposerLed, RankingRule::MutualAverage, 2),
        )
        .unwrap();
        assert_eq!(
            res.evictions,
            vec![EvictionStats {
                anchor: "B".to_string(),
                evicted: "A".to_string(),
                admitted: "C".to_string(),
                aggregate_before: 5,
                aggregate_after: 6,
            }]
        );
        assert_eq!(res.teams[0].members, names(&["B", "C"]));
        assert_eq!(res.teams[1].members, names(&["A", "D"]));
    }

    #[test]
    fn partition_and_capacity_hold_on_random_surveys() {
        init();
        for n in [1, 2, 5, 7, 12] {
            for team_size in [1, 2, 3, 4] {
                for strategy in [MatchingStrategy::AnchorLed, MatchingStrategy::ProposerLed] {
                    let (ps, ratings) = random_survey(n, (n * 31 + team_size) as u64);
                    let mut r = rules(strategy, RankingRule::OpinionAndReputation, team_size as u32);
                    r.default_rating = NEUTRAL_RATING;
                    let res = run_team_formation(&ratings, &ps, &r).unwrap();

                    let mut seen: Vec<String> = res
                        .teams
                        .iter()
                        .flat_map(|t| t.members.iter().cloned())
                        .collect();
                    seen.sort();
                    assert_eq!(seen, ps, "n={} team_size={} {:?}", n, team_size, strategy);
                    for t in res.teams.iter() {
                        assert!(t.size() <= team_size);
                        if t.leftover {
                            assert_eq!(t.size(), 1);
                        }
                    }
                    for e in res.evictions.iter() {
                        assert!(e.aggregate_after > e.aggregate_before);
                    }
                }
            }
        }
    }

    #[test]
    fn same_input_same_teams() {
        init();
        let (ps, ratings) = random_survey(9, 7);
        for strategy in [MatchingStrategy::AnchorLed, MatchingStrategy::ProposerLed] {
            let mut r = rules(strategy, RankingRule::MutualAverage, 3);
            r.tiebreak_mode = TieBreakMode::Hashed(42);
            let first = run_team_formation(&ratings, &ps, &r).unwrap();
            let second = run_team_formation(&ratings, &ps, &r).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn team_size_one_gives_singletons() {
        let (ps, ratings) = two_pairs();
        let res = run_team_formation(
            &ratings,
            &ps,
            &rules(MatchingStrategy::AnchorLed, RankingRule::MutualAverage, 1),
        )
        .unwrap();
        assert_eq!(res.teams.len(), 4);
        assert_eq!(res.iterations, 0);
        assert!(res.teams.iter().all(|t| t.size() == 1));
    }

    #[test]
    fn empty_survey_gives_no_teams() {
        let res = run_team_formation(&[], &[], &TeamRules::DEFAULT_RULES).unwrap();
        assert!(res.teams.is_empty());
    }

    #[test]
    fn rejects_team_size_zero() {
        let (ps, ratings) = two_pairs();
        let res = run_team_formation(
            &ratings,
            &ps,
            &rules(MatchingStrategy::AnchorLed, RankingRule::MutualAverage, 0),
        );
        assert_eq!(res, Err(TeamingErrors::InvalidTeamSize(0)));
    }

    #[test]
    fn rejects_unknown_participant() {
        let (ps, mut ratings) = two_pairs();
        ratings.push(rating("A", "Zoe", 4.0));
        let res = run_team_formation(&ratings, &ps, &TeamRules::DEFAULT_RULES);
        assert_eq!(
            res,
            Err(TeamingErrors::UnknownParticipant("Zoe".to_string()))
        );
    }

    #[test]
    fn iteration_cap_reports_partial_state() {
        let (ps, ratings) = two_pairs();
        let mut r = rules(MatchingStrategy::ProposerLed, RankingRule::MutualAverage, 2);
        r.max_iterations = Some(1);
        match run_team_formation(&ratings, &ps, &r) {
            Err(TeamingErrors::NonConvergence(partial)) => {
                assert_eq!(partial.iterations, 1);
                assert_eq!(partial.teams, vec![names(&["B", "A"])]);
                assert_eq!(partial.free, names(&["C", "D"]));
            }
            x => panic!("expected a non convergence, got {:?}", x),
        }
    }
}
