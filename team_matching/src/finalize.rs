use log::{debug, warn};

use crate::config::{FormedTeam, TeamingErrors};
use crate::matching::Formation;
use crate::ratings::RatingStore;

/// Turns the teams of the matching loop into a partition of the participants.
///
/// Teams are taken in formation order. The first team to claim somebody keeps
/// them: a later team that overlaps an accepted one is dropped as a whole.
/// Everyone left afterwards gets a leftover team of their own, in declaration
/// order.
pub(crate) fn finalize_teams(
    store: &RatingStore,
    formation: &Formation,
) -> Result<Vec<FormedTeam>, TeamingErrors> {
    let mut claimed: Vec<bool> = vec![false; store.len()];
    let mut res: Vec<FormedTeam> = Vec::new();

    for (anchor, members) in formation.teams.iter() {
        if members.is_empty() {
            debug!("finalize_teams: {} hosts nobody", store.name(*anchor));
            continue;
        }
        let mut group = vec![*anchor];
        group.extend(members.iter().cloned());
        if group.iter().any(|p| claimed[p.idx()]) {
            warn!(
                "finalize_teams: dropping the team of {}, some of its members are already placed",
                store.name(*anchor)
            );
            continue;
        }
        for p in group.iter() {
            claimed[p.idx()] = true;
        }
        res.push(FormedTeam {
            id: (res.len() + 1) as u32,
            members: group.iter().map(|p| store.name(*p).to_string()).collect(),
            leftover: false,
        });
    }

    for p in store.ids() {
        if !claimed[p.idx()] {
            debug!("finalize_teams: {} is left over", store.name(p));
            claimed[p.idx()] = true;
            res.push(FormedTeam {
                id: (res.len() + 1) as u32,
                members: vec![store.name(p).to_string()],
                leftover: true,
            });
        }
    }

    let placed: usize = res.iter().map(|t| t.size()).sum();
    if placed != store.len() {
        return Err(TeamingErrors::MalformedInput(format!(
            "{} participants placed in teams, expected {}",
            placed,
            store.len()
        )));
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rating;
    use crate::ParticipantId;

    fn store(xs: &[&str]) -> RatingStore {
        let ps: Vec<String> = xs.iter().map(|s| s.to_string()).collect();
        let ratings: Vec<Rating> = Vec::new();
        RatingStore::new(&ps, &ratings, 3.0).unwrap()
    }

    fn formation(teams: Vec<(u32, Vec<u32>)>) -> Formation {
        Formation {
            teams: teams
                .into_iter()
                .map(|(a, ms)| {
                    (
                        ParticipantId(a),
                        ms.into_iter().map(ParticipantId).collect(),
                    )
                })
                .collect(),
            unmatched: Vec::new(),
            evictions: Vec::new(),
            iterations: 0,
        }
    }

    #[test]
    fn first_claim_wins() {
        let s = store(&["A", "B", "C", "D", "E"]);
        // The second team wants B again and is dropped: C and D end up alone.
        let f = formation(vec![(0, vec![1]), (2, vec![1, 3]), (4, vec![])]);
        let teams = finalize_teams(&s, &f).unwrap();
        let members: Vec<Vec<String>> = teams.iter().map(|t| t.members.clone()).collect();
        assert_eq!(
            members,
            vec![
                vec!["A".to_string(), "B".to_string()],
                vec!["C".to_string()],
                vec!["D".to_string()],
                vec!["E".to_string()],
            ]
        );
        assert_eq!(
            teams.iter().map(|t| t.id).collect::<Vec<u32>>(),
            vec![1, 2, 3, 4]
        );
        assert!(!teams[0].leftover);
        assert!(teams[1..].iter().all(|t| t.leftover));
    }

    #[test]
    fn nobody_matched() {
        let s = store(&["A", "B"]);
        let teams = finalize_teams(&s, &formation(vec![])).unwrap();
        assert_eq!(teams.len(), 2);
        assert!(teams.iter().all(|t| t.leftover && t.size() == 1));
    }
}
