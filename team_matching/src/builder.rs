pub use crate::config::*;

/// A builder for collecting the answers of a survey.
///
/// ```
/// pub use team_matching::builder::Builder;
/// pub use team_matching::TeamRules;
/// # use team_matching::TeamingErrors;
///
/// let mut builder = Builder::new(&TeamRules::DEFAULT_RULES)?
///     .participants(&["Anna".to_string(), "Bob".to_string(), "Clara".to_string()])?;
///
/// builder.add_rating("Anna", "Bob", 5.0)?;
/// builder.add_rating("Bob", "Anna", 4.0)?;
///
/// let result = builder.run()?;
/// assert_eq!(result.teams.len(), 2);
///
/// # Ok::<(), TeamingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: TeamRules,
    pub(crate) _participants: Option<Vec<String>>,
    pub(crate) _ratings: Vec<Rating>,
}

impl Builder {
    pub fn new(rules: &TeamRules) -> Result<Builder, TeamingErrors> {
        if rules.team_size < 1 {
            return Err(TeamingErrors::InvalidTeamSize(rules.team_size));
        }
        Ok(Builder {
            _rules: rules.clone(),
            _participants: None,
            _ratings: Vec::new(),
        })
    }

    /// Declares the participants, in the order used for tie-breaks.
    ///
    /// Ratings added before are kept, and checked against the names.
    pub fn participants(self, names: &[String]) -> Result<Builder, TeamingErrors> {
        for (idx, name) in names.iter().enumerate() {
            if names[..idx].contains(name) {
                return Err(TeamingErrors::MalformedInput(format!(
                    "participant declared twice: {}",
                    name
                )));
            }
        }
        // The ratings added so far must refer to the declared names.
        for r in self._ratings.iter() {
            for name in [&r.rater, &r.ratee] {
                if !names.contains(name) {
                    return Err(TeamingErrors::UnknownParticipant(name.clone()));
                }
            }
        }
        Ok(Builder {
            _rules: self._rules,
            _participants: Some(names.to_vec()),
            _ratings: self._ratings,
        })
    }

    /// Adds the score given by `rater` to `ratee`.
    ///
    /// When the participants were declared, both names must be among them.
    /// Otherwise the participants are collected from the ratings, in order of
    /// first appearance.
    pub fn add_rating(&mut self, rater: &str, ratee: &str, score: f64) -> Result<(), TeamingErrors> {
        if let Some(declared) = self._participants.as_deref() {
            for name in [rater, ratee] {
                if !declared.iter().any(|p| p == name) {
                    return Err(TeamingErrors::UnknownParticipant(name.to_string()));
                }
            }
        }
        if rater == ratee {
            return Err(TeamingErrors::MalformedInput(format!(
                "{} rated themselves",
                rater
            )));
        }
        self._ratings.push(Rating {
            rater: rater.to_string(),
            ratee: ratee.to_string(),
            score,
        });
        Ok(())
    }

    /// Adds all the scores given by `rater`, skipping the missing answers.
    pub fn add_ratings(
        &mut self,
        rater: &str,
        scores: &[(String, Option<f64>)],
    ) -> Result<(), TeamingErrors> {
        for (ratee, score) in scores.iter() {
            if let Some(s) = score {
                self.add_rating(rater, ratee, *s)?;
            }
        }
        Ok(())
    }

    pub fn run(&self) -> Result<TeamingResult, TeamingErrors> {
        let participants: Vec<String> = match self._participants.as_deref() {
            Some(declared) => declared.to_vec(),
            None => {
                let mut seen: Vec<String> = Vec::new();
                for r in self._ratings.iter() {
                    for name in [&r.rater, &r.ratee] {
                        if !seen.contains(name) {
                            seen.push(name.clone());
                        }
                    }
                }
                seen
            }
        };
        crate::run_team_formation(&self._ratings, &participants, &self._rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_participants_from_ratings() {
        let mut builder = Builder::new(&TeamRules::DEFAULT_RULES).unwrap();
        builder.add_rating("Bob", "Anna", 5.0).unwrap();
        builder
            .add_ratings(
                "Clara",
                &[("Dan".to_string(), Some(5.0)), ("Anna".to_string(), None)],
            )
            .unwrap();
        let res = builder.run().unwrap();
        let mut everyone: Vec<String> = res
            .teams
            .iter()
            .flat_map(|t| t.members.iter().cloned())
            .collect();
        everyone.sort();
        assert_eq!(everyone, vec!["Anna", "Bob", "Clara", "Dan"]);
        assert_eq!(res.preferences[0].name, "Bob");
    }

    #[test]
    fn rejects_undeclared_names() {
        let mut builder = Builder::new(&TeamRules::DEFAULT_RULES)
            .unwrap()
            .participants(&["Anna".to_string(), "Bob".to_string()])
            .unwrap();
        assert_eq!(
            builder.add_rating("Anna", "Zed", 3.0),
            Err(TeamingErrors::UnknownParticipant("Zed".to_string()))
        );
        assert!(matches!(
            builder.add_rating("Anna", "Anna", 3.0),
            Err(TeamingErrors::MalformedInput(_))
        ));
    }

    #[test]
    fn keeps_ratings_added_before_the_participants() {
        let mut builder = Builder::new(&TeamRules::DEFAULT_RULES).unwrap();
        builder.add_rating("Anna", "Bob", 5.0).unwrap();
        let builder = builder
            .participants(&["Anna".to_string(), "Bob".to_string(), "Clara".to_string()])
            .unwrap();
        assert_eq!(builder._ratings.len(), 1);
        let res = builder.run().unwrap();
        let anna = &res.preferences[0];
        assert_eq!(anna.name, "Anna");
        assert_eq!(anna.ranking[0].0, "Bob");
        assert!(anna.ranking[0].1 > anna.ranking[1].1);
    }

    #[test]
    fn earlier_ratings_must_use_declared_names() {
        let mut builder = Builder::new(&TeamRules::DEFAULT_RULES).unwrap();
        builder.add_rating("Anna", "Zed", 5.0).unwrap();
        assert!(matches!(
            builder.participants(&["Anna".to_string(), "Bob".to_string()]),
            Err(TeamingErrors::UnknownParticipant(name)) if name == "Zed"
        ));
    }

    #[test]
    fn rejects_team_size_zero() {
        let mut rules = TeamRules::DEFAULT_RULES;
        rules.team_size = 0;
        assert!(matches!(
            Builder::new(&rules),
            Err(TeamingErrors::InvalidTeamSize(0))
        ));
    }
}
