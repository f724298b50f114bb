use log::{debug, warn};
use std::collections::HashMap;

use crate::config::{Rating, TeamingErrors};
use crate::ParticipantId;

/// The raw, asymmetric rating table of a survey.
///
/// Missing ratings are read as the default rating. The table is never
/// modified after construction.
#[derive(Debug, Clone)]
pub struct RatingStore {
    names: Vec<String>,
    ids: HashMap<String, ParticipantId>,
    scores: HashMap<(ParticipantId, ParticipantId), f64>,
    default_rating: f64,
}

impl RatingStore {
    /// Checks the ratings against the declared participants.
    ///
    /// Every name must be declared, and the table must not contain self ratings,
    /// duplicated pairs or non-finite scores.
    pub fn new(
        participants: &[String],
        ratings: &[Rating],
        default_rating: f64,
    ) -> Result<RatingStore, TeamingErrors> {
        if !default_rating.is_finite() {
            return Err(TeamingErrors::MalformedInput(format!(
                "default rating is not a finite number: {}",
                default_rating
            )));
        }

        let mut ids: HashMap<String, ParticipantId> = HashMap::new();
        for (idx, name) in participants.iter().enumerate() {
            if ids.insert(name.clone(), ParticipantId(idx as u32)).is_some() {
                return Err(TeamingErrors::MalformedInput(format!(
                    "participant declared twice: {}",
                    name
                )));
            }
        }

        let lookup = |name: &String| {
            ids.get(name)
                .cloned()
                .ok_or_else(|| TeamingErrors::UnknownParticipant(name.clone()))
        };

        let mut scores: HashMap<(ParticipantId, ParticipantId), f64> = HashMap::new();
        for r in ratings.iter() {
            let rater = lookup(&r.rater)?;
            let ratee = lookup(&r.ratee)?;
            if rater == ratee {
                return Err(TeamingErrors::MalformedInput(format!(
                    "{} rated themselves",
                    r.rater
                )));
            }
            if !r.score.is_finite() {
                return Err(TeamingErrors::MalformedInput(format!(
                    "rating of {} by {} is not a finite number: {}",
                    r.ratee, r.rater, r.score
                )));
            }
            if scores.insert((rater, ratee), r.score).is_some() {
                return Err(TeamingErrors::MalformedInput(format!(
                    "{} rated {} more than once",
                    r.rater, r.ratee
                )));
            }
        }

        let num_pairs = participants.len() * participants.len().saturating_sub(1);
        if scores.len() < num_pairs {
            debug!(
                "RatingStore::new: {} of {} pairs rated, the others default to {}",
                scores.len(),
                num_pairs,
                default_rating
            );
        }
        if !participants.is_empty() && scores.is_empty() {
            warn!("RatingStore::new: no ratings at all, all preferences come from the tiebreak");
        }

        Ok(RatingStore {
            names: participants.to_vec(),
            ids,
            scores,
            default_rating,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Everyone in the survey, in declaration order.
    pub fn all_participants(&self) -> &[String] {
        &self.names
    }

    pub fn default_rating(&self) -> f64 {
        self.default_rating
    }

    /// The score given by `rater` to `ratee`, or the default rating if there is none.
    pub fn get_score(&self, rater: &str, ratee: &str) -> Result<f64, TeamingErrors> {
        let rater_id = self.lookup(rater)?;
        let ratee_id = self.lookup(ratee)?;
        Ok(self.score(rater_id, ratee_id))
    }

    /// Sum of the scores received from every other participant, defaults included.
    pub fn get_ratings_received(&self, ratee: &str) -> Result<f64, TeamingErrors> {
        Ok(self.ratings_received(self.lookup(ratee)?))
    }

    fn lookup(&self, name: &str) -> Result<ParticipantId, TeamingErrors> {
        self.ids
            .get(name)
            .cloned()
            .ok_or_else(|| TeamingErrors::UnknownParticipant(name.to_string()))
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = ParticipantId> {
        (0..self.names.len()).map(|idx| ParticipantId(idx as u32))
    }

    pub(crate) fn name(&self, pid: ParticipantId) -> &str {
        self.names[pid.idx()].as_str()
    }

    pub(crate) fn score(&self, rater: ParticipantId, ratee: ParticipantId) -> f64 {
        self.scores
            .get(&(rater, ratee))
            .cloned()
            .unwrap_or(self.default_rating)
    }

    pub(crate) fn ratings_received(&self, ratee: ParticipantId) -> f64 {
        self.ids()
            .filter(|rater| *rater != ratee)
            .map(|rater| self.score(rater, ratee))
            .sum()
    }

    /// The overall standing of a participant: ratings received over the size of the survey.
    pub(crate) fn reputation(&self, pid: ParticipantId) -> f64 {
        self.ratings_received(pid) / self.names.len() as f64
    }
}
