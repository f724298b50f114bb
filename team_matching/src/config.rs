// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A single answer in a peer-evaluation survey: how `rater` scored `ratee`.
///
/// Ratings are asymmetric. The missing direction of a pair falls back to the
/// default rating of the rules.
#[derive(PartialEq, Debug, Clone)]
pub struct Rating {
    pub rater: String,
    pub ratee: String,
    pub score: f64,
}

// ******** Output data structures *********

/// The ranking of the other participants, as seen by one participant.
#[derive(PartialEq, Debug, Clone)]
pub struct PreferenceStats {
    pub name: String,
    /// Sum of the ratings received, divided by the number of participants.
    pub reputation: f64,
    /// The other participants, most preferred first, with the key used to rank them.
    pub ranking: Vec<(String, f64)>,
}

/// A member that got replaced by a more desirable newcomer.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct EvictionStats {
    pub anchor: String,
    pub evicted: String,
    pub admitted: String,
    /// Aggregate desirability of the team before the newcomer arrived.
    pub aggregate_before: u64,
    /// Aggregate desirability of the team after the eviction.
    pub aggregate_after: u64,
}

/// One group of the final partition.
///
/// The first member is the anchor of the team. Leftover teams are participants
/// that the matching could not place, reported on their own.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FormedTeam {
    pub id: u32,
    pub members: Vec<String>,
    pub leftover: bool,
}

impl FormedTeam {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct TeamingResult {
    pub teams: Vec<FormedTeam>,
    pub preferences: Vec<PreferenceStats>,
    /// Participants that exhausted their preferences without joining a team.
    pub unmatched: Vec<String>,
    pub evictions: Vec<EvictionStats>,
    pub iterations: u64,
}

/// The state of the matching loop when it was stopped.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PartialAssignment {
    /// Anchor first, then the members, in formation order.
    pub teams: Vec<Vec<String>>,
    pub free: Vec<String>,
    pub iterations: u64,
}

/// Errors that prevent the teams from being formed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TeamingErrors {
    UnknownParticipant(String),
    InvalidTeamSize(u32),
    NonConvergence(PartialAssignment),
    MalformedInput(String),
}

impl Error for TeamingErrors {}

impl Display for TeamingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamingErrors::UnknownParticipant(name) => {
                write!(f, "rating refers to an unknown participant: {}", name)
            }
            TeamingErrors::InvalidTeamSize(size) => {
                write!(f, "team size must be at least 1, got {}", size)
            }
            TeamingErrors::NonConvergence(partial) => write!(
                f,
                "matching did not converge after {} iterations ({} teams, {} still free)",
                partial.iterations,
                partial.teams.len(),
                partial.free.len()
            ),
            TeamingErrors::MalformedInput(msg) => write!(f, "malformed input: {}", msg),
        }
    }
}

// ********* Configuration **********

/// Default rating of the reference survey script: no opinion.
pub const NEUTRAL_RATING: f64 = 4.5;
/// Default rating of the later script revision: no opinion, assume favorable.
pub const FAVORABLE_RATING: f64 = 5.0;

/// Who initiates a match.
///
/// - ProposerLed: free participants propose to the teams they like most.
/// Each proposer asks for a single slot and the receiving anchor keeps or
/// evicts members by aggregate desirability.
///
/// - AnchorLed: the most reputed free participant hosts a team and pulls
/// its favourite available participants until the team is full.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MatchingStrategy {
    ProposerLed,
    AnchorLed,
}

/// How a participant ranks the others.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RankingRule {
    /// Average of the two directed ratings of the pair.
    MutualAverage,
    /// Own rating times ten plus the reputation of the ratee.
    OpinionAndReputation,
}

/// Order used to break ties between equally ranked participants.
///
/// The tie-break carries no meaning, it only has to be reproducible.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakMode {
    UseDeclarationOrder,
    // Orders the participants by a SHA-256 digest of the seed and their names.
    Hashed(u32),
}

#[derive(PartialEq, Debug, Clone)]
pub struct TeamRules {
    /// Number of people per team, anchor included.
    pub team_size: u32,
    pub default_rating: f64,
    pub matching_strategy: MatchingStrategy,
    pub ranking_rule: RankingRule,
    pub tiebreak_mode: TieBreakMode,
    /// Hard limit on the iterations of the matching loop. When not provided,
    /// it is derived from the number of participants.
    pub max_iterations: Option<u64>,
}

impl TeamRules {
    pub const DEFAULT_RULES: TeamRules = TeamRules {
        team_size: 2,
        default_rating: NEUTRAL_RATING,
        matching_strategy: MatchingStrategy::AnchorLed,
        ranking_rule: RankingRule::OpinionAndReputation,
        tiebreak_mode: TieBreakMode::UseDeclarationOrder,
        max_iterations: None,
    };

    /// The iteration cap for a given number of participants.
    pub fn iteration_cap(&self, num_participants: usize) -> u64 {
        self.max_iterations.unwrap_or_else(|| {
            let n = num_participants as u64;
            4 * n * n + 16
        })
    }
}
