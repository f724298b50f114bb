use crate::survey::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "surveyName")]
    pub survey_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "includePreferences")]
    pub include_preferences: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub survey: String,
    #[serde(rename = "teamSize")]
    pub team_size: u32,
    pub participants: usize,
    pub ratings: usize,
    #[serde(rename = "matchingStrategy")]
    pub matching_strategy: String,
    #[serde(rename = "rankingRule")]
    pub ranking_rule: String,
    #[serde(rename = "defaultRating")]
    pub default_rating: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveySource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "raterColumn")]
    pub rater_column: Option<String>,
    #[serde(rename = "ratingColumnMarker")]
    pub rating_column_marker: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl SurveySource {
    pub fn rater_column(&self) -> String {
        self.rater_column
            .clone()
            .unwrap_or_else(|| DEFAULT_RATER_COLUMN.to_string())
    }

    pub fn rating_column_marker(&self) -> String {
        self.rating_column_marker
            .clone()
            .unwrap_or_else(|| DEFAULT_RATING_MARKER.to_string())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct SurveyRules {
    #[serde(rename = "teamSize")]
    pub team_size: Option<JSValue>,
    #[serde(rename = "defaultRating")]
    pub default_rating: Option<JSValue>,
    #[serde(rename = "matchingStrategy")]
    pub matching_strategy: Option<String>,
    #[serde(rename = "rankingRule")]
    pub ranking_rule: Option<String>,
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: Option<String>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<String>,
    #[serde(rename = "maxIterations")]
    pub max_iterations: Option<JSValue>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "surveySources")]
    pub survey_sources: Vec<SurveySource>,
    /// The full list of participants. When missing, it is read from the survey.
    pub participants: Option<Vec<String>>,
    #[serde(default)]
    pub rules: SurveyRules,
}

pub fn read_config(path: &str) -> BSurveyResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SurveyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> BSurveyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

pub fn validate_rules(rules: &SurveyRules) -> SurveyResult<TeamRules> {
    let defaults = TeamRules::DEFAULT_RULES;
    let res = TeamRules {
        team_size: match &rules.team_size {
            None => defaults.team_size,
            x => u32::try_from(read_js_int(x)?)
                .ok()
                .context(ParsingJsonNumberSnafu {})?,
        },
        default_rating: match &rules.default_rating {
            None => defaults.default_rating,
            x => read_js_rating(x)?,
        },
        matching_strategy: match rules.matching_strategy.as_deref() {
            None => defaults.matching_strategy,
            Some("anchorLed") => MatchingStrategy::AnchorLed,
            Some("proposerLed") => MatchingStrategy::ProposerLed,
            Some(x) => whatever!("Unknown matching strategy {:?}", x),
        },
        ranking_rule: match rules.ranking_rule.as_deref() {
            None => defaults.ranking_rule,
            Some("mutualAverage") => RankingRule::MutualAverage,
            Some("opinionAndReputation") => RankingRule::OpinionAndReputation,
            Some(x) => whatever!("Unknown ranking rule {:?}", x),
        },
        tiebreak_mode: match rules.tiebreak_mode.as_deref() {
            None | Some("useDeclarationOrder") => TieBreakMode::UseDeclarationOrder,
            Some("hashed") => {
                let seed = match rules.random_seed.clone().map(|s| s.parse::<u32>()) {
                    Some(Ok(x)) => x,
                    x => {
                        whatever!("Cannot use tiebreak mode hashed with seed {:?}", x)
                    }
                };
                TieBreakMode::Hashed(seed)
            }
            Some(x) => whatever!("Unknown tiebreak mode {:?}", x),
        },
        max_iterations: match &rules.max_iterations {
            None => None,
            x => Some(read_js_int(x)?),
        },
    };
    Ok(res)
}

fn read_js_int(x: &Option<JSValue>) -> SurveyResult<u64> {
    match x {
        Some(JSValue::Number(n)) => n.as_u64().context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s.parse::<u64>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}

// A number, or one of the two usual defaults by name.
fn read_js_rating(x: &Option<JSValue>) -> SurveyResult<f64> {
    match x {
        Some(JSValue::Number(n)) => n.as_f64().context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) if s == "neutral" => Ok(NEUTRAL_RATING),
        Some(JSValue::String(s)) if s == "favorable" => Ok(FAVORABLE_RATING),
        Some(JSValue::String(s)) => s
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}
