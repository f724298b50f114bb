use log::{debug, info, warn};

use snafu::{prelude::*, ErrorCompat, Snafu};

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};

use serde_json::json;
use serde_json::Value as JSValue;
use team_matching::*;
use text_diff::print_diff;

use crate::args::Args;
use crate::survey::config_reader::*;
use crate::survey::io_common::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {name} not found"))]
    MissingWorksheet { name: String },
    #[snafu(display("{path} has {count} worksheets, the worksheet name must be provided"))]
    AmbiguousWorksheet { path: String, count: usize },
    #[snafu(display("No survey data in {path}"))]
    EmptySurvey { path: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a number"))]
    ParsingJsonNumber {},
    #[snafu(display("Could not find the column of the respondents: {column:?}"))]
    MissingRaterColumn { column: String },
    #[snafu(display("Could not find any rating column with the question {marker:?}"))]
    NoRatingColumns { marker: String },
    #[snafu(display("Unknown survey provider {provider:?}"))]
    UnknownProvider { provider: String },
    #[snafu(display("Line {lineno}: unexpected cell {content}"))]
    WrongCellType { lineno: usize, content: String },
    #[snafu(display("Line {lineno}: could not read the score {content:?}"))]
    InvalidScore { lineno: usize, content: String },
    #[snafu(display("The configuration must name exactly one survey source, found {count}"))]
    SurveySourceCount { count: usize },
    #[snafu(display("Missing input: provide a configuration file or an input file"))]
    MissingInput {},
    #[snafu(display("Could not find the parent directory of the configuration"))]
    MissingParentDir {},
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Team formation failed: {source}"))]
    Teaming { source: TeamingErrors },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;
pub type BSurveyResult<T> = Result<T, Box<SurveyError>>;

/// One row of the survey, as parsed by the readers.
/// Self-ratings and repeated answers are handled later.
#[derive(PartialEq, Debug, Clone)]
pub struct ParsedResponse {
    pub lineno: usize,
    pub rater: String,
    pub scores: Vec<(String, Option<f64>)>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ParsedSurvey {
    /// The names of the rating columns, in header order.
    pub ratees: Vec<String>,
    pub responses: Vec<ParsedResponse>,
}

fn read_survey_data(root_path: &Path, source: &SurveySource) -> BSurveyResult<ParsedSurvey> {
    let p: PathBuf = root_path.join(&source.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read survey file {:?}", p2);
    let parsed = match source.provider.as_str() {
        "csv" => io_csv::read_csv_survey(p2, source),
        "xlsx" => io_xlsx::read_xlsx_survey(p2, source),
        x => Err(Box::new(SurveyError::UnknownProvider {
            provider: x.to_string(),
        })),
    }?;
    info!(
        "Read {} responses and {} rating columns",
        parsed.responses.len(),
        parsed.ratees.len()
    );
    Ok(parsed)
}

/// Turns the rows of the survey into the participants and the rating table.
///
/// Without a declared list, the participants are the rated people in column
/// order, then the respondents that nobody could rate. A later answer of the
/// same respondent overwrites the earlier one, blank cells excepted.
fn validate_responses(parsed: &ParsedSurvey, declared: Option<&[String]>) -> (Vec<String>, Vec<Rating>) {
    let participants: Vec<String> = match declared {
        Some(ps) => ps.to_vec(),
        None => {
            let mut ps = parsed.ratees.clone();
            for r in parsed.responses.iter() {
                if !ps.contains(&r.rater) {
                    ps.push(r.rater.clone());
                }
            }
            ps
        }
    };
    let known: HashSet<&String> = participants.iter().collect();

    let mut ratings: Vec<Rating> = Vec::new();
    let mut positions: HashMap<(String, String), usize> = HashMap::new();
    let mut raters: HashSet<String> = HashSet::new();
    for r in parsed.responses.iter() {
        if !known.contains(&r.rater) {
            warn!(
                "validate_responses: line {}: {} is not a participant, skipping",
                r.lineno, r.rater
            );
            continue;
        }
        if !raters.insert(r.rater.clone()) {
            warn!(
                "validate_responses: line {}: {} answered again, overwriting the previous scores",
                r.lineno, r.rater
            );
        }
        for (ratee, score) in r.scores.iter() {
            let score = match score {
                Some(s) => *s,
                None => continue,
            };
            if *ratee == r.rater {
                debug!("validate_responses: line {}: skipping self-rating", r.lineno);
                continue;
            }
            if !known.contains(ratee) {
                warn!(
                    "validate_responses: line {}: {} is not a participant, skipping",
                    r.lineno, ratee
                );
                continue;
            }
            let k = (r.rater.clone(), ratee.clone());
            match positions.get(&k) {
                Some(idx) => ratings[*idx].score = score,
                None => {
                    positions.insert(k, ratings.len());
                    ratings.push(Rating {
                        rater: r.rater.clone(),
                        ratee: ratee.clone(),
                        score,
                    });
                }
            }
        }
    }
    (participants, ratings)
}

fn strategy_name(s: MatchingStrategy) -> &'static str {
    match s {
        MatchingStrategy::AnchorLed => "anchorLed",
        MatchingStrategy::ProposerLed => "proposerLed",
    }
}

fn ranking_name(r: RankingRule) -> &'static str {
    match r {
        RankingRule::MutualAverage => "mutualAverage",
        RankingRule::OpinionAndReputation => "opinionAndReputation",
    }
}

fn build_summary_js(
    config: &SurveyConfig,
    rules: &TeamRules,
    num_ratings: usize,
    res: &TeamingResult,
) -> JSValue {
    let c = OutputConfig {
        survey: config.output_settings.survey_name.clone(),
        team_size: rules.team_size,
        participants: res.teams.iter().map(|t| t.size()).sum(),
        ratings: num_ratings,
        matching_strategy: strategy_name(rules.matching_strategy).to_string(),
        ranking_rule: ranking_name(rules.ranking_rule).to_string(),
        default_rating: rules.default_rating.to_string(),
    };
    let teams: Vec<JSValue> = res
        .teams
        .iter()
        .map(|t| {
            json!({
                "team": t.id,
                "members": t.members,
                "size": t.size(),
                "leftover": t.leftover
            })
        })
        .collect();
    let evictions: Vec<JSValue> = res
        .evictions
        .iter()
        .map(|e| {
            json!({
                "anchor": e.anchor,
                "evicted": e.evicted,
                "admitted": e.admitted,
                "aggregateBefore": e.aggregate_before,
                "aggregateAfter": e.aggregate_after
            })
        })
        .collect();
    let mut js = json!({
        "config": c,
        "teams": teams,
        "unmatched": res.unmatched,
        "evictions": evictions
    });
    if config.output_settings.include_preferences.unwrap_or(false) {
        let prefs: Vec<JSValue> = res
            .preferences
            .iter()
            .map(|p| {
                let ranking: Vec<JSValue> = p
                    .ranking
                    .iter()
                    .map(|(name, score)| json!({"name": name, "score": score}))
                    .collect();
                json!({"name": p.name, "reputation": p.reputation, "ranking": ranking})
            })
            .collect();
        js["preferences"] = json!(prefs);
    }
    js
}

/// The teams, one line each.
pub fn format_teams(teams: &[FormedTeam]) -> Vec<String> {
    teams
        .iter()
        .map(|t| format!("Team {} ({}): {}", t.id, t.size(), t.members.join(", ")))
        .collect()
}

/// Reads the survey, forms the teams, and writes the summary.
///
/// Arguments:
/// * `root` the directory the survey file path is relative to
/// * `out` 'stdout', a file path, or nothing to use the output directory of the configuration
/// * `reference` a summary to compare the outcome with
pub fn run_survey(
    config: &SurveyConfig,
    root: &Path,
    out: Option<String>,
    reference: Option<String>,
) -> BSurveyResult<TeamingResult> {
    info!("config: {:?}", config);
    let rules = validate_rules(&config.rules)?;

    let source = match config.survey_sources.as_slice() {
        [s] => s,
        x => {
            return Err(Box::new(SurveyError::SurveySourceCount { count: x.len() }));
        }
    };
    let parsed = read_survey_data(root, source)?;
    let (participants, ratings) = validate_responses(&parsed, config.participants.as_deref());
    debug!("participants: {:?} ratings: {:?}", participants, ratings);

    let result = run_team_formation(&ratings, &participants, &rules).context(TeamingSnafu {})?;

    for line in format_teams(&result.teams) {
        println!("{}", line);
    }

    // Assemble the final json
    let result_js = build_summary_js(config, &rules, ratings.len(), &result);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    let out_path: Option<String> = match out {
        Some(x) => Some(x),
        None => config.output_settings.output_directory.as_ref().map(|dir| {
            let p: PathBuf = root.join(dir).join(format!(
                "{}_summary.json",
                config.output_settings.survey_name
            ));
            p.display().to_string()
        }),
    };
    match out_path.as_deref() {
        Some("stdout") => println!("{}", pretty_js_stats),
        Some(path) => {
            info!("Writing summary to {}", path);
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).context(WritingSummarySnafu { path })?;
                }
            }
            fs::write(path, &pretty_js_stats).context(WritingSummarySnafu { path })?;
        }
        None => {}
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = reference {
        let summary_ref = read_summary(summary_p.as_str())?;
        debug!("summary: {:?}", summary_ref);
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return Err(Box::new(SurveyError::ReferenceMismatch {}));
        }
    }

    Ok(result)
}

/// A configuration for a survey given only on the command line.
fn config_from_args(args: &Args) -> BSurveyResult<SurveyConfig> {
    let input = args.input.clone().context(MissingInputSnafu {})?;
    Ok(SurveyConfig {
        output_settings: OutputSettings {
            survey_name: simplify_file_name(input.as_str()),
            output_directory: None,
            include_preferences: None,
        },
        survey_sources: vec![SurveySource {
            provider: String::new(),
            file_path: input,
            rater_column: None,
            rating_column_marker: None,
            excel_worksheet_name: None,
        }],
        participants: None,
        rules: SurveyRules::default(),
    })
}

/// Applies the command line on top of the configuration.
fn apply_args(config: &mut SurveyConfig, args: &Args) {
    for source in config.survey_sources.iter_mut() {
        if let Some(input) = args.input.clone() {
            source.file_path = input;
        }
        if let Some(input_type) = args.input_type.clone() {
            source.provider = input_type;
        }
        if source.provider.is_empty() {
            source.provider = if source.file_path.to_lowercase().ends_with(".xlsx") {
                "xlsx".to_string()
            } else {
                "csv".to_string()
            };
        }
        if args.rater_column.is_some() {
            source.rater_column = args.rater_column.clone();
        }
        if args.rating_marker.is_some() {
            source.rating_column_marker = args.rating_marker.clone();
        }
        if args.excel_worksheet_name.is_some() {
            source.excel_worksheet_name = args.excel_worksheet_name.clone();
        }
    }

    let rules = &mut config.rules;
    if let Some(x) = args.team_size {
        rules.team_size = Some(json!(x));
    }
    if let Some(x) = args.default_rating.clone() {
        rules.default_rating = Some(json!(x));
    }
    if args.strategy.is_some() {
        rules.matching_strategy = args.strategy.clone();
    }
    if args.ranking.is_some() {
        rules.ranking_rule = args.ranking.clone();
    }
    if let Some(seed) = args.tiebreak_seed {
        rules.tiebreak_mode = Some("hashed".to_string());
        rules.random_seed = Some(seed.to_string());
    }
    if let Some(x) = args.max_iterations {
        rules.max_iterations = Some(json!(x));
    }
    if args.preferences {
        config.output_settings.include_preferences = Some(true);
    }
}

pub fn run(args: &Args) -> BSurveyResult<()> {
    let (mut config, mut root) = match args.config.as_deref() {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        None => (config_from_args(args)?, PathBuf::new()),
    };
    // An input given on the command line is relative to the working directory.
    if args.input.is_some() {
        root = PathBuf::new();
    }
    apply_args(&mut config, args);

    let result = run_survey(&config, &root, args.out.clone(), args.reference.clone())?;
    info!(
        "Formed {} teams in {} iterations",
        result.teams.len(),
        result.iterations
    );
    Ok(())
}

/// Logs the error and its trace, if any.
pub fn report_error(e: &SurveyError) {
    warn!("Error occurred {:?}", e);
    eprintln!("An error occurred: {}", e);
    if let Some(bt) = ErrorCompat::backtrace(e) {
        eprintln!("trace: {}", bt);
    }
}
