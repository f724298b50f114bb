use clap::Parser;

/// This program forms teams out of a peer-evaluation survey.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file describing the survey and the rules, in JSON format.
    /// See the manual of the team_matching crate for the options.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference summary in JSON format. If provided, peerteams will
    /// check that the outcome matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the teams will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The survey file. Setting this option overrides the file that may be specified with the
    /// --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv or xlsx) The type of the input. By default, it is guessed from the extension of the file.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default 2) The number of people per team.
    #[clap(short, long, value_parser)]
    pub team_size: Option<u32>,

    /// (anchorLed or proposerLed, default anchorLed) Who initiates a match.
    #[clap(long, value_parser)]
    pub strategy: Option<String>,

    /// (mutualAverage or opinionAndReputation, default opinionAndReputation) How the participants rank each other.
    #[clap(long, value_parser)]
    pub ranking: Option<String>,

    /// (number, 'neutral' or 'favorable', default neutral) The rating of a pair that nobody rated.
    #[clap(long, value_parser)]
    pub default_rating: Option<String>,

    /// (number) If specified, equal rankings are ordered by a hash of the names seeded with this number.
    #[clap(long, value_parser)]
    pub tiebreak_seed: Option<u32>,

    /// (number) The maximum number of iterations of the matching.
    #[clap(long, value_parser)]
    pub max_iterations: Option<u64>,

    /// The header of the column naming the respondent.
    #[clap(long, value_parser)]
    pub rater_column: Option<String>,

    /// The text that identifies the rating columns.
    #[clap(long, value_parser)]
    pub rating_marker: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// If passed as an argument, the summary will include the preference rankings.
    #[clap(long, takes_value = false)]
    pub preferences: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
