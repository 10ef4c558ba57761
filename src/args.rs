use clap::Parser;

/// Shows how the electorate voted on the theses of an election, or quizzes you about it.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (number) The election to load from the API, for example 44. If the API cannot be
    /// reached, the last copy saved in the cache directory is used.
    #[clap(short, long, value_parser)]
    pub election: Option<u32>,

    /// (file path) Read the election from a file in the JSON format of the API instead of
    /// fetching it. No network access happens in this case.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path, optional) A JSON configuration file. See the manual of thesis_quiz for
    /// the available options.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (URL) The root of the read API. Overrides the configuration file.
    #[clap(long, value_parser)]
    pub api_root: Option<String>,

    /// (directory) Where election data, the client id and answered questions are kept.
    /// Overrides the configuration file.
    #[clap(long, value_parser)]
    pub cache_dir: Option<String>,

    /// (file path, 'stdout' or empty) Where the JSON summary of the election is written.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, the program checks that
    /// the computed summary matches it.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// Run the quiz in the terminal instead of writing a summary.
    #[clap(long, takes_value = false)]
    pub quiz: bool,

    // Other arguments
    /// If passed as an argument, will turn on debug logging.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
