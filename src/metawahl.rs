use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use thesis_quiz::*;

use std::fs;
use std::io;

use crate::args::Args;
use crate::metawahl::client::{ApiBackend, OfflineBackend};
use crate::metawahl::config_reader::*;
use crate::metawahl::io_api::read_election_file;
use crate::metawahl::summary::{build_summary_js, check_reference};

mod cache;
mod client;
mod config_reader;
mod interactive;
mod io_api;
mod summary;

#[derive(Debug, Snafu)]
pub enum AppError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson { source: io::Error, path: String },
    #[snafu(display("Error writing file {path}"))]
    WritingFile { source: io::Error, path: String },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("The election data has no {field}"))]
    MissingField { field: String },
    #[snafu(display("The API returned an error: {message}"))]
    Api { message: String },
    #[snafu(display("Request to {url} failed"))]
    Http { source: reqwest::Error, url: String },
    #[snafu(display("Cannot use the cache directory {path}"))]
    Cache { source: io::Error, path: String },
    #[snafu(display("Could not load election {election}"))]
    LoadingElection { source: QuizError, election: u32 },
    #[snafu(display("Error talking to the terminal"))]
    Terminal { source: io::Error },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AppResult<T> = Result<T, AppError>;

/// Entry point of the command line tool.
pub fn run(args: &Args) -> AppResult<()> {
    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => AppConfig::default(),
    };
    let settings = resolve_settings(args, &config)?;
    info!("settings: {:?}", settings);

    if args.election.is_none() && args.input.is_none() {
        whatever!("Either --election or --input must be given")
    }

    if args.quiz {
        run_quiz(args, &settings)
    } else {
        run_summary(args, &settings)
    }
}

fn run_quiz(args: &Args, settings: &Settings) -> AppResult<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Some(path) = &args.input {
        let snapshot = read_election_file(path)?;
        let election_id = snapshot.info.id;
        let backend = OfflineBackend::new(snapshot);
        let mut session = QuizSession::start(election_id, backend, &settings.rules);
        interactive::run_quiz(&mut session, stdin.lock(), stdout.lock())
    } else if let Some(election_id) = args.election {
        let backend = ApiBackend::new(settings)?;
        let mut session = QuizSession::start(election_id, backend, &settings.rules);
        interactive::run_quiz(&mut session, stdin.lock(), stdout.lock())
    } else {
        whatever!("Either --election or --input must be given")
    }
}

fn run_summary(args: &Args, settings: &Settings) -> AppResult<()> {
    let snapshot = if let Some(path) = &args.input {
        read_election_file(path)?
    } else if let Some(election_id) = args.election {
        let backend = ApiBackend::new(settings)?;
        match backend.fetch_election(election_id) {
            Ok(s) => s,
            Err(e) => {
                warn!("Falling back to the cached copy of election {}: {}", election_id, e);
                match backend.cached_election(election_id) {
                    Some(s) => s,
                    None => return Err(e).context(LoadingElectionSnafu {
                        election: election_id,
                    }),
                }
            }
        }
    } else {
        whatever!("Either --election or --input must be given")
    };

    let summary_js = build_summary_js(&snapshot, &settings.rules);
    let pretty = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;

    match args.out.as_deref() {
        None | Some("") | Some("stdout") => println!("{}", pretty),
        Some(path) => {
            fs::write(path, &pretty).context(WritingFileSnafu { path })?;
            info!("Summary written to {}", path);
        }
    }

    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty)?;
    }
    Ok(())
}
