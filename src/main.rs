use clap::Parser;
use log::{info, warn};
use snafu::ErrorCompat;

mod args;
mod metawahl;

fn main() {
    let args = args::Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    info!("args: {:?}", args);

    if let Err(e) = metawahl::run(&args) {
        warn!("Error occurred {:?}", e);
        eprintln!("An error occurred: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
