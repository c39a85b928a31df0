use clap::Parser;
use htsub_runner::{cli::Args, splitter, submitters::Submitters};
use std::{env, process::exit};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {e}");
            exit(1)
        }
    };

    match env::current_dir() {
        Ok(workdir) => {
            let findings = config.preflight_checks(&workdir);
            debug!("Preflight checks finished with {findings} findings");
        }
        Err(e) => error!("Failed to determine the working directory, skipping preflight checks: {e}"),
    }

    let mut submitter = match Submitters::load(&config.submitter) {
        Ok(submitter) => submitter,
        Err(e) => {
            error!("{e}");
            exit(1)
        }
    };

    if let Err(e) = splitter::run(&config, &mut submitter) {
        error!("Error: {e}");

        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            error!("Caused by: {cause}");
            source = cause.source();
        }

        exit(1)
    }
}
