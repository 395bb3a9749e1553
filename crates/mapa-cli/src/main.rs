use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};
use miette::GraphicalReportHandler;

use mapa::MapaError;
use mapa_cli::{Args, ErrorAdapter};

/// Parses `level`, warning on stderr and using `warn` when it is unknown.
fn log_level(level: &str) -> LevelFilter {
    LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Unknown log level {level:?}, logging warnings only");
        LevelFilter::Warn
    })
}

/// Renders `err` with its diagnostic code and help, or plain text if the
/// graphical report fails.
fn report(err: &MapaError) -> String {
    let mut report = String::new();
    match GraphicalReportHandler::new().render_report(&mut report, &ErrorAdapter(err)) {
        Ok(()) => report,
        Err(_) => err.to_string(),
    }
}

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();
    let level = log_level(&args.log_level);
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .init();

    info!(level:?; "Starting mapa");
    debug!(args:?; "Parsed arguments");

    match mapa_cli::run(&args) {
        Ok(()) => info!("Atlas and layer written"),
        Err(err) => {
            error!("Failed\n{}", report(&err));
            process::exit(1);
        }
    }
}
