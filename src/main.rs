mod align;
mod call;
mod classify;
mod cli;
mod error;
mod filenames;
mod globals;
mod joint;
mod logger;
mod os_utils;
mod pipeline;
mod reference;
mod resources;
mod run_stats;
mod scheduler;
mod stage;
mod trio;

use std::process;

use hhmmss::Hhmmss;
use log::{error, info};

use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::logger::setup_output_dir_and_logger;

/// Run system configuration steps prior to starting any other program logic
///
fn system_configuration_prelude() {
    os_utils::attempt_max_open_file_limit();
}

fn run(settings: &cli::Settings, trio_input: &cli::TrioInput) -> Result<(), error::PipelineError> {
    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!(
        "cmdline: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );
    info!("Running on {} threads", settings.thread_count);

    let start = std::time::Instant::now();

    pipeline::run_pipeline(settings, trio_input)?;

    info!(
        "{PROGRAM_NAME} completed. Total Runtime: {}",
        start.elapsed().hhmmssxxx()
    );
    Ok(())
}

fn main() {
    system_configuration_prelude();

    let (settings, trio_input) = cli::validate_and_fix_settings(cli::parse_settings());

    // Setup logger, including creation of the output directory for the log file:
    setup_output_dir_and_logger(&settings.output_dir, settings.clobber, settings.debug);

    if let Err(err) = run(&settings, &trio_input) {
        error!("{err}");
        process::exit(exitcode::SOFTWARE);
    }
}
