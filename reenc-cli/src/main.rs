// ============================================================================
// reenc-cli/src/main.rs
// ============================================================================
//
// REENC CLI: Command-Line Entry Point
//
// Parses the command line, loads the layered configuration, and drives one
// conversion job per (input file x active profile) combination through
// reenc-core, strictly one job at a time.
//
// Responsibilities:
// - Parsing command-line arguments (input files, config path, archive flag)
// - Loading the base config file and its local override
// - Initialising logging from the configured debug level
// - Running the job loop and archiving sources whose jobs all succeeded
// - Printing the run summary and setting the process exit code on failure
//
// AI-ASSISTANT-INFO: CLI entry point and per-file/per-profile job loop

mod cli;
mod logging;
mod output;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use reenc_core::{ini, Job, JobOutcome, SettingsStore};

/// File converted when no inputs are given, for drop-folder style use.
const FALLBACK_INPUT: &str = "test.mp4";

fn main() {
    let cli = cli::Cli::parse();
    match run_conversions(cli) {
        Ok(outcomes) => {
            if outcomes.iter().any(|outcome| !outcome.succeeded) {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Loads the configuration and runs every (file x profile) job in order.
///
/// Returns one outcome per job. A failing job never aborts the batch; a
/// source file is only archived when all of its jobs succeeded and
/// archiving wasn't disabled.
fn run_conversions(cli: cli::Cli) -> Result<Vec<JobOutcome>, Box<dyn Error>> {
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(ini::BASE_CONFIG_NAME));
    let raw = ini::load_or_init(&config_path)?;
    let store = SettingsStore::new(&raw);
    logging::init(store.debug_level());

    output::print_section("reenc");
    output::print_status("Started", &logging::now_string());
    output::print_status("Config", &config_path.display().to_string());

    let profiles = store.active_profiles();
    if profiles.is_empty() {
        return Err("no valid profiles selected; check the 'profiles' setting".into());
    }
    let inputs = if cli.inputs.is_empty() {
        vec![PathBuf::from(FALLBACK_INPUT)]
    } else {
        cli.inputs
    };

    let total = inputs.len() * profiles.len();
    let mut outcomes: Vec<JobOutcome> = Vec::with_capacity(total);
    for input in &inputs {
        output::print_processing(&format!("Processing {}", input.display()));
        let mut file_successful = true;
        let mut last_job: Option<Job> = None;

        for profile in &profiles {
            output::print_status(
                "Job",
                &format!("{} of {total}, profile {profile}", outcomes.len() + 1),
            );
            let mut job = Job::new(input.clone(), &store, profile);
            let result = match job.generate_paths() {
                Ok(()) => {
                    job.print_paths();
                    job.run()
                }
                Err(e) => Err(e),
            };
            match &result {
                Ok(()) => {
                    if let Some(path) = job.output_video() {
                        output::print_success(&format!("Wrote {}", path.display()));
                    }
                }
                Err(e) => {
                    output::print_failure(&format!("Job failed: {e}"));
                    file_successful = false;
                }
            }
            outcomes.push(JobOutcome {
                source: input.clone(),
                profile: profile.clone(),
                output: job.output_video().map(Path::to_path_buf),
                succeeded: result.is_ok(),
            });
            last_job = Some(job);
        }

        // All profiles done for this file; archive it only when every job
        // succeeded, so a failed profile keeps the source around for a rerun.
        if file_successful && !cli.no_archive {
            if let Some(job) = &last_job {
                if let Err(e) = job.archive_source() {
                    log::error!("Failed to archive {}: {e}", input.display());
                }
            }
        }
    }

    let failed: Vec<&JobOutcome> = outcomes.iter().filter(|o| !o.succeeded).collect();
    output::print_section("Summary");
    output::print_status("Jobs run", &total.to_string());
    output::print_status("Failed", &failed.len().to_string());
    for outcome in &failed {
        output::print_failure(&format!(
            "{}, profile {}",
            outcome.source.display(),
            outcome.profile
        ));
    }
    output::print_status("Finished", &logging::now_string());
    Ok(outcomes)
}
