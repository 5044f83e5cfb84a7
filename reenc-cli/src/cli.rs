// reenc-cli/src/cli.rs
//
// Defines the command-line argument structure using clap.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "reenc: profile-driven video re-encoding",
    long_about = "Converts video files through external encoder and container \
                  tool chains, once per active profile, via the reenc-core library."
)]
pub struct Cli {
    /// Video files to convert; a built-in test file is used when empty
    #[arg(value_name = "VIDEO_FILE")]
    pub inputs: Vec<PathBuf>,

    /// Base config file; a matching *_local override file is merged on top
    #[arg(short, long, value_name = "INI_PATH")]
    pub config: Option<PathBuf>,

    /// Leave successfully converted sources in place instead of archiving them
    #[arg(long, default_value_t = false)]
    pub no_archive: bool,
}
