//! Core library for profile-driven video re-encoding through external
//! encoder and container tool chains.
//!
//! The two central pieces are the layered settings resolver
//! ([`SettingsStore`]: globals, per-profile overlays, placeholder tags and
//! per-encoder projections) and the per-job pipeline ([`Job`]: path
//! derivation, adapter construction, extract audio -> encode -> mux ->
//! clean up). Jobs run strictly one at a time; every external tool is a
//! blocking child process whose output file, not exit code, decides
//! success.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use reenc_core::{ini, Job, SettingsStore};
//! use std::path::Path;
//!
//! let raw = ini::load_or_init(Path::new("reenc.ini")).unwrap();
//! let store = SettingsStore::new(&raw);
//!
//! for profile in store.active_profiles() {
//!     let mut job = Job::new("movie.mkv", &store, &profile);
//!     job.generate_paths().unwrap();
//!     job.run().unwrap();
//! }
//! ```

pub mod container;
pub mod encoder;
pub mod error;
pub mod external;
pub mod ini;
pub mod job;
pub mod paths;
pub mod settings;
pub mod tags;

// Re-exports for public API
pub use container::{container_for, VideoContainer};
pub use encoder::{encoder_for, Encoder};
pub use error::{CoreError, CoreResult};
pub use job::Job;
pub use settings::{debug_level_from, SettingsMap, SettingsStore};

use std::path::PathBuf;

/// Result of one (source file, profile) conversion job.
///
/// Collected by the caller running the batch, one entry per job, for the
/// run summary and the archive decision.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub source: PathBuf,
    pub profile: String,
    pub output: Option<PathBuf>,
    pub succeeded: bool,
}
