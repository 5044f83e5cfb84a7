// ============================================================================
// reenc-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: env_logger Initialisation and Timestamp Helpers
//
// The application uses the standard `log` facade with `env_logger` as the
// backend. The verbosity comes from the `debugLevel` setting, resolved by
// the settings store and passed in explicitly at startup; there is no
// process-wide verbosity flag. Setting RUST_LOG still overrides the
// configured level:
// - RUST_LOG=info: normal operation logs
// - RUST_LOG=debug: detailed debugging information
//
// AI-ASSISTANT-INFO: Logger initialisation and timestamp helper

use log::LevelFilter;

/// Initialises the logger with the level the configuration asked for.
/// RUST_LOG, when set, wins over `level`.
pub fn init(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}

/// Returns the current local time formatted for the run banner and summary
/// (e.g. "2026-08-04 19:22:45").
pub fn now_string() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
