//! Typed access to an encoder's settings mapping.
//!
//! Raw encoder settings arrive as strings projected from the global
//! configuration. All parsing and validation of those strings lives here so
//! callers never interpret setting values themselves.

use crate::paths::normalize_extension;
use crate::settings::SettingsMap;

/// CRF values the x26x encoders accept.
const CRF_RANGE: std::ops::RangeInclusive<i64> = 0..=51;

/// Speed presets shared by the x26x encoder family.
pub const VALID_PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
    "placebo",
];

/// Table mapping a setting key to the command-line flag it becomes.
/// An empty flag passes the value through verbatim (the `custom` escape
/// hatch for options with no dedicated setting).
const ARG_TABLE: &[(&str, &str)] = &[("preset", "--preset"), ("crf", "--crf"), ("custom", "")];

/// Validated view over one encoder's settings mapping.
#[derive(Debug, Clone)]
pub struct EncoderOptions {
    settings: SettingsMap,
}

impl EncoderOptions {
    #[must_use]
    pub fn new(settings: SettingsMap) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(key)
    }

    /// The configured CRF, when it parses and sits inside 0-51.
    #[must_use]
    pub fn crf(&self) -> Option<i64> {
        self.settings.get_int_in_range("crf", CRF_RANGE)
    }

    /// Sets the CRF. An out-of-range value is rejected and logged, leaving
    /// the prior value in place. Returns whether the value was accepted.
    pub fn set_crf(&mut self, value: i64) -> bool {
        if CRF_RANGE.contains(&value) {
            self.settings.insert("crf", value.to_string());
            true
        } else {
            log::error!("Invalid crf value (0-51): {value}");
            false
        }
    }

    /// The configured preset, when it is one of the known x26x presets.
    #[must_use]
    pub fn preset(&self) -> Option<&str> {
        let preset = self.settings.get("preset")?;
        if VALID_PRESETS.contains(&preset) {
            Some(preset)
        } else {
            log::error!("Invalid preset: {preset}");
            None
        }
    }

    /// Sets the preset, rejecting and logging names outside the x26x list.
    /// Returns whether the value was accepted.
    pub fn set_preset(&mut self, value: &str) -> bool {
        if VALID_PRESETS.contains(&value) {
            self.settings.insert("preset", value);
            true
        } else {
            log::error!("Invalid preset: {value}");
            false
        }
    }

    /// The output extension in `.ext` form, constrained to `valid`.
    ///
    /// A configured value outside the whitelist is logged and replaced by
    /// `default`; an absent setting silently uses `default`.
    #[must_use]
    pub fn output_type(&self, valid: &[&str], default: &str) -> String {
        match self.settings.get("outputType") {
            Some(configured) => {
                let ext = normalize_extension(configured);
                if valid.contains(&ext.as_str()) {
                    ext
                } else {
                    log::error!("Invalid output type: {configured}, using {default}");
                    default.to_string()
                }
            }
            None => default.to_string(),
        }
    }

    /// Sets the output extension, rejecting and logging values outside
    /// `valid`. Returns whether the value was accepted.
    pub fn set_output_type(&mut self, value: &str, valid: &[&str]) -> bool {
        let ext = normalize_extension(value);
        if valid.contains(&ext.as_str()) {
            self.settings.insert("outputType", ext);
            true
        } else {
            log::error!("Invalid output type: {value}");
            false
        }
    }

    /// Assembles the option part of the encoder command line from the flag
    /// table. Settings with no table entry (paths, names) are not options
    /// and never appear; invalid values are logged and skipped rather than
    /// clamped.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (key, flag) in ARG_TABLE {
            let value: Option<String> = match *key {
                "crf" => self.crf().map(|v| v.to_string()),
                "preset" => self.preset().map(str::to_string),
                _ => self.settings.get(key).map(str::to_string),
            };
            let Some(value) = value else {
                continue;
            };
            if flag.is_empty() {
                args.extend(value.split_whitespace().map(str::to_string));
            } else {
                args.push((*flag).to_string());
                args.push(value);
            }
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, &str)]) -> EncoderOptions {
        EncoderOptions::new(SettingsMap::from_iter(pairs.iter().copied()))
    }

    #[test]
    fn crf_bounds_are_inclusive() {
        let mut opts = options(&[("crf", "24")]);
        assert!(opts.set_crf(0));
        assert_eq!(opts.crf(), Some(0));
        assert!(opts.set_crf(51));
        assert_eq!(opts.crf(), Some(51));
    }

    #[test]
    fn out_of_range_crf_is_rejected_and_prior_value_kept() {
        let mut opts = options(&[("crf", "24")]);
        assert!(!opts.set_crf(-1));
        assert_eq!(opts.crf(), Some(24));
        assert!(!opts.set_crf(52));
        assert_eq!(opts.crf(), Some(24));
    }

    #[test]
    fn configured_crf_outside_range_reads_as_absent() {
        let opts = options(&[("crf", "99")]);
        assert_eq!(opts.crf(), None);
        assert!(opts.to_args().is_empty());
    }

    #[test]
    fn preset_whitelist() {
        let mut opts = options(&[]);
        assert!(opts.set_preset("medium"));
        assert_eq!(opts.preset(), Some("medium"));
        assert!(!opts.set_preset("warpspeed"));
        assert_eq!(opts.preset(), Some("medium"));
    }

    #[test]
    fn output_type_falls_back_to_default() {
        let valid = &[".264", ".mkv"];
        assert_eq!(options(&[]).output_type(valid, ".264"), ".264");
        assert_eq!(
            options(&[("outputType", "mkv")]).output_type(valid, ".264"),
            ".mkv"
        );
        assert_eq!(
            options(&[("outputType", "avi")]).output_type(valid, ".264"),
            ".264"
        );
    }

    #[test]
    fn set_output_type_validates() {
        let mut opts = options(&[]);
        assert!(opts.set_output_type("mkv", &[".264", ".mkv"]));
        assert_eq!(opts.get("outputType"), Some(".mkv"));
        assert!(!opts.set_output_type(".avi", &[".264", ".mkv"]));
        assert_eq!(opts.get("outputType"), Some(".mkv"));
    }

    #[test]
    fn to_args_follows_the_flag_table() {
        let opts = options(&[
            ("preset", "medium"),
            ("crf", "24"),
            ("custom", "--tune film"),
            ("EncoderPath", "/opt/x264"),
            ("name", "x264"),
        ]);
        assert_eq!(
            opts.to_args(),
            vec!["--preset", "medium", "--crf", "24", "--tune", "film"]
        );
    }

    #[test]
    fn to_args_skips_invalid_values() {
        let opts = options(&[("preset", "warpspeed"), ("crf", "24")]);
        assert_eq!(opts.to_args(), vec!["--crf", "24"]);
    }
}
