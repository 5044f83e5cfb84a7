//! x265 encoder adapter, driven through the avs4x26x front end.
//!
//! avs4x26x feeds an AviSynth script to the real encoder binary, which it
//! receives via `--x26x-binary`. The spawned executable is therefore the
//! front end (`avs4x26xPath` setting), not x265 itself (`EncoderPath`).

use std::path::{Path, PathBuf};

use crate::encoder::{Encoder, EncoderBase};
use crate::settings::SettingsMap;

/// Output extensions the x265 tool chain can write.
pub const VALID_OUTPUT_TYPES: &[&str] = &[".h265", ".mkv", ".mp4"];

const DEFAULT_OUTPUT_TYPE: &str = ".h265";

/// Adapter for x265 behind the avs4x26x front end.
pub struct X265Encoder {
    base: EncoderBase,
}

impl X265Encoder {
    #[must_use]
    pub fn new(input: &Path, output: &Path, working_dir: &Path, settings: SettingsMap) -> Self {
        let base = EncoderBase::new(
            input,
            output,
            working_dir,
            settings,
            VALID_OUTPUT_TYPES,
            DEFAULT_OUTPUT_TYPE,
        );
        let mut encoder = Self { base };
        let arguments = encoder.build_arguments();
        encoder.base.arguments = arguments;
        encoder
    }

    /// Assembles `--x26x-binary <x265> <options> <input> -o <output>`.
    fn build_arguments(&self) -> Vec<String> {
        let mut args = Vec::new();
        match self.base.options.get("EncoderPath") {
            Some(encoder_path) => {
                args.push("--x26x-binary".to_string());
                args.push(encoder_path.to_string());
            }
            None => log::error!("No x265 binary path configured, avs4x26x will use its default"),
        }
        args.extend(self.base.options.to_args());
        self.base.push_io_arguments(&mut args);
        args
    }
}

impl Encoder for X265Encoder {
    fn encoder_type(&self) -> &'static str {
        "x265"
    }

    fn executable(&self) -> Option<PathBuf> {
        self.base.options.get("avs4x26xPath").map(PathBuf::from)
    }

    fn input_file(&self) -> &Path {
        &self.base.input
    }

    fn output_file(&self) -> &Path {
        &self.base.output
    }

    fn working_dir(&self) -> &Path {
        &self.base.working_dir
    }

    fn arguments(&self) -> &[String] {
        &self.base.arguments
    }

    fn set_arguments(&mut self, arguments: Vec<String>) {
        self.base.arguments = arguments;
    }
}
