//! x264 encoder adapter, invoking the x264 binary directly.

use std::path::{Path, PathBuf};

use crate::encoder::{Encoder, EncoderBase};
use crate::settings::SettingsMap;

/// Output extensions the x264 binary can write.
pub const VALID_OUTPUT_TYPES: &[&str] = &[".264", ".mkv", ".mp4", ".flv"];

const DEFAULT_OUTPUT_TYPE: &str = ".264";

/// Adapter for the x264 binary (`EncoderPath` setting).
pub struct X264Encoder {
    base: EncoderBase,
}

impl X264Encoder {
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

    /// Assembles `<options> <input> -o <output>`.
    fn build_arguments(&self) -> Vec<String> {
        let mut args = self.base.options.to_args();
        self.base.push_io_arguments(&mut args);
        args
    }
}

impl Encoder for X264Encoder {
    fn encoder_type(&self) -> &'static str {
        "x264"
    }

    fn executable(&self) -> Option<PathBuf> {
        self.base.options.get("EncoderPath").map(PathBuf::from)
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
