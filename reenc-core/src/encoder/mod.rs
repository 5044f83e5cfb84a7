//! External encoder adapters.
//!
//! An [`Encoder`] wraps one external encoding tool: it owns the resolved
//! settings for that tool, assembles its command line, and spawns it with
//! the job's working folder. Variants are chosen by the configured encoder
//! type through a small registry; an unknown type is an explicit error.
//!
//! Starting the process only reports that the tool was launched and ran to
//! completion. Whether encoding actually worked is for the caller to judge
//! by the output file's existence, since exit semantics differ per tool.

mod options;
mod x264;
mod x265;

pub use options::{EncoderOptions, VALID_PRESETS};
pub use x264::X264Encoder;
pub use x265::X265Encoder;

use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::external;
use crate::settings::SettingsMap;

/// Capability set of an external encoder.
pub trait Encoder {
    /// The encoder type name this adapter drives (e.g. "x264").
    fn encoder_type(&self) -> &'static str;

    /// Path to the executable that gets spawned, when configured.
    fn executable(&self) -> Option<PathBuf>;

    /// The input passed to the tool (usually the job's script file).
    fn input_file(&self) -> &Path;

    /// The file the tool will produce. The extension is derived from the
    /// `outputType` setting against the variant's whitelist, so it may
    /// differ from the path the adapter was constructed with.
    fn output_file(&self) -> &Path;

    /// Directory the tool runs in.
    fn working_dir(&self) -> &Path;

    /// The assembled command line, one argument per element.
    fn arguments(&self) -> &[String];

    /// Replaces the assembled command line.
    fn set_arguments(&mut self, arguments: Vec<String>);

    /// Whether the tool can be spawned: the executable and the input file
    /// must exist. Each failing precondition is logged. Empty arguments are
    /// a warning only, the tool will apply its own defaults.
    fn process_ready(&self) -> bool {
        let mut ready = true;
        match self.executable() {
            Some(exe) if exe.is_file() => {}
            Some(exe) => {
                log::error!("Invalid encoder executable path: {}", exe.display());
                ready = false;
            }
            None => {
                log::error!(
                    "No executable path configured for encoder {}",
                    self.encoder_type()
                );
                ready = false;
            }
        }
        if !self.input_file().is_file() {
            log::error!("Encoder input file not found: {}", self.input_file().display());
            ready = false;
        }
        if self.arguments().is_empty() {
            log::warn!("Empty encoder arguments, defaults will be used");
        }
        if ready {
            log::info!("Encoder process ready");
        }
        ready
    }

    /// Spawns the encoder in the working folder and blocks until it exits,
    /// draining its standard output. `Ok` means the tool was launched and
    /// ran to completion, not that it encoded anything; the caller checks
    /// for [`Encoder::output_file`] afterwards.
    fn start_process(&self) -> CoreResult<()> {
        let exe = self.executable().ok_or_else(|| {
            CoreError::Config(format!(
                "no executable path configured for encoder {}",
                self.encoder_type()
            ))
        })?;
        external::run_tool(&exe, self.arguments(), Some(self.working_dir()))?;
        Ok(())
    }
}

/// State shared by the encoder variants.
pub(crate) struct EncoderBase {
    options: EncoderOptions,
    input: PathBuf,
    output: PathBuf,
    working_dir: PathBuf,
    arguments: Vec<String>,
}

impl EncoderBase {
    /// Resolves placeholder tags in `settings` and derives the real output
    /// path from the variant's output-type whitelist.
    fn new(
        input: &Path,
        output: &Path,
        working_dir: &Path,
        mut settings: SettingsMap,
        valid_types: &[&str],
        default_type: &str,
    ) -> Self {
        settings.resolve_all_tags();
        let options = EncoderOptions::new(settings);
        let output_type = options.output_type(valid_types, default_type);
        let output = output.with_extension(output_type.trim_start_matches('.'));
        Self {
            options,
            input: input.to_path_buf(),
            output,
            working_dir: working_dir.to_path_buf(),
            arguments: Vec::new(),
        }
    }

    /// Appends the input path and the `-o <output>` pair the x26x tools
    /// expect at the end of the command line.
    fn push_io_arguments(&self, args: &mut Vec<String>) {
        args.push(self.input.to_string_lossy().into_owned());
        args.push("-o".to_string());
        args.push(self.output.to_string_lossy().into_owned());
    }
}

type EncoderCtor = fn(&Path, &Path, &Path, SettingsMap) -> Box<dyn Encoder>;

/// Registry of the known encoder types.
const ENCODER_REGISTRY: &[(&str, EncoderCtor)] = &[
    ("x264", |input, output, working_dir, settings| {
        Box::new(X264Encoder::new(input, output, working_dir, settings))
    }),
    ("x265", |input, output, working_dir, settings| {
        Box::new(X265Encoder::new(input, output, working_dir, settings))
    }),
];

/// Builds the encoder adapter for `encoder_type`.
///
/// `output` is the caller's best guess at the output path; the adapter
/// corrects its extension, so read [`Encoder::output_file`] back. Unknown
/// encoder types are a configuration error.
pub fn encoder_for(
    encoder_type: &str,
    input: &Path,
    output: &Path,
    working_dir: &Path,
    settings: SettingsMap,
) -> CoreResult<Box<dyn Encoder>> {
    for (name, constructor) in ENCODER_REGISTRY {
        if name.eq_ignore_ascii_case(encoder_type) {
            return Ok(constructor(input, output, working_dir, settings));
        }
    }
    Err(CoreError::Config(format!(
        "encoder type not recognized: {encoder_type}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn settings(pairs: &[(&str, &str)]) -> SettingsMap {
        SettingsMap::from_iter(pairs.iter().copied())
    }

    #[test]
    fn factory_selects_by_type_name() {
        let enc = encoder_for(
            "x264",
            Path::new("in.avs"),
            Path::new("out.mkv"),
            Path::new("."),
            settings(&[("EncoderPath", "/opt/x264")]),
        )
        .unwrap();
        assert_eq!(enc.encoder_type(), "x264");

        let enc = encoder_for(
            "X265",
            Path::new("in.avs"),
            Path::new("out.mkv"),
            Path::new("."),
            settings(&[("avs4x26xPath", "/opt/avs4x26x")]),
        )
        .unwrap();
        assert_eq!(enc.encoder_type(), "x265");
    }

    #[test]
    fn factory_rejects_unknown_types() {
        let result = encoder_for(
            "vp9",
            Path::new("in.avs"),
            Path::new("out.mkv"),
            Path::new("."),
            settings(&[]),
        );
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn process_ready_requires_executable_and_input() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("x264");
        let input = dir.path().join("in.avs");

        let build = |exe: &Path, input: &Path| {
            X264Encoder::new(
                input,
                &dir.path().join("out.mkv"),
                dir.path(),
                settings(&[("EncoderPath", exe.to_string_lossy().as_ref())]),
            )
        };

        assert!(!build(&exe, &input).process_ready());

        File::create(&exe).unwrap();
        assert!(!build(&exe, &input).process_ready());

        File::create(&input).unwrap();
        assert!(build(&exe, &input).process_ready());
    }

    #[test]
    fn arguments_are_replaceable() {
        let mut enc = X264Encoder::new(
            Path::new("in.avs"),
            Path::new("out.mkv"),
            Path::new("."),
            settings(&[("EncoderPath", "/opt/x264")]),
        );
        enc.set_arguments(vec!["--fast-decode".to_string()]);
        assert_eq!(enc.arguments(), ["--fast-decode"]);
    }
}
