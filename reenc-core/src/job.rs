// ============================================================================
// reenc-core/src/job.rs
// ============================================================================
//
// JOB ORCHESTRATOR: One Conversion Job's Lifecycle
//
// A Job converts one source video under one profile. It derives every
// filesystem path the run needs, constructs the container and encoder
// adapters, and executes the pipeline stages strictly in order:
//
//   extract audio -> encode -> mux -> clean up
//
// Any stage failure aborts the remaining stages. Archiving the source is a
// separate, caller-invoked step: whether to archive depends on every
// profile's job for that source having succeeded, which only the caller
// running the full batch can know.
//
// AI-ASSISTANT-INFO: Per-job path derivation and pipeline execution

use std::fs;
use std::path::{Path, PathBuf};

use crate::container::{container_for, VideoContainer};
use crate::encoder::{encoder_for, Encoder};
use crate::error::{CoreError, CoreResult};
use crate::paths::{append_suffix, has_extension, next_free_path, normalize_extension};
use crate::settings::SettingsStore;

/// Temp directory created under the working folder.
const TEMP_DIR_NAME: &str = "Temp";

/// Archive directory created under the working folder.
const ARCHIVE_DIR_NAME: &str = "Archive";

/// Prefix of the intermediate video the encoder writes.
const TEMP_VIDEO_PREFIX: &str = "Temp-";

/// Extension of AviSynth script sources, which skip script generation.
const SCRIPT_EXTENSION: &str = ".avs";

/// Extension used for the extracted audio track.
const AUDIO_EXTENSION: &str = ".aac";

/// Container extension used when no `outputType` is configured.
const DEFAULT_OUTPUT_TYPE: &str = ".mkv";

/// Placeholder in the script template replaced by the source video path.
const VIDEO_FILE_TOKEN: &str = "--VideoFile--";

/// Index files some encoders drop next to the source video.
const SIDECAR_SUFFIXES: &[&str] = &[".lwi", ".ffindex"];

/// One (source file, profile) conversion job.
///
/// `generate_paths` must run before `run`; `run` invokes it (and
/// `setup_encoder`) itself when the caller hasn't. A job is not reused
/// across runs.
pub struct Job {
    settings: SettingsStore,
    source_video: PathBuf,
    working_folder: PathBuf,
    temp_folder: PathBuf,
    output_folder: PathBuf,
    archive_folder: PathBuf,
    source_audio: PathBuf,
    temp_video: PathBuf,
    source_script: PathBuf,
    output_video: PathBuf,
    generated_script: bool,
    temp_folder_created: bool,
    input_container: Option<Box<dyn VideoContainer>>,
    output_container: Option<Box<dyn VideoContainer>>,
    encoder: Option<Box<dyn Encoder>>,
    paths_generated: bool,
    encoder_ready: bool,
}

impl Job {
    /// Creates a job for `source` under `profile`.
    ///
    /// The job takes its own copy of the settings store with the profile
    /// fixed on it, so later store mutations by the caller can't leak in.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, settings: &SettingsStore, profile: &str) -> Self {
        let mut settings = settings.clone();
        settings.set_active_profile(profile);
        Self {
            settings,
            source_video: source.into(),
            working_folder: PathBuf::new(),
            temp_folder: PathBuf::new(),
            output_folder: PathBuf::new(),
            archive_folder: PathBuf::new(),
            source_audio: PathBuf::new(),
            temp_video: PathBuf::new(),
            source_script: PathBuf::new(),
            output_video: PathBuf::new(),
            generated_script: false,
            temp_folder_created: false,
            input_container: None,
            output_container: None,
            encoder: None,
            paths_generated: false,
            encoder_ready: false,
        }
    }

    #[must_use]
    pub fn source_video(&self) -> &Path {
        &self.source_video
    }

    /// The profile this job runs under, when it resolved to a known one.
    #[must_use]
    pub fn active_profile(&self) -> Option<&str> {
        self.settings.active_profile()
    }

    /// The final output path, once paths are generated.
    #[must_use]
    pub fn output_video(&self) -> Option<&Path> {
        self.paths_generated.then_some(self.output_video.as_path())
    }

    /// The intermediate video the encoder writes, once paths are generated.
    #[must_use]
    pub fn temp_video(&self) -> Option<&Path> {
        self.paths_generated.then_some(self.temp_video.as_path())
    }

    /// The script handed to the encoder, once paths are generated.
    #[must_use]
    pub fn source_script(&self) -> Option<&Path> {
        self.paths_generated.then_some(self.source_script.as_path())
    }

    #[must_use]
    pub fn paths_generated(&self) -> bool {
        self.paths_generated
    }

    #[must_use]
    pub fn encoder_ready(&self) -> bool {
        self.encoder_ready
    }

    /// Derives every path the job needs and builds the container adapters.
    ///
    /// Requires the source file to exist. Derivation order: working folder,
    /// output type, input container, temp folder, audio and temp-video
    /// paths, script (generated from the template unless the source already
    /// is one), output folder, collision-free output path, output
    /// container, archive folder. On failure nothing is committed and the
    /// job stays in its not-generated state.
    pub fn generate_paths(&mut self) -> CoreResult<()> {
        self.paths_generated = false;
        if !self.source_video.is_file() {
            let message = format!("no valid source video: {}", self.source_video.display());
            log::error!("{message}");
            return Err(CoreError::Path(message));
        }

        let working_folder = match self.settings.get("workingFolder") {
            Some(dir) => PathBuf::from(dir),
            None => self
                .source_video
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        let output_type = self
            .settings
            .get("outputType")
            .map(normalize_extension)
            .unwrap_or_else(|| DEFAULT_OUTPUT_TYPE.to_string());

        let input_container = container_for(&self.source_video, &self.settings)?;

        let source_name = file_name_of(&self.source_video)?;
        let source_stem = match source_name.rfind('.') {
            Some(idx) => source_name[..idx].to_string(),
            None => source_name.clone(),
        };

        let temp_folder = working_folder.join(TEMP_DIR_NAME);
        let source_audio = temp_folder.join(format!("{source_stem}{AUDIO_EXTENSION}"));
        let temp_video = temp_folder.join(format!("{TEMP_VIDEO_PREFIX}{source_name}"));

        let (source_script, generated_script) =
            if has_extension(&self.source_video, SCRIPT_EXTENSION) {
                (self.source_video.clone(), false)
            } else {
                let template = self.settings.get("avsTemplate").ok_or_else(|| {
                    CoreError::Config("avsTemplate is not configured".to_string())
                })?;
                let script = temp_folder.join(format!("{source_stem}{SCRIPT_EXTENSION}"));
                self.temp_folder_created |= create_folder(&temp_folder)?;
                generate_script(Path::new(template), &self.source_video, &script)?;
                (script, true)
            };

        let output_folder = match self.settings.get("outputFolder") {
            Some(dir) => PathBuf::from(dir),
            None => working_folder.clone(),
        };
        let output_video = next_free_path(&output_folder, &source_stem, &output_type);
        let output_container = container_for(&output_video, &self.settings)?;
        let archive_folder = working_folder.join(ARCHIVE_DIR_NAME);

        self.working_folder = working_folder;
        self.temp_folder = temp_folder;
        self.output_folder = output_folder;
        self.archive_folder = archive_folder;
        self.source_audio = source_audio;
        self.temp_video = temp_video;
        self.source_script = source_script;
        self.output_video = output_video;
        self.generated_script = generated_script;
        self.input_container = Some(input_container);
        self.output_container = Some(output_container);
        self.paths_generated = true;
        Ok(())
    }

    /// Builds the encoder for the configured type and corrects the
    /// temp-video path to the encoder's actual output name. Requires
    /// generated paths.
    pub fn setup_encoder(&mut self) -> CoreResult<()> {
        self.encoder_ready = false;
        if !self.paths_generated {
            let message = "unable to set up encoder, paths not generated".to_string();
            log::error!("{message}");
            return Err(CoreError::Config(message));
        }
        let encoder_type = self
            .settings
            .get("encoder")
            .ok_or_else(|| CoreError::Config("no encoder type configured".to_string()))?
            .to_string();
        let encoder_settings = self.settings.encoder_settings(&encoder_type)?;
        let encoder = encoder_for(
            &encoder_type,
            &self.source_script,
            &self.temp_video,
            &self.working_folder,
            encoder_settings,
        )?;
        // The encoder picks its own output extension, which may differ from
        // the naive guess made during path generation.
        self.temp_video = encoder.output_file().to_path_buf();
        self.encoder = Some(encoder);
        self.encoder_ready = true;
        Ok(())
    }

    /// Creates the temp, output and archive directories that don't exist
    /// yet, remembering whether this job created the temp directory so
    /// cleanup only removes what it made.
    pub fn create_missing_directories(&mut self) -> CoreResult<()> {
        self.temp_folder_created |= create_folder(&self.temp_folder)?;
        create_folder(&self.output_folder)?;
        create_folder(&self.archive_folder)?;
        Ok(())
    }

    /// Logs the derived path set once paths are generated.
    pub fn print_paths(&self) {
        if !self.paths_generated {
            log::error!("Unable to print paths, paths not generated");
            return;
        }
        log::info!("    Source video:   {}", self.source_video.display());
        log::info!("    Source script:  {}", self.source_script.display());
        log::info!("    Working folder: {}", self.working_folder.display());
        log::info!("    Temp folder:    {}", self.temp_folder.display());
        log::info!("    Source audio:   {}", self.source_audio.display());
        log::info!("    Temp video:     {}", self.temp_video.display());
        log::info!("    Output folder:  {}", self.output_folder.display());
        log::info!("    Output video:   {}", self.output_video.display());
        log::info!("    Archive folder: {}", self.archive_folder.display());
    }

    fn ensure_ready(&mut self) -> CoreResult<()> {
        if !self.paths_generated {
            self.generate_paths()?;
        }
        if !self.encoder_ready {
            self.setup_encoder()?;
        }
        Ok(())
    }

    /// Executes the pipeline: extract audio, encode, mux, clean up.
    ///
    /// Stages run strictly in order and the first failure aborts the rest.
    /// Encoding success is judged by the temp video existing afterwards,
    /// never by the encoder's exit code. Temp files are only cleaned up
    /// after a fully successful run, so a failed stage leaves its
    /// intermediates behind for inspection.
    pub fn run(&mut self) -> CoreResult<()> {
        self.ensure_ready()?;
        self.create_missing_directories()?;

        let input = self
            .input_container
            .as_ref()
            .expect("input container is set once paths are generated");
        log::info!("Extracting audio from {}", self.source_video.display());
        input.extract_audio(&self.source_video, &self.source_audio, &self.temp_folder)?;

        let encoder = self
            .encoder
            .as_ref()
            .expect("encoder is set once setup_encoder succeeds");
        if !encoder.process_ready() {
            return Err(CoreError::Process(
                "encoder process is not ready".to_string(),
            ));
        }
        encoder.start_process()?;
        if !self.temp_video.is_file() {
            let message = format!(
                "encoder did not produce {}",
                self.temp_video.display()
            );
            log::error!("{message}");
            return Err(CoreError::Process(message));
        }

        let output = self
            .output_container
            .as_ref()
            .expect("output container is set once paths are generated");
        output.mux_audio(
            &self.temp_video,
            &self.source_audio,
            &self.output_video,
            &self.temp_folder,
        )?;

        self.clean_up()
    }

    /// Removes the intermediates this job produced: the generated script,
    /// the extracted audio, encoder sidecar indexes, the temp video, and
    /// the temp directory when this job created it.
    pub fn clean_up(&mut self) -> CoreResult<()> {
        if self.generated_script {
            remove_if_exists(&self.source_script)?;
        }
        remove_if_exists(&self.source_audio)?;
        for suffix in SIDECAR_SUFFIXES {
            remove_if_exists(&append_suffix(&self.source_video, suffix))?;
        }
        remove_if_exists(&self.temp_video)?;
        if self.temp_folder_created && self.temp_folder.is_dir() {
            fs::remove_dir_all(&self.temp_folder)?;
            self.temp_folder_created = false;
        }
        Ok(())
    }

    /// Moves the source video into the archive folder.
    ///
    /// A source already sitting in the archive folder counts as archived.
    /// The move is only reported successful when the file exists at the
    /// destination afterwards.
    pub fn archive_source(&self) -> CoreResult<()> {
        if !self.paths_generated {
            return Err(CoreError::Path(
                "unable to archive, paths not generated".to_string(),
            ));
        }
        if !self.archive_folder.is_dir() {
            return Err(CoreError::Path(format!(
                "archive folder does not exist: {}",
                self.archive_folder.display()
            )));
        }
        let destination = self.archive_folder.join(file_name_of(&self.source_video)?);
        if destination == self.source_video {
            log::info!("Source video is already in the archive folder");
            return Ok(());
        }
        log::info!(
            "Archiving {} to {}",
            self.source_video.display(),
            destination.display()
        );
        fs::rename(&self.source_video, &destination)?;
        if destination.is_file() {
            Ok(())
        } else {
            Err(CoreError::Process(format!(
                "source video not found in archive folder: {}",
                destination.display()
            )))
        }
    }
}

/// Creates `dir` and its parents when missing. Returns whether anything was
/// created.
fn create_folder(dir: &Path) -> CoreResult<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(dir)?;
    log::debug!("Created directory {}", dir.display());
    Ok(true)
}

fn remove_if_exists(path: &Path) -> CoreResult<()> {
    if path.is_file() {
        fs::remove_file(path)?;
        log::debug!("Removed {}", path.display());
    }
    Ok(())
}

fn file_name_of(path: &Path) -> CoreResult<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| CoreError::Path(format!("path has no file name: {}", path.display())))
}

/// Writes the encoder script for `source` by substituting the video-path
/// placeholder in every line of the template.
fn generate_script(template: &Path, source: &Path, dest: &Path) -> CoreResult<()> {
    log::info!(
        "Generating script from {} to {}",
        template.display(),
        dest.display()
    );
    let contents = fs::read_to_string(template)?;
    let source_path = source.to_string_lossy();
    let mut script = String::new();
    for line in contents.lines() {
        script.push_str(&line.replace(VIDEO_FILE_TOKEN, &source_path));
        script.push('\n');
    }
    fs::write(dest, script)?;
    if dest.is_file() {
        Ok(())
    } else {
        Err(CoreError::Path(format!(
            "generated script does not exist: {}",
            dest.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsMap;
    use std::fs::File;

    /// Working folder with a source video, a script template, and stand-in
    /// container/encoder tool files.
    struct Fixture {
        dir: tempfile::TempDir,
        store: SettingsStore,
    }

    fn fixture(source_name: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().to_string_lossy().into_owned();
        File::create(dir.path().join(source_name)).unwrap();
        fs::write(
            dir.path().join("template.avs"),
            "LoadPlugin(\"lsmash\")\nLWLibavVideoSource(\"--VideoFile--\")\n",
        )
        .unwrap();
        for tool in ["mkvmerge", "mkvextract", "MP4Box", "x264"] {
            File::create(dir.path().join(tool)).unwrap();
        }
        let template = format!("{work}/template.avs");
        let mp4box = format!("{work}/MP4Box");
        let x264 = format!("{work}/x264");
        let raw = SettingsMap::from_iter([
            ("profiles", "p1"),
            ("p1_name", "p1"),
            ("workingFolder", work.as_str()),
            ("outputType", "mkv"),
            ("encoder", "x264"),
            ("avsTemplate", template.as_str()),
            ("mkvToolsPath", work.as_str()),
            ("mp4boxPath", mp4box.as_str()),
            ("x264_EncoderPath", x264.as_str()),
            ("x264_crf", "24"),
        ]);
        let store = SettingsStore::new(&raw);
        Fixture { dir, store }
    }

    impl Fixture {
        fn job(&self, source_name: &str) -> Job {
            Job::new(self.dir.path().join(source_name), &self.store, "p1")
        }
    }

    #[test]
    fn generate_paths_requires_an_existing_source() {
        let fx = fixture("movie.mp4");
        let mut job = fx.job("missing.mp4");
        assert!(matches!(job.generate_paths(), Err(CoreError::Path(_))));
        assert!(!job.paths_generated());
    }

    #[test]
    fn generate_paths_derives_the_expected_set() {
        let fx = fixture("movie.mp4");
        let mut job = fx.job("movie.mp4");
        job.generate_paths().unwrap();

        let work = fx.dir.path();
        assert!(job.paths_generated());
        assert_eq!(job.output_video(), Some(work.join("movie.mkv").as_path()));
        assert_eq!(
            job.temp_video(),
            Some(work.join("Temp").join("Temp-movie.mp4").as_path())
        );
        assert_eq!(
            job.source_script(),
            Some(work.join("Temp").join("movie.avs").as_path())
        );
        // The generated script carries the source path instead of the token
        let script = fs::read_to_string(work.join("Temp").join("movie.avs")).unwrap();
        assert!(script.contains(&work.join("movie.mp4").to_string_lossy().into_owned()));
        assert!(!script.contains("--VideoFile--"));
    }

    #[test]
    fn generate_paths_rejects_unsupported_sources() {
        let fx = fixture("movie.webm");
        let mut job = fx.job("movie.webm");
        assert!(matches!(job.generate_paths(), Err(CoreError::Container(_))));
        assert!(!job.paths_generated());
    }

    #[test]
    fn output_path_is_disambiguated_against_existing_files() {
        let fx = fixture("movie.mkv");
        // The source itself occupies movie.mkv, so the output moves to (2);
        // a leftover (2) pushes it further.
        let mut job = fx.job("movie.mkv");
        job.generate_paths().unwrap();
        assert_eq!(
            job.output_video(),
            Some(fx.dir.path().join("movie(2).mkv").as_path())
        );

        File::create(fx.dir.path().join("movie(2).mkv")).unwrap();
        let mut job = fx.job("movie.mkv");
        job.generate_paths().unwrap();
        assert_eq!(
            job.output_video(),
            Some(fx.dir.path().join("movie(3).mkv").as_path())
        );
    }

    #[test]
    fn setup_encoder_requires_generated_paths() {
        let fx = fixture("movie.mp4");
        let mut job = fx.job("movie.mp4");
        assert!(matches!(job.setup_encoder(), Err(CoreError::Config(_))));
        assert!(!job.encoder_ready());
    }

    #[test]
    fn setup_encoder_corrects_the_temp_video_extension() {
        let fx = fixture("movie.mp4");
        let mut job = fx.job("movie.mp4");
        job.generate_paths().unwrap();
        job.setup_encoder().unwrap();
        // x264 writes a raw stream by default, not the container's extension
        assert_eq!(
            job.temp_video(),
            Some(fx.dir.path().join("Temp").join("Temp-movie.264").as_path())
        );
        assert!(job.encoder_ready());
    }

    #[test]
    fn clean_up_removes_generated_artifacts() {
        let fx = fixture("movie.mp4");
        let mut job = fx.job("movie.mp4");
        job.generate_paths().unwrap();
        job.setup_encoder().unwrap();
        job.create_missing_directories().unwrap();

        let temp = fx.dir.path().join("Temp");
        File::create(temp.join("movie.aac")).unwrap();
        File::create(temp.join("Temp-movie.264")).unwrap();
        File::create(fx.dir.path().join("movie.mp4.lwi")).unwrap();

        job.clean_up().unwrap();
        assert!(!temp.exists());
        assert!(!fx.dir.path().join("movie.mp4.lwi").exists());
        // The source itself is untouched
        assert!(fx.dir.path().join("movie.mp4").is_file());
    }

    #[test]
    fn clean_up_keeps_a_preexisting_temp_folder() {
        let fx = fixture("movie.mp4");
        let temp = fx.dir.path().join("Temp");
        fs::create_dir(&temp).unwrap();

        let mut job = fx.job("movie.mp4");
        job.generate_paths().unwrap();
        job.clean_up().unwrap();
        assert!(temp.is_dir());
    }

    #[test]
    fn archive_source_moves_the_file() {
        let fx = fixture("movie.mp4");
        let mut job = fx.job("movie.mp4");
        job.generate_paths().unwrap();
        job.create_missing_directories().unwrap();

        job.archive_source().unwrap();
        assert!(!fx.dir.path().join("movie.mp4").exists());
        assert!(fx.dir.path().join("Archive").join("movie.mp4").is_file());
    }

    #[test]
    fn archive_source_accepts_an_already_archived_file() {
        let fx = fixture("movie.mp4");
        let archive = fx.dir.path().join("Archive");
        fs::create_dir(&archive).unwrap();
        fs::rename(
            fx.dir.path().join("movie.mp4"),
            archive.join("movie.mp4"),
        )
        .unwrap();

        let mut job = fx.job("Archive/movie.mp4");
        job.generate_paths().unwrap();
        job.archive_source().unwrap();
        assert!(archive.join("movie.mp4").is_file());
    }

    #[test]
    fn run_fails_fast_when_extraction_fails() {
        let fx = fixture("movie.mp4");
        // Remove the mp4box tool so audio extraction can't start
        fs::remove_file(fx.dir.path().join("MP4Box")).unwrap();
        let mut job = fx.job("movie.mp4");
        assert!(matches!(job.run(), Err(CoreError::Container(_))));
        // Failure leaves the generated script in place for inspection
        assert!(fx.dir.path().join("Temp").join("movie.avs").is_file());
    }
}
