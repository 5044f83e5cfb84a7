//! MP4 container adapter, backed by a single multiplexer executable.

use std::path::{Path, PathBuf};

use crate::container::{ensure_extension, VideoContainer};
use crate::error::{CoreError, CoreResult};
use crate::external;
use crate::settings::SettingsStore;

const EXTENSION: &str = ".mp4";

/// Adapter for `.mp4` files. Needs the path to the mp4box executable
/// (`mp4boxPath` setting).
pub struct Mp4Container {
    mp4box: Option<PathBuf>,
}

impl Mp4Container {
    #[must_use]
    pub fn from_settings(settings: &SettingsStore) -> Self {
        let mp4box = settings.get("mp4boxPath").map(PathBuf::from);
        if mp4box.is_none() {
            log::error!("mp4boxPath is not configured");
        }
        Self { mp4box }
    }
}

// mp4box can't handle a temp folder path that ends with a separator.
fn temp_arg(temp_dir: &Path) -> String {
    let temp = temp_dir.to_string_lossy().into_owned();
    match temp.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
        _ => temp,
    }
}

impl VideoContainer for Mp4Container {
    fn file_extension(&self) -> &'static str {
        EXTENSION
    }

    fn check_settings(&self) -> bool {
        match &self.mp4box {
            Some(path) if path.is_file() => true,
            Some(path) => {
                log::error!("Cannot find mp4box at {}", path.display());
                false
            }
            None => false,
        }
    }

    fn extract_audio(
        &self,
        source_video: &Path,
        dest_audio: &Path,
        temp_dir: &Path,
    ) -> CoreResult<()> {
        if !self.check_settings() {
            return Err(CoreError::Container("mp4box is not available".to_string()));
        }
        ensure_extension(source_video, EXTENSION, "Source video")?;

        let tool = self.mp4box.as_ref().expect("checked by check_settings");
        let args = vec![
            "-tmp".to_string(),
            temp_arg(temp_dir),
            "-raw".to_string(),
            "2".to_string(),
            source_video.to_string_lossy().into_owned(),
            "-out".to_string(),
            dest_audio.to_string_lossy().into_owned(),
        ];
        log::info!("Extracting audio from {}", source_video.display());
        external::run_tool(tool, &args, None)?;

        if dest_audio.is_file() {
            Ok(())
        } else {
            Err(CoreError::Process(format!(
                "mp4box did not produce {}",
                dest_audio.display()
            )))
        }
    }

    fn mux_audio(
        &self,
        temp_video: &Path,
        source_audio: &Path,
        output_video: &Path,
        temp_dir: &Path,
    ) -> CoreResult<()> {
        if !self.check_settings() {
            return Err(CoreError::Container("mp4box is not available".to_string()));
        }
        ensure_extension(output_video, EXTENSION, "Output video")?;

        let tool = self.mp4box.as_ref().expect("checked by check_settings");
        let args = vec![
            "-tmp".to_string(),
            temp_arg(temp_dir),
            "-add".to_string(),
            temp_video.to_string_lossy().into_owned(),
            "-add".to_string(),
            source_audio.to_string_lossy().into_owned(),
            output_video.to_string_lossy().into_owned(),
        ];
        log::info!("Muxing audio into {}", output_video.display());
        external::run_tool(tool, &args, None)?;

        if output_video.is_file() {
            Ok(())
        } else {
            Err(CoreError::Process(format!(
                "mp4box did not produce {}",
                output_video.display()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsMap;
    use std::fs::File;

    #[test]
    fn temp_arg_strips_trailing_separator() {
        assert_eq!(temp_arg(Path::new("/work/Temp/")), "/work/Temp");
        assert_eq!(temp_arg(Path::new("/work/Temp")), "/work/Temp");
        assert_eq!(temp_arg(Path::new("/")), "/");
    }

    #[test]
    fn check_settings_requires_existing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("MP4Box");

        let store = SettingsStore::new(&SettingsMap::from_iter([(
            "mp4boxPath",
            tool.to_string_lossy().as_ref(),
        )]));
        let container = Mp4Container::from_settings(&store);
        assert!(!container.check_settings());

        File::create(&tool).unwrap();
        assert!(container.check_settings());
    }

    #[test]
    fn mux_rejects_wrong_output_extension() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("MP4Box");
        File::create(&tool).unwrap();
        let store = SettingsStore::new(&SettingsMap::from_iter([(
            "mp4boxPath",
            tool.to_string_lossy().as_ref(),
        )]));
        let container = Mp4Container::from_settings(&store);
        let result = container.mux_audio(
            Path::new("temp.mp4"),
            Path::new("audio.aac"),
            Path::new("out.mkv"),
            dir.path(),
        );
        assert!(matches!(result, Err(CoreError::Container(_))));
    }
}
