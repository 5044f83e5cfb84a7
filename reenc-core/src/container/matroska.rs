//! Matroska container adapter, backed by the mkvtoolnix suite.

use std::path::{Path, PathBuf};

use crate::container::{ensure_extension, VideoContainer};
use crate::error::{CoreError, CoreResult};
use crate::external;
use crate::settings::SettingsStore;

const EXTENSION: &str = ".mkv";
const MERGE_TOOL: &str = "mkvmerge";
const EXTRACT_TOOL: &str = "mkvextract";

/// Adapter for `.mkv` files. Needs a tools directory holding both the merge
/// and the extract executable (`mkvToolsPath` setting).
pub struct MatroskaContainer {
    tools_dir: Option<PathBuf>,
}

impl MatroskaContainer {
    #[must_use]
    pub fn from_settings(settings: &SettingsStore) -> Self {
        let tools_dir = settings.get("mkvToolsPath").map(PathBuf::from);
        if tools_dir.is_none() {
            log::error!("mkvToolsPath is not configured");
        }
        Self { tools_dir }
    }

    fn tool(&self, name: &str) -> Option<PathBuf> {
        self.tools_dir.as_ref().map(|dir| dir.join(name))
    }
}

impl VideoContainer for MatroskaContainer {
    fn file_extension(&self) -> &'static str {
        EXTENSION
    }

    fn check_settings(&self) -> bool {
        let Some(dir) = &self.tools_dir else {
            return false;
        };
        let mut valid = true;
        for name in [MERGE_TOOL, EXTRACT_TOOL] {
            if !dir.join(name).is_file() {
                log::error!("Cannot find {name} in {}", dir.display());
                valid = false;
            }
        }
        valid
    }

    fn extract_audio(
        &self,
        source_video: &Path,
        dest_audio: &Path,
        _temp_dir: &Path,
    ) -> CoreResult<()> {
        if !self.check_settings() {
            return Err(CoreError::Container(
                "Matroska tools are not available".to_string(),
            ));
        }
        ensure_extension(source_video, EXTENSION, "Source video")?;

        let tool = self.tool(EXTRACT_TOOL).expect("checked by check_settings");
        let args = vec![
            source_video.to_string_lossy().into_owned(),
            "tracks".to_string(),
            format!("1:{}", dest_audio.to_string_lossy()),
        ];
        log::info!("Extracting audio from {}", source_video.display());
        external::run_tool(&tool, &args, None)?;

        if dest_audio.is_file() {
            Ok(())
        } else {
            Err(CoreError::Process(format!(
                "{EXTRACT_TOOL} did not produce {}",
                dest_audio.display()
            )))
        }
    }

    fn mux_audio(
        &self,
        temp_video: &Path,
        source_audio: &Path,
        output_video: &Path,
        _temp_dir: &Path,
    ) -> CoreResult<()> {
        if !self.check_settings() {
            return Err(CoreError::Container(
                "Matroska tools are not available".to_string(),
            ));
        }
        ensure_extension(output_video, EXTENSION, "Output video")?;

        let tool = self.tool(MERGE_TOOL).expect("checked by check_settings");
        let args = vec![
            "-o".to_string(),
            output_video.to_string_lossy().into_owned(),
            "-A".to_string(),
            temp_video.to_string_lossy().into_owned(),
            source_audio.to_string_lossy().into_owned(),
        ];
        log::info!("Muxing audio into {}", output_video.display());
        external::run_tool(&tool, &args, None)?;

        if output_video.is_file() {
            Ok(())
        } else {
            Err(CoreError::Process(format!(
                "{MERGE_TOOL} did not produce {}",
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

    fn store_with_tools(dir: &Path) -> SettingsStore {
        SettingsStore::new(&SettingsMap::from_iter([(
            "mkvToolsPath",
            dir.to_string_lossy().as_ref(),
        )]))
    }

    #[test]
    fn check_settings_needs_both_tools() {
        let dir = tempfile::tempdir().unwrap();
        let container = MatroskaContainer::from_settings(&store_with_tools(dir.path()));
        assert!(!container.check_settings());

        File::create(dir.path().join(MERGE_TOOL)).unwrap();
        assert!(!container.check_settings());

        File::create(dir.path().join(EXTRACT_TOOL)).unwrap();
        assert!(container.check_settings());
    }

    #[test]
    fn check_settings_fails_without_configured_path() {
        let empty = SettingsStore::new(&SettingsMap::new());
        let container = MatroskaContainer::from_settings(&empty);
        assert!(!container.check_settings());
    }

    #[test]
    fn operations_short_circuit_on_missing_tools() {
        let dir = tempfile::tempdir().unwrap();
        let container = MatroskaContainer::from_settings(&store_with_tools(dir.path()));
        let result = container.extract_audio(
            Path::new("in.mkv"),
            Path::new("out.aac"),
            dir.path(),
        );
        assert!(matches!(result, Err(CoreError::Container(_))));
    }

    #[test]
    fn extract_rejects_wrong_source_extension() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join(MERGE_TOOL)).unwrap();
        File::create(dir.path().join(EXTRACT_TOOL)).unwrap();
        let container = MatroskaContainer::from_settings(&store_with_tools(dir.path()));
        let result = container.extract_audio(
            Path::new("in.mp4"),
            Path::new("out.aac"),
            dir.path(),
        );
        assert!(matches!(result, Err(CoreError::Container(_))));
    }
}
