//! Container format adapters.
//!
//! A [`VideoContainer`] wraps the format-specific external tooling needed to
//! pull the audio stream out of a source file and to remux encoded video
//! with that audio. Adapters are chosen by file extension through a small
//! registry; an extension with no registered adapter is an explicit error,
//! never a silent fallback.

mod matroska;
mod mp4;

pub use matroska::MatroskaContainer;
pub use mp4::Mp4Container;

use std::path::Path;

use crate::error::{CoreError, CoreResult};
use crate::paths::has_extension;
use crate::settings::SettingsStore;

/// Capability set of a container format.
///
/// The extract and mux operations block until the underlying tool exits and
/// judge success by the expected output file existing afterwards; tool exit
/// codes alone are not trusted.
pub trait VideoContainer {
    /// The file extension this adapter handles, in `.ext` form.
    fn file_extension(&self) -> &'static str;

    /// Validates that the required external tools exist on disk, logging
    /// each missing piece. Extract and mux short-circuit when this fails.
    fn check_settings(&self) -> bool;

    /// Extracts the audio track of `source_video` to `dest_audio`.
    fn extract_audio(
        &self,
        source_video: &Path,
        dest_audio: &Path,
        temp_dir: &Path,
    ) -> CoreResult<()>;

    /// Muxes `temp_video` and `source_audio` into `output_video`.
    fn mux_audio(
        &self,
        temp_video: &Path,
        source_audio: &Path,
        output_video: &Path,
        temp_dir: &Path,
    ) -> CoreResult<()>;
}

type ContainerCtor = fn(&SettingsStore) -> Box<dyn VideoContainer>;

/// Extension-keyed registry of the known container adapters.
const CONTAINER_REGISTRY: &[(&str, ContainerCtor)] = &[
    (".mkv", |settings| {
        Box::new(MatroskaContainer::from_settings(settings))
    }),
    (".mp4", |settings| Box::new(Mp4Container::from_settings(settings))),
];

/// Builds the container adapter matching `video`'s extension.
pub fn container_for(
    video: &Path,
    settings: &SettingsStore,
) -> CoreResult<Box<dyn VideoContainer>> {
    for (extension, constructor) in CONTAINER_REGISTRY {
        if has_extension(video, extension) {
            return Ok(constructor(settings));
        }
    }
    Err(CoreError::Container(format!(
        "invalid video container type: {}",
        video.display()
    )))
}

/// Shared extension guard for the adapters: `path` must carry the adapter's
/// extension or the operation refuses to run.
pub(crate) fn ensure_extension(path: &Path, extension: &str, role: &str) -> CoreResult<()> {
    if has_extension(path, extension) {
        Ok(())
    } else {
        let message = format!(
            "{role} is not an {} file: {}",
            extension.trim_start_matches('.'),
            path.display()
        );
        log::error!("{message}");
        Err(CoreError::Container(message))
    }
}
