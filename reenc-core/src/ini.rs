//! Flat `key=value` configuration loading.
//!
//! Settings live in a base file holding the defaults plus an optional
//! `_local` override file next to it for user customisation. Parsing is
//! deliberately forgiving: section headers and comments are skipped, and a
//! malformed line is logged and dropped rather than aborting the load.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CoreResult;
use crate::settings::SettingsMap;

/// Default base config file name, looked up in the current directory.
pub const BASE_CONFIG_NAME: &str = "reenc.ini";

/// Settings written out when no base config file exists yet.
const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    ("encoder", "x264"),
    ("outputType", "mkv"),
    ("debugLevel", "info"),
    ("avsTemplate", "./reencode.avs.template"),
    ("mkvToolsPath", "/usr/bin"),
    ("mp4boxPath", "/usr/bin/MP4Box"),
    ("x264_EncoderPath", "/usr/bin/x264"),
    ("x264_crf", "24"),
    ("x264_preset", "medium"),
    ("x265_EncoderPath", "/usr/bin/x265"),
    ("x265_avs4x26xPath", "/usr/bin/avs4x26x"),
    ("x265_crf", "20"),
    ("x265_preset", "medium"),
];

/// Reads the base config file, generating it from the defaults table first
/// when it doesn't exist, then merges the local override file on top.
pub fn load_or_init(base: &Path) -> CoreResult<SettingsMap> {
    if !base.is_file() {
        generate_default_config(base)?;
    }
    read_config(base)
}

/// Reads the base config file and merges the local override file on top,
/// when one exists. Override values win key by key.
pub fn read_config(base: &Path) -> CoreResult<SettingsMap> {
    let mut settings = read_config_file(base)?;
    let local = local_override_path(base);
    if local.is_file() {
        log::debug!("Merging local overrides from {}", local.display());
        let overrides = read_config_file(&local)?;
        for (key, value) in overrides.iter() {
            settings.insert(key, value);
        }
    }
    Ok(settings)
}

/// Parses one flat `key=value` file into a [`SettingsMap`].
///
/// Lines starting with `[` or `#` are skipped; a line without `=` is logged
/// and skipped. Later duplicates of a key overwrite earlier ones.
pub fn read_config_file(path: &Path) -> CoreResult<SettingsMap> {
    let contents = fs::read_to_string(path)?;
    let mut settings = SettingsMap::new();
    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('[') || line.starts_with('#') {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => {
                match settings.insert(key, value) {
                    None => log::debug!("Key: {key} added to settings"),
                    Some(old) => log::debug!("Key: {key} changed from {old} to {value}"),
                }
            }
            None => log::warn!(
                "Line {} of {} is not valid and will be skipped: {line}",
                number + 1,
                path.display()
            ),
        }
    }
    Ok(settings)
}

/// Writes the built-in defaults table as a fresh config file.
pub fn generate_default_config(path: &Path) -> CoreResult<()> {
    log::warn!("Generating default config file at {}", path.display());
    let mut contents = String::new();
    for (key, value) in DEFAULT_SETTINGS {
        contents.push_str(key);
        contents.push('=');
        contents.push_str(value);
        contents.push('\n');
    }
    fs::write(path, contents)?;
    Ok(())
}

/// The user-override file sitting next to `base`: `reenc.ini` pairs with
/// `reenc_local.ini`.
#[must_use]
pub fn local_override_path(base: &Path) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = base
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    base.with_file_name(format!("{stem}_local{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parses_flat_key_value_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reenc.ini");
        fs::write(
            &path,
            "encoder=x264\n\
             # a comment\n\
             [section headers are noise]\n\
             outputType=mkv\n\
             broken line without equals\n\
             encoder=x265\n",
        )
        .unwrap();

        let settings = read_config_file(&path).unwrap();
        assert_eq!(settings.len(), 2);
        assert_eq!(settings.get("outputType"), Some("mkv"));
        // Later duplicate wins
        assert_eq!(settings.get("encoder"), Some("x265"));
    }

    #[test]
    fn values_may_contain_equals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reenc.ini");
        fs::write(&path, "x264_custom=--tune film --opts a=b\n").unwrap();
        let settings = read_config_file(&path).unwrap();
        assert_eq!(settings.get("x264_custom"), Some("--tune film --opts a=b"));
    }

    #[test]
    fn local_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("reenc.ini");
        fs::write(&base, "encoder=x264\noutputType=mkv\n").unwrap();
        fs::write(dir.path().join("reenc_local.ini"), "encoder=x265\n").unwrap();

        let settings = read_config(&base).unwrap();
        assert_eq!(settings.get("encoder"), Some("x265"));
        assert_eq!(settings.get("outputType"), Some("mkv"));
    }

    #[test]
    fn load_or_init_generates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("reenc.ini");
        let settings = load_or_init(&base).unwrap();
        assert!(base.is_file());
        assert_eq!(settings.get("encoder"), Some("x264"));
        assert_eq!(settings.get("x264_crf"), Some("24"));
    }

    #[test]
    fn override_path_follows_base_name() {
        assert_eq!(
            local_override_path(Path::new("/etc/reenc.ini")),
            PathBuf::from("/etc/reenc_local.ini")
        );
        assert_eq!(
            local_override_path(Path::new("custom.ini")),
            PathBuf::from("custom_local.ini")
        );
    }
}
