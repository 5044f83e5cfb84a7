// ============================================================================
// reenc-core/src/settings.rs
// ============================================================================
//
// SETTINGS RESOLVER: Layered Settings Store with Profile Overlays
//
// This module holds the hierarchical settings resolver: a case-insensitive
// global key/value mapping plus per-profile overlays derived from
// `<profileId>_name` / `<profileId>_<key>` compound keys. Values may reference
// other settings with `<name>` placeholder tags; those are resolved once,
// at construction time.
//
// KEY COMPONENTS:
// - SettingsMap: case-insensitive string map, last-write-wins
// - SettingsStore: globals + profile overlays + encoder projections
// - debug_level_from: maps the debugLevel setting onto log::LevelFilter
//
// DESIGN NOTES:
// Profile overlays are derived exactly once, when the store is built, and
// every projection handed out is a fresh copy. A store is read-only after
// construction; jobs clone it and fix their active profile on the clone.
//
// AI-ASSISTANT-INFO: Layered settings resolver with profile overlays

use std::collections::HashMap;
use std::ops::RangeInclusive;

use log::LevelFilter;

use crate::error::{CoreError, CoreResult};
use crate::paths::{dir_string, join_paths};
use crate::tags;

/// Token in a setting value that expands to the process working directory.
const EXE_PATH_TOKEN: &str = "%EXEPATH%";

/// Marker at the start of a setting value that expands to the working folder.
const RELATIVE_MARKER: &str = "./";

// ============================================================================
// SETTINGS MAP
// ============================================================================

/// Case-insensitive string-to-string mapping with last-write-wins inserts.
///
/// Keys are normalised to lowercase on insert; values keep their case.
#[derive(Debug, Clone, Default)]
pub struct SettingsMap {
    entries: HashMap<String, String>,
}

impl SettingsMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `key`. Returns the previous value, if any.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.to_lowercase(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&key.to_lowercase()).map(String::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    /// Iterates over `(lowercased key, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves `<tag>` placeholders in `value` against this mapping.
    ///
    /// Single non-recursive pass: each distinct tag found in `value` is
    /// replaced by its mapped value once; tags inside the replacement text
    /// are left alone. Tags with no mapping entry stay as written.
    #[must_use]
    pub fn resolve_tags(&self, value: &str) -> String {
        let mut result = value.to_string();
        let mut seen: Vec<String> = Vec::new();
        for tag in tags::find_tags(value) {
            if seen.iter().any(|t| t == &tag) {
                continue;
            }
            if let Some(replacement) = self.get(&tag) {
                result = result.replace(&format!("<{tag}>"), replacement);
            }
            seen.push(tag);
        }
        result
    }

    /// Resolves tags in every value, each against a snapshot of the map as
    /// it was when the pass started.
    pub fn resolve_all_tags(&mut self) {
        let snapshot = self.clone();
        for value in self.entries.values_mut() {
            *value = snapshot.resolve_tags(value);
        }
    }

    /// Parses a boolean setting. Unparseable values are logged and read as
    /// absent.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        let raw = self.get(key)?;
        match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => {
                log::warn!("Setting '{key}' is not a boolean: {raw}");
                None
            }
        }
    }

    /// Parses an integer setting and checks it against `range`. Values that
    /// fail to parse or fall outside the range are logged and read as
    /// absent.
    #[must_use]
    pub fn get_int_in_range(&self, key: &str, range: RangeInclusive<i64>) -> Option<i64> {
        let raw = self.get(key)?;
        match raw.parse::<i64>() {
            Ok(value) if range.contains(&value) => Some(value),
            Ok(value) => {
                log::warn!(
                    "Setting '{key}' out of range ({}-{}): {value}",
                    range.start(),
                    range.end()
                );
                None
            }
            Err(_) => {
                log::warn!("Setting '{key}' is not an integer: {raw}");
                None
            }
        }
    }
}

impl FromIterator<(String, String)> for SettingsMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(&k, v);
        }
        map
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for SettingsMap {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

// ============================================================================
// SETTINGS STORE
// ============================================================================

/// Layered settings: globals plus per-profile overlays.
///
/// Built once from the flat mapping the config loader produced. Construction
/// rewrites path arguments, resolves placeholder tags, and derives the
/// profile overlays; the store never changes afterwards.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    globals: SettingsMap,
    /// Profile display name -> profile id key (e.g. "profile1").
    profile_ids: SettingsMap,
    /// Lowercased profile name -> overlay with the id prefix stripped.
    profiles: HashMap<String, SettingsMap>,
    active_profile: Option<String>,
}

impl SettingsStore {
    /// Builds a store from the merged flat mapping.
    ///
    /// Steps, in order: copy every entry applying the path-argument rewrite
    /// (`./` prefix and `%EXEPATH%` token), resolve placeholder tags against
    /// the rewritten snapshot, then derive the profile overlays.
    #[must_use]
    pub fn new(raw: &SettingsMap) -> Self {
        let exe_dir = std::env::current_dir()
            .map(|d| d.to_string_lossy().into_owned())
            .unwrap_or_default();
        let working_folder = raw
            .get("workingFolder")
            .map(|w| dir_string(&replace_path_token(w, EXE_PATH_TOKEN, &exe_dir)));

        let mut rewritten = SettingsMap::new();
        for (key, value) in raw.iter() {
            rewritten.insert(
                key,
                replace_path_args(value, working_folder.as_deref(), &exe_dir),
            );
        }

        let snapshot = rewritten.clone();
        let mut globals = SettingsMap::new();
        for (key, value) in rewritten.iter() {
            globals.insert(key, snapshot.resolve_tags(value));
        }

        let (profile_ids, profiles) = populate_profiles(&globals);
        Self {
            globals,
            profile_ids,
            profiles,
            active_profile: None,
        }
    }

    /// The profile used for layered lookups, if one is set.
    #[must_use]
    pub fn active_profile(&self) -> Option<&str> {
        self.active_profile.as_deref()
    }

    /// Sets the profile used for layered lookups. An unknown name clears the
    /// active profile and is logged.
    pub fn set_active_profile(&mut self, name: &str) {
        if self.profiles.contains_key(&name.to_lowercase()) {
            self.active_profile = Some(name.to_string());
        } else {
            if !name.is_empty() {
                log::warn!("Unknown profile selected: {name}");
            }
            self.active_profile = None;
        }
    }

    /// Layered lookup: the active profile's overlay wins, then the globals.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        if let Some(profile) = &self.active_profile {
            if let Some(overlay) = self.profiles.get(&profile.to_lowercase()) {
                if let Some(value) = overlay.get(key) {
                    return Some(value);
                }
            }
        }
        self.globals.get(key)
    }

    /// Boolean variant of [`SettingsStore::get`].
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.layered_map().get_bool(key)
    }

    /// Range-checked integer variant of [`SettingsStore::get`].
    #[must_use]
    pub fn get_int_in_range(&self, key: &str, range: RangeInclusive<i64>) -> Option<i64> {
        self.layered_map().get_int_in_range(key, range)
    }

    // Typed accessors parse through a SettingsMap so the diagnostics live in
    // one place; the overlay-then-global choice happens here.
    fn layered_map(&self) -> SettingsMap {
        let mut map = self.globals.clone();
        if let Some(profile) = &self.active_profile {
            if let Some(overlay) = self.profiles.get(&profile.to_lowercase()) {
                for (k, v) in overlay.iter() {
                    map.insert(k, v);
                }
            }
        }
        map
    }

    /// Profiles selected by the `profiles` setting that actually have
    /// settings. Names with no recognised profile are logged and dropped.
    #[must_use]
    pub fn active_profiles(&self) -> Vec<String> {
        let Some(list) = self.get("profiles") else {
            return Vec::new();
        };
        let mut valid = Vec::new();
        for name in list.split(',') {
            if self.profiles.contains_key(&name.to_lowercase()) {
                valid.push(name.to_string());
            } else {
                log::warn!("Selected profile doesn't have any settings: {name}");
            }
        }
        valid
    }

    /// Profile display name -> profile id key.
    #[must_use]
    pub fn profiles_by_name(&self) -> &SettingsMap {
        &self.profile_ids
    }

    /// The id key (e.g. "profile2") behind a profile display name.
    #[must_use]
    pub fn profile_id(&self, profile_name: &str) -> Option<&str> {
        self.profile_ids.get(profile_name)
    }

    /// A fresh copy of the overlay for `profile_name`; empty when the
    /// profile is not recognised.
    #[must_use]
    pub fn profile_settings(&self, profile_name: &str) -> SettingsMap {
        self.profiles
            .get(&profile_name.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    /// Encoder types that have an executable path configured.
    #[must_use]
    pub fn encoder_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .globals
            .iter()
            .filter_map(|(k, _)| k.strip_suffix("_encoderpath").map(str::to_string))
            .collect();
        types.sort();
        types
    }

    /// Projects the settings for one encoder type.
    ///
    /// Every global key prefixed `<encoderType>_` seeds the result with the
    /// prefix stripped; the active profile's keys with the same prefix
    /// overwrite them. The result always carries a `name` entry. Fails when
    /// no global key matches the prefix at all.
    pub fn encoder_settings(&self, encoder_type: &str) -> CoreResult<SettingsMap> {
        let prefix = format!("{}_", encoder_type.to_lowercase());
        let mut projected = SettingsMap::new();
        for (key, value) in self.globals.iter() {
            if let Some(stripped) = key.strip_prefix(&prefix) {
                projected.insert(stripped, value);
            }
        }
        if projected.is_empty() {
            return Err(CoreError::Config(format!(
                "no settings found for encoder type '{encoder_type}'"
            )));
        }
        if let Some(profile) = &self.active_profile {
            for (key, value) in self.profile_settings(profile).iter() {
                if let Some(stripped) = key.strip_prefix(&prefix) {
                    projected.insert(stripped, value);
                }
            }
        }
        if !projected.contains_key("name") {
            projected.insert("name", encoder_type);
        }
        Ok(projected)
    }

    /// Single-key lookup over [`SettingsStore::encoder_settings`].
    #[must_use]
    pub fn encoder_setting(&self, encoder_type: &str, key: &str) -> Option<String> {
        let settings = self.encoder_settings(encoder_type).ok()?;
        settings.get(key).map(str::to_string)
    }

    /// Single-key encoder lookup against an explicit profile, falling back
    /// to the global encoder settings when the profile doesn't define it.
    #[must_use]
    pub fn encoder_setting_in(
        &self,
        encoder_type: &str,
        key: &str,
        profile_name: &str,
    ) -> Option<String> {
        if let Some(overlay) = self.profiles.get(&profile_name.to_lowercase()) {
            if let Some(value) = overlay.get(&format!("{encoder_type}_{key}")) {
                return Some(value.to_string());
            }
        }
        self.encoder_setting(encoder_type, key)
    }

    /// The configured log verbosity.
    #[must_use]
    pub fn debug_level(&self) -> LevelFilter {
        debug_level_from(self.get("debugLevel"))
    }
}

/// Maps the `debugLevel` setting onto a [`LevelFilter`]. Invalid values are
/// logged and fall back to `Error`, as does an absent setting.
#[must_use]
pub fn debug_level_from(value: Option<&str>) -> LevelFilter {
    match value.map(str::to_ascii_lowercase).as_deref() {
        None => LevelFilter::Error,
        Some("disabled") => LevelFilter::Off,
        Some("error") => LevelFilter::Error,
        Some("warning") => LevelFilter::Warn,
        Some("info") => LevelFilter::Info,
        Some("debug") => LevelFilter::Debug,
        Some(other) => {
            log::warn!("Invalid debug level setting: {other}, using level: Error");
            LevelFilter::Error
        }
    }
}

/// Derives the profile name->id mapping and the per-profile overlays.
///
/// A profile is recognised only when an `<id>_name` key exists; its overlay
/// collects every `<id>_*` key with the id prefix stripped.
fn populate_profiles(globals: &SettingsMap) -> (SettingsMap, HashMap<String, SettingsMap>) {
    let mut ids = SettingsMap::new();
    for (key, value) in globals.iter() {
        if let Some(id) = key.strip_suffix("_name") {
            if !id.is_empty() {
                ids.insert(value, id);
            }
        }
    }

    let mut profiles = HashMap::new();
    for (name, id) in ids.iter() {
        let prefix = format!("{id}_");
        let mut overlay = SettingsMap::new();
        for (key, value) in globals.iter() {
            if let Some(stripped) = key.strip_prefix(&prefix) {
                overlay.insert(stripped, value);
            }
        }
        profiles.insert(name.to_string(), overlay);
    }
    (ids, profiles)
}

/// Rewrites path arguments in one setting value: a leading `./` becomes the
/// working folder, and every `%EXEPATH%` token becomes the process working
/// directory. Joins are separator-correct either way.
fn replace_path_args(value: &str, working_folder: Option<&str>, exe_dir: &str) -> String {
    let mut rewritten = value.to_string();
    if let Some(rest) = value.strip_prefix(RELATIVE_MARKER) {
        match working_folder {
            Some(working) => rewritten = join_paths(working, rest),
            None => log::debug!("No workingFolder set, keeping relative value: {value}"),
        }
    }
    replace_path_token(&rewritten, EXE_PATH_TOKEN, exe_dir)
}

/// Replaces every case-insensitive occurrence of `token` with `replacement`,
/// joining the surrounding fragments with separator correction.
fn replace_path_token(value: &str, token: &str, replacement: &str) -> String {
    let mut out = value.to_string();
    while let Some(idx) = find_ignore_ascii_case(&out, token) {
        let first = join_paths(&out[..idx], replacement);
        out = join_paths(&first, &out[idx + token.len()..]);
    }
    out
}

// ASCII needles can't start or end inside a multi-byte character, so byte
// indexes from this are always valid slice boundaries.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}
