//! Path helpers for formatting and file-name derivation.
//!
//! Setting values carry paths as plain strings (they can be embedded in
//! arbitrary command-line fragments), so the joining helpers here work at
//! the string level. File-name derivation for jobs works on [`Path`]s.

use std::path::{Path, PathBuf};

/// Joins two path fragments without doubling or dropping the separator.
///
/// Either side may already carry a `/`; empty fragments pass the other side
/// through unchanged.
#[must_use]
pub fn join_paths(first: &str, second: &str) -> String {
    if first.is_empty() || second.is_empty() {
        return format!("{first}{second}");
    }
    match (first.ends_with('/'), second.starts_with('/')) {
        (true, true) => format!("{first}{}", &second[1..]),
        (false, false) => format!("{first}/{second}"),
        _ => format!("{first}{second}"),
    }
}

/// Takes a directory path and ensures it ends with `/`.
#[must_use]
pub fn dir_string(dir: &str) -> String {
    if dir.ends_with('/') {
        dir.to_string()
    } else {
        format!("{dir}/")
    }
}

/// Surrounds a path with quotes for display if it isn't already quoted.
#[must_use]
pub fn quote(path: &str) -> String {
    let mut quoted = String::new();
    if !path.starts_with('"') {
        quoted.push('"');
    }
    quoted.push_str(path);
    if !path.ends_with('"') || path.len() < 2 {
        quoted.push('"');
    }
    quoted
}

/// Normalises an extension setting value to `.ext` form.
#[must_use]
pub fn normalize_extension(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}

/// Replaces the extension of `file_name` with `new_ext` (given as `.ext`).
/// A name without an extension gets `new_ext` appended.
#[must_use]
pub fn swap_extension(file_name: &str, new_ext: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) => format!("{}{new_ext}", &file_name[..idx]),
        None => format!("{file_name}{new_ext}"),
    }
}

/// Appends `suffix` to the full file name, extension included.
/// Used for encoder sidecar index files (`video.mkv` -> `video.mkv.lwi`).
#[must_use]
pub fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}{suffix}", path.to_string_lossy()))
}

/// Returns the first collision-free output path `folder/stem.ext`,
/// appending `(2)`, `(3)`, ... before the extension until the candidate
/// does not exist. Existing outputs from earlier runs are never overwritten.
#[must_use]
pub fn next_free_path(folder: &Path, stem: &str, ext: &str) -> PathBuf {
    let mut candidate = folder.join(format!("{stem}{ext}"));
    let mut count = 2u32;
    while candidate.exists() {
        candidate = folder.join(format!("{stem}({count}){ext}"));
        count += 1;
    }
    candidate
}

/// Case-insensitive check of a path's extension against `.ext`-form `ext`.
#[must_use]
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| format!(".{e}").eq_ignore_ascii_case(ext))
}
