//! Placeholder-tag extraction for configuration values.
//!
//! Setting values may reference other settings with `<name>` placeholders
//! (e.g. `toolsFolder=<workingFolder>/tools`). This module finds those
//! references; substitution lives on [`crate::settings::SettingsMap`].

/// Default opening marker for a tag.
pub const OPEN_MARKER: &str = "<";
/// Default closing marker for a tag.
pub const CLOSE_MARKER: &str = ">";

/// Returns the tags found in `line` using the default `<`/`>` markers,
/// in order of first occurrence. Duplicates are preserved.
#[must_use]
pub fn find_tags(line: &str) -> Vec<String> {
    find_tags_bounded(line, OPEN_MARKER, CLOSE_MARKER)
}

/// Returns the tags found in `line` delimited by `open`/`close` marker pairs.
///
/// Scanning runs left to right. A candidate containing a space is not a tag
/// (markers show up in ordinary command-line text) and the scan resumes just
/// past the failed open marker. An open marker with no following close
/// marker ends the scan; a close marker with no preceding open marker is
/// ignored.
#[must_use]
pub fn find_tags_bounded(line: &str, open: &str, close: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut rest = line;
    while let Some(start) = rest.find(open) {
        rest = &rest[start + open.len()..];
        let Some(end) = rest.find(close) else {
            break;
        };
        let candidate = &rest[..end];
        if candidate.is_empty() || candidate.contains(' ') {
            continue;
        }
        tags.push(candidate.to_string());
        rest = &rest[end + close.len()..];
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_TAG: &str = "StartTag";
    const MIDDLE_TAG: &str = "MiddleTag";
    const END_TAG: &str = "EndTag";

    #[test]
    fn no_tags() {
        let line = "--colormatrix bt709 --range pc --input - range pc --seek 2500 --frames 300";
        assert!(find_tags(line).is_empty());
        assert!(find_tags_bounded(line, "%", "%").is_empty());
    }

    #[test]
    fn one_tag() {
        // One tag at the end, identical bounds
        let line = format!("--colormatrix bt709 --seek 2500 --frames 300 ^{END_TAG}^");
        assert_eq!(find_tags_bounded(&line, "^", "^"), vec![END_TAG]);

        // One tag at the beginning, default bounds
        let line = format!("<{START_TAG}> --colormatrix bt709 --seek 2500 --frames 300");
        assert_eq!(find_tags(&line), vec![START_TAG]);

        // One tag in the middle, default bounds
        let line = format!("--colormatrix bt709 <{MIDDLE_TAG}> --input - range pc --frames 300");
        assert_eq!(find_tags(&line), vec![MIDDLE_TAG]);
    }

    #[test]
    fn half_tags() {
        // Close marker only
        let line = format!("--colormatrix bt709 --frames 300 {END_TAG}>");
        assert!(find_tags(&line).is_empty());

        // Open marker only
        let line = format!("<{START_TAG} --colormatrix bt709 --frames 300");
        assert!(find_tags(&line).is_empty());

        // Half tag at the start, full tag in the middle
        let line = format!("<{START_TAG} --colormatrix bt709 <{MIDDLE_TAG}> --input - range pc");
        assert_eq!(find_tags(&line), vec![MIDDLE_TAG]);

        // Half tag at the start, full tag at the end, identical bounds
        let line = format!("^{START_TAG} --colormatrix bt709 --frames 300 ^{END_TAG}^");
        assert_eq!(find_tags_bounded(&line, "^", "^"), vec![END_TAG]);

        // Full, half, full: the unclosed middle candidate swallows up to the
        // next close marker, contains spaces, and is discarded
        let line =
            format!("<{START_TAG}> --colormatrix bt709 <{MIDDLE_TAG} --seek 2500 <{END_TAG}>");
        assert_eq!(find_tags(&line), vec![START_TAG, END_TAG]);

        // Full, half-open middle, half-close end
        let line =
            format!("<{START_TAG}> --colormatrix bt709 <{MIDDLE_TAG} --seek 2500 {END_TAG}>");
        assert_eq!(find_tags(&line), vec![START_TAG]);
    }

    #[test]
    fn multiple_tags() {
        let line = format!("<{START_TAG}> --range pc <{MIDDLE_TAG}> --frames 300 <{END_TAG}>");
        assert_eq!(find_tags(&line), vec![START_TAG, MIDDLE_TAG, END_TAG]);
    }

    #[test]
    fn duplicate_tags_preserved() {
        let line = format!("<{START_TAG}> --range pc <{START_TAG}>");
        assert_eq!(find_tags(&line), vec![START_TAG, START_TAG]);
    }

    #[test]
    fn candidate_with_space_is_rejected() {
        assert!(find_tags("<not a tag>").is_empty());
        // Rejection must not hide a later valid tag
        let line = format!("<not a tag> <{END_TAG}>");
        assert_eq!(find_tags(&line), vec![END_TAG]);
    }

    #[test]
    fn empty_pair_is_skipped() {
        assert!(find_tags("<>").is_empty());
        let line = format!("<> --range pc <{END_TAG}>");
        assert_eq!(find_tags(&line), vec![END_TAG]);
    }

    #[test]
    fn order_matches_first_occurrence() {
        let line = format!("pre <{END_TAG}> mid <{START_TAG}> post");
        assert_eq!(find_tags(&line), vec![END_TAG, START_TAG]);
    }
}
