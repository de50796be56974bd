//! Upload input helpers

/// Title stored alongside an upload: the file name without its last extension.
///
/// Names without an extension, or where stripping would leave nothing
/// (`.png`), are used as-is.
pub fn display_title_from_filename(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

/// Split a comma-separated tag field, trimming entries and dropping blanks.
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    })
    .unwrap_or_default()
}
