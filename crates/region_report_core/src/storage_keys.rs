use chrono::{DateTime, Utc};

/// Seconds resolution keeps archive keys unique at one run per second.
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";

const LATEST_SUFFIXES: &[&str] = &["-latest", "_latest", ".latest"];

/// Joins a prefix and a name with exactly one `/` between them. An empty
/// prefix yields the bare name.
pub fn join_key(prefix: &str, name: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if trimmed.is_empty() {
        name.to_string()
    } else {
        format!("{trimmed}/{name}")
    }
}

/// Normalized form of a listing prefix: empty, or ending in exactly one `/`.
pub fn directory_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

pub fn latest_object_key(report_prefix: &str, latest_filename: &str) -> String {
    join_key(report_prefix, latest_filename)
}

pub fn archive_object_key(
    archive_prefix: &str,
    base_name: &str,
    extension: &str,
    generated_at: DateTime<Utc>,
) -> String {
    let timestamp = generated_at.format(ARCHIVE_TIMESTAMP_FORMAT);
    let extension = extension.trim_start_matches('.');
    join_key(archive_prefix, &format!("{base_name}-{timestamp}.{extension}"))
}

/// Splits `name.ext` into stem and extension; names without a dot have an
/// empty extension.
pub fn split_filename(filename: &str) -> (&str, &str) {
    match filename.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, extension),
        _ => (filename, ""),
    }
}

/// Archive base name derived from the latest filename: the stem with any
/// trailing `-latest` marker removed.
pub fn archive_basename(latest_filename: &str) -> String {
    let (stem, _) = split_filename(latest_filename);
    LATEST_SUFFIXES
        .iter()
        .find_map(|suffix| stem.strip_suffix(suffix))
        .filter(|base| !base.is_empty())
        .unwrap_or(stem)
        .to_string()
}

/// Whether a listed key is an archived artifact subject to retention: under
/// the archive prefix, not the latest key, not a directory marker.
pub fn is_archive_candidate(key: &str, archive_prefix: &str, latest_key: &str) -> bool {
    key.starts_with(&directory_prefix(archive_prefix))
        && key != latest_key
        && !key.ends_with('/')
}

pub fn s3_uri(bucket: &str, key: &str) -> String {
    format!("s3://{bucket}/{}", key.trim_start_matches('/'))
}
