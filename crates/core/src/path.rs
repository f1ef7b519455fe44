//! Key and prefix translation
//!
//! Maps the flat key namespace of an object store onto the folder tree the
//! browser presents, and back. Everything here is pure and deterministic:
//! no I/O, no backend calls, exhaustively unit-testable.
//!
//! Convention: a "folder" is a key prefix ending in `/`; an otherwise-empty
//! folder exists as a zero-length marker object at exactly that key.

/// One segment of a breadcrumb trail: display name plus the cumulative
/// prefix that navigating to it should list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    /// Display name of this segment
    pub name: String,
    /// Prefix to list when this segment is selected, always ending in `/`
    pub prefix: String,
}

/// Normalize a folder path so it ends in exactly one `/`.
///
/// Idempotent: applying it twice yields the same result. The empty string
/// (bucket root) is left untouched.
pub fn normalize_folder_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        // Path was nothing but separators; collapse to the root marker.
        return "/".to_string();
    }
    format!("{trimmed}/")
}

/// Split a prefix into an ordered breadcrumb trail.
///
/// Empty segments (leading, trailing, doubled separators) are dropped, and
/// each entry carries the rebuilt ancestor prefix: `"a/b/c/"` yields
/// `("a", "a/")`, `("b", "a/b/")`, `("c", "a/b/c/")`.
pub fn split_breadcrumb(prefix: &str) -> Vec<Breadcrumb> {
    let mut crumbs = Vec::new();
    let mut cumulative = String::new();

    for segment in prefix.split('/').filter(|s| !s.is_empty()) {
        cumulative.push_str(segment);
        cumulative.push('/');
        crumbs.push(Breadcrumb {
            name: segment.to_string(),
            prefix: cumulative.clone(),
        });
    }

    crumbs
}

/// Display name for an entry key.
///
/// Folder keys end in `/`, so their display name is the segment before the
/// trailing separator; file names are the last segment.
pub fn leaf_name(key: &str, is_folder: bool) -> String {
    let segments: Vec<&str> = key.split('/').collect();
    if is_folder {
        // "a/b/" splits to ["a", "b", ""]; the name is the one before last.
        segments
            .len()
            .checked_sub(2)
            .and_then(|i| segments.get(i))
            .unwrap_or(&"")
            .to_string()
    } else {
        segments.last().unwrap_or(&"").to_string()
    }
}

/// Derive a coarse content-type label from a key's extension.
///
/// This is the label the browser displays and branches on (`"txt"`,
/// `"png"`, ...), not a full MIME type. Case-insensitive, defaults to
/// `"unknown"` for keys without an extension.
pub fn content_type_hint(key: &str) -> String {
    let name = leaf_name(key, false);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => "unknown".to_string(),
    }
}

/// Join a parent prefix and a child name into a full key.
///
/// Folder children get the trailing separator so the marker convention
/// holds; inverse of [`leaf_name`] for well-formed names.
pub fn join_key(prefix: &str, name: &str, is_folder: bool) -> String {
    let base = if prefix.is_empty() {
        String::new()
    } else {
        normalize_folder_path(prefix)
    };
    if is_folder {
        format!("{base}{name}/")
    } else {
        format!("{base}{name}")
    }
}
