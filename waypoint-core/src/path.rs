//! Path string utilities: relative joins, splitting and cleanup.

/// A path string split into its components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPath {
    /// The path without query or hash.
    pub path: String,
    /// The query string without the leading `?`.
    pub query: String,
    /// The hash fragment including the leading `#`.
    pub hash: String,
}

/// Resolve `relative` against `base`.
///
/// Absolute paths are returned unchanged, `?`/`#` suffixes are appended to the
/// base, and `.`/`..` segments are applied. Unless `append` is set, the last
/// segment of `base` is dropped before joining.
pub fn resolve_path(relative: &str, base: &str, append: bool) -> String {
    if relative.starts_with('/') {
        return relative.to_string();
    }
    if relative.starts_with('?') || relative.starts_with('#') {
        return format!("{base}{relative}");
    }

    let mut stack: Vec<&str> = base.split('/').collect();
    if !append || stack.last().is_none_or(|last| last.is_empty()) {
        stack.pop();
    }

    for segment in relative.split('/') {
        match segment {
            ".." => {
                stack.pop();
            }
            "." => {}
            segment => stack.push(segment),
        }
    }

    if stack.first() != Some(&"") {
        stack.insert(0, "");
    }
    stack.join("/")
}

/// Split `path` into path, query and hash.
pub fn parse_path(path: &str) -> ParsedPath {
    let (rest, hash) = match path.find('#') {
        Some(index) => (&path[..index], &path[index..]),
        None => (path, ""),
    };
    let (path, query) = match rest.find('?') {
        Some(index) => (&rest[..index], &rest[index + 1..]),
        None => (rest, ""),
    };
    ParsedPath {
        path: path.to_string(),
        query: query.to_string(),
        hash: hash.to_string(),
    }
}

/// Collapse `//` into `/`.
pub fn clean_path(path: &str) -> String {
    path.replace("//", "/")
}
