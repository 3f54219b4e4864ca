//! String derivations on normalized logical paths.
//!
//! Logical paths are platform neutral: forward slashes only, no repeated separators and no
//! trailing separator except for the root `/`. None of these functions touch storage.

/// Normalizes a logical path: backslashes become `/`, runs of `/` collapse, and a trailing
/// `/` is dropped unless the path is the root itself.
pub fn normalize(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    for c in path.chars() {
        let c = if c == '\\' { '/' } else { c };
        if c == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(c);
    }
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Last path segment.
pub fn name(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[index + 1..],
        None => path,
    }
}

/// Text after the last `.` of the name, empty if there is none.
pub fn extension(path: &str) -> &str {
    let name = name(path);
    match name.rfind('.') {
        Some(index) => &name[index + 1..],
        None => "",
    }
}

pub fn name_without_extension(path: &str) -> &str {
    let name = name(path);
    match name.rfind('.') {
        Some(index) => &name[..index],
        None => name,
    }
}

/// The path with the extension of its last segment removed.
pub fn path_without_extension(path: &str) -> &str {
    let extension = extension(path);
    if extension.is_empty() && !name(path).ends_with('.') {
        return path;
    }
    &path[..path.len() - extension.len() - 1]
}

/// Parent path, `None` when the path has no parent segment.
pub fn parent(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(index) => Some(&path[..index]),
        None => None,
    }
}

/// Appends `name` to `path`. An empty `path` yields `name` alone.
pub fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        normalize(name)
    } else {
        normalize(&format!("{}/{}", path, name))
    }
}
