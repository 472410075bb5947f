//! Slash-separated workspace path helpers
//!
//! Workspace-relative paths are plain `/`-separated strings, independent of the
//! host platform. The root of the workspace is the empty string.

/// Lexically clean a path: collapse repeated slashes, drop `.` segments and
/// resolve `..` against preceding segments. Returns `"."` for an empty result.
pub fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Join path segments, ignoring empty ones, and clean the result.
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    let non_empty: Vec<&str> = segments
        .iter()
        .map(|s| s.as_ref())
        .filter(|s| !s.is_empty())
        .collect();

    if non_empty.is_empty() {
        return String::new();
    }

    clean(&non_empty.join("/"))
}

/// The parent directory of a path, `"."` when there is none.
pub fn dir(path: &str) -> String {
    match path.rfind('/') {
        Some(0) => "/".to_string(),
        Some(i) => clean(&path[..i]),
        None => ".".to_string(),
    }
}

/// The last element of a path.
pub fn base(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    }
}

/// The extension of the last path element including the dot, or `""`.
pub fn ext(path: &str) -> &str {
    let name = base(path);
    match name.rfind('.') {
        Some(i) => &name[i..],
        None => "",
    }
}

/// Normalize a workspace directory: `"."` and `""` both denote the root.
pub fn normalize_dir(dir: &str) -> String {
    let cleaned = clean(dir);
    if cleaned == "." { String::new() } else { cleaned }
}

pub fn is_abs(path: &str) -> bool {
    path.starts_with('/')
}

/// `./x` or `../x` style imports.
pub fn is_relative(path: &str) -> bool {
    path.starts_with("./") || path.starts_with("../")
}

/// The relative path leading from directory `from` to `to`, both workspace-relative.
pub fn rel(from: &str, to: &str) -> String {
    let from = normalize_dir(from);
    let to = normalize_dir(to);

    let from_parts: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let to_parts: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out: Vec<&str> = Vec::new();
    out.extend(std::iter::repeat_n("..", from_parts.len() - common));
    out.extend(&to_parts[common..]);

    if out.is_empty() {
        ".".to_string()
    } else {
        out.join("/")
    }
}

/// Iterate a directory and each of its ancestors, ending with the root `""`
/// (or `"/"` for absolute paths).
pub fn ancestors(dir: &str) -> impl Iterator<Item = String> {
    let mut next = Some(normalize_dir(dir));
    std::iter::from_fn(move || {
        let current = next.take()?;
        if !current.is_empty() {
            let parent = normalize_dir(&self::dir(&current));
            if parent != current {
                next = Some(parent);
            }
        }
        Some(current)
    })
}

/// Whether a relative path climbs above the directory it is relative to.
pub fn escapes_root(path: &str) -> bool {
    let cleaned = clean(path);
    cleaned == ".." || cleaned.starts_with("../")
}
