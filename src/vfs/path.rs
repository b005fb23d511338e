//! Pure helpers for absolute, forward-slash virtual paths.
//!
//! Every path the engine stores is in the canonical form produced by
//! [`normalize`]: a single leading `/`, no empty segments, and no trailing
//! `/` except for the root itself.

/// The universal root path.
pub const ROOT: &str = "/";

/// Splits a path into its non-empty segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Collapses a path to canonical absolute form.
///
/// Relative input is treated as if it were rooted at `/`. Dot segments are
/// kept verbatim; use [`resolve`] for terminal-style resolution.
#[must_use]
pub fn normalize(path: &str) -> String {
    let joined = segments(path).collect::<Vec<_>>().join("/");
    format!("/{joined}")
}

/// Returns the path of the containing directory.
///
/// The parent of a top-level path, and of the root itself, is `/`.
#[must_use]
pub fn parent_of(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(0) | None => ROOT.to_string(),
        Some(idx) => normalized[..idx].to_string(),
    }
}

/// Returns the last segment of a path, or `""` for the root.
#[must_use]
pub fn name_of(path: &str) -> &str {
    segments(path).last().unwrap_or("")
}

/// Appends a single name to a directory path.
#[must_use]
pub fn join(base: &str, name: &str) -> String {
    normalize(&format!("{base}/{name}"))
}

/// Returns `true` when `path` is `base` or lies beneath it.
///
/// The comparison is made on whole segments, so `/home/playerX` is not
/// within `/home/player`.
#[must_use]
pub fn is_within(path: &str, base: &str) -> bool {
    let mut path_segments = segments(path);
    segments(base).all(|b| path_segments.next() == Some(b))
}

/// Rewrites a path under `old_base` to the same relative position under
/// `new_base`.
///
/// Returns `None` when `path` is neither `old_base` nor one of its
/// descendants.
#[must_use]
pub fn rebase(path: &str, old_base: &str, new_base: &str) -> Option<String> {
    if !is_within(path, old_base) {
        return None;
    }
    let depth = segments(old_base).count();
    let rest: Vec<&str> = segments(path).skip(depth).collect();
    if rest.is_empty() {
        return Some(normalize(new_base));
    }
    Some(join(new_base, &rest.join("/")))
}

/// Lists the proper ancestors of `path`, nearest the root first.
///
/// The root itself and `path` are excluded, so `/a/b/c` yields `/a` and
/// `/a/b`.
#[must_use]
pub fn ancestors(path: &str) -> Vec<String> {
    let parts: Vec<&str> = segments(path).collect();
    (1..parts.len()).map(|end| format!("/{}", parts[..end].join("/"))).collect()
}

/// Resolves terminal input against a working directory.
///
/// Absolute input ignores `cwd`. `.` segments are dropped and `..` pops one
/// level, never climbing above the root.
#[must_use]
pub fn resolve(cwd: &str, input: &str) -> String {
    let mut stack: Vec<&str> = if input.starts_with('/') { Vec::new() } else { segments(cwd).collect() };
    for segment in segments(input) {
        match segment {
            "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    format!("/{}", stack.join("/"))
}
