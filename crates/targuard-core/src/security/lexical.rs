//! Lexical path arithmetic on `/`-separated strings.
//!
//! Nothing here touches the filesystem. Archive paths are compared in a
//! separator-unified form so that `\` cannot be used to smuggle a segment
//! past a check that only splits on `/`.

use std::borrow::Cow;

use super::root::leading_root;

/// Replaces every `\` with `/`.
#[inline]
pub(crate) fn to_slash(path: &str) -> Cow<'_, str> {
    if path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    }
}

/// Resolves `rel` against the absolute `base` the way a path resolver
/// would: empty and `.` segments vanish, `..` removes the previous segment
/// and stops at the root of `base`.
///
/// Both inputs must already be `/`-separated.
pub(crate) fn resolve(base: &str, rel: &str) -> String {
    let anchor = leading_root(base);
    let mut segments: Vec<&str> = Vec::new();
    for segment in base[anchor.len()..].split('/').chain(rel.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    join_anchor(anchor, &segments)
}

/// Normalizes a relative path, treating it as rooted: `..` never climbs
/// above the start.
///
/// Returns the surviving segments joined with `/`; an empty string means
/// the path names its own root.
pub(crate) fn normalize_rooted(rel: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in rel.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Joins a relative `/`-path onto an absolute `/`-path.
pub(crate) fn join(base: &str, rel: &str) -> String {
    if rel.is_empty() {
        base.to_string()
    } else if base.ends_with('/') {
        format!("{base}{rel}")
    } else {
        format!("{base}/{rel}")
    }
}

/// Returns the parent of a relative `/`-path, `""` for a single segment.
pub(crate) fn parent(rel: &str) -> &str {
    rel.rfind('/').map_or("", |idx| &rel[..idx])
}

/// Containment check: `candidate` equals `root` or lies strictly below it.
///
/// Both must be absolute, normalized and `/`-separated. `/root-evil` is not
/// inside `/root`.
pub(crate) fn is_within(candidate: &str, root: &str) -> bool {
    if candidate == root {
        return true;
    }
    if root.ends_with('/') {
        candidate.starts_with(root)
    } else {
        candidate
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

fn join_anchor(anchor: &str, segments: &[&str]) -> String {
    let tail = segments.join("/");
    if anchor.is_empty() {
        tail
    } else if anchor.ends_with('/') {
        format!("{anchor}{tail}")
    } else if tail.is_empty() {
        anchor.to_string()
    } else {
        format!("{anchor}/{tail}")
    }
}
