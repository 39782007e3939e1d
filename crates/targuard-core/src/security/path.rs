//! Entry path sanitization.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::ExtractionError;
use crate::security::lexical;
use crate::security::root::strip_root;
use crate::types::Entry;
use crate::types::ExtractionRoot;
use crate::types::SanitizedEntry;

/// Why an entry was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Path or link target contains a NUL byte.
    NullByte,
    /// A path segment is `..`, or the first segment is a drive-relative
    /// parent such as `c:..`.
    ParentTraversal,
    /// The resolved path lies outside the extraction root.
    Escaped,
    /// A link entry has no target left.
    MissingLinkTarget,
}

impl RejectReason {
    /// Human-readable reason, as used in warnings.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NullByte => "path contains null byte",
            Self::ParentTraversal => "path contains '..'",
            Self::Escaped => "path escaped extraction target",
            Self::MissingLinkTarget => "link entry has no target",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// An entry the sanitizer refused.
///
/// Rejections are per-entry: the pipeline reports them as warnings and
/// carries on with the next entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}: {path}")]
pub struct Rejection {
    /// Why the entry was refused.
    pub reason: RejectReason,
    /// The offending path, separator-unified.
    pub path: String,
    /// Where the path resolved to, when resolution got that far.
    pub resolved: Option<String>,
}

impl Rejection {
    fn new(reason: RejectReason, path: impl Into<String>) -> Self {
        Self {
            reason,
            path: path.into(),
            resolved: None,
        }
    }

    /// Converts the rejection into the matching `ExtractionError`, for
    /// callers that want to fail hard instead of skipping.
    #[must_use]
    pub fn into_error(self, root: &ExtractionRoot) -> ExtractionError {
        match self.reason {
            RejectReason::ParentTraversal => ExtractionError::PathTraversal {
                path: PathBuf::from(self.path),
            },
            RejectReason::Escaped => ExtractionError::PathEscape {
                path: PathBuf::from(self.path),
                resolved: self.resolved.map(PathBuf::from).unwrap_or_default(),
                root: root.as_path().to_path_buf(),
            },
            RejectReason::NullByte | RejectReason::MissingLinkTarget => {
                ExtractionError::SecurityViolation {
                    reason: format!("{}: {}", self.reason, self.path),
                }
            }
        }
    }
}

/// Drops the first `count` `/`-delimited segments of `path`.
///
/// Returns `None` when stripping leaves nothing. A count of zero returns
/// the path untouched, even an empty one.
///
/// # Examples
///
/// ```
/// use targuard_core::security::strip_components;
///
/// assert_eq!(strip_components("pkg/lib/index.js", 2).as_deref(), Some("index.js"));
/// assert_eq!(strip_components("pkg/", 1), None);
/// assert_eq!(strip_components("a/b", 0).as_deref(), Some("a/b"));
/// ```
#[must_use]
pub fn strip_components(path: &str, count: usize) -> Option<Cow<'_, str>> {
    if count == 0 {
        return Some(Cow::Borrowed(path));
    }
    let stripped = path.split('/').skip(count).collect::<Vec<_>>().join("/");
    (!stripped.is_empty()).then_some(Cow::Owned(stripped))
}

/// Sanitizes one entry against the extraction root.
///
/// The steps run in order and each one can refuse the entry:
///
/// 1. Strip `strip_count` leading segments from the path and link target
/// 2. Refuse NUL bytes
/// 3. Unify `\` to `/`
/// 4. Refuse `..` segments and a leading drive-relative parent (`c:..`)
/// 5. Strip every root prefix (recorded, not refused)
/// 6. Resolve against the root
/// 7. Refuse anything that does not resolve inside the root
///
/// Step 7 holds on its own: whatever steps 3 to 5 let through, an accepted
/// entry always resolves inside `root`.
///
/// The accepted path is the unified, normalized form: `a\b.txt` becomes
/// `b.txt` inside directory `a` on every host.
///
/// Returns `Ok(None)` when strip-components leaves nothing of the path; such
/// entries are skipped, not refused.
///
/// # Errors
///
/// Returns a [`Rejection`] describing the first failed check.
///
/// # Examples
///
/// ```no_run
/// use targuard_core::security::sanitize;
/// use targuard_core::types::Entry;
/// use targuard_core::types::ExtractionRoot;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let root = ExtractionRoot::new("/tmp/out")?;
///
/// let accepted = sanitize(&Entry::file("/etc/passwd", 0), &root, 0)?.expect("not emptied");
/// assert_eq!(accepted.path(), "etc/passwd");
/// assert_eq!(accepted.stripped_root(), Some("/"));
///
/// assert!(sanitize(&Entry::file("../../etc/passwd", 0), &root, 0).is_err());
/// # Ok(())
/// # }
/// ```
pub fn sanitize(
    entry: &Entry,
    root: &ExtractionRoot,
    strip_count: usize,
) -> Result<Option<SanitizedEntry>, Rejection> {
    let Some(path) = strip_components(&entry.path, strip_count) else {
        return Ok(None);
    };
    let link_target = entry
        .link_target
        .as_deref()
        .and_then(|target| strip_components(target, strip_count))
        .filter(|target| !target.is_empty());

    if path.contains('\0') || link_target.as_deref().is_some_and(|t| t.contains('\0')) {
        return Err(Rejection::new(RejectReason::NullByte, path.replace('\0', "\\0")));
    }

    let unified = lexical::to_slash(&path);

    if has_parent_segment(&unified) {
        return Err(Rejection::new(RejectReason::ParentTraversal, unified));
    }

    let stripped = strip_root(&unified);
    let resolved = lexical::resolve(root.as_slash(), stripped.remainder);

    if !root.contains(&resolved) {
        return Err(Rejection {
            reason: RejectReason::Escaped,
            path: unified.into_owned(),
            resolved: Some(resolved),
        });
    }

    if entry.kind.is_link() && link_target.is_none() {
        return Err(Rejection::new(RejectReason::MissingLinkTarget, unified));
    }

    Ok(Some(SanitizedEntry {
        path: lexical::normalize_rooted(stripped.remainder),
        absolute: PathBuf::from(resolved),
        stripped_root: stripped.was_stripped().then(|| stripped.root.to_string()),
        kind: entry.kind,
        link_target: link_target.map(Cow::into_owned),
        size: entry.size,
    }))
}

/// `..` anywhere, or `X:..` as the first segment.
fn has_parent_segment(unified: &str) -> bool {
    let mut segments = unified.split('/');
    let first_is_drive_parent = segments.next().is_some_and(|first| {
        matches!(first.as_bytes(), [drive, b':', b'.', b'.'] if drive.is_ascii_alphabetic())
            || first == ".."
    });
    first_is_drive_parent || segments.any(|segment| segment == "..")
}
