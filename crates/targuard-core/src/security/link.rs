//! Link target resolution.
//!
//! Hard link and symbolic link targets follow different rules and must not
//! be mixed up:
//!
//! - a hard link target is relative to the **archive root**, whatever
//!   directory the link itself lives in
//! - a symbolic link target is relative to the **link's own directory**,
//!   because that is how the OS will read it once created
//!
//! Neither kind is refused here. Targets that would leave the extraction
//! root are rebased underneath it instead.

use std::path::PathBuf;

use crate::security::lexical;
use crate::security::root::strip_root;
use crate::types::EntryKind;
use crate::types::ExtractionRoot;
use crate::types::ResolvedEntry;
use crate::types::ResolvedKind;
use crate::types::SanitizedEntry;

/// Turns a sanitized entry into a writer-ready one.
///
/// Only link entries change: their target is replaced with the value the
/// writer should use. Every other entry passes through.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use targuard_core::security::resolve_links;
/// use targuard_core::security::sanitize;
/// use targuard_core::types::Entry;
/// use targuard_core::types::ExtractionRoot;
/// use targuard_core::types::ResolvedKind;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let root = ExtractionRoot::new("/tmp/out")?;
/// let entry = Entry::hardlink("a/b/c/link", "bin/sh");
/// let sanitized = sanitize(&entry, &root, 0)?.expect("not emptied");
///
/// let resolved = resolve_links(sanitized, &root);
/// assert_eq!(
///     resolved.kind(),
///     &ResolvedKind::Hardlink { target: Path::new("/tmp/out/bin/sh").to_path_buf() }
/// );
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn resolve_links(entry: SanitizedEntry, root: &ExtractionRoot) -> ResolvedEntry {
    let target = entry.link_target.as_deref().unwrap_or_default();
    let kind = match entry.kind {
        EntryKind::File => ResolvedKind::File,
        EntryKind::Directory => ResolvedKind::Directory,
        EntryKind::Other(flag) => ResolvedKind::Other(flag),
        EntryKind::Link => ResolvedKind::Hardlink {
            target: resolve_hardlink_target(target, root),
        },
        EntryKind::SymbolicLink => ResolvedKind::Symlink {
            target: resolve_symlink_target(&entry.path, target, root),
        },
    };

    ResolvedEntry {
        path: entry.path,
        absolute: entry.absolute,
        kind,
        size: entry.size,
    }
}

/// Resolves a hard link target under the extraction root.
///
/// The target is always treated as rooted at the extraction root: a leading
/// `/` (or any other root prefix) does not mean the filesystem root, and
/// `..` cannot climb above the extraction root.
#[must_use]
pub fn resolve_hardlink_target(target: &str, root: &ExtractionRoot) -> PathBuf {
    root.join(&rebased_relative(target))
}

/// Resolves a symbolic link target for the link at root-relative
/// `link_path`.
///
/// A target that resolves inside the root, read from the link's own
/// directory, is returned exactly as written so the created link stays
/// relative. A target that would escape is rebased: read as if the
/// extraction root were `/`, and returned as an absolute path under it.
///
/// The check is lexical. Links already on disk can still redirect the
/// target, so [`DirWriter`](crate::extraction::DirWriter) checks it again
/// against the real filesystem before creating the link.
#[must_use]
pub fn resolve_symlink_target(link_path: &str, target: &str, root: &ExtractionRoot) -> PathBuf {
    let unified = lexical::to_slash(target);
    let stripped = strip_root(&unified);

    let inside = if unified.starts_with('/') {
        root.contains(&lexical::resolve(&unified, ""))
    } else if stripped.was_stripped() {
        // Drive and UNC prefixes have no meaning relative to the link
        false
    } else {
        let link_dir = lexical::join(root.as_slash(), lexical::parent(link_path));
        root.contains(&lexical::resolve(&link_dir, &unified))
    };

    if inside {
        PathBuf::from(target)
    } else {
        tracing::debug!(
            link = link_path,
            link_target = target,
            "rebasing symlink target under extraction root"
        );
        root.join(&rebased_relative(target))
    }
}

fn rebased_relative(target: &str) -> String {
    let unified = lexical::to_slash(target);
    lexical::normalize_rooted(strip_root(&unified).remainder)
}
