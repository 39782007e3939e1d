//! Entries after sanitization and link resolution.

use std::path::Path;
use std::path::PathBuf;

use super::EntryKind;

/// An entry whose path has been approved by the sanitizer.
///
/// Produced only by [`sanitize`](crate::security::sanitize). The path is
/// guaranteed to resolve inside the extraction root the entry was checked
/// against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedEntry {
    pub(crate) path: String,
    pub(crate) absolute: PathBuf,
    pub(crate) stripped_root: Option<String>,
    pub(crate) kind: EntryKind,
    pub(crate) link_target: Option<String>,
    pub(crate) size: u64,
}

impl SanitizedEntry {
    /// Root-relative, `/`-separated path. Empty when the entry names the
    /// root itself.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Absolute destination inside the extraction root.
    #[inline]
    #[must_use]
    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    /// The root prefix removed from the archive path, if there was one.
    #[inline]
    #[must_use]
    pub fn stripped_root(&self) -> Option<&str> {
        self.stripped_root.as_deref()
    }

    /// Entry type.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Link target after strip-components, not yet resolved.
    #[inline]
    #[must_use]
    pub fn link_target(&self) -> Option<&str> {
        self.link_target.as_deref()
    }

    /// Declared payload size.
    #[inline]
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Entry type with its final, writer-ready link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedKind {
    /// Regular file.
    File,

    /// Directory.
    Directory,

    /// Hard link to an absolute path inside the extraction root.
    Hardlink {
        /// Absolute link target.
        target: PathBuf,
    },

    /// Symbolic link.
    Symlink {
        /// Either the original relative target (when it stays inside the
        /// root) or an absolute target rebased under the root.
        target: PathBuf,
    },

    /// Other entry type with its raw type flag.
    Other(u8),
}

/// A fully processed entry, ready for the directory writer.
///
/// Produced only by [`resolve_links`](crate::security::resolve_links).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub(crate) path: String,
    pub(crate) absolute: PathBuf,
    pub(crate) kind: ResolvedKind,
    pub(crate) size: u64,
}

impl ResolvedEntry {
    /// Root-relative, `/`-separated path the writer joins with its output
    /// directory.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Absolute destination inside the extraction root.
    #[inline]
    #[must_use]
    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    /// Entry type and link target.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &ResolvedKind {
        &self.kind
    }

    /// Declared payload size.
    #[inline]
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns `true` for regular files.
    #[inline]
    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self.kind, ResolvedKind::File)
    }
}
