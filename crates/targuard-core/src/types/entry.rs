//! Raw archive entry as produced by a decoder.

/// Type of entry in an archive.
///
/// # Examples
///
/// ```
/// use targuard_core::types::EntryKind;
///
/// assert!(EntryKind::Link.is_link());
/// assert!(EntryKind::SymbolicLink.is_link());
/// assert!(!EntryKind::File.is_link());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file entry.
    File,

    /// Directory entry.
    Directory,

    /// Hard link. The link target is relative to the archive root.
    Link,

    /// Symbolic link. The link target is relative to the directory that
    /// contains the link.
    SymbolicLink,

    /// Anything else (devices, FIFOs, ...), carrying the raw type flag.
    Other(u8),
}

impl EntryKind {
    /// Returns `true` if this is a regular file.
    #[must_use]
    pub const fn is_file(self) -> bool {
        matches!(self, Self::File)
    }

    /// Returns `true` if this is a directory.
    #[must_use]
    pub const fn is_directory(self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Returns `true` for hard and symbolic links.
    #[must_use]
    pub const fn is_link(self) -> bool {
        matches!(self, Self::Link | Self::SymbolicLink)
    }
}

/// One item decoded from an archive, before any sanitization.
///
/// Paths are kept as the exact strings found in the archive: they may use
/// `/` or `\`, and may be absolute or drive-rooted. Nothing about an
/// `Entry` is trusted.
///
/// # Examples
///
/// ```
/// use targuard_core::types::Entry;
/// use targuard_core::types::EntryKind;
///
/// let file = Entry::file("docs/readme.txt", 12);
/// assert_eq!(file.kind, EntryKind::File);
///
/// let link = Entry::hardlink("bin/sh-alias", "bin/sh");
/// assert_eq!(link.link_target.as_deref(), Some("bin/sh"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Archive path.
    pub path: String,

    /// Entry type.
    pub kind: EntryKind,

    /// Link target for `Link` and `SymbolicLink` entries.
    pub link_target: Option<String>,

    /// Declared payload length in bytes.
    pub size: u64,
}

impl Entry {
    /// Creates an entry with no link target and no payload.
    #[must_use]
    pub fn new(path: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            kind,
            link_target: None,
            size: 0,
        }
    }

    /// Creates a regular file entry with `size` bytes of payload.
    #[must_use]
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        Self::new(path, EntryKind::File).with_size(size)
    }

    /// Creates a directory entry.
    #[must_use]
    pub fn directory(path: impl Into<String>) -> Self {
        Self::new(path, EntryKind::Directory)
    }

    /// Creates a hard link entry.
    #[must_use]
    pub fn hardlink(path: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(path, EntryKind::Link).with_link_target(target)
    }

    /// Creates a symbolic link entry.
    #[must_use]
    pub fn symlink(path: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(path, EntryKind::SymbolicLink).with_link_target(target)
    }

    /// Sets the link target.
    #[must_use]
    pub fn with_link_target(mut self, target: impl Into<String>) -> Self {
        self.link_target = Some(target.into());
        self
    }

    /// Sets the declared payload size.
    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }
}
