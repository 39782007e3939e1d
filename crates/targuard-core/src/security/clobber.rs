//! Protection against writing through an existing hard link.
//!
//! A writer that opens and truncates an existing destination rewrites the
//! inode, and with it every other name that inode has. An archive can abuse
//! this (CVE-2018-20834): a `Link` entry `victim -> some/file` followed by a
//! `File` entry `victim` overwrites `some/file`. Removing a multiply-linked
//! destination before the write breaks the alias, so the file entry gets a
//! fresh inode of its own.

use std::io;
use std::path::Path;

/// What a metadata query reports about a path, without following a final
/// symlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkMetadata {
    /// Number of hard links to the inode.
    pub link_count: u64,
    /// The path is a directory.
    pub is_dir: bool,
}

/// Filesystem operations the clobber guard depends on.
pub trait Filesystem {
    /// Queries metadata for `path` without following a final symlink.
    fn link_metadata(&self, path: &Path) -> io::Result<LinkMetadata>;

    /// Removes the non-directory object at `path`.
    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// [`Filesystem`] backed by `std::fs`.
///
/// Link counts come from `lstat` on Unix. Other platforms report a count of
/// one, which turns the guard into a no-op there.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostFilesystem;

impl Filesystem for HostFilesystem {
    fn link_metadata(&self, path: &Path) -> io::Result<LinkMetadata> {
        let metadata = std::fs::symlink_metadata(path)?;

        #[cfg(unix)]
        let link_count = {
            use std::os::unix::fs::MetadataExt;
            metadata.nlink()
        };
        #[cfg(not(unix))]
        let link_count = 1;

        Ok(LinkMetadata {
            link_count,
            is_dir: metadata.is_dir(),
        })
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

/// Result of [`ClobberGuard::guard`].
#[derive(Debug)]
pub enum GuardOutcome {
    /// Nothing exists at the destination.
    Absent,
    /// The destination exists and is safe to overwrite in place.
    Kept,
    /// The destination had other hard links and was removed.
    Removed {
        /// Link count observed before removal.
        link_count: u64,
    },
    /// The check or the removal failed. The write may go ahead; the caller
    /// should report the error.
    Failed(io::Error),
}

/// Pre-write hook for `File` entries.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use targuard_core::security::ClobberGuard;
/// use targuard_core::security::GuardOutcome;
///
/// let guard = ClobberGuard::host();
/// match guard.guard(Path::new("/tmp/out/victim")) {
///     GuardOutcome::Removed { link_count } => println!("broke a {link_count}-way alias"),
///     GuardOutcome::Failed(err) => eprintln!("could not check: {err}"),
///     GuardOutcome::Absent | GuardOutcome::Kept => {}
/// }
/// ```
#[derive(Debug, Default, Clone)]
pub struct ClobberGuard<F = HostFilesystem> {
    fs: F,
}

impl ClobberGuard {
    /// Creates a guard over the host filesystem.
    #[must_use]
    pub fn host() -> Self {
        Self::new(HostFilesystem)
    }
}

impl<F: Filesystem> ClobberGuard<F> {
    /// Creates a guard over the given filesystem.
    #[must_use]
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    /// Removes `path` if it currently names an inode with more than one
    /// hard link.
    ///
    /// Directories are never removed; their link count reflects
    /// subdirectories, not aliases. Calling this on a path with no hard
    /// links is a no-op.
    pub fn guard(&self, path: &Path) -> GuardOutcome {
        let metadata = match self.fs.link_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return GuardOutcome::Absent,
            Err(e) => return GuardOutcome::Failed(e),
        };

        if metadata.is_dir || metadata.link_count <= 1 {
            return GuardOutcome::Kept;
        }

        match self.fs.remove_file(path) {
            Ok(()) => {
                tracing::debug!(
                    path = %path.display(),
                    link_count = metadata.link_count,
                    "removed multiply-linked destination before write"
                );
                GuardOutcome::Removed {
                    link_count: metadata.link_count,
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => GuardOutcome::Absent,
            Err(e) => GuardOutcome::Failed(e),
        }
    }

    /// Returns the underlying filesystem.
    #[must_use]
    pub fn filesystem(&self) -> &F {
        &self.fs
    }
}
