//! Entry writers.
//!
//! The pipeline hands every approved entry to an [`EntryWriter`]. The
//! path-safety decisions have been made by then, but only lexically. The
//! directory writer also follows the symlinks that already exist on disk: it
//! refuses entries reached through them from outside the root, and symlinks
//! whose target resolves outside the root through them.

use std::fs;
use std::fs::File;
use std::io;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::ExtractionError;
use crate::Result;
use crate::types::ResolvedEntry;
use crate::types::ResolvedKind;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// What a writer did with an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The entry was materialized.
    Written {
        /// Payload bytes written.
        bytes: u64,
    },
    /// The entry type is not materialized by this writer.
    Skipped,
    /// The writer declined the entry. The pipeline reports it as a
    /// rejection and continues.
    Refused {
        /// Human-readable reason.
        reason: String,
    },
}

impl WriteOutcome {
    fn refused(reason: impl Into<String>) -> Self {
        Self::Refused {
            reason: reason.into(),
        }
    }
}

/// Consumer of approved entries.
///
/// `write_entry` must return only once the entry's payload has been
/// consumed; the pipeline relies on this for ordering.
pub trait EntryWriter {
    /// Inspects an entry before the pipeline changes anything on disk for
    /// it. Returns a reason to refuse the entry, or `None` to go ahead.
    ///
    /// The default accepts everything.
    ///
    /// # Errors
    ///
    /// Any error is fatal to the extraction.
    fn precheck(&mut self, _entry: &ResolvedEntry) -> Result<Option<String>> {
        Ok(None)
    }

    /// Materializes one entry.
    ///
    /// # Errors
    ///
    /// Any error is fatal to the extraction.
    fn write_entry(&mut self, entry: &ResolvedEntry, data: &mut dyn Read) -> Result<WriteOutcome>;
}

/// Writes entries below a directory on the host filesystem.
///
/// # Examples
///
/// ```no_run
/// use targuard_core::extraction::DirWriter;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let writer = DirWriter::new("/tmp/out")?;
/// assert!(writer.output().ends_with("out"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DirWriter {
    output: PathBuf,
    canonical: PathBuf,
    buffer: Vec<u8>,
}

impl DirWriter {
    /// Creates the output directory if needed and returns a writer for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or resolved.
    pub fn new(output: impl AsRef<Path>) -> Result<Self> {
        let output = output.as_ref().to_path_buf();
        fs::create_dir_all(&output)?;
        let canonical = output.canonicalize()?;
        Ok(Self {
            output,
            canonical,
            buffer: vec![0; COPY_BUFFER_SIZE],
        })
    }

    /// Output directory as given.
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    fn destination(&self, entry: &ResolvedEntry) -> PathBuf {
        if entry.path().is_empty() {
            self.output.clone()
        } else {
            self.output.join(entry.path())
        }
    }

    /// Checks that the closest existing ancestor of `dir` is inside the
    /// output directory once symlinks are followed.
    fn is_contained(&self, dir: &Path) -> Result<bool> {
        for ancestor in dir.ancestors() {
            match fs::symlink_metadata(ancestor) {
                Ok(_) => {
                    return match ancestor.canonicalize() {
                        Ok(real) => Ok(real.starts_with(&self.canonical)),
                        // Dangling symlink
                        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
                        Err(e) => Err(e.into()),
                    };
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(false)
    }

    fn write_file(&mut self, dest: &Path, entry: &ResolvedEntry, data: &mut dyn Read) -> Result<WriteOutcome> {
        if let Some(outcome) = clear_slot(dest, false)? {
            return Ok(outcome);
        }

        let mut out = BufWriter::with_capacity(COPY_BUFFER_SIZE, File::create(dest)?);
        let mut written = 0u64;
        loop {
            let n = match data.read(&mut self.buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ExtractionError::from_decoder(e, PathBuf::from(entry.path()))),
            };
            out.write_all(&self.buffer[..n])?;
            written = written.saturating_add(n as u64);
        }
        out.flush()?;

        if written < entry.size() {
            return Err(ExtractionError::UnexpectedEof {
                path: PathBuf::from(entry.path()),
            });
        }
        Ok(WriteOutcome::Written { bytes: written })
    }

    fn write_directory(dest: &Path) -> Result<WriteOutcome> {
        match fs::symlink_metadata(dest) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                fs::remove_file(dest)?;
                fs::create_dir(dest)?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => fs::create_dir_all(dest)?,
            Err(e) => return Err(e.into()),
        }
        Ok(WriteOutcome::Written { bytes: 0 })
    }

    fn write_symlink(&self, dest: &Path, target: &Path) -> Result<WriteOutcome> {
        let base = dest.parent().unwrap_or(&self.output).canonicalize()?;
        let lands_inside = match resolve_on_disk(&base.join(target))? {
            Some(real) => real.starts_with(&self.canonical),
            None => false,
        };
        if !lands_inside {
            return Ok(WriteOutcome::refused(format!(
                "symlink target {} leaves the output directory",
                target.display()
            )));
        }

        if let Some(outcome) = clear_slot(dest, true)? {
            return Ok(outcome);
        }
        create_symlink(target, dest)
    }

    fn write_hardlink(&self, dest: &Path, target: &Path) -> Result<WriteOutcome> {
        let real_target = match target.canonicalize() {
            Ok(real) => real,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(WriteOutcome::refused(format!(
                    "hard link target {} does not exist",
                    target.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        if !real_target.starts_with(&self.canonical) {
            return Ok(WriteOutcome::refused(format!(
                "hard link target {} leaves the output directory",
                target.display()
            )));
        }
        if real_target.is_dir() {
            return Ok(WriteOutcome::refused(format!(
                "hard link target {} is a directory",
                target.display()
            )));
        }

        if let (Some(parent), Some(name)) = (dest.parent(), dest.file_name())
            && parent.canonicalize()?.join(name) == real_target
        {
            return Ok(WriteOutcome::Skipped);
        }

        if let Some(outcome) = clear_slot(dest, true)? {
            return Ok(outcome);
        }
        fs::hard_link(&real_target, dest)?;
        Ok(WriteOutcome::Written { bytes: 0 })
    }
}

impl EntryWriter for DirWriter {
    fn precheck(&mut self, entry: &ResolvedEntry) -> Result<Option<String>> {
        let is_directory = match entry.kind() {
            ResolvedKind::Other(_) => return Ok(None),
            ResolvedKind::Directory => true,
            _ => false,
        };
        if entry.path().is_empty() && !is_directory {
            return Ok(Some("entry names the extraction root".to_string()));
        }

        let dest = self.destination(entry);
        let checked = if is_directory {
            dest.as_path()
        } else {
            dest.parent().unwrap_or(&self.output)
        };
        if self.is_contained(checked)? {
            Ok(None)
        } else {
            Ok(Some(format!(
                "{} is reached through a symlink outside the output directory",
                dest.display()
            )))
        }
    }

    fn write_entry(&mut self, entry: &ResolvedEntry, data: &mut dyn Read) -> Result<WriteOutcome> {
        if let ResolvedKind::Other(flag) = entry.kind() {
            tracing::debug!(path = entry.path(), flag, "skipping unsupported entry type");
            return Ok(WriteOutcome::Skipped);
        }
        if let Some(reason) = self.precheck(entry)? {
            return Ok(WriteOutcome::Refused { reason });
        }

        let dest = self.destination(entry);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        match entry.kind() {
            ResolvedKind::File => self.write_file(&dest, entry, data),
            ResolvedKind::Directory => Self::write_directory(&dest),
            ResolvedKind::Symlink { target } => self.write_symlink(&dest, target),
            ResolvedKind::Hardlink { target } => self.write_hardlink(&dest, target),
            ResolvedKind::Other(_) => Ok(WriteOutcome::Skipped),
        }
    }
}

/// Makes room for a non-directory at `dest`.
///
/// A symlink in the way is always removed, a regular file only when
/// `replace_files` is set. Returns a refusal if a directory is in the way.
fn clear_slot(dest: &Path, replace_files: bool) -> Result<Option<WriteOutcome>> {
    let meta = match fs::symlink_metadata(dest) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if meta.is_dir() {
        return Ok(Some(WriteOutcome::refused(format!(
            "{} is an existing directory",
            dest.display()
        ))));
    }
    if replace_files || meta.file_type().is_symlink() {
        fs::remove_file(dest)?;
    }
    Ok(None)
}

#[cfg(unix)]
fn create_symlink(target: &Path, dest: &Path) -> Result<WriteOutcome> {
    std::os::unix::fs::symlink(target, dest)?;
    Ok(WriteOutcome::Written { bytes: 0 })
}

#[cfg(not(unix))]
fn create_symlink(_target: &Path, _dest: &Path) -> Result<WriteOutcome> {
    Ok(WriteOutcome::refused(
        "symlinks are not supported on this platform",
    ))
}

/// Resolves `path` the way the OS would, following every symlink on the
/// way that already exists. Components past the last existing one are
/// applied lexically.
///
/// Returns `None` if the walk runs into a dangling symlink.
fn resolve_on_disk(path: &Path) -> Result<Option<PathBuf>> {
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                resolved.pop();
            }
            Component::CurDir => {}
            other => {
                resolved.push(other.as_os_str());
                match resolved.canonicalize() {
                    Ok(real) => resolved = real,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        if fs::symlink_metadata(&resolved).is_ok() {
                            return Ok(None);
                        }
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
    Ok(Some(resolved))
}
