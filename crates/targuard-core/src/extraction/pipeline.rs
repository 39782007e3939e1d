//! The per-entry extraction pipeline.

use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use crate::ExtractConfig;
use crate::ExtractionError;
use crate::ExtractionReport;
use crate::Result;
use crate::extraction::writer::EntryWriter;
use crate::extraction::writer::WriteOutcome;
use crate::report::Warning;
use crate::report::WarningCode;
use crate::report::WarningContext;
use crate::report::WarningSink;
use crate::security::ClobberGuard;
use crate::security::Filesystem;
use crate::security::GuardOutcome;
use crate::security::HostFilesystem;
use crate::security::resolve_links;
use crate::security::sanitize;
use crate::types::Entry;
use crate::types::ExtractionRoot;
use crate::types::ResolvedKind;

/// What happened to one pushed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// The writer materialized the entry.
    Written,
    /// Nothing was written and nothing was wrong: strip-components emptied
    /// the path, or the writer does not handle the entry type.
    Skipped,
    /// The entry was dropped and a `TAR_ENTRY_ERROR` warning emitted.
    Rejected {
        /// Why the entry was dropped.
        reason: String,
    },
}

/// Runs entries through sanitization, link resolution, the writer's
/// precheck, the clobber guard and finally the writer, one at a time and in
/// archive order.
///
/// Per-entry problems are reported through the warning sink and never stop
/// the pipeline. A decoder or writer error does: it is returned from
/// [`push`](Self::push) and every later call fails with
/// [`ExtractionError::PipelineClosed`].
///
/// # Examples
///
/// ```no_run
/// use std::io;
/// use targuard_core::ExtractConfig;
/// use targuard_core::extraction::DirWriter;
/// use targuard_core::extraction::EntryOutcome;
/// use targuard_core::extraction::Pipeline;
/// use targuard_core::report::CollectingSink;
/// use targuard_core::types::Entry;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractConfig::new("/tmp/out");
/// let writer = DirWriter::new("/tmp/out")?;
/// let mut pipeline = Pipeline::new(&config, writer, CollectingSink::new())?;
///
/// let outcome = pipeline.push(&Entry::file("../../etc/passwd", 0), &mut io::empty())?;
/// assert!(matches!(outcome, EntryOutcome::Rejected { .. }));
///
/// let report = pipeline.finish();
/// assert_eq!(report.entries_rejected, 1);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<W, S, F = HostFilesystem> {
    root: ExtractionRoot,
    strip_count: usize,
    writer: W,
    sink: S,
    guard: ClobberGuard<F>,
    report: ExtractionReport,
    started: Instant,
    closed: bool,
}

impl<W: EntryWriter, S: WarningSink> Pipeline<W, S> {
    /// Creates a pipeline from `config`, guarding writes on the host
    /// filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error if the extraction root cannot be resolved.
    pub fn new(config: &ExtractConfig, writer: W, sink: S) -> Result<Self> {
        let root = ExtractionRoot::new(config.root_or_default())?;
        Ok(Self::with_guard(
            root,
            config.strip_components(),
            writer,
            sink,
            ClobberGuard::host(),
        ))
    }
}

impl<W: EntryWriter, S: WarningSink, F: Filesystem> Pipeline<W, S, F> {
    /// Creates a pipeline with an explicit root and clobber guard.
    #[must_use]
    pub fn with_guard(
        root: ExtractionRoot,
        strip_count: usize,
        writer: W,
        sink: S,
        guard: ClobberGuard<F>,
    ) -> Self {
        Self {
            root,
            strip_count,
            writer,
            sink,
            guard,
            report: ExtractionReport::new(),
            started: Instant::now(),
            closed: false,
        }
    }

    /// Processes one entry, reading its payload from `data`.
    ///
    /// Returns once the writer is done with the entry.
    ///
    /// # Errors
    ///
    /// Returns the writer's error, after which the pipeline is closed, or
    /// [`ExtractionError::PipelineClosed`] if it already was.
    pub fn push(&mut self, entry: &Entry, data: &mut dyn Read) -> Result<EntryOutcome> {
        if self.closed {
            return Err(ExtractionError::PipelineClosed);
        }
        let result = self.process(entry, data);
        if result.is_err() {
            self.closed = true;
        }
        result
    }

    /// Marks the pipeline as failed from outside, for errors the decoder
    /// hits between entries.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Returns `true` once the pipeline no longer accepts entries.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The extraction root entries are checked against.
    #[must_use]
    pub fn root(&self) -> &ExtractionRoot {
        &self.root
    }

    /// Counters so far.
    #[must_use]
    pub fn report(&self) -> &ExtractionReport {
        &self.report
    }

    /// The warning sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The writer.
    #[must_use]
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Ends the extraction and returns the final report.
    #[must_use]
    pub fn finish(mut self) -> ExtractionReport {
        self.report.duration = self.started.elapsed();
        self.report
    }

    fn process(&mut self, entry: &Entry, data: &mut dyn Read) -> Result<EntryOutcome> {
        let sanitized = match sanitize(entry, &self.root, self.strip_count) {
            Ok(Some(sanitized)) => sanitized,
            Ok(None) => {
                tracing::debug!(path = %entry.path, "path emptied by strip-components, skipping");
                self.report.entries_skipped += 1;
                return Ok(EntryOutcome::Skipped);
            }
            Err(rejection) => {
                let reason = rejection.reason.message().to_string();
                self.reject(
                    reason.clone(),
                    rejection.path,
                    rejection.resolved.map(PathBuf::from),
                );
                return Ok(EntryOutcome::Rejected { reason });
            }
        };

        if let Some(prefix) = sanitized.stripped_root() {
            self.report.roots_stripped += 1;
            let message = format!("stripping {prefix} from absolute path");
            let resolved = Some(sanitized.absolute().to_path_buf());
            self.emit(WarningCode::StrippingRoot, message, entry.path.clone(), resolved);
        }

        let resolved = resolve_links(sanitized, &self.root);

        if let Some(reason) = self.writer.precheck(&resolved)? {
            let dest = Some(resolved.absolute().to_path_buf());
            self.reject(reason.clone(), entry.path.clone(), dest);
            return Ok(EntryOutcome::Rejected { reason });
        }

        if resolved.is_file() {
            match self.guard.guard(resolved.absolute()) {
                GuardOutcome::Removed { .. } => self.report.hardlinks_broken += 1,
                GuardOutcome::Failed(err) => {
                    let message = format!("could not check existing destination: {err}");
                    let dest = Some(resolved.absolute().to_path_buf());
                    self.emit(WarningCode::ClobberCheck, message, entry.path.clone(), dest);
                }
                GuardOutcome::Absent | GuardOutcome::Kept => {}
            }
        }

        match self.writer.write_entry(&resolved, data)? {
            WriteOutcome::Written { bytes } => {
                self.report.bytes_written = self.report.bytes_written.saturating_add(bytes);
                match resolved.kind() {
                    ResolvedKind::File => self.report.files_extracted += 1,
                    ResolvedKind::Directory => self.report.directories_created += 1,
                    ResolvedKind::Symlink { .. } => self.report.symlinks_created += 1,
                    ResolvedKind::Hardlink { .. } => self.report.hardlinks_created += 1,
                    ResolvedKind::Other(_) => {}
                }
                tracing::debug!(path = resolved.path(), bytes, "entry written");
                Ok(EntryOutcome::Written)
            }
            WriteOutcome::Skipped => {
                self.report.entries_skipped += 1;
                Ok(EntryOutcome::Skipped)
            }
            WriteOutcome::Refused { reason } => {
                let dest = Some(resolved.absolute().to_path_buf());
                self.reject(reason.clone(), entry.path.clone(), dest);
                Ok(EntryOutcome::Rejected { reason })
            }
        }
    }

    fn reject(&mut self, message: String, path: String, resolved: Option<PathBuf>) {
        self.report.entries_rejected += 1;
        self.emit(WarningCode::TarEntryError, message, path, resolved);
    }

    fn emit(&mut self, code: WarningCode, message: String, path: String, resolved: Option<PathBuf>) {
        let warning = Warning {
            code,
            message,
            context: WarningContext {
                path,
                resolved,
                root: self.root.as_path().to_path_buf(),
            },
        };
        self.report.add_warning(warning.to_string());
        self.sink.warn(&warning);
    }
}
