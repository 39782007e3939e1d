//! Extraction reporting and warning delivery.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Report of an archive extraction operation.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Number of regular files written.
    pub files_extracted: usize,

    /// Number of directories created.
    pub directories_created: usize,

    /// Number of symlinks created.
    pub symlinks_created: usize,

    /// Number of hard links created.
    pub hardlinks_created: usize,

    /// Entries skipped without a warning: emptied by strip-components, or
    /// of a type the writer does not materialize.
    pub entries_skipped: usize,

    /// Entries refused by a security check.
    pub entries_rejected: usize,

    /// Entries whose path had a root prefix removed.
    pub roots_stripped: usize,

    /// Multiply-linked destinations removed before a file write.
    pub hardlinks_broken: usize,

    /// Total bytes written to disk.
    pub bytes_written: u64,

    /// Duration of the extraction operation.
    pub duration: Duration,

    /// Warnings generated during extraction.
    pub warnings: Vec<String>,
}

impl ExtractionReport {
    /// Creates a new empty extraction report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a warning message to the report.
    pub fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Returns total number of items written.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_extracted
            + self.directories_created
            + self.symlinks_created
            + self.hardlinks_created
    }

    /// Returns whether any warnings were generated.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Machine-readable warning code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// An entry was refused and dropped.
    TarEntryError,
    /// A root prefix was removed from an entry path. Informational.
    StrippingRoot,
    /// The hard link check before a file write could not complete.
    ClobberCheck,
}

impl WarningCode {
    /// Returns the code as a stable string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TarEntryError => "TAR_ENTRY_ERROR",
            Self::StrippingRoot => "STRIPPING_ROOT",
            Self::ClobberCheck => "CLOBBER_CHECK",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a warning came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningContext {
    /// The entry path as it appeared in the archive.
    pub path: String,
    /// Where the path resolved to, if resolution got that far.
    pub resolved: Option<PathBuf>,
    /// The extraction root.
    pub root: PathBuf,
}

/// A non-fatal diagnostic emitted while processing an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Machine-readable code.
    pub code: WarningCode,
    /// Human-readable message.
    pub message: String,
    /// Structured context.
    pub context: WarningContext,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.code, self.message, self.context.path)?;
        if let Some(resolved) = &self.context.resolved {
            write!(f, " -> {}", resolved.display())?;
        }
        Ok(())
    }
}

/// Receiver for pipeline warnings.
///
/// Warnings are never fatal: the pipeline reports them and moves on.
/// Closures taking `&Warning` implement this trait.
///
/// # Examples
///
/// ```
/// use targuard_core::report::Warning;
/// use targuard_core::report::WarningSink;
///
/// let mut seen = Vec::new();
/// let mut sink = |warning: &Warning| seen.push(warning.code);
/// # let _ = &mut sink as &mut dyn WarningSink;
/// ```
pub trait WarningSink {
    /// Called once per warning.
    fn warn(&mut self, warning: &Warning);
}

impl<F: FnMut(&Warning)> WarningSink for F {
    fn warn(&mut self, warning: &Warning) {
        self(warning);
    }
}

/// Sink that discards every warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl WarningSink for NoopSink {
    fn warn(&mut self, _warning: &Warning) {}
}

/// Sink that forwards warnings to `tracing`.
///
/// Rejections are logged at `warn`, informational notices at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl WarningSink for TracingSink {
    fn warn(&mut self, warning: &Warning) {
        let resolved = warning
            .context
            .resolved
            .as_ref()
            .map(|p| p.display().to_string());
        match warning.code {
            WarningCode::StrippingRoot => tracing::info!(
                code = warning.code.as_str(),
                path = %warning.context.path,
                "{}",
                warning.message
            ),
            WarningCode::TarEntryError | WarningCode::ClobberCheck => tracing::warn!(
                code = warning.code.as_str(),
                path = %warning.context.path,
                resolved = ?resolved,
                root = %warning.context.root.display(),
                "{}",
                warning.message
            ),
        }
    }
}

/// Sink that keeps every warning, in order.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    /// Warnings received so far.
    pub warnings: Vec<Warning>,
}

impl CollectingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the warnings carrying `code`.
    pub fn with_code(&self, code: WarningCode) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.code == code)
    }
}

impl WarningSink for CollectingSink {
    fn warn(&mut self, warning: &Warning) {
        self.warnings.push(warning.clone());
    }
}
