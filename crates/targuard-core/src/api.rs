//! High-level public API for archive extraction.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::ExtractConfig;
use crate::ExtractionReport;
use crate::Result;
use crate::extraction::DirWriter;
use crate::extraction::Pipeline;
use crate::formats::extract_tar;
use crate::report::TracingSink;
use crate::security::ClobberGuard;
use crate::types::ExtractionRoot;

/// Extracts a tar archive into the configured extraction root.
///
/// This is the main high-level API. Entries are checked and written one at
/// a time; refused entries are logged through `tracing` and skipped.
///
/// # Arguments
///
/// * `archive_path` - Path to an uncompressed tar file
/// * `config` - Extraction root and strip-components count
///
/// # Errors
///
/// Returns an error if:
/// - Archive file cannot be opened
/// - The extraction root cannot be created
/// - The archive is malformed or truncated
/// - Writing an entry fails
///
/// # Examples
///
/// ```no_run
/// use targuard_core::ExtractConfig;
/// use targuard_core::extract_archive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractConfig::new("/tmp/output").with_strip_components(1);
/// let report = extract_archive("package.tar", &config)?;
/// println!("Extracted {} files", report.files_extracted);
/// # Ok(())
/// # }
/// ```
pub fn extract_archive<P: AsRef<Path>>(
    archive_path: P,
    config: &ExtractConfig,
) -> Result<ExtractionReport> {
    let archive_path = archive_path.as_ref();
    let root = ExtractionRoot::new(config.root_or_default())?;
    let writer = DirWriter::new(root.as_path())?;
    let file = File::open(archive_path)?;

    let mut pipeline = Pipeline::with_guard(
        root,
        config.strip_components(),
        writer,
        TracingSink,
        ClobberGuard::host(),
    );
    extract_tar(BufReader::new(file), &mut pipeline)?;
    let report = pipeline.finish();

    tracing::info!(
        archive = %archive_path.display(),
        files = report.files_extracted,
        directories = report.directories_created,
        symlinks = report.symlinks_created,
        hardlinks = report.hardlinks_created,
        rejected = report.entries_rejected,
        bytes = report.bytes_written,
        duration = ?report.duration,
        "extraction finished"
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ExtractionError;
    use crate::test_utils::TarTestBuilder;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extract_archive_end_to_end() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let archive = temp.path().join("in.tar");
        fs::write(
            &archive,
            TarTestBuilder::new()
                .add_file("pkg/a.txt", b"a")
                .add_file("pkg/../../b.txt", b"b")
                .build(),
        )
        .unwrap();

        let out = temp.path().join("out");
        let report = extract_archive(&archive, &ExtractConfig::new(&out)).unwrap();
        assert_eq!(report.files_extracted, 1);
        assert_eq!(report.entries_rejected, 1);
        assert!(out.join("pkg/a.txt").exists());
        assert!(!temp.path().join("b.txt").exists());
    }

    #[test]
    fn test_missing_archive() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let result = extract_archive(
            temp.path().join("missing.tar"),
            &ExtractConfig::new(temp.path().join("out")),
        );
        assert!(matches!(result, Err(ExtractionError::Io(_))));
    }
}
