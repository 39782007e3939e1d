//! Tar archive decoding.
//!
//! Only plain, uncompressed tar streams are read. Entry names are taken from
//! the raw header bytes (including GNU long names and pax `path` records) so
//! that no normalization happens before the pipeline sees them.

use std::cell::Cell;
use std::io;
use std::io::Read;
use std::path::PathBuf;

use crate::ExtractionError;
use crate::Result;
use crate::extraction::EntryWriter;
use crate::extraction::Pipeline;
use crate::report::WarningSink;
use crate::security::Filesystem;
use crate::types::Entry;
use crate::types::EntryKind;

/// Decodes a tar stream and pushes every entry through `pipeline`, in
/// archive order.
///
/// # Errors
///
/// Returns an error if the stream is malformed or truncated, or if the
/// pipeline's writer fails. The pipeline is closed in both cases.
///
/// # Examples
///
/// ```no_run
/// use std::fs::File;
/// use targuard_core::ExtractConfig;
/// use targuard_core::extraction::DirWriter;
/// use targuard_core::extraction::Pipeline;
/// use targuard_core::formats::extract_tar;
/// use targuard_core::report::TracingSink;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractConfig::new("/tmp/out").with_strip_components(1);
/// let writer = DirWriter::new("/tmp/out")?;
/// let mut pipeline = Pipeline::new(&config, writer, TracingSink)?;
///
/// extract_tar(File::open("package.tar")?, &mut pipeline)?;
/// let report = pipeline.finish();
/// println!("{} files", report.files_extracted);
/// # Ok(())
/// # }
/// ```
pub fn extract_tar<R, W, S, F>(reader: R, pipeline: &mut Pipeline<W, S, F>) -> Result<()>
where
    R: Read,
    W: EntryWriter,
    S: WarningSink,
    F: Filesystem,
{
    let exhausted = Cell::new(false);
    let mut archive = tar::Archive::new(EofTracker {
        inner: reader,
        exhausted: &exhausted,
    });
    let entries = archive.entries().inspect_err(|_| pipeline.close())?;

    let mut last_path = PathBuf::new();
    for item in entries {
        let mut tar_entry = match item {
            Ok(tar_entry) => tar_entry,
            Err(err) => {
                pipeline.close();
                // The decoder reports a short header as a generic error
                if exhausted.get() {
                    return Err(ExtractionError::UnexpectedEof { path: last_path });
                }
                return Err(ExtractionError::from_decoder(err, last_path));
            }
        };

        let entry = decode_entry(&tar_entry);
        last_path = PathBuf::from(&entry.path);
        pipeline.push(&entry, &mut tar_entry)?;
    }

    Ok(())
}

/// Remembers whether the underlying reader ran dry.
struct EofTracker<'a, R> {
    inner: R,
    exhausted: &'a Cell<bool>,
}

impl<R: Read> Read for EofTracker<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.exhausted.set(true);
        }
        Ok(n)
    }
}

fn decode_entry<R: Read>(tar_entry: &tar::Entry<'_, R>) -> Entry {
    let path = String::from_utf8_lossy(&tar_entry.path_bytes()).into_owned();
    let link_target = tar_entry
        .link_name_bytes()
        .map(|name| String::from_utf8_lossy(&name).into_owned());

    Entry {
        path,
        kind: entry_kind(tar_entry.header().entry_type()),
        link_target,
        size: tar_entry.size(),
    }
}

fn entry_kind(entry_type: tar::EntryType) -> EntryKind {
    match entry_type {
        tar::EntryType::Regular | tar::EntryType::Continuous => EntryKind::File,
        tar::EntryType::Directory => EntryKind::Directory,
        tar::EntryType::Link => EntryKind::Link,
        tar::EntryType::Symlink => EntryKind::SymbolicLink,
        other => EntryKind::Other(other.as_byte()),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ExtractConfig;
    use crate::extraction::DirWriter;
    use crate::report::CollectingSink;
    use crate::report::WarningCode;
    use crate::test_utils::TarTestBuilder;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn run(
        data: Vec<u8>,
        temp: &TempDir,
        strip: i64,
    ) -> (Result<()>, Pipeline<DirWriter, CollectingSink>) {
        let config = ExtractConfig::new(temp.path()).with_strip_components(strip);
        let writer = DirWriter::new(temp.path()).unwrap();
        let mut pipeline = Pipeline::new(&config, writer, CollectingSink::new()).unwrap();
        let result = extract_tar(Cursor::new(data), &mut pipeline);
        (result, pipeline)
    }

    #[test]
    fn test_entry_kind_mapping() {
        assert_eq!(entry_kind(tar::EntryType::Regular), EntryKind::File);
        assert_eq!(entry_kind(tar::EntryType::Continuous), EntryKind::File);
        assert_eq!(entry_kind(tar::EntryType::Directory), EntryKind::Directory);
        assert_eq!(entry_kind(tar::EntryType::Link), EntryKind::Link);
        assert_eq!(entry_kind(tar::EntryType::Symlink), EntryKind::SymbolicLink);
        assert_eq!(entry_kind(tar::EntryType::Fifo), EntryKind::Other(b'6'));
    }

    #[test]
    fn test_extracts_plain_archive() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let data = TarTestBuilder::new()
            .add_directory("dir/")
            .add_file("dir/file.txt", b"content")
            .build();

        let (result, pipeline) = run(data, &temp, 0);
        result.unwrap();
        assert_eq!(
            fs::read_to_string(temp.path().join("dir/file.txt")).unwrap(),
            "content"
        );
        let report = pipeline.finish();
        assert_eq!(report.files_extracted, 1);
        assert_eq!(report.directories_created, 1);
        assert_eq!(report.bytes_written, 7);
    }

    #[test]
    fn test_raw_traversal_name_rejected() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let data = TarTestBuilder::new()
            .add_file("../escape.txt", b"evil")
            .add_file("safe.txt", b"ok")
            .build();

        let (result, pipeline) = run(data, &temp, 0);
        result.unwrap();
        assert!(temp.path().join("safe.txt").exists());
        assert_eq!(
            pipeline
                .sink()
                .with_code(WarningCode::TarEntryError)
                .count(),
            1
        );
    }

    #[test]
    fn test_truncated_payload_is_fatal() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let mut data = TarTestBuilder::new()
            .add_file("big.bin", &[7u8; 2048])
            .build();
        // Header plus the first 1000 payload bytes
        data.truncate(512 + 1000);

        let (result, pipeline) = run(data, &temp, 0);
        let err = result.unwrap_err();
        assert!(matches!(err, ExtractionError::UnexpectedEof { .. }), "{err:?}");
        assert!(pipeline.is_closed());
    }

    #[test]
    fn test_truncated_header_is_unexpected_eof() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let mut data = TarTestBuilder::new()
            .add_file("first.txt", b"one")
            .add_file("second.txt", b"two")
            .build();
        // First header and payload block, then 200 bytes of the second header
        data.truncate(512 + 512 + 200);

        let (result, pipeline) = run(data, &temp, 0);
        let err = result.unwrap_err();
        assert!(
            matches!(err, ExtractionError::UnexpectedEof { ref path } if *path == PathBuf::from("first.txt")),
            "{err:?}"
        );
        assert!(pipeline.is_closed());
        assert_eq!(
            fs::read_to_string(temp.path().join("first.txt")).unwrap(),
            "one"
        );
    }

    #[test]
    fn test_corrupt_header_is_invalid_archive() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let mut data = TarTestBuilder::new()
            .add_file("first.txt", b"one")
            .add_file("second.txt", b"two")
            .build();
        // Change the second name without fixing the checksum
        data[1024] = b'X';

        let (result, pipeline) = run(data, &temp, 0);
        let err = result.unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidArchive(_)), "{err:?}");
        assert!(pipeline.is_closed());
    }

    #[test]
    fn test_archive_without_end_blocks_is_complete() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let mut data = TarTestBuilder::new().add_file("only.txt", b"x").build();
        data.truncate(1024);

        let (result, pipeline) = run(data, &temp, 0);
        result.unwrap();
        assert_eq!(pipeline.finish().files_extracted, 1);
    }

    #[test]
    fn test_strip_components_applied() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let data = TarTestBuilder::new()
            .add_directory("package/")
            .add_file("package/lib/index.js", b"x")
            .build();

        let (result, pipeline) = run(data, &temp, 2);
        result.unwrap();
        assert!(temp.path().join("index.js").exists());
        assert_eq!(pipeline.report().entries_skipped, 1);
    }
}
