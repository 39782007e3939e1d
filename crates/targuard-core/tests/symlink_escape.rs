//! Symlink escape integration tests.

#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::path::PathBuf;
use targuard_core::DirWriter;
use targuard_core::ExtractConfig;
use targuard_core::ExtractionReport;
use targuard_core::Pipeline;
use targuard_core::WarningCode;
use targuard_core::extract_tar;
use targuard_core::report::CollectingSink;
use targuard_core::test_utils::TarTestBuilder;
use tempfile::TempDir;

fn extract(data: Vec<u8>, out: &Path) -> (ExtractionReport, CollectingSink) {
    let writer = DirWriter::new(out).unwrap();
    let mut pipeline = Pipeline::new(&ExtractConfig::new(out), writer, CollectingSink::new()).unwrap();
    extract_tar(Cursor::new(data), &mut pipeline).unwrap();
    let sink = pipeline.sink().clone();
    (pipeline.finish(), sink)
}

#[test]
fn test_relative_symlink_inside_root_kept_relative() {
    let temp = TempDir::new().unwrap();
    let data = TarTestBuilder::new()
        .add_file("b/file", b"data")
        .add_symlink("a/link", "../b/file")
        .build();

    let (report, _) = extract(data, temp.path());

    assert_eq!(report.symlinks_created, 1);
    let link = temp.path().join("a/link");
    assert_eq!(fs::read_link(&link).unwrap(), PathBuf::from("../b/file"));
    assert_eq!(fs::read_to_string(&link).unwrap(), "data");
}

#[test]
fn test_escaping_symlink_rebased() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let data = TarTestBuilder::new()
        .add_symlink("link", "../../../etc/passwd")
        .build();

    let (report, _) = extract(data, &out);

    assert_eq!(report.symlinks_created, 1);
    assert_eq!(
        fs::read_link(out.join("link")).unwrap(),
        out.join("etc/passwd")
    );
}

#[test]
fn test_absolute_symlink_rebased() {
    let temp = TempDir::new().unwrap();
    let data = TarTestBuilder::new().add_symlink("shadow", "/etc/shadow").build();

    extract(data, temp.path());

    assert_eq!(
        fs::read_link(temp.path().join("shadow")).unwrap(),
        temp.path().join("etc/shadow")
    );
}

#[test]
fn test_write_through_rebased_symlink_dir_refused() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let outside = temp.path().join("outside");
    fs::create_dir(&outside).unwrap();

    let data = TarTestBuilder::new()
        .add_symlink("escape", "../outside")
        .add_file("escape/pwned", b"evil")
        .build();

    let (report, sink) = extract(data, &out);

    // The link now dangles at out/outside, so the write is refused
    assert_eq!(report.symlinks_created, 1);
    assert_eq!(report.entries_rejected, 1);
    assert_eq!(sink.with_code(WarningCode::TarEntryError).count(), 1);
    assert!(!outside.join("pwned").exists());
}

#[test]
fn test_planted_symlink_not_followed() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let outside = temp.path().join("outside");
    fs::create_dir_all(&out).unwrap();
    fs::create_dir(&outside).unwrap();
    std::os::unix::fs::symlink(&outside, out.join("planted")).unwrap();

    let data = TarTestBuilder::new()
        .add_file("planted/pwned", b"evil")
        .add_directory("planted/sub/")
        .build();

    let (report, _) = extract(data, &out);

    assert_eq!(report.entries_rejected, 2);
    assert!(!outside.join("pwned").exists());
    assert!(!outside.join("sub").exists());
}

#[test]
fn test_file_replaces_existing_symlink() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let secret = temp.path().join("secret");
    fs::write(&secret, "original").unwrap();

    let data = TarTestBuilder::new()
        .add_symlink("config", "../../secret")
        .add_file("config", b"replaced")
        .build();

    let (report, _) = extract(data, &out);

    assert_eq!(report.files_extracted, 1);
    assert_eq!(fs::read_to_string(&secret).unwrap(), "original");
    assert_eq!(fs::read_to_string(out.join("config")).unwrap(), "replaced");
    assert!(!fs::symlink_metadata(out.join("config")).unwrap().file_type().is_symlink());
}

#[test]
fn test_symlink_chain_through_self_link_refused() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    fs::write(temp.path().join("outside.txt"), "secret-outside").unwrap();

    let data = TarTestBuilder::new()
        .add_symlink("d", ".")
        .add_symlink("esc", "d/..")
        .build();

    let (report, sink) = extract(data, &out);

    assert_eq!(report.symlinks_created, 1);
    assert_eq!(report.entries_rejected, 1);
    assert_eq!(sink.with_code(WarningCode::TarEntryError).count(), 1);
    assert!(fs::symlink_metadata(out.join("esc")).is_err());
    assert!(fs::read_to_string(out.join("esc/outside.txt")).is_err());
}

#[test]
fn test_symlink_to_root_itself_allowed() {
    let temp = TempDir::new().unwrap();
    let data = TarTestBuilder::new()
        .add_symlink("a/up", "..")
        .add_file("a/up/file", b"x")
        .build();

    let (report, _) = extract(data, temp.path());

    assert_eq!(report.symlinks_created, 1);
    assert_eq!(report.files_extracted, 1);
    assert!(temp.path().join("file").is_file());
}
