//! Property-based tests for the path-safety stages.
//!
//! These tests use proptest to generate hostile entry names and verify the
//! security properties hold across a wide range of cases.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use std::cell::Cell;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use targuard_core::security::ClobberGuard;
use targuard_core::security::Filesystem;
use targuard_core::security::GuardOutcome;
use targuard_core::security::LinkMetadata;
use targuard_core::security::RejectReason;
use targuard_core::security::resolve_hardlink_target;
use targuard_core::security::resolve_symlink_target;
use targuard_core::security::sanitize;
use targuard_core::security::strip_root;
use targuard_core::types::Entry;
use targuard_core::types::ExtractionRoot;

fn test_root() -> ExtractionRoot {
    ExtractionRoot::new("/tmp/out").expect("root should be valid")
}

/// Path fragments that exercise every kind of root and traversal.
fn fragment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "..", ".", "a", "b", "etc", "passwd", "c:", "C:", "c:..", "/", "\\", "//", "\\\\",
        "//?/c:/", "\\\\?\\c:\\", "\\\\srv\\share\\", "//srv/share/", "d:/", "x:\\",
    ])
}

fn separator() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["/", "\\", "//", ""])
}

fn hostile_path() -> impl Strategy<Value = String> {
    prop::collection::vec((fragment(), separator()), 0..8).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(fragment, sep)| format!("{fragment}{sep}"))
            .collect()
    })
}

proptest! {
    /// The stripped root and the remainder always rebuild the input, and
    /// the remainder has no root of its own.
    #[test]
    fn prop_strip_root_round_trip(input in any::<String>()) {
        let result = strip_root(&input);
        prop_assert_eq!(format!("{}{}", result.root, result.remainder), input.as_str());
        prop_assert_eq!(strip_root(result.remainder).root, "");
    }

    /// Same property, with inputs built from root-like fragments.
    #[test]
    fn prop_strip_root_round_trip_fragments(input in hostile_path()) {
        let result = strip_root(&input);
        prop_assert_eq!(format!("{}{}", result.root, result.remainder), input.as_str());
        prop_assert_eq!(strip_root(result.remainder).root, "");
    }

    /// Any path with a `..` segment is rejected, whatever roots surround it.
    #[test]
    fn prop_parent_segment_rejected(
        prefix in hostile_path(),
        sep in prop::sample::select(vec!["/", "\\"]),
        suffix in prop::collection::vec("[a-z]{1,8}", 0..4),
    ) {
        let path = format!("{prefix}{sep}..{sep}{}", suffix.join(sep));
        let rejection = sanitize(&Entry::file(path.as_str(), 0), &test_root(), 0)
            .expect_err("path with .. must be rejected");
        prop_assert_eq!(rejection.reason, RejectReason::ParentTraversal);
    }

    /// Every accepted path resolves to the root or below it.
    #[test]
    fn prop_accepted_paths_contained(path in hostile_path(), strip in 0usize..3) {
        let root = test_root();
        if let Ok(Some(accepted)) = sanitize(&Entry::file(path.as_str(), 0), &root, strip) {
            let absolute = accepted.absolute().to_str().expect("utf-8");
            prop_assert!(root.contains(absolute), "{path:?} escaped to {absolute}");
            prop_assert!(!accepted.path().split('/').any(|s| s == ".." || s == "."));
        }
    }

    /// Hard link targets are archive-root relative, however deep the link.
    #[test]
    fn prop_hardlink_target_ignores_link_depth(
        dirs in prop::collection::vec("[a-z]{1,6}", 0..8),
    ) {
        let root = test_root();
        let mut link_path = dirs.join("/");
        link_path.push_str(if dirs.is_empty() { "link" } else { "/link" });

        let entry = Entry::hardlink(link_path.as_str(), "bin/sh");
        let accepted = sanitize(&entry, &root, 0).unwrap().unwrap();
        let target = resolve_hardlink_target(accepted.link_target().unwrap(), &root);
        prop_assert_eq!(target, root.join("bin/sh"));
    }

    /// Escaping symlink targets are rebased under the root; contained ones
    /// are left exactly as written.
    #[test]
    fn prop_symlink_rebased_only_when_escaping(depth in 0usize..6, ups in 0usize..9) {
        let root = test_root();
        let link_path = format!("{}link", "d/".repeat(depth));
        let target = format!("{}x", "../".repeat(ups));

        let resolved = resolve_symlink_target(&link_path, &target, &root);
        if ups <= depth {
            prop_assert_eq!(resolved, PathBuf::from(&target));
        } else {
            prop_assert_eq!(resolved, root.join("x"));
        }
    }

    /// The guard removes exactly the multiply-linked, non-directory
    /// destinations.
    #[test]
    fn prop_guard_removes_only_shared_inodes(link_count in 0u64..6, is_dir in any::<bool>()) {
        let fs = FixedFilesystem {
            metadata: LinkMetadata { link_count, is_dir },
            removals: Cell::new(0),
        };
        let guard = ClobberGuard::new(fs);
        let outcome = guard.guard(Path::new("dest"));

        let should_remove = link_count > 1 && !is_dir;
        prop_assert_eq!(guard.filesystem().removals.get(), usize::from(should_remove));
        prop_assert_eq!(matches!(outcome, GuardOutcome::Removed { .. }), should_remove);
    }
}

struct FixedFilesystem {
    metadata: LinkMetadata,
    removals: Cell<usize>,
}

impl Filesystem for FixedFilesystem {
    fn link_metadata(&self, _path: &Path) -> io::Result<LinkMetadata> {
        Ok(self.metadata)
    }

    fn remove_file(&self, _path: &Path) -> io::Result<()> {
        self.removals.set(self.removals.get() + 1);
        Ok(())
    }
}
