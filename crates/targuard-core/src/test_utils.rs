//! Test utilities for building hostile tar archives.
//!
//! `tar::Builder::append_data` refuses absolute names and `..` segments,
//! which are exactly the names these tests need. [`TarTestBuilder`] writes
//! the name and link name fields of the header directly instead.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors or on names longer
//! than a tar header field, since they are designed for test use only.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

/// Builder for in-memory TAR archives with arbitrary entry names.
///
/// # Examples
///
/// ```
/// use targuard_core::test_utils::TarTestBuilder;
///
/// let tar_data = TarTestBuilder::new()
///     .add_file("/etc/passwd", b"root:x:0:0")
///     .add_directory("../up/")
///     .add_symlink("link", "../../outside")
///     .add_hardlink("alias", "/etc/passwd")
///     .build();
/// assert_eq!(tar_data.len() % 512, 0);
/// ```
pub struct TarTestBuilder {
    builder: tar::Builder<Vec<u8>>,
}

impl TarTestBuilder {
    /// Creates a new TAR test builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    /// Adds a regular file to the archive.
    #[must_use]
    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.add_entry(path, tar::EntryType::Regular, None, 0o644, data)
    }

    /// Adds a directory to the archive.
    #[must_use]
    pub fn add_directory(self, path: &str) -> Self {
        self.add_entry(path, tar::EntryType::Directory, None, 0o755, &[])
    }

    /// Adds a symlink to the archive.
    #[must_use]
    pub fn add_symlink(self, path: &str, target: &str) -> Self {
        self.add_entry(path, tar::EntryType::Symlink, Some(target), 0o777, &[])
    }

    /// Adds a hardlink to the archive.
    #[must_use]
    pub fn add_hardlink(self, path: &str, target: &str) -> Self {
        self.add_entry(path, tar::EntryType::Link, Some(target), 0o644, &[])
    }

    /// Adds an entry with raw header values.
    #[must_use]
    pub fn add_entry(
        mut self,
        path: &str,
        entry_type: tar::EntryType,
        link_name: Option<&str>,
        mode: u32,
        data: &[u8],
    ) -> Self {
        let mut header = tar::Header::new_gnu();
        set_field(&mut header.as_old_mut().name, path);
        if let Some(link_name) = link_name {
            set_field(&mut header.as_old_mut().linkname, link_name);
        }
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_mtime(0);
        header.set_entry_type(entry_type);
        header.set_cksum();
        self.builder.append(&header, data).unwrap();
        self
    }

    /// Builds and returns the TAR archive data.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.builder.into_inner().unwrap()
    }
}

impl Default for TarTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn set_field(field: &mut [u8; 100], value: &str) {
    let bytes = value.as_bytes();
    assert!(
        bytes.len() <= field.len(),
        "name too long for a tar header: {value}"
    );
    field.fill(0);
    field[..bytes.len()].copy_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_tar_builder_keeps_raw_names() {
        let tar_data = TarTestBuilder::new()
            .add_file("../../etc/passwd", b"x")
            .add_hardlink("/abs/link", "c:\\target")
            .build();

        let mut archive = tar::Archive::new(Cursor::new(tar_data));
        let names: Vec<(Vec<u8>, Option<Vec<u8>>)> = archive
            .entries()
            .unwrap()
            .map(|e| {
                let e = e.unwrap();
                (
                    e.path_bytes().into_owned(),
                    e.link_name_bytes().map(|l| l.into_owned()),
                )
            })
            .collect();

        assert_eq!(names[0].0, b"../../etc/passwd");
        assert_eq!(names[1].0, b"/abs/link");
        assert_eq!(names[1].1.as_deref(), Some(&b"c:\\target"[..]));
    }
}
