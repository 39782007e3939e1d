//! Path-safety engine for extracting untrusted tar archives.
//!
//! `targuard-core` sits between a tar decoder and a directory writer and
//! decides, entry by entry, what may be written where:
//!
//! - absolute, drive and UNC prefixes are stripped from entry paths
//! - entries with `..` segments, or that would land outside the extraction
//!   root, are refused with a `TAR_ENTRY_ERROR` warning
//! - hard link targets are resolved relative to the archive root, and
//!   symlink targets that would escape are rebased under it
//! - a file entry never writes through an existing hard link
//!   (CVE-2018-20834)
//!
//! # Examples
//!
//! ```no_run
//! use targuard_core::ExtractConfig;
//! use targuard_core::extract_archive;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExtractConfig::new("/output/dir").with_strip_components(1);
//! let report = extract_archive("package.tar", &config)?;
//! println!(
//!     "Extracted {} files, refused {} entries",
//!     report.files_extracted, report.entries_rejected
//! );
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod extraction;
pub mod formats;
pub mod report;
pub mod security;
pub mod types;

#[doc(hidden)]
pub mod test_utils;

// Re-export main API types
pub use api::extract_archive;
pub use config::DEFAULT_ROOT_NAME;
pub use config::ExtractConfig;
pub use error::ExtractionError;
pub use error::Result;
pub use extraction::DirWriter;
pub use extraction::EntryOutcome;
pub use extraction::EntryWriter;
pub use extraction::Pipeline;
pub use extraction::WriteOutcome;
pub use formats::extract_tar;
pub use report::ExtractionReport;
pub use report::Warning;
pub use report::WarningCode;
pub use report::WarningSink;

// Re-export types module for easier access
pub use types::Entry;
pub use types::EntryKind;
pub use types::ExtractionRoot;
