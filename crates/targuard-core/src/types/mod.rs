//! Entry and destination types.
//!
//! An entry moves through three types on its way to disk, each produced by
//! one pipeline stage and never mutated afterwards:
//!
//! - [`Entry`]: untrusted, straight from the decoder
//! - [`SanitizedEntry`]: path approved and resolved inside the root
//! - [`ResolvedEntry`]: link target rewritten for the writer
//!
//! The later two cannot be constructed outside this crate, so holding one
//! proves the corresponding checks ran.

pub mod entry;
pub mod extraction_root;
pub mod resolved;

pub use entry::Entry;
pub use entry::EntryKind;
pub use extraction_root::ExtractionRoot;
pub use resolved::ResolvedEntry;
pub use resolved::ResolvedKind;
pub use resolved::SanitizedEntry;
