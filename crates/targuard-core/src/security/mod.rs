//! Path-safety stages of the extraction pipeline.
//!
//! In pipeline order:
//!
//! 1. [`sanitize`]: strip-components, traversal checks, root stripping
//!    ([`strip_root`]) and the containment check
//! 2. [`resolve_links`]: hard link and symlink targets
//! 3. [`ClobberGuard`]: breaks hard link aliases before a file is written

pub mod clobber;
pub(crate) mod lexical;
pub mod link;
pub mod path;
pub mod root;

pub use clobber::ClobberGuard;
pub use clobber::Filesystem;
pub use clobber::GuardOutcome;
pub use clobber::HostFilesystem;
pub use clobber::LinkMetadata;
pub use link::resolve_hardlink_target;
pub use link::resolve_links;
pub use link::resolve_symlink_target;
pub use path::RejectReason;
pub use path::Rejection;
pub use path::sanitize;
pub use path::strip_components;
pub use root::StripResult;
pub use root::strip_root;
