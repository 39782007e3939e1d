//! Entry pipeline and writers.

pub mod pipeline;
pub mod writer;

pub use pipeline::EntryOutcome;
pub use pipeline::Pipeline;
pub use writer::DirWriter;
pub use writer::EntryWriter;
pub use writer::WriteOutcome;
