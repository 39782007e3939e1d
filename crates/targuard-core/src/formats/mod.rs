//! Archive decoders feeding the pipeline.

pub mod tar;

pub use tar::extract_tar;
