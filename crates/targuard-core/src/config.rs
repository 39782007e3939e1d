//! Extraction configuration.

use std::path::PathBuf;

/// Directory name used as the extraction root when none is configured.
///
/// It is resolved against the current working directory.
pub const DEFAULT_ROOT_NAME: &str = "targuard-extract";

/// Configuration for one extraction pipeline.
///
/// Both values are fixed for the lifetime of the pipeline built from them.
///
/// # Examples
///
/// ```
/// use targuard_core::ExtractConfig;
///
/// let config = ExtractConfig::new("/tmp/out").with_strip_components(1);
/// assert_eq!(config.strip_components(), 1);
///
/// // Negative counts behave like zero
/// let config = ExtractConfig::new("/tmp/out").with_strip_components(-3);
/// assert_eq!(config.strip_components(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExtractConfig {
    /// Extraction root directory. `None` selects [`DEFAULT_ROOT_NAME`].
    pub root: Option<PathBuf>,

    /// Number of leading path segments to drop from every entry path and
    /// link target, like `tar --strip-components`. Values `<= 0` mean none.
    pub strip_components: i64,
}

impl ExtractConfig {
    /// Creates a configuration extracting into `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            strip_components: 0,
        }
    }

    /// Sets the strip-components count.
    #[must_use]
    pub fn with_strip_components(mut self, count: i64) -> Self {
        self.strip_components = count;
        self
    }

    /// Returns the normalized strip-components count.
    #[must_use]
    pub fn strip_components(&self) -> usize {
        if self.strip_components <= 0 {
            return 0;
        }
        usize::try_from(self.strip_components).unwrap_or(usize::MAX)
    }

    /// Returns the configured root, or the default root name.
    #[must_use]
    pub fn root_or_default(&self) -> PathBuf {
        self.root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT_NAME))
    }
}
