//! Extraction root directory type.

use crate::ExtractionError;
use crate::Result;
use crate::security::lexical;
use crate::security::root::leading_root;
use std::path::Path;
use std::path::PathBuf;

/// The directory outside of which no entry may be written.
///
/// The root is made absolute against the current directory and normalized
/// lexically (`.`, `..` and repeated separators removed). It does not have
/// to exist yet; the directory writer creates it.
///
/// Containment checks compare the `/`-separated form returned by
/// [`as_slash`](Self::as_slash), so a root of `/tmp/out` contains
/// `/tmp/out/a` but not `/tmp/out-evil`.
///
/// # Examples
///
/// ```no_run
/// use targuard_core::types::ExtractionRoot;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let root = ExtractionRoot::new("/tmp/extraction/./x/..")?;
/// assert_eq!(root.as_slash(), "/tmp/extraction");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRoot {
    path: PathBuf,
    slash: String,
}

impl ExtractionRoot {
    /// Creates a new `ExtractionRoot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined for
    /// a relative path, or if the path is empty or not valid UTF-8.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(invalid_root("extraction root is empty"));
        }

        let absolute = std::path::absolute(path).map_err(|e| {
            ExtractionError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to make {} absolute: {e}", path.display()),
            ))
        })?;

        let text = absolute.to_str().ok_or_else(|| {
            invalid_root(&format!(
                "extraction root is not valid UTF-8: {}",
                absolute.display()
            ))
        })?;

        let unified = lexical::to_slash(text);
        let anchor = leading_root(&unified);
        let slash = lexical::resolve(anchor, &unified[anchor.len()..]);

        Ok(Self {
            path: PathBuf::from(&slash),
            slash,
        })
    }

    /// Returns the root as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Returns the normalized `/`-separated form of the root.
    #[inline]
    #[must_use]
    pub fn as_slash(&self) -> &str {
        &self.slash
    }

    /// Joins a root-relative `/`-path onto the root.
    #[must_use]
    pub fn join(&self, relative: &str) -> PathBuf {
        PathBuf::from(lexical::join(&self.slash, relative))
    }

    /// Returns `true` if the normalized absolute `/`-path lies within the
    /// root.
    #[must_use]
    pub fn contains(&self, resolved: &str) -> bool {
        lexical::is_within(resolved, &self.slash)
    }

    /// Converts into the inner `PathBuf`.
    #[inline]
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.path
    }
}

fn invalid_root(message: &str) -> ExtractionError {
    ExtractionError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        message.to_string(),
    ))
}
