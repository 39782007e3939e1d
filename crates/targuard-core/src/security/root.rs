//! Root prefix stripping for archive entry paths.
//!
//! Archive paths are untrusted strings that may carry a root in any of the
//! forms a filesystem anywhere would honour: Unix `/`, UNC
//! `\\server\share\`, drive letters `C:\`, extended-length `//?/C:/`, and
//! drive-relative `C:foo`. [`strip_root`] removes all of them, repeatedly,
//! so that stacked roots such as `c:\c:\d:\x` cannot leave a residual root
//! behind.

/// Outcome of [`strip_root`].
///
/// Both fields borrow from the input, and `root` followed by `remainder` is
/// always exactly the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripResult<'a> {
    /// Every root that was stripped, concatenated in order. Empty if the
    /// input had no root.
    pub root: &'a str,
    /// What is left after stripping. Never starts with a recognized root.
    pub remainder: &'a str,
}

impl StripResult<'_> {
    /// Returns `true` if any root was stripped.
    #[inline]
    #[must_use]
    pub fn was_stripped(&self) -> bool {
        !self.root.is_empty()
    }
}

/// Strips every leading root from `path`.
///
/// # Examples
///
/// ```
/// use targuard_core::security::strip_root;
///
/// let s = strip_root("/etc/passwd");
/// assert_eq!((s.root, s.remainder), ("/", "etc/passwd"));
///
/// let s = strip_root(r"c:\c:\d:\e/f/g");
/// assert_eq!((s.root, s.remainder), (r"c:\c:\d:\", "e/f/g"));
///
/// // Drive-relative paths lose their drive even though they are not absolute
/// let s = strip_root(r"c:..\system\explorer.exe");
/// assert_eq!((s.root, s.remainder), ("c:", r"..\system\explorer.exe"));
///
/// let s = strip_root("relative/path");
/// assert!(!s.was_stripped());
/// ```
#[must_use]
pub fn strip_root(path: &str) -> StripResult<'_> {
    let mut offset = 0;

    loop {
        let rest = &path[offset..];
        // `//x/y/z` must sanitize to `x/y/z`, not lose `x/y` as a UNC share,
        // so forward slashes go one at a time unless this is `//?/`.
        let root_len = if rest.starts_with('/') && !rest.starts_with("//?/") {
            1
        } else {
            leading_root(rest).len()
        };
        if root_len == 0 {
            break;
        }
        offset += root_len;
    }

    let (root, remainder) = path.split_at(offset);
    StripResult { root, remainder }
}

/// Returns the single root at the start of `path`, or `""`.
///
/// Unlike [`strip_root`] this looks at one root only and reports `//` and
/// UNC shares as a whole.
#[must_use]
pub(crate) fn leading_root(path: &str) -> &str {
    let bytes = path.as_bytes();
    let len = match bytes {
        [b'/', b'/', ..] => forward_double_root(bytes),
        [b'/', ..] => 1,
        [b'\\', b'\\', ..] => backslash_double_root(bytes),
        [drive, b':', rest @ ..] if drive.is_ascii_alphabetic() => {
            let separators = rest.iter().take_while(|b| is_separator(**b)).count();
            2 + separators
        }
        _ => 0,
    };
    &path[..len]
}

/// `//?/X:/`, `//?/X:`, or plain `//`.
fn forward_double_root(bytes: &[u8]) -> usize {
    match bytes {
        [b'/', b'/', b'?', b'/', drive, b':', b'/', ..] if drive.is_ascii_alphabetic() => 7,
        [b'/', b'/', b'?', b'/', drive, b':', ..] if drive.is_ascii_alphabetic() => 6,
        _ => 2,
    }
}

/// `\\?\X:\`, `\\?\X:`, or a UNC `\\server\share\` prefix.
fn backslash_double_root(bytes: &[u8]) -> usize {
    match bytes {
        [b'\\', b'\\', b'?', b'\\', drive, b':', b'\\', ..] if drive.is_ascii_alphabetic() => {
            return 7;
        }
        [b'\\', b'\\', b'?', b'\\', drive, b':', ..] if drive.is_ascii_alphabetic() => {
            return 6;
        }
        _ => {}
    }

    let Some(server_end) = find_separator(bytes, 2) else {
        return 2;
    };
    // The share runs to the next separator; without one the whole path is
    // the root.
    find_separator(bytes, server_end + 1).map_or(bytes.len(), |share_end| share_end + 1)
}

fn find_separator(bytes: &[u8], from: usize) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|b| is_separator(*b))
        .map(|pos| from + pos)
}

#[inline]
const fn is_separator(byte: u8) -> bool {
    byte == b'/' || byte == b'\\'
}
