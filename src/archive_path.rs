//! Validated entry names for tar-based packages.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Maximum length for entry names (in bytes).
///
/// GNU long-name records allow arbitrarily long names; anything beyond this is
/// treated as a corrupt or hostile package.
const MAX_NAME_LENGTH: usize = 32768;

/// A validated, POSIX-style relative entry name.
///
/// `EntryPath` keeps the name exactly as it appeared in the package, so the
/// rebuilt archive uses identical names. Validation guarantees that the name
/// can be mapped below a staging root without escaping it:
/// - No NUL bytes
/// - Not empty
/// - Not absolute (no leading `/` or `\`, no drive letter)
/// - No `..` segments
///
/// A trailing `/` marks a directory entry. `.` segments and a leading `./`
/// are tolerated and ignored when mapping to a file system path.
///
/// # Examples
///
/// ```
/// use assetshift::EntryPath;
///
/// let path = EntryPath::new("abc123/pathname").unwrap();
/// assert_eq!(path.file_name(), "pathname");
///
/// let dir = EntryPath::new("abc123/").unwrap();
/// assert!(dir.is_directory());
///
/// assert!(EntryPath::new("../escape").is_err());
/// assert!(EntryPath::new("/absolute").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryPath(String);

impl EntryPath {
    /// Creates a new `EntryPath` from a string, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEntryName`] if the name is empty, absolute,
    /// contains NUL bytes or contains `..` segments.
    pub fn new(s: &str) -> Result<Self> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Creates an `EntryPath` from raw header bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEntryName`] if the bytes are not UTF-8 or the
    /// decoded name fails validation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let s = std::str::from_utf8(bytes).map_err(|_| Error::InvalidEntryName {
            name: String::from_utf8_lossy(bytes).into_owned(),
            reason: "not valid UTF-8",
        })?;
        Self::new(s)
    }

    fn validate(s: &str) -> Result<()> {
        let reject = |reason: &'static str| {
            Err(Error::InvalidEntryName {
                name: s.to_string(),
                reason,
            })
        };

        if s.contains('\0') {
            return reject("contains NUL byte");
        }

        if s.is_empty() {
            return reject("empty name");
        }

        if s.len() > MAX_NAME_LENGTH {
            return reject("name exceeds maximum length");
        }

        if s.starts_with('/') || s.starts_with('\\') {
            return reject("absolute path not allowed");
        }

        // C:\ or C:/ style prefixes
        let bytes = s.as_bytes();
        if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
            return reject("drive prefix not allowed");
        }

        if s.split(['/', '\\']).any(|segment| segment == "..") {
            return reject("'..' segment not allowed (path traversal)");
        }

        if s.split('/').all(|segment| segment.is_empty() || segment == ".") {
            return reject("name has no components");
        }

        Ok(())
    }

    /// Returns the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the name ends with a separator.
    pub fn is_directory(&self) -> bool {
        self.0.ends_with('/')
    }

    /// Returns the name with a trailing `/` appended if it is missing.
    pub fn into_directory(mut self) -> Self {
        if !self.is_directory() {
            self.0.push('/');
        }
        self
    }

    /// Returns the name without any trailing `/`.
    pub fn trimmed(&self) -> &str {
        self.0.trim_end_matches('/')
    }

    /// Returns the last non-empty segment of the name.
    pub fn file_name(&self) -> &str {
        self.components().last().unwrap_or("")
    }

    /// Returns an iterator over the meaningful segments.
    ///
    /// Empty segments and `.` segments are skipped.
    ///
    /// ```
    /// use assetshift::EntryPath;
    ///
    /// let path = EntryPath::new("./abc//asset.meta").unwrap();
    /// let parts: Vec<_> = path.components().collect();
    /// assert_eq!(parts, vec!["abc", "asset.meta"]);
    /// ```
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
    }

    /// Returns the first segment, normally the asset GUID folder.
    pub fn root(&self) -> &str {
        self.components().next().unwrap_or("")
    }

    /// Maps this name below `base`.
    pub fn to_path_under(&self, base: &Path) -> PathBuf {
        let mut path = base.to_path_buf();
        for segment in self.components() {
            path.push(segment);
        }
        path
    }
}

impl AsRef<str> for EntryPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for EntryPath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
