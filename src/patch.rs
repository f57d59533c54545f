//! Path descriptor patching.
//!
//! Every asset folder of a Unity package carries a `pathname` text file with
//! the asset's import destination, e.g. `Assets/MyAvatar.prefab`. The
//! [`PathPatcher`] inserts a category segment into that destination so the
//! asset lands in a subfolder on import:
//!
//! ```text
//! Assets/MyAvatar.prefab  ->  Assets/Clothing/MyAvatar.prefab
//! ```
//!
//! All other entries pass through byte-identical.

use std::fmt;

use crate::entry::RawEntry;
use crate::{Error, Result};

/// Length of the `Assets/` root prefix every Unity destination starts with.
pub const ASSETS_PREFIX_LEN: usize = 7;

/// A validated category label, usable as a single path segment.
///
/// # Examples
///
/// ```
/// use assetshift::Category;
///
/// assert!(Category::new("Clothing").is_ok());
/// assert!(Category::new("").is_err());
/// assert!(Category::new("Hats/Caps").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category(String);

impl Category {
    /// Validates a category label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCategory`] for empty labels, labels containing
    /// `/`, `\` or NUL, and the `.`/`..` segments.
    pub fn new(label: &str) -> Result<Self> {
        let reject = |reason: &'static str| {
            Err(Error::InvalidCategory {
                label: label.to_string(),
                reason,
            })
        };

        if label.is_empty() {
            return reject("empty label");
        }
        if label.contains(['/', '\\']) {
            return reject("contains a path separator");
        }
        if label.contains('\0') {
            return reject("contains NUL byte");
        }
        if label == "." || label == ".." {
            return reject("relative path segment");
        }
        Ok(Self(label.to_string()))
    }

    /// Returns the label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the category segment is inserted into a destination path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint {
    /// Insert at a fixed byte offset.
    ///
    /// The default offset is [`ASSETS_PREFIX_LEN`], which couples the patch
    /// to the literal `Assets/` prefix.
    FixedOffset(usize),
    /// Insert right after the first `/` of the destination.
    ///
    /// Fails with [`Error::MissingSeparator`] when the content has none.
    AfterFirstSeparator,
}

impl Default for InsertionPoint {
    fn default() -> Self {
        Self::FixedOffset(ASSETS_PREFIX_LEN)
    }
}

/// Rewrites `pathname` descriptors to include a category segment.
#[derive(Debug, Clone)]
pub struct PathPatcher {
    segment: String,
    insertion: InsertionPoint,
}

impl PathPatcher {
    /// Creates a patcher inserting `category/` at the default offset.
    pub fn new(category: &Category) -> Self {
        Self::with_insertion(category, InsertionPoint::default())
    }

    /// Creates a patcher with an explicit insertion point.
    pub fn with_insertion(category: &Category, insertion: InsertionPoint) -> Self {
        Self {
            segment: format!("{}/", category.as_str()),
            insertion,
        }
    }

    /// Returns the configured insertion point.
    pub fn insertion(&self) -> InsertionPoint {
        self.insertion
    }

    /// Patches `entry` in place if it is a path descriptor.
    ///
    /// Returns `true` if the content was rewritten.
    pub fn apply(&self, entry: &mut RawEntry) -> Result<bool> {
        if !entry.is_path_descriptor() {
            return Ok(false);
        }
        entry.content = self.patch_content(entry.name.as_str(), &entry.content)?;
        Ok(true)
    }

    /// Returns the patched form of a descriptor's content.
    ///
    /// `entry` is only used for error reporting.
    pub fn patch_content(&self, entry: &str, content: &[u8]) -> Result<Vec<u8>> {
        let offset = match self.insertion {
            InsertionPoint::FixedOffset(offset) => {
                if content.len() < offset {
                    return Err(Error::PathDescriptorTooShort {
                        entry: entry.to_string(),
                        len: content.len(),
                        offset,
                    });
                }
                offset
            }
            InsertionPoint::AfterFirstSeparator => match content.iter().position(|&b| b == b'/') {
                Some(pos) => pos + 1,
                None => {
                    return Err(Error::MissingSeparator {
                        entry: entry.to_string(),
                    });
                }
            },
        };

        let text = std::str::from_utf8(content).map_err(|_| Error::InvalidPathDescriptor {
            entry: entry.to_string(),
            reason: "content is not valid UTF-8",
        })?;
        if !text.is_char_boundary(offset) {
            return Err(Error::InvalidPathDescriptor {
                entry: entry.to_string(),
                reason: "insertion offset splits a character",
            });
        }

        let mut patched = String::with_capacity(text.len() + self.segment.len());
        patched.push_str(&text[..offset]);
        patched.push_str(&self.segment);
        patched.push_str(&text[offset..]);
        Ok(patched.into_bytes())
    }
}
