//! Raw package entries as produced by the decoder.

use crate::EntryPath;

/// Name of the path descriptor file inside each asset folder.
pub const PATH_DESCRIPTOR: &str = "pathname";

/// Default mode for rebuilt file entries when the source header has none.
pub(crate) const DEFAULT_FILE_MODE: u32 = 0o644;
/// Default mode for rebuilt directory entries when the source header has none.
pub(crate) const DEFAULT_DIR_MODE: u32 = 0o755;

/// Kind of a package entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A regular file with content.
    File,
    /// A directory; its name always ends with `/`.
    Directory,
}

impl EntryKind {
    /// Returns `true` for directories.
    pub fn is_directory(self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// A single entry decoded from a package.
///
/// Entries are produced in archive order by
/// [`ArchiveDecoder::entries`](crate::decode::ArchiveDecoder::entries) and
/// consumed by the patcher and the staging area within one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// The entry name, unique within the package.
    pub name: EntryPath,
    /// File or directory.
    pub kind: EntryKind,
    /// File content; always empty for directories.
    pub content: Vec<u8>,
    /// Permission bits from the tar header.
    pub mode: u32,
    /// Modification time (seconds since the Unix epoch) from the tar header.
    pub mtime: u64,
}

impl RawEntry {
    /// Creates a file entry with default metadata.
    pub fn file(name: EntryPath, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name,
            kind: EntryKind::File,
            content: content.into(),
            mode: DEFAULT_FILE_MODE,
            mtime: 0,
        }
    }

    /// Creates a directory entry with default metadata.
    pub fn directory(name: EntryPath) -> Self {
        Self {
            name: name.into_directory(),
            kind: EntryKind::Directory,
            content: Vec::new(),
            mode: DEFAULT_DIR_MODE,
            mtime: 0,
        }
    }

    /// Returns `true` if this entry is a directory.
    pub fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }

    /// Returns the content of a file entry, `None` for directories.
    pub fn content(&self) -> Option<&[u8]> {
        match self.kind {
            EntryKind::File => Some(&self.content),
            EntryKind::Directory => None,
        }
    }

    /// Returns `true` if this is a `pathname` descriptor carrying content.
    pub fn is_path_descriptor(&self) -> bool {
        self.kind == EntryKind::File && self.name.file_name() == PATH_DESCRIPTOR
    }
}
