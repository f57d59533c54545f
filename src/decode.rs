//! Streaming decoder for gzip-compressed tar packages.
//!
//! [`ArchiveDecoder`] turns a compressed byte stream into a lazy, ordered
//! sequence of [`RawEntry`] values. The sequence is not restartable: once it
//! has been consumed the underlying stream is exhausted, and a second
//! traversal requires reopening the source.
//!
//! # Error classification
//!
//! Failures of the underlying reader are reported as [`Error::Io`]. Anything
//! raised by the gzip decompressor or the tar parser while the source itself
//! reads fine (bad signature, corrupt deflate data, header checksum mismatch,
//! truncated blocks) is reported as [`Error::InvalidFormat`].
//!
//! # Example
//!
//! ```rust,no_run
//! use assetshift::decode::ArchiveDecoder;
//!
//! let mut decoder = ArchiveDecoder::open("package.unitypackage")?;
//! for entry in decoder.entries()? {
//!     let entry = entry?;
//!     println!("{} ({} bytes)", entry.name, entry.content.len());
//! }
//! decoder.finish()?;
//! # Ok::<(), assetshift::Error>(())
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use flate2::bufread::GzDecoder;
use tar::EntryType;

use crate::entry::{DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, EntryKind, RawEntry};
use crate::{EntryPath, Error, Result};

/// gzip member signature.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Upper bound for the up-front content allocation of a single entry.
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Reader wrapper that remembers whether the source itself failed.
struct SourceReader<R> {
    inner: R,
    failed: Arc<AtomicBool>,
}

impl<R: Read> Read for SourceReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Err(e) if e.kind() != io::ErrorKind::Interrupted => {
                self.failed.store(true, Ordering::Relaxed);
                Err(e)
            }
            other => other,
        }
    }
}

/// Decides whether an I/O error came from the source or from the framing.
#[derive(Debug, Clone)]
struct ErrorClassifier {
    source_failed: Arc<AtomicBool>,
}

impl ErrorClassifier {
    fn classify(&self, err: io::Error) -> Error {
        if self.source_failed.load(Ordering::Relaxed) {
            Error::Io(err)
        } else {
            Error::InvalidFormat(err.to_string())
        }
    }
}

type PackageStream<R> = GzDecoder<BufReader<SourceReader<R>>>;

/// Decoder over one gzip-compressed tar package.
pub struct ArchiveDecoder<R: Read> {
    archive: tar::Archive<PackageStream<R>>,
    classifier: ErrorClassifier,
}

impl ArchiveDecoder<File> {
    /// Opens a package from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be opened and
    /// [`Error::InvalidFormat`] if it does not start with a gzip signature.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::new(file)
    }
}

impl<R: Read> ArchiveDecoder<R> {
    /// Creates a decoder over an arbitrary reader.
    ///
    /// The gzip signature is checked eagerly; everything else is validated
    /// lazily while entries are pulled.
    pub fn new(reader: R) -> Result<Self> {
        let failed = Arc::new(AtomicBool::new(false));
        let classifier = ErrorClassifier {
            source_failed: Arc::clone(&failed),
        };

        let mut buffered = BufReader::new(SourceReader {
            inner: reader,
            failed,
        });
        let head = buffered.fill_buf().map_err(|e| classifier.classify(e))?;
        if head.len() < GZIP_MAGIC.len() || head[..GZIP_MAGIC.len()] != GZIP_MAGIC {
            return Err(Error::InvalidFormat("missing gzip signature".into()));
        }

        Ok(Self {
            archive: tar::Archive::new(GzDecoder::new(buffered)),
            classifier,
        })
    }

    /// Returns the lazy entry sequence.
    ///
    /// Entries are yielded in archive order with their content fully read.
    /// The sequence stops after the first error.
    pub fn entries(&mut self) -> Result<RawEntries<'_, R>> {
        let classifier = self.classifier.clone();
        let inner = self
            .archive
            .entries()
            .map_err(|e| classifier.classify(e))?;
        Ok(RawEntries {
            inner,
            classifier,
            done: false,
        })
    }

    /// Counts the entries of the package without buffering their content.
    ///
    /// Consumes the decoder: the stream is drained and the gzip trailer is
    /// verified, so a package that counts cleanly is structurally complete.
    pub fn count_entries(mut self) -> Result<usize> {
        let classifier = self.classifier.clone();
        let mut count = 0;
        let entries = self
            .archive
            .entries()
            .map_err(|e| classifier.classify(e))?;
        for entry in entries {
            let entry = entry.map_err(|e| classifier.classify(e))?;
            if header_info(&entry)?.is_some() {
                count += 1;
            }
        }
        self.finish()?;
        Ok(count)
    }

    /// Drains the remainder of the compressed stream.
    ///
    /// The tar end-of-archive marker usually sits before the end of the gzip
    /// member; reading to the end makes the decompressor check the trailer
    /// CRC and length.
    pub fn finish(self) -> Result<()> {
        let Self {
            archive,
            classifier,
        } = self;
        let mut stream = archive.into_inner();
        io::copy(&mut stream, &mut io::sink()).map_err(|e| classifier.classify(e))?;
        Ok(())
    }
}

/// Lazy sequence of [`RawEntry`] values, see [`ArchiveDecoder::entries`].
pub struct RawEntries<'a, R: Read + 'a> {
    inner: tar::Entries<'a, PackageStream<R>>,
    classifier: ErrorClassifier,
    done: bool,
}

impl<'a, R: Read + 'a> RawEntries<'a, R> {
    fn read_entry(&self, mut entry: tar::Entry<'a, PackageStream<R>>) -> Result<Option<RawEntry>> {
        let Some((name, kind)) = header_info(&entry)? else {
            return Ok(None);
        };

        let header = entry.header();
        let default_mode = match kind {
            EntryKind::File => DEFAULT_FILE_MODE,
            EntryKind::Directory => DEFAULT_DIR_MODE,
        };
        let mode = header.mode().unwrap_or(default_mode);
        let mtime = header.mtime().map_err(|e| self.classifier.classify(e))?;

        let mut content = Vec::new();
        if kind == EntryKind::File {
            content.reserve(entry.size().min(MAX_PREALLOC) as usize);
            entry
                .read_to_end(&mut content)
                .map_err(|e| self.classifier.classify(e))?;
        }

        Ok(Some(RawEntry {
            name,
            kind,
            content,
            mode,
            mtime,
        }))
    }
}

impl<'a, R: Read + 'a> Iterator for RawEntries<'a, R> {
    type Item = Result<RawEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let result = match self.inner.next()? {
                Ok(entry) => self.read_entry(entry),
                Err(e) => Err(self.classifier.classify(e)),
            };

            match result {
                Ok(Some(raw)) => return Some(Ok(raw)),
                // Metadata record, not part of the package contents
                Ok(None) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Validates an entry header and returns its name and kind.
///
/// Returns `Ok(None)` for records that carry no package content (PAX global
/// headers). Both decoding passes use this, so they agree on what counts as
/// an entry.
fn header_info<R: Read>(entry: &tar::Entry<'_, R>) -> Result<Option<(EntryPath, EntryKind)>> {
    let entry_type = entry.header().entry_type();
    let kind = match entry_type {
        EntryType::Regular | EntryType::Continuous => EntryKind::File,
        EntryType::Directory => EntryKind::Directory,
        EntryType::XGlobalHeader => return Ok(None),
        other => {
            return Err(Error::UnsupportedEntryType {
                name: String::from_utf8_lossy(&entry.path_bytes()).into_owned(),
                entry_type: format!("{:?}", other),
            });
        }
    };

    let name = EntryPath::from_bytes(&entry.path_bytes())?;

    // Old-style archives mark directories only by the trailing separator
    if kind == EntryKind::Directory || name.is_directory() {
        Ok(Some((name.into_directory(), EntryKind::Directory)))
    } else {
        Ok(Some((name, kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{TestEntry, gzip, package_bytes, tar_bytes};
    use std::io::Cursor;

    fn scenario() -> Vec<u8> {
        package_bytes(&[
            TestEntry::Dir("abc123/"),
            TestEntry::File("abc123/pathname", b"Assets/MyAvatar.prefab"),
            TestEntry::File("abc123/asset", &[0x00, 0xFF, 0x10, 0x80]),
        ])
    }

    #[test]
    fn test_decode_entries_in_order() {
        let mut decoder = ArchiveDecoder::new(Cursor::new(scenario())).unwrap();
        let entries: Vec<RawEntry> = decoder
            .entries()
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name.as_str(), "abc123/");
        assert!(entries[0].is_directory());
        assert_eq!(entries[1].name.as_str(), "abc123/pathname");
        assert_eq!(entries[1].content, b"Assets/MyAvatar.prefab");
        assert_eq!(entries[2].content, vec![0x00, 0xFF, 0x10, 0x80]);
        decoder.finish().unwrap();
    }

    #[test]
    fn test_count_entries() {
        let decoder = ArchiveDecoder::new(Cursor::new(scenario())).unwrap();
        assert_eq!(decoder.count_entries().unwrap(), 3);
    }

    #[test]
    fn test_empty_package() {
        let bytes = package_bytes(&[]);
        let decoder = ArchiveDecoder::new(Cursor::new(bytes)).unwrap();
        assert_eq!(decoder.count_entries().unwrap(), 0);
    }

    #[test]
    fn test_missing_gzip_signature() {
        let bytes = tar_bytes(&[TestEntry::File("a/pathname", b"Assets/a")]);
        let err = ArchiveDecoder::new(Cursor::new(bytes)).err().unwrap();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_empty_input() {
        let err = ArchiveDecoder::new(Cursor::new(Vec::<u8>::new()))
            .err()
            .unwrap();
        assert!(err.is_format());
    }

    #[test]
    fn test_header_checksum_mismatch() {
        let mut raw = tar_bytes(&[TestEntry::File("abc/asset", b"payload")]);
        // Corrupt the name field of the first header
        raw[0] ^= 0x20;
        let bytes = gzip(&raw);

        let mut decoder = ArchiveDecoder::new(Cursor::new(bytes)).unwrap();
        let result: Result<Vec<RawEntry>> = decoder.entries().unwrap().collect();
        assert!(result.unwrap_err().is_format());
    }

    #[test]
    fn test_truncated_stream() {
        let payload: Vec<u8> = (0..8192u32)
            .map(|i| (i.wrapping_mul(2654435761) >> 13) as u8)
            .collect();
        let bytes = package_bytes(&[TestEntry::File("abc/asset", &payload)]);
        let truncated = bytes[..bytes.len() / 2].to_vec();

        let decoder = ArchiveDecoder::new(Cursor::new(truncated)).unwrap();
        let err = decoder.count_entries().unwrap_err();
        assert!(err.is_format(), "unexpected error: {err}");
    }

    #[test]
    fn test_source_failure_is_io() {
        struct FailingReader;
        impl Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("device gone"))
            }
        }

        let err = ArchiveDecoder::new(FailingReader).err().unwrap();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_symlink_rejected() {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        builder
            .append_link(&mut header, "abc/link", "target")
            .unwrap();
        let bytes = gzip(&builder.into_inner().unwrap());

        let decoder = ArchiveDecoder::new(Cursor::new(bytes)).unwrap();
        let err = decoder.count_entries().unwrap_err();
        assert!(matches!(err, Error::UnsupportedEntryType { .. }));
    }

    #[test]
    fn test_traversal_name_rejected() {
        let mut header = tar::Header::new_old();
        let name = b"../evil";
        header.as_old_mut().name[..name.len()].copy_from_slice(name);
        header.set_entry_type(EntryType::Regular);
        header.set_size(4);
        header.set_mode(0o644);
        header.set_cksum();

        let mut builder = tar::Builder::new(Vec::new());
        builder.append(&header, &b"evil"[..]).unwrap();
        let bytes = gzip(&builder.into_inner().unwrap());

        let mut decoder = ArchiveDecoder::new(Cursor::new(bytes)).unwrap();
        let err = decoder.entries().unwrap().next().unwrap().unwrap_err();
        assert!(matches!(err, Error::InvalidEntryName { .. }));
    }

    #[test]
    fn test_long_names_survive() {
        let long = format!("{}/pathname", "g".repeat(150));
        let bytes = package_bytes(&[TestEntry::File(&long, b"Assets/x")]);

        let mut decoder = ArchiveDecoder::new(Cursor::new(bytes)).unwrap();
        let entry = decoder.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(entry.name.as_str(), long);
    }
}
