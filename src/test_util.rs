//! Package builders shared by the unit tests.

use std::io::{self, Write};

use flate2::Compression;
use flate2::write::GzEncoder;

/// Fixed modification time so test packages are reproducible.
pub(crate) const TEST_MTIME: u64 = 1_700_000_000;

pub(crate) enum TestEntry<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8]),
}

/// Builds an uncompressed tar stream.
pub(crate) fn tar_bytes(entries: &[TestEntry<'_>]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for entry in entries {
        let mut header = tar::Header::new_gnu();
        header.set_mtime(TEST_MTIME);
        match entry {
            TestEntry::Dir(name) => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                header.set_mode(0o755);
                builder.append_data(&mut header, name, io::empty()).unwrap();
            }
            TestEntry::File(name, data) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(data.len() as u64);
                header.set_mode(0o644);
                builder.append_data(&mut header, name, *data).unwrap();
            }
        }
    }
    builder.into_inner().unwrap()
}

pub(crate) fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// Builds a gzip-compressed package.
pub(crate) fn package_bytes(entries: &[TestEntry<'_>]) -> Vec<u8> {
    gzip(&tar_bytes(entries))
}
