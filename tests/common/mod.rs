//! Shared test utilities for integration tests.
//!
//! This module provides common helper functions used across multiple test files.
//! Package creation helpers are consolidated here to avoid duplication.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use assetshift::{RelocateOptions, Relocator};
use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

/// Fixed modification time so test packages are reproducible.
pub const TEST_MTIME: u64 = 1_700_000_000;

/// One entry of a test package.
#[derive(Debug, Clone, Copy)]
pub enum Item<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8]),
}

/// A decoded entry of a rebuilt package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEntry {
    /// Name as stored in the header.
    pub name: String,
    pub is_dir: bool,
    pub content: Vec<u8>,
}

/// Builds an uncompressed tar stream.
pub fn tar_bytes(items: &[Item<'_>]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for item in items {
        let mut header = tar::Header::new_gnu();
        header.set_mtime(TEST_MTIME);
        match *item {
            Item::Dir(name) => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                header.set_mode(0o755);
                builder
                    .append_data(&mut header, name, io::empty())
                    .expect("append directory");
            }
            Item::File(name, data) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(data.len() as u64);
                header.set_mode(0o644);
                builder
                    .append_data(&mut header, name, data)
                    .expect("append file");
            }
        }
    }
    builder.into_inner().expect("finish tar")
}

/// Compresses bytes with gzip.
pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

/// Builds a gzip-compressed package in memory.
pub fn package_bytes(items: &[Item<'_>]) -> Vec<u8> {
    gzip(&tar_bytes(items))
}

/// The canonical single-asset package.
pub fn avatar_package() -> Vec<u8> {
    package_bytes(&[
        Item::Dir("abc123/"),
        Item::File("abc123/pathname", b"Assets/MyAvatar.prefab"),
        Item::File("abc123/asset", &[0x00, 0xFF, 0x10, 0x80, 0x7F]),
    ])
}

/// Scratch environment: a temp dir holding a source package and a work dir.
pub struct Scratch {
    pub temp: TempDir,
    pub source: PathBuf,
    pub work: PathBuf,
}

impl Scratch {
    /// Writes `bytes` as `source.unitypackage` into a fresh temp dir.
    pub fn new(bytes: &[u8]) -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let source = temp.path().join("source.unitypackage");
        fs::write(&source, bytes).expect("write source package");
        let work = temp.path().join("work");
        Self { temp, source, work }
    }

    /// Options rooted at this scratch work dir.
    pub fn options(&self) -> RelocateOptions {
        RelocateOptions::new().work_dir(&self.work)
    }

    /// Relocator rooted at this scratch work dir.
    pub fn relocator(&self) -> Relocator {
        Relocator::new(self.options())
    }

    /// Returns `true` if no staging directory is left below the work dir.
    pub fn staging_is_clean(&self) -> bool {
        let root = self.options().staging_root();
        match fs::read_dir(&root) {
            Ok(mut entries) => entries.next().is_none(),
            Err(e) => e.kind() == io::ErrorKind::NotFound,
        }
    }

    /// Returns `true` if the work dir holds no package or partial output.
    pub fn no_outputs(&self) -> bool {
        match fs::read_dir(&self.work) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .all(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false)),
            Err(e) => e.kind() == io::ErrorKind::NotFound,
        }
    }
}

/// Reads a rebuilt package, compressed or not.
pub fn read_output(path: &Path) -> Vec<OutputEntry> {
    let bytes = fs::read(path).expect("read output package");
    let raw = if bytes.starts_with(&[0x1f, 0x8b]) {
        let mut decoded = Vec::new();
        flate2::read::GzDecoder::new(bytes.as_slice())
            .read_to_end(&mut decoded)
            .expect("gunzip output");
        decoded
    } else {
        bytes
    };

    let mut archive = tar::Archive::new(raw.as_slice());
    archive
        .entries()
        .expect("tar entries")
        .map(|entry| {
            let mut entry = entry.expect("tar entry");
            let name = String::from_utf8(entry.path_bytes().into_owned()).expect("utf-8 name");
            let is_dir = entry.header().entry_type().is_dir();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).expect("entry content");
            OutputEntry {
                name,
                is_dir,
                content,
            }
        })
        .collect()
}

/// Extracts the error from a Result, panicking if it's Ok.
///
/// # Panics
///
/// Panics if the result is `Ok`.
pub fn expect_err<T, E>(result: Result<T, E>) -> E {
    match result {
        Ok(_) => panic!("Expected error but got Ok"),
        Err(e) => e,
    }
}
