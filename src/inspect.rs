//! Read-only package inspection.
//!
//! [`inspect`] decodes a package once and groups its entries by asset
//! folder, without writing anything to disk.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::decode::ArchiveDecoder;
use crate::entry::{PATH_DESCRIPTOR, RawEntry};
use crate::patch::PathPatcher;
use crate::Result;

/// File name of the asset payload inside an asset folder.
pub const ASSET_FILE: &str = "asset";
/// File name of the asset's import settings inside an asset folder.
pub const ASSET_META_FILE: &str = "asset.meta";
/// File name of the optional preview thumbnail inside an asset folder.
pub const PREVIEW_FILE: &str = "preview.png";

/// Summary of one asset folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetRecord {
    /// Folder name, normally the asset GUID.
    pub guid: String,
    /// Import destination from the `pathname` descriptor (first line).
    pub destination: Option<String>,
    /// Whether the folder holds an `asset` payload.
    pub has_asset: bool,
    /// Whether the folder holds an `asset.meta` sidecar.
    pub has_meta: bool,
    /// Whether the folder holds a preview thumbnail.
    pub has_preview: bool,
    /// Size of the `asset` payload in bytes.
    pub asset_size: u64,
}

impl AssetRecord {
    /// Returns the destination `patcher` would produce for this asset.
    ///
    /// Returns `None` when the folder has no descriptor.
    pub fn relocated_destination(&self, patcher: &PathPatcher) -> Option<Result<String>> {
        let destination = self.destination.as_ref()?;
        let entry = format!("{}/{}", self.guid, PATH_DESCRIPTOR);
        Some(
            patcher
                .patch_content(&entry, destination.as_bytes())
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
        )
    }

    /// Returns `true` if the folder has everything Unity needs to import it.
    pub fn is_complete(&self) -> bool {
        self.destination.is_some() && self.has_asset && self.has_meta
    }
}

/// Listing of a package's assets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageListing {
    /// Total number of entries, files and directories.
    pub entries: usize,
    /// Asset folders in order of first appearance.
    pub assets: Vec<AssetRecord>,
}

impl PackageListing {
    /// Returns the number of asset folders lacking a descriptor, payload or
    /// sidecar.
    pub fn incomplete(&self) -> usize {
        self.assets.iter().filter(|a| !a.is_complete()).count()
    }

    /// Looks up an asset folder by GUID.
    pub fn asset(&self, guid: &str) -> Option<&AssetRecord> {
        self.assets.iter().find(|a| a.guid == guid)
    }
}

/// Lists the assets of the package at `path`.
///
/// # Errors
///
/// Fails exactly like the relocation pipeline's processing pass: with an I/O
/// error when the file cannot be read and a format error for malformed
/// packages.
pub fn inspect(path: impl AsRef<Path>) -> Result<PackageListing> {
    inspect_decoder(ArchiveDecoder::open(path)?)
}

/// Lists the assets of a package read from `reader`.
pub fn inspect_reader<R: Read>(reader: R) -> Result<PackageListing> {
    inspect_decoder(ArchiveDecoder::new(reader)?)
}

fn inspect_decoder<R: Read>(mut decoder: ArchiveDecoder<R>) -> Result<PackageListing> {
    let mut listing = PackageListing::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in decoder.entries()? {
        let entry = entry?;
        listing.entries += 1;

        let guid = entry.name.root().to_string();
        let slot = *index.entry(guid.clone()).or_insert_with(|| {
            listing.assets.push(AssetRecord {
                guid,
                ..AssetRecord::default()
            });
            listing.assets.len() - 1
        });
        record(&mut listing.assets[slot], &entry);
    }
    decoder.finish()?;
    Ok(listing)
}

fn record(asset: &mut AssetRecord, entry: &RawEntry) {
    // Only direct children of the asset folder carry meaning
    if entry.is_directory() || entry.name.components().count() != 2 {
        return;
    }
    match entry.name.file_name() {
        PATH_DESCRIPTOR => {
            let text = String::from_utf8_lossy(&entry.content);
            let first_line = text.lines().next().unwrap_or("").trim_end();
            asset.destination = Some(first_line.to_string());
        }
        ASSET_FILE => {
            asset.has_asset = true;
            asset.asset_size = entry.content.len() as u64;
        }
        ASSET_META_FILE => asset.has_meta = true,
        PREVIEW_FILE => asset.has_preview = true,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::Category;
    use crate::test_util::{TestEntry, package_bytes};
    use std::io::Cursor;

    #[test]
    fn test_inspect_groups_by_folder() {
        let bytes = package_bytes(&[
            TestEntry::Dir("abc123/"),
            TestEntry::File("abc123/pathname", b"Assets/Hat.prefab\n00"),
            TestEntry::File("abc123/asset", b"hat-data"),
            TestEntry::File("abc123/asset.meta", b"guid: abc123"),
            TestEntry::Dir("def456/"),
            TestEntry::File("def456/pathname", b"Assets/Textures"),
            TestEntry::File("def456/asset.meta", b"folderAsset: yes"),
        ]);

        let listing = inspect_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(listing.entries, 7);
        assert_eq!(listing.assets.len(), 2);

        let hat = listing.asset("abc123").unwrap();
        assert_eq!(hat.destination.as_deref(), Some("Assets/Hat.prefab"));
        assert!(hat.is_complete());
        assert_eq!(hat.asset_size, 8);

        let folder = listing.asset("def456").unwrap();
        assert!(!folder.has_asset);
        assert_eq!(listing.incomplete(), 1);
    }

    #[test]
    fn test_relocated_destination_preview() {
        let record = AssetRecord {
            guid: "abc123".into(),
            destination: Some("Assets/Hat.prefab".into()),
            ..AssetRecord::default()
        };
        let patcher = PathPatcher::new(&Category::new("Clothing").unwrap());
        let preview = record.relocated_destination(&patcher).unwrap().unwrap();
        assert_eq!(preview, "Assets/Clothing/Hat.prefab");

        let empty = AssetRecord::default();
        assert!(empty.relocated_destination(&patcher).is_none());
    }

    #[test]
    fn test_inspect_malformed() {
        let err = inspect_reader(Cursor::new(b"not a package".to_vec())).unwrap_err();
        assert!(err.is_format());
    }
}
