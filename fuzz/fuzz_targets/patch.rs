//! Fuzz target for path descriptor patching and entry name validation.
//!
//! Run with: cargo +nightly fuzz run patch
//!
//! Properties checked:
//! - Patched descriptors are valid UTF-8 and grow by exactly the segment
//! - Accepted entry names are relative and free of traversal segments

#![no_main]

use assetshift::{Category, EntryPath, InsertionPoint, PathPatcher};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(category) = Category::new("Cat") else {
        return;
    };

    for insertion in [InsertionPoint::default(), InsertionPoint::AfterFirstSeparator] {
        let patcher = PathPatcher::with_insertion(&category, insertion);
        if let Ok(patched) = patcher.patch_content("fuzz/pathname", data) {
            assert_eq!(patched.len(), data.len() + "Cat/".len());
            assert!(std::str::from_utf8(&patched).is_ok());
        }
    }

    if let Ok(path) = EntryPath::from_bytes(data) {
        let name = path.as_str();
        assert!(!name.is_empty());
        assert!(!name.starts_with('/') && !name.starts_with('\\'));
        assert!(!name.contains('\0'));
        assert!(!name.split(['/', '\\']).any(|s| s == ".."));
    }
});
