//! Fuzz target for the package decoder with arbitrary byte input.
//!
//! Exercises the gzip and tar framing plus entry name validation with
//! malformed or adversarial input, looking for panics and hangs.
//!
//! Run with: cargo +nightly fuzz run decode

#![no_main]

use std::io::Cursor;

use assetshift::{ArchiveDecoder, PathPatcher};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let counted = ArchiveDecoder::new(Cursor::new(data)).and_then(|d| d.count_entries());

    let Ok(mut decoder) = ArchiveDecoder::new(Cursor::new(data)) else {
        return;
    };
    let Ok(entries) = decoder.entries() else {
        return;
    };
    let Ok(category) = assetshift::Category::new("Fuzz") else {
        return;
    };
    let patcher = PathPatcher::new(&category);

    let mut processed = 0;
    let mut failed = false;
    for entry in entries {
        match entry {
            Ok(mut entry) => {
                let name = entry.name.as_str();
                assert!(!name.starts_with('/'), "absolute name accepted: {:?}", name);
                assert!(
                    !name.split('/').any(|s| s == ".."),
                    "traversal accepted: {:?}",
                    name
                );
                let _ = patcher.apply(&mut entry);
                processed += 1;
            }
            Err(_) => {
                failed = true;
                break;
            }
        }
    }

    // Both passes must agree on clean input
    if !failed && decoder.finish().is_ok() {
        if let Ok(count) = counted {
            assert_eq!(count, processed);
        }
    }
});
