//! End-to-end relocation tests.
//!
//! These tests run the full pipeline against packages built in memory and
//! check the rebuilt archive, the progress stream and the cleanup guarantees.

mod common;

use std::fs;

use assetshift::{
    Error, ErrorKind, InsertionPoint, OutputCompression, Phase, RecordingProgress,
    RelocateRequest, progress_fn,
};
use common::{Item, Scratch, avatar_package, package_bytes, read_output};

fn request(scratch: &Scratch, category: &str) -> RelocateRequest {
    RelocateRequest::new(&scratch.source, category, "Author", "Avatar")
}

// =============================================================================
// Successful Relocation
// =============================================================================

#[test]
fn test_avatar_scenario() {
    let scratch = Scratch::new(&avatar_package());
    let relocator = scratch.relocator();
    let mut progress = RecordingProgress::new();

    let relocation = relocator.relocate(&request(&scratch, "Clothing"), &mut progress);
    assert!(relocation.is_relocated(), "fell back: {:?}", relocation.error);
    assert_eq!(relocation.phase, Phase::Done);
    assert_ne!(relocation.path, scratch.source);

    let entries = read_output(&relocation.path);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].name, "abc123/");
    assert!(entries[0].is_dir);
    assert_eq!(entries[1].name, "abc123/pathname");
    assert_eq!(entries[1].content, b"Assets/Clothing/MyAvatar.prefab");
    assert_eq!(entries[2].name, "abc123/asset");
    assert_eq!(entries[2].content, vec![0x00, 0xFF, 0x10, 0x80, 0x7F]);

    assert!(scratch.staging_is_clean());
}

#[test]
fn test_entry_count_and_order_preserved() {
    let scratch = Scratch::new(&package_bytes(&[
        Item::Dir("aaa/"),
        Item::File("aaa/pathname", b"Assets/Models/chair.fbx"),
        Item::File("aaa/asset", b"chair"),
        Item::File("aaa/asset.meta", b"fileFormatVersion: 2"),
        Item::Dir("bbb/"),
        Item::File("bbb/pathname", b"Assets/Textures"),
        Item::File("bbb/asset.meta", b"folderAsset: yes"),
        Item::File("ccc/pathname", b"Assets/Materials/wood.mat"),
        Item::File("ccc/asset", b"wood"),
    ]));

    let output = scratch
        .relocator()
        .try_relocate(&request(&scratch, "Furniture"), &mut RecordingProgress::new())
        .expect("relocation succeeds");

    let entries = read_output(&output);
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "aaa/",
            "aaa/pathname",
            "aaa/asset",
            "aaa/asset.meta",
            "bbb/",
            "bbb/pathname",
            "bbb/asset.meta",
            "ccc/pathname",
            "ccc/asset",
        ]
    );

    let descriptors: Vec<&[u8]> = entries
        .iter()
        .filter(|e| e.name.ends_with("/pathname"))
        .map(|e| e.content.as_slice())
        .collect();
    assert_eq!(
        descriptors,
        vec![
            &b"Assets/Furniture/Models/chair.fbx"[..],
            &b"Assets/Furniture/Textures"[..],
            &b"Assets/Furniture/Materials/wood.mat"[..],
        ]
    );
}

#[test]
fn test_non_descriptor_entries_byte_identical() {
    let payload: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
    let scratch = Scratch::new(&package_bytes(&[
        Item::File("g/pathname", b"Assets/big.bin"),
        Item::File("g/asset", &payload),
        Item::File("g/asset.meta", b"pathname\nAssets/not-a-descriptor"),
        Item::File("g/preview.png", &[0x89, b'P', b'N', b'G']),
    ]));

    let output = scratch
        .relocator()
        .try_relocate(&request(&scratch, "Props"), &mut RecordingProgress::new())
        .expect("relocation succeeds");

    let entries = read_output(&output);
    assert_eq!(entries[1].content, payload);
    assert_eq!(entries[2].content, b"pathname\nAssets/not-a-descriptor");
    assert_eq!(entries[3].content, vec![0x89, b'P', b'N', b'G']);
}

#[test]
fn test_source_never_mutated() {
    let bytes = avatar_package();
    let scratch = Scratch::new(&bytes);

    scratch
        .relocator()
        .try_relocate(&request(&scratch, "Clothing"), &mut RecordingProgress::new())
        .expect("relocation succeeds");

    assert_eq!(fs::read(&scratch.source).unwrap(), bytes);
}

#[test]
fn test_free_function_with_default_options() {
    let scratch = Scratch::new(&avatar_package());
    // Unique title so parallel test runs don't share the default work dir
    let title = format!("free-fn-{}", std::process::id());

    let relocation = assetshift::relocate(
        &scratch.source,
        "Clothing",
        "Author",
        &title,
        &mut RecordingProgress::new(),
    );
    assert!(relocation.is_relocated());
    assert!(relocation.path.starts_with(std::env::temp_dir()));
    fs::remove_file(&relocation.path).unwrap();
}

#[test]
fn test_gzip_output_and_custom_output_dir() {
    let scratch = Scratch::new(&avatar_package());
    let out_dir = scratch.temp.path().join("packages");
    let relocator = assetshift::Relocator::new(
        scratch
            .options()
            .output_dir(&out_dir)
            .output_compression(OutputCompression::Gzip),
    );

    let output = relocator
        .try_relocate(&request(&scratch, "Clothing"), &mut RecordingProgress::new())
        .expect("relocation succeeds");
    assert_eq!(output, out_dir.join("Author_Avatar.unitypackage"));
    assert!(fs::read(&output).unwrap().starts_with(&[0x1f, 0x8b]));
    assert_eq!(read_output(&output)[1].content, b"Assets/Clothing/MyAvatar.prefab");
}

#[test]
fn test_after_first_separator_insertion() {
    let scratch = Scratch::new(&package_bytes(&[Item::File(
        "pkg/pathname",
        b"Packages/com.vendor.tool/Runtime/a.cs",
    )]));
    let relocator = assetshift::Relocator::new(
        scratch
            .options()
            .insertion(InsertionPoint::AfterFirstSeparator),
    );

    let output = relocator
        .try_relocate(&request(&scratch, "Tools"), &mut RecordingProgress::new())
        .expect("relocation succeeds");
    assert_eq!(
        read_output(&output)[0].content,
        b"Packages/Tools/com.vendor.tool/Runtime/a.cs"
    );
}

#[test]
fn test_empty_package() {
    let scratch = Scratch::new(&package_bytes(&[]));
    let mut progress = RecordingProgress::new();

    let relocation = scratch
        .relocator()
        .relocate(&request(&scratch, "Clothing"), &mut progress);
    assert!(relocation.is_relocated());
    assert_eq!(relocation.entries, 0);
    assert!(read_output(&relocation.path).is_empty());
    assert_eq!(progress.percents(), vec![0, 10, 90, 100]);
}

// =============================================================================
// Progress Reporting
// =============================================================================

#[test]
fn test_progress_monotonic_and_complete() {
    let items: Vec<(String, String)> = (0..7)
        .map(|i| (format!("guid{i}/pathname"), format!("Assets/item{i}.asset")))
        .collect();
    let entries: Vec<Item<'_>> = items
        .iter()
        .map(|(name, content)| Item::File(name, content.as_bytes()))
        .collect();
    let scratch = Scratch::new(&package_bytes(&entries));

    let mut seen = Vec::new();
    let relocation = {
        let mut progress = progress_fn(|percent, label: &str| seen.push((percent, label.to_string())));
        scratch
            .relocator()
            .relocate(&request(&scratch, "Clothing"), &mut progress)
    };
    assert!(relocation.is_relocated());

    let percents: Vec<u8> = seen.iter().map(|(p, _)| *p).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    assert_eq!(percents.first(), Some(&0));
    assert_eq!(percents.last(), Some(&100));
    assert_eq!(percents.iter().filter(|&&p| p == 100).count(), 1);

    let labels: Vec<&str> = seen.iter().map(|(_, l)| l.as_str()).collect();
    assert_eq!(labels[0], "Staging");
    assert_eq!(labels[1], "Counting entries");
    assert!(labels.contains(&"Extracting"));
    assert_eq!(labels[labels.len() - 2], "Building");
    assert_eq!(labels[labels.len() - 1], "Finalizing");
}

#[test]
fn test_entries_announced_in_order() {
    let scratch = Scratch::new(&avatar_package());
    let mut progress = RecordingProgress::new();

    scratch
        .relocator()
        .relocate(&request(&scratch, "Clothing"), &mut progress);
    assert_eq!(
        progress.entries(),
        ["abc123/", "abc123/pathname", "abc123/asset"]
    );
}

// =============================================================================
// Fallback
// =============================================================================

#[test]
fn test_short_descriptor_falls_back() {
    let bytes = package_bytes(&[
        Item::Dir("abc123/"),
        Item::File("abc123/pathname", b"Ab"),
        Item::File("abc123/asset", b"data"),
    ]);
    let scratch = Scratch::new(&bytes);
    let mut progress = RecordingProgress::new();

    let relocation = scratch
        .relocator()
        .relocate(&request(&scratch, "Clothing"), &mut progress);

    assert!(relocation.is_fallback());
    assert_eq!(relocation.path, scratch.source);
    let error = relocation.error.as_ref().expect("error recorded");
    assert_eq!(error.kind(), ErrorKind::Format);
    assert_eq!(error.entry_name(), Some("abc123/pathname"));

    let diagnostic = relocation.diagnostic.as_ref().expect("diagnostic recorded");
    assert_eq!(diagnostic.phase, Phase::Extracting);
    assert_eq!(diagnostic.source, scratch.source);

    assert!(scratch.staging_is_clean());
    assert!(scratch.no_outputs());
    assert!(!progress.percents().contains(&100));
    assert_eq!(fs::read(&scratch.source).unwrap(), bytes);
}

#[test]
fn test_invalid_category_falls_back() {
    for label in ["", "Hats/Caps", "Hats\\Caps", ".."] {
        let scratch = Scratch::new(&avatar_package());
        let relocation = scratch
            .relocator()
            .relocate(&request(&scratch, label), &mut RecordingProgress::new());
        assert!(relocation.is_fallback(), "label {label:?} accepted");
        assert!(matches!(relocation.error, Some(Error::InvalidCategory { .. })));
        assert!(scratch.staging_is_clean());
    }
}

#[test]
fn test_cancellation_between_entries() {
    let scratch = Scratch::new(&avatar_package());
    // Staging, counting, then stop after the first extracted entry
    let mut progress = RecordingProgress::new().cancel_after(3);

    let relocation = scratch
        .relocator()
        .relocate(&request(&scratch, "Clothing"), &mut progress);

    assert!(matches!(relocation.error, Some(Error::Cancelled)));
    assert_eq!(relocation.path, scratch.source);
    assert_eq!(relocation.diagnostic.unwrap().phase, Phase::Extracting);
    assert!(scratch.staging_is_clean());
    assert!(scratch.no_outputs());
}

#[test]
fn test_cancellation_before_start() {
    let scratch = Scratch::new(&avatar_package());
    let mut progress = RecordingProgress::new().cancel_after(0);

    let relocation = scratch
        .relocator()
        .relocate(&request(&scratch, "Clothing"), &mut progress);

    assert!(matches!(relocation.error, Some(Error::Cancelled)));
    assert!(progress.updates().is_empty());
}

#[test]
fn test_stale_staging_directory_is_replaced() {
    let scratch = Scratch::new(&avatar_package());
    let stale = scratch.options().staging_dir("Author_Avatar");
    fs::create_dir_all(stale.join("old-guid")).unwrap();
    fs::write(stale.join("old-guid/asset"), b"leftover").unwrap();

    let output = scratch
        .relocator()
        .try_relocate(&request(&scratch, "Clothing"), &mut RecordingProgress::new())
        .expect("relocation succeeds");

    let entries = read_output(&output);
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| !e.name.starts_with("old-guid")));
    assert!(!stale.exists());
}

#[test]
fn test_unique_staging_output_names() {
    let scratch = Scratch::new(&avatar_package());
    let relocator = assetshift::Relocator::new(scratch.options().unique_staging(true));

    let first = relocator
        .try_relocate(&request(&scratch, "Clothing"), &mut RecordingProgress::new())
        .unwrap();
    let second = relocator
        .try_relocate(&request(&scratch, "Clothing"), &mut RecordingProgress::new())
        .unwrap();

    assert_ne!(first, second);
    assert!(first.exists() && second.exists());
    assert!(scratch.staging_is_clean());
}

#[test]
fn test_after_first_separator_without_separator_falls_back() {
    let scratch = Scratch::new(&package_bytes(&[Item::File("pkg/pathname", b"NoSeparatorHere")]));
    let relocator = assetshift::Relocator::new(
        scratch
            .options()
            .insertion(InsertionPoint::AfterFirstSeparator),
    );

    let relocation = relocator.relocate(&request(&scratch, "Tools"), &mut RecordingProgress::new());
    assert!(matches!(relocation.error, Some(Error::MissingSeparator { .. })));
    assert_eq!(relocation.path, scratch.source);
    assert!(scratch.staging_is_clean());
}
