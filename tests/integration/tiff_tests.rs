//! TIFF-level integration tests against files on disk.
//!
//! Tests verify:
//! - The comment tag is rewritten for both byte orders and for BigTIFF
//! - Pixel data and other tags survive the rewrite
//! - Geometry is probed from IFD 0
//! - Reruns reuse the committed value's slot at the end of the file

use prairie_ome_inject::{
    overwrite_comment, probe_geometry, read_comment, LocalFile, RangeReader, TiffError,
};

use super::test_utils::{write_tiff, ByteOrderType, TiffBuilder};

const OME: &str = "<?xml version=\"1.0\"?><OME><Image ID=\"Image:0\"/></OME>";

async fn rewrite_and_check(builder: TiffBuilder) {
    let dir = tempfile::tempdir().unwrap();
    let tiff = builder.build();
    let path = write_tiff(dir.path(), "plane.tif", &tiff);

    {
        let file = LocalFile::open_rw(&path).await.unwrap();
        let rewrite = overwrite_comment(&file, OME).await.unwrap();
        assert_eq!(rewrite.byte_count, OME.len() as u64 + 1);
        let offset = rewrite.value_offset.unwrap();
        assert_eq!(offset % 2, 0);
        assert!(offset >= tiff.data.len() as u64);
    }

    let after = std::fs::read(&path).unwrap();
    assert_eq!(
        &after[tiff.pixels.clone()],
        &tiff.data[tiff.pixels.clone()],
        "pixel bytes must be unchanged"
    );

    let file = LocalFile::open(&path).await.unwrap();
    assert_eq!(read_comment(&file).await.unwrap().as_deref(), Some(OME));

    let geometry = probe_geometry(&file).await.unwrap();
    assert_eq!((geometry.width, geometry.height), (8, 4));
    assert_eq!(geometry.bits_per_sample, 16);
}

// =============================================================================
// Byte Order and BigTIFF
// =============================================================================

#[tokio::test]
async fn test_rewrite_little_endian() {
    rewrite_and_check(TiffBuilder::new()).await;
}

#[tokio::test]
async fn test_rewrite_big_endian() {
    rewrite_and_check(TiffBuilder::new().with_byte_order(ByteOrderType::BigEndian)).await;
}

#[tokio::test]
async fn test_rewrite_bigtiff_little_endian() {
    rewrite_and_check(TiffBuilder::new().with_bigtiff(true)).await;
}

#[tokio::test]
async fn test_rewrite_bigtiff_big_endian() {
    rewrite_and_check(
        TiffBuilder::new()
            .with_bigtiff(true)
            .with_byte_order(ByteOrderType::BigEndian),
    )
    .await;
}

// =============================================================================
// Edge Cases
// =============================================================================

#[tokio::test]
async fn test_inline_description_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let tiff = TiffBuilder::new().with_description(Some("ab")).build();
    let path = write_tiff(dir.path(), "inline.tif", &tiff);

    let file = LocalFile::open_rw(&path).await.unwrap();
    assert_eq!(read_comment(&file).await.unwrap().as_deref(), Some("ab"));

    overwrite_comment(&file, OME).await.unwrap();
    assert_eq!(read_comment(&file).await.unwrap().as_deref(), Some(OME));
    assert!(file.size() > tiff.data.len() as u64);
}

#[tokio::test]
async fn test_missing_description_is_not_inserted() {
    let dir = tempfile::tempdir().unwrap();
    let tiff = TiffBuilder::new().with_description(None).build();
    let path = write_tiff(dir.path(), "bare.tif", &tiff);

    let file = LocalFile::open_rw(&path).await.unwrap();
    let result = overwrite_comment(&file, OME).await;
    assert!(matches!(result, Err(TiffError::MissingTag(_))));
    drop(file);

    assert_eq!(std::fs::read(&path).unwrap(), tiff.data);
}

#[tokio::test]
async fn test_not_a_tiff() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.tif");
    std::fs::write(&path, b"plain text, not a TIFF").unwrap();

    let file = LocalFile::open_rw(&path).await.unwrap();
    let result = overwrite_comment(&file, OME).await;
    assert!(matches!(result, Err(TiffError::InvalidMagic(_))));
}

#[tokio::test]
async fn test_repeated_rewrites() {
    let dir = tempfile::tempdir().unwrap();
    let tiff = TiffBuilder::new().build();
    let path = write_tiff(dir.path(), "plane.tif", &tiff);

    let mut sizes = Vec::new();
    for i in 0..3 {
        let file = LocalFile::open_rw(&path).await.unwrap();
        let comment = format!("<OME run=\"{}\"/>", i);
        let rewrite = overwrite_comment(&file, &comment).await.unwrap();
        assert_eq!(rewrite.reused_slot, i > 0);
        assert_eq!(read_comment(&file).await.unwrap(), Some(comment));
        sizes.push(file.size());
    }

    // Same-length documents take over the previous slot
    assert_eq!(sizes[1], sizes[0]);
    assert_eq!(sizes[2], sizes[0]);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), sizes[0]);

    let after = std::fs::read(&path).unwrap();
    assert_eq!(&after[tiff.pixels.clone()], &tiff.data[tiff.pixels]);
}

#[tokio::test]
async fn test_rewrite_bigtiff_reuses_slot() {
    let dir = tempfile::tempdir().unwrap();
    let tiff = TiffBuilder::new()
        .with_bigtiff(true)
        .with_byte_order(ByteOrderType::BigEndian)
        .build();
    let path = write_tiff(dir.path(), "big.tif", &tiff);

    let file = LocalFile::open_rw(&path).await.unwrap();
    let first = overwrite_comment(&file, OME).await.unwrap();
    let size = file.size();
    let second = overwrite_comment(&file, OME).await.unwrap();

    assert!(second.reused_slot);
    assert_eq!(second.value_offset, first.value_offset);
    assert_eq!(file.size(), size);
    assert_eq!(read_comment(&file).await.unwrap().as_deref(), Some(OME));
}
