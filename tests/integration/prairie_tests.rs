//! Descriptor reading against files on disk.

use prairie_ome_inject::{AcquisitionError, IoError, PlaneIndex, PrairieDataset};

use super::test_utils::{plane_names, write_descriptor, DescriptorState};

#[tokio::test]
async fn test_used_files_order() {
    let dir = tempfile::tempdir().unwrap();
    let names = plane_names("ZSeries-001", 3);
    let descriptor = write_descriptor(dir.path(), "ZSeries-001", &names, &DescriptorState::default());
    std::fs::write(dir.path().join("ZSeries-001.env"), "<Environment/>").unwrap();
    std::fs::write(dir.path().join("ZSeries-001.cfg"), "<Config/>").unwrap();

    let dataset = PrairieDataset::open(&descriptor).await.unwrap();
    let used = dataset.used_files();

    assert_eq!(used.len(), 6);
    assert_eq!(used[0], descriptor);
    assert_eq!(used[1], dir.path().join("ZSeries-001.cfg"));
    assert_eq!(used[2], dir.path().join("ZSeries-001.env"));
    assert_eq!(used[3], dir.path().join(&names[0]));
    assert_eq!(used[5], dir.path().join(&names[2]));

    assert_eq!(dataset.pixels_per_line(), Some(8));
    assert_eq!(dataset.microns_per_pixel().x, Some(0.75));
    assert_eq!(dataset.channel_name(1), Some("Ch1"));
}

#[tokio::test]
async fn test_index_from_descriptor_listing() {
    let dir = tempfile::tempdir().unwrap();
    let mut names = plane_names("ZSeries-001", 2);
    names.insert(1, "random.tif".to_string());
    let descriptor = write_descriptor(dir.path(), "ZSeries-001", &names, &DescriptorState::default());

    let dataset = PrairieDataset::open(&descriptor).await.unwrap();
    let index = PlaneIndex::build(&dataset.used_files());

    assert_eq!(index.len(), 2);
    assert_eq!(index.skipped().len(), 1);
    assert_eq!(index.skipped()[0].path, dir.path().join("random.tif"));
    assert_eq!(index.entries()[1].z, 1);
    assert_eq!(index.master().unwrap().file_name, names[0]);
}

#[tokio::test]
async fn test_missing_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let result = PrairieDataset::open(dir.path().join("absent.xml")).await;

    assert!(matches!(
        result,
        Err(AcquisitionError::Io(IoError::NotFound(_)))
    ));
}

#[tokio::test]
async fn test_descriptor_with_wrong_root() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("other.xml");
    std::fs::write(&path, "<OME/>").unwrap();

    let result = PrairieDataset::open(&path).await;
    assert!(matches!(
        result,
        Err(AcquisitionError::InvalidDescriptor { .. })
    ));
}
