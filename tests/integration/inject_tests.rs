//! End-to-end injection over acquisitions written to a temp directory.
//!
//! Tests verify:
//! - Files at positions divisible by the interval carry the full document
//! - All other files carry a stub pointing at the master file
//! - Non-conforming files are skipped and left untouched
//! - Failures are collected, or stop the run with fail-fast
//! - Descriptor state and date travel with the full document
//! - Reruns do not keep growing the files

use std::path::{Path, PathBuf};

use prairie_ome_inject::{InjectError, InjectOptions, Injector, RunSummary};

use super::test_utils::{
    plane_names, read_ome, write_descriptor, write_tiff, ByteOrderType, DescriptorState,
    TestTiff, TiffBuilder,
};

struct Acquisition {
    _dir: tempfile::TempDir,
    descriptor: PathBuf,
    planes: Vec<PathBuf>,
    originals: Vec<TestTiff>,
}

/// Write `count` conforming planes built by `builder` plus their descriptor.
fn acquisition_with(
    count: usize,
    state: DescriptorState,
    builder: impl Fn(usize) -> TiffBuilder,
) -> Acquisition {
    let dir = tempfile::tempdir().unwrap();
    let names = plane_names("ZSeries-001", count);
    let descriptor = write_descriptor(dir.path(), "ZSeries-001", &names, &state);

    let mut planes = Vec::new();
    let mut originals = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let tiff = builder(i).build();
        planes.push(write_tiff(dir.path(), name, &tiff));
        originals.push(tiff);
    }

    Acquisition {
        _dir: dir,
        descriptor,
        planes,
        originals,
    }
}

fn acquisition(count: usize) -> Acquisition {
    acquisition_with(count, DescriptorState::default(), |_| TiffBuilder::new())
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

async fn run(descriptor: &Path, options: InjectOptions) -> RunSummary {
    Injector::new(options).run(descriptor).await.unwrap()
}

// =============================================================================
// Document Placement
// =============================================================================

#[tokio::test]
async fn test_twelve_file_acquisition() {
    let acq = acquisition(12);
    let summary = run(&acq.descriptor, InjectOptions::default()).await;

    assert!(summary.is_success());
    assert_eq!(summary.planes, 12);
    assert_eq!(summary.full_documents, 2);
    assert_eq!(summary.stub_documents, 10);
    assert_eq!(summary.master_file.as_deref(), Some(file_name(&acq.planes[0]).as_str()));

    let master = read_ome(&acq.planes[0]).await;
    assert!(master.is_full());
    assert_eq!(master.tiff_data.len(), 12);
    assert_eq!(master.bin_data_count, 0);
    assert_eq!(master.size_z, Some(12));
    assert_eq!(master.size_x, Some(8));
    assert_eq!(master.pixel_type.as_deref(), Some("uint16"));

    for (z, td) in master.tiff_data.iter().enumerate() {
        assert_eq!((td.first_t, td.first_c, td.first_z), (0, 0, z as u32));
        assert_eq!(td.file_name, file_name(&acq.planes[z]));
        assert!(td.uuid.starts_with("urn:uuid:"));
    }
    let master_uuid = master.tiff_data[0].uuid.clone();
    assert_eq!(master.root_uuid.as_deref(), Some(master_uuid.as_str()));

    let tenth = read_ome(&acq.planes[10]).await;
    assert!(tenth.is_full());
    assert_eq!(tenth.tiff_data, master.tiff_data);
    assert_eq!(
        tenth.root_uuid.as_deref(),
        Some(master.tiff_data[10].uuid.as_str())
    );

    for (i, plane) in acq.planes.iter().enumerate() {
        if i % 10 == 0 {
            continue;
        }
        let stub = read_ome(plane).await;
        assert!(!stub.is_full(), "file {} should carry a stub", i);
        assert_eq!(stub.root_uuid, None);
        assert_eq!(
            stub.binary_only,
            Some((file_name(&acq.planes[0]), master_uuid.clone()))
        );
    }
}

#[tokio::test]
async fn test_pixel_data_unchanged() {
    let acq = acquisition(3);
    run(&acq.descriptor, InjectOptions::default()).await;

    for (plane, original) in acq.planes.iter().zip(&acq.originals) {
        let after = std::fs::read(plane).unwrap();
        assert_eq!(
            &after[original.pixels.clone()],
            &original.data[original.pixels.clone()]
        );
        assert_eq!(&after[..8], &original.data[..8]);
    }
}

#[tokio::test]
async fn test_nonconforming_file_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut names = plane_names("ZSeries-001", 2);
    names.insert(0, "random.tif".to_string());
    let descriptor = write_descriptor(dir.path(), "ZSeries-001", &names, &DescriptorState::default());

    let mut written = Vec::new();
    for name in &names {
        let tiff = TiffBuilder::new().build();
        written.push((write_tiff(dir.path(), name, &tiff), tiff));
    }

    let summary = run(&descriptor, InjectOptions::default()).await;
    assert_eq!(summary.planes, 2);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.master_file.as_deref(), Some(names[1].as_str()));

    let (random_path, random_tiff) = &written[0];
    assert_eq!(&std::fs::read(random_path).unwrap(), &random_tiff.data);

    let master = read_ome(&written[1].0).await;
    assert_eq!(master.tiff_data.len(), 2);
    assert_eq!(master.tiff_data[0].first_z, 0);
    assert_eq!(master.tiff_data[1].first_z, 1);
}

#[tokio::test]
async fn test_no_conforming_files() {
    let dir = tempfile::tempdir().unwrap();
    let names = vec!["random.tif".to_string()];
    let descriptor = write_descriptor(dir.path(), "ZSeries-001", &names, &DescriptorState::default());
    write_tiff(dir.path(), "random.tif", &TiffBuilder::new().build());

    let result = Injector::default().run(&descriptor).await;
    assert!(matches!(result, Err(InjectError::Acquisition(_))));
}

#[tokio::test]
async fn test_uuids_differ_between_runs() {
    let acq = acquisition(2);

    run(&acq.descriptor, InjectOptions::default()).await;
    let first = read_ome(&acq.planes[0]).await;

    run(&acq.descriptor, InjectOptions::default()).await;
    let second = read_ome(&acq.planes[0]).await;

    assert_ne!(first.root_uuid, second.root_uuid);
    assert_ne!(first.tiff_data[1].uuid, second.tiff_data[1].uuid);
    assert_eq!(second.tiff_data.len(), 2);
}

#[tokio::test]
async fn test_reruns_keep_file_size() {
    let acq = acquisition(3);

    let mut sizes = Vec::new();
    for _ in 0..3 {
        let summary = run(
            &acq.descriptor,
            InjectOptions {
                full_metadata_interval: 2,
                verify: true,
                ..Default::default()
            },
        )
        .await;
        assert!(summary.is_success());
        sizes.push(
            acq.planes
                .iter()
                .map(|p| std::fs::metadata(p).unwrap().len())
                .collect::<Vec<_>>(),
        );
    }

    for (plane, original) in acq.planes.iter().zip(&acq.originals) {
        assert!(std::fs::metadata(plane).unwrap().len() > original.data.len() as u64);
    }
    assert_eq!(sizes[1], sizes[0]);
    assert_eq!(sizes[2], sizes[0]);

    assert!(read_ome(&acq.planes[2]).await.is_full());
    assert!(read_ome(&acq.planes[1]).await.binary_only.is_some());
    for (plane, original) in acq.planes.iter().zip(&acq.originals) {
        let after = std::fs::read(plane).unwrap();
        assert_eq!(
            &after[original.pixels.clone()],
            &original.data[original.pixels.clone()]
        );
    }
}

#[tokio::test]
async fn test_custom_interval() {
    let acq = acquisition(7);
    let summary = run(
        &acq.descriptor,
        InjectOptions {
            full_metadata_interval: 3,
            verify: true,
            ..Default::default()
        },
    )
    .await;

    assert_eq!(summary.full_documents, 3);
    assert_eq!(summary.stub_documents, 4);
    for (i, plane) in acq.planes.iter().enumerate() {
        assert_eq!(read_ome(plane).await.is_full(), i % 3 == 0, "file {}", i);
    }
}

#[tokio::test]
async fn test_interval_of_one_writes_full_everywhere() {
    let acq = acquisition(3);
    let summary = run(
        &acq.descriptor,
        InjectOptions {
            full_metadata_interval: 1,
            ..Default::default()
        },
    )
    .await;

    assert_eq!(summary.full_documents, 3);
    for (i, plane) in acq.planes.iter().enumerate() {
        let doc = read_ome(plane).await;
        assert_eq!(doc.root_uuid.as_deref(), Some(doc.tiff_data[i].uuid.as_str()));
    }
}

// =============================================================================
// Byte Order and Geometry
// =============================================================================

#[tokio::test]
async fn test_mixed_byte_orders_and_bigtiff() {
    let acq = acquisition_with(4, DescriptorState::default(), |i| {
        TiffBuilder::new()
            .with_byte_order(if i % 2 == 0 {
                ByteOrderType::LittleEndian
            } else {
                ByteOrderType::BigEndian
            })
            .with_bigtiff(i >= 2)
    });

    let summary = run(
        &acq.descriptor,
        InjectOptions {
            full_metadata_interval: 2,
            verify: true,
            ..Default::default()
        },
    )
    .await;

    assert!(summary.is_success());
    assert!(read_ome(&acq.planes[2]).await.is_full());
    assert!(read_ome(&acq.planes[3]).await.binary_only.is_some());
}

#[tokio::test]
async fn test_geometry_probed_from_master() {
    let state = DescriptorState {
        pixels_per_line: None,
        lines_per_frame: None,
        bit_depth: None,
    };
    let acq = acquisition_with(2, state, |_| {
        TiffBuilder::new().with_size(6, 2).with_samples_per_pixel(3)
    });

    run(&acq.descriptor, InjectOptions::default()).await;

    let master = read_ome(&acq.planes[0]).await;
    assert_eq!(master.size_x, Some(6));
    assert_eq!(master.pixel_type.as_deref(), Some("uint16"));
    assert_eq!(master.samples_per_pixel, Some(3));
}

// =============================================================================
// Original Metadata
// =============================================================================

#[tokio::test]
async fn test_descriptor_state_in_full_documents() {
    let acq = acquisition(11);
    run(&acq.descriptor, InjectOptions::default()).await;

    for plane in [&acq.planes[0], &acq.planes[10]] {
        let doc = read_ome(plane).await;
        assert_eq!(doc.acquisition_date.as_deref(), Some("2018-08-14T15:20:47"));
        assert_eq!(doc.samples_per_pixel, Some(1));
        assert_eq!(doc.original_metadata.len(), 5);
        assert_eq!(doc.metadata("pixelsPerLine"), Some("8"));
        assert_eq!(doc.metadata("bitDepth"), Some("13"));
        assert_eq!(doc.metadata("micronsPerPixel_XAxis"), Some("0.75"));

        let ids: Vec<String> = doc
            .original_metadata
            .iter()
            .map(|(id, _, _)| id.clone())
            .collect();
        assert_eq!(doc.annotation_refs, ids);
    }

    let stub = read_ome(&acq.planes[1]).await;
    assert!(stub.original_metadata.is_empty());
    assert_eq!(stub.acquisition_date, None);
}

// =============================================================================
// Failure Handling
// =============================================================================

#[tokio::test]
async fn test_missing_tag_recorded_and_run_continues() {
    let acq = acquisition_with(3, DescriptorState::default(), |i| {
        TiffBuilder::new().with_description(if i == 1 { None } else { Some("plane") })
    });

    let summary = run(&acq.descriptor, InjectOptions::default()).await;

    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].path, acq.planes[1]);
    assert!(summary.failures[0].error.contains("ImageDescription"));
    assert_eq!(summary.full_documents, 1);
    assert_eq!(summary.stub_documents, 1);
    assert!(matches!(
        summary.check(),
        Err(InjectError::Incomplete { failed: 1, total: 3 })
    ));

    assert_eq!(std::fs::read(&acq.planes[1]).unwrap(), acq.originals[1].data);
    assert!(read_ome(&acq.planes[2]).await.binary_only.is_some());
}

#[tokio::test]
async fn test_fail_fast_stops_at_first_failure() {
    let acq = acquisition_with(3, DescriptorState::default(), |i| {
        TiffBuilder::new().with_description(if i == 1 { None } else { Some("plane") })
    });

    let result = Injector::new(InjectOptions {
        fail_fast: true,
        ..Default::default()
    })
    .run(&acq.descriptor)
    .await;

    match result {
        Err(InjectError::Write { path, .. }) => assert_eq!(path, acq.planes[1]),
        other => panic!("expected write failure, got {:?}", other),
    }

    assert!(read_ome(&acq.planes[0]).await.is_full());
    assert_eq!(std::fs::read(&acq.planes[2]).unwrap(), acq.originals[2].data);
}

#[tokio::test]
async fn test_missing_plane_file() {
    let acq = acquisition(2);
    std::fs::remove_file(&acq.planes[1]).unwrap();

    let summary = run(&acq.descriptor, InjectOptions::default()).await;
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.full_documents, 1);
}
