//! # prairie-ome-inject
//!
//! Injects OME-XML metadata into the TIFF planes of a Prairie Technologies
//! acquisition, so that OME-aware readers see the whole multi-file dataset
//! from any one of its files.
//!
//! ## Architecture
//!
//! - [`acquisition`] - PVScan descriptor reading, filename parsing, plane index
//! - [`ome`] - full OME document and BinaryOnly stub
//! - [`mod@format`] - TIFF structure parsing and the in-place comment rewrite
//! - [`io`] - positional read/write traits over local files
//! - [`inject`] - the two-pass run and its summary
//! - [`config`] - CLI configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use prairie_ome_inject::{InjectOptions, Injector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), prairie_ome_inject::InjectError> {
//!     let injector = Injector::new(InjectOptions::default());
//!     let summary = injector.run(Path::new("TSeries-001/TSeries-001.xml")).await?;
//!     summary.check()
//! }
//! ```

pub mod acquisition;
pub mod config;
pub mod error;
pub mod format;
pub mod inject;
pub mod io;
pub mod ome;

// Re-export commonly used types
pub use acquisition::{
    is_tiff, parse_filename, FileIndices, MasterReference, PhysicalSize, PlaneEntry, PlaneIndex,
    PrairieDataset, SkipReason, SkippedFile,
};
pub use config::{Config, SummaryFormat};
pub use error::{
    AcquisitionError, InjectError, IoError, MetadataError, TiffError, WriteFailure,
};
pub use format::tiff::{
    overwrite_comment, probe_geometry, read_comment, ByteOrder, CommentRewrite, FieldType, Ifd,
    IfdEntry, ImageGeometry, TiffHeader, TiffTag, ValueReader, BIGTIFF_HEADER_SIZE,
    TIFF_HEADER_SIZE,
};
pub use inject::{
    FailedFile, InjectOptions, Injector, Payload, RunSummary, DEFAULT_FULL_METADATA_INTERVAL,
};
pub use io::{LocalFile, RangeReader, RangeWriter};
pub use ome::{BinaryOnlyDocument, FullDocument, PixelGeometry, PixelType};
