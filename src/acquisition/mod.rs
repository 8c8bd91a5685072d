//! Prairie acquisition listing and plane indexing.
//!
//! - [`prairie`] reads the PVScan descriptor and lists the dataset's files
//! - [`filename`] decodes cycle/channel/position from plane filenames
//! - [`index`] assigns each conforming TIFF its plane coordinates and UUID

pub mod filename;
pub mod index;
pub mod prairie;

pub use filename::{is_tiff, parse_filename, FileIndices};
pub use index::{MasterReference, PlaneEntry, PlaneIndex, SkipReason, SkippedFile};
pub use prairie::{PhysicalSize, PrairieDataset};
