//! OME-XML documents written into plane files.
//!
//! - [`document`] models the full multi-file document and the BinaryOnly stub
//! - [`xml`] is the small writer both serialize through

pub mod document;
pub mod xml;

pub use document::{
    BinData, BinaryOnlyDocument, Channel, FullDocument, PixelGeometry, PixelType, TiffData,
    CREATOR, DIMENSION_ORDER, OME_NAMESPACE, OME_SCHEMA_LOCATION, ORIGINAL_METADATA_NAMESPACE,
    XSI_NAMESPACE,
};
pub use xml::escape;
