//! TIFF structure access for comment rewriting.
//!
//! # Key Concepts
//!
//! - **Byte order**: TIFF files declare their endianness (II = little-endian, MM = big-endian)
//!   in the header. All multi-byte values are read and written in that order.
//!
//! - **Classic TIFF vs BigTIFF**: Classic TIFF uses 32-bit offsets and 12-byte entries,
//!   BigTIFF 64-bit offsets and 20-byte entries. Both are handled.
//!
//! - **IFD 0**: Prairie writes one plane per file, so the first Image File Directory
//!   is the only one that matters. Its ImageDescription (tag 270) carries the OME-XML.
//!
//! - **Inline vs offset values**: Values up to 4 bytes (8 in BigTIFF) live inside the
//!   entry; longer ones are stored elsewhere in the file and the entry holds their offset.

mod comment;
mod geometry;
mod parser;
mod tags;
mod values;

pub use comment::{overwrite_comment, read_comment, CommentRewrite};
pub use geometry::{probe_geometry, ImageGeometry};
pub use parser::{ByteOrder, Ifd, IfdEntry, TiffHeader, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE};
pub use tags::{FieldType, TiffTag};
pub use values::ValueReader;
