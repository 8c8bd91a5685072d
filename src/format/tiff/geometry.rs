//! Frame geometry probe.
//!
//! Used when the acquisition descriptor does not state the frame size: the
//! master TIFF's IFD 0 is authoritative for every plane of the acquisition.

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{Ifd, TiffHeader};
use super::tags::TiffTag;
use super::values::ValueReader;

/// Dimensions and sample layout of a single-plane TIFF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageGeometry {
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: u32,
    pub samples_per_pixel: u32,
}

/// Read the geometry of IFD 0.
///
/// BitsPerSample and SamplesPerPixel default to 1 when absent, as TIFF 6.0
/// specifies.
pub async fn probe_geometry<R: RangeReader>(reader: &R) -> Result<ImageGeometry, TiffError> {
    let header = TiffHeader::read(reader).await?;
    let ifd = Ifd::read(reader, &header, header.first_ifd_offset).await?;
    let byte_order = header.byte_order;

    let width = ifd
        .image_width(byte_order)
        .ok_or(TiffError::MissingTag(TiffTag::ImageWidth.name()))?;
    let height = ifd
        .image_height(byte_order)
        .ok_or(TiffError::MissingTag(TiffTag::ImageLength.name()))?;

    let values = ValueReader::new(reader, &header);

    let bits_per_sample = match ifd.get_entry_by_tag(TiffTag::BitsPerSample) {
        Some(entry) => values.read_first_u32(entry).await?,
        None => 1,
    };
    let samples_per_pixel = match ifd.get_entry_by_tag(TiffTag::SamplesPerPixel) {
        Some(entry) => values.read_first_u32(entry).await?,
        None => 1,
    };

    Ok(ImageGeometry {
        width,
        height,
        bits_per_sample,
        samples_per_pixel,
    })
}
