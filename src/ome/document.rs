//! Full and BinaryOnly OME documents.
//!
//! # Full document
//!
//! ```text
//! <OME UUID=<this file's uuid>>
//!   <Image ID="Image:0">
//!     <AcquisitionDate>           when the descriptor is dated
//!     <Pixels SizeX.. SizeZ SizeC SizeT DimensionOrder="XYCZT">
//!       <Channel .../>             one per C
//!       <TiffData FirstC FirstT FirstZ IFD="0" PlaneCount="1">
//!         <UUID FileName=<base name>>urn:uuid:...</UUID>
//!       </TiffData>               one per indexed file, tiff_data_index order
//!     </Pixels>
//!     <AnnotationRef ID="Annotation:N"/>
//!   </Image>
//!   <StructuredAnnotations>
//!     <XMLAnnotation ID="Annotation:N" Namespace="openmicroscopy.org/OriginalMetadata">
//!       <Value><OriginalMetadata><Key/><Value/></OriginalMetadata></Value>
//!     </XMLAnnotation>            one per descriptor state entry
//! ```
//!
//! # BinaryOnly stub
//!
//! ```text
//! <OME>
//!   <BinaryOnly MetadataFile=<master base name> UUID=<master uuid>/>
//! ```
//!
//! The full document is a template shared by every file it is written to;
//! only the root UUID differs per file, and it is passed to [`FullDocument::to_xml`]
//! rather than stored.

use crate::acquisition::{MasterReference, PhysicalSize, PlaneIndex};
use crate::error::MetadataError;

use super::xml::XmlWriter;

pub const OME_NAMESPACE: &str = "http://www.openmicroscopy.org/Schemas/OME/2016-06";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const OME_SCHEMA_LOCATION: &str = "http://www.openmicroscopy.org/Schemas/OME/2016-06 \
     http://www.openmicroscopy.org/Schemas/OME/2016-06/ome.xsd";

/// Value of the `Creator` attribute.
pub const CREATOR: &str = concat!("prairie-ome-inject ", env!("CARGO_PKG_VERSION"));

/// Planar dimension order Prairie planes are described in.
pub const DIMENSION_ORDER: &str = "XYCZT";

/// Namespace of the XMLAnnotations carrying descriptor key/value pairs.
pub const ORIGINAL_METADATA_NAMESPACE: &str = "openmicroscopy.org/OriginalMetadata";

// =============================================================================
// Pixel description
// =============================================================================

/// OME pixel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    Uint8,
    Uint16,
    Uint32,
}

impl PixelType {
    /// Smallest unsigned type that holds `bits` bits per sample.
    pub fn from_bit_depth(bits: u32) -> Self {
        match bits {
            0..=8 => PixelType::Uint8,
            9..=16 => PixelType::Uint16,
            _ => PixelType::Uint32,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PixelType::Uint8 => "uint8",
            PixelType::Uint16 => "uint16",
            PixelType::Uint32 => "uint32",
        }
    }
}

/// Per-plane geometry shared by every plane of the acquisition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelGeometry {
    pub size_x: u32,
    pub size_y: u32,
    pub pixel_type: PixelType,
    pub samples_per_pixel: u32,
    pub physical_size: PhysicalSize,
}

// =============================================================================
// Elements
// =============================================================================

/// One `Channel` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub index: u32,
    pub name: Option<String>,
}

/// One `TiffData` element with its `UUID` child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiffData {
    pub first_t: u32,
    pub first_c: u32,
    pub first_z: u32,
    pub ifd: u32,
    pub plane_count: u32,
    pub file_name: String,
    pub uuid: String,
}

/// An inline pixel payload placeholder.
///
/// Only ever present as a zero-length placeholder; it must be stripped before
/// the document describes TiffData.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinData {
    pub big_endian: bool,
    pub length: u64,
}

// =============================================================================
// FullDocument
// =============================================================================

/// The complete multi-file OME document.
#[derive(Debug, Clone)]
pub struct FullDocument {
    image_name: String,
    geometry: PixelGeometry,
    size_t: u32,
    size_c: u32,
    size_z: u32,
    channels: Vec<Channel>,
    bin_data: Vec<BinData>,
    tiff_data: Vec<TiffData>,
    acquisition_date: Option<String>,
    original_metadata: Vec<(String, String)>,
}

impl FullDocument {
    /// Build the document for every plane in `index`.
    ///
    /// `Pixels` starts out holding one BinData placeholder per plane,
    /// mirroring a freshly populated pixels description.
    pub fn new(image_name: impl Into<String>, geometry: PixelGeometry, index: &PlaneIndex) -> Self {
        let (size_t, size_c, size_z) = index.dimensions();

        let tiff_data: Vec<TiffData> = index
            .entries()
            .iter()
            .map(|entry| TiffData {
                first_t: entry.t,
                first_c: entry.c,
                first_z: entry.z,
                ifd: 0,
                plane_count: 1,
                file_name: entry.file_name.clone(),
                uuid: entry.uuid.clone(),
            })
            .collect();

        let bin_data = vec![
            BinData {
                big_endian: false,
                length: 0,
            };
            tiff_data.len()
        ];

        let channels = (0..size_c)
            .map(|index| Channel { index, name: None })
            .collect();

        Self {
            image_name: image_name.into(),
            geometry,
            size_t,
            size_c,
            size_z,
            channels,
            bin_data,
            tiff_data,
            acquisition_date: None,
            original_metadata: Vec::new(),
        }
    }

    /// Name channel `c` (0-based). Out-of-range channels are ignored.
    pub fn set_channel_name(&mut self, c: u32, name: impl Into<String>) {
        if let Some(channel) = self.channels.get_mut(c as usize) {
            channel.name = Some(name.into());
        }
    }

    /// Set `Image/AcquisitionDate`, an `xsd:dateTime` such as
    /// `2018-08-14T15:20:47`.
    pub fn set_acquisition_date(&mut self, date: impl Into<String>) {
        self.acquisition_date = Some(date.into());
    }

    /// Replace the original metadata. Each pair becomes one XMLAnnotation,
    /// in iteration order.
    pub fn set_original_metadata<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.original_metadata = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
    }

    pub fn acquisition_date(&self) -> Option<&str> {
        self.acquisition_date.as_deref()
    }

    pub fn original_metadata(&self) -> &[(String, String)] {
        &self.original_metadata
    }

    /// Remove all BinData placeholders, returning how many were removed.
    ///
    /// Idempotent: a second call removes nothing and still succeeds.
    pub fn strip_bin_data(&mut self) -> usize {
        let removed = self.bin_data.len();
        self.bin_data.clear();
        removed
    }

    pub fn bin_data_count(&self) -> usize {
        self.bin_data.len()
    }

    pub fn tiff_data(&self) -> &[TiffData] {
        &self.tiff_data
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// `(size_t, size_c, size_z)`.
    pub fn dimensions(&self) -> (u32, u32, u32) {
        (self.size_t, self.size_c, self.size_z)
    }

    /// Serialize the document as written into the file identified by
    /// `current_uuid`.
    ///
    /// # Errors
    /// - `BinDataPresent` if placeholders have not been stripped
    /// - `NoPlanes` if the document describes no TiffData
    /// - `UnknownUuid` if `current_uuid` is not one of the planes' UUIDs
    pub fn to_xml(&self, current_uuid: &str) -> Result<String, MetadataError> {
        self.validate(current_uuid)?;

        let g = &self.geometry;
        let mut w = XmlWriter::new();

        w.open(
            "OME",
            &[
                ("xmlns", OME_NAMESPACE.to_string()),
                ("xmlns:xsi", XSI_NAMESPACE.to_string()),
                ("xsi:schemaLocation", OME_SCHEMA_LOCATION.to_string()),
                ("Creator", CREATOR.to_string()),
                ("UUID", current_uuid.to_string()),
            ],
        );
        w.open(
            "Image",
            &[
                ("ID", "Image:0".to_string()),
                ("Name", self.image_name.clone()),
            ],
        );
        if let Some(date) = &self.acquisition_date {
            w.text_element("AcquisitionDate", &[], date);
        }

        let mut pixel_attrs = vec![
            ("ID", "Pixels:0".to_string()),
            ("DimensionOrder", DIMENSION_ORDER.to_string()),
            ("Type", g.pixel_type.as_str().to_string()),
            ("SizeX", g.size_x.to_string()),
            ("SizeY", g.size_y.to_string()),
            ("SizeZ", self.size_z.to_string()),
            ("SizeC", self.size_c.to_string()),
            ("SizeT", self.size_t.to_string()),
        ];
        if let Some(x) = g.physical_size.x {
            pixel_attrs.push(("PhysicalSizeX", x.to_string()));
        }
        if let Some(y) = g.physical_size.y {
            pixel_attrs.push(("PhysicalSizeY", y.to_string()));
        }
        if let Some(z) = g.physical_size.z {
            pixel_attrs.push(("PhysicalSizeZ", z.to_string()));
        }
        w.open("Pixels", &pixel_attrs);

        for channel in &self.channels {
            let mut attrs = vec![
                ("ID", format!("Channel:0:{}", channel.index)),
                ("SamplesPerPixel", g.samples_per_pixel.to_string()),
            ];
            if let Some(name) = &channel.name {
                attrs.push(("Name", name.clone()));
            }
            w.empty("Channel", &attrs);
        }

        for td in &self.tiff_data {
            w.open(
                "TiffData",
                &[
                    ("FirstC", td.first_c.to_string()),
                    ("FirstT", td.first_t.to_string()),
                    ("FirstZ", td.first_z.to_string()),
                    ("IFD", td.ifd.to_string()),
                    ("PlaneCount", td.plane_count.to_string()),
                ],
            );
            w.text_element("UUID", &[("FileName", td.file_name.clone())], &td.uuid);
            w.close("TiffData");
        }

        w.close("Pixels");
        for n in 0..self.original_metadata.len() {
            w.empty("AnnotationRef", &[("ID", annotation_id(n))]);
        }
        w.close("Image");

        if !self.original_metadata.is_empty() {
            w.open("StructuredAnnotations", &[]);
            for (n, (key, value)) in self.original_metadata.iter().enumerate() {
                w.open(
                    "XMLAnnotation",
                    &[
                        ("ID", annotation_id(n)),
                        ("Namespace", ORIGINAL_METADATA_NAMESPACE.to_string()),
                    ],
                );
                w.open("Value", &[]);
                w.open("OriginalMetadata", &[]);
                w.text_element("Key", &[], key);
                w.text_element("Value", &[], value);
                w.close("OriginalMetadata");
                w.close("Value");
                w.close("XMLAnnotation");
            }
            w.close("StructuredAnnotations");
        }
        w.close("OME");

        Ok(w.finish())
    }

    fn validate(&self, current_uuid: &str) -> Result<(), MetadataError> {
        if self.tiff_data.is_empty() {
            return Err(MetadataError::NoPlanes);
        }
        if !self.bin_data.is_empty() {
            return Err(MetadataError::BinDataPresent(self.bin_data.len()));
        }
        if !self.tiff_data.iter().any(|td| td.uuid == current_uuid) {
            return Err(MetadataError::UnknownUuid(current_uuid.to_string()));
        }
        Ok(())
    }
}

fn annotation_id(n: usize) -> String {
    format!("Annotation:{}", n)
}

// =============================================================================
// BinaryOnlyDocument
// =============================================================================

/// Stub written into files that defer to the master's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryOnlyDocument {
    metadata_file: String,
    uuid: String,
}

impl BinaryOnlyDocument {
    /// Point at the master file by base name and UUID.
    pub fn new(master: &MasterReference) -> Self {
        Self {
            metadata_file: master.file_name.clone(),
            uuid: master.uuid.clone(),
        }
    }

    pub fn metadata_file(&self) -> &str {
        &self.metadata_file
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn to_xml(&self) -> String {
        let mut w = XmlWriter::new();
        w.open(
            "OME",
            &[
                ("xmlns", OME_NAMESPACE.to_string()),
                ("xmlns:xsi", XSI_NAMESPACE.to_string()),
                ("xsi:schemaLocation", OME_SCHEMA_LOCATION.to_string()),
                ("Creator", CREATOR.to_string()),
            ],
        );
        w.empty(
            "BinaryOnly",
            &[
                ("MetadataFile", self.metadata_file.clone()),
                ("UUID", self.uuid.clone()),
            ],
        );
        w.close("OME");
        w.finish()
    }
}
