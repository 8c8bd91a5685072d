use std::path::PathBuf;

use thiserror::Error;

/// I/O errors that can occur when reading or writing acquisition files
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Underlying filesystem error
    #[error("I/O error on {path}: {message}")]
    Fs { path: String, message: String },

    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// File not found
    #[error("File not found: {0}")]
    NotFound(String),
}

impl IoError {
    /// Wrap a `std::io::Error` raised while operating on `path`.
    pub fn fs(path: impl Into<String>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            IoError::NotFound(path)
        } else {
            IoError::Fs {
                path,
                message: err.to_string(),
            }
        }
    }
}

/// Errors that can occur when parsing or rewriting TIFF files
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading or writing the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("Invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file or to invalid location)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// Required tag is missing from IFD
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Tag has unexpected type or count
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },

    /// Unknown field type in IFD entry
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),

    /// New value would be placed beyond what a classic TIFF offset can address
    #[error("Offset {0} does not fit in a classic TIFF 32-bit offset")]
    OffsetOverflow(u64),

    /// Read-back of a rewritten tag did not match the written payload
    #[error("Verification failed: {0}")]
    VerificationFailed(String),
}

/// Errors raised while reading the Prairie acquisition descriptor
#[derive(Debug, Clone, Error)]
pub enum AcquisitionError {
    /// Descriptor could not be read from disk
    #[error("Cannot read descriptor: {0}")]
    Io(#[from] IoError),

    /// Descriptor is not well-formed XML or is not a PVScan document
    #[error("Invalid descriptor {path}: {message}")]
    InvalidDescriptor { path: String, message: String },

    /// A TIFF filename does not follow the Prairie naming convention
    #[error("{0} does not conform to Prairie naming convention")]
    UnparsableFilename(String),

    /// No file in the acquisition passed the naming check
    #[error("No file in {0} conforms to the Prairie naming convention")]
    NoConformingFiles(String),
}

/// Errors raised while building or serializing OME-XML documents
#[derive(Debug, Clone, Error)]
pub enum MetadataError {
    /// Pixels would carry both BinData and TiffData children
    #[error("Pixels contains {0} BinData element(s) alongside TiffData")]
    BinDataPresent(usize),

    /// Full document has no planes to describe
    #[error("Document has no TiffData entries")]
    NoPlanes,

    /// Current document UUID does not identify any plane in the document
    #[error("UUID {0} does not identify any TiffData entry")]
    UnknownUuid(String),
}

/// Top-level errors of an injection run
#[derive(Debug, Error)]
pub enum InjectError {
    /// Command-line arguments are missing or invalid
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Acquisition descriptor or listing failure
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    /// Document construction failure
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// TIFF structure failure outside a per-file write
    #[error(transparent)]
    Tiff(#[from] TiffError),

    /// Rewriting one file's comment failed
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: WriteFailure,
    },

    /// One or more files failed; the run continued past them
    #[error("{failed} of {total} file(s) could not be written")]
    Incomplete { failed: usize, total: usize },
}

/// Cause of a per-file write failure
#[derive(Debug, Clone, Error)]
pub enum WriteFailure {
    /// The document for this file could not be serialized
    #[error("serialization failed: {0}")]
    Serialization(#[from] MetadataError),

    /// The comment tag could not be located or rewritten
    #[error("tag rewrite failed: {0}")]
    TagRewrite(#[from] TiffError),
}
