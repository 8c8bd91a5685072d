//! Positional I/O for acquisition files.
//!
//! The TIFF layer reads and writes through the [`RangeReader`] and
//! [`RangeWriter`] traits rather than on files directly, so the same parsing
//! and rewrite code runs against [`LocalFile`] in production and in-memory
//! buffers in tests.

mod endian;
mod local_file;
#[cfg(test)]
mod memory;
mod range;

pub use endian::{
    read_u16_be, read_u16_le, read_u32_be, read_u32_le, read_u64_be, read_u64_le,
};
pub use local_file::LocalFile;
#[cfg(test)]
pub(crate) use memory::MemoryFile;
pub use range::{RangeReader, RangeWriter};
