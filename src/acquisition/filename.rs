//! Prairie TIFF filename parsing.
//!
//! Prairie names every plane after its acquisition coordinates, e.g.
//! `TSeries-01012020-1200-001_Cycle00001_Ch2_000007.ome.tif`: cycle 1,
//! channel 2, position 7 within the cycle. All three are 1-based.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AcquisitionError;

/// Prairie naming convention: cycle, channel, position-within-cycle.
///
/// Anchored at both ends so the whole string must match.
static PRAIRIE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.*_Cycle(\d+).*_Ch(\d+)_(\d+).*$").expect("Prairie filename pattern is valid")
});

/// 1-based indices decoded from a Prairie filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIndices {
    pub cycle: u32,
    pub channel: u32,
    pub position: u32,
}

impl FileIndices {
    /// Zero-based `(t, c, z)` plane coordinates.
    pub fn to_tcz(self) -> (u32, u32, u32) {
        (self.cycle - 1, self.channel - 1, self.position - 1)
    }
}

/// Parse `(cycle, channel, position)` from a filename or full path.
///
/// # Errors
/// `UnparsableFilename` if the name does not follow the convention, if a
/// number does not fit in 32 bits, or if an index is 0 (indices are 1-based,
/// so 0 has no plane coordinate).
pub fn parse_filename(name: &str) -> Result<FileIndices, AcquisitionError> {
    let unparsable = || AcquisitionError::UnparsableFilename(name.to_string());

    let caps = PRAIRIE_NAME.captures(name).ok_or_else(unparsable)?;
    // Group 0 is the whole match
    if caps.len() != 4 {
        return Err(unparsable());
    }

    let group = |i: usize| -> Result<u32, AcquisitionError> {
        let value: u32 = caps
            .get(i)
            .ok_or_else(unparsable)?
            .as_str()
            .parse()
            .map_err(|_| unparsable())?;
        if value == 0 {
            return Err(unparsable());
        }
        Ok(value)
    };

    Ok(FileIndices {
        cycle: group(1)?,
        channel: group(2)?,
        position: group(3)?,
    })
}

/// Case-insensitive `.tif` / `.tiff` extension check.
pub fn is_tiff(path: &Path) -> bool {
    let lower = path.to_string_lossy().to_lowercase();
    lower.ends_with(".tif") || lower.ends_with(".tiff")
}
