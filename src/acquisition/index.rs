//! Plane index: which file holds which (T, C, Z) plane.
//!
//! Built once per run from the acquisition's file listing, before anything is
//! written. Every stub document references the master entry, so the index
//! must be complete before the first write.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::filename::{is_tiff, parse_filename};

/// One indexed plane file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneEntry {
    /// Position among indexed files, from 0
    pub tiff_data_index: usize,

    /// Full path as listed by the acquisition
    pub path: PathBuf,

    /// Base name used in UUID references
    pub file_name: String,

    pub t: u32,
    pub c: u32,
    pub z: u32,

    /// `urn:uuid:<v4>` identifier of this file
    pub uuid: String,
}

/// The file that carries the authoritative metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterReference {
    pub path: PathBuf,
    pub file_name: String,
    pub uuid: String,
}

/// Why a listed file was left out of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// TIFF extension but the name does not follow the convention
    UnparsableFilename,
}

/// A listed TIFF file that was not indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Ordered plane entries plus the master reference.
#[derive(Debug, Clone)]
pub struct PlaneIndex {
    entries: Vec<PlaneEntry>,
    by_path: HashMap<PathBuf, usize>,
    skipped: Vec<SkippedFile>,
}

impl PlaneIndex {
    /// Index `files` in order, generating a random v4 UUID per plane.
    pub fn build<P: AsRef<Path>>(files: &[P]) -> Self {
        Self::build_with(files, || Uuid::new_v4().to_string())
    }

    /// Index `files` in order with a caller-supplied UUID source.
    ///
    /// `next_uuid` returns the bare UUID; the `urn:uuid:` prefix is added here.
    /// Non-TIFF files are ignored silently; TIFF files that fail the naming
    /// check are logged and recorded as skipped.
    pub fn build_with<P, F>(files: &[P], mut next_uuid: F) -> Self
    where
        P: AsRef<Path>,
        F: FnMut() -> String,
    {
        let mut entries: Vec<PlaneEntry> = Vec::new();
        let mut by_path = HashMap::new();
        let mut skipped = Vec::new();

        for file in files {
            let path = file.as_ref();
            if !is_tiff(path) {
                continue;
            }

            let indices = match parse_filename(&path.to_string_lossy()) {
                Ok(indices) => indices,
                Err(e) => {
                    warn!("{}; skipping", e);
                    skipped.push(SkippedFile {
                        path: path.to_path_buf(),
                        reason: SkipReason::UnparsableFilename,
                    });
                    continue;
                }
            };

            if by_path.contains_key(path) {
                continue;
            }

            let (t, c, z) = indices.to_tcz();
            let tiff_data_index = entries.len();
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            by_path.insert(path.to_path_buf(), tiff_data_index);
            entries.push(PlaneEntry {
                tiff_data_index,
                path: path.to_path_buf(),
                file_name,
                t,
                c,
                z,
                uuid: format!("urn:uuid:{}", next_uuid()),
            });
        }

        Self {
            entries,
            by_path,
            skipped,
        }
    }

    /// Entries in `tiff_data_index` order.
    pub fn entries(&self) -> &[PlaneEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Files that were left out, in listing order.
    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    /// Look up the entry for a listed path.
    pub fn get(&self, path: &Path) -> Option<&PlaneEntry> {
        self.by_path.get(path).map(|&i| &self.entries[i])
    }

    /// The first indexed file, `None` if nothing was indexed.
    pub fn master(&self) -> Option<MasterReference> {
        self.entries.first().map(|e| MasterReference {
            path: e.path.clone(),
            file_name: e.file_name.clone(),
            uuid: e.uuid.clone(),
        })
    }

    /// Number of distinct planes along each axis: `(size_t, size_c, size_z)`.
    ///
    /// Taken as the highest coordinate seen plus one, so gaps in the listing
    /// still produce a consistent OME dimension.
    pub fn dimensions(&self) -> (u32, u32, u32) {
        self.entries.iter().fold((0, 0, 0), |(t, c, z), e| {
            (t.max(e.t + 1), c.max(e.c + 1), z.max(e.z + 1))
        })
    }
}
