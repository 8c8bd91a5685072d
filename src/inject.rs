//! Two-pass OME-XML injection over a Prairie acquisition.
//!
//! Pass one lists the acquisition and builds the complete [`PlaneIndex`].
//! Pass two walks the same ordered entries and rewrites each file's
//! ImageDescription: every `interval`-th file (counting from 0) receives the
//! full document with its own UUID as the root UUID, every other file receives
//! the BinaryOnly stub pointing at the master file.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::acquisition::{PlaneEntry, PlaneIndex, PrairieDataset, SkippedFile};
use crate::error::{AcquisitionError, InjectError, TiffError, WriteFailure};
use crate::format::tiff::{overwrite_comment, probe_geometry, read_comment, CommentRewrite};
use crate::io::LocalFile;
use crate::ome::{BinaryOnlyDocument, FullDocument, PixelGeometry, PixelType};

/// Default spacing between files that carry the full document.
pub const DEFAULT_FULL_METADATA_INTERVAL: usize = 10;

// =============================================================================
// Options
// =============================================================================

/// Knobs for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectOptions {
    /// Every Nth qualifying file gets the full document. Must be at least 1.
    pub full_metadata_interval: usize,

    /// Stop at the first failed file instead of continuing
    pub fail_fast: bool,

    /// Read each rewritten tag back and compare it with the payload
    pub verify: bool,
}

impl Default for InjectOptions {
    fn default() -> Self {
        Self {
            full_metadata_interval: DEFAULT_FULL_METADATA_INTERVAL,
            fail_fast: false,
            verify: false,
        }
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Which document a file received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Full,
    Stub,
}

/// A file whose rewrite failed.
#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub payload: Payload,
    pub error: String,
}

/// Outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub descriptor: PathBuf,
    pub planes: usize,
    pub master_file: Option<String>,
    pub full_documents: usize,
    pub stub_documents: usize,
    pub skipped: Vec<SkippedFile>,
    pub failures: Vec<FailedFile>,
}

impl RunSummary {
    fn new(descriptor: &Path, index: &PlaneIndex) -> Self {
        Self {
            descriptor: descriptor.to_path_buf(),
            planes: index.len(),
            master_file: index.master().map(|m| m.file_name),
            full_documents: 0,
            stub_documents: 0,
            skipped: index.skipped().to_vec(),
            failures: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Err(Incomplete)` if any file failed.
    pub fn check(&self) -> Result<(), InjectError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(InjectError::Incomplete {
                failed: self.failures.len(),
                total: self.planes,
            })
        }
    }
}

// =============================================================================
// Injector
// =============================================================================

/// Drives both passes over one acquisition.
#[derive(Debug, Clone, Default)]
pub struct Injector {
    options: InjectOptions,
}

impl Injector {
    pub fn new(options: InjectOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &InjectOptions {
        &self.options
    }

    /// Read the descriptor at `descriptor` and inject every conforming file.
    ///
    /// Per-file failures are collected in the summary unless `fail_fast` is
    /// set, in which case the first one is returned as `InjectError::Write`.
    pub async fn run(&self, descriptor: &Path) -> Result<RunSummary, InjectError> {
        let dataset = PrairieDataset::open(descriptor).await?;
        let index = PlaneIndex::build(&dataset.used_files());
        self.inject(&dataset, &index).await
    }

    /// Second pass: write documents for an already-built index.
    pub async fn inject(
        &self,
        dataset: &PrairieDataset,
        index: &PlaneIndex,
    ) -> Result<RunSummary, InjectError> {
        if self.options.full_metadata_interval == 0 {
            return Err(InjectError::InvalidArguments(
                "full metadata interval must be at least 1".to_string(),
            ));
        }

        let master = index.master().ok_or_else(|| {
            AcquisitionError::NoConformingFiles(dataset.descriptor().display().to_string())
        })?;

        info!(
            descriptor = %dataset.descriptor().display(),
            version = dataset.version().unwrap_or("unknown"),
            listed = dataset.plane_files().len(),
            planes = index.len(),
            skipped = index.skipped().len(),
            master = %master.file_name,
            "indexed acquisition"
        );

        let geometry = resolve_geometry(dataset, &master.path).await?;
        debug!(?geometry, "resolved pixel geometry");

        let mut full = FullDocument::new(dataset.name(), geometry, index);
        let (_, size_c, _) = full.dimensions();
        for c in 0..size_c {
            if let Some(name) = dataset.channel_name(c + 1) {
                full.set_channel_name(c, name);
            }
        }
        if let Some(date) = dataset.acquisition_date() {
            full.set_acquisition_date(date);
        }
        full.set_original_metadata(dataset.state());
        let stub = BinaryOnlyDocument::new(&master).to_xml();

        let mut summary = RunSummary::new(dataset.descriptor(), index);

        for (i, entry) in index.entries().iter().enumerate() {
            let payload = if i % self.options.full_metadata_interval == 0 {
                Payload::Full
            } else {
                Payload::Stub
            };

            match self.write_entry(&mut full, &stub, entry, payload).await {
                Ok(rewrite) => {
                    debug!(
                        file = %entry.file_name,
                        ?payload,
                        bytes = rewrite.byte_count,
                        previous_bytes = rewrite.previous_byte_count,
                        offset = ?rewrite.value_offset,
                        reused_slot = rewrite.reused_slot,
                        "wrote OME-XML"
                    );
                    match payload {
                        Payload::Full => summary.full_documents += 1,
                        Payload::Stub => summary.stub_documents += 1,
                    }
                }
                Err(failure) => {
                    error!(file = %entry.path.display(), "{}", failure);
                    if self.options.fail_fast {
                        return Err(InjectError::Write {
                            path: entry.path.clone(),
                            source: failure,
                        });
                    }
                    summary.failures.push(FailedFile {
                        path: entry.path.clone(),
                        payload,
                        error: failure.to_string(),
                    });
                }
            }
        }

        if summary.is_success() {
            info!(
                full = summary.full_documents,
                stub = summary.stub_documents,
                "injection complete"
            );
        } else {
            warn!(
                failed = summary.failures.len(),
                total = summary.planes,
                "injection finished with failures"
            );
        }

        Ok(summary)
    }

    async fn write_entry(
        &self,
        full: &mut FullDocument,
        stub: &str,
        entry: &PlaneEntry,
        payload: Payload,
    ) -> Result<CommentRewrite, WriteFailure> {
        full.strip_bin_data();

        let xml = match payload {
            Payload::Full => full.to_xml(&entry.uuid)?,
            Payload::Stub => stub.to_string(),
        };

        // The handle is dropped on every path out of this scope
        let file = LocalFile::open_rw(&entry.path)
            .await
            .map_err(TiffError::from)?;
        let rewrite = overwrite_comment(&file, &xml).await?;

        if self.options.verify {
            let written = read_comment(&file).await?;
            if written.as_deref() != Some(xml.as_str()) {
                return Err(TiffError::VerificationFailed(entry.path.display().to_string()).into());
            }
        }

        Ok(rewrite)
    }
}

/// Pixel geometry from the descriptor, falling back to the master TIFF's
/// IFD 0 for anything the descriptor leaves out.
async fn resolve_geometry(
    dataset: &PrairieDataset,
    master: &Path,
) -> Result<PixelGeometry, InjectError> {
    let physical_size = dataset.microns_per_pixel();

    if let (Some(size_x), Some(size_y), Some(bits)) = (
        dataset.pixels_per_line(),
        dataset.lines_per_frame(),
        dataset.bit_depth(),
    ) {
        // Prairie planes are single-sample grayscale
        return Ok(PixelGeometry {
            size_x,
            size_y,
            pixel_type: PixelType::from_bit_depth(bits),
            samples_per_pixel: 1,
            physical_size,
        });
    }

    debug!(master = %master.display(), "descriptor lacks frame geometry; probing master file");
    let file = LocalFile::open(master).await.map_err(TiffError::from)?;
    let probed = probe_geometry(&file).await?;

    Ok(PixelGeometry {
        size_x: dataset.pixels_per_line().unwrap_or(probed.width),
        size_y: dataset.lines_per_frame().unwrap_or(probed.height),
        pixel_type: PixelType::from_bit_depth(
            dataset.bit_depth().unwrap_or(probed.bits_per_sample),
        ),
        samples_per_pixel: probed.samples_per_pixel,
        physical_size,
    })
}
