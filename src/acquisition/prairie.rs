//! Prairie (PVScan) acquisition descriptor reader.
//!
//! The descriptor is an XML document listing every plane file of the
//! acquisition in frame order, plus the scanner state the frames were taken
//! with. Two state encodings exist in the wild:
//!
//! ```text
//! <PVStateValue key="pixelsPerLine" value="512"/>            (PrairieView 5.x)
//! <PVStateValue key="micronsPerPixel">
//!   <IndexedValue index="XAxis" value="0.8"/>
//! </PVStateValue>
//!
//! <Key key="pixelsPerLine" permissions="Read" value="512"/>  (PrairieView 4.x)
//! <Key key="micronsPerPixel_XAxis" value="0.8"/>
//! ```
//!
//! Both are folded into one key/value map; the first occurrence of a key in
//! document order wins, so the acquisition-level shard takes precedence over
//! per-frame shards.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::{AcquisitionError, IoError};

/// Sidecar extensions Prairie writes next to the descriptor.
const SIDECAR_EXTENSIONS: &[&str] = &["cfg", "env"];

/// `PVScan@date` as PrairieView writes it, e.g. `8/14/2018 3:20:47 PM`.
const PV_DATE_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Physical pixel size in microns.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhysicalSize {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

/// A parsed Prairie acquisition.
#[derive(Debug, Clone)]
pub struct PrairieDataset {
    descriptor: PathBuf,
    version: Option<String>,
    date: Option<String>,
    sidecars: Vec<PathBuf>,
    files: Vec<PathBuf>,
    state: BTreeMap<String, String>,
    channel_names: BTreeMap<u32, String>,
}

impl PrairieDataset {
    /// Read and parse the descriptor at `path`.
    ///
    /// The file is read in full and closed before parsing; nothing stays open
    /// after this returns.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AcquisitionError> {
        let path = path.as_ref();
        let xml = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| IoError::fs(path.display().to_string(), e))?;

        let mut dataset = Self::parse(path, &xml)?;
        dataset.sidecars = find_sidecars(path).await;
        Ok(dataset)
    }

    /// Parse descriptor contents. Plane paths are resolved against the
    /// directory containing `descriptor`.
    pub fn parse(descriptor: &Path, xml: &str) -> Result<Self, AcquisitionError> {
        let invalid = |message: String| AcquisitionError::InvalidDescriptor {
            path: descriptor.display().to_string(),
            message,
        };

        let doc = roxmltree::Document::parse(xml).map_err(|e| invalid(e.to_string()))?;
        let root = doc.root_element();
        if root.tag_name().name() != "PVScan" {
            return Err(invalid(format!(
                "expected PVScan root element, found {}",
                root.tag_name().name()
            )));
        }

        let base_dir = descriptor.parent().unwrap_or_else(|| Path::new(""));
        let mut files = Vec::new();
        let mut seen = HashSet::new();
        let mut channel_names = BTreeMap::new();
        let mut state = BTreeMap::new();

        for node in root.descendants().filter(|n| n.is_element()) {
            match node.tag_name().name() {
                "File" => {
                    let Some(filename) = node.attribute("filename") else {
                        continue;
                    };
                    let path = base_dir.join(filename);
                    if seen.insert(path.clone()) {
                        files.push(path);
                    }

                    if let (Some(channel), Some(name)) = (
                        node.attribute("channel").and_then(|c| c.trim().parse::<u32>().ok()),
                        node.attribute("channelName"),
                    ) {
                        channel_names
                            .entry(channel)
                            .or_insert_with(|| name.to_string());
                    }
                }
                "PVStateValue" | "Key" => collect_state(node, &mut state),
                _ => {}
            }
        }

        debug!(
            descriptor = %descriptor.display(),
            files = files.len(),
            state_keys = state.len(),
            "parsed Prairie descriptor"
        );

        Ok(Self {
            descriptor: descriptor.to_path_buf(),
            version: root.attribute("version").map(str::to_string),
            date: root.attribute("date").map(str::to_string),
            sidecars: Vec::new(),
            files,
            state,
            channel_names,
        })
    }

    /// Path of the descriptor this dataset was read from.
    pub fn descriptor(&self) -> &Path {
        &self.descriptor
    }

    /// Dataset name: the descriptor's file stem.
    pub fn name(&self) -> String {
        self.descriptor
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// PrairieView version that wrote the descriptor.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Acquisition start as an `xsd:dateTime` (`2018-08-14T15:20:47`).
    ///
    /// `None` when the descriptor has no date or it is not in PrairieView's
    /// `M/D/YYYY h:mm:ss AM` form.
    pub fn acquisition_date(&self) -> Option<String> {
        let raw = self.date.as_deref()?;
        match NaiveDateTime::parse_from_str(raw.trim(), PV_DATE_FORMAT) {
            Ok(date) => Some(date.format("%Y-%m-%dT%H:%M:%S").to_string()),
            Err(e) => {
                debug!(date = raw, error = %e, "unrecognized PVScan date");
                None
            }
        }
    }

    /// Scanner state as key/value pairs, sorted by key.
    pub fn state(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.state.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Every file belonging to the dataset, in listing order: the descriptor,
    /// its sidecars, then the plane files in frame order.
    pub fn used_files(&self) -> Vec<PathBuf> {
        let mut used = Vec::with_capacity(1 + self.sidecars.len() + self.files.len());
        used.push(self.descriptor.clone());
        used.extend(self.sidecars.iter().cloned());
        used.extend(self.files.iter().cloned());
        used
    }

    /// Plane files in frame order.
    pub fn plane_files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Frame width in pixels.
    pub fn pixels_per_line(&self) -> Option<u32> {
        self.state_u32("pixelsPerLine")
    }

    /// Frame height in pixels.
    pub fn lines_per_frame(&self) -> Option<u32> {
        self.state_u32("linesPerFrame")
    }

    /// Digitizer bit depth.
    pub fn bit_depth(&self) -> Option<u32> {
        self.state_u32("bitDepth")
    }

    /// Pixel size in microns along each axis.
    pub fn microns_per_pixel(&self) -> PhysicalSize {
        PhysicalSize {
            x: self.state_f64("micronsPerPixel_XAxis"),
            y: self.state_f64("micronsPerPixel_YAxis"),
            z: self.state_f64("micronsPerPixel_ZAxis"),
        }
    }

    /// Name of a 1-based channel, as recorded on its File elements.
    pub fn channel_name(&self, channel: u32) -> Option<&str> {
        self.channel_names.get(&channel).map(String::as_str)
    }

    fn state_u32(&self, key: &str) -> Option<u32> {
        self.state.get(key)?.trim().parse().ok()
    }

    fn state_f64(&self, key: &str) -> Option<f64> {
        self.state
            .get(key)?
            .trim()
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite() && *v > 0.0)
    }
}

/// Fold one state element into the map. Indexed values are keyed
/// `<key>_<index>` so both encodings share one namespace.
fn collect_state(node: roxmltree::Node, state: &mut BTreeMap<String, String>) {
    let Some(key) = node.attribute("key") else {
        return;
    };

    if let Some(value) = node.attribute("value") {
        state
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }

    for indexed in node
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "IndexedValue")
    {
        if let (Some(index), Some(value)) = (indexed.attribute("index"), indexed.attribute("value"))
        {
            state
                .entry(format!("{}_{}", key, index))
                .or_insert_with(|| value.to_string());
        }
    }
}

/// Sidecar files sharing the descriptor's stem, in extension order.
async fn find_sidecars(descriptor: &Path) -> Vec<PathBuf> {
    let mut sidecars = Vec::new();
    for ext in SIDECAR_EXTENSIONS {
        let candidate = descriptor.with_extension(ext);
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            sidecars.push(candidate);
        }
    }
    sidecars
}
