//! Command-line configuration.
//!
//! Options are read from the command line with environment fallbacks:
//!
//! - `PRAIRIE_OME_FULL_INTERVAL` - spacing between full documents (default: 10)
//! - `PRAIRIE_OME_FAIL_FAST` - stop at the first failed file (default: false)
//! - `PRAIRIE_OME_VERIFY` - read back each rewritten tag (default: false)

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::inject::{InjectOptions, DEFAULT_FULL_METADATA_INTERVAL};

/// How the run summary is printed on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    /// Human-readable lines
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Inject OME-XML metadata into the TIFF files of a Prairie acquisition.
///
/// Reads the PVScan descriptor, indexes every plane file that follows the
/// Prairie naming convention, and rewrites each file's ImageDescription tag
/// in place.
#[derive(Parser, Debug, Clone)]
#[command(name = "prairie-ome-inject")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Path to the Prairie PVScan XML descriptor.
    pub descriptor: PathBuf,

    /// Write the full document into every Nth file, counting from the first.
    ///
    /// All other files receive a BinaryOnly stub referencing the first file.
    #[arg(
        long,
        default_value_t = DEFAULT_FULL_METADATA_INTERVAL,
        env = "PRAIRIE_OME_FULL_INTERVAL"
    )]
    pub full_metadata_interval: usize,

    /// Stop at the first file that cannot be written.
    #[arg(long, default_value_t = false, env = "PRAIRIE_OME_FAIL_FAST")]
    pub fail_fast: bool,

    /// Read each rewritten tag back and compare it with what was written.
    #[arg(long, default_value_t = false, env = "PRAIRIE_OME_VERIFY")]
    pub verify: bool,

    /// Run summary format.
    #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
    pub format: SummaryFormat,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.descriptor.as_os_str().is_empty() {
            return Err("A descriptor path is required".to_string());
        }

        if self.full_metadata_interval == 0 {
            return Err(
                "full_metadata_interval must be greater than 0. \
                 Set --full-metadata-interval or PRAIRIE_OME_FULL_INTERVAL"
                    .to_string(),
            );
        }

        Ok(())
    }

    /// Options for the injector.
    pub fn inject_options(&self) -> InjectOptions {
        InjectOptions {
            full_metadata_interval: self.full_metadata_interval,
            fail_fast: self.fail_fast,
            verify: self.verify,
        }
    }
}
