//! Reader configuration

use crate::types::{AsarError, AsarResult};
use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the default auxiliary root
pub const AUX_DIR_ENV: &str = "ASARDINE_AUX_DIR";

/// Options for opening a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReaderConfig {
    /// Directory holding the `ASAR/`, `ERS1/` and `ERS2/` auxiliary trees
    pub aux_root: PathBuf,
    /// Remove the antenna elevation pattern when building the calibration vector
    pub apply_antenna_gain: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            aux_root: default_aux_root(),
            apply_antenna_gain: true,
        }
    }
}

impl ReaderConfig {
    pub fn with_aux_root<P: AsRef<Path>>(aux_root: P) -> Self {
        Self {
            aux_root: aux_root.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Parse `<readerConfig><auxRoot>..</auxRoot><applyAntennaGain>..</applyAntennaGain></readerConfig>`;
    /// absent elements keep their defaults
    pub fn from_xml_str(xml: &str) -> AsarResult<Self> {
        from_str::<ReaderConfig>(xml)
            .map_err(|e| AsarError::Config(format!("Failed to parse reader config XML: {}", e)))
    }

    pub fn from_xml_file<P: AsRef<Path>>(path: P) -> AsarResult<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path)
            .map_err(|e| AsarError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_xml_str(&xml)
    }
}

/// `$ASARDINE_AUX_DIR`, else `<data dir>/asardine/aux`, else `./aux`
pub fn default_aux_root() -> PathBuf {
    if let Some(dir) = std::env::var_os(AUX_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .map(|d| d.join("asardine").join("aux"))
        .unwrap_or_else(|| PathBuf::from("aux"))
}
