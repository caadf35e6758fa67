//! External calibration auxiliary files and their antenna elevation patterns

use crate::io::be::BeCursor;
use crate::io::descriptor::MPH_SIZE;
use crate::types::{AsarError, AsarResult, Mission, Polarization, ANTENNA_GAIN_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Size of the specific product header of an external calibration file
pub const AUX_SPH_SIZE: usize = 378;

/// Start of the global annotation dataset
pub const GADS_OFFSET: usize = MPH_SIZE + AUX_SPH_SIZE;

/// DSR time (12) + DSR length (4)
const GADS_HEADER_SIZE: usize = 16;

/// Number of image swaths with an elevation pattern
pub const SWATH_COUNT: usize = 7;

/// Polarisation slots per swath
pub const POLARIZATION_COUNT: usize = 4;

const REFERENCE_ANGLES_OFFSET: usize = GADS_OFFSET + GADS_HEADER_SIZE;
const PATTERN_OFFSET: usize = REFERENCE_ANGLES_OFFSET + SWATH_COUNT * 4;
const PATTERN_SIZE: usize = ANTENNA_GAIN_COUNT * 4;

/// Minimum length of a complete external calibration file
pub const AUX_FILE_MIN_SIZE: usize = PATTERN_OFFSET + SWATH_COUNT * POLARIZATION_COUNT * PATTERN_SIZE;

/// Antenna elevation gain pattern for one swath and polarisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntennaGainTable {
    /// Elevation angle of the pattern's centre sample (degrees)
    pub reference_elevation_angle: f64,
    /// Two-way gain (dB), `ANTENNA_GAIN_COUNT` samples at 0.05° spacing
    pub gains_db: Vec<f64>,
}

impl AntennaGainTable {
    /// Linear gain at pattern index `idx`, if in range
    pub fn linear_gain(&self, idx: i64) -> Option<f64> {
        usize::try_from(idx)
            .ok()
            .and_then(|i| self.gains_db.get(i))
            .map(|db| 10f64.powf(db / 10.0))
    }
}

/// Extract the pattern of `swath_number` (1-based) and `polarization` from file bytes
pub fn parse_antenna_gain(bytes: &[u8], swath_number: u32, polarization: Polarization) -> AsarResult<AntennaGainTable> {
    if bytes.len() < AUX_FILE_MIN_SIZE {
        return Err(AsarError::InvalidFormat(format!(
            "External calibration file is {} bytes, expected at least {}",
            bytes.len(),
            AUX_FILE_MIN_SIZE
        )));
    }

    let swath_idx = (swath_number as usize)
        .checked_sub(1)
        .filter(|i| *i < SWATH_COUNT)
        .ok_or_else(|| AsarError::Metadata(format!("No antenna pattern for swath {}", swath_number)))?;
    let pol_idx = polarization.lut_index();

    let mut cursor = BeCursor::at(bytes, REFERENCE_ANGLES_OFFSET + swath_idx * 4, "external calibration GADS");
    let reference_elevation_angle = cursor.f32()? as f64;

    cursor.seek(PATTERN_OFFSET + (swath_idx * POLARIZATION_COUNT + pol_idx) * PATTERN_SIZE);
    let gains_db = (0..ANTENNA_GAIN_COUNT)
        .map(|_| cursor.f32().map(|g| g as f64))
        .collect::<AsarResult<Vec<_>>>()?;

    Ok(AntennaGainTable {
        reference_elevation_angle,
        gains_db,
    })
}

/// Filename → path table of the auxiliary files of one mission
#[derive(Debug, Clone, Default)]
pub struct AuxCatalog {
    root: PathBuf,
    files: HashMap<String, PathBuf>,
}

impl AuxCatalog {
    /// Walk `<aux_root>/<mission dir>` once and index every file found
    pub fn scan(aux_root: &Path, mission: Mission) -> AsarResult<Self> {
        let root = aux_root.join(mission.aux_dir_name());
        let mut catalog = Self {
            root: root.clone(),
            files: HashMap::new(),
        };

        if !root.is_dir() {
            log::warn!("Auxiliary directory {} does not exist", root.display());
            return Ok(catalog);
        }

        let mut pending = vec![root];
        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    pending.push(path);
                } else if let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) {
                    catalog.files.entry(name).or_insert(path);
                }
            }
        }

        log::debug!(
            "Indexed {} auxiliary files under {}",
            catalog.files.len(),
            catalog.root.display()
        );
        Ok(catalog)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Path of the auxiliary file `filename`
    pub fn resolve(&self, filename: &str) -> AsarResult<&Path> {
        self.files
            .get(filename.trim())
            .map(PathBuf::as_path)
            .ok_or_else(|| AsarError::MissingAuxiliaryFile(format!("{} (searched {})", filename, self.root.display())))
    }

    /// Antenna pattern for the swath and polarisation, or `None` when unavailable.
    ///
    /// A missing file is not an error: the caller falls back to unity gain.
    pub fn load_antenna_gain(
        &self,
        filename: &str,
        swath_number: u32,
        polarization: Polarization,
    ) -> AsarResult<Option<AntennaGainTable>> {
        if !(1..=SWATH_COUNT as u32).contains(&swath_number) {
            log::warn!("No antenna pattern for swath {}; using unity antenna gain", swath_number);
            return Ok(None);
        }

        let path = match self.resolve(filename) {
            Ok(path) => path,
            Err(AsarError::MissingAuxiliaryFile(msg)) => {
                log::warn!("Auxiliary file not found: {}; using unity antenna gain", msg);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let bytes = std::fs::read(path)?;
        let table = parse_antenna_gain(&bytes, swath_number, polarization)?;
        log::info!(
            "Loaded antenna pattern swath {} {} from {} (reference elevation {:.3} deg)",
            swath_number,
            polarization,
            path.display(),
            table.reference_elevation_angle
        );
        Ok(Some(table))
    }
}

/// Resolve and load the antenna pattern a product needs.
///
/// Returns `None` when the processor already corrected the elevation pattern,
/// when the swath has no pattern, or when the auxiliary file cannot be found.
pub fn load_antenna_gain(
    aux_root: &Path,
    mission: Mission,
    filename: &str,
    swath_number: u32,
    polarization: Polarization,
    elevation_corrected: bool,
) -> AsarResult<Option<AntennaGainTable>> {
    if elevation_corrected {
        log::info!("Antenna elevation pattern already applied; skipping auxiliary lookup");
        return Ok(None);
    }
    AuxCatalog::scan(aux_root, mission)?.load_antenna_gain(filename, swath_number, polarization)
}
