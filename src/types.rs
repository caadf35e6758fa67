use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of tie points across one geolocation grid line
pub const TIE_POINT_COUNT: usize = 11;

/// Number of gain samples in one antenna elevation pattern
pub const ANTENNA_GAIN_COUNT: usize = 201;

/// Elevation-angle step between two antenna pattern samples (degrees)
pub const ANTENNA_GAIN_STEP_DEG: f64 = 0.05;

/// Speed of light (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Mission generation, inferred from the product file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mission {
    Envisat,
    Ers1,
    Ers2,
}

impl Mission {
    /// Infer the mission from the product name suffix (`.N1`, `.E1`, `.E2`)
    pub fn from_product_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let suffix = name.rsplit('.').next()?;
        match suffix.to_ascii_uppercase().as_str() {
            "N1" => Some(Mission::Envisat),
            "E1" => Some(Mission::Ers1),
            "E2" => Some(Mission::Ers2),
            _ => None,
        }
    }

    /// Sub-directory of the auxiliary root holding this mission's calibration files
    pub fn aux_dir_name(&self) -> &'static str {
        match self {
            Mission::Envisat => "ASAR",
            Mission::Ers1 => "ERS1",
            Mission::Ers2 => "ERS2",
        }
    }
}

impl std::fmt::Display for Mission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mission::Envisat => write!(f, "ENVISAT"),
            Mission::Ers1 => write!(f, "ERS-1"),
            Mission::Ers2 => write!(f, "ERS-2"),
        }
    }
}

/// Transmit/receive polarization combinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarization {
    HH,
    VV,
    HV,
    VH,
}

impl Polarization {
    /// Parse the header form (`H/V`) or the compact form (`HV`)
    pub fn from_tx_rx(value: &str) -> Option<Self> {
        let compact: String = value
            .trim()
            .chars()
            .filter(|c| *c != '/')
            .collect::<String>()
            .to_ascii_uppercase();
        match compact.as_str() {
            "HH" => Some(Polarization::HH),
            "VV" => Some(Polarization::VV),
            "HV" => Some(Polarization::HV),
            "VH" => Some(Polarization::VH),
            _ => None,
        }
    }

    /// Position of this polarization inside an auxiliary antenna pattern block
    pub fn lut_index(&self) -> usize {
        match self {
            Polarization::HH => 0,
            Polarization::VV => 1,
            Polarization::HV => 2,
            Polarization::VH => 3,
        }
    }
}

impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarization::HH => write!(f, "H/H"),
            Polarization::VV => write!(f, "V/V"),
            Polarization::HV => write!(f, "H/V"),
            Polarization::VH => write!(f, "V/H"),
        }
    }
}

/// Sample representation of the measurement data set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleType {
    /// Single-look complex (I + jQ)
    Complex,
    /// Power or amplitude, already radiometrically processed upstream
    Detected,
}

impl SampleType {
    pub fn from_attribute(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_uppercase();
        if value.starts_with("COMPLEX") {
            Some(SampleType::Complex)
        } else if value.starts_with("DETECTED") {
            Some(SampleType::Detected)
        } else {
            None
        }
    }
}

/// Orbit state vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitStateVector {
    pub time: DateTime<Utc>,
    pub position: [f64; 3],  // [x, y, z] in meters
    pub velocity: [f64; 3],  // [vx, vy, vz] in m/s
}

impl OrbitStateVector {
    /// Distance from the Earth centre (m)
    pub fn radius(&self) -> f64 {
        let [x, y, z] = self.position;
        (x * x + y * y + z * z).sqrt()
    }
}

/// Error types for ASAR decoding and calibration
#[derive(Debug, thiserror::Error)]
pub enum AsarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Header or descriptor structure does not match the format
    #[error("Invalid product format: {0}")]
    InvalidFormat(String),

    #[error("Auxiliary file not found: {0}")]
    MissingAuxiliaryFile(String),

    #[error("Unsupported {dataset} layout: {reason}")]
    UnsupportedVariant { dataset: String, reason: String },

    #[error("Arithmetic domain error: {0}")]
    ArithmeticDomain(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for ASAR operations
pub type AsarResult<T> = Result<T, AsarError>;
