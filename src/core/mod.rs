//! Geometry and radiometric calibration

pub mod calibrate;
pub mod geometry;

// Re-export main types
pub use calibrate::{build_calibration_vector, CalibrationVector, CalibrationVectorBuilder};
pub use geometry::{elevation_angle, elevation_angle_checked, geodetic_distance};
