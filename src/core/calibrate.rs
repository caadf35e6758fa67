use crate::core::geometry::{elevation_angle, geodetic_distance};
use crate::io::aux_lut::AntennaGainTable;
use crate::io::product::ProductAttributes;
use crate::io::records::{GeolocationTiePoints, MainProcessingParams};
use crate::types::{
    AsarError, AsarResult, SampleType, ANTENNA_GAIN_COUNT, ANTENNA_GAIN_STEP_DEG, SPEED_OF_LIGHT,
    TIE_POINT_COUNT,
};
use ndarray::Array1;

/// Pattern index of the reference elevation angle
const GAIN_CENTRE_INDEX: i64 = (ANTENNA_GAIN_COUNT as i64 - 1) / 2;

/// Per-sample radiometric correction for one range line
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationVector {
    /// Antenna de-gain times inverse spreading loss, one per range sample
    pub factors: Array1<f64>,
    /// External calibration constant of the calibrated polarisation
    pub calibration_factor: f64,
}

impl CalibrationVector {
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

/// Builds the calibration vector from decoded product annotations
pub struct CalibrationVectorBuilder<'a> {
    attributes: &'a ProductAttributes,
    params: &'a MainProcessingParams,
    geolocation: Option<&'a GeolocationTiePoints>,
    antenna_gain: Option<&'a AntennaGainTable>,
}

impl<'a> CalibrationVectorBuilder<'a> {
    pub fn new(attributes: &'a ProductAttributes, params: &'a MainProcessingParams) -> Self {
        Self {
            attributes,
            params,
            geolocation: None,
            antenna_gain: None,
        }
    }

    pub fn with_geolocation(mut self, geolocation: Option<&'a GeolocationTiePoints>) -> Self {
        self.geolocation = geolocation;
        self
    }

    /// Elevation pattern to remove; `None` means unity gain
    pub fn with_antenna_gain(mut self, antenna_gain: Option<&'a AntennaGainTable>) -> Self {
        self.antenna_gain = antenna_gain;
        self
    }

    /// Scalar calibration constant for the selected measurement data set
    pub fn calibration_factor(&self) -> AsarResult<f64> {
        let idx = self.attributes.mds_index;
        self.params
            .calibration_factors
            .get(idx)
            .map(|f| f.external_calibration_factor)
            .ok_or_else(|| AsarError::Metadata(format!("No calibration factor for MDS{}", idx + 1)))
    }

    pub fn build(&self) -> AsarResult<CalibrationVector> {
        let calibration_factor = self.calibration_factor()?;
        let n_samples = self.attributes.sample_count;

        if self.attributes.sample_type == SampleType::Detected {
            log::debug!("Detected product: unity calibration vector of {} samples", n_samples);
            return Ok(CalibrationVector {
                factors: Array1::ones(n_samples),
                calibration_factor,
            });
        }

        let geolocation = self
            .geolocation
            .ok_or_else(|| AsarError::Metadata("Complex product without a geolocation grid".to_string()))?;
        let satellite = self
            .params
            .orbit_state_vectors
            .first()
            .ok_or_else(|| AsarError::Metadata("No orbit state vectors".to_string()))?;

        let rsr = self.params.range_sampling_rate;
        if rsr.is_nan() || rsr <= 0.0 {
            return Err(AsarError::Metadata(format!("Invalid range sampling rate {}", rsr)));
        }

        let sat_distance = satellite.radius();
        let reference_range = self.params.reference_range;
        let power = self.attributes.range_spreading_power();
        let t0 = geolocation.slant_time_first();

        let mut out_of_pattern = 0usize;
        let mut invalid_angles = 0usize;

        let factors = Array1::from_shape_fn(n_samples, |n| {
            let slant_range = SPEED_OF_LIGHT / 2.0 * (t0 + n as f64 / rsr);

            let gain = match self.antenna_gain {
                Some(table) => {
                    let (lat, lon) = interpolate_tie_point(geolocation, n, n_samples);
                    let target_distance = geodetic_distance(lat, lon, 0.0);
                    let angle = elevation_angle(slant_range, sat_distance, target_distance);
                    if !angle.is_finite() {
                        invalid_angles += 1;
                    }
                    match pattern_index(angle, table.reference_elevation_angle).and_then(|i| table.linear_gain(i)) {
                        Some(g) => g,
                        None => {
                            out_of_pattern += 1;
                            1.0
                        }
                    }
                }
                None => 1.0,
            };

            let spreading_loss = (reference_range / slant_range).powf(power);
            (1.0 / gain) * (1.0 / spreading_loss)
        });

        if invalid_angles > 0 {
            log::warn!(
                "{} of {} samples have no valid elevation angle; using unity gain",
                invalid_angles,
                n_samples
            );
        }
        if out_of_pattern > invalid_angles {
            log::debug!("{} samples fall outside the antenna pattern", out_of_pattern - invalid_angles);
        }
        log::info!(
            "Built calibration vector: {} samples, spreading power {}, calibration factor {}",
            n_samples,
            power,
            calibration_factor
        );

        Ok(CalibrationVector {
            factors,
            calibration_factor,
        })
    }
}

/// Latitude/longitude of range sample `n` by linear interpolation along the tie points
pub fn interpolate_tie_point(geolocation: &GeolocationTiePoints, n: usize, n_samples: usize) -> (f64, f64) {
    let last = (TIE_POINT_COUNT - 1) as f64;
    let position = if n_samples > 1 {
        n as f64 * last / (n_samples - 1) as f64
    } else {
        0.0
    };

    let i0 = (position.floor() as usize).min(TIE_POINT_COUNT - 2);
    let frac = position - i0 as f64;
    let lerp = |v: &[f64; TIE_POINT_COUNT]| v[i0] * (1.0 - frac) + v[i0 + 1] * frac;

    (lerp(&geolocation.latitudes), lerp(&geolocation.longitudes))
}

/// Antenna pattern index of `angle`; `None` when not finite
pub fn pattern_index(angle: f64, reference_angle: f64) -> Option<i64> {
    let steps = ((angle - reference_angle) / ANTENNA_GAIN_STEP_DEG).round();
    if steps.is_finite() {
        Some(steps as i64 + GAIN_CENTRE_INDEX)
    } else {
        None
    }
}

/// Calibration vector for a product with the given annotations
pub fn build_calibration_vector(
    attributes: &ProductAttributes,
    params: &MainProcessingParams,
    geolocation: Option<&GeolocationTiePoints>,
    antenna_gain: Option<&AntennaGainTable>,
) -> AsarResult<CalibrationVector> {
    CalibrationVectorBuilder::new(attributes, params)
        .with_geolocation(geolocation)
        .with_antenna_gain(antenna_gain)
        .build()
}
