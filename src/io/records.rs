//! Fixed-layout decoders for the annotation data sets used by calibration

use crate::io::be::BeCursor;
use crate::io::descriptor::DatasetDescriptor;
use crate::io::mjd::Epoch;
use crate::types::{AsarError, AsarResult, OrbitStateVector, TIE_POINT_COUNT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Byte layouts of the decoded records. All fields are big-endian.
pub mod layout {
    pub const GEOLOCATION_GRID_NAME: &str = "GEOLOCATION GRID ADS";
    pub const EXTERNAL_CALIBRATION_NAME: &str = "EXTERNAL CALIBRATION";
    pub const SRGR_NAME: &str = "SR GR ADS";
    pub const MAIN_PROCESSING_PARAMS_NAME: &str = "MAIN PROCESSING PARAMS ADS";
    pub const MEASUREMENT_PREFIX: &str = "MDS";

    pub const GEOLOCATION_RECORD_SIZE: usize = 521;
    /// MJD time (12), attach flag (1), line number (4), line count (4), sub-satellite track (4)
    pub const GEOLOCATION_HEADER_SIZE: usize = 25;
    /// One block of 11 four-byte tie-point values
    pub const GEOLOCATION_BLOCK_SIZE: usize = super::TIE_POINT_COUNT * 4;
    pub const GEOLOCATION_SAMPLE_NUMBERS: usize = GEOLOCATION_HEADER_SIZE;
    pub const GEOLOCATION_SLANT_TIMES: usize = GEOLOCATION_HEADER_SIZE + GEOLOCATION_BLOCK_SIZE;
    pub const GEOLOCATION_ANGLES: usize = GEOLOCATION_HEADER_SIZE + 2 * GEOLOCATION_BLOCK_SIZE;
    pub const GEOLOCATION_LATITUDES: usize = GEOLOCATION_HEADER_SIZE + 3 * GEOLOCATION_BLOCK_SIZE;
    pub const GEOLOCATION_LONGITUDES: usize = GEOLOCATION_HEADER_SIZE + 4 * GEOLOCATION_BLOCK_SIZE;
    /// Raw latitude/longitude unit (degrees)
    pub const GEOLOCATION_LATLON_SCALE: f64 = 1e-6;

    /// MJD time (12), attach flag (1), slant range time (4), ground range origin (4),
    /// five coefficients (20), spare (14)
    pub const SRGR_RECORD_SIZE: usize = 55;
    /// Slant range time (4), ground range origin (4), five coefficients (20)
    pub const SRGR_SINGLE_SIZE: usize = 28;
    pub const SRGR_COEFFICIENT_COUNT: usize = 5;

    pub const MPP_RECORD_SIZE: usize = 2009;
    /// Scalar head followed by sigma-nought and gamma calibration vectors
    pub const MPP_EXTENDED_RECORD_SIZE: usize = 10069;
    pub const MPP_EXTENDED_HEAD_SIZE: usize = 2029;
    pub const MPP_CALIBRATION_VECTOR_SIZE: usize = 4020;
    pub const MPP_FIRST_ZERO_DOPPLER_TIME: usize = 0;
    pub const MPP_LAST_ZERO_DOPPLER_TIME: usize = 13;
    pub const MPP_SWATH_ID: usize = 41;
    pub const MPP_RANGE_SPACING: usize = 44;
    pub const MPP_AZIMUTH_SPACING: usize = 48;
    pub const MPP_LINE_TIME_INTERVAL: usize = 52;
    pub const MPP_NUM_OUTPUT_LINES: usize = 56;
    pub const MPP_NUM_SAMPLES_PER_LINE: usize = 60;
    pub const MPP_DATA_TYPE: usize = 64;
    pub const MPP_ANT_ELEV_CORR_FLAG: usize = 121;
    pub const MPP_RANGE_SPREAD_COMP_FLAG: usize = 126;
    pub const MPP_DETECTED_FLAG: usize = 127;
    pub const MPP_RANGE_REF: usize = 985;
    pub const MPP_RANGE_SAMP_RATE: usize = 1033;
    pub const MPP_RADAR_FREQ: usize = 1037;
    /// Two {processor scaling factor, external calibration factor} f32 pairs
    pub const MPP_CALIBRATION_FACTORS: usize = 1085;
    pub const MPP_CALIBRATION_FACTOR_COUNT: usize = 2;
    /// Five state vectors: MJD time (12), x/y/z (i32, 1e-2 m), vx/vy/vz (i32, 1e-5 m/s)
    pub const MPP_ORBIT_STATE_VECTORS: usize = 1789;
    pub const MPP_ORBIT_STATE_VECTOR_SIZE: usize = 36;
    pub const MPP_ORBIT_STATE_VECTOR_COUNT: usize = 5;
    /// Raw position counts per metre
    pub const MPP_POSITION_DIVISOR: f64 = 1e2;
    /// Raw velocity counts per m/s
    pub const MPP_VELOCITY_DIVISOR: f64 = 1e5;
}

use layout::*;

/// Tie points of the time-centre geolocation grid record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeolocationTiePoints {
    pub zero_doppler_time: DateTime<Utc>,
    pub attach_flag: bool,
    pub line_number: u32,
    pub line_count: u32,
    pub sub_satellite_track: f64,
    /// 1-based range sample of each tie point
    pub sample_numbers: [u32; TIE_POINT_COUNT],
    pub latitudes: [f64; TIE_POINT_COUNT],
    pub longitudes: [f64; TIE_POINT_COUNT],
    /// Two-way slant range time of the first tie point (ns)
    pub slant_time_first_ns: f64,
    /// Incidence angle at the centre tie point (degrees)
    pub incidence_angle_centre: f64,
}

impl GeolocationTiePoints {
    /// Two-way slant range time of the first sample (s)
    pub fn slant_time_first(&self) -> f64 {
        self.slant_time_first_ns * 1e-9
    }
}

/// One slant/ground range conversion polynomial.
///
/// Annotated as slant→ground, the coefficients are evaluated here in the
/// direction the processor applies them: ground range in, slant range out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrGrCoefficients {
    /// Two-way slant range time of the reference point (ns)
    pub slant_range_time: f64,
    /// Ground range origin (m)
    pub ground_range_origin: f64,
    pub coefficients: [f64; SRGR_COEFFICIENT_COUNT],
}

impl SrGrCoefficients {
    /// Slant range (m) at `ground_range` (m)
    pub fn slant_range_at(&self, ground_range: f64) -> f64 {
        let x = ground_range - self.ground_range_origin;
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * x + c)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrGrEntry {
    pub zero_doppler_time: DateTime<Utc>,
    pub attach_flag: bool,
    pub polynomial: SrGrCoefficients,
}

/// The two SR/GR layouts a product may carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SrGrPolynomial {
    Single(SrGrCoefficients),
    TimeSeries(Vec<SrGrEntry>),
}

impl SrGrPolynomial {
    /// Polynomial in effect at `time`: the last entry not after it, else the first
    pub fn at(&self, time: DateTime<Utc>) -> Option<&SrGrCoefficients> {
        match self {
            SrGrPolynomial::Single(coefficients) => Some(coefficients),
            SrGrPolynomial::TimeSeries(entries) => entries
                .iter()
                .take_while(|e| e.zero_doppler_time <= time)
                .last()
                .or_else(|| entries.first())
                .map(|e| &e.polynomial),
        }
    }

    pub fn coefficient_sets(&self) -> Vec<&SrGrCoefficients> {
        match self {
            SrGrPolynomial::Single(coefficients) => vec![coefficients],
            SrGrPolynomial::TimeSeries(entries) => entries.iter().map(|e| &e.polynomial).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFactors {
    pub processor_scaling_factor: f64,
    pub external_calibration_factor: f64,
}

/// Scalar processing parameters and orbit state vectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainProcessingParams {
    pub first_zero_doppler_time: DateTime<Utc>,
    pub last_zero_doppler_time: DateTime<Utc>,
    pub swath_id: String,
    pub range_spacing: f64,
    pub azimuth_spacing: f64,
    pub line_time_interval: f64,
    pub num_output_lines: u32,
    pub num_samples_per_line: u32,
    pub data_type: String,
    /// Antenna elevation pattern already removed by the processor
    pub antenna_elevation_corrected: bool,
    pub range_spreading_compensated: bool,
    pub detected: bool,
    /// Range spreading loss reference range (m)
    pub reference_range: f64,
    /// Range sampling rate (Hz)
    pub range_sampling_rate: f64,
    /// Radar frequency (Hz)
    pub radar_frequency: f64,
    /// One entry per measurement data set polarisation
    pub calibration_factors: Vec<CalibrationFactors>,
    pub orbit_state_vectors: Vec<OrbitStateVector>,
    /// Raw calibration vectors carried by the extended record layout
    pub calibration_vectors: Option<CalibrationVectorBlocks>,
}

/// Undecoded sigma-nought and gamma vector blocks of an extended record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationVectorBlocks {
    pub sigma: Vec<u8>,
    pub gamma: Vec<u8>,
}

/// Decoded annotation data set, one variant per kind
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationRecord {
    GeolocationGrid(GeolocationTiePoints),
    ExternalCalibration { filename: String },
    SrGr(SrGrPolynomial),
    MainProcessingParams(MainProcessingParams),
    /// Raw sample segment; located but not decoded
    Measurement(DatasetDescriptor),
}

/// Which decoder handles a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    GeolocationGrid,
    ExternalCalibration,
    SrGr,
    MainProcessingParams,
    Measurement,
}

impl RecordKind {
    pub fn from_descriptor_name(name: &str) -> Option<Self> {
        match name {
            GEOLOCATION_GRID_NAME => Some(RecordKind::GeolocationGrid),
            EXTERNAL_CALIBRATION_NAME => Some(RecordKind::ExternalCalibration),
            SRGR_NAME => Some(RecordKind::SrGr),
            MAIN_PROCESSING_PARAMS_NAME => Some(RecordKind::MainProcessingParams),
            n if is_measurement_name(n) => Some(RecordKind::Measurement),
            _ => None,
        }
    }
}

/// `MDS1`, `MDS2`, ... but not `MDS1 SQ ADS`
fn is_measurement_name(name: &str) -> bool {
    name.strip_prefix(MEASUREMENT_PREFIX)
        .map_or(false, |rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

/// Decode the dataset behind `descriptor`.
///
/// Unrecognised and absent datasets yield `Ok(None)`.
pub fn decode_record(descriptor: &DatasetDescriptor, buffer: &[u8]) -> AsarResult<Option<AnnotationRecord>> {
    let Some(kind) = RecordKind::from_descriptor_name(&descriptor.name) else {
        return Ok(None);
    };

    let record = match kind {
        // Reference datasets carry a filename and no bytes
        RecordKind::ExternalCalibration => descriptor
            .filename
            .clone()
            .map(|filename| AnnotationRecord::ExternalCalibration { filename }),
        _ if !descriptor.is_present() => {
            log::debug!("Dataset {:?} absent from product", descriptor.name);
            None
        }
        RecordKind::GeolocationGrid => Some(AnnotationRecord::GeolocationGrid(decode_geolocation_grid(
            descriptor, buffer,
        )?)),
        RecordKind::SrGr => Some(AnnotationRecord::SrGr(decode_srgr(descriptor, buffer)?)),
        RecordKind::MainProcessingParams => Some(AnnotationRecord::MainProcessingParams(
            decode_main_processing_params(descriptor, buffer)?,
        )),
        RecordKind::Measurement => {
            descriptor.data(buffer)?;
            Some(AnnotationRecord::Measurement(descriptor.clone()))
        }
    };
    Ok(record)
}

fn unsupported(descriptor: &DatasetDescriptor, reason: String) -> AsarError {
    AsarError::UnsupportedVariant {
        dataset: descriptor.name.clone(),
        reason,
    }
}

fn wrong_record_size(descriptor: &DatasetDescriptor, found: u64, expected: usize) -> AsarError {
    AsarError::InvalidFormat(format!(
        "Dataset {:?}: record size {} (expected {})",
        descriptor.name, found, expected
    ))
}

/// Decode the time-centre record of the geolocation grid
pub fn decode_geolocation_grid(descriptor: &DatasetDescriptor, buffer: &[u8]) -> AsarResult<GeolocationTiePoints> {
    let record_size = descriptor.derived_record_size().unwrap_or(0);
    if record_size != GEOLOCATION_RECORD_SIZE as u64 {
        return Err(wrong_record_size(descriptor, record_size, GEOLOCATION_RECORD_SIZE));
    }

    let data = descriptor.data(buffer)?;
    let middle = (descriptor.record_count / 2) as usize;
    let start = middle * GEOLOCATION_RECORD_SIZE;
    let record = &data[start..start + GEOLOCATION_RECORD_SIZE];

    let mut cursor = BeCursor::new(record, "geolocation grid record");
    let zero_doppler_time = cursor.utc(Epoch::Mjd2000)?;
    let attach_flag = cursor.flag()?;
    let line_number = cursor.u32()?;
    let line_count = cursor.u32()?;
    let sub_satellite_track = cursor.f32()? as f64;

    let mut sample_numbers = [0u32; TIE_POINT_COUNT];
    cursor.seek(GEOLOCATION_SAMPLE_NUMBERS);
    for value in sample_numbers.iter_mut() {
        *value = cursor.u32()?;
    }

    let slant_time_first_ns = cursor.seek(GEOLOCATION_SLANT_TIMES).f32()? as f64;
    let incidence_angle_centre = cursor
        .seek(GEOLOCATION_ANGLES + (TIE_POINT_COUNT / 2) * 4)
        .f32()? as f64;

    let mut latitudes = [0.0; TIE_POINT_COUNT];
    cursor.seek(GEOLOCATION_LATITUDES);
    for value in latitudes.iter_mut() {
        *value = cursor.i32()? as f64 * GEOLOCATION_LATLON_SCALE;
    }

    let mut longitudes = [0.0; TIE_POINT_COUNT];
    cursor.seek(GEOLOCATION_LONGITUDES);
    for value in longitudes.iter_mut() {
        *value = cursor.i32()? as f64 * GEOLOCATION_LATLON_SCALE;
    }

    log::debug!(
        "Geolocation grid: record {}/{} line {} slant time {:.1} ns, centre incidence {:.3} deg",
        middle,
        descriptor.record_count,
        line_number,
        slant_time_first_ns,
        incidence_angle_centre
    );

    Ok(GeolocationTiePoints {
        zero_doppler_time,
        attach_flag,
        line_number,
        line_count,
        sub_satellite_track,
        sample_numbers,
        latitudes,
        longitudes,
        slant_time_first_ns,
        incidence_angle_centre,
    })
}

fn read_srgr_coefficients(cursor: &mut BeCursor<'_>) -> AsarResult<SrGrCoefficients> {
    let slant_range_time = cursor.f32()? as f64;
    let ground_range_origin = cursor.f32()? as f64;
    let mut coefficients = [0.0; SRGR_COEFFICIENT_COUNT];
    for c in coefficients.iter_mut() {
        *c = cursor.f32()? as f64;
    }
    Ok(SrGrCoefficients {
        slant_range_time,
        ground_range_origin,
        coefficients,
    })
}

/// Decode either SR/GR layout, selected from the descriptor size and count
pub fn decode_srgr(descriptor: &DatasetDescriptor, buffer: &[u8]) -> AsarResult<SrGrPolynomial> {
    let count = descriptor.record_count;
    let size = descriptor.size;

    if count.checked_mul(SRGR_RECORD_SIZE as u64) == Some(size) {
        let data = descriptor.data(buffer)?;
        let entries = data
            .chunks_exact(SRGR_RECORD_SIZE)
            .map(|chunk| {
                let mut cursor = BeCursor::new(chunk, "SR/GR record");
                let zero_doppler_time = cursor.utc(Epoch::Mjd2000)?;
                let attach_flag = cursor.flag()?;
                let polynomial = read_srgr_coefficients(&mut cursor)?;
                Ok(SrGrEntry {
                    zero_doppler_time,
                    attach_flag,
                    polynomial,
                })
            })
            .collect::<AsarResult<Vec<_>>>()?;
        log::debug!("SR/GR: {} time-indexed polynomials", entries.len());
        Ok(SrGrPolynomial::TimeSeries(entries))
    } else if count == 1 && size == SRGR_SINGLE_SIZE as u64 {
        let data = descriptor.data(buffer)?;
        let coefficients = read_srgr_coefficients(&mut BeCursor::new(data, "SR/GR record"))?;
        log::debug!("SR/GR: single polynomial");
        Ok(SrGrPolynomial::Single(coefficients))
    } else {
        Err(unsupported(
            descriptor,
            format!("{} bytes in {} records matches no SR/GR layout", size, count),
        ))
    }
}

fn read_state_vector(cursor: &mut BeCursor<'_>) -> AsarResult<OrbitStateVector> {
    let time = cursor.utc(Epoch::Mjd2000)?;
    let mut position = [0.0; 3];
    for p in position.iter_mut() {
        *p = cursor.i32()? as f64 / MPP_POSITION_DIVISOR;
    }
    let mut velocity = [0.0; 3];
    for v in velocity.iter_mut() {
        *v = cursor.i32()? as f64 / MPP_VELOCITY_DIVISOR;
    }
    Ok(OrbitStateVector { time, position, velocity })
}

/// Decode the first main processing parameters record.
///
/// Both the plain 2009-byte record and the 10069-byte record carrying
/// calibration vectors are accepted; other sizes are an unsupported variant.
pub fn decode_main_processing_params(descriptor: &DatasetDescriptor, buffer: &[u8]) -> AsarResult<MainProcessingParams> {
    let record_size = descriptor.derived_record_size().unwrap_or(0);
    let extended = match usize::try_from(record_size) {
        Ok(MPP_RECORD_SIZE) => false,
        Ok(MPP_EXTENDED_RECORD_SIZE) => true,
        _ => {
            return Err(unsupported(
                descriptor,
                format!(
                    "record size {} (expected {} or {})",
                    record_size, MPP_RECORD_SIZE, MPP_EXTENDED_RECORD_SIZE
                ),
            ))
        }
    };

    let data = descriptor.data(buffer)?;
    let calibration_vectors = extended.then(|| {
        let sigma_end = MPP_EXTENDED_HEAD_SIZE + MPP_CALIBRATION_VECTOR_SIZE;
        CalibrationVectorBlocks {
            sigma: data[MPP_EXTENDED_HEAD_SIZE..sigma_end].to_vec(),
            gamma: data[sigma_end..sigma_end + MPP_CALIBRATION_VECTOR_SIZE].to_vec(),
        }
    });

    let record = &data[..MPP_RECORD_SIZE];
    let mut c = BeCursor::new(record, "main processing params record");

    let first_zero_doppler_time = c.seek(MPP_FIRST_ZERO_DOPPLER_TIME).utc(Epoch::Mjd2000)?;
    let last_zero_doppler_time = c.seek(MPP_LAST_ZERO_DOPPLER_TIME).utc(Epoch::Mjd2000)?;
    let swath_id = c.seek(MPP_SWATH_ID).ascii(3)?;
    let range_spacing = c.seek(MPP_RANGE_SPACING).f32()? as f64;
    let azimuth_spacing = c.seek(MPP_AZIMUTH_SPACING).f32()? as f64;
    let line_time_interval = c.seek(MPP_LINE_TIME_INTERVAL).f32()? as f64;
    let num_output_lines = c.seek(MPP_NUM_OUTPUT_LINES).u32()?;
    let num_samples_per_line = c.seek(MPP_NUM_SAMPLES_PER_LINE).u32()?;
    let data_type = c.seek(MPP_DATA_TYPE).ascii(5)?;
    let antenna_elevation_corrected = c.seek(MPP_ANT_ELEV_CORR_FLAG).flag()?;
    let range_spreading_compensated = c.seek(MPP_RANGE_SPREAD_COMP_FLAG).flag()?;
    let detected = c.seek(MPP_DETECTED_FLAG).flag()?;
    let reference_range = c.seek(MPP_RANGE_REF).f32()? as f64;
    let range_sampling_rate = c.seek(MPP_RANGE_SAMP_RATE).f32()? as f64;
    let radar_frequency = c.seek(MPP_RADAR_FREQ).f32()? as f64;

    c.seek(MPP_CALIBRATION_FACTORS);
    let calibration_factors = (0..MPP_CALIBRATION_FACTOR_COUNT)
        .map(|_| {
            Ok(CalibrationFactors {
                processor_scaling_factor: c.f32()? as f64,
                external_calibration_factor: c.f32()? as f64,
            })
        })
        .collect::<AsarResult<Vec<_>>>()?;

    c.seek(MPP_ORBIT_STATE_VECTORS);
    let orbit_state_vectors = (0..MPP_ORBIT_STATE_VECTOR_COUNT)
        .map(|_| read_state_vector(&mut c))
        .collect::<AsarResult<Vec<_>>>()?;

    log::debug!(
        "Main processing params: swath {} rsr {:.1} Hz, ref range {:.1} m, {} state vectors{}",
        swath_id,
        range_sampling_rate,
        reference_range,
        orbit_state_vectors.len(),
        if extended { ", with calibration vectors" } else { "" }
    );

    Ok(MainProcessingParams {
        first_zero_doppler_time,
        last_zero_doppler_time,
        swath_id,
        range_spacing,
        azimuth_spacing,
        line_time_interval,
        num_output_lines,
        num_samples_per_line,
        data_type,
        antenna_elevation_corrected,
        range_spreading_compensated,
        detected,
        reference_range,
        range_sampling_rate,
        radar_frequency,
        calibration_factors,
        orbit_state_vectors,
        calibration_vectors,
    })
}

/// Decoded records of one product, at most one per kind
#[derive(Debug, Clone, Default)]
pub struct AnnotationRecords {
    pub geolocation: Option<GeolocationTiePoints>,
    pub external_calibration_file: Option<String>,
    pub srgr: Option<SrGrPolynomial>,
    pub main_processing: Option<MainProcessingParams>,
    pub measurements: Vec<DatasetDescriptor>,
}

impl AnnotationRecords {
    fn insert(&mut self, record: AnnotationRecord) {
        match record {
            AnnotationRecord::GeolocationGrid(g) => self.geolocation = Some(g),
            AnnotationRecord::ExternalCalibration { filename } => self.external_calibration_file = Some(filename),
            AnnotationRecord::SrGr(p) => self.srgr = Some(p),
            AnnotationRecord::MainProcessingParams(m) => self.main_processing = Some(m),
            AnnotationRecord::Measurement(d) => self.measurements.push(d),
        }
    }

    /// Measurement data set `MDS{index + 1}`
    pub fn measurement(&self, index: usize) -> Option<&DatasetDescriptor> {
        let name = format!("{}{}", MEASUREMENT_PREFIX, index + 1);
        self.measurements.iter().find(|d| d.name == name)
    }
}

/// Decode every recognised descriptor.
///
/// An unsupported layout drops only that record; any other failure aborts.
pub fn decode_records(descriptors: &[DatasetDescriptor], buffer: &[u8]) -> AsarResult<AnnotationRecords> {
    let mut records = AnnotationRecords::default();

    for descriptor in descriptors {
        match decode_record(descriptor, buffer) {
            Ok(Some(record)) => records.insert(record),
            Ok(None) => {}
            Err(AsarError::UnsupportedVariant { dataset, reason }) => {
                log::warn!("Skipping {}: unsupported layout ({})", dataset, reason);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(records)
}
