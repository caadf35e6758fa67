use crate::config::ReaderConfig;
use crate::core::calibrate::{build_calibration_vector, CalibrationVector};
use crate::io::aux_lut::{load_antenna_gain, AntennaGainTable};
use crate::io::descriptor::{read_headers, DatasetDescriptor, ProductHeaders};
use crate::io::header::HeaderTokenizer;
use crate::io::product::{ProductAttributes, ProductBuffer};
use crate::io::records::{
    decode_records, AnnotationRecords, GeolocationTiePoints, MainProcessingParams, SrGrPolynomial,
};
use crate::types::{AsarError, AsarResult, Mission, SampleType};
use chrono::{DateTime, Duration, Utc};
use ndarray::Array1;
use std::path::Path;

/// Decoded product: annotations plus its calibration vector
#[derive(Debug, Clone)]
pub struct AsarProduct {
    pub attributes: ProductAttributes,
    pub descriptors: Vec<DatasetDescriptor>,
    pub geolocation: Option<GeolocationTiePoints>,
    pub main_processing: MainProcessingParams,
    /// SR/GR conversion, ground range → slant range
    pub srgr: Option<SrGrPolynomial>,
    pub external_calibration_file: Option<String>,
    pub antenna_gain: Option<AntennaGainTable>,
    pub calibration: CalibrationVector,
    /// Raw sample segment of the calibrated measurement data set
    pub measurement: Option<DatasetDescriptor>,
}

impl AsarProduct {
    /// Two-way slant range time of the first sample (s)
    pub fn slant_time_first(&self) -> Option<f64> {
        self.geolocation.as_ref().map(|g| g.slant_time_first())
    }

    /// Incidence angle at the centre tie point (degrees)
    pub fn incidence_angle_centre(&self) -> Option<f64> {
        self.geolocation.as_ref().map(|g| g.incidence_angle_centre)
    }

    pub fn calibration_factor(&self) -> f64 {
        self.calibration.calibration_factor
    }

    pub fn reference_elevation_angle(&self) -> Option<f64> {
        self.antenna_gain.as_ref().map(|t| t.reference_elevation_angle)
    }

    pub fn mission(&self) -> Option<Mission> {
        self.attributes.mission()
    }

    /// Two-way slant range time of every range sample (s)
    pub fn slant_range_times(&self) -> Option<Array1<f64>> {
        let t0 = self.slant_time_first()?;
        let rsr = self.main_processing.range_sampling_rate;
        Some(Array1::from_shape_fn(self.attributes.sample_count, |n| t0 + n as f64 / rsr))
    }

    /// Zero-Doppler time of every output line, spread evenly from first to last
    pub fn azimuth_times(&self) -> Vec<DateTime<Utc>> {
        let first = self.main_processing.first_zero_doppler_time;
        let last = self.main_processing.last_zero_doppler_time;
        let lines = self.main_processing.num_output_lines as i64;
        if lines <= 1 {
            return vec![first; lines.max(0) as usize];
        }

        let span = (last - first).num_microseconds().unwrap_or(0);
        (0..lines)
            .map(|i| first + Duration::microseconds(span * i / (lines - 1)))
            .collect()
    }
}

/// Opens Envisat/ERS products and derives their calibration
pub struct AsarReader {
    config: ReaderConfig,
    tokenizer: HeaderTokenizer,
}

impl AsarReader {
    pub fn new(config: ReaderConfig) -> AsarResult<Self> {
        Ok(Self {
            config,
            tokenizer: HeaderTokenizer::new()?,
        })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Open a product file (plain, `.zip` or `.gz`)
    pub fn open<P: AsRef<Path>>(&self, path: P) -> AsarResult<AsarProduct> {
        let buffer = ProductBuffer::open(path)?;
        self.read(&buffer)
    }

    /// Decode an in-memory product, taking its attributes from the MPH/SPH
    pub fn read(&self, buffer: &ProductBuffer) -> AsarResult<AsarProduct> {
        let headers = read_headers(buffer.as_bytes(), &self.tokenizer)?;
        let attributes = ProductAttributes::from_headers(&headers, &self.tokenizer)?;
        self.decode(buffer.as_bytes(), headers, attributes)
    }

    /// Decode an in-memory product with caller-supplied attributes
    pub fn read_with_attributes(&self, buffer: &ProductBuffer, attributes: ProductAttributes) -> AsarResult<AsarProduct> {
        let headers = read_headers(buffer.as_bytes(), &self.tokenizer)?;
        self.decode(buffer.as_bytes(), headers, attributes)
    }

    fn decode(&self, bytes: &[u8], headers: ProductHeaders<'_>, attributes: ProductAttributes) -> AsarResult<AsarProduct> {
        let descriptors = headers.descriptors;

        log::info!(
            "Reading {} ({} swath {}, {} {:?} samples)",
            attributes.product_name,
            attributes.product_type(),
            attributes.swath,
            attributes.sample_count,
            attributes.sample_type
        );

        let AnnotationRecords {
            geolocation,
            external_calibration_file,
            srgr,
            main_processing,
            measurements,
        } = decode_records(&descriptors, bytes)?;

        let main_processing = main_processing.ok_or_else(|| {
            AsarError::Metadata("Product has no main processing parameters record".to_string())
        })?;

        let antenna_gain = self.antenna_gain(&attributes, &main_processing, external_calibration_file.as_deref())?;

        let calibration =
            build_calibration_vector(&attributes, &main_processing, geolocation.as_ref(), antenna_gain.as_ref())?;

        let measurement_name = format!("MDS{}", attributes.mds_index + 1);
        let measurement = measurements.into_iter().find(|d| d.name == measurement_name);
        if measurement.is_none() {
            log::warn!("No {} data set in {}", measurement_name, attributes.product_name);
        }

        Ok(AsarProduct {
            attributes,
            descriptors,
            geolocation,
            main_processing,
            srgr,
            external_calibration_file,
            antenna_gain,
            calibration,
            measurement,
        })
    }

    fn antenna_gain(
        &self,
        attributes: &ProductAttributes,
        params: &MainProcessingParams,
        filename: Option<&str>,
    ) -> AsarResult<Option<AntennaGainTable>> {
        if !self.config.apply_antenna_gain || attributes.sample_type == SampleType::Detected {
            return Ok(None);
        }

        let Some(filename) = filename else {
            log::warn!("No external calibration file referenced; using unity antenna gain");
            return Ok(None);
        };
        let Some(mission) = attributes.mission() else {
            log::warn!(
                "Cannot infer mission from {:?}; using unity antenna gain",
                attributes.product_name
            );
            return Ok(None);
        };

        let swath_number = match attributes.swath_number() {
            Ok(n) => n,
            Err(e) => {
                log::warn!("{}; using unity antenna gain", e);
                return Ok(None);
            }
        };

        load_antenna_gain(
            &self.config.aux_root,
            mission,
            filename,
            swath_number,
            attributes.polarization,
            params.antenna_elevation_corrected,
        )
    }
}

/// Open `path` with the default configuration
pub fn open_product<P: AsRef<Path>>(path: P) -> AsarResult<AsarProduct> {
    AsarReader::new(ReaderConfig::default())?.open(path)
}
