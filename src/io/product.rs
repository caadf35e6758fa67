use crate::io::descriptor::ProductHeaders;
use crate::io::header::HeaderTokenizer;
use crate::types::{AsarError, AsarResult, Mission, Polarization, SampleType};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Product suffixes of the Envisat-format family
const PRODUCT_SUFFIXES: [&str; 3] = [".N1", ".E1", ".E2"];

/// Product type whose alternating-polarisation processing uses a fourth-power spreading loss
const ALTERNATING_POLARISATION_TYPE: &str = "ASA_APS_1P";

/// Whole product file held in memory
#[derive(Debug, Clone)]
pub struct ProductBuffer {
    name: String,
    bytes: Vec<u8>,
}

impl ProductBuffer {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Load a product from a plain file, a `.zip` archive holding one, or a gzip stream
    pub fn open<P: AsRef<Path>>(path: P) -> AsarResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AsarError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path.display()),
            )));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let lower = file_name.to_ascii_lowercase();

        let buffer = if lower.ends_with(".zip") {
            Self::read_zip(path)?
        } else if lower.ends_with(".gz") {
            Self::read_gzip(path, &file_name[..file_name.len() - 3])?
        } else {
            Self::from_bytes(file_name, std::fs::read(path)?)
        };

        log::info!("Loaded product {} ({} bytes)", buffer.name, buffer.bytes.len());
        Ok(buffer)
    }

    fn read_zip(path: &Path) -> AsarResult<Self> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)
            .map_err(|e| AsarError::InvalidFormat(format!("Failed to open ZIP: {}", e)))?;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| {
                AsarError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to access file {}: {}", i, e),
                ))
            })?;

            let entry_name = entry.name().to_string();
            let upper = entry_name.to_ascii_uppercase();
            if !PRODUCT_SUFFIXES.iter().any(|s| upper.ends_with(s)) {
                continue;
            }

            log::debug!("Extracting {} from {}", entry_name, path.display());
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes)?;

            let base = entry_name.rsplit('/').next().unwrap_or(&entry_name).to_string();
            return Ok(Self::from_bytes(base, bytes));
        }

        Err(AsarError::InvalidFormat(format!(
            "No .N1/.E1/.E2 product found in {}",
            path.display()
        )))
    }

    fn read_gzip(path: &Path, inner_name: &str) -> AsarResult<Self> {
        use flate2::read::GzDecoder;

        let file = File::open(path)?;
        let mut decoder = GzDecoder::new(file);
        let mut bytes = Vec::new();
        decoder
            .read_to_end(&mut bytes)
            .map_err(|e| AsarError::InvalidFormat(format!("Failed to decompress gzip data: {}", e)))?;

        if bytes.is_empty() {
            return Err(AsarError::InvalidFormat("Decompressed product is empty".to_string()));
        }
        Ok(Self::from_bytes(inner_name, bytes))
    }

    /// Product file name, used to infer the mission
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Product-level attributes the calibration depends on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAttributes {
    /// Full product name, e.g. `ASA_IMS_1PNESA20040109_..._0000.N1`
    pub product_name: String,
    /// Image swath, e.g. `IS2`
    pub swath: String,
    pub polarization: Polarization,
    /// Samples per range line
    pub sample_count: usize,
    pub sample_type: SampleType,
    /// Which measurement data set (0 for MDS1, 1 for MDS2) is calibrated
    pub mds_index: usize,
}

impl ProductAttributes {
    /// Pull the attributes out of the MPH and SPH text
    pub fn from_headers(headers: &ProductHeaders<'_>, tokenizer: &HeaderTokenizer) -> AsarResult<Self> {
        let mph = tokenizer.tokenize(headers.mph)?;
        let sph = tokenizer.tokenize(headers.sph_fields_text())?;

        let product_name = mph
            .text("PRODUCT")
            .ok_or_else(|| AsarError::Metadata("MPH has no PRODUCT field".to_string()))?
            .to_string();
        let swath = sph
            .text("SWATH")
            .ok_or_else(|| AsarError::Metadata("SPH has no SWATH field".to_string()))?
            .to_string();

        let polar = sph
            .text("MDS1_TX_RX_POLAR")
            .ok_or_else(|| AsarError::Metadata("SPH has no MDS1_TX_RX_POLAR field".to_string()))?;
        let polarization = Polarization::from_tx_rx(polar)
            .ok_or_else(|| AsarError::Metadata(format!("Unknown polarization {:?}", polar)))?;

        let sample_count = sph
            .integer("LINE_LENGTH")
            .map_err(|e| AsarError::Metadata(e.to_string()))?
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| AsarError::Metadata("SPH has no valid LINE_LENGTH field".to_string()))?;

        let sample_type_text = sph
            .text("SAMPLE_TYPE")
            .ok_or_else(|| AsarError::Metadata("SPH has no SAMPLE_TYPE field".to_string()))?;
        let sample_type = SampleType::from_attribute(sample_type_text)
            .ok_or_else(|| AsarError::Metadata(format!("Unknown sample type {:?}", sample_type_text)))?;

        Ok(Self {
            product_name,
            swath,
            polarization,
            sample_count,
            sample_type,
            mds_index: 0,
        })
    }

    pub fn mission(&self) -> Option<Mission> {
        Mission::from_product_name(&self.product_name)
    }

    /// Ten-character product type, e.g. `ASA_IMS_1P`
    pub fn product_type(&self) -> &str {
        let end = self
            .product_name
            .char_indices()
            .nth(10)
            .map(|(i, _)| i)
            .unwrap_or(self.product_name.len());
        &self.product_name[..end]
    }

    /// Numeral of the image swath (`IS2` → 2)
    pub fn swath_number(&self) -> AsarResult<u32> {
        self.swath
            .chars()
            .find(|c| c.is_ascii_digit())
            .and_then(|c| c.to_digit(10))
            .filter(|n| *n > 0)
            .ok_or_else(|| AsarError::Metadata(format!("Swath {:?} has no swath numeral", self.swath)))
    }

    /// Exponent of the range spreading-loss compensation
    pub fn range_spreading_power(&self) -> f64 {
        if self.product_type() == ALTERNATING_POLARISATION_TYPE {
            4.0
        } else {
            3.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn attributes(product_name: &str, swath: &str) -> ProductAttributes {
        ProductAttributes {
            product_name: product_name.to_string(),
            swath: swath.to_string(),
            polarization: Polarization::VV,
            sample_count: 4,
            sample_type: SampleType::Complex,
            mds_index: 0,
        }
    }

    #[test]
    fn test_product_type_and_spreading_power() {
        let ims = attributes("ASA_IMS_1PNESA20040109_194924_000000182023_00157_09730_0000.N1", "IS2");
        assert_eq!(ims.product_type(), "ASA_IMS_1P");
        assert_eq!(ims.range_spreading_power(), 3.0);
        assert_eq!(ims.mission(), Some(Mission::Envisat));

        let aps = attributes("ASA_APS_1PNESA20040109_194924_000000182023_00157_09730_0000.N1", "IS2");
        assert_eq!(aps.range_spreading_power(), 4.0);

        assert_eq!(attributes("SHORT", "IS2").product_type(), "SHORT");
    }

    #[test]
    fn test_swath_number() {
        assert_eq!(attributes("x.N1", "IS2").swath_number().unwrap(), 2);
        assert_eq!(attributes("x.N1", "IS7").swath_number().unwrap(), 7);
        assert!(attributes("x.N1", "WS").swath_number().is_err());
        assert!(attributes("x.N1", "IS0").swath_number().is_err());
    }

    #[test]
    fn test_open_plain_zip_and_gzip() {
        let dir = TempDir::new().unwrap();
        let payload = b"MPH bytes".to_vec();

        let plain = dir.path().join("ASA_IMS_TEST.N1");
        std::fs::write(&plain, &payload).unwrap();
        let buffer = ProductBuffer::open(&plain).unwrap();
        assert_eq!(buffer.name(), "ASA_IMS_TEST.N1");
        assert_eq!(buffer.as_bytes(), payload.as_slice());

        let zipped = dir.path().join("product.zip");
        {
            let mut writer = zip::ZipWriter::new(File::create(&zipped).unwrap());
            let options = zip::write::FileOptions::default();
            writer.start_file("README.txt", options).unwrap();
            writer.write_all(b"ignored").unwrap();
            writer.start_file("inner/ASA_IMS_TEST.N1", options).unwrap();
            writer.write_all(&payload).unwrap();
            writer.finish().unwrap();
        }
        let buffer = ProductBuffer::open(&zipped).unwrap();
        assert_eq!(buffer.name(), "ASA_IMS_TEST.N1");
        assert_eq!(buffer.len(), payload.len());

        let gz = dir.path().join("ASA_IMS_TEST.N1.gz");
        {
            let mut encoder = flate2::write::GzEncoder::new(File::create(&gz).unwrap(), flate2::Compression::default());
            encoder.write_all(&payload).unwrap();
            encoder.finish().unwrap();
        }
        let buffer = ProductBuffer::open(&gz).unwrap();
        assert_eq!(buffer.name(), "ASA_IMS_TEST.N1");
        assert_eq!(buffer.as_bytes(), payload.as_slice());
    }

    #[test]
    fn test_open_missing_file() {
        assert!(matches!(ProductBuffer::open("does/not/exist.N1"), Err(AsarError::Io(_))));
    }
}
