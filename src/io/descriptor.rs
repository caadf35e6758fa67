//! Main/specific product headers and the dataset descriptor table

use crate::io::header::{ascii_str, HeaderTokenizer};
use crate::types::{AsarError, AsarResult};
use serde::{Deserialize, Serialize};

/// Size of the main product header (MPH)
pub const MPH_SIZE: usize = 1247;

/// Byte offset of the `SPH_SIZE` field inside the MPH
pub const SPH_SIZE_MARKER_OFFSET: usize = 1104;

/// Width of `SPH_SIZE=+0000000000`
pub const SPH_SIZE_FIELD_LEN: usize = 20;

/// Size of one dataset descriptor (DSD)
pub const DSD_SIZE: usize = 280;

/// Number of descriptors closing the SPH of this product family
pub const DSD_COUNT: usize = 18;

/// Location of one named dataset inside the product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    pub name: String,
    /// `A` annotation, `G` global, `M` measurement, `R` reference
    pub ds_type: Option<char>,
    /// Auxiliary file referenced by this dataset, if any
    pub filename: Option<String>,
    pub offset: u64,
    pub size: u64,
    pub record_count: u64,
    /// Declared bytes per record; `None` when absent or variable
    pub record_size: Option<u64>,
}

impl DatasetDescriptor {
    /// Decode one 280-byte descriptor slice; an all-blank slice is a spare entry
    pub fn parse(slice: &[u8], tokenizer: &HeaderTokenizer) -> AsarResult<Self> {
        if slice.iter().all(|b| b.is_ascii_whitespace() || *b == 0) {
            return Ok(Self::spare());
        }

        let fields = tokenizer.tokenize_bytes(slice)?;
        let context = "dataset descriptor";

        let name = fields.require_text("DS_NAME", context)?.to_string();
        let ctx = format!("dataset descriptor {:?}", name);

        let offset = non_negative(fields.require_integer("DS_OFFSET", &ctx)?, "DS_OFFSET", &name)?;
        let size = non_negative(fields.require_integer("DS_SIZE", &ctx)?, "DS_SIZE", &name)?;
        let record_count = non_negative(fields.require_integer("NUM_DSR", &ctx)?, "NUM_DSR", &name)?;
        // Negative DSR_SIZE marks variable-length records
        let record_size = fields.integer("DSR_SIZE")?.and_then(|v| u64::try_from(v).ok());

        Ok(Self {
            name,
            ds_type: fields.text("DS_TYPE").and_then(|t| t.chars().next()),
            filename: fields.text("FILENAME").map(str::to_string),
            offset,
            size,
            record_count,
            record_size,
        })
    }

    /// Unused descriptor slot
    pub fn spare() -> Self {
        Self {
            name: String::new(),
            ds_type: None,
            filename: None,
            offset: 0,
            size: 0,
            record_count: 0,
            record_size: None,
        }
    }

    /// A dataset with no records or no bytes is absent from this product
    pub fn is_present(&self) -> bool {
        self.record_count > 0 && self.size > 0
    }

    /// Bytes per record derived from the total size
    pub fn derived_record_size(&self) -> Option<u64> {
        if self.record_count == 0 {
            None
        } else {
            Some(self.size / self.record_count)
        }
    }

    /// Slice this dataset out of the full product buffer
    pub fn data<'a>(&self, buffer: &'a [u8]) -> AsarResult<&'a [u8]> {
        let start = usize::try_from(self.offset).ok();
        let end = start.and_then(|s| usize::try_from(self.size).ok().and_then(|n| s.checked_add(n)));

        match (start, end) {
            (Some(start), Some(end)) if end <= buffer.len() => Ok(&buffer[start..end]),
            _ => Err(AsarError::InvalidFormat(format!(
                "Dataset {:?} spans bytes {}..+{} beyond product length {}",
                self.name,
                self.offset,
                self.size,
                buffer.len()
            ))),
        }
    }
}

impl std::fmt::Display for DatasetDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Envisat DSD: \"{}\" offset={} size={} records={}",
            self.name, self.offset, self.size, self.record_count
        )
    }
}

fn non_negative(value: i64, key: &str, name: &str) -> AsarResult<u64> {
    u64::try_from(value).map_err(|_| {
        AsarError::InvalidFormat(format!("Dataset {:?}: negative {} ({})", name, key, value))
    })
}

/// ASCII headers and descriptor table of one product
#[derive(Debug, Clone)]
pub struct ProductHeaders<'a> {
    pub mph: &'a str,
    pub sph: &'a str,
    pub descriptors: Vec<DatasetDescriptor>,
}

impl<'a> ProductHeaders<'a> {
    /// First descriptor named `name`
    pub fn descriptor(&self, name: &str) -> Option<&DatasetDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Text of the SPH before its descriptor table
    pub fn sph_fields_text(&self) -> &'a str {
        let table_len = DSD_SIZE * DSD_COUNT;
        let end = self.sph.len().saturating_sub(table_len);
        &self.sph[..end]
    }
}

/// Read the MPH, SPH and descriptor table from the start of `buffer`
pub fn read_headers<'a>(buffer: &'a [u8], tokenizer: &HeaderTokenizer) -> AsarResult<ProductHeaders<'a>> {
    if buffer.len() < MPH_SIZE {
        return Err(AsarError::InvalidFormat(format!(
            "Product is {} bytes, shorter than the {}-byte main product header",
            buffer.len(),
            MPH_SIZE
        )));
    }

    let mph = ascii_str(&buffer[..MPH_SIZE])?;
    match mph.find("SPH_SIZE") {
        Some(SPH_SIZE_MARKER_OFFSET) => {}
        Some(other) => {
            return Err(AsarError::InvalidFormat(format!(
                "SPH_SIZE marker at byte {}, expected {}",
                other, SPH_SIZE_MARKER_OFFSET
            )))
        }
        None => {
            return Err(AsarError::InvalidFormat(
                "SPH_SIZE marker missing from main product header".to_string(),
            ))
        }
    }

    let marker = &mph[SPH_SIZE_MARKER_OFFSET..SPH_SIZE_MARKER_OFFSET + SPH_SIZE_FIELD_LEN];
    let sph_size = tokenizer
        .tokenize(marker)?
        .require_integer("SPH_SIZE", "main product header")?;
    let sph_size = usize::try_from(sph_size)
        .map_err(|_| AsarError::InvalidFormat(format!("Negative SPH_SIZE {}", sph_size)))?;

    let table_len = DSD_SIZE * DSD_COUNT;
    if sph_size < table_len {
        return Err(AsarError::InvalidFormat(format!(
            "SPH_SIZE {} cannot hold {} descriptors of {} bytes",
            sph_size, DSD_COUNT, DSD_SIZE
        )));
    }
    if buffer.len() < MPH_SIZE + sph_size {
        return Err(AsarError::InvalidFormat(format!(
            "Product is {} bytes, shorter than MPH + SPH ({} bytes)",
            buffer.len(),
            MPH_SIZE + sph_size
        )));
    }

    let sph_bytes = &buffer[MPH_SIZE..MPH_SIZE + sph_size];
    let sph = ascii_str(sph_bytes)?;

    let table = &sph_bytes[sph_size - table_len..];
    let descriptors = table
        .chunks_exact(DSD_SIZE)
        .map(|slice| DatasetDescriptor::parse(slice, tokenizer))
        .collect::<AsarResult<Vec<_>>>()?;

    log::debug!("Read {} dataset descriptors (SPH {} bytes)", descriptors.len(), sph_size);
    for descriptor in &descriptors {
        log::trace!("{}", descriptor);
    }

    Ok(ProductHeaders { mph, sph, descriptors })
}

/// Enumerate the dataset descriptors of a product
pub fn read_descriptor_table(buffer: &[u8]) -> AsarResult<Vec<DatasetDescriptor>> {
    let tokenizer = HeaderTokenizer::new()?;
    Ok(read_headers(buffer, &tokenizer)?.descriptors)
}
