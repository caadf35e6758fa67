//! Product decoding: headers, annotation records and auxiliary files

pub mod aux_lut;
pub(crate) mod be;
pub mod descriptor;
pub mod header;
pub mod mjd;
pub mod product;
pub mod reader;
pub mod records;

pub use aux_lut::{AntennaGainTable, AuxCatalog};
pub use descriptor::{read_descriptor_table, DatasetDescriptor};
pub use mjd::{Epoch, MjdTime};
pub use product::{ProductAttributes, ProductBuffer};
pub use reader::{open_product, AsarProduct, AsarReader};
pub use records::{
    decode_record, decode_records, AnnotationRecord, GeolocationTiePoints, MainProcessingParams,
    SrGrCoefficients, SrGrPolynomial,
};
