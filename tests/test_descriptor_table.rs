mod common;

use asardine::io::descriptor::{read_headers, DSD_COUNT};
use asardine::io::header::HeaderTokenizer;
use asardine::io::mjd::{decode, Epoch, MjdTime};
use asardine::io::records::{decode_record, decode_records, AnnotationRecord};
use asardine::{read_descriptor_table, AsarError, Polarization, ProductAttributes, SampleType};
use chrono::{TimeZone, Utc};
use common::*;

#[test]
fn test_descriptor_table_of_synthetic_product() {
    init_logging();
    let builder = ProductBuilder::default();
    let bytes = builder.build();

    let descriptors = read_descriptor_table(&bytes).expect("Failed to read descriptor table");
    assert_eq!(descriptors.len(), DSD_COUNT);

    println!("Descriptors:");
    for d in &descriptors {
        println!("  {}", d);
    }

    let mpp = &descriptors[1];
    assert_eq!(mpp.name, "MAIN PROCESSING PARAMS ADS");
    assert_eq!(mpp.offset, builder.data_offset());
    assert_eq!((mpp.size, mpp.record_count), (2009, 1));

    let ext = descriptors
        .iter()
        .find(|d| d.name == "EXTERNAL CALIBRATION")
        .expect("external calibration descriptor");
    assert_eq!(ext.filename.as_deref(), Some(AUX_FILE));
    assert_eq!(ext.record_count, 0);
    assert_eq!(ext.record_size, None);

    assert_eq!(descriptors[DSD_COUNT - 1].name, "");
}

#[test]
fn test_product_attributes_from_headers() {
    let bytes = ProductBuilder::default().build();
    let tokenizer = HeaderTokenizer::new().expect("tokenizer");
    let headers = read_headers(&bytes, &tokenizer).expect("headers");
    let attributes = ProductAttributes::from_headers(&headers, &tokenizer).expect("attributes");

    assert_eq!(attributes.product_name, PRODUCT_NAME);
    assert_eq!(attributes.swath, "IS2");
    assert_eq!(attributes.polarization, Polarization::VV);
    assert_eq!(attributes.sample_count, 4);
    assert_eq!(attributes.sample_type, SampleType::Complex);
    assert_eq!(attributes.mds_index, 0);
}

#[test]
fn test_missing_sph_attribute_is_metadata_error() {
    let builder = ProductBuilder {
        polarization: "X/Y",
        ..ProductBuilder::default()
    };
    let bytes = builder.build();
    let tokenizer = HeaderTokenizer::new().expect("tokenizer");
    let headers = read_headers(&bytes, &tokenizer).expect("headers");
    assert!(matches!(
        ProductAttributes::from_headers(&headers, &tokenizer),
        Err(AsarError::Metadata(_))
    ));
}

#[test]
fn test_geolocation_literals_scale_by_micro_degrees() {
    let bytes = ProductBuilder::default().build();
    let descriptors = read_descriptor_table(&bytes).expect("descriptor table");
    let grid = descriptors
        .iter()
        .find(|d| d.name == "GEOLOCATION GRID ADS")
        .expect("geolocation descriptor");

    let Some(AnnotationRecord::GeolocationGrid(tie_points)) = decode_record(grid, &bytes).expect("decode") else {
        panic!("expected a geolocation record");
    };

    // middle of three records
    assert_eq!(tie_points.line_number, 3);
    for i in 0..11 {
        assert_eq!(tie_points.latitudes[i], lat_raw(1, i) as f64 * 1e-6);
        assert_eq!(tie_points.longitudes[i], lon_raw(1, i) as f64 * 1e-6);
    }
    assert_eq!(tie_points.latitudes[0], 1.0);
    assert_eq!(tie_points.slant_time_first_ns, SLANT_TIME_FIRST_NS as f64);
}

#[test]
fn test_decode_records_collects_each_kind() {
    let bytes = ProductBuilder::default().build();
    let descriptors = read_descriptor_table(&bytes).expect("descriptor table");
    let records = decode_records(&descriptors, &bytes).expect("records");

    assert!(records.geolocation.is_some());
    assert!(records.srgr.is_some());
    assert_eq!(records.external_calibration_file.as_deref(), Some(AUX_FILE));
    let mpp = records.main_processing.as_ref().expect("main processing params");
    assert_eq!(mpp.swath_id, "IS2");
    assert_eq!(mpp.calibration_factors.len(), 2);
    assert_eq!(records.measurements.len(), 1);
    assert!(records.measurement(0).is_some());
}

#[test]
fn test_time_codec_epochs_and_order() {
    let t = MjdTime::new(1469, 71_364, 250_000);
    let expected = Utc.with_ymd_and_hms(2004, 1, 9, 19, 49, 24).unwrap() + chrono::Duration::milliseconds(250);
    assert_eq!(t.to_utc(Epoch::Mjd2000), Some(expected));
    assert_eq!(decode(Some(t), Epoch::Mjd2000), decode(Some(t), Epoch::Mjd2000));
    assert_eq!(decode(None, Epoch::Mjd2000), None);

    assert_eq!(
        MjdTime::new(0, 0, 0).to_utc(Epoch::Mjd),
        Some(Utc.with_ymd_and_hms(1858, 11, 17, 0, 0, 0).unwrap())
    );
    assert_ne!(t.to_utc(Epoch::Mjd), t.to_utc(Epoch::Mjd2000));

    let later = MjdTime::new(1469, 71_364, 250_001);
    assert!(later > t);
    assert!(later.to_utc(Epoch::Mjd2000) > t.to_utc(Epoch::Mjd2000));
    assert_eq!(MjdTime::new(i32::MAX, 0, 0).to_utc(Epoch::Mjd2000), None);
}
