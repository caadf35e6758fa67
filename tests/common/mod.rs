//! Synthetic Envisat products and auxiliary files for integration tests
#![allow(dead_code)]

use asardine::io::aux_lut::{AUX_FILE_MIN_SIZE, GADS_OFFSET, POLARIZATION_COUNT, SWATH_COUNT};
use asardine::io::descriptor::{DSD_COUNT, DSD_SIZE, MPH_SIZE, SPH_SIZE_MARKER_OFFSET};
use asardine::io::records::layout::*;
use asardine::types::{ANTENNA_GAIN_COUNT, TIE_POINT_COUNT};
use std::path::{Path, PathBuf};

pub const PRODUCT_NAME: &str = "ASA_IMS_1PNESA20040109_194924_000000182023_00157_09730_0000.N1";
pub const AUX_FILE: &str = "ASA_XCA_AXVIEC20031209_000000_20030211_000000_20041231_000000";

pub const SPH_PREFIX: usize = 512;
pub const GRID_RECORDS: u64 = 3;
pub const LINES: u32 = 4;

pub const REFERENCE_RANGE: f32 = 800_000.0;
pub const RANGE_SAMPLING_RATE: f32 = 19_207_680.0;
pub const EXTERNAL_CALIBRATION: [f32; 2] = [52_000.0, 61_000.0];
/// Satellite x position, 1e-2 m
pub const SATELLITE_X_RAW: i32 = 716_000_000;
pub const SLANT_TIME_FIRST_NS: f32 = 5_700_000.0;
pub const REFERENCE_ANGLES: [f32; SWATH_COUNT] = [18.0, 22.0, 26.0, 29.0, 32.0, 35.0, 38.0];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Raw latitude of tie point `i` in record `record` (1e-6 deg)
pub fn lat_raw(record: u64, i: usize) -> i32 {
    1_000_000 + 100_000 * i as i32 + 7_000_000 * (record as i32 - 1)
}

/// Raw longitude of tie point `i` in record `record` (1e-6 deg)
pub fn lon_raw(record: u64, i: usize) -> i32 {
    -50_000 * i as i32 + 3_000_000 * (record as i32 - 1)
}

pub fn incidence_angle(i: usize) -> f32 {
    19.0 + 0.5 * i as f32
}

/// Pattern value (dB) for swath index `s`, polarisation index `p`, sample `k`
pub fn gain_db(s: usize, p: usize, k: usize) -> f32 {
    -0.02 * k as f32 - s as f32 - 0.1 * p as f32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SrGrShape {
    Single,
    TimeSeries(u64),
    Unsupported,
}

#[derive(Debug, Clone)]
pub struct ProductBuilder {
    pub product_name: String,
    pub swath: &'static str,
    pub polarization: &'static str,
    pub sample_type: &'static str,
    pub sample_count: usize,
    pub antenna_elevation_corrected: bool,
    pub srgr: SrGrShape,
    pub geolocation: bool,
    pub main_processing: bool,
    pub main_processing_size: usize,
}

impl Default for ProductBuilder {
    fn default() -> Self {
        Self {
            product_name: PRODUCT_NAME.to_string(),
            swath: "IS2",
            polarization: "V/V",
            sample_type: "COMPLEX ",
            sample_count: 4,
            antenna_elevation_corrected: false,
            srgr: SrGrShape::Single,
            geolocation: true,
            main_processing: true,
            main_processing_size: MPP_RECORD_SIZE,
        }
    }
}

fn put_f32(buf: &mut [u8], off: usize, v: f32) {
    buf[off..off + 4].copy_from_slice(&v.to_be_bytes());
}

fn put_i32(buf: &mut [u8], off: usize, v: i32) {
    buf[off..off + 4].copy_from_slice(&v.to_be_bytes());
}

fn put_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_be_bytes());
}

fn put_mjd(buf: &mut [u8], off: usize, days: i32, seconds: u32, micros: u32) {
    put_i32(buf, off, days);
    put_u32(buf, off + 4, seconds);
    put_u32(buf, off + 8, micros);
}

pub fn dsd(name: &str, ds_type: char, filename: &str, offset: u64, size: u64, count: u64) -> Vec<u8> {
    let text = format!(
        "DS_NAME=\"{:<28}\"\nDS_TYPE={}\nFILENAME=\"{:<62}\"\nDS_OFFSET=+{:020}<bytes>\nDS_SIZE=+{:020}<bytes>\nNUM_DSR=+{:010}\nDSR_SIZE={:+011}<bytes>\n",
        name,
        ds_type,
        filename,
        offset,
        size,
        count,
        if count > 0 { (size / count) as i64 } else { -1 }
    );
    let mut bytes = text.into_bytes();
    bytes.resize(DSD_SIZE - 1, b' ');
    bytes.push(b'\n');
    bytes
}

impl ProductBuilder {
    pub fn sph_size(&self) -> usize {
        SPH_PREFIX + DSD_SIZE * DSD_COUNT
    }

    pub fn data_offset(&self) -> u64 {
        (MPH_SIZE + self.sph_size()) as u64
    }

    fn main_processing_record(&self) -> Vec<u8> {
        let mut rec = vec![0u8; self.main_processing_size];
        put_mjd(&mut rec, MPP_FIRST_ZERO_DOPPLER_TIME, 1469, 71_364, 250_000);
        put_mjd(&mut rec, MPP_LAST_ZERO_DOPPLER_TIME, 1469, 71_364, 252_400);
        rec[MPP_SWATH_ID..MPP_SWATH_ID + 3].copy_from_slice(self.swath.as_bytes());
        put_f32(&mut rec, MPP_RANGE_SPACING, 7.8);
        put_f32(&mut rec, MPP_AZIMUTH_SPACING, 4.0);
        put_f32(&mut rec, MPP_LINE_TIME_INTERVAL, 0.0008);
        put_u32(&mut rec, MPP_NUM_OUTPUT_LINES, LINES);
        put_u32(&mut rec, MPP_NUM_SAMPLES_PER_LINE, self.sample_count as u32);
        rec[MPP_DATA_TYPE..MPP_DATA_TYPE + 5].copy_from_slice(b"SWORD");
        rec[MPP_ANT_ELEV_CORR_FLAG] = self.antenna_elevation_corrected as u8;
        rec[MPP_DETECTED_FLAG] = self.sample_type.starts_with("DETECTED") as u8;
        put_f32(&mut rec, MPP_RANGE_REF, REFERENCE_RANGE);
        put_f32(&mut rec, MPP_RANGE_SAMP_RATE, RANGE_SAMPLING_RATE);
        put_f32(&mut rec, MPP_RADAR_FREQ, 5.331e9);
        for (i, ext) in EXTERNAL_CALIBRATION.iter().enumerate() {
            put_f32(&mut rec, MPP_CALIBRATION_FACTORS + i * 8, 1.0);
            put_f32(&mut rec, MPP_CALIBRATION_FACTORS + i * 8 + 4, *ext);
        }
        for k in 0..MPP_ORBIT_STATE_VECTOR_COUNT {
            let base = MPP_ORBIT_STATE_VECTORS + k * MPP_ORBIT_STATE_VECTOR_SIZE;
            put_mjd(&mut rec, base, 1469, 71_360 + 10 * k as u32, 0);
            put_i32(&mut rec, base + 12, SATELLITE_X_RAW + 1000 * k as i32);
            put_i32(&mut rec, base + 32, 750_000_000);
        }
        rec
    }

    fn geolocation_records(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for r in 0..GRID_RECORDS {
            let mut rec = vec![0u8; GEOLOCATION_RECORD_SIZE];
            put_mjd(&mut rec, 0, 1469, 71_364, r as u32 * 1000);
            put_u32(&mut rec, 13, 1 + r as u32 * 2);
            put_u32(&mut rec, 17, 2);
            for i in 0..TIE_POINT_COUNT {
                put_u32(&mut rec, GEOLOCATION_SAMPLE_NUMBERS + i * 4, 1 + i as u32);
                let slant = if r == 1 { SLANT_TIME_FIRST_NS } else { 1.0 } + 100.0 * i as f32;
                put_f32(&mut rec, GEOLOCATION_SLANT_TIMES + i * 4, slant);
                put_f32(&mut rec, GEOLOCATION_ANGLES + i * 4, incidence_angle(i) + r as f32);
                put_i32(&mut rec, GEOLOCATION_LATITUDES + i * 4, lat_raw(r, i));
                put_i32(&mut rec, GEOLOCATION_LONGITUDES + i * 4, lon_raw(r, i));
            }
            out.extend(rec);
        }
        out
    }

    fn srgr_records(&self) -> (Vec<u8>, u64) {
        match self.srgr {
            SrGrShape::Single => {
                let mut rec = vec![0u8; SRGR_SINGLE_SIZE];
                put_f32(&mut rec, 0, SLANT_TIME_FIRST_NS);
                put_f32(&mut rec, 8, 854_000.0);
                put_f32(&mut rec, 12, 0.6);
                (rec, 1)
            }
            SrGrShape::TimeSeries(count) => {
                let mut out = Vec::new();
                for k in 0..count {
                    let mut rec = vec![0u8; SRGR_RECORD_SIZE];
                    put_mjd(&mut rec, 0, 1469, 71_364 + k as u32, 0);
                    put_f32(&mut rec, 13, SLANT_TIME_FIRST_NS);
                    put_f32(&mut rec, 21, 854_000.0 + k as f32);
                    out.extend(rec);
                }
                (out, count)
            }
            SrGrShape::Unsupported => (vec![0u8; 40], 1),
        }
    }

    /// Full product bytes
    pub fn build(&self) -> Vec<u8> {
        let mpp = self.main_processing_record();
        let grid = self.geolocation_records();
        let (srgr, srgr_count) = self.srgr_records();
        let mds = vec![0u8; LINES as usize * (17 + self.sample_count * 4)];

        let mut offset = self.data_offset();
        let mut dsds = Vec::new();
        let mut body = Vec::new();

        let mut push = |name: &str, bytes: &[u8], count: u64, present: bool, dsds: &mut Vec<Vec<u8>>| {
            if present {
                dsds.push(dsd(name, if name.starts_with("MDS") { 'M' } else { 'A' }, "", offset, bytes.len() as u64, count));
                body.extend_from_slice(bytes);
                offset += bytes.len() as u64;
            } else {
                dsds.push(dsd(name, 'A', "", 0, 0, 0));
            }
        };

        push("MDS1 SQ ADS", &[0u8; 0], 0, false, &mut dsds);
        push(MAIN_PROCESSING_PARAMS_NAME, &mpp, 1, self.main_processing, &mut dsds);
        push("DOP CENTROID COEFFS ADS", &[0u8; 55], 1, true, &mut dsds);
        push(SRGR_NAME, &srgr, srgr_count, true, &mut dsds);
        push(GEOLOCATION_GRID_NAME, &grid, GRID_RECORDS, self.geolocation, &mut dsds);
        push("MDS1", &mds, LINES as u64, true, &mut dsds);
        drop(push);

        dsds.push(dsd(EXTERNAL_CALIBRATION_NAME, 'R', AUX_FILE, 0, 0, 0));
        dsds.push(dsd("ORBIT STATE VECTOR 1", 'R', "DOR_VOR_AXVF-P20040110_120600_20040109_215528_20040111_002328", 0, 0, 0));
        while dsds.len() < DSD_COUNT - 1 {
            dsds.push(dsd("SPARE ADS", 'A', "", 0, 0, 0));
        }
        dsds.push(vec![b' '; DSD_SIZE]);

        let mut mph = format!("PRODUCT=\"{}\"\nPROC_STAGE=N\n", self.product_name).into_bytes();
        mph.resize(SPH_SIZE_MARKER_OFFSET, b' ');
        mph.extend_from_slice(format!("SPH_SIZE=+{:010}<bytes>\n", self.sph_size()).as_bytes());
        mph.resize(MPH_SIZE, b' ');

        let mut sph = format!(
            "SPH_DESCRIPTOR=\"Image Mode SLC Image       \"\nSWATH=\"{}\"\nMDS1_TX_RX_POLAR=\"{}\"\nMDS2_TX_RX_POLAR=\"   \"\nLINE_LENGTH=+{:010}<samples>\nSAMPLE_TYPE=\"{}\"\n",
            self.swath, self.polarization, self.sample_count, self.sample_type
        )
        .into_bytes();
        sph.resize(SPH_PREFIX, b' ');

        let mut out = mph;
        out.extend(sph);
        for d in dsds {
            out.extend(d);
        }
        assert_eq!(out.len() as u64, self.data_offset());
        out.extend(body);
        out
    }

    pub fn write(&self, dir: &Path) -> PathBuf {
        let path = dir.join(&self.product_name);
        std::fs::write(&path, self.build()).expect("Failed to write product");
        path
    }
}

/// Complete external calibration file with recognisable patterns
pub fn aux_file_bytes() -> Vec<u8> {
    let mut bytes = vec![b' '; AUX_FILE_MIN_SIZE];
    let angles = GADS_OFFSET + 16;
    for (s, angle) in REFERENCE_ANGLES.iter().enumerate() {
        put_f32(&mut bytes, angles + s * 4, *angle);
    }
    let patterns = angles + SWATH_COUNT * 4;
    for s in 0..SWATH_COUNT {
        for p in 0..POLARIZATION_COUNT {
            let base = patterns + (s * POLARIZATION_COUNT + p) * ANTENNA_GAIN_COUNT * 4;
            for k in 0..ANTENNA_GAIN_COUNT {
                put_f32(&mut bytes, base + k * 4, gain_db(s, p, k));
            }
        }
    }
    bytes
}

/// `<root>/ASAR/<year>/<AUX_FILE>`
pub fn write_aux_tree(root: &Path) -> PathBuf {
    let dir = root.join("ASAR").join("2003");
    std::fs::create_dir_all(&dir).expect("Failed to create aux tree");
    let path = dir.join(AUX_FILE);
    std::fs::write(&path, aux_file_bytes()).expect("Failed to write aux file");
    path
}
