//! Envisat (days, seconds, microseconds) timestamps

use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Reference epoch a day count is measured from.
///
/// Annotation records count days from 2000-01-01 (MJD2000); the classical
/// Modified Julian Date counts from 1858-11-17. The two are never interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Epoch {
    Mjd2000,
    Mjd,
}

impl Epoch {
    /// Seconds between the Unix epoch and this epoch
    const fn unix_offset_seconds(self) -> i64 {
        match self {
            Epoch::Mjd2000 => 946_684_800,
            Epoch::Mjd => -3_506_716_800,
        }
    }

    pub fn origin(self) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(self.unix_offset_seconds())
    }
}

/// Raw (days, seconds, microseconds) triplet as stored in products
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MjdTime {
    pub days: i32,
    pub seconds: u32,
    pub microseconds: u32,
}

impl MjdTime {
    pub fn new(days: i32, seconds: u32, microseconds: u32) -> Self {
        Self { days, seconds, microseconds }
    }

    /// Decode 12 big-endian bytes (i32 days, u32 seconds, u32 microseconds)
    pub fn from_be_bytes(bytes: [u8; 12]) -> Self {
        let days = BigEndian::read_i32(&bytes[0..4]);
        let seconds = BigEndian::read_u32(&bytes[4..8]);
        let microseconds = BigEndian::read_u32(&bytes[8..12]);
        Self { days, seconds, microseconds }
    }

    /// Parse the textual form `"days, seconds, microseconds"`.
    ///
    /// Commas and whitespace both separate fields, missing trailing fields
    /// default to zero, and an empty string yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty());

        let days = parts.next()?.trim_start_matches('+').parse::<i32>().ok()?;
        let seconds = match parts.next() {
            Some(p) => p.trim_start_matches('+').parse::<u32>().ok()?,
            None => 0,
        };
        let microseconds = match parts.next() {
            Some(p) => p.trim_start_matches('+').parse::<u32>().ok()?,
            None => 0,
        };

        Some(Self { days, seconds, microseconds })
    }

    /// Instant this triplet denotes relative to `epoch`.
    ///
    /// `None` when the day count lies outside the representable calendar range.
    pub fn to_utc(&self, epoch: Epoch) -> Option<DateTime<Utc>> {
        epoch
            .origin()
            .checked_add_signed(Duration::days(i64::from(self.days)))?
            .checked_add_signed(Duration::seconds(i64::from(self.seconds)))?
            .checked_add_signed(Duration::microseconds(i64::from(self.microseconds)))
    }
}

/// Decode an optional triplet; absence maps to no instant rather than an error
pub fn decode(time: Option<MjdTime>, epoch: Epoch) -> Option<DateTime<Utc>> {
    time.and_then(|t| t.to_utc(epoch))
}

/// Decode a textual triplet against the annotation-record epoch
pub fn parse_envisat_time(text: &str) -> Option<DateTime<Utc>> {
    decode(MjdTime::parse(text), Epoch::Mjd2000)
}
