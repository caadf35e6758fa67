//! Bounds-checked big-endian field reads over a record slice

use crate::io::mjd::{Epoch, MjdTime};
use crate::types::{AsarError, AsarResult};
use byteorder::{BigEndian, ReadBytesExt};
use chrono::{DateTime, Utc};
use std::io::{self, Cursor};

pub(crate) struct BeCursor<'a> {
    inner: Cursor<&'a [u8]>,
    context: &'static str,
}

impl<'a> BeCursor<'a> {
    pub fn new(buf: &'a [u8], context: &'static str) -> Self {
        Self {
            inner: Cursor::new(buf),
            context,
        }
    }

    pub fn at(buf: &'a [u8], pos: usize, context: &'static str) -> Self {
        let mut cursor = Self::new(buf, context);
        cursor.seek(pos);
        cursor
    }

    pub fn seek(&mut self, pos: usize) -> &mut Self {
        self.inner.set_position(pos as u64);
        self
    }

    fn short_read(&self, n: usize, pos: u64, err: io::Error) -> AsarError {
        AsarError::InvalidFormat(format!(
            "{}: read of {} bytes at offset {} exceeds record length {} ({})",
            self.context,
            n,
            pos,
            self.inner.get_ref().len(),
            err
        ))
    }

    fn read<T>(&mut self, n: usize, f: impl FnOnce(&mut Cursor<&'a [u8]>) -> io::Result<T>) -> AsarResult<T> {
        let pos = self.inner.position();
        match f(&mut self.inner) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.inner.set_position(pos);
                Err(self.short_read(n, pos, e))
            }
        }
    }

    pub fn take(&mut self, n: usize) -> AsarResult<&'a [u8]> {
        let buf: &'a [u8] = *self.inner.get_ref();
        let pos = self.inner.position();
        let range = usize::try_from(pos)
            .ok()
            .and_then(|start| start.checked_add(n).map(|end| start..end))
            .filter(|range| range.end <= buf.len());
        match range {
            Some(range) => {
                self.inner.set_position(range.end as u64);
                Ok(&buf[range])
            }
            None => Err(self.short_read(n, pos, io::ErrorKind::UnexpectedEof.into())),
        }
    }

    pub fn u8(&mut self) -> AsarResult<u8> {
        self.read(1, |c| c.read_u8())
    }

    pub fn flag(&mut self) -> AsarResult<bool> {
        Ok(self.u8()? != 0)
    }

    pub fn u32(&mut self) -> AsarResult<u32> {
        self.read(4, |c| c.read_u32::<BigEndian>())
    }

    pub fn i32(&mut self) -> AsarResult<i32> {
        self.read(4, |c| c.read_i32::<BigEndian>())
    }

    pub fn f32(&mut self) -> AsarResult<f32> {
        self.read(4, |c| c.read_f32::<BigEndian>())
    }

    pub fn mjd(&mut self) -> AsarResult<MjdTime> {
        self.read(12, |c| {
            let days = c.read_i32::<BigEndian>()?;
            let seconds = c.read_u32::<BigEndian>()?;
            let microseconds = c.read_u32::<BigEndian>()?;
            Ok(MjdTime::new(days, seconds, microseconds))
        })
    }

    /// MJD triplet decoded against `epoch`; an unrepresentable day count is a format error
    pub fn utc(&mut self, epoch: Epoch) -> AsarResult<DateTime<Utc>> {
        let pos = self.inner.position();
        let time = self.mjd()?;
        time.to_utc(epoch).ok_or_else(|| {
            AsarError::InvalidFormat(format!(
                "{}: time {:?} at offset {} is out of range",
                self.context, time, pos
            ))
        })
    }

    /// Fixed-width ASCII field, trimmed of padding
    pub fn ascii(&mut self, n: usize) -> AsarResult<String> {
        let bytes = self.take(n)?;
        Ok(String::from_utf8_lossy(bytes)
            .trim_matches(|c: char| c.is_whitespace() || c == '\0')
            .to_string())
    }
}
