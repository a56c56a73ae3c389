//! Little-endian byte-level helpers shared by the writer and reader.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

pub fn push_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

pub fn push_u32(buf: &mut Vec<u8>, v: u32) {
    let mut tmp = [0u8; 4];
    LittleEndian::write_u32(&mut tmp, v);
    buf.extend_from_slice(&tmp);
}

pub fn push_u64(buf: &mut Vec<u8>, v: u64) {
    let mut tmp = [0u8; 8];
    LittleEndian::write_u64(&mut tmp, v);
    buf.extend_from_slice(&tmp);
}

pub fn push_f32(buf: &mut Vec<u8>, v: f32) {
    let mut tmp = [0u8; 4];
    LittleEndian::write_f32(&mut tmp, v);
    buf.extend_from_slice(&tmp);
}

pub fn patch_u64(buf: &mut [u8], pos: usize, add: u64) {
    let cur = LittleEndian::read_u64(&buf[pos..pos + 8]);
    LittleEndian::write_u64(&mut buf[pos..pos + 8], cur + add);
}

/// A forward-only cursor over archive bytes, used by the printer. Every
/// read checks bounds and turns a short read into `CORRUPTED` rather than
/// panicking, since the printer's whole job is to survive malformed input
/// far enough to report where it broke.
pub struct Cursor<'a> {
    pub bytes: &'a [u8],
    pub pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    pub fn at(bytes: &'a [u8], pos: usize) -> Self {
        Cursor { bytes, pos }
    }

    fn need(&self, n: usize) -> Result<()> {
        if self.pos + n > self.bytes.len() {
            return Err(Error::Corrupted { detail: format!("unexpected end of archive at byte {}", self.pos) });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        let v = self.bytes[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.need(4)?;
        let v = LittleEndian::read_u32(&self.bytes[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(v)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.need(8)?;
        let v = LittleEndian::read_u64(&self.bytes[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(v)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.need(4)?;
        let v = LittleEndian::read_f32(&self.bytes[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.need(2)?;
        let v = LittleEndian::read_i16(&self.bytes[self.pos..self.pos + 2]);
        self.pos += 2;
        Ok(v)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.need(4)?;
        let v = LittleEndian::read_i32(&self.bytes[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(v)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.need(8)?;
        let v = LittleEndian::read_i64(&self.bytes[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(v)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.need(2)?;
        let v = LittleEndian::read_u16(&self.bytes[self.pos..self.pos + 2]);
        self.pos += 2;
        Ok(v)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.need(n)?;
        let s = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    pub fn expect_marker(&mut self, expected: docarc_core::marker::Marker) -> Result<()> {
        let b = self.read_u8()?;
        if b != expected.as_byte() {
            return Err(Error::Corrupted {
                detail: format!("expected marker {} ({:#x}) at byte {}, found {:#x}", expected.name(), expected.as_byte(), self.pos - 1, b),
            });
        }
        Ok(())
    }
}
