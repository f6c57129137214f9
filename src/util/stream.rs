//! Sticky-failure byte reader for consensus parsing.
//!
//! Script parsing is total: a truncated stream must yield a marked-invalid
//! value that retains the bytes which did arrive, rather than an error. The
//! reader here wraps any [`Read`] source and converts short reads into a
//! sticky flag. Once the flag is set, integer reads return zero and byte
//! reads return empty; the flag is never cleared.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

/// A byte source with a sticky failure flag.
pub struct ByteReader<'a> {
    source: &'a mut dyn Read,
    failed: bool,
}

impl<'a> ByteReader<'a> {
    /// Wraps a readable source.
    #[must_use]
    pub fn new(source: &'a mut dyn Read) -> ByteReader<'a> {
        ByteReader {
            source,
            failed: false,
        }
    }

    /// Returns whether any read so far has failed.
    #[must_use]
    #[inline]
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Forces the failure flag.
    #[inline]
    pub fn invalidate(&mut self) {
        self.failed = true;
    }

    /// Reads a single byte, or zero after failure.
    #[inline]
    pub fn read_u8(&mut self) -> u8 {
        if self.failed {
            return 0;
        }
        match self.source.read_u8() {
            Ok(n) => n,
            Err(_) => {
                self.failed = true;
                0
            }
        }
    }

    /// Reads a little-endian u16, or zero after failure.
    #[inline]
    pub fn read_u16_le(&mut self) -> u16 {
        if self.failed {
            return 0;
        }
        match self.source.read_u16::<LittleEndian>() {
            Ok(n) => n,
            Err(_) => {
                self.failed = true;
                0
            }
        }
    }

    /// Reads a little-endian u32, or zero after failure.
    #[inline]
    pub fn read_u32_le(&mut self) -> u32 {
        if self.failed {
            return 0;
        }
        match self.source.read_u32::<LittleEndian>() {
            Ok(n) => n,
            Err(_) => {
                self.failed = true;
                0
            }
        }
    }

    /// Reads a little-endian u64, or zero after failure.
    #[inline]
    pub fn read_u64_le(&mut self) -> u64 {
        if self.failed {
            return 0;
        }
        match self.source.read_u64::<LittleEndian>() {
            Ok(n) => n,
            Err(_) => {
                self.failed = true;
                0
            }
        }
    }

    /// Reads a Bitcoin var int, or zero after failure.
    pub fn read_var_int(&mut self) -> u64 {
        match self.read_u8() {
            0xff => self.read_u64_le(),
            0xfe => self.read_u32_le() as u64,
            0xfd => self.read_u16_le() as u64,
            n0 => n0 as u64,
        }
    }

    /// Reads up to `count` bytes, returning whatever arrived.
    ///
    /// A short result sets the failure flag but the bytes that were read
    /// are still returned, so a truncated push can retain its partial
    /// payload.
    pub fn read_bytes(&mut self, count: usize) -> Vec<u8> {
        if self.failed {
            return Vec::new();
        }
        let mut bytes = Vec::new();
        match (&mut *self.source).take(count as u64).read_to_end(&mut bytes) {
            Ok(n) if n == count => {}
            _ => self.failed = true,
        }
        bytes
    }

    /// Reads a var int length followed by that many bytes.
    pub fn read_string(&mut self) -> Vec<u8> {
        let len = self.read_var_int();
        self.read_bytes(len as usize)
    }
}
