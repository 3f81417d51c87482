//! Fixed-point and integer data types.
//!
//! Each type is a width in bytes plus a number of fractional bits. Values
//! are scaled by `2^fractional_bits`, rounded to the nearest integer and
//! stored little-endian in two's complement when signed. `S1615` is the
//! firmware's `accum` type and carries almost every neuron parameter.

use crate::error::{DataSpecError, Result};
use bytes::{Buf, BufMut};

/// Serialized representation of one value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Unsigned 8-bit integer
    Uint8,
    /// Unsigned 16-bit integer
    Uint16,
    /// Unsigned 32-bit integer
    Uint32,
    /// Unsigned 64-bit integer
    Uint64,
    /// Signed 8-bit integer
    Int8,
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// Unsigned 8.8 fixed point
    U88,
    /// Unsigned 16.16 fixed point
    U1616,
    /// Unsigned 32.32 fixed point
    U3232,
    /// Signed 8.7 fixed point
    S87,
    /// Signed 16.15 fixed point (`accum`)
    S1615,
    /// Signed 32.31 fixed point
    S3231,
    /// Unsigned 0.16 fraction
    U016,
    /// Unsigned 0.32 fraction
    U032,
    /// Signed 0.15 fraction
    S015,
    /// Signed 0.31 fraction
    S031,
}

impl DataType {
    /// Every data type, in code order
    pub const ALL: [Self; 18] = [
        Self::Uint8,
        Self::Uint16,
        Self::Uint32,
        Self::Uint64,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::U88,
        Self::U1616,
        Self::U3232,
        Self::S87,
        Self::S1615,
        Self::S3231,
        Self::U016,
        Self::U032,
        Self::S015,
        Self::S031,
    ];

    /// Width in bytes
    pub const fn size(self) -> usize {
        match self {
            Self::Uint8 | Self::Int8 => 1,
            Self::Uint16 | Self::Int16 | Self::U88 | Self::S87 | Self::U016 | Self::S015 => 2,
            Self::Uint32 | Self::Int32 | Self::U1616 | Self::S1615 | Self::U032 | Self::S031 => 4,
            Self::Uint64 | Self::Int64 | Self::U3232 | Self::S3231 => 8,
        }
    }

    /// Number of fractional bits
    pub const fn fractional_bits(self) -> u32 {
        match self {
            Self::Uint8
            | Self::Uint16
            | Self::Uint32
            | Self::Uint64
            | Self::Int8
            | Self::Int16
            | Self::Int32
            | Self::Int64 => 0,
            Self::U88 => 8,
            Self::S87 => 7,
            Self::U1616 => 16,
            Self::S1615 | Self::S015 => 15,
            Self::U3232 | Self::U032 => 32,
            Self::S3231 | Self::S031 => 31,
            Self::U016 => 16,
        }
    }

    /// True for two's complement types
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::S87
                | Self::S1615
                | Self::S3231
                | Self::S015
                | Self::S031
        )
    }

    /// Stable one-byte code used in the binary command stream
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up a data type by its binary code
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// `2^fractional_bits`
    #[allow(clippy::cast_precision_loss)]
    pub fn scale(self) -> f64 {
        (1u64 << self.fractional_bits()) as f64
    }

    fn bits(self) -> u32 {
        // size() is at most 8
        #[allow(clippy::cast_possible_truncation)]
        let bytes = self.size() as u32;
        bytes * 8
    }

    fn mask(self) -> u64 {
        if self.bits() == 64 {
            u64::MAX
        } else {
            (1u64 << self.bits()) - 1
        }
    }

    /// Smallest raw integer, as f64
    fn raw_min(self) -> f64 {
        if self.is_signed() {
            -(2f64.powi(self.bits() as i32 - 1))
        } else {
            0.0
        }
    }

    /// Largest raw integer, as f64
    fn raw_max(self) -> f64 {
        if self.is_signed() {
            2f64.powi(self.bits() as i32 - 1) - 1.0
        } else {
            2f64.powi(self.bits() as i32) - 1.0
        }
    }

    /// Smallest representable value
    pub fn min(self) -> f64 {
        self.raw_min() / self.scale()
    }

    /// Largest representable value
    pub fn max(self) -> f64 {
        self.raw_max() / self.scale()
    }

    /// Encode a real value to its raw bit pattern (low `size()` bytes significant)
    ///
    /// # Errors
    ///
    /// Returns `ValueOutOfRange` for non-finite values or values outside
    /// the type's range after rounding.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn encode(self, value: f64) -> Result<u64> {
        let scaled = (value * self.scale()).round();
        if !scaled.is_finite() || scaled < self.raw_min() || scaled > self.raw_max() {
            return Err(DataSpecError::ValueOutOfRange {
                value,
                data_type: self,
            });
        }
        let raw = if self.is_signed() {
            (scaled as i64) as u64
        } else {
            scaled as u64
        };
        Ok(raw & self.mask())
    }

    /// Decode a raw bit pattern back to a real value
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    pub fn decode(self, raw: u64) -> f64 {
        let raw = raw & self.mask();
        let integer = if self.is_signed() {
            let shift = 64 - self.bits();
            (((raw << shift) as i64) >> shift) as f64
        } else {
            raw as f64
        };
        integer / self.scale()
    }

    /// Append a raw value little-endian
    pub fn put(self, buf: &mut impl BufMut, raw: u64) {
        buf.put_uint_le(raw, self.size());
    }

    /// Read a raw value little-endian
    ///
    /// # Errors
    ///
    /// Returns a parse error when fewer than `size()` bytes remain.
    pub fn get(self, buf: &mut impl Buf) -> Result<u64> {
        if buf.remaining() < self.size() {
            return Err(DataSpecError::parse_error(format!(
                "{} needs {} bytes, {} left",
                self,
                self.size(),
                buf.remaining()
            )));
        }
        Ok(buf.get_uint_le(self.size()))
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Uint8 => "UINT8",
            Self::Uint16 => "UINT16",
            Self::Uint32 => "UINT32",
            Self::Uint64 => "UINT64",
            Self::Int8 => "INT8",
            Self::Int16 => "INT16",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::U88 => "U88",
            Self::U1616 => "U1616",
            Self::U3232 => "U3232",
            Self::S87 => "S87",
            Self::S1615 => "S1615",
            Self::S3231 => "S3231",
            Self::U016 => "U016",
            Self::U032 => "U032",
            Self::S015 => "S015",
            Self::S031 => "S031",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1615_encodes_accum() {
        assert_eq!(DataType::S1615.encode(1.0).unwrap(), 0x8000);
        assert_eq!(DataType::S1615.encode(-1.0).unwrap(), 0xFFFF_8000);
        assert!((DataType::S1615.decode(0xFFFF_8000) + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn representable_values_survive() {
        for (dt, v) in [
            (DataType::S1615, -65.5),
            (DataType::U032, 0.75),
            (DataType::S87, -3.25),
            (DataType::Int16, -12.0),
            (DataType::Uint64, 1_234_567_890_123.0),
            (DataType::S3231, -2.5),
        ] {
            let raw = dt.encode(v).unwrap();
            assert!((dt.decode(raw) - v).abs() < f64::EPSILON, "{dt} {v}");
        }
    }

    #[test]
    fn rounding_is_to_nearest() {
        // 1/3 in S1615 is 10922.67 / 32768 -> rounds to 10923
        assert_eq!(DataType::S1615.encode(1.0 / 3.0).unwrap(), 10923);
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert!(DataType::Uint8.encode(256.0).is_err());
        assert!(DataType::Uint32.encode(-1.0).is_err());
        assert!(DataType::S1615.encode(65536.0).is_err());
        assert!(DataType::U032.encode(1.0).is_err());
        assert!(DataType::S1615.encode(f64::NAN).is_err());
    }

    #[test]
    fn codes_round_trip() {
        for dt in DataType::ALL {
            assert_eq!(DataType::from_code(dt.code()), Some(dt));
        }
        assert_eq!(DataType::from_code(200), None);
    }

    #[test]
    fn little_endian_io() {
        let mut buf = Vec::new();
        DataType::Uint16.put(&mut buf, 0x1234);
        assert_eq!(buf, [0x34, 0x12]);
        let mut slice = &buf[..];
        assert_eq!(DataType::Uint16.get(&mut slice).unwrap(), 0x1234);
        assert!(DataType::Uint16.get(&mut slice).is_err());
    }
}
