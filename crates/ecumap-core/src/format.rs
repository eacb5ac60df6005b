//! Fixed-width binary number formats
//!
//! A [`NumericFormat`] describes how one raw integer is laid out in memory
//! (1 or 2 bytes, signed or unsigned) and converts between that layout and
//! an `f64`. Byte order is supplied per call by the owning memory section.

use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte order of multi-byte values in a memory section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// Most significant byte first
    #[default]
    Big,
    /// Least significant byte first
    Little,
}

/// Binary encoding of a single raw value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NumericFormat {
    width: u8,
    signed: bool,
}

impl NumericFormat {
    /// Unsigned 8-bit integer
    pub const UBYTE: NumericFormat = NumericFormat { width: 1, signed: false };
    /// Signed 8-bit integer
    pub const SBYTE: NumericFormat = NumericFormat { width: 1, signed: true };
    /// Unsigned 16-bit integer
    pub const UWORD: NumericFormat = NumericFormat { width: 2, signed: false };
    /// Signed 16-bit integer
    pub const SWORD: NumericFormat = NumericFormat { width: 2, signed: true };

    /// All supported formats
    pub const ALL: [NumericFormat; 4] = [Self::UBYTE, Self::SBYTE, Self::UWORD, Self::SWORD];

    /// Create a format from a byte width and signedness
    pub fn new(width: usize, signed: bool) -> Result<Self> {
        match width {
            1 | 2 => Ok(Self {
                width: width as u8,
                signed,
            }),
            _ => Err(CodecError::invalid(format!(
                "unsupported format width {width}, expected 1 or 2 bytes"
            ))),
        }
    }

    /// Parse a format from its name (`UBYTE`, `SBYTE`, `UWORD`, `SWORD`)
    ///
    /// MegaTune-style INI aliases `U08`, `S08`, `U16` and `S16` are accepted too.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "UBYTE" | "U08" | "UINT8" => Some(Self::UBYTE),
            "SBYTE" | "S08" | "INT8" => Some(Self::SBYTE),
            "UWORD" | "U16" | "UINT16" => Some(Self::UWORD),
            "SWORD" | "S16" | "INT16" => Some(Self::SWORD),
            _ => None,
        }
    }

    /// Canonical name of this format
    pub fn name(&self) -> &'static str {
        match (self.width, self.signed) {
            (1, false) => "UBYTE",
            (1, true) => "SBYTE",
            (_, false) => "UWORD",
            (_, true) => "SWORD",
        }
    }

    /// Size of one value in bytes
    pub fn width(&self) -> usize {
        self.width as usize
    }

    /// Whether values are two's complement signed
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Smallest representable raw value
    pub fn min(&self) -> f64 {
        match (self.width, self.signed) {
            (_, false) => 0.0,
            (1, true) => i8::MIN as f64,
            (_, true) => i16::MIN as f64,
        }
    }

    /// Largest representable raw value
    pub fn max(&self) -> f64 {
        match (self.width, self.signed) {
            (1, false) => u8::MAX as f64,
            (1, true) => i8::MAX as f64,
            (_, false) => u16::MAX as f64,
            (_, true) => i16::MAX as f64,
        }
    }

    /// Whether `raw` rounds to a representable value
    pub fn contains(&self, raw: f64) -> bool {
        let rounded = raw.round_ties_even();
        raw.is_finite() && rounded >= self.min() && rounded <= self.max()
    }

    /// Clamp a raw value into the representable range
    ///
    /// The codec never clamps on its own; this is for callers that choose to.
    pub fn clamp(&self, raw: f64) -> f64 {
        raw.round_ties_even().clamp(self.min(), self.max())
    }

    /// Decode exactly `width` bytes into a raw value
    pub fn decode(&self, bytes: &[u8], endian: Endianness) -> Result<f64> {
        use byteorder::{BigEndian, ByteOrder, LittleEndian};

        if bytes.len() != self.width() {
            return Err(CodecError::SizeMismatch {
                expected: self.width(),
                actual: bytes.len(),
            });
        }

        let value = match (self.width, self.signed, endian) {
            (1, false, _) => bytes[0] as f64,
            (1, true, _) => bytes[0] as i8 as f64,
            (_, false, Endianness::Big) => BigEndian::read_u16(bytes) as f64,
            (_, false, Endianness::Little) => LittleEndian::read_u16(bytes) as f64,
            (_, true, Endianness::Big) => BigEndian::read_i16(bytes) as f64,
            (_, true, Endianness::Little) => LittleEndian::read_i16(bytes) as f64,
        };
        Ok(value)
    }

    /// Encode a raw value, rounding half to even
    ///
    /// Values that round outside `[min, max]`, and non-finite values, are
    /// rejected rather than wrapped or clamped.
    pub fn encode(&self, raw: f64, endian: Endianness) -> Result<Vec<u8>> {
        use byteorder::{BigEndian, ByteOrder, LittleEndian};

        if !self.contains(raw) {
            return Err(CodecError::ValueOutOfRange {
                value: raw,
                min: self.min(),
                max: self.max(),
            });
        }

        let rounded = raw.round_ties_even();
        let mut bytes = vec![0u8; self.width()];
        match (self.width, self.signed, endian) {
            (1, false, _) => bytes[0] = rounded as u8,
            (1, true, _) => bytes[0] = rounded as i8 as u8,
            (_, false, Endianness::Big) => BigEndian::write_u16(&mut bytes, rounded as u16),
            (_, false, Endianness::Little) => LittleEndian::write_u16(&mut bytes, rounded as u16),
            (_, true, Endianness::Big) => BigEndian::write_i16(&mut bytes, rounded as i16),
            (_, true, Endianness::Little) => LittleEndian::write_i16(&mut bytes, rounded as i16),
        }
        Ok(bytes)
    }
}

impl Default for NumericFormat {
    fn default() -> Self {
        Self::UBYTE
    }
}

impl fmt::Display for NumericFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for NumericFormat {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_name(&value)
            .ok_or_else(|| CodecError::invalid(format!("unknown numeric format '{value}'")))
    }
}

impl From<NumericFormat> for String {
    fn from(value: NumericFormat) -> Self {
        value.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges() {
        assert_eq!(NumericFormat::UBYTE.min(), 0.0);
        assert_eq!(NumericFormat::UBYTE.max(), 255.0);
        assert_eq!(NumericFormat::SBYTE.min(), -128.0);
        assert_eq!(NumericFormat::SBYTE.max(), 127.0);
        assert_eq!(NumericFormat::UWORD.max(), 65535.0);
        assert_eq!(NumericFormat::SWORD.min(), -32768.0);
        assert_eq!(NumericFormat::SWORD.max(), 32767.0);
    }

    #[test]
    fn test_invalid_width() {
        assert!(NumericFormat::new(4, false).is_err());
        assert_eq!(NumericFormat::new(2, true).unwrap(), NumericFormat::SWORD);
    }

    #[test]
    fn test_decode_byte_order() {
        let bytes = [0x0A, 0x01];
        assert_eq!(
            NumericFormat::UWORD.decode(&bytes, Endianness::Little).unwrap(),
            266.0
        );
        assert_eq!(
            NumericFormat::UWORD.decode(&bytes, Endianness::Big).unwrap(),
            2561.0
        );
        assert_eq!(
            NumericFormat::SWORD.decode(&[0xFF, 0xFF], Endianness::Big).unwrap(),
            -1.0
        );
        assert_eq!(
            NumericFormat::SBYTE.decode(&[0x80], Endianness::Big).unwrap(),
            -128.0
        );
    }

    #[test]
    fn test_decode_wrong_length() {
        let err = NumericFormat::UWORD.decode(&[0x01], Endianness::Big).unwrap_err();
        assert!(matches!(
            err,
            CodecError::SizeMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_encode_rounds_half_to_even() {
        let f = NumericFormat::UBYTE;
        assert_eq!(f.encode(2.5, Endianness::Big).unwrap(), vec![2]);
        assert_eq!(f.encode(3.5, Endianness::Big).unwrap(), vec![4]);
        assert_eq!(f.encode(3.49, Endianness::Big).unwrap(), vec![3]);
        assert_eq!(
            NumericFormat::SWORD.encode(-2.5, Endianness::Little).unwrap(),
            vec![0xFE, 0xFF]
        );
    }

    #[test]
    fn test_encode_rejects_out_of_range() {
        assert!(NumericFormat::UBYTE.encode(256.0, Endianness::Big).is_err());
        assert!(NumericFormat::UBYTE.encode(-1.0, Endianness::Big).is_err());
        assert!(NumericFormat::UBYTE.encode(f64::NAN, Endianness::Big).is_err());
        // 255.4 rounds down into range
        assert_eq!(NumericFormat::UBYTE.encode(255.4, Endianness::Big).unwrap(), vec![255]);
        assert_eq!(NumericFormat::UBYTE.clamp(300.0), 255.0);
    }

    #[test]
    fn test_name_parsing() {
        assert_eq!(NumericFormat::from_name("uword"), Some(NumericFormat::UWORD));
        assert_eq!(NumericFormat::from_name("S08"), Some(NumericFormat::SBYTE));
        assert_eq!(NumericFormat::from_name("F32"), None);
        assert_eq!(NumericFormat::SWORD.to_string(), "SWORD");
    }
}
