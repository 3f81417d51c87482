//! Data specification commands and their binary encoding.
//!
//! ## Command words
//!
//! Every command starts with one little-endian header word:
//!
//! ```text
//! bits 31..28   number of argument words that follow
//! bits 27..20   opcode
//! bits 15..8    data type code (writes) or region index (switch focus)
//! bit  7        empty flag (reserve)
//! bits 4..0     region index (reserve)
//! ```
//!
//! | Opcode | Command | Arguments |
//! |--------|---------|-----------|
//! | `0x02` | reserve region | size in bytes |
//! | `0x42` | write value | 1 or 2 value words, low word first |
//! | `0x43` | write array | element count, then data padded to a word |
//! | `0x50` | switch focus | none |
//! | `0xFF` | end specification | none |
//!
//! Comments and region labels only appear in the text report; they are
//! not part of the binary stream.

use crate::data_type::DataType;
use crate::error::{DataSpecError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Reserve a memory region
pub const OPCODE_RESERVE: u8 = 0x02;
/// Write one value
pub const OPCODE_WRITE: u8 = 0x42;
/// Write an array of values
pub const OPCODE_WRITE_ARRAY: u8 = 0x43;
/// Switch write focus
pub const OPCODE_SWITCH_FOCUS: u8 = 0x50;
/// End of specification
pub const OPCODE_END_SPEC: u8 = 0xFF;

const EMPTY_FLAG: u32 = 1 << 7;
const REGION_MASK: u32 = 0x1F;

/// One step of a data specification
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Reserve `size` bytes for `region`
    ReserveRegion {
        /// Region index
        region: u8,
        /// Size in bytes (a whole number of words)
        size: usize,
        /// Report label
        label: Option<String>,
        /// Reserved but not pre-filled
        empty: bool,
    },
    /// Direct following writes at `region`
    SwitchFocus {
        /// Region index
        region: u8,
    },
    /// Write one encoded value
    WriteValue {
        /// Serialized representation
        data_type: DataType,
        /// Raw bits (low `data_type.size()` bytes significant)
        raw: u64,
    },
    /// Write a block of encoded values
    WriteArray {
        /// Element representation
        data_type: DataType,
        /// Little-endian element bytes
        data: Bytes,
    },
    /// Report-only comment
    Comment(String),
    /// End of the specification
    End,
}

impl Command {
    /// Append the binary form of this command
    ///
    /// Comments produce no output.
    #[allow(clippy::cast_possible_truncation)]
    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            Self::ReserveRegion {
                region,
                size,
                empty,
                ..
            } => {
                let mut header = header_word(1, OPCODE_RESERVE) | (u32::from(*region) & REGION_MASK);
                if *empty {
                    header |= EMPTY_FLAG;
                }
                buf.put_u32_le(header);
                // reservations are capped at chip SDRAM, well below 4 GiB
                buf.put_u32_le(*size as u32);
            }
            Self::SwitchFocus { region } => {
                buf.put_u32_le(header_word(0, OPCODE_SWITCH_FOCUS) | (u32::from(*region) << 8));
            }
            Self::WriteValue { data_type, raw } => {
                let words = if data_type.size() > 4 { 2 } else { 1 };
                buf.put_u32_le(header_word(words, OPCODE_WRITE) | (u32::from(data_type.code()) << 8));
                buf.put_u32_le(*raw as u32);
                if words == 2 {
                    buf.put_u32_le((*raw >> 32) as u32);
                }
            }
            Self::WriteArray { data_type, data } => {
                let count = data.len() / data_type.size();
                buf.put_u32_le(
                    header_word(1, OPCODE_WRITE_ARRAY) | (u32::from(data_type.code()) << 8),
                );
                buf.put_u32_le(count as u32);
                buf.put_slice(data);
                let pad = (4 - data.len() % 4) % 4;
                buf.put_bytes(0, pad);
            }
            Self::Comment(_) => {}
            Self::End => buf.put_u32_le(header_word(0, OPCODE_END_SPEC)),
        }
    }

    /// Decode one command from the front of `buf`
    ///
    /// # Errors
    ///
    /// Returns a parse error for unknown opcodes, unknown data types or
    /// truncated arguments.
    pub fn decode(buf: &mut impl Buf) -> Result<Self> {
        let header = take_word(buf)?;
        let n_args = header >> 28;
        let opcode = ((header >> 20) & 0xFF) as u8;
        let field = ((header >> 8) & 0xFF) as u8;

        match opcode {
            OPCODE_RESERVE => {
                expect_args(opcode, n_args, 1)?;
                let size = take_word(buf)? as usize;
                Ok(Self::ReserveRegion {
                    region: (header & REGION_MASK) as u8,
                    size,
                    label: None,
                    empty: header & EMPTY_FLAG != 0,
                })
            }
            OPCODE_SWITCH_FOCUS => {
                expect_args(opcode, n_args, 0)?;
                Ok(Self::SwitchFocus { region: field })
            }
            OPCODE_WRITE => {
                let data_type = data_type_from(field)?;
                let words = if data_type.size() > 4 { 2 } else { 1 };
                expect_args(opcode, n_args, words)?;
                let mut raw = u64::from(take_word(buf)?);
                if words == 2 {
                    raw |= u64::from(take_word(buf)?) << 32;
                }
                Ok(Self::WriteValue { data_type, raw })
            }
            OPCODE_WRITE_ARRAY => {
                expect_args(opcode, n_args, 1)?;
                let data_type = data_type_from(field)?;
                let count = take_word(buf)? as usize;
                let len = count * data_type.size();
                let padded = len.div_ceil(4) * 4;
                if buf.remaining() < padded {
                    return Err(DataSpecError::parse_error(format!(
                        "array of {count} {data_type} truncated: {} bytes left",
                        buf.remaining()
                    )));
                }
                let data = buf.copy_to_bytes(len);
                buf.advance(padded - len);
                Ok(Self::WriteArray { data_type, data })
            }
            OPCODE_END_SPEC => Ok(Self::End),
            other => Err(DataSpecError::parse_error(format!(
                "unknown opcode 0x{other:02x} in header 0x{header:08x}"
            ))),
        }
    }
}

fn header_word(n_args: u32, opcode: u8) -> u32 {
    (n_args << 28) | (u32::from(opcode) << 20)
}

fn take_word(buf: &mut impl Buf) -> Result<u32> {
    if buf.remaining() < 4 {
        return Err(DataSpecError::parse_error("truncated command word"));
    }
    Ok(buf.get_u32_le())
}

fn expect_args(opcode: u8, got: u32, want: u32) -> Result<()> {
    if got == want {
        Ok(())
    } else {
        Err(DataSpecError::parse_error(format!(
            "opcode 0x{opcode:02x} expects {want} argument words, header says {got}"
        )))
    }
}

fn data_type_from(code: u8) -> Result<DataType> {
    DataType::from_code(code)
        .ok_or_else(|| DataSpecError::parse_error(format!("unknown data type code {code}")))
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReserveRegion {
                region,
                size,
                label,
                empty,
            } => {
                write!(f, "RESERVE_MEMORY_REGION region={region} size={size}")?;
                if let Some(label) = label {
                    write!(f, " label={label}")?;
                }
                if *empty {
                    write!(f, " UNFILLED")?;
                }
                Ok(())
            }
            Self::SwitchFocus { region } => write!(f, "SWITCH_FOCUS region={region}"),
            Self::WriteValue { data_type, raw } => write!(
                f,
                "WRITE {data_type} {} (0x{raw:0width$x})",
                data_type.decode(*raw),
                width = data_type.size() * 2
            ),
            Self::WriteArray { data_type, data } => write!(
                f,
                "WRITE_ARRAY {data_type} count={} bytes={}",
                data.len() / data_type.size(),
                data.len()
            ),
            Self::Comment(text) => {
                for (i, line) in text.trim_matches('\n').lines().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "# {line}")?;
                }
                Ok(())
            }
            Self::End => write!(f, "END_SPEC"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_one(cmd: &Command) -> Bytes {
        let mut buf = BytesMut::new();
        cmd.encode(&mut buf);
        buf.freeze()
    }

    #[test]
    fn reserve_header_layout() {
        let bytes = encode_one(&Command::ReserveRegion {
            region: 6,
            size: 256,
            label: Some("spikeHistBuffer".into()),
            empty: true,
        });
        assert_eq!(bytes.len(), 8);
        let header = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(header, 0x1020_0086);
    }

    #[test]
    fn array_is_padded_to_word() {
        let bytes = encode_one(&Command::WriteArray {
            data_type: DataType::Uint8,
            data: Bytes::from_static(&[1, 2, 3]),
        });
        assert_eq!(bytes.len(), 12);
        let mut slice = &bytes[..];
        let decoded = Command::decode(&mut slice).unwrap();
        assert_eq!(
            decoded,
            Command::WriteArray {
                data_type: DataType::Uint8,
                data: Bytes::from_static(&[1, 2, 3]),
            }
        );
        assert!(slice.is_empty());
    }

    #[test]
    fn wide_values_use_two_words() {
        let cmd = Command::WriteValue {
            data_type: DataType::Uint64,
            raw: 0x0102_0304_0506_0708,
        };
        let bytes = encode_one(&cmd);
        assert_eq!(bytes.len(), 12);
        assert_eq!(Command::decode(&mut &bytes[..]).unwrap(), cmd);
    }

    #[test]
    fn comments_are_report_only() {
        assert!(encode_one(&Command::Comment("hello".into())).is_empty());
        assert_eq!(Command::Comment("\nhello\n".into()).to_string(), "# hello");
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let word = 0x0770_0000u32.to_le_bytes();
        assert!(matches!(
            Command::decode(&mut &word[..]),
            Err(DataSpecError::ParseError { .. })
        ));
    }

    #[test]
    fn truncated_array_is_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(header_word(1, OPCODE_WRITE_ARRAY) | (u32::from(DataType::Uint32.code()) << 8));
        buf.put_u32_le(4);
        buf.put_u32_le(7);
        assert!(Command::decode(&mut &buf[..]).is_err());
    }
}
