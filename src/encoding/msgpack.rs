// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Minimal MessagePack codec.
//!
//! Covers the subset the compact model format needs: nil, bool, integers,
//! float64 (float32 accepted on read), str, bin, array and string-keyed maps.
//! Map entries keep their order.

use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::core::{CodecError, Result};

/// Deepest array/map nesting accepted by the decoder.
pub const MAX_DEPTH: usize = 64;

const NIL: u8 = 0xc0;
const FALSE: u8 = 0xc2;
const TRUE: u8 = 0xc3;
const BIN8: u8 = 0xc4;
const BIN16: u8 = 0xc5;
const BIN32: u8 = 0xc6;
const FLOAT32: u8 = 0xca;
const FLOAT64: u8 = 0xcb;
const UINT8: u8 = 0xcc;
const UINT16: u8 = 0xcd;
const UINT32: u8 = 0xce;
const UINT64: u8 = 0xcf;
const INT8: u8 = 0xd0;
const INT16: u8 = 0xd1;
const INT32: u8 = 0xd2;
const INT64: u8 = 0xd3;
const STR8: u8 = 0xd9;
const STR16: u8 = 0xda;
const STR32: u8 = 0xdb;
const ARRAY16: u8 = 0xdc;
const ARRAY32: u8 = 0xdd;
const MAP16: u8 = 0xde;
const MAP32: u8 = 0xdf;

/// A decoded MessagePack value.
#[derive(Debug, Clone, PartialEq)]
pub enum PackValue {
    Nil,
    Bool(bool),
    Int(i64),
    /// Unsigned values above `i64::MAX`
    UInt(u64),
    Float(f64),
    Str(String),
    Bin(Vec<u8>),
    Array(Vec<PackValue>),
    Map(Vec<(String, PackValue)>),
}

impl PackValue {
    /// Build a map from `(key, value)` pairs.
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, PackValue)>,
        K: Into<String>,
    {
        PackValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn str(value: impl Into<String>) -> Self {
        PackValue::Str(value.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            PackValue::Nil => "nil",
            PackValue::Bool(_) => "bool",
            PackValue::Int(_) | PackValue::UInt(_) => "int",
            PackValue::Float(_) => "float",
            PackValue::Str(_) => "str",
            PackValue::Bin(_) => "bin",
            PackValue::Array(_) => "array",
            PackValue::Map(_) => "map",
        }
    }

    /// Value for `key` if this is a map.
    pub fn get(&self, key: &str) -> Option<&PackValue> {
        match self {
            PackValue::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PackValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(String, PackValue)]> {
        match self {
            PackValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PackValue]> {
        match self {
            PackValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            PackValue::Int(i) => u64::try_from(*i).ok(),
            PackValue::UInt(u) => Some(*u),
            _ => None,
        }
    }
}

/// Serializes [`PackValue`]s.
#[derive(Debug, Default)]
pub struct MsgPackEncoder {
    buffer: Vec<u8>,
}

impl MsgPackEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode one value into a fresh buffer.
    pub fn encode(value: &PackValue) -> Result<Vec<u8>> {
        let mut encoder = Self::new();
        encoder.write(value)?;
        Ok(encoder.finish())
    }

    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }

    pub fn write(&mut self, value: &PackValue) -> Result<()> {
        match value {
            PackValue::Nil => self.buffer.write_u8(NIL)?,
            PackValue::Bool(false) => self.buffer.write_u8(FALSE)?,
            PackValue::Bool(true) => self.buffer.write_u8(TRUE)?,
            PackValue::Int(i) => self.write_int(*i)?,
            PackValue::UInt(u) => self.write_uint(*u)?,
            PackValue::Float(f) => {
                self.buffer.write_u8(FLOAT64)?;
                self.buffer.write_f64::<BigEndian>(*f)?;
            }
            PackValue::Str(s) => {
                self.write_len(s.len(), 0xa0, 32, [STR8, STR16, STR32])?;
                self.buffer.extend_from_slice(s.as_bytes());
            }
            PackValue::Bin(b) => {
                self.write_len(b.len(), 0, 0, [BIN8, BIN16, BIN32])?;
                self.buffer.extend_from_slice(b);
            }
            PackValue::Array(items) => {
                self.write_container_len(items.len(), 0x90, ARRAY16, ARRAY32)?;
                for item in items {
                    self.write(item)?;
                }
            }
            PackValue::Map(entries) => {
                self.write_container_len(entries.len(), 0x80, MAP16, MAP32)?;
                for (key, item) in entries {
                    self.write_len(key.len(), 0xa0, 32, [STR8, STR16, STR32])?;
                    self.buffer.extend_from_slice(key.as_bytes());
                    self.write(item)?;
                }
            }
        }
        Ok(())
    }

    fn write_uint(&mut self, value: u64) -> Result<()> {
        if value < 0x80 {
            self.buffer.write_u8(value as u8)?;
        } else if value <= u8::MAX as u64 {
            self.buffer.write_u8(UINT8)?;
            self.buffer.write_u8(value as u8)?;
        } else if value <= u16::MAX as u64 {
            self.buffer.write_u8(UINT16)?;
            self.buffer.write_u16::<BigEndian>(value as u16)?;
        } else if value <= u32::MAX as u64 {
            self.buffer.write_u8(UINT32)?;
            self.buffer.write_u32::<BigEndian>(value as u32)?;
        } else {
            self.buffer.write_u8(UINT64)?;
            self.buffer.write_u64::<BigEndian>(value)?;
        }
        Ok(())
    }

    fn write_int(&mut self, value: i64) -> Result<()> {
        if value >= 0 {
            return self.write_uint(value as u64);
        }
        if value >= -32 {
            self.buffer.write_i8(value as i8)?;
        } else if value >= i8::MIN as i64 {
            self.buffer.write_u8(INT8)?;
            self.buffer.write_i8(value as i8)?;
        } else if value >= i16::MIN as i64 {
            self.buffer.write_u8(INT16)?;
            self.buffer.write_i16::<BigEndian>(value as i16)?;
        } else if value >= i32::MIN as i64 {
            self.buffer.write_u8(INT32)?;
            self.buffer.write_i32::<BigEndian>(value as i32)?;
        } else {
            self.buffer.write_u8(INT64)?;
            self.buffer.write_i64::<BigEndian>(value)?;
        }
        Ok(())
    }

    /// Length prefix for str/bin: optional fix form, then 8/16/32-bit forms.
    fn write_len(&mut self, len: usize, fix_marker: u8, fix_limit: usize, markers: [u8; 3]) -> Result<()> {
        if len < fix_limit {
            self.buffer.write_u8(fix_marker | len as u8)?;
        } else if len <= u8::MAX as usize {
            self.buffer.write_u8(markers[0])?;
            self.buffer.write_u8(len as u8)?;
        } else if len <= u16::MAX as usize {
            self.buffer.write_u8(markers[1])?;
            self.buffer.write_u16::<BigEndian>(len as u16)?;
        } else {
            let len = u32::try_from(len)
                .map_err(|_| CodecError::malformed("msgpack", format!("length {len} too large")))?;
            self.buffer.write_u8(markers[2])?;
            self.buffer.write_u32::<BigEndian>(len)?;
        }
        Ok(())
    }

    fn write_container_len(&mut self, len: usize, fix_marker: u8, m16: u8, m32: u8) -> Result<()> {
        if len < 16 {
            self.buffer.write_u8(fix_marker | len as u8)?;
        } else if len <= u16::MAX as usize {
            self.buffer.write_u8(m16)?;
            self.buffer.write_u16::<BigEndian>(len as u16)?;
        } else {
            let len = u32::try_from(len)
                .map_err(|_| CodecError::malformed("msgpack", format!("length {len} too large")))?;
            self.buffer.write_u8(m32)?;
            self.buffer.write_u32::<BigEndian>(len)?;
        }
        Ok(())
    }
}

/// Parses one MessagePack value from a byte slice.
pub struct MsgPackDecoder<'a> {
    cursor: Cursor<&'a [u8]>,
}

fn malformed(message: impl Into<String>) -> CodecError {
    CodecError::malformed("msgpack", message)
}

impl<'a> MsgPackDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Decode exactly one value spanning the whole input.
    pub fn decode(data: &'a [u8]) -> Result<PackValue> {
        let mut decoder = Self::new(data);
        let value = decoder.read(0)?;
        if decoder.remaining() != 0 {
            return Err(malformed(format!(
                "{} trailing bytes after value",
                decoder.remaining()
            )));
        }
        Ok(value)
    }

    fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    fn eof(&self) -> CodecError {
        malformed(format!(
            "unexpected end of input at offset {}",
            self.cursor.position()
        ))
    }

    fn u8(&mut self) -> Result<u8> {
        self.cursor.read_u8().map_err(|_| self.eof())
    }

    fn u16(&mut self) -> Result<u16> {
        self.cursor.read_u16::<BigEndian>().map_err(|_| self.eof())
    }

    fn u32(&mut self) -> Result<u32> {
        self.cursor.read_u32::<BigEndian>().map_err(|_| self.eof())
    }

    fn bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        if len > self.remaining() {
            return Err(malformed(format!(
                "length {len} at offset {} exceeds remaining {}",
                self.cursor.position(),
                self.remaining()
            )));
        }
        let mut buf = vec![0u8; len];
        self.cursor.read_exact(&mut buf).map_err(|_| self.eof())?;
        Ok(buf)
    }

    fn string(&mut self, len: usize) -> Result<String> {
        let bytes = self.bytes(len)?;
        String::from_utf8(bytes).map_err(|_| malformed("invalid UTF-8 in str"))
    }

    /// Container entry count, bounded by the bytes left (each entry takes one or more).
    fn entries(&mut self, count: usize) -> Result<usize> {
        if count > self.remaining() {
            return Err(malformed(format!(
                "{count} entries at offset {} exceed remaining bytes",
                self.cursor.position()
            )));
        }
        Ok(count)
    }

    pub fn read(&mut self, depth: usize) -> Result<PackValue> {
        if depth > MAX_DEPTH {
            return Err(malformed(format!("nesting deeper than {MAX_DEPTH}")));
        }
        let marker = self.u8()?;
        let value = match marker {
            0x00..=0x7f => PackValue::Int(marker as i64),
            0x80..=0x8f => self.read_map((marker & 0x0f) as usize, depth)?,
            0x90..=0x9f => self.read_array((marker & 0x0f) as usize, depth)?,
            0xa0..=0xbf => PackValue::Str(self.string((marker & 0x1f) as usize)?),
            0xe0..=0xff => PackValue::Int(marker as i8 as i64),
            NIL => PackValue::Nil,
            FALSE => PackValue::Bool(false),
            TRUE => PackValue::Bool(true),
            BIN8 => {
                let len = self.u8()? as usize;
                PackValue::Bin(self.bytes(len)?)
            }
            BIN16 => {
                let len = self.u16()? as usize;
                PackValue::Bin(self.bytes(len)?)
            }
            BIN32 => {
                let len = self.u32()? as usize;
                PackValue::Bin(self.bytes(len)?)
            }
            FLOAT32 => PackValue::Float(
                self.cursor.read_f32::<BigEndian>().map_err(|_| self.eof())? as f64,
            ),
            FLOAT64 => PackValue::Float(self.cursor.read_f64::<BigEndian>().map_err(|_| self.eof())?),
            UINT8 => PackValue::Int(self.u8()? as i64),
            UINT16 => PackValue::Int(self.u16()? as i64),
            UINT32 => PackValue::Int(self.u32()? as i64),
            UINT64 => {
                let v = self.cursor.read_u64::<BigEndian>().map_err(|_| self.eof())?;
                i64::try_from(v).map_or(PackValue::UInt(v), PackValue::Int)
            }
            INT8 => PackValue::Int(self.cursor.read_i8().map_err(|_| self.eof())? as i64),
            INT16 => PackValue::Int(self.cursor.read_i16::<BigEndian>().map_err(|_| self.eof())? as i64),
            INT32 => PackValue::Int(self.cursor.read_i32::<BigEndian>().map_err(|_| self.eof())? as i64),
            INT64 => PackValue::Int(self.cursor.read_i64::<BigEndian>().map_err(|_| self.eof())?),
            STR8 => {
                let len = self.u8()? as usize;
                PackValue::Str(self.string(len)?)
            }
            STR16 => {
                let len = self.u16()? as usize;
                PackValue::Str(self.string(len)?)
            }
            STR32 => {
                let len = self.u32()? as usize;
                PackValue::Str(self.string(len)?)
            }
            ARRAY16 => {
                let len = self.u16()? as usize;
                self.read_array(len, depth)?
            }
            ARRAY32 => {
                let len = self.u32()? as usize;
                self.read_array(len, depth)?
            }
            MAP16 => {
                let len = self.u16()? as usize;
                self.read_map(len, depth)?
            }
            MAP32 => {
                let len = self.u32()? as usize;
                self.read_map(len, depth)?
            }
            other => {
                return Err(malformed(format!(
                    "unsupported marker {other:#04x} at offset {}",
                    self.cursor.position() - 1
                )))
            }
        };
        Ok(value)
    }

    fn read_array(&mut self, len: usize, depth: usize) -> Result<PackValue> {
        let len = self.entries(len)?;
        (0..len)
            .map(|_| self.read(depth + 1))
            .collect::<Result<Vec<_>>>()
            .map(PackValue::Array)
    }

    fn read_map(&mut self, len: usize, depth: usize) -> Result<PackValue> {
        let len = self.entries(len.saturating_mul(2))? / 2;
        let mut entries: Vec<(String, PackValue)> = Vec::with_capacity(len);
        for _ in 0..len {
            let key = match self.read(depth + 1)? {
                PackValue::Str(s) => s,
                other => {
                    return Err(malformed(format!(
                        "map key must be str, got {}",
                        other.type_name()
                    )))
                }
            };
            if entries.iter().any(|(k, _)| *k == key) {
                return Err(malformed(format!("duplicate map key '{key}'")));
            }
            let value = self.read(depth + 1)?;
            entries.push((key, value));
        }
        Ok(PackValue::Map(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: PackValue) -> PackValue {
        let bytes = MsgPackEncoder::encode(&value).unwrap();
        MsgPackDecoder::decode(&bytes).unwrap()
    }

    #[test]
    fn test_int_boundaries() {
        for v in [
            0i64, 1, 127, 128, 255, 256, 65535, 65536, -1, -32, -33, -128, -129, -32768,
            -32769, i32::MIN as i64, i64::MIN, i64::MAX,
        ] {
            assert_eq!(roundtrip(PackValue::Int(v)), PackValue::Int(v), "{v}");
        }
        assert_eq!(roundtrip(PackValue::UInt(u64::MAX)), PackValue::UInt(u64::MAX));
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(MsgPackEncoder::encode(&PackValue::Int(-1)).unwrap(), vec![0xff]);
        assert_eq!(MsgPackEncoder::encode(&PackValue::Int(200)).unwrap(), vec![0xcc, 200]);
        assert_eq!(
            MsgPackEncoder::encode(&PackValue::str("kind")).unwrap(),
            vec![0xa4, b'k', b'i', b'n', b'd']
        );
        assert_eq!(
            MsgPackEncoder::encode(&PackValue::Bin(vec![1, 2])).unwrap(),
            vec![0xc4, 2, 1, 2]
        );
    }

    #[test]
    fn test_nested_roundtrip() {
        let value = PackValue::map([
            ("name", PackValue::str("x".repeat(300))),
            ("data", PackValue::Bin(vec![7u8; 70000])),
            ("items", PackValue::Array((0..20).map(PackValue::Int).collect())),
            ("pi", PackValue::Float(std::f64::consts::PI)),
            ("none", PackValue::Nil),
            ("empty", PackValue::Map(Vec::new())),
        ]);
        assert_eq!(roundtrip(value.clone()), value);
    }

    #[test]
    fn test_rejects_bad_input() {
        // truncated str
        assert!(MsgPackDecoder::decode(&[0xa4, b'k']).is_err());
        // non-string key
        assert!(MsgPackDecoder::decode(&[0x81, 0x01, 0x02]).is_err());
        // trailing bytes
        assert!(MsgPackDecoder::decode(&[0xc0, 0xc0]).is_err());
        // ext types are not supported
        assert!(MsgPackDecoder::decode(&[0xd4, 0x01, 0x00]).is_err());
        // huge declared array
        assert!(MsgPackDecoder::decode(&[0xdd, 0xff, 0xff, 0xff, 0xff]).is_err());
    }
}
