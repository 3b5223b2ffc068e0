// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Container parser: bytes to node tree.
//!
//! Every length read from the input is checked against the bytes that remain
//! before anything is allocated, so truncated or corrupt input fails with
//! `MalformedPayload` instead of over-allocating. Compressed datasets are
//! inflated into a buffer sized from their header, after that size has been
//! checked against the reader's payload limit.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::{trace, warn};

use super::node::*;
use super::{CONTAINER_MAGIC, CONTAINER_VERSION, FLAG_CHECKSUM};
use crate::core::{num_elements, ArrayData, AttrValue, Attributes, CodecError, DType, Result};
use crate::io::options::ReaderConfig;

/// Deepest group/value nesting accepted.
pub const MAX_DEPTH: usize = 64;

/// Parses a complete container document.
pub struct ContainerReader<'a> {
    cursor: Cursor<&'a [u8]>,
    config: &'a ReaderConfig,
}

fn malformed(message: impl Into<String>) -> CodecError {
    CodecError::malformed("container", message)
}

fn zstd_failed(dataset: &str, err: std::io::Error) -> CodecError {
    malformed(format!("zstd decompression of dataset '{dataset}' failed: {err}"))
}

impl<'a> ContainerReader<'a> {
    /// Validate the header and trailer, returning a reader positioned at the
    /// root node.
    pub fn new(data: &'a [u8], config: &'a ReaderConfig) -> Result<Self> {
        config.check_size("container", data.len() as u64)?;
        if data.len() < CONTAINER_MAGIC.len() + 4 || &data[..CONTAINER_MAGIC.len()] != CONTAINER_MAGIC {
            return Err(malformed("missing container magic"));
        }
        let mut header = Cursor::new(&data[CONTAINER_MAGIC.len()..]);
        let version = header.read_u16::<LittleEndian>()?;
        let flags = header.read_u16::<LittleEndian>()?;
        if version != CONTAINER_VERSION {
            return Err(malformed(format!("unsupported container version {version}")));
        }

        let body_end = if flags & FLAG_CHECKSUM != 0 {
            if data.len() < CONTAINER_MAGIC.len() + 8 {
                return Err(malformed("truncated before checksum"));
            }
            let split = data.len() - 4;
            let (body, trailer) = data.split_at(split);
            if config.verify_checksum {
                let stored = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
                let actual = crc32fast::hash(&body[CONTAINER_MAGIC.len()..]);
                if stored != actual {
                    return Err(malformed(format!(
                        "checksum mismatch: stored {stored:#010x}, computed {actual:#010x}"
                    )));
                }
            }
            split
        } else {
            warn!("Container has no checksum; skipping integrity check");
            data.len()
        };

        let mut cursor = Cursor::new(&data[..body_end]);
        cursor.set_position((CONTAINER_MAGIC.len() + 4) as u64);
        Ok(Self { cursor, config })
    }

    /// Parse the root group; the body must end exactly after it.
    pub fn read_document(mut self) -> Result<Group> {
        let root = match self.read_node(0)? {
            Node::Group(g) => g,
            Node::Dataset(d) => {
                return Err(malformed(format!("root node '{}' is a dataset", d.name)))
            }
        };
        if self.remaining() != 0 {
            return Err(malformed(format!("{} trailing bytes after root", self.remaining())));
        }
        Ok(root)
    }

    fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    fn offset(&self) -> u64 {
        self.cursor.position()
    }

    fn truncated(&self, what: &str) -> CodecError {
        malformed(format!("truncated {what} at offset {}", self.offset()))
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        self.cursor.read_u8().map_err(|_| self.truncated(what))
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| self.truncated(what))
    }

    fn u64(&mut self, what: &str) -> Result<u64> {
        self.cursor
            .read_u64::<LittleEndian>()
            .map_err(|_| self.truncated(what))
    }

    fn bytes(&mut self, len: u64, what: &str) -> Result<Vec<u8>> {
        if len > self.remaining() as u64 {
            return Err(malformed(format!(
                "{what} of {len} bytes at offset {} exceeds remaining {}",
                self.offset(),
                self.remaining()
            )));
        }
        let mut buf = vec![0u8; len as usize];
        self.cursor
            .read_exact(&mut buf)
            .map_err(|_| self.truncated(what))?;
        Ok(buf)
    }

    /// A count of items that each take at least `min_item_bytes`.
    fn count(&mut self, min_item_bytes: usize, what: &str) -> Result<usize> {
        let count = self.u32(what)? as usize;
        if count.saturating_mul(min_item_bytes) > self.remaining() {
            return Err(malformed(format!(
                "{what} count {count} at offset {} exceeds remaining bytes",
                self.offset()
            )));
        }
        Ok(count)
    }

    fn string(&mut self, what: &str) -> Result<String> {
        let len = self.u32(what)?;
        let bytes = self.bytes(len as u64, what)?;
        String::from_utf8(bytes).map_err(|e| malformed(format!("{what} is not UTF-8: {e}")))
    }

    fn read_node(&mut self, depth: usize) -> Result<Node> {
        if depth > MAX_DEPTH {
            return Err(malformed(format!("nesting deeper than {MAX_DEPTH}")));
        }
        let op = self.u8("node op")?;
        let name = self.string("node name")?;
        let attrs = self.read_attrset(depth)?;
        match op {
            OP_GROUP => {
                let count = self.count(2, "group children")?;
                trace!(name = %name, children = count, "Reading group");
                let children = (0..count)
                    .map(|_| self.read_node(depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Node::Group(Group {
                    name,
                    attrs,
                    children,
                }))
            }
            OP_DATASET => {
                let (dtype, shape) = self.read_array_header()?;
                let compression = self.u8("dataset compression")?;
                let len = self.u64("dataset length")?;
                let stored = self.bytes(len, "dataset payload")?;
                let raw = match compression {
                    COMPRESSION_NONE => stored,
                    COMPRESSION_ZSTD => self.inflate(&name, dtype, &shape, &stored)?,
                    other => {
                        return Err(malformed(format!(
                            "dataset '{name}' has unknown compression {other}"
                        )))
                    }
                };
                trace!(name = %name, dtype = %dtype, bytes = raw.len(), "Reading dataset");
                let data = ArrayData::from_le_bytes(dtype, &shape, &raw)?;
                Ok(Node::Dataset(Dataset { name, attrs, data }))
            }
            other => Err(malformed(format!(
                "unknown node op {other:#04x} for '{name}'"
            ))),
        }
    }

    fn inflate(&self, name: &str, dtype: DType, shape: &[usize], stored: &[u8]) -> Result<Vec<u8>> {
        let Some(width) = dtype.byte_width() else {
            return self.inflate_unsized(name, stored);
        };
        let expected = num_elements(shape)?
            .checked_mul(width)
            .ok_or_else(|| malformed(format!("dataset '{name}' shape {shape:?} overflows")))?;
        self.config.check_size("container", expected as u64)?;
        let raw = zstd::bulk::decompress(stored, expected).map_err(|e| zstd_failed(name, e))?;
        if raw.len() != expected {
            return Err(malformed(format!(
                "dataset '{name}' inflated to {} bytes, header declares {expected}",
                raw.len()
            )));
        }
        Ok(raw)
    }

    /// String payloads carry no size in their header: stream them, stopping
    /// one byte past the payload limit.
    fn inflate_unsized(&self, name: &str, stored: &[u8]) -> Result<Vec<u8>> {
        let mut decoder =
            zstd::stream::read::Decoder::new(stored).map_err(|e| zstd_failed(name, e))?;
        let mut raw = Vec::new();
        match self.config.max_payload_bytes {
            Some(max) => decoder
                .take(max.saturating_add(1))
                .read_to_end(&mut raw)
                .map_err(|e| zstd_failed(name, e))?,
            None => decoder
                .read_to_end(&mut raw)
                .map_err(|e| zstd_failed(name, e))?,
        };
        self.config.check_size("container", raw.len() as u64)?;
        Ok(raw)
    }

    fn read_array_header(&mut self) -> Result<(DType, Vec<usize>)> {
        let dtype = DType::from_tag(self.u8("dtype")?)?;
        let ndim = self.count(8, "dimension")?;
        let shape = (0..ndim)
            .map(|_| {
                let extent = self.u64("shape")?;
                usize::try_from(extent).map_err(|_| malformed(format!("extent {extent} too large")))
            })
            .collect::<Result<Vec<_>>>()?;
        num_elements(&shape)?;
        Ok((dtype, shape))
    }

    fn read_attrset(&mut self, depth: usize) -> Result<Attributes> {
        // key length + value tag
        let count = self.count(5, "attribute")?;
        let mut attrs = Attributes::new();
        for _ in 0..count {
            let key = self.string("attribute key")?;
            let value = self.read_value(depth + 1)?;
            if attrs.insert(key.clone(), value).is_some() {
                return Err(malformed(format!("duplicate attribute key '{key}'")));
            }
        }
        Ok(attrs)
    }

    fn read_value(&mut self, depth: usize) -> Result<AttrValue> {
        if depth > MAX_DEPTH {
            return Err(malformed(format!("nesting deeper than {MAX_DEPTH}")));
        }
        let tag = self.u8("value tag")?;
        let value = match tag {
            TAG_BOOL => match self.u8("bool")? {
                0 => AttrValue::Bool(false),
                1 => AttrValue::Bool(true),
                other => return Err(malformed(format!("bool byte {other}"))),
            },
            TAG_INT => AttrValue::Int(
                self.cursor
                    .read_i64::<LittleEndian>()
                    .map_err(|_| self.truncated("int"))?,
            ),
            TAG_FLOAT => AttrValue::Float(
                self.cursor
                    .read_f64::<LittleEndian>()
                    .map_err(|_| self.truncated("float"))?,
            ),
            TAG_STRING => AttrValue::String(self.string("string value")?),
            TAG_ARRAY => {
                let (dtype, shape) = self.read_array_header()?;
                let len = self.u64("array length")?;
                let raw = self.bytes(len, "array payload")?;
                AttrValue::Array(ArrayData::from_le_bytes(dtype, &shape, &raw)?)
            }
            TAG_LIST => {
                let count = self.count(1, "list item")?;
                AttrValue::List(
                    (0..count)
                        .map(|_| self.read_value(depth + 1))
                        .collect::<Result<Vec<_>>>()?,
                )
            }
            TAG_MAP => AttrValue::Map(self.read_attrset(depth)?),
            other => return Err(malformed(format!("unknown value tag {other}"))),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::super::writer::ContainerWriter;
    use super::*;
    use crate::attrs;
    use crate::io::options::WriterConfig;

    fn sample_tree() -> Group {
        let mut root = Group::new("").with_attrs(attrs! { "number_data_models" => 1i64 });
        let mut child = Group::new("Image0").with_attrs(attrs! {
            "nested" => attrs! { "list" => vec![AttrValue::from(1i64), "two".into()] },
            "flag" => true,
            "beam" => ArrayData::vector(vec![0.1f64, 0.2]),
        });
        child.push_dataset(
            "pixels",
            attrs! { "units" => "Jy" },
            ArrayData::from_shape_vec(&[2, 2], vec![1.0f32, 2.0, 3.0, 4.0]).unwrap(),
        );
        root.push_group(child);
        root
    }

    fn roundtrip(writer: &WriterConfig) -> Group {
        let bytes = ContainerWriter::new(writer)
            .write_document(&sample_tree())
            .unwrap();
        let reader = ReaderConfig::default();
        ContainerReader::new(&bytes, &reader)
            .unwrap()
            .read_document()
            .unwrap()
    }

    #[test]
    fn test_tree_roundtrip() {
        assert_eq!(roundtrip(&WriterConfig::default()), sample_tree());
        let zstd = WriterConfig {
            compression: crate::io::options::Compression::Zstd { level: 3 },
            checksum: false,
        };
        assert_eq!(roundtrip(&zstd), sample_tree());
    }

    #[test]
    fn test_corrupt_byte_fails_checksum() {
        let mut bytes = ContainerWriter::new(&WriterConfig::default())
            .write_document(&sample_tree())
            .unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;
        let config = ReaderConfig::default();
        let err = ContainerReader::new(&bytes, &config).err().unwrap();
        assert!(matches!(err, CodecError::MalformedPayload { .. }));
    }

    #[test]
    fn test_truncation_is_malformed() {
        let config = WriterConfig {
            compression: crate::io::options::Compression::None,
            checksum: false,
        };
        let bytes = ContainerWriter::new(&config)
            .write_document(&sample_tree())
            .unwrap();
        let reader = ReaderConfig::default();
        for cut in [13, 20, bytes.len() / 2, bytes.len() - 1] {
            let result = ContainerReader::new(&bytes[..cut], &reader).and_then(|r| r.read_document());
            assert!(
                matches!(result, Err(CodecError::MalformedPayload { .. })),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn test_size_limit() {
        let bytes = ContainerWriter::new(&WriterConfig::default())
            .write_document(&sample_tree())
            .unwrap();
        let reader = ReaderConfig {
            max_payload_bytes: Some(16),
            verify_checksum: true,
        };
        assert!(ContainerReader::new(&bytes, &reader).is_err());
    }

    /// An unchecksummed document whose root holds one zstd dataset with the
    /// given header and stored bytes.
    fn zstd_document(dtype: DType, shape: &[u64], stored: &[u8]) -> Vec<u8> {
        use byteorder::WriteBytesExt;
        let mut out = CONTAINER_MAGIC.to_vec();
        out.write_u16::<LittleEndian>(CONTAINER_VERSION).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        // root group: op, empty name, no attrs, one child
        out.write_u8(OP_GROUP).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(1).unwrap();
        out.write_u8(OP_DATASET).unwrap();
        out.write_u32::<LittleEndian>(1).unwrap();
        out.push(b'd');
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u8(dtype.tag()).unwrap();
        out.write_u32::<LittleEndian>(shape.len() as u32).unwrap();
        for &extent in shape {
            out.write_u64::<LittleEndian>(extent).unwrap();
        }
        out.write_u8(COMPRESSION_ZSTD).unwrap();
        out.write_u64::<LittleEndian>(stored.len() as u64).unwrap();
        out.extend_from_slice(stored);
        out
    }

    fn limited(max: u64) -> ReaderConfig {
        ReaderConfig {
            max_payload_bytes: Some(max),
            verify_checksum: true,
        }
    }

    #[test]
    fn test_declared_size_checked_before_inflating() {
        // The stored bytes are not zstd at all: only a check that runs before
        // decompression can produce the size-limit error.
        let bytes = zstd_document(DType::Float64, &[1 << 30], &[0xde, 0xad, 0xbe, 0xef]);
        let config = limited(1 << 20);
        let err = ContainerReader::new(&bytes, &config)
            .and_then(|r| r.read_document())
            .unwrap_err();
        match err {
            CodecError::MalformedPayload { message, .. } => {
                assert!(message.contains("8589934592 bytes exceeds limit"), "{message}")
            }
            other => panic!("expected MalformedPayload, got {other}"),
        }
    }

    #[test]
    fn test_highly_compressed_dataset_rejected() {
        let zeros = vec![0u8; 8 << 20];
        let stored = zstd::bulk::compress(&zeros, 19).unwrap();
        let bytes = zstd_document(DType::Float64, &[1 << 20], &stored);
        assert!(bytes.len() < 64 << 10);

        let config = limited(1 << 20);
        let err = ContainerReader::new(&bytes, &config)
            .and_then(|r| r.read_document())
            .unwrap_err();
        assert!(matches!(err, CodecError::MalformedPayload { .. }), "{err}");

        let config = limited(16 << 20);
        let root = ContainerReader::new(&bytes, &config)
            .unwrap()
            .read_document()
            .unwrap();
        assert_eq!(root.dataset("d").unwrap().data.shape(), &[1 << 20]);
    }

    #[test]
    fn test_inflated_length_must_match_header() {
        let three = ArrayData::vector(vec![1.0f64, 2.0, 3.0]).to_le_bytes().unwrap();
        let stored = zstd::bulk::compress(&three, 3).unwrap();
        for declared in [2u64, 4] {
            let bytes = zstd_document(DType::Float64, &[declared], &stored);
            let config = ReaderConfig::default();
            let err = ContainerReader::new(&bytes, &config)
                .and_then(|r| r.read_document())
                .unwrap_err();
            assert!(matches!(err, CodecError::MalformedPayload { .. }), "{declared}: {err}");
        }
    }

    #[test]
    fn test_compressed_strings_bounded_by_limit() {
        let long = ArrayData::vector(vec!["y".repeat(4096); 64]).to_le_bytes().unwrap();
        let stored = zstd::bulk::compress(&long, 19).unwrap();
        let bytes = zstd_document(DType::String, &[64], &stored);
        let config = limited(64 << 10);
        let err = ContainerReader::new(&bytes, &config)
            .and_then(|r| r.read_document())
            .unwrap_err();
        assert!(matches!(err, CodecError::MalformedPayload { .. }), "{err}");
        let config = ReaderConfig::default();
        assert!(ContainerReader::new(&bytes, &config)
            .and_then(|r| r.read_document())
            .is_ok());
    }

    #[test]
    fn test_not_a_container() {
        let config = ReaderConfig::default();
        assert!(ContainerReader::new(b"\x89HDF\r\n\x1a\n\0\0\0\0", &config).is_err());
    }
}
