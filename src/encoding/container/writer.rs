// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Container serializer: node tree to bytes.

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::trace;

use super::node::*;
use super::{CONTAINER_MAGIC, CONTAINER_VERSION, FLAG_CHECKSUM};
use crate::core::{ArrayData, AttrValue, Attributes, CodecError, Result};
use crate::io::options::{Compression, WriterConfig};

/// Serializes a node tree into an in-memory buffer.
pub struct ContainerWriter<'a> {
    config: &'a WriterConfig,
    buffer: Vec<u8>,
}

impl<'a> ContainerWriter<'a> {
    pub fn new(config: &'a WriterConfig) -> Self {
        Self {
            config,
            buffer: Vec::new(),
        }
    }

    /// Write a complete document rooted at `root`.
    pub fn write_document(mut self, root: &Group) -> Result<Vec<u8>> {
        self.buffer.extend_from_slice(CONTAINER_MAGIC);
        self.buffer.write_u16::<LittleEndian>(CONTAINER_VERSION)?;
        let flags = if self.config.checksum { FLAG_CHECKSUM } else { 0 };
        self.buffer.write_u16::<LittleEndian>(flags)?;

        self.write_group(root)?;

        if self.config.checksum {
            let crc = crc32fast::hash(&self.buffer[CONTAINER_MAGIC.len()..]);
            self.buffer.write_u32::<LittleEndian>(crc)?;
        }
        Ok(self.buffer)
    }

    fn write_group(&mut self, group: &Group) -> Result<()> {
        trace!(name = %group.name, children = group.children.len(), "Writing group");
        self.buffer.write_u8(OP_GROUP)?;
        write_str(&mut self.buffer, &group.name)?;
        write_attrset(&mut self.buffer, &group.attrs)?;
        write_len_u32(&mut self.buffer, group.children.len(), "group children")?;
        for child in &group.children {
            match child {
                Node::Group(g) => self.write_group(g)?,
                Node::Dataset(d) => self.write_dataset(d)?,
            }
        }
        Ok(())
    }

    fn write_dataset(&mut self, dataset: &Dataset) -> Result<()> {
        let raw = dataset.data.to_le_bytes()?;
        trace!(
            name = %dataset.name,
            dtype = %dataset.data.dtype(),
            bytes = raw.len(),
            "Writing dataset"
        );
        self.buffer.write_u8(OP_DATASET)?;
        write_str(&mut self.buffer, &dataset.name)?;
        write_attrset(&mut self.buffer, &dataset.attrs)?;
        write_array_header(&mut self.buffer, &dataset.data)?;

        match self.config.compression {
            Compression::None => {
                self.buffer.write_u8(COMPRESSION_NONE)?;
                self.buffer.write_u64::<LittleEndian>(raw.len() as u64)?;
                self.buffer.extend_from_slice(&raw);
            }
            Compression::Zstd { level } => {
                let compressed = zstd::bulk::compress(&raw, level).map_err(|e| {
                    CodecError::malformed("container", format!("zstd compression failed: {e}"))
                })?;
                self.buffer.write_u8(COMPRESSION_ZSTD)?;
                self.buffer.write_u64::<LittleEndian>(compressed.len() as u64)?;
                self.buffer.extend_from_slice(&compressed);
            }
        }
        Ok(())
    }
}

fn write_len_u32(buffer: &mut Vec<u8>, len: usize, what: &str) -> Result<()> {
    let len = u32::try_from(len)
        .map_err(|_| CodecError::malformed("container", format!("{what} count {len} too large")))?;
    buffer.write_u32::<LittleEndian>(len)?;
    Ok(())
}

fn write_str(buffer: &mut Vec<u8>, value: &str) -> Result<()> {
    write_len_u32(buffer, value.len(), "string byte")?;
    buffer.extend_from_slice(value.as_bytes());
    Ok(())
}

/// `u8 dtype, u32 ndim, u64 shape[ndim]`
fn write_array_header(buffer: &mut Vec<u8>, data: &ArrayData) -> Result<()> {
    buffer.write_u8(data.dtype().tag())?;
    write_len_u32(buffer, data.ndim(), "dimension")?;
    for &extent in data.shape() {
        buffer.write_u64::<LittleEndian>(extent as u64)?;
    }
    Ok(())
}

fn write_attrset(buffer: &mut Vec<u8>, attrs: &Attributes) -> Result<()> {
    write_len_u32(buffer, attrs.len(), "attribute")?;
    for (key, value) in attrs {
        write_str(buffer, key)?;
        write_value(buffer, value)?;
    }
    Ok(())
}

fn write_value(buffer: &mut Vec<u8>, value: &AttrValue) -> Result<()> {
    match value {
        AttrValue::Bool(b) => {
            buffer.write_u8(TAG_BOOL)?;
            buffer.write_u8(*b as u8)?;
        }
        AttrValue::Int(i) => {
            buffer.write_u8(TAG_INT)?;
            buffer.write_i64::<LittleEndian>(*i)?;
        }
        AttrValue::Float(f) => {
            buffer.write_u8(TAG_FLOAT)?;
            buffer.write_f64::<LittleEndian>(*f)?;
        }
        AttrValue::String(s) => {
            buffer.write_u8(TAG_STRING)?;
            write_str(buffer, s)?;
        }
        AttrValue::Array(a) => {
            buffer.write_u8(TAG_ARRAY)?;
            write_array_header(buffer, a)?;
            let raw = a.to_le_bytes()?;
            buffer.write_u64::<LittleEndian>(raw.len() as u64)?;
            buffer.extend_from_slice(&raw);
        }
        AttrValue::List(items) => {
            buffer.write_u8(TAG_LIST)?;
            write_len_u32(buffer, items.len(), "list item")?;
            for item in items {
                write_value(buffer, item)?;
            }
        }
        AttrValue::Map(map) => {
            buffer.write_u8(TAG_MAP)?;
            write_attrset(buffer, map)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let config = WriterConfig {
            compression: Compression::None,
            checksum: false,
        };
        let bytes = ContainerWriter::new(&config)
            .write_document(&Group::new(""))
            .unwrap();
        assert_eq!(&bytes[..8], CONTAINER_MAGIC);
        assert_eq!(&bytes[8..10], &[1, 0]);
        assert_eq!(&bytes[10..12], &[0, 0]);
        // op, empty name, zero attrs, zero children
        assert_eq!(&bytes[12..], &[OP_GROUP, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_checksum_appended() {
        let config = WriterConfig::default();
        let bytes = ContainerWriter::new(&config)
            .write_document(&Group::new(""))
            .unwrap();
        let (body, crc) = bytes.split_at(bytes.len() - 4);
        assert_eq!(&bytes[10..12], &[FLAG_CHECKSUM as u8, 0]);
        assert_eq!(
            crc,
            crc32fast::hash(&body[CONTAINER_MAGIC.len()..]).to_le_bytes()
        );
    }
}
