// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Format detection using magic numbers.
//!
//! Containers start with an 8-byte signature. Compact payloads are a
//! MessagePack map whose first key is `kind`, which gives them a stable
//! prefix too. The file extension is only consulted when the content is
//! inconclusive.
//!
//! ```rust
//! use radiocodec::io::detection::{detect_bytes, DetectedFormat};
//!
//! assert_eq!(detect_bytes(b"\x89RDC\r\n\x1a\n\x01\x00"), DetectedFormat::Container);
//! assert_eq!(detect_bytes(b"\x85\xa4kind"), DetectedFormat::Compact);
//! assert_eq!(detect_bytes(b"plain text"), DetectedFormat::Unknown);
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::encoding::container::CONTAINER_MAGIC;
use crate::encoding::WireFormat;
use crate::Result;

/// Outcome of format detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFormat {
    Container,
    Compact,
    Unknown,
}

impl DetectedFormat {
    pub fn wire_format(&self) -> Option<WireFormat> {
        match self {
            DetectedFormat::Container => Some(WireFormat::Container),
            DetectedFormat::Compact => Some(WireFormat::Compact),
            DetectedFormat::Unknown => None,
        }
    }
}

/// First key of every compact payload, as a MessagePack fixstr.
const COMPACT_KIND_KEY: &[u8] = b"\xa4kind";

/// Bytes needed to recognise either format.
const PROBE_LEN: usize = 16;

/// Detect the format of an in-memory payload.
pub fn detect_bytes(data: &[u8]) -> DetectedFormat {
    if data.starts_with(CONTAINER_MAGIC) {
        return DetectedFormat::Container;
    }
    if is_compact_prefix(data) {
        return DetectedFormat::Compact;
    }
    DetectedFormat::Unknown
}

fn is_compact_prefix(data: &[u8]) -> bool {
    let key_at = match data.first() {
        Some(0x80..=0x8f) => 1,
        Some(0xde) => 3,
        Some(0xdf) => 5,
        _ => return false,
    };
    data.get(key_at..).is_some_and(|rest| rest.starts_with(COMPACT_KIND_KEY))
}

/// Detect the format of a file from its content, then its extension.
pub fn detect_format<P: AsRef<Path>>(path: P) -> Result<DetectedFormat> {
    let path = path.as_ref();
    let mut header = Vec::with_capacity(PROBE_LEN);
    File::open(path)?
        .take(PROBE_LEN as u64)
        .read_to_end(&mut header)?;

    match detect_bytes(&header) {
        DetectedFormat::Unknown => Ok(detect_from_extension(path)),
        known => Ok(known),
    }
}

/// Guess from the extension alone.
pub fn detect_from_extension(path: &Path) -> DetectedFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(WireFormat::Container.extension()) => {
            DetectedFormat::Container
        }
        Some(ext) if ext.eq_ignore_ascii_case(WireFormat::Compact.extension()) => {
            DetectedFormat::Compact
        }
        _ => DetectedFormat::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_bytes() {
        assert_eq!(detect_bytes(CONTAINER_MAGIC), DetectedFormat::Container);
        assert_eq!(detect_bytes(b"\xde\x00\x10\xa4kind"), DetectedFormat::Compact);
        assert_eq!(detect_bytes(b"\x85\xa4name"), DetectedFormat::Unknown);
        assert_eq!(detect_bytes(b""), DetectedFormat::Unknown);
        assert_eq!(detect_bytes(b"\x89HDF\r\n\x1a\n"), DetectedFormat::Unknown);
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(detect_from_extension(Path::new("a.RDC")), DetectedFormat::Container);
        assert_eq!(detect_from_extension(Path::new("a.rdm")), DetectedFormat::Compact);
        assert_eq!(detect_from_extension(Path::new("a.h5")), DetectedFormat::Unknown);
    }

    #[test]
    fn test_missing_file_is_io_failure() {
        let err = detect_format("/definitely/not/here.rdc").unwrap_err();
        assert!(matches!(err, crate::CodecError::IoFailure { .. }));
    }
}
