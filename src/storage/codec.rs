//! Framed binary encoding of artifacts.
//!
//! Every binary artifact is a bincode payload behind a fixed header:
//!
//! ```text
//! +--------+---------+---------+-------------+-----------------+
//! | "VRTY" | version | crc32   | payload len | bincode payload |
//! | 4 B    | u32 LE  | u32 LE  | u64 LE      | len B           |
//! +--------+---------+---------+-------------+-----------------+
//! ```
//!
//! bincode stores `f64` values bit for bit, so decoded models score exactly
//! like the ones that were written.

use std::io::{Cursor, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, VerityError};

/// File magic.
pub const MAGIC: &[u8; 4] = b"VRTY";

/// Version of the frame and payload layout.
pub const FORMAT_VERSION: u32 = 1;

/// Size of the frame header in bytes.
pub const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Serialize `value` into a framed byte buffer.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let payload = bincode::serialize(value)
        .map_err(|e| VerityError::serialization(format!("failed to encode artifact: {e}")))?;

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.write_all(MAGIC)?;
    frame.write_u32::<LittleEndian>(FORMAT_VERSION)?;
    frame.write_u32::<LittleEndian>(crc32fast::hash(&payload))?;
    frame.write_u64::<LittleEndian>(payload.len() as u64)?;
    frame.write_all(&payload)?;
    Ok(frame)
}

/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u32,
    pub checksum: u32,
    pub payload_len: u64,
}

/// Read and check the header of `frame`.
pub fn read_header(frame: &[u8]) -> Result<FrameHeader> {
    if frame.len() < HEADER_LEN {
        return Err(VerityError::load(format!(
            "artifact truncated: {} bytes, header needs {HEADER_LEN}",
            frame.len()
        )));
    }
    if &frame[..4] != MAGIC {
        return Err(VerityError::load("not a verity artifact (bad magic)"));
    }

    let mut cursor = Cursor::new(&frame[4..HEADER_LEN]);
    let version = cursor.read_u32::<LittleEndian>()?;
    let checksum = cursor.read_u32::<LittleEndian>()?;
    let payload_len = cursor.read_u64::<LittleEndian>()?;

    if version != FORMAT_VERSION {
        return Err(VerityError::load(format!(
            "unsupported artifact format version {version} (expected {FORMAT_VERSION})"
        )));
    }

    Ok(FrameHeader {
        version,
        checksum,
        payload_len,
    })
}

/// Deserialize a framed artifact, verifying length and checksum first.
///
/// Every failure is a [`VerityError::Load`].
pub fn decode<T: DeserializeOwned>(frame: &[u8]) -> Result<T> {
    let header = read_header(frame)?;
    let payload = &frame[HEADER_LEN..];

    if payload.len() as u64 != header.payload_len {
        return Err(VerityError::load(format!(
            "artifact length mismatch: header says {} bytes, found {}",
            header.payload_len,
            payload.len()
        )));
    }
    if crc32fast::hash(payload) != header.checksum {
        return Err(VerityError::load("artifact checksum mismatch"));
    }

    bincode::deserialize(payload)
        .map_err(|e| VerityError::load(format!("failed to decode artifact: {e}")))
}
