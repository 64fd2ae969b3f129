//! Savegame framing shared by the engine and its tools.
//!
//! A save file is a fixed-size header followed by a MessagePack payload.
//! Keeping the framing here lets the engine evolve its snapshot struct while
//! readers can still reject foreign or truncated files up front.

use std::convert::TryFrom;
use std::io::{Read, Write};

use bytes::Buf;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use thiserror::Error;

/// Bytes that prefix every save file ("BBVS").
pub const HEADER_MAGIC: [u8; 4] = *b"BBVS";

/// Snapshot layout revision understood by this crate.
pub const FORMAT_VERSION: u16 = 0x0001;

/// Length of the binary header in bytes.
pub const HEADER_LEN: usize = 4 + 2 + 2 + 4;

/// Why a save was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr, Hash)]
#[repr(u16)]
pub enum SaveKind {
    /// Requested by the player.
    Manual = 0x0001,
    /// Written automatically on every scene change.
    Continue = 0x0002,
}

impl TryFrom<u16> for SaveKind {
    type Error = ();

    fn try_from(value: u16) -> std::result::Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(Self::Manual),
            0x0002 => Ok(Self::Continue),
            _ => Err(()),
        }
    }
}

/// Envelope describing the payload that follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveHeader {
    pub version: u16,
    pub kind: SaveKind,
    pub length: u32,
}

impl SaveHeader {
    /// Encode the header as big-endian bytes.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(&HEADER_MAGIC);
        out[4..6].copy_from_slice(&self.version.to_be_bytes());
        out[6..8].copy_from_slice(&(self.kind as u16).to_be_bytes());
        out[8..12].copy_from_slice(&self.length.to_be_bytes());
        out
    }

    /// Decode a header from raw bytes.
    pub fn decode(input: &[u8]) -> Result<Self, SaveError> {
        if input.len() < HEADER_LEN {
            return Err(SaveError::TruncatedHeader);
        }
        if input[..4] != HEADER_MAGIC {
            return Err(SaveError::BadMagic);
        }
        let mut version_bytes = &input[4..6];
        let version = version_bytes.get_u16();
        if version != FORMAT_VERSION {
            return Err(SaveError::UnsupportedVersion(version));
        }
        let mut kind_bytes = &input[6..8];
        let kind_raw = kind_bytes.get_u16();
        let kind = SaveKind::try_from(kind_raw).map_err(|_| SaveError::UnknownKind(kind_raw))?;
        let mut len_bytes = &input[8..12];
        let length = len_bytes.get_u32();
        Ok(Self {
            version,
            kind,
            length,
        })
    }
}

/// Error conditions returned by the save helpers.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("header smaller than {HEADER_LEN} bytes")]
    TruncatedHeader,
    #[error("header magic mismatch")]
    BadMagic,
    #[error("save format version {0:#06x} is not supported")]
    UnsupportedVersion(u16),
    #[error("save kind {0:#06x} is unknown")]
    UnknownKind(u16),
    #[error("payload length mismatch: header declared {expected} bytes but read {actual}")]
    LengthMismatch { expected: u32, actual: usize },
    #[error("payload decode error: {0}")]
    PayloadDecode(#[from] rmp_serde::decode::Error),
    #[error("payload encode error: {0}")]
    PayloadEncode(#[from] rmp_serde::encode::Error),
    #[error("save i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wraps a snapshot with its header.
pub fn encode_save<T>(kind: SaveKind, payload: &T) -> Result<Vec<u8>, SaveError>
where
    T: Serialize,
{
    let payload_bytes = rmp_serde::to_vec_named(payload)?;
    let header = SaveHeader {
        version: FORMAT_VERSION,
        kind,
        length: u32::try_from(payload_bytes.len()).map_err(|_| SaveError::LengthMismatch {
            expected: u32::MAX,
            actual: payload_bytes.len(),
        })?,
    };
    let mut out = Vec::with_capacity(HEADER_LEN + payload_bytes.len());
    out.extend_from_slice(&header.encode());
    out.extend_from_slice(&payload_bytes);
    Ok(out)
}

/// Splits a save file into header and payload bytes.
pub fn decode_envelope(bytes: &[u8]) -> Result<(SaveHeader, &[u8]), SaveError> {
    if bytes.len() < HEADER_LEN {
        return Err(SaveError::TruncatedHeader);
    }
    let header = SaveHeader::decode(&bytes[..HEADER_LEN])?;
    let payload = &bytes[HEADER_LEN..];
    if payload.len() != header.length as usize {
        return Err(SaveError::LengthMismatch {
            expected: header.length,
            actual: payload.len(),
        });
    }
    Ok((header, payload))
}

/// Decodes a complete save file into its header and snapshot.
pub fn decode_save<T>(bytes: &[u8]) -> Result<(SaveHeader, T), SaveError>
where
    T: DeserializeOwned,
{
    let (header, payload) = decode_envelope(bytes)?;
    let value = rmp_serde::from_slice(payload)?;
    Ok((header, value))
}

pub fn write_save<W, T>(writer: &mut W, kind: SaveKind, payload: &T) -> Result<(), SaveError>
where
    W: Write,
    T: Serialize,
{
    let bytes = encode_save(kind, payload)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

pub fn read_save<R, T>(reader: &mut R) -> Result<(SaveHeader, T), SaveError>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_save(&bytes)
}

/// Short description stored alongside a snapshot for save-slot listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSummary {
    pub kind: SaveKind,
    pub scene_num: i32,
    pub game_ticks: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Sample {
        scene: i32,
        flags: Vec<bool>,
    }

    fn sample() -> Sample {
        Sample {
            scene: 7,
            flags: vec![true, false, true],
        }
    }

    #[test]
    fn header_layout_is_big_endian() {
        let header = SaveHeader {
            version: FORMAT_VERSION,
            kind: SaveKind::Continue,
            length: 0x0102_0304,
        };
        let bytes = header.encode();
        assert_eq!(&bytes[..4], b"BBVS");
        assert_eq!(&bytes[4..6], &[0x00, 0x01]);
        assert_eq!(&bytes[6..8], &[0x00, 0x02]);
        assert_eq!(&bytes[8..12], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(SaveHeader::decode(&bytes).expect("decode"), header);
    }

    #[test]
    fn rejects_foreign_and_truncated_files() {
        assert!(matches!(
            SaveHeader::decode(b"BBV"),
            Err(SaveError::TruncatedHeader)
        ));
        let mut bytes = encode_save(SaveKind::Manual, &sample()).expect("encode");
        bytes[0] = b'X';
        assert!(matches!(decode_envelope(&bytes), Err(SaveError::BadMagic)));

        let mut bytes = encode_save(SaveKind::Manual, &sample()).expect("encode");
        bytes[7] = 0x09;
        assert!(matches!(
            decode_envelope(&bytes),
            Err(SaveError::UnknownKind(0x0009))
        ));

        let mut bytes = encode_save(SaveKind::Manual, &sample()).expect("encode");
        bytes.pop();
        assert!(matches!(
            decode_envelope(&bytes),
            Err(SaveError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn newer_format_versions_are_refused() {
        let mut bytes = encode_save(SaveKind::Manual, &sample()).expect("encode");
        bytes[5] = 0x02;
        assert!(matches!(
            decode_save::<Sample>(&bytes),
            Err(SaveError::UnsupportedVersion(0x0002))
        ));
    }

    #[test]
    fn stream_helpers_carry_payload_and_kind() {
        let mut buffer = Vec::new();
        write_save(&mut buffer, SaveKind::Continue, &sample()).expect("write");
        let (header, value): (SaveHeader, Sample) =
            read_save(&mut buffer.as_slice()).expect("read");
        assert_eq!(header.kind, SaveKind::Continue);
        assert_eq!(header.length as usize, buffer.len() - HEADER_LEN);
        assert_eq!(value, sample());
    }
}
