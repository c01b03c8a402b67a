//! Save-game container helpers.
//!
//! A save file is a fixed-size header followed by a MessagePack payload with
//! named fields. Keeping the framing in its own crate lets the engine, tools
//! and tests agree on one layout.

use std::convert::TryFrom;

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use thiserror::Error;

/// Bytes that prefix every save container ("BLDS").
pub const HEADER_MAGIC: [u8; 4] = *b"BLDS";

/// Container revision written by this crate.
pub const FORMAT_VERSION: u16 = 0x0001;

/// Length of the binary header in bytes.
pub const HEADER_LEN: usize = 4 + 2 + 2 + 4;

/// Payload kinds a container can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr, Hash)]
#[repr(u16)]
pub enum SaveKind {
    /// Whole world plus every live verb runner.
    Game = 0x0001,
    /// A single verb runner, used by tooling to inspect one suspension.
    Runner = 0x0002,
}

impl TryFrom<u16> for SaveKind {
    type Error = ();

    fn try_from(value: u16) -> std::result::Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(Self::Game),
            0x0002 => Ok(Self::Runner),
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
    /// Writes the header as big-endian fields.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        let mut cursor = &mut out[..];
        cursor.put_slice(&HEADER_MAGIC);
        cursor.put_u16(self.version);
        cursor.put_u16(self.kind as u16);
        cursor.put_u32(self.length);
        out
    }

    /// Reads a header from the front of `input`; trailing bytes are ignored.
    pub fn decode(input: &[u8]) -> Result<Self, SaveError> {
        let mut cursor = input;
        if cursor.remaining() < HEADER_LEN {
            return Err(SaveError::TruncatedHeader);
        }
        let mut magic = [0u8; 4];
        cursor.copy_to_slice(&mut magic);
        if magic != HEADER_MAGIC {
            return Err(SaveError::BadMagic);
        }
        let version = cursor.get_u16();
        if version > FORMAT_VERSION {
            return Err(SaveError::UnsupportedVersion(version));
        }
        let raw_kind = cursor.get_u16();
        let kind = SaveKind::try_from(raw_kind).map_err(|_| SaveError::UnknownKind(raw_kind))?;
        Ok(Self {
            version,
            kind,
            length: cursor.get_u32(),
        })
    }
}

/// Error conditions returned by the container helpers.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("header smaller than {HEADER_LEN} bytes")]
    TruncatedHeader,
    #[error("header magic mismatch")]
    BadMagic,
    #[error("container version {0:#06x} is newer than this build understands")]
    UnsupportedVersion(u16),
    #[error("save kind {0:#06x} is unknown")]
    UnknownKind(u16),
    #[error("expected a {expected:?} container but found {actual:?}")]
    KindMismatch { expected: SaveKind, actual: SaveKind },
    #[error("payload length mismatch: header declared {expected} bytes but read {actual}")]
    LengthMismatch { expected: u32, actual: usize },
    #[error("payload decode error: {0}")]
    PayloadDecode(#[from] rmp_serde::decode::Error),
    #[error("payload encode error: {0}")]
    PayloadEncode(#[from] rmp_serde::encode::Error),
}

/// Wraps a payload with the container header.
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

/// Splits a container into its header and payload bytes.
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

/// Decode a container of the expected kind straight into the requested type.
pub fn decode_save<T>(kind: SaveKind, bytes: &[u8]) -> Result<T, SaveError>
where
    T: for<'de> Deserialize<'de>,
{
    let (header, payload) = decode_envelope(bytes)?;
    if header.kind != kind {
        return Err(SaveError::KindMismatch {
            expected: kind,
            actual: header.kind,
        });
    }
    let value = rmp_serde::from_slice(payload)?;
    Ok(value)
}
