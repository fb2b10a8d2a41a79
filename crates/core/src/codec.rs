// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binary record codec
//!
//! Every stored record is a versioned envelope: one format tag byte
//! followed by the postcard encoding of the record. Decoding never
//! sniffs the payload shape; an unknown tag is a corrupt record.

use crate::record::{Brief, RedoRecord};
use thiserror::Error;

/// Format tag for postcard-encoded records
pub const FORMAT_V1: u8 = 0x01;

/// Errors that can occur while encoding or decoding records.
///
/// Every decode variant is a corrupt-record condition: callers log the
/// offending record and move on.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("corrupt record: empty payload")]
    Empty,
    #[error("corrupt record: unknown format tag {0:#04x}")]
    UnknownFormat(u8),
    #[error("corrupt record: {0}")]
    Malformed(#[from] postcard::Error),
    #[error("corrupt record: {0} trailing bytes")]
    TrailingBytes(usize),
    #[error("corrupt document: {0}")]
    Document(#[from] serde_json::Error),
}

/// Encode a record into its versioned envelope
pub fn encode(record: &RedoRecord) -> Result<Vec<u8>, CodecError> {
    let mut out = vec![FORMAT_V1];
    let body = postcard::to_allocvec(record)?;
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a full record
pub fn decode(bytes: &[u8]) -> Result<RedoRecord, CodecError> {
    let body = body(bytes)?;
    let (record, rest) = postcard::take_from_bytes::<RedoRecord>(body)?;
    if !rest.is_empty() {
        return Err(CodecError::TrailingBytes(rest.len()));
    }
    Ok(record)
}

/// Decode only the {user_id, timestamp} prefix of a record.
///
/// The api name and change list are never materialized.
pub fn decode_brief(bytes: &[u8]) -> Result<Brief, CodecError> {
    let body = body(bytes)?;
    let (brief, _rest) = postcard::take_from_bytes::<Brief>(body)?;
    Ok(brief)
}

/// Decode a change payload into a JSON document
pub fn decode_document(payload: &[u8]) -> Result<serde_json::Value, CodecError> {
    Ok(serde_json::from_slice(payload)?)
}

fn body(bytes: &[u8]) -> Result<&[u8], CodecError> {
    match bytes.split_first() {
        None => Err(CodecError::Empty),
        Some((&FORMAT_V1, body)) => Ok(body),
        Some((&tag, _)) => Err(CodecError::UnknownFormat(tag)),
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
