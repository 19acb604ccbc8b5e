// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Box framing: length-prefixed key/value pairs terminated by an empty key.

use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::FieldBox;

/// Longest field name a box may carry.
pub const MAX_KEY_LEN: usize = 255;

/// Longest field value a box may carry.
pub const MAX_VALUE_LEN: usize = u16::MAX as usize;

/// Errors from encoding, decoding or transporting boxes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed")]
    ConnectionClosed,

    #[error("connection closed in the middle of a box")]
    Truncated,

    #[error("empty field name")]
    EmptyKey,

    #[error("field name too long: {0} bytes (max {MAX_KEY_LEN})")]
    KeyTooLong(usize),

    #[error("value of field {key:?} too long: {len} bytes (max {MAX_VALUE_LEN})")]
    ValueTooLong { key: String, len: usize },

    #[error("field name is not valid UTF-8")]
    InvalidKey,

    #[error("duplicate field {0:?} in box")]
    DuplicateKey(String),

    #[error("trailing bytes after box terminator")]
    TrailingBytes,

    #[error("timed out waiting for a box")]
    Timeout,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Encode a box into its wire representation, terminator included.
pub fn encode_box(b: &FieldBox) -> Result<Vec<u8>, ProtocolError> {
    let size: usize = b.iter().map(|(k, v)| 4 + k.len() + v.len()).sum::<usize>() + 2;
    let mut out = Vec::with_capacity(size);
    for (key, value) in b.iter() {
        if key.is_empty() {
            return Err(ProtocolError::EmptyKey);
        }
        if key.len() > MAX_KEY_LEN {
            return Err(ProtocolError::KeyTooLong(key.len()));
        }
        if value.len() > MAX_VALUE_LEN {
            return Err(ProtocolError::ValueTooLong { key: key.to_string(), len: value.len() });
        }
        out.extend_from_slice(&(key.len() as u16).to_be_bytes());
        out.extend_from_slice(key.as_bytes());
        out.extend_from_slice(&(value.len() as u16).to_be_bytes());
        out.extend_from_slice(value);
    }
    out.extend_from_slice(&[0, 0]);
    Ok(out)
}

/// Decode exactly one box from `bytes`.
pub fn decode_box(bytes: &[u8]) -> Result<FieldBox, ProtocolError> {
    let mut cursor = bytes;
    let mut b = FieldBox::new();
    loop {
        let key_len = take_len(&mut cursor)?;
        if key_len == 0 {
            break;
        }
        let key = key_from(take(&mut cursor, key_len)?)?;
        let value_len = take_len(&mut cursor)?;
        let value = take(&mut cursor, value_len)?;
        insert_unique(&mut b, key, value.to_vec())?;
    }
    if !cursor.is_empty() {
        return Err(ProtocolError::TrailingBytes);
    }
    Ok(b)
}

fn take_len(cursor: &mut &[u8]) -> Result<usize, ProtocolError> {
    let raw = take(cursor, 2)?;
    Ok(u16::from_be_bytes([raw[0], raw[1]]) as usize)
}

fn take<'a>(cursor: &mut &'a [u8], n: usize) -> Result<&'a [u8], ProtocolError> {
    if cursor.len() < n {
        return Err(ProtocolError::Truncated);
    }
    let (head, tail) = cursor.split_at(n);
    *cursor = tail;
    Ok(head)
}

fn key_from(raw: &[u8]) -> Result<String, ProtocolError> {
    String::from_utf8(raw.to_vec()).map_err(|_| ProtocolError::InvalidKey)
}

fn insert_unique(b: &mut FieldBox, key: String, value: Vec<u8>) -> Result<(), ProtocolError> {
    if b.contains_key(&key) {
        return Err(ProtocolError::DuplicateKey(key));
    }
    b.insert(key, value);
    Ok(())
}

/// Read one complete box from the stream.
///
/// Returns `ConnectionClosed` on a clean EOF between boxes and `Truncated`
/// when the stream ends inside a box, so callers never see partial boxes.
pub async fn read_box<R: AsyncRead + Unpin>(reader: &mut R) -> Result<FieldBox, ProtocolError> {
    let first = match reader.read_u8().await {
        Ok(byte) => byte,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    };
    let second = reader.read_u8().await.map_err(eof_as_truncated)?;
    let mut key_len = u16::from_be_bytes([first, second]) as usize;

    let mut b = FieldBox::new();
    while key_len != 0 {
        let mut key = vec![0u8; key_len];
        reader.read_exact(&mut key).await.map_err(eof_as_truncated)?;
        let key = key_from(&key)?;

        let value_len = reader.read_u16().await.map_err(eof_as_truncated)? as usize;
        let mut value = vec![0u8; value_len];
        reader.read_exact(&mut value).await.map_err(eof_as_truncated)?;
        insert_unique(&mut b, key, value)?;

        key_len = reader.read_u16().await.map_err(eof_as_truncated)? as usize;
    }
    Ok(b)
}

/// Read one box, failing with `Timeout` if none arrives within `timeout`.
pub async fn read_box_timeout<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<FieldBox, ProtocolError> {
    tokio::time::timeout(timeout, read_box(reader)).await.map_err(|_| ProtocolError::Timeout)?
}

/// Write one box and flush it.
///
/// The box is encoded up front so an oversized field never leaves a partial
/// box on the stream.
pub async fn write_box<W: AsyncWrite + Unpin>(
    writer: &mut W,
    b: &FieldBox,
) -> Result<(), ProtocolError> {
    let bytes = encode_box(b)?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

fn eof_as_truncated(e: io::Error) -> ProtocolError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        ProtocolError::Truncated
    } else {
        ProtocolError::Io(e)
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
