//! Read-to-completion and text decoding for provider response bodies.
//!
//! Bodies are collected in full before any parser sees them; the formats
//! handled here are single short payloads, so there is no incremental parsing.

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::http_client::{BodyStream, HttpError};

/// Upper bound on a buffered response body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// How raw body bytes become text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextDecoding {
    /// UTF-8 unless a byte-order mark says otherwise. A UTF-8 BOM is
    /// stripped; UTF-16 LE/BE BOMs switch to UTF-16.
    #[default]
    DetectByteOrderMark,
    /// UTF-8 with no BOM handling.
    Utf8,
}

impl TextDecoding {
    /// Decodes `bytes`, replacing invalid sequences with U+FFFD.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::DetectByteOrderMark => {
                if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
                    String::from_utf8_lossy(rest).into_owned()
                } else if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
                    decode_utf16(rest, u16::from_le_bytes)
                } else if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
                    decode_utf16(rest, u16::from_be_bytes)
                } else {
                    String::from_utf8_lossy(bytes).into_owned()
                }
            }
        }
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks(2).map(|pair| match pair {
        [first, second] => unit([*first, *second]),
        // odd trailing byte
        _ => 0xFFFD,
    });

    char::decode_utf16(units)
        .map(|ch| ch.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Drains `body` into memory.
///
/// Cancellation is checked before every chunk, so a signalled token wins
/// even when data is already available.
pub async fn read_to_end(
    mut body: BodyStream,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, FetchError> {
    let mut buffer = Vec::new();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            chunk = body.next() => match chunk {
                Some(chunk) => {
                    let chunk = chunk?;
                    if buffer.len() + chunk.len() > MAX_BODY_BYTES {
                        return Err(FetchError::Transport(HttpError::body(format!(
                            "response body exceeds {MAX_BODY_BYTES} bytes"
                        ))));
                    }
                    buffer.extend_from_slice(&chunk);
                }
                None => return Ok(buffer),
            },
        }
    }
}
