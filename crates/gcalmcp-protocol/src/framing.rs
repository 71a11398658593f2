//! Newline-delimited message framing for the stdio transport.
//!
//! Each message is compact JSON followed by `\n`:
//!
//! ```text
//! {"jsonrpc":"2.0","id":1,"method":"ping"}\n
//! ```
//!
//! Compact JSON escapes control characters inside strings, so a payload
//! never contains a raw newline.

use serde::{Serialize, de::DeserializeOwned};

use crate::MAX_MESSAGE_SIZE;
use crate::error::{ProtocolError, ProtocolResult};

/// Encodes a message as one line, including the trailing newline.
pub fn encode_line<T: Serialize>(message: &T) -> ProtocolResult<Vec<u8>> {
    let mut json = serde_json::to_vec(message)?;

    if json.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: json.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    json.push(b'\n');
    Ok(json)
}

/// Decodes one line. Surrounding whitespace (including `\r\n`) is ignored.
pub fn decode_line<T: DeserializeOwned>(line: &[u8]) -> ProtocolResult<T> {
    if line.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: line.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }

    Ok(serde_json::from_slice(trimmed)?)
}
