//! String conversion helpers for registry payloads.

use crate::error::{RegistryError, Result};
use encoding_rs::UTF_16LE;

/// Reads a UTF-16LE string from a byte slice, trimming null terminators.
///
/// Registry strings are typically null-terminated. This function decodes
/// UTF-16LE data and removes trailing null characters.
///
/// # Errors
///
/// Returns an error if the data length is not even (UTF-16 requires 2-byte units)
/// or if the UTF-16 decoding fails.
pub fn read_utf16_string(data: &[u8], name: &str) -> Result<String> {
    if data.is_empty() {
        return Ok(String::new());
    }

    if data.len() % 2 != 0 {
        return Err(RegistryError::InvalidUtf16 {
            name: name.to_string(),
        });
    }

    let (decoded, _encoding, had_errors) = UTF_16LE.decode(data);

    if had_errors {
        return Err(RegistryError::InvalidUtf16 {
            name: name.to_string(),
        });
    }

    Ok(decoded.trim_end_matches('\0').to_string())
}

/// Encodes a string as UTF-16LE bytes followed by a null terminator.
pub fn write_utf16_string(s: &str, out: &mut Vec<u8>) {
    for unit in s.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out.extend_from_slice(&[0, 0]);
}

/// Converts a string to a null-terminated UTF-16 buffer for native calls.
pub fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
