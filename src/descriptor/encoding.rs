//! Lenient base64 decoding for descriptor payloads and subscription bodies.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;

/// Decodes a base64 payload as text, the way subscription publishers emit it.
///
/// Surrounding whitespace is trimmed and missing `=` padding is restored before
/// decoding. Both the standard and the URL-safe alphabets are accepted. Returns
/// `None` when the payload is not base64 at all; invalid UTF-8 sequences in the
/// decoded bytes are replaced rather than rejected.
pub fn decode_base64(payload: &str) -> Option<String> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut padded = trimmed.to_string();
    let missing = padded.len() % 4;
    if missing != 0 {
        padded.extend(std::iter::repeat('=').take(4 - missing));
    }

    STANDARD
        .decode(padded.as_bytes())
        .or_else(|_| URL_SAFE.decode(padded.as_bytes()))
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}
