//! Compact token codec.
//!
//! `base64url(JSON(header)).base64url(JSON(payload)).base64url(r || s)`, all
//! segments unpadded. The signature is always the fixed-width compact form.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Segment separator.
pub const SEPARATOR: char = '.';

/// The three segments of a compact token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenSegments<'a> {
    pub header: &'a str,
    pub payload: &'a str,
    pub signature: &'a str,
}

impl<'a> TokenSegments<'a> {
    /// Exactly three non-empty segments, or `None`.
    pub fn split(token: &'a str) -> Option<Self> {
        let mut parts = token.split(SEPARATOR);
        let header = parts.next()?;
        let payload = parts.next()?;
        let signature = parts.next()?;
        if parts.next().is_some() || header.is_empty() || payload.is_empty() || signature.is_empty()
        {
            return None;
        }
        Some(Self {
            header,
            payload,
            signature,
        })
    }

    /// `"<header>.<payload>"`, the bytes that are signed.
    pub fn signing_input(&self) -> String {
        signing_input(self.header, self.payload)
    }
}

pub fn signing_input(header: &str, payload: &str) -> String {
    let mut input = String::with_capacity(header.len() + payload.len() + 1);
    input.push_str(header);
    input.push(SEPARATOR);
    input.push_str(payload);
    input
}

pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Strict decode: rejects padding and the standard alphabet.
pub fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(segment).ok()
}
