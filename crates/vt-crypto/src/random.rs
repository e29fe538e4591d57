//! # Secure Random Source
//!
//! All randomness in the workspace comes from here. Bytes are drawn from the
//! operating system CSPRNG (`OsRng`); no userspace PRNG is ever seeded.
//!
//! Acquisition is synchronous: it is local and fast, so nothing here awaits.

use crate::errors::CryptoError;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Largest single request accepted by [`SecureRandom::bytes`].
pub const MAX_RANDOM_BYTES: usize = 1_048_576;

/// Characters that are easy to confuse when read aloud or printed.
pub const AMBIGUOUS_CHARS: &[u8] = b"IOl10";

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";

/// Text encodings for [`SecureRandom::string`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RandomEncoding {
    Hex,
    Base64,
    /// URL-safe alphabet, padding stripped
    Base64Url,
}

impl FromStr for RandomEncoding {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hex" => Ok(RandomEncoding::Hex),
            "base64" => Ok(RandomEncoding::Base64),
            "base64url" => Ok(RandomEncoding::Base64Url),
            other => Err(CryptoError::InvalidEncoding(other.to_string())),
        }
    }
}

impl fmt::Display for RandomEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RandomEncoding::Hex => "hex",
            RandomEncoding::Base64 => "base64",
            RandomEncoding::Base64Url => "base64url",
        })
    }
}

/// Character classes for [`SecureRandom::alphanumeric`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharsetOptions {
    pub uppercase: bool,
    pub lowercase: bool,
    pub numbers: bool,
    /// Drop `I`, `O`, `l`, `1`, `0`
    pub exclude_ambiguous: bool,
}

impl Default for CharsetOptions {
    fn default() -> Self {
        Self {
            uppercase: true,
            lowercase: true,
            numbers: true,
            exclude_ambiguous: false,
        }
    }
}

impl CharsetOptions {
    /// Uppercase letters and digits without ambiguous characters.
    pub fn code_safe() -> Self {
        Self {
            uppercase: true,
            lowercase: false,
            numbers: true,
            exclude_ambiguous: true,
        }
    }

    /// Build the alphabet these options describe.
    pub fn charset(&self) -> Result<Vec<u8>, CryptoError> {
        let mut charset = Vec::with_capacity(62);
        if self.uppercase {
            charset.extend_from_slice(UPPERCASE);
        }
        if self.lowercase {
            charset.extend_from_slice(LOWERCASE);
        }
        if self.numbers {
            charset.extend_from_slice(DIGITS);
        }
        if self.exclude_ambiguous {
            charset.retain(|c| !AMBIGUOUS_CHARS.contains(c));
        }
        if charset.is_empty() {
            return Err(CryptoError::InvalidCharset);
        }
        Ok(charset)
    }
}

/// OS-backed cryptographically secure random generator.
///
/// Stateless: every call reads fresh bytes from the OS, so one value can be
/// shared freely across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureRandom;

impl SecureRandom {
    pub fn new() -> Self {
        Self
    }

    /// `n` uniformly random bytes, `n` in `[1, 1_048_576]`.
    pub fn bytes(&self, n: usize) -> Result<Vec<u8>, CryptoError> {
        if n == 0 || n > MAX_RANDOM_BYTES {
            return Err(CryptoError::length(1, MAX_RANDOM_BYTES, n));
        }
        let mut buf = vec![0u8; n];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| CryptoError::GenerationFailed(e.to_string()))?;
        Ok(buf)
    }

    /// `length` random bytes rendered in `encoding`.
    pub fn string(&self, length: usize, encoding: RandomEncoding) -> Result<String, CryptoError> {
        let bytes = self.bytes(length)?;
        Ok(match encoding {
            RandomEncoding::Hex => hex::encode(bytes),
            RandomEncoding::Base64 => STANDARD.encode(bytes),
            RandomEncoding::Base64Url => URL_SAFE_NO_PAD.encode(bytes),
        })
    }

    /// `length` characters drawn uniformly from the alphabet `options` describes.
    ///
    /// Each output character consumes a 16-bit sample reduced modulo the
    /// alphabet size, which keeps modulo bias below 0.1%.
    pub fn alphanumeric(
        &self,
        length: usize,
        options: CharsetOptions,
    ) -> Result<String, CryptoError> {
        let charset = options.charset()?;
        self.from_charset(length, &charset)
    }

    /// `length` characters from an explicit alphabet.
    pub fn from_charset(&self, length: usize, charset: &[u8]) -> Result<String, CryptoError> {
        if charset.is_empty() {
            return Err(CryptoError::InvalidCharset);
        }
        let max_len = MAX_RANDOM_BYTES / 2;
        if length == 0 || length > max_len {
            return Err(CryptoError::length(1, max_len, length));
        }
        let samples = self.bytes(length * 2)?;
        Ok(samples
            .chunks_exact(2)
            .map(|pair| {
                let value = u16::from_be_bytes([pair[0], pair[1]]) as usize;
                charset[value % charset.len()] as char
            })
            .collect())
    }

    /// Zero-padded decimal code of exactly `length` digits, `length` in `[4, 10]`.
    ///
    /// The value lies in `[10^(length-1), 10^length - 1]`.
    pub fn numeric_code(&self, length: usize) -> Result<String, CryptoError> {
        if !(4..=10).contains(&length) {
            return Err(CryptoError::length(4, 10, length));
        }
        let min = 10u128.pow(length as u32 - 1);
        let max = 10u128.pow(length as u32) - 1;
        let range = max - min + 1;

        let bytes_needed = ((range as f64).log2() / 8.0).ceil() as usize + 1;
        let sample = self
            .bytes(bytes_needed)?
            .iter()
            .fold(0u128, |acc, &b| (acc << 8) | u128::from(b));

        let value = min + sample % range;
        Ok(format!("{:0width$}", value, width = length))
    }

    /// Uniform integer in `[min, max]` by rejection sampling.
    pub fn random_int(&self, min: u64, max: u64) -> Result<u64, CryptoError> {
        if min > max {
            return Err(CryptoError::InvalidInput(format!(
                "empty range [{min}, {max}]"
            )));
        }
        let span = max - min;
        if span == u64::MAX {
            return Ok(OsRng.next_u64());
        }
        let range = span + 1;
        // Largest multiple of `range` that fits, so every residue is equally likely
        let zone = u64::MAX - (u64::MAX % range);
        loop {
            let mut buf = [0u8; 8];
            OsRng
                .try_fill_bytes(&mut buf)
                .map_err(|e| CryptoError::GenerationFailed(e.to_string()))?;
            let sample = u64::from_be_bytes(buf);
            if sample < zone {
                return Ok(min + sample % range);
            }
        }
    }

    /// Random (version 4) UUID, hyphenated lowercase.
    pub fn uuid_v4(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Compare two byte strings without branching on their content.
    ///
    /// A length mismatch returns early; lengths are not secret.
    pub fn constant_time_equal(&self, a: &[u8], b: &[u8]) -> bool {
        constant_time_equal(a, b)
    }
}

/// See [`SecureRandom::constant_time_equal`].
pub fn constant_time_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
