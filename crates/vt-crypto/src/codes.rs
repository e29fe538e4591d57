//! # Code Generator
//!
//! Human-facing codes built on [`SecureRandom`]:
//!
//! - short redemption codes (`7KQ4-XM9P`)
//! - batch codes (`PIKA-2026-10-X7Q`)
//! - numeric verification codes and provider PINs
//! - Luhn-style check digits over alphanumeric codes
//! - expiring codes with a base-36 expiry prefix
//!
//! Alphabets are compile-time constants; nothing here holds mutable state.

use crate::errors::CryptoError;
use crate::random::{constant_time_equal, CharsetOptions, SecureRandom};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use std::collections::HashSet;

/// Uppercase letters and digits without `I`, `O`, `1`, `0`.
pub const SAFE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const BASE36_DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Width of the base-36 expiry prefix of an expiring code.
pub const EXPIRY_PREFIX_LEN: usize = 7;

/// Largest batch accepted by [`CodeGenerator::unique_short_codes`].
pub const MAX_UNIQUE_BATCH: usize = 10_000;

// =============================================================================
// OPTIONS AND VALUE TYPES
// =============================================================================

/// Options for [`CodeGenerator::short_code`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortCodeOptions {
    /// Random characters, excluding dash and prefix (4..=16)
    pub length: usize,
    /// Insert one `-` at `length / 2` when `length >= 6`
    pub include_dash: bool,
    /// Prepended verbatim
    pub prefix: String,
}

impl Default for ShortCodeOptions {
    fn default() -> Self {
        Self {
            length: 8,
            include_dash: true,
            prefix: String::new(),
        }
    }
}

impl ShortCodeOptions {
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    pub fn with_dash(mut self, include_dash: bool) -> Self {
        self.include_dash = include_dash;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// Options for [`CodeGenerator::batch_code`]. `None` year/month mean "now".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchCodeOptions {
    pub prefix: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub sequence_length: usize,
}

impl Default for BatchCodeOptions {
    fn default() -> Self {
        Self {
            prefix: "PIKA".to_string(),
            year: None,
            month: None,
            sequence_length: 3,
        }
    }
}

/// Components of a batch code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchCode {
    pub prefix: String,
    pub year: i32,
    pub month: u32,
    pub sequence: String,
}

impl BatchCode {
    /// `PREFIX-YYYY-MM-SEQ`
    pub fn format(&self) -> String {
        format!(
            "{}-{:04}-{:02}-{}",
            self.prefix, self.year, self.month, self.sequence
        )
    }
}

/// A code carrying its own expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpiringCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// GENERATOR
// =============================================================================

/// Builds human-readable codes from the secure random source.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeGenerator {
    random: SecureRandom,
}

impl CodeGenerator {
    pub fn new(random: SecureRandom) -> Self {
        Self { random }
    }

    /// Short uppercase code without ambiguous characters.
    pub fn short_code(&self, options: &ShortCodeOptions) -> Result<String, CryptoError> {
        if !(4..=16).contains(&options.length) {
            return Err(CryptoError::length(4, 16, options.length));
        }
        let mut code = self
            .random
            .alphanumeric(options.length, CharsetOptions::code_safe())?;
        if options.include_dash && options.length >= 6 {
            code.insert(options.length / 2, '-');
        }
        Ok(format!("{}{}", options.prefix, code))
    }

    /// `count` pairwise distinct short codes.
    pub fn unique_short_codes(
        &self,
        count: usize,
        options: &ShortCodeOptions,
    ) -> Result<Vec<String>, CryptoError> {
        if count == 0 || count > MAX_UNIQUE_BATCH {
            return Err(CryptoError::length(1, MAX_UNIQUE_BATCH, count));
        }
        let mut seen = HashSet::with_capacity(count);
        let mut codes = Vec::with_capacity(count);
        let max_attempts = count * 10;
        let mut attempts = 0;

        while codes.len() < count {
            if attempts >= max_attempts {
                return Err(CryptoError::GenerationFailed(format!(
                    "only {} unique codes after {attempts} attempts; code space too small",
                    codes.len()
                )));
            }
            attempts += 1;
            let code = self.short_code(options)?;
            if seen.insert(code.clone()) {
                codes.push(code);
            }
        }
        Ok(codes)
    }

    /// `PREFIX-YYYY-MM-SEQ` batch code with a random sequence.
    pub fn batch_code(&self, options: &BatchCodeOptions) -> Result<String, CryptoError> {
        let prefix_ok = (2..=10).contains(&options.prefix.len())
            && options.prefix.bytes().all(|b| b.is_ascii_uppercase());
        if !prefix_ok {
            return Err(CryptoError::InvalidInput(
                "batch prefix must be 2-10 uppercase letters".to_string(),
            ));
        }
        if !(2..=8).contains(&options.sequence_length) {
            return Err(CryptoError::length(2, 8, options.sequence_length));
        }

        let now = Utc::now();
        let year = options.year.unwrap_or_else(|| now.year());
        let month = options.month.unwrap_or_else(|| now.month());
        if !(1000..=9999).contains(&year) {
            return Err(CryptoError::InvalidInput(format!("year {year} is not 4 digits")));
        }
        if !(1..=12).contains(&month) {
            return Err(CryptoError::InvalidInput(format!("month {month} out of range")));
        }

        let sequence = self
            .random
            .alphanumeric(options.sequence_length, CharsetOptions::code_safe())?;

        Ok(BatchCode {
            prefix: options.prefix.clone(),
            year,
            month,
            sequence,
        }
        .format())
    }

    /// Numeric verification code, `length` in `[4, 10]`.
    pub fn verification_code(&self, length: usize) -> Result<String, CryptoError> {
        if !(4..=10).contains(&length) {
            return Err(CryptoError::length(4, 10, length));
        }
        self.digits(length)
    }

    /// Numeric provider PIN, `length` in `[4, 8]`.
    pub fn provider_pin(&self, length: usize) -> Result<String, CryptoError> {
        if !(4..=8).contains(&length) {
            return Err(CryptoError::length(4, 8, length));
        }
        self.digits(length)
    }

    /// `code` followed by its check digit.
    pub fn generate_code_with_check_digit(&self, code: &str) -> Result<String, CryptoError> {
        let digit = compute_check_digit(code)?;
        Ok(format!("{}{}", code, digit))
    }

    /// Whether the last character is the correct check digit for the rest.
    pub fn validate_code_with_check_digit(&self, code: &str) -> bool {
        validate_check_digit(code)
    }

    /// Code whose first [`EXPIRY_PREFIX_LEN`] characters encode its expiry.
    pub fn expiring_code(
        &self,
        ttl_secs: i64,
        code_length: usize,
    ) -> Result<ExpiringCode, CryptoError> {
        self.expiring_code_at(Utc::now(), ttl_secs, code_length)
    }

    /// [`expiring_code`](Self::expiring_code) relative to an explicit `now`.
    pub fn expiring_code_at(
        &self,
        now: DateTime<Utc>,
        ttl_secs: i64,
        code_length: usize,
    ) -> Result<ExpiringCode, CryptoError> {
        let min_len = EXPIRY_PREFIX_LEN + 4;
        if !(min_len..=32).contains(&code_length) {
            return Err(CryptoError::length(min_len, 32, code_length));
        }
        if ttl_secs <= 0 {
            return Err(CryptoError::InvalidInput("ttl must be positive".to_string()));
        }

        let expires = now
            .timestamp()
            .checked_add(ttl_secs)
            .ok_or_else(|| CryptoError::InvalidInput("expiry out of range".to_string()))?;
        let prefix = u64::try_from(expires)
            .ok()
            .and_then(|secs| to_base36(secs, EXPIRY_PREFIX_LEN))
            .ok_or_else(|| {
                CryptoError::InvalidInput("expiry does not fit the code prefix".to_string())
            })?;
        let fill = self
            .random
            .from_charset(code_length - EXPIRY_PREFIX_LEN, SAFE_CHARSET)?;
        let expires_at = Utc
            .timestamp_opt(expires, 0)
            .single()
            .ok_or_else(|| CryptoError::InvalidInput("expiry out of range".to_string()))?;

        Ok(ExpiringCode {
            code: format!("{prefix}{fill}"),
            expires_at,
        })
    }

    /// Expiry embedded in an expiring code, `None` if the prefix is not base-36.
    pub fn parse_expiring_code(&self, code: &str) -> Option<DateTime<Utc>> {
        let prefix = code.get(..EXPIRY_PREFIX_LEN)?;
        if code.len() <= EXPIRY_PREFIX_LEN {
            return None;
        }
        let secs = from_base36(prefix)?;
        Utc.timestamp_opt(i64::try_from(secs).ok()?, 0).single()
    }

    /// `true` once `now` has reached the embedded expiry, or if the code is malformed.
    pub fn is_code_expired(&self, code: &str, now: DateTime<Utc>) -> bool {
        match self.parse_expiring_code(code) {
            Some(expires_at) => now >= expires_at,
            None => true,
        }
    }

    /// Constant-time code comparison.
    pub fn codes_match(&self, a: &str, b: &str) -> bool {
        constant_time_equal(a.as_bytes(), b.as_bytes())
    }

    fn digits(&self, length: usize) -> Result<String, CryptoError> {
        let mut out = String::with_capacity(length);
        while out.len() < length {
            // 250 is the largest multiple of 10 below 256
            for b in self.random.bytes(length)? {
                if b < 250 && out.len() < length {
                    out.push(char::from(b'0' + b % 10));
                }
            }
        }
        Ok(out)
    }
}

// =============================================================================
// BATCH CODE PARSING
// =============================================================================

/// Parse `PREFIX-YYYY-MM-SEQ`.
///
/// Accepts exactly `^[A-Z]{2,10}-\d{4}-\d{2}-[SAFE]{2,8}$`; anything else is `None`.
pub fn parse_batch_code(code: &str) -> Option<BatchCode> {
    let mut parts = code.split('-');
    let (prefix, year, month, sequence) =
        (parts.next()?, parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let prefix_ok =
        (2..=10).contains(&prefix.len()) && prefix.bytes().all(|b| b.is_ascii_uppercase());
    let year_ok = year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit());
    let month_ok = month.len() == 2 && month.bytes().all(|b| b.is_ascii_digit());
    let sequence_ok =
        (2..=8).contains(&sequence.len()) && sequence.bytes().all(|b| SAFE_CHARSET.contains(&b));
    if !(prefix_ok && year_ok && month_ok && sequence_ok) {
        return None;
    }

    Some(BatchCode {
        prefix: prefix.to_string(),
        year: year.parse().ok()?,
        month: month.parse().ok()?,
        sequence: sequence.to_string(),
    })
}

// =============================================================================
// CHECK DIGITS
// =============================================================================

fn char_value(c: u8) -> Option<u32> {
    match c {
        b'0'..=b'9' => Some(u32::from(c - b'0')),
        b'A'..=b'Z' => Some(u32::from(c - b'A') + 10),
        b'a'..=b'z' => Some(u32::from(c - b'a') + 10),
        _ => None,
    }
}

/// Luhn-style check digit over an alphanumeric code.
///
/// Letters count as `10..=35`. Walking right to left, every second value
/// (starting with the rightmost) is doubled and folded as `d / 10 + d % 10`.
pub fn compute_check_digit(code: &str) -> Result<u32, CryptoError> {
    if code.is_empty() {
        return Err(CryptoError::InvalidInput("empty code".to_string()));
    }
    let mut sum = 0u32;
    for (i, c) in code.bytes().rev().enumerate() {
        let mut d = char_value(c).ok_or_else(|| {
            CryptoError::InvalidInput("check digits need an alphanumeric code".to_string())
        })?;
        if i % 2 == 0 {
            d *= 2;
            if d > 9 {
                d = d / 10 + d % 10;
            }
        }
        sum += d;
    }
    Ok((10 - (sum % 10)) % 10)
}

/// Inverse of appending [`compute_check_digit`].
pub fn validate_check_digit(code: &str) -> bool {
    if code.len() < 2 || !code.is_ascii() {
        return false;
    }
    let (body, last) = code.split_at(code.len() - 1);
    let Some(expected) = last.chars().next().and_then(|c| c.to_digit(10)) else {
        return false;
    };
    compute_check_digit(body).map_or(false, |digit| digit == expected)
}

// =============================================================================
// BASE-36
// =============================================================================

fn to_base36(mut value: u64, width: usize) -> Option<String> {
    let mut out = vec![b'0'; width];
    for slot in out.iter_mut().rev() {
        *slot = BASE36_DIGITS[(value % 36) as usize];
        value /= 36;
    }
    if value != 0 {
        return None;
    }
    String::from_utf8(out).ok()
}

fn from_base36(s: &str) -> Option<u64> {
    s.bytes().try_fold(0u64, |acc, b| {
        let digit = match b {
            b'0'..=b'9' => u64::from(b - b'0'),
            b'A'..=b'Z' => u64::from(b - b'A') + 10,
            _ => return None,
        };
        acc.checked_mul(36)?.checked_add(digit)
    })
}
