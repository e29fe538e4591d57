//! # Supported Curves
//!
//! A closed set of curves with their constants in one lookup table. The
//! engine is parameterised by [`Curve`] rather than specialised per curve.
//!
//! | Curve | Algorithm | Private key | Compressed public key | r / s |
//! |-------|-----------|-------------|-----------------------|-------|
//! | P-256 | ES256 | 32 | 33 | 32 |
//! | P-384 | ES384 | 48 | 49 | 48 |
//! | P-521 | ES512 | 66 | 67 | 66 |
//! | secp256k1 | ES256K | 32 | 33 | 32 |

use crate::errors::CryptoError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// P-256 group order n.
const P256_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xBC, 0xE6, 0xFA, 0xAD, 0xA7, 0x17, 0x9E, 0x84, 0xF3, 0xB9, 0xCA, 0xC2, 0xFC, 0x63, 0x25, 0x51,
];

/// P-384 group order n.
const P384_ORDER: [u8; 48] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xC7, 0x63, 0x4D, 0x81, 0xF4, 0x37, 0x2D, 0xDF,
    0x58, 0x1A, 0x0D, 0xB2, 0x48, 0xB0, 0xA7, 0x7A, 0xEC, 0xEC, 0x19, 0x6A, 0xCC, 0xC5, 0x29, 0x73,
];

/// P-521 group order n (66 bytes, top byte 0x01).
const P521_ORDER: [u8; 66] = [
    0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFA, 0x51, 0x86, 0x87, 0x83, 0xBF, 0x2F, 0x96, 0x6B, 0x7F, 0xCC, 0x01, 0x48, 0xF7, 0x09,
    0xA5, 0xD0, 0x3B, 0xB5, 0xC9, 0xB8, 0x89, 0x9C, 0x47, 0xAE, 0xBB, 0x6F, 0xB7, 0x1E, 0x91, 0x38,
    0x64, 0x09,
];

/// secp256k1 group order n.
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Per-curve constants.
#[derive(Debug)]
pub struct CurveParams {
    /// Display name (`P-256`, `secp256k1`, ...)
    pub name: &'static str,
    /// JOSE algorithm identifier used in token headers
    pub algorithm: &'static str,
    /// Short tag used in derived key identifiers
    pub key_tag: &'static str,
    /// Raw private scalar length in bytes
    pub private_key_len: usize,
    /// SEC1 compressed point length in bytes
    pub public_key_len: usize,
    /// Width of each of r and s in bytes
    pub component_len: usize,
    /// Group order n, big-endian, `component_len` bytes
    pub order: &'static [u8],
}

const CURVE_TABLE: [CurveParams; 4] = [
    CurveParams {
        name: "P-256",
        algorithm: "ES256",
        key_tag: "p256",
        private_key_len: 32,
        public_key_len: 33,
        component_len: 32,
        order: &P256_ORDER,
    },
    CurveParams {
        name: "P-384",
        algorithm: "ES384",
        key_tag: "p384",
        private_key_len: 48,
        public_key_len: 49,
        component_len: 48,
        order: &P384_ORDER,
    },
    CurveParams {
        name: "P-521",
        algorithm: "ES512",
        key_tag: "p521",
        private_key_len: 66,
        public_key_len: 67,
        component_len: 66,
        order: &P521_ORDER,
    },
    CurveParams {
        name: "secp256k1",
        algorithm: "ES256K",
        key_tag: "k256",
        private_key_len: 32,
        public_key_len: 33,
        component_len: 32,
        order: &SECP256K1_ORDER,
    },
];

/// Supported elliptic curves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Curve {
    #[serde(rename = "P-256")]
    P256,
    #[serde(rename = "P-384")]
    P384,
    #[serde(rename = "P-521")]
    P521,
    #[serde(rename = "secp256k1")]
    Secp256k1,
}

impl Curve {
    /// Every supported curve.
    pub const ALL: [Curve; 4] = [Curve::P256, Curve::P384, Curve::P521, Curve::Secp256k1];

    /// Constants for this curve.
    pub fn params(&self) -> &'static CurveParams {
        let index = match self {
            Curve::P256 => 0,
            Curve::P384 => 1,
            Curve::P521 => 2,
            Curve::Secp256k1 => 3,
        };
        &CURVE_TABLE[index]
    }

    pub fn name(&self) -> &'static str {
        self.params().name
    }

    /// JOSE algorithm identifier (`ES256`, `ES384`, `ES512`, `ES256K`).
    pub fn algorithm(&self) -> &'static str {
        self.params().algorithm
    }

    pub fn private_key_len(&self) -> usize {
        self.params().private_key_len
    }

    pub fn public_key_len(&self) -> usize {
        self.params().public_key_len
    }

    pub fn component_len(&self) -> usize {
        self.params().component_len
    }

    /// Length of the compact `r || s` encoding.
    pub fn signature_len(&self) -> usize {
        self.params().component_len * 2
    }

    /// Resolve a JOSE algorithm identifier. Only the ECDSA family is accepted.
    pub fn from_algorithm(alg: &str) -> Result<Self, CryptoError> {
        Curve::ALL
            .iter()
            .copied()
            .find(|c| c.algorithm() == alg)
            .ok_or_else(|| CryptoError::InvalidInput(format!("unsupported algorithm: {alg}")))
    }

    /// Resolve a curve name (`P-256`, `p256`, `secp256k1`, ...), case-insensitive.
    pub fn from_name(name: &str) -> Result<Self, CryptoError> {
        Curve::ALL
            .iter()
            .copied()
            .find(|c| {
                c.name().eq_ignore_ascii_case(name) || c.params().key_tag.eq_ignore_ascii_case(name)
            })
            .ok_or_else(|| CryptoError::InvalidInput(format!("unsupported curve: {name}")))
    }

    /// Whether big-endian `s` is in the lower half of the group order (`s <= n/2`).
    ///
    /// `s` must be exactly `component_len` bytes; anything else is not low-S.
    pub fn is_low_s(&self, s: &[u8]) -> bool {
        let order = self.params().order;
        if s.len() != order.len() {
            return false;
        }
        let half = half_order(order);
        compare_be(s, &half) != Ordering::Greater
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Curve {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Curve::from_name(s)
    }
}

/// floor(n / 2) of a big-endian integer.
fn half_order(order: &[u8]) -> Vec<u8> {
    let mut half = vec![0u8; order.len()];
    let mut carry = 0u8;
    for (i, &byte) in order.iter().enumerate() {
        half[i] = (byte >> 1) | (carry << 7);
        carry = byte & 1;
    }
    half
}

/// Compare equal-length big-endian integers.
fn compare_be(a: &[u8], b: &[u8]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.cmp(y))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}
