// src/hash.rs

//! Content digests for archive blobs
//!
//! Blobs are addressed by their SHA-256 digest. The digest appears in two
//! spellings:
//! - `sha256:<hex>` in descriptors (OCI style)
//! - `sha256.<hex>` as the blob filename under `blobs/`

use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;

/// Algorithm name used in digest strings
pub const SHA256: &str = "sha256";

const SHA256_HEX_LEN: usize = 64;

/// Digest parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// Algorithm prefix other than `sha256`
    UnknownAlgorithm(String),
    /// Hex part has the wrong length
    InvalidLength { expected: usize, got: usize },
    /// Hex part contains non-hex characters
    InvalidHex(String),
}

impl fmt::Display for DigestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAlgorithm(name) => write!(f, "unknown digest algorithm: {}", name),
            Self::InvalidLength { expected, got } => {
                write!(f, "invalid digest length: expected {}, got {}", expected, got)
            }
            Self::InvalidHex(s) => write!(f, "invalid hex in digest: {}", s),
        }
    }
}

impl std::error::Error for DigestError {}

/// A SHA-256 content digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest {
    hex: String,
}

impl Digest {
    /// Digest some bytes
    pub fn of(data: &[u8]) -> Self {
        Self {
            hex: hex::encode(Sha256::digest(data)),
        }
    }

    /// Build from a bare hex value
    pub fn from_hex(value: &str) -> Result<Self, DigestError> {
        if value.len() != SHA256_HEX_LEN {
            return Err(DigestError::InvalidLength {
                expected: SHA256_HEX_LEN,
                got: value.len(),
            });
        }
        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DigestError::InvalidHex(value.to_string()));
        }
        Ok(Self {
            hex: value.to_ascii_lowercase(),
        })
    }

    /// Hex value without prefix
    #[inline]
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Blob filename, e.g. `sha256.ab12...`
    pub fn filename(&self) -> String {
        format!("{}.{}", SHA256, self.hex)
    }

    /// Parse a blob filename produced by [`Digest::filename`]
    pub fn from_filename(name: &str) -> Result<Self, DigestError> {
        Self::split_prefixed(name, '.')
    }

    fn split_prefixed(s: &str, separator: char) -> Result<Self, DigestError> {
        match s.split_once(separator) {
            Some((algo, value)) if algo.eq_ignore_ascii_case(SHA256) => Self::from_hex(value),
            Some((algo, _)) => Err(DigestError::UnknownAlgorithm(algo.to_string())),
            None => Err(DigestError::UnknownAlgorithm(String::new())),
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", SHA256, self.hex)
    }
}

impl FromStr for Digest {
    type Err = DigestError;

    /// Parse `sha256:<hex>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::split_prefixed(s, ':')
    }
}
