//! Named digest functions.
//!
//! The gateway tells us which hash to apply to the data-to-sign, so the
//! algorithm is resolved at runtime from its name.

use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::str::FromStr;

use crate::error::SigaError;

/// Hash functions addressable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Canonical name as the gateway spells it
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha224 => "SHA224",
            DigestAlgorithm::Sha256 => "SHA256",
            DigestAlgorithm::Sha384 => "SHA384",
            DigestAlgorithm::Sha512 => "SHA512",
        }
    }

    /// Digest length in bytes
    pub fn output_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha224 => 28,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha224 => Sha224::digest(data).to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = SigaError;

    /// Accepts "SHA256", "SHA-256", "sha256" and the like.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "SHA224" => Ok(DigestAlgorithm::Sha224),
            "SHA256" => Ok(DigestAlgorithm::Sha256),
            "SHA384" => Ok(DigestAlgorithm::Sha384),
            "SHA512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(SigaError::UnsupportedDigestAlgorithm(s.to_string())),
        }
    }
}
