//! Hashcode declarations for data files
//!
//! A hashcode container never sees file bytes; the gateway only receives
//! each file's name, size and digests.

use base64::Engine;

use crate::digest::DigestAlgorithm;
use crate::error::{Result, SigaError};
use crate::types::{DataFile, DataFileDeclaration};

/// Turns a local data file into the declaration sent to the gateway
pub trait FileEncoder: Send + Sync {
    fn encode(&self, name: &str, size: u64, content: &[u8]) -> Result<DataFileDeclaration>;

    fn encode_file(&self, file: &DataFile) -> Result<DataFileDeclaration> {
        self.encode(&file.name, file.size(), &file.content)
    }
}

/// Default encoder: base64 SHA-256 and SHA-512 of the content
#[derive(Debug, Clone, Copy, Default)]
pub struct HashcodeEncoder;

impl FileEncoder for HashcodeEncoder {
    fn encode(&self, name: &str, size: u64, content: &[u8]) -> Result<DataFileDeclaration> {
        encode(name, size, content)
    }
}

/// Build a hashcode declaration
pub fn encode(name: &str, size: u64, content: &[u8]) -> Result<DataFileDeclaration> {
    if name.is_empty() {
        return Err(SigaError::InvalidParameter(
            "data file name must not be empty".to_string(),
        ));
    }
    if size != content.len() as u64 {
        return Err(SigaError::InvalidParameter(format!(
            "declared size {} of {} does not match content length {}",
            size,
            name,
            content.len()
        )));
    }

    let b64 = base64::engine::general_purpose::STANDARD;
    Ok(DataFileDeclaration {
        file_name: name.to_string(),
        file_size: size,
        file_hash_sha256: b64.encode(DigestAlgorithm::Sha256.digest(content)),
        file_hash_sha512: b64.encode(DigestAlgorithm::Sha512.digest(content)),
    })
}
