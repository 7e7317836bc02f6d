//! Types for the signature gateway API

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SigaError;

/// Gateway connection configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the signature gateway HTTP API
    pub url: String,
    /// Relying party name
    pub client: String,
    /// Service name registered with the gateway
    pub service: String,
    /// Service UUID registered with the gateway
    pub uuid: String,
    /// Shared secret, only ever handed to a `RequestAuthenticator`
    pub secret: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            client: String::new(),
            service: String::new(),
            uuid: String::new(),
            secret: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Container flavour, which also selects the gateway endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerType {
    /// Data files referenced by digest only
    Hashcode,
    /// Data files embedded in the container
    Asic,
}

impl ContainerType {
    /// Path segment of the gateway endpoint for this container type
    pub fn endpoint(&self) -> &'static str {
        match self {
            ContainerType::Hashcode => "hashcodecontainers",
            ContainerType::Asic => "containers",
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerType::Hashcode => write!(f, "HASHCODE"),
            ContainerType::Asic => write!(f, "ASIC"),
        }
    }
}

impl FromStr for ContainerType {
    type Err = SigaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HASHCODE" => Ok(ContainerType::Hashcode),
            "ASIC" | "DATAFILE" => Ok(ContainerType::Asic),
            other => Err(SigaError::InvalidParameter(format!(
                "unknown container type: {}",
                other
            ))),
        }
    }
}

/// Gateway-assigned container identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A data file held by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    /// Logical file name inside the container
    pub name: String,
    /// File bytes
    pub content: Vec<u8>,
}

impl DataFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Hashcode declaration of a single data file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFileDeclaration {
    pub file_name: String,
    pub file_size: u64,
    /// Base64 SHA-256 of the file content
    pub file_hash_sha256: String,
    /// Base64 SHA-512 of the file content
    pub file_hash_sha512: String,
}

/// Request body for container creation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContainerRequest {
    pub data_files: Vec<DataFileDeclaration>,
}

/// Request body for container upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadContainerRequest {
    /// Base64-encoded container
    pub container: String,
}

/// Response from create and upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContainerResponse {
    pub container_id: ContainerId,
}

/// Request body for starting remote signing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSigningRequest {
    /// Base64-encoded DER signing certificate
    pub signing_certificate: String,
    /// Signature profile, e.g. "LT"
    pub signature_profile: String,
}

/// Response from starting remote signing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataToSignResponse {
    /// Base64-encoded bytes the external signer has to sign
    pub data_to_sign: String,
    /// Name of the hash function to apply to `data_to_sign`
    pub digest_algorithm: String,
    pub generated_signature_id: String,
}

/// Caller-supplied details for mobile signing
#[derive(Debug, Clone, Default)]
pub struct MobileSigningParams {
    /// National identity code of the signer
    pub person_identifier: String,
    /// Phone number registered for mobile signing
    pub phone_no: String,
    /// Three-letter language code for the prompt on the phone
    pub language: String,
    pub message_to_display: Option<String>,
}

/// Request body for the mobile signing channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileSigningRequest {
    pub person_identifier: String,
    pub phone_no: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_to_display: Option<String>,
    pub signature_profile: String,
}

/// Request body for finalizing remote signing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeSigningRequest {
    /// Base64-encoded signature value
    pub signature_value: String,
}

/// Generic `{ "result": ... }` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultResponse {
    pub result: String,
}

/// Outcome of remote finalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizationResult {
    Ok,
    NotOk,
}

impl From<&ResultResponse> for FinalizationResult {
    fn from(response: &ResultResponse) -> Self {
        if response.result == "OK" {
            FinalizationResult::Ok
        } else {
            FinalizationResult::NotOk
        }
    }
}

/// Response from fetching a container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetContainerResponse {
    /// Base64-encoded container
    pub container: String,
}

/// Summary of a validation report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConclusion {
    pub valid_signatures_count: u32,
    pub signatures_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_document: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<serde_json::Value>,
    #[serde(default)]
    pub signatures: Vec<serde_json::Value>,
}

impl ValidationConclusion {
    /// True when every signature on the container validated
    pub fn all_valid(&self) -> bool {
        self.valid_signatures_count == self.signatures_count
    }
}

/// Response from the validation report endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReportResponse {
    pub validation_conclusion: ValidationConclusion,
}

/// Data file as listed by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFileEntry {
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_hash_sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_hash_sha512: Option<String>,
}

/// Response from the data files endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFilesResponse {
    #[serde(default)]
    pub data_files: Vec<DataFileEntry>,
}

/// Signature as listed by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_signature_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_profile: Option<String>,
}

/// Response from the signatures endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignaturesResponse {
    #[serde(default)]
    pub signatures: Vec<SignatureEntry>,
}
