//! In-memory gateway double shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use serde_json::json;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use siga_client::{
    ContainerId, ContainerType, CreateContainerResponse, DataFileDeclaration, DataFileEntry,
    DataFilesResponse, DataToSignResponse, FileEncoder, Gateway, GetContainerResponse,
    HashcodeEncoder, MobileSigningRequest, RemoteSigningRequest, Result, ResultResponse,
    SigaError, SignatureEntry, SignaturesResponse, ValidationConclusion, ValidationReportResponse,
};

/// Gateway that answers from fixed values and records every call
pub struct MockGateway {
    pub data_to_sign: Vec<u8>,
    pub digest_algorithm: String,
    pub finalize_result: String,
    pub valid_signatures: u32,
    pub total_signatures: u32,
    pub container_bytes: Vec<u8>,
    pub fail_delete: bool,
    pub mobile_status: String,
    pub next_id: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
    pub declarations: Mutex<Vec<DataFileDeclaration>>,
    pub remote_signing: Mutex<Vec<RemoteSigningRequest>>,
    pub finalized_values: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<String>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            data_to_sign: b"<ds:SignedInfo>payload</ds:SignedInfo>".to_vec(),
            digest_algorithm: "SHA256".to_string(),
            finalize_result: "OK".to_string(),
            valid_signatures: 1,
            total_signatures: 1,
            container_bytes: base_archive(),
            fail_delete: false,
            mobile_status: "SIGNATURE".to_string(),
            next_id: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            declarations: Mutex::new(Vec::new()),
            remote_signing: Mutex::new(Vec::new()),
            finalized_values: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }
}

impl MockGateway {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == name).count()
    }

    pub fn declarations(&self) -> Vec<DataFileDeclaration> {
        self.declarations.lock().unwrap().clone()
    }

    pub fn remote_signing_requests(&self) -> Vec<RemoteSigningRequest> {
        self.remote_signing.lock().unwrap().clone()
    }

    pub fn finalized_values(&self) -> Vec<String> {
        self.finalized_values.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    fn issue_id(&self) -> ContainerId {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        ContainerId::new(format!("container-{}", n))
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn create_container(
        &self,
        _container_type: ContainerType,
        data_files: &[DataFileDeclaration],
    ) -> Result<CreateContainerResponse> {
        self.record("create_container");
        self.declarations.lock().unwrap().extend_from_slice(data_files);
        Ok(CreateContainerResponse {
            container_id: self.issue_id(),
        })
    }

    async fn upload_container(
        &self,
        _container_type: ContainerType,
        container: &str,
    ) -> Result<CreateContainerResponse> {
        self.record("upload_container");
        self.uploads.lock().unwrap().push(container.to_string());
        Ok(CreateContainerResponse {
            container_id: self.issue_id(),
        })
    }

    async fn start_remote_signing(
        &self,
        _container_id: &ContainerId,
        request: &RemoteSigningRequest,
    ) -> Result<DataToSignResponse> {
        self.record("start_remote_signing");
        self.remote_signing.lock().unwrap().push(request.clone());
        Ok(DataToSignResponse {
            data_to_sign: base64::engine::general_purpose::STANDARD.encode(&self.data_to_sign),
            digest_algorithm: self.digest_algorithm.clone(),
            generated_signature_id: "sig-1".to_string(),
        })
    }

    async fn start_mobile_signing(
        &self,
        _container_id: &ContainerId,
        request: &MobileSigningRequest,
    ) -> Result<serde_json::Value> {
        self.record("start_mobile_signing");
        Ok(json!({
            "challengeId": "1234",
            "generatedSignatureId": "mid-sig-1",
            "profile": request.signature_profile,
        }))
    }

    async fn get_mobile_signing_status(
        &self,
        _container_id: &ContainerId,
        signature_id: &str,
    ) -> Result<serde_json::Value> {
        self.record("get_mobile_signing_status");
        Ok(json!({ "midStatus": self.mobile_status, "signatureId": signature_id }))
    }

    async fn finalize_remote_signing(
        &self,
        _container_type: ContainerType,
        _container_id: &ContainerId,
        _signature_id: &str,
        signature_value: &str,
    ) -> Result<ResultResponse> {
        self.record("finalize_remote_signing");
        self.finalized_values
            .lock()
            .unwrap()
            .push(signature_value.to_string());
        Ok(ResultResponse {
            result: self.finalize_result.clone(),
        })
    }

    async fn get_container(
        &self,
        _container_type: ContainerType,
        _container_id: &ContainerId,
    ) -> Result<GetContainerResponse> {
        self.record("get_container");
        Ok(GetContainerResponse {
            container: base64::engine::general_purpose::STANDARD.encode(&self.container_bytes),
        })
    }

    async fn get_validation_report(
        &self,
        _container_id: &ContainerId,
    ) -> Result<ValidationReportResponse> {
        self.record("get_validation_report");
        Ok(ValidationReportResponse {
            validation_conclusion: ValidationConclusion {
                valid_signatures_count: self.valid_signatures,
                signatures_count: self.total_signatures,
                signature_form: Some("ASiC-E_hashcode".to_string()),
                validation_time: None,
                validated_document: None,
                policy: None,
                signatures: Vec::new(),
            },
        })
    }

    async fn delete_container(&self, container_id: &ContainerId) -> Result<()> {
        self.record("delete_container");
        if self.fail_delete {
            return Err(SigaError::Gateway {
                status: 500,
                message: format!("cannot delete {}", container_id),
            });
        }
        Ok(())
    }

    async fn get_data_files(&self, _container_id: &ContainerId) -> Result<DataFilesResponse> {
        self.record("get_data_files");
        Ok(DataFilesResponse {
            data_files: vec![DataFileEntry {
                file_name: "a.txt".to_string(),
                file_size: Some(5),
                file_hash_sha256: None,
                file_hash_sha512: None,
            }],
        })
    }

    async fn get_signatures(&self, _container_id: &ContainerId) -> Result<SignaturesResponse> {
        self.record("get_signatures");
        Ok(SignaturesResponse {
            signatures: vec![SignatureEntry {
                id: "S0".to_string(),
                generated_signature_id: Some("sig-1".to_string()),
                signer_info: Some("SERIALNUMBER=PNOEE-38001085718".to_string()),
                signature_profile: Some("LT".to_string()),
            }],
        })
    }

    async fn get_signature_info(
        &self,
        _container_id: &ContainerId,
        signature_id: &str,
    ) -> Result<serde_json::Value> {
        self.record("get_signature_info");
        Ok(json!({ "id": signature_id, "signatureProfile": "LT" }))
    }
}

/// Encoder that counts how often it is asked to encode
#[derive(Default)]
pub struct CountingEncoder {
    pub count: AtomicUsize,
}

impl FileEncoder for CountingEncoder {
    fn encode(&self, name: &str, size: u64, content: &[u8]) -> Result<DataFileDeclaration> {
        self.count.fetch_add(1, Ordering::SeqCst);
        HashcodeEncoder.encode(name, size, content)
    }
}

/// Minimal signed-container skeleton as the gateway would return it
pub fn base_archive() -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = || SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    writer.start_file("mimetype", stored()).unwrap();
    writer.write_all(b"application/vnd.etsi.asic-e+zip").unwrap();
    writer.start_file("META-INF/hashcodes-sha256.xml", stored()).unwrap();
    writer.write_all(b"<hashcodes/>").unwrap();
    writer.start_file("META-INF/signatures0.xml", stored()).unwrap();
    writer.write_all(b"<asic:XAdESSignatures/>").unwrap();
    writer.finish().unwrap().into_inner()
}
