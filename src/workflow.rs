//! Hashcode container signing workflow.
//!
//! One [`SigningWorkflow`] drives one container through
//! create/upload → prepare → finalize, falling back to local packaging when
//! the gateway does not accept the finalization outright:
//!
//! ```text
//! Uninitialized ──create──▶ Created ─┐
//!               ──upload──▶ Uploaded ┴─prepare─▶ SigningPrepared
//!                                                     │
//!                                                 finalize
//!                                   OK ◀──────────────┴──────────▶ NOT_OK
//!                                   │                               │
//!                               Finalized        validate → fetch → merge → delete
//!                                                                   │
//!                                                           FinalizedFallback
//! ```
//!
//! The controller holds the container identity as mutable state. Every
//! identity-mutating call takes `&mut self`; use one controller per session.

use base64::Engine;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::archive::{first_file_directory, ArchiveMerger, SourceFile};
use crate::digest::DigestAlgorithm;
use crate::encoding::{FileEncoder, HashcodeEncoder};
use crate::error::{Result, SigaError};
use crate::gateway::Gateway;
use crate::types::*;

/// Default signature profile requested from the gateway
pub const DEFAULT_SIGNATURE_PROFILE: &str = "LT";

/// Observable position in the signing state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Uninitialized,
    Created,
    Uploaded,
    SigningPrepared,
    /// Gateway accepted the signature; the remote container is the record
    Finalized,
    /// Local archive written and remote container deleted
    FinalizedFallback,
}

/// Workflow settings
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Signature profile for remote and mobile signing
    pub signature_profile: String,
    /// Where the final archive goes; the first source file's directory if unset
    pub output_dir: Option<PathBuf>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            signature_profile: DEFAULT_SIGNATURE_PROFILE.to_string(),
            output_dir: None,
        }
    }
}

/// Everything the external signer needs, plus the id to finalize with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningSession {
    /// Base64 bytes returned by the gateway
    pub data_to_sign: String,
    /// Base64 digest of the decoded `data_to_sign`
    pub data_to_sign_hash: String,
    pub digest_algorithm: String,
    pub generated_signature_id: String,
}

/// How a finalization ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// Gateway accepted the signature, no local archive was produced
    Completed,
    /// Fallback flow wrote the final archive here
    Packaged(PathBuf),
}

/// Signing workflow controller for a single container
pub struct SigningWorkflow {
    gateway: Arc<dyn Gateway>,
    encoder: Arc<dyn FileEncoder>,
    config: WorkflowConfig,
    container_id: Option<ContainerId>,
    state: WorkflowState,
}

impl SigningWorkflow {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self::with_config(gateway, WorkflowConfig::default())
    }

    pub fn with_config(gateway: Arc<dyn Gateway>, config: WorkflowConfig) -> Self {
        Self {
            gateway,
            encoder: Arc::new(HashcodeEncoder),
            config,
            container_id: None,
            state: WorkflowState::Uninitialized,
        }
    }

    /// Replace the data file encoder
    pub fn with_encoder(mut self, encoder: Arc<dyn FileEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn container_id(&self) -> Option<&ContainerId> {
        self.container_id.as_ref()
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    // ==================== Container lifecycle ====================

    /// Declare `files` to the gateway and adopt the new container.
    ///
    /// Only hashcode containers are supported. Any previously held identity
    /// is replaced.
    pub async fn create_container(
        &mut self,
        container_type: ContainerType,
        files: &[DataFile],
    ) -> Result<ContainerId> {
        if container_type != ContainerType::Hashcode {
            return Err(SigaError::InvalidParameter(format!(
                "unsupported container type: {}",
                container_type
            )));
        }
        if files.is_empty() {
            return Err(SigaError::InvalidParameter(
                "at least one data file is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for file in files {
            if !seen.insert(file.name.as_str()) {
                return Err(SigaError::InvalidParameter(format!(
                    "duplicate data file name: {}",
                    file.name
                )));
            }
        }

        let declarations = files
            .iter()
            .map(|file| self.encoder.encode_file(file))
            .collect::<Result<Vec<_>>>()?;

        let response = self
            .gateway
            .create_container(container_type, &declarations)
            .await?;

        let id = self.adopt(response.container_id, WorkflowState::Created)?;
        info!(container_id = %id, files = files.len(), "Hashcode container created");
        Ok(id)
    }

    /// Adopt an existing base64-encoded hashcode container.
    pub async fn upload_hashcode_container(&mut self, content: &str) -> Result<ContainerId> {
        if content.trim().is_empty() {
            return Err(SigaError::InvalidParameter(
                "container content must not be empty".to_string(),
            ));
        }
        base64::engine::general_purpose::STANDARD.decode(content.trim())?;

        let response = self
            .gateway
            .upload_container(ContainerType::Hashcode, content.trim())
            .await?;

        let id = self.adopt(response.container_id, WorkflowState::Uploaded)?;
        info!(container_id = %id, "Hashcode container uploaded");
        Ok(id)
    }

    /// Delete the remote container and forget its identity.
    pub async fn delete_container(&mut self) -> Result<()> {
        let id = self.require_identity()?;
        self.gateway.delete_container(&id).await?;
        info!(container_id = %id, "Remote container deleted");
        self.container_id = None;
        self.state = WorkflowState::Uninitialized;
        Ok(())
    }

    // ==================== Signing ====================

    /// Start remote signing with the signer's certificate.
    ///
    /// The returned session carries the digest the external signer signs.
    /// The hash function is whichever one the gateway names.
    pub async fn prepare_signing(&mut self, certificate_hex: &str) -> Result<SigningSession> {
        let id = self.require_identity()?;
        let b64 = base64::engine::general_purpose::STANDARD;

        let certificate = hex::decode(certificate_hex.trim())?;
        let request = RemoteSigningRequest {
            signing_certificate: b64.encode(certificate),
            signature_profile: self.config.signature_profile.clone(),
        };

        let response = self.gateway.start_remote_signing(&id, &request).await?;

        let algorithm: DigestAlgorithm = response.digest_algorithm.parse()?;
        let data = b64.decode(&response.data_to_sign)?;
        let hash = b64.encode(algorithm.digest(&data));

        debug!(
            container_id = %id,
            signature_id = %response.generated_signature_id,
            algorithm = algorithm.name(),
            "Data to sign received"
        );
        self.state = WorkflowState::SigningPrepared;

        Ok(SigningSession {
            data_to_sign: response.data_to_sign,
            data_to_sign_hash: hash,
            digest_algorithm: response.digest_algorithm,
            generated_signature_id: response.generated_signature_id,
        })
    }

    /// Start signing over the mobile channel.
    pub async fn prepare_mobile_signing(
        &mut self,
        params: MobileSigningParams,
    ) -> Result<serde_json::Value> {
        let id = self.require_identity()?;
        let request = MobileSigningRequest {
            person_identifier: params.person_identifier,
            phone_no: params.phone_no,
            language: params.language,
            message_to_display: params.message_to_display,
            signature_profile: self.config.signature_profile.clone(),
        };

        let response = self.gateway.start_mobile_signing(&id, &request).await?;
        self.state = WorkflowState::SigningPrepared;
        Ok(response)
    }

    /// Poll the mobile signing status once.
    pub async fn get_mobile_signing_status(&self, signature_id: &str) -> Result<serde_json::Value> {
        let id = self.require_identity()?;
        self.gateway.get_mobile_signing_status(&id, signature_id).await
    }

    /// Submit the externally produced signature.
    ///
    /// When the gateway does not answer with `OK`, the end-of-flow runs once:
    /// the container is validated, fetched, merged with `files` and deleted.
    pub async fn finalize_signing(
        &mut self,
        signature_id: &str,
        signature_hex: &str,
        files: &[SourceFile],
    ) -> Result<FinalizeOutcome> {
        let id = self.require_identity()?;
        let b64 = base64::engine::general_purpose::STANDARD;
        let signature_value = b64.encode(hex::decode(signature_hex.trim())?);

        let response = self
            .gateway
            .finalize_remote_signing(ContainerType::Hashcode, &id, signature_id, &signature_value)
            .await?;

        match FinalizationResult::from(&response) {
            FinalizationResult::Ok => {
                info!(container_id = %id, signature_id = %signature_id, "Signature finalized");
                self.state = WorkflowState::Finalized;
                Ok(FinalizeOutcome::Completed)
            }
            FinalizationResult::NotOk => {
                warn!(
                    container_id = %id,
                    result = %response.result,
                    "Finalization not accepted, packaging locally"
                );
                let path = self.end_container_flow(files).await?;
                Ok(FinalizeOutcome::Packaged(path))
            }
        }
    }

    /// Validate, fetch, package and delete the container.
    ///
    /// The archive is written before the remote delete. If the delete fails
    /// the archive stays on disk and `CleanupFailed` names it.
    pub async fn end_container_flow(&mut self, files: &[SourceFile]) -> Result<PathBuf> {
        let id = self.require_identity()?;
        let merger = ArchiveMerger::new(match self.config.output_dir {
            Some(ref dir) => dir.clone(),
            None => first_file_directory(files)?,
        });
        merger.archive_path(&id)?;

        self.do_container_validation(&id).await?;

        let container = self
            .gateway
            .get_container(ContainerType::Hashcode, &id)
            .await?;
        let base_archive = base64::engine::general_purpose::STANDARD.decode(&container.container)?;

        let archive = merger.merge(&id, &base_archive, files)?;

        if let Err(e) = self.gateway.delete_container(&id).await {
            warn!(container_id = %id, error = %e, "Remote container cleanup failed");
            return Err(SigaError::CleanupFailed {
                archive,
                source: Box::new(e),
            });
        }

        info!(container_id = %id, archive = %archive.display(), "Container flow ended");
        self.container_id = None;
        self.state = WorkflowState::FinalizedFallback;
        Ok(archive)
    }

    // ==================== Read accessors ====================

    pub async fn get_data_files_list(&self) -> Result<Vec<DataFileEntry>> {
        let id = self.require_identity()?;
        Ok(self.gateway.get_data_files(&id).await?.data_files)
    }

    pub async fn get_signatures_list(&self) -> Result<Vec<SignatureEntry>> {
        let id = self.require_identity()?;
        Ok(self.gateway.get_signatures(&id).await?.signatures)
    }

    pub async fn get_signature_info(&self, signature_id: &str) -> Result<serde_json::Value> {
        let id = self.require_identity()?;
        self.gateway.get_signature_info(&id, signature_id).await
    }

    pub async fn get_container_validation(&self) -> Result<ValidationConclusion> {
        let id = self.require_identity()?;
        Ok(self
            .gateway
            .get_validation_report(&id)
            .await?
            .validation_conclusion)
    }

    // ==================== Helper Methods ====================

    async fn do_container_validation(&self, id: &ContainerId) -> Result<()> {
        let conclusion = self
            .gateway
            .get_validation_report(id)
            .await?
            .validation_conclusion;

        if !conclusion.all_valid() {
            return Err(SigaError::SignatureValidationError {
                valid: conclusion.valid_signatures_count,
                total: conclusion.signatures_count,
            });
        }
        Ok(())
    }

    fn require_identity(&self) -> Result<ContainerId> {
        self.container_id
            .clone()
            .ok_or(SigaError::MissingContainerIdentity)
    }

    fn adopt(&mut self, id: ContainerId, state: WorkflowState) -> Result<ContainerId> {
        if id.as_str().is_empty() {
            return Err(SigaError::InvalidResponse(
                "gateway returned an empty container id".to_string(),
            ));
        }
        self.container_id = Some(id.clone());
        self.state = state;
        Ok(id)
    }
}
