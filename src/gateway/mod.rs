//! Remote signature gateway operations
//!
//! [`Gateway`] is the seam between the signing workflow and the transport.
//! [`HttpGateway`] talks JSON over HTTP; tests plug in in-memory doubles.

pub mod http;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::*;

pub use http::{HttpGateway, RequestAuthenticator};

/// Every remote operation the signing workflow relies on.
///
/// Operations that can target more than one container flavour take the
/// [`ContainerType`] selecting the endpoint.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Create a container from data file declarations.
    async fn create_container(
        &self,
        container_type: ContainerType,
        data_files: &[DataFileDeclaration],
    ) -> Result<CreateContainerResponse>;

    /// Upload an existing base64-encoded container.
    async fn upload_container(
        &self,
        container_type: ContainerType,
        container: &str,
    ) -> Result<CreateContainerResponse>;

    /// Start remote signing with a signer certificate.
    async fn start_remote_signing(
        &self,
        container_id: &ContainerId,
        request: &RemoteSigningRequest,
    ) -> Result<DataToSignResponse>;

    /// Start signing through the mobile channel.
    async fn start_mobile_signing(
        &self,
        container_id: &ContainerId,
        request: &MobileSigningRequest,
    ) -> Result<serde_json::Value>;

    /// Current status of a mobile signing attempt.
    async fn get_mobile_signing_status(
        &self,
        container_id: &ContainerId,
        signature_id: &str,
    ) -> Result<serde_json::Value>;

    /// Bind an externally produced signature value to a signing session.
    async fn finalize_remote_signing(
        &self,
        container_type: ContainerType,
        container_id: &ContainerId,
        signature_id: &str,
        signature_value: &str,
    ) -> Result<ResultResponse>;

    /// Fetch the base64-encoded container.
    async fn get_container(
        &self,
        container_type: ContainerType,
        container_id: &ContainerId,
    ) -> Result<GetContainerResponse>;

    async fn get_validation_report(
        &self,
        container_id: &ContainerId,
    ) -> Result<ValidationReportResponse>;

    async fn delete_container(&self, container_id: &ContainerId) -> Result<()>;

    async fn get_data_files(&self, container_id: &ContainerId) -> Result<DataFilesResponse>;

    async fn get_signatures(&self, container_id: &ContainerId) -> Result<SignaturesResponse>;

    async fn get_signature_info(
        &self,
        container_id: &ContainerId,
        signature_id: &str,
    ) -> Result<serde_json::Value>;
}
