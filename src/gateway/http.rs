//! HTTP client for the signature gateway API

use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::Gateway;
use crate::error::{Result, SigaError};
use crate::types::*;

/// Relying party name header
pub const RELYING_PARTY_HEADER: &str = "x-relying-party-name";
/// Service name header
pub const SERVICE_NAME_HEADER: &str = "x-service-name";
/// Service UUID header
pub const SERVICE_UUID_HEADER: &str = "x-authorization-serviceuuid";

/// Hook that adds authentication headers to every request.
///
/// The gateway's request-signing scheme lives outside this crate; an
/// implementation receives the configured secret along with the request.
pub trait RequestAuthenticator: Send + Sync {
    fn authenticate(
        &self,
        method: &Method,
        path: &str,
        body: &[u8],
        secret: &str,
    ) -> Result<header::HeaderMap>;
}

/// HTTP client for the signature gateway
///
/// # Example
///
/// ```rust,no_run
/// use siga_client::{GatewayConfig, HttpGateway};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = HttpGateway::new(GatewayConfig {
///     url: "https://siga.example.com/v1".into(),
///     uuid: "a7fd7728-a3ea-4975-a2af-43311a8a0e09".into(),
///     ..Default::default()
/// })?;
/// # Ok(())
/// # }
/// ```
pub struct HttpGateway {
    config: GatewayConfig,
    client: Client,
    authenticator: Option<Arc<dyn RequestAuthenticator>>,
}

impl HttpGateway {
    /// Create a new gateway client
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        for (name, value) in [
            (RELYING_PARTY_HEADER, &config.client),
            (SERVICE_NAME_HEADER, &config.service),
            (SERVICE_UUID_HEADER, &config.uuid),
        ] {
            if value.is_empty() {
                continue;
            }
            let value = header::HeaderValue::from_str(value).map_err(|e| {
                SigaError::InvalidParameter(format!("invalid {} header: {}", name, e))
            })?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            client,
            authenticator: None,
        })
    }

    /// Attach a request authenticator
    pub fn with_authenticator(mut self, authenticator: Arc<dyn RequestAuthenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn container_path(container_type: ContainerType, container_id: &ContainerId) -> String {
        format!(
            "/{}/{}",
            container_type.endpoint(),
            urlencoding::encode(container_id.as_str())
        )
    }

    // ==================== Helper Methods ====================

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.config.url.trim_end_matches('/'), path);
        let payload = match body {
            Some(body) => serde_json::to_vec(body)?,
            None => Vec::new(),
        };

        debug!(method = %method, path = %path, "Gateway request");

        let mut request = self.client.request(method.clone(), &url);
        if let Some(ref authenticator) = self.authenticator {
            let auth_headers =
                authenticator.authenticate(&method, path, &payload, &self.config.secret)?;
            request = request.headers(auth_headers);
        }
        if body.is_some() {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(payload);
        }

        Ok(request.send().await?)
    }

    async fn call<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body).await?;
        self.handle_response(path, response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let response = Self::check_status(path, response).await?;
        let body = response.json().await?;
        Ok(body)
    }

    async fn check_status(path: &str, response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SigaError::NotFound(path.to_string()));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SigaError::Gateway {
                status,
                message: body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn create_container(
        &self,
        container_type: ContainerType,
        data_files: &[DataFileDeclaration],
    ) -> Result<CreateContainerResponse> {
        let path = format!("/{}", container_type.endpoint());
        let body = CreateContainerRequest {
            data_files: data_files.to_vec(),
        };
        self.call(Method::POST, &path, Some(&body)).await
    }

    async fn upload_container(
        &self,
        container_type: ContainerType,
        container: &str,
    ) -> Result<CreateContainerResponse> {
        let path = format!("/upload/{}", container_type.endpoint());
        let body = UploadContainerRequest {
            container: container.to_string(),
        };
        self.call(Method::POST, &path, Some(&body)).await
    }

    async fn start_remote_signing(
        &self,
        container_id: &ContainerId,
        request: &RemoteSigningRequest,
    ) -> Result<DataToSignResponse> {
        let path = format!(
            "{}/remotesigning",
            Self::container_path(ContainerType::Hashcode, container_id)
        );
        self.call(Method::POST, &path, Some(request)).await
    }

    async fn start_mobile_signing(
        &self,
        container_id: &ContainerId,
        request: &MobileSigningRequest,
    ) -> Result<serde_json::Value> {
        let path = format!(
            "{}/mobileidsigning",
            Self::container_path(ContainerType::Hashcode, container_id)
        );
        self.call(Method::POST, &path, Some(request)).await
    }

    async fn get_mobile_signing_status(
        &self,
        container_id: &ContainerId,
        signature_id: &str,
    ) -> Result<serde_json::Value> {
        let path = format!(
            "{}/mobileidsigning/{}/status",
            Self::container_path(ContainerType::Hashcode, container_id),
            urlencoding::encode(signature_id)
        );
        self.call::<(), _>(Method::GET, &path, None).await
    }

    async fn finalize_remote_signing(
        &self,
        container_type: ContainerType,
        container_id: &ContainerId,
        signature_id: &str,
        signature_value: &str,
    ) -> Result<ResultResponse> {
        let path = format!(
            "{}/remotesigning/{}",
            Self::container_path(container_type, container_id),
            urlencoding::encode(signature_id)
        );
        let body = FinalizeSigningRequest {
            signature_value: signature_value.to_string(),
        };
        self.call(Method::PUT, &path, Some(&body)).await
    }

    async fn get_container(
        &self,
        container_type: ContainerType,
        container_id: &ContainerId,
    ) -> Result<GetContainerResponse> {
        let path = Self::container_path(container_type, container_id);
        self.call::<(), _>(Method::GET, &path, None).await
    }

    async fn get_validation_report(
        &self,
        container_id: &ContainerId,
    ) -> Result<ValidationReportResponse> {
        let path = format!(
            "{}/validationreport",
            Self::container_path(ContainerType::Hashcode, container_id)
        );
        self.call::<(), _>(Method::GET, &path, None).await
    }

    async fn delete_container(&self, container_id: &ContainerId) -> Result<()> {
        let path = Self::container_path(ContainerType::Hashcode, container_id);
        let response = self.send::<()>(Method::DELETE, &path, None).await?;
        Self::check_status(&path, response).await?;
        Ok(())
    }

    async fn get_data_files(&self, container_id: &ContainerId) -> Result<DataFilesResponse> {
        let path = format!(
            "{}/datafiles",
            Self::container_path(ContainerType::Hashcode, container_id)
        );
        self.call::<(), _>(Method::GET, &path, None).await
    }

    async fn get_signatures(&self, container_id: &ContainerId) -> Result<SignaturesResponse> {
        let path = format!(
            "{}/signatures",
            Self::container_path(ContainerType::Hashcode, container_id)
        );
        self.call::<(), _>(Method::GET, &path, None).await
    }

    async fn get_signature_info(
        &self,
        container_id: &ContainerId,
        signature_id: &str,
    ) -> Result<serde_json::Value> {
        let path = format!(
            "{}/signatures/{}",
            Self::container_path(ContainerType::Hashcode, container_id),
            urlencoding::encode(signature_id)
        );
        self.call::<(), _>(Method::GET, &path, None).await
    }
}
