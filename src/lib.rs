//! Client for hashcode container signing against a remote signature gateway.
//!
//! Data files never leave the machine: the gateway receives their digests,
//! hands back the bytes to sign, and accepts the externally produced
//! signature. When finalization is not accepted outright, the signed container
//! is fetched and merged with the original files into a local `.asice`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use siga_client::{ContainerType, DataFile, GatewayConfig, HttpGateway, SigningWorkflow, SourceFile};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = HttpGateway::new(GatewayConfig {
//!     url: "https://siga.example.com/v1".into(),
//!     ..Default::default()
//! })?;
//! let mut workflow = SigningWorkflow::new(Arc::new(gateway));
//!
//! let bytes = std::fs::read("/data/contract.pdf")?;
//! workflow
//!     .create_container(ContainerType::Hashcode, &[DataFile::new("contract.pdf", bytes)])
//!     .await?;
//!
//! let session = workflow.prepare_signing("3082...").await?;
//! // hand session.data_to_sign_hash to the card, get the signature back
//! let signature_hex = "deadbeef";
//!
//! workflow
//!     .finalize_signing(
//!         &session.generated_signature_id,
//!         signature_hex,
//!         &[SourceFile::new("contract.pdf", "/data/contract.pdf")],
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod config;
pub mod digest;
pub mod encoding;
pub mod error;
pub mod gateway;
pub mod types;
pub mod workflow;

// Re-export main types
pub use archive::{ArchiveMerger, SourceFile};
pub use digest::DigestAlgorithm;
pub use encoding::{FileEncoder, HashcodeEncoder};
pub use error::{Result, SigaError};
pub use gateway::{Gateway, HttpGateway, RequestAuthenticator};
pub use types::*;
pub use workflow::{FinalizeOutcome, SigningSession, SigningWorkflow, WorkflowConfig, WorkflowState};
