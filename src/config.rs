//! Configuration for the `siga` command-line tool
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::archive::SourceFile;
use crate::types::GatewayConfig;
use crate::workflow::{WorkflowConfig, DEFAULT_SIGNATURE_PROFILE};

/// siga - hashcode container signing against a signature gateway
#[derive(Parser, Debug, Clone)]
#[command(name = "siga")]
#[command(about = "Sign hashcode containers through a remote signature gateway")]
pub struct Args {
    /// Gateway connection settings
    #[command(flatten)]
    pub gateway: GatewayArgs,

    /// Directory for the final archive (defaults to the first file's directory)
    #[arg(long, env = "SIGA_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Signature profile requested from the gateway
    #[arg(long, env = "SIGA_SIGNATURE_PROFILE", default_value = DEFAULT_SIGNATURE_PROFILE)]
    pub signature_profile: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Gateway connection arguments
#[derive(ClapArgs, Debug, Clone)]
pub struct GatewayArgs {
    /// Base URL of the signature gateway
    #[arg(long = "url", env = "SIGA_URL")]
    pub url: String,

    /// Relying party name
    #[arg(long = "client", env = "SIGA_CLIENT", default_value = "")]
    pub client: String,

    /// Service name
    #[arg(long = "service", env = "SIGA_SERVICE", default_value = "")]
    pub service: String,

    /// Service UUID
    #[arg(long = "uuid", env = "SIGA_UUID", default_value = "")]
    pub uuid: String,

    /// Shared secret for request authentication
    #[arg(long = "secret", env = "SIGA_SECRET", default_value = "", hide_env_values = true)]
    pub secret: String,

    /// Request timeout in seconds
    #[arg(long, env = "SIGA_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a container, print the digest, read the signature from stdin and finalize
    Sign {
        /// Data file as NAME=PATH, or just PATH to use the file name
        #[arg(long = "file", required = true, value_parser = parse_source_file)]
        files: Vec<SourceFile>,

        /// Signer certificate, hex-encoded DER
        #[arg(long)]
        certificate: String,
    },

    /// Create a container and sign it over the mobile channel
    MobileSign {
        /// Data file as NAME=PATH, or just PATH to use the file name
        #[arg(long = "file", required = true, value_parser = parse_source_file)]
        files: Vec<SourceFile>,

        /// Signer's national identity code
        #[arg(long)]
        person_id: String,

        /// Signer's phone number
        #[arg(long)]
        phone: String,

        /// Prompt language on the phone
        #[arg(long, default_value = "EST")]
        language: String,

        /// Message shown on the phone
        #[arg(long)]
        message: Option<String>,

        /// Seconds between status polls
        #[arg(long, default_value = "3")]
        poll_interval_secs: u64,

        /// Give up after this many polls
        #[arg(long, default_value = "40")]
        max_polls: u32,
    },

    /// Upload an existing hashcode container and print what the gateway sees
    Inspect {
        /// Container file
        path: PathBuf,
    },
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.gateway.url.is_empty() {
            return Err("gateway URL is required".to_string());
        }
        if !self.gateway.url.starts_with("http://") && !self.gateway.url.starts_with("https://") {
            return Err(format!("gateway URL must be http(s): {}", self.gateway.url));
        }
        if self.gateway.timeout_secs == 0 {
            return Err("timeout must be at least one second".to_string());
        }
        if let Command::MobileSign { max_polls: 0, .. } = self.command {
            return Err("max-polls must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            url: self.gateway.url.clone(),
            client: self.gateway.client.clone(),
            service: self.gateway.service.clone(),
            uuid: self.gateway.uuid.clone(),
            secret: self.gateway.secret.clone(),
            timeout_secs: self.gateway.timeout_secs,
        }
    }

    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            signature_profile: self.signature_profile.clone(),
            output_dir: self.output_dir.clone(),
        }
    }
}

/// Parse `NAME=PATH` or `PATH`
pub fn parse_source_file(value: &str) -> Result<SourceFile, String> {
    if let Some((name, path)) = value.split_once('=') {
        if name.is_empty() || path.is_empty() {
            return Err(format!("expected NAME=PATH, got {}", value));
        }
        return Ok(SourceFile::new(name, path));
    }

    let path = PathBuf::from(value);
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("cannot derive a file name from {}", value))?
        .to_string();
    Ok(SourceFile::new(name, path))
}
