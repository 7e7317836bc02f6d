//! siga - hashcode container signing against a remote signature gateway

use anyhow::{bail, Context};
use base64::Engine;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use siga_client::{
    config::{Args, Command},
    ContainerType, DataFile, FinalizeOutcome, HttpGateway, MobileSigningParams, SigningWorkflow,
    SourceFile,
};

/// Mobile signing status while the signer has not answered yet
const OUTSTANDING_STATUS: &str = "OUTSTANDING_TRANSACTION";
/// Mobile signing status once the signature is in place
const SIGNED_STATUS: &str = "SIGNATURE";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("siga_client={},siga={},info", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("Gateway: {}", args.gateway.url);

    let gateway = HttpGateway::new(args.gateway_config()).context("failed to build gateway client")?;
    let mut workflow = SigningWorkflow::with_config(Arc::new(gateway), args.workflow_config());

    match args.command {
        Command::Sign { files, certificate } => sign(&mut workflow, &files, &certificate).await,
        Command::MobileSign {
            files,
            person_id,
            phone,
            language,
            message,
            poll_interval_secs,
            max_polls,
        } => {
            let params = MobileSigningParams {
                person_identifier: person_id,
                phone_no: phone,
                language,
                message_to_display: message,
            };
            mobile_sign(
                &mut workflow,
                &files,
                params,
                Duration::from_secs(poll_interval_secs),
                max_polls,
            )
            .await
        }
        Command::Inspect { path } => inspect(&mut workflow, &path).await,
    }
}

fn read_data_files(files: &[SourceFile]) -> anyhow::Result<Vec<DataFile>> {
    files
        .iter()
        .map(|f| -> anyhow::Result<DataFile> {
            let content = std::fs::read(&f.path)
                .with_context(|| format!("failed to read {}", f.path.display()))?;
            Ok(DataFile::new(f.name.clone(), content))
        })
        .collect()
}

async fn sign(
    workflow: &mut SigningWorkflow,
    files: &[SourceFile],
    certificate: &str,
) -> anyhow::Result<()> {
    let data_files = read_data_files(files)?;
    workflow
        .create_container(ContainerType::Hashcode, &data_files)
        .await?;

    let session = workflow.prepare_signing(certificate).await?;
    println!(
        "{}",
        serde_json::json!({
            "dataToSignHash": session.data_to_sign_hash,
            "digestAlgorithm": session.digest_algorithm,
            "generatedSignatureId": session.generated_signature_id,
        })
    );
    eprintln!("Enter the hex-encoded signature value:");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let signature_hex = match lines.next_line().await? {
        Some(line) if !line.trim().is_empty() => line,
        _ => bail!("no signature value supplied on stdin"),
    };

    let outcome = workflow
        .finalize_signing(&session.generated_signature_id, signature_hex.trim(), files)
        .await?;
    report(outcome);
    Ok(())
}

async fn mobile_sign(
    workflow: &mut SigningWorkflow,
    files: &[SourceFile],
    params: MobileSigningParams,
    poll_interval: Duration,
    max_polls: u32,
) -> anyhow::Result<()> {
    let data_files = read_data_files(files)?;
    workflow
        .create_container(ContainerType::Hashcode, &data_files)
        .await?;

    let status = match await_mobile_signature(workflow, params, poll_interval, max_polls).await {
        Ok(status) => status,
        Err(e) => {
            discard_container(workflow).await;
            return Err(e);
        }
    };

    if status != SIGNED_STATUS {
        warn!(status = %status, "Mobile signing did not complete");
        workflow.delete_container().await?;
        bail!("mobile signing ended with status {}", status);
    }

    let archive = workflow.end_container_flow(files).await?;
    report(FinalizeOutcome::Packaged(archive));
    Ok(())
}

/// Start mobile signing and poll until the status leaves the outstanding state
async fn await_mobile_signature(
    workflow: &mut SigningWorkflow,
    params: MobileSigningParams,
    poll_interval: Duration,
    max_polls: u32,
) -> anyhow::Result<String> {
    let started = workflow.prepare_mobile_signing(params).await?;
    let signature_id = started
        .get("generatedSignatureId")
        .and_then(|v| v.as_str())
        .context("gateway did not return a signature id")?
        .to_string();
    if let Some(challenge) = started.get("challengeId").and_then(|v| v.as_str()) {
        println!("Verification code: {}", challenge);
    }

    let mut status = String::from(OUTSTANDING_STATUS);
    for _ in 0..max_polls {
        tokio::time::sleep(poll_interval).await;
        let response = workflow.get_mobile_signing_status(&signature_id).await?;
        status = response
            .get("midStatus")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        if status != OUTSTANDING_STATUS {
            break;
        }
    }
    Ok(status)
}

async fn inspect(workflow: &mut SigningWorkflow, path: &std::path::Path) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let content = base64::engine::general_purpose::STANDARD.encode(bytes);

    workflow.upload_hashcode_container(&content).await?;

    if let Err(e) = print_container_summary(workflow).await {
        discard_container(workflow).await;
        return Err(e);
    }

    workflow.delete_container().await?;
    Ok(())
}

async fn print_container_summary(workflow: &SigningWorkflow) -> anyhow::Result<()> {
    let data_files = workflow.get_data_files_list().await?;
    let signatures = workflow.get_signatures_list().await?;
    let validation = workflow.get_container_validation().await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "dataFiles": data_files,
            "signatures": signatures,
            "validationConclusion": validation,
        }))?
    );
    Ok(())
}

/// Best-effort removal of the remote container after a failed step
async fn discard_container(workflow: &mut SigningWorkflow) {
    if let Err(e) = workflow.delete_container().await {
        warn!(error = %e, "Could not delete remote container");
    }
}

fn report(outcome: FinalizeOutcome) {
    match outcome {
        FinalizeOutcome::Completed => println!("Signature accepted by the gateway"),
        FinalizeOutcome::Packaged(path) => println!("Signed container written to {}", path.display()),
    }
}
