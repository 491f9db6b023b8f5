//! Enclave entry point.
//!
//! Runs inside the confidential compute environment. The runtime decrypts
//! protected order data before launch and mounts it under the input
//! directory; this binary validates and matches what it finds there, then
//! writes a deterministic result artifact for the settlement path.
//!
//! Input resolution, in order:
//! 1. a decrypted dataset file (single protected order),
//! 2. a JSON argument (batch envelope or single order),
//! 3. nothing: a capability probe, and the binary describes itself.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use veil_auction::{decode_batch, decode_order, process_batch, rejection_report, BatchReport};

const IN_DIR_ENV: &str = "ENCLAVE_IN";
const OUT_DIR_ENV: &str = "ENCLAVE_OUT";
const DATASET_FILE_ENV: &str = "ENCLAVE_DATASET_FILE";

/// Confidential order processor for the veil exchange.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON input: a batch envelope `{"orders": [...]}` or a single order.
    input: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultDocument {
    app: &'static str,
    version: &'static str,
    mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<BatchReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    supported_kinds: Option<Vec<&'static str>>,
}

#[derive(Debug, Serialize)]
struct Manifest {
    #[serde(rename = "deterministic-output-path")]
    deterministic_output_path: PathBuf,
}

fn main() -> Result<()> {
    veil_telemetry::init_logging()?;
    let args = Args::parse();

    let in_dir = std::env::var(IN_DIR_ENV).unwrap_or_else(|_| "/enclave_in".to_string());
    let out_dir = std::env::var(OUT_DIR_ENV).unwrap_or_else(|_| "/enclave_out".to_string());
    let now = Utc::now();

    let document = match read_dataset(&in_dir)? {
        Some(bytes) => {
            info!("processing protected order data");
            let report = match decode_order(&bytes) {
                Ok(raw) => process_batch(&[raw], now),
                Err(reason) => {
                    warn!(%reason, "protected payload unreadable");
                    rejection_report(&reason, now)
                }
            };
            ResultDocument {
                app: "veil-enclave",
                version: env!("CARGO_PKG_VERSION"),
                mode: "protected-order",
                report: Some(report),
                supported_kinds: None,
            }
        }
        None => match args.input {
            Some(input) => {
                info!("processing order data from arguments");
                let bytes = input.as_bytes();
                // Batch envelope first; a bare order object is the fallback.
                let report = match decode_batch(bytes) {
                    Ok(orders) if !orders.is_empty() => process_batch(&orders, now),
                    _ => match decode_order(bytes) {
                        Ok(raw) => process_batch(&[raw], now),
                        Err(reason) => {
                            warn!(%reason, "argument payload unreadable");
                            rejection_report(&reason, now)
                        }
                    },
                };
                ResultDocument {
                    app: "veil-enclave",
                    version: env!("CARGO_PKG_VERSION"),
                    mode: "batch",
                    report: Some(report),
                    supported_kinds: None,
                }
            }
            None => {
                info!("no order data provided, writing capability probe");
                ResultDocument {
                    app: "veil-enclave",
                    version: env!("CARGO_PKG_VERSION"),
                    mode: "probe",
                    report: None,
                    supported_kinds: Some(vec!["market", "limit"]),
                }
            }
        },
    };

    write_output(&out_dir, &document)
}

/// Read the decrypted dataset, if the runtime mounted one.
fn read_dataset(in_dir: &str) -> Result<Option<Vec<u8>>> {
    let file_name = match std::env::var(DATASET_FILE_ENV) {
        Ok(name) if !name.is_empty() => name,
        _ => return Ok(None),
    };
    let path = Path::new(in_dir).join(&file_name);
    if !path.exists() {
        warn!(path = %path.display(), "dataset file named but not present");
        return Ok(None);
    }
    let bytes = std::fs::read(&path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    Ok(Some(bytes))
}

/// Write `result.json` plus the manifest the runtime uses to attest output.
fn write_output(out_dir: &str, document: &ResultDocument) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output dir {out_dir}"))?;

    let result_path = Path::new(out_dir).join("result.json");
    let result_json = serde_json::to_string_pretty(document)?;
    std::fs::write(&result_path, result_json)
        .with_context(|| format!("failed to write {}", result_path.display()))?;

    let manifest = Manifest {
        deterministic_output_path: result_path.clone(),
    };
    let manifest_path = Path::new(out_dir).join("manifest.json");
    std::fs::write(&manifest_path, serde_json::to_string(&manifest)?)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    info!(result = %result_path.display(), "enclave output written");
    Ok(())
}
