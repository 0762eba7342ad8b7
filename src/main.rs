//! Contract Sentinel CLI
//!
//! Scans a Solidity file and prints a Markdown security report.
//!
//! Usage:
//!   contract_sentinel <file.sol> [ContractName] [--audit]
//!
//! `--audit` also submits the source to the audit backend
//! (`SENTINEL_AUDIT_URL`). Exits with status 1 when critical findings exist.

use contract_sentinel::providers::audit::AuditClient;
use contract_sentinel::{format_report, PatternScanner, SentinelConfig};

use eyre::{eyre, Result, WrapErr};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let audit = args.iter().any(|a| a == "--audit");
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    let path = positional
        .first()
        .ok_or_else(|| eyre!("usage: contract_sentinel <file.sol> [ContractName] [--audit]"))?;

    let source = std::fs::read_to_string(path.as_str())
        .wrap_err_with(|| format!("Failed to read {}", path))?;

    let contract_name = positional
        .get(1)
        .map(|s| s.to_string())
        .or_else(|| {
            Path::new(path.as_str())
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "Contract".to_string());

    let analysis = PatternScanner::analyze(&source, &contract_name);
    info!("🔍 {} findings in {}", analysis.findings.len(), contract_name);
    println!("{}", format_report(&analysis));

    if audit {
        let config = SentinelConfig::from_env().map_err(|e| eyre!("{}", e))?;
        let client = AuditClient::from_config(&config).map_err(|e| eyre!("{}", e))?;
        let result = client.audit(&source, &contract_name).await;

        println!("## Backend Audit");
        println!();
        println!(
            "**Score:** {}/100 | **Grade:** {:?} | **Passed:** {}",
            result.score, result.grade, result.passed
        );
        println!();
        for issue in &result.issues {
            println!(
                "- [{}] {} ({}): {}",
                issue.severity.as_str(),
                issue.title,
                issue.tool,
                issue.description
            );
        }
        for rec in &result.recommendations {
            println!("- 💡 {}", rec);
        }
    }

    if analysis.has_critical() {
        std::process::exit(1);
    }

    Ok(())
}
