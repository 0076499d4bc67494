//! Ledger Integrity Audit CLI
//!
//! Re-checks grade digests, the VERIFY entries behind official grades and
//! audit trail seals in a SQLite ledger without
//! modifying it. Exits non-zero when anything fails to verify.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::error;

use srs_ledger::audit::verify_trail;
use srs_ledger::ledger::{LedgerStore, SqliteLedger};
use srs_ledger::RecordsContract;

const PERFORMER: &str = "srs-audit";

#[derive(Parser)]
#[command(name = "srs-audit")]
#[command(about = "Verify grade integrity in an SRS ledger")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database URL
    #[arg(long, env = "SRS_DATABASE_URL", default_value = "sqlite://srs-ledger.db")]
    database_url: String,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute every stored grade digest and check official grades against their trail
    Results,

    /// Show and verify the audit trail of one result
    Trail {
        /// Result ID
        result_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "srs_ledger=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let store: Arc<dyn LedgerStore> = Arc::new(SqliteLedger::connect(&cli.database_url).await?);
    let contract = RecordsContract::new(store);

    let clean = match cli.command {
        Commands::Results => {
            let report = contract.audit_results(PERFORMER).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Checked {} results ({} official)",
                    report.checked, report.official
                );
                for tampered in &report.tampered {
                    println!(
                        "  TAMPERED {}: stored {} recomputed {}",
                        tampered.result_id, tampered.stored, tampered.recomputed
                    );
                }
                for unverified in &report.unverified {
                    println!("  UNVERIFIED {}: {}", unverified.result_id, unverified.reason);
                }
                for skipped in &report.skipped {
                    println!("  UNREADABLE {}: {}", skipped.key, skipped.reason);
                }
            }
            report.is_clean()
        }
        Commands::Trail { result_id } => {
            let trail = contract.get_grade_audit_trail(PERFORMER, &result_id).await?;
            let verification = verify_trail(&trail.records);
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "trail": trail,
                        "verification": verification,
                    }))?
                );
            } else {
                for entry in &trail.records {
                    println!("  {}", entry.summary());
                }
                println!("{} entries, valid: {}", verification.entry_count, verification.is_valid);
                if let Some(message) = &verification.error_message {
                    println!("  {}", message);
                }
            }
            verification.is_valid && trail.is_complete()
        }
    };

    if !clean {
        error!("Ledger audit found problems");
        std::process::exit(1);
    }

    Ok(())
}
