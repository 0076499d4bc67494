//! Grade verification state machine
//!
//! ```text
//! submit_grade ──> PENDING ──verify──> OFFICIAL
//! ```
//!
//! OFFICIAL is terminal. There is no reject or revert transition.

use serde::Serialize;
use tracing::{info, warn};

use super::{GradeReceipt, GradeResult, GradeStatus};
use crate::audit::{self, TransactionType};
use crate::error::{LedgerError, Result};
use crate::ledger::Transaction;
use crate::records::scanner::{self, ScanOutcome, SkippedRecord};
use crate::records::store::{self, format_timestamp};
use crate::records::{Entity, EntityKind};

/// Store a new result as PENDING with its submission digest.
///
/// With `record_submission` set, a CREATE audit entry is written in the
/// same transaction.
pub async fn submit_grade(
    tx: &mut Transaction,
    mut result: GradeResult,
    record_submission: bool,
) -> Result<GradeReceipt> {
    let result_id = result.require_id()?;
    let key = store::ensure_absent::<GradeResult>(tx, &result_id).await?;

    let now = tx.timestamp();
    result.result_id = Some(result_id.as_str().into());
    if result.submitted_at.is_none() {
        result.submitted_at = Some(now);
    }
    result.status = GradeStatus::Pending;
    result.verified_at = None;
    result.meta.is_active = true;
    if result.meta.created_date.is_none() {
        result.meta.created_date = Some(format_timestamp(now));
    }
    if result.meta.updated_date.is_none() {
        result.meta.updated_date = Some(format_timestamp(now));
    }
    result.hash = result.compute_hash()?;

    store::put(tx, &result_id, &result)?;
    if record_submission {
        audit::record(tx, TransactionType::Create, &key, &result.hash)?;
    }

    info!("Grade {} submitted by {} (hash {})", key, tx.performer(), result.hash);
    Ok(GradeReceipt {
        message: "Grade submitted successfully".to_string(),
        result_id,
    })
}

/// Promote a PENDING result to OFFICIAL after re-checking its digest.
///
/// Fails `NotFound`, `InvalidState` (already OFFICIAL) or `Integrity`
/// (digest mismatch). On any failure nothing is written.
pub async fn verify(tx: &mut Transaction, result_id: &str) -> Result<GradeReceipt> {
    let mut result: GradeResult = store::get(tx, result_id).await?;
    let key = EntityKind::Result.storage_key(result_id)?;

    if result.is_official() {
        return Err(LedgerError::InvalidState(format!(
            "{} is already {}",
            key,
            GradeStatus::Official
        )));
    }

    let recomputed = result.compute_hash()?;
    if recomputed != result.hash {
        warn!(
            "Integrity check failed for {}: stored {} recomputed {}",
            key, result.hash, recomputed
        );
        return Err(LedgerError::Integrity {
            result_id: result_id.to_string(),
            stored: result.hash,
            recomputed,
        });
    }

    result.status = GradeStatus::Official;
    result.verified_at = Some(tx.timestamp());
    store::put(tx, result_id, &result)?;
    audit::record(tx, TransactionType::Verify, &key, &result.hash)?;

    info!("Grade {} verified and made official by {}", key, tx.performer());
    Ok(GradeReceipt {
        message: "Grade verified and made official".to_string(),
        result_id: result_id.to_string(),
    })
}

pub async fn get_result(tx: &mut Transaction, result_id: &str) -> Result<GradeResult> {
    store::get(tx, result_id).await
}

pub async fn list_results(tx: &Transaction) -> Result<ScanOutcome<GradeResult>> {
    scanner::scan(tx).await
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TamperedResult {
    pub result_id: String,
    pub stored: String,
    pub recomputed: String,
}

/// An OFFICIAL result without exactly one sealed VERIFY entry matching its
/// stored digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnverifiedResult {
    pub result_id: String,
    pub reason: String,
}

/// Outcome of re-checking every stored result digest
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub checked: usize,
    pub official: usize,
    pub tampered: Vec<TamperedResult>,
    pub unverified: Vec<UnverifiedResult>,
    pub skipped: Vec<SkippedRecord>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.tampered.is_empty() && self.unverified.is_empty() && self.skipped.is_empty()
    }
}

/// Why an OFFICIAL result's trail does not back its status, if it doesn't.
async fn verification_gap(tx: &Transaction, result_id: &str, result: &GradeResult) -> Option<String> {
    let key = match EntityKind::Result.storage_key(result_id) {
        Ok(key) => key,
        Err(e) => return Some(e.to_string()),
    };
    let trail = match audit::trail(tx, &key).await {
        Ok(trail) => trail,
        Err(e) => return Some(format!("trail unreadable: {}", e)),
    };

    let verifications: Vec<_> = trail
        .records
        .iter()
        .filter(|entry| entry.transaction_type == TransactionType::Verify)
        .collect();
    match verifications.as_slice() {
        [] => Some("no VERIFY entry".to_string()),
        [entry] if !entry.verify_hash() => Some("VERIFY entry seal is broken".to_string()),
        [entry] if entry.hash != result.hash => Some(format!(
            "VERIFY entry records {}, result stores {}",
            entry.hash, result.hash
        )),
        [_] => None,
        many => Some(format!("{} VERIFY entries", many.len())),
    }
}

/// Recompute the digest of every result without changing anything. OFFICIAL
/// results must also be backed by their VERIFY audit entry.
pub async fn audit_results(tx: &Transaction) -> Result<IntegrityReport> {
    let scanned = list_results(tx).await?;

    let mut report = IntegrityReport {
        skipped: scanned.skipped,
        ..Default::default()
    };

    for result in scanned.records {
        report.checked += 1;
        if result.is_official() {
            report.official += 1;
        }
        let result_id = result.id().map(|id| id.to_string()).unwrap_or_default();
        if result.is_official() {
            if let Some(reason) = verification_gap(tx, &result_id, &result).await {
                warn!("Official result {} is not backed by its audit trail: {}", result_id, reason);
                report.unverified.push(UnverifiedResult {
                    result_id: result_id.clone(),
                    reason,
                });
            }
        }
        let recomputed = result.compute_hash()?;
        if recomputed != result.hash {
            warn!("Result {} fails integrity check", result_id);
            report.tampered.push(TamperedResult {
                result_id,
                stored: result.hash,
                recomputed,
            });
        }
    }

    info!(
        "Integrity audit: {} results checked, {} tampered, {} unverified, {} unreadable",
        report.checked,
        report.tampered.len(),
        report.unverified.len(),
        report.skipped.len()
    );
    Ok(report)
}
