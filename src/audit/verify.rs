//! Audit Trail Verification
//!
//! Checks that a retrieved trail is internally consistent: every entry's
//! seal recomputes, all entries belong to one subject and timestamps never
//! go backwards.

use serde::Serialize;
use tracing::{info, warn};

use crate::audit::entry::AuditEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrailVerification {
    pub is_valid: bool,
    pub entry_count: usize,
    pub seals_valid: bool,
    pub single_subject: bool,
    pub timestamps_monotonic: bool,
    pub error_message: Option<String>,
}

/// Verify a trail as returned by the recorder (oldest first).
pub fn verify_trail(entries: &[AuditEntry]) -> TrailVerification {
    let mut errors = Vec::new();

    let mut seals_valid = true;
    for (i, entry) in entries.iter().enumerate() {
        if !entry.verify_hash() {
            seals_valid = false;
            errors.push(format!("invalid seal on entry {} ({})", i, entry.transaction_id));
        }
    }

    let single_subject = match entries.first() {
        Some(first) => entries.iter().all(|e| e.subject_key == first.subject_key),
        None => true,
    };
    if !single_subject {
        errors.push("entries belong to more than one subject".to_string());
    }

    let mut timestamps_monotonic = true;
    for i in 1..entries.len() {
        if entries[i].timestamp < entries[i - 1].timestamp {
            timestamps_monotonic = false;
            errors.push(format!(
                "non-monotonic timestamp at entry {}: {} < {}",
                i,
                entries[i].timestamp,
                entries[i - 1].timestamp
            ));
        }
    }

    let is_valid = errors.is_empty();
    if is_valid {
        info!("Audit trail verified: {} entries", entries.len());
    } else {
        warn!("Audit trail verification failed: {}", errors.join("; "));
    }

    TrailVerification {
        is_valid,
        entry_count: entries.len(),
        seals_valid,
        single_subject,
        timestamps_monotonic,
        error_message: if is_valid { None } else { Some(errors.join("; ")) },
    }
}
