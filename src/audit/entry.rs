//! Audit Trail Entry
//!
//! One immutable side-record per state-changing grade transaction. Each
//! entry is sealed with a hash over its own canonical form so later edits to
//! a stored entry are detectable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

use crate::integrity;

const ENTRY_DOMAIN: &str = "audit-entry";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Create,
    Verify,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Create => "CREATE",
            TransactionType::Verify => "VERIFY",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub transaction_type: TransactionType,
    pub transaction_id: String,
    pub subject_key: String,
    pub timestamp: DateTime<Utc>,
    pub performer: String,
    /// Record digest captured at this transaction
    pub hash: String,
    pub entry_hash: String,
}

impl AuditEntry {
    pub fn new(
        transaction_type: TransactionType,
        transaction_id: String,
        subject_key: String,
        timestamp: DateTime<Utc>,
        performer: String,
        hash: String,
    ) -> Self {
        let mut entry = Self {
            transaction_type,
            transaction_id,
            subject_key,
            timestamp,
            performer,
            hash,
            entry_hash: String::new(),
        };
        entry.entry_hash = entry.calculate_hash();
        entry
    }

    /// Canonical form for sealing: the sealed fields as sorted-key JSON, so
    /// no field value can spill into its neighbour.
    pub fn canonical_string(&self) -> String {
        integrity::canonical_json(&json!({
            "transactionType": self.transaction_type.as_str(),
            "transactionId": self.transaction_id,
            "subjectKey": self.subject_key,
            "timestamp": self.timestamp.to_rfc3339(),
            "performer": self.performer,
            "hash": self.hash,
        }))
    }

    pub fn calculate_hash(&self) -> String {
        integrity::digest_bytes(ENTRY_DOMAIN, self.canonical_string().as_bytes())
    }

    pub fn verify_hash(&self) -> bool {
        self.entry_hash == self.calculate_hash()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} {} by {} ({})",
            self.transaction_type, self.subject_key, self.performer, self.transaction_id
        )
    }
}
