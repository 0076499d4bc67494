//! Audit Trail
//!
//! Tamper-evident side-records for grade transactions, stored in the ledger
//! next to the records they describe.

pub mod entry;
pub mod recorder;
pub mod verify;

pub use entry::{AuditEntry, TransactionType};
pub use recorder::{entry_key, record, trail, trail_prefix};
pub use verify::{verify_trail, TrailVerification};
