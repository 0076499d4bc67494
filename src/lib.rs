pub mod api;
pub mod audit;
pub mod bootstrap;
pub mod config;
pub mod contract;
pub mod error;
pub mod grades;
pub mod integrity;
pub mod ledger;
pub mod records;

pub use contract::RecordsContract;
pub use error::LedgerError;
