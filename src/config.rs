use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Optional configuration file, looked up in the working directory
/// (`srs-ledger.toml`, `.yaml`, `.json`, ...).
pub const CONFIG_FILE: &str = "srs-ledger";

/// Environment variable prefix: `SRS_DATABASE_URL`, `SRS_AUDIT__RECORD_SUBMISSIONS`, ...
pub const ENV_PREFIX: &str = "SRS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Also write a CREATE audit entry when a grade is submitted.
    pub record_submissions: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub ledger_backend: LedgerBackend,
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Seed snapshot used by `POST /admin/init`; the built-in one when unset.
    pub seed_path: Option<String>,
    pub audit: AuditConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ledger_backend: LedgerBackend::Sqlite,
            database_url: "sqlite://srs-ledger.db".to_string(),
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            seed_path: None,
            audit: AuditConfig {
                record_submissions: false,
            },
        }
    }
}

impl AppConfig {
    /// Defaults, then the optional config file, then `SRS_*` environment
    /// variables.
    pub fn load() -> Result<Self> {
        Self::load_from(Some(CONFIG_FILE))
    }

    pub fn load_from(file: Option<&str>) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = config::Config::builder()
            .set_default("ledger_backend", "sqlite")
            .and_then(|b| b.set_default("database_url", defaults.database_url.clone()))
            .and_then(|b| b.set_default("server_host", defaults.server_host.clone()))
            .and_then(|b| b.set_default("server_port", defaults.server_port as i64))
            .and_then(|b| b.set_default("audit.record_submissions", defaults.audit.record_submissions))
            .map_err(|e| LedgerError::Config(e.to_string()))?;

        if let Some(file) = file {
            builder = builder.add_source(config::File::with_name(file).required(false));
        }

        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| LedgerError::Config(format!("Failed to load configuration: {}", e)))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
