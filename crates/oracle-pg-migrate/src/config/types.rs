//! Configuration type definitions.

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration (Oracle).
    pub source: SourceConfig,

    /// Target database configuration (PostgreSQL).
    pub target: TargetConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationOptions,
}

/// Source database (Oracle) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database type (always "oracle" for now).
    #[serde(default = "default_oracle")]
    pub r#type: String,

    /// Database host.
    pub host: String,

    /// Listener port (default: 1521).
    #[serde(default = "default_oracle_port")]
    pub port: u16,

    /// Oracle service name.
    pub service_name: String,

    /// Username.
    pub user: String,

    /// Password.
    pub password: String,

    /// Wallet directory for TLS connections, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_location: Option<String>,
}

/// Target database (PostgreSQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database type (always "postgres" for now).
    #[serde(default = "default_postgres")]
    pub r#type: String,

    /// Database host.
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    pub password: String,

    /// SSL mode (default: "require").
    #[serde(default = "default_require")]
    pub ssl_mode: String,
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationOptions {
    /// Tables to migrate; empty means every table the source lists.
    #[serde(default)]
    pub tables: Vec<String>,

    /// Tables to skip. Always wins over the include list.
    #[serde(default)]
    pub exclude_tables: Vec<String>,

    /// Translate and create schemas without moving rows.
    #[serde(default)]
    pub only_schema: bool,

    /// Rows per transfer batch (default: 1000).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Timeout for a single connector call, in seconds (default: 30).
    #[serde(default = "default_op_timeout_secs")]
    pub op_timeout_secs: u64,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            tables: Vec::new(),
            exclude_tables: Vec::new(),
            only_schema: false,
            batch_size: default_batch_size(),
            op_timeout_secs: default_op_timeout_secs(),
        }
    }
}

// Passwords never reach logs or panics through Debug.
impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("service_name", &self.service_name)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("wallet_location", &self.wallet_location)
            .finish()
    }
}

impl std::fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            r#type: default_oracle(),
            host: "localhost".to_string(),
            port: default_oracle_port(),
            service_name: "ORCL".to_string(),
            user: "system".to_string(),
            password: String::new(),
            wallet_location: None,
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            r#type: default_postgres(),
            host: "localhost".to_string(),
            port: default_pg_port(),
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            ssl_mode: default_require(),
        }
    }
}

// Default value functions for serde
fn default_oracle() -> String {
    "oracle".to_string()
}

fn default_postgres() -> String {
    "postgres".to_string()
}

fn default_oracle_port() -> u16 {
    1521
}

fn default_pg_port() -> u16 {
    5432
}

fn default_require() -> String {
    "require".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_op_timeout_secs() -> u64 {
    30
}
