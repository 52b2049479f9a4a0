//! CLI command implementations.
//!
//! Every command prints its result as pretty JSON on stdout so it can be
//! piped into `jq` or other tooling.

pub mod batch;
pub mod ingredient;
pub mod migrate;
pub mod recipe;
pub mod stock;

use serde::Serialize;
use thiserror::Error;

use solid_ops::error::OpsError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Business or storage failure from the services.
    #[error(transparent)]
    Ops(#[from] OpsError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Input file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Input file is not valid YAML for the expected shape.
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Output could not be encoded.
    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CommandError {
    /// Whether the failure is infrastructure rather than a rejected request.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        match self {
            Self::Ops(e) => e.is_internal(),
            Self::Database(_) | Self::Migration(_) | Self::Json(_) => true,
            Self::Io { .. } | Self::Yaml(_) => false,
        }
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    let rendered = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{rendered}");
    }
    Ok(())
}
