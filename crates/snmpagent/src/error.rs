//! Error types for the SNMP subagent.
//!
//! Store failures are wrapped from [`DbError`]; everything the MIB layer
//! raises on its own is one of the variants below. Only startup
//! inconsistencies and configuration errors stop the process, the rest are
//! logged by the refresh loop and the previous snapshot keeps serving.

use crate::db::DbError;
use std::io;
use thiserror::Error;

/// Result type alias for subagent operations.
pub type Result<T> = std::result::Result<T, SnmpAgentError>;

/// Errors that can occur in the subagent.
#[derive(Debug, Error)]
pub enum SnmpAgentError {
    /// Redis/database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// The store holds no usable entities of a required kind.
    #[error("{table} is incoherent: {message}")]
    StartupInconsistency {
        /// Table or map that failed the consistency check.
        table: String,
        /// What was missing.
        message: String,
    },

    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Power supply status could not be read.
    #[error("Power status error: {0}")]
    PowerStatus(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SnmpAgentError {
    /// Creates a startup inconsistency error.
    pub fn startup_inconsistency(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StartupInconsistency {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a power status error.
    pub fn power_status(message: impl Into<String>) -> Self {
        Self::PowerStatus(message.into())
    }

    /// Returns true if the MIB owning this error must not be registered.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::StartupInconsistency { .. } | Self::Config(_)
        )
    }
}
