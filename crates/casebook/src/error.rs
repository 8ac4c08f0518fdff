//! Error types for casebook.
//!
//! This module defines all error types used throughout the casebook crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for casebook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Remote Store Errors ===
    /// The remote store has no configured endpoint.
    #[error("remote store is not initialized")]
    RemoteUnavailable,

    /// A request to the remote store could not be completed.
    #[error("remote {operation} failed: {message}")]
    RemoteRequest {
        /// The operation that was attempted.
        operation: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// The remote store answered with a non-success status.
    #[error("remote {operation} returned HTTP {status}: {body}")]
    RemoteStatus {
        /// The operation that was attempted.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        body: String,
    },

    /// A remote response could not be decoded.
    #[error("remote {operation} returned a malformed response: {message}")]
    RemoteDecode {
        /// The operation that was attempted.
        operation: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// A conditional remote write kept losing to concurrent writers.
    #[error("remote write to post {id} conflicted after {attempts} attempts")]
    RemoteConflict {
        /// Id of the contested post.
        id: String,
        /// Number of attempts made.
        attempts: u32,
    },

    // === Post Errors ===
    /// Another post already uses this slug.
    #[error("slug '{slug}' is already used by post {existing_id}")]
    SlugConflict {
        /// The contested slug.
        slug: String,
        /// Id of the post that owns the slug.
        existing_id: String,
    },

    /// Input was rejected.
    #[error("invalid post data: {0}")]
    Validation(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for casebook operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a remote request error from a transport failure.
    #[must_use]
    pub fn remote_request(operation: &'static str, err: &reqwest::Error) -> Self {
        Self::RemoteRequest {
            operation,
            message: err.to_string(),
        }
    }

    /// Create a remote decode error.
    #[must_use]
    pub fn remote_decode(operation: &'static str, message: impl Into<String>) -> Self {
        Self::RemoteDecode {
            operation,
            message: message.into(),
        }
    }

    /// Check if this error came from the remote backend.
    ///
    /// The hybrid coordinator falls back to the local store on these.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnavailable
                | Self::RemoteRequest { .. }
                | Self::RemoteStatus { .. }
                | Self::RemoteDecode { .. }
                | Self::RemoteConflict { .. }
        )
    }

    /// Check if this error is a slug collision.
    #[must_use]
    pub fn is_slug_conflict(&self) -> bool {
        matches!(self, Self::SlugConflict { .. })
    }
}
