//! Semantic error types for the capstan library.
//!
//! This module defines the error taxonomy for capstan, following the principle
//! of using semantic error enums (via `thiserror`) for conditions the caller
//! might inspect or branch on, while reserving opaque errors (`eyre::Report`)
//! for the application boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while talking to, or connecting to, a container engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Failed to reach the container engine over the selected transport.
    #[error("failed to connect to container engine: {message}")]
    ConnectionFailed {
        /// A description of the connection failure.
        message: String,
    },

    /// API version negotiation did not complete within the timeout.
    #[error("API version negotiation timed out after {seconds} seconds")]
    NegotiationTimeout {
        /// The timeout duration in seconds.
        seconds: u64,
    },

    /// The container engine socket was not found.
    #[error("container engine socket not found: {path}")]
    SocketNotFound {
        /// The path where the socket was expected.
        path: PathBuf,
    },

    /// Permission denied when accessing the container engine socket.
    #[error("permission denied accessing container socket: {path}")]
    PermissionDenied {
        /// The path to the socket.
        path: PathBuf,
    },

    /// A referenced resource (container, image, or network) does not exist.
    #[error("resource not found: {message}")]
    NotFound {
        /// The daemon's description of the missing resource.
        message: String,
    },

    /// A create request collided with an existing resource name.
    #[error("resource conflict: {message}")]
    Conflict {
        /// The daemon's description of the collision.
        message: String,
    },

    /// The daemon rejected a request with a status this crate does not map
    /// to a more specific variant.
    #[error("container engine returned status {status_code}: {message}")]
    Api {
        /// The HTTP status code returned by the daemon.
        status_code: u16,
        /// The daemon's error message.
        message: String,
    },

    /// A request was rejected locally before reaching the daemon.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// The reason the request is invalid.
        message: String,
    },

    /// The environment-supplied API version pin could not be parsed.
    #[error("invalid API version '{value}'")]
    InvalidApiVersion {
        /// The unparseable version string.
        value: String,
    },

    /// The wire response could not be decoded, or an in-band stream error
    /// was reported by the daemon.
    #[error("container engine protocol error: {message}")]
    Protocol {
        /// A description of the protocol failure.
        message: String,
    },

    /// The synchronous wrapper could not create a tokio runtime.
    #[error("failed to create tokio runtime: {message}")]
    RuntimeCreationFailed {
        /// A description of the runtime creation failure.
        message: String,
    },
}

impl EngineError {
    /// Whether this error reports an absent resource.
    ///
    /// True for every error produced by an inspect, remove, start, or stop
    /// call against a nonexistent identifier.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this error reports an unreachable or unresponsive transport.
    ///
    /// Covers construction failures, socket problems, and version
    /// negotiation timeouts.
    #[must_use]
    pub const fn is_connection_failed(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::NegotiationTimeout { .. }
                | Self::SocketNotFound { .. }
                | Self::PermissionDenied { .. }
        )
    }
}

/// Errors produced while resolving a named engine context.
#[derive(Debug, Error)]
pub enum ContextError {
    /// No active context is configured in the store.
    #[error("no active engine context is configured")]
    NoActiveContext,

    /// The named context does not exist in the store.
    #[error("engine context not found: {name}")]
    NotFound {
        /// The name that was looked up.
        name: String,
    },

    /// The named context exists but could not be read.
    #[error("failed to read engine context '{name}': {message}")]
    Unreadable {
        /// The name of the context.
        name: String,
        /// A description of the read failure.
        message: String,
    },

    /// The named context record does not describe a usable endpoint.
    #[error("invalid engine context '{name}': {reason}")]
    Invalid {
        /// The name of the context.
        name: String,
        /// The reason the record is invalid.
        reason: String,
    },

    /// A store-level file could not be read or parsed.
    #[error("failed to read context store entry '{path}': {message}")]
    StoreUnreadable {
        /// The store entry that failed.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },
}

/// Top-level error type for the capstan library.
///
/// Aggregates the domain-specific errors into a single type callers can
/// propagate. At the application boundary these are typically converted to
/// `eyre::Report` for human-readable reporting.
#[derive(Debug, Error)]
pub enum CapstanError {
    /// An error occurred while connecting to or driving the engine.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// An error occurred while resolving a named context.
    #[error(transparent)]
    Context(#[from] ContextError),
}

/// A specialised `Result` type for capstan operations.
pub type Result<T> = std::result::Result<T, CapstanError>;

/// Walk an error source chain looking for an `io::Error` kind.
pub(crate) fn io_error_kind_in_chain(error: &dyn std::error::Error) -> Option<std::io::ErrorKind> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = error.source();
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
            return Some(io_err.kind());
        }
        current = err.source();
    }
    None
}
