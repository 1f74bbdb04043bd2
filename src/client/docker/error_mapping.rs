//! Classification of `Bollard` errors into semantic `EngineError` variants.
//!
//! Two boundaries are covered: operation calls against a live daemon
//! (`map_api_error`) and client construction (`classify_connection_error`).
//! Callers branch on the resulting variants through the capability
//! predicates without ever seeing a `Bollard` type.

use std::path::{Path, PathBuf};

use bollard::errors::Error as BollardError;

use crate::error::{EngineError, io_error_kind_in_chain};

/// Map a daemon operation failure into a semantic `EngineError`.
///
/// Status 404 and 409 responses become `NotFound` and `Conflict`; other
/// daemon statuses keep their code in `Api`. Transport-level failures are
/// classified as connection failures, and anything else is surfaced as a
/// protocol error.
pub(crate) fn map_api_error(error: &BollardError) -> EngineError {
    match error {
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } => match *status_code {
            404 => EngineError::NotFound {
                message: message.clone(),
            },
            409 => EngineError::Conflict {
                message: message.clone(),
            },
            status => EngineError::Api {
                status_code: status,
                message: message.clone(),
            },
        },
        BollardError::SocketNotFoundError(path) => EngineError::SocketNotFound {
            path: PathBuf::from(path),
        },
        BollardError::RequestTimeoutError => EngineError::ConnectionFailed {
            message: error.to_string(),
        },
        BollardError::IOError { err } => classify_io_error_kind(
            io_error_kind_in_chain(err).unwrap_or_else(|| err.kind()),
            None,
            &error.to_string(),
        ),
        other => {
            if let Some(kind) = io_error_kind_in_chain(other) {
                return classify_io_error_kind(kind, None, &other.to_string());
            }
            EngineError::Protocol {
                message: other.to_string(),
            }
        }
    }
}

/// Extract the filesystem path from a socket endpoint URI.
///
/// Strips the scheme prefix (`unix://`, `npipe://`) to get the raw path.
/// For HTTP endpoints or bare paths, returns `None` as they either do not
/// have filesystem paths or lack the scheme prefix needed for reliable
/// extraction.
pub(crate) fn extract_socket_path(endpoint: &str) -> Option<&Path> {
    endpoint
        .strip_prefix("unix://")
        .or_else(|| endpoint.strip_prefix("npipe://"))
        .map(Path::new)
}

/// Classify an I/O error kind into a semantic `EngineError`.
///
/// Maps specific `ErrorKind` variants to their corresponding variants when
/// a socket path is available, falling back to `ConnectionFailed` for other
/// error kinds or when no path can be extracted.
fn classify_io_error_kind(
    kind: std::io::ErrorKind,
    socket_path: Option<&Path>,
    error_msg: &str,
) -> EngineError {
    match kind {
        std::io::ErrorKind::PermissionDenied => socket_path.map_or_else(
            || EngineError::ConnectionFailed {
                message: error_msg.to_owned(),
            },
            |path| EngineError::PermissionDenied {
                path: path.to_path_buf(),
            },
        ),
        std::io::ErrorKind::NotFound => socket_path.map_or_else(
            || EngineError::ConnectionFailed {
                message: error_msg.to_owned(),
            },
            |path| EngineError::SocketNotFound {
                path: path.to_path_buf(),
            },
        ),
        _ => EngineError::ConnectionFailed {
            message: error_msg.to_owned(),
        },
    }
}

/// Classify a `Bollard` client-construction error into a semantic
/// `EngineError`.
///
/// Inspects the error type and underlying cause to determine the most
/// specific variant. Falls back to `ConnectionFailed` for errors that do
/// not match known patterns or for endpoints without filesystem paths.
pub(crate) fn classify_connection_error(error: &BollardError, endpoint: &str) -> EngineError {
    let socket_path = extract_socket_path(endpoint);
    let error_msg = error.to_string();

    match error {
        BollardError::SocketNotFoundError(_) => {
            if let Some(path) = socket_path {
                return EngineError::SocketNotFound {
                    path: path.to_path_buf(),
                };
            }
        }
        BollardError::IOError { err } => {
            let direct_kind = err.kind();
            if let Some(chained_kind) = io_error_kind_in_chain(err) {
                return classify_io_error_kind(chained_kind, socket_path, &error_msg);
            }
            return classify_io_error_kind(direct_kind, socket_path, &error_msg);
        }
        _ => {}
    }

    if let Some(kind) = io_error_kind_in_chain(error) {
        return classify_io_error_kind(kind, socket_path, &error_msg);
    }

    EngineError::ConnectionFailed { message: error_msg }
}
