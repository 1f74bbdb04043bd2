//! Connection resolution for container-engine daemons.
//!
//! The resolver decides, from a [`ResolutionSnapshot`] of ambient state,
//! which transport endpoint and credentials reach the daemon. Exactly one
//! strategy is chosen per attempt, in a fixed priority order:
//!
//! 1. Environment-derived construction, when `DOCKER_HOST` is set or the
//!    well-known local socket exists.
//! 2. The active named context from a [`ContextStore`], otherwise.
//!
//! After construction the daemon's API version is negotiated (bounded by a
//! timeout) and pinned on the returned [`DockerEngine`], so later
//! operations never use an incompatible wire format. Resolution failure is
//! fatal to the attempt; nothing is retried here.

use std::time::Duration;

use bollard::{ClientVersion, Docker};

use crate::client::{DockerEngine, classify_connection_error};
use crate::context::{ContextStore, TlsMaterial};
use crate::error::{CapstanError, EngineError, Result};

mod snapshot;

pub use snapshot::{
    API_VERSION_ENV_VAR, CERT_PATH_ENV_VAR, DEFAULT_SOCKET_PATH, HOST_ENV_VAR,
    ResolutionSnapshot, Strategy,
};
use snapshot::DEFAULT_SOCKET_URI;

/// Connection timeout in seconds for daemon API connections.
const CONNECTION_TIMEOUT_SECS: u64 = 120;

/// Timeout in seconds for the API version negotiation call.
const NEGOTIATION_TIMEOUT_SECS: u64 = 10;

/// Classifies endpoint types for connection handling.
enum EndpointKind {
    /// Unix socket or Windows named pipe with explicit scheme.
    Socket,
    /// HTTP, HTTPS, or TCP endpoint (TCP is rewritten to an HTTP scheme).
    Http,
    /// Bare path without scheme prefix.
    BarePath,
}

impl EndpointKind {
    /// Returns true if the endpoint has a Unix or named pipe scheme.
    fn is_socket_scheme(endpoint: &str) -> bool {
        endpoint.starts_with("unix://") || endpoint.starts_with("npipe://")
    }

    /// Returns true if the endpoint has an HTTP-compatible scheme.
    fn is_http_scheme(endpoint: &str) -> bool {
        endpoint.starts_with("tcp://")
            || endpoint.starts_with("http://")
            || endpoint.starts_with("https://")
    }

    /// Classify an endpoint by its scheme prefix.
    fn classify(endpoint: &str) -> Self {
        match (
            Self::is_socket_scheme(endpoint),
            Self::is_http_scheme(endpoint),
        ) {
            (true, _) => Self::Socket,
            (_, true) => Self::Http,
            _ => Self::BarePath,
        }
    }
}

/// A constructed, not yet negotiated connection.
///
/// Splitting construction from negotiation keeps the strategy decision
/// observable (and testable) without network I/O; [`ConnectionResolver::negotiate_async`]
/// performs the single network call.
#[derive(Debug)]
pub struct PreparedConnection {
    docker: Docker,
    endpoint: String,
}

impl PreparedConnection {
    /// The endpoint the connection was constructed against.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Resolves ambient state into a live, version-negotiated engine client.
pub struct ConnectionResolver;

impl ConnectionResolver {
    /// Select a strategy and construct the connection, without touching the
    /// network.
    ///
    /// The context store is only consulted when the snapshot selects the
    /// fallback strategy.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidApiVersion` when the snapshot pins an
    /// unparseable version, a `ContextError` when the fallback finds no
    /// usable context, and connection-classification errors
    /// (`ConnectionFailed`, `SocketNotFound`, `PermissionDenied`) when
    /// client construction fails.
    pub fn prepare<S: ContextStore>(
        snapshot: &ResolutionSnapshot,
        contexts: &S,
    ) -> Result<PreparedConnection> {
        let version = Self::client_version(snapshot)?;

        match snapshot.strategy() {
            Strategy::Environment => {
                let endpoint = snapshot
                    .host()
                    .map_or_else(|| String::from(DEFAULT_SOCKET_URI), ToOwned::to_owned);
                let docker = Self::connect(&endpoint, snapshot.tls(), &version)?;
                Ok(PreparedConnection { docker, endpoint })
            }
            Strategy::ActiveContext => {
                let context = contexts.active()?;
                let docker = Self::connect(context.endpoint(), context.tls(), &version)?;
                Ok(PreparedConnection {
                    docker,
                    endpoint: String::from(context.endpoint()),
                })
            }
        }
    }

    /// Negotiate the API version against the live endpoint and pin it.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NegotiationTimeout` when the daemon does not
    /// answer within the negotiation timeout, and
    /// `EngineError::ConnectionFailed` when negotiation fails.
    pub async fn negotiate_async(prepared: PreparedConnection) -> Result<DockerEngine> {
        let PreparedConnection { docker, endpoint } = prepared;
        let timeout = Duration::from_secs(NEGOTIATION_TIMEOUT_SECS);

        let negotiated = tokio::time::timeout(timeout, docker.negotiate_version())
            .await
            .map_err(|_| {
                CapstanError::from(EngineError::NegotiationTimeout {
                    seconds: NEGOTIATION_TIMEOUT_SECS,
                })
            })?
            .map_err(|error| {
                CapstanError::from(EngineError::ConnectionFailed {
                    message: error.to_string(),
                })
            })?;

        Ok(DockerEngine::new(negotiated, endpoint))
    }

    /// Resolve a snapshot into a negotiated engine client (async version).
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`Self::prepare`] and
    /// [`Self::negotiate_async`].
    pub async fn resolve_async<S: ContextStore>(
        snapshot: &ResolutionSnapshot,
        contexts: &S,
    ) -> Result<DockerEngine> {
        Self::negotiate_async(Self::prepare(snapshot, contexts)?).await
    }

    /// Resolve a snapshot into a negotiated engine client.
    ///
    /// This is the synchronous version that creates a dedicated tokio
    /// runtime. Use [`Self::resolve_async`] when already in an async
    /// context to avoid the runtime creation overhead.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::RuntimeCreationFailed` if the tokio runtime
    /// cannot be created, and otherwise propagates the errors of
    /// [`Self::resolve_async`].
    pub fn resolve<S: ContextStore>(
        snapshot: &ResolutionSnapshot,
        contexts: &S,
    ) -> Result<DockerEngine> {
        let rt = Self::create_runtime()?;
        rt.block_on(Self::resolve_async(snapshot, contexts))
    }

    /// Construct a client for `endpoint` without touching the network.
    fn connect(
        endpoint: &str,
        tls: Option<&TlsMaterial>,
        version: &ClientVersion,
    ) -> Result<Docker> {
        let docker = match EndpointKind::classify(endpoint) {
            EndpointKind::Socket => {
                Docker::connect_with_socket(endpoint, CONNECTION_TIMEOUT_SECS, version)
            }
            EndpointKind::Http => Self::connect_http(endpoint, tls, version),
            EndpointKind::BarePath => {
                let endpoint_uri = Self::normalize_bare_path(endpoint);
                Docker::connect_with_socket(&endpoint_uri, CONNECTION_TIMEOUT_SECS, version)
            }
        }
        .map_err(|error| CapstanError::from(classify_connection_error(&error, endpoint)))?;

        Ok(docker)
    }

    /// Construct a client for an HTTP-compatible endpoint.
    ///
    /// With TLS material, `tcp://` is rewritten to `https://` and the
    /// material's CA, certificate, and key are applied; without it,
    /// `tcp://` is rewritten to `http://` for `Bollard` compatibility.
    fn connect_http(
        endpoint: &str,
        tls: Option<&TlsMaterial>,
        version: &ClientVersion,
    ) -> std::result::Result<Docker, bollard::errors::Error> {
        match tls {
            Some(material) => Docker::connect_with_ssl(
                &Self::rewrite_tcp_scheme(endpoint, "https://"),
                material.key().as_std_path(),
                material.cert().as_std_path(),
                material.ca().as_std_path(),
                CONNECTION_TIMEOUT_SECS,
                version,
            ),
            None => Docker::connect_with_http(
                &Self::rewrite_tcp_scheme(endpoint, "http://"),
                CONNECTION_TIMEOUT_SECS,
                version,
            ),
        }
    }

    /// Rewrite a `tcp://` endpoint to the given HTTP scheme, leaving other
    /// endpoints untouched.
    fn rewrite_tcp_scheme(endpoint: &str, scheme: &str) -> String {
        endpoint.strip_prefix("tcp://").map_or_else(
            || String::from(endpoint),
            |rest| format!("{scheme}{rest}"),
        )
    }

    /// Normalize a bare socket path to a URI with the appropriate scheme.
    ///
    /// Paths starting with `\\` or `//` are assumed to be Windows named
    /// pipe paths (e.g., `\\.\pipe\docker_engine`) and are prefixed with
    /// `npipe://`. All other paths are assumed to be Unix socket paths and
    /// are prefixed with `unix://`.
    ///
    /// Note: This detection is based on path syntax, not the current
    /// platform. Paths like `//some/path` will be treated as named pipes
    /// even on Unix.
    fn normalize_bare_path(path: &str) -> String {
        if path.starts_with("\\\\") || path.starts_with("//") {
            format!("npipe://{path}")
        } else {
            format!("unix://{path}")
        }
    }

    /// The client version negotiation starts from: the snapshot's pin when
    /// present, otherwise the library default.
    fn client_version(snapshot: &ResolutionSnapshot) -> Result<ClientVersion> {
        snapshot.api_version().map_or_else(
            || {
                Ok(ClientVersion {
                    major_version: bollard::API_DEFAULT_VERSION.major_version,
                    minor_version: bollard::API_DEFAULT_VERSION.minor_version,
                })
            },
            |value| Self::parse_api_version(value).map_err(CapstanError::from),
        )
    }

    /// Parse a `major.minor` API version string.
    fn parse_api_version(value: &str) -> std::result::Result<ClientVersion, EngineError> {
        let invalid = || EngineError::InvalidApiVersion {
            value: String::from(value),
        };
        let (major, minor) = value.split_once('.').ok_or_else(invalid)?;
        let major_version = major.parse::<usize>().map_err(|_| invalid())?;
        let minor_version = minor.parse::<usize>().map_err(|_| invalid())?;
        Ok(ClientVersion {
            major_version,
            minor_version,
        })
    }

    /// Create a tokio runtime for synchronous operations.
    fn create_runtime() -> Result<tokio::runtime::Runtime> {
        tokio::runtime::Runtime::new().map_err(|e| {
            CapstanError::from(EngineError::RuntimeCreationFailed {
                message: e.to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests;
