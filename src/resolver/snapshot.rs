//! Ambient-state snapshot backing connection resolution.
//!
//! Resolution never inspects process-global state directly. A
//! [`ResolutionSnapshot`] is captured once per attempt from an environment
//! provider and a socket-existence probe, so tests inject synthetic
//! environments instead of mutating the process.

use camino::Utf8Path;

use crate::context::TlsMaterial;

/// Environment variable designating an explicit daemon endpoint.
pub const HOST_ENV_VAR: &str = "DOCKER_HOST";

/// Environment variable naming a directory of TLS material
/// (`ca.pem`, `cert.pem`, `key.pem`).
pub const CERT_PATH_ENV_VAR: &str = "DOCKER_CERT_PATH";

/// Environment variable pinning the client API version (for example `1.47`).
pub const API_VERSION_ENV_VAR: &str = "DOCKER_API_VERSION";

/// Well-known local daemon socket path for Unix platforms.
#[cfg(unix)]
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/docker.sock";

/// Well-known local daemon pipe path for Windows platforms.
#[cfg(windows)]
pub const DEFAULT_SOCKET_PATH: &str = "//./pipe/docker_engine";

/// Default socket endpoint URI for Unix platforms.
#[cfg(unix)]
pub(super) const DEFAULT_SOCKET_URI: &str = "unix:///var/run/docker.sock";

/// Default socket endpoint URI for Windows platforms.
#[cfg(windows)]
pub(super) const DEFAULT_SOCKET_URI: &str = "npipe:////./pipe/docker_engine";

/// The construction strategy a resolution attempt selected.
///
/// Strategies are mutually exclusive and evaluated in a fixed order; a
/// present local socket counts as an implicit override so the common
/// zero-configuration case works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Environment-derived construction: an explicit host override is set,
    /// or the well-known local socket exists.
    Environment,

    /// Fallback to the active named context.
    ActiveContext,
}

/// Read-only snapshot of the ambient state consulted during resolution.
///
/// Recomputed on every resolution attempt and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionSnapshot {
    host: Option<String>,
    socket_present: bool,
    tls: Option<TlsMaterial>,
    api_version: Option<String>,
}

impl ResolutionSnapshot {
    /// Create a snapshot from explicit parts, with no TLS material and no
    /// version pin. Tests use this to synthesise resolution inputs.
    #[must_use]
    pub const fn new(host: Option<String>, socket_present: bool) -> Self {
        Self {
            host,
            socket_present,
            tls: None,
            api_version: None,
        }
    }

    /// Attach TLS material for HTTP-compatible endpoints.
    #[must_use]
    pub fn with_tls(mut self, tls: TlsMaterial) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Pin the client API version negotiation starts from.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Capture a snapshot from the environment and the filesystem.
    #[must_use]
    pub fn capture<E: mockable::Env>(env: &E) -> Self {
        Self::capture_with_probe(env, |path| path.as_std_path().exists())
    }

    /// Capture a snapshot using an injected socket-existence probe.
    ///
    /// Empty environment values are treated as unset.
    #[must_use]
    pub fn capture_with_probe<E, P>(env: &E, socket_probe: P) -> Self
    where
        E: mockable::Env,
        P: FnOnce(&Utf8Path) -> bool,
    {
        let host = env.string(HOST_ENV_VAR).filter(|value| !value.is_empty());
        let socket_present = socket_probe(Utf8Path::new(DEFAULT_SOCKET_PATH));
        let tls = env
            .string(CERT_PATH_ENV_VAR)
            .filter(|value| !value.is_empty())
            .map(|dir| TlsMaterial::from_cert_dir(Utf8Path::new(&dir)));
        let api_version = env
            .string(API_VERSION_ENV_VAR)
            .filter(|value| !value.is_empty());

        Self {
            host,
            socket_present,
            tls,
            api_version,
        }
    }

    /// The explicit host override, when one is set.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Whether the well-known local socket existed at capture time.
    #[must_use]
    pub const fn socket_present(&self) -> bool {
        self.socket_present
    }

    /// Environment-derived TLS material, when configured.
    #[must_use]
    pub const fn tls(&self) -> Option<&TlsMaterial> {
        self.tls.as_ref()
    }

    /// The raw API-version pin, when one is set.
    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    /// Select the construction strategy for this snapshot.
    ///
    /// The explicit override and the present local socket are deliberately
    /// one combined branch; the named-context fallback is only reached when
    /// both are absent.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        if self.host.is_some() || self.socket_present {
            Strategy::Environment
        } else {
            Strategy::ActiveContext
        }
    }
}
