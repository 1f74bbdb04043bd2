//! Named engine contexts and their read-only store.
//!
//! A named context is a stored bundle of endpoint plus credential material,
//! analogous to a connection profile. The store itself is owned by an
//! external context-management collaborator; this module only needs a
//! lookup-by-active-name operation, expressed as the [`ContextStore`] trait
//! with a file-backed implementation reading the collaborator's JSON layout
//! through capability-oriented directory handles.

use std::io;
use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::Deserialize;

use crate::error::ContextError;

/// Store-level file naming the active context.
const STORE_CONFIG_FILE: &str = "config.json";

/// Directory holding one subdirectory per named context.
const CONTEXTS_DIR: &str = "contexts";

/// Per-context record file.
const CONTEXT_META_FILE: &str = "meta.json";

/// TLS file material used to authenticate a daemon connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsMaterial {
    ca: Utf8PathBuf,
    cert: Utf8PathBuf,
    key: Utf8PathBuf,
}

impl TlsMaterial {
    /// Create material from explicit CA, client certificate, and key paths.
    #[must_use]
    pub fn new(
        ca: impl Into<Utf8PathBuf>,
        cert: impl Into<Utf8PathBuf>,
        key: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            ca: ca.into(),
            cert: cert.into(),
            key: key.into(),
        }
    }

    /// Create material from a certificate directory using the conventional
    /// `ca.pem`, `cert.pem`, and `key.pem` file names.
    #[must_use]
    pub fn from_cert_dir(dir: &Utf8Path) -> Self {
        Self {
            ca: dir.join("ca.pem"),
            cert: dir.join("cert.pem"),
            key: dir.join("key.pem"),
        }
    }

    /// Path of the certificate-authority bundle.
    #[must_use]
    pub fn ca(&self) -> &Utf8Path {
        &self.ca
    }

    /// Path of the client certificate.
    #[must_use]
    pub fn cert(&self) -> &Utf8Path {
        &self.cert
    }

    /// Path of the client private key.
    #[must_use]
    pub fn key(&self) -> &Utf8Path {
        &self.key
    }
}

/// A stored endpoint + credential bundle, selected by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedContext {
    name: String,
    endpoint: String,
    tls: Option<TlsMaterial>,
}

impl NamedContext {
    /// Create a context for `endpoint` with no TLS material.
    #[must_use]
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            tls: None,
        }
    }

    /// Attach TLS material to the context.
    #[must_use]
    pub fn with_tls(mut self, tls: TlsMaterial) -> Self {
        self.tls = Some(tls);
        self
    }

    /// The context name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The daemon endpoint the context points at.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// TLS material for the endpoint, when the context carries any.
    #[must_use]
    pub const fn tls(&self) -> Option<&TlsMaterial> {
        self.tls.as_ref()
    }
}

/// Read-only lookup into the context store.
///
/// The resolver consumes this seam; tests substitute it without touching
/// the filesystem.
pub trait ContextStore {
    /// Resolve the currently active context.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::NoActiveContext` when no context is active,
    /// and the lookup errors of [`ContextStore::lookup`] for the active
    /// name.
    fn active(&self) -> Result<NamedContext, ContextError>;

    /// Resolve the context stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::NotFound` when the name is absent,
    /// `ContextError::Unreadable` when its record cannot be read, and
    /// `ContextError::Invalid` when the record does not describe a usable
    /// endpoint.
    fn lookup(&self, name: &str) -> Result<NamedContext, ContextError>;
}

/// File-backed context store.
///
/// Layout, owned by the external context-management collaborator:
/// `config.json` carries `current_context`, and each context lives at
/// `contexts/<name>/meta.json`.
#[derive(Debug, Clone)]
pub struct FileContextStore {
    root: Utf8PathBuf,
}

impl FileContextStore {
    /// Create a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store's root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn open_root(&self) -> io::Result<Dir> {
        Dir::open_ambient_dir(&self.root, ambient_authority())
    }
}

#[derive(Debug, Deserialize)]
struct StoreConfigFile {
    current_context: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContextMetaFile {
    name: Option<String>,
    endpoint: EndpointMetaFile,
    tls: Option<TlsMetaFile>,
}

#[derive(Debug, Deserialize)]
struct EndpointMetaFile {
    host: String,
}

#[derive(Debug, Deserialize)]
struct TlsMetaFile {
    ca: Utf8PathBuf,
    cert: Utf8PathBuf,
    key: Utf8PathBuf,
}

fn store_unreadable(path: impl Into<PathBuf>, message: impl ToString) -> ContextError {
    ContextError::StoreUnreadable {
        path: path.into(),
        message: message.to_string(),
    }
}

impl ContextStore for FileContextStore {
    fn active(&self) -> Result<NamedContext, ContextError> {
        let root = match self.open_root() {
            Ok(root) => root,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(ContextError::NoActiveContext);
            }
            Err(error) => return Err(store_unreadable(self.root.as_std_path(), error)),
        };

        let config_path = self.root.join(STORE_CONFIG_FILE);
        let raw = match root.read_to_string(STORE_CONFIG_FILE) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(ContextError::NoActiveContext);
            }
            Err(error) => return Err(store_unreadable(config_path.as_std_path(), error)),
        };

        let config: StoreConfigFile = serde_json::from_str(&raw)
            .map_err(|error| store_unreadable(config_path.as_std_path(), error))?;

        let name = config
            .current_context
            .filter(|value| !value.is_empty())
            .ok_or(ContextError::NoActiveContext)?;

        self.lookup(&name)
    }

    fn lookup(&self, name: &str) -> Result<NamedContext, ContextError> {
        let root = match self.open_root() {
            Ok(root) => root,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(ContextError::NotFound {
                    name: String::from(name),
                });
            }
            Err(error) => return Err(store_unreadable(self.root.as_std_path(), error)),
        };

        let meta_path = format!("{CONTEXTS_DIR}/{name}/{CONTEXT_META_FILE}");
        let raw = match root.read_to_string(&meta_path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(ContextError::NotFound {
                    name: String::from(name),
                });
            }
            Err(error) => {
                return Err(ContextError::Unreadable {
                    name: String::from(name),
                    message: error.to_string(),
                });
            }
        };

        let meta: ContextMetaFile =
            serde_json::from_str(&raw).map_err(|error| ContextError::Invalid {
                name: String::from(name),
                reason: error.to_string(),
            })?;

        if let Some(recorded) = meta.name.as_deref() {
            if recorded != name {
                return Err(ContextError::Invalid {
                    name: String::from(name),
                    reason: format!("record is named '{recorded}'"),
                });
            }
        }

        if meta.endpoint.host.trim().is_empty() {
            return Err(ContextError::Invalid {
                name: String::from(name),
                reason: String::from("endpoint host is empty"),
            });
        }

        let context = NamedContext::new(name, meta.endpoint.host);
        Ok(match meta.tls {
            Some(tls) => context.with_tls(TlsMaterial::new(tls.ca, tls.cert, tls.key)),
            None => context,
        })
    }
}
