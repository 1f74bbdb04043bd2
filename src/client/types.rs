//! Engine-neutral request and result types for the capability surface.
//!
//! These types are the vocabulary of [`EngineClient`](super::EngineClient).
//! They deliberately carry no `bollard` types so that consumers of the
//! capability surface never depend on the wire SDK; the Docker adapter
//! translates them into wire payloads.

use std::collections::HashMap;

/// Options for pulling an image from a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImagePullOptions {
    /// Target platform in `os/arch[/variant]` form, when pulling for a
    /// platform other than the daemon default.
    pub platform: Option<String>,
}

/// Options for listing locally cached images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageListOptions {
    /// Include intermediate images in the listing.
    pub all: bool,

    /// Restrict the listing to images matching this reference
    /// (for example `redpanda:latest`).
    pub reference: Option<String>,
}

/// One progress report from an image pull stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullProgress {
    /// The layer or image identifier this report refers to, when present.
    pub id: Option<String>,

    /// Human-readable status line (for example `Downloading`).
    pub status: Option<String>,

    /// Pre-rendered progress bar text, when the daemon provides one.
    pub progress: Option<String>,

    /// Bytes transferred so far for the current layer.
    pub current: Option<i64>,

    /// Total bytes expected for the current layer.
    pub total: Option<i64>,
}

/// Snapshot description of a locally cached image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSummary {
    /// The image identifier (content digest).
    pub id: String,

    /// Repository tags pointing at this image.
    pub repo_tags: Vec<String>,

    /// Image size in bytes.
    pub size: i64,

    /// Creation time as a Unix timestamp.
    pub created: i64,
}

/// Process-level configuration for a container create request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSpec {
    /// The image to create the container from. Must be non-empty.
    pub image: String,

    /// Hostname assigned inside the container.
    pub hostname: Option<String>,

    /// Command to run, overriding the image default.
    pub cmd: Option<Vec<String>>,

    /// Environment entries in `KEY=value` form.
    pub env: Option<Vec<String>>,

    /// Labels applied to the container.
    pub labels: Option<HashMap<String, String>>,
}

impl ContainerSpec {
    /// Create a spec for the given image with all other fields unset.
    #[must_use]
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Self::default()
        }
    }
}

/// Transport protocol of a published container port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PortProtocol {
    /// TCP (the daemon default).
    #[default]
    Tcp,

    /// UDP.
    Udp,
}

impl PortProtocol {
    /// The wire suffix used in port map keys (`9092/tcp`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

/// A single container-port-to-host-port publication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortMapping {
    /// The port inside the container.
    pub container_port: u16,

    /// The transport protocol.
    pub protocol: PortProtocol,

    /// Host interface address to bind, or all interfaces when unset.
    pub host_ip: Option<String>,

    /// Host port to bind, or an ephemeral port when unset.
    pub host_port: Option<u16>,
}

/// Host-side configuration for a container create request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSpec {
    /// Network mode (a network name, `bridge`, `host`, ...).
    pub network_mode: Option<String>,

    /// Bind mounts in `host:container[:mode]` form.
    pub binds: Vec<String>,

    /// Container ports published to the host.
    pub port_bindings: Vec<PortMapping>,

    /// Remove the container automatically when it exits.
    pub auto_remove: bool,
}

/// Network endpoint configuration for a container create request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkAttachment {
    /// The network to attach to at create time, when any.
    pub network: Option<String>,

    /// DNS aliases for the container on that network.
    pub aliases: Vec<String>,

    /// Static IPv4 address on that network.
    pub ipv4_address: Option<String>,
}

/// Target platform for a container create request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformSpec {
    /// Operating system (for example `linux`).
    pub os: String,

    /// CPU architecture (for example `amd64`).
    pub architecture: String,

    /// Architecture variant (for example `v8`).
    pub variant: Option<String>,
}

impl PlatformSpec {
    /// Render the platform as the daemon's `os/arch[/variant]` query value.
    #[must_use]
    pub fn as_query_value(&self) -> String {
        self.variant.as_ref().map_or_else(
            || format!("{}/{}", self.os, self.architecture),
            |variant| format!("{}/{}/{variant}", self.os, self.architecture),
        )
    }
}

/// Options for starting a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStartOptions {
    /// Override of the key sequence for detaching from the container.
    pub detach_keys: Option<String>,
}

/// Options for stopping a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStopOptions {
    /// Seconds to wait before killing the container, or the daemon default
    /// when unset.
    pub timeout_secs: Option<i32>,
}

/// Options for listing containers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerListOptions {
    /// Include stopped containers in the listing.
    pub all: bool,

    /// Restrict the listing to containers whose name matches this filter.
    pub name: Option<String>,

    /// Restrict the listing to containers carrying this label
    /// (`key` or `key=value`).
    pub label: Option<String>,
}

/// Options for removing a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerRemoveOptions {
    /// Kill and remove a running container instead of failing.
    pub force: bool,

    /// Also remove anonymous volumes owned by the container.
    pub remove_volumes: bool,
}

/// Snapshot description of a container from a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSummary {
    /// The container identifier.
    pub id: String,

    /// Names bound to the container (leading slash stripped by the daemon
    /// is preserved as reported).
    pub names: Vec<String>,

    /// The image the container was created from.
    pub image: String,

    /// The container state as reported by the daemon (`running`, ...).
    pub state: String,

    /// Labels attached to the container.
    pub labels: HashMap<String, String>,
}

/// Detailed description of a single container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerDetails {
    /// The container identifier.
    pub id: String,

    /// The container name.
    pub name: String,

    /// The image the container was created from.
    pub image: String,

    /// Whether the container is currently running.
    pub running: bool,

    /// Exit code of the last run, when the container has stopped.
    pub exit_code: Option<i64>,

    /// Names of the networks the container is attached to.
    pub networks: Vec<String>,
}

/// IP address management settings for a network create request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpamSpec {
    /// Subnet in CIDR form (for example `172.24.1.0/24`).
    pub subnet: Option<String>,

    /// Gateway address for the subnet.
    pub gateway: Option<String>,
}

/// Options for creating a network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkCreateOptions {
    /// Network driver, or the daemon default when unset.
    pub driver: Option<String>,

    /// Allow manual attachment of containers to this network.
    pub attachable: bool,

    /// Labels applied to the network.
    pub labels: HashMap<String, String>,

    /// Address management settings.
    pub ipam: Option<IpamSpec>,
}

/// Options for listing networks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkListOptions {
    /// Restrict the listing to networks whose name matches this filter.
    pub name: Option<String>,

    /// Restrict the listing to networks carrying this label
    /// (`key` or `key=value`).
    pub label: Option<String>,
}

/// Snapshot description of a network from a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkSummary {
    /// The network identifier.
    pub id: String,

    /// The network name.
    pub name: String,

    /// The network driver.
    pub driver: String,
}

/// Detailed description of a single network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkDetails {
    /// The network identifier.
    pub id: String,

    /// The network name.
    pub name: String,

    /// The network driver.
    pub driver: String,

    /// Identifiers of containers attached to the network.
    pub attached_containers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::without_variant("linux", "amd64", None, "linux/amd64")]
    #[case::with_variant("linux", "arm64", Some("v8"), "linux/arm64/v8")]
    fn platform_spec_renders_query_value(
        #[case] os: &str,
        #[case] architecture: &str,
        #[case] variant: Option<&str>,
        #[case] expected: &str,
    ) {
        let platform = PlatformSpec {
            os: String::from(os),
            architecture: String::from(architecture),
            variant: variant.map(String::from),
        };
        assert_eq!(platform.as_query_value(), expected);
    }

    #[rstest]
    fn container_spec_new_sets_only_the_image() {
        let spec = ContainerSpec::new("redpanda:latest");
        assert_eq!(spec.image, "redpanda:latest");
        assert!(spec.hostname.is_none());
        assert!(spec.cmd.is_none());
        assert!(spec.env.is_none());
        assert!(spec.labels.is_none());
    }

    #[rstest]
    #[case(PortProtocol::Tcp, "tcp")]
    #[case(PortProtocol::Udp, "udp")]
    fn port_protocol_renders_wire_suffix(#[case] protocol: PortProtocol, #[case] expected: &str) {
        assert_eq!(protocol.as_str(), expected);
    }
}
