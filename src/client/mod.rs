//! The capability surface over a container-engine daemon.
//!
//! [`EngineClient`] is the fixed set of operations the rest of a tool may
//! perform against a daemon: connection teardown, image pull and list,
//! container lifecycle, network lifecycle, and two error-classification
//! predicates. Consumers depend on this contract and the engine-neutral
//! request and result types re-exported here; the single concrete backend
//! is [`DockerEngine`], the only code in the crate that speaks `bollard`.
//!
//! Operations take owned payloads and return boxed futures so the trait
//! stays object-safe and test substitutes need no daemon dependency. No
//! operation retries internally; cancellation follows future semantics, so
//! dropping a returned future or stream abandons the request.

use std::future::Future;
use std::pin::Pin;

use futures_util::Stream;

use crate::error::EngineError;

mod docker;
mod types;

pub use docker::DockerEngine;
pub(crate) use docker::classify_connection_error;
pub use types::{
    ContainerDetails, ContainerListOptions, ContainerRemoveOptions, ContainerSpec,
    ContainerStartOptions, ContainerStopOptions, ContainerSummary, HostSpec, ImageListOptions,
    ImagePullOptions, ImageSummary, IpamSpec, NetworkAttachment, NetworkCreateOptions,
    NetworkDetails, NetworkListOptions, NetworkSummary, PlatformSpec, PortMapping, PortProtocol,
    PullProgress,
};

/// Boxed future type returned by [`EngineClient`] operations.
pub type EngineFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, EngineError>> + Send + 'a>>;

/// Boxed progress stream returned by [`EngineClient::pull_image`].
///
/// The stream is finite and not restartable. Dropping it before the end
/// cancels the transfer and releases any partially read buffer.
pub type PullProgressStream<'a> =
    Pin<Box<dyn Stream<Item = Result<PullProgress, EngineError>> + Send + 'a>>;

/// Operations any daemon backend must provide.
///
/// Exactly one concrete adapter exists per supported backend
/// ([`DockerEngine`] for Docker-compatible daemons); everything above this
/// trait is backend-agnostic, so tests can substitute an in-memory
/// implementation.
pub trait EngineClient {
    /// Release the connection.
    ///
    /// Safe to call once. Operations on the handle after `close` are
    /// undefined and must not be attempted; the underlying transport is
    /// also torn down when the handle is dropped.
    fn close(&self) -> EngineFuture<'_, ()>;

    /// Pull `reference` from its registry, reporting progress as a stream.
    ///
    /// The caller must drain or drop the stream. In-band daemon errors are
    /// surfaced as `Err` items.
    fn pull_image(&self, reference: String, options: ImagePullOptions) -> PullProgressStream<'_>;

    /// List locally cached images matching `options`. Snapshot, not live.
    fn list_images(&self, options: ImageListOptions) -> EngineFuture<'_, Vec<ImageSummary>>;

    /// Create a container and return its identifier.
    ///
    /// Fails with a conflict classification when `name` is already in use,
    /// and a not-found classification when the image is absent.
    fn create_container(
        &self,
        config: ContainerSpec,
        host_config: HostSpec,
        network_config: NetworkAttachment,
        platform: Option<PlatformSpec>,
        name: String,
    ) -> EngineFuture<'_, String>;

    /// Start the container with identifier `id`.
    fn start_container(&self, id: String, options: ContainerStartOptions) -> EngineFuture<'_, ()>;

    /// Stop the container with identifier `id`.
    ///
    /// Idempotent on an already-stopped container.
    fn stop_container(&self, id: String, options: ContainerStopOptions) -> EngineFuture<'_, ()>;

    /// List containers matching `options`. Snapshot, not live.
    fn list_containers(
        &self,
        options: ContainerListOptions,
    ) -> EngineFuture<'_, Vec<ContainerSummary>>;

    /// Inspect the container with identifier `id`.
    fn inspect_container(&self, id: String) -> EngineFuture<'_, ContainerDetails>;

    /// Remove the container with identifier `id`.
    fn remove_container(
        &self,
        id: String,
        options: ContainerRemoveOptions,
    ) -> EngineFuture<'_, ()>;

    /// Create a network and return its identifier.
    fn create_network(
        &self,
        name: String,
        options: NetworkCreateOptions,
    ) -> EngineFuture<'_, String>;

    /// Remove the network with identifier (or name) `id`.
    fn remove_network(&self, id: String) -> EngineFuture<'_, ()>;

    /// List networks matching `options`. Snapshot, not live.
    fn list_networks(&self, options: NetworkListOptions)
    -> EngineFuture<'_, Vec<NetworkSummary>>;

    /// Inspect the network with identifier (or name) `id`.
    fn inspect_network(&self, id: String) -> EngineFuture<'_, NetworkDetails>;

    /// Whether `error` reports a referenced resource as absent.
    ///
    /// Callers use this to branch on recoverable-vs-fatal failures without
    /// matching error variants themselves.
    fn classify_not_found(&self, error: &EngineError) -> bool;

    /// Whether `error` reports the transport as unreachable or failed.
    fn classify_connection_failed(&self, error: &EngineError) -> bool;
}
