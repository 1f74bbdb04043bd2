//! Docker-compatible backend for the capability surface.
//!
//! [`DockerEngine`] adapts a negotiated `bollard::Docker` session to the
//! [`EngineClient`] contract. This module is the translation boundary:
//! engine-neutral requests become `Bollard` payloads on the way in, and
//! `Bollard` models become engine-neutral summaries on the way out.

use std::collections::HashMap;

use bollard::Docker;
use bollard::models::{
    ContainerCreateBody, ContainerInspectResponse, ContainerSummary as ContainerSummaryModel,
    CreateImageInfo, EndpointIpamConfig, EndpointSettings, HostConfig,
    ImageSummary as ImageSummaryModel, Ipam, IpamConfig, Network as NetworkModel,
    NetworkCreateRequest, NetworkInspect, NetworkingConfig, PortBinding,
};
use bollard::query_parameters::{
    CreateContainerOptions, CreateContainerOptionsBuilder, CreateImageOptionsBuilder,
    ListContainersOptions, ListContainersOptionsBuilder, ListImagesOptions,
    ListImagesOptionsBuilder, ListNetworksOptions, ListNetworksOptionsBuilder,
    RemoveContainerOptionsBuilder, StartContainerOptionsBuilder, StopContainerOptionsBuilder,
};
use futures_util::StreamExt;

use super::types::{
    ContainerDetails, ContainerListOptions, ContainerRemoveOptions, ContainerSpec,
    ContainerStartOptions, ContainerStopOptions, ContainerSummary, HostSpec, ImageListOptions,
    ImagePullOptions, ImageSummary, IpamSpec, NetworkAttachment, NetworkCreateOptions,
    NetworkDetails, NetworkListOptions, NetworkSummary, PlatformSpec, PortMapping, PullProgress,
};
use super::{EngineClient, EngineFuture, PullProgressStream};
use crate::error::EngineError;

mod error_mapping;

pub(crate) use error_mapping::classify_connection_error;
use error_mapping::map_api_error;

/// The concrete capability adapter for Docker-compatible daemons.
///
/// Constructed by the connection resolver after version negotiation; the
/// handle owns the live session and the endpoint it was resolved against.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    docker: Docker,
    endpoint: String,
}

impl DockerEngine {
    /// Wrap a negotiated `Bollard` session resolved against `endpoint`.
    pub(crate) fn new(docker: Docker, endpoint: impl Into<String>) -> Self {
        Self {
            docker,
            endpoint: endpoint.into(),
        }
    }

    /// The transport endpoint this session was resolved against.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The API version the session is pinned to.
    #[must_use]
    pub fn negotiated_version(&self) -> String {
        self.docker.client_version().to_string()
    }
}

impl EngineClient for DockerEngine {
    fn close(&self) -> EngineFuture<'_, ()> {
        // The transport is multiplexed and owned by the handle; dropping the
        // last clone tears it down. close is the explicit release point.
        Box::pin(async { Ok(()) })
    }

    fn pull_image(&self, reference: String, options: ImagePullOptions) -> PullProgressStream<'_> {
        let mut builder = CreateImageOptionsBuilder::default().from_image(&reference);
        if let Some(platform) = options.platform.as_deref() {
            builder = builder.platform(platform);
        }
        let stream = self.docker.create_image(Some(builder.build()), None, None);
        Box::pin(stream.map(|item| {
            item.map_err(|error| map_api_error(&error))
                .and_then(map_pull_progress)
        }))
    }

    fn list_images(&self, options: ImageListOptions) -> EngineFuture<'_, Vec<ImageSummary>> {
        Box::pin(async move {
            let images = self
                .docker
                .list_images(Some(build_image_list_options(&options)))
                .await
                .map_err(|error| map_api_error(&error))?;
            Ok(images.into_iter().map(map_image_summary).collect())
        })
    }

    fn create_container(
        &self,
        config: ContainerSpec,
        host_config: HostSpec,
        network_config: NetworkAttachment,
        platform: Option<PlatformSpec>,
        name: String,
    ) -> EngineFuture<'_, String> {
        Box::pin(async move {
            validate_image(&config.image)?;
            let options = build_create_container_options(&name, platform.as_ref());
            let body = build_container_create_body(&config, &host_config, &network_config);
            let response = self
                .docker
                .create_container(Some(options), body)
                .await
                .map_err(|error| map_api_error(&error))?;
            Ok(response.id)
        })
    }

    fn start_container(&self, id: String, options: ContainerStartOptions) -> EngineFuture<'_, ()> {
        Box::pin(async move {
            let wire_options = options
                .detach_keys
                .as_deref()
                .map(|keys| StartContainerOptionsBuilder::default().detach_keys(keys).build());
            self.docker
                .start_container(&id, wire_options)
                .await
                .map_err(|error| map_api_error(&error))
        })
    }

    fn stop_container(&self, id: String, options: ContainerStopOptions) -> EngineFuture<'_, ()> {
        Box::pin(async move {
            let wire_options = options
                .timeout_secs
                .map(|secs| StopContainerOptionsBuilder::default().t(secs).build());
            self.docker
                .stop_container(&id, wire_options)
                .await
                .map_err(|error| map_api_error(&error))
        })
    }

    fn list_containers(
        &self,
        options: ContainerListOptions,
    ) -> EngineFuture<'_, Vec<ContainerSummary>> {
        Box::pin(async move {
            let containers = self
                .docker
                .list_containers(Some(build_container_list_options(&options)))
                .await
                .map_err(|error| map_api_error(&error))?;
            Ok(containers.into_iter().map(map_container_summary).collect())
        })
    }

    fn inspect_container(&self, id: String) -> EngineFuture<'_, ContainerDetails> {
        Box::pin(async move {
            let response = self
                .docker
                .inspect_container(&id, None)
                .await
                .map_err(|error| map_api_error(&error))?;
            Ok(map_container_details(response))
        })
    }

    fn remove_container(
        &self,
        id: String,
        options: ContainerRemoveOptions,
    ) -> EngineFuture<'_, ()> {
        Box::pin(async move {
            let wire_options = RemoveContainerOptionsBuilder::default()
                .force(options.force)
                .v(options.remove_volumes)
                .build();
            self.docker
                .remove_container(&id, Some(wire_options))
                .await
                .map_err(|error| map_api_error(&error))
        })
    }

    fn create_network(
        &self,
        name: String,
        options: NetworkCreateOptions,
    ) -> EngineFuture<'_, String> {
        Box::pin(async move {
            let response = self
                .docker
                .create_network(build_network_create_request(&name, &options))
                .await
                .map_err(|error| map_api_error(&error))?;
            Ok(response.id)
        })
    }

    fn remove_network(&self, id: String) -> EngineFuture<'_, ()> {
        Box::pin(async move {
            self.docker
                .remove_network(&id)
                .await
                .map_err(|error| map_api_error(&error))
        })
    }

    fn list_networks(
        &self,
        options: NetworkListOptions,
    ) -> EngineFuture<'_, Vec<NetworkSummary>> {
        Box::pin(async move {
            let networks = self
                .docker
                .list_networks(Some(build_network_list_options(&options)))
                .await
                .map_err(|error| map_api_error(&error))?;
            Ok(networks.into_iter().map(map_network_summary).collect())
        })
    }

    fn inspect_network(&self, id: String) -> EngineFuture<'_, NetworkDetails> {
        Box::pin(async move {
            let network = self
                .docker
                .inspect_network(&id, None)
                .await
                .map_err(|error| map_api_error(&error))?;
            Ok(map_network_details(network))
        })
    }

    fn classify_not_found(&self, error: &EngineError) -> bool {
        error.is_not_found()
    }

    fn classify_connection_failed(&self, error: &EngineError) -> bool {
        error.is_connection_failed()
    }
}

fn validate_image(image: &str) -> Result<(), EngineError> {
    if image.trim().is_empty() {
        return Err(EngineError::InvalidRequest {
            message: String::from("image reference must not be empty"),
        });
    }
    Ok(())
}

fn build_create_container_options(
    name: &str,
    platform: Option<&PlatformSpec>,
) -> CreateContainerOptions {
    let mut builder = CreateContainerOptionsBuilder::new().name(name);
    if let Some(platform) = platform {
        builder = builder.platform(&platform.as_query_value());
    }
    builder.build()
}

fn build_container_create_body(
    config: &ContainerSpec,
    host: &HostSpec,
    network: &NetworkAttachment,
) -> ContainerCreateBody {
    ContainerCreateBody {
        image: Some(config.image.clone()),
        hostname: config.hostname.clone(),
        cmd: config.cmd.clone(),
        env: config.env.clone(),
        labels: config.labels.clone(),
        exposed_ports: build_exposed_ports(&host.port_bindings),
        host_config: Some(build_host_config(host)),
        networking_config: build_networking_config(network),
        ..ContainerCreateBody::default()
    }
}

fn port_key(mapping: &PortMapping) -> String {
    format!("{}/{}", mapping.container_port, mapping.protocol.as_str())
}

fn build_exposed_ports(ports: &[PortMapping]) -> Option<Vec<String>> {
    if ports.is_empty() {
        return None;
    }
    Some(ports.iter().map(port_key).collect())
}

fn build_port_bindings(
    ports: &[PortMapping],
) -> Option<HashMap<String, Option<Vec<PortBinding>>>> {
    if ports.is_empty() {
        return None;
    }
    Some(
        ports
            .iter()
            .map(|mapping| {
                let binding = PortBinding {
                    host_ip: mapping.host_ip.clone(),
                    host_port: mapping.host_port.map(|port| port.to_string()),
                };
                (port_key(mapping), Some(vec![binding]))
            })
            .collect(),
    )
}

fn build_host_config(host: &HostSpec) -> HostConfig {
    HostConfig {
        network_mode: host.network_mode.clone(),
        binds: (!host.binds.is_empty()).then(|| host.binds.clone()),
        port_bindings: build_port_bindings(&host.port_bindings),
        auto_remove: host.auto_remove.then_some(true),
        ..HostConfig::default()
    }
}

fn build_networking_config(attachment: &NetworkAttachment) -> Option<NetworkingConfig> {
    let network = attachment.network.as_ref()?;
    let endpoint = EndpointSettings {
        aliases: (!attachment.aliases.is_empty()).then(|| attachment.aliases.clone()),
        ipam_config: attachment.ipv4_address.as_ref().map(|address| {
            EndpointIpamConfig {
                ipv4_address: Some(address.clone()),
                ..EndpointIpamConfig::default()
            }
        }),
        ..EndpointSettings::default()
    };
    Some(NetworkingConfig {
        endpoints_config: Some(HashMap::from([(network.clone(), endpoint)])),
    })
}

fn build_image_list_options(options: &ImageListOptions) -> ListImagesOptions {
    let mut builder = ListImagesOptionsBuilder::default().all(options.all);
    if let Some(reference) = options.reference.as_ref() {
        let filters = HashMap::from([(String::from("reference"), vec![reference.clone()])]);
        builder = builder.filters(&filters);
    }
    builder.build()
}

fn build_container_list_options(options: &ContainerListOptions) -> ListContainersOptions {
    let mut builder = ListContainersOptionsBuilder::default().all(options.all);
    let filters = build_filters(&[("name", options.name.as_ref()), ("label", options.label.as_ref())]);
    if let Some(filters) = filters {
        builder = builder.filters(&filters);
    }
    builder.build()
}

fn build_network_list_options(options: &NetworkListOptions) -> ListNetworksOptions {
    let mut builder = ListNetworksOptionsBuilder::default();
    let filters = build_filters(&[("name", options.name.as_ref()), ("label", options.label.as_ref())]);
    if let Some(filters) = filters {
        builder = builder.filters(&filters);
    }
    builder.build()
}

fn build_filters(entries: &[(&str, Option<&String>)]) -> Option<HashMap<String, Vec<String>>> {
    let filters: HashMap<String, Vec<String>> = entries
        .iter()
        .filter_map(|(key, value)| {
            value.map(|filter| (String::from(*key), vec![filter.clone()]))
        })
        .collect();
    (!filters.is_empty()).then_some(filters)
}

fn build_network_create_request(
    name: &str,
    options: &NetworkCreateOptions,
) -> NetworkCreateRequest {
    NetworkCreateRequest {
        name: String::from(name),
        driver: options.driver.clone(),
        attachable: options.attachable.then_some(true),
        labels: (!options.labels.is_empty()).then(|| options.labels.clone()),
        ipam: options.ipam.as_ref().map(build_ipam),
        ..NetworkCreateRequest::default()
    }
}

fn build_ipam(spec: &IpamSpec) -> Ipam {
    let config = IpamConfig {
        subnet: spec.subnet.clone(),
        gateway: spec.gateway.clone(),
        ..IpamConfig::default()
    };
    Ipam {
        config: Some(vec![config]),
        ..Ipam::default()
    }
}

fn map_pull_progress(info: CreateImageInfo) -> Result<PullProgress, EngineError> {
    if let Some(message) = info.error_detail.and_then(|detail| detail.message) {
        return Err(EngineError::Protocol { message });
    }
    let (current, total) = info
        .progress_detail
        .map_or((None, None), |detail| (detail.current, detail.total));
    Ok(PullProgress {
        id: info.id,
        status: info.status,
        progress: None,
        current,
        total,
    })
}

fn map_image_summary(image: ImageSummaryModel) -> ImageSummary {
    ImageSummary {
        id: image.id,
        repo_tags: image.repo_tags,
        size: image.size,
        created: image.created,
    }
}

fn map_container_summary(container: ContainerSummaryModel) -> ContainerSummary {
    ContainerSummary {
        id: container.id.unwrap_or_default(),
        names: container.names.unwrap_or_default(),
        image: container.image.unwrap_or_default(),
        state: container
            .state
            .map(|state| state.to_string())
            .unwrap_or_default(),
        labels: container.labels.unwrap_or_default(),
    }
}

fn map_container_details(response: ContainerInspectResponse) -> ContainerDetails {
    let (running, exit_code) = response.state.map_or((false, None), |state| {
        (state.running.unwrap_or(false), state.exit_code)
    });
    let networks = response
        .network_settings
        .and_then(|settings| settings.networks)
        .map(|networks| networks.into_keys().collect())
        .unwrap_or_default();
    ContainerDetails {
        id: response.id.unwrap_or_default(),
        name: response.name.unwrap_or_default(),
        image: response
            .config
            .and_then(|config| config.image)
            .unwrap_or_default(),
        running,
        exit_code,
        networks,
    }
}

fn map_network_summary(network: NetworkModel) -> NetworkSummary {
    NetworkSummary {
        id: network.id.unwrap_or_default(),
        name: network.name.unwrap_or_default(),
        driver: network.driver.unwrap_or_default(),
    }
}

fn map_network_details(network: NetworkInspect) -> NetworkDetails {
    let attached_containers = network
        .containers
        .map(|containers| containers.into_keys().collect())
        .unwrap_or_default();
    NetworkDetails {
        id: network.id.unwrap_or_default(),
        name: network.name.unwrap_or_default(),
        driver: network.driver.unwrap_or_default(),
        attached_containers,
    }
}
