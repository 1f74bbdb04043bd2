//! Unit tests for snapshot capture, strategy selection, and connection
//! construction.
//!
//! Environment state is injected through `MockEnv` and an explicit socket
//! probe; the context store is substituted with a `mockall` double. Client
//! construction tests rely on `Bollard`'s HTTP connectors being synchronous
//! and not validating connectivity at construction time.

use bollard::ClientVersion;
use mockable::MockEnv;
use rstest::{fixture, rstest};

use super::*;
use crate::context::NamedContext;
use crate::error::ContextError;

mockall::mock! {
    Contexts {}

    impl ContextStore for Contexts {
        fn active(&self) -> std::result::Result<NamedContext, ContextError>;
        fn lookup(&self, name: &str) -> std::result::Result<NamedContext, ContextError>;
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Fixture providing a `MockEnv` that returns `None` for all environment
/// variable queries.
#[fixture]
fn empty_env() -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string().returning(|_| None);
    env
}

/// Fixture providing a `MockEnv` with `DOCKER_HOST` set to a TCP endpoint.
#[fixture]
fn docker_host_env() -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string().returning(|key| {
        if key == HOST_ENV_VAR {
            Some(String::from("tcp://remotehost:2375"))
        } else {
            None
        }
    });
    env
}

/// Fixture providing a default client version for construction tests.
#[fixture]
fn default_version() -> ClientVersion {
    ClientVersion {
        major_version: bollard::API_DEFAULT_VERSION.major_version,
        minor_version: bollard::API_DEFAULT_VERSION.minor_version,
    }
}

fn staging_context() -> NamedContext {
    NamedContext::new("staging", "tcp://10.42.0.7:2376")
}

// =============================================================================
// Snapshot capture
// =============================================================================

#[rstest]
fn capture_reads_the_host_override(docker_host_env: MockEnv) {
    let snapshot = ResolutionSnapshot::capture_with_probe(&docker_host_env, |_| false);
    assert_eq!(snapshot.host(), Some("tcp://remotehost:2375"));
    assert!(!snapshot.socket_present());
}

#[rstest]
fn capture_treats_an_empty_override_as_unset() {
    let mut env = MockEnv::new();
    env.expect_string().returning(|key| {
        if key == HOST_ENV_VAR {
            Some(String::new())
        } else {
            None
        }
    });
    let snapshot = ResolutionSnapshot::capture_with_probe(&env, |_| false);
    assert!(snapshot.host().is_none());
}

#[rstest]
fn capture_probes_the_well_known_socket_path(empty_env: MockEnv) {
    let snapshot = ResolutionSnapshot::capture_with_probe(&empty_env, |path| {
        assert_eq!(path.as_str(), DEFAULT_SOCKET_PATH);
        true
    });
    assert!(snapshot.socket_present());
}

#[rstest]
fn capture_derives_tls_material_from_the_cert_path() {
    let mut env = MockEnv::new();
    env.expect_string().returning(|key| {
        if key == CERT_PATH_ENV_VAR {
            Some(String::from("/home/rp/.docker"))
        } else {
            None
        }
    });
    let snapshot = ResolutionSnapshot::capture_with_probe(&env, |_| false);
    let tls = snapshot.tls().expect("cert path should derive material");
    assert_eq!(tls.ca(), "/home/rp/.docker/ca.pem");
}

#[rstest]
fn capture_records_the_api_version_pin() {
    let mut env = MockEnv::new();
    env.expect_string().returning(|key| {
        if key == API_VERSION_ENV_VAR {
            Some(String::from("1.44"))
        } else {
            None
        }
    });
    let snapshot = ResolutionSnapshot::capture_with_probe(&env, |_| false);
    assert_eq!(snapshot.api_version(), Some("1.44"));
}

// =============================================================================
// Strategy selection
// =============================================================================

#[rstest]
#[case::override_only(Some("tcp://remotehost:2375"), false, Strategy::Environment)]
#[case::override_and_socket(Some("tcp://remotehost:2375"), true, Strategy::Environment)]
#[case::socket_only(None, true, Strategy::Environment)]
#[case::neither(None, false, Strategy::ActiveContext)]
fn strategy_selection_is_deterministic(
    #[case] host: Option<&str>,
    #[case] socket_present: bool,
    #[case] expected: Strategy,
) {
    let snapshot = ResolutionSnapshot::new(host.map(String::from), socket_present);
    assert_eq!(snapshot.strategy(), expected);
}

// =============================================================================
// API version parsing
// =============================================================================

#[rstest]
#[case("1.44", 1, 44)]
#[case("1.48", 1, 48)]
fn parse_api_version_accepts_major_minor(
    #[case] value: &str,
    #[case] major: usize,
    #[case] minor: usize,
) {
    let version = ConnectionResolver::parse_api_version(value).expect("version should parse");
    assert_eq!(version.major_version, major);
    assert_eq!(version.minor_version, minor);
}

#[rstest]
#[case::no_separator("148")]
#[case::words("latest")]
#[case::trailing_garbage("1.x")]
fn parse_api_version_rejects_malformed_values(#[case] value: &str) {
    let error = ConnectionResolver::parse_api_version(value)
        .expect_err("malformed version should be rejected");
    assert!(matches!(error, EngineError::InvalidApiVersion { .. }));
}

#[rstest]
fn client_version_defaults_when_no_pin_is_set() {
    let snapshot = ResolutionSnapshot::new(None, true);
    let version =
        ConnectionResolver::client_version(&snapshot).expect("default version should resolve");
    assert_eq!(
        version.major_version,
        bollard::API_DEFAULT_VERSION.major_version
    );
}

// =============================================================================
// Endpoint normalization and construction
// =============================================================================

#[rstest]
#[case::unix_path("/var/run/docker.sock", "unix:///var/run/docker.sock")]
#[case::pipe_path("//./pipe/docker_engine", "npipe:////./pipe/docker_engine")]
fn normalize_bare_path_prefixes_a_scheme(#[case] path: &str, #[case] expected: &str) {
    assert_eq!(ConnectionResolver::normalize_bare_path(path), expected);
}

#[rstest]
#[case::tcp_with_hostname("tcp://host:2375")]
#[case::tcp_with_ip("tcp://192.168.1.100:2376")]
#[case::http_endpoint("http://remotehost:2375")]
#[case::https_endpoint("https://remotehost:2376")]
fn connect_http_compatible_endpoints_creates_client(
    default_version: ClientVersion,
    #[case] endpoint: &str,
) {
    // HTTP-compatible endpoints use Bollard's synchronous connectors, which
    // do not validate connectivity at construction time. If Bollard's
    // behaviour changes to validate endpoints eagerly, this test may start
    // failing.
    let result = ConnectionResolver::connect(endpoint, None, &default_version);
    result.unwrap_or_else(|_| panic!("connect {endpoint} should create client"));
}

#[rstest]
#[case::rewritten("tcp://host:2375", "http://", "http://host:2375")]
#[case::rewritten_tls("tcp://host:2376", "https://", "https://host:2376")]
#[case::untouched("http://host:2375", "https://", "http://host:2375")]
fn tcp_scheme_is_rewritten_for_bollard(
    #[case] endpoint: &str,
    #[case] scheme: &str,
    #[case] expected: &str,
) {
    assert_eq!(
        ConnectionResolver::rewrite_tcp_scheme(endpoint, scheme),
        expected
    );
}

// =============================================================================
// Strategy execution through prepare
// =============================================================================

#[rstest]
fn prepare_uses_the_host_override_without_consulting_contexts() {
    // No expectations are set on the mock: any lookup would panic.
    let contexts = MockContexts::new();
    let snapshot = ResolutionSnapshot::new(Some(String::from("tcp://remotehost:2375")), true);

    let prepared =
        ConnectionResolver::prepare(&snapshot, &contexts).expect("override should construct");
    assert_eq!(prepared.endpoint(), "tcp://remotehost:2375");
}

#[cfg(unix)]
#[rstest]
fn prepare_uses_the_default_socket_when_only_the_socket_exists() {
    let contexts = MockContexts::new();
    let snapshot = ResolutionSnapshot::new(None, true);

    let prepared =
        ConnectionResolver::prepare(&snapshot, &contexts).expect("socket should construct");
    assert_eq!(prepared.endpoint(), "unix:///var/run/docker.sock");
}

#[rstest]
fn prepare_falls_back_to_the_active_context() {
    let mut contexts = MockContexts::new();
    contexts
        .expect_active()
        .times(1)
        .returning(|| Ok(staging_context()));
    let snapshot = ResolutionSnapshot::new(None, false);

    let prepared =
        ConnectionResolver::prepare(&snapshot, &contexts).expect("context should construct");
    assert_eq!(prepared.endpoint(), "tcp://10.42.0.7:2376");
}

#[rstest]
fn prepare_surfaces_a_missing_active_context() {
    let mut contexts = MockContexts::new();
    contexts
        .expect_active()
        .returning(|| Err(ContextError::NoActiveContext));
    let snapshot = ResolutionSnapshot::new(None, false);

    let error = ConnectionResolver::prepare(&snapshot, &contexts)
        .expect_err("empty fallback should fail");
    assert!(matches!(
        error,
        CapstanError::Context(ContextError::NoActiveContext)
    ));
}

#[rstest]
fn prepare_rejects_an_unparseable_version_pin() {
    let contexts = MockContexts::new();
    let snapshot = ResolutionSnapshot::new(Some(String::from("tcp://remotehost:2375")), false)
        .with_api_version("latest");

    let error = ConnectionResolver::prepare(&snapshot, &contexts)
        .expect_err("bad version pin should fail");
    assert!(matches!(
        error,
        CapstanError::Engine(EngineError::InvalidApiVersion { .. })
    ));
}
