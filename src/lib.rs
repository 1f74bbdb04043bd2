//! Connection resolution and a capability-scoped client surface for
//! Docker-compatible container engines.
//!
//! `capstan` answers one question for a local tool: given the ambient
//! environment, which daemon endpoint and credentials should be used, and
//! what may the rest of the tool do with the resulting connection? The
//! resolver evaluates mutually exclusive strategies in a fixed order (an
//! explicit `DOCKER_HOST` override or a present local socket first, the
//! active named context second), negotiates the daemon API version, and
//! hands back a client that is used solely through the [`client::EngineClient`]
//! capability trait for the rest of the program's life.
//!
//! # Modules
//!
//! - [`client`]: the capability surface (trait, engine-neutral types, and
//!   the Docker backend adapter)
//! - [`context`]: named contexts and their read-only store
//! - [`error`]: semantic error types
//! - [`resolver`]: snapshot capture, strategy selection, and version
//!   negotiation

pub mod client;
pub mod context;
pub mod error;
pub mod resolver;
