//! VMS instances gateway.
//!
//! HTTP front for a fleet of video management servers. Requests are matched
//! by the path-routing engine in [`routing`] and handed to the controllers in
//! [`api`], which talk to each server through a [`vms::VmsClient`].

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Domain
pub mod api;
pub mod instances;
pub mod vms;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Dispatcher, RouteTable};
