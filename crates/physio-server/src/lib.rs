//! Clinic site HTTP server.
//!
//! Wires together the core library, storage backend, and outbound gateways
//! into an Axum server. Serves the JSON API at `/v1/*` (popup sessions,
//! contact and consultation forms, admin sign-in) and a landing page at `/`.

pub mod config;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod sweeper;
