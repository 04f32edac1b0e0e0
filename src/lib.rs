//! # Orion
//!
//! `orion` is a small web service that accepts JSON documents over HTTP and
//! publishes them as events to a STOMP message broker (e.g. ActiveMQ).
//!
//! ## Core Modules
//!
//! - `config`: Loads server and messenger settings from env files, an optional config file and the environment.
//! - `messaging`: Publishes events: header composition, retrying publish and scoped broker connections.
//! - `server`: The HTTP API and its router registry.
//! - `transport`: The STOMP frame codec and TCP sessions to the broker.
//! - `utils`: Shared error type and logging setup.

pub mod config;
pub mod messaging;
pub mod server;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod test_support;
