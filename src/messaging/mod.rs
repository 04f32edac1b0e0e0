//! The `messaging` module publishes JSON events to the STOMP broker.
//!
//! - `connection`: scoped acquisition and release of broker sessions.
//! - `producer`: header composition, retrying publish and the `Dispatcher`.

pub mod connection;
pub mod producer;

pub use connection::{ConnectionManager, ScopedConnection};
pub use producer::{
    BoundDispatcher, DEFAULT_HEADERS, Dispatcher, MAX_LOG_BODY, RetryPolicy, build_headers,
};
