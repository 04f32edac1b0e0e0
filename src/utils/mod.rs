//! The `utils` module provides shared definitions used across the `orion` service:
//! the messaging error type and logging setup.

pub mod error;
pub mod logging;

pub use error::MessagingError;

#[cfg(test)]
mod tests;
