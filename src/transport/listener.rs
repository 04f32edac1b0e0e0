use tracing::{error, warn};

use crate::transport::frame::Frame;

/// Observer for transport-level events of a broker session.
pub trait ConnectionListener: Send + Sync {
    /// The broker sent an ERROR frame.
    fn on_error(&self, frame: &Frame);

    /// The broker closed the connection without being asked to.
    fn on_disconnected(&self);
}

/// Listener that reports session events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

impl ConnectionListener for LoggingListener {
    fn on_error(&self, frame: &Frame) {
        if frame.body.is_empty() {
            error!("STOMP error: {}", frame);
        } else {
            error!("STOMP error: {}", frame.body);
        }
    }

    fn on_disconnected(&self) {
        warn!("Disconnected from STOMP broker");
    }
}
