use thiserror::Error;
use tracing::info;

use crate::command::ColorCommand;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publish queue is full")]
    QueueFull,

    #[error("publisher has shut down")]
    Closed,

    #[error("bus transport error: {0}")]
    Transport(String),
}

/// Sink for LED color commands. Implementations must not block; delivery is
/// best effort and no acknowledgment is returned.
pub trait ColorPublisher: Send + Sync {
    fn publish(&self, cmd: ColorCommand) -> Result<(), PublishError>;
}

/// Publisher used when no bus is configured. Commands are only logged.
#[derive(Debug, Default)]
pub struct LogPublisher;

impl ColorPublisher for LogPublisher {
    fn publish(&self, cmd: ColorCommand) -> Result<(), PublishError> {
        info!(r = cmd.r, g = cmd.g, b = cmd.b, "LED command (no bus configured)");
        Ok(())
    }
}
