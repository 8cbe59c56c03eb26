//! Robotics bus side of LED control.
//!
//! Plant LED changes are forwarded as normalized RGB commands to a ROS graph
//! through a rosbridge WebSocket. Publishing never blocks the caller: the
//! command is queued and a background task owns the socket.

pub mod command;
pub mod publisher;
pub mod rosbridge;

pub use command::ColorCommand;
pub use publisher::{ColorPublisher, LogPublisher, PublishError};
pub use rosbridge::{RosbridgeConfig, RosbridgePublisher};
