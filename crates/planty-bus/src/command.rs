use chrono::{DateTime, Utc};
use serde_json::{Value, json};

/// Message type of the GPIO controller command topic.
pub const GPIO_COMMAND_TYPE: &str = "control_msgs/DynamicInterfaceGroupValues";

/// RGB channel values as sent to the LED controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorCommand {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl ColorCommand {
    /// Scale 0-255 channels by `strength / 255` and halve the result.
    /// The controller is calibrated against exactly this curve.
    pub fn scaled(r: u8, g: u8, b: u8, strength: u8) -> Self {
        let ratio = f64::from(strength) / 255.0 / 2.0;
        Self {
            r: f64::from(r) * ratio,
            g: f64::from(g) * ratio,
            b: f64::from(b) * ratio,
        }
    }

    /// `DynamicInterfaceGroupValues` body for the neopixel group.
    pub fn to_ros_message(&self, stamp: DateTime<Utc>) -> Value {
        json!({
            "header": {
                "stamp": {
                    "sec": stamp.timestamp(),
                    "nanosec": stamp.timestamp_subsec_nanos(),
                }
            },
            "interface_groups": ["neopixel"],
            "interface_values": [{
                "interface_names": ["Led R", "Led G", "Led B"],
                "values": [self.r, self.g, self.b],
            }]
        })
    }
}

/// rosbridge `advertise` operation for a topic.
pub fn advertise_op(topic: &str) -> Value {
    json!({
        "op": "advertise",
        "topic": topic,
        "type": GPIO_COMMAND_TYPE,
    })
}

/// rosbridge `publish` operation carrying one color command.
pub fn publish_op(topic: &str, cmd: &ColorCommand, stamp: DateTime<Utc>) -> Value {
    json!({
        "op": "publish",
        "topic": topic,
        "msg": cmd.to_ros_message(stamp),
    })
}
