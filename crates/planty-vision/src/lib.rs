//! Plant health analysis from a camera frame.
//!
//! One JPEG frame is pulled from the greenhouse MJPEG stream and sent, with a
//! prompt naming the plant type, to a vision-capable chat model.

pub mod error;
pub mod mjpeg;
pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

pub use error::VisionError;
pub use mjpeg::{FrameScanner, grab_frame};
pub use openai::{OpenAiConfig, OpenAiVision};

pub const FRAME_TIMEOUT: Duration = Duration::from_secs(20);

/// Produces a free-text health diagnosis for a plant of the given type.
#[async_trait]
pub trait PlantAnalyzer: Send + Sync {
    async fn diagnose(&self, plant_type: &str) -> Result<String, VisionError>;
}

pub fn diagnosis_prompt(plant_type: &str) -> String {
    format!(
        "Diagnose the health of this plant ({plant_type}). \
         Consider pests and disease, over-watering, changes in leaf colour, \
         and overall growth, and explain what you see."
    )
}

/// Camera stream + vision model.
pub struct CameraAnalyzer {
    client: reqwest::Client,
    camera_url: String,
    vision: OpenAiVision,
}

impl CameraAnalyzer {
    pub fn new(client: reqwest::Client, camera_url: impl Into<String>, vision: OpenAiVision) -> Self {
        Self {
            client,
            camera_url: camera_url.into(),
            vision,
        }
    }
}

#[async_trait]
impl PlantAnalyzer for CameraAnalyzer {
    async fn diagnose(&self, plant_type: &str) -> Result<String, VisionError> {
        let frame = grab_frame(&self.client, &self.camera_url, FRAME_TIMEOUT).await?;
        info!("Captured {} byte frame from {}", frame.len(), self.camera_url);
        self.vision.analyze(&frame, &diagnosis_prompt(plant_type)).await
    }
}
