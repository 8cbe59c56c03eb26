use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("camera stream ended before a complete frame arrived")]
    NoFrame,

    #[error("timed out waiting for a camera frame")]
    FrameTimeout,

    #[error("vision API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("vision API response had no content")]
    EmptyResponse,
}
