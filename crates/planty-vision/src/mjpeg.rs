use std::time::Duration;

use futures_util::StreamExt;
use tracing::debug;

use crate::VisionError;

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Upper bound on buffered bytes while looking for a frame.
const MAX_BUFFER: usize = 8 * 1024 * 1024;

/// Finds complete JPEG images in an MJPEG byte stream, ignoring the
/// multipart boundaries and headers between them.
#[derive(Debug, Default)]
pub struct FrameScanner {
    buf: Vec<u8>,
    /// Offset already searched for EOI while `buf` starts with SOI.
    scanned: usize,
}

impl FrameScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk. Returns the first complete frame, if any, and
    /// keeps whatever follows it for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Option<Vec<u8>> {
        self.buf.extend_from_slice(chunk);

        let Some(start) = find(&self.buf, &SOI, 0) else {
            // Keep a trailing 0xFF in case the marker straddles chunks.
            let keep = usize::from(self.buf.last() == Some(&0xFF));
            self.buf.drain(..self.buf.len() - keep);
            self.scanned = 0;
            return None;
        };

        let from = (start + SOI.len()).max(self.scanned);
        let Some(end) = find(&self.buf, &EOI, from) else {
            if self.buf.len() - start > MAX_BUFFER {
                self.buf.clear();
                self.scanned = 0;
            } else {
                self.buf.drain(..start);
                // The last byte may be the first half of an EOI.
                self.scanned = self.buf.len() - 1;
            }
            return None;
        };

        let frame_end = end + EOI.len();
        let frame = self.buf[start..frame_end].to_vec();
        self.buf.drain(..frame_end);
        self.scanned = 0;
        Some(frame)
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Read `url` as an MJPEG stream until one JPEG frame is complete.
pub async fn grab_frame(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<u8>, VisionError> {
    let read = async {
        let resp = client.get(url).send().await?.error_for_status()?;
        let mut stream = resp.bytes_stream();
        let mut scanner = FrameScanner::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(frame) = scanner.push(&chunk) {
                debug!("Frame found after scanning stream from {}", url);
                return Ok(frame);
            }
        }
        Err::<Vec<u8>, VisionError>(VisionError::NoFrame)
    };

    tokio::time::timeout(timeout, read)
        .await
        .map_err(|_| VisionError::FrameTimeout)?
}
