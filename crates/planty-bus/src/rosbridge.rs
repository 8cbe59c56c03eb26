use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{ColorCommand, advertise_op, publish_op};
use crate::publisher::{ColorPublisher, PublishError};

pub const DEFAULT_TOPIC: &str = "/gpio_controller/commands";

#[derive(Debug, Clone)]
pub struct RosbridgeConfig {
    /// e.g. `ws://wireguard:9090`
    pub url: String,
    pub topic: String,
    pub queue_depth: usize,
    pub reconnect_delay: Duration,
}

impl RosbridgeConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            topic: DEFAULT_TOPIC.to_string(),
            queue_depth: 64,
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

/// Publishes color commands to a rosbridge server.
///
/// `publish` only enqueues. A background task owns the WebSocket, advertises
/// the topic on every (re)connect and forwards queued commands. Commands
/// queued while the socket is down are dropped, since a stale LED color is
/// worse than none.
pub struct RosbridgePublisher {
    tx: mpsc::Sender<ColorCommand>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RosbridgePublisher {
    /// Start the background connection task. Must be called inside a Tokio runtime.
    pub fn spawn(config: RosbridgeConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_depth.max(1));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(config, rx, cancel.clone()));
        Self {
            tx,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    /// Stop the background task and close the socket.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let task = self.task.lock().ok().and_then(|mut t| t.take());
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("rosbridge task join error: {}", e);
            }
        }
        info!("rosbridge publisher stopped");
    }
}

impl ColorPublisher for RosbridgePublisher {
    fn publish(&self, cmd: ColorCommand) -> Result<(), PublishError> {
        self.tx.try_send(cmd).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PublishError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => PublishError::Closed,
        })
    }
}

impl Drop for RosbridgePublisher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(config: RosbridgeConfig, mut rx: mpsc::Receiver<ColorCommand>, cancel: CancellationToken) {
    loop {
        let connected = tokio::select! {
            _ = cancel.cancelled() => return,
            res = tokio_tungstenite::connect_async(config.url.as_str()) => res,
        };

        match connected {
            Ok((ws, _)) => {
                info!("Connected to rosbridge at {}", config.url);
                drop_stale(&mut rx);
                match pump(ws, &config.topic, &mut rx, &cancel).await {
                    Ok(()) => return,
                    Err(e) => warn!("rosbridge connection lost: {}", e),
                }
            }
            Err(e) => warn!("rosbridge connect to {} failed: {}", config.url, e),
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }
}

/// Discard everything queued while the socket was down.
fn drop_stale(rx: &mut mpsc::Receiver<ColorCommand>) {
    let mut dropped = 0usize;
    while rx.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        warn!("Dropped {} LED command(s) queued while rosbridge was unreachable", dropped);
    }
}

/// Drive one connection. Returns `Ok` on orderly shutdown and `Err` when the
/// socket fails and a reconnect is needed.
async fn pump<S>(
    ws: tokio_tungstenite::WebSocketStream<S>,
    topic: &str,
    rx: &mut mpsc::Receiver<ColorCommand>,
    cancel: &CancellationToken,
) -> Result<(), PublishError>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut sink, mut stream) = ws.split();

    send_json(&mut sink, &advertise_op(topic)).await?;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return Ok(());
            }
            cmd = rx.recv() => {
                let Some(cmd) = cmd else {
                    let _ = sink.send(Message::Close(None)).await;
                    return Ok(());
                };
                send_json(&mut sink, &publish_op(topic, &cmd, Utc::now())).await?;
                debug!(r = cmd.r, g = cmd.g, b = cmd.b, "Published LED command");
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    return Err(PublishError::Transport("closed by server".into()));
                }
                Some(Ok(Message::Text(text))) => debug!("rosbridge says: {}", text.as_str()),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(PublishError::Transport(e.to_string())),
            },
        }
    }
}

async fn send_json<W>(sink: &mut W, value: &serde_json::Value) -> Result<(), PublishError>
where
    W: futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    sink.send(Message::Text(value.to_string().into()))
        .await
        .map_err(|e| PublishError::Transport(e.to_string()))
}
