use color_eyre::eyre::{eyre, Result};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::client::Client;
use crate::events::AppEvent;
use crate::tail::TailEvent;

// Upper bound on buffered bytes between frame boundaries. A server that
// never terminates a frame would otherwise grow the buffer unbounded.
const MAX_BUFFER_BYTES: usize = 1024 * 1024;

/// Handle to the background task consuming one build's tail stream.
///
/// The `id` is a subscription identifier handed out by the app state; events
/// from a closed or superseded stream carry a stale id and get discarded on
/// arrival.
pub struct TailStream {
    id: u64,
    handle: Option<JoinHandle<()>>,
}

impl TailStream {
    pub fn open(
        id: u64,
        client: Client,
        build_id: i32,
        backlog: usize,
        tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            if let Err(e) = run(&client, build_id, backlog, id, &tx).await {
                tracing::debug!(subscription = id, build_id, "tail stream ended: {e}");
            }
            let _ = tx.send(AppEvent::TailClosed { subscription: id });
        });
        Self {
            id,
            handle: Some(handle),
        }
    }

    /// Stream handle with no task behind it, for state-machine tests.
    #[doc(hidden)]
    pub fn detached(id: u64) -> Self {
        Self { id, handle: None }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TailStream {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run(
    client: &Client,
    build_id: i32,
    backlog: usize,
    subscription: u64,
    tx: &mpsc::UnboundedSender<AppEvent>,
) -> Result<()> {
    let response = client.open_tail(build_id, backlog).await?;
    let mut body = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| eyre!("tail stream read failed: {e}"))?;
        buffer.extend_from_slice(&chunk);
        if buffer.len() > MAX_BUFFER_BYTES {
            return Err(eyre!("tail stream frame exceeded {MAX_BUFFER_BYTES} bytes"));
        }

        while let Some(frame) = next_frame(&mut buffer) {
            let Some(payload) = data_payload(&frame) else {
                // Comment or heartbeat frame
                continue;
            };
            match serde_json::from_str::<TailEvent>(&payload) {
                Ok(event) => {
                    if tx
                        .send(AppEvent::Tail {
                            subscription,
                            event,
                        })
                        .is_err()
                    {
                        // Receiver gone, the app is shutting down.
                        return Ok(());
                    }
                }
                Err(e) => {
                    tracing::warn!(subscription, "dropping malformed tail event: {e}");
                }
            }
        }
    }

    Err(eyre!("tail stream closed by server"))
}

/// Position and length of the earliest frame terminator in `buf`, either a
/// blank line (`\n\n`) or its CRLF form.
fn frame_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|p| (p, 2));
    let crlf = buf
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|p| (p, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Split one complete frame off the front of the buffer, if present.
fn next_frame(buffer: &mut Vec<u8>) -> Option<String> {
    let (pos, sep_len) = frame_boundary(buffer)?;
    let frame = String::from_utf8_lossy(&buffer[..pos]).into_owned();
    buffer.drain(..pos + sep_len);
    Some(frame)
}

/// Concatenate the `data:` lines of an SSE frame. Returns `None` for frames
/// carrying no data lines (comments, bare `event:` fields).
fn data_payload(frame: &str) -> Option<String> {
    let mut lines = Vec::new();
    for line in frame.lines() {
        let Some(rest) = line.strip_prefix("data:") else {
            continue;
        };
        let rest = rest.strip_prefix(' ').unwrap_or(rest);
        lines.push(rest.strip_suffix('\r').unwrap_or(rest));
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
