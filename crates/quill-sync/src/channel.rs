//! Inbound message pump.

use quill_core::message::RawMessage;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::dispatcher::Dispatcher;

/// Dispatch messages in arrival order until the sender side closes.
///
/// Each dispatch runs to completion before the next message is received.
/// Returns the number of messages handled.
pub async fn run_channel(dispatcher: &Dispatcher, mut rx: mpsc::Receiver<RawMessage>) -> usize {
    let mut handled = 0;
    while let Some(message) = rx.recv().await {
        dispatcher.dispatch(message).await;
        handled += 1;
    }
    debug!(handled, "channel closed");
    handled
}

/// Decode one NDJSON line. Blank lines yield `None`.
pub fn decode_line(line: &str) -> Result<Option<RawMessage>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Feed NDJSON lines from `reader` into `tx`. Lines that are not UTF-8 or
/// not a valid frame are logged and skipped. Resolves to the number of
/// messages forwarded.
pub fn spawn_line_reader<R>(reader: R, tx: mpsc::Sender<RawMessage>) -> JoinHandle<std::io::Result<usize>>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut segments = reader.split(b'\n');
        let mut forwarded = 0;
        let mut line_no = 0usize;
        while let Some(bytes) = segments.next_segment().await? {
            line_no += 1;
            let line = match String::from_utf8(bytes) {
                Ok(line) => line,
                Err(e) => {
                    warn!(line = line_no, error = %e, "skipping non-utf8 line");
                    continue;
                }
            };
            match decode_line(&line) {
                Ok(Some(message)) => {
                    if tx.send(message).await.is_err() {
                        debug!("channel receiver dropped");
                        break;
                    }
                    forwarded += 1;
                }
                Ok(None) => {}
                Err(e) => warn!(line = line_no, error = %e, "skipping malformed line"),
            }
        }
        Ok(forwarded)
    })
}
