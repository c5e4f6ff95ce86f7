//! TCP transport: the accept loop and per-connection request handling
//!
//! One JSON document per connection in each direction: read the request up
//! to the configured byte bound, dispatch it, write the response, close.
//! No per-connection state survives the close.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("request exceeded {limit} bytes")]
    PayloadTooLarge { limit: usize },
    #[error("read timed out")]
    ReadTimeout,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Accepts connections forever, handing each to its own task. A failure
/// in one connection is logged and never reaches the accept loop.
pub async fn run(listener: TcpListener, state: AppState) -> io::Result<()> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "accept failed");
                continue;
            }
        };

        let state = state.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, &state).await {
                warn!(peer = %peer, error = %err, "connection failed");
            }
        });
    }
}

/// Drives one connection end-to-end: read, dispatch, write, close.
///
/// An oversized or timed-out read closes the connection without a
/// response. A request without an id runs its method and closes without
/// writing anything back.
pub async fn handle_connection(
    mut stream: TcpStream,
    state: &AppState,
) -> Result<(), ConnectionError> {
    let raw = timeout(
        state.read_timeout,
        read_request(&mut stream, state.max_request_bytes),
    )
    .await
    .map_err(|_| ConnectionError::ReadTimeout)??;

    let Some(response) = state.registry.dispatch(&state.settings, &raw) else {
        return Ok(());
    };

    let body = serde_json::to_vec(&response).expect("response serialization");
    stream.write_all(&body).await?;
    stream.flush().await?;
    stream.shutdown().await?;
    Ok(())
}

/// Accumulates bytes until the buffer holds a complete JSON document or
/// the peer half-closes, bounded by `limit`.
async fn read_request(
    stream: &mut (impl AsyncRead + Unpin),
    limit: usize,
) -> Result<Vec<u8>, ConnectionError> {
    let mut buffer = Vec::with_capacity(limit.min(1024));
    let mut chunk = [0u8; 512];

    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(buffer);
        }
        if buffer.len() + read > limit {
            return Err(ConnectionError::PayloadTooLarge { limit });
        }
        buffer.extend_from_slice(&chunk[..read]);
        if is_complete_json(&buffer) {
            return Ok(buffer);
        }
    }
}

/// A buffer is complete once serde_json stops classifying the failure as
/// premature end of input. A malformed-but-finished document counts as
/// complete; the dispatcher turns it into a parse error response.
fn is_complete_json(buffer: &[u8]) -> bool {
    match serde_json::from_slice::<serde_json::Value>(buffer) {
        Ok(_) => true,
        Err(err) => !err.is_eof(),
    }
}
