// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::archiver::ArchiverHandle;
use crate::protocol::{self, Ack, ProtocolError, DEFAULT_TIMEOUT};

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Serve one producer connection.
///
/// Each message is handed to the writer and answered with its [`Ack`]
/// before the next one is read. Returns once the producer disconnects or
/// the archiver has closed.
pub async fn handle_connection<S>(stream: S, handle: ArchiverHandle) -> Result<(), ServerError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);
    let mut received = 0u64;

    loop {
        let payload = match protocol::read_message(&mut reader).await {
            Ok(payload) => payload,
            Err(ProtocolError::ConnectionClosed) => {
                debug!(received, "producer disconnected");
                return Ok(());
            }
            Err(e) => {
                warn!(received, error = %e, "failed to read message");
                return Err(e.into());
            }
        };
        received += 1;

        let ack = handle.submit(payload).await;
        debug!(?ack, "acknowledging");
        protocol::write_ack(&mut writer, &ack, DEFAULT_TIMEOUT).await?;

        if ack == Ack::Closed {
            debug!(received, "archiver closed, ending connection");
            return Ok(());
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
