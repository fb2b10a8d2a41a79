// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single segment writer.
//!
//! Producers hand payloads to [`ArchiverHandle::submit`]; one writer task
//! owns the current [`SegmentStore`] and processes queued payloads, the
//! rotation timer, and shutdown one at a time.

use crate::protocol::Ack;
use redo_core::{codec, Clock};
use redo_storage::{SegmentError, SegmentName, SegmentStore};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Fatal writer errors
#[derive(Debug, Error)]
pub enum ArchiverError {
    #[error("storage error: {0}")]
    Storage(#[from] SegmentError),
}

/// Writer lifecycle, observable through [`ArchiverHandle::state`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiverState {
    Open,
    Rotating,
    Closed,
}

impl fmt::Display for ArchiverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiverState::Open => write!(f, "open"),
            ArchiverState::Rotating => write!(f, "rotating"),
            ArchiverState::Closed => write!(f, "closed"),
        }
    }
}

enum WriterCommand {
    Append {
        payload: Vec<u8>,
        ack: oneshot::Sender<Ack>,
    },
    Rotate {
        done: oneshot::Sender<SegmentName>,
    },
}

/// Producer side of the writer queue
#[derive(Clone)]
pub struct ArchiverHandle {
    tx: mpsc::Sender<WriterCommand>,
    state: watch::Receiver<ArchiverState>,
}

impl ArchiverHandle {
    /// Queue a payload and wait until the writer has processed it
    pub async fn submit(&self, payload: Vec<u8>) -> Ack {
        let (ack, rx) = oneshot::channel();
        if self
            .tx
            .send(WriterCommand::Append { payload, ack })
            .await
            .is_err()
        {
            return Ack::Closed;
        }
        rx.await.unwrap_or(Ack::Closed)
    }

    /// Rotate now; returns the new segment, or `None` once closed
    pub async fn rotate(&self) -> Option<SegmentName> {
        let (done, rx) = oneshot::channel();
        self.tx.send(WriterCommand::Rotate { done }).await.ok()?;
        rx.await.ok()
    }

    pub fn state(&self) -> ArchiverState {
        *self.state.borrow()
    }
}

/// Owns the writable segment
pub struct Archiver<C: Clock> {
    dir: PathBuf,
    clock: C,
    rotate_interval: Duration,
    store: SegmentStore,
    rx: mpsc::Receiver<WriterCommand>,
    state: watch::Sender<ArchiverState>,
}

impl<C: Clock> Archiver<C> {
    /// Create the first segment in `dir` and the producer queue
    pub fn open(
        dir: &Path,
        rotate_interval: Duration,
        queue_depth: usize,
        clock: C,
    ) -> Result<(Self, ArchiverHandle), ArchiverError> {
        let name = SegmentName::new(clock.now());
        let store = SegmentStore::create(dir, name)?;
        info!(segment = %name, "archiver open");

        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        let (state, state_rx) = watch::channel(ArchiverState::Open);
        let archiver = Self {
            dir: dir.to_path_buf(),
            clock,
            rotate_interval,
            store,
            rx,
            state,
        };
        Ok((archiver, ArchiverHandle { tx, state: state_rx }))
    }

    pub fn current_segment(&self) -> SegmentName {
        self.store.name()
    }

    /// Process queued payloads until `shutdown` resolves or every handle is
    /// dropped. Queued payloads not yet processed are answered with
    /// [`Ack::Closed`]. A storage failure ends the loop with an error.
    pub async fn run<F>(mut self, shutdown: F) -> Result<(), ArchiverError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let result = self.event_loop(&mut shutdown).await;

        self.set_state(ArchiverState::Closed);
        self.rx.close();
        let mut refused = 0usize;
        while let Ok(command) = self.rx.try_recv() {
            if let WriterCommand::Append { ack, .. } = command {
                let _ = ack.send(Ack::Closed);
                refused += 1;
            }
        }
        if refused > 0 {
            warn!(refused, "refused queued payloads at shutdown");
        }

        let segment = self.store.name();
        self.store.close();
        match &result {
            Ok(()) => info!(segment = %segment, "archiver closed"),
            Err(e) => error!(segment = %segment, error = %e, "archiver failed"),
        }
        result
    }

    async fn event_loop<F>(&mut self, shutdown: &mut std::pin::Pin<&mut F>) -> Result<(), ArchiverError>
    where
        F: Future<Output = ()>,
    {
        let mut deadline = Instant::now() + self.rotate_interval;
        loop {
            tokio::select! {
                biased;

                _ = shutdown.as_mut() => {
                    info!("shutdown requested");
                    return Ok(());
                }

                _ = tokio::time::sleep_until(deadline) => {
                    self.rotate()?;
                    deadline = Instant::now() + self.rotate_interval;
                }

                command = self.rx.recv() => match command {
                    Some(WriterCommand::Append { payload, ack }) => {
                        let reply = self.append(&payload)?;
                        let _ = ack.send(reply);
                    }
                    Some(WriterCommand::Rotate { done }) => {
                        let name = self.rotate()?;
                        deadline = Instant::now() + self.rotate_interval;
                        let _ = done.send(name);
                    }
                    None => {
                        info!("all producers gone");
                        return Ok(());
                    }
                },
            }
        }
    }

    /// Store one payload. Undecodable payloads are dropped, not fatal.
    fn append(&mut self, payload: &[u8]) -> Result<Ack, ArchiverError> {
        let record = match codec::decode(payload) {
            Ok(record) => record,
            Err(e) => {
                warn!(len = payload.len(), error = %e, "dropping undecodable payload");
                return Ok(Ack::Dropped {
                    reason: e.to_string(),
                });
            }
        };
        let bytes = match codec::encode(&record) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(user_id = record.user_id, error = %e, "dropping unencodable record");
                return Ok(Ack::Dropped {
                    reason: e.to_string(),
                });
            }
        };

        let key = self.store.append(&bytes)?;
        let segment = self.store.name();
        debug!(segment = %segment, key, user_id = record.user_id, api = %record.api, "committed");
        Ok(Ack::Committed {
            segment: segment.file_name(),
            key,
        })
    }

    /// Open the next segment, then close the current one
    fn rotate(&mut self) -> Result<SegmentName, ArchiverError> {
        self.set_state(ArchiverState::Rotating);
        let current = self.store.name();
        let next = current.successor(self.clock.now());

        let store = SegmentStore::create(&self.dir, next)?;
        let previous = std::mem::replace(&mut self.store, store);
        let records = previous.last_key();
        previous.close();

        info!(from = %current, to = %next, records, "rotated");
        self.set_state(ArchiverState::Open);
        Ok(next)
    }

    fn set_state(&self, state: ArchiverState) {
        debug!(%state, "archiver state");
        self.state.send_replace(state);
    }
}

#[cfg(test)]
#[path = "archiver_tests.rs"]
mod tests;
