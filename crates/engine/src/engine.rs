// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command execution against the segment index

use crate::command::{self, Command, ParseError, HELP};
use crate::replay;
use crate::session::Session;
use redo_adapters::{ReplaySink, SinkConnector, SinkError};
use redo_core::snowflake;
use redo_storage::{Index, IndexEntry, SegmentError, SegmentSet};
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

/// Default upper bound for one sink upsert
pub const DEFAULT_SINK_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from executing a command line.
///
/// Everything but [`EngineError::Output`] is confined to its line.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),
    #[error("invalid time {input:?}: {source}")]
    InvalidTime {
        input: String,
        source: chrono::ParseError,
    },
    #[error("no record at position {0}")]
    NoSuchPosition(usize),
    #[error("record at position {position} is missing from its segment")]
    MissingRecord { position: usize },
    #[error("storage error: {0}")]
    Segment(#[from] SegmentError),
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

impl EngineError {
    /// Whether the session can go on after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::Output(_))
    }
}

/// Interprets command lines against an index built over a segment set
pub struct QueryEngine<C> {
    set: SegmentSet,
    index: Index,
    session: Session,
    connector: C,
    sink_timeout: Duration,
}

impl<C: SinkConnector> QueryEngine<C> {
    pub fn new(set: SegmentSet, index: Index, connector: C) -> Self {
        Self {
            set,
            index,
            session: Session::new(),
            connector,
            sink_timeout: DEFAULT_SINK_TIMEOUT,
        }
    }

    pub fn with_sink_timeout(mut self, timeout: Duration) -> Self {
        self.sink_timeout = timeout;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Entries passing the session filters, with their 1-based positions
    pub fn matching(&self) -> impl Iterator<Item = (usize, &IndexEntry)> + '_ {
        self.index
            .entries()
            .iter()
            .enumerate()
            .map(|(i, e)| (i + 1, e))
            .filter(|(_, e)| self.session.matches(e))
    }

    /// Read lines until end of input, executing each.
    ///
    /// Line-level errors are printed and the loop continues; only output
    /// failures end it early.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W, prompt: bool) -> Result<(), EngineError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        // Raw segments: a line that is not UTF-8 is a line error, not a read failure
        let mut lines = input.split(b'\n');
        loop {
            if prompt {
                write!(out, "> ")?;
                out.flush()?;
            }
            let Some(mut bytes) = lines.next_segment().await? else {
                break;
            };
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            let outcome = match String::from_utf8(bytes) {
                Ok(line) => {
                    let result = self.execute(&line, out).await;
                    result.map_err(|e| (line, e))
                }
                Err(e) => Err((
                    String::from_utf8_lossy(e.as_bytes()).into_owned(),
                    ParseError::InvalidEncoding.into(),
                )),
            };
            match outcome {
                Ok(()) => {}
                Err((line, e)) if e.is_recoverable() => {
                    warn!(line = %line, error = %e, "command failed");
                    writeln!(out, "error: {e}")?;
                }
                Err((_, e)) => return Err(e),
            }
        }
        if prompt {
            writeln!(out)?;
        }
        Ok(())
    }

    /// Execute one command line
    pub async fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<(), EngineError> {
        let Some(command) = command::parse(line)? else {
            return Ok(());
        };

        match command {
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Clear => self.session.clear(),
            Command::User(user) => self.session.set_user(user),
            Command::Duration { start, end } => {
                self.session
                    .set_window(&start, &end)
                    .map_err(|source| EngineError::InvalidTime {
                        input: format!("{start} {end}"),
                        source,
                    })?;
            }
            Command::Sum => writeln!(out, "total:{}", self.matching().count())?,
            Command::Ls => self.list(out)?,
            Command::Show(position) => self.show(position, out)?,
            Command::Replay(uri) => self.replay(&uri, out).await?,
            Command::Files => self.files(out)?,
            Command::Users => self.users(out)?,
        }
        Ok(())
    }

    fn list<W: Write>(&self, out: &mut W) -> Result<(), EngineError> {
        for (position, entry) in self.matching() {
            writeln!(
                out,
                "{position} user_id={} segment={} key={} created_at={}",
                entry.user_id,
                entry.segment,
                entry.key,
                format_created_at(entry.timestamp)
            )?;
        }
        Ok(())
    }

    fn show<W: Write>(&self, position: usize, out: &mut W) -> Result<(), EngineError> {
        let entry = self
            .index
            .position(position)
            .ok_or(EngineError::NoSuchPosition(position))?;
        let record = self
            .set
            .record(entry.segment, entry.key)?
            .ok_or(EngineError::MissingRecord { position })?;

        writeln!(out, "user_id={}", record.user_id)?;
        writeln!(out, "api={}", record.api)?;
        writeln!(out, "created_at={}", format_created_at(record.timestamp))?;
        for (i, change) in record.changes.iter().enumerate() {
            writeln!(
                out,
                "change #{i} collection:{} field:{}",
                change.collection, change.field
            )?;
            match change.document() {
                Ok(document) => writeln!(out, "  {document}")?,
                Err(e) => writeln!(out, "  undecodable document: {e}")?,
            }
        }
        Ok(())
    }

    async fn replay<W: Write>(&self, uri: &str, out: &mut W) -> Result<(), EngineError> {
        let mut sink = self.connector.connect(uri).await?;
        let entries = self.matching().map(|(_, e)| e);
        let summary = replay::replay(&mut sink, &self.set, entries, self.sink_timeout).await;

        if let Err(e) = sink.close().await {
            warn!(uri, error = %e, "sink close failed");
        }
        info!(uri, %summary, "replay finished");
        writeln!(out, "{summary}")?;
        Ok(())
    }

    fn files<W: Write>(&self, out: &mut W) -> Result<(), EngineError> {
        let mut counts = vec![0usize; self.set.len()];
        for entry in self.index.entries() {
            if let Some(count) = counts.get_mut(entry.segment) {
                *count += 1;
            }
        }
        for (i, segment) in self.set.segments().iter().enumerate() {
            let records = counts.get(i).copied().unwrap_or_default();
            writeln!(out, "{i} {} records:{records}", segment.name())?;
        }
        Ok(())
    }

    fn users<W: Write>(&self, out: &mut W) -> Result<(), EngineError> {
        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
        for entry in self.index.entries() {
            if self.session.matches_window(entry) {
                *counts.entry(entry.user_id).or_default() += 1;
            }
        }
        for (user_id, count) in counts {
            writeln!(out, "user_id={user_id} count:{count}")?;
        }
        Ok(())
    }
}

fn format_created_at(timestamp: u64) -> String {
    match snowflake::to_datetime(timestamp) {
        Some(time) => time.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        None => format!("invalid({})", snowflake::millis(timestamp)),
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
