// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filter state bound by `USER` and `DURATION`

use chrono::NaiveDateTime;
use redo_storage::IndexEntry;

/// Layout of `DURATION` arguments, interpreted as UTC
pub const TIME_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S";

/// Inclusive window in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: i64,
    pub end: i64,
}

impl Window {
    pub fn contains(&self, millis: i64) -> bool {
        self.start <= millis && millis <= self.end
    }
}

/// Parse a `DURATION` argument to epoch milliseconds
pub fn parse_time(text: &str) -> Result<i64, chrono::ParseError> {
    let time = NaiveDateTime::parse_from_str(text, TIME_LAYOUT)?;
    Ok(time.and_utc().timestamp_millis())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<i32>,
    window: Option<Window>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<i32> {
        self.user
    }

    pub fn window(&self) -> Option<Window> {
        self.window
    }

    pub fn clear(&mut self) {
        self.user = None;
        self.window = None;
    }

    pub fn set_user(&mut self, user: i32) {
        self.user = Some(user);
    }

    /// Bind the window from two `DURATION` arguments.
    ///
    /// On a parse failure the previous window is kept.
    pub fn set_window(&mut self, start: &str, end: &str) -> Result<Window, chrono::ParseError> {
        let window = Window {
            start: parse_time(start)?,
            end: parse_time(end)?,
        };
        self.window = Some(window);
        Ok(window)
    }

    /// Whether an entry passes both filters
    pub fn matches(&self, entry: &IndexEntry) -> bool {
        self.user.map_or(true, |u| u == entry.user_id) && self.matches_window(entry)
    }

    /// Whether an entry passes the duration filter, ignoring the user
    pub fn matches_window(&self, entry: &IndexEntry) -> bool {
        self.window.map_or(true, |w| w.contains(entry.millis()))
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
