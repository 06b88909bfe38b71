// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Diagnostics about the logging pipeline itself.
//!
//! Layouts and appenders must not log through the pipeline they implement,
//! so recoverable misconfigurations and I/O failures are reported here
//! instead of being raised to the thread that happened to log.

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

/// Severity of a [`Status`] report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLevel::Info => f.write_str("INFO"),
            StatusLevel::Warn => f.write_str("WARN"),
            StatusLevel::Error => f.write_str("ERROR"),
        }
    }
}

/// One diagnostic message, with an optional underlying cause.
#[derive(Debug)]
pub struct Status {
    pub level: StatusLevel,
    pub origin: &'static str,
    pub message: String,
    pub source: Option<anyhow::Error>,
}

/// Receives [`Status`] reports from layouts and appenders.
pub trait StatusListener: fmt::Debug + Send + Sync + 'static {
    fn on_status(&self, status: &Status);
}

/// A shareable handle for reporting [`Status`] messages.
///
/// Cloning the handle is cheap; all clones deliver to the same listener.
#[derive(Debug, Clone)]
pub struct StatusHandle {
    listener: Arc<dyn StatusListener>,
}

impl Default for StatusHandle {
    fn default() -> Self {
        StatusHandle::new(StderrStatus)
    }
}

impl StatusHandle {
    pub fn new(listener: impl StatusListener) -> Self {
        StatusHandle {
            listener: Arc::new(listener),
        }
    }

    pub fn info(&self, origin: &'static str, message: impl Into<String>) {
        self.report(StatusLevel::Info, origin, message.into(), None);
    }

    pub fn warn(&self, origin: &'static str, message: impl Into<String>) {
        self.report(StatusLevel::Warn, origin, message.into(), None);
    }

    pub fn error(&self, origin: &'static str, message: impl Into<String>) {
        self.report(StatusLevel::Error, origin, message.into(), None);
    }

    pub fn error_with(
        &self,
        origin: &'static str,
        message: impl Into<String>,
        source: anyhow::Error,
    ) {
        self.report(StatusLevel::Error, origin, message.into(), Some(source));
    }

    fn report(
        &self,
        level: StatusLevel,
        origin: &'static str,
        message: String,
        source: Option<anyhow::Error>,
    ) {
        self.listener.on_status(&Status {
            level,
            origin,
            message,
            source,
        });
    }
}

/// Writes status reports to stderr. This is the default listener.
#[derive(Debug, Default)]
pub struct StderrStatus;

impl StatusListener for StderrStatus {
    fn on_status(&self, status: &Status) {
        match &status.source {
            Some(source) => eprintln!(
                "logloom {} [{}] {}: {source:#}",
                status.level, status.origin, status.message
            ),
            None => eprintln!(
                "logloom {} [{}] {}",
                status.level, status.origin, status.message
            ),
        }
    }
}

/// Collects status reports in memory.
///
/// Useful in tests and for inspecting startup problems after the fact.
/// Clones share the same storage.
///
/// # Examples
///
/// ```
/// use logloom::status::MemoryStatus;
/// use logloom::status::StatusHandle;
///
/// let memory = MemoryStatus::default();
/// let status = StatusHandle::new(memory.clone());
/// status.warn("example", "something looks off");
/// assert_eq!(memory.snapshot().len(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryStatus {
    entries: Arc<Mutex<Vec<(StatusLevel, String)>>>,
}

impl MemoryStatus {
    /// Returns a copy of all reports captured so far.
    pub fn snapshot(&self) -> Vec<(StatusLevel, String)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the messages captured at `level`.
    pub fn messages_at(&self, level: StatusLevel) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }
}

impl StatusListener for MemoryStatus {
    fn on_status(&self, status: &Status) {
        let message = match &status.source {
            Some(source) => format!("{}: {source:#}", status.message),
            None => status.message.clone(),
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((status.level, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_status_captures_levels() {
        let memory = MemoryStatus::default();
        let status = StatusHandle::new(memory.clone());

        status.info("test", "started");
        status.warn("test", "odd but fine");
        status.error_with("test", "broken", anyhow::anyhow!("root cause"));

        let snapshot = memory.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0], (StatusLevel::Info, "started".to_string()));
        assert_eq!(snapshot[1], (StatusLevel::Warn, "odd but fine".to_string()));
        assert_eq!(snapshot[2].0, StatusLevel::Error);
        assert!(snapshot[2].1.contains("root cause"));
    }

    #[test]
    fn test_clones_share_storage() {
        let memory = MemoryStatus::default();
        let status = StatusHandle::new(memory.clone());
        let other = status.clone();

        status.info("test", "one");
        other.info("test", "two");

        assert_eq!(memory.snapshot().len(), 2);
    }
}
