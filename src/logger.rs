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

use std::io::Write;

use log::LevelFilter;
use log::Metadata;
use log::Record;

use crate::append;
use crate::append::Append;
use crate::filter::EnvFilter;
use crate::filter::Filter;
use crate::filter::FilterResult;

/// Create a new empty [`Builder`].
///
/// At least one dispatch should be added:
///
/// ```
/// use log::LevelFilter;
/// use logloom::append;
///
/// logloom::builder()
///     .dispatch(|d| {
///         d.filter(LevelFilter::Info)
///             .append(append::Stdout::default())
///     })
///     .apply()
///     .unwrap();
/// ```
pub fn builder() -> Builder {
    Builder::new()
}

/// Create a [`Builder`] with a default [`append::Stdout`] appender and an
/// [`EnvFilter`] respecting `RUST_LOG`.
pub fn stdout() -> Builder {
    builder().dispatch(|d| {
        d.filter(EnvFilter::from_default_env())
            .append(append::Stdout::default())
    })
}

/// Create a [`Builder`] with a default [`append::Stderr`] appender and an
/// [`EnvFilter`] respecting `RUST_LOG`.
pub fn stderr() -> Builder {
    builder().dispatch(|d| {
        d.filter(EnvFilter::from_default_env())
            .append(append::Stderr::default())
    })
}

/// A grouped set of filters and appenders.
///
/// A record is offered to the appenders only if no filter rejects it.
#[derive(Debug)]
pub struct Dispatch<const APPEND: bool = true> {
    filters: Vec<Filter>,
    appends: Vec<Box<dyn Append>>,
}

impl Dispatch<false> {
    fn new() -> Dispatch<false> {
        Self {
            filters: vec![],
            appends: vec![],
        }
    }

    /// Add a [`Filter`] to the dispatch.
    pub fn filter(mut self, filter: impl Into<Filter>) -> Dispatch<false> {
        self.filters.push(filter.into());
        self
    }
}

impl<const APPEND: bool> Dispatch<APPEND> {
    /// Add an [`Append`] to the dispatch.
    pub fn append(mut self, append: impl Append) -> Dispatch<true> {
        self.appends.push(Box::new(append));

        Dispatch {
            filters: self.filters,
            appends: self.appends,
        }
    }
}

impl Dispatch {
    fn enabled(&self, metadata: &Metadata) -> bool {
        for filter in &self.filters {
            match filter.enabled(metadata) {
                FilterResult::Reject => return false,
                FilterResult::Accept => return true,
                FilterResult::Neutral => {}
            }
        }

        true
    }

    fn log(&self, record: &Record) -> anyhow::Result<()> {
        for append in &self.appends {
            append.append(record)?;
        }
        Ok(())
    }

    fn flush(&self) {
        for append in &self.appends {
            append.flush();
        }
    }
}

/// A builder for configuring the logger.
#[must_use = "call `apply` to set the global logger"]
#[derive(Debug, Default)]
pub struct Builder {
    dispatches: Vec<Dispatch>,
    max_level: Option<LevelFilter>,
}

impl Builder {
    fn new() -> Self {
        Self {
            dispatches: vec![],
            max_level: None,
        }
    }

    /// Add a dispatch constructed by the closure.
    pub fn dispatch<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Dispatch<false>) -> Dispatch<true>,
    {
        self.dispatches.push(f(Dispatch::new()));
        self
    }

    /// Set the global maximum log level, passed to [`log::set_max_level`].
    ///
    /// Default to [`LevelFilter::Trace`], so filtering is left to the
    /// dispatch filters.
    pub fn max_level(mut self, max_level: LevelFilter) -> Self {
        self.max_level = Some(max_level);
        self
    }

    /// Set up the global logger with all the dispatches configured.
    ///
    /// This should be called early in the execution of a Rust program.
    /// Any log events that occur before initialization are ignored.
    ///
    /// # Errors
    ///
    /// Fails if a global logger has already been installed.
    pub fn apply(self) -> Result<(), log::SetLoggerError> {
        let max_level = self.max_level.unwrap_or(LevelFilter::Trace);
        let logger = Logger {
            dispatches: self.dispatches,
        };
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

/// The logger facade installed by [`Builder::apply`].
#[derive(Debug)]
pub struct Logger {
    dispatches: Vec<Dispatch>,
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.dispatches
            .iter()
            .any(|dispatch| dispatch.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        for dispatch in &self.dispatches {
            if dispatch.enabled(record.metadata()) {
                if let Err(err) = dispatch.log(record) {
                    handle_error(record, err);
                }
            }
        }
    }

    fn flush(&self) {
        for dispatch in &self.dispatches {
            dispatch.flush();
        }
    }
}

fn handle_error(record: &Record, error: anyhow::Error) {
    let Err(fallback_error) = write!(
        std::io::stderr(),
        r###"
Error perform logging.
    Attempted to log: {args}
    Record: {record:?}
    Error: {error}
"###,
        args = record.args(),
        record = record,
        error = error,
    ) else {
        return;
    };

    panic!(
        r###"
Error performing stderr logging after error occurred during regular logging.
    Attempted to log: {args}
    Record: {record:?}
    Error: {error}
    Fallback error: {fallback_error}
"###,
        args = record.args(),
        record = record,
        error = error,
        fallback_error = fallback_error,
    );
}
