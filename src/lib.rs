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

//! Logloom is the formatting core of a logging pipeline: it compiles a
//! pattern string like `%-5level %logger{36} - %msg` into a reusable chain
//! of renderers, and ships the rendered lines to appenders, including a
//! file appender that is safe to share between processes.
//!
//! # Overview
//!
//! A [`layout::PatternLayout`] is compiled once, at configuration time,
//! and then renders each record by walking its converter chain. Keywords
//! resolve through three layers of bindings: built-in defaults, a shared
//! [`Context`] registry, and per-layout overrides. The
//! [`append::FileAppender`] persists rendered lines, with an optional
//! "prudent" mode that uses advisory file locking so several processes
//! can append to one file without corrupting it.
//!
//! # Examples
//!
//! Simple setup with the default stdout appender:
//!
//! ```
//! logloom::stdout().apply().unwrap();
//!
//! log::info!("This is an info message.");
//! ```
//!
//! A custom pattern writing to a shared file:
//!
//! ```no_run
//! use logloom::append::FileAppenderBuilder;
//! use logloom::layout::PatternLayout;
//!
//! let layout = PatternLayout::builder("%date %-5level %logger{20} - %msg").build().unwrap();
//! let file = FileAppenderBuilder::new()
//!     .path("logs/service.log")
//!     .prudent(true)
//!     .layout(layout)
//!     .build();
//! file.start().unwrap();
//!
//! logloom::builder()
//!     .dispatch(|d| d.filter(log::LevelFilter::Info).append(file))
//!     .apply()
//!     .unwrap();
//!
//! log::info!("This log will be written to the file.");
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod filter;
pub mod layout;
pub mod status;

pub use append::Append;
pub use filter::Filter;
pub use layout::Layout;

mod context;
pub use context::Context;

mod error;
pub use error::ParseError;
pub use error::PatternError;
pub use error::ScanError;

mod logger;
pub use logger::*;
