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

//! Appender for writing log records to a single file.
//!
//! In prudent mode the appender takes an exclusive advisory lock and
//! reseeks to the current end of file around every write, so any number
//! of cooperating processes can append to the same file without clobbering
//! each other's lines.
//!
//! # Example
//!
//! ```no_run
//! use logloom::append::FileAppenderBuilder;
//!
//! let appender = FileAppenderBuilder::new()
//!     .path("logs/service.log")
//!     .prudent(true)
//!     .build();
//! appender.start().unwrap();
//! ```

pub use append::FileAppender;
pub use append::FileAppenderBuilder;

mod append;
