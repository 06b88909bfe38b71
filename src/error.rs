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

//! Errors raised while compiling a pattern into a renderer chain.

/// The pattern scanner hit malformed input.
///
/// Raised for an unterminated `{...}` option block or a format modifier
/// that is not of the shape `-? digits ('.' '-'? digits)?`.
#[derive(Debug, thiserror::Error)]
#[error("{message}, around character {position}")]
pub struct ScanError {
    message: String,
    position: usize,
}

impl ScanError {
    pub(crate) fn new(message: impl Into<String>, position: usize) -> Self {
        ScanError {
            message: message.into(),
            position,
        }
    }
}

/// The token sequence is structurally invalid.
///
/// Raised for a `%` followed by neither a keyword nor `(`, and for
/// unmatched parentheses.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
        }
    }
}

/// Any failure to compile a pattern string.
///
/// A failed compile never installs a partial chain: the layout keeps
/// rendering with whatever chain was installed before.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("failed to scan pattern: {0}")]
    Scan(#[from] ScanError),
    #[error("failed to parse pattern: {0}")]
    Parse(#[from] ParseError),
}
