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

pub use env_filter::Builder as EnvFilterBuilder;
use log::LevelFilter;
use log::Metadata;

use crate::filter::Filter;
use crate::filter::FilterResult;

const DEFAULT_FILTER_ENV: &str = "RUST_LOG";

/// A filter that respects the `RUST_LOG` environment variable.
///
/// Read [the `env_logger` documentation](https://docs.rs/env_logger/#enabling-logging) for more.
#[derive(Debug)]
pub struct EnvFilter(env_filter::Filter);

impl EnvFilter {
    /// Initializes the filter from the environment using the default
    /// variable name `RUST_LOG`.
    ///
    /// # Examples
    ///
    /// ```
    /// use logloom::filter::EnvFilter;
    /// let filter = EnvFilter::from_default_env();
    /// ```
    pub fn from_default_env() -> Self {
        EnvFilter::from_env(DEFAULT_FILTER_ENV)
    }

    /// Initializes the filter from the environment using a specific
    /// variable name.
    pub fn from_env(name: &str) -> Self {
        let mut builder = EnvFilterBuilder::new();
        if let Ok(s) = std::env::var(name) {
            builder.parse(&s);
        }
        EnvFilter::new(builder)
    }

    /// Initializes the filter from an [EnvFilterBuilder].
    pub fn new(mut builder: EnvFilterBuilder) -> Self {
        EnvFilter(builder.build())
    }

    pub(crate) fn enabled(&self, metadata: &Metadata) -> FilterResult {
        if self.0.enabled(metadata) {
            FilterResult::Neutral
        } else {
            FilterResult::Reject
        }
    }
}

impl From<LevelFilter> for EnvFilter {
    fn from(filter: LevelFilter) -> Self {
        let mut builder = EnvFilterBuilder::new();
        builder.filter_level(filter);
        EnvFilter::new(builder)
    }
}

impl<'a> From<&'a str> for EnvFilter {
    fn from(filter: &'a str) -> Self {
        let mut builder = EnvFilterBuilder::new();
        builder.parse(filter);
        EnvFilter::new(builder)
    }
}

impl From<EnvFilter> for Filter {
    fn from(filter: EnvFilter) -> Self {
        Filter::Env(filter)
    }
}
