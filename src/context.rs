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

//! The runtime context shared by pattern layouts.

use std::collections::HashMap;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::layout::pattern::ConverterFactory;
use crate::status::StatusHandle;

/// Process-wide state threaded through pattern compilation: the keyword
/// registry, the converter factory table, and the status sink.
///
/// There is no ambient global registry. An application wanting custom
/// keywords across several layouts creates one `Context`, registers its
/// rules and factories there, and hands an `Arc<Context>` to each layout
/// it builds. Registry changes take effect the next time a layout
/// compiles.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use logloom::Context;
/// use logloom::layout::PatternLayout;
///
/// let ctx = Arc::new(Context::new());
/// ctx.put_rule("lvl", "level");
/// let layout = PatternLayout::builder("%lvl").context(ctx).build().unwrap();
/// ```
#[derive(Debug)]
pub struct Context {
    rules: RwLock<HashMap<String, String>>,
    factories: RwLock<HashMap<String, ConverterFactory>>,
    status: StatusHandle,
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

impl Context {
    /// Creates a context reporting to stderr.
    pub fn new() -> Self {
        Context::with_status(StatusHandle::default())
    }

    /// Creates a context reporting to the given status handle.
    pub fn with_status(status: StatusHandle) -> Self {
        let factories = crate::layout::pattern::default_factories()
            .into_iter()
            .map(|(name, factory)| (name.to_string(), factory))
            .collect();
        Context {
            rules: RwLock::new(HashMap::new()),
            factories: RwLock::new(factories),
            status,
        }
    }

    /// Binds a conversion keyword to a registered converter, for every
    /// layout compiled against this context.
    pub fn put_rule(&self, keyword: impl Into<String>, handler: impl Into<String>) {
        self.rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(keyword.into(), handler.into());
    }

    /// Registers a converter constructor under a handler name.
    pub fn put_factory(&self, name: impl Into<String>, factory: ConverterFactory) {
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), factory);
    }

    /// The status sink misconfigurations and I/O failures report to.
    pub fn status(&self) -> &StatusHandle {
        &self.status
    }

    pub(crate) fn rules_snapshot(&self) -> HashMap<String, String> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn factory(&self, name: &str) -> Option<ConverterFactory> {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}
