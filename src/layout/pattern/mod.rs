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

//! The pattern layout: compiles a pattern string like
//! `%-5level %logger{36} - %msg%n` into a chain of renderers walked once
//! per log record.
//!
//! # Example
//!
//! ```
//! use logloom::layout::PatternLayout;
//!
//! let layout = PatternLayout::builder("%-5level %msg").build().unwrap();
//! let line = layout.render(
//!     &log::Record::builder()
//!         .args(format_args!("service up"))
//!         .level(log::Level::Info)
//!         .build(),
//! );
//! assert_eq!(line, "INFO  service up");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;

use anyhow::Context as _;

use crate::context::Context;
use crate::layout::Layout;

mod chain;
mod compiler;
mod converters;
mod format;
mod lexer;
mod name;
mod parser;
mod token;

pub use self::chain::Chain;
pub use self::chain::ChainLink;
pub use self::chain::Convert;
pub use self::chain::ConverterFactory;
pub use self::converters::LiteralConverter;
pub use self::format::FormatDirective;

pub(crate) use self::converters::default_factories;

const ORIGIN: &str = "PatternLayout";

type PostProcessor = Box<dyn Fn(&mut Chain) + Send + Sync>;

/// A layout that renders records through a chain compiled from a pattern
/// string.
///
/// Compiling happens once, at build time or on an explicit
/// [`set_pattern`](PatternLayout::set_pattern)/[`reload`](PatternLayout::reload);
/// rendering only walks the installed chain and never blocks on a
/// compile beyond the final chain swap. A failed recompile keeps the
/// previously installed chain rendering.
pub struct PatternLayout {
    pattern: Mutex<String>,
    context: Arc<Context>,
    instance_rules: HashMap<String, String>,
    post_processor: Option<PostProcessor>,
    chain: RwLock<Arc<Chain>>,
}

impl fmt::Debug for PatternLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternLayout")
            .field("pattern", &self.pattern())
            .finish_non_exhaustive()
    }
}

impl PatternLayout {
    /// Creates a builder for the given pattern.
    pub fn builder(pattern: impl Into<String>) -> PatternLayoutBuilder {
        PatternLayoutBuilder {
            pattern: pattern.into(),
            context: None,
            rules: HashMap::new(),
            post_processor: None,
        }
    }

    /// Renders one record into a line of text.
    ///
    /// Deterministic for a fixed chain and record; safe to call from any
    /// number of threads.
    pub fn render(&self, record: &log::Record<'_>) -> String {
        let chain = Arc::clone(&self.chain.read().unwrap_or_else(PoisonError::into_inner));
        let mut buf = String::with_capacity(128);
        chain.write_to(record, &mut buf);
        buf
    }

    /// The currently installed pattern.
    pub fn pattern(&self) -> String {
        self.pattern
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Compiles `pattern` and swaps it in.
    ///
    /// On error the previous chain stays installed and keeps rendering.
    pub fn set_pattern(&self, pattern: impl Into<String>) -> anyhow::Result<()> {
        let pattern = pattern.into();
        let mut current = self.pattern.lock().unwrap_or_else(PoisonError::into_inner);
        let chain = self.compile(&pattern)?;
        *current = pattern;
        self.install(chain);
        Ok(())
    }

    /// Recompiles the current pattern, picking up registry changes made
    /// on the shared [`Context`] since the last compile.
    pub fn reload(&self) -> anyhow::Result<()> {
        let current = self.pattern.lock().unwrap_or_else(PoisonError::into_inner);
        let chain = self.compile(&current)?;
        self.install(chain);
        Ok(())
    }

    fn install(&self, chain: Chain) {
        *self.chain.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(chain);
    }

    fn compile(&self, pattern: &str) -> anyhow::Result<Chain> {
        let nodes = parser::parse(pattern).inspect_err(|err| {
            self.context
                .status()
                .error(ORIGIN, format!("failed to compile \"{pattern}\": {err}"));
        })?;
        let compiler = compiler::Compiler::new(&self.context, &self.instance_rules);
        let mut chain = compiler.compile(nodes);
        if let Some(post_processor) = &self.post_processor {
            post_processor(&mut chain);
        }
        chain.start_all(&self.context);
        Ok(chain)
    }
}

impl Default for PatternLayout {
    /// The stock line format: timestamp, level, logger and message.
    /// Appenders add the trailing newline themselves.
    fn default() -> Self {
        PatternLayout::builder("%date %-5level %logger: %message")
            .build()
            .expect("default pattern must compile")
    }
}

impl Layout for PatternLayout {
    fn format(&self, record: &log::Record<'_>) -> anyhow::Result<Vec<u8>> {
        Ok(self.render(record).into_bytes())
    }
}

/// A builder to configure and create a [`PatternLayout`].
pub struct PatternLayoutBuilder {
    pattern: String,
    context: Option<Arc<Context>>,
    rules: HashMap<String, String>,
    post_processor: Option<PostProcessor>,
}

impl fmt::Debug for PatternLayoutBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternLayoutBuilder")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl PatternLayoutBuilder {
    /// Shares a runtime context between several layouts.
    ///
    /// Default to a fresh [`Context`] owned by this layout alone.
    pub fn context(mut self, context: Arc<Context>) -> Self {
        self.context = Some(context);
        self
    }

    /// Binds `keyword` to a registered converter for this layout only,
    /// overriding both the defaults and the context registry.
    pub fn rule(mut self, keyword: impl Into<String>, handler: impl Into<String>) -> Self {
        self.rules.insert(keyword.into(), handler.into());
        self
    }

    /// Installs a hook that may rewrite the compiled chain before it is
    /// installed, e.g. to splice in cross-cutting renderers.
    pub fn post_processor(mut self, f: impl Fn(&mut Chain) + Send + Sync + 'static) -> Self {
        self.post_processor = Some(Box::new(f));
        self
    }

    /// Compiles the pattern and builds the layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not scan or parse; an unknown
    /// keyword is not an error (it renders as a diagnostic marker).
    pub fn build(self) -> anyhow::Result<PatternLayout> {
        let pattern = self.pattern;
        let layout = PatternLayout {
            pattern: Mutex::new(String::new()),
            context: self.context.unwrap_or_default(),
            instance_rules: self.rules,
            post_processor: self.post_processor,
            chain: RwLock::new(Arc::new(Chain::default())),
        };
        layout
            .set_pattern(pattern)
            .context("failed to build pattern layout")?;
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::MemoryStatus;
    use crate::status::StatusHandle;
    use crate::status::StatusLevel;

    fn render(layout: &PatternLayout, level: log::Level, target: &str, msg: &str) -> String {
        layout.render(
            &log::Record::builder()
                .args(format_args!("{msg}"))
                .level(level)
                .target(target)
                .build(),
        )
    }

    #[test]
    fn test_literal_and_conversions() {
        let layout = PatternLayout::builder("[%level] %msg%n").build().unwrap();
        let line = render(&layout, log::Level::Warn, "a.b", "look out");
        assert_eq!(line, "[WARN] look out\n");
    }

    #[test]
    fn test_render_is_deterministic() {
        let layout = PatternLayout::builder("%-5level %logger{10} - %msg").build().unwrap();
        let first = render(&layout, log::Level::Info, "com.acme.Service", "ready");
        let second = render(&layout, log::Level::Info, "com.acme.Service", "ready");
        assert_eq!(first, second);
    }

    #[test]
    fn test_format_modifier_applies() {
        let layout = PatternLayout::builder("%6level|%-6level|%.2level").build().unwrap();
        let line = render(&layout, log::Level::Info, "a", "x");
        assert_eq!(line, "  INFO|INFO  |FO");
    }

    #[test]
    fn test_group_formats_aggregate_output() {
        let layout = PatternLayout::builder("%-10(%level %msg)|").build().unwrap();
        let line = render(&layout, log::Level::Info, "a", "hi");
        assert_eq!(line, "INFO hi   |");
    }

    #[test]
    fn test_logger_abbreviation() {
        let layout = PatternLayout::builder("%logger{1}").build().unwrap();
        let line = render(&layout, log::Level::Info, "mainPackage.sub.sample.Bar", "x");
        assert_eq!(line, "m.s.s.Bar");
    }

    #[test]
    fn test_unknown_keyword_degrades_gracefully() {
        let memory = MemoryStatus::default();
        let ctx = Arc::new(Context::with_status(StatusHandle::new(memory.clone())));
        let layout = PatternLayout::builder("%bogus %msg")
            .context(ctx)
            .build()
            .unwrap();
        let line = render(&layout, log::Level::Info, "a", "still here");
        assert_eq!(line, "%PARSER_ERROR[bogus] still here");
        assert!(
            memory
                .messages_at(StatusLevel::Warn)
                .iter()
                .any(|m| m.contains("bogus"))
        );
    }

    #[test]
    fn test_failed_recompile_keeps_previous_chain() {
        let layout = PatternLayout::builder("%msg").build().unwrap();
        assert_eq!(render(&layout, log::Level::Info, "a", "hello"), "hello");

        let err = layout.set_pattern("%logger{unterminated");
        assert!(err.is_err());

        assert_eq!(render(&layout, log::Level::Info, "a", "hello"), "hello");
        assert_eq!(layout.pattern(), "%msg");
    }

    #[test]
    fn test_instance_rule_overrides_default() {
        let layout = PatternLayout::builder("%msg")
            .rule("msg", "level")
            .build()
            .unwrap();
        assert_eq!(render(&layout, log::Level::Error, "a", "hello"), "ERROR");
    }

    #[test]
    fn test_registry_layer_and_reload() {
        let ctx = Arc::new(Context::new());
        let layout = PatternLayout::builder("%msg")
            .context(Arc::clone(&ctx))
            .build()
            .unwrap();
        assert_eq!(render(&layout, log::Level::Info, "a", "hello"), "hello");

        // rebinding in the registry only takes effect on the next compile
        ctx.put_rule("msg", "level");
        assert_eq!(render(&layout, log::Level::Info, "a", "hello"), "hello");
        layout.reload().unwrap();
        assert_eq!(render(&layout, log::Level::Info, "a", "hello"), "INFO");
    }

    #[test]
    fn test_custom_factory() {
        let ctx = Arc::new(Context::new());
        ctx.put_factory("marker", ConverterFactory::simple(|| LiteralConverter::new("#")));
        ctx.put_rule("mark", "marker");
        let layout = PatternLayout::builder("%mark%msg%mark")
            .context(ctx)
            .build()
            .unwrap();
        assert_eq!(render(&layout, log::Level::Info, "a", "mid"), "#mid#");
    }

    #[test]
    fn test_post_processor_rewrites_chain() {
        let layout = PatternLayout::builder("%msg")
            .post_processor(|chain| {
                chain
                    .links_mut()
                    .insert(0, ChainLink::new(Box::new(LiteralConverter::new("> ")), None));
            })
            .build()
            .unwrap();
        assert_eq!(render(&layout, log::Level::Info, "a", "hi"), "> hi");
    }

    #[test]
    fn test_build_fails_on_malformed_pattern() {
        assert!(PatternLayout::builder("%msg{").build().is_err());
        assert!(PatternLayout::builder("%(%msg").build().is_err());
    }
}
