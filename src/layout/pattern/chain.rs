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

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::layout::pattern::format::FormatDirective;

/// A compiled renderer for one conversion word.
///
/// Implementations must tolerate concurrent `convert` calls: after the
/// chain is started it is shared across all logging threads, so any
/// per-converter mutable state has to synchronize internally.
pub trait Convert: fmt::Debug + Send + Sync + 'static {
    /// Receives the `{...}` option list attached to the conversion word.
    ///
    /// Runs during compilation, before [`Convert::start`].
    fn configure(&mut self, options: Vec<String>) {
        let _ = options;
    }

    /// Runs once after the whole chain is assembled.
    ///
    /// Converters must not rely on the start order of other links.
    fn start(&mut self, ctx: &Context) {
        let _ = ctx;
    }

    /// Produces the text for one log record.
    fn convert<'a>(&'a self, record: &'a log::Record<'_>) -> Cow<'a, str>;
}

/// Constructor for [`Convert`] instances, registered under a handler name.
#[derive(Clone)]
pub enum ConverterFactory {
    /// Builds a plain converter.
    Simple(Arc<dyn Fn() -> Box<dyn Convert> + Send + Sync>),
    /// Builds a converter around a compiled sub-pattern.
    Composite(Arc<dyn Fn(Chain) -> Box<dyn Convert> + Send + Sync>),
}

impl ConverterFactory {
    /// Wraps a plain constructor.
    ///
    /// # Examples
    ///
    /// ```
    /// use logloom::layout::pattern::ConverterFactory;
    /// use logloom::layout::pattern::LiteralConverter;
    ///
    /// let factory = ConverterFactory::simple(|| LiteralConverter::new("~"));
    /// ```
    pub fn simple<F, C>(make: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Convert,
    {
        ConverterFactory::Simple(Arc::new(move || Box::new(make())))
    }

    /// Wraps a constructor that consumes the compiled sub-pattern.
    pub fn composite<F, C>(make: F) -> Self
    where
        F: Fn(Chain) -> C + Send + Sync + 'static,
        C: Convert,
    {
        ConverterFactory::Composite(Arc::new(move |chain| Box::new(make(chain))))
    }
}

impl fmt::Debug for ConverterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConverterFactory::Simple(_) => f.write_str("ConverterFactory::Simple(..)"),
            ConverterFactory::Composite(_) => f.write_str("ConverterFactory::Composite(..)"),
        }
    }
}

/// One position in a compiled chain: a converter plus the format modifier
/// applied to its output.
#[derive(Debug)]
pub struct ChainLink {
    converter: Box<dyn Convert>,
    format: Option<FormatDirective>,
}

impl ChainLink {
    pub fn new(converter: Box<dyn Convert>, format: Option<FormatDirective>) -> Self {
        ChainLink { converter, format }
    }

    pub(crate) fn write_to(&self, record: &log::Record<'_>, buf: &mut String) {
        let text = self.converter.convert(record);
        match &self.format {
            Some(directive) => directive.write(buf, &text),
            None => buf.push_str(&text),
        }
    }

    pub(crate) fn start(&mut self, ctx: &Context) {
        self.converter.start(ctx);
    }
}

/// The ordered sequence of renderers compiled from one pattern.
///
/// Immutable once started; a layout swaps in a freshly compiled chain
/// instead of mutating a running one.
#[derive(Debug, Default)]
pub struct Chain {
    links: Vec<ChainLink>,
}

impl Chain {
    pub fn push(&mut self, link: ChainLink) {
        self.links.push(link);
    }

    /// Mutable access for post-compile processors.
    pub fn links_mut(&mut self) -> &mut Vec<ChainLink> {
        &mut self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub(crate) fn write_to(&self, record: &log::Record<'_>, buf: &mut String) {
        for link in &self.links {
            link.write_to(record, buf);
        }
    }

    pub(crate) fn start_all(&mut self, ctx: &Context) {
        for link in &mut self.links {
            link.start(ctx);
        }
    }
}
