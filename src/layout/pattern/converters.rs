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

//! The built-in converter set backing the default keyword bindings.

use std::borrow::Cow;
use std::fmt::Write;

use jiff::Zoned;
use jiff::tz::TimeZone;

use crate::context::Context;
use crate::layout::pattern::chain::Chain;
use crate::layout::pattern::chain::Convert;
use crate::layout::pattern::chain::ConverterFactory;
use crate::layout::pattern::name::LoggerConverter;

const ORIGIN: &str = "PatternLayout";

pub(crate) fn default_factories() -> Vec<(&'static str, ConverterFactory)> {
    vec![
        ("message", ConverterFactory::simple(|| MessageConverter)),
        ("level", ConverterFactory::simple(|| LevelConverter)),
        ("logger", ConverterFactory::simple(LoggerConverter::default)),
        ("thread", ConverterFactory::simple(|| ThreadConverter)),
        ("date", ConverterFactory::simple(DateConverter::default)),
        ("file", ConverterFactory::simple(|| FileConverter)),
        ("line", ConverterFactory::simple(|| LineConverter)),
        ("newline", ConverterFactory::simple(|| NewlineConverter)),
        ("group", ConverterFactory::composite(GroupConverter::new)),
    ]
}

/// Emits a fixed piece of text.
///
/// Compiled from literal pattern segments, and usable from post-compile
/// processors to splice text into a chain.
#[derive(Debug)]
pub struct LiteralConverter {
    text: String,
}

impl LiteralConverter {
    pub fn new(text: impl Into<String>) -> Self {
        LiteralConverter { text: text.into() }
    }
}

impl Convert for LiteralConverter {
    fn convert<'a>(&'a self, _record: &'a log::Record<'_>) -> Cow<'a, str> {
        Cow::Borrowed(&self.text)
    }
}

#[derive(Debug)]
pub(crate) struct MessageConverter;

impl Convert for MessageConverter {
    fn convert<'a>(&'a self, record: &'a log::Record<'_>) -> Cow<'a, str> {
        match record.args().as_str() {
            Some(text) => Cow::Borrowed(text),
            None => Cow::Owned(record.args().to_string()),
        }
    }
}

#[derive(Debug)]
pub(crate) struct LevelConverter;

impl Convert for LevelConverter {
    fn convert<'a>(&'a self, record: &'a log::Record<'_>) -> Cow<'a, str> {
        Cow::Borrowed(record.level().as_str())
    }
}

#[derive(Debug)]
pub(crate) struct ThreadConverter;

impl Convert for ThreadConverter {
    fn convert<'a>(&'a self, _record: &'a log::Record<'_>) -> Cow<'a, str> {
        let thread = std::thread::current();
        Cow::Owned(thread.name().unwrap_or("unnamed").to_string())
    }
}

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%6f%:z";

/// Renders the event time.
///
/// The first option is a strftime pattern, the second an IANA timezone
/// name. Invalid values are reported and replaced by the defaults.
#[derive(Debug, Default)]
pub(crate) struct DateConverter {
    options: Vec<String>,
    format: Option<String>,
    tz: Option<TimeZone>,
}

impl Convert for DateConverter {
    fn configure(&mut self, options: Vec<String>) {
        self.options = options;
    }

    fn start(&mut self, ctx: &Context) {
        if let Some(format) = self.options.first().filter(|f| !f.is_empty()) {
            let mut probe = String::new();
            if write!(probe, "{}", Zoned::now().strftime(format)).is_ok() {
                self.format = Some(format.clone());
            } else {
                ctx.status().warn(
                    ORIGIN,
                    format!("invalid date format \"{format}\", using the default"),
                );
            }
        }
        if let Some(name) = self.options.get(1).filter(|n| !n.is_empty()) {
            match TimeZone::get(name) {
                Ok(tz) => self.tz = Some(tz),
                Err(err) => ctx.status().warn(
                    ORIGIN,
                    format!("unknown timezone \"{name}\", using the system timezone: {err}"),
                ),
            }
        }
    }

    fn convert<'a>(&'a self, _record: &'a log::Record<'_>) -> Cow<'a, str> {
        let time = match self.tz.clone() {
            Some(tz) => Zoned::now().with_time_zone(tz),
            None => Zoned::now(),
        };
        let format = self.format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT);
        let mut out = String::new();
        if write!(out, "{}", time.strftime(format)).is_err() {
            out.clear();
            out.push_str(&time.to_string());
        }
        Cow::Owned(out)
    }
}

#[derive(Debug)]
pub(crate) struct FileConverter;

impl Convert for FileConverter {
    fn convert<'a>(&'a self, record: &'a log::Record<'_>) -> Cow<'a, str> {
        Cow::Borrowed(record.file().unwrap_or_default())
    }
}

#[derive(Debug)]
pub(crate) struct LineConverter;

impl Convert for LineConverter {
    fn convert<'a>(&'a self, record: &'a log::Record<'_>) -> Cow<'a, str> {
        match record.line() {
            Some(line) => Cow::Owned(line.to_string()),
            None => Cow::Borrowed(""),
        }
    }
}

#[derive(Debug)]
pub(crate) struct NewlineConverter;

impl Convert for NewlineConverter {
    fn convert<'a>(&'a self, _record: &'a log::Record<'_>) -> Cow<'a, str> {
        Cow::Borrowed("\n")
    }
}

/// Renders a compiled sub-pattern, so a format modifier can pad or
/// truncate the grouped output as a whole.
#[derive(Debug)]
pub(crate) struct GroupConverter {
    children: Chain,
}

impl GroupConverter {
    pub(crate) fn new(children: Chain) -> Self {
        GroupConverter { children }
    }
}

impl Convert for GroupConverter {
    fn start(&mut self, ctx: &Context) {
        self.children.start_all(ctx);
    }

    fn convert<'a>(&'a self, record: &'a log::Record<'_>) -> Cow<'a, str> {
        let mut buf = String::with_capacity(128);
        self.children.write_to(record, &mut buf);
        Cow::Owned(buf)
    }
}
