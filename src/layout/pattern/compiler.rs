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

use std::collections::HashMap;

use crate::context::Context;
use crate::layout::pattern::chain::Chain;
use crate::layout::pattern::chain::ChainLink;
use crate::layout::pattern::chain::Convert;
use crate::layout::pattern::chain::ConverterFactory;
use crate::layout::pattern::converters::LiteralConverter;
use crate::layout::pattern::parser::Node;

const ORIGIN: &str = "PatternLayout";

/// Framework bindings from conversion keyword to handler name. The empty
/// keyword is the bare group `%(...)`.
pub(crate) const DEFAULT_RULES: &[(&str, &str)] = &[
    ("m", "message"),
    ("msg", "message"),
    ("message", "message"),
    ("p", "level"),
    ("le", "level"),
    ("level", "level"),
    ("c", "logger"),
    ("lo", "logger"),
    ("logger", "logger"),
    ("t", "thread"),
    ("thread", "thread"),
    ("d", "date"),
    ("date", "date"),
    ("F", "file"),
    ("file", "file"),
    ("L", "line"),
    ("line", "line"),
    ("n", "newline"),
    ("", "group"),
];

/// Overlays the three rule layers, last writer wins:
/// defaults < process-wide registry < instance overrides.
pub(crate) fn effective_rules(
    default: &[(&str, &str)],
    registry: HashMap<String, String>,
    instance: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut effective: HashMap<String, String> = default
        .iter()
        .map(|(keyword, handler)| (keyword.to_string(), handler.to_string()))
        .collect();
    effective.extend(registry);
    effective.extend(
        instance
            .iter()
            .map(|(keyword, handler)| (keyword.clone(), handler.clone())),
    );
    effective
}

/// Turns a parsed node sequence into a renderer chain.
///
/// The effective rule map is computed per compiler instance, so every
/// compile observes the current registry state.
pub(crate) struct Compiler<'a> {
    ctx: &'a Context,
    rules: HashMap<String, String>,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(ctx: &'a Context, instance_rules: &HashMap<String, String>) -> Self {
        let rules = effective_rules(DEFAULT_RULES, ctx.rules_snapshot(), instance_rules);
        Compiler { ctx, rules }
    }

    pub(crate) fn compile(&self, nodes: Vec<Node>) -> Chain {
        let mut chain = Chain::default();
        for node in nodes {
            chain.push(self.link(node));
        }
        chain
    }

    fn link(&self, node: Node) -> ChainLink {
        match node {
            Node::Literal(text) => ChainLink::new(Box::new(LiteralConverter::new(text)), None),
            Node::Conversion {
                keyword,
                format,
                options,
            } => match self.instantiate(&keyword, None) {
                Some(mut converter) => {
                    converter.configure(options);
                    ChainLink::new(converter, format)
                }
                None => fallback(&keyword),
            },
            Node::Composite {
                keyword,
                format,
                children,
                options,
            } => {
                let children = self.compile(children);
                match self.instantiate(&keyword, Some(children)) {
                    Some(mut converter) => {
                        converter.configure(options);
                        ChainLink::new(converter, format)
                    }
                    None => fallback(&keyword),
                }
            }
        }
    }

    fn instantiate(&self, keyword: &str, children: Option<Chain>) -> Option<Box<dyn Convert>> {
        let Some(handler) = self.rules.get(keyword) else {
            self.ctx.status().warn(
                ORIGIN,
                format!("no applicable rule for conversion keyword \"{keyword}\""),
            );
            return None;
        };
        let Some(factory) = self.ctx.factory(handler) else {
            self.ctx.status().warn(
                ORIGIN,
                format!("no converter registered under \"{handler}\" for keyword \"{keyword}\""),
            );
            return None;
        };
        match (factory, children) {
            (ConverterFactory::Simple(make), None) => Some(make()),
            (ConverterFactory::Composite(make), Some(children)) => Some(make(children)),
            (ConverterFactory::Simple(_), Some(_)) => {
                self.ctx.status().warn(
                    ORIGIN,
                    format!("conversion keyword \"{keyword}\" does not accept a sub-pattern"),
                );
                None
            }
            (ConverterFactory::Composite(_), None) => {
                self.ctx.status().warn(
                    ORIGIN,
                    format!("conversion keyword \"{keyword}\" requires a sub-pattern"),
                );
                None
            }
        }
    }
}

/// A recognizable stand-in so one bad keyword degrades a single position
/// instead of losing the whole pattern.
fn fallback(keyword: &str) -> ChainLink {
    let marker = format!("%PARSER_ERROR[{keyword}]");
    ChainLink::new(Box::new(LiteralConverter::new(marker)), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_effective_rules_precedence() {
        let default = &[("m", "message"), ("p", "level")][..];
        let registry = map(&[("p", "priority"), ("x", "extra")]);
        let instance = map(&[("x", "local"), ("y", "mine")]);

        let effective = effective_rules(default, registry, &instance);

        assert_eq!(effective.get("m").map(String::as_str), Some("message"));
        assert_eq!(effective.get("p").map(String::as_str), Some("priority"));
        assert_eq!(effective.get("x").map(String::as_str), Some("local"));
        assert_eq!(effective.get("y").map(String::as_str), Some("mine"));
    }

    #[test]
    fn test_effective_rules_recomputed_fresh() {
        let effective = effective_rules(DEFAULT_RULES, HashMap::new(), &HashMap::new());
        assert_eq!(effective.get("msg").map(String::as_str), Some("message"));
        assert_eq!(effective.get(""), Some(&"group".to_string()));
    }

    #[test]
    fn test_unknown_keyword_installs_marker() {
        let ctx = Context::new();
        let compiler = Compiler::new(&ctx, &HashMap::new());
        let chain = compiler.compile(vec![Node::Conversion {
            keyword: "bogus".to_string(),
            format: None,
            options: vec![],
        }]);
        assert_eq!(chain.len(), 1);

        let mut buf = String::new();
        chain.write_to(
            &log::Record::builder()
                .args(format_args!("x"))
                .level(log::Level::Info)
                .build(),
            &mut buf,
        );
        assert_eq!(buf, "%PARSER_ERROR[bogus]");
    }
}
