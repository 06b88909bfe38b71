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

use crate::error::ParseError;
use crate::error::PatternError;
use crate::layout::pattern::format::FormatDirective;
use crate::layout::pattern::lexer::Lexer;
use crate::layout::pattern::token::Token;

/// One parsed unit of a pattern, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Literal(String),
    Conversion {
        keyword: String,
        format: Option<FormatDirective>,
        options: Vec<String>,
    },
    /// A conversion wrapping a parenthesized sub-pattern. The bare group
    /// `%(...)` carries an empty keyword.
    Composite {
        keyword: String,
        format: Option<FormatDirective>,
        children: Vec<Node>,
        options: Vec<String>,
    },
}

/// Parses a pattern string into its node sequence.
pub(crate) fn parse(pattern: &str) -> Result<Vec<Node>, PatternError> {
    let tokens = Lexer::new(pattern).tokenize()?;
    let mut parser = Parser { tokens, pos: 0 };
    let nodes = parser.sequence(false)?;
    Ok(nodes)
}

/// Recursive descent over the token stream, one token of lookahead.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn current(&self) -> &Token {
        // the lexer always terminates the stream with Eof
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn sequence(&mut self, nested: bool) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        loop {
            match self.current() {
                Token::Literal(text) => {
                    nodes.push(Node::Literal(text.clone()));
                    self.pos += 1;
                }
                Token::Percent => {
                    self.pos += 1;
                    nodes.push(self.conversion()?);
                }
                Token::RightParen if nested => return Ok(nodes),
                Token::RightParen => Err(ParseError::new("unmatched ')'"))?,
                Token::Eof if nested => {
                    Err(ParseError::new("expecting ')' to close the sub-pattern"))?
                }
                Token::Eof => return Ok(nodes),
                token => Err(ParseError::new(format!("unexpected token {token:?}")))?,
            }
        }
    }

    fn conversion(&mut self) -> Result<Node, ParseError> {
        let format = match self.current() {
            Token::FormatModifier(text) => {
                let directive = FormatDirective::parse(text)?;
                self.pos += 1;
                Some(directive)
            }
            _ => None,
        };

        match self.current().clone() {
            Token::Keyword(keyword) => {
                self.pos += 1;
                if matches!(self.current(), Token::LeftParen) {
                    self.pos += 1;
                    let children = self.sequence(true)?;
                    self.expect_right_paren(&keyword)?;
                    let options = self.options();
                    Ok(Node::Composite {
                        keyword,
                        format,
                        children,
                        options,
                    })
                } else {
                    let options = self.options();
                    Ok(Node::Conversion {
                        keyword,
                        format,
                        options,
                    })
                }
            }
            Token::LeftParen => {
                self.pos += 1;
                let children = self.sequence(true)?;
                self.expect_right_paren("(")?;
                let options = self.options();
                Ok(Node::Composite {
                    keyword: String::new(),
                    format,
                    children,
                    options,
                })
            }
            _ => Err(ParseError::new(
                "expecting a conversion keyword or '(' after '%'",
            )),
        }
    }

    fn expect_right_paren(&mut self, opened_by: &str) -> Result<(), ParseError> {
        if matches!(self.current(), Token::RightParen) {
            self.pos += 1;
            Ok(())
        } else {
            Err(ParseError::new(format!(
                "unmatched '(' in conversion \"{opened_by}\""
            )))
        }
    }

    fn options(&mut self) -> Vec<String> {
        if let Token::Options(options) = self.current() {
            let options = options.clone();
            self.pos += 1;
            options
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversion(keyword: &str) -> Node {
        Node::Conversion {
            keyword: keyword.to_string(),
            format: None,
            options: vec![],
        }
    }

    #[test]
    fn test_literal_and_conversion() {
        let nodes = parse("hi %level").unwrap();
        assert_eq!(
            nodes,
            vec![Node::Literal("hi ".to_string()), conversion("level")]
        );
    }

    #[test]
    fn test_conversion_with_modifier_and_options() {
        let nodes = parse("%-5level%logger{36}").unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Conversion {
                    keyword: "level".to_string(),
                    format: Some(FormatDirective {
                        min: Some(5),
                        max: None,
                        left_align: true,
                        truncate_from_start: true,
                    }),
                    options: vec![],
                },
                Node::Conversion {
                    keyword: "logger".to_string(),
                    format: None,
                    options: vec!["36".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_bare_group() {
        let nodes = parse("%-12(%level %msg)").unwrap();
        match &nodes[0] {
            Node::Composite {
                keyword,
                format,
                children,
                options,
            } => {
                assert!(keyword.is_empty());
                assert_eq!(
                    *format,
                    Some(FormatDirective {
                        min: Some(12),
                        max: None,
                        left_align: true,
                        truncate_from_start: true,
                    })
                );
                assert_eq!(children.len(), 3);
                assert!(options.is_empty());
            }
            node => panic!("expected a composite node, got {node:?}"),
        }
    }

    #[test]
    fn test_named_composite_with_options() {
        let nodes = parse("%wrap(%msg){x, y}").unwrap();
        match &nodes[0] {
            Node::Composite {
                keyword,
                children,
                options,
                ..
            } => {
                assert_eq!(keyword, "wrap");
                assert_eq!(children, &vec![conversion("msg")]);
                assert_eq!(options, &vec!["x".to_string(), "y".to_string()]);
            }
            node => panic!("expected a composite node, got {node:?}"),
        }
    }

    #[test]
    fn test_nested_groups() {
        let nodes = parse("%(%level %( %msg))").unwrap();
        let Node::Composite { children, .. } = &nodes[0] else {
            panic!("expected a composite node");
        };
        assert!(matches!(children[2], Node::Composite { .. }));
    }

    #[test]
    fn test_percent_at_end_fails() {
        let err = parse("hello %").unwrap_err();
        assert!(err.to_string().contains("after '%'"));
    }

    #[test]
    fn test_percent_before_space_fails() {
        let err = parse("% x").unwrap_err();
        assert!(err.to_string().contains("after '%'"));
    }

    #[test]
    fn test_unmatched_open_paren_fails() {
        let err = parse("%(%msg").unwrap_err();
        assert!(err.to_string().contains("')'"));
    }

    #[test]
    fn test_stray_close_paren_fails() {
        let err = parse("a)b").unwrap_err();
        assert!(err.to_string().contains("unmatched ')'"));
    }

    #[test]
    fn test_scan_error_surfaces() {
        let err = parse("%logger{36").unwrap_err();
        assert!(matches!(err, PatternError::Scan(_)));
    }
}
