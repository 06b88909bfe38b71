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

use crate::error::ScanError;
use crate::layout::pattern::token::Token;

/// Single-pass scanner for the pattern mini-language.
///
/// Produces tokens in source order, terminated by [`Token::Eof`]. The scan
/// only fails on an unterminated `{...}` option block or a malformed format
/// modifier; any character without a lexical role is literal text.
pub(crate) struct Lexer {
    chars: Vec<char>,
}

impl Lexer {
    pub(crate) fn new(pattern: &str) -> Self {
        Lexer {
            chars: pattern.chars().collect(),
        }
    }

    pub(crate) fn tokenize(self) -> Result<Vec<Token>, ScanError> {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let n = self.chars.len();
        let mut i = 0;

        while i < n {
            match self.chars[i] {
                '\\' => {
                    i += 1;
                    if i < n {
                        literal.push(unescape(self.chars[i]));
                        i += 1;
                    } else {
                        // trailing lone backslash stays verbatim
                        literal.push('\\');
                    }
                }
                ')' => {
                    flush_literal(&mut tokens, &mut literal);
                    tokens.push(Token::RightParen);
                    i += 1;
                    if i < n && self.chars[i] == '{' {
                        let (options, next) = self.scan_options(i)?;
                        tokens.push(Token::Options(options));
                        i = next;
                    }
                }
                '%' => {
                    flush_literal(&mut tokens, &mut literal);
                    tokens.push(Token::Percent);
                    i += 1;

                    let modifier_start = i;
                    while i < n && matches!(self.chars[i], '-' | '.' | '0'..='9') {
                        i += 1;
                    }
                    if i > modifier_start {
                        let modifier: String = self.chars[modifier_start..i].iter().collect();
                        if !well_formed_modifier(&modifier) {
                            return Err(ScanError::new(
                                format!("malformed format modifier \"{modifier}\""),
                                modifier_start,
                            ));
                        }
                        tokens.push(Token::FormatModifier(modifier));
                    }

                    if i < n && self.chars[i] == '(' {
                        tokens.push(Token::LeftParen);
                        i += 1;
                        continue;
                    }

                    let keyword_start = i;
                    while i < n && is_keyword_char(self.chars[i]) {
                        i += 1;
                    }
                    if i > keyword_start {
                        let keyword: String = self.chars[keyword_start..i].iter().collect();
                        tokens.push(Token::Keyword(keyword));
                        if i < n && self.chars[i] == '(' {
                            tokens.push(Token::LeftParen);
                            i += 1;
                        } else if i < n && self.chars[i] == '{' {
                            let (options, next) = self.scan_options(i)?;
                            tokens.push(Token::Options(options));
                            i = next;
                        }
                    }
                    // a dangling '%' falls through to the parser, which
                    // rejects it with a ParseError
                }
                c => {
                    literal.push(c);
                    i += 1;
                }
            }
        }

        flush_literal(&mut tokens, &mut literal);
        tokens.push(Token::Eof);
        Ok(tokens)
    }

    /// Scans a `{...}` block starting at the `{` in position `at`.
    /// Returns the trimmed options and the index after the closing `}`.
    fn scan_options(&self, at: usize) -> Result<(Vec<String>, usize), ScanError> {
        let n = self.chars.len();
        let mut raw = String::new();
        let mut j = at + 1;
        while j < n {
            let c = self.chars[j];
            if c == '}' {
                return Ok((split_options(&raw), j + 1));
            }
            raw.push(c);
            j += 1;
        }
        Err(ScanError::new("unterminated option block", at))
    }
}

fn flush_literal(tokens: &mut Vec<Token>, literal: &mut String) {
    if !literal.is_empty() {
        tokens.push(Token::Literal(std::mem::take(literal)));
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }
}

fn is_keyword_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn split_options(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|opt| opt.trim().to_string()).collect()
}

/// Accepts `-? digits ('.' '-'? digits)?` with either side of the dot
/// optional, but never both absent.
fn well_formed_modifier(s: &str) -> bool {
    fn digits(part: &str) -> bool {
        let part = part.strip_prefix('-').unwrap_or(part);
        !part.is_empty() && part.chars().all(|c| c.is_ascii_digit())
    }

    match s.split_once('.') {
        Some((min, max)) => (min.is_empty() || digits(min)) && digits(max),
        None => digits(s),
    }
}
