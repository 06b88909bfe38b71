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

/// Width, justification and truncation attached to a conversion word.
///
/// `%-20.30logger` parses into minimum width 20, left justified, maximum
/// width 30. A plain maximum truncates from the start (the tail of a long
/// name is usually the interesting part); `%.-30msg` keeps the head
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDirective {
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub left_align: bool,
    pub truncate_from_start: bool,
}

impl FormatDirective {
    /// Parses the raw modifier text, shape-checked by the lexer.
    pub(crate) fn parse(text: &str) -> Result<FormatDirective, ParseError> {
        let (min_part, max_part) = match text.split_once('.') {
            Some((min, max)) => (min, Some(max)),
            None => (text, None),
        };

        let left_align = min_part.starts_with('-');
        let min = parse_width(min_part.strip_prefix('-').unwrap_or(min_part), text)?;

        let mut truncate_from_start = true;
        let max = match max_part {
            Some(part) => {
                truncate_from_start = !part.starts_with('-');
                parse_width(part.strip_prefix('-').unwrap_or(part), text)?
            }
            None => None,
        };

        Ok(FormatDirective {
            min,
            max,
            left_align,
            truncate_from_start,
        })
    }

    /// Applies truncation then padding, appending the result to `buf`.
    pub(crate) fn write(&self, buf: &mut String, text: &str) {
        let text = self.truncated(text);
        match self.min {
            Some(width) if self.left_align => right_pad(buf, Some(text), width),
            Some(width) => left_pad(buf, Some(text), width),
            None => buf.push_str(text),
        }
    }

    fn truncated<'t>(&self, text: &'t str) -> &'t str {
        let Some(max) = self.max else {
            return text;
        };
        let count = text.chars().count();
        if count <= max {
            return text;
        }
        if self.truncate_from_start {
            match text.char_indices().nth(count - max) {
                Some((idx, _)) => &text[idx..],
                None => text,
            }
        } else {
            match text.char_indices().nth(max) {
                Some((idx, _)) => &text[..idx],
                None => text,
            }
        }
    }
}

fn parse_width(digits: &str, modifier: &str) -> Result<Option<usize>, ParseError> {
    if digits.is_empty() {
        return Ok(None);
    }
    digits
        .parse::<usize>()
        .map(Some)
        .map_err(|_| ParseError::new(format!("format modifier \"{modifier}\" width out of range")))
}

/// Appends `text` to `buf`, padded with leading spaces up to `width`.
/// Text wider than `width` is appended unchanged.
pub(crate) fn left_pad(buf: &mut String, text: Option<&str>, width: usize) {
    let len = text.map_or(0, |t| t.chars().count());
    if len < width {
        buf.extend(std::iter::repeat_n(' ', width - len));
    }
    if let Some(text) = text {
        buf.push_str(text);
    }
}

/// Appends `text` to `buf`, padded with trailing spaces up to `width`.
pub(crate) fn right_pad(buf: &mut String, text: Option<&str>, width: usize) {
    let len = text.map_or(0, |t| t.chars().count());
    if let Some(text) = text {
        buf.push_str(text);
    }
    if len < width {
        buf.extend(std::iter::repeat_n(' ', width - len));
    }
}
