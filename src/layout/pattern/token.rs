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

/// One lexical unit of a pattern string.
///
/// Punctuation and end-of-input are payload-free variants, so handing them
/// around allocates nothing. Equality and hashing cover both the token kind
/// and its payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Token {
    /// A verbatim run of text, escapes already resolved.
    Literal(String),
    /// The `%` that opens a conversion.
    Percent,
    /// The raw text of a width/justification/truncation modifier, e.g. `-20.30`.
    FormatModifier(String),
    /// A conversion keyword, e.g. `level`.
    Keyword(String),
    /// The options of a `{...}` block, comma-split and trimmed.
    Options(Vec<String>),
    /// `(` opening a sub-pattern.
    LeftParen,
    /// `)` closing a sub-pattern.
    RightParen,
    /// End of the pattern.
    Eof,
}
