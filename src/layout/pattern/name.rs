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

//! The logger-name converter and its abbreviation machinery.

use std::borrow::Cow;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::context::Context;
use crate::layout::pattern::chain::Convert;

const ORIGIN: &str = "PatternLayout";

const CACHE_SIZE: usize = 10_000;

/// Strategy for shortening a hierarchical name to a target length.
///
/// Segments are delimited by `.` or `:`, so both `a.b.C` and Rust's
/// `a::b::C` shapes abbreviate naturally; delimiters are kept verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Abbreviator {
    /// Keeps only the final segment.
    BareName,
    /// Shortens leading segments to their first character, left to right,
    /// until the whole name fits the target length or only the final
    /// segment is left intact.
    TargetLength(usize),
}

impl Abbreviator {
    pub(crate) fn abbreviate(&self, name: &str) -> String {
        match *self {
            Abbreviator::BareName => match name.rfind(['.', ':']) {
                Some(idx) => name[idx + 1..].to_string(),
                None => name.to_string(),
            },
            Abbreviator::TargetLength(target) => shorten_segments(name, target),
        }
    }
}

fn shorten_segments(name: &str, target: usize) -> String {
    let segments = segment_ranges(name);
    if segments.len() <= 1 {
        return name.to_string();
    }

    let mut remaining = name.chars().count();
    let mut out = String::with_capacity(name.len());
    let mut cursor = 0;
    for (i, &(start, end)) in segments.iter().enumerate() {
        out.push_str(&name[cursor..start]);
        let segment = &name[start..end];
        let segment_len = segment.chars().count();
        let last = i + 1 == segments.len();
        if !last && remaining > target && segment_len > 1 {
            match segment.chars().next() {
                Some(first) => out.push(first),
                None => out.push_str(segment),
            }
            remaining -= segment_len - 1;
        } else {
            out.push_str(segment);
        }
        cursor = end;
    }
    out.push_str(&name[cursor..]);
    out
}

/// Byte ranges of the maximal delimiter-free runs in `name`.
fn segment_ranges(name: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = None;
    for (idx, c) in name.char_indices() {
        if c == '.' || c == ':' {
            if let Some(s) = start.take() {
                ranges.push((s, idx));
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        ranges.push((s, name.len()));
    }
    ranges
}

/// Bounded map from full name to abbreviated name.
///
/// Eviction follows insertion order, not access order: once the cache is
/// full, the oldest-inserted entry goes first even if it is read on every
/// event. Deliberately not an LRU.
#[derive(Debug)]
pub(crate) struct NameCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    map: HashMap<String, String>,
    insertions: VecDeque<String>,
}

impl NameCache {
    pub(crate) fn new(capacity: usize) -> Self {
        NameCache {
            capacity,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Returns the cached abbreviation for `name`, computing and storing
    /// it on a miss. The computation runs outside the lock.
    pub(crate) fn get_or_compute(
        &self,
        name: &str,
        compute: impl FnOnce(&str) -> String,
    ) -> String {
        {
            let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = inner.map.get(name) {
                return hit.clone();
            }
        }

        let value = compute(name);

        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(raced) = inner.map.get(name) {
            return raced.clone();
        }
        inner.map.insert(name.to_string(), value.clone());
        inner.insertions.push_back(name.to_string());
        while inner.map.len() > self.capacity {
            if let Some(oldest) = inner.insertions.pop_front() {
                inner.map.remove(&oldest);
            } else {
                break;
            }
        }
        value
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map
            .len()
    }

    #[cfg(test)]
    fn contains(&self, name: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map
            .contains_key(name)
    }
}

/// Renders the logger name (`record.target()`), optionally abbreviated.
///
/// The first option is the abbreviation target length: `0` keeps only the
/// bare final segment, a positive value shortens leading segments until
/// the name fits. A value that does not parse disables abbreviation.
/// Abbreviated results are cached per converter instance.
#[derive(Debug)]
pub(crate) struct LoggerConverter {
    options: Vec<String>,
    abbreviator: Option<Abbreviator>,
    cache: NameCache,
}

impl Default for LoggerConverter {
    fn default() -> Self {
        LoggerConverter {
            options: Vec::new(),
            abbreviator: None,
            cache: NameCache::new(CACHE_SIZE),
        }
    }
}

impl Convert for LoggerConverter {
    fn configure(&mut self, options: Vec<String>) {
        self.options = options;
    }

    fn start(&mut self, ctx: &Context) {
        let Some(first) = self.options.first() else {
            return;
        };
        match first.parse::<i64>() {
            Ok(0) => self.abbreviator = Some(Abbreviator::BareName),
            Ok(target) if target > 0 => {
                self.abbreviator = Some(Abbreviator::TargetLength(target as usize));
            }
            Ok(target) => ctx.status().warn(
                ORIGIN,
                format!("negative abbreviation target {target}, leaving names unabbreviated"),
            ),
            Err(_) => ctx.status().warn(
                ORIGIN,
                format!("unparsable abbreviation target \"{first}\", leaving names unabbreviated"),
            ),
        }
    }

    fn convert<'a>(&'a self, record: &'a log::Record<'_>) -> Cow<'a, str> {
        let name = record.target();
        match &self.abbreviator {
            None => Cow::Borrowed(name),
            Some(abbreviator) => {
                Cow::Owned(self.cache.get_or_compute(name, |n| abbreviator.abbreviate(n)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;

    #[test]
    fn test_bare_name() {
        let abbreviator = Abbreviator::BareName;
        assert_eq!(abbreviator.abbreviate("mainPackage.sub.sample.Bar"), "Bar");
        assert_eq!(abbreviator.abbreviate("hello"), "hello");
        assert_eq!(abbreviator.abbreviate("my_app::server::Worker"), "Worker");
    }

    #[test]
    fn test_target_length_shortens_left_to_right() {
        let abbreviator = Abbreviator::TargetLength(1);
        assert_eq!(abbreviator.abbreviate("mainPackage.sub.sample.Bar"), "m.s.s.Bar");

        let abbreviator = Abbreviator::TargetLength(16);
        assert_eq!(abbreviator.abbreviate("mainPackage.sub.sample.Bar"), "m.sub.sample.Bar");
    }

    #[test]
    fn test_target_length_keeps_short_names() {
        let abbreviator = Abbreviator::TargetLength(100);
        assert_eq!(abbreviator.abbreviate("a.b.C"), "a.b.C");
    }

    #[test]
    fn test_target_length_never_touches_last_segment() {
        let abbreviator = Abbreviator::TargetLength(1);
        assert_eq!(abbreviator.abbreviate("a.b.VeryLongTypeName"), "a.b.VeryLongTypeName");
    }

    #[test]
    fn test_rust_style_paths_keep_delimiters() {
        let abbreviator = Abbreviator::TargetLength(1);
        assert_eq!(abbreviator.abbreviate("my_app::server::Worker"), "m::s::Worker");
    }

    #[test]
    fn test_cache_hits_skip_recomputation() {
        let cache = NameCache::new(16);
        let calls = AtomicUsize::new(0);
        let compute = |name: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            name.to_uppercase()
        };

        let first = cache.get_or_compute("a.b.C", compute);
        let second = cache.get_or_compute("a.b.C", compute);

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_eviction_is_bounded_and_oldest_first() {
        let cache = NameCache::new(3);
        for i in 0..5 {
            let name = format!("name{i}");
            cache.get_or_compute(&name, |n| n.to_string());
            assert!(cache.len() <= 3);
        }
        assert!(!cache.contains("name0"));
        assert!(!cache.contains("name1"));
        assert!(cache.contains("name2"));
        assert!(cache.contains("name3"));
        assert!(cache.contains("name4"));
    }

    #[test]
    fn test_cache_eviction_ignores_access_recency() {
        let cache = NameCache::new(2);
        cache.get_or_compute("old", |n| n.to_string());
        cache.get_or_compute("mid", |n| n.to_string());
        // a read does not refresh "old"
        cache.get_or_compute("old", |n| n.to_string());
        cache.get_or_compute("new", |n| n.to_string());

        assert!(!cache.contains("old"));
        assert!(cache.contains("mid"));
        assert!(cache.contains("new"));
    }
}
