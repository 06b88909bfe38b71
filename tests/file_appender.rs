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

use std::collections::HashSet;
use std::fs;
use std::thread;

use logloom::Append;
use logloom::append::FileAppender;
use logloom::layout::PatternLayout;
use rand::Rng;
use rand::distr::Alphanumeric;
use tempfile::TempDir;

fn message_only() -> PatternLayout {
    PatternLayout::builder("%msg").build().unwrap()
}

fn append_line(appender: &FileAppender, line: &str) {
    appender
        .append(
            &log::Record::builder()
                .args(format_args!("{line}"))
                .level(log::Level::Info)
                .build(),
        )
        .unwrap();
}

#[test]
fn test_append_mode_preserves_content_across_restarts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");

    let appender = FileAppender::builder()
        .path(path.to_string_lossy())
        .layout(message_only())
        .build();

    appender.start().unwrap();
    append_line(&appender, "one");
    appender.stop();

    appender.start().unwrap();
    append_line(&appender, "two");
    appender.stop();

    assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
}

#[test]
fn test_truncate_mode_empties_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    fs::write(&path, "stale content\n").unwrap();

    let appender = FileAppender::builder()
        .path(path.to_string_lossy())
        .append(false)
        .layout(message_only())
        .build();

    appender.start().unwrap();
    append_line(&appender, "fresh");
    appender.stop();

    assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
}

#[test]
fn test_path_is_trimmed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trimmed.log");

    let appender = FileAppender::builder()
        .path(format!("  {}  ", path.display()))
        .layout(message_only())
        .build();

    appender.start().unwrap();
    append_line(&appender, "x");
    appender.stop();

    assert!(path.exists());
}

#[test]
fn test_two_prudent_appenders_interleave_whole_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shared.log");
    let lines_per_writer = 200;

    let mut payload = String::new();
    let mut rng = rand::rng();
    for _ in 0..32 {
        payload.push(rng.sample(Alphanumeric) as char);
    }

    let writers: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|tag| {
            let appender = FileAppender::builder()
                .path(path.to_string_lossy())
                .prudent(true)
                .layout(message_only())
                .build();
            appender.start().unwrap();
            (tag, appender)
        })
        .collect();

    let handles: Vec<_> = writers
        .into_iter()
        .map(|(tag, appender)| {
            let payload = payload.clone();
            thread::spawn(move || {
                for i in 0..lines_per_writer {
                    append_line(&appender, &format!("{tag}-{i:04}-{payload}"));
                }
                appender.stop();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.ends_with('\n'));
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2 * lines_per_writer);

    // every expected line came through exactly once, none torn
    let unique: HashSet<&str> = lines.iter().copied().collect();
    assert_eq!(unique.len(), lines.len());
    for tag in ["a", "b"] {
        for i in 0..lines_per_writer {
            let expected = format!("{tag}-{i:04}-{payload}");
            assert!(unique.contains(expected.as_str()), "missing line {expected}");
        }
    }
}

#[test]
fn test_prudent_appender_tracks_external_growth() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shared.log");

    let appender = FileAppender::builder()
        .path(path.to_string_lossy())
        .prudent(true)
        .layout(message_only())
        .build();
    appender.start().unwrap();
    append_line(&appender, "ours-1");

    // another process extends the file behind our back
    let mut external = fs::OpenOptions::new().append(true).open(&path).unwrap();
    std::io::Write::write_all(&mut external, b"theirs\n").unwrap();
    drop(external);

    append_line(&appender, "ours-2");
    appender.stop();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "ours-1\ntheirs\nours-2\n"
    );
}
