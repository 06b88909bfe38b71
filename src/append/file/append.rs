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

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::BufWriter;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::PoisonError;

use fs2::FileExt;

use crate::append::Append;
use crate::layout::Layout;
use crate::layout::PatternLayout;
use crate::status::StatusHandle;

const ORIGIN: &str = "FileAppender";

const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// A builder to configure and create a [`FileAppender`].
#[derive(Debug)]
pub struct FileAppenderBuilder {
    path: Option<String>,
    append: bool,
    buffered_io: bool,
    buffer_size: usize,
    prudent: bool,
    layout: Box<dyn Layout>,
    status: StatusHandle,
}

impl Default for FileAppenderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FileAppenderBuilder {
    pub fn new() -> Self {
        FileAppenderBuilder {
            path: None,
            append: true,
            buffered_io: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
            prudent: false,
            layout: Box::new(PatternLayout::default()),
            status: StatusHandle::default(),
        }
    }

    /// Sets the destination file. Surrounding whitespace is trimmed.
    ///
    /// Without a path the appender refuses to start.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into().trim().to_string());
        self
    }

    /// Append to an existing file instead of truncating it on start.
    ///
    /// Default to `true`.
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Routes writes through a fixed-size buffer, trading durability of
    /// the last lines for fewer syscalls.
    ///
    /// Default to `false`.
    pub fn buffered_io(mut self, buffered_io: bool) -> Self {
        self.buffered_io = buffered_io;
        self
    }

    /// Sets the buffer size in bytes used when buffered IO is enabled.
    ///
    /// Default to 8192.
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Makes appends safe across multiple processes sharing the file.
    ///
    /// Prudent mode forces append mode and unbuffered, flushed writes;
    /// each write then holds an exclusive advisory lock while it reseeks
    /// to the current end of file.
    ///
    /// Default to `false`.
    pub fn prudent(mut self, prudent: bool) -> Self {
        self.prudent = prudent;
        self
    }

    /// Sets the layout for the logs.
    ///
    /// Default to [`PatternLayout`] with the stock pattern.
    pub fn layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Sets the status sink misconfigurations and write failures are
    /// reported to.
    pub fn status(mut self, status: StatusHandle) -> Self {
        self.status = status;
        self
    }

    /// Builds the appender in the stopped state. Call
    /// [`FileAppender::start`] to open the file.
    pub fn build(self) -> FileAppender {
        FileAppender {
            path: self.path,
            append: self.append,
            buffered_io: self.buffered_io,
            buffer_size: self.buffer_size,
            prudent: self.prudent,
            layout: self.layout,
            status: self.status,
            state: Mutex::new(SinkState::Stopped),
        }
    }
}

/// An appender that writes log records to a file.
///
/// The appender is a state machine: built stopped, opened by
/// [`start`](FileAppender::start), closed by [`stop`](FileAppender::stop).
/// Records appended while stopped are dropped with a warning. A failed
/// write is reported to the status sink and does not stop the appender;
/// the next record is attempted normally.
#[derive(Debug)]
pub struct FileAppender {
    path: Option<String>,
    append: bool,
    buffered_io: bool,
    buffer_size: usize,
    prudent: bool,
    layout: Box<dyn Layout>,
    status: StatusHandle,
    state: Mutex<SinkState>,
}

#[derive(Debug)]
enum SinkState {
    Stopped,
    Started(SinkWriter),
}

#[derive(Debug)]
enum SinkWriter {
    Plain(File),
    Buffered(BufWriter<File>),
    Prudent(File),
}

impl FileAppender {
    /// Creates a builder.
    pub fn builder() -> FileAppenderBuilder {
        FileAppenderBuilder::new()
    }

    /// Opens the destination file and enters the started state.
    ///
    /// A missing destination path or a failure to open the file leaves
    /// the appender stopped. A failure to create parent directories is
    /// reported but start proceeds best-effort; the open then decides.
    /// Starting a started appender flushes and reopens.
    ///
    /// # Errors
    ///
    /// Returns an error if no path is configured or the file cannot be
    /// opened.
    pub fn start(&self) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let SinkState::Started(writer) = &mut *state {
            self.status
                .info(ORIGIN, "start called on a started file appender, reopening");
            let _ = writer.flush();
            *state = SinkState::Stopped;
        }

        let Some(path) = self.path.as_deref().filter(|p| !p.is_empty()) else {
            self.status
                .error(ORIGIN, "no destination path configured, refusing to start");
            anyhow::bail!("no destination path configured for file appender");
        };

        let (append, buffered_io) = self.effective_modes();

        let path = Path::new(path);
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.exists() {
                if let Err(err) = fs::create_dir_all(dir) {
                    self.status.error_with(
                        ORIGIN,
                        format!("failed to create parent directory {}", dir.display()),
                        err.into(),
                    );
                }
            }
        }

        let file = match open_file(path, append) {
            Ok(file) => file,
            Err(err) => {
                self.status.error_with(
                    ORIGIN,
                    format!("failed to open {}", path.display()),
                    anyhow::Error::new(err),
                );
                anyhow::bail!("failed to open log file {}", path.display());
            }
        };

        let writer = if self.prudent {
            SinkWriter::Prudent(file)
        } else if buffered_io {
            SinkWriter::Buffered(BufWriter::with_capacity(self.buffer_size, file))
        } else {
            SinkWriter::Plain(file)
        };
        *state = SinkState::Started(writer);
        self.status
            .info(ORIGIN, format!("started on {}", path.display()));
        Ok(())
    }

    /// Flushes pending output and closes the file.
    pub fn stop(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let SinkState::Started(writer) = &mut *state {
            if let Err(err) = writer.flush() {
                self.status
                    .error_with(ORIGIN, "failed to flush on stop", err.into());
            }
        }
        *state = SinkState::Stopped;
    }

    /// Whether the appender currently holds an open file.
    pub fn is_started(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            SinkState::Started(_)
        )
    }

    /// Resolves the modes actually used for the open, reporting every
    /// value overridden on account of prudent mode or buffering.
    fn effective_modes(&self) -> (bool, bool) {
        if self.prudent {
            if !self.append {
                self.status.warn(
                    ORIGIN,
                    "setting \"append\" to true on account of \"prudent\" mode",
                );
            }
            if self.buffered_io {
                self.status.warn(
                    ORIGIN,
                    "setting \"buffered_io\" to false on account of \"prudent\" mode",
                );
            }
            (true, false)
        } else {
            if self.buffered_io {
                self.status.info(
                    ORIGIN,
                    "buffered IO enabled, records are flushed on stop or explicit flush",
                );
            }
            (self.append, self.buffered_io)
        }
    }
}

fn open_file(path: &Path, append: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options.open(path)
}

impl SinkWriter {
    fn write_record(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            SinkWriter::Plain(file) => {
                file.write_all(bytes)?;
                file.flush()
            }
            SinkWriter::Buffered(writer) => writer.write_all(bytes),
            SinkWriter::Prudent(file) => prudent_write(file, bytes),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            SinkWriter::Plain(file) => file.flush(),
            SinkWriter::Buffered(writer) => writer.flush(),
            SinkWriter::Prudent(file) => file.flush(),
        }
    }
}

/// Appends under an exclusive advisory lock, reseeking to the current end
/// of file first in case another process extended it. The lock is
/// released on every exit path.
fn prudent_write(file: &mut File, bytes: &[u8]) -> io::Result<()> {
    FileExt::lock_exclusive(&*file)?;
    let outcome = locked_write(file, bytes);
    let unlocked = FileExt::unlock(&*file);
    outcome.and(unlocked)
}

fn locked_write(file: &mut File, bytes: &[u8]) -> io::Result<()> {
    let position = file.stream_position()?;
    let size = file.metadata()?.len();
    if position != size {
        file.seek(SeekFrom::Start(size))?;
    }
    file.write_all(bytes)?;
    file.flush()
}

impl Append for FileAppender {
    fn append(&self, record: &log::Record<'_>) -> anyhow::Result<()> {
        let mut bytes = self.layout.format(record)?;
        bytes.push(b'\n');

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &mut *state {
            SinkState::Stopped => {
                self.status.warn(
                    ORIGIN,
                    "append called on a stopped file appender, record dropped",
                );
                Ok(())
            }
            SinkState::Started(writer) => {
                if let Err(err) = writer.write_record(&bytes) {
                    self.status
                        .error_with(ORIGIN, "failed to write log record", err.into());
                }
                Ok(())
            }
        }
    }

    fn flush(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let SinkState::Started(writer) = &mut *state {
            if let Err(err) = writer.flush() {
                self.status
                    .error_with(ORIGIN, "failed to flush log file", err.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::status::MemoryStatus;
    use crate::status::StatusLevel;

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
    fn test_refuses_to_start_without_path() {
        let memory = MemoryStatus::default();
        let appender = FileAppender::builder()
            .status(StatusHandle::new(memory.clone()))
            .build();

        assert!(appender.start().is_err());
        assert!(!appender.is_started());
        assert!(
            memory
                .messages_at(StatusLevel::Error)
                .iter()
                .any(|m| m.contains("no destination path"))
        );
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deep/app.log");
        let appender = FileAppender::builder()
            .path(path.to_string_lossy())
            .layout(message_only())
            .build();

        appender.start().unwrap();
        append_line(&appender, "hello");
        appender.stop();

        assert_eq!(fs::read_to_string(path).unwrap(), "hello\n");
    }

    #[test]
    fn test_append_while_stopped_drops_record() {
        let dir = TempDir::new().unwrap();
        let memory = MemoryStatus::default();
        let appender = FileAppender::builder()
            .path(dir.path().join("app.log").to_string_lossy())
            .layout(message_only())
            .status(StatusHandle::new(memory.clone()))
            .build();

        append_line(&appender, "dropped");

        assert!(!dir.path().join("app.log").exists());
        assert!(
            memory
                .messages_at(StatusLevel::Warn)
                .iter()
                .any(|m| m.contains("stopped"))
        );
    }

    #[test]
    fn test_prudent_mode_forces_append_and_unbuffered() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "existing\n").unwrap();

        let memory = MemoryStatus::default();
        let appender = FileAppender::builder()
            .path(path.to_string_lossy())
            .append(false)
            .buffered_io(true)
            .prudent(true)
            .layout(message_only())
            .status(StatusHandle::new(memory.clone()))
            .build();

        appender.start().unwrap();
        append_line(&appender, "new");
        appender.stop();

        // append was forced on, so the pre-existing content survived
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing\nnew\n");
        let warnings = memory.messages_at(StatusLevel::Warn);
        assert!(warnings.iter().any(|m| m.contains("\"append\"")));
        assert!(warnings.iter().any(|m| m.contains("\"buffered_io\"")));
    }

    #[test]
    fn test_buffered_write_visible_after_flush() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let appender = FileAppender::builder()
            .path(path.to_string_lossy())
            .buffered_io(true)
            .buffer_size(1 << 16)
            .layout(message_only())
            .build();

        appender.start().unwrap();
        append_line(&appender, "buffered");
        Append::flush(&appender);

        assert_eq!(fs::read_to_string(&path).unwrap(), "buffered\n");
        appender.stop();
    }

    #[test]
    fn test_consecutive_appends_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let memory = MemoryStatus::default();
        let appender = FileAppender::builder()
            .path(path.to_string_lossy())
            .layout(message_only())
            .status(StatusHandle::new(memory.clone()))
            .build();
        appender.start().unwrap();

        append_line(&appender, "before");
        assert!(appender.is_started());
        append_line(&appender, "after");
        appender.stop();

        assert_eq!(fs::read_to_string(&path).unwrap(), "before\nafter\n");
        assert!(memory.messages_at(StatusLevel::Error).is_empty());
    }
}
