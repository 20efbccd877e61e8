//! # TextLogger
//!
//! TextLogger is a small embeddable logging facility. A logger is bound to a
//! single target file: leveled text messages are collected in an in-memory
//! buffer and appended to the file whenever the buffer is flushed, either
//! explicitly or because the next record would not fit.
//!
//! Every logger carries a hard ceiling on the number of bytes it may ever
//! store in its file. A fixed amount of that ceiling is reserved for a
//! caller-supplied truncation notice, which is appended exactly once when the
//! ceiling is reached. From then on every ordinary write is rejected with
//! [`TextLoggerError::InsufficientFileSpace`].
//!
//! Each line in the file looks like:
//!
//! ```text
//! [2025-04-01 | 19:55:03] [I]: service started
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use textlogger::{LogLevel, TextLoggerBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut logger = TextLoggerBuilder::new("./logs/app.log", "\n[ERR LIMIT]")
//!         .min_level(LogLevel::Info)
//!         .buffer_capacity(1024)
//!         .file_size_ceiling(64 * 1024)
//!         .build()?;
//!
//!     logger.log_info("service started")?;
//!     logger.log_debug("filtered out, below the threshold")?;
//!     logger.log_error("something went wrong")?;
//!
//!     // Final flush, returns whatever the flush reported.
//!     logger.destroy()?;
//!     Ok(())
//! }
//! ```
use {
    chrono::{DateTime, FixedOffset, Local, Utc},
    std::{
        borrow::Cow,
        fmt,
        fs::{self, File},
        io::{self, Write as _},
        path::{Path, PathBuf},
        str::FromStr,
    },
    tracing::{debug, warn},
};

/// Buffer capacity used when the builder is not told otherwise.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Requested file size ceiling used when the builder is not told otherwise.
pub const DEFAULT_FILE_SIZE_CEILING: u64 = 2048;

/// Log levels ordered from most to least important.
///
/// A logger records a message when its level is at or above the configured
/// minimum level in importance, i.e. when `level <= min_level` in the
/// ordering of this enum.
///
/// # Examples
/// ```
/// use textlogger::LogLevel;
///
/// assert!(LogLevel::Error < LogLevel::Verbose);
/// assert_eq!(LogLevel::Warn.tag(), "W");
/// assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
/// assert_eq!("3".parse::<LogLevel>().unwrap(), LogLevel::Info);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LogLevel {
    /// Failures that need attention.
    Error = 1,
    /// Unexpected conditions the program can live with.
    Warn = 2,
    /// Normal operational messages.
    Info = 3,
    /// Details useful while debugging.
    Debug = 4,
    /// Everything else.
    Verbose = 5,
}

impl LogLevel {
    /// All levels, most important first.
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Verbose,
    ];

    /// The single-letter tag written in front of each message.
    pub fn tag(&self) -> &'static str {
        match self {
            LogLevel::Error => "E",
            LogLevel::Warn => "W",
            LogLevel::Info => "I",
            LogLevel::Debug => "D",
            LogLevel::Verbose => "V",
        }
    }

    /// The ordinal of the level, 1 for `Error` up to 5 for `Verbose`.
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Verbose => "verbose",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogLevel {
    type Err = TextLoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LogLevel::ALL
            .into_iter()
            .find(|level| {
                level.name().eq_ignore_ascii_case(wanted)
                    || level.tag().eq_ignore_ascii_case(wanted)
                    || level.ordinal().to_string() == wanted
            })
            .ok_or_else(|| TextLoggerError::InvalidInput(format!("unknown log level '{wanted}'")))
    }
}

/// Specifies the time zone used for the timestamp written before each
/// message.
///
/// # Examples
/// ```
/// use textlogger::TimeZone;
/// use chrono::FixedOffset;
///
/// // Local system time, the default.
/// let local = TimeZone::Local;
///
/// // UTC, handy when logs from several machines are compared.
/// let utc = TimeZone::UTC;
///
/// // A fixed offset, e.g. UTC+8.
/// let fixed = TimeZone::Fix(FixedOffset::east_opt(8 * 3600).unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub enum TimeZone {
    /// Use UTC time.
    UTC,
    /// Use the system's local time zone, resolved on every timestamp so
    /// daylight saving changes are picked up.
    #[default]
    Local,
    /// Use a fixed offset from UTC.
    Fix(FixedOffset),
}

impl TimeZone {
    fn now(&self) -> DateTime<FixedOffset> {
        match self {
            TimeZone::UTC => Utc::now().fixed_offset(),
            TimeZone::Local => Local::now().fixed_offset(),
            TimeZone::Fix(offset) => Utc::now().with_timezone(offset),
        }
    }
}

/// Errors that can occur when using the text logger.
///
/// `InsufficientFileSpace` is a steady-state condition rather than a fault:
/// once returned, the logger rejects ordinary content for the rest of its
/// lifetime and callers are expected to poll for it.
#[derive(Debug, thiserror::Error)]
pub enum TextLoggerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("File size ceiling of {requested} bytes leaves no room once {reserved} bytes are reserved for the truncation notice")]
    CeilingTooSmall { requested: u64, reserved: u64 },
    #[error("Failed to allocate a log buffer of {0} bytes")]
    AllocationFailed(usize),
    #[error("Insufficient file space: the file size ceiling has been reached")]
    InsufficientFileSpace,
    #[error("File error on '{path}': {source}")]
    FileError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TextLoggerError {
    /// Whether this error means the file size ceiling has been reached.
    pub fn is_insufficient_space(&self) -> bool {
        matches!(self, TextLoggerError::InsufficientFileSpace)
    }

    fn file(path: &Path, source: io::Error) -> Self {
        TextLoggerError::FileError {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// On-disk and logical sizes reported by [`TextLogger::query_file_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSizeReport {
    /// Current size of the target file in bytes.
    pub on_disk_bytes: u64,
    /// Bytes accepted into the buffer since the logger was created.
    pub total_bytes_logged: u64,
}

impl fmt::Display for FileSizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "current file size: {} bytes, total bytes logged: {} bytes",
            self.on_disk_bytes, self.total_bytes_logged
        )
    }
}

/// Immutable configuration of a logger, fixed at creation.
#[derive(Debug, Clone)]
struct TextLoggerMeta {
    /// The file that receives every flush.
    file_path: PathBuf,
    /// Appended to the file once when the ceiling is reached.
    truncation_notice: String,
    /// Messages less important than this are dropped.
    min_level: LogLevel,
    /// Maximum number of bytes held in memory between flushes.
    buffer_capacity: usize,
    /// Ceiling as requested by the caller, before the notice is reserved.
    requested_ceiling: u64,
    /// Time zone for the per-message timestamp.
    time_zone: TimeZone,
}

impl TextLoggerMeta {
    fn new<P: AsRef<Path>>(file_path: P, truncation_notice: &str) -> Self {
        TextLoggerMeta {
            file_path: file_path.as_ref().to_path_buf(),
            truncation_notice: truncation_notice.to_owned(),
            min_level: LogLevel::Verbose,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            requested_ceiling: DEFAULT_FILE_SIZE_CEILING,
            time_zone: TimeZone::Local,
        }
    }

    /// Bytes kept free in the file for the truncation notice.
    fn reserved_bytes(&self) -> u64 {
        self.truncation_notice.len() as u64 + 1
    }

    /// Open the target file for appending, creating it (and its parent
    /// directory) when missing.
    fn open_for_append(&self) -> Result<File, TextLoggerError> {
        let mut open_options = fs::OpenOptions::new();
        open_options.append(true).create(true);

        let mut open_res = open_options.open(&self.file_path);
        if open_res.is_err() {
            if let Some(parent) = self.file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|err| TextLoggerError::file(parent, err))?;
                open_res = open_options.open(&self.file_path);
            }
        }
        open_res.map_err(|err| TextLoggerError::file(&self.file_path, err))
    }

    fn file_len(&self, file: &File) -> Result<u64, TextLoggerError> {
        file.metadata()
            .map(|m| m.len())
            .map_err(|err| TextLoggerError::file(&self.file_path, err))
    }

    /// Append `bytes` to the target file in one go. A short write surfaces as
    /// a file error.
    fn append(&self, bytes: &[u8]) -> Result<(), TextLoggerError> {
        let mut file = self.open_for_append()?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|err| TextLoggerError::file(&self.file_path, err))
    }
}

/// Mutable bookkeeping of a logger.
#[derive(Debug)]
struct TextLoggerState {
    /// Pending bytes; its length is the buffer occupancy.
    buffer: Vec<u8>,
    /// Bytes accepted into the buffer since creation. Never decreases.
    total_bytes_logged: u64,
    /// Set once the ceiling is hit, either logically or by an overshooting
    /// flush.
    ceiling_reached: bool,
    /// Set once the truncation notice made it to the file.
    notice_written: bool,
    /// Set by [`TextLogger::destroy`] so the drop guard does not flush again.
    destroyed: bool,
}

/// A buffered logger bound to a single append-only text file.
///
/// Created through [`TextLoggerBuilder`] or [`TextLogger::create`]. The file
/// is not touched until the first flush, and the file handle is opened and
/// closed around each flush.
///
/// A logger is meant to have a single owner. It does no internal locking;
/// wrap it in a mutex to share it between threads.
///
/// Dropping a logger that was not [destroyed](TextLogger::destroy) performs a
/// best-effort final flush.
#[derive(Debug)]
pub struct TextLogger {
    meta: TextLoggerMeta,
    /// `requested_ceiling` minus the bytes reserved for the notice.
    file_size_ceiling: u64,
    state: TextLoggerState,
}

impl TextLogger {
    /// Create a logger from positional parameters.
    ///
    /// Shorthand for the equivalent [`TextLoggerBuilder`] chain.
    /// # Arguments
    /// * `file_path` - The file that receives the log.
    /// * `truncation_notice` - Appended once when the ceiling is reached.
    /// * `min_level` - Least important level that is still recorded.
    /// * `buffer_capacity` - Maximum bytes held in memory between flushes.
    /// * `file_size_ceiling` - Maximum bytes the file may hold, notice
    ///   included.
    pub fn create<P: AsRef<Path>>(
        file_path: P,
        truncation_notice: &str,
        min_level: LogLevel,
        buffer_capacity: usize,
        file_size_ceiling: u64,
    ) -> Result<Self, TextLoggerError> {
        TextLoggerBuilder::new(file_path.as_ref(), truncation_notice)
            .min_level(min_level)
            .buffer_capacity(buffer_capacity)
            .file_size_ceiling(file_size_ceiling)
            .build()
    }

    /// The file this logger appends to.
    pub fn file_path(&self) -> &Path {
        &self.meta.file_path
    }

    /// The notice appended once when the ceiling is reached.
    pub fn truncation_notice(&self) -> &str {
        &self.meta.truncation_notice
    }

    /// The least important level that is still recorded.
    pub fn min_level(&self) -> LogLevel {
        self.meta.min_level
    }

    /// Maximum number of bytes held in memory between flushes.
    pub fn buffer_capacity(&self) -> usize {
        self.meta.buffer_capacity
    }

    /// Ceiling for ordinary content, with the notice's share already taken
    /// off.
    pub fn file_size_ceiling(&self) -> u64 {
        self.file_size_ceiling
    }

    /// Bytes waiting for the next flush.
    pub fn buffered(&self) -> &[u8] {
        &self.state.buffer
    }

    /// Number of bytes waiting for the next flush.
    pub fn buffer_occupancy(&self) -> usize {
        self.state.buffer.len()
    }

    /// Bytes accepted into the buffer since creation, whether or not they
    /// reached the file.
    pub fn total_bytes_logged(&self) -> u64 {
        self.state.total_bytes_logged
    }

    /// Whether the file size ceiling has been reached.
    pub fn ceiling_reached(&self) -> bool {
        self.state.ceiling_reached
    }

    /// Record `text` at `level`.
    ///
    /// Messages less important than the configured minimum level are
    /// silently dropped and `Ok(())` is returned. Otherwise a timestamp and
    /// the tagged message are appended to the buffer, flushing first whenever
    /// a record would overrun the buffer or the remaining file budget.
    ///
    /// # Errors
    /// * [`TextLoggerError::InsufficientFileSpace`] once the ceiling has been
    ///   (or just became) reached.
    /// * [`TextLoggerError::FileError`] when a triggered flush fails.
    pub fn log_at(&mut self, level: LogLevel, text: &str) -> Result<(), TextLoggerError> {
        if level > self.meta.min_level {
            debug!(%level, min_level = %self.meta.min_level, "message filtered");
            return Ok(());
        }

        self.log_timestamp()?;
        self.push(&format!("[{}]: {}\n", level.tag(), text))
    }

    /// Record `text` at [`LogLevel::Error`].
    pub fn log_error(&mut self, text: &str) -> Result<(), TextLoggerError> {
        self.log_at(LogLevel::Error, text)
    }

    /// Record `text` at [`LogLevel::Warn`].
    pub fn log_warn(&mut self, text: &str) -> Result<(), TextLoggerError> {
        self.log_at(LogLevel::Warn, text)
    }

    /// Record `text` at [`LogLevel::Info`].
    pub fn log_info(&mut self, text: &str) -> Result<(), TextLoggerError> {
        self.log_at(LogLevel::Info, text)
    }

    /// Record `text` at [`LogLevel::Debug`].
    pub fn log_debug(&mut self, text: &str) -> Result<(), TextLoggerError> {
        self.log_at(LogLevel::Debug, text)
    }

    /// Record `text` at [`LogLevel::Verbose`].
    pub fn log_verbose(&mut self, text: &str) -> Result<(), TextLoggerError> {
        self.log_at(LogLevel::Verbose, text)
    }

    /// Append the current date and time, formatted as
    /// `[YYYY-MM-DD | HH:MM:SS] `, to the buffer.
    ///
    /// Follows the same flush-before-overrun policy as [`log_at`](Self::log_at).
    pub fn log_timestamp(&mut self) -> Result<(), TextLoggerError> {
        let stamp = self.meta.time_zone.now().format("[%Y-%m-%d | %H:%M:%S] ").to_string();
        self.push(&stamp)
    }

    /// Flush the buffer to the file.
    ///
    /// Once the ceiling has been reached this drops the pending bytes, writes
    /// the truncation notice (the first time only) and returns
    /// [`TextLoggerError::InsufficientFileSpace`]. A flush that would push
    /// the file past the ceiling writes nothing, discards the pending bytes
    /// and marks the ceiling as reached; the notice then goes out on the
    /// following flush.
    pub fn flush(&mut self) -> Result<(), TextLoggerError> {
        if self.state.total_bytes_logged >= self.file_size_ceiling || self.state.ceiling_reached {
            self.state.ceiling_reached = true;
            self.state.buffer.clear();
            if !self.state.notice_written {
                self.meta.append(self.meta.truncation_notice.as_bytes())?;
                self.state.notice_written = true;
                warn!(
                    path = %self.meta.file_path.display(),
                    total_bytes_logged = self.state.total_bytes_logged,
                    ceiling = self.file_size_ceiling,
                    "file size ceiling reached, truncation notice written"
                );
            }
            return Err(TextLoggerError::InsufficientFileSpace);
        }

        if self.state.buffer.is_empty() {
            return Ok(());
        }

        let mut file = self.meta.open_for_append()?;
        let on_disk = self.meta.file_len(&file)?;
        let pending = self.state.buffer.len() as u64;
        if on_disk + pending > self.file_size_ceiling {
            warn!(
                path = %self.meta.file_path.display(),
                on_disk,
                pending,
                ceiling = self.file_size_ceiling,
                "flush would overshoot the file size ceiling, pending bytes dropped"
            );
            self.state.ceiling_reached = true;
            self.state.buffer.clear();
            return Err(TextLoggerError::InsufficientFileSpace);
        }

        file.write_all(&self.state.buffer)
            .and_then(|_| file.flush())
            .map_err(|err| TextLoggerError::file(&self.meta.file_path, err))?;
        debug!(path = %self.meta.file_path.display(), bytes = pending, "buffer flushed");
        self.state.buffer.clear();
        Ok(())
    }

    /// Report the target file's current size alongside the logical byte
    /// count. Creates the file when it does not exist yet, but not its
    /// parent directory.
    pub fn query_file_size(&self) -> Result<FileSizeReport, TextLoggerError> {
        let file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.meta.file_path)
            .map_err(|err| TextLoggerError::file(&self.meta.file_path, err))?;
        Ok(FileSizeReport {
            on_disk_bytes: self.meta.file_len(&file)?,
            total_bytes_logged: self.state.total_bytes_logged,
        })
    }

    /// Perform the final flush and release the logger.
    ///
    /// The logger is released whatever the flush reports; the flush's result
    /// is returned.
    pub fn destroy(mut self) -> Result<(), TextLoggerError> {
        let res = self.flush();
        self.state.destroyed = true;
        res
    }

    /// Whether appending `len` more bytes calls for a flush first.
    fn flush_needed(&self, len: usize) -> bool {
        let file_room = self.file_size_ceiling.saturating_sub(self.state.total_bytes_logged);
        let buffer_room = self.meta.buffer_capacity - self.state.buffer.len();
        file_room <= len as u64 || buffer_room <= len
    }

    /// Append one record to the buffer, flushing first when needed.
    fn push(&mut self, record: &str) -> Result<(), TextLoggerError> {
        if self.state.ceiling_reached {
            // Gets a pending truncation notice out.
            self.flush()?;
            return Err(TextLoggerError::InsufficientFileSpace);
        }

        if self.flush_needed(record.len()) {
            self.flush()?;
        }

        let room = self.meta.buffer_capacity - self.state.buffer.len();
        let record = fit_record(record, room);
        self.state.buffer.extend_from_slice(record.as_bytes());
        self.state.total_bytes_logged += record.len() as u64;
        Ok(())
    }
}

impl Drop for TextLogger {
    fn drop(&mut self) {
        if self.state.destroyed {
            return;
        }
        match self.flush() {
            Ok(()) | Err(TextLoggerError::InsufficientFileSpace) => {}
            Err(err) => warn!("Final flush of '{}' failed: {}", self.meta.file_path.display(), err),
        }
    }
}

/// Cut `record` down to `room` bytes. A record ending in a newline keeps
/// it, so a cut message still ends its line.
fn fit_record(record: &str, room: usize) -> Cow<'_, str> {
    if record.len() <= room {
        return Cow::Borrowed(record);
    }
    match record.strip_suffix('\n') {
        Some(body) if room > 0 => Cow::Owned(format!("{}\n", truncate_at_char_boundary(body, room - 1))),
        _ => Cow::Borrowed(truncate_at_char_boundary(record, room)),
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a
/// character.
fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Provides a fluent interface for configuring [`TextLogger`] instances.
///
/// # Default Configuration
///
/// * Minimum level [`LogLevel::Verbose`], so everything is recorded
/// * Buffer capacity of [`DEFAULT_BUFFER_CAPACITY`] bytes
/// * File size ceiling of [`DEFAULT_FILE_SIZE_CEILING`] bytes
/// * Local time zone for timestamps
///
/// # Examples
///
/// ```rust
/// use textlogger::{LogLevel, TextLoggerBuilder, TimeZone};
///
/// let logger = TextLoggerBuilder::new("./logs/app.log", "[LIMIT]\n")
///     .min_level(LogLevel::Warn)
///     .buffer_capacity(4096)
///     .file_size_ceiling(1024 * 1024)
///     .time_zone(TimeZone::UTC)
///     .build()
///     .unwrap();
/// assert_eq!(logger.file_size_ceiling(), 1024 * 1024 - 9);
/// ```
pub struct TextLoggerBuilder {
    meta: TextLoggerMeta,
}

impl TextLoggerBuilder {
    /// Create a new builder.
    /// # Arguments
    /// * `file_path` - The file that receives the log.
    /// * `truncation_notice` - Appended once when the ceiling is reached,
    ///   verbatim.
    pub fn new<P: AsRef<Path>>(file_path: P, truncation_notice: &str) -> Self {
        TextLoggerBuilder {
            meta: TextLoggerMeta::new(file_path, truncation_notice),
        }
    }

    /// Set the least important level that is still recorded.
    pub fn min_level(self, min_level: LogLevel) -> Self {
        Self {
            meta: TextLoggerMeta { min_level, ..self.meta },
        }
    }

    /// Set the in-memory buffer capacity in bytes.
    pub fn buffer_capacity(self, buffer_capacity: usize) -> Self {
        Self {
            meta: TextLoggerMeta {
                buffer_capacity,
                ..self.meta
            },
        }
    }

    /// Set the maximum size of the file in bytes, truncation notice included.
    pub fn file_size_ceiling(self, file_size_ceiling: u64) -> Self {
        Self {
            meta: TextLoggerMeta {
                requested_ceiling: file_size_ceiling,
                ..self.meta
            },
        }
    }

    /// Set the time zone for message timestamps.
    pub fn time_zone(self, time_zone: TimeZone) -> Self {
        Self {
            meta: TextLoggerMeta { time_zone, ..self.meta },
        }
    }

    /// Build the logger. Nothing is written to disk yet.
    pub fn build(self) -> Result<TextLogger, TextLoggerError> {
        let meta = self.meta;
        if meta.file_path.as_os_str().is_empty() {
            return Err(TextLoggerError::InvalidInput("file path is empty".to_string()));
        }
        if meta.truncation_notice.is_empty() {
            return Err(TextLoggerError::InvalidInput("truncation notice is empty".to_string()));
        }
        if meta.buffer_capacity == 0 {
            return Err(TextLoggerError::InvalidInput("buffer capacity is zero".to_string()));
        }

        let reserved = meta.reserved_bytes();
        let file_size_ceiling = meta.requested_ceiling.saturating_sub(reserved);
        if file_size_ceiling == 0 {
            return Err(TextLoggerError::CeilingTooSmall {
                requested: meta.requested_ceiling,
                reserved,
            });
        }

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(meta.buffer_capacity)
            .map_err(|_| TextLoggerError::AllocationFailed(meta.buffer_capacity))?;

        debug!(
            path = %meta.file_path.display(),
            min_level = %meta.min_level,
            buffer_capacity = meta.buffer_capacity,
            file_size_ceiling,
            "text logger created"
        );
        Ok(TextLogger {
            meta,
            file_size_ceiling,
            state: TextLoggerState {
                buffer,
                total_bytes_logged: 0,
                ceiling_reached: false,
                notice_written: false,
                destroyed: false,
            },
        })
    }
}
