//! Rolling Logger
//!
//! `log` facade backend. Every accepted record is timestamped, kept in a
//! circular buffer of recent lines (for in-app diagnostics) and forwarded to
//! the configured sinks (e.g. the browser console).

use std::collections::VecDeque;
use std::sync::{Mutex, OnceLock};

use chrono::{SecondsFormat, Utc};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

pub const DEFAULT_CAPACITY: usize = 500;

static LOGGER: OnceLock<&'static RollingLogger> = OnceLock::new();

/// Destination for formatted lines
pub trait Sink: Send + Sync {
    fn write(&self, level: Level, line: &str);
}

impl<F> Sink for F
where
    F: Fn(Level, &str) + Send + Sync,
{
    fn write(&self, level: Level, line: &str) {
        self(level, line)
    }
}

pub struct RollingLogger {
    level: LevelFilter,
    capacity: usize,
    buffer: Mutex<VecDeque<String>>,
    sinks: Vec<Box<dyn Sink>>,
}

pub struct Builder {
    level: LevelFilter,
    capacity: usize,
    sinks: Vec<Box<dyn Sink>>,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            capacity: DEFAULT_CAPACITY,
            sinks: Vec::new(),
        }
    }
}

impl Builder {
    pub fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Number of recent lines kept in memory
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn build(self) -> RollingLogger {
        RollingLogger {
            level: self.level,
            capacity: self.capacity,
            buffer: Mutex::new(VecDeque::with_capacity(self.capacity)),
            sinks: self.sinks,
        }
    }

    /// Install as the global logger
    pub fn init(self) -> Result<&'static RollingLogger, SetLoggerError> {
        let level = self.level;
        let logger: &'static RollingLogger = Box::leak(Box::new(self.build()));
        log::set_logger(logger)?;
        log::set_max_level(level);
        let _ = LOGGER.set(logger);
        Ok(logger)
    }
}

impl RollingLogger {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Buffered lines, oldest first
    pub fn recent(&self) -> Vec<String> {
        match self.buffer.lock() {
            Ok(buffer) => buffer.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn clear(&self) {
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.clear();
        }
    }

    fn format(record: &Record) -> String {
        format!(
            "{} {:<5} {}: {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            record.level(),
            record.target(),
            record.args()
        )
    }

    fn push(&self, line: &str) {
        let mut buffer = match self.buffer.lock() {
            Ok(buffer) => buffer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if buffer.len() == self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(line.to_string());
    }
}

impl Log for RollingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = Self::format(record);
        self.push(&line);
        for sink in &self.sinks {
            sink.write(record.level(), &line);
        }
    }

    fn flush(&self) {}
}

/// Recent lines of the installed global logger (empty when none installed)
pub fn recent_lines() -> Vec<String> {
    LOGGER.get().map(|logger| logger.recent()).unwrap_or_default()
}
