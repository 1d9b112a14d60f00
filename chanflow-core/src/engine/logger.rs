//! Engine log records, forwarded into `tracing`.

use tracing::{debug, error, info, trace, warn};

/// Engine log levels, least severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Gossip,
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// One log line emitted by the engine.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub level: Level,
    pub module_path: &'a str,
    pub line: u32,
    pub message: &'a str,
}

pub trait EngineLogger: Send + Sync {
    fn log(&self, record: &Record<'_>);
}

/// Re-emits engine records as `tracing` events under the `engine` target.
#[derive(Debug, Clone, Copy)]
pub struct TracingLogger {
    min_level: Level,
}

impl TracingLogger {
    pub fn new() -> Self {
        Self::with_level(Level::Info)
    }

    pub fn with_level(min_level: Level) -> Self {
        Self { min_level }
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineLogger for TracingLogger {
    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.level) {
            return;
        }
        let (module, line, message) = (record.module_path, record.line, record.message);
        match record.level {
            Level::Gossip | Level::Trace => trace!(target: "engine", module, line, "{message}"),
            Level::Debug => debug!(target: "engine", module, line, "{message}"),
            Level::Info => info!(target: "engine", module, line, "{message}"),
            Level::Warn => warn!(target: "engine", module, line, "{message}"),
            Level::Error => error!(target: "engine", module, line, "{message}"),
        }
    }
}

/// Drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct MuteLogger;

impl EngineLogger for MuteLogger {
    fn log(&self, _record: &Record<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter() {
        let logger = TracingLogger::new();
        assert!(!logger.enabled(Level::Gossip));
        assert!(!logger.enabled(Level::Debug));
        assert!(logger.enabled(Level::Info));
        assert!(logger.enabled(Level::Error));

        let verbose = TracingLogger::with_level(Level::Gossip);
        assert!(verbose.enabled(Level::Gossip));
    }

    #[test]
    fn test_log_without_subscriber() {
        let record = Record {
            level: Level::Warn,
            module_path: "engine::channelmanager",
            line: 42,
            message: "peer disconnected",
        };
        TracingLogger::new().log(&record);
        MuteLogger.log(&record);
    }
}
