//! Barrier Logging
//!
//! Event logging for the barrier recording subsystem. Events are buffered in
//! the logger (for tests and post-mortem inspection) and forwarded to the
//! `log` facade, so the embedding application decides where they end up.
//!
//! The barrier fast path never logs. Events come from card table
//! registration, collector scans and configuration handling.
//!
//! Log Levels:
//! - WARN: Unusual conditions (rejected configuration)
//! - INFO: Card table registration
//! - DEBUG: Card table scans
//! - TRACE: Statistics snapshots

use crate::barrier::stats::BarrierStats;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Log level for barrier events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    fn to_log(self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Barrier event types
#[derive(Debug, Clone)]
pub enum BarrierEvent {
    /// Card table started covering a heap range
    CardTableRegistered {
        base: usize,
        len: usize,
        card_size: usize,
    },

    /// Card table stopped covering a heap range
    CardTableUnregistered { base: usize },

    /// Collector drained dirty cards for re-scan
    CardScan {
        base: usize,
        dirty_cards: usize,
        duration_us: u64,
    },

    /// Configuration rejected
    ConfigRejected { reason: String },

    /// Statistics snapshot
    Stats(BarrierStats),
}

/// Logger configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Minimum log level
    pub level: LogLevel,

    /// Forward events to the `log` facade
    pub console: bool,

    /// Format forwarded events as JSON
    pub json: bool,

    /// Prefix forwarded events with a local timestamp
    pub timestamps: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: true,
            json: false,
            timestamps: false,
        }
    }
}

/// Barrier logger - buffers events and forwards them to `log`
pub struct BarrierLogger {
    config: LoggerConfig,
    events: Mutex<Vec<(Instant, BarrierEvent)>>,
    enabled: AtomicBool,
}

impl BarrierLogger {
    /// Create new logger
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            events: Mutex::new(Vec::new()),
            enabled: AtomicBool::new(true),
        }
    }

    /// Enable logging
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// Disable logging
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    /// Check if logging is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Log an event
    pub fn log(&self, event: BarrierEvent) {
        if !self.is_enabled() {
            return;
        }

        let level = Self::event_level(&event);
        if level > self.config.level {
            return;
        }

        if self.config.console {
            self.forward(level, &event);
        }

        if let Ok(mut events) = self.events.lock() {
            events.push((Instant::now(), event));
        }
    }

    /// Get log level for event
    fn event_level(event: &BarrierEvent) -> LogLevel {
        match event {
            BarrierEvent::ConfigRejected { .. } => LogLevel::Warn,
            BarrierEvent::CardTableRegistered { .. } | BarrierEvent::CardTableUnregistered { .. } => {
                LogLevel::Info
            },
            BarrierEvent::CardScan { .. } => LogLevel::Debug,
            BarrierEvent::Stats(_) => LogLevel::Trace,
        }
    }

    fn forward(&self, level: LogLevel, event: &BarrierEvent) {
        let body = if self.config.json {
            Self::format_json(event)
        } else {
            Self::format_human(event)
        };

        if self.config.timestamps {
            let now = chrono::Local::now();
            log::log!(
                target: "fwb",
                level.to_log(),
                "[{}] {}",
                now.format("%Y-%m-%d %H:%M:%S%.3f"),
                body
            );
        } else {
            log::log!(target: "fwb", level.to_log(), "{}", body);
        }
    }

    fn format_human(event: &BarrierEvent) -> String {
        match event {
            BarrierEvent::CardTableRegistered {
                base,
                len,
                card_size,
            } => format!(
                "[WB] Card table registered: {:#x}..{:#x} ({} byte cards)",
                base,
                base + len,
                card_size
            ),
            BarrierEvent::CardTableUnregistered { base } => {
                format!("[WB] Card table unregistered: {:#x}", base)
            },
            BarrierEvent::CardScan {
                base,
                dirty_cards,
                duration_us,
            } => format!(
                "[WB] Scanned card table {:#x}: {} dirty cards ({} us)",
                base, dirty_cards, duration_us
            ),
            BarrierEvent::ConfigRejected { reason } => {
                format!("[WB] Configuration rejected: {}", reason)
            },
            BarrierEvent::Stats(stats) => format!(
                "[WB] {} notifies, {} bytes, {} cards dirtied, {} unrecorded",
                stats.notify_calls, stats.bytes_notified, stats.cards_dirtied, stats.unrecorded_writes
            ),
        }
    }

    fn format_json(event: &BarrierEvent) -> String {
        let json = match event {
            BarrierEvent::CardTableRegistered {
                base,
                len,
                card_size,
            } => serde_json::json!({
                "type": "card_table_registered",
                "base": base,
                "len": len,
                "card_size": card_size
            }),
            BarrierEvent::CardTableUnregistered { base } => serde_json::json!({
                "type": "card_table_unregistered",
                "base": base
            }),
            BarrierEvent::CardScan {
                base,
                dirty_cards,
                duration_us,
            } => serde_json::json!({
                "type": "card_scan",
                "base": base,
                "dirty_cards": dirty_cards,
                "duration_us": duration_us
            }),
            BarrierEvent::ConfigRejected { reason } => serde_json::json!({
                "type": "config_rejected",
                "reason": reason
            }),
            BarrierEvent::Stats(stats) => serde_json::json!({
                "type": "stats",
                "stats": stats
            }),
        };

        json.to_string()
    }

    /// Get all events
    pub fn get_events(&self) -> Vec<(Instant, BarrierEvent)> {
        if let Ok(events) = self.events.lock() {
            events.clone()
        } else {
            Vec::new()
        }
    }

    /// Clear all events
    pub fn clear_events(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        if let Ok(events) = self.events.lock() {
            events.len()
        } else {
            0
        }
    }
}

impl Default for BarrierLogger {
    fn default() -> Self {
        Self::new(LoggerConfig::default())
    }
}

lazy_static::lazy_static! {
    static ref GLOBAL_LOGGER: Mutex<BarrierLogger> = Mutex::new(BarrierLogger::default());
}

/// Log an event to the global logger
pub fn log_event(event: BarrierEvent) {
    if let Ok(logger) = GLOBAL_LOGGER.lock() {
        logger.log(event);
    }
}

/// Configure the global logger
pub fn configure_logger(config: LoggerConfig) {
    if let Ok(mut logger) = GLOBAL_LOGGER.lock() {
        *logger = BarrierLogger::new(config);
    }
}

/// Get global logger event count
pub fn event_count() -> usize {
    if let Ok(logger) = GLOBAL_LOGGER.lock() {
        logger.event_count()
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_basic() {
        let logger = BarrierLogger::default();

        logger.log(BarrierEvent::CardTableRegistered {
            base: 0x1000,
            len: 0x1000,
            card_size: 512,
        });

        assert_eq!(logger.event_count(), 1);
    }

    #[test]
    fn test_logger_disable() {
        let logger = BarrierLogger::default();

        logger.disable();
        logger.log(BarrierEvent::CardTableUnregistered { base: 0x1000 });

        assert_eq!(logger.event_count(), 0);
    }

    #[test]
    fn test_logger_level_filter() {
        let logger = BarrierLogger::default();

        // Debug and trace events are below the default Info level
        logger.log(BarrierEvent::CardScan {
            base: 0x1000,
            dirty_cards: 3,
            duration_us: 1,
        });
        logger.log(BarrierEvent::Stats(BarrierStats::default()));
        assert_eq!(logger.event_count(), 0);

        logger.log(BarrierEvent::ConfigRejected {
            reason: "card_shift".to_string(),
        });
        assert_eq!(logger.event_count(), 1);

        logger.clear_events();
        assert_eq!(logger.event_count(), 0);
    }

    #[test]
    fn test_json_format() {
        let json = BarrierLogger::format_json(&BarrierEvent::CardTableRegistered {
            base: 16,
            len: 32,
            card_size: 512,
        });
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "card_table_registered");
        assert_eq!(value["len"], 32);
    }
}
