//! Configuration Module - Barrier Recording Parameters
//!
//! The policy layer itself has nothing to configure: which locations need a
//! barrier is decided by static types. Configuration covers the runtime side,
//! i.e. the card table that records barrier hits and the diagnostics around
//! it.

use crate::logging::{LogLevel, LoggerConfig};
use parking_lot::RwLock;

/// Configuration for barrier recording
///
/// # Examples
///
/// ```rust
/// use fwb::BarrierConfig;
///
/// // 1KB cards instead of the default 512 bytes
/// let config = BarrierConfig {
///     card_shift: 10,
///     ..Default::default()
/// };
/// assert_eq!(config.card_size(), 1024);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarrierConfig {
    /// Log2 of the card size in bytes
    ///
    /// One card byte summarizes `1 << card_shift` bytes of heap. Smaller
    /// cards make the collector re-scan less memory per dirty card at the
    /// cost of a larger table.
    ///
    /// Valid range: 4 - 20. Default: 9 (512 bytes)
    pub card_shift: u32,

    /// Count notify calls, notified bytes and dirtied cards
    ///
    /// Default: true
    pub stats_enabled: bool,

    /// Log card table activity at debug level
    ///
    /// Default: false
    pub verbose: bool,
}

impl Default for BarrierConfig {
    fn default() -> Self {
        Self {
            card_shift: DEFAULT_CARD_SHIFT,
            stats_enabled: true,
            verbose: false,
        }
    }
}

impl BarrierConfig {
    /// Validate configuration
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fwb::BarrierConfig;
    ///
    /// let config = BarrierConfig {
    ///     card_shift: 2,
    ///     ..Default::default()
    /// };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.card_shift < MIN_CARD_SHIFT {
            return Err(ConfigError::InvalidCardShift(format!(
                "card_shift must be >= {} (got {})",
                MIN_CARD_SHIFT, self.card_shift
            )));
        }

        if self.card_shift > MAX_CARD_SHIFT {
            return Err(ConfigError::InvalidCardShift(format!(
                "card_shift must be <= {} (got {})",
                MAX_CARD_SHIFT, self.card_shift
            )));
        }

        Ok(())
    }

    /// Card size in bytes
    #[inline]
    pub fn card_size(&self) -> usize {
        1usize << self.card_shift
    }

    /// Logger configuration implied by this config
    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            level: if self.verbose {
                LogLevel::Debug
            } else {
                LogLevel::Info
            },
            ..Default::default()
        }
    }

    /// Build configuration from environment variables
    ///
    /// Overrides defaults with environment variables:
    /// - FWB_CARD_SHIFT
    /// - FWB_STATS
    /// - FWB_VERBOSE
    ///
    /// Unparseable values are ignored with a warning.
    ///
    /// # Examples
    ///
    /// ```bash
    /// export FWB_CARD_SHIFT=10   # 1KB cards
    /// export FWB_STATS=0
    /// export FWB_VERBOSE=1
    /// ```
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("FWB_CARD_SHIFT") {
            match val.parse::<u32>() {
                Ok(shift) => config.card_shift = shift,
                Err(_) => log::warn!("Ignoring FWB_CARD_SHIFT={:?}: not a number", val),
            }
        }

        if let Ok(val) = std::env::var("FWB_STATS") {
            config.stats_enabled = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("FWB_VERBOSE") {
            config.verbose = parse_flag(&val);
        }

        config
    }
}

lazy_static::lazy_static! {
    static ref ACTIVE_CONFIG: RwLock<BarrierConfig> = RwLock::new(BarrierConfig::default());
}

/// Configuration applied by the last successful [`crate::init`] or
/// [`crate::init_with_config`], or the default before either ran
///
/// [`CardTable::with_active_config`](crate::barrier::CardTable::with_active_config)
/// takes its card size from here.
pub fn active_config() -> BarrierConfig {
    ACTIVE_CONFIG.read().clone()
}

pub(crate) fn set_active_config(config: BarrierConfig) {
    *ACTIVE_CONFIG.write() = config;
}

fn parse_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid card shift: {0}")]
    InvalidCardShift(String),
}

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default card shift: 512 byte cards
pub const DEFAULT_CARD_SHIFT: u32 = 9;
/// Smallest card: 16 bytes
pub const MIN_CARD_SHIFT: u32 = 4;
/// Largest card: 1MB
pub const MAX_CARD_SHIFT: u32 = 20;
