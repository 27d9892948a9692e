//! Configuration and Logging Tests
//!
//! Environment overrides, crate initialization and the global barrier
//! logger. Environment variables are process-wide, so everything touching
//! them runs in a single test.

use fwb::barrier::CardTable;
use fwb::config::active_config;
use fwb::logging::{self, BarrierEvent, BarrierLogger, LogLevel, LoggerConfig};
use fwb::{BarrierConfig, FwbError};

#[test]
fn test_environment_overrides() {
    std::env::set_var("FWB_CARD_SHIFT", "12");
    std::env::set_var("FWB_STATS", "0");
    std::env::set_var("FWB_VERBOSE", "true");

    let config = BarrierConfig::from_env();
    assert_eq!(config.card_shift, 12);
    assert_eq!(config.card_size(), 4096);
    assert!(!config.stats_enabled);
    assert!(config.verbose);
    assert_eq!(config.logger_config().level, LogLevel::Debug);

    // Applied through init, which reads the same variables
    let applied = fwb::init().unwrap();
    assert_eq!(applied, config);
    assert!(!fwb::barrier::stats_enabled());

    // Tables built from the applied configuration use its card size
    assert_eq!(active_config(), config);
    let table = CardTable::with_active_config(0x10_0000, 16384).unwrap();
    assert_eq!(table.card_size(), 4096);
    assert_eq!(table.card_count(), 4);

    // Unparseable values keep the default
    std::env::set_var("FWB_CARD_SHIFT", "large");
    assert_eq!(BarrierConfig::from_env().card_shift, 9);

    // Out of range values parse, but are rejected on init
    std::env::set_var("FWB_CARD_SHIFT", "40");
    assert!(matches!(fwb::init(), Err(FwbError::Configuration(_))));
    // A rejected configuration leaves the applied one in place
    assert_eq!(active_config().card_shift, 12);

    std::env::remove_var("FWB_CARD_SHIFT");
    std::env::remove_var("FWB_STATS");
    std::env::remove_var("FWB_VERBOSE");

    let defaults = fwb::init().unwrap();
    assert_eq!(defaults, BarrierConfig::default());
    assert!(fwb::barrier::stats_enabled());
    assert_eq!(CardTable::with_active_config(0x10_0000, 8192).unwrap().card_size(), 512);

    // Card tables built from a configuration use its card size
    let table = CardTable::with_config(0x10_0000, 8192, &defaults).unwrap();
    assert_eq!(table.card_count(), 16);
    let global_before = logging::event_count();
    let _ = table.drain_dirty(|_, _| {});
    // Scans are debug events, below the default Info level
    assert_eq!(logging::event_count(), global_before);
}

#[test]
fn test_logger_buffers_and_filters() {
    let logger = BarrierLogger::new(LoggerConfig {
        level: LogLevel::Debug,
        console: false,
        json: true,
        timestamps: true,
    });

    logger.log(BarrierEvent::CardTableRegistered {
        base: 0x1000,
        len: 4096,
        card_size: 512,
    });
    logger.log(BarrierEvent::CardScan {
        base: 0x1000,
        dirty_cards: 2,
        duration_us: 5,
    });
    logger.log(BarrierEvent::Stats(Default::default()));
    assert_eq!(logger.event_count(), 2);

    let events = logger.get_events();
    assert!(matches!(
        events[1].1,
        BarrierEvent::CardScan { dirty_cards: 2, .. }
    ));

    logger.disable();
    logger.log(BarrierEvent::ConfigRejected {
        reason: "test".to_string(),
    });
    assert_eq!(logger.event_count(), 2);
    assert!(!logger.is_enabled());
}
