//! Lifecycle tests: idempotent init/teardown, implicit init, validation.

use log_relay::prelude::*;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_double_init_no_duplicate_consumer() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let relay = Arc::new(Relay::new());

    relay.init(RelayConfig::direct(dir.path())).unwrap();
    relay.init(RelayConfig::direct(dir.path())).unwrap();

    let logger = relay.logger("once").unwrap();
    logger.warn("single consumer");
    relay.teardown();

    // A duplicated consumer would double-write through shared handles;
    // one line proves one consumer.
    let content = fs::read_to_string(dir.path().join("full.log")).unwrap();
    assert_eq!(content.lines().count(), 1);
}

#[test]
fn test_double_teardown_never_panics() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let relay = Arc::new(Relay::new());
    relay.init(RelayConfig::direct(dir.path())).unwrap();
    relay.teardown();
    relay.teardown();
    relay.teardown();
    assert!(!relay.is_ready());
}

#[test]
fn test_init_teardown_cycle_rebuilds_cleanly() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let relay = Arc::new(Relay::new());

    for round in 0..3 {
        relay.init(RelayConfig::direct(dir.path())).unwrap();
        let logger = relay.logger("cycle").unwrap();
        logger.warn(format!("round {}", round));
        relay.teardown();
        assert!(!relay.is_ready());
    }

    let content = fs::read_to_string(dir.path().join("cycle_full.log")).unwrap();
    assert_eq!(content.lines().count(), 3);
}

#[test]
fn test_session_dir_created_at_init() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let nested = dir.path().join("runs").join("2024-01-01");
    let relay = Arc::new(Relay::new());

    relay.init(RelayConfig::direct(&nested)).unwrap();
    assert!(nested.is_dir());
    assert!(nested.join("full.log").exists());
    relay.teardown();
}

#[test]
fn test_uncreatable_session_dir_fails_loudly() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    // A file where the directory should be makes create_dir_all fail.
    let blocked = dir.path().join("blocked");
    fs::write(&blocked, b"in the way").unwrap();

    let relay = Arc::new(Relay::new());
    let result = relay.init(RelayConfig::direct(blocked.join("session")));
    assert!(matches!(result, Err(RelayError::SessionDir { .. })));
    assert!(!relay.is_ready());
}

#[test]
fn test_logging_calls_never_error_after_teardown() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let relay = Arc::new(Relay::new());
    relay.init(RelayConfig::direct(dir.path())).unwrap();
    let logger = relay.logger("late").unwrap();
    relay.teardown();

    // The engine behind this handle is stopped; emitting is a silent no-op.
    logger.warn("into the void");
    relay.enqueue("also into the void", LogLevel::Warn, "late", None);
}

#[test]
fn test_drop_tears_down_pipeline() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    {
        let relay = Arc::new(Relay::new());
        relay.init(RelayConfig::direct(dir.path())).unwrap();
        let logger = relay.logger("dropped").unwrap();
        for i in 0..25 {
            logger.warn(format!("drop drain {}", i));
        }
        // No explicit teardown: Drop must drain and close.
    }

    let content = fs::read_to_string(dir.path().join("dropped_full.log")).unwrap();
    assert_eq!(content.lines().count(), 25);
}

#[test]
fn test_scope_name_limit_enforced_at_getter() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let relay = Arc::new(Relay::new());
    relay.init(RelayConfig::direct(dir.path())).unwrap();

    assert!(relay.logger(&"s".repeat(MAX_SCOPE_LEN)).is_ok());
    let result = relay.logger(&"s".repeat(MAX_SCOPE_LEN + 1));
    assert!(matches!(result, Err(RelayError::ScopeNameTooLong { .. })));
    relay.teardown();
}

#[test]
fn test_per_scope_threshold_overrides() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let relay = Arc::new(Relay::new());
    relay
        .init(
            RelayConfig::direct(dir.path())
                .with_console_level(LogLevel::Fatal)
                .with_file_level(LogLevel::Info)
                .with_scope_levels("noisy", LogLevel::Fatal, LogLevel::Error),
        )
        .unwrap();

    let noisy = relay.logger("noisy").unwrap();
    let normal = relay.logger("normal").unwrap();
    noisy.info("suppressed");
    normal.info("kept");
    relay.teardown();

    let full = fs::read_to_string(dir.path().join("full.log")).unwrap();
    assert!(!full.contains("suppressed"));
    assert!(full.contains("kept"));
}
