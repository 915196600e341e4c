//! Tests for Config and Layout
//!
//! These tests verify:
//! - Defaults reproduce the production geometry
//! - Validation rejects inconsistent layouts
//! - Key routing follows the configured bits

use slotkv::partition::{Location, Partitioner};
use slotkv::{Config, Engine, Layout, SlotError, KEY_LEN, RECORD_LEN, VALUE_LEN};

// =============================================================================
// Default Tests
// =============================================================================

#[test]
fn test_default_geometry() {
    let layout = Layout::default();

    assert_eq!(layout.key_shards(), 64);
    assert_eq!(layout.value_files(), 256);
    assert_eq!(layout.blocks_per_file, 128);
    assert_eq!(layout.block_size(), 8_847_360);
    assert_eq!(layout.file_size(), 1_132_462_080);
    assert_eq!(layout.slot_capacity(), 256 * 128 * 2160);
    assert!(layout.validate().is_ok());
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.max_keys, 64_000_000);
    assert!(!config.sync_on_close);
    assert!(config.validate().is_ok());
}

#[test]
fn test_record_geometry() {
    assert_eq!(KEY_LEN, 8);
    assert_eq!(VALUE_LEN, 4096);
    assert_eq!(RECORD_LEN, 12);
}

#[test]
fn test_builder_overrides() {
    let config = Config::builder()
        .data_dir("/tmp/slotkv-test")
        .value_file_bits(3)
        .blocks_per_file(64)
        .slots_per_block(10)
        .max_keys(500)
        .sync_on_close(true)
        .build();

    assert_eq!(config.data_dir.to_str(), Some("/tmp/slotkv-test"));
    assert_eq!(config.layout.value_files(), 8);
    assert_eq!(config.layout.blocks_per_file, 64);
    assert_eq!(config.layout.slots_per_block, 10);
    assert_eq!(config.max_keys, 500);
    assert!(config.sync_on_close);
    assert!(config.validate().is_ok());
}

// =============================================================================
// Validation Tests
// =============================================================================

fn assert_invalid(layout: Layout) {
    assert!(
        matches!(layout.validate(), Err(SlotError::Config(_))),
        "expected {:?} to be rejected",
        layout
    );
}

#[test]
fn test_validation_rejects_bad_layouts() {
    let base = Layout::default();

    assert_invalid(Layout { key_shard_bits: 0, ..base });
    assert_invalid(Layout { key_shard_bits: 17, ..base });
    assert_invalid(Layout { value_file_bits: 0, ..base });
    assert_invalid(Layout { block_bits: 17, ..base });
    assert_invalid(Layout { block_shift: 60, ..base });
    assert_invalid(Layout {
        block_shift: 64,
        block_bits: 0,
        blocks_per_file: 1,
        ..base
    });
    assert_invalid(Layout { blocks_per_file: 63, ..base });
    assert_invalid(Layout { slots_per_block: 0, ..base });
}

#[test]
fn test_validation_rejects_zero_max_keys() {
    let config = Config::builder().max_keys(0).build();

    assert!(matches!(config.validate(), Err(SlotError::Config(_))));
}

#[test]
fn test_single_block_layout_is_valid() {
    let layout = Layout {
        block_bits: 0,
        blocks_per_file: 1,
        ..Layout::default()
    };

    assert!(layout.validate().is_ok());
    assert_eq!(Partitioner::new(&layout).block(u64::MAX), 0);
}

#[test]
fn test_highest_block_shift_routes_without_overflow() {
    let layout = Layout {
        block_shift: 63,
        block_bits: 1,
        blocks_per_file: 2,
        ..Layout::default()
    };
    assert!(layout.validate().is_ok());

    let p = Partitioner::new(&layout);
    assert_eq!(p.block(5), 0);
    assert_eq!(p.block(u64::MAX), 1);
}

#[test]
fn test_engine_rejects_block_shift_of_64() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .layout(Layout {
            block_shift: 64,
            block_bits: 0,
            value_file_bits: 1,
            blocks_per_file: 1,
            slots_per_block: 2,
            ..Layout::default()
        })
        .build();

    assert!(matches!(Engine::open(config), Err(SlotError::Config(_))));
}

// =============================================================================
// Routing Tests
// =============================================================================

#[test]
fn test_routing_follows_layout() {
    let layout = Layout {
        key_shard_bits: 2,
        value_file_bits: 3,
        ..Layout::default()
    };
    let p = Partitioner::new(&layout);
    let key = 0xE000_0000_0000_0000u64 | (5u64 << 49);

    assert_eq!(
        p.locate(key),
        Location {
            shard: 3,
            file: 7,
            block: 5
        }
    );
}

#[test]
fn test_equal_keys_route_identically() {
    let p = Partitioner::default();

    for key in [0u64, 12345, 0xDEAD_BEEF_0000_0001, u64::MAX] {
        assert_eq!(p.locate(key), p.locate(key));
        assert!(p.shard(key) < 64);
        assert!(p.file(key) < 256);
        assert!(p.block(key) < 64);
    }
}
