//! Tests for the Value Store
//!
//! These tests verify:
//! - Preallocation and mapping of value files
//! - Slot claiming and block-full detection
//! - Counter seeding after recovery
//! - Slot addressing: values land at block * block_size + slot * 4096
//! - Bulk span reads used by scans
//! - Persistence through the mapping across reopen

use std::collections::HashSet;
use std::path::PathBuf;
use std::thread;

use slotkv::values::{ValueFile, ValueStore};
use slotkv::{Layout, SlotError, VALUE_LEN};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

/// 2 files × 2 blocks × 8 slots
fn tiny_layout() -> Layout {
    Layout {
        value_file_bits: 1,
        block_bits: 1,
        blocks_per_file: 2,
        slots_per_block: 8,
        ..Layout::default()
    }
}

fn filled(byte: u8) -> Vec<u8> {
    vec![byte; VALUE_LEN]
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_preallocates_files() {
    let (_temp, dir) = setup_temp_dir();
    let layout = tiny_layout();

    let store = ValueStore::open(&dir, &layout).unwrap();

    assert_eq!(store.files().len(), 2);
    assert_eq!(store.block_size(), 8 * VALUE_LEN);
    for file in store.files() {
        assert_eq!(file.len(), 2 * 8 * VALUE_LEN);
        assert_eq!(file.path().metadata().unwrap().len(), layout.file_size());
    }
}

#[test]
fn test_larger_existing_file_is_not_shrunk() {
    let (_temp, dir) = setup_temp_dir();
    let path = ValueFile::file_path(&dir, 0);
    std::fs::File::create(&path)
        .unwrap()
        .set_len(1 << 20)
        .unwrap();

    let file = ValueFile::open(&dir, 0, 4 * VALUE_LEN as u64).unwrap();

    assert_eq!(file.len(), 4 * VALUE_LEN);
    assert_eq!(path.metadata().unwrap().len(), 1 << 20);
}

// =============================================================================
// Slot Claim Tests
// =============================================================================

#[test]
fn test_claims_are_sequential_per_block() {
    let (_temp, dir) = setup_temp_dir();
    let store = ValueStore::open(&dir, &tiny_layout()).unwrap();

    assert_eq!(store.claim_slot(0, 0).unwrap(), 0);
    assert_eq!(store.claim_slot(0, 0).unwrap(), 1);
    assert_eq!(store.claim_slot(0, 1).unwrap(), 0);
    assert_eq!(store.claim_slot(1, 0).unwrap(), 0);
    assert_eq!(store.next_slot(0, 0), 2);
}

#[test]
fn test_block_full() {
    let (_temp, dir) = setup_temp_dir();
    let store = ValueStore::open(&dir, &tiny_layout()).unwrap();

    for expected in 0..8 {
        assert_eq!(store.claim_slot(1, 1).unwrap(), expected);
    }

    assert!(matches!(
        store.claim_slot(1, 1),
        Err(SlotError::BlockFull { file: 1, block: 1 })
    ));
    // other blocks unaffected
    assert_eq!(store.claim_slot(1, 0).unwrap(), 0);
}

#[test]
fn test_reserve_through_only_moves_forward() {
    let (_temp, dir) = setup_temp_dir();
    let store = ValueStore::open(&dir, &tiny_layout()).unwrap();

    store.reserve_through(0, 1, 4);
    store.reserve_through(0, 1, 2);

    assert_eq!(store.next_slot(0, 1), 5);
    assert_eq!(store.claim_slot(0, 1).unwrap(), 5);
}

#[test]
fn test_concurrent_claims_are_unique() {
    let (_temp, dir) = setup_temp_dir();
    let layout = Layout {
        slots_per_block: 4000,
        ..tiny_layout()
    };
    let store = ValueStore::open(&dir, &layout).unwrap();

    let claimed: Vec<u32> = thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| {
                    (0..1000)
                        .map(|_| store.claim_slot(0, 0).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let unique: HashSet<u32> = claimed.iter().copied().collect();
    assert_eq!(unique.len(), 4000);
    assert_eq!(store.next_slot(0, 0), 4000);
}

// =============================================================================
// Put / Get Tests
// =============================================================================

#[test]
fn test_put_get_round_trip() {
    let (_temp, dir) = setup_temp_dir();
    let store = ValueStore::open(&dir, &tiny_layout()).unwrap();

    store.put(0, 0, 0, &filled(1)).unwrap();
    store.put(0, 1, 3, &filled(2)).unwrap();
    store.put(1, 1, 7, &filled(3)).unwrap();

    let mut buf = vec![0u8; VALUE_LEN];
    store.get(0, 0, 0, &mut buf).unwrap();
    assert_eq!(buf, filled(1));
    store.get(0, 1, 3, &mut buf).unwrap();
    assert_eq!(buf, filled(2));
    store.get(1, 1, 7, &mut buf).unwrap();
    assert_eq!(buf, filled(3));

    // untouched slots read as zeroes
    store.get(1, 0, 0, &mut buf).unwrap();
    assert_eq!(buf, filled(0));
}

#[test]
fn test_slot_addressing_matches_file_offset() {
    let (_temp, dir) = setup_temp_dir();
    {
        let store = ValueStore::open(&dir, &tiny_layout()).unwrap();
        store.put(1, 1, 2, &filled(0xEE)).unwrap();
        store.files()[1].sync().unwrap();
    }

    let raw = std::fs::read(ValueFile::file_path(&dir, 1)).unwrap();
    let offset = 8 * VALUE_LEN + 2 * VALUE_LEN;

    assert!(raw[offset..offset + VALUE_LEN].iter().all(|&b| b == 0xEE));
    assert!(raw[..offset].iter().all(|&b| b == 0));
}

#[test]
fn test_out_of_range_access_is_an_error() {
    let (_temp, dir) = setup_temp_dir();
    let file = ValueFile::open(&dir, 0, 2 * VALUE_LEN as u64).unwrap();

    let result = file.write_at(VALUE_LEN + 1, &filled(1));
    assert!(matches!(result, Err(SlotError::Io(_))));

    let mut buf = filled(0);
    assert!(file.read_at(2 * VALUE_LEN, &mut buf).is_err());
}

#[test]
fn test_read_slots_span() {
    let (_temp, dir) = setup_temp_dir();
    let store = ValueStore::open(&dir, &tiny_layout()).unwrap();
    for slot in 0..5u32 {
        store.put(0, 1, slot, &filled(slot as u8 + 10)).unwrap();
    }

    let mut span = vec![0u8; 3 * VALUE_LEN];
    store.read_slots(0, 1, 2, &mut span).unwrap();

    for (i, chunk) in span.chunks(VALUE_LEN).enumerate() {
        assert!(chunk.iter().all(|&b| b == i as u8 + 12));
    }
}

#[test]
fn test_values_survive_reopen() {
    let (_temp, dir) = setup_temp_dir();
    {
        let store = ValueStore::open(&dir, &tiny_layout()).unwrap();
        store.put(1, 0, 5, &filled(0x5A)).unwrap();
    }

    let store = ValueStore::open(&dir, &tiny_layout()).unwrap();
    let mut buf = vec![0u8; VALUE_LEN];
    store.get(1, 0, 5, &mut buf).unwrap();

    assert_eq!(buf, filled(0x5A));
    // counters are not persisted; recovery seeds them
    assert_eq!(store.next_slot(1, 0), 0);
}
