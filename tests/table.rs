#![allow(clippy::unwrap_used, clippy::missing_docs_in_private_items, clippy::cast_possible_truncation)]

use djb2_table::{Limited, MIN_BUCKET_COUNT, Table, TableConfig, TableError};

/// Table whose budget is large enough for anything the tests do
fn metered() -> Table<Limited> {
    Table::with_budget(TableConfig::new(), Limited::new(usize::MAX)).unwrap()
}

/// Caps `table` so that only `extra` more bytes fit
fn squeeze(table: &mut Table<Limited>, extra: usize) {
    let used = table.budget().used();
    table.budget_mut().set_limit(used + extra);
}

/// Asserts that keys `0..n` selected by `keep` are present with value == key
fn assert_numbered(table: &Table<Limited>, n: i32, keep: impl Fn(i32) -> bool) {
    for i in (0..n).filter(|&i| keep(i)) {
        assert_eq!(table.get(&i.to_string()), Some(i), "key {i}");
    }
}

#[test]
fn test_insert() {
    let mut table = Table::new();
    assert_eq!(table.set("foo", 123), Ok(None));
    assert_eq!(table.get("foo"), Some(123));
}

#[test]
fn test_retrieve() {
    let mut table = Table::new();
    table.set("foo", 123).unwrap();
    assert!(table.contains_key("foo"));
    assert!(!table.contains_key("bar"));
    assert_eq!(table.get("bar"), None);
}

#[test]
fn test_update() {
    let mut table = Table::new();
    table.set("foo", 123).unwrap();
    assert_eq!(table.set("foo", 456), Ok(Some(123)));
    assert_eq!(table.get("foo"), Some(456));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_get_mut() {
    let mut table = Table::new();
    table.set("foo", 1).unwrap();

    if let Some(value) = table.get_mut("foo") {
        *value += 10;
    }

    assert_eq!(table.get("foo"), Some(11));
    assert_eq!(table.get_mut("bar"), None);
}

#[test]
fn test_remove() {
    let mut table = Table::new();
    table.set("foo", 123).unwrap();
    table.set("bar", 7).unwrap();

    assert_eq!(table.remove("foo"), Some(123));
    assert_eq!(table.get("foo"), None);
    assert_eq!(table.get("bar"), Some(7));
}

#[test]
fn test_remove_missing_is_noop() {
    let mut table = Table::new();
    table.set("foo", 1).unwrap();

    assert_eq!(table.remove("bar"), None);
    assert_eq!(table.len(), 1);
    assert_eq!(table.get("foo"), Some(1));

    let mut empty = Table::new();
    assert_eq!(empty.remove("foo"), None);
    assert!(empty.is_empty());
}

#[test]
fn test_iterate() {
    let mut table = Table::new();
    table.set("foo", 1).unwrap();
    table.set("bar", 2).unwrap();
    table.set("baz", 3).unwrap();

    let mut seen = Vec::new();
    table.for_each(|key, value| seen.push(format!("{key}={value}")));
    seen.sort();

    assert_eq!(seen, ["bar=2", "baz=3", "foo=1"]);

    let mut pairs: Vec<(&str, i32)> = (&table).into_iter().collect();
    pairs.sort_unstable();
    assert_eq!(pairs, [("bar", 2), ("baz", 3), ("foo", 1)]);
}

#[test]
fn test_grow() {
    let mut table = Table::new();

    // 100 inserts is enough to trigger a rehash
    for i in 0..100 {
        table.set(&i.to_string(), i).unwrap();
    }

    assert!(table.bucket_count() > MIN_BUCKET_COUNT);
    assert_eq!(table.len(), 100);
    for i in 0..100 {
        assert_eq!(table.get(&i.to_string()), Some(i));
    }
}

#[test]
fn test_grow_doubles_past_threshold() {
    let mut table = Table::new();
    for i in 0..48 {
        table.set(&i.to_string(), i).unwrap();
    }
    // 48 / 32 == 1.5 is not above the threshold
    assert_eq!(table.bucket_count(), 32);

    table.set("48", 48).unwrap();
    assert_eq!(table.bucket_count(), 64);
    assert!(table.load_factor() <= 1.5);
}

#[test]
fn test_shrink() {
    let mut table = Table::new();

    for i in 0..100 {
        table.set(&i.to_string(), i).unwrap();
    }
    let grown = table.bucket_count();

    // Remove 90% of entries to trigger another rehash
    for i in (0..100).filter(|i| i % 10 != 5) {
        assert_eq!(table.remove(&i.to_string()), Some(i));
    }

    assert!(table.bucket_count() < grown);
    assert_eq!(table.len(), 10);
    for i in (0..100).filter(|i| i % 10 == 5) {
        assert_eq!(table.get(&i.to_string()), Some(i));
    }
}

#[test]
fn test_never_below_minimum() {
    let mut table = Table::new();
    for i in 0..1000 {
        table.set(&i.to_string(), i).unwrap();
    }
    for i in 0..1000 {
        table.remove(&i.to_string());
        assert!(table.bucket_count() >= MIN_BUCKET_COUNT);
    }

    assert!(table.is_empty());
    assert_eq!(table.bucket_count(), MIN_BUCKET_COUNT);
}

#[test]
fn test_custom_minimum() {
    let config = TableConfig::new().min_buckets(8);
    let mut table = Table::with_config(config).unwrap();
    assert_eq!(table.bucket_count(), 8);

    for i in 0..13 {
        table.set(&i.to_string(), i).unwrap();
    }
    assert_eq!(table.bucket_count(), 16);

    for i in 0..13 {
        table.remove(&i.to_string());
    }
    assert_eq!(table.bucket_count(), 8);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = TableConfig::new().min_buckets(30);
    assert!(matches!(Table::with_config(config), Err(TableError::InvalidConfig(_))));
}

#[test]
fn test_create_fails_without_memory() {
    let result = Table::with_budget(TableConfig::new(), Limited::new(16));
    assert!(matches!(result, Err(TableError::AllocFailed { .. })));
}

#[test]
fn test_clear() {
    let mut table = Table::new();
    for i in 0..100 {
        table.set(&i.to_string(), i).unwrap();
    }

    table.clear();

    assert!(table.is_empty());
    assert_eq!(table.bucket_count(), MIN_BUCKET_COUNT);
    assert_eq!(table.get("1"), None);
    assert_eq!(table.iter().count(), 0);

    table.set("1", 1).unwrap();
    assert_eq!(table.get("1"), Some(1));
}

#[test]
fn test_entry_allocation_failure_leaves_table_unchanged() {
    let mut table = metered();
    table.set("foo", 1).unwrap();
    squeeze(&mut table, 0);

    assert!(matches!(table.set("bar", 2), Err(TableError::AllocFailed { .. })));
    assert_eq!(table.len(), 1);
    assert_eq!(table.get("bar"), None);
    assert_eq!(table.get("foo"), Some(1));

    // Updating an existing key needs no memory
    assert_eq!(table.set("foo", 5), Ok(Some(1)));
    assert_eq!(table.get("foo"), Some(5));
}

#[test]
fn test_grow_deferred_when_array_is_refused() {
    let mut table = metered();
    for i in 0..48 {
        table.set(&i.to_string(), i).unwrap();
    }

    // Enough for one more entry but not for a 64-bucket array
    squeeze(&mut table, 64);
    table.set("48", 48).unwrap();

    assert_eq!(table.bucket_count(), 32);
    assert_eq!(table.len(), 49);
    assert_numbered(&table, 49, |_| true);
}

#[test]
fn test_grow_deferred_when_rehash_runs_out() {
    let mut table = metered();
    for i in 0..48 {
        table.set(&i.to_string(), i).unwrap();
    }

    // The array fits, the copies of 49 entries do not
    squeeze(&mut table, 64 + 32 * 8 * 2 + 200);
    table.set("48", 48).unwrap();

    assert_eq!(table.bucket_count(), 32);
    assert_eq!(table.len(), 49);
    assert_numbered(&table, 49, |_| true);

    // With memory back the next insert grows
    table.budget_mut().set_limit(usize::MAX);
    table.set("49", 49).unwrap();
    assert_eq!(table.bucket_count(), 64);
    assert_numbered(&table, 50, |_| true);
}

#[test]
fn test_shrink_deferred_when_memory_is_short() {
    let mut table = metered();
    for i in 0..100 {
        table.set(&i.to_string(), i).unwrap();
    }
    assert_eq!(table.bucket_count(), 128);

    let doomed: Vec<i32> = (0..100).filter(|i| i % 10 != 5).collect();
    let (first, rest) = doomed.split_at(52);
    for i in first {
        table.remove(&i.to_string());
    }
    // 48 entries sit exactly on the 0.375 threshold
    assert_eq!(table.len(), 48);
    assert_eq!(table.bucket_count(), 128);

    // Only the freed entry comes back, far short of a 64-bucket copy
    squeeze(&mut table, 0);
    let (next, rest) = rest.split_first().unwrap();
    assert_eq!(table.remove(&next.to_string()), Some(*next));
    assert_eq!(table.bucket_count(), 128);
    assert_eq!(table.len(), 47);
    assert_numbered(&table, 100, |i| !first.contains(&i) && i != *next);

    table.budget_mut().set_limit(usize::MAX);
    for i in rest {
        table.remove(&i.to_string());
    }
    assert_eq!(table.len(), 10);
    assert_eq!(table.bucket_count(), MIN_BUCKET_COUNT);
    assert_numbered(&table, 100, |i| i % 10 == 5);
}

#[test]
fn test_stats() {
    let mut table = Table::new();
    let empty = table.stats();
    assert_eq!(empty.len, 0);
    assert_eq!(empty.bucket_count, 32);
    assert_eq!(empty.empty_buckets, 32);
    assert_eq!(empty.longest_chain, 0);

    for i in 0..40 {
        table.set(&i.to_string(), i).unwrap();
    }
    let stats = table.stats();
    assert_eq!(stats.len, 40);
    assert_eq!(table.chain_lengths().sum::<usize>(), 40);
    assert!(stats.longest_chain >= 2);
    assert!(stats.empty_buckets < 32);
}
