use pretty_assertions::assert_eq;

use super::*;

#[derive(Debug, Default, PartialEq)]
struct Record {
    value: u32,
    items: Vec<u32>,
}

impl Recycle for Record {
    fn recycle(&mut self) {
        self.value = 0;
        self.items.clear();
    }
}

fn pool(limit: Option<usize>) -> Pool<Record> {
    Pool::new(PoolKind::Node, 4, limit)
}

#[test]
fn test_alloc_returns_zeroed_record() {
    let mut pool = pool(None);
    let Ok(first) = pool.alloc_with(Record::default) else {
        panic!("allocation failed");
    };

    if let Ok(record) = pool.get_mut(first) {
        record.value = 7;
        record.items.extend([1, 2, 3]);
    }
    assert_eq!(pool.free(first), Ok(()));

    let Ok(second) = pool.alloc_with(Record::default) else {
        panic!("allocation failed");
    };
    assert_eq!(pool.get(second), Ok(&Record::default()));
    assert_eq!(pool.stats().capacity, 1);
    assert_eq!(pool.stats().reused, 1);
}

#[test]
fn test_reused_record_keeps_buffer_capacity() {
    let mut pool = pool(None);
    let Ok(first) = pool.alloc_with(Record::default) else {
        panic!("allocation failed");
    };
    if let Ok(record) = pool.get_mut(first) {
        record.items.extend(0..64);
    }
    assert_eq!(pool.free(first), Ok(()));

    let Ok(second) = pool.alloc_with(Record::default) else {
        panic!("allocation failed");
    };
    assert!(pool.get(second).map(|r| r.items.capacity() >= 64) == Ok(true));
}

#[test]
fn test_stale_handle_is_rejected() {
    let mut pool = pool(None);
    let Ok(first) = pool.alloc_with(Record::default) else {
        panic!("allocation failed");
    };
    assert_eq!(pool.free(first), Ok(()));
    let Ok(second) = pool.alloc_with(Record::default) else {
        panic!("allocation failed");
    };

    // Same slot, new generation.
    assert_ne!(first, second);
    assert_eq!(pool.get(first), Err(Violation::StaleHandle(PoolKind::Node)));
    assert_eq!(pool.free(first), Err(Violation::StaleHandle(PoolKind::Node)));
    assert!(pool.get(second).is_ok());
}

#[test]
fn test_double_free_is_rejected() {
    let mut pool = pool(None);
    let Ok(handle) = pool.alloc_with(Record::default) else {
        panic!("allocation failed");
    };
    assert_eq!(pool.free(handle), Ok(()));
    assert_eq!(pool.free(handle), Err(Violation::StaleHandle(PoolKind::Node)));
    assert_eq!(pool.stats().live, 0);
}

#[test]
fn test_limit_reports_exhaustion() {
    let mut pool = pool(Some(2));
    assert!(pool.alloc_with(Record::default).is_ok());
    assert!(pool.alloc_with(Record::default).is_ok());
    assert_eq!(
        pool.alloc_with(Record::default).map(|_| ()),
        Err(Fault::Exhausted {
            pool: PoolKind::Node,
            limit: 2,
        })
    );
}

#[test]
fn test_capacity_tracks_peak_not_total() {
    let mut pool = pool(None);
    for _ in 0..100 {
        let a = pool.alloc_with(Record::default);
        let b = pool.alloc_with(Record::default);
        for handle in [a, b].into_iter().flatten() {
            assert_eq!(pool.free(handle), Ok(()));
        }
    }
    let stats = pool.stats();
    assert_eq!(stats.capacity, 2);
    assert_eq!(stats.live, 0);
    assert_eq!(stats.reused, 198);
}

#[test]
fn test_clear_releases_everything() {
    let mut pool = pool(None);
    let handles: Vec<_> = (0..3)
        .filter_map(|_| pool.alloc_with(Record::default).ok())
        .collect();
    pool.clear();

    assert_eq!(pool.stats().live, 0);
    for handle in handles {
        assert!(pool.get(handle).is_err());
    }
    assert!(pool.alloc_with(Record::default).is_ok());
    assert_eq!(pool.stats().capacity, 3);
}
