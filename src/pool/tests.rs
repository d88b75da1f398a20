//! Tests for the object pool.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use rstest::rstest;

use super::*;

#[derive(Debug, PartialEq)]
struct Counted(usize);

fn pool_with(
    pool_size: usize,
    max_wait: Option<u64>,
    max_lifetime: Option<u64>,
    max_idle: Option<u64>,
) -> SimpleObjectPool<Counted> {
    let next = AtomicUsize::new(1);
    SimpleObjectPool::new(
        move || Counted(next.fetch_add(1, Ordering::Relaxed)),
        PoolConfig {
            pool_size,
            max_wait: max_wait.map(Duration::from_millis),
            max_lifetime: max_lifetime.map(Duration::from_millis),
            max_idle: max_idle.map(Duration::from_millis),
        },
    )
    .expect("valid pool config")
}

#[rstest]
fn reuses_slots_in_fifo_order() {
    let pool = pool_with(2, Some(100), Some(100), Some(100));
    for _ in 0..10 {
        for expected in 1..3 {
            let obj = pool.borrow_object().expect("borrow");
            assert_eq!(obj.0, expected);
            pool.return_object(obj);
        }
    }
}

#[rstest]
fn invalidated_objects_are_replaced() {
    let pool = pool_with(2, Some(100), Some(100), Some(100));
    for expected in 1..4 {
        let obj = pool.borrow_object().expect("borrow");
        assert_eq!(obj.0, expected);
        pool.invalidate_object(obj);
    }
}

#[rstest]
fn dropping_a_borrowed_object_invalidates_it() {
    let pool = pool_with(1, Some(100), None, None);
    drop(pool.borrow_object().expect("borrow"));
    assert_eq!(pool.borrow_object().expect("borrow").0, 2);
}

#[rstest]
fn idle_objects_are_replaced() {
    let pool = pool_with(1, Some(100), Some(100), Some(0));
    for expected in 1..4 {
        if expected > 1 {
            thread::sleep(Duration::from_millis(2));
        }
        let obj = pool.borrow_object().expect("borrow");
        assert_eq!(obj.0, expected);
        pool.return_object(obj);
    }
}

#[rstest]
fn exhausted_pool_times_out() {
    let pool = pool_with(1, Some(100), Some(100), Some(0));
    let _held = pool.borrow_object().expect("borrow");
    let started = Instant::now();
    assert_eq!(pool.borrow_object().expect_err("exhausted"), PoolError::Exhausted);
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[rstest]
fn rejects_zero_pool_size() {
    let err = SimpleObjectPool::new(|| Counted(0), PoolConfig {
        pool_size: 0,
        ..PoolConfig::default()
    })
    .expect_err("zero pool size");
    assert!(matches!(err, ConfigError::InvalidConfig(msg) if msg.contains("pool_size")));
}

#[rstest]
fn unbounded_wait_blocks_until_return() {
    let pool = pool_with(1, None, None, None);
    let held = pool.borrow_object().expect("borrow");
    let id = held.0;
    let started = Instant::now();
    thread::scope(|scope| {
        scope.spawn(|| {
            thread::sleep(Duration::from_millis(200));
            pool.return_object(held);
        });
        let again = pool.borrow_object().expect("borrow after return");
        assert_eq!(again.0, id);
    });
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[rstest]
fn unbounded_lifetime_keeps_object() {
    let pool = pool_with(1, Some(100), None, None);
    let first = pool.borrow_object().expect("borrow");
    pool.return_object(first);
    assert_eq!(pool.borrow_object().expect("borrow").0, 1);
}

#[rstest]
fn objects_past_lifetime_are_recycled() {
    let pool = pool_with(1, None, Some(0), None);
    let first = pool.borrow_object().expect("borrow");
    pool.return_object(first);
    thread::sleep(Duration::from_millis(2));
    assert_eq!(pool.borrow_object().expect("borrow").0, 2);
}

#[rstest]
fn live_objects_never_exceed_pool_size() {
    let live = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let pool = SimpleObjectPool::new(|| (), PoolConfig {
        pool_size: 3,
        max_wait: None,
        ..PoolConfig::default()
    })
    .expect("valid pool config");
    thread::scope(|scope| {
        for _ in 0..8 {
            let (pool, live, peak) = (&pool, Arc::clone(&live), Arc::clone(&peak));
            scope.spawn(move || {
                for _ in 0..50 {
                    let obj = pool.borrow_object().expect("borrow");
                    let now = live.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    live.fetch_sub(1, Ordering::SeqCst);
                    pool.return_object(obj);
                }
            });
        }
    });
    assert!(peak.load(Ordering::SeqCst) <= 3);
}

#[rstest]
fn execute_returns_on_success_and_invalidates_on_error() {
    let pool = pool_with(1, Some(100), None, None);
    let seen: Result<usize, PoolError> = pool.execute(|obj| Ok(obj.0));
    assert_eq!(seen, Ok(1));
    let failed: Result<(), PoolError> = pool.execute(|_| Err(PoolError::Exhausted));
    assert!(failed.is_err());
    let next: Result<usize, PoolError> = pool.execute(|obj| Ok(obj.0));
    assert_eq!(next, Ok(2));
}

#[rstest]
fn close_wakes_blocked_borrowers() {
    let pool = pool_with(1, None, None, None);
    let held = pool.borrow_object().expect("borrow");
    thread::scope(|scope| {
        let waiter = scope.spawn(|| pool.borrow_object().map(|obj| obj.0));
        thread::sleep(Duration::from_millis(50));
        pool.close();
        assert_eq!(waiter.join().expect("join"), Err(PoolError::Closed));
    });
    pool.return_object(held);
    pool.close();
    assert!(pool.is_closed());
    assert_eq!(pool.borrow_object().map(|obj| obj.0), Err(PoolError::Closed));
}
