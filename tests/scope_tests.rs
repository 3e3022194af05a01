//! # Scoped Store Tests
//!
//! Isolation between concurrently active execution contexts:
//! - ThreadScope: OS threads, clear() affects only the calling thread
//! - TaskScope: tokio tasks on a multi-threaded runtime
//! - LocalStorePool: stores recycled between units of work come back empty

use ctxstore::{pool, KeyValueStore, LocalStorePool, StoreError, TaskScope, ThreadScope};
use std::sync::{Arc, Barrier};
use std::thread;
use tokio::sync::Barrier as AsyncBarrier;

// ============================================================================
// THREAD SCOPE
// ============================================================================

#[test]
fn clear_in_one_thread_leaves_the_other_alone() {
    let written = Arc::new(Barrier::new(2));
    let cleared = Arc::new(Barrier::new(2));

    let a = {
        let (written, cleared) = (Arc::clone(&written), Arc::clone(&cleared));
        thread::spawn(move || {
            ThreadScope.set("x", 1_i32).unwrap();
            ThreadScope.set("y", 10_i32).unwrap();
            written.wait();
            ThreadScope.clear();
            cleared.wait();
            (ThreadScope.has("x"), ThreadScope.has("y"))
        })
    };
    let b = {
        let (written, cleared) = (Arc::clone(&written), Arc::clone(&cleared));
        thread::spawn(move || {
            ThreadScope.set("x", 2_i32).unwrap();
            written.wait();
            cleared.wait();
            *ThreadScope.get_typed::<i32>("x").unwrap()
        })
    };

    assert_eq!(a.join().unwrap(), (false, false));
    assert_eq!(b.join().unwrap(), 2);
}

#[test]
fn recycled_thread_starts_clean_with_guard() {
    thread::spawn(|| {
        for request in 0..5_u64 {
            let _scope = ThreadScope::enter();
            assert!(!ThreadScope.has("request.id"), "leak from previous request");
            ThreadScope.set("request.id", request).unwrap();
        }
    })
    .join()
    .unwrap();
}

// ============================================================================
// TASK SCOPE
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_tasks_see_their_own_values() {
    let barrier = Arc::new(AsyncBarrier::new(2));

    let spawn = |value: i32| {
        let barrier = Arc::clone(&barrier);
        tokio::spawn(TaskScope::run(async move {
            TaskScope.set("x", value).unwrap();
            barrier.wait().await;
            *TaskScope.get_typed::<i32>("x").unwrap()
        }))
    };

    let a = spawn(1);
    let b = spawn(2);
    assert_eq!(a.await.unwrap(), 1);
    assert_eq!(b.await.unwrap(), 2);
}

#[tokio::test]
async fn nested_run_gets_a_fresh_store() {
    TaskScope::run(async {
        TaskScope.set("outer", 1_u8).unwrap();

        TaskScope::run(async {
            assert!(!TaskScope.has("outer"));
            TaskScope.set("inner", 2_u8).unwrap();
        })
        .await;

        assert!(TaskScope.has("outer"));
        assert!(!TaskScope.has("inner"));
    })
    .await;
}

#[tokio::test]
async fn missing_key_inside_scope() {
    let err = TaskScope::run(async { TaskScope.get("user") }).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::MissingKey {
            key: "user".into(),
            store: "TaskScope"
        }
    );
}

// ============================================================================
// POOL
// ============================================================================

#[test]
fn pooled_stores_are_isolated_and_recycled() {
    let pool = Arc::new(LocalStorePool::with_capacity(2));
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2_i32)
        .map(|i| {
            let (pool, barrier) = (Arc::clone(&pool), Arc::clone(&barrier));
            thread::spawn(move || {
                let store = pool.lease();
                store.set("x", i).unwrap();
                barrier.wait();
                *store.get_typed::<i32>("x").unwrap()
            })
        })
        .collect();

    let seen: Vec<i32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(seen, vec![0, 1]);

    assert_eq!(pool.size(), 2);
    for _ in 0..2 {
        assert!(pool.acquire().is_empty());
    }
}

#[test]
fn global_pool_lease() {
    pool::warm(1);
    {
        let store = pool::lease();
        store.set("scope_tests.key", true).unwrap();
    }
    assert!(!pool::lease().has("scope_tests.key"));
}
