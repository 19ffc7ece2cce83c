use crate::{Error, PoolBuilder, TokioRuntime, WorkerPool, wait_for_zero_async, wait_on_async};
use core::{
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};
use std::sync::Arc;
use tokio::sync::Semaphore;

const TIMEOUT: Duration = Duration::from_secs(10);
const SHORT: Duration = Duration::from_millis(50);

/// Waits until `done` holds, failing the test after [`TIMEOUT`].
async fn eventually(mut done: impl FnMut() -> bool) {
    tokio::time::timeout(TIMEOUT, wait_on_async::<TokioRuntime>(move || !done()))
        .await
        .expect("condition was not reached in time");
}

/// Waits until `pending` drains to zero, failing the test after [`TIMEOUT`].
async fn drained(pending: &AtomicUsize) {
    tokio::time::timeout(TIMEOUT, wait_for_zero_async::<TokioRuntime, _>(pending))
        .await
        .expect("tasks did not complete in time");
}

/// A gate that tasks block on until the test opens it.
fn closed_gate() -> Arc<Semaphore> {
    Arc::new(Semaphore::new(0))
}

fn open(gate: &Semaphore) {
    gate.add_permits(Semaphore::MAX_PERMITS >> 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn new_pool_starts_no_workers() {
    let pool = WorkerPool::<TokioRuntime>::new(4);
    assert_eq!(pool.capacity(), 4);
    assert_eq!(pool.active_workers(), 0);
    assert_eq!(pool.idle_workers(), 0);
    assert_eq!(pool.name(), crate::DEFAULT_POOL_NAME);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrency_never_exceeds_capacity() {
    const TASKS: usize = 64;

    for capacity in [1, 2, 4, 8] {
        let pool = WorkerPool::<TokioRuntime>::new(capacity);
        let running = Arc::new(AtomicUsize::new(0));
        let max_running = Arc::new(AtomicUsize::new(0));
        let pending = Arc::new(AtomicUsize::new(TASKS));

        for _ in 0..TASKS {
            let running = Arc::clone(&running);
            let max_running = Arc::clone(&max_running);
            let pending = Arc::clone(&pending);
            pool.submit(async move {
                let now = running.fetch_add(1, Ordering::AcqRel) + 1;
                max_running.fetch_max(now, Ordering::AcqRel);
                tokio::time::sleep(Duration::from_millis(1)).await;
                running.fetch_sub(1, Ordering::AcqRel);
                pending.fetch_sub(1, Ordering::AcqRel);
            })
            .await;
            assert!(pool.active_workers() <= capacity);
        }

        drained(&pending).await;
        let observed = max_running.load(Ordering::Acquire);
        assert!(
            observed <= capacity,
            "capacity {capacity}: observed {observed} concurrent tasks"
        );
        assert!(pool.active_workers() <= capacity);
        pool.stop();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn every_task_runs_exactly_once() {
    const TASKS: usize = 1024;

    let pool = WorkerPool::<TokioRuntime>::new(8);
    let runs: Arc<Vec<AtomicUsize>> = Arc::new((0..TASKS).map(|_| AtomicUsize::new(0)).collect());
    let pending = Arc::new(AtomicUsize::new(TASKS));

    for i in 0..TASKS {
        let runs = Arc::clone(&runs);
        let pending = Arc::clone(&pending);
        pool.submit(async move {
            runs[i].fetch_add(1, Ordering::AcqRel);
            if i % 7 == 0 {
                tokio::task::yield_now().await;
            }
            pending.fetch_sub(1, Ordering::AcqRel);
        })
        .await;
    }

    drained(&pending).await;
    for (i, count) in runs.iter().enumerate() {
        assert_eq!(count.load(Ordering::Acquire), 1, "task {i}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn stop_racing_submissions_loses_no_task() {
    const TASKS: usize = 20_000;

    let pool = Arc::new(WorkerPool::<TokioRuntime>::new(4));
    let runs: Arc<Vec<AtomicUsize>> = Arc::new((0..TASKS).map(|_| AtomicUsize::new(0)).collect());
    let pending = Arc::new(AtomicUsize::new(TASKS));
    let submitting = Arc::new(AtomicBool::new(true));

    // Workers keep taking stop signals while tasks are being handed to them.
    let stopper = {
        let pool = Arc::clone(&pool);
        let submitting = Arc::clone(&submitting);
        tokio::spawn(async move {
            while submitting.load(Ordering::Acquire) {
                pool.stop();
                tokio::task::yield_now().await;
            }
        })
    };

    for i in 0..TASKS {
        let runs = Arc::clone(&runs);
        let pending = Arc::clone(&pending);
        pool.submit(async move {
            runs[i].fetch_add(1, Ordering::AcqRel);
            pending.fetch_sub(1, Ordering::AcqRel);
        })
        .await;
    }

    submitting.store(false, Ordering::Release);
    stopper.await.expect("stopper task panicked");

    drained(&pending).await;
    for (i, count) in runs.iter().enumerate() {
        assert_eq!(count.load(Ordering::Acquire), 1, "task {i}");
    }
    pool.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_submitters_share_the_budget() {
    const SUBMITTERS: usize = 8;
    const TASKS_PER_SUBMITTER: usize = 128;
    const CAPACITY: usize = 3;

    let pool = Arc::new(WorkerPool::<TokioRuntime>::new(CAPACITY));
    let running = Arc::new(AtomicUsize::new(0));
    let max_running = Arc::new(AtomicUsize::new(0));
    let pending = Arc::new(AtomicUsize::new(SUBMITTERS * TASKS_PER_SUBMITTER));

    let submitters: Vec<_> = (0..SUBMITTERS)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let running = Arc::clone(&running);
            let max_running = Arc::clone(&max_running);
            let pending = Arc::clone(&pending);
            tokio::spawn(async move {
                for _ in 0..TASKS_PER_SUBMITTER {
                    let running = Arc::clone(&running);
                    let max_running = Arc::clone(&max_running);
                    let pending = Arc::clone(&pending);
                    pool.submit(async move {
                        let now = running.fetch_add(1, Ordering::AcqRel) + 1;
                        max_running.fetch_max(now, Ordering::AcqRel);
                        tokio::task::yield_now().await;
                        running.fetch_sub(1, Ordering::AcqRel);
                        pending.fetch_sub(1, Ordering::AcqRel);
                    })
                    .await;
                }
            })
        })
        .collect();

    for submitter in futures::future::join_all(submitters).await {
        submitter.unwrap();
    }

    drained(&pending).await;
    assert!(max_running.load(Ordering::Acquire) <= CAPACITY);
    assert!(pool.active_workers() <= CAPACITY);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn idle_worker_is_reused() {
    let pool = WorkerPool::<TokioRuntime>::new(4);

    for round in 1..=8 {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        pool.submit(async move { flag.store(true, Ordering::Release) })
            .await;

        eventually(|| ran.load(Ordering::Acquire) && pool.idle_workers() == 1).await;
        assert_eq!(pool.active_workers(), 1, "round {round}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn stop_without_submissions_returns_immediately() {
    let pool = WorkerPool::<TokioRuntime>::new(8);
    pool.stop();
    // Signals are buffered, not awaited, so a second stop must not block either.
    pool.stop();
    assert_eq!(pool.active_workers(), 0);
    assert_eq!(pool.idle_workers(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn stop_drains_in_flight_tasks() {
    const CAPACITY: usize = 4;

    let pool = WorkerPool::<TokioRuntime>::new(CAPACITY);
    let gate = closed_gate();
    let completed = Arc::new(AtomicUsize::new(0));

    for _ in 0..CAPACITY {
        let gate = Arc::clone(&gate);
        let completed = Arc::clone(&completed);
        pool.submit(async move {
            let _permit = gate.acquire().await.unwrap();
            completed.fetch_add(1, Ordering::AcqRel);
        })
        .await;
    }
    assert_eq!(pool.active_workers(), CAPACITY);

    pool.stop();
    tokio::time::sleep(SHORT).await;
    // Stopping never aborts running work.
    assert_eq!(pool.active_workers(), CAPACITY);
    assert_eq!(completed.load(Ordering::Acquire), 0);

    open(&gate);
    eventually(|| pool.active_workers() == 0).await;
    assert_eq!(completed.load(Ordering::Acquire), CAPACITY);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn stop_retires_idle_workers() {
    let pool = WorkerPool::<TokioRuntime>::new(4);
    let pending = Arc::new(AtomicUsize::new(2));

    for _ in 0..2 {
        let pending = Arc::clone(&pending);
        pool.submit(async move {
            pending.fetch_sub(1, Ordering::AcqRel);
        })
        .await;
    }
    drained(&pending).await;

    pool.stop();
    eventually(|| pool.active_workers() == 0 && pool.idle_workers() == 0).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn submit_after_stop_runs_on_a_fresh_worker() {
    let pool = WorkerPool::<TokioRuntime>::new(2);
    pool.stop();

    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    pool.submit(async move { flag.store(true, Ordering::Release) })
        .await;

    // The fresh worker runs its task, then consumes a buffered stop signal.
    eventually(|| ran.load(Ordering::Acquire) && pool.active_workers() == 0).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn zero_capacity_submit_never_completes() {
    let pool = WorkerPool::<TokioRuntime>::new(0);
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);

    let result = tokio::time::timeout(
        SHORT,
        pool.submit(async move { flag.store(true, Ordering::Release) }),
    )
    .await;

    assert!(result.is_err(), "submit on a zero-capacity pool returned");
    assert!(!ran.load(Ordering::Acquire));
    assert_eq!(pool.try_submit(async {}).unwrap_err().kind(), Error::PoolFull);
    pool.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn submit_waits_while_saturated() {
    const CAPACITY: usize = 2;

    let pool = Arc::new(WorkerPool::<TokioRuntime>::new(CAPACITY));
    let gate = closed_gate();

    for _ in 0..CAPACITY {
        let gate = Arc::clone(&gate);
        pool.submit(async move {
            let _permit = gate.acquire().await.unwrap();
        })
        .await;
    }

    let ran = Arc::new(AtomicBool::new(false));
    let waiting = {
        let pool = Arc::clone(&pool);
        let flag = Arc::clone(&ran);
        tokio::spawn(async move {
            pool.submit(async move { flag.store(true, Ordering::Release) })
                .await;
        })
    };

    tokio::time::sleep(SHORT).await;
    assert!(!waiting.is_finished());
    assert!(!ran.load(Ordering::Acquire));
    assert_eq!(pool.active_workers(), CAPACITY);

    open(&gate);
    tokio::time::timeout(TIMEOUT, waiting)
        .await
        .expect("blocked submit was never released")
        .unwrap();
    eventually(|| ran.load(Ordering::Acquire)).await;
    assert!(pool.active_workers() <= CAPACITY);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn try_submit_hands_back_task_when_full() {
    let pool = WorkerPool::<TokioRuntime>::new(1);
    let gate = closed_gate();

    {
        let gate = Arc::clone(&gate);
        pool.try_submit(async move {
            let _permit = gate.acquire().await.unwrap();
        })
        .expect("an empty pool has a free permit");
    }

    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    let err = pool
        .try_submit(async move { flag.store(true, Ordering::Release) })
        .unwrap_err();
    assert_eq!(err.kind(), Error::PoolFull);
    assert_eq!(err.to_string(), "worker pool is at capacity");

    open(&gate);
    eventually(|| pool.idle_workers() == 1).await;

    // The rejected task is intact and can be resubmitted.
    pool.try_submit_task(err.into_inner())
        .expect("the idle worker should take the task");
    eventually(|| ran.load(Ordering::Acquire)).await;
    assert_eq!(pool.active_workers(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn panicking_task_keeps_its_permit_available() {
    let panics = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&panics);
    let pool: WorkerPool<TokioRuntime> = PoolBuilder::new(1)
        .name("panics")
        .task_panic_handler(move |_payload| {
            counter.fetch_add(1, Ordering::AcqRel);
        })
        .build();

    pool.submit(async { panic!("task failed") }).await;
    eventually(|| panics.load(Ordering::Acquire) == 1).await;

    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    pool.submit(async move { flag.store(true, Ordering::Release) })
        .await;

    eventually(|| ran.load(Ordering::Acquire)).await;
    assert_eq!(pool.active_workers(), 1);
    assert_eq!(panics.load(Ordering::Acquire), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn default_panic_handling_keeps_worker_alive() {
    let pool = WorkerPool::<TokioRuntime>::new(1);
    pool.submit(async { panic!("task failed") }).await;

    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    pool.submit(async move { flag.store(true, Ordering::Release) })
        .await;

    eventually(|| ran.load(Ordering::Acquire)).await;
    assert_eq!(pool.active_workers(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn resumed_panic_releases_the_permit() {
    let pool: WorkerPool<TokioRuntime> = PoolBuilder::new(1)
        .task_panic_handler(|payload| std::panic::resume_unwind(payload))
        .build();

    pool.submit(async { panic!("task failed") }).await;
    eventually(|| pool.active_workers() == 0).await;

    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    pool.submit(async move { flag.store(true, Ordering::Release) })
        .await;
    eventually(|| ran.load(Ordering::Acquire)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn dropped_pool_retires_idle_workers() {
    // Worker state is shared only between the pool and its live workers, and
    // it owns the panic handler. Once every worker has exited, the marker
    // captured by the handler is the last reference left.
    let marker = Arc::new(());
    let pool: WorkerPool<TokioRuntime> = {
        let marker = Arc::clone(&marker);
        PoolBuilder::new(2)
            .task_panic_handler(move |_payload| {
                let _ = &marker;
            })
            .build()
    };

    let pending = Arc::new(AtomicUsize::new(1));
    {
        let pending = Arc::clone(&pending);
        pool.submit(async move {
            pending.fetch_sub(1, Ordering::AcqRel);
        })
        .await;
    }
    drained(&pending).await;
    eventually(|| pool.idle_workers() == 1).await;
    assert_eq!(Arc::strong_count(&marker), 2);

    drop(pool);
    eventually(|| Arc::strong_count(&marker) == 1).await;
}

#[cfg(feature = "async-smol")]
#[test]
fn every_task_runs_exactly_once_smol() {
    use crate::SmolRuntime;

    const TASKS: usize = 256;

    smol::block_on(async {
        let pool = WorkerPool::<SmolRuntime>::new(4);
        let runs: Arc<Vec<AtomicUsize>> =
            Arc::new((0..TASKS).map(|_| AtomicUsize::new(0)).collect());
        let pending = Arc::new(AtomicUsize::new(TASKS));

        for i in 0..TASKS {
            let runs = Arc::clone(&runs);
            let pending = Arc::clone(&pending);
            pool.submit(async move {
                runs[i].fetch_add(1, Ordering::AcqRel);
                smol::future::yield_now().await;
                pending.fetch_sub(1, Ordering::AcqRel);
            })
            .await;
        }

        wait_for_zero_async::<SmolRuntime, _>(&*pending).await;
        assert!(runs.iter().all(|count| count.load(Ordering::Acquire) == 1));
        assert!(pool.active_workers() <= 4);
        pool.stop();
    });
}
