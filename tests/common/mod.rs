//! Shared fixtures for the scheduler integration tests.
//!
//! Task bodies here are real `SchedulerTask` implementations; tests drive
//! them through the public scheduler API and observe state from the test
//! thread with bounded polling.

#![allow(dead_code)]

use async_trait::async_trait;
use prometheus_task_scheduler::config::{SchedulerConfig, WorkerPoolConfig};
use prometheus_task_scheduler::core::{
    AppResult, ConcurrencyPolicy, InMemoryAuditSink, ScheduledTask, Scheduler, SchedulerTask,
    TaskContext, TaskState,
};
use prometheus_task_scheduler::util::init_tracing;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Upper bound for any single wait in these tests.
pub const WAIT: Duration = Duration::from_secs(5);

pub fn test_config() -> SchedulerConfig {
    SchedulerConfig {
        pool: WorkerPoolConfig::new().with_worker_count(4),
        poll_interval_ms: 20,
        max_results_per_task: None,
    }
}

pub fn scheduler() -> Scheduler<u32> {
    init_tracing();
    Scheduler::new(test_config()).expect("scheduler")
}

/// One worker and a one-slot queue, so a busy worker makes the pool refuse dispatch.
pub fn single_worker_scheduler() -> Scheduler<u32> {
    init_tracing();
    let config = SchedulerConfig {
        pool: WorkerPoolConfig::new()
            .with_worker_count(1)
            .with_max_queue_depth(1),
        ..test_config()
    };
    Scheduler::new(config).expect("scheduler")
}

pub fn audited_scheduler() -> (Scheduler<u32>, Arc<InMemoryAuditSink>) {
    init_tracing();
    let audit = Arc::new(InMemoryAuditSink::new(1024));
    let scheduler = Scheduler::builder(test_config())
        .with_audit(audit.clone())
        .build()
        .expect("scheduler");
    (scheduler, audit)
}

/// Poll `condition` every few milliseconds until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

pub fn await_state(task: &ScheduledTask<u32>, state: TaskState) {
    assert!(
        wait_until(WAIT, || task.state() == state),
        "task {} stuck in {} waiting for {}",
        task.id(),
        task.state(),
        state
    );
}

pub fn await_results(task: &ScheduledTask<u32>, count: usize) {
    assert!(
        wait_until(WAIT, || task.get_results().len() >= count),
        "task {} produced {} results, expected {}",
        task.id(),
        task.get_results().len(),
        count
    );
}

pub fn await_pruned(scheduler: &Scheduler<u32>, task: &ScheduledTask<u32>) {
    assert!(
        wait_until(WAIT, || scheduler.get_task_by_id(task.id()).is_err()),
        "task {} still registered in {}",
        task.id(),
        task.state()
    );
}

// ============================================================================
// TEST TASKS - Real implementations for testing
// ============================================================================

/// Returns 0, 1, 2, ... on successive runs.
pub struct CounterTask {
    task_type: String,
    next: AtomicU32,
}

impl CounterTask {
    pub fn new(task_type: &str) -> Arc<Self> {
        Arc::new(Self {
            task_type: task_type.to_string(),
            next: AtomicU32::new(0),
        })
    }

    pub fn runs(&self) -> u32 {
        self.next.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchedulerTask<u32> for CounterTask {
    async fn call(&self, _ctx: TaskContext) -> AppResult<u32> {
        Ok(self.next.fetch_add(1, Ordering::SeqCst))
    }

    fn task_type(&self) -> String {
        self.task_type.clone()
    }
}

/// Fails on every run.
pub struct FailingTask {
    pub attempts: AtomicUsize,
}

impl FailingTask {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SchedulerTask<u32> for FailingTask {
    async fn call(&self, _ctx: TaskContext) -> AppResult<u32> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        anyhow::bail!("upstream unavailable (attempt {attempt})")
    }
}

/// Latch a test opens to let gated bodies finish.
#[derive(Default)]
pub struct Gate {
    open: AtomicBool,
}

impl Gate {
    pub fn closed() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn opened() -> Arc<Self> {
        let gate = Self::default();
        gate.open.store(true, Ordering::SeqCst);
        Arc::new(gate)
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Body that blocks until its gate opens.
///
/// A cooperative body also returns early through `check_canceled`; an
/// uncooperative one only stops when interrupted.
pub struct GatedTask {
    task_type: String,
    gate: Arc<Gate>,
    cooperative: bool,
    policy: Option<Box<dyn ConcurrencyPolicy>>,
    pub started: AtomicUsize,
    pub finished: AtomicUsize,
}

impl GatedTask {
    pub fn new(task_type: &str, gate: Arc<Gate>) -> Self {
        Self {
            task_type: task_type.to_string(),
            gate,
            cooperative: false,
            policy: None,
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        }
    }

    pub fn cooperative(mut self) -> Self {
        self.cooperative = true;
        self
    }

    pub fn with_policy(mut self, policy: impl ConcurrencyPolicy + 'static) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl SchedulerTask<u32> for GatedTask {
    async fn call(&self, ctx: TaskContext) -> AppResult<u32> {
        let run = self.started.fetch_add(1, Ordering::SeqCst);
        while !self.gate.is_open() {
            if self.cooperative {
                ctx.check_canceled()?;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(u32::try_from(run).unwrap_or(u32::MAX))
    }

    fn task_type(&self) -> String {
        self.task_type.clone()
    }

    fn concurrency_policy(&self) -> Option<&dyn ConcurrencyPolicy> {
        self.policy.as_deref()
    }
}
