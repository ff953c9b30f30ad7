use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail};
use pcon_sched::{AsyncScheduler, GroupId, RegistrySnapshot, Scheduler, TaskCaller, ThreadCaller};

use crate::events::EventGroupDone;

/// How long to wait for a member to show up in the registry.
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// What the members run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Runtime {
    /// One OS thread per member, blocking `Scheduler`.
    Threads,
    /// One tokio task per member, `AsyncScheduler`.
    Tasks,
}

impl Runtime {
    pub fn name(self) -> &'static str {
        match self {
            Runtime::Threads => "threads",
            Runtime::Tasks => "tasks",
        }
    }
}

/// One group's workload.
#[derive(Debug, Clone, Copy)]
pub struct GroupRun {
    pub group_id: GroupId,
    pub members: usize,
    pub rounds: usize,
}

/// What one member observed.
#[derive(Debug, Default)]
struct MemberReport {
    turns: u64,
    violations: u64,
    rotations_us: Vec<f64>,
}

/// What one group observed.
#[derive(Debug, Default)]
pub struct GroupReport {
    pub group_id: u64,
    pub turns: u64,
    pub order_violations: u64,
    rotations_us: Vec<f64>,
}

impl GroupReport {
    fn absorb(&mut self, member: MemberReport) {
        self.turns += member.turns;
        self.order_violations += member.violations;
        self.rotations_us.extend(member.rotations_us);
    }

    pub fn to_event(&self, start: Instant) -> EventGroupDone {
        let mut sorted = self.rotations_us.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mean = if sorted.is_empty() {
            0.0
        } else {
            sorted.iter().sum::<f64>() / sorted.len() as f64
        };
        EventGroupDone {
            event: "group_done",
            group_id: self.group_id,
            turns: self.turns,
            order_violations: self.order_violations,
            rotation_mean_us: mean,
            rotation_p50_us: percentile(&sorted, 50.0),
            rotation_p99_us: percentile(&sorted, 99.0),
            rotation_max_us: sorted.last().copied().unwrap_or(0.0),
            elapsed_s: start.elapsed().as_secs_f64(),
        }
    }
}

/// Nearest-rank percentile over an ascending slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

fn member_count(snap: &RegistrySnapshot, group_id: GroupId) -> usize {
    snap.group(group_id).map(|g| g.members.len()).unwrap_or(0)
}

/// Shared turn counter: member `i` of `n` may only run on turns ≡ i (mod n).
struct Turns {
    next: AtomicU64,
    members: u64,
}

impl Turns {
    fn new(members: usize) -> Self {
        Self {
            next: AtomicU64::new(0),
            members: members as u64,
        }
    }

    /// Take the current turn; returns whether it was ours.
    fn take(&self, index: usize) -> bool {
        let turn = self.next.fetch_add(1, Ordering::SeqCst);
        turn % self.members == index as u64
    }
}

// ── Threads ──────────────────────────────────────────────────────────────

fn wait_for_members(sched: &Scheduler, group_id: GroupId, n: usize) -> anyhow::Result<()> {
    let deadline = Instant::now() + JOIN_TIMEOUT;
    while member_count(&sched.snapshot(), group_id) < n {
        if Instant::now() >= deadline {
            bail!("group {group_id}: timed out waiting for {n} members");
        }
        thread::sleep(Duration::from_millis(1));
    }
    Ok(())
}

fn thread_member(
    sched: &Scheduler,
    run: GroupRun,
    index: usize,
    turns: &Turns,
) -> anyhow::Result<MemberReport> {
    let me = ThreadCaller::current();
    sched.join(run.group_id, &me)?;
    if index == 0 {
        wait_for_members(sched, run.group_id, run.members)?;
    }

    let mut report = MemberReport::default();
    for _ in 0..run.rounds {
        report.turns += 1;
        if !turns.take(index) {
            report.violations += 1;
        }
        let t0 = Instant::now();
        sched.switch(run.group_id, &me)?;
        report.rotations_us.push(t0.elapsed().as_secs_f64() * 1e6);
    }
    report.turns += 1;
    if !turns.take(index) {
        report.violations += 1;
    }
    sched.leave(run.group_id, &me)?;
    Ok(report)
}

/// Run one group on OS threads. The scheduler must hand off on leave,
/// otherwise the last rotation strands everyone behind the first leaver.
pub fn run_group_threads(sched: Arc<Scheduler>, run: GroupRun) -> anyhow::Result<GroupReport> {
    if !sched.config().wakes_on_leave() {
        bail!("stress runs need a scheduler with wake-on-leave enabled");
    }
    let turns = Arc::new(Turns::new(run.members));
    let mut handles = Vec::with_capacity(run.members);

    for index in 0..run.members {
        let (sched_ref, turns) = (sched.clone(), turns.clone());
        handles.push(thread::spawn(move || {
            thread_member(&sched_ref, run, index, &turns)
        }));
        // Join order defines ring order: admit members one at a time.
        wait_for_members(&sched, run.group_id, index + 1)?;
    }

    let mut report = GroupReport {
        group_id: run.group_id.0,
        ..Default::default()
    };
    for handle in handles {
        let member = handle
            .join()
            .map_err(|_| anyhow!("member thread panicked"))??;
        report.absorb(member);
    }
    tracing::debug!(group = %run.group_id, turns = report.turns, "thread group done");
    Ok(report)
}

// ── Tasks ────────────────────────────────────────────────────────────────

async fn wait_for_task_members(
    sched: &AsyncScheduler,
    group_id: GroupId,
    n: usize,
) -> anyhow::Result<()> {
    let deadline = Instant::now() + JOIN_TIMEOUT;
    while member_count(&sched.snapshot(), group_id) < n {
        if Instant::now() >= deadline {
            bail!("group {group_id}: timed out waiting for {n} members");
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    Ok(())
}

async fn task_member(
    sched: Arc<AsyncScheduler>,
    run: GroupRun,
    index: usize,
    turns: Arc<Turns>,
) -> anyhow::Result<MemberReport> {
    let me = TaskCaller::new();
    sched.join(run.group_id, &me).await?;
    if index == 0 {
        wait_for_task_members(&sched, run.group_id, run.members).await?;
    }

    let mut report = MemberReport::default();
    for _ in 0..run.rounds {
        report.turns += 1;
        if !turns.take(index) {
            report.violations += 1;
        }
        let t0 = Instant::now();
        sched.switch(run.group_id, &me).await?;
        report.rotations_us.push(t0.elapsed().as_secs_f64() * 1e6);
    }
    report.turns += 1;
    if !turns.take(index) {
        report.violations += 1;
    }
    sched.leave(run.group_id, &me)?;
    Ok(report)
}

/// Run one group on tokio tasks.
pub async fn run_group_tasks(
    sched: Arc<AsyncScheduler>,
    run: GroupRun,
) -> anyhow::Result<GroupReport> {
    if !sched.config().wakes_on_leave() {
        bail!("stress runs need a scheduler with wake-on-leave enabled");
    }
    let turns = Arc::new(Turns::new(run.members));
    let mut handles = Vec::with_capacity(run.members);

    for index in 0..run.members {
        handles.push(tokio::spawn(task_member(
            sched.clone(),
            run,
            index,
            turns.clone(),
        )));
        wait_for_task_members(&sched, run.group_id, index + 1).await?;
    }

    let mut report = GroupReport {
        group_id: run.group_id.0,
        ..Default::default()
    };
    for handle in handles {
        report.absorb(handle.await??);
    }
    tracing::debug!(group = %run.group_id, turns = report.turns, "task group done");
    Ok(report)
}
