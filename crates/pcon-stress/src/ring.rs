use crate::common::{run_group_tasks, run_group_threads, GroupRun, Runtime};
use crate::events::*;
use pcon_sched::{AsyncScheduler, GroupId, Scheduler, SchedulerConfig};
use std::sync::Arc;
use std::time::Instant;

pub struct RingConfig {
    pub members: usize,
    pub rounds: usize,
    pub runtime: Runtime,
    pub sched: SchedulerConfig,
}

/// One group, `members` callers passing the turn around `rounds` times.
pub async fn run(config: RingConfig, start: Instant) -> anyhow::Result<()> {
    emit(&EventStarted::new(
        "ring",
        config.runtime.name(),
        1,
        config.members,
        config.rounds,
    ));
    eprintln!(
        "Ring mode → {} members, {} rounds on {}",
        config.members,
        config.rounds,
        config.runtime.name()
    );

    let run = GroupRun {
        group_id: GroupId(1),
        members: config.members,
        rounds: config.rounds,
    };

    let (report, stats) = match config.runtime {
        Runtime::Threads => {
            let sched = Arc::new(Scheduler::with_config(config.sched));
            let worker = sched.clone();
            let report =
                tokio::task::spawn_blocking(move || run_group_threads(worker, run)).await??;
            (report, serde_json::to_value(sched.stats())?)
        }
        Runtime::Tasks => {
            let sched = Arc::new(AsyncScheduler::with_config(config.sched));
            let report = run_group_tasks(sched.clone(), run).await?;
            (report, serde_json::to_value(sched.stats())?)
        }
    };

    emit(&report.to_event(start));
    emit(&EventSummary {
        event: "summary",
        mode: "ring",
        groups: 1,
        turns: report.turns,
        order_violations: report.order_violations,
        stats,
        elapsed_s: start.elapsed().as_secs_f64(),
    });
    eprintln!(
        "  {} turns, {} out of order",
        report.turns, report.order_violations
    );
    Ok(())
}
