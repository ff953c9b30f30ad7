use crate::common::{run_group_tasks, run_group_threads, GroupReport, GroupRun, Runtime};
use crate::events::*;
use pcon_sched::{AsyncScheduler, GroupId, Scheduler, SchedulerConfig};
use std::sync::Arc;
use std::time::Instant;

pub struct FanoutConfig {
    pub groups: u64,
    pub members: usize,
    pub rounds: usize,
    pub runtime: Runtime,
    pub sched: SchedulerConfig,
}

/// `groups` independent rings sharing one scheduler.
pub async fn run(config: FanoutConfig, start: Instant) -> anyhow::Result<()> {
    emit(&EventStarted::new(
        "fanout",
        config.runtime.name(),
        config.groups,
        config.members,
        config.rounds,
    ));
    eprintln!(
        "Fanout mode → {} groups × {} members, {} rounds on {}",
        config.groups,
        config.members,
        config.rounds,
        config.runtime.name()
    );

    let runs: Vec<GroupRun> = (1..=config.groups)
        .map(|g| GroupRun {
            group_id: GroupId(g),
            members: config.members,
            rounds: config.rounds,
        })
        .collect();

    let (reports, stats) = match config.runtime {
        Runtime::Threads => {
            let sched = Arc::new(Scheduler::with_config(config.sched));
            let handles: Vec<_> = runs
                .into_iter()
                .map(|run| {
                    let sched = sched.clone();
                    tokio::task::spawn_blocking(move || run_group_threads(sched, run))
                })
                .collect();
            let mut reports = Vec::with_capacity(handles.len());
            for handle in handles {
                reports.push(handle.await??);
            }
            (reports, serde_json::to_value(sched.stats())?)
        }
        Runtime::Tasks => {
            let sched = Arc::new(AsyncScheduler::with_config(config.sched));
            let handles: Vec<_> = runs
                .into_iter()
                .map(|run| tokio::spawn(run_group_tasks(sched.clone(), run)))
                .collect();
            let mut reports = Vec::with_capacity(handles.len());
            for handle in handles {
                reports.push(handle.await??);
            }
            (reports, serde_json::to_value(sched.stats())?)
        }
    };

    for report in &reports {
        emit(&report.to_event(start));
    }
    let turns: u64 = reports.iter().map(|r: &GroupReport| r.turns).sum();
    let order_violations: u64 = reports.iter().map(|r| r.order_violations).sum();

    emit(&EventSummary {
        event: "summary",
        mode: "fanout",
        groups: config.groups,
        turns,
        order_violations,
        stats,
        elapsed_s: start.elapsed().as_secs_f64(),
    });
    eprintln!("  {turns} turns across {} groups, {order_violations} out of order", config.groups);
    Ok(())
}
