use crate::output;
use serde::Serialize;
use std::io::Write;

/// Emit one JSONL event on stdout (and the mirror file, if any).
pub fn emit<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        let _ = writeln!(lock, "{json}");
        let _ = lock.flush();

        output::mirror_line(&json);
    }
}

#[derive(Serialize)]
pub struct EventStarted {
    pub event: &'static str,
    pub mode: &'static str,
    pub runtime: &'static str,
    pub groups: u64,
    pub members: usize,
    pub rounds: usize,
    pub timestamp: String,
}

impl EventStarted {
    pub fn new(
        mode: &'static str,
        runtime: &'static str,
        groups: u64,
        members: usize,
        rounds: usize,
    ) -> Self {
        Self {
            event: "started",
            mode,
            runtime,
            groups,
            members,
            rounds,
            timestamp: chrono::Local::now().to_rfc3339(),
        }
    }
}

/// Per-group result: turn count, ordering violations and how long a
/// full rotation took from the switching member's point of view.
#[derive(Serialize)]
pub struct EventGroupDone {
    pub event: &'static str,
    pub group_id: u64,
    pub turns: u64,
    pub order_violations: u64,
    pub rotation_mean_us: f64,
    pub rotation_p50_us: f64,
    pub rotation_p99_us: f64,
    pub rotation_max_us: f64,
    pub elapsed_s: f64,
}

#[derive(Serialize)]
pub struct EventSummary {
    pub event: &'static str,
    pub mode: &'static str,
    pub groups: u64,
    pub turns: u64,
    pub order_violations: u64,
    pub stats: serde_json::Value,
    pub elapsed_s: f64,
}
