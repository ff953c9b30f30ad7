/// Configuration for a [`Scheduler`](crate::Scheduler) or
/// [`AsyncScheduler`](crate::AsyncScheduler).
///
/// All fields have defaults matching the classic container semantics:
/// unbounded registry, no handoff on leave, no registry dumps.
///
/// ```rust
/// use pcon_sched::SchedulerConfig;
///
/// let config = SchedulerConfig::new()
///     .max_groups(64)
///     .max_members_per_group(16)
///     .wake_on_leave(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum number of live groups. `None` = limited only by memory.
    pub(crate) max_groups: Option<usize>,
    /// Maximum members in one group. `None` = limited only by memory.
    pub(crate) max_members_per_group: Option<usize>,
    /// Leave by the possession holder wakes the next member of the ring.
    pub(crate) wake_on_leave: bool,
    /// Log a full registry snapshot after every structural mutation.
    pub(crate) trace_registry: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_groups: None,
            max_members_per_group: None,
            wake_on_leave: false,
            trace_registry: false,
        }
    }
}

impl SchedulerConfig {
    /// Create a config with defaults, then apply environment overrides.
    ///
    /// Recognised variables: `PCON_MAX_GROUPS`, `PCON_MAX_MEMBERS`,
    /// `PCON_WAKE_ON_LEAVE`, `PCON_TRACE_REGISTRY`. Unparseable values are
    /// ignored with a warning.
    pub fn new() -> Self {
        let mut config = Self::default();
        if let Some(n) = env_usize("PCON_MAX_GROUPS") {
            config.max_groups = Some(n);
        }
        if let Some(n) = env_usize("PCON_MAX_MEMBERS") {
            config.max_members_per_group = Some(n);
        }
        if let Some(b) = env_flag("PCON_WAKE_ON_LEAVE") {
            config.wake_on_leave = b;
        }
        if let Some(b) = env_flag("PCON_TRACE_REGISTRY") {
            config.trace_registry = b;
        }
        config
    }

    /// Cap the number of live groups. Joins that would create a group
    /// beyond the cap fail with `ResourceExhausted`.
    pub fn max_groups(mut self, n: usize) -> Self {
        self.max_groups = Some(n);
        self
    }

    /// Cap the number of members per group.
    pub fn max_members_per_group(mut self, n: usize) -> Self {
        self.max_members_per_group = Some(n);
        self
    }

    /// When the possession holder leaves, wake its successor so the
    /// remaining members are not stranded.
    pub fn wake_on_leave(mut self, enabled: bool) -> Self {
        self.wake_on_leave = enabled;
        self
    }

    /// Dump the registry at `debug` level after each mutation.
    pub fn trace_registry(mut self, enabled: bool) -> Self {
        self.trace_registry = enabled;
        self
    }

    pub fn wakes_on_leave(&self) -> bool {
        self.wake_on_leave
    }
}

fn env_usize(key: &str) -> Option<usize> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::warn!("ignoring {key}={raw:?}: {e}");
            None
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    let parsed = parse_flag(&raw);
    if parsed.is_none() {
        tracing::warn!("ignoring {key}={raw:?}: expected a boolean");
    }
    parsed
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
