use anyhow::{anyhow, bail, Context, Result};
use std::process::Command;
use std::time::{Duration, Instant};

use crate::domain::ports::ProcessTable;

/// How long startup waits for signalled instances to exit and free the port.
pub const EXIT_WAIT: Duration = Duration::from_secs(5);
const EXIT_POLL: Duration = Duration::from_millis(100);

/// What happened during startup singleton enforcement. Logged once tracing
/// is up, since enforcement runs before the log sink exists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SingletonReport {
    pub terminated: Vec<u32>,
    /// Signalled pids still listed when the exit wait ran out.
    pub still_running: Vec<u32>,
    pub failures: Vec<(Option<u32>, String)>,
}

impl SingletonReport {
    pub fn log(&self) {
        for pid in &self.terminated {
            tracing::info!(pid, "terminated previous agent instance");
        }
        for pid in &self.still_running {
            tracing::warn!(pid, "previous agent instance did not exit in time");
        }
        for (pid, error) in &self.failures {
            tracing::warn!(pid = ?pid, error = %error, "singleton enforcement step failed");
        }
    }
}

/// Sends a termination signal to every other process matching this agent's
/// invocation, then waits up to [`EXIT_WAIT`] for them to go away. Never
/// fails: errors are collected in the report.
pub fn enforce_singleton(table: &dyn ProcessTable, own_pid: u32) -> SingletonReport {
    enforce_singleton_within(table, own_pid, EXIT_WAIT)
}

pub fn enforce_singleton_within(
    table: &dyn ProcessTable,
    own_pid: u32,
    exit_wait: Duration,
) -> SingletonReport {
    let mut report = SingletonReport::default();
    let pids = match table.list_matching() {
        Ok(pids) => pids,
        Err(error) => {
            report.failures.push((None, format!("{error:#}")));
            return report;
        }
    };

    for pid in pids.into_iter().filter(|pid| *pid != own_pid) {
        match table.terminate(pid) {
            Ok(()) => report.terminated.push(pid),
            Err(error) => report.failures.push((Some(pid), format!("{error:#}"))),
        }
    }
    if !report.terminated.is_empty() {
        wait_for_exit(table, exit_wait, &mut report);
    }
    report
}

fn wait_for_exit(table: &dyn ProcessTable, exit_wait: Duration, report: &mut SingletonReport) {
    let deadline = Instant::now() + exit_wait;
    loop {
        let listed = match table.list_matching() {
            Ok(listed) => listed,
            Err(error) => {
                report.failures.push((None, format!("{error:#}")));
                return;
            }
        };
        let remaining: Vec<u32> = report
            .terminated
            .iter()
            .copied()
            .filter(|pid| listed.contains(pid))
            .collect();
        let now = Instant::now();
        if remaining.is_empty() || now >= deadline {
            report.still_running = remaining;
            return;
        }
        std::thread::sleep(EXIT_POLL.min(deadline - now));
    }
}

/// `pgrep -f <pattern>` for enumeration, SIGTERM for termination.
#[derive(Clone, Debug)]
pub struct PgrepProcessTable {
    pattern: String,
}

impl PgrepProcessTable {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Matches on `argv[0]` of the running process.
    pub fn for_current_process() -> Self {
        let pattern = std::env::args().next().unwrap_or_else(|| "cert-agent".to_string());
        Self::new(pattern)
    }
}

impl ProcessTable for PgrepProcessTable {
    fn list_matching(&self) -> Result<Vec<u32>> {
        let output = Command::new("pgrep")
            .arg("-f")
            .arg(&self.pattern)
            .output()
            .context("failed to run pgrep")?;
        // pgrep exits 1 when nothing matched
        if !output.status.success() && output.status.code() != Some(1) {
            bail!("pgrep exited with {}", output.status);
        }
        Ok(parse_pids(&String::from_utf8_lossy(&output.stdout)))
    }

    fn terminate(&self, pid: u32) -> Result<()> {
        send_sigterm(pid)
    }
}

fn parse_pids(stdout: &str) -> Vec<u32> {
    stdout
        .split_whitespace()
        .filter_map(|token| token.parse::<u32>().ok())
        .collect()
}

#[cfg(unix)]
fn send_sigterm(pid: u32) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| anyhow!("pid out of range: {pid}"))?;
    kill(Pid::from_raw(raw), Signal::SIGTERM)
        .with_context(|| format!("failed to send SIGTERM to {pid}"))
}

#[cfg(not(unix))]
fn send_sigterm(pid: u32) -> Result<()> {
    Err(anyhow!("terminating {pid} is not supported on this platform"))
}
