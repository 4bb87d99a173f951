//! Shared fixtures: a recording command runner, a fake process table and
//! tempdir-backed app state.
#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use base64::Engine;
use cert_agent::application::{RenewalPipeline, Toolchain};
use cert_agent::domain::ports::{CommandOutcome, CommandRunner, CommandSpec, ProcessTable};
use cert_agent::domain::CertConfig;
use cert_agent::infrastructure::config_store::ConfigStore;
use cert_agent::interface::http::AppState;
use cert_agent::runtime::scheduler::Scheduler;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const ACME_HOME: &str = "/opt/acme-test";
pub const ACME_SH: &str = "/opt/acme-test/acme.sh";

// ---------------------------------------------------------------------------
// RecordingRunner
// ---------------------------------------------------------------------------

type Predicate = Box<dyn Fn(&CommandSpec) -> bool + Send + Sync>;

/// CommandRunner that records every command and fails or panics on the
/// commands matched by its predicates.
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    fail_when: Predicate,
    panic_when: Predicate,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_when: Box::new(|_| false),
            panic_when: Box::new(|_| false),
        }
    }

    pub fn failing(predicate: impl Fn(&CommandSpec) -> bool + Send + Sync + 'static) -> Self {
        Self {
            fail_when: Box::new(predicate),
            ..Self::new()
        }
    }

    pub fn panicking(predicate: impl Fn(&CommandSpec) -> bool + Send + Sync + 'static) -> Self {
        Self {
            panic_when: Box::new(predicate),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn rendered_calls(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }

    /// Polls until at least `count` commands were recorded.
    pub async fn wait_for_calls(&self, count: usize) -> Vec<CommandSpec> {
        for _ in 0..200 {
            let calls = self.calls();
            if calls.len() >= count {
                return calls;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} commands, saw {:?}", self.rendered_calls());
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &CommandSpec) -> CommandOutcome {
        self.calls.lock().unwrap().push(command.clone());
        if (self.panic_when)(command) {
            panic!("runner exploded on {command}");
        }
        if (self.fail_when)(command) {
            CommandOutcome::failed(format!("{} exit status: 1", command.program_name()))
        } else {
            CommandOutcome::succeeded()
        }
    }
}

pub fn is_issue(command: &CommandSpec) -> bool {
    command.args.first().map(String::as_str) == Some("--issue")
}

// ---------------------------------------------------------------------------
// FakeProcessTable
// ---------------------------------------------------------------------------

/// Terminated pids drop out of later listings unless `ignore_signals` is set.
pub struct FakeProcessTable {
    pub listed: Result<Vec<u32>, String>,
    pub refuse: Vec<u32>,
    pub ignore_signals: bool,
    pub terminated: Mutex<Vec<u32>>,
    pub list_calls: Mutex<usize>,
}

impl FakeProcessTable {
    pub fn with_pids(pids: Vec<u32>) -> Self {
        Self {
            listed: Ok(pids),
            refuse: Vec::new(),
            ignore_signals: false,
            terminated: Mutex::new(Vec::new()),
            list_calls: Mutex::new(0),
        }
    }

    pub fn broken(message: &str) -> Self {
        Self {
            listed: Err(message.to_string()),
            refuse: Vec::new(),
            ignore_signals: false,
            terminated: Mutex::new(Vec::new()),
            list_calls: Mutex::new(0),
        }
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.terminated.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }
}

impl ProcessTable for FakeProcessTable {
    fn list_matching(&self) -> Result<Vec<u32>> {
        *self.list_calls.lock().unwrap() += 1;
        let terminated = self.terminated();
        match &self.listed {
            Ok(pids) => Ok(pids
                .iter()
                .copied()
                .filter(|pid| self.ignore_signals || !terminated.contains(pid))
                .collect()),
            Err(message) => bail!("{message}"),
        }
    }

    fn terminate(&self, pid: u32) -> Result<()> {
        if self.refuse.contains(&pid) {
            bail!("operation not permitted");
        }
        self.terminated.lock().unwrap().push(pid);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

pub fn sample_config(install_root: &Path) -> CertConfig {
    CertConfig {
        ip_addr: "203.0.113.7".to_string(),
        webroot: "/var/www/203.0.113.7".to_string(),
        email: "ops@example.com".to_string(),
        renew_days: 3,
        install_paths: vec![
            install_root.join("site-a").display().to_string(),
            install_root.join("site-b").display().to_string(),
        ],
        web_enable: true,
        web_user: "admin".to_string(),
        web_pass: "123456".to_string(),
    }
}

pub fn test_pipeline(runner: Arc<RecordingRunner>) -> RenewalPipeline {
    RenewalPipeline::new(runner, Toolchain::with_acme_home(Path::new(ACME_HOME)))
}

pub struct TestEnv {
    pub temp: TempDir,
    pub state: AppState,
    pub store: ConfigStore,
    pub runner: Arc<RecordingRunner>,
    pub config_path: PathBuf,
}

/// Tempdir-backed state with the config built by `make_config` (given the
/// tempdir root) persisted on disk and loaded through `ConfigStore::load`.
/// Hold `TestEnv::temp` for the test's duration.
pub async fn build_test_env(
    runner: RecordingRunner,
    make_config: impl FnOnce(&Path) -> CertConfig,
) -> TestEnv {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = make_config(temp.path());
    let config_path = temp.path().join("config.json");
    std::fs::write(
        &config_path,
        serde_json::to_string_pretty(&config).expect("serialize config"),
    )
    .expect("write config");
    let web_index_path = temp.path().join("web/index.html");
    std::fs::create_dir_all(temp.path().join("web")).expect("web dir");
    std::fs::write(&web_index_path, "<html>control page</html>").expect("write index");

    let store = ConfigStore::load(&config_path).await;
    let runner = Arc::new(runner);
    let scheduler = Arc::new(Scheduler::new(
        Arc::new(test_pipeline(runner.clone())),
        store.clone(),
        Duration::from_secs(6 * 60 * 60),
    ));
    let state = AppState::new(store.clone(), scheduler, web_index_path);

    TestEnv {
        temp,
        state,
        store,
        runner,
        config_path,
    }
}

pub async fn default_test_env() -> TestEnv {
    build_test_env(RecordingRunner::new(), sample_config).await
}

pub fn basic_auth(user: &str, pass: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
}
