use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerReason {
    Scheduled,
    Manual,
}

impl TriggerReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    Bootstrap,
    SetDefaultCa,
    Issue,
    PrepareInstallDir,
    InstallCert,
    NginxTest,
    NginxReload,
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bootstrap => "bootstrap",
            Self::SetDefaultCa => "set_default_ca",
            Self::Issue => "issue",
            Self::PrepareInstallDir => "prepare_install_dir",
            Self::InstallCert => "install_cert",
            Self::NginxTest => "nginx_test",
            Self::NginxReload => "nginx_reload",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct StepReport {
    pub kind: StepKind,
    pub command: String,
    pub success: bool,
    pub detail: Option<String>,
}

/// Outcome of one pipeline execution. Only ever logged, never stored.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub id: Uuid,
    pub trigger: TriggerReason,
    pub started_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
}

impl RunReport {
    pub fn new(trigger: TriggerReason) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger,
            started_at: Utc::now(),
            steps: Vec::new(),
        }
    }

    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|step| !step.success).count()
    }

    pub fn step_kinds(&self) -> Vec<StepKind> {
        self.steps.iter().map(|step| step.kind).collect()
    }
}
