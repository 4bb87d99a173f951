use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::ports::{CommandRunner, CommandSpec};
use crate::domain::run::{RunReport, StepKind, StepReport, TriggerReason};
use crate::domain::CertConfig;
use crate::infrastructure::config::AppConfig;

pub const PRIVKEY_FILE_NAME: &str = "privkey.pem";
pub const FULLCHAIN_FILE_NAME: &str = "fullchain.pem";
const BOOTSTRAP_SCRIPT: &str = r#"curl "$0" | sh -s "email=$1""#;

/// Locations and fixed arguments of the external tools the pipeline drives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toolchain {
    pub shell: PathBuf,
    pub acme_installer_url: String,
    pub acme_sh: PathBuf,
    pub ca_server: String,
    pub certificate_profile: String,
    pub nginx: PathBuf,
}

impl Toolchain {
    pub fn with_acme_home(acme_home: &Path) -> Self {
        Self {
            shell: PathBuf::from("sh"),
            acme_installer_url: "https://get.acme.sh".to_string(),
            acme_sh: acme_home.join("acme.sh"),
            ca_server: "letsencrypt".to_string(),
            certificate_profile: "shortlived".to_string(),
            nginx: PathBuf::from("nginx"),
        }
    }
}

impl From<&AppConfig> for Toolchain {
    fn from(config: &AppConfig) -> Self {
        Self::with_acme_home(&config.acme_home)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlannedStep {
    Command { kind: StepKind, command: CommandSpec },
    PrepareDir { path: PathBuf },
}

impl PlannedStep {
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Command { kind, .. } => *kind,
            Self::PrepareDir { .. } => StepKind::PrepareInstallDir,
        }
    }
}

/// Bootstrap, CA selection, issue, per-path install, nginx test and reload.
///
/// Steps are independent best-effort actions: a failure is recorded and the
/// next step still runs. There is no retry; the next run is the retry.
pub struct RenewalPipeline {
    runner: Arc<dyn CommandRunner>,
    toolchain: Toolchain,
}

impl RenewalPipeline {
    pub fn new(runner: Arc<dyn CommandRunner>, toolchain: Toolchain) -> Self {
        Self { runner, toolchain }
    }

    pub fn plan(&self, config: &CertConfig) -> Vec<PlannedStep> {
        let tools = &self.toolchain;
        let mut steps = vec![
            PlannedStep::Command {
                kind: StepKind::Bootstrap,
                // url and email travel as $0/$1 so the shell never parses them
                command: CommandSpec::new(&tools.shell)
                    .args(["-c", BOOTSTRAP_SCRIPT])
                    .arg(&tools.acme_installer_url)
                    .arg(&config.email),
            },
            PlannedStep::Command {
                kind: StepKind::SetDefaultCa,
                command: CommandSpec::new(&tools.acme_sh)
                    .args(["--set-default-ca", "--server"])
                    .arg(&tools.ca_server),
            },
            PlannedStep::Command {
                kind: StepKind::Issue,
                command: CommandSpec::new(&tools.acme_sh)
                    .args(["--issue", "--server"])
                    .arg(&tools.ca_server)
                    .arg("--certificate-profile")
                    .arg(&tools.certificate_profile)
                    .arg("--days")
                    .arg(config.renew_days.to_string())
                    .arg("-d")
                    .arg(&config.ip_addr)
                    .arg("-w")
                    .arg(&config.webroot),
            },
        ];

        for install_path in &config.install_paths {
            let dir = PathBuf::from(install_path);
            steps.push(PlannedStep::PrepareDir { path: dir.clone() });
            steps.push(PlannedStep::Command {
                kind: StepKind::InstallCert,
                command: CommandSpec::new(&tools.acme_sh)
                    .args(["--install-cert", "-d"])
                    .arg(&config.ip_addr)
                    .arg("--key-file")
                    .arg(dir.join(PRIVKEY_FILE_NAME).display().to_string())
                    .arg("--fullchain-file")
                    .arg(dir.join(FULLCHAIN_FILE_NAME).display().to_string()),
            });
        }

        steps.push(PlannedStep::Command {
            kind: StepKind::NginxTest,
            command: CommandSpec::new(&tools.nginx).arg("-t"),
        });
        steps.push(PlannedStep::Command {
            kind: StepKind::NginxReload,
            command: CommandSpec::new(&tools.nginx).args(["-s", "reload"]),
        });
        steps
    }

    /// Executes every planned step against `config`, a snapshot taken by the
    /// caller; later config edits do not reach an in-flight run.
    pub async fn run(&self, trigger: TriggerReason, config: CertConfig) -> RunReport {
        let mut report = RunReport::new(trigger);
        tracing::info!(
            run_id = %report.id,
            trigger = %trigger,
            ip_addr = %config.ip_addr,
            install_paths = config.install_paths.len(),
            "renewal run started"
        );

        for step in self.plan(&config) {
            let step_report = match step {
                PlannedStep::Command { kind, command } => {
                    tracing::info!(run_id = %report.id, step = %kind, "renewal step");
                    let outcome = self.runner.run(&command).await;
                    if !outcome.success {
                        tracing::warn!(
                            run_id = %report.id,
                            step = %kind,
                            command = %command,
                            error = outcome.detail.as_deref().unwrap_or("unknown"),
                            "renewal step failed"
                        );
                    }
                    StepReport {
                        kind,
                        command: command.to_string(),
                        success: outcome.success,
                        detail: outcome.detail,
                    }
                }
                PlannedStep::PrepareDir { path } => prepare_install_dir(&report, &path).await,
            };
            report.steps.push(step_report);
        }

        tracing::info!(
            run_id = %report.id,
            trigger = %trigger,
            total_steps = report.steps.len(),
            failed_steps = report.failed_steps(),
            "renewal run finished"
        );
        report
    }
}

async fn prepare_install_dir(report: &RunReport, path: &Path) -> StepReport {
    let command = format!("mkdir -p {}", path.display());
    match tokio::fs::create_dir_all(path).await {
        Ok(()) => StepReport {
            kind: StepKind::PrepareInstallDir,
            command,
            success: true,
            detail: None,
        },
        Err(error) => {
            tracing::warn!(
                run_id = %report.id,
                path = %path.display(),
                error = %error,
                "failed to create install dir"
            );
            StepReport {
                kind: StepKind::PrepareInstallDir,
                command,
                success: false,
                detail: Some(error.to_string()),
            }
        }
    }
}
