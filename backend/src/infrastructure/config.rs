use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.json";
const LOG_FILE_NAME: &str = "cert-agent.log";
const WEB_INDEX_RELATIVE: &str = "web/index.html";
const DEFAULT_RENEW_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);
/// Upper bound for `CERT_AGENT_RENEW_INTERVAL_SECS`; larger values overflow timer deadlines.
pub const MAX_RENEW_INTERVAL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);
const DEFAULT_PUBLIC_IP_URL: &str = "https://api.ipify.org?format=text";

/// Process-level settings. Everything the operator edits at runtime lives in
/// `CertConfig`; this only locates files and tunes the daemon itself.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
    pub web_index_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_file_name: String,
    pub log_level: String,
    pub log_retention_days: u16,
    pub host: String,
    pub port: u16,
    pub renew_interval: Duration,
    pub acme_home: PathBuf,
    pub public_ip_url: String,
}

impl AppConfig {
    /// Defaults rooted at the directory holding the running executable,
    /// then overridden from `CERT_AGENT_*` environment variables.
    pub fn from_env() -> Self {
        let base_dir = env::var_os("CERT_AGENT_BASE_DIR")
            .map(PathBuf::from)
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or_else(executable_dir);
        let mut config = Self::for_base_dir(base_dir);

        if let Ok(host) = env::var("CERT_AGENT_HOST") {
            if !host.trim().is_empty() {
                config.host = host;
            }
        }
        if let Some(port) = env::var("CERT_AGENT_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
        {
            config.port = port;
        }
        if let Ok(level) = env::var("CERT_AGENT_LOG_LEVEL") {
            config.log_level = normalize_log_level(level);
        }
        if let Some(secs) = env::var("CERT_AGENT_RENEW_INTERVAL_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0 && *secs <= MAX_RENEW_INTERVAL.as_secs())
        {
            config.renew_interval = Duration::from_secs(secs);
        }

        config
    }

    pub fn for_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            config_path: base_dir.join(CONFIG_FILE_NAME),
            web_index_path: base_dir.join(WEB_INDEX_RELATIVE),
            log_dir: base_dir.clone(),
            log_file_name: LOG_FILE_NAME.to_string(),
            log_level: "info".to_string(),
            log_retention_days: 30,
            host: "0.0.0.0".to_string(),
            port: 8080,
            renew_interval: DEFAULT_RENEW_INTERVAL,
            acme_home: default_acme_home(&base_dir),
            public_ip_url: DEFAULT_PUBLIC_IP_URL.to_string(),
            base_dir,
        }
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(&self.log_file_name)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn executable_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_acme_home(fallback: &Path) -> PathBuf {
    env::var_os("HOME")
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| fallback.to_path_buf())
        .join(".acme.sh")
}

fn normalize_log_level(level: String) -> String {
    match level.to_ascii_lowercase().as_str() {
        "trace" => "trace".to_string(),
        "debug" => "debug".to_string(),
        "info" => "info".to_string(),
        "warning" | "warn" => "warn".to_string(),
        "error" => "error".to_string(),
        _ => "info".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_rooted_at_base_dir() {
        let config = AppConfig::for_base_dir("/opt/cert-agent");
        assert_eq!(config.config_path, PathBuf::from("/opt/cert-agent/config.json"));
        assert_eq!(
            config.web_index_path,
            PathBuf::from("/opt/cert-agent/web/index.html")
        );
        assert_eq!(config.log_file(), PathBuf::from("/opt/cert-agent/cert-agent.log"));
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.renew_interval, Duration::from_secs(21_600));
    }

    #[test]
    fn unknown_log_levels_fall_back_to_info() {
        assert_eq!(normalize_log_level("WARNING".to_string()), "warn");
        assert_eq!(normalize_log_level("loud".to_string()), "info");
    }
}
