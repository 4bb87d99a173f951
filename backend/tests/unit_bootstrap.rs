mod support;

use cert_agent::infrastructure::config::AppConfig;
use cert_agent::infrastructure::runtime_assets::{DEFAULT_CONFIG_JSON, DEFAULT_INDEX_HTML};
use cert_agent::runtime::bootstrap::bootstrap_runtime_files;
use cert_agent::runtime::build_app;
use std::sync::Arc;
use support::RecordingRunner;
use tempfile::tempdir;

#[tokio::test]
async fn build_app_seeds_config_and_control_page() {
    let temp = tempdir().expect("tempdir");
    let config = AppConfig::for_base_dir(temp.path());

    let state = build_app(&config, Arc::new(RecordingRunner::new()))
        .await
        .expect("build_app");

    assert_eq!(
        std::fs::read_to_string(&config.config_path).unwrap(),
        DEFAULT_CONFIG_JSON
    );
    assert_eq!(
        std::fs::read_to_string(&config.web_index_path).unwrap(),
        DEFAULT_INDEX_HTML
    );
    assert_eq!(state.config.get().await.renew_days, 3);
    assert_eq!(state.scheduler.period(), config.renew_interval);
}

#[tokio::test]
async fn existing_control_page_is_left_alone() {
    let temp = tempdir().expect("tempdir");
    let config = AppConfig::for_base_dir(temp.path());
    std::fs::create_dir_all(temp.path().join("web")).unwrap();
    std::fs::write(&config.web_index_path, "<p>custom</p>").unwrap();

    bootstrap_runtime_files(&config).await.expect("bootstrap");

    assert_eq!(
        std::fs::read_to_string(&config.web_index_path).unwrap(),
        "<p>custom</p>"
    );
}
