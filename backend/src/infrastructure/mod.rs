pub mod config;
pub mod config_store;
pub mod logging;
pub mod process;
pub mod public_ip;
pub mod runtime_assets;
pub mod singleton;
