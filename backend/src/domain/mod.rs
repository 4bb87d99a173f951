pub mod audit;
pub mod config;
pub mod error;
pub mod ports;
pub mod run;

pub use config::CertConfig;
pub use error::{AppError, ConfigError, ErrorCode};
