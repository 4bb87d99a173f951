pub mod config_service;
pub mod pipeline;

pub use config_service::ConfigService;
pub use pipeline::{PlannedStep, RenewalPipeline, Toolchain};
