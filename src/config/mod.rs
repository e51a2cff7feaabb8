pub mod neat_config;
pub mod run_config;

pub use neat_config::{ConfigError, NeatConfig};
pub use run_config::{RunConfig, RunSettings};
