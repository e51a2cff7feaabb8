use ::config::{Config, Environment, File, FileFormat};
use log::info;
use serde::Deserialize;

use crate::config::neat_config::{ConfigError, NeatConfig};

#[derive(Debug, Clone, Deserialize)]
#[allow(unused)]
pub struct RunSettings {
    pub input_count: usize,
    pub output_count: usize,
    pub max_generations: usize,
    /// Fixed seed for the evolver's random stream; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Where the best genome of the final generation is written, if anywhere.
    #[serde(default)]
    pub checkpoint_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub neat: NeatConfig,
    pub run: RunSettings,
}

impl RunConfig {
    /// Loads `config/default` overridden by `NEAT__<SECTION>__<KEY>` variables.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file("config/default")
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("neat").separator("__").try_parsing(true))
            .build()?;

        info!("Using config: {:?}", s);

        Self::deserialize_validated(s)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        Self::deserialize_validated(s)
    }

    fn deserialize_validated(s: Config) -> Result<Self, ConfigError> {
        let deserialized: RunConfig = s.try_deserialize()?;

        deserialized.neat.validate()?;
        if deserialized.run.input_count == 0 || deserialized.run.output_count == 0 {
            return Err(ConfigError::InvalidShape {
                inputs: deserialized.run.input_count,
                outputs: deserialized.run.output_count,
            });
        }

        Ok(deserialized)
    }
}
