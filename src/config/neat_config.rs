use serde::{Deserialize, Serialize};

/// Rates and coefficients driving speciation and reproduction.
///
/// Every field except `max_stagnation` and `max_sampling_attempts` has to be
/// present when the configuration is loaded from a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeatConfig {
    /// Coefficient of the excess gene count in the compatibility distance.
    pub excess_weight: f64,
    /// Coefficient of the disjoint gene count in the compatibility distance.
    pub disjoint_weight: f64,
    /// Coefficient of the average weight difference of matching genes.
    pub weight_weight: f64,
    /// Initial compatibility threshold, retuned after every speciation.
    pub compatibility_threshold: f64,
    /// Divisor applied to the excess and disjoint terms.
    pub normalization: f64,
    pub mutation_without_crossover_rate: f64,
    pub weight_mutation_rate: f64,
    pub add_node_mutation_rate: f64,
    pub add_link_mutation_rate: f64,
    pub interspecies_crossover_rate: f64,
    /// Probability that a matching gene gets the mean of both parents' weights.
    pub crossover_weight_average_rate: f64,
    /// Per gene probability of drawing a fresh weight in [-1, 1].
    pub random_weight_mutation_rate: f64,
    /// Per gene probability of a fixed +/- `uniform_perturbation` step.
    pub uniform_weight_mutation_rate: f64,
    pub uniform_perturbation: f64,
    /// Probability of re-enabling a disabled gene inherited through crossover.
    pub enable_if_both_parents_disabled: f64,
    pub population_size: usize,
    /// Generations a species champion may hold on before its species is pruned.
    #[serde(default = "default_max_stagnation")]
    pub max_stagnation: usize,
    /// Retry budget for random node/gene sampling in structural mutations.
    #[serde(default = "default_max_sampling_attempts")]
    pub max_sampling_attempts: usize,
}

fn default_max_stagnation() -> usize {
    50
}

fn default_max_sampling_attempts() -> usize {
    100
}

impl Default for NeatConfig {
    fn default() -> Self {
        NeatConfig {
            excess_weight: 1.0,
            disjoint_weight: 1.0,
            weight_weight: 0.4,
            compatibility_threshold: 2.0,
            normalization: 1.0,
            mutation_without_crossover_rate: 0.25,
            weight_mutation_rate: 0.8,
            add_node_mutation_rate: 0.03,
            add_link_mutation_rate: 0.1,
            interspecies_crossover_rate: 0.05,
            crossover_weight_average_rate: 0.4,
            random_weight_mutation_rate: 0.1,
            uniform_weight_mutation_rate: 0.9,
            uniform_perturbation: 0.1,
            enable_if_both_parents_disabled: 0.25,
            population_size: 100,
            max_stagnation: default_max_stagnation(),
            max_sampling_attempts: default_max_sampling_attempts(),
        }
    }
}

impl NeatConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("mutation_without_crossover_rate", self.mutation_without_crossover_rate),
            ("weight_mutation_rate", self.weight_mutation_rate),
            ("add_node_mutation_rate", self.add_node_mutation_rate),
            ("add_link_mutation_rate", self.add_link_mutation_rate),
            ("interspecies_crossover_rate", self.interspecies_crossover_rate),
            ("crossover_weight_average_rate", self.crossover_weight_average_rate),
            ("random_weight_mutation_rate", self.random_weight_mutation_rate),
            ("uniform_weight_mutation_rate", self.uniform_weight_mutation_rate),
            ("enable_if_both_parents_disabled", self.enable_if_both_parents_disabled),
        ];

        for (name, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }

        let coefficients = [
            ("excess_weight", self.excess_weight),
            ("disjoint_weight", self.disjoint_weight),
            ("weight_weight", self.weight_weight),
            ("uniform_perturbation", self.uniform_perturbation),
        ];

        for (name, value) in coefficients {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidCoefficient { name, value });
            }
        }

        if !self.compatibility_threshold.is_finite() || self.compatibility_threshold <= 0.0 {
            return Err(ConfigError::InvalidThreshold(self.compatibility_threshold));
        }
        if !self.normalization.is_finite() || self.normalization <= 0.0 {
            return Err(ConfigError::InvalidNormalization(self.normalization));
        }
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.max_sampling_attempts == 0 {
            return Err(ConfigError::NoSamplingAttempts);
        }

        Ok(())
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Rate {name} must lie in [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
    #[error("Coefficient {name} must be finite and non-negative, got {value}")]
    InvalidCoefficient { name: &'static str, value: f64 },
    #[error("Compatibility threshold must be positive, got {0}")]
    InvalidThreshold(f64),
    #[error("Normalization must be positive, got {0}")]
    InvalidNormalization(f64),
    #[error("Population size must be non-zero")]
    EmptyPopulation,
    #[error("Sampling attempt budget must be non-zero")]
    NoSamplingAttempts,
    #[error("Network needs at least one input and one output (got {inputs} inputs, {outputs} outputs)")]
    InvalidShape { inputs: usize, outputs: usize },
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}
