use crate::config::ConfigError;
use crate::evolution::evolution::EvolutionState;
use crate::evolution::fitness::BoxError;
use crate::evolution::gene::NodeId;

#[derive(Debug, thiserror::Error)]
pub enum NeatError {
    #[error("Operation requires the evolver to be {expected}, but it is {actual:?}")]
    InvalidState {
        expected: &'static str,
        actual: EvolutionState,
    },
    #[error("Gene references unknown node {0}")]
    UnknownNode(NodeId),
    #[error("Fitness evaluation failed for genome {genome}: {source}")]
    Evaluation {
        genome: usize,
        #[source]
        source: BoxError,
    },
    #[error("Fitness of genome {genome} is not finite: {value}")]
    NonFiniteFitness { genome: usize, value: f64 },
    #[error("Stagnation pruning removed all {pruned} species, no parents left to refill the population")]
    PopulationExhausted { pruned: usize },
    #[error("Population is empty")]
    EmptyPopulation,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Checkpoint serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Checkpoint I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
