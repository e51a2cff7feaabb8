pub mod alignment;
pub mod checkpoint;
pub mod error;
pub mod evolution;
pub mod fitness;
pub mod gene;
pub mod genome;
pub mod innovation;
pub mod report;
pub mod reproduction;
pub mod speciation;
pub mod topology;

pub use checkpoint::GenomeCheckpoint;
pub use error::NeatError;
pub use evolution::{EvolutionState, Evolver};
pub use fitness::{BoxError, Edge, FitnessFunction, Phenotype};
pub use gene::{ConnectionGene, Innovation, NodeId};
pub use genome::Genome;
pub use innovation::GeneRegistry;
pub use report::{FitnessStats, GenerationReport, LogReporter, NoopReporter, ReportSink, SpeciesReport};
pub use speciation::Species;
pub use topology::{Node, NodeTopology, TopologySummary};
