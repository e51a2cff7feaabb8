//! # neat-evolver
//!
//! Evolves neural network topologies and weights with a NEAT-style genetic
//! algorithm. Genes carry historical innovation markings so that genomes with
//! different topologies can be aligned gene by gene for crossover and for the
//! compatibility distance used to group the population into species.
//!
//! The crate is organised leaves first:
//!
//! - [`evolution::innovation`]: append-only registry of structural innovations
//! - [`evolution::topology`]: layered node space shared by every genome of a run
//! - [`evolution::genome`]: one individual and its mutation/crossover operators
//! - [`evolution::speciation`]: compatibility distance and species assignment
//! - [`evolution::reproduction`]: builds the next generation
//! - [`evolution::evolution`]: the driver owning population, registry and topology
//!
//! ```rust,no_run
//! use neat_evolver::config::NeatConfig;
//! use neat_evolver::evolution::{Edge, Evolver, TopologySummary};
//!
//! let mut evolver = Evolver::with_seed(NeatConfig::default(), 42).unwrap();
//! evolver.initialize(2, 1).unwrap();
//!
//! let fitness = |edges: &[Edge], _: &[Edge], _: &TopologySummary| edges.len() as f64;
//! let history = evolver.iterate(10, &fitness).unwrap();
//! if let Some(last) = history.last() {
//!     println!("max fitness: {}", last.fitness.max);
//! }
//! ```

pub mod common;
pub mod config;
pub mod evolution;
