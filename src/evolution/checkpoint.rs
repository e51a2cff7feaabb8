//! Self-contained snapshot of one decoded genome.
//!
//! Holds everything an external evaluator needs to rebuild the network
//! without the registry or topology of the run that produced it.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::evolution::error::NeatError;
use crate::evolution::fitness::Edge;
use crate::evolution::genome::Genome;
use crate::evolution::topology::NodeTopology;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenomeCheckpoint {
    pub layer_sizes: Vec<usize>,
    pub n_hidden_layers: usize,
    pub nodes_per_layer: usize,
    pub fitness: f64,
    /// Number of leading entries in `edges` that are feed-forward.
    pub feed_forward_count: usize,
    /// Feed-forward edges followed by recurrent edges.
    pub edges: Vec<Edge>,
}

impl GenomeCheckpoint {
    pub fn from_genome(genome: &Genome, topology: &NodeTopology) -> Result<GenomeCheckpoint, NeatError> {
        let phenotype = genome.decode(topology)?;
        let summary = topology.summary();
        let feed_forward_count = phenotype.edges.len();

        let mut edges = phenotype.edges;
        edges.extend(phenotype.recurrent_edges);

        Ok(GenomeCheckpoint {
            layer_sizes: summary.layer_sizes,
            n_hidden_layers: summary.n_hidden_layers,
            nodes_per_layer: summary.nodes_per_layer,
            fitness: genome.fitness,
            feed_forward_count,
            edges,
        })
    }

    pub fn feed_forward_edges(&self) -> &[Edge] {
        &self.edges[..self.feed_forward_count.min(self.edges.len())]
    }

    pub fn recurrent_edges(&self) -> &[Edge] {
        &self.edges[self.feed_forward_count.min(self.edges.len())..]
    }

    pub fn to_json(&self) -> Result<String, NeatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<GenomeCheckpoint, NeatError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), NeatError> {
        fs::write(path.as_ref(), self.to_json()?)?;
        info!("Checkpoint written to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod checkpoint_tests {
    use super::*;
    use crate::evolution::innovation::GeneRegistry;

    #[test]
    fn feed_forward_edges_come_first() {
        let mut registry = GeneRegistry::new();
        let topology = NodeTopology::with_io(2, 1);
        let mut genome = Genome::from_genes(vec![
            registry.lookup_or_create(2, 0, -0.5, true),
            registry.lookup_or_create(0, 2, 0.5, true),
            registry.lookup_or_create(1, 2, 0.25, false),
        ]);
        genome.fitness = 0.75;

        let checkpoint = GenomeCheckpoint::from_genome(&genome, &topology).unwrap();

        assert_eq!(checkpoint.layer_sizes, vec![2, 1]);
        assert_eq!(checkpoint.n_hidden_layers, 0);
        assert_eq!(checkpoint.fitness, 0.75);
        assert_eq!(checkpoint.edges.len(), 2);
        assert_eq!(checkpoint.feed_forward_edges().len(), 1);
        assert_eq!(checkpoint.feed_forward_edges()[0].weight, 0.5);
        assert_eq!(checkpoint.recurrent_edges().len(), 1);
        assert_eq!(checkpoint.recurrent_edges()[0].src_layer, 1);
    }

    #[test]
    fn json_keeps_edge_coordinates() {
        let mut registry = GeneRegistry::new();
        let topology = NodeTopology::with_io(1, 1);
        let genome = Genome::from_genes(vec![registry.lookup_or_create(0, 1, 0.125, true)]);
        let checkpoint = GenomeCheckpoint::from_genome(&genome, &topology).unwrap();

        let json = checkpoint.to_json().unwrap();

        assert!(json.contains("\"src_layer\": 0"));
        assert!(json.contains("\"dst_layer\": 1"));
        assert_eq!(GenomeCheckpoint::from_json(&json).unwrap(), checkpoint);
        assert!(matches!(
            GenomeCheckpoint::from_json("{\"edges\": 3}"),
            Err(NeatError::Serialization(_))
        ));
    }
}
