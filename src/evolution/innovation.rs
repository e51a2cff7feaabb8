//! Append-only ledger of structural innovations.
//!
//! Every distinct ordered node pair ever connected during a run is recorded
//! exactly once. A connection between the same two nodes created later, by
//! any genome and through any mutation, resolves to the recorded innovation
//! number, which is what makes gene-by-gene alignment across genomes
//! meaningful.

use std::collections::HashMap;

use log::trace;

use crate::evolution::gene::{ConnectionGene, Innovation, NodeId};

/// Registry of innovations for a single evolutionary run.
///
/// Innovation numbers form a dense ascending sequence starting at 0: the
/// innovation of an entry is its position in the ledger.
#[derive(Clone, Debug, Default)]
pub struct GeneRegistry {
    genes: Vec<ConnectionGene>,
    index: HashMap<(NodeId, NodeId), Innovation>,
}

impl GeneRegistry {
    pub fn new() -> Self {
        GeneRegistry::default()
    }

    /// Returns a gene for `input -> output` carrying the given weight and
    /// enabled flag.
    ///
    /// The innovation number is the one recorded for this pair if the pair
    /// was seen before, otherwise the next unused number, in which case the
    /// pair is appended to the ledger.
    pub fn lookup_or_create(
        &mut self,
        input_node: NodeId,
        output_node: NodeId,
        weight: f64,
        enabled: bool,
    ) -> ConnectionGene {
        if let Some(&innovation) = self.index.get(&(input_node, output_node)) {
            return ConnectionGene::new(enabled, weight, input_node, output_node, innovation);
        }

        let innovation = self.genes.len();
        let gene = ConnectionGene::new(enabled, weight, input_node, output_node, innovation);

        trace!("New innovation: {}", gene);

        self.genes.push(gene.clone());
        self.index.insert((input_node, output_node), innovation);

        gene
    }

    /// Whether any genome in the run ever connected `input -> output`.
    pub fn contains(&self, input_node: NodeId, output_node: NodeId) -> bool {
        self.index.contains_key(&(input_node, output_node))
    }

    pub fn innovation_of(&self, input_node: NodeId, output_node: NodeId) -> Option<Innovation> {
        self.index.get(&(input_node, output_node)).copied()
    }

    /// The gene as it was first registered.
    pub fn get(&self, innovation: Innovation) -> Option<&ConnectionGene> {
        self.genes.get(innovation)
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.genes.iter()
    }
}
