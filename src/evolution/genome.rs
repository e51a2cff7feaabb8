//! One individual of the population.
//!
//! A genome owns independent copies of its connection genes, kept sorted
//! ascending by innovation, plus the set of node ids those genes touch.
//! Structural mutations never issue ids themselves: innovations come from
//! the [`GeneRegistry`] and nodes from the [`NodeTopology`], both passed in
//! by the caller.
//!
//! Every operator leaves its parents untouched and returns a fresh genome
//! with zero fitness, no species and a stagnation count of zero.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use log::{debug, trace};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::NeatConfig;
use crate::evolution::alignment::{align, AlignedGene, Side};
use crate::evolution::error::NeatError;
use crate::evolution::fitness::{Edge, Phenotype};
use crate::evolution::gene::{ConnectionGene, Innovation, NodeId};
use crate::evolution::innovation::GeneRegistry;
use crate::evolution::topology::NodeTopology;

/// Uniform weight in [-1, 1].
pub fn random_weight<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(-1.0..=1.0)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub fitness: f64,
    pub species: Option<usize>,
    /// Consecutive generations this genome was carried over as a champion.
    pub stagnation_count: usize,
    node_ids: BTreeSet<NodeId>,
    genes: Vec<ConnectionGene>,
}

impl Genome {
    /// Builds a genome from arbitrary genes, sorting them by innovation.
    /// Of several genes sharing an innovation only the first is kept.
    pub fn from_genes(genes: Vec<ConnectionGene>) -> Genome {
        let mut genome = Genome::default();
        for gene in genes {
            genome.insert_gene(gene);
        }
        genome
    }

    /// Every node of layer 0 wired to every node of the last layer, each link
    /// registered in `registry` and given a random weight.
    pub fn fully_connected<R: Rng + ?Sized>(
        registry: &mut GeneRegistry,
        topology: &NodeTopology,
        rng: &mut R,
    ) -> Genome {
        let output_layer = topology.layer_count().saturating_sub(1);
        let mut genome = Genome::default();

        for &input in topology.nodes_in_layer(0) {
            for &output in topology.nodes_in_layer(output_layer) {
                let gene = registry.lookup_or_create(input, output, random_weight(rng), true);
                genome.insert_gene(gene);
            }
        }

        genome
    }

    pub fn genes(&self) -> &[ConnectionGene] {
        &self.genes
    }

    pub fn node_ids(&self) -> &BTreeSet<NodeId> {
        &self.node_ids
    }

    pub fn gene(&self, innovation: Innovation) -> Option<&ConnectionGene> {
        self.genes
            .binary_search_by_key(&innovation, ConnectionGene::innovation)
            .ok()
            .map(|idx| &self.genes[idx])
    }

    pub fn enabled_gene_count(&self) -> usize {
        self.genes.iter().filter(|g| g.enabled).count()
    }

    /// Inserts `gene` at its sorted position. Returns `false`, leaving the
    /// genome unchanged, if the innovation is already present.
    pub fn insert_gene(&mut self, gene: ConnectionGene) -> bool {
        match self
            .genes
            .binary_search_by_key(&gene.innovation(), ConnectionGene::innovation)
        {
            Ok(_) => false,
            Err(idx) => {
                self.node_ids.insert(gene.input_node());
                self.node_ids.insert(gene.output_node());
                self.genes.insert(idx, gene);
                true
            }
        }
    }

    /// Copy of this genome's structure and weights with evaluation state reset.
    pub fn offspring(&self) -> Genome {
        Genome {
            fitness: 0.0,
            species: None,
            stagnation_count: 0,
            node_ids: self.node_ids.clone(),
            genes: self.genes.clone(),
        }
    }

    /// Translates the enabled genes into layer-addressed edges, split into
    /// feed-forward and recurrent links by the current layer indices.
    pub fn decode(&self, topology: &NodeTopology) -> Result<Phenotype, NeatError> {
        let mut phenotype = Phenotype::default();

        for gene in self.genes.iter().filter(|g| g.enabled) {
            let input = topology
                .node(gene.input_node())
                .ok_or(NeatError::UnknownNode(gene.input_node()))?;
            let output = topology
                .node(gene.output_node())
                .ok_or(NeatError::UnknownNode(gene.output_node()))?;

            let edge = Edge {
                src_layer: input.layer,
                dst_layer: output.layer,
                src_node: input.position,
                dst_node: output.position,
                weight: gene.weight,
            };

            if input.layer < output.layer {
                phenotype.edges.push(edge);
            } else {
                phenotype.recurrent_edges.push(edge);
            }
        }

        Ok(phenotype)
    }

    pub fn mutate_weights<R: Rng + ?Sized>(&self, config: &NeatConfig, rng: &mut R) -> Genome {
        let mut child = self.offspring();

        for gene in child.genes.iter_mut() {
            let roll = rng.gen::<f64>();
            if roll < config.random_weight_mutation_rate {
                gene.weight = random_weight(rng);
            } else if roll < config.random_weight_mutation_rate + config.uniform_weight_mutation_rate {
                if rng.gen_bool(0.5) {
                    gene.weight += config.uniform_perturbation;
                } else {
                    gene.weight -= config.uniform_perturbation;
                }
            }
        }

        child
    }

    /// Connects two referenced nodes on different layers, lower layer first.
    ///
    /// A no-op copy when no such pair is found within the sampling budget or
    /// when the pair was already connected anywhere in the run.
    pub fn mutate_add_link<R: Rng + ?Sized>(
        &self,
        config: &NeatConfig,
        registry: &mut GeneRegistry,
        topology: &NodeTopology,
        rng: &mut R,
    ) -> Result<Genome, NeatError> {
        let mut child = self.offspring();
        let ids: Vec<NodeId> = self.node_ids.iter().copied().collect();

        if ids.len() < 2 {
            debug!("Add link skipped, genome references {} node(s)", ids.len());
            return Ok(child);
        }

        for _ in 0..config.max_sampling_attempts {
            let picked = index::sample(rng, ids.len(), 2);
            let a = node_layer(topology, ids[picked.index(0)])?;
            let b = node_layer(topology, ids[picked.index(1)])?;

            if a.1 == b.1 {
                continue;
            }

            let (input, output) = if a.1 < b.1 { (a.0, b.0) } else { (b.0, a.0) };

            if registry.contains(input, output) {
                trace!("Link {} -> {} already exists", input, output);
                return Ok(child);
            }

            let gene = registry.lookup_or_create(input, output, random_weight(rng), true);
            trace!("Added link {}", gene);
            child.insert_gene(gene);
            return Ok(child);
        }

        debug!(
            "Add link skipped, no nodes on different layers after {} attempts",
            config.max_sampling_attempts
        );
        Ok(child)
    }

    /// Splits a random enabled gene with a new hidden node.
    ///
    /// The split gene is disabled and replaced by `input -> new` (weight 1.0)
    /// and `new -> output` (the split gene's weight). The new node goes on the
    /// structural layer two above the input's layer (counted from the layer
    /// before the outputs when the input is an output node). When the output
    /// sits less than two layers above that anchor a fresh layer pair is
    /// spliced in first; otherwise the node joins the existing layer.
    pub fn mutate_add_node<R: Rng + ?Sized>(
        &self,
        config: &NeatConfig,
        registry: &mut GeneRegistry,
        topology: &mut NodeTopology,
        rng: &mut R,
    ) -> Result<Genome, NeatError> {
        let mut child = self.offspring();

        if child.genes.is_empty() {
            debug!("Add node skipped, genome has no genes");
            return Ok(child);
        }

        let picked = (0..config.max_sampling_attempts)
            .map(|_| rng.gen_range(0..child.genes.len()))
            .find(|&idx| child.genes[idx].enabled);

        let Some(idx) = picked else {
            debug!(
                "Add node skipped, no enabled gene found after {} attempts",
                config.max_sampling_attempts
            );
            return Ok(child);
        };

        let split = &mut child.genes[idx];
        split.enabled = false;
        let (input, output, weight) = (split.input_node(), split.output_node(), split.weight);

        let (_, input_layer) = node_layer(topology, input)?;
        let (_, output_layer) = node_layer(topology, output)?;

        // outputs stay on the last layer
        let last_layer = topology.layer_count().saturating_sub(1);
        let anchor = if input_layer >= last_layer {
            last_layer.saturating_sub(1)
        } else {
            input_layer
        };

        // layer gap below 2, backward links included
        let structural_layer = anchor + 2;
        if output_layer < structural_layer {
            topology.splice_layers_after(anchor);
        }
        let new_node = topology.insert_node(structural_layer);

        let first = registry.lookup_or_create(input, new_node, 1.0, true);
        let second = registry.lookup_or_create(new_node, output, weight, true);

        trace!("Split gene {} -> {} with node {}", input, output, new_node);

        child.insert_gene(first);
        child.insert_gene(second);

        Ok(child)
    }

    /// Recombines two parents gene by gene.
    ///
    /// Matching genes come from either parent at random, optionally with the
    /// mean weight. Disjoint and excess genes are inherited from the strictly
    /// fitter parent only, or at random when fitness is equal. Inherited
    /// disabled genes may be re-enabled.
    pub fn crossover<R: Rng + ?Sized>(
        first: &Genome,
        second: &Genome,
        config: &NeatConfig,
        rng: &mut R,
    ) -> Genome {
        let mut genes: Vec<ConnectionGene> = Vec::with_capacity(first.genes.len().max(second.genes.len()));

        for aligned in align(&first.genes, &second.genes) {
            match aligned {
                AlignedGene::Matching(a, b) => {
                    let mut gene = if rng.gen_bool(0.5) { a.clone() } else { b.clone() };
                    if rng.gen::<f64>() < config.crossover_weight_average_rate {
                        gene.weight = (a.weight + b.weight) / 2.0;
                    }
                    genes.push(gene);
                }
                AlignedGene::Disjoint(side, gene) | AlignedGene::Excess(side, gene) => {
                    let (owner, other) = match side {
                        Side::First => (first.fitness, second.fitness),
                        Side::Second => (second.fitness, first.fitness),
                    };
                    if inherit_unmatched(owner, other, rng) {
                        genes.push(gene.clone());
                    }
                }
            }
        }

        for gene in genes.iter_mut().filter(|g| !g.enabled) {
            if rng.gen::<f64>() < config.enable_if_both_parents_disabled {
                gene.enabled = true;
            }
        }

        let node_ids = genes
            .iter()
            .flat_map(|g| [g.input_node(), g.output_node()])
            .collect();

        Genome {
            fitness: 0.0,
            species: None,
            stagnation_count: 0,
            node_ids,
            genes,
        }
    }
}

fn node_layer(topology: &NodeTopology, id: NodeId) -> Result<(NodeId, usize), NeatError> {
    topology
        .node(id)
        .map(|node| (node.id, node.layer))
        .ok_or(NeatError::UnknownNode(id))
}

fn inherit_unmatched<R: Rng + ?Sized>(owner_fitness: f64, other_fitness: f64, rng: &mut R) -> bool {
    if owner_fitness > other_fitness {
        true
    } else if owner_fitness < other_fitness {
        false
    } else {
        rng.gen_bool(0.5)
    }
}

impl Display for Genome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let species = self
            .species
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let nodes: Vec<String> = self.node_ids.iter().map(|id| id.to_string()).collect();

        writeln!(
            f,
            "INDIVIDUAL - fitness: {}, species: {}, stagnation: {}, node_genes: ({})",
            self.fitness,
            species,
            self.stagnation_count,
            nodes.join(" ")
        )?;
        for gene in &self.genes {
            writeln!(f, "\t{}", gene)?;
        }
        Ok(())
    }
}
