//! Builds the next generation from a speciated, evaluated population.

use std::collections::BTreeSet;

use log::{debug, info};
use rand::seq::{index, SliceRandom};
use rand::Rng;

use crate::config::NeatConfig;
use crate::evolution::error::NeatError;
use crate::evolution::genome::Genome;
use crate::evolution::innovation::GeneRegistry;
use crate::evolution::speciation::Species;
use crate::evolution::topology::NodeTopology;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operator {
    MutateWeights,
    AddNode,
    AddLink,
    Unchanged,
    InterspeciesCrossover,
    IntraspeciesCrossover,
}

/// Produces exactly `population_size` genomes.
///
/// Champions (no member of their species strictly fitter) are carried over
/// with their stagnation count raised by one. A species whose champion
/// already reached `max_stagnation` is dropped entirely before any copying.
/// The rest of the generation is filled by mutation and crossover of the
/// surviving genomes.
pub fn next_generation<R: Rng + ?Sized>(
    population: &[Genome],
    species: &[Species],
    config: &NeatConfig,
    registry: &mut GeneRegistry,
    topology: &mut NodeTopology,
    rng: &mut R,
) -> Result<Vec<Genome>, NeatError> {
    if population.is_empty() {
        return Err(NeatError::EmptyPopulation);
    }

    let champions: Vec<Vec<usize>> = species.iter().map(|s| champions_of(population, s)).collect();

    let stagnant: BTreeSet<usize> = champions
        .iter()
        .enumerate()
        .filter(|(_, members)| {
            members
                .iter()
                .any(|&idx| population[idx].stagnation_count >= config.max_stagnation)
        })
        .map(|(tag, _)| tag)
        .collect();

    for tag in &stagnant {
        info!(
            "Removing stagnant species {} - members: {}",
            tag,
            species[*tag].len()
        );
    }

    let mut next: Vec<Genome> = Vec::with_capacity(config.population_size);

    let mut carried: Vec<usize> = champions
        .iter()
        .enumerate()
        .filter(|(tag, _)| !stagnant.contains(tag))
        .flat_map(|(_, members)| members.iter().copied())
        .collect();
    carried.sort_unstable();

    for idx in carried.into_iter().take(config.population_size) {
        let mut copy = population[idx].clone();
        copy.stagnation_count += 1;
        next.push(copy);
    }

    let surviving_species: Vec<&Species> = species
        .iter()
        .enumerate()
        .filter(|(tag, _)| !stagnant.contains(tag))
        .map(|(_, s)| s)
        .collect();
    let survivors: Vec<usize> = surviving_species
        .iter()
        .flat_map(|s| s.members().iter().copied())
        .collect();

    debug!(
        "Reproduction - champions carried: {}, survivors: {}, surviving species: {}",
        next.len(),
        survivors.len(),
        surviving_species.len()
    );

    if next.len() < config.population_size && survivors.is_empty() {
        return Err(NeatError::PopulationExhausted {
            pruned: stagnant.len(),
        });
    }

    while next.len() < config.population_size {
        let child = match pick_operator(config, rng) {
            Operator::InterspeciesCrossover => {
                let first = &population[pick(&survivors, rng)?];
                let second = &population[pick(&survivors, rng)?];
                Genome::crossover(first, second, config, rng)
            }
            Operator::IntraspeciesCrossover => {
                let chosen = surviving_species
                    .choose(rng)
                    .ok_or(NeatError::PopulationExhausted {
                        pruned: stagnant.len(),
                    })?;
                intraspecies_crossover(population, chosen, config, rng)
            }
            mutation => {
                let parent = &population[pick(&survivors, rng)?];
                match mutation {
                    Operator::MutateWeights => parent.mutate_weights(config, rng),
                    Operator::AddNode => parent.mutate_add_node(config, registry, topology, rng)?,
                    Operator::AddLink => parent.mutate_add_link(config, registry, topology, rng)?,
                    _ => parent.offspring(),
                }
            }
        };

        next.push(child);
    }

    Ok(next)
}

/// Members of `species` no other member is strictly fitter than.
fn champions_of(population: &[Genome], species: &Species) -> Vec<usize> {
    let best = species
        .members()
        .iter()
        .map(|&idx| population[idx].fitness)
        .fold(f64::NEG_INFINITY, f64::max);

    species
        .members()
        .iter()
        .copied()
        .filter(|&idx| population[idx].fitness >= best)
        .collect()
}

fn pick_operator<R: Rng + ?Sized>(config: &NeatConfig, rng: &mut R) -> Operator {
    if rng.gen::<f64>() < config.mutation_without_crossover_rate {
        let roll = rng.gen::<f64>();
        let mut threshold = config.weight_mutation_rate;
        if roll < threshold {
            return Operator::MutateWeights;
        }
        threshold += config.add_node_mutation_rate;
        if roll < threshold {
            return Operator::AddNode;
        }
        threshold += config.add_link_mutation_rate;
        if roll < threshold {
            return Operator::AddLink;
        }
        Operator::Unchanged
    } else if rng.gen::<f64>() < config.interspecies_crossover_rate {
        Operator::InterspeciesCrossover
    } else {
        Operator::IntraspeciesCrossover
    }
}

fn pick<R: Rng + ?Sized>(indices: &[usize], rng: &mut R) -> Result<usize, NeatError> {
    indices
        .choose(rng)
        .copied()
        .ok_or(NeatError::PopulationExhausted { pruned: 0 })
}

fn intraspecies_crossover<R: Rng + ?Sized>(
    population: &[Genome],
    species: &Species,
    config: &NeatConfig,
    rng: &mut R,
) -> Genome {
    let members = species.members();
    if members.len() == 1 {
        return population[members[0]].offspring();
    }

    let picked = index::sample(rng, members.len(), 2);
    Genome::crossover(
        &population[members[picked.index(0)]],
        &population[members[picked.index(1)]],
        config,
        rng,
    )
}
