use log::debug;

use crate::config::NeatConfig;
use crate::evolution::alignment::{align, AlignedGene};
use crate::evolution::genome::Genome;

/// Species count the threshold controller steers towards.
pub const TARGET_SPECIES_COUNT: usize = 10;

/// Compatibility distance between two genomes.
///
/// Excess and disjoint counts are scaled by their coefficients and divided by
/// `normalization`; the mean absolute weight difference of matching genes is
/// added on top. Without matching genes that mean is taken as zero.
pub fn distance(a: &Genome, b: &Genome, config: &NeatConfig) -> f64 {
    let mut excess = 0usize;
    let mut disjoint = 0usize;
    let mut matching = 0usize;
    let mut weight_diff = 0.0;

    for aligned in align(a.genes(), b.genes()) {
        match aligned {
            AlignedGene::Matching(x, y) => {
                matching += 1;
                weight_diff += (x.weight - y.weight).abs();
            }
            AlignedGene::Disjoint(..) => disjoint += 1,
            AlignedGene::Excess(..) => excess += 1,
        }
    }

    let avg_weight_diff = if matching == 0 {
        0.0
    } else {
        weight_diff / matching as f64
    };

    (config.excess_weight * excess as f64 + config.disjoint_weight * disjoint as f64) / config.normalization
        + config.weight_weight * avg_weight_diff
}

/// Indices of population members grouped together. The first member is the
/// representative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Species {
    members: Vec<usize>,
}

impl Species {
    pub(crate) fn new(founder: usize) -> Species {
        Species { members: vec![founder] }
    }

    pub fn representative(&self) -> usize {
        self.members[0]
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Rebuilds the species from scratch and tags every genome with its index.
///
/// Each genome joins the first species, in creation order, whose
/// representative lies strictly closer than `threshold`; otherwise it founds
/// a new one.
pub fn assign_species(population: &mut [Genome], threshold: f64, config: &NeatConfig) -> Vec<Species> {
    let mut species: Vec<Species> = Vec::new();

    for idx in 0..population.len() {
        let found = species
            .iter()
            .position(|s| distance(&population[s.representative()], &population[idx], config) < threshold);

        let tag = match found {
            Some(tag) => {
                species[tag].members.push(idx);
                tag
            }
            None => {
                species.push(Species::new(idx));
                species.len() - 1
            }
        };

        population[idx].species = Some(tag);
    }

    debug!(
        "Speciation - population: {}, threshold: {}, species: {}",
        population.len(),
        threshold,
        species.len()
    );

    species
}

/// Step controller for the compatibility threshold.
pub fn tune_threshold(species_count: usize) -> f64 {
    match species_count.cmp(&TARGET_SPECIES_COUNT) {
        std::cmp::Ordering::Greater => 2.3,
        std::cmp::Ordering::Less => 1.7,
        std::cmp::Ordering::Equal => 2.0,
    }
}
