use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use neat_evolver::common::setup;
use neat_evolver::config::NeatConfig;
use neat_evolver::evolution::speciation::{assign_species, distance};
use neat_evolver::evolution::{
    Edge, Evolver, GeneRegistry, Genome, GenomeCheckpoint, NodeTopology, TopologySummary,
};

fn constant(_: &[Edge], _: &[Edge], _: &TopologySummary) -> f64 {
    1.0
}

fn is_sorted(genome: &Genome) -> bool {
    genome
        .genes()
        .windows(2)
        .all(|w| w[0].innovation() < w[1].innovation())
}

#[test]
fn initial_population_is_fully_connected() {
    setup();
    let config = NeatConfig {
        population_size: 10,
        ..NeatConfig::default()
    };
    let mut evolver = Evolver::with_seed(config, 7).unwrap();

    evolver.initialize(2, 1).unwrap();

    assert_eq!(evolver.population().len(), 10);
    for genome in evolver.population() {
        assert_eq!(genome.enabled_gene_count(), 2);
        assert_eq!(genome.node_ids().len(), 3);
    }
    assert_eq!(evolver.registry().len(), 2);
}

#[test]
fn constant_fitness_keeps_population_size() {
    setup();
    let config = NeatConfig {
        population_size: 10,
        ..NeatConfig::default()
    };
    let mut evolver = Evolver::with_seed(config, 8).unwrap();
    evolver.initialize(2, 1).unwrap();
    evolver.evaluate(&constant).unwrap();

    for _ in 0..5 {
        evolver.step(&constant).unwrap();
        assert_eq!(evolver.population().len(), 10);
    }
}

#[test]
fn structural_growth_keeps_invariants() {
    setup();
    let config = NeatConfig {
        population_size: 30,
        mutation_without_crossover_rate: 0.6,
        weight_mutation_rate: 0.4,
        add_node_mutation_rate: 0.3,
        add_link_mutation_rate: 0.3,
        ..NeatConfig::default()
    };
    let mut evolver = Evolver::with_seed(config, 9).unwrap();
    evolver.initialize(3, 2).unwrap();

    // rewards larger networks so champions keep changing
    let size = |edges: &[Edge], _: &[Edge], summary: &TopologySummary| {
        edges.len() as f64 + summary.n_hidden_layers as f64 + edges.iter().map(|e| e.weight).sum::<f64>() * 1e-3
    };
    let history = evolver.iterate(15, &size).unwrap();
    assert_eq!(history.len(), 16);

    let registry = evolver.registry();
    let topology = evolver.topology();
    assert!(topology.layer_count() > 2);

    for genome in evolver.population() {
        assert!(is_sorted(genome));
        for gene in genome.genes() {
            assert_eq!(registry.innovation_of(gene.input_node(), gene.output_node()), Some(gene.innovation()));
            assert!(genome.node_ids().contains(&gene.input_node()));
            assert!(genome.node_ids().contains(&gene.output_node()));
        }
        assert!(genome.decode(topology).is_ok());
    }

    // outputs stay on the last layer
    let last = topology.layer_count() - 1;
    assert_eq!(topology.nodes_in_layer(last), &[3, 4]);
}

#[test]
fn averaging_crossover_of_equal_parents() {
    let mut registry = GeneRegistry::new();
    let first = Genome::from_genes(vec![registry.lookup_or_create(0, 1, 0.2, true)]);
    let second = Genome::from_genes(vec![registry.lookup_or_create(0, 1, 0.8, true)]);
    let config = NeatConfig {
        crossover_weight_average_rate: 1.0,
        ..NeatConfig::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(10);

    for _ in 0..10 {
        let child = Genome::crossover(&first, &second, &config, &mut rng);

        assert_eq!(child.genes().len(), 1);
        assert!((child.genes()[0].weight - 0.5).abs() < 1e-12);
    }
}

#[test]
fn identical_genomes_share_one_species() {
    let mut registry = GeneRegistry::new();
    let topology = NodeTopology::with_io(2, 1);
    let mut rng = StdRng::seed_from_u64(11);
    let config = NeatConfig::default();
    let genome = Genome::fully_connected(&mut registry, &topology, &mut rng);
    let mut population = vec![genome.clone(), genome.clone(), genome];

    let species = assign_species(&mut population, 0.1, &config);

    assert_eq!(species.len(), 1);
    assert_eq!(species[0].len(), 3);
    assert_eq!(distance(&population[0], &population[1], &config), 0.0);
}

#[test]
fn same_node_pair_gets_same_innovation_across_genomes() {
    let mut registry = GeneRegistry::new();
    let mut topology = NodeTopology::with_io(2, 1);
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let config = NeatConfig::default();

    let a = Genome::fully_connected(&mut registry, &topology, &mut rng)
        .mutate_add_node(&config, &mut registry, &mut topology, &mut rng)
        .unwrap();
    let b = Genome::fully_connected(&mut registry, &topology, &mut rng);

    for gene in b.genes() {
        let shared = a
            .genes()
            .iter()
            .find(|g| g.input_node() == gene.input_node() && g.output_node() == gene.output_node());
        assert_eq!(shared.map(|g| g.innovation()), Some(gene.innovation()));
    }
}

#[test]
fn best_genome_checkpoint_round_trips_through_json() {
    let config = NeatConfig {
        population_size: 8,
        ..NeatConfig::default()
    };
    let mut evolver = Evolver::with_seed(config, 13).unwrap();
    evolver.initialize(2, 1).unwrap();
    let weight_sum = |edges: &[Edge], _: &[Edge], _: &TopologySummary| edges.iter().map(|e| e.weight).sum::<f64>();
    evolver.iterate(3, &weight_sum).unwrap();

    let checkpoint = evolver.checkpoint_best().unwrap();
    let path = std::env::temp_dir().join("neat_evolver_best_genome.json");
    checkpoint.write_to_file(&path).unwrap();
    let restored = std::fs::read_to_string(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let restored = GenomeCheckpoint::from_json(&restored).unwrap();
    assert_eq!(restored.layer_sizes, checkpoint.layer_sizes);
    assert_eq!(restored.feed_forward_count, checkpoint.feed_forward_count);
    assert_eq!(restored.edges.len(), checkpoint.edges.len());
    for (a, b) in restored.edges.iter().zip(&checkpoint.edges) {
        assert_eq!((a.src_layer, a.dst_layer, a.src_node, a.dst_node), (b.src_layer, b.dst_layer, b.src_node, b.dst_node));
        assert!((a.weight - b.weight).abs() < 1e-12);
    }
    assert_eq!(Some(checkpoint.fitness), evolver.best().map(|g| g.fitness));
}
