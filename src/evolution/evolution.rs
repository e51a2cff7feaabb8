use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::config::{ConfigError, NeatConfig};
use crate::evolution::checkpoint::GenomeCheckpoint;
use crate::evolution::error::NeatError;
use crate::evolution::fitness::FitnessFunction;
use crate::evolution::genome::Genome;
use crate::evolution::innovation::GeneRegistry;
use crate::evolution::report::{FitnessStats, GenerationReport, NoopReporter, ReportSink, SpeciesReport};
use crate::evolution::reproduction::next_generation;
use crate::evolution::speciation::{assign_species, tune_threshold, Species};
use crate::evolution::topology::NodeTopology;

/// Lifecycle of an [`Evolver`]. Operations called out of order fail with
/// [`NeatError::InvalidState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvolutionState {
    Uninitialized,
    /// Population exists but holds no fitness values yet.
    Initialized,
    Evaluated,
    /// Evaluated and grouped into species; ready to reproduce.
    Speciated,
}

/// Owns one evolutionary run: population, innovation registry, node topology
/// and the random stream every operator draws from.
pub struct Evolver {
    config: NeatConfig,
    compatibility_threshold: f64,
    registry: GeneRegistry,
    topology: NodeTopology,
    population: Vec<Genome>,
    species: Vec<Species>,
    generation: usize,
    state: EvolutionState,
    last_stats: Option<FitnessStats>,
    history: Vec<GenerationReport>,
    rng: StdRng,
    reporter: Box<dyn ReportSink + Send>,
}

impl Evolver {
    pub fn new(config: NeatConfig) -> Result<Evolver, ConfigError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Same configuration and seed give the same run for a deterministic
    /// fitness function.
    pub fn with_seed(config: NeatConfig, seed: u64) -> Result<Evolver, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: NeatConfig, rng: StdRng) -> Result<Evolver, ConfigError> {
        config.validate()?;

        Ok(Evolver {
            compatibility_threshold: config.compatibility_threshold,
            config,
            registry: GeneRegistry::new(),
            topology: NodeTopology::new(),
            population: Vec::new(),
            species: Vec::new(),
            generation: 0,
            state: EvolutionState::Uninitialized,
            last_stats: None,
            history: Vec::new(),
            rng,
            reporter: Box::new(NoopReporter),
        })
    }

    pub fn with_reporter<S: ReportSink + Send + 'static>(mut self, reporter: S) -> Evolver {
        self.reporter = Box::new(reporter);
        self
    }

    /// Creates the two-layer topology and `population_size` fully connected
    /// genomes with random weights.
    pub fn initialize(&mut self, input_count: usize, output_count: usize) -> Result<(), NeatError> {
        self.expect_state(&[EvolutionState::Uninitialized], "uninitialized")?;

        if input_count == 0 || output_count == 0 {
            return Err(ConfigError::InvalidShape {
                inputs: input_count,
                outputs: output_count,
            }
            .into());
        }

        debug!(
            "Generating initial population - population_size: {}, input_count: {}, output_count: {}",
            self.config.population_size, input_count, output_count
        );

        self.topology = NodeTopology::with_io(input_count, output_count);
        self.population = (0..self.config.population_size)
            .map(|_| Genome::fully_connected(&mut self.registry, &self.topology, &mut self.rng))
            .collect();
        self.state = EvolutionState::Initialized;

        Ok(())
    }

    /// Scores every genome of the current population in parallel.
    ///
    /// Any failing or non-finite score aborts the evaluation; fitness values
    /// are only written once every genome has been scored.
    pub fn evaluate<F>(&mut self, fitness: &F) -> Result<FitnessStats, NeatError>
    where
        F: FitnessFunction + ?Sized,
    {
        self.expect_state(
            &[EvolutionState::Initialized, EvolutionState::Evaluated],
            "initialized",
        )?;

        info!("Evaluating generation {}", self.generation);
        let eval_start = Instant::now();

        let topology = &self.topology;
        let summary = topology.summary();

        let scores = self
            .population
            .par_iter()
            .enumerate()
            .map(|(idx, genome)| {
                let phenotype = genome.decode(topology)?;
                let value = fitness
                    .evaluate(&phenotype.edges, &phenotype.recurrent_edges, &summary)
                    .map_err(|source| NeatError::Evaluation { genome: idx, source })?;

                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(NeatError::NonFiniteFitness { genome: idx, value })
                }
            })
            .collect::<Result<Vec<f64>, NeatError>>()?;

        for (genome, score) in self.population.iter_mut().zip(&scores) {
            genome.fitness = *score;
        }

        let stats = FitnessStats::from_scores(&scores).ok_or(NeatError::EmptyPopulation)?;

        info!(
            "GEN={} ::: fitness_max={}, fitness_avg={}, fitness_min={}, innovations={}",
            self.generation,
            stats.max,
            stats.avg,
            stats.min,
            self.registry.len()
        );
        debug!("Evaluation duration: {:?}", eval_start.elapsed());

        self.last_stats = Some(stats);
        self.state = EvolutionState::Evaluated;

        Ok(stats)
    }

    /// Groups the evaluated population into species, reports the generation
    /// and retunes the threshold used by the next assignment.
    pub fn speciate(&mut self) -> Result<&GenerationReport, NeatError> {
        self.expect_state(&[EvolutionState::Evaluated], "evaluated")?;
        let fitness = self.last_stats.ok_or(NeatError::EmptyPopulation)?;

        self.species = assign_species(&mut self.population, self.compatibility_threshold, &self.config);

        let report = GenerationReport {
            generation: self.generation,
            species_count: self.species.len(),
            species: self
                .species
                .iter()
                .map(|s| SpeciesReport {
                    size: s.len(),
                    representative_genes: self.population[s.representative()].genes().len(),
                })
                .collect(),
            fitness,
            innovation_count: self.registry.len(),
            layer_count: self.topology.layer_count(),
            compatibility_threshold: self.compatibility_threshold,
        };

        self.compatibility_threshold = tune_threshold(self.species.len());
        self.reporter.report(&report);
        self.history.push(report);
        self.state = EvolutionState::Speciated;

        Ok(&self.history[self.history.len() - 1])
    }

    /// Advances one generation: speciate (unless already done), reproduce,
    /// evaluate the offspring.
    pub fn step<F>(&mut self, fitness: &F) -> Result<FitnessStats, NeatError>
    where
        F: FitnessFunction + ?Sized,
    {
        if self.state == EvolutionState::Evaluated {
            self.speciate()?;
        }
        self.expect_state(&[EvolutionState::Speciated], "evaluated")?;

        let next = next_generation(
            &self.population,
            &self.species,
            &self.config,
            &mut self.registry,
            &mut self.topology,
            &mut self.rng,
        )?;

        self.population = next;
        self.species.clear();
        self.generation += 1;
        self.state = EvolutionState::Initialized;

        self.evaluate(fitness)
    }

    /// Evaluates the population if needed, runs `max_generations` steps and
    /// speciates the final generation so every evaluated generation is
    /// reported. Returns the reports of all generations run so far.
    pub fn iterate<F>(&mut self, max_generations: usize, fitness: &F) -> Result<&[GenerationReport], NeatError>
    where
        F: FitnessFunction + ?Sized,
    {
        if self.state == EvolutionState::Initialized {
            self.evaluate(fitness)?;
        }

        for _ in 0..max_generations {
            self.step(fitness)?;
        }

        if self.state == EvolutionState::Evaluated {
            self.speciate()?;
        }

        Ok(&self.history)
    }

    fn expect_state(&self, allowed: &[EvolutionState], expected: &'static str) -> Result<(), NeatError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(NeatError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    pub fn config(&self) -> &NeatConfig {
        &self.config
    }

    pub fn state(&self) -> EvolutionState {
        self.state
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn compatibility_threshold(&self) -> f64 {
        self.compatibility_threshold
    }

    pub fn population(&self) -> &[Genome] {
        &self.population
    }

    /// Species of the current generation; empty until it is speciated.
    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn registry(&self) -> &GeneRegistry {
        &self.registry
    }

    pub fn topology(&self) -> &NodeTopology {
        &self.topology
    }

    pub fn history(&self) -> &[GenerationReport] {
        &self.history
    }

    /// Fittest genome of the current population.
    pub fn best(&self) -> Option<&Genome> {
        self.population
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }

    pub fn checkpoint_best(&self) -> Result<GenomeCheckpoint, NeatError> {
        let best = self.best().ok_or(NeatError::EmptyPopulation)?;
        GenomeCheckpoint::from_genome(best, &self.topology)
    }
}

#[cfg(test)]
mod evolution_tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::common::*;
    use crate::evolution::fitness::{BoxError, Edge};
    use crate::evolution::topology::TopologySummary;

    fn constant(_: &[Edge], _: &[Edge], _: &TopologySummary) -> f64 {
        1.0
    }

    fn small_config() -> NeatConfig {
        NeatConfig {
            population_size: 12,
            ..NeatConfig::default()
        }
    }

    struct FailingFitness;

    impl FitnessFunction for FailingFitness {
        fn evaluate(&self, _: &[Edge], _: &[Edge], _: &TopologySummary) -> Result<f64, BoxError> {
            Err("evaluator offline".into())
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = NeatConfig {
            population_size: 0,
            ..NeatConfig::default()
        };

        assert!(matches!(Evolver::new(config), Err(ConfigError::EmptyPopulation)));
    }

    #[test]
    fn operations_require_their_state() {
        setup();
        let mut evolver = Evolver::with_seed(small_config(), 1).unwrap();

        assert!(matches!(
            evolver.evaluate(&constant),
            Err(NeatError::InvalidState {
                actual: EvolutionState::Uninitialized,
                ..
            })
        ));
        assert!(evolver.step(&constant).is_err());
        assert!(evolver.speciate().is_err());

        evolver.initialize(2, 1).unwrap();
        assert!(matches!(
            evolver.initialize(2, 1),
            Err(NeatError::InvalidState {
                actual: EvolutionState::Initialized,
                ..
            })
        ));
        assert!(matches!(
            evolver.speciate(),
            Err(NeatError::InvalidState { .. })
        ));
        assert!(evolver.step(&constant).is_err());

        evolver.evaluate(&constant).unwrap();
        assert_eq!(evolver.state(), EvolutionState::Evaluated);
        evolver.step(&constant).unwrap();
        assert_eq!(evolver.generation(), 1);
    }

    #[test]
    fn initialize_rejects_empty_shape() {
        let mut evolver = Evolver::with_seed(small_config(), 1).unwrap();

        assert!(matches!(
            evolver.initialize(0, 1),
            Err(NeatError::Config(ConfigError::InvalidShape { inputs: 0, outputs: 1 }))
        ));
        assert_eq!(evolver.state(), EvolutionState::Uninitialized);
    }

    #[test]
    fn evaluate_sets_fitness_and_stats() {
        let mut evolver = Evolver::with_seed(small_config(), 2).unwrap();
        evolver.initialize(3, 2).unwrap();

        let by_weight = |edges: &[Edge], _: &[Edge], _: &TopologySummary| edges.iter().map(|e| e.weight).sum::<f64>();
        let stats = evolver.evaluate(&by_weight).unwrap();

        let scores: Vec<f64> = evolver.population().iter().map(|g| g.fitness).collect();
        assert_eq!(FitnessStats::from_scores(&scores), Some(stats));
        assert_eq!(evolver.best().map(|g| g.fitness), Some(stats.max));
    }

    #[test]
    fn failing_fitness_aborts_the_generation() {
        let mut evolver = Evolver::with_seed(small_config(), 3).unwrap();
        evolver.initialize(2, 1).unwrap();

        assert!(matches!(
            evolver.evaluate(&FailingFitness),
            Err(NeatError::Evaluation { .. })
        ));

        let not_finite = |_: &[Edge], _: &[Edge], _: &TopologySummary| f64::NAN;
        assert!(matches!(
            evolver.evaluate(&not_finite),
            Err(NeatError::NonFiniteFitness { .. })
        ));
        assert_eq!(evolver.state(), EvolutionState::Initialized);
        assert!(evolver.population().iter().all(|g| g.fitness == 0.0));
    }

    #[test]
    fn iterate_reports_every_generation() {
        setup();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut evolver = Evolver::with_seed(small_config(), 4)
            .unwrap()
            .with_reporter(move |report: &GenerationReport| {
                if let Ok(mut seen) = sink.lock() {
                    seen.push(report.generation);
                }
            });
        evolver.initialize(2, 1).unwrap();

        let history = evolver.iterate(3, &constant).unwrap();

        assert_eq!(history.len(), 4);
        assert!(history.iter().all(|r| r.species.iter().map(|s| s.size).sum::<usize>() == 12));
        assert!(history.iter().all(|r| r.fitness.max == 1.0));
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(evolver.generation(), 3);
        assert_eq!(evolver.state(), EvolutionState::Speciated);
        assert_eq!(evolver.population().len(), 12);
    }

    #[test]
    fn threshold_follows_species_count() {
        let mut evolver = Evolver::with_seed(small_config(), 5).unwrap();
        evolver.initialize(2, 1).unwrap();
        evolver.evaluate(&constant).unwrap();

        let species_count = evolver.speciate().unwrap().species_count;

        assert_eq!(evolver.compatibility_threshold(), tune_threshold(species_count));
        assert_eq!(evolver.species().len(), species_count);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let run = |seed: u64| {
            let mut evolver = Evolver::with_seed(small_config(), seed).unwrap();
            evolver.initialize(2, 2).unwrap();
            let fitness = |edges: &[Edge], _: &[Edge], _: &TopologySummary| {
                edges.iter().map(|e| e.weight.abs()).sum::<f64>()
            };
            evolver.iterate(5, &fitness).unwrap();
            evolver.population().to_vec()
        };

        assert_eq!(run(21), run(21));
    }

    #[test]
    fn checkpoint_of_best_genome() {
        let mut evolver = Evolver::with_seed(small_config(), 6).unwrap();
        assert!(matches!(evolver.checkpoint_best(), Err(NeatError::EmptyPopulation)));

        evolver.initialize(2, 1).unwrap();
        evolver.iterate(2, &constant).unwrap();
        let checkpoint = evolver.checkpoint_best().unwrap();

        assert_eq!(checkpoint.fitness, 1.0);
        assert_eq!(checkpoint.layer_sizes.first(), Some(&2));
        assert_eq!(checkpoint.layer_sizes.last(), Some(&1));
    }
}
