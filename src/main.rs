use std::process;
use std::time::Instant;

use log::{error, info};

use neat_evolver::common::*;
use neat_evolver::config::{ConfigError, RunConfig};
use neat_evolver::evolution::{BoxError, Edge, Evolver, FitnessFunction, LogReporter, NeatError, TopologySummary};

/// Scores a network on the XOR truth table. Inputs are `[a, b, bias]`.
struct XorFitness {
    cases: Vec<([f64; 3], f64)>,
}

impl XorFitness {
    const INPUTS: usize = 3;
    const OUTPUTS: usize = 1;

    fn new() -> Self {
        XorFitness {
            cases: vec![
                ([0.0, 0.0, 1.0], 0.0),
                ([0.0, 1.0, 1.0], 1.0),
                ([1.0, 0.0, 1.0], 1.0),
                ([1.0, 1.0, 1.0], 0.0),
            ],
        }
    }
}

impl FitnessFunction for XorFitness {
    fn evaluate(&self, edges: &[Edge], _recurrent_edges: &[Edge], summary: &TopologySummary) -> Result<f64, BoxError> {
        let mut error_sum = 0.0;

        for (inputs, expected) in &self.cases {
            let outputs = feed_forward(edges, &summary.layer_sizes, inputs)?;
            let output = outputs.first().copied().unwrap_or(0.0);
            error_sum += (output - expected).abs();
        }

        Ok((self.cases.len() as f64 - error_sum).powi(2))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-4.9 * x).exp())
}

/// Propagates `inputs` layer by layer and returns the last layer's activations.
/// Recurrent links are ignored.
fn feed_forward(edges: &[Edge], layer_sizes: &[usize], inputs: &[f64]) -> Result<Vec<f64>, BoxError> {
    let mut activations: Vec<Vec<f64>> = layer_sizes.iter().map(|&size| vec![0.0; size]).collect();
    let first = activations.first_mut().ok_or("network has no layers")?;
    for (slot, value) in first.iter_mut().zip(inputs) {
        *slot = *value;
    }

    let mut ordered: Vec<&Edge> = edges.iter().collect();
    ordered.sort_by_key(|e| e.dst_layer);

    let mut pending = ordered.into_iter().peekable();
    for layer in 1..activations.len() {
        let mut sums = vec![0.0; activations[layer].len()];
        while let Some(edge) = pending.next_if(|e| e.dst_layer == layer) {
            let source = activations
                .get(edge.src_layer)
                .and_then(|l| l.get(edge.src_node))
                .ok_or("edge references a missing node")?;
            let sum = sums.get_mut(edge.dst_node).ok_or("edge references a missing node")?;
            *sum += source * edge.weight;
        }
        activations[layer] = sums.into_iter().map(sigmoid).collect();
    }

    Ok(activations.pop().unwrap_or_default())
}

fn run() -> Result<(), NeatError> {
    let run_config = RunConfig::new()?;
    let settings = run_config.run;

    if settings.input_count != XorFitness::INPUTS || settings.output_count != XorFitness::OUTPUTS {
        return Err(ConfigError::InvalidShape {
            inputs: settings.input_count,
            outputs: settings.output_count,
        }
        .into());
    }

    let evolver = match settings.seed {
        Some(seed) => Evolver::with_seed(run_config.neat, seed)?,
        None => Evolver::new(run_config.neat)?,
    };
    let mut evolver = evolver.with_reporter(LogReporter);

    info!("Starting XOR topology search");
    let run_start = Instant::now();

    evolver.initialize(settings.input_count, settings.output_count)?;
    evolver.iterate(settings.max_generations, &XorFitness::new())?;

    if let Some(best) = evolver.best() {
        info!("Best genome after {} generations:\n{}", evolver.generation(), best);
    }
    info!("Run duration: {:?}", run_start.elapsed());

    if let Some(path) = &settings.checkpoint_path {
        evolver.checkpoint_best()?.write_to_file(path)?;
    }

    Ok(())
}

fn main() {
    setup();

    if let Err(error) = run() {
        error!("Run failed: {}", error);
        process::exit(1);
    }
}
