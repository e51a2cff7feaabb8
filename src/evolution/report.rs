//! Per-generation statistics and the sinks that receive them.

use log::info;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitnessStats {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

impl FitnessStats {
    /// `None` for an empty slice.
    pub fn from_scores(scores: &[f64]) -> Option<FitnessStats> {
        if scores.is_empty() {
            return None;
        }

        let (min, max, sum) = scores.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), &score| (min.min(score), max.max(score), sum + score),
        );

        Some(FitnessStats {
            min,
            avg: sum / scores.len() as f64,
            max,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesReport {
    pub size: usize,
    /// Gene count of the species' representative.
    pub representative_genes: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: usize,
    pub species_count: usize,
    pub species: Vec<SpeciesReport>,
    pub fitness: FitnessStats,
    pub innovation_count: usize,
    pub layer_count: usize,
    pub compatibility_threshold: f64,
}

impl GenerationReport {
    pub fn species_sizes(&self) -> Vec<usize> {
        self.species.iter().map(|s| s.size).collect()
    }
}

/// Receives one report per evaluated generation.
pub trait ReportSink {
    fn report(&mut self, report: &GenerationReport);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopReporter;

impl ReportSink for NoopReporter {
    fn report(&mut self, _report: &GenerationReport) {}
}

/// Writes every report to the `info` log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl ReportSink for LogReporter {
    fn report(&mut self, report: &GenerationReport) {
        let species: Vec<String> = report
            .species
            .iter()
            .map(|s| format!("{}:{}", s.size, s.representative_genes))
            .collect();

        info!(
            "GEN={} ::: fitness_min={:.4}, fitness_avg={:.4}, fitness_max={:.4}, species={}, innovations={}, layers={}, threshold={}",
            report.generation,
            report.fitness.min,
            report.fitness.avg,
            report.fitness.max,
            report.species_count,
            report.innovation_count,
            report.layer_count,
            report.compatibility_threshold
        );
        info!("GEN={} ::: species (size:representative_genes) = [{}]", report.generation, species.join(", "));
    }
}

impl<F> ReportSink for F
where
    F: FnMut(&GenerationReport),
{
    fn report(&mut self, report: &GenerationReport) {
        self(report)
    }
}
