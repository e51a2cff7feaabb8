//! Boundary to the external evaluator scoring decoded networks.

use serde::{Deserialize, Serialize};

use crate::evolution::topology::TopologySummary;

/// One decoded connection, addressed by layer coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub src_layer: usize,
    pub dst_layer: usize,
    pub src_node: usize,
    pub dst_node: usize,
    pub weight: f64,
}

/// A genome translated into the edge lists an evaluator consumes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Phenotype {
    pub edges: Vec<Edge>,
    pub recurrent_edges: Vec<Edge>,
}

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Scores a decoded network.
///
/// Implementations may keep state such as loaded datasets across calls.
/// Genomes are evaluated in parallel, hence the `Sync` bound. The returned
/// value has to be finite; an error or a non-finite score aborts the run.
pub trait FitnessFunction: Sync {
    fn evaluate(
        &self,
        edges: &[Edge],
        recurrent_edges: &[Edge],
        summary: &TopologySummary,
    ) -> Result<f64, BoxError>;
}

impl<F> FitnessFunction for F
where
    F: Fn(&[Edge], &[Edge], &TopologySummary) -> f64 + Sync,
{
    fn evaluate(
        &self,
        edges: &[Edge],
        recurrent_edges: &[Edge],
        summary: &TopologySummary,
    ) -> Result<f64, BoxError> {
        Ok(self(edges, recurrent_edges, summary))
    }
}
