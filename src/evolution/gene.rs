use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Index of a node in the run's [`NodeTopology`](crate::evolution::topology::NodeTopology).
pub type NodeId = usize;

/// Historical marking shared by every gene describing the same node pair.
pub type Innovation = usize;

/// A potential connection between two nodes.
///
/// The endpoints and the innovation number never change once the gene is
/// issued by the [`GeneRegistry`](crate::evolution::innovation::GeneRegistry);
/// only `weight` and `enabled` are mutable, and only on the copy owned by a
/// single genome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionGene {
    pub enabled: bool,
    pub weight: f64,
    input_node: NodeId,
    output_node: NodeId,
    innovation: Innovation,
}

impl ConnectionGene {
    pub(crate) fn new(
        enabled: bool,
        weight: f64,
        input_node: NodeId,
        output_node: NodeId,
        innovation: Innovation,
    ) -> Self {
        ConnectionGene {
            enabled,
            weight,
            input_node,
            output_node,
            innovation,
        }
    }

    pub fn input_node(&self) -> NodeId {
        self.input_node
    }

    pub fn output_node(&self) -> NodeId {
        self.output_node
    }

    pub fn innovation(&self) -> Innovation {
        self.innovation
    }
}

impl Display for ConnectionGene {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[gene: enabled? {}, weight: {}, input_node: {}, output_node: {}, innovation: {}]",
            self.enabled, self.weight, self.input_node, self.output_node, self.innovation
        )
    }
}
