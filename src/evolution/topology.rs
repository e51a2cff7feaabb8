//! Layered node space shared by all genomes of a run.
//!
//! Layer 0 holds the input nodes and the last layer the output nodes. Hidden
//! nodes live on even ("structural") layers; each structural layer sits
//! right after an odd companion layer reserved for recurrent units. Adding a
//! hidden layer therefore always splices in two layers at once.
//!
//! Nodes are never removed. Their `(layer, position)` coordinates are
//! reassigned after every splice so the coordinate system stays dense.

use serde::{Deserialize, Serialize};

use crate::evolution::gene::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub layer: usize,
    pub position: usize,
}

/// Shape of the node space handed to evaluators next to the edge lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySummary {
    /// Number of nodes in each layer, input layer first.
    pub layer_sizes: Vec<usize>,
    /// Hidden structural/recurrent layer pairs between input and output.
    pub n_hidden_layers: usize,
    /// Size of the widest layer strictly between input and output.
    pub nodes_per_layer: usize,
}

#[derive(Clone, Debug, Default)]
pub struct NodeTopology {
    nodes: Vec<Node>,
    layers: Vec<Vec<NodeId>>,
}

impl NodeTopology {
    pub fn new() -> Self {
        NodeTopology::default()
    }

    /// Two-layer topology: inputs on layer 0, outputs on layer 1.
    pub fn with_io(input_count: usize, output_count: usize) -> Self {
        let mut topology = NodeTopology::new();
        for _ in 0..input_count {
            topology.insert_node(0);
        }
        for _ in 0..output_count {
            topology.insert_node(1);
        }
        topology
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Node ids in `layer` ordered by position; empty for unknown layers.
    pub fn nodes_in_layer(&self, layer: usize) -> &[NodeId] {
        self.layers.get(layer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Appends a fresh node at the end of `layer`, creating missing layers.
    pub fn insert_node(&mut self, layer: usize) -> NodeId {
        while self.layers.len() <= layer {
            self.layers.push(Vec::new());
        }

        let id = self.nodes.len();
        let position = self.layers[layer].len();

        self.layers[layer].push(id);
        self.nodes.push(Node { id, layer, position });

        id
    }

    /// Inserts an empty recurrent companion and structural layer right
    /// after `layer`, then renumbers every node.
    pub fn splice_layers_after(&mut self, layer: usize) {
        let at = (layer + 1).min(self.layers.len());
        self.layers.insert(at, Vec::new());
        self.layers.insert(at, Vec::new());
        self.renumber();
    }

    fn renumber(&mut self) {
        for (layer, ids) in self.layers.iter().enumerate() {
            for (position, &id) in ids.iter().enumerate() {
                let node = &mut self.nodes[id];
                node.layer = layer;
                node.position = position;
            }
        }
    }

    /// `Some(true)` when `input -> output` points to a higher layer; same
    /// layer and backward links are recurrent. `None` for unknown nodes.
    pub fn is_feed_forward(&self, input: NodeId, output: NodeId) -> Option<bool> {
        Some(self.node(input)?.layer < self.node(output)?.layer)
    }

    pub fn summary(&self) -> TopologySummary {
        let layer_sizes: Vec<usize> = self.layers.iter().map(Vec::len).collect();
        let inner = if layer_sizes.len() > 2 {
            &layer_sizes[1..layer_sizes.len() - 1]
        } else {
            &[][..]
        };

        TopologySummary {
            n_hidden_layers: layer_sizes.len().saturating_sub(2) / 2,
            nodes_per_layer: inner.iter().copied().max().unwrap_or(0),
            layer_sizes,
        }
    }
}

#[cfg(test)]
mod topology_tests {
    use super::*;

    #[test]
    fn with_io_builds_two_layers() {
        let topology = NodeTopology::with_io(2, 1);

        assert_eq!(topology.layer_count(), 2);
        assert_eq!(topology.nodes_in_layer(0), &[0, 1]);
        assert_eq!(topology.nodes_in_layer(1), &[2]);
        assert_eq!(topology.node(2), Some(&Node { id: 2, layer: 1, position: 0 }));
        assert!(topology.nodes_in_layer(5).is_empty());
        assert_eq!(topology.node_count(), 3);
        let layers: Vec<usize> = topology.nodes().iter().map(|n| n.layer).collect();
        assert_eq!(layers, vec![0, 0, 1]);
    }

    #[test]
    fn insert_node_creates_missing_layers() {
        let mut topology = NodeTopology::new();

        let id = topology.insert_node(3);

        assert_eq!(topology.layer_count(), 4);
        assert_eq!(topology.node(id).map(|n| (n.layer, n.position)), Some((3, 0)));
        assert_eq!(topology.insert_node(3), 1);
        assert_eq!(topology.node(1).map(|n| n.position), Some(1));
    }

    #[test]
    fn splice_renumbers_following_layers() {
        let mut topology = NodeTopology::with_io(2, 1);

        topology.splice_layers_after(0);

        assert_eq!(topology.layer_count(), 4);
        assert_eq!(topology.node(0).map(|n| n.layer), Some(0));
        assert_eq!(topology.node(2).map(|n| (n.layer, n.position)), Some((3, 0)));
        assert!(topology.nodes_in_layer(1).is_empty());
        assert!(topology.nodes_in_layer(2).is_empty());

        let hidden = topology.insert_node(2);
        assert_eq!(topology.is_feed_forward(0, hidden), Some(true));
        assert_eq!(topology.is_feed_forward(hidden, 2), Some(true));
        assert_eq!(topology.is_feed_forward(2, hidden), Some(false));
        assert_eq!(topology.is_feed_forward(hidden, hidden), Some(false));
        assert_eq!(topology.is_feed_forward(hidden, 99), None);
    }

    #[test]
    fn summary_reports_hidden_layers() {
        let mut topology = NodeTopology::with_io(3, 2);
        assert_eq!(
            topology.summary(),
            TopologySummary {
                layer_sizes: vec![3, 2],
                n_hidden_layers: 0,
                nodes_per_layer: 0,
            }
        );

        topology.splice_layers_after(0);
        topology.insert_node(2);
        topology.insert_node(2);

        let summary = topology.summary();
        assert_eq!(summary.layer_sizes, vec![3, 0, 2, 2]);
        assert_eq!(summary.n_hidden_layers, 1);
        assert_eq!(summary.nodes_per_layer, 2);
    }
}
