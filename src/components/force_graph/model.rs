//! Validated graph built from normalized input.
//!
//! This is where the dangling-edge invariant is enforced: every edge kept here
//! resolves both endpoints to a node index. The physics solver and the style
//! mapper only ever see a [`GraphModel`], never raw [`GraphData`].

use std::collections::HashMap;
use std::fmt;

use log::{info, warn};
use serde_json::{Map, Value};

use super::style::RelationshipKind;
use super::types::{GraphData, GraphNode};

/// Index of a node in [`GraphModel::nodes`]. Stable for the lifetime of a model.
pub type NodeIndex = usize;

/// An edge whose endpoints both exist.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedEdge {
	pub source: NodeIndex,
	pub target: NodeIndex,
	/// Relationship label as sent.
	pub label: String,
	/// Normalized label (upper-case, `_` separated) used for counting.
	pub key: String,
	pub kind: RelationshipKind,
	pub properties: Value,
}

impl ResolvedEdge {
	pub fn touches(&self, node: NodeIndex) -> bool {
		self.source == node || self.target == node
	}
}

/// Whether the selected node is the source or the target of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
	Outgoing,
	Incoming,
}

/// One neighbor of a node, as shown in the detail panel.
#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
	pub peer_id: String,
	pub relationship_type: String,
	pub direction: Direction,
}

/// Everything the host needs to render a detail panel for one node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDetails {
	pub id: String,
	pub node_type: Option<String>,
	pub properties: Map<String, Value>,
	pub connections: Vec<Connection>,
}

/// Size of a loaded graph as shown next to the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphStats {
	pub nodes: usize,
	/// Valid edges only. Dangling relationships are counted in `dropped`.
	pub connections: usize,
	pub dropped: usize,
}

impl fmt::Display for GraphStats {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} nodes · {} connections", self.nodes, self.connections)
	}
}

/// Nodes plus the subset of relationships that resolve against them.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	nodes: Vec<GraphNode>,
	edges: Vec<ResolvedEdge>,
	index: HashMap<String, NodeIndex>,
	degrees: Vec<usize>,
	dropped_edges: usize,
}

impl GraphModel {
	pub fn build(data: &GraphData) -> Self {
		let mut nodes = Vec::with_capacity(data.nodes.len());
		let mut index = HashMap::with_capacity(data.nodes.len());

		for node in &data.nodes {
			if node.id.is_empty() {
				warn!("mindmap-graph: dropping node without an id");
				continue;
			}
			if index.contains_key(&node.id) {
				warn!("mindmap-graph: duplicate node id {:?}, keeping the first", node.id);
				continue;
			}
			index.insert(node.id.clone(), nodes.len());
			nodes.push(node.clone());
		}

		let mut edges = Vec::with_capacity(data.relationships.len());
		let mut degrees = vec![0; nodes.len()];
		let mut dropped_edges = 0;

		for rel in &data.relationships {
			let (Some(&source), Some(&target)) = (index.get(&rel.source), index.get(&rel.target))
			else {
				warn!(
					"mindmap-graph: dropping {} edge {:?} -> {:?}: unknown endpoint",
					rel.rel_type, rel.source, rel.target
				);
				dropped_edges += 1;
				continue;
			};
			degrees[source] += 1;
			if target != source {
				degrees[target] += 1;
			}
			edges.push(ResolvedEdge {
				source,
				target,
				label: rel.rel_type.clone(),
				key: RelationshipKind::normalize_label(&rel.rel_type),
				kind: RelationshipKind::parse(&rel.rel_type),
				properties: rel.properties.clone(),
			});
		}

		info!(
			"mindmap-graph: graph ready with {} nodes, {} edges ({} dropped)",
			nodes.len(),
			edges.len(),
			dropped_edges
		);

		Self {
			nodes,
			edges,
			index,
			degrees,
			dropped_edges,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	pub fn node(&self, idx: NodeIndex) -> Option<&GraphNode> {
		self.nodes.get(idx)
	}

	pub fn edges(&self) -> &[ResolvedEdge] {
		&self.edges
	}

	pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
		self.index.get(id).copied()
	}

	/// Relationships discarded because an endpoint was missing.
	pub fn dropped_edges(&self) -> usize {
		self.dropped_edges
	}

	pub fn stats(&self) -> GraphStats {
		GraphStats {
			nodes: self.nodes.len(),
			connections: self.edges.len(),
			dropped: self.dropped_edges,
		}
	}

	/// Number of valid edges touching the node. A self-loop counts once.
	pub fn degree(&self, idx: NodeIndex) -> usize {
		self.degrees.get(idx).copied().unwrap_or(0)
	}

	/// Edges touching the node, in input order.
	pub fn touching(&self, idx: NodeIndex) -> impl Iterator<Item = &ResolvedEdge> {
		self.edges.iter().filter(move |e| e.touches(idx))
	}

	pub fn connections(&self, idx: NodeIndex) -> Vec<Connection> {
		self.touching(idx)
			.map(|edge| {
				let (peer, direction) = if edge.source == idx {
					(edge.target, Direction::Outgoing)
				} else {
					(edge.source, Direction::Incoming)
				};
				Connection {
					peer_id: self.nodes[peer].id.clone(),
					relationship_type: edge.label.clone(),
					direction,
				}
			})
			.collect()
	}

	pub fn details(&self, idx: NodeIndex) -> Option<NodeDetails> {
		let node = self.nodes.get(idx)?;
		Some(NodeDetails {
			id: node.id.clone(),
			node_type: node.node_type.clone(),
			properties: node.property_map(),
			connections: self.connections(idx),
		})
	}
}
