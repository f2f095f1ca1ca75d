//! Graph data structures for input to the force graph component.
//!
//! [`GraphData`] is the normalized shape the engine consumes. The extraction
//! service has shipped two wire shapes over time (`relationships[]` with a
//! `type` field, and the older `edges[]` with `relation`), so payloads go
//! through [`GraphPayload`] which detects the shape and normalizes it.
//!
//! Field parsing is lenient: a malformed `type` or `properties` value must not
//! reject the whole graph, it only loses that one piece of metadata.

use log::info;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::GraphResult;

/// Relationship label used when an edge arrives without one.
pub const DEFAULT_RELATIONSHIP_TYPE: &str = "RELATES_TO";

/// A node in the graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	/// Unique identifier. Relationships refer to nodes by this id.
	#[serde(default, deserialize_with = "lenient_id")]
	pub id: String,
	/// Category label (e.g. "Protocol"). Absent when missing or not a string.
	#[serde(
		rename = "type",
		default,
		deserialize_with = "lenient_label",
		skip_serializing_if = "Option::is_none"
	)]
	pub node_type: Option<String>,
	/// Open-ended property bag. Anything other than a JSON object reads as empty.
	#[serde(default)]
	pub properties: Value,
}

impl GraphNode {
	pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			node_type: Some(node_type.into()),
			properties: Value::Null,
		}
	}

	/// The property bag as a map, empty when the payload carried something else.
	pub fn property_map(&self) -> Map<String, Value> {
		match &self.properties {
			Value::Object(map) => map.clone(),
			_ => Map::new(),
		}
	}
}

/// A directed, typed relationship between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphRelationship {
	/// Source node id.
	#[serde(default, deserialize_with = "lenient_id")]
	pub source: String,
	/// Target node id.
	#[serde(default, deserialize_with = "lenient_id")]
	pub target: String,
	/// Relationship label (e.g. "USES", "PART_OF").
	#[serde(
		rename = "type",
		default = "default_relationship_type",
		deserialize_with = "lenient_relationship_type"
	)]
	pub rel_type: String,
	#[serde(default)]
	pub properties: Value,
}

impl GraphRelationship {
	pub fn new(
		source: impl Into<String>,
		target: impl Into<String>,
		rel_type: impl Into<String>,
	) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			rel_type: rel_type.into(),
			properties: Value::Null,
		}
	}
}

/// Complete normalized graph: nodes, relationships and extraction metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	#[serde(default)]
	pub nodes: Vec<GraphNode>,
	#[serde(default)]
	pub relationships: Vec<GraphRelationship>,
	/// Informational only; the layout engine never reads it.
	#[serde(default)]
	pub chunks_processed: u64,
}

impl GraphData {
	/// Parse any supported wire shape and normalize it.
	pub fn from_json(text: &str) -> GraphResult<Self> {
		let payload: GraphPayload = serde_json::from_str(text)?;
		Ok(payload.normalize())
	}
}

/// Which wire shape a payload was sent in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadShape {
	/// `relationships[]` entries with a `type` field.
	Relationships,
	/// Older `edges[]` entries labelled by `relation` (or `type`).
	LegacyEdges,
	/// Neither list present.
	NodesOnly,
}

/// Legacy edge record from the `edges[]` payload shape.
#[derive(Clone, Debug, Deserialize)]
pub struct LegacyEdge {
	#[serde(default, deserialize_with = "lenient_id")]
	pub source: String,
	#[serde(default, deserialize_with = "lenient_id")]
	pub target: String,
	#[serde(default, deserialize_with = "lenient_label")]
	pub relation: Option<String>,
	#[serde(rename = "type", default, deserialize_with = "lenient_label")]
	pub edge_type: Option<String>,
	#[serde(default)]
	pub properties: Value,
}

impl From<LegacyEdge> for GraphRelationship {
	fn from(edge: LegacyEdge) -> Self {
		Self {
			source: edge.source,
			target: edge.target,
			rel_type: edge
				.relation
				.or(edge.edge_type)
				.unwrap_or_else(default_relationship_type),
			properties: edge.properties,
		}
	}
}

/// Raw payload as delivered by the extraction service, in either shape.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphPayload {
	#[serde(default)]
	pub nodes: Option<Vec<GraphNode>>,
	#[serde(default)]
	pub relationships: Option<Vec<GraphRelationship>>,
	#[serde(default)]
	pub edges: Option<Vec<LegacyEdge>>,
	#[serde(default, deserialize_with = "lenient_count")]
	pub chunks_processed: u64,
}

impl GraphPayload {
	pub fn shape(&self) -> PayloadShape {
		if self.edges.is_some() {
			PayloadShape::LegacyEdges
		} else if self.relationships.is_some() {
			PayloadShape::Relationships
		} else {
			PayloadShape::NodesOnly
		}
	}

	/// Convert into the normalized shape. `edges[]` wins when both lists are present.
	pub fn normalize(self) -> GraphData {
		let shape = self.shape();
		let relationships = match (self.edges, self.relationships) {
			(Some(edges), _) => edges.into_iter().map(GraphRelationship::from).collect(),
			(None, Some(relationships)) => relationships,
			(None, None) => Vec::new(),
		};
		let data = GraphData {
			nodes: self.nodes.unwrap_or_default(),
			relationships,
			chunks_processed: self.chunks_processed,
		};
		info!(
			"mindmap-graph: payload shape {:?}: {} nodes, {} relationships, {} chunks",
			shape,
			data.nodes.len(),
			data.relationships.len(),
			data.chunks_processed
		);
		data
	}
}

fn default_relationship_type() -> String {
	DEFAULT_RELATIONSHIP_TYPE.to_string()
}

/// Accept string or numeric ids; anything else becomes an empty id.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	Ok(match Value::deserialize(deserializer)? {
		Value::String(s) => s,
		Value::Number(n) => n.to_string(),
		_ => String::new(),
	})
}

fn lenient_label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
	Ok(match Value::deserialize(deserializer)? {
		Value::String(s) if !s.trim().is_empty() => Some(s),
		_ => None,
	})
}

fn lenient_relationship_type<'de, D: Deserializer<'de>>(
	deserializer: D,
) -> Result<String, D::Error> {
	Ok(lenient_label(deserializer)?.unwrap_or_else(default_relationship_type))
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
	Ok(match Value::deserialize(deserializer)? {
		Value::Number(n) => n
			.as_u64()
			.or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
			.unwrap_or(0),
		_ => 0,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn relationships_shape_passes_through() {
		let data = GraphData::from_json(
			r#"{
				"nodes": [{"id": "FTP", "type": "Protocol", "properties": {"port": 21}}],
				"relationships": [{"source": "FTP", "target": "TCP", "type": "USES", "properties": {}}],
				"chunks_processed": 3
			}"#,
		)
		.unwrap();
		assert_eq!(data.nodes[0].node_type.as_deref(), Some("Protocol"));
		assert_eq!(data.relationships[0].rel_type, "USES");
		assert_eq!(data.chunks_processed, 3);
	}

	#[test]
	fn legacy_edges_use_relation_then_type_then_default() {
		let payload: GraphPayload = serde_json::from_str(
			r#"{
				"nodes": [],
				"edges": [
					{"source": "a", "target": "b", "relation": "PART_OF"},
					{"source": "a", "target": "c", "type": "OWNS"},
					{"source": "b", "target": "c"}
				]
			}"#,
		)
		.unwrap();
		assert_eq!(payload.shape(), PayloadShape::LegacyEdges);
		let data = payload.normalize();
		let types: Vec<_> = data.relationships.iter().map(|r| r.rel_type.as_str()).collect();
		assert_eq!(types, ["PART_OF", "OWNS", DEFAULT_RELATIONSHIP_TYPE]);
		assert_eq!(data.relationships[2].properties, Value::Null);
	}

	#[test]
	fn edges_win_over_relationships() {
		let data = GraphData::from_json(
			r#"{
				"nodes": [],
				"edges": [{"source": "a", "target": "b", "relation": "HAS"}],
				"relationships": [{"source": "x", "target": "y", "type": "USES"}]
			}"#,
		)
		.unwrap();
		assert_eq!(data.relationships.len(), 1);
		assert_eq!(data.relationships[0].source, "a");
	}

	#[test]
	fn malformed_node_metadata_is_tolerated() {
		let data = GraphData::from_json(
			r#"{
				"nodes": [
					{"id": 7, "type": 42, "properties": "not a map"},
					{"id": "bare"}
				],
				"relationships": [{"source": 7, "target": "bare", "type": null}]
			}"#,
		)
		.unwrap();
		assert_eq!(data.nodes[0].id, "7");
		assert_eq!(data.nodes[0].node_type, None);
		assert!(data.nodes[0].property_map().is_empty());
		assert_eq!(data.nodes[1].node_type, None);
		assert_eq!(data.relationships[0].source, "7");
		assert_eq!(data.relationships[0].rel_type, DEFAULT_RELATIONSHIP_TYPE);
	}

	#[test]
	fn empty_object_is_an_empty_graph() {
		let data = GraphData::from_json("{}").unwrap();
		assert!(data.nodes.is_empty());
		assert!(data.relationships.is_empty());
		assert_eq!(data.chunks_processed, 0);
	}

	#[test]
	fn invalid_json_is_an_error() {
		assert!(GraphData::from_json("not json").is_err());
	}
}
