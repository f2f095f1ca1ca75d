//! Style mapping from graph semantics to visual attributes.
//!
//! Everything here is a pure function of the [`GraphModel`] and the current
//! hover state. Node colors come from how a node connects (its dominant
//! relationship type), not from its own `type` label, so that concepts linked
//! the same way cluster visually.

use super::model::{GraphModel, NodeIndex, ResolvedEdge};
use super::theme::Color;

/// Smallest rendered node radius (isolated and leaf nodes).
pub const MIN_NODE_RADIUS: f64 = 20.0;
/// Largest rendered node radius (hubs).
pub const MAX_NODE_RADIUS: f64 = 40.0;
const BASE_NODE_RADIUS: f64 = 15.0;
const RADIUS_PER_EDGE: f64 = 3.0;

/// Growth applied to the hovered node.
pub const HOVER_RADIUS_SCALE: f64 = 1.2;

/// Fill for nodes with no valid edges.
pub const NEUTRAL_NODE_COLOR: Color = Color::hex(0x6b7280);
/// Color for relationship labels outside the known vocabulary.
pub const FALLBACK_EDGE_COLOR: Color = Color::hex(0x9ca3af);

/// Node fills for dominant labels outside the known vocabulary, picked by label hash.
pub const UNKNOWN_NODE_PALETTE: [Color; 8] = [
	Color::hex(0xf97316),
	Color::hex(0x84cc16),
	Color::hex(0x0ea5e9),
	Color::hex(0xa855f7),
	Color::hex(0xe11d48),
	Color::hex(0xeab308),
	Color::hex(0x22c55e),
	Color::hex(0xd946ef),
];

const EDGE_WIDTH: f64 = 2.0;
const EDGE_WIDTH_HIGHLIGHTED: f64 = 3.0;
const STRUCTURAL_OPACITY: f64 = 0.8;
const ASSOCIATIVE_OPACITY: f64 = 0.5;
const HIGHLIGHTED_OPACITY: f64 = 1.0;
const FADED_OPACITY: f64 = 0.1;

/// Known relationship vocabulary. Unknown labels map to [`RelationshipKind::Other`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationshipKind {
	Uses,
	PartOf,
	Contains,
	Has,
	Owns,
	IsA,
	DependsOn,
	Implements,
	Produces,
	RelatesTo,
	Other,
}

impl RelationshipKind {
	/// Upper-case a label and join words with `_` (`"part of"` -> `"PART_OF"`).
	pub fn normalize_label(label: &str) -> String {
		label
			.trim()
			.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
			.filter(|part| !part.is_empty())
			.map(str::to_uppercase)
			.collect::<Vec<_>>()
			.join("_")
	}

	pub fn parse(label: &str) -> Self {
		match Self::normalize_label(label).as_str() {
			"USES" | "USE" | "USED_BY" | "UTILIZES" => Self::Uses,
			"PART_OF" | "BELONGS_TO" | "COMPONENT_OF" => Self::PartOf,
			"CONTAINS" | "INCLUDES" | "CONSISTS_OF" => Self::Contains,
			"HAS" | "HAS_A" | "HAS_PART" => Self::Has,
			"OWNS" | "OWNED_BY" => Self::Owns,
			"IS_A" | "INSTANCE_OF" | "TYPE_OF" | "SUBCLASS_OF" => Self::IsA,
			"DEPENDS_ON" | "REQUIRES" => Self::DependsOn,
			"IMPLEMENTS" | "EXTENDS" => Self::Implements,
			"PRODUCES" | "CREATES" | "GENERATES" => Self::Produces,
			"RELATES_TO" | "RELATED_TO" | "ASSOCIATED_WITH" => Self::RelatesTo,
			_ => Self::Other,
		}
	}

	pub fn color(self) -> Color {
		match self {
			Self::Uses => Color::hex(0x6366f1),
			Self::PartOf => Color::hex(0x8b5cf6),
			Self::Contains => Color::hex(0x06b6d4),
			Self::Has => Color::hex(0x10b981),
			Self::Owns => Color::hex(0xef4444),
			Self::IsA => Color::hex(0x3b82f6),
			Self::DependsOn => Color::hex(0xf59e0b),
			Self::Implements => Color::hex(0xec4899),
			Self::Produces => Color::hex(0x14b8a6),
			Self::RelatesTo => Color::hex(0x64748b),
			Self::Other => FALLBACK_EDGE_COLOR,
		}
	}

	/// Structural and ownership relationships render more opaque than associative ones.
	pub fn is_structural(self) -> bool {
		match self {
			Self::PartOf
			| Self::Contains
			| Self::Has
			| Self::Owns
			| Self::IsA
			| Self::DependsOn
			| Self::Implements => true,
			Self::Uses | Self::Produces | Self::RelatesTo | Self::Other => false,
		}
	}
}

/// Baseline visual attributes of a node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeVisual {
	pub radius: f64,
	pub color: Color,
	/// Node id.
	pub label: String,
	/// Node type, empty when absent.
	pub secondary_label: String,
	/// Most frequent relationship label among touching edges.
	pub dominant: Option<String>,
}

/// Visual attributes of an edge for the current hover state.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeVisual {
	pub color: Color,
	pub opacity: f64,
	pub width: f64,
	pub label: String,
	pub label_bold: bool,
}

/// Radius from degree, clamped so leaves stay visible and hubs stay bounded.
pub fn node_radius(degree: usize) -> f64 {
	(BASE_NODE_RADIUS + RADIUS_PER_EDGE * degree as f64).clamp(MIN_NODE_RADIUS, MAX_NODE_RADIUS)
}

/// Most frequent normalized relationship label among edges touching `node`.
/// Ties go to the label encountered first in edge order.
pub fn dominant_relationship(model: &GraphModel, node: NodeIndex) -> Option<&str> {
	let mut counts: Vec<(&str, usize)> = Vec::new();
	for edge in model.touching(node) {
		match counts.iter_mut().find(|(key, _)| *key == edge.key) {
			Some((_, count)) => *count += 1,
			None => counts.push((edge.key.as_str(), 1)),
		}
	}

	let mut best: Option<(&str, usize)> = None;
	for (key, count) in counts {
		if best.is_none_or(|(_, top)| count > top) {
			best = Some((key, count));
		}
	}
	best.map(|(key, _)| key)
}

/// Fill from the dominant label. Unknown labels hash into [`UNKNOWN_NODE_PALETTE`].
pub fn node_color(dominant: Option<&str>) -> Color {
	let Some(label) = dominant else {
		return NEUTRAL_NODE_COLOR;
	};
	match RelationshipKind::parse(label) {
		RelationshipKind::Other => {
			let key = RelationshipKind::normalize_label(label);
			UNKNOWN_NODE_PALETTE[(label_hash(&key) % UNKNOWN_NODE_PALETTE.len() as u64) as usize]
		}
		kind => kind.color(),
	}
}

/// FNV-1a, stable across builds and platforms.
fn label_hash(label: &str) -> u64 {
	label.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
		(hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
	})
}

pub fn node_visual(model: &GraphModel, node: NodeIndex) -> NodeVisual {
	let Some(data) = model.node(node) else {
		return NodeVisual {
			radius: MIN_NODE_RADIUS,
			color: NEUTRAL_NODE_COLOR,
			label: String::new(),
			secondary_label: String::new(),
			dominant: None,
		};
	};
	let dominant = dominant_relationship(model, node);
	NodeVisual {
		radius: node_radius(model.degree(node)),
		color: node_color(dominant),
		label: data.id.clone(),
		secondary_label: data.node_type.clone().unwrap_or_default(),
		dominant: dominant.map(str::to_string),
	}
}

/// Baseline visuals for every node, indexed like the model.
pub fn node_visuals(model: &GraphModel) -> Vec<NodeVisual> {
	(0..model.node_count()).map(|i| node_visual(model, i)).collect()
}

/// Edge appearance. With a hovered node, touching edges are emphasized and the rest fade.
pub fn edge_visual(edge: &ResolvedEdge, hovered: Option<NodeIndex>) -> EdgeVisual {
	let baseline = if edge.kind.is_structural() {
		STRUCTURAL_OPACITY
	} else {
		ASSOCIATIVE_OPACITY
	};
	let (opacity, width, label_bold) = match hovered {
		None => (baseline, EDGE_WIDTH, false),
		Some(node) if edge.touches(node) => (HIGHLIGHTED_OPACITY, EDGE_WIDTH_HIGHLIGHTED, true),
		Some(_) => (FADED_OPACITY, EDGE_WIDTH, false),
	};
	EdgeVisual {
		color: edge.kind.color(),
		opacity,
		width,
		label: edge_label(&edge.label),
		label_bold,
	}
}

/// Relationship label for display: upper-cased, underscores as spaces.
pub fn edge_label(label: &str) -> String {
	label.trim().to_uppercase().replace('_', " ")
}
