//! Graph state owned by one mounted canvas.
//!
//! Combines the validated model, the layout simulation, baseline node visuals,
//! the pan/zoom transform and the hover/selection state. The simulation is
//! private: interaction code reaches it only through pin/unpin/reheat, and
//! rendering only reads positions between ticks.

use super::config::{GraphConfig, ViewConfig};
use super::interaction::Gesture;
use super::model::{GraphModel, NodeDetails, NodeIndex};
use super::scale::{ScaleConfig, ScaledValues};
use super::simulation::Simulation;
use super::style::{self, EdgeVisual, NodeVisual};
use super::theme::Theme;
use super::types::GraphData;

/// Pan and zoom transform applied to the entire graph view.
///
/// `screen = world * k + (x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor (1.0 = 100%), kept inside [`ViewConfig`] limits.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

/// Presentation-only state. Never feeds back into the physics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
	pub selected: Option<NodeIndex>,
	pub hovered: Option<NodeIndex>,
}

/// Core graph state combining physics simulation with interaction and style tracking.
///
/// Created whenever a graph is loaded, then mutated each frame by the
/// animation loop and by pointer handlers.
pub struct ForceGraphState {
	model: GraphModel,
	simulation: Simulation,
	node_visuals: Vec<NodeVisual>,
	pub(super) transform: ViewTransform,
	pub(super) selection: SelectionState,
	pub(super) gesture: Gesture,
	pub(super) view: ViewConfig,
	scale: ScaleConfig,
	theme: Theme,
	width: f64,
	height: f64,
	needs_redraw: bool,
}

impl ForceGraphState {
	pub fn new(data: &GraphData, width: f64, height: f64, config: &GraphConfig, seed: u64) -> Self {
		let model = GraphModel::build(data);
		let node_visuals = style::node_visuals(&model);
		let radii: Vec<f64> = node_visuals.iter().map(|v| v.radius).collect();
		let links: Vec<(NodeIndex, NodeIndex)> = model
			.edges()
			.iter()
			.map(|e| (e.source, e.target))
			.collect();
		let simulation = Simulation::new(
			&radii,
			&links,
			width,
			height,
			config.simulation.clone().sanitized(),
			seed,
		);

		Self {
			model,
			simulation,
			node_visuals,
			transform: ViewTransform::default(),
			selection: SelectionState::default(),
			gesture: Gesture::default(),
			view: config.view.clone().sanitized(),
			scale: ScaleConfig::default(),
			theme: Theme::from_name(config.theme),
			width,
			height,
			needs_redraw: true,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.model.is_empty()
	}

	pub fn model(&self) -> &GraphModel {
		&self.model
	}

	pub fn simulation(&self) -> &Simulation {
		&self.simulation
	}

	pub(super) fn simulation_mut(&mut self) -> &mut Simulation {
		&mut self.simulation
	}

	pub fn transform(&self) -> &ViewTransform {
		&self.transform
	}

	pub fn selection(&self) -> &SelectionState {
		&self.selection
	}

	pub fn theme(&self) -> &Theme {
		&self.theme
	}

	pub fn scale_config(&self) -> &ScaleConfig {
		&self.scale
	}

	pub fn width(&self) -> f64 {
		self.width
	}

	pub fn height(&self) -> f64 {
		self.height
	}

	/// Scale values for the current zoom.
	pub fn scaled(&self) -> ScaledValues {
		ScaledValues::new(&self.scale, self.transform.k)
	}

	pub fn node_visual(&self, idx: NodeIndex) -> Option<&NodeVisual> {
		self.node_visuals.get(idx)
	}

	/// Current edge visual, reflecting hover highlighting.
	pub fn edge_visual(&self, edge: usize) -> Option<EdgeVisual> {
		self.model
			.edges()
			.get(edge)
			.map(|e| style::edge_visual(e, self.selection.hovered))
	}

	pub fn selected_details(&self) -> Option<NodeDetails> {
		self.selection.selected.and_then(|idx| self.model.details(idx))
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Closest node whose hit circle contains the screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<NodeIndex> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let scale = self.scaled();
		let mut best: Option<(NodeIndex, f64)> = None;
		for (idx, node) in self.simulation.nodes().iter().enumerate() {
			let d2 = (node.x - gx).powi(2) + (node.y - gy).powi(2);
			let r = scale.hit_radius(node.radius);
			if d2 <= r * r && best.is_none_or(|(_, bd2)| d2 < bd2) {
				best = Some((idx, d2));
			}
		}
		best.map(|(idx, _)| idx)
	}

	/// Advance the layout by one tick. Returns whether positions changed.
	pub fn tick(&mut self) -> bool {
		let moved = self.simulation.tick();
		if moved {
			self.needs_redraw = true;
		}
		moved
	}

	/// Whether the simulation still wants frames.
	pub fn is_animating(&self) -> bool {
		self.simulation.is_active()
	}

	pub fn request_redraw(&mut self) {
		self.needs_redraw = true;
	}

	/// Consume the pending redraw flag.
	pub fn take_redraw(&mut self) -> bool {
		std::mem::take(&mut self.needs_redraw)
	}

	/// Follow a resized drawing surface: move the centering target and let the layout adapt.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.simulation.set_center(width, height);
		self.needs_redraw = true;
	}
}
