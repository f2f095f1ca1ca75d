//! Pointer, wheel and touch handling.
//!
//! Everything takes screen coordinates relative to the canvas. At most one
//! gesture is live at a time, so at most one node is ever pinned. A press that
//! lands on a node always starts a node drag, never a pan.

use log::debug;

use super::model::NodeIndex;
use super::state::ForceGraphState;

/// Tracks an in-progress node drag operation.
#[derive(Clone, Debug, PartialEq)]
pub struct DragState {
	pub node: NodeIndex,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
	/// Farthest screen distance from the press point so far.
	pub travel: f64,
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, PartialEq)]
pub struct PanState {
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Two-finger zoom: last finger distance and midpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct PinchState {
	pub distance: f64,
	pub mid_x: f64,
	pub mid_y: f64,
}

/// The single pointer gesture in progress, if any.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
	#[default]
	Idle,
	Drag(DragState),
	Pan(PanState),
	Pinch(PinchState),
}

impl ForceGraphState {
	/// Press on the canvas. Returns the grabbed node, if the press hit one.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) -> Option<NodeIndex> {
		self.end_gesture();
		match self.node_at_position(sx, sy) {
			Some(node) => {
				let (x, y) = self.simulation().position(node)?;
				self.simulation_mut().pin(node, x, y);
				self.gesture = Gesture::Drag(DragState {
					node,
					start_x: sx,
					start_y: sy,
					node_start_x: x,
					node_start_y: y,
					travel: 0.0,
				});
				debug!("mindmap-graph: drag start on node {node}");
				Some(node)
			}
			None => {
				self.gesture = Gesture::Pan(PanState {
					start_x: sx,
					start_y: sy,
					transform_start_x: self.transform.x,
					transform_start_y: self.transform.y,
				});
				None
			}
		}
	}

	/// Pointer motion. Returns whether anything visible changed.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) -> bool {
		let k = self.transform.k;
		match &mut self.gesture {
			Gesture::Drag(drag) => {
				let (dx, dy) = (sx - drag.start_x, sy - drag.start_y);
				drag.travel = drag.travel.max((dx * dx + dy * dy).sqrt());
				let (x, y) = (drag.node_start_x + dx / k, drag.node_start_y + dy / k);
				self.simulation_mut().move_pin(x, y);
				self.request_redraw();
				true
			}
			Gesture::Pan(pan) => {
				self.transform.x = pan.transform_start_x + (sx - pan.start_x);
				self.transform.y = pan.transform_start_y + (sy - pan.start_y);
				self.request_redraw();
				true
			}
			Gesture::Pinch(_) => false,
			Gesture::Idle => {
				let hovered = self.node_at_position(sx, sy);
				self.set_hover(hovered)
			}
		}
	}

	/// Release. Returns whether the selection changed (a click on a node).
	pub fn pointer_up(&mut self, _sx: f64, _sy: f64) -> bool {
		match std::mem::take(&mut self.gesture) {
			Gesture::Drag(drag) => {
				self.simulation_mut().unpin();
				self.request_redraw();
				if drag.travel < self.view.click_tolerance {
					self.toggle_selection(drag.node);
					return true;
				}
				false
			}
			_ => false,
		}
	}

	/// Pointer left the canvas: cancel any gesture and clear hover.
	pub fn pointer_leave(&mut self) -> bool {
		self.end_gesture();
		self.set_hover(None)
	}

	/// Wheel notch at a screen point. Positive `delta_y` zooms out, zero
	/// (a horizontal swipe) does nothing.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) -> bool {
		if delta_y == 0.0 || !delta_y.is_finite() {
			return false;
		}
		let step = self.view.wheel_zoom_step;
		let factor = if delta_y > 0.0 { 1.0 / step } else { step };
		self.zoom_at(sx, sy, factor)
	}

	/// Scale by `factor` around a screen point so that point stays fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) -> bool {
		if !factor.is_finite() || factor <= 0.0 {
			return false;
		}
		let new_k = self.view.clamp_zoom(self.transform.k * factor);
		if new_k == self.transform.k {
			return false;
		}
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
		self.request_redraw();
		true
	}

	/// Second finger down. Cancels any drag or pan.
	pub fn pinch_start(&mut self, a: (f64, f64), b: (f64, f64)) {
		self.end_gesture();
		let (mid_x, mid_y) = midpoint(a, b);
		self.gesture = Gesture::Pinch(PinchState {
			distance: distance(a, b),
			mid_x,
			mid_y,
		});
	}

	/// Fingers moved: zoom around the midpoint and pan with it.
	pub fn pinch_move(&mut self, a: (f64, f64), b: (f64, f64)) -> bool {
		let Gesture::Pinch(pinch) = &self.gesture else {
			return false;
		};
		let (last_distance, last_mid) = (pinch.distance, (pinch.mid_x, pinch.mid_y));
		let (mid_x, mid_y) = midpoint(a, b);
		let dist = distance(a, b);

		self.transform.x += mid_x - last_mid.0;
		self.transform.y += mid_y - last_mid.1;
		if last_distance > 0.0 && dist > 0.0 {
			self.zoom_at(mid_x, mid_y, dist / last_distance);
		}
		self.gesture = Gesture::Pinch(PinchState {
			distance: dist,
			mid_x,
			mid_y,
		});
		self.request_redraw();
		true
	}

	pub fn pinch_end(&mut self) {
		if matches!(self.gesture, Gesture::Pinch(_)) {
			self.gesture = Gesture::Idle;
		}
	}

	/// Select `node`, or clear the selection if it already is selected.
	pub fn toggle_selection(&mut self, node: NodeIndex) {
		self.selection.selected = if self.selection.selected == Some(node) {
			None
		} else {
			Some(node)
		};
		self.request_redraw();
	}

	/// Returns whether the hovered node changed.
	pub fn set_hover(&mut self, node: Option<NodeIndex>) -> bool {
		if self.selection.hovered == node {
			return false;
		}
		self.selection.hovered = node;
		self.request_redraw();
		true
	}

	pub fn is_dragging(&self) -> bool {
		matches!(self.gesture, Gesture::Drag(_))
	}

	pub fn is_panning(&self) -> bool {
		matches!(self.gesture, Gesture::Pan(_))
	}

	fn end_gesture(&mut self) {
		if let Gesture::Drag(_) = std::mem::take(&mut self.gesture) {
			self.simulation_mut().unpin();
		}
	}
}

fn midpoint(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
	((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
	((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::config::GraphConfig;
	use crate::components::force_graph::simulation::SimulationPhase;
	use crate::components::force_graph::style;
	use crate::components::force_graph::types::{GraphData, GraphNode, GraphRelationship};

	fn triangle_with_tail() -> GraphData {
		GraphData {
			nodes: ["a", "b", "c", "d"]
				.iter()
				.map(|id| GraphNode::new(*id, "Concept"))
				.collect(),
			relationships: vec![
				GraphRelationship::new("a", "b", "USES"),
				GraphRelationship::new("b", "c", "PART_OF"),
				GraphRelationship::new("c", "a", "HAS"),
				GraphRelationship::new("c", "d", "RELATES_TO"),
			],
			chunks_processed: 1,
		}
	}

	fn settled() -> ForceGraphState {
		let mut state =
			ForceGraphState::new(&triangle_with_tail(), 800.0, 600.0, &GraphConfig::default(), 5);
		while state.tick() {}
		state
	}

	fn screen_pos(state: &ForceGraphState, node: NodeIndex) -> (f64, f64) {
		let Some((x, y)) = state.simulation().position(node) else {
			panic!("node {node} missing");
		};
		let t = state.transform();
		(x * t.k + t.x, y * t.k + t.y)
	}

	/// A point on the canvas far from every node.
	fn empty_spot(state: &ForceGraphState) -> (f64, f64) {
		for (x, y) in [(5.0, 5.0), (795.0, 5.0), (5.0, 595.0), (795.0, 595.0)] {
			if state.node_at_position(x, y).is_none() {
				return (x, y);
			}
		}
		panic!("no empty corner");
	}

	#[test]
	fn press_on_node_starts_drag_not_pan() {
		let mut state = settled();
		let (x, y) = screen_pos(&state, 1);
		assert_eq!(state.pointer_down(x, y), Some(1));
		assert!(state.is_dragging());
		assert!(!state.is_panning());
		assert_eq!(state.simulation().pinned(), Some(1));
		assert_eq!(state.simulation().phase(), SimulationPhase::Running);
	}

	#[test]
	fn drag_moves_pin_in_world_units() {
		let mut state = settled();
		state.zoom_at(400.0, 300.0, 2.0);
		let Some(start) = state.simulation().position(2) else {
			panic!("node c missing");
		};
		let (x, y) = screen_pos(&state, 2);
		state.pointer_down(x, y);
		assert!(state.pointer_move(x + 40.0, y));
		assert_eq!(state.simulation().position(2), Some((start.0 + 20.0, start.1)));
		state.tick();
		assert_eq!(state.simulation().position(2), Some((start.0 + 20.0, start.1)));

		assert!(!state.pointer_up(x + 40.0, y));
		assert_eq!(state.simulation().pinned(), None);
		assert_eq!(state.selection().selected, None);
	}

	#[test]
	fn click_toggles_selection() {
		let mut state = settled();
		let (x, y) = screen_pos(&state, 0);
		state.pointer_down(x, y);
		state.pointer_move(x + 1.0, y + 1.0);
		assert!(state.pointer_up(x + 1.0, y + 1.0));
		assert_eq!(state.selection().selected, Some(0));
		let details = state.selected_details().unwrap();
		assert_eq!(details.id, "a");
		assert_eq!(details.connections.len(), 2);

		let (x, y) = screen_pos(&state, 0);
		state.pointer_down(x, y);
		assert!(state.pointer_up(x, y));
		assert_eq!(state.selection().selected, None);
	}

	#[test]
	fn clicking_another_node_moves_selection() {
		let mut state = settled();
		state.toggle_selection(0);
		let (x, y) = screen_pos(&state, 3);
		state.pointer_down(x, y);
		state.pointer_up(x, y);
		assert_eq!(state.selection().selected, Some(3));
	}

	#[test]
	fn pan_on_empty_canvas_moves_the_view() {
		let mut state = settled();
		let (x, y) = empty_spot(&state);
		assert_eq!(state.pointer_down(x, y), None);
		assert!(state.is_panning());
		state.pointer_move(x + 30.0, y - 10.0);
		assert_eq!(state.transform().x, 30.0);
		assert_eq!(state.transform().y, -10.0);
		assert!(!state.pointer_up(x + 30.0, y - 10.0));
		assert_eq!(state.simulation().pinned(), None);
		assert_eq!(state.simulation().phase(), SimulationPhase::Idle);
	}

	#[test]
	fn hover_is_reversible() {
		let mut state = settled();
		let before: Vec<_> = (0..4).filter_map(|i| state.edge_visual(i)).collect();

		let (x, y) = screen_pos(&state, 3);
		assert!(state.pointer_move(x, y));
		assert_eq!(state.selection().hovered, Some(3));
		let during: Vec<_> = (0..4).filter_map(|i| state.edge_visual(i)).collect();
		assert_ne!(before, during);
		assert_eq!(during[3].opacity, 1.0);
		assert!(during[3].label_bold);
		assert!(during[0].opacity < before[0].opacity);

		let (ex, ey) = empty_spot(&state);
		assert!(state.pointer_move(ex, ey));
		let after: Vec<_> = (0..4).filter_map(|i| state.edge_visual(i)).collect();
		assert_eq!(before, after);
	}

	#[test]
	fn hover_does_not_touch_physics() {
		let mut state = settled();
		let positions = state.simulation().positions();
		let (x, y) = screen_pos(&state, 1);
		state.pointer_move(x, y);
		assert!(!state.is_animating());
		assert!(!state.tick());
		assert_eq!(state.simulation().positions(), positions);
	}

	#[test]
	fn wheel_zoom_keeps_the_cursor_point_fixed() {
		let mut state = settled();
		let before = state.screen_to_graph(200.0, 150.0);
		assert!(state.wheel(200.0, 150.0, -1.0));
		assert!(state.transform().k > 1.0);
		let after = state.screen_to_graph(200.0, 150.0);
		assert!((before.0 - after.0).abs() < 1e-9);
		assert!((before.1 - after.1).abs() < 1e-9);
	}

	#[test]
	fn horizontal_wheel_does_not_zoom() {
		let mut state = settled();
		let before = state.transform().clone();
		assert!(!state.wheel(100.0, 100.0, 0.0));
		assert!(!state.wheel(100.0, 100.0, f64::NAN));
		assert!(!state.wheel(100.0, 100.0, f64::INFINITY));
		assert_eq!(state.transform(), &before);
	}

	#[test]
	fn zoom_is_clamped() {
		let mut state = settled();
		for _ in 0..100 {
			state.wheel(0.0, 0.0, 1.0);
		}
		assert_eq!(state.transform().k, 0.5);
		assert!(!state.wheel(0.0, 0.0, 1.0));
		for _ in 0..100 {
			state.wheel(0.0, 0.0, -1.0);
		}
		assert_eq!(state.transform().k, 3.0);
	}

	#[test]
	fn pinch_scales_around_the_midpoint() {
		let mut state = settled();
		state.pinch_start((100.0, 100.0), (200.0, 100.0));
		let anchor = state.screen_to_graph(150.0, 100.0);
		assert!(state.pinch_move((50.0, 100.0), (250.0, 100.0)));
		assert!((state.transform().k - 2.0).abs() < 1e-9);
		let after = state.screen_to_graph(150.0, 100.0);
		assert!((anchor.0 - after.0).abs() < 1e-9);
		assert!((anchor.1 - after.1).abs() < 1e-9);
		state.pinch_end();
		assert!(!state.pinch_move((0.0, 0.0), (10.0, 10.0)));
	}

	#[test]
	fn pinch_cancels_a_drag() {
		let mut state = settled();
		let (x, y) = screen_pos(&state, 0);
		state.pointer_down(x, y);
		state.pinch_start((0.0, 0.0), (10.0, 0.0));
		assert_eq!(state.simulation().pinned(), None);
		assert!(!state.is_dragging());
	}

	#[test]
	fn leaving_the_canvas_releases_everything() {
		let mut state = settled();
		let (x, y) = screen_pos(&state, 2);
		state.pointer_move(x, y);
		state.pointer_down(x, y);
		assert!(state.pointer_leave());
		assert_eq!(state.simulation().pinned(), None);
		assert_eq!(state.selection().hovered, None);
		assert!(!state.is_dragging());
		assert!(!state.pointer_up(x, y));
		assert_eq!(state.selection().selected, None);
	}

	#[test]
	fn node_radius_matches_style() {
		let state = settled();
		for idx in 0..4 {
			let degree = state.model().degree(idx);
			assert_eq!(state.simulation().nodes()[idx].radius, style::node_radius(degree));
		}
	}
}
