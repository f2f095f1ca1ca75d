//! Canvas rendering for the force graph.
//!
//! Rendering uses multiple passes for correct z-ordering:
//! 1. Background (screen space)
//! 2. Faded and baseline edges, then highlighted edges with their labels (world space)
//! 3. Nodes, with the hovered node drawn last so it sits on top
//!
//! Drawing never fails the frame: canvas calls that can error are ignored
//! and gradients fall back to flat fills.

use std::f64::consts::PI;

use web_sys::{CanvasGradient, CanvasRenderingContext2d};

use super::model::{NodeIndex, ResolvedEdge};
use super::scale::ScaledValues;
use super::state::ForceGraphState;
use super::style::{EdgeVisual, HOVER_RADIUS_SCALE, NodeVisual};
use super::theme::{Color, Theme};

/// Vertical offset of the type label below the node center, in world units.
const TYPE_LABEL_OFFSET: f64 = 25.0;
/// Edge labels sit slightly above the midpoint.
const EDGE_LABEL_OFFSET: f64 = 5.0;
const SELECTED_BORDER_SCALE: f64 = 2.0;
const PLACEHOLDER_TEXT: &str = "No graph data";

/// Renders the complete graph to the canvas.
pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let theme = state.theme();
	draw_background(state, ctx, theme);

	if state.is_empty() {
		draw_placeholder(state, ctx, theme);
		return;
	}

	let scale = state.scaled();
	let t = state.transform();
	ctx.save();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);

	draw_edges(state, ctx, &scale, theme);
	draw_nodes(state, ctx, &scale, theme);

	ctx.restore();
}

fn radial_gradient(
	ctx: &CanvasRenderingContext2d,
	(x0, y0, r0): (f64, f64, f64),
	(x1, y1, r1): (f64, f64, f64),
	stops: &[(f32, Color)],
) -> Option<CanvasGradient> {
	let gradient = ctx.create_radial_gradient(x0, y0, r0, x1, y1, r1).ok()?;
	for (offset, color) in stops {
		gradient.add_color_stop(*offset, &color.to_css()).ok()?;
	}
	Some(gradient)
}

fn draw_background(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let (w, h) = (state.width(), state.height());
	let gradient = radial_gradient(
		ctx,
		(w / 2.0, h / 2.0, 0.0),
		(w / 2.0, h / 2.0, w.max(h) * 0.8),
		&[
			(0.0, theme.background.color),
			(1.0, theme.background.color_secondary),
		],
	);
	match gradient {
		Some(gradient) => {
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		None => ctx.set_fill_style_str(&theme.background.color.to_css()),
	}
	ctx.fill_rect(0.0, 0.0, w, h);
}

fn draw_placeholder(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	ctx.set_fill_style_str(&theme.labels.placeholder.to_css());
	ctx.set_font("14px sans-serif");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text(PLACEHOLDER_TEXT, state.width() / 2.0, state.height() / 2.0);
}

/// Drawn radius of a node, grown while hovered.
fn display_radius(state: &ForceGraphState, idx: NodeIndex, visual: &NodeVisual) -> f64 {
	if state.selection().hovered == Some(idx) {
		visual.radius * HOVER_RADIUS_SCALE
	} else {
		visual.radius
	}
}

fn draw_edges(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
) {
	let edges = state.model().edges();
	let visuals: Vec<Option<EdgeVisual>> = (0..edges.len()).map(|i| state.edge_visual(i)).collect();

	// Emphasized edges go last so they cross over faded ones.
	for emphasized in [false, true] {
		for (edge, visual) in edges.iter().zip(&visuals) {
			let Some(visual) = visual else {
				continue;
			};
			if visual.label_bold == emphasized {
				draw_edge(state, ctx, scale, theme, edge, visual);
			}
		}
	}
}

fn draw_edge(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	edge: &ResolvedEdge,
	visual: &EdgeVisual,
) {
	let sim = state.simulation();
	let (Some((x1, y1)), Some((x2, y2))) = (sim.position(edge.source), sim.position(edge.target))
	else {
		return;
	};
	let (Some(sv), Some(tv)) = (state.node_visual(edge.source), state.node_visual(edge.target))
	else {
		return;
	};
	let (r1, r2) = (
		display_radius(state, edge.source, sv),
		display_radius(state, edge.target, tv),
	);

	ctx.set_global_alpha(visual.opacity);
	ctx.set_stroke_style_str(&visual.color.to_css());
	ctx.set_fill_style_str(&visual.color.to_css());
	ctx.set_line_width(visual.width);

	let (label_x, label_y) = if edge.source == edge.target {
		draw_self_loop(ctx, x1, y1, r1)
	} else {
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist <= r1 + r2 {
			ctx.set_global_alpha(1.0);
			return;
		}
		let (ux, uy) = (dx / dist, dy / dist);
		let arrow = scale.arrow_size;

		ctx.begin_path();
		ctx.move_to(x1 + ux * r1, y1 + uy * r1);
		ctx.line_to(x2 - ux * (r2 + arrow), y2 - uy * (r2 + arrow));
		ctx.stroke();

		let (tip_x, tip_y) = (x2 - ux * r2, y2 - uy * r2);
		let (back_x, back_y) = (tip_x - ux * arrow, tip_y - uy * arrow);
		let (px, py) = (-uy * arrow * 0.5, ux * arrow * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();

		((x1 + x2) / 2.0, (y1 + y2) / 2.0)
	};

	if scale.show_edge_labels() && !visual.label.is_empty() {
		ctx.set_global_alpha(visual.opacity * scale.edge_label_alpha);
		ctx.set_fill_style_str(&theme.labels.edge.to_css());
		ctx.set_font(if visual.label_bold {
			&scale.edge_font_bold
		} else {
			&scale.edge_font
		});
		ctx.set_text_align("center");
		ctx.set_text_baseline("alphabetic");
		let _ = ctx.fill_text(&visual.label, label_x, label_y - EDGE_LABEL_OFFSET);
	}
	ctx.set_global_alpha(1.0);
}

/// Small loop above the node. Returns the label anchor.
fn draw_self_loop(ctx: &CanvasRenderingContext2d, x: f64, y: f64, r: f64) -> (f64, f64) {
	let loop_r = r * 0.6;
	let (cx, cy) = (x, y - r);
	ctx.begin_path();
	let _ = ctx.arc(cx, cy, loop_r, 0.0, 2.0 * PI);
	ctx.stroke();
	(cx, cy - loop_r)
}

fn draw_nodes(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
) {
	let hovered = state.selection().hovered;
	for (idx, node) in state.simulation().nodes().iter().enumerate() {
		if Some(idx) != hovered {
			draw_node(state, ctx, scale, theme, idx, (node.x, node.y));
		}
	}
	if let Some(idx) = hovered
		&& let Some(pos) = state.simulation().position(idx)
	{
		draw_node(state, ctx, scale, theme, idx, pos);
	}
}

fn draw_node(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	theme: &Theme,
	idx: NodeIndex,
	(x, y): (f64, f64),
) {
	let Some(visual) = state.node_visual(idx) else {
		return;
	};
	let radius = display_radius(state, idx, visual);
	let selected = state.selection().selected == Some(idx);

	let gradient = radial_gradient(
		ctx,
		(x - radius * 0.3, y - radius * 0.3, 0.0),
		(x, y, radius),
		&[
			(0.0, visual.color.lighten(theme.outline.gradient)),
			(0.7, visual.color),
			(1.0, visual.color.darken(theme.outline.gradient * 0.5)),
		],
	);
	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	match gradient {
		Some(gradient) => {
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		None => ctx.set_fill_style_str(&visual.color.to_css()),
	}
	ctx.fill();

	let border = if selected {
		scale.border_width * SELECTED_BORDER_SCALE
	} else {
		scale.border_width
	};
	ctx.set_stroke_style_str(&theme.outline.color.to_css());
	ctx.set_line_width(border);
	ctx.stroke();

	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_global_alpha(scale.node_label_alpha);
	ctx.set_fill_style_str(&theme.labels.primary.to_css());
	ctx.set_font(&scale.node_font);
	let _ = ctx.fill_text(&visual.label, x, y);

	if scale.show_type_labels() && !visual.secondary_label.is_empty() {
		ctx.set_global_alpha(scale.type_label_alpha);
		ctx.set_fill_style_str(&theme.labels.secondary.to_css());
		ctx.set_font(&scale.type_font);
		let _ = ctx.fill_text(&visual.secondary_label, x, y + TYPE_LABEL_OFFSET.max(radius + 5.0));
	}
	ctx.set_global_alpha(1.0);
}
