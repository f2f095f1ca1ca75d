//! Zoom-dependent scaling configuration for graph visuals.
//!
//! Node radii and edge widths live in world space and simply scale with the
//! view transform. Text, borders and hit targets need more care: labels stay
//! readable at any zoom, borders keep a constant pixel width, and small nodes
//! remain clickable when zoomed far out.
//!
//! # Coordinate Spaces
//!
//! - **World-space**: The coordinate system of the simulation. Values scale
//!   with zoom (appear larger when zoomed in).
//! - **Screen-space**: Pixel coordinates on the canvas, unaffected by zoom.

/// Defines how a visual property scales with zoom level.
#[derive(Clone, Debug, PartialEq)]
pub enum ScaleBehavior {
	/// Constant world-space size. Appears larger when zoomed in.
	World,
	/// Constant screen-space size (pixels). Unaffected by zoom.
	Screen,
	/// World-space scaling, clamped to min/max screen-space bounds.
	Clamped { min_screen: f64, max_screen: f64 },
}

impl ScaleBehavior {
	/// World-space value for `base` at zoom `k`, ready for use after the canvas transform.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::World => base,
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => {
				// screen_size = world_size * k
				base.clamp(min_screen / k, max_screen / k)
			}
		}
	}
}

/// Defines how alpha/opacity scales with zoom level.
#[derive(Clone, Debug, PartialEq)]
pub enum AlphaBehavior {
	/// Constant alpha regardless of zoom.
	Constant,
	/// Invisible at or below `zero_alpha_k`, fully visible at or above `full_alpha_k`.
	Fade { zero_alpha_k: f64, full_alpha_k: f64 },
}

impl AlphaBehavior {
	pub fn apply(&self, k: f64) -> f64 {
		match self {
			AlphaBehavior::Constant => 1.0,
			AlphaBehavior::Fade {
				zero_alpha_k,
				full_alpha_k,
			} => {
				if zero_alpha_k == full_alpha_k {
					return if k >= *full_alpha_k { 1.0 } else { 0.0 };
				}
				((k - zero_alpha_k) / (full_alpha_k - zero_alpha_k)).clamp(0.0, 1.0)
			}
		}
	}
}

/// Font size and visibility of one kind of label.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelScaleConfig {
	/// Font size in world units at zoom 1.
	pub size: f64,
	pub size_behavior: ScaleBehavior,
	pub alpha_behavior: AlphaBehavior,
}

impl LabelScaleConfig {
	fn font(&self, k: f64, bold: bool) -> String {
		let px = self.size_behavior.apply(self.size, k);
		if bold {
			format!("bold {px}px sans-serif")
		} else {
			format!("{px}px sans-serif")
		}
	}
}

/// Complete scale configuration for all graph elements.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleConfig {
	/// Node id, drawn inside the circle.
	pub node_label: LabelScaleConfig,
	/// Node type, drawn under the circle.
	pub type_label: LabelScaleConfig,
	/// Relationship label at the edge midpoint.
	pub edge_label: LabelScaleConfig,
	pub arrow_size: f64,
	pub arrow_behavior: ScaleBehavior,
	pub border_width: f64,
	pub border_behavior: ScaleBehavior,
	/// Smallest hit radius in screen pixels, whatever the node radius and zoom.
	pub min_hit_radius: f64,
	/// Labels fainter than this are skipped.
	pub label_cull_alpha: f64,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			node_label: LabelScaleConfig {
				size: 12.0,
				size_behavior: ScaleBehavior::Clamped {
					min_screen: 8.0,
					max_screen: 20.0,
				},
				alpha_behavior: AlphaBehavior::Constant,
			},
			type_label: LabelScaleConfig {
				size: 9.0,
				size_behavior: ScaleBehavior::Clamped {
					min_screen: 6.0,
					max_screen: 14.0,
				},
				alpha_behavior: AlphaBehavior::Fade {
					zero_alpha_k: 0.6,
					full_alpha_k: 0.9,
				},
			},
			edge_label: LabelScaleConfig {
				size: 10.0,
				size_behavior: ScaleBehavior::Clamped {
					min_screen: 6.0,
					max_screen: 16.0,
				},
				alpha_behavior: AlphaBehavior::Fade {
					zero_alpha_k: 0.7,
					full_alpha_k: 1.0,
				},
			},
			arrow_size: 8.0,
			arrow_behavior: ScaleBehavior::World,
			border_width: 2.0,
			border_behavior: ScaleBehavior::Screen,
			min_hit_radius: 8.0,
			label_cull_alpha: 0.05,
		}
	}
}

/// Pre-computed scale values for a specific zoom level.
///
/// Create this once per frame and pass it to rendering and hit-testing.
/// All sizes are in world-space.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaledValues {
	pub k: f64,
	pub node_font: String,
	pub node_label_alpha: f64,
	pub type_font: String,
	pub type_label_alpha: f64,
	pub edge_font: String,
	pub edge_font_bold: String,
	pub edge_label_alpha: f64,
	pub arrow_size: f64,
	pub border_width: f64,
	pub min_hit_radius: f64,
	cull_alpha: f64,
}

impl ScaledValues {
	pub fn new(config: &ScaleConfig, k: f64) -> Self {
		let k = if k.is_finite() && k > 0.0 { k } else { 1.0 };
		Self {
			k,
			node_font: config.node_label.font(k, false),
			node_label_alpha: config.node_label.alpha_behavior.apply(k),
			type_font: config.type_label.font(k, false),
			type_label_alpha: config.type_label.alpha_behavior.apply(k),
			edge_font: config.edge_label.font(k, false),
			edge_font_bold: config.edge_label.font(k, true),
			edge_label_alpha: config.edge_label.alpha_behavior.apply(k),
			arrow_size: config.arrow_behavior.apply(config.arrow_size, k),
			border_width: config.border_behavior.apply(config.border_width, k),
			min_hit_radius: ScaleBehavior::Screen.apply(config.min_hit_radius, k),
			cull_alpha: config.label_cull_alpha,
		}
	}

	pub fn show_type_labels(&self) -> bool {
		self.type_label_alpha >= self.cull_alpha
	}

	pub fn show_edge_labels(&self) -> bool {
		self.edge_label_alpha >= self.cull_alpha
	}

	/// Hit radius for a node of world radius `radius`.
	pub fn hit_radius(&self, radius: f64) -> f64 {
		radius.max(self.min_hit_radius)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clamped_fonts_stay_readable() {
		let config = ScaleConfig::default();
		// At k = 0.5 a 12-unit font would be 6 px on screen; it is bumped to 8 px.
		let zoomed_out = ScaledValues::new(&config, 0.5);
		assert_eq!(zoomed_out.node_font, "16px sans-serif");
		let normal = ScaledValues::new(&config, 1.0);
		assert_eq!(normal.node_font, "12px sans-serif");
		assert_eq!(normal.edge_font_bold, "bold 10px sans-serif");
	}

	#[test]
	fn edge_labels_fade_when_zoomed_out() {
		let config = ScaleConfig::default();
		assert_eq!(ScaledValues::new(&config, 1.0).edge_label_alpha, 1.0);
		assert!(ScaledValues::new(&config, 0.85).edge_label_alpha < 1.0);
		let far = ScaledValues::new(&config, 0.5);
		assert_eq!(far.edge_label_alpha, 0.0);
		assert!(!far.show_edge_labels());
		assert!(!far.show_type_labels());
	}

	#[test]
	fn border_keeps_pixel_width() {
		let config = ScaleConfig::default();
		assert_eq!(ScaledValues::new(&config, 2.0).border_width, 1.0);
		assert_eq!(ScaledValues::new(&config, 0.5).border_width, 4.0);
	}

	#[test]
	fn hit_radius_has_a_screen_floor() {
		let config = ScaleConfig::default();
		let far = ScaledValues::new(&config, 0.25);
		assert_eq!(far.hit_radius(20.0), 32.0);
		let near = ScaledValues::new(&config, 2.0);
		assert_eq!(near.hit_radius(20.0), 20.0);
	}

	#[test]
	fn degenerate_zoom_falls_back_to_identity() {
		let values = ScaledValues::new(&ScaleConfig::default(), 0.0);
		assert_eq!(values.k, 1.0);
	}
}
