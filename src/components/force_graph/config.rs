//! Host-supplied configuration.
//!
//! Every field has a default, so `{}` and partial documents are valid:
//!
//! ```json
//! { "simulation": { "charge_strength": -500 }, "view": { "max_zoom": 5 }, "theme": "dark" }
//! ```

use log::warn;
use serde::Deserialize;

use super::error::GraphResult;
use super::simulation::SimulationParameters;
use super::theme::ThemeName;

/// Limits and gesture tuning for the view transform.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
	pub min_zoom: f64,
	pub max_zoom: f64,
	/// Zoom factor applied per wheel notch.
	pub wheel_zoom_step: f64,
	/// Pointer travel (screen px) below which a press on a node counts as a click.
	pub click_tolerance: f64,
}

impl Default for ViewConfig {
	fn default() -> Self {
		Self {
			min_zoom: 0.5,
			max_zoom: 3.0,
			wheel_zoom_step: 1.1,
			click_tolerance: 4.0,
		}
	}
}

impl ViewConfig {
	/// Pull every field into a usable range.
	pub fn sanitized(self) -> Self {
		let defaults = Self::default();
		let min_zoom = bounded("view.min_zoom", self.min_zoom, 0.01, 100.0, defaults.min_zoom);
		Self {
			min_zoom,
			max_zoom: bounded("view.max_zoom", self.max_zoom, min_zoom, 100.0, defaults.max_zoom.max(min_zoom)),
			wheel_zoom_step: bounded(
				"view.wheel_zoom_step",
				self.wheel_zoom_step,
				1.001,
				4.0,
				defaults.wheel_zoom_step,
			),
			click_tolerance: bounded(
				"view.click_tolerance",
				self.click_tolerance,
				0.0,
				100.0,
				defaults.click_tolerance,
			),
		}
	}

	pub fn clamp_zoom(&self, k: f64) -> f64 {
		k.clamp(self.min_zoom, self.max_zoom.max(self.min_zoom))
	}
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
	pub simulation: SimulationParameters,
	pub view: ViewConfig,
	pub theme: ThemeName,
}

impl GraphConfig {
	/// Parse a host document. Out-of-range values are clamped with a warning.
	pub fn from_json(text: &str) -> GraphResult<Self> {
		let config: Self = serde_json::from_str(text)?;
		Ok(config.sanitized())
	}

	pub fn sanitized(self) -> Self {
		Self {
			simulation: self.simulation.sanitized(),
			view: self.view.sanitized(),
			theme: self.theme,
		}
	}
}

/// Clamp `value` to `[min, max]`, or use `default` when it is not finite.
pub(super) fn bounded(name: &str, value: f64, min: f64, max: f64, default: f64) -> f64 {
	let fixed = if value.is_finite() {
		value.clamp(min, max)
	} else {
		default
	};
	if fixed != value {
		warn!("mindmap-graph: config {name} = {value} out of range, using {fixed}");
	}
	fixed
}
