//! Visual theming for the force graph.
//!
//! Colors for everything that is not derived from graph semantics: background,
//! node borders, label text and the empty-state placeholder. Relationship and
//! node fill colors come from [`super::style`].

use serde::Deserialize;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Build from a `0xRRGGBB` literal.
	pub const fn hex(rgb: u32) -> Self {
		Self::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// Darken the color by a factor (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * f) as u8,
			g: (self.g as f64 * f) as u8,
			b: (self.b as f64 * f) as u8,
			a: self.a,
		}
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Theme selector used by [`super::config::GraphConfig`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
	#[default]
	Light,
	Dark,
}

/// Background style configuration.
#[derive(Clone, Debug)]
pub struct BackgroundStyle {
	/// Color at the canvas center
	pub color: Color,
	/// Color at the canvas edges
	pub color_secondary: Color,
}

/// Text colors for node and edge labels.
#[derive(Clone, Debug)]
pub struct LabelStyle {
	/// Node id label
	pub primary: Color,
	/// Node type label
	pub secondary: Color,
	/// Relationship label at the edge midpoint
	pub edge: Color,
	/// "No graph data" placeholder
	pub placeholder: Color,
}

/// Node outline style.
#[derive(Clone, Debug)]
pub struct NodeOutline {
	pub color: Color,
	/// Inner gradient highlight strength (0.0 = flat fill)
	pub gradient: f64,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	pub name: &'static str,
	pub background: BackgroundStyle,
	pub labels: LabelStyle,
	pub outline: NodeOutline,
}

impl Theme {
	/// White canvas with dark text (default).
	pub fn light() -> Self {
		Self {
			name: "light",
			background: BackgroundStyle {
				color: Color::rgb(255, 255, 255),
				color_secondary: Color::rgb(243, 244, 246),
			},
			labels: LabelStyle {
				primary: Color::hex(0x1f2937),
				secondary: Color::hex(0x6b7280),
				edge: Color::hex(0x4b5563),
				placeholder: Color::hex(0x9ca3af),
			},
			outline: NodeOutline {
				color: Color::rgb(255, 255, 255),
				gradient: 0.35,
			},
		}
	}

	/// Slate background with light text.
	pub fn dark() -> Self {
		Self {
			name: "dark",
			background: BackgroundStyle {
				color: Color::rgb(30, 35, 42),
				color_secondary: Color::rgb(22, 27, 34),
			},
			labels: LabelStyle {
				primary: Color::rgba(255, 255, 255, 0.9),
				secondary: Color::rgb(156, 163, 175),
				edge: Color::rgb(203, 213, 225),
				placeholder: Color::rgb(107, 114, 128),
			},
			outline: NodeOutline {
				color: Color::rgba(255, 255, 255, 0.6),
				gradient: 0.25,
			},
		}
	}

	pub fn from_name(name: ThemeName) -> Self {
		match name {
			ThemeName::Light => Self::light(),
			ThemeName::Dark => Self::dark(),
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::light()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hex_literal_round_trips_to_css() {
		assert_eq!(Color::hex(0x6366f1).to_css(), "#6366f1");
		assert_eq!(
			Color::hex(0x6366f1).with_alpha(0.5).to_css(),
			"rgba(99, 102, 241, 0.5)"
		);
	}

	#[test]
	fn lighten_and_darken_stay_in_range() {
		let c = Color::rgb(100, 150, 200);
		assert_eq!(c.lighten(1.0), Color::rgb(255, 255, 255));
		assert_eq!(c.darken(1.0), Color::rgb(0, 0, 0));
		assert_eq!(c.lighten(0.0), c);
	}

	#[test]
	fn theme_name_deserializes_lowercase() {
		let name: ThemeName = serde_json::from_str("\"dark\"").unwrap();
		assert_eq!(Theme::from_name(name).name, "dark");
	}
}
