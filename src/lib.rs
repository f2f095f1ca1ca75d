//! mindmap-graph: Interactive force-directed mind-map visualization.
//!
//! This crate provides a WASM-based component that lays out a knowledge graph
//! with a force simulation and renders it on a canvas with dragging, pan/zoom,
//! hover highlighting and node selection.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::detail_panel::NodeDetailPanel;
pub use components::force_graph::{
	GraphConfig, GraphData, GraphError, GraphNode, GraphRelationship, GraphStats, MindMapCanvas,
	NodeDetails,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("mindmap-graph: logging initialized");
}

/// Text of a `<script>` element, used to embed JSON in the host page.
fn script_text(id: &str) -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Load graph data from a script element with id="graph-data".
/// Accepts `{ nodes, relationships }` as well as the older `{ nodes, edges }` shape.
fn load_graph_data() -> Option<GraphData> {
	let json_text = script_text("graph-data")?;
	match GraphData::from_json(&json_text) {
		Ok(data) => {
			info!(
				"mindmap-graph: loaded {} nodes, {} relationships",
				data.nodes.len(),
				data.relationships.len()
			);
			Some(data)
		}
		Err(e) => {
			warn!("mindmap-graph: failed to parse graph data: {}", e);
			None
		}
	}
}

/// Optional layout and view overrides from a script element with id="graph-config".
fn load_graph_config() -> GraphConfig {
	let Some(json_text) = script_text("graph-config") else {
		return GraphConfig::default();
	};
	GraphConfig::from_json(&json_text).unwrap_or_else(|e| {
		warn!("mindmap-graph: failed to parse graph config, using defaults: {}", e);
		GraphConfig::default()
	})
}

/// Main application component.
/// Loads graph data from DOM and renders the mind map with a detail panel for the selected node.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let graph_data = load_graph_data().unwrap_or_default();
	let graph_signal = Signal::derive(move || graph_data.clone());
	let config = load_graph_config();
	let selected = RwSignal::new(None::<NodeDetails>);
	let error = RwSignal::new(None::<String>);
	let stats = RwSignal::new(None::<GraphStats>);

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Mind Map" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<MindMapCanvas
				data=graph_signal
				config=config
				fullscreen=true
				on_load=Callback::new(move |loaded| stats.set(Some(loaded)))
				on_select=Callback::new(move |details| selected.set(details))
				on_error=Callback::new(move |message| error.set(Some(message)))
			/>
			<div class="graph-overlay">
				<h1>"Mind Map"</h1>
				<p class="subtitle">"Drag nodes to reposition. Click a node for details. Scroll or pinch to zoom."</p>
				{move || stats.get().map(|s| view! { <p class="graph-stats">{s.to_string()}</p> })}
				{move || error.get().map(|message| view! { <p class="graph-error">{message}</p> })}
			</div>
			<NodeDetailPanel details=selected />
		</div>
	}
}
