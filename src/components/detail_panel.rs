//! Side panel describing the selected node.

use leptos::prelude::*;
use serde_json::Value;

use super::force_graph::{Direction, NodeDetails};

/// Property values render bare when they are strings, as JSON otherwise.
fn display_value(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

fn direction_arrow(direction: Direction) -> &'static str {
	match direction {
		Direction::Outgoing => "→",
		Direction::Incoming => "←",
	}
}

/// Shows id, type, properties and connections of the selected node.
/// Renders nothing while no node is selected.
#[component]
pub fn NodeDetailPanel(#[prop(into)] details: Signal<Option<NodeDetails>>) -> impl IntoView {
	move || {
		details.get().map(|details| {
			let properties = details
				.properties
				.iter()
				.map(|(key, value)| {
					let key = key.clone();
					let value = display_value(value);
					view! {
						<li>
							<span class="property-key">{key}</span>
							": "
							<span class="property-value">{value}</span>
						</li>
					}
				})
				.collect_view();

			let connections = details
				.connections
				.into_iter()
				.map(|c| {
					view! {
						<li class="connection">
							<span class="connection-direction">{direction_arrow(c.direction)}</span>
							" "
							<span class="connection-type">{c.relationship_type}</span>
							" "
							<span class="connection-peer">{c.peer_id}</span>
						</li>
					}
				})
				.collect_view();

			view! {
				<aside class="node-detail-panel">
					<h2>{details.id}</h2>
					{details.node_type.map(|t| view! { <p class="node-type">{t}</p> })}
					<h3>"Properties"</h3>
					<ul class="node-properties">{properties}</ul>
					<h3>"Connections"</h3>
					<ul class="node-connections">{connections}</ul>
				</aside>
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn strings_render_without_quotes() {
		assert_eq!(display_value(&json!("TCP")), "TCP");
		assert_eq!(display_value(&json!(21)), "21");
		assert_eq!(display_value(&json!(["a"])), "[\"a\"]");
	}
}
