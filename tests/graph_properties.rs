//! Property-based invariant tests for the graph engine.
//!
//! Verifies:
//! 1. Edges naming an unknown node are dropped, never resolved
//! 2. Node radius and color do not depend on relationship or node order
//! 3. Any small graph settles to an idle, finite layout
//! 4. The FTP mind map sizes and colors its hub by connectivity

#![allow(unused_crate_dependencies)]

use mindmap_graph::components::force_graph::simulation::{Simulation, SimulationParameters};
use mindmap_graph::components::force_graph::style::{self, RelationshipKind};
use mindmap_graph::components::force_graph::{
	GraphData, GraphModel, GraphNode, GraphRelationship, SimulationPhase,
};
use proptest::prelude::*;

const LABELS: [&str; 5] = ["USES", "PART_OF", "HAS", "RELATES_TO", "mentions"];

fn node_ids(n: usize) -> Vec<String> {
	(0..n).map(|i| format!("n{i}")).collect()
}

/// Relationships over ids `n0..n{id_range}`; ids past the node count dangle.
fn arb_relationships(
	id_range: usize,
	max_edges: usize,
) -> impl Strategy<Value = Vec<GraphRelationship>> {
	prop::collection::vec(
		(0..id_range, 0..id_range, 0..LABELS.len()),
		0..max_edges,
	)
	.prop_map(|edges| {
		edges
			.into_iter()
			.map(|(s, t, l)| GraphRelationship::new(format!("n{s}"), format!("n{t}"), LABELS[l]))
			.collect()
	})
}

fn graph(nodes: usize, relationships: Vec<GraphRelationship>) -> GraphData {
	GraphData {
		nodes: node_ids(nodes)
			.into_iter()
			.map(|id| GraphNode::new(id, "Concept"))
			.collect(),
		relationships,
		chunks_processed: 1,
	}
}

/// Whether the most frequent touching label of `node` is strictly ahead of the rest.
fn has_unique_dominant(model: &GraphModel, node: usize) -> bool {
	let mut counts: Vec<(String, usize)> = Vec::new();
	for edge in model.touching(node) {
		match counts.iter_mut().find(|(key, _)| *key == edge.key) {
			Some((_, count)) => *count += 1,
			None => counts.push((edge.key.clone(), 1)),
		}
	}
	counts.sort_by(|a, b| b.1.cmp(&a.1));
	match counts.as_slice() {
		[] => true,
		[_] => true,
		[first, second, ..] => first.1 > second.1,
	}
}

proptest! {
	#[test]
	fn dangling_edges_are_dropped(
		nodes in 0usize..8,
		relationships in arb_relationships(12, 24),
	) {
		let data = graph(nodes, relationships);
		let model = GraphModel::build(&data);

		let resolvable = data
			.relationships
			.iter()
			.filter(|r| model.index_of(&r.source).is_some() && model.index_of(&r.target).is_some())
			.count();
		prop_assert_eq!(model.edges().len(), resolvable);
		prop_assert_eq!(model.dropped_edges(), data.relationships.len() - resolvable);
		for edge in model.edges() {
			prop_assert!(edge.source < model.node_count());
			prop_assert!(edge.target < model.node_count());
		}
	}

	#[test]
	fn style_ignores_relationship_order(
		(relationships, shuffled) in arb_relationships(6, 16)
			.prop_flat_map(|rels| (Just(rels.clone()), Just(rels).prop_shuffle())),
	) {
		let model = GraphModel::build(&graph(6, relationships));
		let reordered = GraphModel::build(&graph(6, shuffled));

		for node in 0..model.node_count() {
			let before = style::node_visual(&model, node);
			let after = style::node_visual(&reordered, node);
			prop_assert_eq!(before.radius, after.radius);
			if has_unique_dominant(&model, node) {
				prop_assert_eq!(before.color, after.color);
				prop_assert_eq!(before.dominant, after.dominant);
			}
		}
	}

	#[test]
	fn style_ignores_node_order(
		relationships in arb_relationships(8, 20),
		shuffled_ids in Just(node_ids(8)).prop_shuffle(),
	) {
		let original = graph(8, relationships.clone());
		let reordered = GraphData {
			nodes: shuffled_ids
				.into_iter()
				.map(|id| GraphNode::new(id, "Concept"))
				.collect(),
			relationships,
			chunks_processed: 1,
		};
		let model = GraphModel::build(&original);
		let other = GraphModel::build(&reordered);

		for id in node_ids(8) {
			let (Some(a), Some(b)) = (model.index_of(&id), other.index_of(&id)) else {
				return Err(TestCaseError::fail(format!("{id} missing")));
			};
			let before = style::node_visual(&model, a);
			let after = style::node_visual(&other, b);
			prop_assert_eq!(before.radius, after.radius);
			prop_assert_eq!(before.color, after.color);
			prop_assert_eq!(before.dominant, after.dominant);
			prop_assert_eq!(before.label, after.label);
		}
	}
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(32))]

	#[test]
	fn small_graphs_settle(
		nodes in 1usize..10,
		relationships in arb_relationships(10, 16),
		seed in any::<u64>(),
	) {
		let model = GraphModel::build(&graph(nodes, relationships));
		let radii: Vec<f64> = style::node_visuals(&model).iter().map(|v| v.radius).collect();
		let links: Vec<(usize, usize)> = model.edges().iter().map(|e| (e.source, e.target)).collect();
		let mut sim = Simulation::new(
			&radii,
			&links,
			800.0,
			600.0,
			SimulationParameters::default(),
			seed,
		);

		let mut ticks = 0;
		while sim.tick() {
			ticks += 1;
			prop_assert!(ticks < 2000, "layout never settled");
		}
		prop_assert_eq!(sim.phase(), SimulationPhase::Idle);
		for (x, y) in sim.positions() {
			prop_assert!(x.is_finite() && y.is_finite());
		}
	}
}

#[test]
fn ftp_hub_is_largest_and_colored_by_uses() {
	let nodes = [
		("FTP", "Protocol"),
		("Control Channel", "Component"),
		("Data Channel", "Component"),
		("Port 21", "Port"),
		("Port Range 20-21", "Port"),
		("Authentication", "Process"),
		("File Transfer", "Process"),
	];
	let data = GraphData {
		nodes: nodes.iter().map(|(id, t)| GraphNode::new(*id, *t)).collect(),
		relationships: vec![
			GraphRelationship::new("FTP", "Control Channel", "USES"),
			GraphRelationship::new("FTP", "Data Channel", "USES"),
			GraphRelationship::new("FTP", "File Transfer", "PRODUCES"),
			GraphRelationship::new("Control Channel", "Port 21", "USES"),
			GraphRelationship::new("Data Channel", "Port Range 20-21", "USES"),
			GraphRelationship::new("Authentication", "File Transfer", "PART_OF"),
		],
		chunks_processed: 1,
	};
	let model = GraphModel::build(&data);
	let visuals = style::node_visuals(&model);

	let Some(ftp) = model.index_of("FTP") else {
		panic!("FTP missing");
	};
	assert_eq!(model.degree(ftp), 3);
	for (idx, visual) in visuals.iter().enumerate() {
		if idx != ftp {
			assert!(visual.radius < visuals[ftp].radius);
		}
	}
	assert_eq!(style::dominant_relationship(&model, ftp), Some("USES"));
	assert_eq!(visuals[ftp].color, RelationshipKind::Uses.color());
}
