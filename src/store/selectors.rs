//! Read-only views derived from [`UiState`], usable directly or as subscription selectors.

use super::state::{ALL_FILTER, UiState};
use crate::types::{GraphData, NodeExtended};

/// The selected node, as stored.
pub fn selected_node(state: &UiState) -> Option<NodeExtended> {
	state.selected_node.clone()
}

/// Whether `node` passes the sidebar `filter`.
pub fn node_matches_filter(node: &NodeExtended, filter: &str) -> bool {
	filter == ALL_FILTER || node.node_type.as_ref().is_some_and(|t| t.as_str() == filter)
}

/// Loaded nodes passing the sidebar filter, in load order.
pub fn filtered_nodes(state: &UiState) -> Vec<NodeExtended> {
	state
		.data
		.as_ref()
		.map(|data| {
			data.nodes
				.iter()
				.filter(|node| node_matches_filter(node, &state.sidebar_filter))
				.cloned()
				.collect()
		})
		.unwrap_or_default()
}

/// The loaded graph restricted to the sidebar filter, for rendering.
pub fn filtered_graph(state: &UiState) -> GraphData {
	GraphData {
		nodes: filtered_nodes(state),
		links: state
			.data
			.as_ref()
			.map(|data| data.links.clone())
			.unwrap_or_default(),
	}
}

/// Distinct node types present in the loaded graph, in first-seen order.
pub fn node_types(state: &UiState) -> Vec<String> {
	let mut types: Vec<String> = Vec::new();
	for node_type in state
		.data
		.iter()
		.flat_map(|data| data.nodes.iter())
		.filter_map(|node| node.node_type.as_ref())
	{
		if !types.iter().any(|t| t == node_type.as_str()) {
			types.push(node_type.as_str().to_owned());
		}
	}
	types
}
