use crate::types::{GraphData, GraphStyle, NodeExtended, NodeType, Source, Stats, Trending};

/// Sidebar filter value that lets every node through.
pub const ALL_FILTER: &str = "all";

/// Everything the explorer UI reads from the store.
///
/// Only the store mutates this; consumers get shared borrows or clones.
#[derive(Clone, Debug, PartialEq)]
pub struct UiState {
	/// Currently loaded graph, `None` before the first load.
	pub data: Option<GraphData>,
	/// Secondary graph for the selection view.
	pub selection_graph_data: GraphData,
	/// Rendering mode; seeded from the saved preference.
	pub graph_style: GraphStyle,
	/// Node type the graph is limited to.
	pub category_filter: Option<NodeType>,
	/// `"all"` or a node type name.
	pub sidebar_filter: String,
	/// Node under the pointer.
	pub hovered_node: Option<NodeExtended>,
	/// Node the user picked; identity is its `ref_id`.
	pub selected_node: Option<NodeExtended>,
	/// Episode position picked in the player.
	pub selected_timestamp: Option<NodeExtended>,
	/// `ref_id`s of loaded nodes related to `selected_node`.
	pub selected_node_relative_ids: Vec<String>,
	/// Ids reported by the proximity detector.
	pub nearby_node_ids: Vec<String>,
	/// Approved content sources.
	pub sources: Option<Vec<Source>>,
	/// Sources awaiting approval.
	pub queued_sources: Option<Vec<Source>>,
	/// Wheel events do not zoom the canvas.
	pub scroll_events_disabled: bool,
	/// Camera idle rotation is frozen.
	pub disable_camera_rotation: bool,
	/// Set while a fetch is in flight.
	pub is_fetching: bool,
	/// Loading modal is shown.
	pub sphinx_modal_is_open: bool,
	/// A camera move to the selection is pending.
	pub camera_focus_trigger: bool,
	/// Selection graph is shown instead of the full graph.
	pub show_selection_graph: bool,
	/// Teach-me panel is open.
	pub show_teach_me: bool,
	/// Node details panel is collapsed.
	pub hide_node_details: bool,
	/// Layout radius; depends on the deployment.
	pub graph_radius: Option<f64>,
	/// Trending searches.
	pub trending_topics: Vec<Trending>,
	/// Aggregate counts, once loaded.
	pub stats: Option<Stats>,
}

impl UiState {
	/// Initial state for a fresh store.
	pub fn new(graph_style: GraphStyle, graph_radius: f64) -> Self {
		Self {
			data: None,
			selection_graph_data: GraphData::default(),
			graph_style,
			category_filter: None,
			sidebar_filter: ALL_FILTER.to_owned(),
			hovered_node: None,
			selected_node: None,
			selected_timestamp: None,
			selected_node_relative_ids: Vec::new(),
			nearby_node_ids: Vec::new(),
			sources: None,
			queued_sources: None,
			scroll_events_disabled: false,
			disable_camera_rotation: false,
			is_fetching: false,
			sphinx_modal_is_open: false,
			camera_focus_trigger: false,
			show_selection_graph: false,
			show_teach_me: false,
			hide_node_details: false,
			graph_radius: Some(graph_radius),
			trending_topics: Vec::new(),
			stats: None,
		}
	}

	/// Apply the post-fetch reset and install freshly loaded data.
	pub(crate) fn finish_fetch(&mut self, data: GraphData) {
		self.data = Some(data);
		self.is_fetching = false;
		self.sphinx_modal_is_open = false;
		self.disable_camera_rotation = false;
		self.nearby_node_ids.clear();
		self.selected_node_relative_ids.clear();
		self.show_selection_graph = false;
		self.show_teach_me = false;
	}
}
