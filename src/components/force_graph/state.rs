use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use crate::types::{GraphData, NodeExtended};

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

pub const NODE_RADIUS: f64 = 5.0;
pub const HIT_RADIUS: f64 = 12.0;

/// Palette entry for a node type; untyped nodes share the first color.
fn type_color(node: &NodeExtended) -> &'static str {
	let Some(node_type) = &node.node_type else {
		return COLORS[0];
	};
	let hash = node_type
		.as_str()
		.bytes()
		.fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
	COLORS[hash % COLORS.len()]
}

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub label: Option<String>,
	pub color: &'static str,
	pub node: NodeExtended,
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub moved: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<DefaultNodeIdx>,
	pub neighbors: HashSet<DefaultNodeIdx>,
	pub highlight_t: f64,
	pub prev_node: Option<DefaultNodeIdx>,
	pub prev_neighbors: HashSet<DefaultNodeIdx>,
	delay_t: f64,
}

/// Store selection mapped onto canvas indices.
#[derive(Clone, Debug, Default)]
pub struct SelectionState {
	pub selected: Option<DefaultNodeIdx>,
	pub relatives: HashSet<DefaultNodeIdx>,
	selected_key: Option<String>,
	relative_keys: HashSet<String>,
}

impl SelectionState {
	fn resolve(&mut self, index: &HashMap<String, DefaultNodeIdx>) {
		self.selected = self
			.selected_key
			.as_ref()
			.and_then(|key| index.get(key).copied());
		self.relatives = self
			.relative_keys
			.iter()
			.filter_map(|key| index.get(key).copied())
			.collect();
	}
}

pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub selection: SelectionState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	pub flow_time: f64,
	edges: Vec<(DefaultNodeIdx, DefaultNodeIdx)>,
	index: HashMap<String, DefaultNodeIdx>,
}

fn new_graph() -> ForceGraph<NodeInfo, ()> {
	ForceGraph::new(SimulationParameters {
		force_charge: 150.0,
		force_spring: 0.05,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	})
}

impl ForceGraphState {
	pub fn new(data: &GraphData, width: f64, height: f64) -> Self {
		let mut state = Self {
			graph: new_graph(),
			edges: Vec::new(),
			index: HashMap::new(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			selection: SelectionState::default(),
			width,
			height,
			animation_running: true,
			flow_time: 0.0,
		};
		state.load(data);
		state
	}

	/// Replace the simulated graph, keeping positions of nodes that survive.
	pub fn load(&mut self, data: &GraphData) {
		let mut previous: HashMap<String, (f32, f32)> = HashMap::new();
		self.graph.visit_nodes(|node| {
			if let Some(key) = node.data.user_data.node.key() {
				previous.insert(key.to_owned(), (node.x(), node.y()));
			}
		});

		self.graph = new_graph();
		self.edges.clear();
		self.index.clear();
		self.hover = HoverState::default();
		self.drag = DragState::default();

		for (i, node) in data.nodes.iter().enumerate() {
			let key = node.key().map(str::to_owned);
			let (x, y) = key
				.as_ref()
				.and_then(|k| previous.get(k).copied())
				.unwrap_or_else(|| {
					let angle = (i as f64) * 2.0 * PI / data.nodes.len() as f64;
					(
						(100.0 * angle.cos()) as f32,
						(100.0 * angle.sin()) as f32,
					)
				});

			let idx = self.graph.add_node(NodeData {
				x,
				y,
				mass: 10.0 + node.weight.unwrap_or(0.0).min(40.0) as f32,
				is_anchor: false,
				user_data: NodeInfo {
					label: node.display_name().map(str::to_owned),
					color: type_color(node),
					node: node.clone(),
				},
			});
			if let Some(key) = key {
				self.index.insert(key, idx);
			}
			// links may name a node by its legacy id
			if let (Some(_), Some(id)) = (&node.ref_id, &node.id) {
				self.index.entry(id.clone()).or_insert(idx);
			}
		}

		for link in &data.links {
			if let (Some(&src), Some(&tgt)) = (self.index.get(&link.source), self.index.get(&link.target)) {
				self.graph.add_edge(src, tgt, EdgeData::default());
				self.edges.push((src, tgt));
			}
		}

		self.selection.resolve(&self.index);
	}

	pub fn set_selection(&mut self, selected: Option<String>, relatives: &[String]) {
		self.selection.selected_key = selected;
		self.selection.relative_keys = relatives.iter().cloned().collect();
		self.selection.resolve(&self.index);
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			// world-space radius, scales with zoom like nodes
			if (dx * dx + dy * dy).sqrt() < HIT_RADIUS {
				found = Some(node.index());
			}
		});
		found
	}

	/// Payload of the node at `idx`, for handing back to the store.
	pub fn node(&self, idx: DefaultNodeIdx) -> Option<NodeExtended> {
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some(node.data.user_data.node.clone());
			}
		});
		found
	}

	/// Returns true when the hovered node changed.
	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) -> bool {
		if self.hover.node == node {
			return false;
		}
		let was_hovering = self.hover.node.is_some();

		// keep the old highlight around while it fades out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for &(src, tgt) in &self.edges {
				if src == idx {
					self.hover.neighbors.insert(tgt);
				} else if tgt == idx {
					self.hover.neighbors.insert(src);
				}
			}
		}
		true
	}

	pub fn is_highlighted(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn is_selected(&self, idx: DefaultNodeIdx) -> bool {
		self.selection.selected == Some(idx)
	}

	pub fn is_relative(&self, idx: DefaultNodeIdx) -> bool {
		self.selection.relatives.contains(&idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.flow_time += dt as f64;

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt as f64).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Pan so the selected node sits in the middle of the canvas.
	pub fn focus_selected(&mut self) {
		let Some(idx) = self.selection.selected else {
			return;
		};
		let mut position = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				position = Some((node.x() as f64, node.y() as f64));
			}
		});
		if let Some((x, y)) = position {
			self.transform.x = self.width / 2.0 - x * self.transform.k;
			self.transform.y = self.height / 2.0 - y * self.transform.k;
		}
	}
}
