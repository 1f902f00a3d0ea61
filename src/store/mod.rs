//! The explorer's single observable UI state store.
//!
//! [`GraphStore`] is a cheap, clonable handle over one [`UiState`]. All
//! mutation goes through its methods; each method replaces the affected
//! fields in one step and then notifies subscribers whose selected value
//! changed. Everything runs on one thread, so the only coordination needed is
//! the `is_fetching` guard around [`GraphStore::fetch_data`].

mod collaborators;
mod preferences;
pub mod selectors;
mod state;
mod subscribe;

#[cfg(test)]
mod tests;

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};

pub use collaborators::{
	GraphDataFetcher, NoopRecorder, RelativePredicate, SearchTermRecorder, nodes_are_relatives,
};
pub use preferences::{
	BrowserStorage, MemoryPreferences, PreferenceStore, load_graph_style, persist_graph_style,
};
pub use state::{ALL_FILTER, UiState};
pub use subscribe::Subscription;

use crate::config::StoreConfig;
use crate::error::FetchResult;
use crate::types::{FetchParams, GraphData, GraphStyle, NodeExtended, NodeType, Source, Stats, Trending};
use subscribe::Subscribers;

/// How a [`GraphStore::fetch_data`] call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchStatus {
	/// New data was installed.
	Loaded,
	/// Another fetch was in flight; nothing was requested.
	AlreadyFetching,
}

struct Inner {
	state: RefCell<UiState>,
	subscribers: Rc<Subscribers>,
	fetcher: Rc<dyn GraphDataFetcher>,
	recorder: Rc<dyn SearchTermRecorder>,
	relatives: Box<dyn RelativePredicate>,
}

/// Handle to the explorer UI state. Clones share the same state.
#[derive(Clone)]
pub struct GraphStore {
	inner: Rc<Inner>,
}

/// Assembles a [`GraphStore`] from its collaborators.
pub struct StoreBuilder {
	config: StoreConfig,
	fetcher: Rc<dyn GraphDataFetcher>,
	recorder: Rc<dyn SearchTermRecorder>,
	relatives: Box<dyn RelativePredicate>,
	preferences: Rc<dyn PreferenceStore>,
}

impl StoreBuilder {
	/// Deployment settings; defaults to [`StoreConfig::default`].
	pub fn config(mut self, config: StoreConfig) -> Self {
		self.config = config;
		self
	}

	/// Where searches are recorded; defaults to [`NoopRecorder`].
	pub fn recorder(mut self, recorder: Rc<dyn SearchTermRecorder>) -> Self {
		self.recorder = recorder;
		self
	}

	/// Replace [`nodes_are_relatives`] as the relativeness test.
	pub fn relatives(mut self, relatives: impl RelativePredicate + 'static) -> Self {
		self.relatives = Box::new(relatives);
		self
	}

	/// Where the initial graph style is read from.
	pub fn preferences(mut self, preferences: Rc<dyn PreferenceStore>) -> Self {
		self.preferences = preferences;
		self
	}

	/// Read the stored style preference and create the store.
	pub fn build(self) -> GraphStore {
		let style = load_graph_style(self.preferences.as_ref(), &self.config.preference_key);
		let state = UiState::new(style, self.config.default_graph_radius());
		debug!("graph store created with style {style} ({:?})", self.config.variant);
		GraphStore {
			inner: Rc::new(Inner {
				state: RefCell::new(state),
				subscribers: Rc::default(),
				fetcher: self.fetcher,
				recorder: self.recorder,
				relatives: self.relatives,
			}),
		}
	}
}

/// Defines unconditional single-field setters.
macro_rules! setters {
	($($(#[$meta:meta])* $name:ident($field:ident: $ty:ty);)*) => {
		$(
			$(#[$meta])*
			pub fn $name(&self, value: $ty) {
				self.update(|state| state.$field = value);
			}
		)*
	};
}

impl GraphStore {
	/// Start building a store around `fetcher`.
	pub fn builder(fetcher: Rc<dyn GraphDataFetcher>) -> StoreBuilder {
		StoreBuilder {
			config: StoreConfig::default(),
			fetcher,
			recorder: Rc::new(NoopRecorder),
			relatives: Box::new(nodes_are_relatives),
			preferences: Rc::new(MemoryPreferences::default()),
		}
	}

	/// Run `f` against the current state.
	pub fn read<T>(&self, f: impl FnOnce(&UiState) -> T) -> T {
		f(&self.inner.state.borrow())
	}

	/// Clone of the whole current state.
	pub fn snapshot(&self) -> UiState {
		self.read(UiState::clone)
	}

	/// Call `callback` with the selector's new value whenever it changes.
	///
	/// The selector is evaluated once immediately to seed the comparison; the
	/// callback is not called for that initial value.
	pub fn subscribe<T, S, C>(&self, selector: S, callback: C) -> Subscription
	where
		T: Clone + PartialEq + 'static,
		S: Fn(&UiState) -> T + 'static,
		C: Fn(&T) + 'static,
	{
		let id = {
			let state = self.inner.state.borrow();
			self.inner.subscribers.insert(&state, selector, callback)
		};
		Subscription::new(id, &self.inner.subscribers)
	}

	#[cfg(test)]
	pub(crate) fn subscriber_count(&self) -> usize {
		self.inner.subscribers.len()
	}

	fn update(&self, f: impl FnOnce(&mut UiState)) {
		f(&mut self.inner.state.borrow_mut());
		self.notify();
	}

	fn notify(&self) {
		let pending = {
			let state = self.inner.state.borrow();
			self.inner.subscribers.collect(&state)
		};
		for notification in pending {
			notification();
		}
	}

	/// Load graph data for the current style.
	///
	/// Returns [`FetchStatus::AlreadyFetching`] without calling the fetcher
	/// when another fetch is in flight. When `params` carries a search word
	/// the search is recorded after the fetch. Errors from either
	/// collaborator are returned as-is and leave `is_fetching` and
	/// `sphinx_modal_is_open` set.
	pub async fn fetch_data(
		&self,
		progress: &dyn Fn(Option<f64>),
		params: Option<FetchParams>,
	) -> FetchResult<FetchStatus> {
		let style = {
			let mut state = self.inner.state.borrow_mut();
			if state.is_fetching {
				debug!("fetch requested while another is in flight; ignoring");
				return Ok(FetchStatus::AlreadyFetching);
			}
			state.is_fetching = true;
			state.sphinx_modal_is_open = true;
			state.graph_style
		};
		self.notify();

		let params = params.unwrap_or_default();
		info!("fetching {style} graph");
		let data = self
			.inner
			.fetcher
			.fetch(style, progress, &params)
			.await
			.inspect_err(|err| warn!("graph fetch failed: {err}"))?;

		if let Some(word) = params.word() {
			debug!("recording search for {word:?}");
			self.inner
				.recorder
				.record()
				.await
				.inspect_err(|err| warn!("recording search failed: {err}"))?;
		}

		info!("loaded {} nodes, {} links", data.nodes.len(), data.links.len());
		self.update(|state| state.finish_fetch(data));
		Ok(FetchStatus::Loaded)
	}

	/// Select `node`, or clear the selection with `None`.
	///
	/// Selecting the node that is already selected (same `ref_id`) does
	/// nothing. Otherwise the hover is cleared, camera rotation is locked and
	/// the relative ids are recomputed from the loaded graph.
	pub fn set_selected_node(&self, node: Option<NodeExtended>) {
		let unchanged = self.read(|state| {
			ref_id(state.selected_node.as_ref()) == ref_id(node.as_ref())
		});
		if unchanged {
			return;
		}

		let relative_ids: Vec<String> = self.read(|state| match (&state.data, &node) {
			(Some(data), Some(selected)) => data
				.nodes
				.iter()
				.filter(|candidate| self.inner.relatives.is_relative(candidate, selected))
				.filter_map(|candidate| candidate.ref_id.clone())
				.collect(),
			_ => Vec::new(),
		});
		self.update(|state| {
			state.hovered_node = None;
			state.selected_node = node;
			state.disable_camera_rotation = true;
			state.selected_node_relative_ids = relative_ids;
		});
	}

	/// Store the proximity detector's ids unless they look like the current ones.
	///
	/// Lists are considered equal when they have the same length and the same
	/// first element.
	pub fn set_nearby_node_ids(&self, ids: Vec<String>) {
		let unchanged = self.read(|state| {
			state.nearby_node_ids.len() == ids.len() && state.nearby_node_ids.first() == ids.first()
		});
		if !unchanged {
			self.update(|state| state.nearby_node_ids = ids);
		}
	}

	/// Put `node` at the front of the loaded node list. No-op without data.
	pub fn add_new_node(&self, node: NodeExtended) {
		self.replace_nodes(|nodes| {
			let mut next = Vec::with_capacity(nodes.len() + 1);
			next.push(node);
			next.extend(nodes.iter().cloned());
			next
		});
	}

	/// Drop every loaded node sharing an `id` or `ref_id` with `node`. No-op without data.
	pub fn remove_node(&self, node: &NodeExtended) {
		self.replace_nodes(|nodes| {
			nodes
				.iter()
				.filter(|candidate| !shares_identity(candidate, node))
				.cloned()
				.collect()
		});
	}

	fn replace_nodes(&self, f: impl FnOnce(&[NodeExtended]) -> Vec<NodeExtended>) {
		self.update(|state| {
			if let Some(data) = state.data.take() {
				state.data = Some(GraphData {
					nodes: f(&data.nodes),
					links: data.links,
				});
			}
		});
	}

	/// The selected node, as stored.
	pub fn selected_node(&self) -> Option<NodeExtended> {
		self.read(selectors::selected_node)
	}

	/// Loaded nodes passing the sidebar filter.
	pub fn filtered_nodes(&self) -> Vec<NodeExtended> {
		self.read(selectors::filtered_nodes)
	}

	setters! {
		/// Replace the loaded graph.
		set_data(data: Option<GraphData>);
		/// Replace the graph shown in selection mode.
		set_selection_data(selection_graph_data: GraphData);
		/// Change the rendering mode. Persisting it is up to the caller.
		set_graph_style(graph_style: GraphStyle);
		/// Limit the graph to one node type, or `None` for all.
		set_category_filter(category_filter: Option<NodeType>);
		/// `"all"` or a node type name.
		set_sidebar_filter(sidebar_filter: String);
		/// Replace the aggregate counts.
		set_stats(stats: Option<Stats>);
		/// Replace the trending search list.
		set_trending_topics(trending_topics: Vec<Trending>);
		/// Replace the approved sources.
		set_sources(sources: Option<Vec<Source>>);
		/// Replace the sources awaiting approval.
		set_queued_sources(queued_sources: Option<Vec<Source>>);
		/// Node under the pointer, or `None`.
		set_hovered_node(hovered_node: Option<NodeExtended>);
		/// Episode position picked in the player.
		set_selected_timestamp(selected_timestamp: Option<NodeExtended>);
		/// Show or hide the loading modal.
		set_sphinx_modal_open(sphinx_modal_is_open: bool);
		/// Request, or acknowledge, a camera move to the selection.
		set_camera_focus_trigger(camera_focus_trigger: bool);
		/// Overrides the fetch guard directly.
		set_is_fetching(is_fetching: bool);
		/// Switch between the full graph and the selection graph.
		set_show_selection_graph(show_selection_graph: bool);
		/// Collapse the node details panel.
		set_hide_node_details(hide_node_details: bool);
		/// Toggle the teach-me panel.
		set_teach_me(show_teach_me: bool);
		/// Stop wheel events from zooming the canvas.
		set_scroll_events_disabled(scroll_events_disabled: bool);
		/// Freeze the camera's idle rotation.
		set_disable_camera_rotation(disable_camera_rotation: bool);
		/// Layout radius; `None` lets the renderer pick.
		set_graph_radius(graph_radius: Option<f64>);
	}
}

fn ref_id(node: Option<&NodeExtended>) -> Option<&str> {
	node.and_then(|n| n.ref_id.as_deref())
}

/// Four-way match: either identifier of `a` against either identifier of `b`.
fn shares_identity(a: &NodeExtended, b: &NodeExtended) -> bool {
	let ids = |n: &NodeExtended| [n.ref_id.clone(), n.id.clone()].into_iter().flatten();
	ids(a).any(|left| ids(b).any(|right| left == right))
}
