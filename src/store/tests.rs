use std::cell::{Cell, RefCell};
use std::pin::pin;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::executor::block_on;
use futures::poll;
use rstest::rstest;

use super::*;
use crate::config::{DeploymentVariant, GRAPH_STYLE_KEY};
use crate::error::FetchError;
use crate::types::GraphLink;

fn node(ref_id: &str) -> NodeExtended {
	NodeExtended {
		ref_id: Some(ref_id.into()),
		..NodeExtended::default()
	}
}

fn parent(ref_id: &str, children: &[&str]) -> NodeExtended {
	NodeExtended {
		children: children.iter().map(|c| c.to_string()).collect(),
		..node(ref_id)
	}
}

fn graph(nodes: Vec<NodeExtended>) -> GraphData {
	GraphData {
		nodes,
		links: vec![GraphLink {
			source: "a".into(),
			target: "b".into(),
			edge_type: None,
		}],
	}
}

#[derive(Default)]
struct FakeFetcher {
	calls: Cell<usize>,
	styles: RefCell<Vec<GraphStyle>>,
	gate: RefCell<Option<oneshot::Receiver<GraphData>>>,
	response: RefCell<Option<GraphData>>,
}

impl FakeFetcher {
	fn returning(data: GraphData) -> Rc<Self> {
		let fetcher = Self::default();
		*fetcher.response.borrow_mut() = Some(data);
		Rc::new(fetcher)
	}

	fn gated() -> (Rc<Self>, oneshot::Sender<GraphData>) {
		let (tx, rx) = oneshot::channel();
		let fetcher = Self::default();
		*fetcher.gate.borrow_mut() = Some(rx);
		(Rc::new(fetcher), tx)
	}

	fn failing() -> Rc<Self> {
		Rc::new(Self::default())
	}
}

#[async_trait(?Send)]
impl GraphDataFetcher for FakeFetcher {
	async fn fetch(
		&self,
		style: GraphStyle,
		progress: &dyn Fn(Option<f64>),
		_params: &FetchParams,
	) -> FetchResult<GraphData> {
		self.calls.set(self.calls.get() + 1);
		self.styles.borrow_mut().push(style);
		progress(Some(42.0));
		let gate = self.gate.borrow_mut().take();
		if let Some(rx) = gate {
			return rx.await.map_err(|_| FetchError::Cancelled);
		}
		self.response.borrow().clone().ok_or(FetchError::Cancelled)
	}
}

#[derive(Default)]
struct CountingRecorder {
	calls: Cell<usize>,
}

#[async_trait(?Send)]
impl SearchTermRecorder for CountingRecorder {
	async fn record(&self) -> FetchResult<()> {
		self.calls.set(self.calls.get() + 1);
		Ok(())
	}
}

fn store_with(fetcher: Rc<FakeFetcher>, recorder: Rc<CountingRecorder>) -> GraphStore {
	GraphStore::builder(fetcher).recorder(recorder).build()
}

fn loaded_store(nodes: Vec<NodeExtended>) -> GraphStore {
	let store = GraphStore::builder(FakeFetcher::failing()).build();
	store.set_data(Some(graph(nodes)));
	store
}

fn no_progress(_: Option<f64>) {}

/// Counts callback invocations for one selector.
fn count_notifications<T, S>(store: &GraphStore, selector: S) -> (Rc<Cell<usize>>, Subscription)
where
	T: Clone + PartialEq + 'static,
	S: Fn(&UiState) -> T + 'static,
{
	let count = Rc::new(Cell::new(0));
	let seen = Rc::clone(&count);
	let subscription = store.subscribe(selector, move |_: &T| seen.set(seen.get() + 1));
	(count, subscription)
}

#[test]
fn defaults_follow_config_and_preferences() {
	let store = GraphStore::builder(FakeFetcher::failing())
		.config(StoreConfig {
			variant: DeploymentVariant::Chile,
			..StoreConfig::default()
		})
		.preferences(Rc::new(MemoryPreferences::with(GRAPH_STYLE_KEY, "force")))
		.build();
	let state = store.snapshot();
	assert_eq!(state.graph_style, GraphStyle::Force);
	assert_eq!(state.graph_radius, Some(1600.0));
	assert_eq!(state.sidebar_filter, ALL_FILTER);
	assert!(state.data.is_none());
	assert!(state.selection_graph_data.is_empty());
	assert!(!state.is_fetching);
}

#[test]
fn second_fetch_while_pending_is_rejected() {
	let (fetcher, release) = FakeFetcher::gated();
	let store = store_with(fetcher.clone(), Rc::default());

	block_on(async {
		let mut first = pin!(store.fetch_data(&no_progress, None));
		assert!(poll!(first.as_mut()).is_pending());
		assert!(store.read(|s| s.is_fetching && s.sphinx_modal_is_open));

		let second = store.fetch_data(&no_progress, None).await.unwrap();
		assert_eq!(second, FetchStatus::AlreadyFetching);
		assert_eq!(fetcher.calls.get(), 1);

		release.send(graph(vec![node("a")])).unwrap();
		assert_eq!(first.await.unwrap(), FetchStatus::Loaded);
	});

	assert_eq!(fetcher.calls.get(), 1);
	assert!(!store.read(|s| s.is_fetching || s.sphinx_modal_is_open));
	assert_eq!(store.read(|s| s.data.as_ref().map(|d| d.nodes.len())), Some(1));
}

#[rstest]
#[case(None, 0)]
#[case(Some(FetchParams::default()), 0)]
#[case(Some(FetchParams::search("")), 0)]
#[case(Some(FetchParams::search("bitcoin")), 1)]
fn search_is_recorded_only_with_a_word(#[case] params: Option<FetchParams>, #[case] recorded: usize) {
	let recorder = Rc::new(CountingRecorder::default());
	let store = store_with(FakeFetcher::returning(graph(Vec::new())), recorder.clone());

	let status = block_on(store.fetch_data(&no_progress, params)).unwrap();

	assert_eq!(status, FetchStatus::Loaded);
	assert_eq!(recorder.calls.get(), recorded);
}

#[test]
fn fetch_uses_current_style_and_reports_progress() {
	let fetcher = FakeFetcher::returning(graph(Vec::new()));
	let store = store_with(fetcher.clone(), Rc::default());
	store.set_graph_style(GraphStyle::Earth);
	let budget = Cell::new(None);

	block_on(store.fetch_data(&|value: Option<f64>| budget.set(value), None)).unwrap();

	assert_eq!(*fetcher.styles.borrow(), [GraphStyle::Earth]);
	assert_eq!(budget.get(), Some(42.0));
}

#[test]
fn completed_fetch_resets_transient_state() {
	let store = store_with(FakeFetcher::returning(graph(vec![node("n")])), Rc::default());
	store.set_data(Some(graph(vec![parent("p", &["c"]), node("c")])));
	store.set_selected_node(Some(parent("p", &["c"])));
	store.set_nearby_node_ids(vec!["c".into()]);
	store.set_show_selection_graph(true);
	store.set_teach_me(true);

	block_on(store.fetch_data(&no_progress, None)).unwrap();

	let state = store.snapshot();
	assert!(!state.disable_camera_rotation);
	assert!(state.nearby_node_ids.is_empty());
	assert!(state.selected_node_relative_ids.is_empty());
	assert!(!state.show_selection_graph);
	assert!(!state.show_teach_me);
	assert_eq!(state.data, Some(graph(vec![node("n")])));
	// Selection itself survives a reload.
	assert_eq!(state.selected_node.and_then(|n| n.ref_id).as_deref(), Some("p"));
}

#[test]
fn failed_fetch_propagates_and_leaves_guard_set() {
	let fetcher = FakeFetcher::failing();
	let store = store_with(fetcher.clone(), Rc::default());

	let result = block_on(store.fetch_data(&no_progress, None));

	assert!(matches!(result, Err(FetchError::Cancelled)));
	assert!(store.read(|s| s.is_fetching && s.sphinx_modal_is_open));
	assert_eq!(
		block_on(store.fetch_data(&no_progress, None)).unwrap(),
		FetchStatus::AlreadyFetching
	);
	assert_eq!(fetcher.calls.get(), 1);

	store.set_is_fetching(false);
	assert!(block_on(store.fetch_data(&no_progress, None)).is_err());
	assert_eq!(fetcher.calls.get(), 2);
}

#[test]
fn reselecting_same_identity_is_a_no_op() {
	let store = loaded_store(vec![parent("p", &["c"]), node("c"), node("x")]);
	store.set_selected_node(Some(parent("p", &["c"])));
	store.set_disable_camera_rotation(false);
	store.set_hovered_node(Some(node("x")));
	let (notified, _subscription) = count_notifications(&store, UiState::clone);

	let mut renamed = parent("p", &[]);
	renamed.name = Some("same node, new payload".into());
	store.set_selected_node(Some(renamed));

	let state = store.snapshot();
	assert!(!state.disable_camera_rotation);
	assert_eq!(state.selected_node_relative_ids, ["c"]);
	assert_eq!(state.hovered_node, Some(node("x")));
	assert_eq!(notified.get(), 0);
}

#[test]
fn selecting_new_identity_recomputes_relatives() {
	let store = loaded_store(vec![
		parent("p", &["c1", "c2"]),
		node("c1"),
		node("c2"),
		parent("up", &["q"]),
		node("q"),
		NodeExtended::default(),
	]);
	store.set_hovered_node(Some(node("q")));

	store.set_selected_node(Some(parent("p", &["c1", "c2"])));
	let state = store.snapshot();
	assert!(state.disable_camera_rotation);
	assert_eq!(state.hovered_node, None);
	assert_eq!(state.selected_node_relative_ids, ["c1", "c2"]);

	store.set_selected_node(Some(node("q")));
	assert_eq!(store.read(|s| s.selected_node_relative_ids.clone()), ["up"]);

	store.set_selected_node(None);
	let state = store.snapshot();
	assert_eq!(state.selected_node, None);
	assert!(state.selected_node_relative_ids.is_empty());
}

#[test]
fn custom_relative_predicate_is_used() {
	let store = GraphStore::builder(FakeFetcher::failing())
		.relatives(|candidate: &NodeExtended, selected: &NodeExtended| {
			candidate.ref_id != selected.ref_id
		})
		.build();
	store.set_data(Some(graph(vec![node("a"), node("b"), node("c")])));

	store.set_selected_node(Some(node("b")));

	assert_eq!(store.read(|s| s.selected_node_relative_ids.clone()), ["a", "c"]);
}

#[test]
fn relative_predicate_may_read_the_store() {
	let holder: Rc<RefCell<Option<GraphStore>>> = Rc::default();
	let lookup = Rc::clone(&holder);
	let store = GraphStore::builder(FakeFetcher::failing())
		.relatives(move |candidate: &NodeExtended, selected: &NodeExtended| {
			let idle = lookup
				.borrow()
				.as_ref()
				.is_some_and(|store| !store.read(|s| s.is_fetching));
			idle && nodes_are_relatives(candidate, selected)
		})
		.build();
	*holder.borrow_mut() = Some(store.clone());
	store.set_data(Some(graph(vec![parent("a", &["b"]), node("b"), node("c")])));

	store.set_selected_node(Some(parent("a", &["b"])));

	assert_eq!(store.read(|s| s.selected_node_relative_ids.clone()), ["b"]);
	holder.borrow_mut().take();
}

#[test]
fn selecting_without_data_yields_no_relatives() {
	let store = GraphStore::builder(FakeFetcher::failing()).build();
	store.set_selected_node(Some(node("a")));
	assert!(store.read(|s| s.selected_node_relative_ids.is_empty() && s.disable_camera_rotation));
}

#[rstest]
#[case(&["a", "b"], false)]
#[case(&["a", "z"], false)]
#[case(&["c"], true)]
#[case(&["a", "c", "d"], true)]
#[case(&["b", "a"], true)]
#[case(&[], true)]
fn nearby_ids_update_only_when_they_look_different(#[case] next: &[&str], #[case] updated: bool) {
	let store = GraphStore::builder(FakeFetcher::failing()).build();
	store.set_nearby_node_ids(vec!["a".into(), "b".into()]);
	let (notified, _subscription) = count_notifications(&store, |s: &UiState| s.nearby_node_ids.clone());

	let next: Vec<String> = next.iter().map(|id| id.to_string()).collect();
	store.set_nearby_node_ids(next.clone());

	let stored = store.read(|s| s.nearby_node_ids.clone());
	if updated {
		assert_eq!(stored, next);
		assert_eq!(notified.get(), 1);
	} else {
		assert_eq!(stored, ["a", "b"]);
		assert_eq!(notified.get(), 0);
	}
}

#[test]
fn add_new_node_prepends_and_keeps_links() {
	let store = GraphStore::builder(FakeFetcher::failing()).build();
	store.set_data(Some(GraphData::default()));
	store.add_new_node(node("n"));
	assert_eq!(
		store.read(|s| s.data.clone()),
		Some(GraphData {
			nodes: vec![node("n")],
			links: Vec::new(),
		})
	);

	let store = loaded_store(vec![node("old")]);
	store.add_new_node(node("new"));
	let data = store.read(|s| s.data.clone()).unwrap();
	assert_eq!(data.nodes, [node("new"), node("old")]);
	assert_eq!(data.links, graph(Vec::new()).links);
}

#[test]
fn add_and_remove_without_data_do_nothing() {
	let store = GraphStore::builder(FakeFetcher::failing()).build();
	let (notified, _subscription) = count_notifications(&store, |s: &UiState| s.data.clone());

	store.add_new_node(node("n"));
	store.remove_node(&node("n"));

	assert!(store.read(|s| s.data.is_none()));
	assert_eq!(notified.get(), 0);
}

#[test]
fn remove_node_matches_either_identifier() {
	let by_id = NodeExtended {
		id: Some("x".into()),
		..NodeExtended::default()
	};
	let legacy = NodeExtended {
		id: Some("legacy".into()),
		ref_id: Some("y".into()),
		..NodeExtended::default()
	};
	let anonymous = NodeExtended::default();
	let store = loaded_store(vec![node("x"), by_id, node("keep"), legacy.clone(), anonymous.clone()]);

	store.remove_node(&node("x"));
	assert_eq!(
		store.read(|s| s.data.clone()).unwrap().nodes,
		[node("keep"), legacy, anonymous.clone()]
	);

	let by_legacy_id = NodeExtended {
		ref_id: Some("legacy".into()),
		..NodeExtended::default()
	};
	store.remove_node(&by_legacy_id);
	let data = store.read(|s| s.data.clone()).unwrap();
	assert_eq!(data.nodes, [node("keep"), anonymous]);
	assert_eq!(data.links.len(), 1);
}

#[test]
fn remove_node_without_match_keeps_everything() {
	let store = loaded_store(vec![node("a"), node("b")]);
	store.remove_node(&node("zzz"));
	store.remove_node(&NodeExtended::default());
	assert_eq!(store.read(|s| s.data.clone()).unwrap().nodes, [node("a"), node("b")]);
}

#[test]
fn derived_views_follow_state() {
	let mut person = node("p1");
	person.node_type = Some(NodeType::from("person"));
	let store = loaded_store(vec![node("e1"), person.clone()]);

	assert_eq!(store.filtered_nodes().len(), 2);
	store.set_sidebar_filter("person".into());
	assert_eq!(store.filtered_nodes(), [person.clone()]);

	assert_eq!(store.selected_node(), None);
	store.set_selected_node(Some(person.clone()));
	assert_eq!(store.selected_node(), Some(person));
}

#[test]
fn subscribers_fire_only_on_selected_change() {
	let store = GraphStore::builder(FakeFetcher::failing()).build();
	let values = Rc::new(RefCell::new(Vec::new()));
	let sink = Rc::clone(&values);
	let _subscription = store.subscribe(
		|s: &UiState| s.sidebar_filter.clone(),
		move |filter: &String| sink.borrow_mut().push(filter.clone()),
	);

	store.set_teach_me(true);
	store.set_sidebar_filter("person".into());
	store.set_sidebar_filter("person".into());
	store.set_sidebar_filter(ALL_FILTER.into());

	assert_eq!(*values.borrow(), ["person", "all"]);
}

#[test]
fn dropping_subscription_unsubscribes() {
	let store = GraphStore::builder(FakeFetcher::failing()).build();
	let (notified, subscription) = count_notifications(&store, |s: &UiState| s.show_teach_me);
	assert_eq!(store.subscriber_count(), 1);

	store.set_teach_me(true);
	drop(subscription);
	store.set_teach_me(false);

	assert_eq!(notified.get(), 1);
	assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn callbacks_may_mutate_the_store() {
	let store = loaded_store(vec![node("a")]);
	let handle = store.clone();
	let _subscription = store.subscribe(selectors::selected_node, move |selected: &Option<NodeExtended>| {
		if selected.is_some() {
			handle.set_hide_node_details(false);
			handle.set_camera_focus_trigger(true);
		}
	});

	store.set_hide_node_details(true);
	store.set_selected_node(Some(node("a")));

	assert!(store.read(|s| !s.hide_node_details && s.camera_focus_trigger));
}

#[test]
fn later_subscribers_end_on_the_value_written_by_earlier_callbacks() {
	let store = GraphStore::builder(FakeFetcher::failing()).build();
	let handle = store.clone();
	let _writer = store.subscribe(
		|s: &UiState| s.show_teach_me,
		move |shown: &bool| {
			if *shown {
				handle.set_sidebar_filter("person".to_owned());
			}
		},
	);
	let seen: Rc<RefCell<Vec<(bool, String)>>> = Rc::default();
	let log = Rc::clone(&seen);
	let _reader = store.subscribe(
		|s: &UiState| (s.show_teach_me, s.sidebar_filter.clone()),
		move |value: &(bool, String)| log.borrow_mut().push(value.clone()),
	);

	store.set_teach_me(true);

	assert_eq!(*seen.borrow(), [(true, "person".to_owned())]);
	assert_eq!(store.read(|s| s.sidebar_filter.clone()), "person");
}

#[test]
fn subscription_dropped_by_a_selector_is_removed_after_the_walk() {
	let store = GraphStore::builder(FakeFetcher::failing()).build();
	let (dropped_calls, dropped) = count_notifications(&store, |s: &UiState| s.sidebar_filter.clone());
	let held = Rc::new(RefCell::new(Some(dropped)));
	let release = Rc::clone(&held);
	let _dropper = store.subscribe(
		move |s: &UiState| {
			if s.sidebar_filter == "drop" {
				release.borrow_mut().take();
			}
			s.sidebar_filter.clone()
		},
		|_: &String| {},
	);
	assert_eq!(store.subscriber_count(), 2);

	store.set_sidebar_filter("drop".to_owned());

	assert!(held.borrow().is_none());
	assert_eq!(store.subscriber_count(), 1);
	assert_eq!(dropped_calls.get(), 0);
}

#[test]
fn plain_setters_replace_single_fields() {
	let store = GraphStore::builder(FakeFetcher::failing()).build();
	store.set_graph_radius(None);
	store.set_category_filter(Some(NodeType::from("topic")));
	store.set_trending_topics(vec![Trending {
		topic: "rust".into(),
		count: 3,
	}]);
	store.set_stats(Some(Stats {
		num_nodes: 10,
		..Stats::default()
	}));
	store.set_sources(Some(Vec::new()));
	store.set_queued_sources(None);
	store.set_scroll_events_disabled(true);
	store.set_sphinx_modal_open(true);
	store.set_selection_data(graph(vec![node("s")]));
	store.set_selected_timestamp(Some(node("t")));

	let state = store.snapshot();
	assert_eq!(state.graph_radius, None);
	assert_eq!(state.category_filter, Some(NodeType::from("topic")));
	assert_eq!(state.trending_topics.len(), 1);
	assert_eq!(state.stats.map(|s| s.num_nodes), Some(10));
	assert_eq!(state.sources, Some(Vec::new()));
	assert!(state.scroll_events_disabled && state.sphinx_modal_is_open);
	assert_eq!(state.selection_graph_data.nodes, [node("s")]);
	assert_eq!(state.selected_timestamp, Some(node("t")));
	// Plain setters never touch the fetch guard.
	assert!(!state.is_fetching);
}
