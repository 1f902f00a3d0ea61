use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, error};

use crate::components::force_graph::GraphCanvas;
use crate::components::{StoreHandle, use_store_selector};
use crate::store::{ALL_FILTER, BrowserStorage, FetchStatus, persist_graph_style, selectors};
use crate::types::{FetchParams, GraphStyle, NodeExtended};

/// Maximum number of entries listed in the sidebar.
const SIDEBAR_LIMIT: usize = 50;

/// Kick off a fetch in the background; failures are logged, not shown.
fn load(store: StoreHandle, budget: RwSignal<Option<f64>>, params: Option<FetchParams>) {
	let handle = store.get_value();
	spawn_local(async move {
		let progress = move |value: Option<f64>| budget.set(value);
		match handle.fetch_data(&progress, params).await {
			Ok(FetchStatus::Loaded) => {}
			Ok(FetchStatus::AlreadyFetching) => debug!("graph fetch already running"),
			Err(err) => error!("could not load graph: {err}"),
		}
	});
}

fn node_title(node: &NodeExtended) -> String {
	node.display_name()
		.or(node.key())
		.unwrap_or("untitled")
		.to_owned()
}

#[component]
fn NodeDetails(store: StoreHandle) -> impl IntoView {
	let selected = use_store_selector(store, selectors::selected_node);
	let hidden = use_store_selector(store, |s| s.hide_node_details);
	let relatives = use_store_selector(store, |s| s.selected_node_relative_ids.len());

	move || {
		let node = selected.get().filter(|_| !hidden.get())?;
		let title = node_title(&node);
		let node_type = node.node_type.as_ref().map(|t| t.to_string()).unwrap_or_default();
		Some(view! {
			<aside class="node-details">
				<h2>{title}</h2>
				<p class="node-type">{node_type}</p>
				<p>{move || format!("{} related nodes", relatives.get())}</p>
				<button on:click=move |_| store.with_value(|s| s.set_camera_focus_trigger(true))>
					"Focus"
				</button>
				<button on:click=move |_| store.with_value(|s| s.remove_node(&node))>"Remove"</button>
				<button on:click=move |_| store.with_value(|s| s.set_selected_node(None))>"Close"</button>
				<button on:click=move |_| store.with_value(|s| s.set_hide_node_details(true))>"Hide"</button>
			</aside>
		})
	}
}

#[component]
fn Sidebar(store: StoreHandle) -> impl IntoView {
	let filter = use_store_selector(store, |s| s.sidebar_filter.clone());
	let node_types = use_store_selector(store, selectors::node_types);
	let nodes = use_store_selector(store, selectors::filtered_nodes);

	let filter_button = move |value: String| {
		let label = value.clone();
		let active = value.clone();
		view! {
			<button
				class:active=move || filter.get() == active
				on:click=move |_| store.with_value(|s| s.set_sidebar_filter(value.clone()))
			>
				{label}
			</button>
		}
	};

	view! {
		<nav class="sidebar">
			<div class="sidebar-filters">
				{filter_button(ALL_FILTER.to_owned())}
				{move || node_types.get().into_iter().map(filter_button).collect_view()}
			</div>
			<ul class="sidebar-nodes">
				{move || {
					nodes
						.get()
						.into_iter()
						.take(SIDEBAR_LIMIT)
						.map(|node| {
							let title = node_title(&node);
							view! {
								<li on:click=move |_| {
									store.with_value(|s| {
										s.set_hide_node_details(false);
										s.set_selected_node(Some(node.clone()));
									})
								}>{title}</li>
							}
						})
						.collect_view()
				}}
			</ul>
		</nav>
	}
}

/// Explorer page: search, style picker, sidebar, canvas and node details.
#[component]
pub fn Home(store: StoreHandle, preference_key: String) -> impl IntoView {
	let budget = RwSignal::new(None::<f64>);
	let search = RwSignal::new(String::new());
	let fetching = use_store_selector(store, |s| s.is_fetching);
	let style = use_store_selector(store, |s| s.graph_style);
	let node_count = use_store_selector(store, |s| s.data.as_ref().map_or(0, |d| d.nodes.len()));

	load(store, budget, None);

	let on_search = move |ev: leptos::ev::SubmitEvent| {
		ev.prevent_default();
		let word = search.get_untracked();
		let params = (!word.trim().is_empty()).then(|| FetchParams::search(word.trim()));
		load(store, budget, params);
	};

	let on_style = move |ev: leptos::ev::Event| {
		let Ok(next) = event_target_value(&ev).parse::<GraphStyle>() else {
			return;
		};
		store.with_value(|s| s.set_graph_style(next));
		persist_graph_style(&BrowserStorage, &preference_key, next);
		load(store, budget, None);
	};

	view! {
		<div class="fullscreen-graph">
			<GraphCanvas store=store fullscreen=true />
			<div class="graph-overlay">
				<form class="search" on:submit=on_search>
					<input
						type="search"
						placeholder="Search the graph"
						prop:value=move || search.get()
						on:input=move |ev| search.set(event_target_value(&ev))
					/>
				</form>
				<select on:change=on_style>
					{GraphStyle::ALL
						.into_iter()
						.map(|option| {
							view! {
								<option value=option.as_str() prop:selected=move || style.get() == option>
									{option.as_str()}
								</option>
							}
						})
						.collect_view()}
				</select>
				<p class="subtitle">{move || format!("{} nodes", node_count.get())}</p>
				<Show when=move || fetching.get()>
					<p class="loading">
						"Loading graph"
						{move || budget.get().map(|b| format!(" (budget {b})")).unwrap_or_default()}
					</p>
				</Show>
			</div>
			<Sidebar store=store />
			<NodeDetails store=store />
		</div>
	}
}
