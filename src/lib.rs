//! Leptos client-side graph explorer: the UI state store and the app wiring around it.

use std::rc::Rc;

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

// Modules
mod components;
pub mod config;
pub mod error;
pub mod network;
mod pages;
pub mod store;
pub mod types;

// Top-Level pages
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

use crate::config::StoreConfig;
use crate::network::{HttpGraphFetcher, HttpSearchRecorder};
use crate::store::{BrowserStorage, GraphStore};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Wire the store to the HTTP collaborators and browser storage.
pub fn build_store(config: &StoreConfig) -> GraphStore {
	GraphStore::builder(Rc::new(HttpGraphFetcher::new(config)))
		.recorder(Rc::new(HttpSearchRecorder::new(config)))
		.preferences(Rc::new(BrowserStorage))
		.config(config.clone())
		.build()
}

/// Root component: creates the store once and routes to the explorer.
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	let config = StoreConfig::from_build_env();
	let store = StoredValue::new_local(build_store(&config));
	let preference_key = config.preference_key;

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />

		<Title text="Graph Explorer" />

		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route
					path=path!("/")
					view=move || view! { <Home store=store preference_key=preference_key.clone() /> }
				/>
			</Routes>
		</Router>
	}
}
