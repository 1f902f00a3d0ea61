//! The single persisted UI preference: the graph style.

use std::cell::RefCell;
use std::collections::HashMap;

use log::warn;

use crate::types::GraphStyle;

/// String key-value storage that outlives the page.
pub trait PreferenceStore {
	/// Stored value for `key`, if any.
	fn get(&self, key: &str) -> Option<String>;
	/// Store `value` under `key`; failures are logged, not returned.
	fn set(&self, key: &str, value: &str);
}

/// `window.localStorage`; missing or blocked storage reads as empty.
pub struct BrowserStorage;

impl BrowserStorage {
	fn storage() -> Option<web_sys::Storage> {
		web_sys::window()?.local_storage().ok().flatten()
	}
}

impl PreferenceStore for BrowserStorage {
	fn get(&self, key: &str) -> Option<String> {
		Self::storage()?.get_item(key).ok().flatten()
	}

	fn set(&self, key: &str, value: &str) {
		let Some(storage) = Self::storage() else {
			return;
		};
		if storage.set_item(key, value).is_err() {
			warn!("could not persist preference {key}");
		}
	}
}

/// In-process preferences, for tests and non-browser hosts.
#[derive(Default)]
pub struct MemoryPreferences {
	values: RefCell<HashMap<String, String>>,
}

impl MemoryPreferences {
	/// Preferences seeded with one entry.
	pub fn with(key: &str, value: &str) -> Self {
		let prefs = Self::default();
		prefs.set(key, value);
		prefs
	}
}

impl PreferenceStore for MemoryPreferences {
	fn get(&self, key: &str) -> Option<String> {
		self.values.borrow().get(key).cloned()
	}

	fn set(&self, key: &str, value: &str) {
		self.values.borrow_mut().insert(key.to_owned(), value.to_owned());
	}
}

/// Stored style, or [`GraphStyle::Sphere`] when unset or unrecognised.
pub fn load_graph_style(prefs: &dyn PreferenceStore, key: &str) -> GraphStyle {
	prefs
		.get(key)
		.and_then(|raw| raw.parse().ok())
		.unwrap_or_default()
}

/// Remember `style` for the next session.
pub fn persist_graph_style(prefs: &dyn PreferenceStore, key: &str, style: GraphStyle) {
	prefs.set(key, style.as_str());
}
