use leptos::prelude::*;
use leptos::reactive::owner::LocalStorage;

use crate::store::{GraphStore, UiState};

/// The store as the UI passes it around: `Copy`, owned by the root scope.
pub type StoreHandle = StoredValue<GraphStore, LocalStorage>;

/// Mirror `selector` over the store into a signal.
///
/// The subscription lives as long as the calling reactive owner.
pub fn use_store_selector<T>(
	store: StoreHandle,
	selector: impl Fn(&UiState) -> T + 'static,
) -> ReadSignal<T>
where
	T: Clone + PartialEq + Send + Sync + 'static,
{
	let initial = store.with_value(|s| s.read(&selector));
	let signal = RwSignal::new(initial);
	let subscription =
		store.with_value(|s| s.subscribe(selector, move |value: &T| signal.set(value.clone())));
	let _ = StoredValue::new_local(subscription);
	signal.read_only()
}
