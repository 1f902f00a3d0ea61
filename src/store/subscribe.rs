//! Selector based change notification.
//!
//! A subscriber pairs a selector over [`UiState`] with a callback. After each
//! mutation the selector is re-run and the callback fires only when the
//! selected value compares unequal to the last one seen.
//!
//! Callbacks run after the store's borrows are released and may write back
//! into the store. A pending callback delivers the watcher's latest value at
//! the time it runs, so a nested notification is never overwritten by an
//! older one.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::state::UiState;

pub(crate) type SubscriberId = u64;

/// A pending callback invocation, run once all store borrows are released.
pub(crate) type Notification = Box<dyn FnOnce()>;

trait Watch {
	fn check(&mut self, state: &UiState) -> Option<Notification>;
}

/// The part of a watcher that pending notifications hold on to.
struct Delivery<T, C> {
	latest: RefCell<T>,
	delivered: RefCell<T>,
	active: Cell<bool>,
	callback: C,
}

impl<T, C> Delivery<T, C>
where
	T: Clone + PartialEq,
	C: Fn(&T),
{
	fn deliver(&self) {
		if !self.active.get() {
			return;
		}
		let value = self.latest.borrow().clone();
		if *self.delivered.borrow() == value {
			return;
		}
		*self.delivered.borrow_mut() = value.clone();
		(self.callback)(&value);
	}
}

struct Watcher<T, S, C> {
	selector: S,
	delivery: Rc<Delivery<T, C>>,
}

impl<T, S, C> Watch for Watcher<T, S, C>
where
	T: Clone + PartialEq + 'static,
	S: Fn(&UiState) -> T,
	C: Fn(&T) + 'static,
{
	fn check(&mut self, state: &UiState) -> Option<Notification> {
		let next = (self.selector)(state);
		if *self.delivery.latest.borrow() == next {
			return None;
		}
		*self.delivery.latest.borrow_mut() = next;
		let delivery = Rc::clone(&self.delivery);
		Some(Box::new(move || delivery.deliver()))
	}
}

impl<T, S, C> Drop for Watcher<T, S, C> {
	fn drop(&mut self) {
		self.delivery.active.set(false);
	}
}

/// Registered watchers plus ids whose removal had to wait for a walk to end.
#[derive(Default)]
pub(crate) struct Subscribers {
	next_id: Cell<SubscriberId>,
	watchers: RefCell<Vec<(SubscriberId, Box<dyn Watch>)>>,
	orphaned: RefCell<Vec<SubscriberId>>,
}

impl Subscribers {
	pub(crate) fn insert<T, S, C>(&self, state: &UiState, selector: S, callback: C) -> SubscriberId
	where
		T: Clone + PartialEq + 'static,
		S: Fn(&UiState) -> T + 'static,
		C: Fn(&T) + 'static,
	{
		let id = self.next_id.get();
		self.next_id.set(id + 1);
		let initial = selector(state);
		let watcher = Watcher {
			selector,
			delivery: Rc::new(Delivery {
				latest: RefCell::new(initial.clone()),
				delivered: RefCell::new(initial),
				active: Cell::new(true),
				callback,
			}),
		};
		self.watchers.borrow_mut().push((id, Box::new(watcher)));
		id
	}

	/// Unregister `id`, now or as soon as the current walk finishes.
	pub(crate) fn remove(&self, id: SubscriberId) {
		self.orphaned.borrow_mut().push(id);
		self.purge();
	}

	/// Re-run every selector and return the callbacks that are due.
	pub(crate) fn collect(&self, state: &UiState) -> Vec<Notification> {
		let pending: Vec<Notification> = self
			.watchers
			.borrow_mut()
			.iter_mut()
			.filter_map(|(_, watcher)| watcher.check(state))
			.collect();
		self.purge();
		pending
	}

	fn purge(&self) {
		let Ok(mut watchers) = self.watchers.try_borrow_mut() else {
			return;
		};
		// dropping a watcher can drop further subscriptions
		loop {
			let ids = self.orphaned.take();
			if ids.is_empty() {
				break;
			}
			watchers.retain(|(id, _)| !ids.contains(id));
		}
	}

	#[cfg(test)]
	pub(crate) fn len(&self) -> usize {
		self.watchers.borrow().len()
	}
}

/// Keeps a store subscription alive; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
	id: SubscriberId,
	subscribers: Weak<Subscribers>,
}

impl Subscription {
	pub(crate) fn new(id: SubscriberId, subscribers: &Rc<Subscribers>) -> Self {
		Self {
			id,
			subscribers: Rc::downgrade(subscribers),
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(subscribers) = self.subscribers.upgrade() {
			subscribers.remove(self.id);
		}
	}
}
