use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::error::Error;
use crate::tracking::{self, Source};
use crate::Computed;

/// A mutable reactive value cell.
///
/// `set` notifies subscribers synchronously, in subscription order, and only
/// when the value actually changed (64-bit value hash comparison). Reading
/// inside an active computation registers the signal as a dependency of that
/// computation.
///
/// Signals are owned resources: the owner must call [`Signal::dispose`] when
/// tearing down, after which every access fails with
/// [`Error::SignalDisposed`]. The plain accessors panic on disposed signals
/// (programming error); the `try_` variants report it for call sites that
/// degrade gracefully.
pub struct Signal<T> {
	body: Rc<SignalBody<T>>,
}

impl<T> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

struct Slot<T> {
	value: T,
	hash: u64,
}

pub(crate) struct SignalBody<T> {
	slot: RefCell<Option<Slot<T>>>,
	subs: RefCell<Subscribers<T>>,
}

struct Subscribers<T> {
	entries: SmallVec<[(u64, Rc<dyn Fn(&T)>); 2]>,
	next_id: u64,
}

impl<T> Default for Subscribers<T> {
	fn default() -> Self {
		Subscribers {
			entries: SmallVec::new(),
			next_id: 1,
		}
	}
}

impl<T> Default for Signal<T>
where
	T: Default + Clone + Hash + 'static,
{
	fn default() -> Self {
		Signal::new(Default::default())
	}
}

impl<T> Signal<T>
where
	T: Clone + Hash + 'static,
{
	pub fn new(value: T) -> Self {
		let hash = fxhash::hash64(&value);
		Signal {
			body: Rc::new(SignalBody {
				slot: RefCell::new(Some(Slot { value, hash })),
				subs: RefCell::new(Subscribers::default()),
			}),
		}
	}

	pub fn get(&self) -> T {
		match self.try_get() {
			Ok(value) => value,
			Err(err) => panic!("signal read failed: {err}"),
		}
	}

	pub fn try_get(&self) -> Result<T, Error> {
		let value = {
			let slot = self.body.slot.borrow();
			match slot.as_ref() {
				Some(slot) => slot.value.clone(),
				None => return Err(Error::SignalDisposed),
			}
		};
		tracking::record(self.body.clone() as Rc<dyn Source>);
		Ok(value)
	}

	pub fn set(&self, value: T) {
		if let Err(err) = self.try_set(value) {
			panic!("signal write failed: {err}");
		}
	}

	pub fn try_set(&self, value: T) -> Result<(), Error> {
		let changed = {
			let mut slot = self.body.slot.borrow_mut();
			let slot = slot.as_mut().ok_or(Error::SignalDisposed)?;
			let hash = fxhash::hash64(&value);
			if slot.hash == hash {
				None
			} else {
				slot.value = value;
				slot.hash = hash;
				Some(slot.value.clone())
			}
		};
		if let Some(value) = changed {
			self.body.notify(&value);
		}
		Ok(())
	}

	/// Mutate in place, then re-hash and notify. Subscribers only ever run
	/// after the mutation completed, so they observe the full new value.
	pub fn update(&self, func: impl FnOnce(&mut T)) {
		if let Err(err) = self.try_update(func) {
			panic!("signal write failed: {err}");
		}
	}

	pub fn try_update(&self, func: impl FnOnce(&mut T)) -> Result<(), Error> {
		let changed = {
			let mut slot = self.body.slot.borrow_mut();
			let slot = slot.as_mut().ok_or(Error::SignalDisposed)?;
			func(&mut slot.value);
			let hash = fxhash::hash64(&slot.value);
			if slot.hash == hash {
				None
			} else {
				slot.hash = hash;
				Some(slot.value.clone())
			}
		};
		if let Some(value) = changed {
			self.body.notify(&value);
		}
		Ok(())
	}

	pub fn subscribe(&self, func: impl Fn(&T) + 'static) -> Subscription {
		match self.try_subscribe(func) {
			Ok(subscription) => subscription,
			Err(err) => panic!("subscribe failed: {err}"),
		}
	}

	pub fn try_subscribe(&self, func: impl Fn(&T) + 'static) -> Result<Subscription, Error> {
		if self.is_disposed() {
			return Err(Error::SignalDisposed);
		}
		let id = self.body.subs.borrow_mut().add(Rc::new(func));
		Ok(Subscription {
			source: Rc::downgrade(&self.body) as Weak<dyn Source>,
			id,
		})
	}

	pub fn map<F, R>(&self, func: F) -> Computed<R>
	where
		F: Fn(&T) -> R + 'static,
		R: Clone + Hash + 'static,
	{
		let this = self.clone();
		Computed::new(move || func(&this.get()))
	}

	/// Invalidate the signal: the value is dropped and all subscriptions are
	/// cleared. Idempotent.
	pub fn dispose(&self) {
		*self.body.slot.borrow_mut() = None;
		self.body.subs.borrow_mut().entries.clear();
	}

	pub fn is_disposed(&self) -> bool {
		self.body.slot.borrow().is_none()
	}
}

impl<T> SignalBody<T> {
	fn notify(&self, value: &T) {
		// Subscribers may subscribe or unsubscribe while running; invoke a
		// snapshot of the list taken up front.
		let entries: SmallVec<[Rc<dyn Fn(&T)>; 2]> = self
			.subs
			.borrow()
			.entries
			.iter()
			.map(|(_, func)| func.clone())
			.collect();
		for func in entries {
			(*func)(value);
		}
	}
}

impl<T> Subscribers<T> {
	fn add(&mut self, func: Rc<dyn Fn(&T)>) -> u64 {
		let id = self.next_id;
		self.next_id += 1;
		self.entries.push((id, func));
		id
	}
}

impl<T: 'static> Source for SignalBody<T> {
	fn subscribe_source(&self, func: Rc<dyn Fn()>) -> u64 {
		if self.slot.borrow().is_none() {
			tracing::error!("dependency subscription on a disposed signal");
			return 0;
		}
		self.subs.borrow_mut().add(Rc::new(move |_: &T| (*func)()))
	}

	fn unsubscribe_source(&self, id: u64) {
		self.subs.borrow_mut().entries.retain(|(i, _)| *i != id);
	}
}

/// Handle returned by `subscribe`. Unsubscribing is explicit: dropping the
/// handle leaves the subscription in place.
#[must_use]
pub struct Subscription {
	source: Weak<dyn Source>,
	id: u64,
}

impl Subscription {
	pub fn unsubscribe(self) {
		if let Some(source) = self.source.upgrade() {
			source.unsubscribe_source(self.id);
		}
	}
}

impl<T> Debug for Signal<T>
where
	T: Clone + Hash + Debug + 'static,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.try_get() {
			Ok(value) => value.fmt(f),
			Err(_) => f.write_str("<disposed>"),
		}
	}
}
