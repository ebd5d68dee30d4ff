use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use crate::error::Error;
use crate::signal::{Signal, Subscription};
use crate::tracking::{self, Dependencies};

/// A read-only signal derived from other signals.
///
/// The computation runs once eagerly and again whenever any signal it read
/// during its *last* run changes. The dependency set is re-tracked on every
/// run: a signal that stops being read (e.g. behind a conditional) stops
/// triggering recomputation, and a newly-read one starts. The derived value
/// republishes through an internal signal, so computeds chain and their
/// subscribers get the same equality gating as plain signals.
pub struct Computed<T>
where
	T: Clone + Hash + 'static,
{
	body: Rc<ComputedBody<T>>,
}

impl<T> Clone for Computed<T>
where
	T: Clone + Hash + 'static,
{
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

struct ComputedBody<T>
where
	T: Clone + Hash + 'static,
{
	output: Signal<T>,
	inner: RefCell<ComputedInner<T>>,
}

struct ComputedInner<T> {
	func: Box<dyn Fn() -> T>,
	dependencies: Dependencies,
	trigger: Rc<dyn Fn()>,
	disposed: bool,
}

/// Create a derived signal from a computation. See [`Computed`].
pub fn computed<T>(func: impl Fn() -> T + 'static) -> Computed<T>
where
	T: Clone + Hash + 'static,
{
	Computed::new(func)
}

impl<T> Computed<T>
where
	T: Clone + Hash + 'static,
{
	pub fn new(func: impl Fn() -> T + 'static) -> Self {
		let body = Rc::new_cyclic(|this: &Weak<ComputedBody<T>>| {
			let trigger: Rc<dyn Fn()> = {
				let this = this.clone();
				Rc::new(move || {
					if let Some(body) = this.upgrade() {
						body.recompute();
					}
				})
			};

			let (value, recorded) = tracking::track(|| func());
			let mut dependencies = Dependencies::new();
			dependencies.swap(recorded, &trigger);

			ComputedBody {
				output: Signal::new(value),
				inner: RefCell::new(ComputedInner {
					func: Box::new(func),
					dependencies,
					trigger,
					disposed: false,
				}),
			}
		});
		Computed { body }
	}

	pub fn get(&self) -> T {
		self.body.output.get()
	}

	pub fn try_get(&self) -> Result<T, Error> {
		self.body.output.try_get()
	}

	pub fn subscribe(&self, func: impl Fn(&T) + 'static) -> Subscription {
		self.body.output.subscribe(func)
	}

	pub fn try_subscribe(&self, func: impl Fn(&T) + 'static) -> Result<Subscription, Error> {
		self.body.output.try_subscribe(func)
	}

	/// Unsubscribe from the *current* dependency set and dispose the output
	/// cell. The dependency set may differ from the one recorded at
	/// construction; whatever is live now is what gets released.
	pub fn dispose(&self) {
		{
			let mut inner = self.body.inner.borrow_mut();
			if inner.disposed {
				return;
			}
			inner.disposed = true;
			inner.dependencies.clear();
		}
		self.body.output.dispose();
	}

	pub fn is_disposed(&self) -> bool {
		self.body.output.is_disposed()
	}
}

impl<T> ComputedBody<T>
where
	T: Clone + Hash + 'static,
{
	fn recompute(&self) {
		let Ok(mut inner) = self.inner.try_borrow_mut() else {
			tracing::error!("computed recomputation re-entered its own evaluation");
			return;
		};
		if inner.disposed {
			return;
		}

		let (value, recorded) = tracking::track(|| (inner.func)());
		let trigger = inner.trigger.clone();
		inner.dependencies.swap(recorded, &trigger);
		std::mem::drop(inner);

		if let Err(err) = self.output.try_set(value) {
			tracing::error!(%err, "computed output rejected an update");
		}
	}
}

impl<T> Debug for Computed<T>
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
