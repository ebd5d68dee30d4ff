use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Anything a computation can depend on. Implemented by signal bodies;
/// computeds participate through their output signal.
pub(crate) trait Source {
	fn subscribe_source(&self, func: Rc<dyn Fn()>) -> u64;
	fn unsubscribe_source(&self, id: u64);
}

thread_local! {
	static SCOPE: RefCell<Option<Vec<Rc<dyn Source>>>> = const { RefCell::new(None) };
}

/// Record a signal read into the active tracking scope, if any.
pub(crate) fn record(source: Rc<dyn Source>) {
	SCOPE.with(|scope| {
		if let Some(recorded) = scope.borrow_mut().as_mut() {
			let addr = Rc::as_ptr(&source) as *const () as usize;
			let seen = recorded
				.iter()
				.any(|s| Rc::as_ptr(s) as *const () as usize == addr);
			if !seen {
				recorded.push(source);
			}
		}
	});
}

struct ScopeGuard;

impl Drop for ScopeGuard {
	fn drop(&mut self) {
		SCOPE.with(|scope| scope.borrow_mut().take());
	}
}

/// Run `func` inside a fresh tracking scope and return its value together
/// with every distinct source it read, in read order.
///
/// Tracking is global and non-reentrant: opening a scope while another one
/// is active is a usage error.
pub(crate) fn track<T>(func: impl FnOnce() -> T) -> (T, Vec<Rc<dyn Source>>) {
	SCOPE.with(|scope| {
		let mut slot = scope.borrow_mut();
		if slot.is_some() {
			panic!("tracking scopes do not nest: a computation started while another one was still tracking");
		}
		*slot = Some(Vec::new());
	});

	let guard = ScopeGuard;
	let value = func();
	let recorded = SCOPE.with(|scope| scope.borrow_mut().take()).unwrap_or_default();
	std::mem::drop(guard);

	(value, recorded)
}

/// The dependency set of one derived computation, keyed by source identity.
/// Swapped wholesale on every recomputation so that sources which stopped
/// being read stop triggering, and newly-read sources start.
pub(crate) struct Dependencies {
	based_on: BTreeMap<usize, (Rc<dyn Source>, u64)>,
}

impl Dependencies {
	pub fn new() -> Self {
		Dependencies {
			based_on: BTreeMap::new(),
		}
	}

	fn addr(source: &Rc<dyn Source>) -> usize {
		Rc::as_ptr(source) as *const () as usize
	}

	pub fn swap(&mut self, next: Vec<Rc<dyn Source>>, trigger: &Rc<dyn Fn()>) {
		let mut fresh = BTreeMap::new();

		for source in next {
			let addr = Self::addr(&source);
			if let Some(kept) = self.based_on.remove(&addr) {
				fresh.insert(addr, kept);
			} else {
				let id = source.subscribe_source(trigger.clone());
				fresh.insert(addr, (source, id));
			}
		}

		// Whatever is left fell out of the dependency set.
		for (_, (source, id)) in std::mem::take(&mut self.based_on) {
			source.unsubscribe_source(id);
		}

		self.based_on = fresh;
	}

	pub fn clear(&mut self) {
		for (_, (source, id)) in std::mem::take(&mut self.based_on) {
			source.unsubscribe_source(id);
		}
	}
}
