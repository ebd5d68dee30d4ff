use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mockall::predicate::eq;
use tubesift::{computed, Error, Signal};

mod mock;

use mock::{SharedSpy, Spy};

#[test]
fn set_notifies_once_per_distinct_value() {
	let a = Signal::new(10u64);
	let spy = SharedSpy::new();

	let sub = a.subscribe({
		let spy = spy.clone();
		move |value: &u64| spy.get().trigger(*value)
	});

	spy.get().expect_trigger().with(eq(20u64)).times(1).return_const(());
	a.set(20);
	a.set(20);
	a.set(20);
	spy.get().checkpoint();

	spy.get().expect_trigger().with(eq(30u64)).times(1).return_const(());
	a.set(30);
	spy.get().checkpoint();

	// Setting the current value back is not a change.
	spy.get().expect_trigger().times(0).return_const(());
	a.set(30);
	spy.get().checkpoint();

	spy.get().expect_trigger().times(0).return_const(());
	sub.unsubscribe();
	a.set(40);
	spy.get().checkpoint();
}

#[test]
fn subscribers_run_in_subscription_order() {
	let a = Signal::new(0u64);
	let order = Rc::new(RefCell::new(Vec::new()));

	let _first = a.subscribe({
		let order = order.clone();
		move |_: &u64| order.borrow_mut().push(1)
	});
	let _second = a.subscribe({
		let order = order.clone();
		move |_: &u64| order.borrow_mut().push(2)
	});

	a.set(1);
	assert_eq!(*order.borrow(), vec![1, 2]);
}

#[test]
fn update_notifies_only_on_real_change() {
	let list = Signal::new(vec!["a".to_string()]);
	let seen = Rc::new(RefCell::new(Vec::new()));

	let _sub = list.subscribe({
		let seen = seen.clone();
		move |value: &Vec<String>| seen.borrow_mut().push(value.clone())
	});

	list.update(|v| v.push("b".to_string()));
	assert_eq!(seen.borrow().len(), 1);
	assert_eq!(seen.borrow()[0], vec!["a".to_string(), "b".to_string()]);

	list.update(|_| {});
	assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn disposed_signal_accesses_fail() {
	let a = Signal::new(1u64);
	let sub = a.subscribe(|_| {});

	a.dispose();

	assert!(matches!(a.try_get(), Err(Error::SignalDisposed)));
	assert!(matches!(a.try_set(2), Err(Error::SignalDisposed)));
	assert!(a.try_subscribe(|_| {}).is_err());
	assert!(a.is_disposed());

	// Left-over handles and repeated disposal stay no-ops.
	sub.unsubscribe();
	a.dispose();
}

#[test]
fn computed_derives_and_gates_like_a_signal() {
	let a = Signal::new(10u64);
	let b = computed({
		let a = a.clone();
		move || a.get() + 10
	});
	assert_eq!(b.get(), 20);

	let spy = SharedSpy::new();
	let _sub = b.subscribe({
		let spy = spy.clone();
		move |value: &u64| spy.get().trigger(*value)
	});

	spy.get().expect_trigger().with(eq(30u64)).times(1).return_const(());
	a.set(20);
	a.set(20);
	spy.get().checkpoint();
	assert_eq!(b.get(), 30);
}

#[test]
fn computed_retracks_dependencies_each_run() {
	let cond = Signal::new(true);
	let a = Signal::new(1u64);
	let b = Signal::new(100u64);
	let runs = Rc::new(Cell::new(0u32));

	let c = computed({
		let (cond, a, b, runs) = (cond.clone(), a.clone(), b.clone(), runs.clone());
		move || {
			runs.set(runs.get() + 1);
			if cond.get() {
				a.get()
			} else {
				b.get()
			}
		}
	});
	assert_eq!(c.get(), 1);
	assert_eq!(runs.get(), 1);

	// `b` is not a dependency while the condition holds.
	b.set(200);
	assert_eq!(runs.get(), 1);
	assert_eq!(c.get(), 1);

	cond.set(false);
	assert_eq!(runs.get(), 2);
	assert_eq!(c.get(), 200);

	// Now it is.
	b.set(300);
	assert_eq!(runs.get(), 3);
	assert_eq!(c.get(), 300);

	// And `a` dropped out.
	a.set(5);
	assert_eq!(runs.get(), 3);
}

#[test]
fn computeds_chain() {
	let a = Signal::new(1u64);
	let b = computed({
		let a = a.clone();
		move || a.get() + 1
	});
	let c = computed({
		let b = b.clone();
		move || b.get() * 10
	});
	assert_eq!(c.get(), 20);

	a.set(2);
	assert_eq!(c.get(), 30);
}

#[test]
fn computed_dispose_releases_current_dependencies() {
	let a = Signal::new(1u64);
	let runs = Rc::new(Cell::new(0u32));

	let c = computed({
		let (a, runs) = (a.clone(), runs.clone());
		move || {
			runs.set(runs.get() + 1);
			a.get()
		}
	});
	assert_eq!(runs.get(), 1);

	c.dispose();
	a.set(2);
	assert_eq!(runs.get(), 1);
	assert!(c.is_disposed());
	assert!(c.try_get().is_err());
}

#[test]
fn map_derives_from_a_single_signal() {
	let a = Signal::new(2u64);
	let double = a.map(|value| value * 2);
	assert_eq!(double.get(), 4);

	a.set(3);
	assert_eq!(double.get(), 6);
}

#[test]
#[should_panic(expected = "tracking scopes do not nest")]
fn nested_tracking_scopes_are_rejected() {
	let a = Signal::new(1u64);
	let _outer = computed(move || {
		let inner = computed(|| 2u64);
		a.get() + inner.get()
	});
}
