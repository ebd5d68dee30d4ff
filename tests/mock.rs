use std::sync::{Arc, Mutex, MutexGuard};

use mockall::automock;

#[automock]
pub trait Spy {
	fn trigger(&self, value: u64);
}

/// Shared handle around a mockall spy so both the test body and `move`
/// closures can set expectations and record calls.
#[derive(Clone)]
pub struct SharedSpy(Arc<Mutex<MockSpy>>);

impl SharedSpy {
	pub fn new() -> SharedSpy {
		SharedSpy(Arc::new(Mutex::new(MockSpy::new())))
	}

	pub fn get(&self) -> MutexGuard<'_, MockSpy> {
		self.0.lock().unwrap()
	}
}
