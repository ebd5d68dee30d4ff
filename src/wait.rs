use std::time::Duration;

use crate::error::Error;

/// How a completed wait ended. Cancellation (the page navigated away while
/// we were polling) is a normal outcome, not an error.
#[derive(Debug, PartialEq, Eq)]
pub enum Waited<V> {
	Found(V),
	Cancelled,
}

#[derive(Clone, Copy, Debug)]
pub struct WaitSettings {
	pub interval: Duration,
	/// `None` polls forever. Reserved for waits where giving up is not
	/// acceptable (the initial page load always completes eventually).
	pub max_attempts: Option<u32>,
}

impl WaitSettings {
	pub fn bounded(interval: Duration, max_attempts: u32) -> Self {
		WaitSettings {
			interval,
			max_attempts: Some(max_attempts),
		}
	}

	pub fn indefinite(interval: Duration) -> Self {
		WaitSettings {
			interval,
			max_attempts: None,
		}
	}
}

/// Poll `probe` until it yields a value, `cancelled` turns true, or the
/// attempt budget runs out. This is the single polling primitive behind
/// every DOM-dependent wait in the crate; call sites differ only in their
/// probe, cancellation predicate, and settings.
///
/// The probe runs once up front and then once per interval, so a bounded
/// wait sleeps exactly `max_attempts` times before failing with
/// [`Error::Timeout`].
pub async fn wait_for<V>(
	what: &str,
	settings: WaitSettings,
	probe: impl Fn() -> Option<V>,
	cancelled: impl Fn() -> bool,
) -> Result<Waited<V>, Error> {
	let mut attempts: u32 = 0;
	loop {
		if cancelled() {
			return Ok(Waited::Cancelled);
		}
		if let Some(found) = probe() {
			return Ok(Waited::Found(found));
		}
		if let Some(max) = settings.max_attempts {
			if attempts >= max {
				tracing::warn!(what, attempts, "giving up on wait");
				return Err(Error::Timeout {
					what: what.to_string(),
				});
			}
		}
		attempts += 1;
		tokio::time::sleep(settings.interval).await;
	}
}
