use std::rc::Rc;

use crate::error::Error;
use crate::page::PageType;
use crate::signal::Signal;

/// One video element found during a scan, before it enters the cache.
pub struct Discovery {
	pub id: String,
	pub title: String,
	pub channel_name: String,
	pub is_short: bool,
	pub handle: Rc<dyn VideoHandle>,
}

/// Opaque reference to a video element on the host page.
///
/// The injected-marker is a side channel written onto the element itself. It
/// tracks the owning [`Video`](crate::Video) entity's lifetime: set when the
/// control widget is attached, cleared when the entity is disposed, checked
/// before any re-creation or re-injection attempt.
pub trait VideoHandle {
	fn set_hidden(&self, hidden: bool);
	fn marked_injected(&self) -> bool;
	fn mark_injected(&self);
	fn clear_injected(&self);
	/// Attach the per-video allow/deny widget. `on_toggle` flips the owning
	/// channel's allow-list membership.
	fn attach_toggle(&self, on_toggle: Rc<dyn Fn()>) -> Result<(), Error>;
}

/// A whitelist/blacklist button injected on a channel page. The recorded
/// channel name lives on the element (same side-channel idea as the video
/// marker) so a stale badge can be detected and corrected after the SPA
/// swaps page content underneath us.
pub trait ChannelBadge {
	fn recorded_channel(&self) -> Option<String>;
	fn record_channel(&self, name: &str);
	fn set_listed(&self, listed: bool);
	fn remove(&self);
}

/// Boundary to the host page. Implementations are driven by the
/// [`selectors`](crate::selectors) table and own every CSS query in the
/// system; the engine and cache only ever see this trait.
pub trait Dom {
	/// Page-type-specific "content is present" predicate used by the
	/// first-render wait: the channel name element on channel pages, any
	/// video card elsewhere.
	fn content_present(&self, page: PageType) -> bool;

	fn header_ready(&self) -> bool;
	fn header_buttons_ready(&self) -> bool;

	fn toggle_injected(&self) -> bool;
	/// Inject the global enable/disable toggle, bound to `enabled` for its
	/// rendered state. `on_toggle` carries the user's new choice back.
	fn inject_toggle(&self, enabled: &Signal<bool>, on_toggle: Rc<dyn Fn(bool)>)
		-> Result<(), Error>;

	fn discover(&self, page: PageType) -> Vec<Discovery>;
	/// Fade the infinite-scroll spinners on watch pages.
	fn hide_spinners(&self);
	/// Hide the shorts shelf on the home grid.
	fn suppress_shorts(&self);

	fn channel_page_name(&self) -> Option<String>;
	fn channel_badges(&self) -> Vec<Rc<dyn ChannelBadge>>;
	fn injection_point_ready(&self) -> bool;
	fn inject_channel_badge(
		&self,
		channel: &str,
		listed: bool,
		on_toggle: Rc<dyn Fn(String)>,
	) -> Result<(), Error>;
}
