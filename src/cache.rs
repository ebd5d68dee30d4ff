use std::cell::RefCell;
use std::rc::Rc;

use enclose::enclose;

use crate::computed::{computed, Computed};
use crate::dom::VideoHandle;
use crate::signal::{Signal, Subscription};

/// One video element under cache management.
///
/// Visibility is a derived value: hidden iff the extension is enabled AND
/// the owning channel is disabled. The derivation and its subscriptions are
/// created by [`Channel::add_video`] and torn down on dispose, along with
/// the injected-marker on the DOM handle.
pub struct Video {
	id: String,
	title: String,
	is_short: bool,
	handle: Rc<dyn VideoHandle>,
	toggle: Rc<dyn Fn()>,
	binding: RefCell<Option<Binding>>,
}

struct Binding {
	visible: Computed<bool>,
	watcher: Subscription,
}

impl Video {
	pub fn new(
		id: String,
		title: String,
		is_short: bool,
		handle: Rc<dyn VideoHandle>,
		toggle: Rc<dyn Fn()>,
	) -> Self {
		Video {
			id,
			title,
			is_short,
			handle,
			toggle,
			binding: RefCell::new(None),
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn title(&self) -> &str {
		&self.title
	}

	pub fn is_short(&self) -> bool {
		self.is_short
	}

	fn bind(&self, disabled: &Signal<bool>, enabled: &Signal<bool>) {
		let disabled = disabled.clone();
		let enabled = enabled.clone();
		let visible = computed(enclose!((disabled, enabled) move || {
			!(enabled.get() && disabled.get())
		}));
		let handle = self.handle.clone();
		let watcher = visible.subscribe(move |visible: &bool| {
			handle.set_hidden(!visible);
		});
		self.handle.set_hidden(!visible.get());
		*self.binding.borrow_mut() = Some(Binding { visible, watcher });
	}

	/// Re-apply the current visibility to the DOM handle. The SPA rewrites
	/// inline styles on re-render, so the scan loop re-asserts state every
	/// tick even though signal propagation already handled the change
	/// itself.
	pub fn refresh(&self) {
		if let Some(binding) = self.binding.borrow().as_ref() {
			if let Ok(visible) = binding.visible.try_get() {
				self.handle.set_hidden(!visible);
			}
		}
	}

	/// Attach the control widget, once. The marker on the DOM element is the
	/// idempotency guard: a marked element already carries a widget.
	pub fn inject(&self) {
		if self.handle.marked_injected() {
			return;
		}
		if let Err(err) = self.handle.attach_toggle(self.toggle.clone()) {
			tracing::warn!(%err, video = %self.id, "control widget not attached");
			return;
		}
		self.handle.mark_injected();
	}

	fn dispose(&self) {
		if let Some(binding) = self.binding.borrow_mut().take() {
			binding.watcher.unsubscribe();
			binding.visible.dispose();
		}
		self.handle.clear_injected();
	}
}

/// A channel and the videos discovered for it on the current page.
///
/// `disabled` is the single write point for the channel's state; every owned
/// video derives its visibility from it, so one write fans out to N DOM
/// updates. Identity is by `id` (the channel name doubles as the id).
pub struct Channel {
	id: String,
	name: String,
	disabled: Signal<bool>,
	videos: RefCell<Vec<Video>>,
}

impl Channel {
	pub fn new(id: &str, name: &str, disabled: bool) -> Self {
		Channel {
			id: id.to_string(),
			name: name.to_string(),
			disabled: Signal::new(disabled),
			videos: RefCell::new(Vec::new()),
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn disabled(&self) -> &Signal<bool> {
		&self.disabled
	}

	pub fn video_count(&self) -> usize {
		self.videos.borrow().len()
	}

	/// Add a video, replacing any existing entry with the same id: the old
	/// entry is disposed first (which clears its DOM marker), then the new
	/// one is bound, injected and appended.
	pub fn add_video(&self, video: Video, enabled: &Signal<bool>) {
		let mut videos = self.videos.borrow_mut();
		if let Some(pos) = videos.iter().position(|v| v.id == video.id) {
			let old = videos.remove(pos);
			old.dispose();
		}
		video.bind(&self.disabled, enabled);
		video.inject();
		videos.push(video);
	}

	pub fn remove_video(&self, id: &str) {
		let mut videos = self.videos.borrow_mut();
		if let Some(pos) = videos.iter().position(|v| v.id == id) {
			let old = videos.remove(pos);
			old.dispose();
		}
	}

	pub fn enable(&self) {
		self.set_disabled(false);
	}

	pub fn disable(&self) {
		self.set_disabled(true);
	}

	pub fn set_disabled(&self, disabled: bool) {
		if let Err(err) = self.disabled.try_set(disabled) {
			tracing::error!(%err, channel = %self.name, "state change on disposed channel");
		}
	}

	pub fn refresh(&self) {
		for video in self.videos.borrow().iter() {
			video.refresh();
		}
	}

	pub(crate) fn dispose(&self) {
		for video in self.videos.borrow_mut().drain(..) {
			video.dispose();
		}
		self.disabled.dispose();
	}
}

/// In-memory registry of channels for the current page incarnation. Cleared
/// wholesale on navigation; the allow-list is the durable source of truth,
/// so per-channel state is rebuilt from it on the next scan.
pub struct ChannelCache {
	channels: RefCell<Vec<Rc<Channel>>>,
}

impl Default for ChannelCache {
	fn default() -> Self {
		Self::new()
	}
}

impl ChannelCache {
	pub fn new() -> Self {
		ChannelCache {
			channels: RefCell::new(Vec::new()),
		}
	}

	/// Register a channel, or return the existing entry with the same
	/// identity. The freshly-built duplicate is disposed (it owns no videos
	/// yet, so this is a no-op beyond its own signal).
	pub fn add_channel(&self, channel: Channel) -> Rc<Channel> {
		let mut channels = self.channels.borrow_mut();
		if let Some(existing) = channels.iter().find(|c| c.id == channel.id) {
			let existing = existing.clone();
			std::mem::drop(channels);
			channel.dispose();
			return existing;
		}
		let channel = Rc::new(channel);
		channels.push(channel.clone());
		channel
	}

	pub fn find(&self, id: &str) -> Option<Rc<Channel>> {
		self.channels.borrow().iter().find(|c| c.id == id).cloned()
	}

	pub fn channels(&self) -> Vec<Rc<Channel>> {
		self.channels.borrow().clone()
	}

	pub fn len(&self) -> usize {
		self.channels.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.channels.borrow().is_empty()
	}

	pub fn disable_videos(&self) {
		for channel in self.channels.borrow().iter() {
			channel.disable();
		}
	}

	pub fn enable_videos(&self) {
		for channel in self.channels.borrow().iter() {
			channel.enable();
		}
	}

	pub fn refresh_all(&self) {
		for channel in self.channels.borrow().iter() {
			channel.refresh();
		}
	}

	pub fn clear(&self) {
		for channel in self.channels.borrow_mut().drain(..) {
			channel.dispose();
		}
	}
}
