use std::rc::Rc;

use tubesift::{Channel, ChannelCache, Signal, Video};


use fake::FakeHandle;

fn video(id: &str, handle: &Rc<FakeHandle>) -> Video {
	Video::new(
		id.to_string(),
		format!("{id} title"),
		false,
		handle.clone(),
		Rc::new(|| {}),
	)
}

#[test]
fn duplicate_video_ids_replace_the_old_entry() {
	let enabled = Signal::new(true);
	let channel = Channel::new("chan", "chan", false);
	let first = FakeHandle::new();
	let second = FakeHandle::new();

	channel.add_video(video("v1", &first), &enabled);
	assert!(first.injected.get());
	assert_eq!(first.attaches.get(), 1);

	// Same video id on a fresh element: the SPA re-rendered the card.
	channel.add_video(video("v1", &second), &enabled);
	assert_eq!(channel.video_count(), 1);
	assert!(!first.injected.get());
	assert!(second.injected.get());

	// The replaced entry's subscriptions are dead.
	let quiet = first.hides.get();
	channel.disable();
	assert_eq!(first.hides.get(), quiet);
	assert!(second.hidden.get());
}

#[test]
fn global_enabled_overrides_channel_state() {
	let enabled = Signal::new(true);
	let channel = Channel::new("chan", "chan", true);
	let handle = FakeHandle::new();

	channel.add_video(video("v1", &handle), &enabled);
	assert!(handle.hidden.get());

	// Disabling the whole extension makes everything visible again.
	enabled.set(false);
	assert!(!handle.hidden.get());

	enabled.set(true);
	assert!(handle.hidden.get());
}

#[test]
fn channel_state_fans_out_to_every_video() {
	let enabled = Signal::new(true);
	let channel = Channel::new("chan", "chan", false);
	let handles: Vec<_> = (0..3).map(|_| FakeHandle::new()).collect();

	for (i, handle) in handles.iter().enumerate() {
		channel.add_video(video(&format!("v{i}"), handle), &enabled);
	}
	assert!(handles.iter().all(|h| !h.hidden.get()));

	channel.disable();
	assert!(handles.iter().all(|h| h.hidden.get()));

	channel.enable();
	assert!(handles.iter().all(|h| !h.hidden.get()));
}

#[test]
fn premarked_elements_skip_widget_attachment() {
	let enabled = Signal::new(true);
	let channel = Channel::new("chan", "chan", false);
	let handle = FakeHandle::new();
	handle.injected.set(true);

	channel.add_video(video("v1", &handle), &enabled);
	assert_eq!(handle.attaches.get(), 0);

	// Visibility tracking works regardless of the widget.
	channel.disable();
	assert!(handle.hidden.get());
}

#[test]
fn add_channel_dedupes_by_identity() {
	let cache = ChannelCache::new();
	let first = cache.add_channel(Channel::new("chan", "chan", false));
	let second = cache.add_channel(Channel::new("chan", "chan", true));

	assert!(Rc::ptr_eq(&first, &second));
	assert_eq!(cache.len(), 1);
	// The duplicate's construction-time state never won.
	assert!(!first.disabled().get());
}

#[test]
fn bulk_operations_reach_all_channels() {
	let enabled = Signal::new(true);
	let cache = ChannelCache::new();
	let a = cache.add_channel(Channel::new("a", "a", false));
	let b = cache.add_channel(Channel::new("b", "b", false));
	let ha = FakeHandle::new();
	let hb = FakeHandle::new();
	a.add_video(video("v1", &ha), &enabled);
	b.add_video(video("v2", &hb), &enabled);

	cache.disable_videos();
	assert!(ha.hidden.get());
	assert!(hb.hidden.get());

	cache.enable_videos();
	assert!(!ha.hidden.get());
	assert!(!hb.hidden.get());
}

#[test]
fn clear_disposes_every_subscription_and_marker() {
	let enabled = Signal::new(true);
	let cache = ChannelCache::new();
	let channel = cache.add_channel(Channel::new("chan", "chan", false));
	let handle = FakeHandle::new();
	channel.add_video(video("v1", &handle), &enabled);
	assert!(handle.injected.get());

	cache.clear();
	assert!(cache.is_empty());
	assert!(!handle.injected.get());

	// Flipping the global flag no longer touches the stale handle.
	let quiet = handle.hides.get();
	enabled.set(false);
	enabled.set(true);
	assert_eq!(handle.hides.get(), quiet);
}

#[test]
fn refresh_reasserts_visibility_after_external_rewrites() {
	let enabled = Signal::new(true);
	let channel = Channel::new("chan", "chan", true);
	let handle = FakeHandle::new();
	channel.add_video(video("v1", &handle), &enabled);
	assert!(handle.hidden.get());

	// The host page rewrote the element's style on its own.
	handle.hidden.set(false);
	channel.refresh();
	assert!(handle.hidden.get());
}
