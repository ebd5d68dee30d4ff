use std::cell::Cell;
use std::rc::Rc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::cache::{Channel, ChannelCache, Video};
use crate::dom::Dom;
use crate::engine::{EngineTiming, PageHandler};
use crate::error::Error;
use crate::message::{self, MessageChannel, Push, Request, Response};
use crate::page::PageType;
use crate::signal::Signal;
use crate::wait::{wait_for, Waited};

/// The user-curated set of channel names whose videos stay visible.
///
/// Wraps the backing signal so every mutation is a full-value replacement
/// (subscribers never observe a half-edited list) and mirrors each change to
/// the background store over the message channel.
pub struct AllowList {
	channels: Signal<Vec<String>>,
	port: Rc<dyn MessageChannel>,
}

impl AllowList {
	pub fn new(port: Rc<dyn MessageChannel>) -> Self {
		AllowList {
			channels: Signal::new(Vec::new()),
			port,
		}
	}

	pub fn signal(&self) -> &Signal<Vec<String>> {
		&self.channels
	}

	pub fn contains(&self, name: &str) -> bool {
		self.channels
			.try_get()
			.map(|list| list.iter().any(|c| c == name))
			.unwrap_or(false)
	}

	pub fn add(&self, name: &str) {
		if self.contains(name) {
			return;
		}
		let mut next = self.channels.get();
		next.push(name.to_string());
		self.channels.set(next);
		message::send(&self.port, Request::AddChannel(name.to_string()));
	}

	pub fn remove(&self, name: &str) {
		if !self.contains(name) {
			return;
		}
		let next = self
			.channels
			.get()
			.into_iter()
			.filter(|c| c != name)
			.collect();
		self.channels.set(next);
		message::send(&self.port, Request::RemoveChannel(name.to_string()));
	}

	/// Adopt a list pushed from the background store, without echoing it
	/// back.
	pub fn replace(&self, channels: Vec<String>) {
		self.channels.set(channels);
	}

	pub fn export_json(&self) -> Result<String, Error> {
		Ok(serde_json::to_string(&self.channels.try_get()?)?)
	}

	pub fn import_json(&self, json: &str) -> Result<(), Error> {
		let channels: Vec<String> = serde_json::from_str(json)?;
		self.channels.try_set(channels.clone())?;
		message::send(&self.port, Request::SetChannels(channels));
		Ok(())
	}
}

/// Content-script orchestrator: wires the engine, the channel cache, the
/// allow-list and the DOM gateway together. Owns the two cross-cutting
/// signals (allow-list, enabled) and hands them to whoever needs them; there
/// is no ambient global state.
pub struct Extension {
	body: Rc<ExtensionBody>,
}

struct ExtensionBody {
	port: Rc<dyn MessageChannel>,
	dom: Rc<dyn Dom>,
	page: PageHandler,
	cache: ChannelCache,
	allow: AllowList,
	enabled: Signal<bool>,
	injecting: Cell<bool>,
}

impl Extension {
	pub fn new(port: Rc<dyn MessageChannel>, dom: Rc<dyn Dom>, timing: EngineTiming) -> Self {
		Extension {
			body: Rc::new(ExtensionBody {
				page: PageHandler::new(port.clone(), dom.clone(), timing),
				cache: ChannelCache::new(),
				allow: AllowList::new(port.clone()),
				enabled: Signal::new(true),
				injecting: Cell::new(false),
				port,
				dom,
			}),
		}
	}

	pub fn page_handler(&self) -> &PageHandler {
		&self.body.page
	}

	pub fn cache(&self) -> &ChannelCache {
		&self.body.cache
	}

	pub fn allow_list(&self) -> &AllowList {
		&self.body.allow
	}

	pub fn enabled(&self) -> &Signal<bool> {
		&self.body.enabled
	}

	/// Pull persisted state, register every scan routine, then start the
	/// engine. Routines are in place before the first render completes, so
	/// the page-load callbacks observe a fully wired extension.
	pub async fn start(&self) {
		self.body.pull_channels().await;
		self.body.pull_enabled().await;
		self.register_routines();
		self.body.page.start();
	}

	fn register_routines(&self) {
		let page = &self.body.page;

		// First scan immediately after the page settles, then once per tick.
		{
			let body = self.body.clone();
			page.on_page_load(move || {
				ExtensionBody::grab_videos(&body)?;
				body.apply_allow_list();
				Ok(())
			});
		}
		{
			let body = self.body.clone();
			page.on_video_refresh(move || ExtensionBody::grab_videos(&body));
		}
		{
			let body = self.body.clone();
			page.on_video_refresh(move || {
				body.apply_allow_list();
				Ok(())
			});
		}
		{
			let body = self.body.clone();
			page.on_video_refresh(move || {
				body.dom.suppress_shorts();
				Ok(())
			});
		}
		{
			let body = self.body.clone();
			page.on_video_refresh(move || {
				ExtensionBody::inject_header(&body)?;
				ExtensionBody::refresh_channel_badges(&body);
				body.cache.refresh_all();
				Ok(())
			});
		}
	}

	/// Drain background pushes until the channel closes.
	pub async fn run(&self, mut pushes: UnboundedReceiver<Push>) {
		while let Some(push) = pushes.recv().await {
			self.handle_push(push).await;
		}
	}

	pub async fn handle_push(&self, push: Push) {
		match push {
			Push::Update => {
				let body = self.body.clone();
				self.body
					.page
					.refresh_page(move |page, changed| {
						if page == PageType::Channel && changed {
							let body = body.clone();
							tokio::task::spawn_local(async move {
								if let Err(err) = body.page.wait_until_header_loaded().await {
									tracing::warn!(%err, "header injection skipped");
									return;
								}
								if let Err(err) = ExtensionBody::inject_header(&body) {
									tracing::warn!(%err, "header injection skipped");
								}
								ExtensionBody::refresh_channel_badges(&body);
							});
						}
						body.cache.clear();
					})
					.await;
			}
			Push::UpdateChannels => {
				self.body.pull_channels().await;
			}
		}
	}
}

impl ExtensionBody {
	async fn pull_channels(&self) {
		match self.port.request(Request::GetChannels).await {
			Ok(Response::Channels(channels)) => {
				self.allow.replace(channels);
			}
			Ok(other) => {
				tracing::error!(?other, "get-channels answered with the wrong shape");
			}
			Err(err) => {
				tracing::error!(%err, "allow-list fetch failed");
			}
		}
	}

	async fn pull_enabled(&self) {
		match self.port.request(Request::GetEnabled).await {
			Ok(Response::Enabled(enabled)) => {
				if let Err(err) = self.enabled.try_set(enabled) {
					tracing::error!(%err, "enabled flag rejected");
				}
			}
			Ok(other) => {
				tracing::error!(?other, "get-enabled answered with the wrong shape");
			}
			Err(err) => {
				tracing::error!(%err, "enabled flag fetch failed");
			}
		}
	}

	/// Search routine: fold every discovered video element into the cache.
	/// Elements already carrying the injected-marker belong to a live Video
	/// entity and are skipped wholesale.
	fn grab_videos(body: &Rc<Self>) -> Result<(), Error> {
		let page = body.page.page();
		if page == PageType::Video {
			body.dom.hide_spinners();
		}

		for found in body.dom.discover(page) {
			if found.channel_name.is_empty() {
				tracing::debug!(video = %found.id, "discovery without a channel name");
				continue;
			}
			if found.handle.marked_injected() {
				continue;
			}

			let listed = body.allow.contains(&found.channel_name);
			let channel = body.cache.add_channel(Channel::new(
				&found.channel_name,
				&found.channel_name,
				!listed,
			));

			let toggle = Self::video_toggle(body, &channel);
			let video = Video::new(found.id, found.title, found.is_short, found.handle, toggle);
			channel.add_video(video, &body.enabled);
		}
		Ok(())
	}

	fn video_toggle(body: &Rc<Self>, channel: &Rc<Channel>) -> Rc<dyn Fn()> {
		let body = body.clone();
		let channel = channel.clone();
		Rc::new(move || {
			let name = channel.name().to_string();
			if body.allow.contains(&name) {
				body.allow.remove(&name);
				channel.disable();
			} else {
				body.allow.add(&name);
				channel.enable();
			}
		})
	}

	/// Disable routine: channel state is re-derived from the allow-list on
	/// every tick. Equality gating makes the steady state free; real changes
	/// fan out through each channel's signal.
	fn apply_allow_list(&self) {
		for channel in self.cache.channels() {
			channel.set_disabled(!self.allow.contains(channel.name()));
		}
	}

	fn inject_header(body: &Rc<Self>) -> Result<(), Error> {
		if !body.dom.header_buttons_ready() {
			return Ok(());
		}
		if body.dom.toggle_injected() {
			return Ok(());
		}
		let on_toggle = {
			let body = body.clone();
			Rc::new(move |enabled: bool| {
				if let Err(err) = body.enabled.try_set(enabled) {
					tracing::error!(%err, "enabled flag rejected");
					return;
				}
				message::send(&body.port, Request::SetEnabled(enabled));
			})
		};
		body.dom.inject_toggle(&body.enabled, on_toggle)
	}

	/// Channel-page badge upkeep. The warm path (badge exists) is synchronous:
	/// trim duplicates, correct a stale recorded name, re-label. The cold
	/// path waits for the injection point and is spawned, guarded so only
	/// one injection attempt is in flight.
	fn refresh_channel_badges(body: &Rc<Self>) {
		if body.page.page() != PageType::Channel {
			return;
		}
		let Some(name) = body.dom.channel_page_name() else {
			tracing::debug!("channel name not rendered yet");
			return;
		};

		let badges = body.dom.channel_badges();
		if !badges.is_empty() {
			if badges.len() >= 2 {
				tracing::warn!(count = badges.len(), "duplicate channel badges, trimming");
				for badge in &badges[1..] {
					badge.remove();
				}
			}
			let badge = &badges[0];
			match badge.recorded_channel() {
				Some(recorded) if recorded != name => {
					tracing::warn!(
						expected = %recorded,
						got = %name,
						"channel badge name mismatch, correcting"
					);
					badge.record_channel(&name);
				}
				None => badge.record_channel(&name),
				_ => {}
			}
			badge.set_listed(body.allow.contains(&name));
			return;
		}

		if body.injecting.replace(true) {
			return;
		}
		let body = body.clone();
		tokio::task::spawn_local(async move {
			if let Err(err) = Self::inject_new_badge(&body, name).await {
				tracing::warn!(%err, "channel badge injection skipped this cycle");
			}
			body.injecting.set(false);
		});
	}

	async fn inject_new_badge(body: &Rc<Self>, name: String) -> Result<(), Error> {
		let outcome = wait_for(
			"channel badge injection point",
			body.page.timing().bounded_wait(),
			{
				let dom = body.dom.clone();
				move || dom.injection_point_ready().then_some(())
			},
			{
				let page = body.page.clone();
				move || page.page() != PageType::Channel
			},
		)
		.await?;
		if matches!(outcome, Waited::Cancelled) {
			return Ok(());
		}

		let listed = body.allow.contains(&name);
		let on_toggle = {
			let body = body.clone();
			Rc::new(move |channel: String| {
				body.toggle_listing(&channel);
			})
		};
		body.dom.inject_channel_badge(&name, listed, on_toggle)
	}

	fn toggle_listing(&self, name: &str) {
		if self.allow.contains(name) {
			self.allow.remove(name);
			if let Some(channel) = self.cache.find(name) {
				channel.disable();
			}
		} else {
			self.allow.add(name);
			if let Some(channel) = self.cache.find(name) {
				channel.enable();
			}
		}
	}
}
