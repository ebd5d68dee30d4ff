use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::dom::Dom;
use crate::error::Error;
use crate::message::{MessageChannel, Request, Response};
use crate::page::{classify, PageType};
use crate::wait::{wait_for, WaitSettings, Waited};

/// Callback registered on the engine. Errors are isolated per callback:
/// logged, never fatal to the remaining callbacks or the loop itself.
pub type Hook = Rc<dyn Fn() -> Result<(), Error>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineId(u64);

#[derive(Clone, Copy, Debug)]
struct EngineInstance {
	engine: EngineId,
	page: PageType,
}

#[derive(Clone, Copy, Debug)]
pub struct EngineTiming {
	/// Interval between DOM polls while waiting for content to appear.
	pub poll: Duration,
	/// Interval between scan ticks once the page is up. Shorter than
	/// `poll`: re-scanning a live page is cheap, waiting on a cold one is
	/// not.
	pub tick: Duration,
	/// Attempt budget for bounded waits.
	pub max_attempts: u32,
}

impl Default for EngineTiming {
	fn default() -> Self {
		EngineTiming {
			poll: Duration::from_millis(250),
			tick: Duration::from_millis(50),
			max_attempts: 50,
		}
	}
}

impl EngineTiming {
	pub fn bounded_wait(&self) -> WaitSettings {
		WaitSettings::bounded(self.poll, self.max_attempts)
	}

	pub fn indefinite_wait(&self) -> WaitSettings {
		WaitSettings::indefinite(self.poll)
	}
}

/// The page-synchronization engine.
///
/// Owns the current page-type, waits for the first meaningful render, then
/// runs one scan loop per page incarnation: every tick re-invokes the
/// registered refresh callbacks so consumers rediscover whatever the SPA
/// re-rendered since the last tick.
///
/// Collision rule: engine instances are tokened and registered per page
/// type; when two instances exist for the same page type, the newer one
/// wins and the older exits at the start of its next tick, before invoking
/// any callback.
///
/// Spawns onto the current-thread runtime; callers must be inside a
/// `tokio::task::LocalSet`.
#[derive(Clone)]
pub struct PageHandler {
	body: Rc<HandlerBody>,
}

struct HandlerBody {
	page: Cell<PageType>,
	page_loaded: Cell<bool>,
	next_engine: Cell<u64>,
	instances: RefCell<Vec<EngineInstance>>,
	on_page_load: RefCell<Vec<Hook>>,
	on_video_refresh: RefCell<Vec<Hook>>,
	port: Rc<dyn MessageChannel>,
	dom: Rc<dyn Dom>,
	timing: EngineTiming,
}

impl PageHandler {
	pub fn new(port: Rc<dyn MessageChannel>, dom: Rc<dyn Dom>, timing: EngineTiming) -> Self {
		PageHandler {
			body: Rc::new(HandlerBody {
				page: Cell::new(PageType::Home),
				page_loaded: Cell::new(false),
				next_engine: Cell::new(0),
				instances: RefCell::new(Vec::new()),
				on_page_load: RefCell::new(Vec::new()),
				on_video_refresh: RefCell::new(Vec::new()),
				port,
				dom,
				timing,
			}),
		}
	}

	pub fn page(&self) -> PageType {
		self.body.page.get()
	}

	pub fn is_page_loading(&self) -> bool {
		!self.body.page_loaded.get()
	}

	pub fn timing(&self) -> EngineTiming {
		self.body.timing
	}

	/// Number of registered engine instances. Steady state is one; a second
	/// appears only transiently around page transitions.
	pub fn active_engines(&self) -> usize {
		self.body.instances.borrow().len()
	}

	/// Runs once, when the first meaningful render of a page completes, in
	/// registration order, before any refresh callback for that page.
	pub fn on_page_load(&self, hook: impl Fn() -> Result<(), Error> + 'static) {
		self.body.on_page_load.borrow_mut().push(Rc::new(hook));
	}

	/// Runs on every scan tick while the page is up, in registration order.
	pub fn on_video_refresh(&self, hook: impl Fn() -> Result<(), Error> + 'static) {
		self.body.on_video_refresh.borrow_mut().push(Rc::new(hook));
	}

	/// Query the current page type and kick off the first-render wait.
	pub fn start(&self) {
		let body = self.body.clone();
		tokio::task::spawn_local(async move {
			match HandlerBody::fetch_page(&body).await {
				Ok(page) => {
					body.page.set(page);
					tracing::info!(%page, "page classified");
					HandlerBody::first_render(body).await;
				}
				Err(err) => {
					tracing::error!(%err, "initial page query failed");
				}
			}
		});
	}

	/// Re-query the page type. On a real navigation the running loop is torn
	/// down and the first-render wait restarts for the new page. `callback`
	/// always receives the fresh page type plus whether it actually changed,
	/// so callers can tell a same-page refresh from a navigation.
	pub async fn refresh_page(&self, callback: impl FnOnce(PageType, bool)) {
		match HandlerBody::fetch_page(&self.body).await {
			Ok(page) => {
				let changed = page != self.body.page.get();
				if changed {
					self.body.page_loaded.set(false);
					self.body.page.set(page);
					tokio::task::spawn_local(HandlerBody::first_render(self.body.clone()));
				}
				callback(page, changed);
			}
			Err(err) => {
				tracing::warn!(%err, "page refresh skipped");
			}
		}
	}

	/// Bounded wait for the site header and its buttons region. Degrades on
	/// timeout: the caller skips its injection for this cycle.
	pub async fn wait_until_header_loaded(&self) -> Result<(), Error> {
		let page = self.body.page.get();
		let settings = self.body.timing.bounded_wait();

		let found = wait_for(
			"header container",
			settings,
			{
				let dom = self.body.dom.clone();
				move || dom.header_ready().then_some(())
			},
			{
				let body = self.body.clone();
				move || body.page.get() != page
			},
		)
		.await?;
		if matches!(found, Waited::Cancelled) {
			return Ok(());
		}

		wait_for(
			"header buttons",
			settings,
			{
				let dom = self.body.dom.clone();
				move || dom.header_buttons_ready().then_some(())
			},
			{
				let body = self.body.clone();
				move || body.page.get() != page
			},
		)
		.await?;
		Ok(())
	}
}

impl HandlerBody {
	async fn fetch_page(body: &Rc<Self>) -> Result<PageType, Error> {
		match body.port.request(Request::GetPage).await? {
			Response::Page { url } => classify(&url),
			other => {
				tracing::error!(?other, "get-page answered with the wrong shape");
				Err(Error::UnexpectedResponse { request: "get-page" })
			}
		}
	}

	/// WaitingForFirstRender: poll until the page-type-specific content
	/// predicate passes. Indefinite on purpose; navigating away mid-wait is
	/// the only exit besides success.
	async fn first_render(body: Rc<Self>) {
		let page = body.page.get();

		let outcome = wait_for(
			"first meaningful render",
			body.timing.indefinite_wait(),
			{
				let dom = body.dom.clone();
				move || dom.content_present(page).then_some(())
			},
			{
				let body = body.clone();
				move || body.page.get() != page
			},
		)
		.await;

		match outcome {
			Ok(Waited::Found(())) => {}
			Ok(Waited::Cancelled) => {
				tracing::debug!(%page, "render wait cancelled by navigation");
				return;
			}
			Err(err) => {
				tracing::warn!(%err, %page, "render wait gave up");
				return;
			}
		}

		body.page_loaded.set(true);
		Self::run_hooks(&body, &body.on_page_load, "page-load", page);
		Self::engine(body).await;
	}

	fn run_hooks(body: &Rc<Self>, hooks: &RefCell<Vec<Hook>>, stage: &str, page: PageType) {
		let hooks: Vec<Hook> = hooks.borrow().iter().cloned().collect();
		for hook in hooks {
			if body.page.get() != page {
				return;
			}
			if let Err(err) = (*hook)() {
				tracing::warn!(%err, stage, "callback failed, continuing");
			}
		}
	}

	async fn engine(body: Rc<Self>) {
		let page = body.page.get();
		let engine = EngineId(body.next_engine.get());
		body.next_engine.set(engine.0 + 1);
		body.instances
			.borrow_mut()
			.push(EngineInstance { engine, page });
		tracing::debug!(%page, engine = engine.0, "engine started");

		loop {
			if !body.page_loaded.get() {
				break;
			}
			if body.page.get() != page {
				break;
			}
			if body.superseded(engine, page) {
				tracing::debug!(%page, engine = engine.0, "superseded by a newer engine");
				break;
			}
			Self::run_hooks(&body, &body.on_video_refresh, "video-refresh", page);
			tokio::time::sleep(body.timing.tick).await;
		}

		body.instances.borrow_mut().retain(|i| i.engine != engine);
		tracing::debug!(%page, engine = engine.0, "engine stopped");
	}

	fn superseded(&self, engine: EngineId, page: PageType) -> bool {
		self.instances
			.borrow()
			.iter()
			.any(|i| i.page == page && i.engine.0 > engine.0)
	}
}
