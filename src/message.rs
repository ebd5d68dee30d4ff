use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::error::Error;

/// Request half of the background/service-worker protocol. Each request is
/// answered by exactly one [`Response`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
	GetPage,
	GetChannels,
	SetChannels(Vec<String>),
	AddChannel(String),
	RemoveChannel(String),
	GetEnabled,
	SetEnabled(bool),
}

impl Request {
	pub fn kind(&self) -> &'static str {
		match self {
			Request::GetPage => "get-page",
			Request::GetChannels => "get-channels",
			Request::SetChannels(_) => "set-channels",
			Request::AddChannel(_) => "add-channel",
			Request::RemoveChannel(_) => "remove-channel",
			Request::GetEnabled => "get-enabled",
			Request::SetEnabled(_) => "set-enabled",
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
	/// Current tab URL; the content side classifies it into a [`crate::PageType`].
	Page { url: String },
	Channels(Vec<String>),
	Enabled(bool),
	Ack,
}

/// Fire-and-forget notifications pushed from the background side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Push {
	/// The tab navigated; re-check the page type.
	Update,
	/// The persisted allow-list changed; re-fetch it.
	UpdateChannels,
}

/// Boundary to the extension's background script. Implementations wrap the
/// browser runtime messaging APIs; a disconnected receiver surfaces as
/// [`Error::NoReceiver`], which callers treat as "no-op, try again next
/// tick".
pub trait MessageChannel {
	fn request(&self, request: Request) -> LocalBoxFuture<'static, Result<Response, Error>>;
}

/// Send a request whose response nobody waits for. Failures are logged and
/// swallowed; the next scan tick retries whatever needed this.
pub fn send(port: &Rc<dyn MessageChannel>, request: Request) {
	let kind = request.kind();
	let fut = port.request(request);
	tokio::task::spawn_local(async move {
		if let Err(err) = fut.await {
			tracing::error!(%err, kind, "message dropped");
		}
	});
}
