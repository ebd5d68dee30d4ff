use std::fmt;

use url::Url;

use crate::error::Error;

/// Classification tag for the current YouTube view, derived purely from the
/// tab URL. The site is a single-page application, so this is recomputed on
/// every navigation signal rather than stored anywhere authoritative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PageType {
	Home,
	Video,
	Channel,
}

impl fmt::Display for PageType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let tag = match self {
			PageType::Home => "home",
			PageType::Video => "video",
			PageType::Channel => "channel",
		};
		f.write_str(tag)
	}
}

/// Map an absolute URL to a page type. First match wins; unknown paths fall
/// back to `Home`, which hosts the most conservative scan behavior. A URL
/// that does not parse is the caller's bug and fails loudly.
pub fn classify(url: &str) -> Result<PageType, Error> {
	let parsed = Url::parse(url).map_err(|_| Error::InvalidUrl {
		url: url.to_string(),
	})?;

	let path = parsed.path();
	let page = match path {
		"/" | "/results" | "/feed/trending" => PageType::Home,
		p if p.starts_with("/watch") => PageType::Video,
		p if p.starts_with("/@") => PageType::Channel,
		_ => PageType::Home,
	};
	Ok(page)
}
