//! Selector configuration for the target site's markup.
//!
//! Pure data: logical roles mapped to literal tag names, element ids and
//! class strings. [`Dom`](crate::Dom) implementations read this table; the
//! engine and cache never do, so a markup change on the site is an edit
//! here, never in the scan logic.

#[derive(Clone, Copy, Debug)]
pub struct Anchor {
	pub tag: &'static str,
	pub id: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct Classed {
	pub tag: &'static str,
	pub class: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct HomeSelectors {
	pub container: &'static str,
	pub video_card: &'static str,
	pub title_anchor: Anchor,
	pub shorts_shelf: Classed,
}

#[derive(Clone, Copy, Debug)]
pub struct WatchSelectors {
	pub container: &'static str,
	pub video_card: &'static str,
	pub spinner: &'static str,
	pub video_link: Classed,
	pub title_anchor: Anchor,
	pub channel_container: &'static str,
	pub channel_tag: &'static str,
	pub channel_link_container: &'static str,
	pub channel_link: Classed,
}

#[derive(Clone, Copy, Debug)]
pub struct ChannelSelectors {
	pub name_container: &'static str,
	pub name_tag: &'static str,
	pub inject_container: &'static str,
	pub inject_spot: &'static str,
	pub inject_styles: &'static str,
	pub badge_id: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct HeaderSelectors {
	pub container: Anchor,
	pub buttons: Anchor,
	pub inject_id: &'static str,
	pub toggle_id: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct Selectors {
	pub home: HomeSelectors,
	pub watch: WatchSelectors,
	pub channel: ChannelSelectors,
	pub header: HeaderSelectors,
}

pub const YOUTUBE: Selectors = Selectors {
	home: HomeSelectors {
		container: "ytd-rich-grid-renderer",
		video_card: "ytd-rich-item-renderer",
		title_anchor: Anchor {
			tag: "a",
			id: "video-title-link",
		},
		shorts_shelf: Classed {
			tag: "ytd-rich-section-renderer",
			class: "style-scope ytd-rich-grid-renderer",
		},
	},
	watch: WatchSelectors {
		container: "ytd-watch-next-secondary-results-renderer",
		video_card: "ytd-compact-video-renderer",
		spinner: "ytd-continuation-item-renderer",
		video_link: Classed {
			tag: "a",
			class: "yt-simple-endpoint style-scope ytd-compact-video-renderer",
		},
		title_anchor: Anchor {
			tag: "span",
			id: "video-title",
		},
		channel_container: "ytd-channel-name",
		channel_tag: "yt-formatted-string",
		channel_link_container: "dismissible",
		channel_link: Classed {
			tag: "a",
			class: "yt-simple-endpoint style-scope ytd-compact-video-renderer",
		},
	},
	channel: ChannelSelectors {
		name_container: "yt-dynamic-text-view-model",
		name_tag: "span",
		inject_container: "yt-flexible-actions-view-model",
		inject_spot: "yt-subscribe-button-view-model",
		inject_styles: "align-items: center; gap: 8px;",
		badge_id: "wt-add",
	},
	header: HeaderSelectors {
		container: Anchor {
			tag: "ytd-masthead",
			id: "masthead",
		},
		buttons: Anchor {
			tag: "div",
			id: "end",
		},
		inject_id: "buttons",
		toggle_id: "wt-toggle",
	},
};
