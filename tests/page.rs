use tubesift::{classify, Error, PageType};

#[test]
fn classifies_known_paths() {
	assert_eq!(classify("https://www.youtube.com/").unwrap(), PageType::Home);
	assert_eq!(
		classify("https://www.youtube.com/watch?v=abc12345678").unwrap(),
		PageType::Video
	);
	assert_eq!(
		classify("https://www.youtube.com/@SomeChannel").unwrap(),
		PageType::Channel
	);
	assert_eq!(
		classify("https://www.youtube.com/feed/trending").unwrap(),
		PageType::Home
	);
	assert_eq!(classify("https://example.com/").unwrap(), PageType::Home);
}

#[test]
fn search_results_are_home() {
	assert_eq!(
		classify("https://www.youtube.com/results?search_query=rust").unwrap(),
		PageType::Home
	);
}

#[test]
fn channel_tab_paths_stay_channel() {
	assert_eq!(
		classify("https://www.youtube.com/@SomeChannel/videos").unwrap(),
		PageType::Channel
	);
	assert_eq!(
		classify("https://www.youtube.com/@SomeChannel/shorts").unwrap(),
		PageType::Channel
	);
}

#[test]
fn unknown_paths_fall_back_to_home() {
	assert_eq!(
		classify("https://www.youtube.com/feed/subscriptions").unwrap(),
		PageType::Home
	);
	assert_eq!(
		classify("https://www.youtube.com/shorts/abc").unwrap(),
		PageType::Home
	);
}

#[test]
fn selector_table_exposes_the_injection_roles() {
	use tubesift::selectors::YOUTUBE;

	// DOM gateways grep for these two ids to keep injection idempotent.
	assert_eq!(YOUTUBE.channel.badge_id, "wt-add");
	assert_eq!(YOUTUBE.header.toggle_id, "wt-toggle");
	assert!(!YOUTUBE.home.video_card.is_empty());
	assert!(!YOUTUBE.watch.video_card.is_empty());
}

#[test]
fn malformed_urls_fail_loudly() {
	assert!(matches!(
		classify("not a url"),
		Err(Error::InvalidUrl { .. })
	));
	assert!(matches!(
		classify("/watch?v=abc"),
		Err(Error::InvalidUrl { .. })
	));
}
