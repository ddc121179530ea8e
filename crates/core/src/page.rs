use serde::Serialize;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Youtube,
    Wikipedia,
    Selection,
}

impl PageKind {
    /// Anything that is not a YouTube or English Wikipedia page falls back to the selection.
    pub fn detect(url: Option<&str>) -> Self {
        let Some(host) = url
            .and_then(|u| Url::parse(u).ok())
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        else {
            return PageKind::Selection;
        };

        if host == "youtube.com" || host.ends_with(".youtube.com") {
            PageKind::Youtube
        } else if host == "en.wikipedia.org" {
            PageKind::Wikipedia
        } else {
            PageKind::Selection
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PageKind::Youtube => "YouTube",
            PageKind::Wikipedia => "Wikipedia",
            PageKind::Selection => "selection",
        }
    }

    pub fn action_label(&self) -> &'static str {
        match self {
            PageKind::Youtube => "Parse YouTube transcript",
            PageKind::Wikipedia => "Parse Wikipedia article",
            PageKind::Selection => "Parse from text selection",
        }
    }
}

impl std::fmt::Display for PageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What the host knows about the active page.
#[derive(Clone, Debug, Default)]
pub struct PageContext {
    pub url: Option<String>,
    /// Already-rendered DOM, when the host has it.
    pub html: Option<String>,
    pub selection: Option<String>,
}

impl PageContext {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn for_selection(text: impl Into<String>) -> Self {
        Self {
            selection: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn kind(&self) -> PageKind {
        PageKind::detect(self.url.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_youtube_hosts() {
        for url in [
            "https://www.youtube.com/watch?v=abc",
            "https://youtube.com/watch?v=abc",
            "https://m.YouTube.com/watch?v=abc",
        ] {
            assert_eq!(PageKind::detect(Some(url)), PageKind::Youtube, "{url}");
        }
    }

    #[test]
    fn detects_english_wikipedia_only() {
        assert_eq!(
            PageKind::detect(Some("https://en.wikipedia.org/wiki/Rust")),
            PageKind::Wikipedia
        );
        assert_eq!(
            PageKind::detect(Some("https://de.wikipedia.org/wiki/Rust")),
            PageKind::Selection
        );
    }

    #[test]
    fn lookalike_hosts_and_garbage_fall_back_to_selection() {
        for url in [
            Some("https://notyoutube.com/watch"),
            Some("https://example.com/?q=youtube.com"),
            Some("not a url"),
            None,
        ] {
            assert_eq!(PageKind::detect(url), PageKind::Selection, "{url:?}");
        }
    }

    #[test]
    fn labels() {
        assert_eq!(PageKind::Youtube.action_label(), "Parse YouTube transcript");
        assert_eq!(
            PageContext::for_url("https://en.wikipedia.org/wiki/X").kind(),
            PageKind::Wikipedia
        );
        assert_eq!(PageContext::for_selection("x").kind(), PageKind::Selection);
    }
}
