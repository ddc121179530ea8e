//! Encyclopedia article → cleaned prose.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::{
    error::{ElisumError, Result},
    fetch::Fetch,
    page::PageContext,
};

const CONTENT_CONTAINER: &str = "#bodyContent";

/// Elements that never carry article prose.
const NON_CONTENT_SELECTORS: &[&str] = &[
    "style",
    "noscript",
    "script",
    ".reflist",
    "#toc",
    "table.sidebar",
    r#"[style*="display:none"]"#,
    r#"[style*="display: none"]"#,
    ".printfooter",
    "#siteSub",
    ".mw-jump-link",
    ".hatnote",
    "#mw-normal-catlinks",
    "#mw-hidden-catlinks",
];

static TRAILING_SECTION_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(See also|References|Conferences|Journals|Software|Sources|Further reading|External links)",
    )
    .expect("valid section title pattern")
});

static INLINE_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[edit\]|\[[0-9]+\]").expect("valid marker pattern"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css}: {e:?}"))
}

/// Remove `[edit]` links and numeric footnote markers, then trim. Idempotent.
pub fn clean_text(text: &str) -> String {
    INLINE_MARKERS.replace_all(text, "").trim().to_string()
}

/// Extract cleaned article text from a rendered article page.
///
/// The content container is copied into a detached working tree before pruning, so
/// `page_html` itself is never touched.
pub fn extract_article(page_html: &str) -> Result<String> {
    let page = Html::parse_document(page_html);
    let container = page
        .select(&selector(CONTENT_CONTAINER))
        .next()
        .ok_or_else(|| ElisumError::extraction("page has no #bodyContent article container"))?;

    let mut working = Html::parse_fragment(&container.inner_html());

    let removed = remove_non_content(&mut working);
    let sections = remove_trailing_sections(&mut working);
    debug!(removed, sections, "pruned article tree");

    let text: String = working.root_element().text().collect();
    Ok(clean_text(&text))
}

fn remove_non_content(tree: &mut Html) -> usize {
    let mut removed = 0;
    for css in NON_CONTENT_SELECTORS {
        let sel = selector(css);
        let ids: Vec<_> = tree.root_element().select(&sel).map(|el| el.id()).collect();
        for id in ids {
            if let Some(mut node) = tree.tree.get_mut(id) {
                node.detach();
                removed += 1;
            }
        }
    }
    removed
}

/// Drop boilerplate sections ("References", "External links", ...) wherever they sit:
/// every element sibling after a matching `h2`, up to the next `h2`, plus the heading.
fn remove_trailing_sections(tree: &mut Html) -> usize {
    let headings: Vec<_> = tree
        .root_element()
        .select(&selector("h2"))
        .map(|el| el.id())
        .collect();

    let mut removed_sections = 0;
    for heading_id in headings {
        let Some(heading) = tree.tree.get(heading_id).and_then(ElementRef::wrap) else {
            continue;
        };

        let title: String = heading.text().collect();
        let title = title.trim();
        if title.is_empty() || !TRAILING_SECTION_TITLE.is_match(title) {
            continue;
        }

        let doomed: Vec<_> = heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .take_while(|el| !el.value().name().eq_ignore_ascii_case("h2"))
            .map(|el| el.id())
            .chain(std::iter::once(heading_id))
            .collect();

        for id in doomed {
            if let Some(mut node) = tree.tree.get_mut(id) {
                node.detach();
            }
        }
        removed_sections += 1;
    }
    removed_sections
}

pub struct ArticleExtractor<F> {
    fetcher: F,
}

impl<F: Fetch> ArticleExtractor<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Use the host's rendered HTML when it has one, otherwise fetch the article.
    pub async fn extract(&self, page: &PageContext) -> Result<String> {
        if let Some(html) = &page.html {
            return extract_article(html);
        }

        let url = page
            .url
            .as_deref()
            .ok_or_else(|| ElisumError::extraction("article page has neither HTML nor a URL"))?;
        let html = self.fetcher.fetch_text(url).await?;
        extract_article(&html)
    }
}
