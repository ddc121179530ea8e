//! Page-kind dispatch: pick the extractor registered for the active page, then summarize.
//!
//! Handlers are handed to the builder explicitly; nothing listens on ambient globals.

use std::collections::HashMap;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::{
    article::ArticleExtractor,
    error::{ElisumError, Result},
    fetch::Fetch,
    page::{PageContext, PageKind},
    selection::extract_selection,
    summarize::Summarizer,
    transcript::TranscriptExtractor,
    types::{SourceText, SummaryResponse},
};

#[async_trait]
pub trait PageHandler: Send + Sync {
    async fn extract(&self, page: &PageContext) -> Result<SourceText>;
}

pub struct TranscriptHandler<F> {
    extractor: TranscriptExtractor<F>,
}

impl<F: Fetch> TranscriptHandler<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            extractor: TranscriptExtractor::new(fetcher),
        }
    }
}

#[async_trait]
impl<F: Fetch> PageHandler for TranscriptHandler<F> {
    async fn extract(&self, page: &PageContext) -> Result<SourceText> {
        let url = page
            .url
            .as_deref()
            .ok_or_else(|| ElisumError::extraction("video page has no URL"))?;
        Ok(SourceText::Transcript(self.extractor.extract(url).await?))
    }
}

pub struct ArticleHandler<F> {
    extractor: ArticleExtractor<F>,
}

impl<F: Fetch> ArticleHandler<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            extractor: ArticleExtractor::new(fetcher),
        }
    }
}

#[async_trait]
impl<F: Fetch> PageHandler for ArticleHandler<F> {
    async fn extract(&self, page: &PageContext) -> Result<SourceText> {
        Ok(SourceText::Plain(self.extractor.extract(page).await?))
    }
}

pub struct SelectionHandler;

#[async_trait]
impl PageHandler for SelectionHandler {
    async fn extract(&self, page: &PageContext) -> Result<SourceText> {
        Ok(SourceText::Plain(extract_selection(page)))
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SummaryState {
    /// Nothing was extracted, so the relay was not called.
    Skipped,
    Ready(SummaryResponse),
    Failed(#[serde(serialize_with = "serialize_error")] ElisumError),
}

fn serialize_error<S: Serializer>(err: &ElisumError, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(err)
}

/// Outcome of one popup-style interaction. The source is kept even when summarizing failed.
#[derive(Debug, Serialize)]
pub struct Interaction {
    pub kind: PageKind,
    pub source: SourceText,
    pub summary: SummaryState,
}

impl Interaction {
    pub fn summary_text(&self) -> Option<&str> {
        match &self.summary {
            SummaryState::Ready(response) => response.first_text(),
            _ => None,
        }
    }
}

fn validate(registrations: &[(PageKind, Box<dyn PageHandler>)]) -> AnyResult<()> {
    use std::collections::HashSet;

    anyhow::ensure!(!registrations.is_empty(), "no page handlers registered");

    let mut seen: HashSet<PageKind> = HashSet::new();
    for (kind, _) in registrations {
        if !seen.insert(*kind) {
            anyhow::bail!("duplicate handler for page kind={kind}");
        }
    }
    Ok(())
}

pub struct OrchestratorBuilder {
    summarizer: Box<dyn Summarizer>,
    registrations: Vec<(PageKind, Box<dyn PageHandler>)>,
}

impl OrchestratorBuilder {
    pub fn new(summarizer: impl Summarizer + 'static) -> Self {
        Self {
            summarizer: Box::new(summarizer),
            registrations: Vec::new(),
        }
    }

    pub fn register(mut self, kind: PageKind, handler: impl PageHandler + 'static) -> Self {
        self.registrations.push((kind, Box::new(handler)));
        self
    }

    pub fn build(self) -> AnyResult<Orchestrator> {
        validate(&self.registrations)?;

        Ok(Orchestrator {
            handlers: self.registrations.into_iter().collect(),
            summarizer: self.summarizer,
        })
    }
}

pub struct Orchestrator {
    handlers: HashMap<PageKind, Box<dyn PageHandler>>,
    summarizer: Box<dyn Summarizer>,
}

impl Orchestrator {
    pub fn builder(summarizer: impl Summarizer + 'static) -> OrchestratorBuilder {
        OrchestratorBuilder::new(summarizer)
    }

    /// Registry with the three stock handlers sharing one fetcher.
    pub fn standard<F>(fetcher: F, summarizer: impl Summarizer + 'static) -> AnyResult<Self>
    where
        F: Fetch + Clone + 'static,
    {
        Self::builder(summarizer)
            .register(PageKind::Youtube, TranscriptHandler::new(fetcher.clone()))
            .register(PageKind::Wikipedia, ArticleHandler::new(fetcher))
            .register(PageKind::Selection, SelectionHandler)
            .build()
    }

    pub fn handles(&self, kind: PageKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Extract first, then summarize; the two never overlap.
    pub async fn run(&self, page: &PageContext) -> Result<Interaction> {
        let kind = page.kind();
        let handler = self.handlers.get(&kind).ok_or_else(|| {
            ElisumError::extraction(format!("no handler registered for {kind} pages"))
        })?;

        debug!(%kind, "extracting page content");
        let source = handler.extract(page).await?;

        if source.is_empty() {
            debug!(%kind, "nothing extracted, skipping summary");
            return Ok(Interaction {
                kind,
                source,
                summary: SummaryState::Skipped,
            });
        }

        let summary = match self.summarizer.summarize(&source.plain_text()).await {
            Ok(response) => SummaryState::Ready(response),
            Err(e) => {
                warn!(%kind, error = %e, "summarization failed, keeping source text");
                SummaryState::Failed(e)
            }
        };

        Ok(Interaction {
            kind,
            source,
            summary,
        })
    }
}
