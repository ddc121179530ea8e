//! EliSum Core Library
//!
//! Pulls readable text out of a page (video transcript, encyclopedia article or the
//! user's selection) and hands it to a summarization relay.

pub mod article;
pub mod config;
pub mod error;
pub mod fetch;
pub mod format;
pub mod orchestrator;
pub mod page;
pub mod selection;
pub mod summarize;
pub mod transcript;
pub mod types;
pub mod xml;

// Re-export commonly used items at crate root
pub use article::{ArticleExtractor, clean_text, extract_article};
pub use config::{ClientConfig, ConfigError};
pub use error::{ElisumError, Result};
pub use fetch::{Fetch, HttpFetcher};
pub use format::{format_interaction_readable, format_timestamp, format_transcript_with_timestamps};
pub use orchestrator::{
    ArticleHandler, Interaction, Orchestrator, OrchestratorBuilder, PageHandler, SelectionHandler,
    SummaryState, TranscriptHandler,
};
pub use page::{PageContext, PageKind};
pub use selection::{SelectionSource, extract_selection};
pub use summarize::{RelayClient, Summarizer};
pub use transcript::{TranscriptExtractor, find_caption_tracks, segments_from_tree};
pub use types::{SourceText, SummaryChoice, SummaryResponse, TranscriptSegment};
pub use xml::{Entry, NormalizedNode, normalize_xml};
