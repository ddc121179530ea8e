use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ElisumError, Result};

/// One timed caption line, in the order the caption track lists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

impl TranscriptSegment {
    /// The video URL with `t` set to this segment's start, in whole seconds.
    pub fn seek_url(&self, video_url: &str) -> Result<Url> {
        let mut url = Url::parse(video_url)
            .map_err(|e| ElisumError::extraction(format!("invalid video URL {video_url}: {e}")))?;

        let seconds = self.start.max(0.0).floor() as u64;
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "t")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("t", &seconds.to_string());

        Ok(url)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrackReference {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub choices: Vec<SummaryChoice>,

    /// Everything else the upstream completion returned, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryChoice {
    pub text: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SummaryResponse {
    pub fn first_text(&self) -> Option<&str> {
        self.choices.first().map(|choice| choice.text.as_str())
    }
}

/// What an extractor produced for the active page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum SourceText {
    Plain(String),
    Transcript(Vec<TranscriptSegment>),
}

impl SourceText {
    /// Text sent to the summarizer. Transcript lines are joined with single spaces.
    pub fn plain_text(&self) -> String {
        match self {
            SourceText::Plain(text) => text.clone(),
            SourceText::Transcript(segments) => segments
                .iter()
                .map(|seg| seg.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Zero-length only. Whitespace still counts as text to summarize.
    pub fn is_empty(&self) -> bool {
        match self {
            SourceText::Plain(text) => text.is_empty(),
            SourceText::Transcript(segments) => segments.is_empty(),
        }
    }
}
