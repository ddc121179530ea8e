use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use crate::{
    error::{ElisumError, Result},
    fetch::Fetch,
    types::{CaptionTrackReference, TranscriptSegment},
    xml::{Entry, NormalizedNode, normalize_xml},
};

const CAPTIONS_MARKER: &str = "\"captions\":";
const CAPTIONS_END_MARKER: &str = ",\"videoDetails";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionsBlob {
    player_captions_tracklist_renderer: TracklistRenderer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrackReference>,
}

/// Pull the caption track list out of a video page's embedded player config.
///
/// The blob starts right after `"captions":` and ends before `,"videoDetails`.
/// Without the end marker the first complete JSON value after the start marker is used.
pub fn find_caption_tracks(html: &str) -> Result<Vec<CaptionTrackReference>> {
    let start = html.find(CAPTIONS_MARKER).ok_or_else(|| {
        ElisumError::extraction("page has no captions block (captions disabled or unknown layout)")
    })? + CAPTIONS_MARKER.len();

    let rest = &html[start..];
    let blob = match rest.find(CAPTIONS_END_MARKER) {
        // The whole slice up to the marker must be one JSON value.
        Some(end) => serde_json::from_str::<CaptionsBlob>(&rest[..end].replace('\n', ""))
            .map_err(|e| ElisumError::extraction(format!("captions block is not valid JSON: {e}")))?,
        None => first_json_value(&rest.replace('\n', ""))?,
    };

    Ok(blob.player_captions_tracklist_renderer.caption_tracks)
}

fn first_json_value(candidate: &str) -> Result<CaptionsBlob> {
    match serde_json::Deserializer::from_str(candidate)
        .into_iter::<CaptionsBlob>()
        .next()
    {
        Some(Ok(blob)) => Ok(blob),
        Some(Err(e)) => Err(ElisumError::extraction(format!(
            "captions block is not valid JSON: {e}"
        ))),
        None => Err(ElisumError::extraction("captions block is empty")),
    }
}

/// Only the first listed track is used; there is no language negotiation.
pub fn first_caption_track(html: &str) -> Result<CaptionTrackReference> {
    find_caption_tracks(html)?
        .into_iter()
        .next()
        .ok_or_else(|| ElisumError::extraction("video has no caption tracks"))
}

/// Turn a normalized timed-text document into segments, in document order.
pub fn segments_from_tree(tree: &NormalizedNode) -> Result<Vec<TranscriptSegment>> {
    let transcript = tree
        .at(&["transcript"])
        .ok_or_else(|| ElisumError::malformed("caption document has no <transcript> root"))?;

    let lines = match transcript {
        NormalizedNode::Map(map) => match map.get("text") {
            Some(entry) => entry,
            None => return Ok(Vec::new()),
        },
        NormalizedNode::Text(text) if text.trim().is_empty() => return Ok(Vec::new()),
        NormalizedNode::Text(_) => {
            return Err(ElisumError::malformed(
                "<transcript> holds bare text instead of caption lines",
            ));
        }
    };

    lines
        .nodes()
        .filter_map(|node| match node {
            NormalizedNode::Map(line) => Some(segment_from_line(line)),
            NormalizedNode::Text(text) if text.trim().is_empty() => None,
            NormalizedNode::Text(_) => Some(Err(ElisumError::malformed(
                "caption line without timing attributes",
            ))),
        })
        .collect()
}

fn segment_from_line(line: &BTreeMap<String, Entry>) -> Result<TranscriptSegment> {
    let start = number_attribute(line, "start")?
        .ok_or_else(|| ElisumError::malformed("caption line without a start attribute"))?;
    let duration = number_attribute(line, "dur")?.unwrap_or(0.0);

    let text = line
        .get("text")
        .map(|entry| {
            entry
                .nodes()
                .filter_map(NormalizedNode::as_text)
                .collect::<String>()
        })
        .unwrap_or_default();

    Ok(TranscriptSegment {
        text: decode_caption_text(&text),
        start,
        duration,
    })
}

fn number_attribute(line: &BTreeMap<String, Entry>, name: &str) -> Result<Option<f64>> {
    let Some(entry) = line.get(name) else {
        return Ok(None);
    };

    let raw = entry
        .as_single()
        .and_then(NormalizedNode::as_text)
        .ok_or_else(|| ElisumError::malformed(format!("caption attribute {name} is not a value")))?;

    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| ElisumError::malformed(format!("caption attribute {name}={raw:?}: {e}")))?;
    if !value.is_finite() {
        return Err(ElisumError::malformed(format!(
            "caption attribute {name}={raw:?} is not a finite number"
        )));
    }
    Ok(Some(value))
}

/// Caption text is escaped twice upstream (`&amp;#39;`); undo the second layer when it is valid.
fn decode_caption_text(text: &str) -> String {
    match quick_xml::escape::unescape(text) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => text.to_string(),
    }
}

pub struct TranscriptExtractor<F> {
    fetcher: F,
}

impl<F: Fetch> TranscriptExtractor<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Fetch the raw page (not the rendered DOM), follow its first caption track and
    /// parse the timed text. Every failure is an `Err`; `Ok(vec![])` is an empty track.
    pub async fn extract(&self, video_url: &str) -> Result<Vec<TranscriptSegment>> {
        let html = self.fetcher.fetch_text(video_url).await?;
        let track = first_caption_track(&html)?;
        debug!(base_url = %track.base_url, "selected caption track");

        let xml = self.fetcher.fetch_text(&track.base_url).await?;
        let tree = normalize_xml(&xml)?;
        let segments = segments_from_tree(&tree)?;
        debug!(segments = segments.len(), "parsed transcript");

        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use async_trait::async_trait;

    use super::*;

    const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    struct ScriptedFetcher {
        pages: HashMap<&'static str, &'static str>,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(pages: &[(&'static str, &'static str)]) -> Self {
            Self {
                pages: pages.iter().copied().collect(),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetch for ScriptedFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .map(|body| body.to_string())
                .ok_or_else(|| ElisumError::extraction(format!("could not fetch {url}: 404")))
        }
    }

    const PAGE: &str = r#"<html><script>var ytInitialPlayerResponse = {"playabilityStatus":{},"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"T"}]}},"videoDetails":{}};</script></html>"#;

    const TRACK: &str = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0.08" dur="3.2">never gonna</text><text start="3.28" dur="2.5">give you up</text><text start="5.78" dur="1.9">don&amp;#39;t worry</text></transcript>"#;

    #[tokio::test]
    async fn follows_the_first_caption_track() {
        let fetcher = ScriptedFetcher::new(&[(VIDEO_URL, PAGE), ("T", TRACK)]);
        let extractor = TranscriptExtractor::new(fetcher);

        let segments = extractor.extract(VIDEO_URL).await.unwrap();

        assert_eq!(extractor.fetcher.requested(), vec![VIDEO_URL, "T"]);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].text, "never gonna");
        assert_eq!(segments[0].start, 0.08);
        assert_eq!(segments[1].duration, 2.5);
        assert_eq!(segments[2].text, "don't worry");
    }

    #[tokio::test]
    async fn page_without_captions_is_a_failure_not_an_empty_list() {
        let fetcher = ScriptedFetcher::new(&[(VIDEO_URL, "<html><body>no player</body></html>")]);
        let extractor = TranscriptExtractor::new(fetcher);

        let err = extractor.extract(VIDEO_URL).await.unwrap_err();

        assert!(matches!(err, ElisumError::Extraction { .. }));
        assert_eq!(extractor.fetcher.requested(), vec![VIDEO_URL]);
    }

    #[tokio::test]
    async fn unreachable_track_is_a_failure() {
        let fetcher = ScriptedFetcher::new(&[(VIDEO_URL, PAGE)]);
        let extractor = TranscriptExtractor::new(fetcher);

        assert!(extractor.extract(VIDEO_URL).await.is_err());
    }

    #[test]
    fn empty_track_list_is_an_extraction_error() {
        let html = r#""captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[]}},"videoDetails":{}"#;
        assert!(matches!(
            first_caption_track(html),
            Err(ElisumError::Extraction { .. })
        ));

        let html = r#""captions":{"playerCaptionsTracklistRenderer":{}},"videoDetails":{}"#;
        assert!(find_caption_tracks(html).unwrap().is_empty());
    }

    #[test]
    fn malformed_captions_json_is_an_extraction_error() {
        let html = r#""captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":},"videoDetails":{}"#;
        assert!(matches!(
            find_caption_tracks(html),
            Err(ElisumError::Extraction { .. })
        ));
    }

    #[test]
    fn trailing_junk_before_end_marker_is_an_extraction_error() {
        let html = r#""captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"T"}]}} GARBAGE }}],"videoDetails":{}"#;
        assert!(matches!(
            find_caption_tracks(html),
            Err(ElisumError::Extraction { .. })
        ));
    }

    #[test]
    fn missing_end_marker_parses_the_first_json_value() {
        let html = "\"captions\":{\"playerCaptionsTracklistRenderer\":{\"captionTracks\":[{\"baseUrl\":\"https://www.youtube.com/api/timedtext?v=x\\u0026lang=en\",\"languageCode\":\"en\"},{\"baseUrl\":\"second\"}]}},\"microformat\":{}}";
        let track = first_caption_track(html).unwrap();
        assert_eq!(
            track.base_url,
            "https://www.youtube.com/api/timedtext?v=x&lang=en"
        );
    }

    #[test]
    fn single_line_track_is_handled_like_many() {
        let tree =
            normalize_xml(r#"<transcript><text start="1" dur="2">only</text></transcript>"#)
                .unwrap();
        let segments = segments_from_tree(&tree).unwrap();
        assert_eq!(
            segments,
            vec![TranscriptSegment {
                text: "only".into(),
                start: 1.0,
                duration: 2.0
            }]
        );
    }

    #[test]
    fn whitespace_between_lines_is_skipped() {
        let xml = "<transcript>\n  <text start=\"1\" dur=\"1\">a</text>\n  <text start=\"2\">b</text>\n</transcript>";
        let segments = segments_from_tree(&normalize_xml(xml).unwrap()).unwrap();
        let texts: Vec<_> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, ["a", "b"]);
        assert_eq!(segments[1].duration, 0.0);
    }

    #[test]
    fn empty_transcript_is_an_empty_list() {
        let tree = normalize_xml("<transcript/>").unwrap();
        assert!(segments_from_tree(&tree).unwrap().is_empty());
    }

    #[test]
    fn wrong_root_or_bad_numbers_are_malformed() {
        let tree = normalize_xml("<timedtext><body/></timedtext>").unwrap();
        assert!(matches!(
            segments_from_tree(&tree),
            Err(ElisumError::MalformedResponse { .. })
        ));

        let tree =
            normalize_xml(r#"<transcript><text start="soon">x</text></transcript>"#).unwrap();
        assert!(matches!(
            segments_from_tree(&tree),
            Err(ElisumError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn non_finite_timing_is_malformed() {
        for xml in [
            r#"<transcript><text start="NaN" dur="1">x</text></transcript>"#,
            r#"<transcript><text start="1" dur="inf">x</text></transcript>"#,
            r#"<transcript><text start="-infinity">x</text></transcript>"#,
        ] {
            let tree = normalize_xml(xml).unwrap();
            assert!(
                matches!(
                    segments_from_tree(&tree),
                    Err(ElisumError::MalformedResponse { .. })
                ),
                "{xml}"
            );
        }
    }

    #[test]
    fn invalid_second_escape_layer_is_left_alone() {
        assert_eq!(decode_caption_text("fish &chips"), "fish &chips");
        assert_eq!(decode_caption_text("it&#39;s"), "it's");
    }
}
