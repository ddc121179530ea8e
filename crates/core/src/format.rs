use crate::{
    orchestrator::{Interaction, SummaryState},
    types::{SourceText, TranscriptSegment},
};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Format transcript segments with timestamps. With a video URL each timestamp
/// becomes a link that seeks the video to that line.
pub fn format_transcript_with_timestamps(
    segments: &[TranscriptSegment],
    video_url: Option<&str>,
) -> String {
    segments
        .iter()
        .map(|seg| {
            let stamp = format_timestamp(seg.start);
            match video_url.and_then(|url| seg.seek_url(url).ok()) {
                Some(link) => format!("[{}]({}) {}", stamp, link, seg.text.trim()),
                None => format!("[{}] {}", stamp, seg.text.trim()),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_interaction_readable(interaction: &Interaction, video_url: Option<&str>) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", interaction.kind.action_label()));

    output.push_str("## Summary\n\n");
    match &interaction.summary {
        SummaryState::Ready(response) => {
            output.push_str(response.first_text().map(str::trim).unwrap_or("(no summary returned)"));
        }
        SummaryState::Skipped => output.push_str("(nothing to summarize)"),
        SummaryState::Failed(e) => output.push_str(&format!("(summary unavailable: {})", e)),
    }
    output.push_str("\n\n");

    output.push_str("## Source\n\n");
    match &interaction.source {
        SourceText::Plain(text) => output.push_str(text.trim()),
        SourceText::Transcript(segments) => {
            output.push_str(&format_transcript_with_timestamps(segments, video_url))
        }
    }
    output.push('\n');

    output
}
