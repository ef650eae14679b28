use html_escape::decode_html_entities;
use serde::Serialize;

use crate::transcript::TranscriptLine;
use crate::video_id::VideoId;

/// Caption text as YouTube serves it is HTML-escaped, sometimes twice.
pub fn clean_caption_text(raw: &str) -> String {
    decode_html_entities(raw)
        .replace("&#39;", "'")
        .trim()
        .to_string()
}

/// Rounds a timestamp to centiseconds. Exact halves go to the even neighbour.
pub fn round_seconds(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Success body of `/transcript`.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptPayload {
    pub success: bool,
    pub video_id: String,
    pub transcript: Vec<TranscriptLine>,
    pub full_text: String,
    pub total_entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forced: Option<bool>,
}

impl TranscriptPayload {
    pub fn new(
        video_id: &VideoId,
        lines: Vec<TranscriptLine>,
        target_language: Option<&str>,
        forced: bool,
    ) -> Self {
        let transcript: Vec<TranscriptLine> = lines
            .into_iter()
            .map(|line| TranscriptLine {
                start: round_seconds(line.start),
                duration: round_seconds(line.duration),
                text: line.text.trim().to_string(),
            })
            .collect();

        let full_text = transcript
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string();

        Self {
            success: true,
            video_id: video_id.to_string(),
            total_entries: transcript.len(),
            transcript,
            full_text,
            requested_language: target_language.map(str::to_string),
            forced: target_language.map(|_| forced),
        }
    }
}
