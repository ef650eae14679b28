//! Per-line transcript translation.
//!
//! Translation is best-effort: a line that fails to translate keeps its
//! original text and the rest of the transcript is still processed.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::transcript::TranscriptLine;

const GOOGLE_TRANSLATE_URL: &str = "https://translate.googleapis.com";

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("translation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("translation service answered {0}")]
    Status(reqwest::StatusCode),
    #[error("unexpected translation response: {0}")]
    Malformed(String),
}

/// Translator backend.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslateError>;
}

/// Client for the public Google Translate endpoint, source language auto-detected.
pub struct GoogleTranslator {
    http: reqwest::Client,
    base_url: String,
}

impl GoogleTranslator {
    pub fn new(timeout: Duration) -> Result<Self, TranslateError> {
        Self::with_base_url(GOOGLE_TRANSLATE_URL, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, TranslateError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslateError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let response = self
            .http
            .get(format!("{}/translate_a/single", self.base_url))
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::Status(status));
        }

        let body: Value = response.json().await?;
        parse_google_response(&body)
    }
}

/// The endpoint answers `[[["translated", "source", ...], ...], ...]`, one
/// inner array per sentence.
fn parse_google_response(body: &Value) -> Result<String, TranslateError> {
    let sentences = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::Malformed(body.to_string()))?;

    let translated: String = sentences
        .iter()
        .filter_map(|sentence| sentence.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        return Err(TranslateError::Malformed(body.to_string()));
    }
    Ok(translated)
}

/// Translates every line once, in order. Failed lines keep their original text.
pub async fn translate_lines(
    translator: &dyn Translator,
    lines: Vec<TranscriptLine>,
    target_lang: &str,
) -> Vec<TranscriptLine> {
    let mut translated = Vec::with_capacity(lines.len());
    let mut failures = 0usize;

    for mut line in lines {
        match translator.translate(&line.text, target_lang).await {
            Ok(text) => line.text = text,
            Err(e) => {
                failures += 1;
                log::debug!("Keeping original text for line at {:.2}s: {}", line.start, e);
            }
        }
        translated.push(line);
    }

    if failures > 0 {
        log::warn!(
            "{} of {} lines could not be translated to '{}'",
            failures,
            translated.len(),
            target_lang
        );
    }
    translated
}
