use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use ytranscript::{TranscriptConfig, YoutubeTranscript, YoutubeTranscriptError};

use crate::formatter::clean_caption_text;
use crate::video_id::VideoId;

/// One caption cue, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptResult {
    /// Language code of the track that was served.
    pub language: String,
    pub lines: Vec<TranscriptLine>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaptionError {
    #[error("Video unavailable: {0}")]
    VideoUnavailable(String),
    #[error("No transcript found: {0}")]
    NoTranscript(String),
    #[error("captions request timed out after {0:?}")]
    Timeout(Duration),
    #[error("captions request failed: {0}")]
    Upstream(String),
}

impl CaptionError {
    /// Sorts a captions library message into one of the known failure kinds.
    pub fn classify(message: String) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("unavailable")
            || lower.contains("no longer available")
            || lower.contains("private")
        {
            CaptionError::VideoUnavailable(message)
        } else if lower.contains("transcript") || lower.contains("caption") {
            CaptionError::NoTranscript(message)
        } else {
            CaptionError::Upstream(message)
        }
    }

    /// Network-level failures, as opposed to the video having no captions.
    pub fn is_transport(&self) -> bool {
        matches!(self, CaptionError::Timeout(_) | CaptionError::Upstream(_))
    }
}

/// Nothing could be fetched; carries the failure of the preferred-language attempt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Could not retrieve transcript: {0}")]
pub struct TranscriptUnavailable(#[source] pub CaptionError);

/// A provider of caption tracks for a video.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Fetches the first track whose language appears in `languages`, honoring their order.
    async fn fetch_preferred(
        &self,
        video_id: &VideoId,
        languages: &[String],
    ) -> Result<TranscriptResult, CaptionError>;

    /// Language codes of every track, in the order the source lists them.
    async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<String>, CaptionError>;

    async fn fetch_track(
        &self,
        video_id: &VideoId,
        language: &str,
    ) -> Result<TranscriptResult, CaptionError>;
}

#[derive(Clone)]
pub struct TranscriptFetcher {
    source: Arc<dyn CaptionSource>,
}

impl TranscriptFetcher {
    pub fn new(source: Arc<dyn CaptionSource>) -> Self {
        Self { source }
    }

    /// Preferred languages first, then every listed track in source order.
    pub async fn fetch(
        &self,
        video_id: &VideoId,
        languages: &[String],
    ) -> Result<TranscriptResult, TranscriptUnavailable> {
        let primary = match self.source.fetch_preferred(video_id, languages).await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };
        log::info!(
            "No transcript for {} in [{}] ({}); trying any available track",
            video_id,
            languages.join(","),
            primary
        );

        let tracks = match self.source.list_tracks(video_id).await {
            Ok(tracks) => tracks,
            Err(e) => {
                log::debug!("Listing tracks for {} failed: {}", video_id, e);
                return Err(TranscriptUnavailable(primary));
            }
        };

        for track in &tracks {
            match self.source.fetch_track(video_id, track).await {
                Ok(result) => {
                    log::info!("Using fallback track '{}' for {}", track, video_id);
                    return Ok(result);
                }
                Err(e) => log::debug!("Fallback track '{}' for {} failed: {}", track, video_id, e),
            }
        }

        Err(TranscriptUnavailable(primary))
    }
}

/// Captions from YouTube through the `ytranscript` crate.
pub struct YoutubeCaptions {
    timeout: Duration,
}

// ytranscript has no listing call. Asking for a code no track can carry makes it
// answer with the list of available codes.
const LIST_PROBE_LANG: &str = "~list";

impl YoutubeCaptions {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn request(
        &self,
        video_id: &str,
        lang: &str,
    ) -> Result<Result<Vec<ytranscript::TranscriptResponse>, YoutubeTranscriptError>, CaptionError>
    {
        let config = TranscriptConfig {
            lang: Some(lang.to_string()),
        };
        tokio::time::timeout(
            self.timeout,
            YoutubeTranscript::fetch_transcript(video_id, Some(config)),
        )
        .await
        .map_err(|_| CaptionError::Timeout(self.timeout))
    }
}

#[async_trait]
impl CaptionSource for YoutubeCaptions {
    async fn fetch_preferred(
        &self,
        video_id: &VideoId,
        languages: &[String],
    ) -> Result<TranscriptResult, CaptionError> {
        let available = self.list_tracks(video_id).await?;
        match pick_preferred_language(&available, languages) {
            Some(lang) => self.fetch_track(video_id, &lang).await,
            None => Err(CaptionError::NoTranscript(format!(
                "No transcripts were found for any of the requested language codes [{}]; available: [{}]",
                languages.join(", "),
                available.join(", ")
            ))),
        }
    }

    async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<String>, CaptionError> {
        let answer = self.request(video_id.as_str(), LIST_PROBE_LANG).await?;
        tracks_from_listing(answer)
    }

    async fn fetch_track(
        &self,
        video_id: &VideoId,
        language: &str,
    ) -> Result<TranscriptResult, CaptionError> {
        let transcript = self
            .request(video_id.as_str(), language)
            .await?
            .map_err(|e| CaptionError::classify(e.to_string()))?;

        let lines = transcript
            .into_iter()
            .map(|entry| TranscriptLine {
                start: f64::from(entry.offset),
                duration: f64::from(entry.duration),
                text: clean_caption_text(&entry.text),
            })
            .collect();

        Ok(TranscriptResult {
            language: language.to_string(),
            lines,
        })
    }
}

/// Reads the available codes out of ytranscript's answer to a `LIST_PROBE_LANG` request.
fn tracks_from_listing(
    answer: Result<Vec<ytranscript::TranscriptResponse>, YoutubeTranscriptError>,
) -> Result<Vec<String>, CaptionError> {
    match answer {
        Err(YoutubeTranscriptError::TranscriptNotAvailableLanguage(_, available_langs, _)) => {
            Ok(available_langs)
        }
        Err(e) => Err(CaptionError::classify(e.to_string())),
        // Only reachable if a track really is tagged with the probe code.
        Ok(_) => Ok(vec![LIST_PROBE_LANG.to_string()]),
    }
}

/// First entry of `preferred` that the video actually has a track for.
pub fn pick_preferred_language(available: &[String], preferred: &[String]) -> Option<String> {
    preferred
        .iter()
        .find(|lang| available.contains(lang))
        .cloned()
}
