mod cache;
mod config;
mod error;
mod formatter;
mod request;
mod transcript;
mod translate;
mod video_id;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use cache::{CacheKey, ResponseCache};
use config::{Config, Profile};
use error::ApiError;
use formatter::TranscriptPayload;
use request::{RequestDefaults, TranscriptQuery, TranscriptRequest};
use transcript::{TranscriptFetcher, YoutubeCaptions};
use translate::{translate_lines, GoogleTranslator, Translator};
use video_id::extract_video_id;

type AppResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone)]
struct AppState {
    fetcher: TranscriptFetcher,
    translator: Arc<dyn Translator>,
    cache: ResponseCache,
    defaults: RequestDefaults,
    translation_enabled: bool,
    profile: Profile,
}

#[tokio::main]
async fn main() -> AppResult {
    pretty_env_logger::init();

    let config = Config::from_env()?;
    log::info!(
        "Launching transcript API ({} profile) on http://{}",
        config.profile.name(),
        config.bind_addr
    );

    let cache = ResponseCache::new(config.cache());
    cache.prepare().await;

    let state = AppState {
        fetcher: TranscriptFetcher::new(Arc::new(YoutubeCaptions::new(config.upstream_timeout))),
        translator: Arc::new(GoogleTranslator::new(config.upstream_timeout)?),
        cache,
        defaults: config.request_defaults(),
        translation_enabled: config.translation_enabled,
        profile: config.profile,
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for ctrl-c: {}", e);
            }
            log::info!("Shutting down");
        })
        .await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/transcript", get(transcript_get).post(transcript_post))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn home(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "YouTube Transcript API",
        "status": "running",
        "profile": state.profile.name(),
        "endpoints": {
            "/transcript": {
                "methods": ["GET", "POST"],
                "description": "Get YouTube video transcript with automatic language detection",
                "parameters": {
                    "url": "YouTube video URL (optional if video_id provided)",
                    "video_id": "YouTube video ID (optional if url provided)",
                    "languages": format!(
                        "Comma-separated language codes (optional, defaults to '{}')",
                        state.defaults.languages.join(",")
                    ),
                    "language": "Single language code to force output in that language (e.g., 'en')",
                    "force": "Force translation to the requested language (default: true when 'language' provided)",
                    "no_cache": "Skip the response cache for this request",
                    "cache_ttl": format!(
                        "Maximum age in seconds of a cached response (default: {})",
                        state.cache.default_ttl().as_secs()
                    )
                },
                "examples": {
                    "GET": "/transcript?url=https://www.youtube.com/watch?v=VIDEO_ID&language=en&force=true",
                    "POST": r#"{"url": "https://www.youtube.com/watch?v=VIDEO_ID", "language": "en", "force": true}"#
                },
                "translation": state.translation_enabled,
                "supported_languages": ["en", "vi", "zh", "es", "fr", "de", "ja", "ko", "and many more"]
            }
        },
        "examples": {
            "GET": "/transcript?url=https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "POST": "Send JSON with 'url' or 'video_id' field"
        }
    }))
}

async fn transcript_get(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, ApiError> {
    let query = TranscriptQuery::from_pairs(pairs);
    let request = TranscriptRequest::from_query(query, &state.defaults);
    handle_transcript(&state, request).await.map(Json)
}

async fn transcript_post(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request = TranscriptRequest::from_json(&body, &state.defaults)?;
    handle_transcript(&state, request).await.map(Json)
}

async fn handle_transcript(
    state: &AppState,
    mut request: TranscriptRequest,
) -> Result<Value, ApiError> {
    if !state.translation_enabled {
        request.force_translate = false;
    }

    let video_id = request
        .video_source()
        .and_then(extract_video_id)
        .ok_or_else(|| ApiError::InvalidInput(format!("{:?}", request.video_source())))?;

    let key = CacheKey::new(
        video_id.as_str(),
        request.target_language.as_deref(),
        &request.languages,
        request.force_translate,
    );

    let ttl = match request.cache_ttl_secs {
        None => Some(state.cache.default_ttl()),
        // A negative TTL (POST only) treats every entry as stale.
        Some(secs) => u64::try_from(secs).ok().map(Duration::from_secs),
    };
    if let Some(ttl) = ttl.filter(|_| !request.no_cache) {
        if let Some(cached) = state.cache.lookup(&key, ttl).await {
            log::info!("Serving {} from cache ({})", video_id, key.as_str());
            return Ok(cached);
        }
    }

    let transcript = match state.fetcher.fetch(&video_id, &request.languages).await {
        Ok(transcript) => transcript,
        Err(e) => {
            log::warn!("Transcript for {} unavailable: {}", video_id, e);
            return Err(e.into());
        }
    };
    log::info!(
        "Fetched {} lines for {} in '{}'",
        transcript.lines.len(),
        video_id,
        transcript.language
    );

    let mut lines = transcript.lines;
    if let Some(target) = request
        .target_language
        .as_deref()
        .filter(|_| request.force_translate)
    {
        lines = translate_lines(state.translator.as_ref(), lines, target).await;
    }

    let payload = TranscriptPayload::new(
        &video_id,
        lines,
        request.target_language.as_deref(),
        request.force_translate,
    );
    let payload = serde_json::to_value(&payload).map_err(|e| ApiError::Internal(e.to_string()))?;

    if !request.no_cache {
        state.cache.store(&key, &payload).await;
    }
    Ok(payload)
}
