use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static BARE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap());

static URL_SHAPES: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(
            r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([a-zA-Z0-9_-]{11})",
        )
        .unwrap(),
        Regex::new(r"youtube\.com/v/([a-zA-Z0-9_-]{11})").unwrap(),
    ]
});

/// Identifier of a YouTube video as accepted by the captions source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pulls a video ID out of a bare ID or any of the usual YouTube URL shapes.
///
/// A `v` query parameter is accepted as-is even when it is not 11 characters
/// long; the captions source decides whether it exists.
pub fn extract_video_id(input: &str) -> Option<VideoId> {
    if BARE_ID.is_match(input) {
        return Some(VideoId(input.to_string()));
    }

    for shape in URL_SHAPES.iter() {
        if let Some(caps) = shape.captures(input) {
            return Some(VideoId(caps[1].to_string()));
        }
    }

    query_v_param(input).map(VideoId)
}

fn query_v_param(input: &str) -> Option<String> {
    let query = match url::Url::parse(input) {
        Ok(parsed) => parsed.query()?.to_string(),
        // Scheme-less input such as "youtube.com/watch?x=1&v=..."
        Err(_) => {
            let (_, rest) = input.split_once('?')?;
            rest.split('#').next().unwrap_or_default().to_string()
        }
    };

    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, v)| k == "v" && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}
