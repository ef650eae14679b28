//! Turns `/transcript` query strings and JSON bodies into one normalized request.
//!
//! GET and POST do not agree on every flag: GET only accepts `true`/`1`/`yes`
//! as a true value, POST uses JSON truthiness (`"false"` is a non-empty string
//! and therefore true). Both behaviours are relied upon by existing clients.

use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("request body is not valid JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("invalid cache_ttl value: {0}")]
    InvalidTtl(String),
}

/// Values applied when the caller leaves a field out.
#[derive(Debug, Clone)]
pub struct RequestDefaults {
    pub languages: Vec<String>,
}

/// Raw `GET /transcript` query parameters.
#[derive(Debug, Default)]
pub struct TranscriptQuery {
    pub url: Option<String>,
    pub video_id: Option<String>,
    pub language: Option<String>,
    pub languages: Option<String>,
    pub force: Option<String>,
    pub no_cache: Option<String>,
    pub cache_ttl: Option<String>,
}

impl TranscriptQuery {
    /// Keeps the first value of a repeated parameter and ignores unknown ones.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (name, value) in pairs {
            let slot = match name.as_str() {
                "url" => &mut query.url,
                "video_id" => &mut query.video_id,
                "language" => &mut query.language,
                "languages" => &mut query.languages,
                "force" => &mut query.force,
                "no_cache" => &mut query.no_cache,
                "cache_ttl" => &mut query.cache_ttl,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptRequest {
    pub url: Option<String>,
    pub video_id: Option<String>,
    /// Language the transcript is reported (and, when forced, translated) in.
    pub target_language: Option<String>,
    /// Preferred caption languages, highest priority first.
    pub languages: Vec<String>,
    pub force_translate: bool,
    pub no_cache: bool,
    /// `None` leaves the cache's default in force. May be negative on POST,
    /// which makes every cached entry stale.
    pub cache_ttl_secs: Option<i64>,
}

impl TranscriptRequest {
    pub fn from_query(query: TranscriptQuery, defaults: &RequestDefaults) -> Self {
        let language_given = query.language.is_some();
        let languages: Vec<String> = match query.language.as_deref() {
            Some(lang) if !lang.is_empty() => vec![lang.to_string()],
            _ => match query.languages {
                Some(list) => list.split(',').map(str::to_string).collect(),
                None => defaults.languages.clone(),
            },
        };

        let force_flag = query.force.as_deref().map(is_yes);
        let force_translate = if language_given {
            force_flag.unwrap_or(true)
        } else {
            languages.len() == 1 && force_flag.unwrap_or(false)
        };

        let cache_ttl_secs = query
            .cache_ttl
            .as_deref()
            .filter(|ttl| !ttl.is_empty() && ttl.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|ttl| ttl.parse::<i64>().ok());

        Self {
            target_language: target_language(query.language.as_deref(), &languages),
            url: query.url,
            video_id: query.video_id,
            languages,
            force_translate,
            no_cache: query.no_cache.as_deref().is_some_and(is_yes),
            cache_ttl_secs,
        }
    }

    /// Parses a `POST /transcript` body. An empty body is treated as `{}`.
    pub fn from_json(body: &[u8], defaults: &RequestDefaults) -> Result<Self, RequestError> {
        let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(body)?
        };
        let empty = Map::new();
        let data = value.as_object().unwrap_or(&empty);

        let language_value = data.get("language").filter(|v| !v.is_null());
        let language = language_value.map(value_to_string);
        let language_truthy = language_value.is_some_and(is_truthy);

        let languages: Vec<String> = if language_truthy {
            language.iter().cloned().collect()
        } else {
            match data.get("languages") {
                None => defaults.languages.clone(),
                Some(Value::String(list)) => list.split(',').map(str::to_string).collect(),
                Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
                Some(_) => Vec::new(),
            }
        };

        let force = data.get("force").filter(|v| !v.is_null());
        let force_translate = if language_value.is_some() {
            force.map_or(true, is_truthy)
        } else {
            languages.len() == 1 && force.is_some_and(is_truthy)
        };

        let cache_ttl_secs = data.get("cache_ttl").map(parse_json_ttl).transpose()?;

        let target = if language_truthy {
            language.clone()
        } else {
            None
        };

        Ok(Self {
            url: data.get("url").and_then(Value::as_str).map(str::to_string),
            video_id: data.get("video_id").and_then(Value::as_str).map(str::to_string),
            target_language: target_language(target.as_deref(), &languages),
            languages,
            force_translate,
            no_cache: data.get("no_cache").is_some_and(is_truthy),
            cache_ttl_secs,
        })
    }

    /// The string the video ID should be extracted from: `url` wins over `video_id`.
    pub fn video_source(&self) -> Option<&str> {
        [self.url.as_deref(), self.video_id.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
    }
}

/// `language` when set, otherwise the sole entry of a one-element list.
fn target_language(language: Option<&str>, languages: &[String]) -> Option<String> {
    match language {
        Some(lang) if !lang.is_empty() => Some(lang.to_string()),
        _ => match languages {
            [only] if !only.is_empty() => Some(only.clone()),
            _ => None,
        },
    }
}

fn is_yes(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

/// JSON truthiness: null, false, 0, "", [] and {} are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_json_ttl(value: &Value) -> Result<i64, RequestError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| RequestError::InvalidTtl(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> RequestDefaults {
        RequestDefaults {
            languages: ["en", "vi", "zh", "es", "fr", "de", "ja", "ko"]
                .iter()
                .map(|l| l.to_string())
                .collect(),
        }
    }

    fn get(pairs: &[(&str, &str)]) -> TranscriptRequest {
        let pairs = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TranscriptRequest::from_query(TranscriptQuery::from_pairs(pairs), &defaults())
    }

    fn post(body: Value) -> TranscriptRequest {
        TranscriptRequest::from_json(body.to_string().as_bytes(), &defaults()).unwrap()
    }

    #[test]
    fn test_defaults() {
        for req in [get(&[("url", "x")]), post(json!({"url": "x"}))] {
            assert_eq!(req.languages, defaults().languages);
            assert_eq!(req.target_language, None);
            assert!(!req.force_translate);
            assert!(!req.no_cache);
            assert_eq!(req.cache_ttl_secs, None);
        }
    }

    #[test]
    fn test_language_forces_translation_by_default() {
        for req in [get(&[("language", "fr")]), post(json!({"language": "fr"}))] {
            assert_eq!(req.languages, vec!["fr"]);
            assert_eq!(req.target_language.as_deref(), Some("fr"));
            assert!(req.force_translate);
        }
    }

    #[test]
    fn test_language_overrides_languages_list() {
        let req = get(&[("language", "de"), ("languages", "en,vi")]);
        assert_eq!(req.languages, vec!["de"]);
        let req = post(json!({"language": "de", "languages": ["en", "vi"]}));
        assert_eq!(req.languages, vec!["de"]);
    }

    #[test]
    fn test_single_languages_entry_needs_explicit_force() {
        for req in [get(&[("languages", "ja")]), post(json!({"languages": ["ja"]}))] {
            assert_eq!(req.target_language.as_deref(), Some("ja"));
            assert!(!req.force_translate);
        }
        for req in [
            get(&[("languages", "ja"), ("force", "yes")]),
            post(json!({"languages": "ja", "force": true})),
        ] {
            assert_eq!(req.target_language.as_deref(), Some("ja"));
            assert!(req.force_translate);
        }
    }

    #[test]
    fn test_force_on_multiple_languages_is_ignored() {
        assert!(!get(&[("languages", "en,vi"), ("force", "true")]).force_translate);
        assert!(!post(json!({"languages": ["en", "vi"], "force": true})).force_translate);
    }

    #[test]
    fn test_string_false_diverges_between_get_and_post() {
        let from_get = get(&[("language", "fr"), ("force", "false")]);
        let from_post = post(json!({"language": "fr", "force": "false"}));
        assert!(!from_get.force_translate);
        assert!(from_post.force_translate, "non-empty string is truthy on POST");

        assert!(!post(json!({"language": "fr", "force": false})).force_translate);
        assert!(!post(json!({"language": "fr", "force": 0})).force_translate);
        assert!(post(json!({"language": "fr", "force": null})).force_translate);
    }

    #[test]
    fn test_no_cache_diverges_between_get_and_post() {
        assert!(get(&[("no_cache", "YES")]).no_cache);
        assert!(!get(&[("no_cache", "on")]).no_cache);
        assert!(post(json!({"no_cache": "on"})).no_cache);
        assert!(!post(json!({"no_cache": 0})).no_cache);
    }

    #[test]
    fn test_repeated_query_parameter_keeps_first() {
        let req = get(&[
            ("video_id", "dQw4w9WgXcQ"),
            ("language", "fr"),
            ("language", "de"),
            ("utm_source", "share"),
        ]);
        assert_eq!(req.target_language.as_deref(), Some("fr"));
        assert_eq!(req.languages, vec!["fr"]);
        assert_eq!(req.video_source(), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_get_languages_are_not_trimmed() {
        let req = get(&[("languages", "en, vi")]);
        assert_eq!(req.languages, vec!["en", " vi"]);
    }

    #[test]
    fn test_empty_language_parameter() {
        // Present but empty: still forces, but yields no target.
        let req = get(&[("language", "")]);
        assert_eq!(req.languages, defaults().languages);
        assert!(req.force_translate);
        assert_eq!(req.target_language, None);

        let req = get(&[("languages", "")]);
        assert_eq!(req.languages, vec![""]);
        assert_eq!(req.target_language, None);
    }

    #[test]
    fn test_get_cache_ttl() {
        assert_eq!(get(&[("cache_ttl", "60")]).cache_ttl_secs, Some(60));
        assert_eq!(get(&[("cache_ttl", "0")]).cache_ttl_secs, Some(0));
        assert_eq!(get(&[("cache_ttl", "-5")]).cache_ttl_secs, None);
        assert_eq!(get(&[("cache_ttl", "abc")]).cache_ttl_secs, None);
        assert_eq!(get(&[("cache_ttl", "")]).cache_ttl_secs, None);
    }

    #[test]
    fn test_post_cache_ttl() {
        assert_eq!(post(json!({"cache_ttl": 60})).cache_ttl_secs, Some(60));
        assert_eq!(post(json!({"cache_ttl": 7.9})).cache_ttl_secs, Some(7));
        assert_eq!(post(json!({"cache_ttl": " 120 "})).cache_ttl_secs, Some(120));
        assert_eq!(post(json!({"cache_ttl": -1})).cache_ttl_secs, Some(-1));

        for bad in [json!({"cache_ttl": "soon"}), json!({"cache_ttl": null})] {
            let err = TranscriptRequest::from_json(bad.to_string().as_bytes(), &defaults());
            assert!(matches!(err, Err(RequestError::InvalidTtl(_))));
        }
    }

    #[test]
    fn test_post_languages_shapes() {
        assert_eq!(post(json!({"languages": "en,fr"})).languages, vec!["en", "fr"]);
        assert_eq!(post(json!({"languages": ["ko", 5]})).languages, vec!["ko", "5"]);
        assert!(post(json!({"languages": null})).languages.is_empty());
        assert!(post(json!({"languages": 3})).languages.is_empty());
    }

    #[test]
    fn test_post_body_edge_cases() {
        let req = TranscriptRequest::from_json(b"", &defaults()).unwrap();
        assert_eq!(req.video_source(), None);
        let req = TranscriptRequest::from_json(b"[1, 2]", &defaults()).unwrap();
        assert_eq!(req.languages, defaults().languages);
        assert!(matches!(
            TranscriptRequest::from_json(b"{not json", &defaults()),
            Err(RequestError::InvalidBody(_))
        ));
    }

    #[test]
    fn test_video_source_precedence() {
        let req = get(&[("url", "https://youtu.be/dQw4w9WgXcQ"), ("video_id", "aaaaaaaaaaa")]);
        assert_eq!(req.video_source(), Some("https://youtu.be/dQw4w9WgXcQ"));
        let req = get(&[("url", ""), ("video_id", "aaaaaaaaaaa")]);
        assert_eq!(req.video_source(), Some("aaaaaaaaaaa"));
        assert_eq!(get(&[]).video_source(), None);
    }

    #[test]
    fn test_same_parameters_normalize_identically() {
        let from_get = get(&[("url", "dQw4w9WgXcQ"), ("languages", "en,vi"), ("cache_ttl", "30")]);
        let from_post = post(json!({"url": "dQw4w9WgXcQ", "languages": ["en", "vi"], "cache_ttl": 30}));
        assert_eq!(from_get, from_post);

        let from_get = get(&[("url", "dQw4w9WgXcQ"), ("language", "es"), ("force", "1")]);
        let from_post = post(json!({"url": "dQw4w9WgXcQ", "language": "es", "force": 1}));
        assert_eq!(from_get, from_post);
    }

    #[test]
    fn test_is_truthy() {
        for v in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([]), json!({})] {
            assert!(!is_truthy(&v), "{v}");
        }
        for v in [json!(true), json!(2), json!("false"), json!([0]), json!({"a": null})] {
            assert!(is_truthy(&v), "{v}");
        }
    }
}
