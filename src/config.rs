use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::request::RequestDefaults;

const STANDARD_LANGUAGES: &str = "en,vi,zh,es,fr,de,ja,ko";
const LOW_RESOURCE_LANGUAGES: &str = "en,vi";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Deployment flavour; picks defaults for languages and translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Standard,
    /// Small list of default languages and no translation calls.
    LowResource,
}

impl Profile {
    pub fn name(self) -> &'static str {
        match self {
            Profile::Standard => "standard",
            Profile::LowResource => "low-resource",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub profile: Profile,
    pub cache_dir: PathBuf,
    pub cache_ttl: Duration,
    pub default_languages: Vec<String>,
    pub translation_enabled: bool,
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let profile = match get("TRANSCRIPT_PROFILE").as_deref() {
            None | Some("standard") => Profile::Standard,
            Some("low-resource") | Some("low_resource") => Profile::LowResource,
            Some(other) => {
                return Err(invalid(
                    "TRANSCRIPT_PROFILE",
                    other,
                    "expected standard or low-resource",
                ))
            }
        };

        let bind_addr = match get("TRANSCRIPT_BIND_ADDR") {
            None => SocketAddr::from(([0, 0, 0, 0], 5001)),
            Some(addr) => addr
                .parse::<SocketAddr>()
                .map_err(|e| invalid("TRANSCRIPT_BIND_ADDR", &addr, e))?,
        };

        let cache_ttl = Duration::from_secs(parse_secs(&get, "TRANSCRIPT_CACHE_TTL", 86400)?);
        let upstream_timeout =
            Duration::from_secs(parse_secs(&get, "TRANSCRIPT_UPSTREAM_TIMEOUT", 30)?);
        if upstream_timeout.is_zero() {
            return Err(invalid("TRANSCRIPT_UPSTREAM_TIMEOUT", "0", "must be positive"));
        }

        let languages = get("TRANSCRIPT_LANGUAGES").unwrap_or_else(|| {
            match profile {
                Profile::Standard => STANDARD_LANGUAGES,
                Profile::LowResource => LOW_RESOURCE_LANGUAGES,
            }
            .to_string()
        });
        let default_languages: Vec<String> = languages
            .split(',')
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty())
            .collect();
        if default_languages.is_empty() {
            return Err(invalid("TRANSCRIPT_LANGUAGES", &languages, "no language codes"));
        }

        let translation_enabled = match get("TRANSCRIPT_TRANSLATION") {
            None => profile == Profile::Standard,
            Some(flag) => match flag.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                _ => return Err(invalid("TRANSCRIPT_TRANSLATION", &flag, "expected a boolean")),
            },
        };

        Ok(Self {
            bind_addr,
            profile,
            cache_dir: get("TRANSCRIPT_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("cache")),
            cache_ttl,
            default_languages,
            translation_enabled,
            upstream_timeout,
        })
    }

    pub fn cache(&self) -> CacheConfig {
        CacheConfig {
            dir: self.cache_dir.clone(),
            default_ttl: self.cache_ttl,
        }
    }

    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            languages: self.default_languages.clone(),
        }
    }
}

fn parse_secs(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match get(var) {
        None => Ok(default),
        Some(value) => value
            .parse::<u64>()
            .map_err(|e| invalid(var, &value, e)),
    }
}

fn invalid(var: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_addr.port(), 5001);
        assert_eq!(config.profile, Profile::Standard);
        assert_eq!(config.cache_ttl, Duration::from_secs(86400));
        assert_eq!(config.cache_dir, PathBuf::from("cache"));
        assert_eq!(
            config.default_languages,
            vec!["en", "vi", "zh", "es", "fr", "de", "ja", "ko"]
        );
        assert!(config.translation_enabled);
        assert_eq!(config.upstream_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_low_resource_profile() {
        let config = config(&[("TRANSCRIPT_PROFILE", "low-resource")]).unwrap();
        assert_eq!(config.default_languages, vec!["en", "vi"]);
        assert!(!config.translation_enabled);
    }

    #[test]
    fn test_explicit_values_win_over_profile() {
        let config = config(&[
            ("TRANSCRIPT_PROFILE", "low-resource"),
            ("TRANSCRIPT_TRANSLATION", "yes"),
            ("TRANSCRIPT_LANGUAGES", " fr , de ,"),
            ("TRANSCRIPT_CACHE_TTL", "3600"),
            ("TRANSCRIPT_BIND_ADDR", "127.0.0.1:8080"),
            ("TRANSCRIPT_CACHE_DIR", "/tmp/transcripts"),
        ])
        .unwrap();
        assert!(config.translation_enabled);
        assert_eq!(config.default_languages, vec!["fr", "de"]);
        assert_eq!(config.cache().default_ttl, Duration::from_secs(3600));
        assert_eq!(config.request_defaults().languages, vec!["fr", "de"]);
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.cache().dir, PathBuf::from("/tmp/transcripts"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(config(&[("TRANSCRIPT_CACHE_TTL", "a day")]).is_err());
        assert!(config(&[("TRANSCRIPT_PROFILE", "tiny")]).is_err());
        assert!(config(&[("TRANSCRIPT_TRANSLATION", "maybe")]).is_err());
        assert!(config(&[("TRANSCRIPT_LANGUAGES", ",,")]).is_err());
        assert!(config(&[("TRANSCRIPT_UPSTREAM_TIMEOUT", "0")]).is_err());

        let err = config(&[("TRANSCRIPT_BIND_ADDR", "nowhere")]).unwrap_err();
        assert!(err.to_string().starts_with("TRANSCRIPT_BIND_ADDR"));
    }
}
