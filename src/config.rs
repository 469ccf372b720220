use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "qwen/qwen2.5-vl-72b-instruct:free";
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openrouter.ai/v1/chat/completions";
pub const DEFAULT_PROXY_URL: &str = "http://localhost:3000";
pub const PROXY_PATH: &str = "/api/openrouter/chat";

/// Where a turn is sent. Fixed for the lifetime of the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Same-origin proxy that injects the credential itself
    Proxy { url: String },
    /// Upstream completions API, authorized with the user's key
    Direct {
        url: String,
        referer: Option<String>,
        title: Option<String>,
    },
}

impl Endpoint {
    pub fn url(&self) -> &str {
        match self {
            Endpoint::Proxy { url } | Endpoint::Direct { url, .. } => url,
        }
    }

    pub fn needs_credential(&self) -> bool {
        matches!(self, Endpoint::Direct { .. })
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub use_proxy: bool,
    /// Origin of the proxy; the chat path is appended
    pub proxy_url: String,
    pub upstream_url: String,
    pub model: String,
    /// Sent as `HTTP-Referer` in direct mode
    pub referer: Option<String>,
    /// Sent as `X-Title` in direct mode
    pub title: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_proxy: cfg!(feature = "proxy"),
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            referer: None,
            title: Some("chat-widget".to_string()),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the default location, falling back to defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn endpoint(&self) -> Endpoint {
        if self.use_proxy {
            Endpoint::Proxy {
                url: format!("{}{}", self.proxy_url.trim_end_matches('/'), PROXY_PATH),
            }
        } else {
            Endpoint::Direct {
                url: self.upstream_url.clone(),
                referer: self.referer.clone(),
                title: self.title.clone(),
            }
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("chat-widget").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"use_proxy": true, "proxy_url": "http://127.0.0.1:8080/"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.use_proxy);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(
            config.endpoint(),
            Endpoint::Proxy {
                url: "http://127.0.0.1:8080/api/openrouter/chat".to_string()
            }
        );
    }

    #[test]
    fn hand_written_file_sets_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "use_proxy": false,
                "proxy_url": "http://proxy.local",
                "upstream_url": "http://upstream.local/v1/chat/completions",
                "model": "some/model",
                "referer": "https://example.com",
                "title": null,
                "theme": "ignored"
            }"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config,
            Config {
                use_proxy: false,
                proxy_url: "http://proxy.local".to_string(),
                upstream_url: "http://upstream.local/v1/chat/completions".to_string(),
                model: "some/model".to_string(),
                referer: Some("https://example.com".to_string()),
                title: None,
            }
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn direct_endpoint_carries_identification() {
        let config = Config {
            use_proxy: false,
            referer: Some("https://example.com".to_string()),
            ..Config::new()
        };

        let endpoint = config.endpoint();
        assert!(endpoint.needs_credential());
        assert_eq!(endpoint.url(), DEFAULT_UPSTREAM_URL);
        assert_eq!(
            endpoint,
            Endpoint::Direct {
                url: DEFAULT_UPSTREAM_URL.to_string(),
                referer: Some("https://example.com".to_string()),
                title: Some("chat-widget".to_string()),
            }
        );
    }
}
