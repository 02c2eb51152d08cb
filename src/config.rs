//! Client and rendering settings.
//!
//! The browser derives the base URL from the page origin; the snapshot binary
//! reads env vars or a JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

pub const ENV_BASE_URL: &str = "FEEDVIEW_BASE_URL";
pub const ENV_ESCAPE_MARKUP: &str = "FEEDVIEW_ESCAPE_MARKUP";

fn default_base_url() -> String {
    "http://127.0.0.1:42096".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Origin of the REST backend, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Escape backend text before inserting it. Off by default: titles,
    /// names, tags and bodies go in as markup.
    #[serde(default)]
    pub escape_markup: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub render: RenderOptions,
}

impl ViewConfig {
    /// Defaults overridden by `FEEDVIEW_BASE_URL` / `FEEDVIEW_ESCAPE_MARKUP`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env(|k| std::env::var(k).ok());
        cfg
    }

    pub fn from_json_file(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        let mut cfg: Self = serde_json::from_str(&raw)
            .map_err(|e| format!("failed to parse {}: {e}", path.display()))?;
        cfg.client = ClientConfig::new(cfg.client.base_url);
        Ok(cfg)
    }

    pub(crate) fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.client = ClientConfig::new(url.trim());
        }
        if let Some(v) = var(ENV_ESCAPE_MARKUP) {
            self.render.escape_markup = parse_bool(&v).unwrap_or(self.render.escape_markup);
        }
    }
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
