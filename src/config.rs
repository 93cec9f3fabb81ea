use anyhow::{Context, Result};
use std::env;

pub const DEFAULT_BASE_URL: &str = "https://canvas.uautonoma.cl/api/v1/";

/// Checked in order; the first non-blank value wins.
const TOKEN_VARS: [&str; 2] = ["CANVAS_TOKEN", "TOKEN"];

#[derive(Debug, Clone)]
pub struct Config {
    pub api_token: String,
    pub base_url: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let api_token = find_token(|name| env::var(name).ok())
            .context("CANVAS_TOKEN not found. Please set it in .env file or environment")?;

        let base_url = env::var("CANVAS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Self::new(api_token, base_url)
    }

    pub fn new(api_token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            anyhow::bail!("CANVAS_TOKEN is empty");
        }

        let mut base_url = base_url.into();
        if base_url.trim().is_empty() {
            anyhow::bail!("CANVAS_BASE_URL is empty");
        }
        // Paths are appended directly, so the base must end with a slash
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Config {
            api_token: api_token.trim().to_string(),
            base_url,
        })
    }
}

fn find_token(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    TOKEN_VARS
        .iter()
        .filter_map(|name| lookup(*name))
        .find(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_blank_canvas_token_falls_back_to_token() {
        let token = find_token(lookup_in(&[("CANVAS_TOKEN", "  "), ("TOKEN", "abc")]));
        assert_eq!(token.as_deref(), Some("abc"));

        let token = find_token(lookup_in(&[("CANVAS_TOKEN", "xyz"), ("TOKEN", "abc")]));
        assert_eq!(token.as_deref(), Some("xyz"));

        assert!(find_token(lookup_in(&[("CANVAS_TOKEN", "")])).is_none());
    }

    #[test]
    fn test_new_enforces_trailing_slash() {
        let config = Config::new("abc", "http://localhost:1234/api/v1").unwrap();
        assert_eq!(config.base_url, "http://localhost:1234/api/v1/");

        let config = Config::new("abc", DEFAULT_BASE_URL).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_new_rejects_empty_token() {
        assert!(Config::new("   ", DEFAULT_BASE_URL).is_err());
    }
}
