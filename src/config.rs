use std::env;

use reqwest::Url;

use crate::errors::AppError;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_LOCAL_DB: &str = "marketplace-local.db";
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub local_db: String,
    pub currency: String,
}

impl ClientConfig {
    /// Reads `MARKETPLACE_API_URL`, `MARKETPLACE_LOCAL_DB` and
    /// `MARKETPLACE_CURRENCY`, falling back to the defaults when unset.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let api_url = read("MARKETPLACE_API_URL", DEFAULT_API_URL);
        match Url::parse(&api_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(AppError::Config(format!(
                    "MARKETPLACE_API_URL must be an http(s) url, got '{}'",
                    api_url
                )))
            }
        }

        let currency = read("MARKETPLACE_CURRENCY", DEFAULT_CURRENCY).to_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::Config(format!(
                "MARKETPLACE_CURRENCY must be a 3-letter code, got '{}'",
                currency
            )));
        }

        Ok(Self {
            api_url,
            local_db: read("MARKETPLACE_LOCAL_DB", DEFAULT_LOCAL_DB),
            currency,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.local_db, DEFAULT_LOCAL_DB);
        assert_eq!(config.currency, "USD");
    }

    #[test]
    fn overrides_are_trimmed_and_normalised() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("MARKETPLACE_API_URL", " https://shop.example/api "),
            ("MARKETPLACE_CURRENCY", "cdf"),
            ("MARKETPLACE_LOCAL_DB", ":memory:"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://shop.example/api");
        assert_eq!(config.currency, "CDF");
        assert_eq!(config.local_db, ":memory:");
    }

    #[test]
    fn rejects_bad_values() {
        let err = ClientConfig::from_lookup(lookup(&[("MARKETPLACE_API_URL", "ftp://x")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err = ClientConfig::from_lookup(lookup(&[("MARKETPLACE_CURRENCY", "dollars")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
