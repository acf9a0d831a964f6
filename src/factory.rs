use crate::providers::openai::{DEFAULT_TIMEOUT, GEMINI_OPENAI_BASE_URL};
use crate::{Error, LLMProvider, OpenAICompatibleProvider};
use std::env;
use std::time::Duration;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "DASHGEN_MODEL";
pub const BASE_URL_VAR: &str = "DASHGEN_BASE_URL";
pub const TIMEOUT_VAR: &str = "DASHGEN_TIMEOUT_SECS";

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_SAMPLE_ROWS: usize = 5;

/// Everything needed to run one generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub sample_rows: usize,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Values given on the command line. `None` falls back to the environment, then defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub sample_rows: Option<usize>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl GeneratorConfig {
    /// Configuration with defaults for everything except the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_OPENAI_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            sample_rows: DEFAULT_SAMPLE_ROWS,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Merge command-line overrides over the process environment.
    pub fn from_env_with(overrides: &ConfigOverrides) -> Result<Self, Error> {
        Self::resolve(overrides, |key| env::var(key).ok())
    }

    /// Resolve each setting as override, then `lookup(VAR)`, then default.
    pub fn resolve<F>(overrides: &ConfigOverrides, lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = overrides
            .api_key
            .clone()
            .or_else(|| non_empty(API_KEY_VAR))
            .ok_or_else(|| {
                Error::config(format!(
                    "{API_KEY_VAR} not found. Set the environment variable, add it to a .env file, or pass --api-key"
                ))
            })?;

        let mut config = Self::new(api_key);

        if let Some(model) = overrides.model.clone().or_else(|| non_empty(MODEL_VAR)) {
            config.model = model;
        }
        if let Some(base_url) = overrides.base_url.clone().or_else(|| non_empty(BASE_URL_VAR)) {
            config.base_url = base_url;
        }

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => Some(secs),
            None => non_empty(TIMEOUT_VAR)
                .map(|raw| {
                    raw.trim().parse::<u64>().map_err(|_| {
                        Error::config(format!("{TIMEOUT_VAR} must be a whole number of seconds, got '{raw}'"))
                    })
                })
                .transpose()?,
        };
        if let Some(secs) = timeout_secs {
            if secs == 0 {
                return Err(Error::config("request timeout must be at least one second"));
            }
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(rows) = overrides.sample_rows {
            config.sample_rows = rows;
        }
        if let Some(temperature) = overrides.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(Error::config(format!(
                    "temperature must be between 0.0 and 2.0, got {temperature}"
                )));
            }
            config.temperature = Some(temperature);
        }
        config.max_tokens = overrides.max_tokens;

        Ok(config)
    }
}

/// Factory for creating LLM providers.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider from configuration.
    pub fn create(config: &GeneratorConfig) -> Result<Box<dyn LLMProvider>, Error> {
        let provider = OpenAICompatibleProvider::with_timeout(
            config.api_key.clone(),
            config.base_url.clone(),
            config.timeout,
        )?;
        Ok(Box::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_from_env() {
        let config =
            GeneratorConfig::resolve(&ConfigOverrides::default(), lookup(&[(API_KEY_VAR, "k")]))
                .unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, GEMINI_OPENAI_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.sample_rows, DEFAULT_SAMPLE_ROWS);
    }

    #[test]
    fn test_missing_api_key() {
        let err = GeneratorConfig::resolve(&ConfigOverrides::default(), lookup(&[(API_KEY_VAR, "  ")]))
            .unwrap_err();
        assert!(err.to_string().contains(API_KEY_VAR));
    }

    #[test]
    fn test_overrides_beat_env() {
        let env = lookup(&[
            (API_KEY_VAR, "env-key"),
            (MODEL_VAR, "env-model"),
            (BASE_URL_VAR, "http://env"),
            (TIMEOUT_VAR, "30"),
        ]);
        let overrides = ConfigOverrides {
            model: Some("cli-model".to_string()),
            sample_rows: Some(2),
            temperature: Some(0.4),
            ..Default::default()
        };

        let config = GeneratorConfig::resolve(&overrides, env).unwrap();
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.model, "cli-model");
        assert_eq!(config.base_url, "http://env");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.sample_rows, 2);
        assert_eq!(config.temperature, Some(0.4));
    }

    #[test]
    fn test_invalid_values() {
        let env = lookup(&[(API_KEY_VAR, "k"), (TIMEOUT_VAR, "soon")]);
        assert!(matches!(
            GeneratorConfig::resolve(&ConfigOverrides::default(), env),
            Err(Error::Config(_))
        ));

        let overrides = ConfigOverrides {
            temperature: Some(3.5),
            ..Default::default()
        };
        assert!(GeneratorConfig::resolve(&overrides, lookup(&[(API_KEY_VAR, "k")])).is_err());

        let overrides = ConfigOverrides {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(GeneratorConfig::resolve(&overrides, lookup(&[(API_KEY_VAR, "k")])).is_err());
    }

    #[test]
    fn test_factory_creates_provider() {
        let mut config = GeneratorConfig::new("k");
        config.base_url = "http://localhost:9999/v1".to_string();
        let provider = ProviderFactory::create(&config).unwrap();
        assert_eq!(provider.name(), "OpenAI-compatible");
    }
}
