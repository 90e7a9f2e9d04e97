use config::Config;
use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub trends: TrendsConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub countries: Vec<CountryEntry>,
}

/// Upstream query parameters shared by every request.
#[derive(Debug, Deserialize, Clone)]
pub struct TrendsConfig {
    #[serde(default = "default_geo")]
    pub geo: String,
    #[serde(default = "default_category")]
    pub category: u32,
    #[serde(default = "default_language")]
    pub language: String,
    /// Minutes offset passed as the `tz` parameter.
    #[serde(default = "default_tz_offset")]
    pub tz_offset: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PacingConfig {
    #[serde(default = "default_delay_min")]
    pub delay_min_secs: f64,
    #[serde(default = "default_delay_max")]
    pub delay_max_secs: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: f64,
    #[serde(default = "default_jitter_max")]
    pub jitter_max_secs: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CountryEntry {
    pub name: String,
    pub name_en: String,
    pub adjective_ru: String,
    #[serde(default)]
    pub adjective_ru_alt: Option<String>,
    #[serde(default)]
    pub name_ru_short: Option<String>,
    pub adjective_en: String,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            geo: default_geo(),
            category: default_category(),
            language: default_language(),
            tz_offset: default_tz_offset(),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            delay_min_secs: default_delay_min(),
            delay_max_secs: default_delay_max(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_secs: default_initial_delay(),
            jitter_max_secs: default_jitter_max(),
        }
    }
}

fn default_geo() -> String {
    "RU".to_string()
}

fn default_category() -> u32 {
    13
}

fn default_language() -> String {
    "ru-RU".to_string()
}

fn default_tz_offset() -> i32 {
    180
}

fn default_delay_min() -> f64 {
    3.0
}

fn default_delay_max() -> f64 {
    7.0
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> f64 {
    30.0
}

fn default_jitter_max() -> f64 {
    10.0
}

impl Settings {
    pub fn new(path: &str) -> Result<Self> {
        let builder = Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("TRENDS")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let config = builder.build()?;

        let settings: Settings = config.try_deserialize()?;

        debug!(
            geo = %settings.trends.geo,
            category = settings.trends.category,
            countries = settings.countries.len(),
            "Loaded trends settings"
        );

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let pacing = &self.pacing;
        if pacing.delay_min_secs < 0.0 || pacing.delay_max_secs < 0.0 {
            return Err(Error::InvalidInput("pacing delays must not be negative".to_string()));
        }
        if pacing.delay_min_secs > pacing.delay_max_secs {
            return Err(Error::InvalidInput(format!(
                "pacing.delay_min_secs ({}) exceeds pacing.delay_max_secs ({})",
                pacing.delay_min_secs, pacing.delay_max_secs
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::InvalidInput("retry.max_attempts must be at least 1".to_string()));
        }
        if self.retry.initial_delay_secs < 0.0 || self.retry.jitter_max_secs < 0.0 {
            return Err(Error::InvalidInput("retry delays must not be negative".to_string()));
        }
        if self.countries.is_empty() {
            return Err(Error::InvalidInput("no countries configured".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_applied() {
        let file = write_config(
            r#"
[[countries]]
name = "Турция"
name_en = "Turkey"
adjective_ru = "турецкий"
adjective_en = "turkish"
"#,
        );

        let settings = Settings::new(file.path().to_str().unwrap()).unwrap();
        assert_eq!(settings.trends.geo, "RU");
        assert_eq!(settings.trends.category, 13);
        assert_eq!(settings.pacing.delay_min_secs, 3.0);
        assert_eq!(settings.pacing.delay_max_secs, 7.0);
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.retry.initial_delay_secs, 30.0);
        assert_eq!(settings.countries.len(), 1);
        assert!(settings.countries[0].adjective_ru_alt.is_none());
    }

    #[test]
    fn test_inverted_pacing_rejected() {
        let file = write_config(
            r#"
[pacing]
delay_min_secs = 9.0
delay_max_secs = 2.0

[[countries]]
name = "Кипр"
name_en = "Cyprus"
adjective_ru = "кипрский"
adjective_en = "cypriot"
"#,
        );

        let err = Settings::new(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_empty_country_table_rejected() {
        let file = write_config("[trends]\ngeo = \"KZ\"\n");
        let err = Settings::new(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_env_override_with_single_underscore_prefix() {
        let file = write_config(
            r#"
[retry]
jitter_max_secs = 10.0

[[countries]]
name = "Грузия"
name_en = "Georgia"
adjective_ru = "грузинский"
adjective_en = "georgian"
"#,
        );

        // No other test reads retry.jitter_max_secs, so the override cannot leak into them.
        unsafe { std::env::set_var("TRENDS_RETRY__JITTER_MAX_SECS", "2.5") };
        let settings = Settings::new(file.path().to_str().unwrap());
        unsafe { std::env::remove_var("TRENDS_RETRY__JITTER_MAX_SECS") };

        assert_eq!(settings.unwrap().retry.jitter_max_secs, 2.5);
    }
}
