use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::expiry::{DISPLAY_FORMAT, SOON_MONTHS};
use crate::gs1::DecodeOptions;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Scan session settings. Every section is optional; an empty document
/// yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub expiry: ExpiryConfig,
    #[serde(default)]
    pub gate: GateConfig,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecoderConfig {
    #[serde(default = "default_true")]
    pub ref_fallback: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self { ref_fallback: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpiryConfig {
    #[serde(default = "default_soon_months")]
    pub soon_months: u32,
    #[serde(default = "default_display_format")]
    pub display_format: String,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            soon_months: SOON_MONTHS,
            display_format: DISPLAY_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    #[serde(default = "default_display_timeout_ms")]
    pub display_timeout_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self { display_timeout_ms: default_display_timeout_ms() }
    }
}

impl GateConfig {
    pub fn display_timeout(&self) -> Duration {
        Duration::from_millis(self.display_timeout_ms)
    }
}

fn default_true() -> bool {
    true
}

fn default_soon_months() -> u32 {
    SOON_MONTHS
}

fn default_display_format() -> String {
    DISPLAY_FORMAT.to_string()
}

fn default_display_timeout_ms() -> u64 {
    3000
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ScanConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=120).contains(&self.expiry.soon_months) {
            return Err(ConfigError::Validation(format!(
                "expiry.soon_months must be between 1 and 120, got {}",
                self.expiry.soon_months
            )));
        }

        if self.expiry.display_format.trim().is_empty() {
            return Err(ConfigError::Validation(
                "expiry.display_format must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Decoder options for the current century.
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            ref_fallback: self.decoder.ref_fallback,
            ..DecodeOptions::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = ScanConfig::from_toml("").unwrap();
        assert!(config.decoder.ref_fallback);
        assert_eq!(config.expiry.soon_months, 6);
        assert_eq!(config.expiry.display_format, "%-d.%-m.%Y");
        assert_eq!(config.gate.display_timeout(), Duration::from_millis(3000));
    }

    #[test]
    fn parse_all_sections() {
        let input = r#"
[decoder]
ref_fallback = false

[expiry]
soon_months = 3
display_format = "%Y-%m-%d"

[gate]
display_timeout_ms = 1500
"#;
        let config = ScanConfig::from_toml(input).unwrap();
        assert!(!config.decoder.ref_fallback);
        assert!(!config.decode_options().ref_fallback);
        assert_eq!(config.expiry.soon_months, 3);
        assert_eq!(config.expiry.display_format, "%Y-%m-%d");
        assert_eq!(config.gate.display_timeout_ms, 1500);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = ScanConfig::from_toml("[expiry]\nsoon_months = 12\n").unwrap();
        assert_eq!(config.expiry.soon_months, 12);
        assert_eq!(config.expiry.display_format, "%-d.%-m.%Y");
    }

    #[test]
    fn reject_zero_soon_months() {
        let err = ScanConfig::from_toml("[expiry]\nsoon_months = 0\n").unwrap_err();
        assert!(err.to_string().contains("soon_months"));
    }

    #[test]
    fn reject_empty_display_format() {
        let err = ScanConfig::from_toml("[expiry]\ndisplay_format = \" \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn reject_unknown_key() {
        let err = ScanConfig::from_toml("[decoder]\nref_fallbak = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
