use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::loader::DEFAULT_DELIMITER;

/// Optional configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "telemarketing.json";

// ---------------------------------------------------------------------------
// Chart theme
// ---------------------------------------------------------------------------

/// Styling handed to the chart preparation. Defaults give the plain "ticks"
/// look: no grid, no box around the plot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChartTheme {
    pub show_grid: bool,
    pub bar_width: f64,
    /// HSL saturation of the generated palette.
    pub saturation: f32,
    /// HSL lightness of the generated palette.
    pub lightness: f32,
    /// Decimals in bar and slice annotations.
    pub label_decimals: usize,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            show_grid: false,
            bar_width: 0.6,
            saturation: 0.75,
            lightness: 0.55,
            label_decimals: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Field separator tried first when reading an upload.
    #[serde(deserialize_with = "delimiter_byte")]
    pub input_delimiter: u8,
    /// Rows shown in the before/after previews.
    pub preview_rows: usize,
    /// Binary label column whose distribution is compared.
    pub outcome_column: String,
    pub theme: ChartTheme,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            input_delimiter: DEFAULT_DELIMITER,
            preview_rows: 5,
            outcome_column: "y".to_string(),
            theme: ChartTheme::default(),
        }
    }
}

fn delimiter_byte<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.as_bytes() {
        [b] => Ok(*b),
        _ => Err(serde::de::Error::custom(format!(
            "delimiter must be a single ASCII character, got {s:?}"
        ))),
    }
}

impl DashboardConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing dashboard configuration")
    }

    /// Read `path` if it exists, defaults otherwise.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&text)
    }

    /// Like [`load`](Self::load), but a broken file only costs a warning.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring configuration: {e:#}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = DashboardConfig::from_json(r#"{ "preview_rows": 10 }"#).unwrap();
        assert_eq!(config.preview_rows, 10);
        assert_eq!(config.input_delimiter, b';');
        assert_eq!(config.outcome_column, "y");
        assert_eq!(config.theme, ChartTheme::default());
    }

    #[test]
    fn theme_and_delimiter_are_read() {
        let config = DashboardConfig::from_json(
            r#"{ "input_delimiter": ",", "theme": { "show_grid": true, "label_decimals": 1 } }"#,
        )
        .unwrap();
        assert_eq!(config.input_delimiter, b',');
        assert!(config.theme.show_grid);
        assert_eq!(config.theme.label_decimals, 1);
        assert_eq!(config.theme.bar_width, 0.6);
    }

    #[test]
    fn multi_character_delimiter_is_rejected() {
        assert!(DashboardConfig::from_json(r#"{ "input_delimiter": ";;" }"#).is_err());
    }

    #[test]
    fn absent_file_gives_defaults() {
        let config = DashboardConfig::load(Path::new("no/such/telemarketing.json")).unwrap();
        assert_eq!(config, DashboardConfig::default());
    }
}
