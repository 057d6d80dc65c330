//! Settings file handling.
//!
//! Settings are read from `rollup.toml` in the working directory, or from
//! the file given with `--config`. Every field is optional.

use std::error::Error;
use std::path::Path;

use rollup::{ExportFormat, FilterConfig, InferenceConfig, ParserConfig, RollupConfig};
use serde::{Deserialize, Serialize};

const DEFAULT_PATH: &str = "rollup.toml";

/// Root settings structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub parser: ParserSettings,

    #[serde(default)]
    pub inference: InferenceSettings,

    #[serde(default)]
    pub filter: FilterSettings,

    #[serde(default)]
    pub output: OutputSettings,
}

/// Input parsing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserSettings {
    /// Field delimiter: a single character, or "tab". Detected when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,

    /// Whether the first row holds column names.
    #[serde(default = "default_true")]
    pub has_header: bool,

    /// Stop reading after this many rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<usize>,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
        }
    }
}

/// Column classification thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceSettings {
    /// Share of parseable timestamps above which a column is time-like.
    #[serde(default = "default_threshold")]
    pub time_threshold: f64,

    /// Share of parseable numbers above which a column is numeric-like.
    #[serde(default = "default_threshold")]
    pub numeric_threshold: f64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            time_threshold: default_threshold(),
            numeric_threshold: default_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Numeric keys with at most this many values are listed individually.
    #[serde(default = "default_discrete_limit")]
    pub discrete_limit: usize,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            discrete_limit: default_discrete_limit(),
        }
    }
}

/// Export defaults used when the command line does not say otherwise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: ExportFormat,

    #[serde(default)]
    pub bom: bool,
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> f64 {
    0.5
}

fn default_discrete_limit() -> usize {
    FilterConfig::default().discrete_limit
}

impl Settings {
    /// Load settings from a file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let settings: Settings = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))?;

        Ok(settings)
    }

    /// Settings from `path` when given, else `./rollup.toml` when present,
    /// else the defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_PATH);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Library configuration described by these settings.
    pub fn rollup_config(&self) -> Result<RollupConfig, Box<dyn Error>> {
        let delimiter = self
            .parser
            .delimiter
            .as_deref()
            .map(parse_delimiter)
            .transpose()?;

        for (name, value) in [
            ("time_threshold", self.inference.time_threshold),
            ("numeric_threshold", self.inference.numeric_threshold),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(format!("{} must be in [0, 1), got {}", name, value).into());
            }
        }

        Ok(RollupConfig {
            parser: ParserConfig {
                delimiter,
                has_header: self.parser.has_header,
                max_rows: self.parser.max_rows,
                ..ParserConfig::default()
            },
            inference: InferenceConfig {
                time_threshold: self.inference.time_threshold,
                numeric_threshold: self.inference.numeric_threshold,
            },
            filter: FilterConfig {
                discrete_limit: self.filter.discrete_limit,
            },
        })
    }

    /// Default settings as TOML, for `rollup init-config`.
    pub fn default_toml() -> String {
        let settings = Settings::default();
        toml::to_string_pretty(&settings).unwrap_or_else(|_| String::new())
    }
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        v if v.len() == 1 && v.is_ascii() => Ok(v.as_bytes()[0]),
        v => Err(format!(
            "Invalid delimiter: {:?}. Use a single character or \"tab\".",
            v
        )),
    }
}
