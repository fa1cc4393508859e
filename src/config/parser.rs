use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Guess the format from a file extension, defaulting to TOML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") | Some("json5") | Some("jsonc") => ConfigFormat::Json,
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Toml,
        }
    }
}

/// Configuration parsing options
#[derive(Debug, Clone)]
pub struct ConfigParserOptions {
    pub format: ConfigFormat,
    pub allow_comments: bool,
}

impl Default for ConfigParserOptions {
    fn default() -> Self {
        Self {
            format: ConfigFormat::Toml,
            allow_comments: true,
        }
    }
}

pub struct ConfigParser;

impl ConfigParser {
    /// Parse configuration from a file; the format follows the extension
    pub fn parse_file<T>(path: &Path) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let options = ConfigParserOptions {
            format: ConfigFormat::from_path(path),
            ..Default::default()
        };
        Self::parse_str(&content, &options)
            .with_context(|| format!("Invalid configuration file: {}", path.display()))
    }

    /// Parse configuration from a string
    pub fn parse_str<T>(content: &str, options: &ConfigParserOptions) -> Result<T>
    where
        T: DeserializeOwned,
    {
        match options.format {
            ConfigFormat::Json if options.allow_comments => {
                json5::from_str(content).context("Failed to parse JSON5 configuration")
            }
            ConfigFormat::Json => {
                serde_json::from_str(content).context("Failed to parse JSON configuration")
            }
            ConfigFormat::Toml => toml::from_str(content).context("Failed to parse TOML configuration"),
            ConfigFormat::Yaml => {
                serde_yaml::from_str(content).context("Failed to parse YAML configuration")
            }
        }
    }

    /// Merge layers in order; later layers win key by key.
    pub fn merge_layers<T>(base: &T, overlays: &[serde_json::Value]) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut merged = serde_json::to_value(base)?;
        for overlay in overlays {
            json_patch::merge(&mut merged, overlay);
        }
        serde_json::from_value(merged).context("Merged configuration is invalid")
    }
}

/// Trait for configuration sources
pub trait ConfigSource {
    fn load_config(&self) -> Result<Option<serde_json::Value>>;
}

/// File-based configuration source; a missing file contributes nothing
pub struct FileConfigSource {
    pub path: PathBuf,
}

impl ConfigSource for FileConfigSource {
    fn load_config(&self) -> Result<Option<serde_json::Value>> {
        if !self.path.exists() {
            return Ok(None);
        }
        ConfigParser::parse_file(&self.path).map(Some)
    }
}

/// Environment variable configuration source.
///
/// `PREFIX` + `SECTION__KEY` maps to `{"section": {"key": value}}`. Each
/// variable becomes its own override so a value that looks like a number
/// can still land in a string field.
pub struct EnvConfigSource {
    pub prefix: String,
}

/// A single environment override, nested under its config path
#[derive(Debug, Clone, PartialEq)]
pub struct EnvOverride {
    pub key: String,
    /// The value read as a JSON scalar when it parses as one
    pub typed: serde_json::Value,
    /// The value as the original string
    pub raw: serde_json::Value,
}

impl EnvConfigSource {
    /// Overrides from the process environment, ordered by variable name
    pub fn overrides(&self) -> Vec<EnvOverride> {
        self.overrides_from(std::env::vars())
    }

    pub(crate) fn overrides_from<I>(&self, vars: I) -> Vec<EnvOverride>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut overrides: Vec<EnvOverride> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                let rest = key.strip_prefix(&self.prefix)?;
                let path: Vec<String> = rest
                    .split("__")
                    .filter(|part| !part.is_empty())
                    .map(str::to_lowercase)
                    .collect();
                if path.is_empty() {
                    return None;
                }

                let typed = match serde_json::from_str::<serde_json::Value>(&value) {
                    Ok(v) if !v.is_object() && !v.is_array() => v,
                    _ => serde_json::Value::String(value.clone()),
                };
                Some(EnvOverride {
                    typed: nest(&path, typed),
                    raw: nest(&path, serde_json::Value::String(value)),
                    key,
                })
            })
            .collect();
        overrides.sort_by(|a, b| a.key.cmp(&b.key));
        overrides
    }
}

fn nest(path: &[String], leaf: serde_json::Value) -> serde_json::Value {
    path.iter().rev().fold(leaf, |inner, part| {
        let mut map = serde_json::Map::new();
        map.insert(part.clone(), inner);
        serde_json::Value::Object(map)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use std::io::Write;
    use tempfile::Builder;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestConfig {
        name: String,
        version: u32,
        enabled: bool,
    }

    #[test]
    fn test_json5_parsing_allows_comments() {
        let content = r#"{
            // comment
            "name": "test", "version": 1, "enabled": true
        }"#;
        let options = ConfigParserOptions {
            format: ConfigFormat::Json,
            allow_comments: true,
        };
        let config: TestConfig = ConfigParser::parse_str(content, &options).unwrap();
        assert_eq!(
            config,
            TestConfig {
                name: "test".to_string(),
                version: 1,
                enabled: true,
            }
        );
    }

    #[test]
    fn test_strict_json_rejects_comments() {
        let options = ConfigParserOptions {
            format: ConfigFormat::Json,
            allow_comments: false,
        };
        let result: Result<TestConfig> = ConfigParser::parse_str("// no\n{}", &options);
        assert!(result.is_err());
    }

    #[test]
    fn test_yaml_file_detected_by_extension() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "name: yaml\nversion: 3\nenabled: false").unwrap();

        let config: TestConfig = ConfigParser::parse_file(file.path()).unwrap();
        assert_eq!(config.name, "yaml");
        assert_eq!(config.version, 3);
    }

    #[test]
    fn test_layers_merge_in_order() {
        let base = TestConfig {
            name: "base".to_string(),
            version: 1,
            enabled: false,
        };
        let merged: TestConfig = ConfigParser::merge_layers(
            &base,
            &[
                serde_json::json!({"version": 2}),
                serde_json::json!({"enabled": true, "version": 5}),
            ],
        )
        .unwrap();

        assert_eq!(
            merged,
            TestConfig {
                name: "base".to_string(),
                version: 5,
                enabled: true,
            }
        );
    }

    #[test]
    fn test_env_vars_become_nested_overrides() {
        let source = EnvConfigSource {
            prefix: "APP__".to_string(),
        };
        let vars = vec![
            ("APP__STORE__PATH".to_string(), "/tmp/students.db".to_string()),
            ("APP__MODEL__SPLIT_SEED".to_string(), "7".to_string()),
            ("OTHER__KEY".to_string(), "ignored".to_string()),
        ];

        let overrides = source.overrides_from(vars);
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides[0].key, "APP__MODEL__SPLIT_SEED");
        assert_eq!(overrides[0].typed, serde_json::json!({"model": {"split_seed": 7}}));
        assert_eq!(overrides[0].raw, serde_json::json!({"model": {"split_seed": "7"}}));
        assert_eq!(
            overrides[1].typed,
            serde_json::json!({"store": {"path": "/tmp/students.db"}})
        );
    }

    #[test]
    fn test_env_without_matches_is_empty() {
        let source = EnvConfigSource {
            prefix: "APP__".to_string(),
        };
        assert!(source.overrides_from(Vec::new()).is_empty());
        assert!(source
            .overrides_from(vec![("APP__".to_string(), "x".to_string())])
            .is_empty());
    }
}
