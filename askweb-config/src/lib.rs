//! Loader for askweb preferences with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. an optional or required YAML/TOML/JSON file (format inferred by suffix),
//! 2. inline YAML snippets (tests, CLI),
//! 3. `ASKWEB_`-prefixed environment variables (`ASKWEB_OLLAMA_MODEL`,
//!    nested keys with `__`, e.g. `ASKWEB_LOGGING__FORMAT`),
//! 4. explicit overrides from the command line.
//!
//! After merging, `${VAR}` placeholders in string values are expanded from the
//! process environment and the result is validated.
use askweb_common::PromptStyle;
use askweb_common::observability::LogFormat;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:latest";
pub const CONFIG_FILE_NAME: &str = "askweb.yaml";

/// User preferences for one invocation.
///
/// Top-level keys may also be spelled in camelCase (`serperApiKey`,
/// `ollamaBaseUrl`, `ollamaModel`); see [`canonical_key`].
#[derive(Debug, Clone, Deserialize)]
pub struct Preferences {
    pub serper_api_key: String,
    #[serde(default = "default_ollama_base_url")]
    pub ollama_base_url: String,
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
    #[serde(default)]
    pub prompt_style: PromptStyle,
    /// Initial state of the "Use Web Search" toggle.
    #[serde(default = "default_true", deserialize_with = "bool_from_any")]
    pub use_web_search: bool,
    #[serde(default)]
    pub logging: LoggingPrefs,
}

const PREFERENCE_KEYS: &[&str] = &[
    "serper_api_key",
    "ollama_base_url",
    "ollama_model",
    "prompt_style",
    "use_web_search",
    "logging",
];

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingPrefs {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingPrefs {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            filter: default_log_filter(),
        }
    }
}

fn default_ollama_base_url() -> String {
    DEFAULT_OLLAMA_BASE_URL.into()
}
fn default_ollama_model() -> String {
    DEFAULT_OLLAMA_MODEL.into()
}
fn default_log_filter() -> String {
    "info".into()
}
fn default_true() -> bool {
    true
}

// Environment values arrive as strings; YAML gives real booleans.
fn bool_from_any<'de, D>(de: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }

    match Raw::deserialize(de)? {
        Raw::Bool(b) => Ok(b),
        Raw::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean, got {other:?}"
            ))),
        },
    }
}

impl Preferences {
    /// Fill blank optional fields with defaults and strip the base URL's
    /// trailing slash, then validate.
    fn normalize(mut self) -> Result<Self, ConfigError> {
        self.serper_api_key = self.serper_api_key.trim().to_string();
        if self.serper_api_key.is_empty() {
            return Err(ConfigError::Message(
                "serper_api_key must not be empty".to_string(),
            ));
        }

        let base = self.ollama_base_url.trim();
        self.ollama_base_url = if base.is_empty() {
            default_ollama_base_url()
        } else {
            base.trim_end_matches('/').to_string()
        };
        let parsed = url::Url::parse(&self.ollama_base_url).map_err(|e| {
            ConfigError::Message(format!(
                "ollama_base_url is not a valid URL ({}): {e}",
                self.ollama_base_url
            ))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Message(format!(
                "ollama_base_url must use http or https, got {}",
                parsed.scheme()
            )));
        }

        let model = self.ollama_model.trim();
        self.ollama_model = if model.is_empty() {
            default_ollama_model()
        } else {
            model.to_string()
        };

        Ok(self)
    }
}

/// Map any spelling of a top-level key (`serperApiKey`, `serperapikey`,
/// `SERPER_API_KEY`) to its snake_case field name.
pub fn canonical_key(key: &str) -> Option<&'static str> {
    let folded: String = key
        .chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    PREFERENCE_KEYS
        .iter()
        .copied()
        .find(|name| name.replace('_', "") == folded)
}

// Applied per source, so that merging sees one key per field and a later
// source overrides an earlier one whatever casing either used.
fn canonicalize_keys(v: Value) -> Value {
    match v {
        Value::Object(obj) => Value::Object(
            obj.into_iter()
                .map(|(k, val)| match canonical_key(&k) {
                    Some(name) => (name.to_string(), val),
                    None => (k, val),
                })
                .collect(),
        ),
        other => other,
    }
}

/// Default location of the preferences file, e.g.
/// `~/.config/askweb/askweb.yaml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("askweb").join(CONFIG_FILE_NAME))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

enum Layer {
    Path { path: PathBuf, required: bool },
    Yaml(String),
}

impl Layer {
    /// Read this source alone, with its keys canonicalized.
    fn read(&self) -> Result<Value, ConfigError> {
        let builder = Config::builder();
        let builder = match self {
            Layer::Path { path, required } => {
                builder.add_source(File::from(path.as_path()).required(*required))
            }
            Layer::Yaml(yaml) => builder.add_source(File::from_str(yaml, FileFormat::Yaml)),
        };
        let v: Value = builder.build()?.try_deserialize()?;
        Ok(canonicalize_keys(v))
    }
}

/// Builder hides the `config` crate wiring (files + env overrides).
pub struct PreferencesLoader {
    layers: Vec<Layer>,
    overrides: Vec<(String, String)>,
}

impl Default for PreferencesLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferencesLoader {
    /// Start empty; `ASKWEB_` environment overrides are applied by [`load`].
    ///
    /// ```
    /// use askweb_config::PreferencesLoader;
    ///
    /// let prefs = PreferencesLoader::new()
    ///     .with_yaml_str("serper_api_key: abc")
    ///     .load()
    ///     .expect("valid preferences");
    ///
    /// assert_eq!(prefs.serper_api_key, "abc");
    /// assert_eq!(prefs.ollama_base_url, "http://localhost:11434");
    /// assert_eq!(prefs.ollama_model, "llama3.2:latest");
    /// assert!(prefs.use_web_search);
    /// ```
    ///
    /// [`load`]: PreferencesLoader::load
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            overrides: Vec::new(),
        }
    }

    /// Attach a file that must exist.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.layers.push(Layer::Path {
            path: path.as_ref().to_path_buf(),
            required: true,
        });
        self
    }

    /// Attach a file that is skipped when missing, so headless runs can rely
    /// purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.layers.push(Layer::Path {
            path: path.as_ref().to_path_buf(),
            required: false,
        });
        self
    }

    /// Attach the per-user file from [`default_config_path`] if there is one.
    pub fn with_default_file(self) -> Self {
        match default_config_path() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "config.default_file");
                self.with_optional_file(path)
            }
            None => self,
        }
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use askweb_common::PromptStyle;
    /// use askweb_config::PreferencesLoader;
    ///
    /// let prefs = PreferencesLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// serperApiKey: "k"
    /// ollamaBaseUrl: "http://gpu-box:11434/"
    /// ollamaModel: "qwen2.5:7b"
    /// prompt_style: cited
    /// use_web_search: false
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(prefs.ollama_base_url, "http://gpu-box:11434");
    /// assert_eq!(prefs.ollama_model, "qwen2.5:7b");
    /// assert_eq!(prefs.prompt_style, PromptStyle::Cited);
    /// assert!(!prefs.use_web_search);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.layers.push(Layer::Yaml(yaml.to_string()));
        self
    }

    /// Highest-precedence value for `key`; blank values are ignored.
    pub fn with_override(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.overrides.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Consume the builder and deserialize the merged sources into
    /// [`Preferences`].
    ///
    /// ```
    /// use askweb_config::PreferencesLoader;
    ///
    /// unsafe { std::env::set_var("DOC_SERPER_KEY", "injected-from-env"); }
    ///
    /// let prefs = PreferencesLoader::new()
    ///     .with_yaml_str("serper_api_key: \"${DOC_SERPER_KEY}\"")
    ///     .load()
    ///     .expect("valid preferences");
    ///
    /// assert_eq!(prefs.serper_api_key, "injected-from-env");
    ///
    /// unsafe { std::env::remove_var("DOC_SERPER_KEY"); }
    /// ```
    pub fn load(self) -> Result<Preferences, ConfigError> {
        let mut builder = Config::builder();
        for layer in &self.layers {
            let v = layer.read()?;
            builder = builder.add_source(File::from_str(&v.to_string(), FileFormat::Json));
        }
        builder = builder.add_source(
            Environment::with_prefix("ASKWEB")
                .prefix_separator("_")
                .separator("__"),
        );
        for (key, value) in self.overrides {
            builder = builder.set_override(key, value)?;
        }
        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: Preferences =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        typed.normalize()
    }
}
