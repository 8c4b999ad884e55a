//! Loader for `typeahead.yaml` with environment overlays, plus the persisted
//! user settings document.
//!
//! Precedence, lowest first: built-in defaults, the YAML file (optional),
//! inline YAML snippets, then `TYPEAHEAD__`-prefixed environment variables
//! (`__` separates nesting levels, e.g. `TYPEAHEAD__FETCH__TIMEOUT_SECS=2`).
//! String values may reference `${VAR}`; references are expanded after
//! merging, recursively up to a fixed depth.
//!
//! The user-editable [`Settings`] live in their own JSON document managed by
//! [`SettingsStore`]; the `settings` section of the YAML only seeds a fresh
//! document.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use typeahead_common::observability::LogFormat;
use typeahead_common::{Result, Settings, SettingsHandle, TypeaheadError};
use typeahead_drivers::browser::{BrowserOptions, Viewport, WaitCondition};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "TYPEAHEAD";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TypeaheadConfig {
    /// Seed for a settings document that does not exist yet.
    pub settings: Settings,
    /// Where the settings document lives; defaults to [`SettingsStore::default_path`].
    pub settings_file: Option<PathBuf>,
    pub browser: BrowserOptions,
    pub preview: PreviewConfig,
    pub fetch: FetchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Screenshot directory; the system temp dir when unset.
    pub dir: Option<PathBuf>,
    pub viewport: Viewport,
    pub wait: WaitCondition,
    pub capture_timeout_secs: f64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            dir: None,
            viewport: Viewport::default(),
            wait: WaitCondition::Load,
            capture_timeout_secs: 20.0,
        }
    }
}

/// Seconds as a [`Duration`]. Negative values clamp to zero; infinite or
/// out-of-range values are rejected.
fn secs_to_duration(field: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs.max(0.0))
        .map_err(|e| TypeaheadError::Config(format!("{field} = {secs}: {e}")))
}

impl PreviewConfig {
    pub fn capture_timeout(&self) -> Result<Duration> {
        secs_to_duration("preview.capture_timeout_secs", self.capture_timeout_secs)
    }

    pub fn dir_or_temp(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: f64,
    /// Send provider requests to this origin instead (proxies, fixtures).
    pub base_url: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5.0,
            base_url: None,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Result<Duration> {
        secs_to_duration("fetch.timeout_secs", self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: Option<String>,
    pub format: LogFormat,
    pub stderr: bool,
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

/// Builder over the `config` crate sources.
pub struct TypeaheadConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_source: Environment,
}

impl Default for TypeaheadConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeaheadConfigLoader {
    /// Defaults plus `TYPEAHEAD__` environment overrides.
    ///
    /// ```
    /// use typeahead_config::TypeaheadConfigLoader;
    ///
    /// let config = TypeaheadConfigLoader::new().load().expect("defaults load");
    /// assert_eq!(config.fetch.timeout_secs, 5.0);
    /// assert!(config.settings.always_show_query());
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_source: Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        }
    }

    /// Merge a YAML file; a missing file is skipped.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use typeahead_common::{SearchEngine, SuggestionProvider};
    /// use typeahead_config::TypeaheadConfigLoader;
    ///
    /// let cfg = TypeaheadConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// settings:
    ///   engine: duckduckgo
    ///   provider: brave
    ///   render_preview: true
    /// preview:
    ///   capture_timeout_secs: 8
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.settings.engine(), SearchEngine::DuckDuckGo);
    /// assert_eq!(cfg.settings.provider(), SuggestionProvider::Brave);
    /// assert!(cfg.settings.render_preview());
    /// assert_eq!(cfg.preview.capture_timeout().unwrap().as_secs(), 8);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` references, deserialize and check
    /// that every timeout fits a [`Duration`].
    pub fn load(self) -> std::result::Result<TypeaheadConfig, ConfigError> {
        let cfg = self.builder.add_source(self.env_source).build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);
        if v.is_null() {
            v = Value::Object(Default::default());
        }

        let config: TypeaheadConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        config
            .preview
            .capture_timeout()
            .and(config.fetch.timeout())
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(config)
    }
}

/// The persisted user settings document.
///
/// Reads happen once at open; every change goes through [`SettingsStore::update`],
/// which applies named setters to the shared handle and rewrites the file.
pub struct SettingsStore {
    path: PathBuf,
    handle: SettingsHandle,
    write_lock: Mutex<()>,
}

impl SettingsStore {
    /// `<local data dir>/typeahead/settings.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|d| d.join("typeahead").join("settings.json"))
    }

    /// Load the document at `path`, or start from `seed` when it does not exist.
    /// A document that exists but does not parse is an error.
    pub fn open(path: impl Into<PathBuf>, seed: Settings) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let settings = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw).map_err(|e| {
                TypeaheadError::Settings(format!("{}: {e}", path.display()))
            })?
        } else {
            seed
        };
        Ok(Self {
            path,
            handle: SettingsHandle::new(settings),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Shared handle the controller reads from.
    pub fn handle(&self) -> SettingsHandle {
        self.handle.clone()
    }

    pub fn current(&self) -> Settings {
        self.handle.snapshot()
    }

    /// Write the current settings as pretty JSON.
    pub fn save(&self) -> Result<()> {
        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let json = serde_json::to_string_pretty(&self.handle.snapshot())
            .map_err(|e| TypeaheadError::Settings(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Apply `f`, persist, and return the new settings.
    pub fn update<F: FnOnce(&mut Settings)>(&self, f: F) -> Result<Settings> {
        let updated = self.handle.update(f);
        self.save()?;
        Ok(updated)
    }
}
