//! Loader for `cadence.yaml` with environment overlays.
//!
//! Files and inline documents merge in the order they are added. Variables
//! prefixed with `CADENCE__` are layered on top of all of them
//! (`CADENCE__SESSION__SEED=7` sets `session.seed`). String values may
//! reference `${VAR}`; placeholders are expanded after merging. Every field
//! has a default, so an empty document is valid.
use cadence_common::observability::LogFormat;
use cadence_common::ProfileScope;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CadenceConfig {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Pacing of one processing session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seed for a reproducible run.
    pub seed: Option<u64>,
    pub profile_scope: ProfileScope,
    /// Pause on the LIKING/NOPING -> IDLE edges.
    pub settle_delay_ms: u64,
    pub breaks_enabled: bool,
    /// Stop after this many items.
    pub max_items: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            profile_scope: ProfileScope::Session,
            settle_delay_ms: 400,
            breaks_enabled: false,
            max_items: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub emit_stderr: bool,
    pub dir: Option<String>,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            emit_stderr: false,
            dir: None,
            filter: "info".to_string(),
        }
    }
}

/// Behaviour of the dry-run automation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Share of items that qualify for the full engagement path.
    pub positive_rate: f64,
    /// Share of actions reported as failed.
    pub failure_rate: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            positive_rate: 0.35,
            failure_rate: 0.02,
            min_latency_ms: 80,
            max_latency_ms: 400,
        }
    }
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

pub struct CadenceConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for CadenceConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CadenceConfigLoader {
    /// Loader with no files yet; `CADENCE__*` overrides are applied in [`load`](Self::load).
    ///
    /// ```
    /// use cadence_config::CadenceConfigLoader;
    ///
    /// let config = CadenceConfigLoader::new()
    ///     .with_yaml_str("session:\n  seed: 42\n  profile_scope: item")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.session.seed, Some(42));
    /// assert_eq!(config.session.settle_delay_ms, 400);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a file that must exist. Format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge the sources, overlay the environment, expand `${VAR}`
    /// placeholders and deserialize.
    pub fn load(self) -> Result<CadenceConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("CADENCE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    #[test]
    fn expands_nested_placeholders() {
        temp_env::with_vars(
            [("LOG_ROOT", Some("/srv/${APP}")), ("APP", Some("cadence"))],
            || {
                let mut v = json!({ "logging": { "dir": "${LOG_ROOT}/logs" }, "n": [1, "$APP"] });
                expand_env_in_value(&mut v);
                assert_eq!(
                    v,
                    json!({ "logging": { "dir": "/srv/cadence/logs" }, "n": [1, "cadence"] })
                );
            },
        );
    }

    #[test]
    fn cyclic_references_terminate() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x="));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_variables_stay_verbatim() {
        let mut v = json!("dir=${CADENCE_SURELY_UNSET_VAR}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("dir=${CADENCE_SURELY_UNSET_VAR}"));
    }

    #[test]
    #[serial]
    fn empty_document_yields_defaults() {
        let config = CadenceConfigLoader::new().with_yaml_str("{}").load().unwrap();
        assert_eq!(config.session.profile_scope, ProfileScope::Session);
        assert_eq!(config.session.settle_delay_ms, 400);
        assert!(!config.session.breaks_enabled);
        assert_eq!(config.logging.filter, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(config.simulation.positive_rate, 0.35);
        assert_eq!(config.simulation.max_latency_ms, 400);
    }

    #[test]
    #[serial]
    fn environment_wins_over_every_document() {
        temp_env::with_var("CADENCE__SESSION__SETTLE_DELAY_MS", Some("75"), || {
            let config = CadenceConfigLoader::new()
                .with_yaml_str("session:\n  settle_delay_ms: 10\n  seed: 3")
                .with_yaml_str("session:\n  settle_delay_ms: 20")
                .load()
                .unwrap();
            assert_eq!(config.session.settle_delay_ms, 75);
            assert_eq!(config.session.seed, Some(3));
        });
    }
}
