//! AudioAddict preferences
//!
//! Preferences live in a YAML file (`~/.pmoaudioaddict/config.yaml` by
//! default) merged over built-in defaults. Any value can be overridden from
//! the environment with `PMOAUDIOADDICT_CONFIG__<PATH>`, path segments being
//! separated by `__`:
//!
//! ```text
//! PMOAUDIOADDICT_CONFIG__LISTEN_KEY=0123456789abcdef
//! PMOAUDIOADDICT_CONFIG__STREAM_PREF__DI=premium_high
//! ```
//!
//! # Example
//!
//! ```no_run
//! use pmoaudioaddict::AudioAddictConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AudioAddictConfig::load(AudioAddictConfig::default_path())?;
//! let mut client = config.build_client()?;
//! config.apply(&mut client, "di")?;
//! # Ok(())
//! # }
//! ```

use crate::client::AudioAddictClient;
use crate::tiers::DEFAULT_TIER;
use crate::transport::DEFAULT_REQUEST_TIMEOUT_SECS;
use anyhow::{anyhow, Result};
use serde::de::{Error as _, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const ENV_CONFIG_DIR: &str = "PMOAUDIOADDICT_CONFIG";
const ENV_PREFIX: &str = "PMOAUDIOADDICT_CONFIG__";

/// User preferences for the AudioAddict source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioAddictConfig {
    /// Subscriber listen key; unset for public streams
    #[serde(deserialize_with = "scalar_string")]
    pub listen_key: Option<String>,
    /// Preferred tier per service id (e.g. `di: premium_high`)
    pub stream_pref: BTreeMap<String, String>,
    /// Substring pinning source selection
    #[serde(deserialize_with = "scalar_string")]
    pub source_pref: Option<String>,
    /// Re-resolve stream URLs instead of reusing cached ones
    pub force_refresh: bool,
    /// Show codec, bitrate and URL in item summaries
    pub debug: bool,
    pub request_timeout_secs: u64,
    /// Where resolved stream URLs are persisted, if anywhere
    pub stream_cache_path: Option<PathBuf>,
}

/// Accept any YAML scalar as a string: an all-digit key must not fail to load
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(D::Error::custom("expected a string")),
    }
}

impl Default for AudioAddictConfig {
    fn default() -> Self {
        Self {
            listen_key: None,
            stream_pref: BTreeMap::new(),
            source_pref: None,
            force_refresh: false,
            debug: false,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            stream_cache_path: None,
        }
    }
}

impl AudioAddictConfig {
    /// `$PMOAUDIOADDICT_CONFIG/config.yaml`, else `~/.pmoaudioaddict/config.yaml`
    pub fn default_path() -> PathBuf {
        let dir = env::var_os(ENV_CONFIG_DIR)
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".pmoaudioaddict")))
            .unwrap_or_else(|| PathBuf::from(".pmoaudioaddict"));
        dir.join("config.yaml")
    }

    /// Load preferences from `path` (if it exists) with environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = match fs::read_to_string(path) {
            Ok(data) => {
                info!(config_file = %path.display(), "Loaded config file");
                data
            }
            Err(_) => {
                info!(config_file = %path.display(), "Config file not found, using defaults");
                String::new()
            }
        };

        Self::from_yaml_with_overrides(&yaml, env::vars())
    }

    /// Parse preferences from YAML, without environment overrides
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::from_yaml_with_overrides(yaml, std::iter::empty())
    }

    fn from_yaml_with_overrides(
        yaml: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self> {
        let mut value = serde_yaml::to_value(Self::default())?;

        let external: Value = if yaml.trim().is_empty() {
            Value::Mapping(Mapping::new())
        } else {
            serde_yaml::from_str::<LenientValue>(yaml)?.0
        };
        merge_yaml(&mut value, lower_keys(external));

        for (key, raw) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let path: Vec<String> = stripped.split("__").map(str::to_lowercase).collect();
                set_path(&mut value, &path, convert_env_value(&raw))?;
            }
        }

        Ok(serde_yaml::from_value(value)?)
    }

    /// Write preferences as YAML, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Preferred tier for a service, [`DEFAULT_TIER`] when unset
    pub fn tier_for(&self, service: &str) -> &str {
        self.stream_pref
            .get(service)
            .map(String::as_str)
            .unwrap_or(DEFAULT_TIER)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build a network client honouring the configured timeout
    pub fn build_client(&self) -> crate::Result<AudioAddictClient> {
        AudioAddictClient::builder()
            .timeout(self.request_timeout())
            .build()
    }

    /// Configure `client` for `service`: service, listen key, tier, source preference
    pub fn apply(&self, client: &mut AudioAddictClient, service: &str) -> crate::Result<()> {
        client.select_service(service)?;
        client.set_listen_key(self.listen_key.clone());
        client.select_stream_tier(self.tier_for(service))?;
        client.set_preferred_source(self.source_pref.clone());
        Ok(())
    }
}

/// Recursively merge `overlay` into `base`; non-mapping values replace
fn merge_yaml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn lower_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let k = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (k, lower_keys(v))
                })
                .collect(),
        ),
        other => other,
    }
}

fn set_path(data: &mut Value, path: &[String], value: Value) -> Result<()> {
    let Some((head, rest)) = path.split_first() else {
        *data = value;
        return Ok(());
    };

    if data.is_null() {
        *data = Value::Mapping(Mapping::new());
    }

    let Value::Mapping(map) = data else {
        return Err(anyhow!("Cannot override {}: parent is not a map", head));
    };

    let entry = map
        .entry(Value::String(head.clone()))
        .or_insert(Value::Null);
    set_path(entry, rest, value)
}

fn convert_env_value(value: &str) -> Value {
    serde_yaml::from_str::<LenientValue>(value)
        .map(|v| v.0)
        .unwrap_or_else(|_| Value::String(value.to_string()))
}

/// A YAML value where integers too wide for 64 bits are kept as strings.
///
/// `serde_yaml::Value` rejects them outright, which would make an unquoted
/// all-digit listen key fail the whole file.
struct LenientValue(Value);

impl<'de> Deserialize<'de> for LenientValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LenientVisitor).map(LenientValue)
    }
}

struct LenientVisitor;

impl<'de> Visitor<'de> for LenientVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any YAML value")
    }

    fn visit_bool<E>(self, v: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_i128<E>(self, v: i128) -> std::result::Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_u128<E>(self, v: u128) -> std::result::Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_f64<E>(self, v: f64) -> std::result::Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        LenientValue::deserialize(deserializer).map(|v| v.0)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(LenientValue(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut mapping = Mapping::new();
        while let Some((LenientValue(key), LenientValue(value))) = map.next_entry()? {
            mapping.insert(key, value);
        }
        Ok(Value::Mapping(mapping))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AudioAddictConfig::from_yaml_str("").unwrap();
        assert_eq!(config, AudioAddictConfig::default());
        assert_eq!(config.tier_for("di"), DEFAULT_TIER);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_yaml_merges_over_defaults() {
        let config = AudioAddictConfig::from_yaml_str(
            "Listen_Key: abc\nstream_pref:\n  di: premium_high\n  rock: android_premium_high\ndebug: true\n",
        )
        .unwrap();

        assert_eq!(config.listen_key.as_deref(), Some("abc"));
        assert_eq!(config.tier_for("di"), "premium_high");
        assert_eq!(config.tier_for("jazz"), DEFAULT_TIER);
        assert!(config.debug);
        assert!(!config.force_refresh);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_env_overrides() {
        let vars = vec![
            ("PMOAUDIOADDICT_CONFIG__STREAM_PREF__JAZZ".to_string(), "premium".to_string()),
            ("PMOAUDIOADDICT_CONFIG__FORCE_REFRESH".to_string(), "true".to_string()),
            ("PMOAUDIOADDICT_CONFIG__REQUEST_TIMEOUT_SECS".to_string(), "5".to_string()),
            ("UNRELATED".to_string(), "x".to_string()),
        ];
        let config =
            AudioAddictConfig::from_yaml_with_overrides("source_pref: prem2\n", vars).unwrap();

        assert_eq!(config.tier_for("jazz"), "premium");
        assert!(config.force_refresh);
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.source_pref.as_deref(), Some("prem2"));
    }

    #[test]
    fn test_numeric_listen_key() {
        let vars = vec![(
            "PMOAUDIOADDICT_CONFIG__LISTEN_KEY".to_string(),
            "123456".to_string(),
        )];
        let config = AudioAddictConfig::from_yaml_with_overrides("", vars).unwrap();
        assert_eq!(config.listen_key.as_deref(), Some("123456"));

        let config = AudioAddictConfig::from_yaml_str("listen_key: 4711\n").unwrap();
        assert_eq!(config.listen_key.as_deref(), Some("4711"));
    }

    #[test]
    fn test_wide_numeric_listen_key() {
        let config =
            AudioAddictConfig::from_yaml_str("listen_key: 123456789012345678901234\ndebug: true\n")
                .unwrap();
        assert_eq!(config.listen_key.as_deref(), Some("123456789012345678901234"));
        assert!(config.debug);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = AudioAddictConfig::default();
        config.listen_key = Some("key".into());
        config.stream_pref.insert("di".into(), "premium_high".into());
        config.save(&path).unwrap();

        let yaml = fs::read_to_string(&path).unwrap();
        let loaded = AudioAddictConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(loaded, config);
    }
}
