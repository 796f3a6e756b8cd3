//! Run configuration helpers.
//!
//! This module loads, validates, and stubs the JSON file that declares
//! libraries, simulator options, testbench generics, and the backend command.
use crate::library::normalize_library_name;
use anyhow::{anyhow, Context, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Config file name looked up when `--config` is omitted.
pub const DEFAULT_CONFIG_FILE: &str = "simh.json";

/// Top-level run configuration.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendConfig>,
    #[serde(default)]
    pub libraries: Vec<LibraryConfig>,
    #[serde(default)]
    pub sim_options: BTreeMap<String, Value>,
    #[serde(default)]
    pub testbenches: Vec<TestbenchConfig>,
    /// Reject generic names or values containing `,` or `:`.
    #[serde(default)]
    pub strict_generics: bool,
}

/// External simulation backend invocation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Shell-style command line; `{manifest}`, `{test}`, and `{generics}`
    /// are substituted per test.
    pub command: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// One library and its source locations, in the order they are added.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LibraryConfig {
    pub name: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// A testbench entity and its generic configurations.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TestbenchConfig {
    pub library: String,
    pub name: String,
    #[serde(default)]
    pub configs: Vec<TestConfig>,
}

/// A named generic configuration of one testbench.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    pub name: String,
    #[serde(default)]
    pub generics: OrderedGenerics,
}

/// Generic values in document order.
///
/// JSON objects are unordered in `serde_json::Map`, so the pairs are read
/// with a dedicated visitor to keep file order as encoding order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedGenerics(pub Vec<(String, Value)>);

impl OrderedGenerics {
    pub fn pairs(&self) -> &[(String, Value)] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for OrderedGenerics {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct GenericsVisitor;

        impl<'de> Visitor<'de> for GenericsVisitor {
            type Value = OrderedGenerics;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping generic names to values")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs: Vec<(String, Value)> = Vec::new();
                while let Some((name, value)) = map.next_entry::<String, Value>()? {
                    if pairs.iter().any(|(existing, _)| *existing == name) {
                        return Err(de::Error::custom(format!("duplicate generic {name:?}")));
                    }
                    pairs.push((name, value));
                }
                Ok(OrderedGenerics(pairs))
            }
        }

        deserializer.deserialize_map(GenericsVisitor)
    }
}

impl Serialize for OrderedGenerics {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Build the config written by `simh init`.
///
/// Mirrors a typical layout: the design library collects local testbenches
/// plus shared sources, and vendor simulation models live in their own
/// library.
pub fn default_config() -> RunConfig {
    RunConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        backend: Some(BackendConfig {
            command: "./run_backend.sh {manifest}".to_string(),
            env: BTreeMap::new(),
        }),
        libraries: vec![
            LibraryConfig {
                name: "lib".to_string(),
                sources: vec!["./*.vhd".to_string()],
            },
            LibraryConfig {
                name: "fmf".to_string(),
                sources: vec!["../library/fmf/*.vhd".to_string()],
            },
        ],
        sim_options: BTreeMap::from([("disable_ieee_warnings".to_string(), json!(1))]),
        testbenches: vec![TestbenchConfig {
            library: "lib".to_string(),
            name: "tb_top".to_string(),
            configs: vec![TestConfig {
                name: "default".to_string(),
                generics: OrderedGenerics(vec![
                    ("width".to_string(), json!(8)),
                    ("enable".to_string(), json!(true)),
                ]),
            }],
        }],
        strict_generics: false,
    }
}

/// Render a pretty JSON config stub for new projects.
pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&default_config()).context("serialize config stub")
}

/// Load a run configuration from `path`.
pub fn load_config(path: &Path) -> Result<RunConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: RunConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    Ok(config)
}

/// Persist a config to disk in a stable JSON format.
pub fn write_config(path: &Path, config: &RunConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Validate schema version, names, and cross references.
pub fn validate_config(config: &RunConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {} (expected {CONFIG_SCHEMA_VERSION})",
            config.schema_version
        ));
    }

    if let Some(backend) = &config.backend {
        let words = shell_words::split(&backend.command)
            .with_context(|| format!("parse backend command: {}", backend.command))?;
        if words.is_empty() {
            return Err(anyhow!("backend command must be non-empty"));
        }
    }

    let mut library_names = Vec::new();
    for library in &config.libraries {
        let name = normalize_library_name(&library.name)?;
        if library_names.contains(&name) {
            return Err(anyhow!("library {:?} is declared twice", library.name));
        }
        library_names.push(name);
    }

    let mut test_ids = Vec::new();
    for testbench in &config.testbenches {
        let library = normalize_library_name(&testbench.library)?;
        if !library_names.contains(&library) {
            return Err(anyhow!(
                "testbench {:?} references undeclared library {:?}",
                testbench.name,
                testbench.library
            ));
        }
        validate_segment(&testbench.name, "testbench name")?;
        let base = format!("{library}.{}", testbench.name);
        let mut ids = Vec::new();
        if testbench.configs.is_empty() {
            ids.push(base);
        } else {
            for test_config in &testbench.configs {
                validate_segment(&test_config.name, "config name")?;
                ids.push(format!("{base}.{}", test_config.name));
            }
        }
        for id in ids {
            if test_ids.contains(&id) {
                return Err(anyhow!("test {id} is declared twice"));
            }
            test_ids.push(id);
        }
    }
    Ok(())
}

fn validate_segment(value: &str, label: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("{label} must be non-empty"));
    }
    if value.contains('.') || value.contains(char::is_whitespace) {
        return Err(anyhow!(
            "{label} {value:?} must not contain '.' or whitespace"
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
