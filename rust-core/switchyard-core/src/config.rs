//! # Configuration
//!
//! Layered configuration assembled from pluggable providers on top of
//! [`figment`].
//!
//! Each [`ConfigProvider`] yields one figment layer. [`Config::load`] reads
//! every layer, flattens nested maps with `.` and lowercases every key, then
//! merges the normalized layers in order (later providers override earlier
//! ones). `http.listenAddress`, `HTTP.LISTENADDRESS` and
//! `{"http": {"listenAddress": ..}}` all end up under `http.listenaddress`.

use crate::error::{Error, Result};
use crate::value::Value;
use crate::value_map::ValueMap;
use figment::providers::{Env, Format, Json, Serialized};
use figment::Figment;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Separator used when flattening nested configuration
pub const KEY_SEPARATOR: &str = ".";

/// A source of configuration values
pub trait ConfigProvider {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// The figment layer this provider contributes
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be turned into a layer
    fn layer(&self) -> Result<Figment>;

    /// Read every value this provider knows about
    ///
    /// # Errors
    ///
    /// Returns an error if the source is unreadable or malformed
    fn load(&self) -> Result<ValueMap> {
        extract(&self.layer()?)
    }
}

/// Command-line `-key value` pairs
///
/// A flag followed by another flag, or by nothing, is set to `true`.
#[derive(Debug, Clone, Default)]
pub struct ArgsProvider {
    args: Vec<String>,
}

impl ArgsProvider {
    /// Use an explicit argument list (program name excluded)
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Use the process arguments
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(std::env::args().skip(1))
    }

    fn parse(&self) -> Result<ValueMap> {
        let mut params = ValueMap::new();
        let mut pending: Option<&str> = None;

        for arg in &self.args {
            if let Some(flag) = arg.strip_prefix('-') {
                if let Some(key) = pending.replace(flag.trim_start_matches('-')) {
                    params.set(key, true);
                }
                continue;
            }

            let Some(key) = pending.take() else {
                return Err(Error::Config {
                    message: format!("loose configuration value: {arg}"),
                });
            };
            params.set(key, arg.as_str());
        }

        if let Some(key) = pending {
            params.set(key, true);
        }

        Ok(params)
    }
}

impl ConfigProvider for ArgsProvider {
    fn name(&self) -> &'static str {
        "args"
    }

    fn layer(&self) -> Result<Figment> {
        Ok(Figment::from(Serialized::defaults(self.parse()?)))
    }
}

/// Environment variables sharing a prefix
///
/// `SWITCHYARD_HTTP_LISTENADDRESS` with prefix `SWITCHYARD` becomes
/// `http.listenaddress`.
#[derive(Debug, Clone)]
pub struct EnvironmentProvider {
    prefix: String,
}

impl EnvironmentProvider {
    /// Match variables named `<prefix>_*`
    pub fn new(prefix: impl AsRef<str>) -> Self {
        Self {
            prefix: format!("{}_", prefix.as_ref()),
        }
    }
}

impl ConfigProvider for EnvironmentProvider {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn layer(&self) -> Result<Figment> {
        Ok(Figment::from(Env::prefixed(&self.prefix).split("_")))
    }
}

/// A JSON object document on disk
///
/// A missing file is treated as empty.
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    /// Read from an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read `<executable>.json`
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the executable path cannot be determined
    pub fn beside_executable() -> Result<Self> {
        let mut path = std::env::current_exe()?.into_os_string();
        path.push(".json");
        Ok(Self::new(path))
    }

    /// Location of the document
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for FileProvider {
    fn name(&self) -> &'static str {
        "file"
    }

    fn layer(&self) -> Result<Figment> {
        if !self.path.is_file() {
            debug!(path = %self.path.display(), "No configuration file");
            return Ok(Figment::new());
        }
        Ok(Figment::from(Json::file(&self.path)))
    }
}

/// Merged, case-insensitive configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: ValueMap,
}

impl Config {
    /// Merge providers in order; later providers win
    ///
    /// Keys are normalized per provider before merging, so an override
    /// matches regardless of case. A failing provider is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the merged layers cannot be extracted
    pub fn load(providers: &[Box<dyn ConfigProvider>]) -> Result<Self> {
        let mut figment = Figment::new();
        for provider in providers {
            match provider.load() {
                Ok(values) => {
                    debug!(
                        provider = provider.name(),
                        keys = values.len(),
                        "Configuration loaded"
                    );
                    figment = figment.merge(Serialized::defaults(normalize(&values)));
                }
                Err(e) => error!(
                    provider = provider.name(),
                    error = %e,
                    "Configuration provider failed"
                ),
            }
        }
        Ok(Self {
            values: extract(&figment)?,
        })
    }

    /// Build from an in-memory map
    #[must_use]
    pub fn from_values(values: &ValueMap) -> Self {
        Self {
            values: normalize(values),
        }
    }

    /// Get a raw value, or `default`
    #[must_use]
    pub fn get(&self, name: &str, default: Value) -> Value {
        self.values.get_or(&name.to_lowercase(), default)
    }

    /// Get a string value, or `default`
    #[must_use]
    pub fn get_string(&self, name: &str, default: &str) -> String {
        self.values.get_string(&name.to_lowercase(), default)
    }

    /// Get an integer value, or `default`
    #[must_use]
    pub fn get_int(&self, name: &str, default: i64) -> i64 {
        self.values.get_int(&name.to_lowercase(), default)
    }

    /// Get a float value, or `default`
    #[must_use]
    pub fn get_float(&self, name: &str, default: f64) -> f64 {
        self.values.get_float(&name.to_lowercase(), default)
    }

    /// Get a boolean value, or `default`
    #[must_use]
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        self.values.get_bool(&name.to_lowercase(), default)
    }

    /// Every merged value
    #[must_use]
    pub fn values(&self) -> &ValueMap {
        &self.values
    }
}

fn normalize(values: &ValueMap) -> ValueMap {
    values.flatten(KEY_SEPARATOR).lowercase_keys()
}

fn extract(figment: &Figment) -> Result<ValueMap> {
    let document: serde_json::Value = figment.extract().map_err(|e| Error::Config {
        message: e.to_string(),
    })?;
    match document {
        serde_json::Value::Object(fields) => Ok(fields
            .into_iter()
            .map(|(key, value)| (key, Value::from(value)))
            .collect()),
        other => Err(Error::Config {
            message: format!("expected a configuration table, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl ConfigProvider for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn layer(&self) -> Result<Figment> {
            Err(Error::Config {
                message: "unavailable".to_string(),
            })
        }
    }

    struct Fixed(ValueMap);

    impl ConfigProvider for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn layer(&self) -> Result<Figment> {
            Ok(Figment::from(Serialized::defaults(self.0.clone())))
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("switchyard-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_args_pairs_and_flags() {
        let provider = ArgsProvider::new([
            "-http.listenAddress",
            "0.0.0.0:9000",
            "--verbose",
            "-port",
            "81",
        ]);
        let params = provider.load().unwrap();

        assert_eq!(params.get_string("http.listenAddress", ""), "0.0.0.0:9000");
        assert!(params.get_bool("verbose", false));
        assert_eq!(params.get_int("port", 0), 81);
    }

    #[test]
    fn test_args_trailing_flag() {
        let params = ArgsProvider::new(["-debug"]).load().unwrap();
        assert_eq!(params.get("debug"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_args_loose_value() {
        let err = ArgsProvider::new(["stray"]).load().unwrap_err();
        assert!(err.to_string().contains("loose configuration value: stray"));
    }

    #[test]
    fn test_environment_prefix() {
        std::env::set_var("SWITCHYARD_ENVTEST_HTTP_KEEPALIVE", "true");
        std::env::set_var("SWITCHYARD_ENVTEST_HTTP_LISTENADDRESS", "0.0.0.0:9100");
        std::env::set_var("OTHER_ENVTEST_HTTP_KEEPALIVE", "false");

        let providers: Vec<Box<dyn ConfigProvider>> =
            vec![Box::new(EnvironmentProvider::new("SWITCHYARD_ENVTEST"))];
        let config = Config::load(&providers).unwrap();

        assert_eq!(config.values().len(), 2);
        assert!(config.get_bool("http.keepalive", false));
        assert_eq!(config.get_string("http.listenAddress", ""), "0.0.0.0:9100");
    }

    #[test]
    fn test_file_flattens_document() {
        let path = temp_path("flatten.json");
        std::fs::write(
            &path,
            r#"{"http": {"listenAddress": "127.0.0.1:7000", "maxBodySize": 10}}"#,
        )
        .unwrap();

        let providers: Vec<Box<dyn ConfigProvider>> = vec![Box::new(FileProvider::new(&path))];
        let config = Config::load(&providers).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.get_string("http.listenAddress", ""), "127.0.0.1:7000");
        assert_eq!(config.values().get_int("http.maxbodysize", 0), 10);
    }

    #[test]
    fn test_file_missing_is_empty() {
        let provider = FileProvider::new(temp_path("does-not-exist.json"));
        assert!(provider.load().unwrap().is_empty());
    }

    #[test]
    fn test_file_rejects_non_object() {
        let path = temp_path("array.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let result = FileProvider::new(&path).load();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_args_override_file() {
        let path = temp_path("override.json");
        std::fs::write(&path, r#"{"HTTP": {"KeepAlive": false, "maxBodySize": 64}}"#).unwrap();

        let providers: Vec<Box<dyn ConfigProvider>> = vec![
            Box::new(FileProvider::new(&path)),
            Box::new(ArgsProvider::new(["-http.keepAlive"])),
        ];
        let config = Config::load(&providers).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(config.get_bool("http.keepalive", false));
        assert_eq!(config.get_int("http.maxBodySize", 0), 64);
    }

    #[test]
    fn test_load_merges_in_order_and_skips_failures() {
        let mut base = ValueMap::new();
        base.set("HTTP.KeepAlive", false).set("name", "base");
        let mut overrides = ValueMap::new();
        overrides.set("http.keepalive", true);

        let providers: Vec<Box<dyn ConfigProvider>> = vec![
            Box::new(Fixed(base)),
            Box::new(Failing),
            Box::new(Fixed(overrides)),
        ];
        let config = Config::load(&providers).unwrap();

        assert!(config.get_bool("http.keepAlive", false));
        assert_eq!(config.get_string("NAME", ""), "base");
        assert_eq!(config.get_int("missing", 7), 7);
    }

    #[test]
    fn test_from_values_flattens_nested_maps() {
        let mut http = ValueMap::new();
        http.set("ShutdownTimeout", 5);
        let mut values = ValueMap::new();
        values.set("http", http);

        let config = Config::from_values(&values);
        assert_eq!(config.get_int("http.shutdowntimeout", 30), 5);
        assert!((config.get_float("http.shutdownTimeout", 0.0) - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.get("absent", Value::Null), Value::Null);
    }
}
