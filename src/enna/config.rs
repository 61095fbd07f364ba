//! Layered configuration
//!
//! `defaults/enna.default.toml` is embedded into the crate so documented defaults and
//! runtime behavior cannot drift apart. [`Loader`] layers user files, `ENNA__SECTION__KEY`
//! environment variables and explicit overrides on top before deserializing into
//! [`EnnaConfig`].

use crate::enna::io::RetryPolicy;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../../defaults/enna.default.toml");

/// Prefix of environment overrides, e.g. `ENNA__RENDER__OUTPUT_DIR`
pub const ENV_PREFIX: &str = "ENNA";

/// Per-project configuration file name
pub const PROJECT_FILE: &str = "enna.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnnaConfig {
    pub cache: CacheConfig,
    pub render: RenderConfig,
    pub io: IoConfig,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CacheConfig {
    pub line_width: usize,
}

/// Where and how rendered scripts are written
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderConfig {
    pub output_dir: String,
    pub script_extension: String,
    pub write_on_node_errors: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IoConfig {
    pub attempts: u32,
    pub retry_delay_ms: u64,
}

impl IoConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiagnosticsConfig {
    pub space_placeholder: String,
}

/// Builds an [`EnnaConfig`] from the embedded defaults plus user layers
///
/// Layers apply in call order, later ones winning: the `enna.toml` next to the working
/// directory, an explicit `--config` file, the environment, then typed overrides from
/// command-line flags.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            builder: Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml)),
        }
    }

    fn layer(mut self, path: &Path, required: bool) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path).format(FileFormat::Toml).required(required));
        self
    }

    fn set<I: Into<ValueKind>>(mut self, key: &str, value: I) -> Result<Self, ConfigError> {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Layer the project file `enna.toml` from `dir` when one exists
    pub fn with_project_file(self, dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(PROJECT_FILE);
        self.layer(&path, false)
    }

    /// Layer a file the user named explicitly; a missing file fails the build
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), true)
    }

    /// Layer `ENNA__SECTION__KEY` environment variables
    pub fn with_env(mut self) -> Self {
        self.builder = self.builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );
        self
    }

    pub fn output_dir(self, dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        self.set("render.output_dir", dir.as_ref().display().to_string())
    }

    pub fn write_on_node_errors(self, write: bool) -> Result<Self, ConfigError> {
        self.set("render.write_on_node_errors", write)
    }

    /// Replace the retry policy for scenario reads and writes
    pub fn retry(self, policy: RetryPolicy) -> Result<Self, ConfigError> {
        let delay_ms = i64::try_from(policy.delay.as_millis()).unwrap_or(i64::MAX);
        self.set("io.attempts", i64::from(policy.attempts))?
            .set("io.retry_delay_ms", delay_ms)
    }

    pub fn build(self) -> Result<EnnaConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_defaults() {
        let config = Loader::new().build().expect("defaults to deserialize");
        assert_eq!(config.cache.line_width, crate::enna::codec::DEFAULT_LINE_WIDTH);
        assert_eq!(config.render.output_dir, "Scripts");
        assert_eq!(config.render.script_extension, ".py");
        assert!(config.render.write_on_node_errors);
        assert_eq!(config.io.retry_policy(), RetryPolicy::default());
        assert_eq!(config.diagnostics.space_placeholder, "°");
    }

    #[test]
    fn test_typed_overrides() {
        let config = Loader::new()
            .output_dir("out")
            .expect("override to apply")
            .write_on_node_errors(false)
            .expect("override to apply")
            .retry(RetryPolicy::immediate())
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.render.output_dir, "out");
        assert!(!config.render.write_on_node_errors);
        assert_eq!(config.render.script_extension, ".py");
        assert_eq!(config.io.retry_policy(), RetryPolicy::immediate());
    }

    #[test]
    fn test_user_file_layers_over_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[render]\nscript_extension = \".inp\"\n[io]\nattempts = 2").unwrap();

        let config = Loader::new().with_file(file.path()).build().unwrap();
        assert_eq!(config.render.script_extension, ".inp");
        assert_eq!(config.io.attempts, 2);
        assert_eq!(config.io.retry_delay_ms, 100);
    }

    #[test]
    fn test_explicit_file_wins_over_project_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_FILE),
            "[render]\noutput_dir = \"project\"\nscript_extension = \".sh\"\n",
        )
        .unwrap();
        let explicit = dir.path().join("explicit.toml");
        std::fs::write(&explicit, "[render]\noutput_dir = \"explicit\"\n").unwrap();

        let config = Loader::new()
            .with_project_file(dir.path())
            .with_file(&explicit)
            .build()
            .unwrap();
        assert_eq!(config.render.output_dir, "explicit");
        assert_eq!(config.render.script_extension, ".sh");
    }

    #[test]
    fn test_missing_project_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let config = Loader::new().with_project_file(dir.path()).build().unwrap();
        assert_eq!(config, Loader::new().build().unwrap());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        assert!(Loader::new()
            .with_file("/definitely/not/here/enna.toml")
            .build()
            .is_err());
    }
}
