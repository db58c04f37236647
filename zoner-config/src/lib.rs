//! Configuration for the zoner library and CLI.
//!
//! Layers, lowest first: the embedded `defaults/zoner.default.toml`, any TOML
//! files added to the [`Loader`], `ZONER_*` environment variables (when
//! [`Loader::with_env`] is called) and explicit key overrides. The result is
//! checked by [`ZonerConfig::validate`] before it is handed out.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../defaults/zoner.default.toml");

const ENV_PREFIX: &str = "ZONER";

#[derive(Debug, Clone, Deserialize)]
pub struct ZonerConfig {
    pub grammar: GrammarConfig,
    pub zoning: ZoningConfig,
    pub generics: GenericsConfig,
}

impl ZonerConfig {
    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grammar.max_fragment_depth == 0 {
            return Err(ConfigError::Message(
                "grammar.max_fragment_depth must be at least 1".into(),
            ));
        }
        if !self.zoning.include_generics && !self.zoning.suggest_generics {
            return Ok(());
        }
        if self.generics.midpoint_tolerance == 0 {
            return Err(ConfigError::Message(
                "generics.midpoint_tolerance must be at least 1 when generics are enabled".into(),
            ));
        }
        Ok(())
    }
}

/// Where the grammar comes from and how it is expanded.
#[derive(Debug, Clone, Deserialize)]
pub struct GrammarConfig {
    pub path: String,
    pub max_fragment_depth: usize,
}

impl GrammarConfig {
    /// The configured grammar file, or `None` for the bundled grammar.
    pub fn grammar_path(&self) -> Option<PathBuf> {
        let trimmed = self.path.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    }
}

/// Which passes the zoning engine runs.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoningConfig {
    pub subsections: bool,
    pub templates: bool,
    pub include_generics: bool,
    pub suggest_generics: bool,
    pub convert_offsets: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenericsConfig {
    pub midpoint_tolerance: usize,
}

#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a TOML file that must exist.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer `ZONER_<SECTION>__<KEY>` variables, e.g.
    /// `ZONER_ZONING__INCLUDE_GENERICS=true`.
    pub fn with_env(mut self) -> Self {
        let source = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);
        self.builder = self.builder.add_source(source);
        self
    }

    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Merge every layer, deserialize and validate.
    pub fn build(self) -> Result<ZonerConfig, ConfigError> {
        let config: ZonerConfig = self.builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_defaults() -> Result<ZonerConfig, ConfigError> {
    Loader::new().build()
}
