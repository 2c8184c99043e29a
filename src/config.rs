//! Configuration loading from copymap.toml.
//!
//! The file is looked up in the given directory, then in each parent, the
//! way ruff finds its config. Absent a file, built-in defaults apply.
//!
//! ## Example
//!
//! ```toml
//! extend-ignore = ["createdAt", "updatedAt"]
//! disabled-conventions = ["apache"]
//! skip-object-types = true
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::resolve::{CopyConvention, Resolver, ResolverBuilder};
use crate::types::DEFAULT_IGNORED;

pub const CONFIG_FILE: &str = "copymap.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown convention '{0}' (expected one of apache, spring, hutool, cglib, custom)")]
    UnknownConvention(String),
}

/// Immutable settings shared by the resolver and reconciler.
///
/// Built once and cloned freely: the ignore set sits behind an `Arc`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    default_ignored: Arc<BTreeSet<String>>,
}

impl EngineConfig {
    /// Built-in default-ignored names plus `names`.
    ///
    /// The built-ins cannot be removed: `serialVersionUID` is never copied.
    pub fn with_default_ignored<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ignored: BTreeSet<String> = DEFAULT_IGNORED.iter().map(|s| s.to_string()).collect();
        ignored.extend(names.into_iter().map(Into::into));
        Self {
            default_ignored: Arc::new(ignored),
        }
    }

    /// Names ignored on every call site.
    pub fn default_ignored(&self) -> &BTreeSet<String> {
        &self.default_ignored
    }

    pub(crate) fn default_ignored_arc(&self) -> &Arc<BTreeSet<String>> {
        &self.default_ignored
    }

    pub fn is_default_ignored(&self, name: &str) -> bool {
        self.default_ignored.contains(name)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::with_default_ignored(std::iter::empty::<String>())
    }
}

/// copymap configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source file for this config (for display).
    pub source: Option<PathBuf>,

    /// Extra names ignored on every call site (extends defaults).
    pub extend_ignore: Vec<String>,

    /// Conventions the resolver should not try.
    pub disabled_conventions: Vec<CopyConvention>,

    /// Skip diagnostics for copies to or from `java.lang.Object`.
    pub skip_object_types: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            extend_ignore: Vec::new(),
            disabled_conventions: Vec::new(),
            skip_object_types: true,
        }
    }
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    extend_ignore: Option<Vec<String>>,
    disabled_conventions: Option<Vec<String>>,
    skip_object_types: Option<bool>,
}

impl Config {
    /// Load configuration for the given directory.
    ///
    /// Search order:
    /// 1. copymap.toml in directory
    /// 2. copymap.toml in each parent, nearest first
    /// 3. Default config if nothing found
    pub fn load(directory: &Path) -> Result<Self, ConfigError> {
        let mut current = Some(directory);
        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Self::load_file(&candidate);
            }
            current = dir.parent();
        }
        Ok(Self::default())
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let disabled_conventions = raw
            .disabled_conventions
            .unwrap_or_default()
            .into_iter()
            .map(|id| CopyConvention::from_id(&id).ok_or(ConfigError::UnknownConvention(id)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: None,
            extend_ignore: raw.extend_ignore.unwrap_or_default(),
            disabled_conventions,
            skip_object_types: raw.skip_object_types.unwrap_or(true),
        })
    }

    /// Effective default-ignored names: built-ins plus extend-ignore.
    pub fn effective_ignored(&self) -> BTreeSet<String> {
        self.engine().default_ignored().clone()
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig::with_default_ignored(self.extend_ignore.iter().cloned())
    }

    pub fn is_enabled(&self, convention: CopyConvention) -> bool {
        !self.disabled_conventions.contains(&convention)
    }

    /// Resolver with this config's engine settings and enabled conventions.
    pub fn resolver(&self) -> Resolver {
        let mut builder = ResolverBuilder::new().config(self.engine());
        for convention in CopyConvention::ALL {
            builder = builder.convention(convention, self.is_enabled(convention));
        }
        builder.build()
    }

    /// Format config for verbose display.
    pub fn display_summary(&self) -> String {
        let mut lines = Vec::new();

        if let Some(ref source) = self.source {
            lines.push(format!("   Config: {}", source.display()));
        } else {
            lines.push("   Config: (defaults)".to_string());
        }

        let ignored: Vec<String> = self.effective_ignored().into_iter().collect();
        lines.push(format!("   Ignored: {}", ignored.join(", ")));

        if !self.disabled_conventions.is_empty() {
            let ids: Vec<_> = self.disabled_conventions.iter().map(|c| c.id()).collect();
            lines.push(format!("   Disabled: {}", ids.join(", ")));
        }

        lines.join("\n")
    }
}
