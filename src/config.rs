//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML table and the user's file is merged on top of it, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "My Site"
//! author = "Anonymous"
//! language = "en"
//! # description = "Notes on building software"
//! # copyright_year = 2018
//!
//! [head]
//! stylesheets = ["/css/main.css"]
//! # favicon = "/favicon.ico"
//!
//! [nav]
//! home = "/"
//! default_section = "home"
//!
//! [[nav.sections]]
//! name = "home"
//! title = "Home"
//! href = "/"
//!
//! [[nav.sections]]
//! name = "blog"
//! title = "Blog"
//! href = "/blog/"
//!
//! [build]
//! pages_dir = "pages"
//! partials_dir = "partials"
//! static_dir = "static"
//! # max_processes = 4
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site identity used by the built-in partials.
    pub site: SiteInfo,
    /// Document head metadata for the built-in `head` partial.
    pub head: HeadConfig,
    /// Sections shown by the built-in `navbar` partial.
    pub nav: NavConfig,
    /// Content directory layout and parallelism.
    pub build: BuildConfig,
}

impl SiteConfig {
    /// Validate config values are internally consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.language.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site.language must not be empty".into(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for section in &self.nav.sections {
            if section.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "nav.sections entries must have a name".into(),
                ));
            }
            if !seen.insert(section.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate nav section '{}'",
                    section.name
                )));
            }
        }
        if let Some(default) = &self.nav.default_section
            && !self.nav.sections.iter().any(|s| &s.name == default)
        {
            return Err(ConfigError::Validation(format!(
                "nav.default_section '{}' is not one of nav.sections",
                default
            )));
        }
        if self.build.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "build.max_processes must be at least 1".into(),
            ));
        }
        for (key, dir) in [
            ("build.pages_dir", &self.build.pages_dir),
            ("build.partials_dir", &self.build.partials_dir),
            ("build.static_dir", &self.build.static_dir),
        ] {
            if dir.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }
}

/// Site identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    /// Site name, shown as the navbar brand.
    pub title: String,
    /// Default author for pages that don't set one; also the copyright holder.
    pub author: String,
    /// Value of the `lang` attribute on `<html>`.
    pub language: String,
    /// Fallback `<meta name="description">` for pages without their own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Year shown in the footer. Omitted from the footer when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright_year: Option<u32>,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            title: "My Site".to_string(),
            author: "Anonymous".to_string(),
            language: "en".to_string(),
            description: None,
            copyright_year: None,
        }
    }
}

/// Settings for the built-in `head` partial.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeadConfig {
    /// Stylesheet URLs, linked in order.
    pub stylesheets: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            stylesheets: vec!["/css/main.css".to_string()],
            favicon: None,
        }
    }
}

/// Navigation bar settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavConfig {
    /// Target of the brand link.
    pub home: String,
    /// Section marked active on pages that don't name one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_section: Option<String>,
    pub sections: Vec<NavSection>,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            home: "/".to_string(),
            default_section: Some("home".to_string()),
            sections: vec![
                NavSection {
                    name: "home".to_string(),
                    title: "Home".to_string(),
                    href: "/".to_string(),
                },
                NavSection {
                    name: "blog".to_string(),
                    title: "Blog".to_string(),
                    href: "/blog/".to_string(),
                },
            ],
        }
    }
}

/// One navbar entry. `name` is what pages pass as the active section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavSection {
    pub name: String,
    pub title: String,
    pub href: String,
}

/// Content layout and parallelism settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Page sources, relative to the content root.
    pub pages_dir: String,
    /// User partial fragments, relative to the content root.
    pub partials_dir: String,
    /// Files copied verbatim to the output root.
    pub static_dir: String,
    /// Maximum number of render workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            pages_dir: "pages".to_string(),
            partials_dir: "partials".to_string(),
            static_dir: "static".to_string(),
            max_processes: None,
        }
    }
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &BuildConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so an
///   overlay's `nav.sections` array replaces the stock list.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the content root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# sitefold configuration
# ======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
# Shown as the navbar brand.
title = "My Site"

# Default page author, also used as the copyright holder in the footer.
author = "Anonymous"

# The <html lang="..."> attribute.
language = "en"

# Fallback <meta name="description"> for pages without one.
# description = "Notes on building software"

# Footer copyright year. The year is left out when unset.
# copyright_year = 2018

# ---------------------------------------------------------------------------
# Built-in `head` partial
# ---------------------------------------------------------------------------
[head]
stylesheets = ["/css/main.css"]
# favicon = "/favicon.ico"

# ---------------------------------------------------------------------------
# Built-in `navbar` partial
# ---------------------------------------------------------------------------
[nav]
# Target of the brand link.
home = "/"

# Section marked active when a page doesn't set `section`.
default_section = "home"

# Pages select the active entry with `section = "<name>"` in front matter,
# or with {% include navbar "<name>" %} in a raw page.
[[nav.sections]]
name = "home"
title = "Home"
href = "/"

[[nav.sections]]
name = "blog"
title = "Blog"
href = "/blog/"

# ---------------------------------------------------------------------------
# Build
# ---------------------------------------------------------------------------
[build]
# Directories, relative to the content root.
pages_dir = "pages"
partials_dir = "partials"
static_dir = "static"

# Maximum parallel render workers.
# Omit to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
