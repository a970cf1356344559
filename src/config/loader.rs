//! Config file loading

use crate::domain::Config;
use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use figment::Figment;
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `TEMPLATER_STRICT=true`.
pub const ENV_PREFIX: &str = "TEMPLATER_";

const CANDIDATES: [&str; 6] = [
    "templater.toml",
    ".templater.toml",
    "templater.yaml",
    ".templater.yaml",
    "templater.yml",
    ".templater.yml",
];

/// Load settings with env > file > defaults precedence.
///
/// An explicit `config_path` must load cleanly. A file discovered under `anchor`
/// that fails is logged and ignored.
pub fn load_config(anchor: &Path, config_path: Option<&Path>) -> Result<Config> {
    let config_path_provided = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(anchor),
    };

    let Some(config_file) = discovered else {
        return extract(base());
    };

    match extract(with_file(&config_file)?) {
        Ok(cfg) => {
            tracing::debug!(path = %config_file.display(), "loaded config");
            Ok(cfg)
        }
        Err(e) if config_path_provided => Err(e),
        Err(e) => {
            tracing::warn!(
                "Failed to parse auto-discovered config {}: {:#}",
                config_file.display(),
                e
            );
            extract(base())
        }
    }
}

fn base() -> Figment {
    Figment::from(Serialized::defaults(Config::default()))
}

fn with_file(config_file: &Path) -> Result<Figment> {
    if !config_file.is_file() {
        anyhow::bail!("Config file not found: {}", config_file.display());
    }
    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    let figment = match ext.as_str() {
        "toml" => base().merge(Toml::file(config_file)),
        "yaml" | "yml" => base().merge(Yaml::file(config_file)),
        other => anyhow::bail!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        ),
    };
    Ok(figment)
}

fn extract(figment: Figment) -> Result<Config> {
    figment.merge(Env::prefixed(ENV_PREFIX)).extract().context("Invalid configuration")
}

fn discover_config(anchor: &Path) -> Option<PathBuf> {
    CANDIDATES.iter().map(|candidate| anchor.join(candidate)).find(|path| path.is_file())
}
