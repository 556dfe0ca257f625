use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, info, warn},
};

use crate::{
    env_subst::substitute_env_with,
    error::{Error, Result},
    schema::RelaybotConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "relaybot.toml",
    "relaybot.yaml",
    "relaybot.yml",
    "relaybot.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<RelaybotConfig> {
    load_config_with(path, |name| std::env::var(name).ok())
}

fn load_config_with(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<RelaybotConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env_with(&raw, lookup);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./relaybot.{toml,yaml,yml,json}` (working directory)
/// 2. `~/.config/relaybot/relaybot.{toml,yaml,yml,json}` (user-global)
///
/// Returns `RelaybotConfig::default()` if no config file is found. A file
/// that exists but cannot be read or parsed is an error.
pub fn discover_and_load() -> Result<RelaybotConfig> {
    match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path)
        },
        None => {
            debug!("no config file found, using defaults");
            Ok(RelaybotConfig::default())
        },
    }
}

/// Load the explicit file when given, otherwise discover one, then layer the
/// environment overrides on top.
pub fn load(explicit: Option<&Path>) -> Result<RelaybotConfig> {
    let mut config = match explicit {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            load_config(path)?
        },
        None => discover_and_load()?,
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/relaybot/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "relaybot").map(|d| d.config_dir().to_path_buf())
}

/// Overlay the well-known environment variables onto `config`.
pub fn apply_env_overrides(config: &mut RelaybotConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

/// Same as [`apply_env_overrides`] with an injectable lookup. Blank values
/// are ignored.
pub fn apply_env_overrides_with(
    config: &mut RelaybotConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(token) = get("TELEGRAM_BOT_TOKEN") {
        config.telegram.token = Secret::new(token);
    }
    if let Some(key) = get("GEMINI_API_KEY") {
        config.providers.gemini.api_key = Some(Secret::new(key));
    }
    if let Some(key) = get("OPENAI_API_KEY") {
        config.providers.openai.api_key = Some(Secret::new(key));
    }
    if let Some(channel) = get("TELEGRAM_CHANNEL") {
        config.gating.channel = Some(channel);
    }
    if let Some(link) = get("TELEGRAM_INVITE_LINK") {
        config.gating.invite_link = Some(link);
    }
    if let Some(port) = get("PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => config.liveness.port = port,
            Err(e) => warn!(value = %port, error = %e, "ignoring invalid PORT"),
        }
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<RelaybotConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}
