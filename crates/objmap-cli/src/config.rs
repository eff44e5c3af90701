use anyhow::{Context, Result};
use objmap_core::Config;
use std::path::Path;

/// Read from the working directory when no configuration file is given
pub const DEFAULT_CONFIG_FILE: &str = "objmap.toml";

/// Loads the generator configuration.
///
/// An explicitly given file must exist. Without one, `objmap.toml` is used
/// if present and the defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return read(path);
    }

    let default = Path::new(DEFAULT_CONFIG_FILE);
    if std::fs::exists(default)? {
        return read(default);
    }

    Ok(Config::default())
}

fn read(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("invalid config file {}", path.display()))?;

    tracing::debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
}
