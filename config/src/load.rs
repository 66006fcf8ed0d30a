use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::Environment;

/// Directory containing configuration files relative to the working directory.
const CONFIGURATION_DIR: &str = "configuration";

/// Supported extensions for configuration files.
const CONFIG_FILE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Prefix for environment variable configuration overrides.
const ENV_PREFIX: &str = "APP";

/// Separator for nested configuration keys in environment variables.
const ENV_SEPARATOR: &str = "__";

/// Errors that can occur while loading configuration files and overrides.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    /// Failed to determine the current working directory.
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    /// The `configuration` directory does not exist.
    #[error("configuration directory `{0}` does not exist")]
    MissingConfigurationDirectory(PathBuf),

    /// The always-required base configuration file is missing.
    #[error("no base configuration file found in `{0}`")]
    BaseConfigurationMissing(PathBuf),

    /// A configuration source could not be read or merged.
    #[error("failed to assemble configuration: {0}")]
    Assemble(#[source] rust_cli_config::ConfigError),

    /// The merged configuration could not be deserialized.
    #[error("failed to deserialize configuration: {0}")]
    Deserialization(#[source] rust_cli_config::ConfigError),

    /// Failed to determine the runtime environment (`APP_ENVIRONMENT`).
    #[error("failed to determine runtime environment: {0}")]
    Environment(#[from] io::Error),
}

/// Loads hierarchical configuration for the current environment.
///
/// Merges, in order of increasing precedence:
/// 1. `configuration/base.(yaml|yml|json)` (required),
/// 2. `configuration/{environment}.(yaml|yml|json)` (optional overlay),
/// 3. `APP_`-prefixed environment variables, with `__` separating nested
///    keys (`APP_CLICKHOUSE__URL`).
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: DeserializeOwned,
{
    let current_dir = std::env::current_dir().map_err(LoadConfigError::CurrentDir)?;
    let configuration_dir = current_dir.join(CONFIGURATION_DIR);

    if !configuration_dir.is_dir() {
        return Err(LoadConfigError::MissingConfigurationDirectory(
            configuration_dir,
        ));
    }

    let environment = Environment::load()?;

    let base_file = find_configuration_file(&configuration_dir, "base")
        .ok_or_else(|| LoadConfigError::BaseConfigurationMissing(configuration_dir.clone()))?;

    let mut builder =
        rust_cli_config::Config::builder().add_source(rust_cli_config::File::from(base_file));

    // The environment overlay is optional: a deployment that configures
    // everything in base + env vars does not need one.
    if let Some(overlay) = find_configuration_file(&configuration_dir, environment.as_str()) {
        builder = builder.add_source(rust_cli_config::File::from(overlay));
    }

    builder = builder.add_source(
        rust_cli_config::Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR),
    );

    let settings = builder.build().map_err(LoadConfigError::Assemble)?;

    settings
        .try_deserialize::<T>()
        .map_err(LoadConfigError::Deserialization)
}

/// Returns the first existing configuration file with the given stem.
fn find_configuration_file(directory: &Path, stem: &str) -> Option<PathBuf> {
    CONFIG_FILE_EXTENSIONS
        .iter()
        .map(|extension| directory.join(format!("{stem}.{extension}")))
        .find(|path| path.is_file())
}
