//! Layered configuration loading.
//!
//! A section is loaded from (in priority order):
//! 1. Environment variables (`<PREFIX>_<SECTION>__<KEY>`)
//! 2. Config file (`<file_prefix>.toml`, optional)
//! 3. The section type's `Default`

use serde::de::DeserializeOwned;

use crate::error::Result;

/// Load one `[section]` table into `T`.
///
/// A missing file or missing section yields `T::default()`. A section that is
/// present but malformed is an error.
pub fn load_section<T>(file_prefix: &str, env_prefix: &str, section: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<T>(section) {
        Ok(value) => Ok(value),
        Err(config::ConfigError::NotFound(key)) => {
            tracing::debug!(%key, file_prefix, "Config section not found, using defaults");
            Ok(T::default())
        }
        Err(e) => Err(e.into()),
    }
}
