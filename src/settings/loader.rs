//! Settings loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::settings::schema::ServiceSettings;
use crate::settings::validation::{validate_settings, ValidationError};

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<ServiceSettings, SettingsError> {
    let content = fs::read_to_string(path)?;
    let settings: ServiceSettings = toml::from_str(&content)?;

    validate_settings(&settings).map_err(SettingsError::Validation)?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_file() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            "[listener]\nbind_address = \"127.0.0.1:9000\"\n[client]\ntimeout_ms = 500\n",
        )
        .unwrap();

        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(settings.client.timeout_ms, 500);
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            load_settings(Path::new("/definitely/missing/dynconf.toml")),
            Err(SettingsError::Io(_))
        ));

        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "listener = [").unwrap();
        assert!(matches!(load_settings(file.path()), Err(SettingsError::Parse(_))));

        fs::write(file.path(), "[timeouts]\nrequest_secs = 0\n").unwrap();
        let err = load_settings(file.path()).unwrap_err();
        assert!(err.to_string().contains("timeouts.request_secs"));
    }
}
