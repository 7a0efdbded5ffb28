use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides, e.g. `TREECAST_EXECUTOR__MAX_PARALLEL=4`.
pub const ENV_PREFIX: &str = "TREECAST_";

fn env_overrides() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(env_overrides())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from an optional file.
///
/// Without a file only defaults and environment overrides apply.
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Figment::new()
            .merge(env_overrides())
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string())),
    }
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[converter]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
timeout_secs = 120

[executor]
max_parallel = 4
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.converter.ffmpeg_path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.converter.timeout_secs, 120);
        assert_eq!(config.executor.max_parallel, 4);
        // Untouched section keeps its defaults
        assert!(config.scan.skip_extensions.contains(&"nfo".to_string()));
    }

    #[test]
    fn test_load_config_from_str_empty_is_default() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.executor.max_parallel, 1);
    }

    #[test]
    fn test_load_config_from_str_empty_skip_list() {
        let toml = r#"
[scan]
skip_extensions = []
known_input_extensions = ["flac", "wav"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(config.scan.skip_extensions.is_empty());
        assert_eq!(config.scan.known_input_extensions.unwrap().len(), 2);
    }

    #[test]
    fn test_load_config_from_str_wrong_type() {
        let toml = r#"
[executor]
max_parallel = "many"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[converter]
ffmpeg_log_level = "warning"

[scan]
skip_extensions = ["jpg", "png"]
"#
        )
        .unwrap();

        let config = load_config_or_default(Some(temp_file.path())).unwrap();
        assert_eq!(config.converter.ffmpeg_log_level, "warning");
        assert_eq!(config.scan.skip_extensions, vec!["jpg", "png"]);
    }
}
