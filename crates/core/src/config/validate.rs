use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - At least one conversion may run at a time
/// - Conversions have a non-zero timeout
/// - The FFmpeg path is not empty
/// - An input allowlist, when given, is not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.executor.max_parallel == 0 {
        return Err(ConfigError::ValidationError(
            "executor.max_parallel cannot be 0".to_string(),
        ));
    }

    if config.converter.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "converter.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.converter.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "converter.ffmpeg_path cannot be empty".to_string(),
        ));
    }

    if let Some(known) = &config.scan.known_input_extensions {
        if known.is_empty() {
            return Err(ConfigError::ValidationError(
                "scan.known_input_extensions cannot be an empty list; omit it to convert every extension".to_string(),
            ));
        }
    }

    Ok(())
}
