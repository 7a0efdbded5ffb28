use serde::{Deserialize, Serialize};

use crate::converter::{AudioFormat, ConverterConfig};
use crate::executor::ExecutorConfig;
use crate::scanner::ScanOptions;

/// Root configuration
///
/// Every section is optional; a missing file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
}

/// Source classification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Extensions never handed to the converter. May be empty.
    #[serde(default = "default_skip_extensions")]
    pub skip_extensions: Vec<String>,
    /// When set, only these extensions are converted.
    #[serde(default)]
    pub known_input_extensions: Option<Vec<String>>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            skip_extensions: default_skip_extensions(),
            known_input_extensions: None,
        }
    }
}

fn default_skip_extensions() -> Vec<String> {
    [
        "jpg", "jpeg", "png", "gif", "bmp", "txt", "nfo", "log", "cue", "m3u", "m3u8", "pdf",
        "db", "ini",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl ScanConfig {
    /// Scanner options for the given output format.
    pub fn scan_options(&self, target_format: AudioFormat) -> ScanOptions {
        let options =
            ScanOptions::new(target_format).with_skip_extensions(&self.skip_extensions);
        match &self.known_input_extensions {
            Some(known) => options.with_known_input_extensions(known),
            None => options,
        }
    }
}
