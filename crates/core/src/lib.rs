pub mod config;
pub mod converter;
pub mod executor;
pub mod pipeline;
pub mod planner;
pub mod reconciler;
pub mod scanner;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, ScanConfig,
};
pub use converter::{AudioFormat, Converter, ConverterError, FfmpegConverter};
pub use executor::{BatchEvent, BatchExecutor, BatchOutcome, ExecutorConfig, FailureKind};
pub use pipeline::{PipelineError, PreparedRun, SingleFileOutcome, TranscodePipeline};
pub use planner::{PlanPolicy, TranscodePlan};
pub use reconciler::{DeletionCandidate, ReconcileReport, Reconciler};
pub use scanner::{ScanOptions, ScanResult, Scanner};
