//! Executor module for running a transcode plan.
//!
//! Conversions are dispatched in plan order through a bounded worker pool.
//! Every failure is attributed to its source file and tallied by extension,
//! and a partial output is removed whenever a conversion does not succeed.
//!
//! # Example
//!
//! ```ignore
//! use treecast_core::executor::{BatchExecutor, ExecutorConfig, OutputSettings};
//!
//! let executor = BatchExecutor::new(ExecutorConfig::default(), Arc::new(converter));
//! let outcome = executor
//!     .execute(&plan, OutputSettings::new(AudioFormat::OggVorbis), &cancel, None)
//!     .await;
//! println!("{} ok, failed: {}", outcome.succeeded, outcome.failure_summary());
//! ```

mod batch;
mod config;
mod types;

pub use batch::BatchExecutor;
pub use config::ExecutorConfig;
pub use types::{BatchEvent, BatchOutcome, FailureKind, FileFailure, OutputSettings};
