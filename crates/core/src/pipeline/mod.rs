//! Pipeline module tying the phases together.
//!
//! # Example
//!
//! ```ignore
//! use treecast_core::pipeline::TranscodePipeline;
//! use treecast_core::planner::PlanPolicy;
//!
//! let pipeline = TranscodePipeline::new(config, Arc::new(FfmpegConverter::with_defaults()));
//! let run = pipeline
//!     .prepare(Path::new("/music"), Path::new("/music-ogg"), Some("ogg"), PlanPolicy::skip_existing())
//!     .await?;
//! let outcome = pipeline.execute(&run, Some(192), &cancel, None).await;
//! let orphans = pipeline.find_orphans(&run).await?;
//! let report = pipeline.reconcile(&run, orphans).await?;
//! ```

mod error;
mod runner;
mod types;

pub use error::PipelineError;
pub use runner::TranscodePipeline;
pub use types::{PreparedRun, SingleFileOutcome};
