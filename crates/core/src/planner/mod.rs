//! Planner module for turning a scan into a transcoding plan.
//!
//! The plan lists the conversions to run and the set of output paths that
//! are legitimate in the target tree. The reconciler treats anything outside
//! that set as an orphan.

mod builder;
mod types;

pub use builder::build_plan;
pub use types::{ExistingOutputs, PlanCounts, PlanPolicy, PlannedConversion, TranscodePlan};
