//! # BrickForge Steps
//!
//! Derives the assembly step sequence of a model:
//!
//! - **Parser**: splits the source description at step markers
//! - **Plan**: keeps declared steps or synthesizes uniform virtual ones
//! - **Assign**: maps imported objects onto the steps as cumulative and new sets

pub mod assign;
pub mod parser;
pub mod plan;

pub use assign::{assign_objects, StepAssignment};
pub use parser::{classify_line, parse_steps, read_steps, LineKind, StepParser};
pub use plan::{PlannedStep, StepOptions, StepPlan, DEFAULT_BATCH_SIZE};
