//! Step planning
//!
//! Decides whether the parsed steps are usable as-is or whether uniform
//! virtual steps have to be synthesized so the manual still shows the model
//! growing one batch at a time.

use brickforge_core::Step;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Objects per virtual step when the source declares no usable steps
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Step planning settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepOptions {
    /// Size of each synthesized step
    pub batch_size: usize,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// One step of the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedStep {
    /// A step declared by the source
    Declared(Step),
    /// A synthesized step covering a fixed number of objects
    Virtual { number: usize, part_count: usize },
}

impl PlannedStep {
    pub fn number(&self) -> usize {
        match self {
            Self::Declared(step) => step.number,
            Self::Virtual { number, .. } => *number,
        }
    }

    pub fn part_count(&self) -> usize {
        match self {
            Self::Declared(step) => step.part_count(),
            Self::Virtual { part_count, .. } => *part_count,
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, Self::Virtual { .. })
    }
}

/// The ordered steps a run works with
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepPlan {
    steps: Vec<PlannedStep>,
    synthesized: bool,
}

impl StepPlan {
    /// Use the parsed steps when there is more than one, otherwise synthesize
    pub fn resolve(object_count: usize, parsed: Vec<Step>, batch_size: usize) -> Self {
        if parsed.len() > 1 {
            return Self {
                steps: parsed.into_iter().map(PlannedStep::Declared).collect(),
                synthesized: false,
            };
        }

        info!(
            "Source declares {} step(s); synthesizing steps of {} for {} objects",
            parsed.len(),
            batch_size,
            object_count
        );
        Self::synthesize(object_count, batch_size)
    }

    /// Partition `object_count` objects into consecutive batches
    ///
    /// Every batch has `batch_size` objects except the last, which takes the
    /// remainder. A batch size of zero is treated as one.
    pub fn synthesize(object_count: usize, batch_size: usize) -> Self {
        let batch = batch_size.max(1);
        let steps = (0..object_count.div_ceil(batch))
            .map(|i| PlannedStep::Virtual {
                number: i + 1,
                part_count: batch.min(object_count - i * batch),
            })
            .collect();
        Self {
            steps,
            synthesized: true,
        }
    }

    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_synthesized(&self) -> bool {
        self.synthesized
    }

    /// Sum of the declared or predetermined part counts
    pub fn planned_parts(&self) -> usize {
        self.steps.iter().map(PlannedStep::part_count).sum()
    }
}
