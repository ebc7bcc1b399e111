//! Object-to-step assignment
//!
//! Walks the imported object list with a cursor, handing each step the next
//! `part_count` objects. Because objects are taken strictly in order, the
//! cumulative set of any step is a prefix of the object list and the delta is
//! the slice between two cursor positions.

use crate::plan::PlannedStep;

/// Objects visible at one step and the ones that step adds
#[derive(Debug)]
pub struct StepAssignment<'a, T> {
    pub step_number: usize,
    /// Everything placed up to and including this step
    pub cumulative: &'a [T],
    /// Objects introduced by this step
    pub new_objects: &'a [T],
}

impl<T> StepAssignment<'_, T> {
    /// `(cumulative, new)` object counts
    pub fn counts(&self) -> (usize, usize) {
        (self.cumulative.len(), self.new_objects.len())
    }
}

impl<T> Clone for StepAssignment<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StepAssignment<'_, T> {}

/// Assign `objects` (in import order) to the planned steps
///
/// Steps never receive more objects than remain; the final step absorbs all
/// remaining objects so none are dropped when declared counts fall short of
/// the object count. No objects, or no steps, yields no assignments.
pub fn assign_objects<'a, T>(
    objects: &'a [T],
    steps: &[PlannedStep],
) -> Vec<StepAssignment<'a, T>> {
    if objects.is_empty() || steps.is_empty() {
        return Vec::new();
    }

    let total = objects.len();
    let last = steps.len() - 1;
    let mut cursor = 0;

    steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let start = cursor;
            let end = if index == last {
                total
            } else {
                (start + step.part_count()).min(total)
            };
            cursor = end;
            StepAssignment {
                step_number: step.number(),
                cumulative: &objects[..end],
                new_objects: &objects[start..end],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::StepPlan;

    fn virtual_steps(counts: &[usize]) -> Vec<PlannedStep> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &part_count)| PlannedStep::Virtual {
                number: i + 1,
                part_count,
            })
            .collect()
    }

    #[test]
    fn test_exact_counts() {
        let objects: Vec<u32> = (0..7).collect();
        let assignments = assign_objects(&objects, &virtual_steps(&[3, 2, 2]));
        let counts: Vec<_> = assignments.iter().map(StepAssignment::counts).collect();
        assert_eq!(counts, vec![(3, 3), (5, 2), (7, 2)]);
        assert_eq!(assignments[1].new_objects, &[3, 4]);
    }

    #[test]
    fn test_last_step_absorbs_undercount() {
        let objects: Vec<u32> = (0..10).collect();
        let assignments = assign_objects(&objects, &virtual_steps(&[2, 2, 2]));
        let counts: Vec<_> = assignments.iter().map(StepAssignment::counts).collect();
        assert_eq!(counts, vec![(2, 2), (4, 2), (10, 6)]);
    }

    #[test]
    fn test_overcount_leaves_later_steps_empty() {
        let objects: Vec<u32> = (0..4).collect();
        let assignments = assign_objects(&objects, &virtual_steps(&[3, 3, 3]));
        let counts: Vec<_> = assignments.iter().map(StepAssignment::counts).collect();
        assert_eq!(counts, vec![(3, 3), (4, 1), (4, 0)]);
    }

    #[test]
    fn test_no_objects_no_assignments() {
        let objects: Vec<u32> = Vec::new();
        assert!(assign_objects(&objects, &virtual_steps(&[1, 2])).is_empty());
    }

    #[test]
    fn test_synthesized_plan_covers_everything() {
        let objects: Vec<u32> = (0..13).collect();
        let plan = StepPlan::synthesize(objects.len(), 5);
        let assignments = assign_objects(&objects, plan.steps());
        assert_eq!(assignments.len(), 3);
        assert_eq!(assignments[2].counts(), (13, 3));
    }
}
