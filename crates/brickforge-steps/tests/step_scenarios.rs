//! Scenario tests from source file to step assignment

use brickforge_steps::{assign_objects, read_steps, StepAssignment, StepPlan};
use std::fs;

const HOUSE: &str = "\
0 Small house
0 Name: house.ldr
0 Author: test
1 4 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat
1 4 80 0 0 1 0 0 0 1 0 0 0 1 3001.dat
1 4 160 0 0 1 0 0 0 1 0 0 0 1 3001.dat
0 STEP
1 15 0 -24 0 1 0 0 0 1 0 0 0 1 3003.dat
1 15 40 -24 0 1 0 0 0 1 0 0 0 1 3003.dat
0 ROTSTEP 0 90 0 REL
1 1 0 -48 0 1 0 0 0 1 0 0 0 1 3039.dat
1 1 40 -48 0 1 0 0 0 1 0 0 0 1 3039.dat
";

#[test]
fn test_two_markers_seven_parts_seven_objects() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("house.ldr");
    fs::write(&path, HOUSE).unwrap();

    let steps = read_steps(&path);
    assert_eq!(steps.len(), 3);

    let objects: Vec<String> = (1..=7).map(|i| format!("part-{i}")).collect();
    let plan = StepPlan::resolve(objects.len(), steps, 5);
    assert!(!plan.is_synthesized());

    let assignments = assign_objects(&objects, plan.steps());
    let counts: Vec<_> = assignments.iter().map(StepAssignment::counts).collect();
    assert_eq!(counts, vec![(3, 3), (5, 2), (7, 2)]);
    assert_eq!(assignments[2].new_objects, &objects[5..]);
}

#[test]
fn test_unstepped_file_falls_back_to_batches() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flat.ldr");
    let body: String = (0..11)
        .map(|i| format!("1 14 {} 0 0 1 0 0 0 1 0 0 0 1 3005.dat\n", i * 20))
        .collect();
    fs::write(&path, body).unwrap();

    let steps = read_steps(&path);
    assert_eq!(steps.len(), 1);

    let objects: Vec<usize> = (0..11).collect();
    let plan = StepPlan::resolve(objects.len(), steps, 5);
    assert!(plan.is_synthesized());

    let counts: Vec<_> = assign_objects(&objects, plan.steps())
        .iter()
        .map(StepAssignment::counts)
        .collect();
    assert_eq!(counts, vec![(5, 5), (10, 5), (11, 1)]);
}

#[test]
fn test_binary_garbage_is_recoverable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.ldr");
    fs::write(&path, [0xff, 0xfe, 0x00, 0x31, 0x20, 0xc3]).unwrap();

    let steps = read_steps(&path);
    assert!(steps.is_empty());

    let plan = StepPlan::resolve(4, steps, 5);
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.planned_parts(), 4);
}

#[test]
fn test_instanced_submodel_drift_is_absorbed() {
    // Three declared references, but the engine expanded one into four objects.
    let text = "1 4 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat\n0 STEP\n1 4 0 0 0 1 0 0 0 1 0 0 0 1 wall.ldr\n0 STEP\n1 4 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat\n";
    let steps = brickforge_steps::parse_steps(text);
    let objects: Vec<usize> = (0..6).collect();
    let plan = StepPlan::resolve(objects.len(), steps, 5);

    let assignments = assign_objects(&objects, plan.steps());
    let counts: Vec<_> = assignments.iter().map(StepAssignment::counts).collect();
    assert_eq!(counts, vec![(1, 1), (2, 1), (6, 4)]);
}
