//! End-to-end runs with the in-process engine

use brickforge::{run, Config, MeshScene, RunRequest, SceneOptions, INSTRUCTIONS_DIR};
use brickforge_manual::ManualFormat;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

const BOX_PART: &str = "\
0 Test Box
0 Name: box.dat
0 !LDRAW_ORG Part
4 16 -10 0 -10 10 0 -10 10 0 10 -10 0 10
4 16 -10 24 -10 -10 24 10 10 24 10 10 24 -10
4 16 -10 0 -10 -10 24 -10 10 24 -10 10 0 -10
4 16 -10 0 10 10 0 10 10 24 10 -10 24 10
4 16 -10 0 -10 -10 0 10 -10 24 10 -10 24 -10
4 16 10 0 -10 10 24 -10 10 24 10 10 0 10
";

/// Seven boxes in steps of 3, 2 and 2
const TOWER: &str = "\
0 Tower
1 4 0 0 0 1 0 0 0 1 0 0 0 1 box.dat
1 4 40 0 0 1 0 0 0 1 0 0 0 1 box.dat
1 4 80 0 0 1 0 0 0 1 0 0 0 1 box.dat
0 STEP
1 14 0 -24 0 1 0 0 0 1 0 0 0 1 box.dat
1 14 40 -24 0 1 0 0 0 1 0 0 0 1 box.dat
0 STEP
1 1 0 -48 0 1 0 0 0 1 0 0 0 1 box.dat
1 16 40 -48 0 1 0 0 0 1 0 0 0 1 box.dat
0 STEP
";

struct Workspace {
    root: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("ldraw/parts")).unwrap();
        fs::write(root.path().join("ldraw/parts/box.dat"), BOX_PART).unwrap();
        fs::write(root.path().join("tower.ldr"), TOWER).unwrap();
        Self { root }
    }

    fn path(&self, rel: &str) -> std::path::PathBuf {
        self.root.path().join(rel)
    }

    fn engine(&self) -> MeshScene {
        MeshScene::new(SceneOptions {
            library: Some(self.path("ldraw")),
        })
    }
}

fn small_manual_config() -> Config {
    let mut config = Config::new();
    config.instructions.manual.camera.width = 160;
    config.instructions.manual.camera.height = 120;
    config
}

fn files_under(root: &Path) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let rel = path.strip_prefix(root).unwrap();
                found.insert(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    found
}

#[test]
fn test_export_only_run() {
    let ws = Workspace::new();
    let output = ws.path("out");
    let request = RunRequest {
        input: ws.path("tower.ldr"),
        output: output.clone(),
        instructions: false,
    };

    let report = run(&mut ws.engine(), &request, &Config::new()).unwrap();
    assert_eq!(report.object_count, 7);
    assert_eq!(report.export.exported_count(), 7);
    assert_eq!(report.export.failure_count(), 0);
    assert!(report.manual.is_empty());
    assert_eq!(
        report.export.buckets(),
        vec!["Red", "Yellow", "Blue", "Light_Grey"]
    );

    let files: BTreeSet<String> = files_under(&output)
        .into_iter()
        .filter(|f| f.ends_with(".obj"))
        .collect();
    let expected: BTreeSet<String> = [
        "Red/box.obj",
        "Red/box_1.obj",
        "Red/box_2.obj",
        "Yellow/box.obj",
        "Yellow/box_1.obj",
        "Blue/box.obj",
        "Light_Grey/box.obj",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    assert_eq!(files, expected);
    assert!(!output.join(INSTRUCTIONS_DIR).exists());
}

#[test]
fn test_run_with_manual() {
    let ws = Workspace::new();
    let output = ws.path("out");
    let request = RunRequest {
        input: ws.path("tower.ldr"),
        output: output.clone(),
        instructions: true,
    };

    let report = run(&mut ws.engine(), &request, &small_manual_config()).unwrap();
    assert_eq!(report.export.exported_count(), 7);
    assert_eq!(report.manual.len(), 2);

    let files = files_under(&output.join(INSTRUCTIONS_DIR));
    for expected in [
        "tower.html",
        "tower.pdf",
        "renders/step_001.png",
        "renders/step_002.png",
        "renders/step_003.png",
    ] {
        assert!(files.contains(expected), "missing {}", expected);
    }

    let html = fs::read_to_string(output.join(INSTRUCTIONS_DIR).join("tower.html")).unwrap();
    assert!(html.contains("Step 1 of 3"));
    assert!(html.contains("Add 3 parts"));
    assert!(html.contains("Add 2 parts"));
}

#[test]
fn test_manual_formats_follow_config() {
    let ws = Workspace::new();
    let output = ws.path("out");
    let mut config = small_manual_config();
    config.instructions.enabled = true;
    config.instructions.manual.formats = vec![ManualFormat::Pdf];
    let request = RunRequest {
        input: ws.path("tower.ldr"),
        output: output.clone(),
        instructions: false,
    };

    let report = run(&mut ws.engine(), &request, &config).unwrap();
    assert_eq!(report.manual, vec![output.join(INSTRUCTIONS_DIR).join("tower.pdf")]);
    assert!(!output.join(INSTRUCTIONS_DIR).join("tower.html").exists());
}

#[test]
fn test_fatal_errors_write_nothing() {
    let ws = Workspace::new();
    let output = ws.path("out");

    let missing = RunRequest {
        input: ws.path("absent.ldr"),
        output: output.clone(),
        instructions: false,
    };
    let err = run(&mut ws.engine(), &missing, &Config::new()).unwrap_err();
    assert!(err.to_string().contains("Input file not found"));

    fs::write(ws.path("model.3ds"), "binary").unwrap();
    let unsupported = RunRequest {
        input: ws.path("model.3ds"),
        output: output.clone(),
        instructions: false,
    };
    let err = run(&mut ws.engine(), &unsupported, &Config::new()).unwrap_err();
    assert!(format!("{:#}", err).contains("Unsupported model format: 3ds"));

    assert!(!output.exists());
}

#[test]
fn test_obj_input_gets_synthesized_steps() {
    let ws = Workspace::new();
    let obj = "\
o A
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o B
v 2 0 0
v 3 0 0
v 2 1 0
f 4 5 6
o C
v 4 0 0
v 5 0 0
v 4 1 0
f 7 8 9
";
    fs::write(ws.path("loose.obj"), obj).unwrap();
    let output = ws.path("out");
    let mut config = small_manual_config();
    config.steps.batch_size = 2;
    let request = RunRequest {
        input: ws.path("loose.obj"),
        output: output.clone(),
        instructions: true,
    };

    let report = run(&mut ws.engine(), &request, &config).unwrap();
    assert_eq!(report.export.exported_count(), 3);
    let files = files_under(&output);
    assert!(files.contains("Uncolored/A.obj"));
    assert!(files.contains("instructions/renders/step_002.png"));
    assert!(!files.contains("instructions/renders/step_003.png"));
}

#[test]
fn test_failing_objects_do_not_fail_the_run() {
    let ws = Workspace::new();
    let output = ws.path("out");
    fs::create_dir_all(&output).unwrap();
    // A plain file where the Yellow bucket directory should go.
    fs::write(output.join("Yellow"), "in the way").unwrap();
    let request = RunRequest {
        input: ws.path("tower.ldr"),
        output: output.clone(),
        instructions: false,
    };

    let report = run(&mut ws.engine(), &request, &Config::new()).unwrap();
    assert_eq!(report.object_count, 7);
    assert_eq!(report.export.exported_count(), 5);
    assert_eq!(report.export.failure_count(), 2);
    assert!(report
        .export
        .failures
        .iter()
        .all(|f| f.object.material.as_deref() == Some("Yellow")));
    assert_eq!(report.export.buckets(), vec!["Red", "Blue", "Light_Grey"]);
    assert!(output.join("Light_Grey/box.obj").exists());
}
