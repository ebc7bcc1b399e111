//! LDraw model loader
//!
//! Reads `.ldr`, `.mpd` and `.dat` files and flattens every top-level part
//! reference into one mesh in scene units. References to sub-models (embedded
//! MPD files or `.ldr`/`.mpd` files) expand in place, so the part order
//! matches the order of the part lines in the source.
//!
//! Line types handled:
//! - `0`: `FILE`/`NOFILE` (MPD sections), `BFC` winding and `INVERTNEXT`,
//!   `!LDRAW_ORG` (part or model)
//! - `1`: sub-file reference
//! - `3`, `4`: triangle and quad
//!
//! Line types `2` and `5` are edges and are ignored.

use crate::color;
use crate::error::{LoadError, LoadResult};
use crate::library::{file_key, normalize_name, Library};
use crate::mesh::Mesh;
use nalgebra::{Matrix4, Point3};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, warn};

/// Scene units (metres) per LDraw unit
pub const LDU: f64 = 0.0004;

/// Color of top-level lines that use the inherit code
pub const TOP_LEVEL_COLOR: u32 = 7;

const MAX_DEPTH: usize = 64;

/// LDraw (-Y up, LDU) to scene (Z up, metres)
pub fn ldraw_to_scene() -> Matrix4<f64> {
    Matrix4::new(
        LDU, 0.0, 0.0, 0.0, //
        0.0, 0.0, LDU, 0.0, //
        0.0, -LDU, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    )
}

/// One parsed line that contributes to the model
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Reference {
        color: u32,
        matrix: Matrix4<f64>,
        name: String,
        /// `BFC INVERTNEXT` preceded this line
        invert: bool,
    },
    /// Triangle or quad, corners stored counter-clockwise
    Polygon {
        color: u32,
        corners: Vec<Point3<f64>>,
    },
}

/// One LDraw file or MPD section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LdrawFile {
    pub name: String,
    pub commands: Vec<Command>,
    /// Declared as a part (or shortcut) by `!LDRAW_ORG`
    pub is_part: bool,
}

impl LdrawFile {
    pub fn reference_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Reference { .. }))
            .count()
    }
}

/// A top-level part flattened into scene units
#[derive(Debug, Clone)]
pub struct LoadedPart {
    /// File stem of the part, e.g. `3001`
    pub name: String,
    pub color: u32,
    pub mesh: Mesh,
}

/// Split text into MPD sections; plain files give one section named `name`
pub fn parse_document(name: &str, text: &str) -> Vec<LdrawFile> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut files: Vec<LdrawFile> = Vec::new();
    let mut current = LdrawFile {
        name: name.to_string(),
        ..Default::default()
    };
    let mut state = BfcState::default();
    let mut in_section = false;
    let mut started = false;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        let mut tokens = line.split_whitespace();
        let Some(kind) = tokens.next() else {
            continue;
        };

        if kind == "0" {
            let rest: Vec<&str> = tokens.collect();
            match rest.first().map(|t| t.to_ascii_uppercase()).as_deref() {
                Some("FILE") => {
                    if started || in_section {
                        files.push(std::mem::take(&mut current));
                    }
                    current.name = rest[1..].join(" ");
                    state = BfcState::default();
                    in_section = true;
                    started = true;
                }
                Some("NOFILE") => {
                    if in_section {
                        files.push(std::mem::take(&mut current));
                        in_section = false;
                        started = false;
                    }
                }
                Some("BFC") => state.apply(&rest[1..]),
                Some("!LDRAW_ORG") => {
                    let kind = rest.get(1).map(|t| t.to_ascii_lowercase()).unwrap_or_default();
                    current.is_part = kind.contains("part") || kind.contains("shortcut");
                }
                _ => {}
            }
            continue;
        }

        started = true;
        match kind {
            "1" => match parse_reference(line) {
                Ok((color, matrix, file)) => {
                    current.commands.push(Command::Reference {
                        color,
                        matrix,
                        name: file,
                        invert: std::mem::take(&mut state.invert_next),
                    });
                }
                Err(reason) => warn!("{}:{}: {}", current.name, index + 1, reason),
            },
            "3" | "4" => {
                let count = if kind == "3" { 3 } else { 4 };
                match parse_polygon(line, count) {
                    Ok((color, mut corners)) => {
                        if state.clockwise {
                            corners.reverse();
                        }
                        current.commands.push(Command::Polygon { color, corners });
                    }
                    Err(reason) => warn!("{}:{}: {}", current.name, index + 1, reason),
                }
            }
            _ => {}
        }
    }

    if started || in_section || files.is_empty() {
        files.push(current);
    }
    files
}

#[derive(Debug, Default)]
struct BfcState {
    clockwise: bool,
    invert_next: bool,
}

impl BfcState {
    fn apply(&mut self, args: &[&str]) {
        for arg in args {
            match arg.to_ascii_uppercase().as_str() {
                "CW" => self.clockwise = true,
                "CCW" => self.clockwise = false,
                "INVERTNEXT" => self.invert_next = true,
                _ => {}
            }
        }
    }
}

fn parse_color(token: &str) -> Result<u32, String> {
    let parsed = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => token.parse::<u32>(),
    };
    parsed.map_err(|_| format!("invalid color '{}'", token))
}

fn parse_numbers(tokens: &[&str]) -> Result<Vec<f64>, String> {
    tokens
        .iter()
        .map(|t| t.parse::<f64>().map_err(|_| format!("invalid number '{}'", t)))
        .collect()
}

/// `1 <color> x y z a b c d e f g h i <file>`
fn parse_reference(line: &str) -> Result<(u32, Matrix4<f64>, String), String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 15 {
        return Err(format!("expected 15 fields, found {}", tokens.len()));
    }
    let color = parse_color(tokens[1])?;
    let n = parse_numbers(&tokens[2..14])?;
    let matrix = Matrix4::new(
        n[3], n[4], n[5], n[0], //
        n[6], n[7], n[8], n[1], //
        n[9], n[10], n[11], n[2], //
        0.0, 0.0, 0.0, 1.0,
    );
    Ok((color, matrix, tokens[14..].join(" ")))
}

/// `3 <color> x1 y1 z1 x2 y2 z2 x3 y3 z3` and the four-corner form
fn parse_polygon(line: &str, corners: usize) -> Result<(u32, Vec<Point3<f64>>), String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let expected = 2 + corners * 3;
    if tokens.len() < expected {
        return Err(format!("expected {} fields, found {}", expected, tokens.len()));
    }
    let color = parse_color(tokens[1])?;
    let n = parse_numbers(&tokens[2..expected])?;
    Ok((
        color,
        n.chunks(3).map(|c| Point3::new(c[0], c[1], c[2])).collect(),
    ))
}

/// Loads one model and everything it references
pub struct LdrawLoader<'a> {
    library: &'a Library,
    model_dir: PathBuf,
    embedded: HashMap<String, Rc<LdrawFile>>,
    cache: HashMap<String, Option<Rc<LdrawFile>>>,
    missing: HashSet<String>,
}

impl<'a> LdrawLoader<'a> {
    pub fn new(library: &'a Library, model_dir: impl Into<PathBuf>) -> Self {
        Self {
            library,
            model_dir: model_dir.into(),
            embedded: HashMap::new(),
            cache: HashMap::new(),
            missing: HashSet::new(),
        }
    }

    /// Load `path` and return its top-level parts in source order
    pub fn load(mut self, path: &Path) -> LoadResult<Vec<LoadedPart>> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let sections = parse_document(&name, &read_text(path)?);

        let mut sections = sections.into_iter().map(Rc::new);
        let Some(main) = sections.next() else {
            return Ok(Vec::new());
        };
        self.embedded.insert(file_key(&main.name), Rc::clone(&main));
        for section in sections {
            self.embedded.entry(file_key(&section.name)).or_insert(section);
        }
        debug!(
            "Loaded {} with {} embedded files",
            main.name,
            self.embedded.len() - 1
        );

        let mut parts = Vec::new();
        let mut stack = vec![file_key(&main.name)];
        if main.is_part {
            // A single part file is its own only object.
            let mesh = self.flatten(&main, &Matrix4::identity(), false, &mut stack)?;
            parts.push(LoadedPart {
                name: stem(&main.name),
                color: TOP_LEVEL_COLOR,
                mesh,
            });
        } else {
            let identity = Matrix4::identity();
            self.expand_model(
                &main,
                &identity,
                TOP_LEVEL_COLOR,
                false,
                &mut stack,
                &mut parts,
            )?;
        }

        let to_scene = ldraw_to_scene();
        for part in &mut parts {
            part.mesh.transform(&to_scene);
        }
        Ok(parts)
    }

    fn expand_model(
        &mut self,
        model: &LdrawFile,
        matrix: &Matrix4<f64>,
        color: u32,
        invert: bool,
        stack: &mut Vec<String>,
        parts: &mut Vec<LoadedPart>,
    ) -> LoadResult<()> {
        for command in &model.commands {
            let Command::Reference {
                color: line_color,
                matrix: local,
                name,
                invert: invert_next,
            } = command
            else {
                continue;
            };
            let Some(target) = self.resolve(name) else {
                continue;
            };

            let key = file_key(name);
            if stack.contains(&key) || stack.len() >= MAX_DEPTH {
                return Err(LoadError::Recursion(name.clone()));
            }

            let color = color::resolve(*line_color, color);
            let matrix = matrix * local;
            let invert = invert ^ invert_next;

            stack.push(key);
            if self.is_submodel(name, &target) {
                self.expand_model(&target, &matrix, color, invert, stack, parts)?;
            } else {
                let mesh = self.flatten(&target, &matrix, invert, stack)?;
                if mesh.is_empty() {
                    warn!("Part {} has no geometry, skipped", name);
                } else {
                    parts.push(LoadedPart {
                        name: stem(name),
                        color,
                        mesh,
                    });
                }
            }
            stack.pop();
        }
        Ok(())
    }

    /// All polygons of `file` and its sub-files, in LDraw units
    fn flatten(
        &mut self,
        file: &LdrawFile,
        matrix: &Matrix4<f64>,
        invert: bool,
        stack: &mut Vec<String>,
    ) -> LoadResult<Mesh> {
        let mut mesh = Mesh::default();
        let mirrored = matrix.fixed_view::<3, 3>(0, 0).determinant() < 0.0;

        for command in &file.commands {
            match command {
                Command::Polygon { corners, .. } => {
                    let mut corners: Vec<Point3<f64>> =
                        corners.iter().map(|p| matrix.transform_point(p)).collect();
                    if invert ^ mirrored {
                        corners.reverse();
                    }
                    mesh.push_polygon(&corners);
                }
                Command::Reference {
                    matrix: local,
                    name,
                    invert: invert_next,
                    ..
                } => {
                    let Some(target) = self.resolve(name) else {
                        continue;
                    };
                    let key = file_key(name);
                    if stack.contains(&key) || stack.len() >= MAX_DEPTH {
                        return Err(LoadError::Recursion(name.clone()));
                    }
                    stack.push(key);
                    let child_matrix = matrix * local;
                    let child = self.flatten(&target, &child_matrix, invert ^ invert_next, stack)?;
                    stack.pop();
                    mesh.append(&child);
                }
            }
        }
        Ok(mesh)
    }

    fn is_submodel(&self, name: &str, target: &LdrawFile) -> bool {
        if target.is_part {
            return false;
        }
        if self.embedded.contains_key(&file_key(name)) {
            return true;
        }
        let lowered = name.to_ascii_lowercase();
        lowered.ends_with(".ldr") || lowered.ends_with(".mpd")
    }

    /// Embedded section or library file for a reference; missing files are
    /// logged once and skipped
    fn resolve(&mut self, name: &str) -> Option<Rc<LdrawFile>> {
        let key = file_key(name);
        if let Some(file) = self.embedded.get(&key) {
            return Some(Rc::clone(file));
        }
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let loaded = match self.library.find(name, &self.model_dir) {
            Some(path) => match read_text(&path) {
                Ok(text) => parse_document(&normalize_name(name), &text)
                    .into_iter()
                    .next()
                    .map(Rc::new),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            },
            None => {
                if self.missing.insert(key.clone()) {
                    warn!("Missing sub-file {}, skipped", name);
                }
                None
            }
        };
        self.cache.insert(key, loaded.clone());
        loaded
    }
}

fn read_text(path: &Path) -> LoadResult<String> {
    let bytes = fs::read(path).map_err(|e| LoadError::read(path, e))?;
    String::from_utf8(bytes).map_err(|_| LoadError::NotText {
        path: path.to_path_buf(),
    })
}

/// File stem of a reference name, e.g. `s\3001s01.dat` gives `3001s01`
fn stem(name: &str) -> String {
    let normalized = normalize_name(name);
    let file = normalized.rsplit('/').next().unwrap_or(&normalized);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brickforge_core::Resolution;

    const BOX: &str = "\
0 Test box
0 Name: box.dat
0 !LDRAW_ORG Part UPDATE 2024-01
0 BFC CERTIFY CCW
4 16 0 0 0 0 0 20 20 0 20 20 0 0
4 16 0 -24 0 20 -24 0 20 -24 20 0 -24 20
2 24 0 0 0 20 0 0
";

    #[test]
    fn test_parse_reference_matrix() {
        let (color, matrix, name) =
            parse_reference("1 4 10 -24 30 1 0 0 0 1 0 0 0 1 my part.dat").unwrap();
        assert_eq!(color, 4);
        assert_eq!(name, "my part.dat");
        let p = matrix.transform_point(&Point3::new(1.0, 2.0, 3.0));
        assert_eq!(p, Point3::new(11.0, -22.0, 33.0));
    }

    #[test]
    fn test_parse_rejects_short_lines() {
        assert!(parse_reference("1 4 0 0 0 1 0 0").is_err());
        assert!(parse_polygon("3 4 0 0 0 1 1 1", 3).is_err());
        assert!(parse_color("red").is_err());
        assert_eq!(parse_color("0x2FF0000").unwrap(), 0x2FF0000);
    }

    #[test]
    fn test_parse_document_single_file() {
        let files = parse_document("box.dat", BOX);
        assert_eq!(files.len(), 1);
        assert!(files[0].is_part);
        assert_eq!(files[0].commands.len(), 2);
    }

    #[test]
    fn test_clockwise_polygons_are_reversed() {
        let text = "0 BFC CERTIFY CW\n3 16 0 0 0 1 0 0 0 1 0\n";
        let files = parse_document("tri.dat", text);
        let Command::Polygon { corners, .. } = &files[0].commands[0] else {
            panic!("expected polygon");
        };
        assert_eq!(corners[0], Point3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_invertnext_marks_reference() {
        let text = "0 BFC INVERTNEXT\n1 16 0 0 0 1 0 0 0 1 0 0 0 1 a.dat\n1 16 0 0 0 1 0 0 0 1 0 0 0 1 b.dat\n";
        let files = parse_document("x.dat", text);
        let inverts: Vec<bool> = files[0]
            .commands
            .iter()
            .map(|c| matches!(c, Command::Reference { invert: true, .. }))
            .collect();
        assert_eq!(inverts, vec![true, false]);
    }

    #[test]
    fn test_mpd_sections() {
        let text = "\
0 FILE main.ldr
1 4 0 0 0 1 0 0 0 1 0 0 0 1 wall.ldr
0 NOFILE
0 FILE wall.ldr
1 4 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat
1 4 40 0 0 1 0 0 0 1 0 0 0 1 3001.dat
0 NOFILE
";
        let files = parse_document("house.mpd", text);
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["main.ldr", "wall.ldr"]);
        assert_eq!(files[1].reference_count(), 2);
    }

    #[test]
    fn test_stem() {
        assert_eq!(stem("3001.dat"), "3001");
        assert_eq!(stem("s\\3001s01.dat"), "3001s01");
        assert_eq!(stem("noext"), "noext");
    }

    #[test]
    fn test_load_model_with_submodel_and_missing_part() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("box.dat"), BOX).unwrap();
        let model = "\
0 FILE main.ldr
1 4 0 0 0 1 0 0 0 1 0 0 0 1 box.dat
1 1 0 0 0 1 0 0 0 1 0 0 0 1 pair.ldr
1 2 0 0 0 1 0 0 0 1 0 0 0 1 nothere.dat
0 FILE pair.ldr
1 16 0 0 0 1 0 0 0 1 0 0 0 1 box.dat
1 14 40 0 0 1 0 0 0 1 0 0 0 1 box.dat
";
        let path = dir.path().join("main.mpd");
        fs::write(&path, model).unwrap();

        let library = Library::new(None, Resolution::Standard);
        let parts = LdrawLoader::new(&library, dir.path()).load(&path).unwrap();
        let colors: Vec<_> = parts.iter().map(|p| p.color).collect();
        assert_eq!(colors, vec![4, 1, 14]);
        assert!(parts.iter().all(|p| p.name == "box"));

        // 20 LDU wide, 24 LDU tall; Z is up after conversion.
        let (min, max) = parts[0].mesh.bounds().unwrap();
        assert!(((max.x - min.x) - 20.0 * LDU).abs() < 1e-12);
        assert!(((max.z - min.z) - 24.0 * LDU).abs() < 1e-12);
        assert!(max.z > 0.0);
    }

    #[test]
    fn test_recursive_reference_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let model = "\
0 FILE a.ldr
1 4 0 0 0 1 0 0 0 1 0 0 0 1 b.ldr
0 FILE b.ldr
1 4 0 0 0 1 0 0 0 1 0 0 0 1 a.ldr
";
        let path = dir.path().join("loop.mpd");
        fs::write(&path, model).unwrap();
        let library = Library::default();
        let result = LdrawLoader::new(&library, dir.path()).load(&path);
        assert!(matches!(result, Err(LoadError::Recursion(_))));
    }
}
