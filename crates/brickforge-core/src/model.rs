//! Data model shared by the step, export and manual crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Engine-issued identifier of a live mesh object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One raw part-placement line from the source description
///
/// The payload is opaque to the pipeline and never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartReference {
    line: String,
}

impl PartReference {
    pub fn new(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }

    /// The line exactly as it appeared in the source
    pub fn raw(&self) -> &str {
        &self.line
    }
}

/// An ordered group of part placements forming one build stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based position in source order
    pub number: usize,
    pub references: Vec<PartReference>,
}

impl Step {
    pub fn new(number: usize, references: Vec<PartReference>) -> Self {
        Self { number, references }
    }

    pub fn part_count(&self) -> usize {
        self.references.len()
    }
}

/// Read-only snapshot of an engine-owned mesh object
///
/// The engine owns the object's lifetime; the pipeline only reads these
/// attributes and addresses the object by [`ObjectId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryObject {
    pub id: ObjectId,
    pub name: String,
    /// Active material (color) name, if any
    pub material: Option<String>,
    pub vertex_count: usize,
}

impl GeometryObject {
    pub fn new(
        id: ObjectId,
        name: impl Into<String>,
        material: Option<String>,
        vertex_count: usize,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            material,
            vertex_count,
        }
    }
}

impl fmt::Display for GeometryObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.name, self.id)
    }
}

/// Outcome of exporting one object
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRecord {
    pub source: GeometryObject,
    /// Normalized color bucket (directory name)
    pub bucket_key: String,
    /// Unique across the run
    pub output_path: PathBuf,
}

/// One rendered step, ready for the manual
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualPage {
    /// Step number in the planned sequence (before compression)
    pub step_number: usize,
    pub image_path: PathBuf,
    pub new_part_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_part_count() {
        let step = Step::new(
            1,
            vec![
                PartReference::new("1 4 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat"),
                PartReference::new("1 14 20 0 0 1 0 0 0 1 0 0 0 1 3003.dat"),
            ],
        );
        assert_eq!(step.part_count(), 2);
        assert_eq!(step.references[1].raw(), "1 14 20 0 0 1 0 0 0 1 0 0 0 1 3003.dat");
    }

    #[test]
    fn test_object_display() {
        let object = GeometryObject::new(ObjectId(3), "3001", Some("Red".to_string()), 24);
        assert_eq!(object.to_string(), "'3001' (#3)");
    }

    #[test]
    fn test_manual_page_serializes() {
        let page = ManualPage {
            step_number: 2,
            image_path: PathBuf::from("renders/step_002.png"),
            new_part_count: 4,
        };
        let json = serde_json::to_string(&page).unwrap();
        let back: ManualPage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, page);
    }
}
