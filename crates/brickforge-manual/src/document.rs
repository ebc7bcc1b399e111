//! Page model of a build manual
//!
//! Pages are numbered by their position in the final list, not by the step
//! they were rendered from, so an omitted render never leaves a gap.

use crate::error::{ManualError, ManualResult};
use brickforge_core::ManualPage;
use chrono::Local;
use std::path::Path;

/// One content page with its display numbering
#[derive(Debug, Clone, PartialEq)]
pub struct NumberedPage<'a> {
    /// 1-based position among the pages
    pub index: usize,
    pub total: usize,
    pub page: &'a ManualPage,
}

impl NumberedPage<'_> {
    pub fn heading(&self) -> String {
        format!("Step {} of {}", self.index, self.total)
    }

    pub fn caption(&self) -> String {
        match self.page.new_part_count {
            0 => "No new parts".to_string(),
            1 => "Add 1 part".to_string(),
            n => format!("Add {} parts", n),
        }
    }
}

/// A titled, ordered set of step pages
#[derive(Debug, Clone)]
pub struct ManualDocument {
    title: String,
    generated: String,
    pages: Vec<ManualPage>,
}

impl ManualDocument {
    /// Sort `pages` by step number and wrap them under `title`
    pub fn new(title: impl Into<String>, mut pages: Vec<ManualPage>) -> ManualResult<Self> {
        if pages.is_empty() {
            return Err(ManualError::NoPages);
        }
        pages.sort_by_key(|p| p.step_number);
        Ok(Self {
            title: title.into(),
            generated: Local::now().format("%Y-%m-%d").to_string(),
            pages,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Date the document was assembled, `YYYY-MM-DD`
    pub fn generated(&self) -> &str {
        &self.generated
    }

    pub fn step_count(&self) -> usize {
        self.pages.len()
    }

    /// Cover page lines, title first
    pub fn cover_lines(&self) -> Vec<String> {
        let steps = match self.step_count() {
            1 => "1 step".to_string(),
            n => format!("{} steps", n),
        };
        vec![
            self.title.clone(),
            "Build instructions".to_string(),
            steps,
            format!("Generated {}", self.generated),
        ]
    }

    pub fn pages(&self) -> impl Iterator<Item = NumberedPage<'_>> {
        let total = self.pages.len();
        self.pages.iter().enumerate().map(move |(i, page)| NumberedPage {
            index: i + 1,
            total,
            page,
        })
    }
}

/// Title for a manual built from `input`: its file stem
pub fn title_for(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "model".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn page(step_number: usize, new_part_count: usize) -> ManualPage {
        ManualPage {
            step_number,
            image_path: PathBuf::from(format!("renders/step_{:03}.png", step_number)),
            new_part_count,
        }
    }

    #[test]
    fn test_empty_document_is_rejected() {
        assert!(matches!(
            ManualDocument::new("house", Vec::new()),
            Err(ManualError::NoPages)
        ));
    }

    #[test]
    fn test_numbering_is_compressed() {
        // Step 2 failed to render.
        let doc = ManualDocument::new("house", vec![page(1, 3), page(3, 2), page(4, 1)]).unwrap();
        let headings: Vec<_> = doc.pages().map(|p| p.heading()).collect();
        assert_eq!(headings, vec!["Step 1 of 3", "Step 2 of 3", "Step 3 of 3"]);
        let steps: Vec<_> = doc.pages().map(|p| p.page.step_number).collect();
        assert_eq!(steps, vec![1, 3, 4]);
    }

    #[test]
    fn test_pages_are_sorted_by_step() {
        let doc = ManualDocument::new("house", vec![page(5, 1), page(2, 4)]).unwrap();
        assert_eq!(doc.pages().next().unwrap().page.step_number, 2);
    }

    #[test]
    fn test_cover_and_captions() {
        let doc = ManualDocument::new("castle", vec![page(1, 1), page(2, 0)]).unwrap();
        let cover = doc.cover_lines();
        assert_eq!(cover[0], "castle");
        assert_eq!(cover[2], "2 steps");

        let captions: Vec<_> = doc.pages().map(|p| p.caption()).collect();
        assert_eq!(captions, vec!["Add 1 part", "No new parts"]);
    }

    #[test]
    fn test_title_for_input() {
        assert_eq!(title_for(Path::new("/models/house.ldr")), "house");
        assert_eq!(title_for(Path::new("/")), "model");
    }
}
