//! LDraw library file lookup

use brickforge_core::Resolution;
use std::path::{Path, PathBuf};

/// Directories searched for sub-files, in priority order
#[derive(Debug, Clone, Default)]
pub struct Library {
    root: Option<PathBuf>,
    resolution: Resolution,
}

impl Library {
    pub fn new(root: Option<PathBuf>, resolution: Resolution) -> Self {
        Self { root, resolution }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Search order for references made from a model in `model_dir`
    pub fn search_dirs(&self, model_dir: &Path) -> Vec<PathBuf> {
        let mut dirs = vec![model_dir.to_path_buf()];
        let Some(root) = &self.root else {
            return dirs;
        };

        for base in [root.clone(), root.join("Unofficial")] {
            dirs.push(base.join("parts"));
            match self.resolution {
                Resolution::High => dirs.push(base.join("p").join("48")),
                Resolution::Low => dirs.push(base.join("p").join("8")),
                Resolution::Standard => {}
            }
            dirs.push(base.join("p"));
            dirs.push(base.join("models"));
        }
        dirs
    }

    /// Find a referenced file; names use `\` or `/` and match either as written
    /// or lowercased
    pub fn find(&self, name: &str, model_dir: &Path) -> Option<PathBuf> {
        let normalized = normalize_name(name);
        let lowered = normalized.to_lowercase();
        let candidates = if lowered == normalized {
            vec![normalized]
        } else {
            vec![normalized, lowered]
        };

        self.search_dirs(model_dir)
            .into_iter()
            .flat_map(|dir| candidates.iter().map(move |c| dir.join(c)))
            .find(|path| path.is_file())
    }
}

/// Reference name with `/` separators and no surrounding whitespace
pub fn normalize_name(name: &str) -> String {
    name.trim().replace('\\', "/")
}

/// Case-insensitive key for embedded files and the file cache
pub fn file_key(name: &str) -> String {
    normalize_name(name).to_lowercase()
}
