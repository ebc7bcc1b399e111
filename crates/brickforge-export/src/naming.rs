//! Bucket keys and collision-free output paths
//!
//! Material names coming out of the engine carry noise: a variant suffix for
//! smooth/specular duplicates and `.001`-style duplicate counters. Both are
//! stripped so every shade of one color lands in the same folder.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Replacement for characters that are not allowed in file names
pub const RESERVED_REPLACEMENT: &str = "_";

/// Naming rules for buckets and exported files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingOptions {
    /// Suffix marking a smooth/specular duplicate of a material
    pub variant_suffix: String,
    /// Bucket for objects without a material
    pub uncolored_bucket: String,
    /// Stem used when an object name sanitizes to nothing
    pub fallback_name: String,
    /// Mesh file extension, without the dot
    pub extension: String,
}

impl Default for NamingOptions {
    fn default() -> Self {
        Self {
            variant_suffix: "_s".to_string(),
            uncolored_bucket: "Uncolored".to_string(),
            fallback_name: "unnamed".to_string(),
            extension: "obj".to_string(),
        }
    }
}

/// Replace `\ / * ? : " < > |` with `_`
pub fn sanitize(text: &str) -> String {
    static RESERVED: OnceLock<Regex> = OnceLock::new();
    let regex =
        RESERVED.get_or_init(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("invalid regex pattern"));
    regex.replace_all(text, RESERVED_REPLACEMENT).into_owned()
}

/// Normalize a material name into a bucket key
///
/// Strips `variant_suffix`, then a trailing `.<digits>`, then sanitizes.
pub fn normalize_material(name: &str, variant_suffix: &str) -> String {
    static DUPLICATE_INDEX: OnceLock<Regex> = OnceLock::new();
    let regex =
        DUPLICATE_INDEX.get_or_init(|| Regex::new(r"\.\d+$").expect("invalid regex pattern"));

    let name = if variant_suffix.is_empty() {
        name
    } else {
        name.strip_suffix(variant_suffix).unwrap_or(name)
    };
    sanitize(&regex.replace(name, ""))
}

/// Bucket key for an object's material
///
/// The key is a single directory name below the output root; a material that
/// normalizes to nothing or to dots only goes to `uncolored_bucket`.
pub fn bucket_key(material: Option<&str>, options: &NamingOptions) -> String {
    let key = material
        .map(|name| normalize_material(name, &options.variant_suffix))
        .unwrap_or_default();
    if is_path_segment(&key) {
        key
    } else {
        options.uncolored_bucket.clone()
    }
}

fn is_path_segment(key: &str) -> bool {
    let trimmed = key.trim();
    !trimmed.is_empty() && !trimmed.chars().all(|c| c == '.')
}

/// Pick `<name>.<ext>`, or the first free `<name>_<n>.<ext>`, inside `dir`
///
/// A path is taken if it exists on disk or is in `reserved`. The result only
/// depends on the directory contents and `reserved`, so a fixed object order
/// always yields the same names.
pub fn resolve_output_path(
    dir: &Path,
    object_name: &str,
    options: &NamingOptions,
    reserved: &HashSet<PathBuf>,
) -> PathBuf {
    let mut stem = sanitize(object_name);
    if stem.trim().is_empty() {
        stem = options.fallback_name.clone();
    }

    let taken = |path: &Path| path.exists() || reserved.contains(path);

    let candidate = dir.join(format!("{}.{}", stem, options.extension));
    if !taken(&candidate) {
        return candidate;
    }

    (1..)
        .map(|n| dir.join(format!("{}_{}.{}", stem, n, options.extension)))
        .find(|path| !taken(path))
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_determinism() {
        assert_eq!(normalize_material("Red_s", "_s"), "Red");
        assert_eq!(normalize_material("Red.001", "_s"), "Red");
        assert_eq!(normalize_material("Red", "_s"), "Red");
    }

    #[test]
    fn test_suffixes_are_stripped_in_order() {
        assert_eq!(normalize_material("Blue_s.002", "_s"), "Blue_s");
        assert_eq!(normalize_material("Blue.002_s", "_s"), "Blue");
        assert_eq!(normalize_material("Trans.Clear", "_s"), "Trans.Clear");
        assert_eq!(normalize_material("Glass.12a", "_s"), "Glass.12a");
    }

    #[test]
    fn test_sanitize_reserved_characters() {
        assert_eq!(sanitize(r#"a\b/c*d?e:f"g<h>i|j"#), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(normalize_material("Dark/Red.004", "_s"), "Dark_Red");
    }

    #[test]
    fn test_missing_material_is_uncolored() {
        let options = NamingOptions::default();
        assert_eq!(bucket_key(None, &options), "Uncolored");
        assert_eq!(bucket_key(Some("Yellow_s"), &options), "Yellow");
    }

    #[test]
    fn test_empty_or_dot_keys_fall_back_to_uncolored() {
        let options = NamingOptions::default();
        assert_eq!(bucket_key(Some("_s"), &options), "Uncolored");
        assert_eq!(bucket_key(Some(".001"), &options), "Uncolored");
        assert_eq!(bucket_key(Some(".."), &options), "Uncolored");
        assert_eq!(bucket_key(Some("."), &options), "Uncolored");
        assert_eq!(bucket_key(Some("  "), &options), "Uncolored");
        assert_eq!(bucket_key(Some("..Red"), &options), "..Red");
    }

    #[test]
    fn test_resolve_output_path_counts_up() {
        let dir = tempfile::tempdir().unwrap();
        let options = NamingOptions::default();
        let mut reserved = HashSet::new();

        let first = resolve_output_path(dir.path(), "Brick", &options, &reserved);
        assert_eq!(first, dir.path().join("Brick.obj"));
        std::fs::write(&first, "o Brick\n").unwrap();

        let second = resolve_output_path(dir.path(), "Brick", &options, &reserved);
        assert_eq!(second, dir.path().join("Brick_1.obj"));
        reserved.insert(second);

        let third = resolve_output_path(dir.path(), "Brick", &options, &reserved);
        assert_eq!(third, dir.path().join("Brick_2.obj"));
    }

    #[test]
    fn test_names_colliding_after_sanitizing() {
        let dir = tempfile::tempdir().unwrap();
        let options = NamingOptions::default();
        std::fs::write(dir.path().join("Tile_1x2.obj"), "").unwrap();

        let path = resolve_output_path(dir.path(), "Tile/1x2", &options, &HashSet::new());
        assert_eq!(path, dir.path().join("Tile_1x2_1.obj"));
    }

    #[test]
    fn test_empty_name_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_output_path(dir.path(), "", &NamingOptions::default(), &HashSet::new());
        assert_eq!(path, dir.path().join("unnamed.obj"));
    }
}
