//! HTML manual writer
//!
//! Produces a single self-contained page per manual. Images are linked
//! relative to the document so the instructions directory can be moved as a
//! whole.

use crate::document::ManualDocument;
use crate::error::ManualResult;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const STYLE: &str = "\
body { font-family: Helvetica, Arial, sans-serif; margin: 0; background: #f4f4f4; }
section { background: #fff; margin: 24px auto; padding: 32px; max-width: 840px; page-break-after: always; }
section.cover { text-align: center; padding-top: 160px; min-height: 480px; }
h1 { font-size: 40px; margin-bottom: 8px; }
h2 { font-size: 26px; margin: 0 0 4px 0; }
p.parts { color: #555; margin: 0 0 16px 0; }
img { max-width: 100%; border: 1px solid #ddd; }
";

/// Write `<dir>/<title>.html` and return its path
pub fn write_html(document: &ManualDocument, dir: &Path) -> ManualResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.html", document.title()));
    fs::write(&path, render_html(document, dir))?;
    Ok(path)
}

/// Render the document as HTML with image links relative to `base`
pub fn render_html(document: &ManualDocument, base: &Path) -> String {
    let mut html = String::new();
    let title = escape(document.title());

    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html lang=\"en\">");
    let _ = writeln!(html, "<head>");
    let _ = writeln!(html, "<meta charset=\"utf-8\">");
    let _ = writeln!(html, "<title>{} - Build instructions</title>", title);
    let _ = writeln!(html, "<style>\n{}</style>", STYLE);
    let _ = writeln!(html, "</head>");
    let _ = writeln!(html, "<body>");

    let cover = document.cover_lines();
    let _ = writeln!(html, "<section class=\"cover\">");
    let _ = writeln!(html, "<h1>{}</h1>", title);
    for line in cover.iter().skip(1) {
        let _ = writeln!(html, "<p>{}</p>", escape(line));
    }
    let _ = writeln!(html, "</section>");

    for page in document.pages() {
        let src = relative_link(&page.page.image_path, base);
        let _ = writeln!(html, "<section class=\"step\" id=\"step-{}\">", page.index);
        let _ = writeln!(html, "<h2>{}</h2>", page.heading());
        let _ = writeln!(html, "<p class=\"parts\">{}</p>", page.caption());
        let _ = writeln!(
            html,
            "<img src=\"{}\" alt=\"{}\">",
            escape(&src),
            page.heading()
        );
        let _ = writeln!(html, "</section>");
    }

    let _ = writeln!(html, "</body>");
    let _ = writeln!(html, "</html>");
    html
}

/// `/`-separated link to `target`, relative to `base` when it lies inside it
fn relative_link(target: &Path, base: &Path) -> String {
    let relative = target.strip_prefix(base).unwrap_or(target);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
